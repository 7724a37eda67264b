//! Domain layer types and invariants.

pub mod dates;
pub mod entities;
pub mod principal;
pub mod types;
pub mod validation;
