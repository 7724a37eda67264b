//! Application services: validation, authorization and cache-aside around the repositories.

pub mod accounts;
pub mod assets;
pub mod auth;
pub mod error;
pub mod i18n;
pub mod pagination;
pub mod password;
pub mod policy;
pub mod reference;
pub mod repos;
pub mod resource;
pub mod resources;
pub mod tokens;
pub mod users;
