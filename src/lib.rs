//! Alumni platform REST backend.
//!
//! Layers, innermost first: [`domain`] types, [`application`] services with authorization and
//! cache-aside reads, the [`cache`] backends, and [`infra`] adapters (Postgres, HTTP, uploads,
//! telemetry). [`config`] resolves layered settings for the binary.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
