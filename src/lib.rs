//! foodcourtio - back-office control plane for multi-tenant food courts.
//!
//! This crate contains the HTTP surface, configuration and database pool
//! plumbing; the domain lives in the workspace crates.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;

pub use config::Config;
pub use db::{create_pool, create_read_pool, create_write_pool};
