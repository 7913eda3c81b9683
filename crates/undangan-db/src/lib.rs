//! Undangan Database — SurrealDB connection management, schema
//! migrations and repository implementations.
//!
//! This crate provides:
//! - Connecting and migrating in one step ([`connect`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Error types ([`DbError`])
//! - Implementations of the `undangan-core` repository traits
//!   ([`repository`])

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, connect};
pub use error::DbError;
pub use schema::{run_migrations, schema_v1};
