//! Catalogue-service repository over a layer/service/endpoint registry.
//!
//! - [`registry`]: record types and the PostgreSQL and SQLite stores
//! - [`metadata`]: Dublin Core document parsing
//! - [`spatial`]: WKT geometry helpers
//! - [`csw`]: the repository adapter and its reconciliation pipeline

pub mod config;
pub mod csw;
pub mod metadata;
pub mod registry;
pub mod spatial;

pub use config::RepositoryConfig;
pub use csw::{RepositoryAdapter, RepositoryError};
