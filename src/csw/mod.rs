//! Catalogue repository: the adapter the protocol engine drives.
//!
//! [`RepositoryAdapter`] answers id, domain and constraint queries and runs
//! inserts, updates and deletes against a [`RecordStore`](crate::registry::RecordStore).

pub mod context;
pub mod filter;
pub mod reconcile;
pub mod repository;

pub use context::ProtocolContext;
pub use filter::{Constraint, ScopeFilter, SortSpec};
pub use reconcile::{
    InsertLayerRequest, InsertRequest, InsertServiceRequest, InsertedRecord, ReconcileError,
    WriteMode,
};
pub use repository::{DomainQueryType, DomainValues, RepositoryAdapter, RepositoryError};
