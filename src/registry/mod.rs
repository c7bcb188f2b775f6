//! Registry storage: layers, services and endpoints behind one store trait.
//!
//! Every store follows the same structural pattern:
//! - filtered reads and aggregates on the store itself
//! - all writes of one reconciliation run inside a [`StoreTransaction`]
//! - `%s` predicates rendered into the engine's own placeholder syntax
//! - get-or-create on services keyed by (url, type, unmonitored)

pub mod hooks;
pub mod pg_store;
pub mod predicate;
pub mod service_types;
pub mod sqlite_store;
pub mod store;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use hooks::{IndexHooks, IndexTrigger, ReindexRequest};
pub use pg_store::PgRecordStore;
pub use predicate::Predicate;
pub use service_types::{ServiceType, ServiceTypeRegistry};
pub use sqlite_store::SqliteStore;
pub use store::{RecordStore, StorageEngine, StoreError, StoreResult, StoreTransaction};
pub use types::*;
