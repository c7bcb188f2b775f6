//! Record store traits and error types.
//!
//! A store exposes filtered reads and aggregates directly, and every write
//! through a [`StoreTransaction`] so one reconciliation run commits or rolls
//! back as a unit.

use chrono::{DateTime, Utc};

use crate::registry::predicate::Predicate;
use crate::registry::service_types::ServiceType;
use crate::registry::types::{
    Catalog, Endpoint, InsertDirection, Layer, LayerUpdate, NewLayer, OrderBy, Pagination,
    Service, SpatialReferenceSystem, Value,
};

/// Error type for all store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Transaction already finished")]
    TransactionClosed,
}

impl From<tokio_postgres::Error> for StoreError {
    fn from(e: tokio_postgres::Error) -> Self {
        Self::Database(e.to_string())
    }
}

impl From<deadpool_postgres::PoolError> for StoreError {
    fn from(e: deadpool_postgres::PoolError) -> Self {
        Self::Database(e.to_string())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Database(e.to_string())
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Backing engine of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageEngine {
    /// PostgreSQL with PostGIS; spatial and text helpers are native.
    Postgres,
    /// SQLite; helper functions must be registered on the connection.
    Sqlite,
}

impl StorageEngine {
    /// Engine name reported to the protocol engine.
    pub fn dbtype(&self) -> &'static str {
        match self {
            Self::Postgres => "postgresql+postgis+wkt",
            Self::Sqlite => "sqlite",
        }
    }

    pub fn is_file_based(&self) -> bool {
        matches!(self, Self::Sqlite)
    }
}

/// Read and aggregate access to the layer/service/endpoint tables.
///
/// Column arguments are already-quoted identifiers; predicates carry their
/// own bound values.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    fn engine(&self) -> StorageEngine;

    /// Install `query_spatial`, `get_anytext` and `get_geometry_area` on
    /// engines without native support. A no-op elsewhere.
    async fn register_functions(&self) -> StoreResult<()>;

    async fn catalog(&self, id: i64) -> StoreResult<Catalog>;

    /// Layers matching `filter`, optionally ordered and sliced.
    ///
    /// Without an explicit order rows come back in id order.
    async fn layers(
        &self,
        filter: &Predicate,
        order: Option<&OrderBy>,
        page: Option<Pagination>,
    ) -> StoreResult<Vec<Layer>>;

    async fn count_layers(&self, filter: &Predicate) -> StoreResult<i64>;

    async fn services(&self, filter: &Predicate) -> StoreResult<Vec<Service>>;

    async fn endpoints(&self, filter: &Predicate) -> StoreResult<Vec<Endpoint>>;

    /// `(MIN(column), MAX(column))` over matching layers.
    async fn layer_range(&self, filter: &Predicate, column: &str) -> StoreResult<(Value, Value)>;

    /// Distinct values with their non-null occurrence count, in insertion order.
    async fn layer_value_counts(
        &self,
        filter: &Predicate,
        column: &str,
    ) -> StoreResult<Vec<(Value, i64)>>;

    /// Distinct values in insertion order.
    async fn layer_distinct(&self, filter: &Predicate, column: &str) -> StoreResult<Vec<Value>>;

    async fn layer_last_updated(
        &self,
        filter: &Predicate,
        direction: InsertDirection,
    ) -> StoreResult<Option<DateTime<Utc>>>;

    async fn layer_keywords(&self, layer_id: i64) -> StoreResult<Vec<String>>;

    async fn service_srs(&self, service_id: i64) -> StoreResult<Vec<SpatialReferenceSystem>>;

    /// Delete matching services, returning how many were removed.
    async fn delete_services(&self, filter: &Predicate) -> StoreResult<u64>;

    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>>;
}

/// Write access scoped to one storage transaction.
///
/// Dropping a transaction without calling [`commit`](Self::commit) rolls it back.
#[async_trait::async_trait]
pub trait StoreTransaction: Send {
    /// Unmonitored layers with exactly this name, title and abstract.
    async fn find_unmonitored_layers(
        &mut self,
        name: &str,
        title: &str,
        abstract_text: &str,
    ) -> StoreResult<Vec<Layer>>;

    async fn update_layers(&mut self, ids: &[i64], update: &LayerUpdate) -> StoreResult<u64>;

    /// Return the unmonitored service with this url and type, creating it if absent.
    async fn get_or_create_service(&mut self, url: &str, kind: ServiceType)
        -> StoreResult<Service>;

    async fn get_or_create_srs(&mut self, code: &str) -> StoreResult<SpatialReferenceSystem>;

    async fn attach_srs(&mut self, service_id: i64, srs_id: i64) -> StoreResult<()>;

    /// Insert `layer`, or overwrite the row `existing` keeping its id and uuid.
    async fn save_layer(&mut self, layer: &NewLayer, existing: Option<i64>) -> StoreResult<Layer>;

    async fn attach_keywords(&mut self, layer_id: i64, keywords: &[String]) -> StoreResult<()>;

    async fn create_endpoint(&mut self, url: &str, catalog_id: Option<i64>)
        -> StoreResult<Endpoint>;

    async fn create_service(
        &mut self,
        url: &str,
        kind: ServiceType,
        catalog_id: Option<i64>,
    ) -> StoreResult<Service>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;

    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_sqlite_needs_helper_functions() {
        assert!(StorageEngine::Sqlite.is_file_based());
        assert!(!StorageEngine::Postgres.is_file_based());
    }

    #[test]
    fn dbtype_names_match_protocol_engine() {
        assert_eq!(StorageEngine::Postgres.dbtype(), "postgresql+postgis+wkt");
        assert_eq!(StorageEngine::Sqlite.dbtype(), "sqlite");
    }

    #[test]
    fn not_found_message_names_entity() {
        let err = StoreError::NotFound {
            entity: "catalog".into(),
            id: "3".into(),
        };
        assert_eq!(err.to_string(), "Not found: catalog with id 3");
    }
}
