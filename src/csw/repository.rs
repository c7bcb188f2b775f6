//! Repository adapter: the protocol engine's view of the registry.
//!
//! Translates constraint queries, domain requests and transactions into
//! [`RecordStore`] calls, scoped to one catalog when a scope filter is set.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::config::RepositoryConfig;
use crate::csw::context::ProtocolContext;
use crate::csw::filter::{Constraint, ScopeFilter, SortSpec};
use crate::csw::reconcile::{
    InsertLayerRequest, InsertRequest, InsertedRecord, ReconcileError, Reconciler, WriteMode,
};
use crate::metadata::{DublinCoreParser, MetadataParser};
use crate::registry::hooks::IndexTrigger;
use crate::registry::predicate::{quote_ident, Predicate};
use crate::registry::store::{RecordStore, StoreError};
use crate::registry::types::{
    Catalog, InsertDirection, Layer, OrderBy, Pagination, Record, Value,
};
use crate::spatial::geometry_area;

/// Errors surfaced to the protocol engine.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Unsupported resource type: {0}")]
    UnsupportedType(String),

    #[error("Duplicate record: layer {id} ({title}) already exists")]
    DuplicateRecord { id: i64, title: String },

    #[error("No layers to aggregate")]
    AggregateUndefined,

    #[error("Repository failure: {message}")]
    Failure {
        message: String,
        #[source]
        source: ReconcileError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ReconcileError> for RepositoryError {
    fn from(e: ReconcileError) -> Self {
        match e {
            ReconcileError::Duplicate { id, title } => Self::DuplicateRecord { id, title },
            other => Self::Failure {
                message: other.to_string(),
                source: other,
            },
        }
    }
}

/// How `query_domain` summarises a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainQueryType {
    /// Every distinct value.
    #[default]
    List,
    /// The `(min, max)` pair.
    Range,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainValues {
    Range(Value, Value),
    Counts(Vec<(Value, i64)>),
    Values(Vec<Value>),
}

/// Catalogue repository over a [`RecordStore`].
pub struct RepositoryAdapter {
    context: ProtocolContext,
    queryables: BTreeMap<String, String>,
    config: RepositoryConfig,
    scope: Option<ScopeFilter>,
    store: Arc<dyn RecordStore>,
    trigger: Arc<dyn IndexTrigger>,
    parser: Arc<dyn MetadataParser>,
    catalog: OnceCell<Catalog>,
}

impl RepositoryAdapter {
    pub async fn new(
        mut context: ProtocolContext,
        config: RepositoryConfig,
        store: Arc<dyn RecordStore>,
        trigger: Arc<dyn IndexTrigger>,
    ) -> Result<Self, RepositoryError> {
        let scope = config
            .scope_filter
            .as_deref()
            .map(ScopeFilter::parse)
            .transpose()
            .map_err(RepositoryError::Config)?;

        let queryables = context.flatten_queryables();

        if store.engine().is_file_based() {
            store.register_functions().await?;
        }

        if context.inject_resource_types(&config.service_types.resource_types()) {
            tracing::debug!("Restricted harvest and transaction resource types");
        }

        Ok(Self {
            context,
            queryables,
            config,
            scope,
            store,
            trigger,
            parser: Arc::new(DublinCoreParser),
            catalog: OnceCell::new(),
        })
    }

    /// Replace the metadata parser used by the write path.
    pub fn with_parser(mut self, parser: Arc<dyn MetadataParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn label(&self) -> &'static str {
        "HHypermap"
    }

    pub fn dbtype(&self) -> &'static str {
        self.store.engine().dbtype()
    }

    pub fn fts(&self) -> bool {
        false
    }

    pub fn local_ingest(&self) -> bool {
        true
    }

    /// Queryable name to column, across every type name.
    pub fn queryables(&self) -> &BTreeMap<String, String> {
        &self.queryables
    }

    pub fn context(&self) -> &ProtocolContext {
        &self.context
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    // ── Reads ──────────────────────────────────────────────────

    /// Layers with these uuids, falling back to services when none match.
    pub async fn query_ids(&self, ids: &[String]) -> Result<Vec<Record>, RepositoryError> {
        let uuids: Vec<Value> = ids
            .iter()
            .filter_map(|id| Uuid::parse_str(id.trim()).ok())
            .map(|id| Value::Text(id.to_string()))
            .collect();
        if uuids.is_empty() {
            return Ok(Vec::new());
        }

        let layers = self
            .store
            .layers(&self.scoped(Predicate::any_of("uuid", uuids.clone())), None, None)
            .await?;
        if !layers.is_empty() {
            return Ok(layers.into_iter().map(Record::Layer).collect());
        }

        let services = self
            .store
            .services(&self.scoped(Predicate::any_of("uuid", uuids)))
            .await?;
        Ok(services.into_iter().map(Record::Service).collect())
    }

    /// Summarise one layer field over the scoped layers.
    ///
    /// Always reads layers, whatever `typenames` asks for.
    pub async fn query_domain(
        &self,
        domain: &str,
        typenames: &[String],
        query_type: DomainQueryType,
        count: bool,
    ) -> Result<DomainValues, RepositoryError> {
        let column = quote_ident(self.column_name(domain)?);
        let filter = self.scoped(Predicate::all());
        tracing::debug!(
            "Domain query on {} ({:?}) for {:?}",
            column,
            query_type,
            typenames
        );

        let values = match (query_type, count) {
            (DomainQueryType::Range, _) => {
                let (min, max) = self.store.layer_range(&filter, &column).await?;
                DomainValues::Range(min, max)
            }
            (DomainQueryType::List, true) => {
                DomainValues::Counts(self.store.layer_value_counts(&filter, &column).await?)
            }
            (DomainQueryType::List, false) => {
                DomainValues::Values(self.store.layer_distinct(&filter, &column).await?)
            }
        };
        Ok(values)
    }

    /// Latest (or, unscoped, earliest) layer update as `YYYY-MM-DDTHH:MM:SSZ`.
    pub async fn query_insert(&self, direction: InsertDirection) -> Result<String, RepositoryError> {
        let filter = match direction {
            InsertDirection::Max => self.scoped(Predicate::all()),
            InsertDirection::Min => Predicate::all(),
        };
        let ts = self
            .store
            .layer_last_updated(&filter, direction)
            .await?
            .ok_or(RepositoryError::AggregateUndefined)?;
        Ok(ts.format("%Y-%m-%dT%H:%M:%SZ").to_string())
    }

    /// One page of matching layers and the total match count as a string.
    pub async fn query(
        &self,
        constraint: Option<&Constraint>,
        sortby: Option<&SortSpec>,
        typenames: &[String],
        maxrecords: Option<usize>,
        startposition: usize,
    ) -> Result<(String, Vec<Layer>), RepositoryError> {
        let query = constraint
            .filter(|c| !c.predicate.trim().is_empty())
            .map(Constraint::to_predicate)
            .unwrap_or_default();
        let filter = self.scoped(query);
        let limit = maxrecords.unwrap_or(self.config.page_size);
        tracing::debug!(
            "Query on {:?}: start {}, max {}, sort {:?}",
            typenames,
            startposition,
            limit,
            sortby
        );

        let total = self.store.count_layers(&filter).await?;
        let page = Pagination {
            offset: i64::try_from(startposition).unwrap_or(i64::MAX),
            limit: i64::try_from(limit).unwrap_or(i64::MAX),
        };

        let layers = match sortby {
            Some(sort) if sort.spatial => {
                let column = self.column_name(&sort.field)?;
                let mut scored: Vec<(f64, Layer)> = self
                    .store
                    .layers(&filter, None, None)
                    .await?
                    .into_iter()
                    .map(|layer| (geometry_area(layer.text_field(column)), layer))
                    .collect();
                if sort.descending {
                    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
                } else {
                    scored.sort_by(|a, b| a.0.total_cmp(&b.0));
                }
                scored
                    .into_iter()
                    .skip(startposition)
                    .take(limit)
                    .map(|(_, layer)| layer)
                    .collect()
            }
            Some(sort) => {
                let order = OrderBy {
                    column: quote_ident(self.column_name(&sort.field)?),
                    descending: sort.descending,
                };
                self.store.layers(&filter, Some(&order), Some(page)).await?
            }
            None => self.store.layers(&filter, None, Some(page)).await?,
        };

        Ok((total.to_string(), layers))
    }

    /// Scoped layers published at `source`.
    pub async fn query_source(&self, source: &str) -> Result<Vec<Layer>, RepositoryError> {
        let layers = self
            .store
            .layers(&self.scoped(Predicate::eq("url", source)), None, None)
            .await?;
        Ok(layers)
    }

    // ── Writes ─────────────────────────────────────────────────

    /// Insert a transaction document or register a harvest source.
    ///
    /// `insert_date` becomes the layer's `last_updated` when given.
    pub async fn insert(
        &self,
        request: InsertRequest,
        insert_date: Option<DateTime<Utc>>,
    ) -> Result<Vec<InsertedRecord>, RepositoryError> {
        match request {
            InsertRequest::Layer(request) => {
                self.write_layer(&request, WriteMode::Insert, insert_date).await
            }
            InsertRequest::Service(request) => {
                let (_, kind) = self
                    .config
                    .service_types
                    .resolve(&request.resource_type)
                    .ok_or_else(|| RepositoryError::UnsupportedType(request.resource_type.clone()))?;
                let catalog = self.catalog().await?;
                let records = self
                    .reconciler()
                    .register(&request.url, kind, catalog)
                    .await?;
                Ok(records)
            }
        }
    }

    /// Insert a transaction document, overwriting a matching unmonitored layer.
    pub async fn update(
        &self,
        request: InsertLayerRequest,
    ) -> Result<Vec<InsertedRecord>, RepositoryError> {
        self.write_layer(&request, WriteMode::Update, None).await
    }

    /// Delete scoped services matching `constraint`; returns how many went.
    ///
    /// Layers and endpoints are never deleted here.
    pub async fn delete(&self, constraint: &Constraint) -> Result<u64, RepositoryError> {
        let filter = self.scoped(constraint.to_predicate());
        let deleted = self.store.delete_services(&filter).await?;
        tracing::debug!("Deleted {} service(s)", deleted);
        Ok(deleted)
    }

    // ── Helpers ────────────────────────────────────────────────

    async fn write_layer(
        &self,
        request: &InsertLayerRequest,
        mode: WriteMode,
        insert_date: Option<DateTime<Utc>>,
    ) -> Result<Vec<InsertedRecord>, RepositoryError> {
        let catalog = self.catalog().await?;
        let record = self
            .reconciler()
            .write_layer(request, mode, catalog, insert_date)
            .await?;
        Ok(vec![record])
    }

    fn reconciler(&self) -> Reconciler<'_> {
        Reconciler {
            store: self.store.as_ref(),
            parser: self.parser.as_ref(),
            trigger: self.trigger.as_ref(),
            default_srs: &self.config.default_srs,
        }
    }

    /// Catalog named by the scope filter, looked up once.
    async fn catalog(&self) -> Result<Option<&Catalog>, RepositoryError> {
        let Some(scope) = &self.scope else {
            return Ok(None);
        };
        let catalog = self
            .catalog
            .get_or_try_init(|| async {
                self.store
                    .catalog(scope.catalog_id())
                    .await
                    .map_err(ReconcileError::Catalog)
            })
            .await?;
        Ok(Some(catalog))
    }

    fn scoped(&self, query: Predicate) -> Predicate {
        ScopeFilter::apply(self.scope.as_ref(), query)
    }

    /// Layer column behind a queryable name or a raw column name.
    fn column_name<'a>(&'a self, field: &'a str) -> Result<&'a str, StoreError> {
        let column = self
            .queryables
            .get(field)
            .map(String::as_str)
            .unwrap_or(field);
        if Layer::COLUMNS.contains(&column) {
            Ok(column)
        } else {
            Err(StoreError::InvalidInput(format!("unknown layer field: {field}")))
        }
    }
}
