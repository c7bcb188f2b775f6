//! Reconciliation pipeline: turns an insert or update request into store
//! writes inside one transaction.
//!
//! Layer requests check for an unmonitored duplicate, resolve the service
//! the document references, then save the parsed layer with its keywords
//! and hand the layer id to the index trigger once committed. Service
//! requests register an endpoint or a service row without any duplicate
//! check.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::metadata::{anytext, MetadataError, MetadataParser};
use crate::registry::hooks::IndexTrigger;
use crate::registry::predicate::Predicate;
use crate::registry::service_types::ServiceType;
use crate::registry::store::{RecordStore, StoreError, StoreTransaction};
use crate::registry::types::{Catalog, Layer, LayerUpdate, NewLayer};

/// Internal cause of a failed reconciliation run.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Layer {id} ({title}) already exists")]
    Duplicate { id: i64, title: String },

    #[error("Catalog lookup failed: {0}")]
    Catalog(#[source] StoreError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),
}

/// Whether an existing unmonitored layer is an error or a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    Insert,
    Update,
}

/// A parsed metadata document submitted through a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertLayerRequest {
    /// Schema the document declares; also the resource type of the insert.
    pub schema: String,
    pub name: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub xml: String,
    pub wkt_geometry: Option<String>,
}

/// A harvest registration: a resource type and a bare URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertServiceRequest {
    pub resource_type: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InsertRequest {
    Layer(InsertLayerRequest),
    Service(InsertServiceRequest),
}

/// Identifier and title of one written record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertedRecord {
    pub identifier: Uuid,
    pub title: String,
}

/// Collaborators of one pipeline run.
pub(crate) struct Reconciler<'a> {
    pub store: &'a dyn RecordStore,
    pub parser: &'a dyn MetadataParser,
    pub trigger: &'a dyn IndexTrigger,
    pub default_srs: &'a str,
}

impl Reconciler<'_> {
    /// Insert or update one layer, then schedule its re-index.
    pub async fn write_layer(
        &self,
        request: &InsertLayerRequest,
        mode: WriteMode,
        catalog: Option<&Catalog>,
        insert_date: Option<DateTime<Utc>>,
    ) -> Result<InsertedRecord, ReconcileError> {
        let mut tx = self.store.begin().await?;
        let layer = match self
            .layer_steps(&mut *tx, request, mode, catalog, insert_date)
            .await
        {
            Ok(layer) => layer,
            Err(e) => {
                if let Err(rb) = tx.rollback().await {
                    tracing::warn!("Rollback after failed layer write failed: {}", rb);
                }
                return Err(e);
            }
        };
        tx.commit().await?;

        tracing::debug!("Indexing layer with id {} on search engine", layer.id);
        self.trigger.schedule_reindex(layer.id, true).await;

        Ok(InsertedRecord {
            identifier: layer.uuid,
            title: layer.title,
        })
    }

    async fn layer_steps(
        &self,
        tx: &mut dyn StoreTransaction,
        request: &InsertLayerRequest,
        mode: WriteMode,
        catalog: Option<&Catalog>,
        insert_date: Option<DateTime<Utc>>,
    ) -> Result<Layer, ReconcileError> {
        let matches = tx
            .find_unmonitored_layers(&request.name, &request.title, &request.abstract_text)
            .await?;

        let existing = match (matches.first(), mode) {
            (Some(found), WriteMode::Insert) => {
                return Err(ReconcileError::Duplicate {
                    id: found.id,
                    title: found.title.clone(),
                });
            }
            (Some(found), WriteMode::Update) => Some(found.id),
            (None, _) => None,
        };

        let service = match self.parser.parse_service_reference(&request.xml)? {
            Some(reference) => {
                let service = tx
                    .get_or_create_service(&reference.url, reference.service_type)
                    .await?;
                let srs = tx.get_or_create_srs(self.default_srs).await?;
                tx.attach_srs(service.id, srs.id).await?;
                Some(service)
            }
            None => None,
        };

        let (layer, keywords) = self.parser.parse_layer(
            &request.schema,
            &request.xml,
            service.as_ref(),
            catalog,
            insert_date.unwrap_or_else(Utc::now),
        )?;

        if existing.is_some() {
            let ids: Vec<i64> = matches.iter().map(|l| l.id).collect();
            tracing::debug!("Overwriting {} unmonitored layer(s) in place", ids.len());
            tx.update_layers(&ids, &overwrite(request, &layer, &keywords))
                .await?;
        }

        let saved = tx.save_layer(&layer, existing).await?;
        if !keywords.is_empty() {
            tx.attach_keywords(saved.id, &keywords).await?;
        }
        Ok(saved)
    }

    /// Register an endpoint (catalogue type) or a service row for `url`.
    ///
    /// Returns every row of that kind now registered at `url`.
    pub async fn register(
        &self,
        url: &str,
        kind: ServiceType,
        catalog: Option<&Catalog>,
    ) -> Result<Vec<InsertedRecord>, ReconcileError> {
        let catalog_id = catalog.map(|c| c.id);
        let mut tx = self.store.begin().await?;
        let created = match kind {
            ServiceType::Csw => tx.create_endpoint(url, catalog_id).await.map(|_| ()),
            _ => tx.create_service(url, kind, catalog_id).await.map(|_| ()),
        };
        if let Err(e) = created {
            if let Err(rb) = tx.rollback().await {
                tracing::warn!("Rollback after failed registration failed: {}", rb);
            }
            return Err(e.into());
        }
        tx.commit().await?;
        tracing::debug!("Registered {} at {}", kind, url);

        let records = match kind {
            ServiceType::Csw => self
                .store
                .endpoints(&Predicate::eq("url", url))
                .await?
                .into_iter()
                .map(|endpoint| InsertedRecord {
                    identifier: endpoint.uuid,
                    title: endpoint.url,
                })
                .collect(),
            _ => self
                .store
                .services(&Predicate::eq("url", url).and(Predicate::eq("type", kind.as_str())))
                .await?
                .into_iter()
                .map(|service| InsertedRecord {
                    identifier: service.uuid,
                    title: service.title.unwrap_or_else(|| url.to_string()),
                })
                .collect(),
        };
        Ok(records)
    }
}

/// Overwrite for rows matching `request`: the request's identifying fields,
/// with geometry and search text taken from the parsed document when the
/// request does not carry them.
fn overwrite(request: &InsertLayerRequest, parsed: &NewLayer, keywords: &[String]) -> LayerUpdate {
    let mut parts = vec![request.title.as_str(), request.abstract_text.as_str()];
    parts.extend(keywords.iter().map(String::as_str));
    LayerUpdate {
        name: request.name.clone(),
        title: request.title.clone(),
        abstract_text: request.abstract_text.clone(),
        xml: request.xml.clone(),
        wkt_geometry: request
            .wkt_geometry
            .clone()
            .or_else(|| parsed.wkt_geometry.clone()),
        anytext: anytext(&parts),
    }
}
