//! Test utilities for the registry and repository modules.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::csw::InsertLayerRequest;
use crate::registry::hooks::{IndexTrigger, ReindexRequest};
use crate::registry::service_types::CSW_RESOURCE_TYPE;
use crate::registry::store::RecordStore;
use crate::registry::types::{Layer, NewLayer};

/// An index trigger that records every request instead of indexing.
#[derive(Default)]
pub struct RecordingIndexTrigger {
    requests: Mutex<Vec<ReindexRequest>>,
}

impl RecordingIndexTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<ReindexRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl IndexTrigger for RecordingIndexTrigger {
    async fn schedule_reindex(&self, layer_id: i64, use_cache: bool) {
        self.requests.lock().unwrap().push(ReindexRequest {
            layer_id,
            use_cache,
        });
    }
}

/// A Dublin Core record with two subjects and a fixed footprint.
///
/// `service` is the `(format, source)` pair declaring the backing service.
pub fn dc_record(
    identifier: &str,
    title: &str,
    abstract_text: &str,
    service: Option<(&str, &str)>,
) -> String {
    let service_xml = service
        .map(|(format, source)| {
            format!("<dc:format>{format}</dc:format><dc:source>{source}</dc:source>")
        })
        .unwrap_or_default();
    format!(
        r#"<csw:Record xmlns:csw="http://www.opengis.net/cat/csw/2.0.2" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dct="http://purl.org/dc/terms/" xmlns:ows="http://www.opengis.net/ows">
  <dc:identifier>{identifier}</dc:identifier>
  <dc:title>{title}</dc:title>
  <dct:abstract>{abstract_text}</dct:abstract>
  <dc:subject>roads</dc:subject>
  <dc:subject>transport</dc:subject>
  {service_xml}
  <ows:WGS84BoundingBox>
    <ows:LowerCorner>-10 -5</ows:LowerCorner>
    <ows:UpperCorner>10 5</ows:UpperCorner>
  </ows:WGS84BoundingBox>
</csw:Record>"#
    )
}

/// A transaction insert for a record built by [`dc_record`].
pub fn layer_request(
    identifier: &str,
    title: &str,
    abstract_text: &str,
    service: Option<(&str, &str)>,
) -> InsertLayerRequest {
    InsertLayerRequest {
        schema: CSW_RESOURCE_TYPE.to_string(),
        name: identifier.to_string(),
        title: title.to_string(),
        abstract_text: abstract_text.to_string(),
        xml: dc_record(identifier, title, abstract_text, service),
        wkt_geometry: None,
    }
}

pub fn new_layer(
    title: &str,
    wkt_geometry: Option<&str>,
    catalog_id: Option<i64>,
    last_updated: DateTime<Utc>,
) -> NewLayer {
    NewLayer {
        uuid: Uuid::new_v4(),
        name: title.to_lowercase(),
        title: title.to_string(),
        abstract_text: String::new(),
        url: None,
        xml: "<csw:Record/>".to_string(),
        wkt_geometry: wkt_geometry.map(str::to_string),
        anytext: title.to_string(),
        is_monitored: false,
        service_id: None,
        catalog_id,
        last_updated,
    }
}

/// Persist `layers` in one committed transaction.
pub async fn seed_layers(store: &dyn RecordStore, layers: &[NewLayer]) -> Vec<Layer> {
    let mut tx = store.begin().await.unwrap();
    let mut saved = Vec::with_capacity(layers.len());
    for layer in layers {
        saved.push(tx.save_layer(layer, None).await.unwrap());
    }
    tx.commit().await.unwrap();
    saved
}

/// Closed square of side `size` anchored at the origin.
pub fn square(size: f64) -> String {
    format!("POLYGON((0 0, {size} 0, {size} {size}, 0 {size}, 0 0))")
}
