//! Core record types for the layer/service registry.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::registry::service_types::ServiceType;

/// A harvested geospatial dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub url: Option<String>,
    pub xml: String,
    pub wkt_geometry: Option<String>,
    pub anytext: String,
    pub is_monitored: bool,
    pub service_id: Option<i64>,
    pub catalog_id: Option<i64>,
    pub last_updated: DateTime<Utc>,
}

impl Layer {
    /// Columns of the layer table.
    pub const COLUMNS: [&'static str; 13] = [
        "id",
        "uuid",
        "name",
        "title",
        "abstract",
        "url",
        "xml",
        "wkt_geometry",
        "anytext",
        "is_monitored",
        "service_id",
        "catalog_id",
        "last_updated",
    ];

    /// Text value of a layer column, by column name.
    ///
    /// Used where rows are ranked in memory rather than by the store.
    pub fn text_field(&self, column: &str) -> Option<&str> {
        match column {
            "name" => Some(&self.name),
            "title" => Some(&self.title),
            "abstract" => Some(&self.abstract_text),
            "url" => self.url.as_deref(),
            "xml" => Some(&self.xml),
            "wkt_geometry" => self.wkt_geometry.as_deref(),
            "anytext" => Some(&self.anytext),
            _ => None,
        }
    }
}

/// A layer about to be persisted, as built by the metadata parser.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLayer {
    pub uuid: Uuid,
    pub name: String,
    pub title: String,
    pub abstract_text: String,
    pub url: Option<String>,
    pub xml: String,
    pub wkt_geometry: Option<String>,
    pub anytext: String,
    pub is_monitored: bool,
    pub service_id: Option<i64>,
    pub catalog_id: Option<i64>,
    pub last_updated: DateTime<Utc>,
}

/// In-place overwrite applied to matching unmonitored layers on update.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerUpdate {
    pub name: String,
    pub title: String,
    pub abstract_text: String,
    pub xml: String,
    pub wkt_geometry: Option<String>,
    pub anytext: String,
}

/// A registered remote map/metadata service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub uuid: Uuid,
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    pub title: Option<String>,
    pub is_monitored: bool,
    pub catalog_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// A harvestable metadata source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: i64,
    pub uuid: Uuid,
    pub url: String,
    pub catalog_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Tenant/scope grouping for all records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// A coordinate-system code attached to services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialReferenceSystem {
    pub id: i64,
    pub code: String,
}

/// A record returned by identifier lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Layer(Layer),
    Service(Service),
}

/// A scalar bound to a predicate placeholder or read back from an aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Storage text form used for timestamps in file-based stores.
    pub fn timestamp_text(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub offset: i64,
    pub limit: i64,
}

/// Column ordering pushed down to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Already-quoted column identifier.
    pub column: String,
    pub descending: bool,
}

impl OrderBy {
    pub fn to_sql(&self) -> String {
        if self.descending {
            format!("{} DESC", self.column)
        } else {
            format!("{} ASC", self.column)
        }
    }
}

/// Which end of the `last_updated` range to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertDirection {
    Min,
    #[default]
    Max,
}
