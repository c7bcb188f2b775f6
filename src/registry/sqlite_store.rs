//! SQLite record store.
//!
//! One connection behind an async mutex. A transaction holds the lock from
//! `BEGIN IMMEDIATE` until commit or rollback, so writers are serialised.
//! Uuids and timestamps are stored as text; timestamps use a fixed-width
//! RFC 3339 form so text ordering matches time ordering.
//!
//! Statements run inline on the calling runtime worker. Meant for
//! in-process catalogues and tests; use [`PgRecordStore`](super::PgRecordStore)
//! for a shared deployment.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::{ToSqlOutput, Type, ValueRef};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::metadata::anytext_from_xml;
use crate::registry::predicate::{PlaceholderStyle, Predicate};
use crate::registry::service_types::ServiceType;
use crate::registry::store::{
    RecordStore, StorageEngine, StoreError, StoreResult, StoreTransaction,
};
use crate::registry::types::{
    Catalog, Endpoint, InsertDirection, Layer, LayerUpdate, NewLayer, OrderBy, Pagination,
    Service, SpatialReferenceSystem, Value,
};
use crate::spatial;

/// Schema for a fresh database.
pub const SCHEMA_SQL: &str = "\
PRAGMA foreign_keys = ON; \
CREATE TABLE IF NOT EXISTS catalogs ( \
    id INTEGER PRIMARY KEY AUTOINCREMENT, \
    name TEXT NOT NULL, \
    slug TEXT NOT NULL UNIQUE \
); \
CREATE TABLE IF NOT EXISTS services ( \
    id INTEGER PRIMARY KEY AUTOINCREMENT, \
    uuid TEXT NOT NULL UNIQUE, \
    url TEXT, \
    type TEXT NOT NULL, \
    title TEXT, \
    is_monitored INTEGER NOT NULL DEFAULT 0, \
    catalog_id INTEGER REFERENCES catalogs(id), \
    created_at TEXT NOT NULL \
); \
CREATE INDEX IF NOT EXISTS services_url_type_idx ON services (url, type); \
CREATE TABLE IF NOT EXISTS endpoints ( \
    id INTEGER PRIMARY KEY AUTOINCREMENT, \
    uuid TEXT NOT NULL UNIQUE, \
    url TEXT NOT NULL, \
    catalog_id INTEGER REFERENCES catalogs(id), \
    created_at TEXT NOT NULL \
); \
CREATE TABLE IF NOT EXISTS spatial_reference_systems ( \
    id INTEGER PRIMARY KEY AUTOINCREMENT, \
    code TEXT NOT NULL UNIQUE \
); \
CREATE TABLE IF NOT EXISTS service_srs ( \
    service_id INTEGER NOT NULL REFERENCES services(id) ON DELETE CASCADE, \
    srs_id INTEGER NOT NULL REFERENCES spatial_reference_systems(id) ON DELETE CASCADE, \
    PRIMARY KEY (service_id, srs_id) \
); \
CREATE TABLE IF NOT EXISTS layers ( \
    id INTEGER PRIMARY KEY AUTOINCREMENT, \
    uuid TEXT NOT NULL UNIQUE, \
    name TEXT NOT NULL, \
    title TEXT NOT NULL, \
    abstract TEXT NOT NULL DEFAULT '', \
    url TEXT, \
    xml TEXT NOT NULL, \
    wkt_geometry TEXT, \
    anytext TEXT NOT NULL DEFAULT '', \
    is_monitored INTEGER NOT NULL DEFAULT 0, \
    service_id INTEGER REFERENCES services(id) ON DELETE SET NULL, \
    catalog_id INTEGER REFERENCES catalogs(id), \
    last_updated TEXT NOT NULL \
); \
CREATE INDEX IF NOT EXISTS layers_identity_idx \
    ON layers (name, title, abstract) WHERE is_monitored = 0; \
CREATE TABLE IF NOT EXISTS keywords ( \
    id INTEGER PRIMARY KEY AUTOINCREMENT, \
    name TEXT NOT NULL UNIQUE \
); \
CREATE TABLE IF NOT EXISTS layer_keywords ( \
    layer_id INTEGER NOT NULL REFERENCES layers(id) ON DELETE CASCADE, \
    keyword_id INTEGER NOT NULL REFERENCES keywords(id) ON DELETE CASCADE, \
    PRIMARY KEY (layer_id, keyword_id) \
);";

const LAYER_COLUMNS: &str = "id, uuid, name, title, abstract, url, xml, wkt_geometry, anytext, \
     is_monitored, service_id, catalog_id, last_updated";
const SERVICE_COLUMNS: &str = "id, uuid, url, type, title, is_monitored, catalog_id, created_at";
const ENDPOINT_COLUMNS: &str = "id, uuid, url, catalog_id, created_at";

const STYLE: PlaceholderStyle = PlaceholderStyle::Question;

impl rusqlite::ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        use rusqlite::types::Value as Sql;
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(Sql::Null),
            Value::Bool(v) => ToSqlOutput::Owned(Sql::Integer(i64::from(*v))),
            Value::Int(v) => ToSqlOutput::Owned(Sql::Integer(*v)),
            Value::Float(v) => ToSqlOutput::Owned(Sql::Real(*v)),
            Value::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            Value::Timestamp(ts) => ToSqlOutput::Owned(Sql::Text(Value::timestamp_text(ts))),
        })
    }
}

fn value_from_ref(v: ValueRef<'_>) -> Value {
    match v {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(t) | ValueRef::Blob(t) => {
            Value::Text(String::from_utf8_lossy(t).into_owned())
        }
    }
}

/// [`RecordStore`] over a single SQLite connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) a database file and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Insert a catalog row.
    pub async fn create_catalog(&self, name: &str, slug: &str) -> StoreResult<Catalog> {
        let conn = self.conn.lock().await;
        let catalog = conn.query_row(
            "INSERT INTO catalogs (name, slug) VALUES (?1, ?2) RETURNING id, name, slug",
            params![name, slug],
            row_to_catalog,
        )?;
        Ok(catalog)
    }
}

#[async_trait::async_trait]
impl RecordStore for SqliteStore {
    fn engine(&self) -> StorageEngine {
        StorageEngine::Sqlite
    }

    async fn register_functions(&self) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

        conn.create_scalar_function("query_spatial", 4, flags, |ctx| {
            let data: Option<String> = ctx.get(0)?;
            let input: String = ctx.get(1)?;
            let predicate: String = ctx.get(2)?;
            let distance = match ctx.get_raw(3) {
                ValueRef::Integer(i) => i as f64,
                ValueRef::Real(f) => f,
                ValueRef::Text(t) => std::str::from_utf8(t)
                    .ok()
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(0.0),
                _ => 0.0,
            };
            Ok(spatial::query_spatial(data.as_deref(), &input, &predicate, distance))
        })?;

        conn.create_scalar_function("get_anytext", 1, flags, |ctx| {
            let xml: Option<String> = ctx.get(0)?;
            Ok(xml.map(|x| anytext_from_xml(&x)))
        })?;

        conn.create_scalar_function("get_geometry_area", 1, flags, |ctx| {
            let wkt: Option<String> = ctx.get(0)?;
            Ok(spatial::geometry_area(wkt.as_deref()).to_string())
        })?;

        tracing::info!("Registered query_spatial, get_anytext and get_geometry_area on SQLite");
        Ok(())
    }

    async fn catalog(&self, id: i64) -> StoreResult<Catalog> {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT id, name, slug FROM catalogs WHERE id = ?1",
            params![id],
            row_to_catalog,
        )
        .optional()?
        .ok_or_else(|| StoreError::NotFound {
            entity: "catalog".into(),
            id: id.to_string(),
        })
    }

    async fn layers(
        &self,
        filter: &Predicate,
        order: Option<&OrderBy>,
        page: Option<Pagination>,
    ) -> StoreResult<Vec<Layer>> {
        let order_sql = match order {
            Some(order) => format!("{}, id ASC", order.to_sql()),
            None => "id ASC".to_string(),
        };
        let limit_sql = page
            .map(|p| format!(" LIMIT {} OFFSET {}", p.limit.max(0), p.offset.max(0)))
            .unwrap_or_default();
        let sql = format!(
            "SELECT {LAYER_COLUMNS} FROM layers{} ORDER BY {order_sql}{limit_sql}",
            filter.where_clause(STYLE)?
        );
        let conn = self.conn.lock().await;
        select_layers(&conn, &sql, filter.params())
    }

    async fn count_layers(&self, filter: &Predicate) -> StoreResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM layers{}", filter.where_clause(STYLE)?);
        let conn = self.conn.lock().await;
        let n = conn.query_row(&sql, params_from_iter(filter.params()), |row| row.get(0))?;
        Ok(n)
    }

    async fn services(&self, filter: &Predicate) -> StoreResult<Vec<Service>> {
        let sql = format!(
            "SELECT {SERVICE_COLUMNS} FROM services{} ORDER BY id",
            filter.where_clause(STYLE)?
        );
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(filter.params()), row_to_service)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    async fn endpoints(&self, filter: &Predicate) -> StoreResult<Vec<Endpoint>> {
        let sql = format!(
            "SELECT {ENDPOINT_COLUMNS} FROM endpoints{} ORDER BY id",
            filter.where_clause(STYLE)?
        );
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(filter.params()), row_to_endpoint)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    async fn layer_range(&self, filter: &Predicate, column: &str) -> StoreResult<(Value, Value)> {
        let sql = format!(
            "SELECT MIN({column}), MAX({column}) FROM layers{}",
            filter.where_clause(STYLE)?
        );
        let conn = self.conn.lock().await;
        let range = conn.query_row(&sql, params_from_iter(filter.params()), |row| {
            Ok((value_from_ref(row.get_ref(0)?), value_from_ref(row.get_ref(1)?)))
        })?;
        Ok(range)
    }

    async fn layer_value_counts(
        &self,
        filter: &Predicate,
        column: &str,
    ) -> StoreResult<Vec<(Value, i64)>> {
        let sql = format!(
            "SELECT {column}, COUNT({column}) FROM layers{} GROUP BY {column} ORDER BY MIN(id)",
            filter.where_clause(STYLE)?
        );
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(filter.params()), |row| {
            Ok((value_from_ref(row.get_ref(0)?), row.get::<_, i64>(1)?))
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    async fn layer_distinct(&self, filter: &Predicate, column: &str) -> StoreResult<Vec<Value>> {
        let sql = format!(
            "SELECT {column} FROM layers{} GROUP BY {column} ORDER BY MIN(id)",
            filter.where_clause(STYLE)?
        );
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(filter.params()), |row| {
            Ok(value_from_ref(row.get_ref(0)?))
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    async fn layer_last_updated(
        &self,
        filter: &Predicate,
        direction: InsertDirection,
    ) -> StoreResult<Option<DateTime<Utc>>> {
        let aggregate = match direction {
            InsertDirection::Min => "MIN",
            InsertDirection::Max => "MAX",
        };
        let sql = format!(
            "SELECT {aggregate}(last_updated) FROM layers{}",
            filter.where_clause(STYLE)?
        );
        let conn = self.conn.lock().await;
        let text: Option<String> =
            conn.query_row(&sql, params_from_iter(filter.params()), |row| row.get(0))?;
        text.map(|t| parse_timestamp(&t).map_err(|e| StoreError::Database(e.to_string())))
            .transpose()
    }

    async fn layer_keywords(&self, layer_id: i64) -> StoreResult<Vec<String>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT k.name FROM keywords k \
             JOIN layer_keywords lk ON lk.keyword_id = k.id \
             WHERE lk.layer_id = ?1 ORDER BY k.name",
        )?;
        let rows = stmt.query_map(params![layer_id], |row| row.get(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    async fn service_srs(&self, service_id: i64) -> StoreResult<Vec<SpatialReferenceSystem>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT s.id, s.code FROM spatial_reference_systems s \
             JOIN service_srs ss ON ss.srs_id = s.id \
             WHERE ss.service_id = ?1 ORDER BY s.code",
        )?;
        let rows = stmt.query_map(params![service_id], row_to_srs)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    async fn delete_services(&self, filter: &Predicate) -> StoreResult<u64> {
        let sql = format!("DELETE FROM services{}", filter.where_clause(STYLE)?);
        let conn = self.conn.lock().await;
        let n = conn.execute(&sql, params_from_iter(filter.params()))?;
        Ok(n as u64)
    }

    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        let conn = Arc::clone(&self.conn).lock_owned().await;
        conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(Box::new(SqliteTransaction { conn: Some(conn) }))
    }
}

/// The store's connection, held for the life of one transaction.
struct SqliteTransaction {
    conn: Option<OwnedMutexGuard<Connection>>,
}

impl SqliteTransaction {
    fn conn(&self) -> StoreResult<&Connection> {
        self.conn.as_deref().ok_or(StoreError::TransactionClosed)
    }

    fn finish(&mut self, statement: &str) -> StoreResult<()> {
        let conn = self.conn.take().ok_or(StoreError::TransactionClosed)?;
        conn.execute_batch(statement)?;
        Ok(())
    }
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(e) = conn.execute_batch("ROLLBACK") {
                tracing::warn!("Rollback of abandoned transaction failed: {}", e);
            }
        }
    }
}

#[async_trait::async_trait]
impl StoreTransaction for SqliteTransaction {
    async fn find_unmonitored_layers(
        &mut self,
        name: &str,
        title: &str,
        abstract_text: &str,
    ) -> StoreResult<Vec<Layer>> {
        let sql = format!(
            "SELECT {LAYER_COLUMNS} FROM layers \
             WHERE name = ?1 AND title = ?2 AND abstract = ?3 AND is_monitored = 0 \
             ORDER BY id"
        );
        let params: [Value; 3] = [name.into(), title.into(), abstract_text.into()];
        select_layers(self.conn()?, &sql, &params)
    }

    async fn update_layers(&mut self, ids: &[i64], update: &LayerUpdate) -> StoreResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let slots = (0..ids.len())
            .map(|i| format!("?{}", i + 8))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE layers SET \
               name = ?1, title = ?2, abstract = ?3, is_monitored = 0, \
               xml = ?4, wkt_geometry = ?5, anytext = ?6, last_updated = ?7 \
             WHERE id IN ({slots})"
        );
        let mut values: Vec<Value> = vec![
            update.name.as_str().into(),
            update.title.as_str().into(),
            update.abstract_text.as_str().into(),
            update.xml.as_str().into(),
            update.wkt_geometry.clone().into(),
            update.anytext.as_str().into(),
            Utc::now().into(),
        ];
        values.extend(ids.iter().map(|id| Value::Int(*id)));
        let n = self.conn()?.execute(&sql, params_from_iter(&values))?;
        Ok(n as u64)
    }

    async fn get_or_create_service(
        &mut self,
        url: &str,
        kind: ServiceType,
    ) -> StoreResult<Service> {
        let conn = self.conn()?;
        let existing = conn
            .query_row(
                &format!(
                    "SELECT {SERVICE_COLUMNS} FROM services \
                     WHERE url = ?1 AND type = ?2 AND is_monitored = 0 \
                     ORDER BY id LIMIT 1"
                ),
                params![url, kind.as_str()],
                row_to_service,
            )
            .optional()?;
        if let Some(service) = existing {
            return Ok(service);
        }
        insert_service(conn, url, kind, None)
    }

    async fn get_or_create_srs(&mut self, code: &str) -> StoreResult<SpatialReferenceSystem> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO spatial_reference_systems (code) VALUES (?1)",
            params![code],
        )?;
        let srs = conn.query_row(
            "SELECT id, code FROM spatial_reference_systems WHERE code = ?1",
            params![code],
            row_to_srs,
        )?;
        Ok(srs)
    }

    async fn attach_srs(&mut self, service_id: i64, srs_id: i64) -> StoreResult<()> {
        self.conn()?.execute(
            "INSERT OR IGNORE INTO service_srs (service_id, srs_id) VALUES (?1, ?2)",
            params![service_id, srs_id],
        )?;
        Ok(())
    }

    async fn save_layer(&mut self, layer: &NewLayer, existing: Option<i64>) -> StoreResult<Layer> {
        let conn = self.conn()?;
        let mut values: Vec<Value> = vec![
            layer.name.as_str().into(),
            layer.title.as_str().into(),
            layer.abstract_text.as_str().into(),
            layer.url.clone().into(),
            layer.xml.as_str().into(),
            layer.wkt_geometry.clone().into(),
            layer.anytext.as_str().into(),
            layer.is_monitored.into(),
            layer.service_id.into(),
            layer.catalog_id.into(),
            layer.last_updated.into(),
        ];
        match existing {
            Some(id) => {
                values.push(Value::Int(id));
                conn.query_row(
                    &format!(
                        "UPDATE layers SET \
                           name = ?1, title = ?2, abstract = ?3, url = ?4, xml = ?5, \
                           wkt_geometry = ?6, anytext = ?7, is_monitored = ?8, \
                           service_id = ?9, catalog_id = ?10, last_updated = ?11 \
                         WHERE id = ?12 \
                         RETURNING {LAYER_COLUMNS}"
                    ),
                    params_from_iter(&values),
                    row_to_layer,
                )
                .optional()?
                .ok_or_else(|| StoreError::NotFound {
                    entity: "layer".into(),
                    id: id.to_string(),
                })
            }
            None => {
                values.push(layer.uuid.to_string().into());
                let layer = conn.query_row(
                    &format!(
                        "INSERT INTO layers \
                         (name, title, abstract, url, xml, wkt_geometry, anytext, \
                          is_monitored, service_id, catalog_id, last_updated, uuid) \
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12) \
                         RETURNING {LAYER_COLUMNS}"
                    ),
                    params_from_iter(&values),
                    row_to_layer,
                )?;
                Ok(layer)
            }
        }
    }

    async fn attach_keywords(&mut self, layer_id: i64, keywords: &[String]) -> StoreResult<()> {
        let conn = self.conn()?;
        for keyword in keywords {
            conn.execute(
                "INSERT OR IGNORE INTO keywords (name) VALUES (?1)",
                params![keyword],
            )?;
            let keyword_id: i64 = conn.query_row(
                "SELECT id FROM keywords WHERE name = ?1",
                params![keyword],
                |row| row.get(0),
            )?;
            conn.execute(
                "INSERT OR IGNORE INTO layer_keywords (layer_id, keyword_id) VALUES (?1, ?2)",
                params![layer_id, keyword_id],
            )?;
        }
        Ok(())
    }

    async fn create_endpoint(
        &mut self,
        url: &str,
        catalog_id: Option<i64>,
    ) -> StoreResult<Endpoint> {
        let endpoint = self.conn()?.query_row(
            &format!(
                "INSERT INTO endpoints (uuid, url, catalog_id, created_at) \
                 VALUES (?1, ?2, ?3, ?4) \
                 RETURNING {ENDPOINT_COLUMNS}"
            ),
            params![
                Uuid::new_v4().to_string(),
                url,
                catalog_id,
                Value::timestamp_text(&Utc::now())
            ],
            row_to_endpoint,
        )?;
        Ok(endpoint)
    }

    async fn create_service(
        &mut self,
        url: &str,
        kind: ServiceType,
        catalog_id: Option<i64>,
    ) -> StoreResult<Service> {
        insert_service(self.conn()?, url, kind, catalog_id)
    }

    async fn commit(mut self: Box<Self>) -> StoreResult<()> {
        self.finish("COMMIT")
    }

    async fn rollback(mut self: Box<Self>) -> StoreResult<()> {
        self.finish("ROLLBACK")
    }
}

// ── Helpers ─────────────────────────────────────────────────────

fn select_layers(conn: &Connection, sql: &str, params: &[Value]) -> StoreResult<Vec<Layer>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params_from_iter(params), row_to_layer)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

fn insert_service(
    conn: &Connection,
    url: &str,
    kind: ServiceType,
    catalog_id: Option<i64>,
) -> StoreResult<Service> {
    let service = conn.query_row(
        &format!(
            "INSERT INTO services (uuid, url, type, is_monitored, catalog_id, created_at) \
             VALUES (?1, ?2, ?3, 0, ?4, ?5) \
             RETURNING {SERVICE_COLUMNS}"
        ),
        params![
            Uuid::new_v4().to_string(),
            url,
            kind.as_str(),
            catalog_id,
            Value::timestamp_text(&Utc::now())
        ],
        row_to_service,
    )?;
    Ok(service)
}

fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(text).map(|ts| ts.with_timezone(&Utc))
}

fn conversion_error<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn get_uuid(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let text: String = row.get(idx)?;
    Uuid::parse_str(&text).map_err(|e| conversion_error(idx, e))
}

fn get_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    parse_timestamp(&text).map_err(|e| conversion_error(idx, e))
}

fn row_to_layer(row: &Row<'_>) -> rusqlite::Result<Layer> {
    Ok(Layer {
        id: row.get(0)?,
        uuid: get_uuid(row, 1)?,
        name: row.get(2)?,
        title: row.get(3)?,
        abstract_text: row.get(4)?,
        url: row.get(5)?,
        xml: row.get(6)?,
        wkt_geometry: row.get(7)?,
        anytext: row.get(8)?,
        is_monitored: row.get(9)?,
        service_id: row.get(10)?,
        catalog_id: row.get(11)?,
        last_updated: get_timestamp(row, 12)?,
    })
}

fn row_to_service(row: &Row<'_>) -> rusqlite::Result<Service> {
    let kind: String = row.get(3)?;
    Ok(Service {
        id: row.get(0)?,
        uuid: get_uuid(row, 1)?,
        url: row.get(2)?,
        service_type: kind.parse::<ServiceType>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, Type::Text, e.into())
        })?,
        title: row.get(4)?,
        is_monitored: row.get(5)?,
        catalog_id: row.get(6)?,
        created_at: get_timestamp(row, 7)?,
    })
}

fn row_to_endpoint(row: &Row<'_>) -> rusqlite::Result<Endpoint> {
    Ok(Endpoint {
        id: row.get(0)?,
        uuid: get_uuid(row, 1)?,
        url: row.get(2)?,
        catalog_id: row.get(3)?,
        created_at: get_timestamp(row, 4)?,
    })
}

fn row_to_catalog(row: &Row<'_>) -> rusqlite::Result<Catalog> {
    Ok(Catalog {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
    })
}

fn row_to_srs(row: &Row<'_>) -> rusqlite::Result<SpatialReferenceSystem> {
    Ok(SpatialReferenceSystem {
        id: row.get(0)?,
        code: row.get(1)?,
    })
}
