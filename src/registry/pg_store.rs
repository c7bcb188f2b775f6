//! PostgreSQL record store.
//!
//! Layers, services and endpoints live in plain tables; geometry is kept as
//! WKT text next to whatever PostGIS columns an installation adds. Every
//! reconciliation run holds one pooled connection inside `BEGIN ... COMMIT`.

use bytes::BytesMut;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Object, Pool};
use tokio_postgres::types::{to_sql_checked, IsNull, ToSql, Type};
use uuid::Uuid;

use crate::registry::predicate::{PlaceholderStyle, Predicate};
use crate::registry::service_types::ServiceType;
use crate::registry::store::{
    RecordStore, StorageEngine, StoreError, StoreResult, StoreTransaction,
};
use crate::registry::types::{
    Catalog, Endpoint, InsertDirection, Layer, LayerUpdate, NewLayer, OrderBy, Pagination,
    Service, SpatialReferenceSystem, Value,
};

/// Schema for a fresh database.
pub const SCHEMA_SQL: &str = "\
CREATE TABLE IF NOT EXISTS catalogs ( \
    id BIGSERIAL PRIMARY KEY, \
    name TEXT NOT NULL, \
    slug TEXT NOT NULL UNIQUE \
); \
CREATE TABLE IF NOT EXISTS services ( \
    id BIGSERIAL PRIMARY KEY, \
    uuid UUID NOT NULL UNIQUE, \
    url TEXT, \
    type TEXT NOT NULL, \
    title TEXT, \
    is_monitored BOOLEAN NOT NULL DEFAULT FALSE, \
    catalog_id BIGINT REFERENCES catalogs(id), \
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW() \
); \
CREATE INDEX IF NOT EXISTS services_url_type_idx ON services (url, type); \
CREATE TABLE IF NOT EXISTS endpoints ( \
    id BIGSERIAL PRIMARY KEY, \
    uuid UUID NOT NULL UNIQUE, \
    url TEXT NOT NULL, \
    catalog_id BIGINT REFERENCES catalogs(id), \
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW() \
); \
CREATE TABLE IF NOT EXISTS spatial_reference_systems ( \
    id BIGSERIAL PRIMARY KEY, \
    code TEXT NOT NULL UNIQUE \
); \
CREATE TABLE IF NOT EXISTS service_srs ( \
    service_id BIGINT NOT NULL REFERENCES services(id) ON DELETE CASCADE, \
    srs_id BIGINT NOT NULL REFERENCES spatial_reference_systems(id) ON DELETE CASCADE, \
    PRIMARY KEY (service_id, srs_id) \
); \
CREATE TABLE IF NOT EXISTS layers ( \
    id BIGSERIAL PRIMARY KEY, \
    uuid UUID NOT NULL UNIQUE, \
    name TEXT NOT NULL, \
    title TEXT NOT NULL, \
    abstract TEXT NOT NULL DEFAULT '', \
    url TEXT, \
    xml TEXT NOT NULL, \
    wkt_geometry TEXT, \
    anytext TEXT NOT NULL DEFAULT '', \
    is_monitored BOOLEAN NOT NULL DEFAULT FALSE, \
    service_id BIGINT REFERENCES services(id) ON DELETE SET NULL, \
    catalog_id BIGINT REFERENCES catalogs(id), \
    last_updated TIMESTAMPTZ NOT NULL DEFAULT NOW() \
); \
CREATE INDEX IF NOT EXISTS layers_identity_idx \
    ON layers (name, title, abstract) WHERE is_monitored = FALSE; \
CREATE TABLE IF NOT EXISTS keywords ( \
    id BIGSERIAL PRIMARY KEY, \
    name TEXT NOT NULL UNIQUE \
); \
CREATE TABLE IF NOT EXISTS layer_keywords ( \
    layer_id BIGINT NOT NULL REFERENCES layers(id) ON DELETE CASCADE, \
    keyword_id BIGINT NOT NULL REFERENCES keywords(id) ON DELETE CASCADE, \
    PRIMARY KEY (layer_id, keyword_id) \
);";

const LAYER_COLUMNS: &str = "id, uuid, name, title, abstract, url, xml, wkt_geometry, anytext, \
     is_monitored, service_id, catalog_id, last_updated";
const SERVICE_COLUMNS: &str = "id, uuid, url, type, title, is_monitored, catalog_id, created_at";
const ENDPOINT_COLUMNS: &str = "id, uuid, url, catalog_id, created_at";

const STYLE: PlaceholderStyle = PlaceholderStyle::Dollar;

// ── Parameter binding ───────────────────────────────────────────

impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql(ty, out),
            Value::Int(v) => {
                if *ty == Type::INT2 {
                    i16::try_from(*v)?.to_sql(ty, out)
                } else if *ty == Type::INT4 {
                    i32::try_from(*v)?.to_sql(ty, out)
                } else if *ty == Type::FLOAT8 {
                    (*v as f64).to_sql(ty, out)
                } else if *ty == Type::TEXT || *ty == Type::VARCHAR {
                    v.to_string().to_sql(ty, out)
                } else {
                    v.to_sql(ty, out)
                }
            }
            Value::Float(v) => {
                if *ty == Type::FLOAT4 {
                    (*v as f32).to_sql(ty, out)
                } else {
                    v.to_sql(ty, out)
                }
            }
            Value::Text(v) => {
                if *ty == Type::UUID {
                    Uuid::parse_str(v)?.to_sql(ty, out)
                } else {
                    v.to_sql(ty, out)
                }
            }
            Value::Timestamp(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn bind(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

/// Read an arbitrary column back as a [`Value`].
fn column_value(row: &tokio_postgres::Row, idx: usize) -> StoreResult<Value> {
    let ty = row.columns()[idx].type_().clone();
    let value = if ty == Type::BOOL {
        row.try_get::<_, Option<bool>>(idx)?.map(Value::Bool)
    } else if ty == Type::INT2 {
        row.try_get::<_, Option<i16>>(idx)?.map(|v| Value::Int(v.into()))
    } else if ty == Type::INT4 {
        row.try_get::<_, Option<i32>>(idx)?.map(|v| Value::Int(v.into()))
    } else if ty == Type::INT8 {
        row.try_get::<_, Option<i64>>(idx)?.map(Value::Int)
    } else if ty == Type::FLOAT4 {
        row.try_get::<_, Option<f32>>(idx)?.map(|v| Value::Float(v.into()))
    } else if ty == Type::FLOAT8 {
        row.try_get::<_, Option<f64>>(idx)?.map(Value::Float)
    } else if ty == Type::TIMESTAMPTZ {
        row.try_get::<_, Option<DateTime<Utc>>>(idx)?.map(Value::Timestamp)
    } else if ty == Type::UUID {
        row.try_get::<_, Option<Uuid>>(idx)?.map(|v| Value::Text(v.to_string()))
    } else {
        row.try_get::<_, Option<String>>(idx)?.map(Value::Text)
    };
    Ok(value.unwrap_or(Value::Null))
}

// ── Store ───────────────────────────────────────────────────────

/// [`RecordStore`] over a deadpool PostgreSQL pool.
pub struct PgRecordStore {
    pool: Pool,
}

impl PgRecordStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create any missing tables and indexes.
    pub async fn migrate(&self) -> StoreResult<()> {
        let client = self.pool.get().await?;
        client.batch_execute(SCHEMA_SQL).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl RecordStore for PgRecordStore {
    fn engine(&self) -> StorageEngine {
        StorageEngine::Postgres
    }

    async fn register_functions(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn catalog(&self, id: i64) -> StoreResult<Catalog> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt("SELECT id, name, slug FROM catalogs WHERE id = $1", &[&id])
            .await?
            .ok_or_else(|| StoreError::NotFound {
                entity: "catalog".into(),
                id: id.to_string(),
            })?;
        Ok(row_to_catalog(&row))
    }

    async fn layers(
        &self,
        filter: &Predicate,
        order: Option<&OrderBy>,
        page: Option<Pagination>,
    ) -> StoreResult<Vec<Layer>> {
        let client = self.pool.get().await?;
        let order_sql = match order {
            Some(order) => format!("{}, id ASC", order.to_sql()),
            None => "id ASC".to_string(),
        };
        let limit_sql = page
            .map(|p| format!(" LIMIT {} OFFSET {}", p.limit.max(0), p.offset.max(0)))
            .unwrap_or_default();
        let query = format!(
            "SELECT {LAYER_COLUMNS} FROM layers{} ORDER BY {order_sql}{limit_sql}",
            filter.where_clause(STYLE)?
        );
        let rows = client.query(&query, &bind(filter.params())).await?;
        Ok(rows.iter().map(row_to_layer).collect())
    }

    async fn count_layers(&self, filter: &Predicate) -> StoreResult<i64> {
        let client = self.pool.get().await?;
        let query = format!("SELECT COUNT(*) FROM layers{}", filter.where_clause(STYLE)?);
        let row = client.query_one(&query, &bind(filter.params())).await?;
        Ok(row.get(0))
    }

    async fn services(&self, filter: &Predicate) -> StoreResult<Vec<Service>> {
        let client = self.pool.get().await?;
        let query = format!(
            "SELECT {SERVICE_COLUMNS} FROM services{} ORDER BY id",
            filter.where_clause(STYLE)?
        );
        let rows = client.query(&query, &bind(filter.params())).await?;
        rows.iter().map(row_to_service).collect()
    }

    async fn endpoints(&self, filter: &Predicate) -> StoreResult<Vec<Endpoint>> {
        let client = self.pool.get().await?;
        let query = format!(
            "SELECT {ENDPOINT_COLUMNS} FROM endpoints{} ORDER BY id",
            filter.where_clause(STYLE)?
        );
        let rows = client.query(&query, &bind(filter.params())).await?;
        Ok(rows.iter().map(row_to_endpoint).collect())
    }

    async fn layer_range(&self, filter: &Predicate, column: &str) -> StoreResult<(Value, Value)> {
        let client = self.pool.get().await?;
        let query = format!(
            "SELECT MIN({column}), MAX({column}) FROM layers{}",
            filter.where_clause(STYLE)?
        );
        let row = client.query_one(&query, &bind(filter.params())).await?;
        Ok((column_value(&row, 0)?, column_value(&row, 1)?))
    }

    async fn layer_value_counts(
        &self,
        filter: &Predicate,
        column: &str,
    ) -> StoreResult<Vec<(Value, i64)>> {
        let client = self.pool.get().await?;
        let query = format!(
            "SELECT {column}, COUNT({column}) FROM layers{} GROUP BY {column} ORDER BY MIN(id)",
            filter.where_clause(STYLE)?
        );
        let rows = client.query(&query, &bind(filter.params())).await?;
        rows.iter()
            .map(|row| Ok((column_value(row, 0)?, row.try_get::<_, i64>(1)?)))
            .collect()
    }

    async fn layer_distinct(&self, filter: &Predicate, column: &str) -> StoreResult<Vec<Value>> {
        let client = self.pool.get().await?;
        let query = format!(
            "SELECT {column} FROM layers{} GROUP BY {column} ORDER BY MIN(id)",
            filter.where_clause(STYLE)?
        );
        let rows = client.query(&query, &bind(filter.params())).await?;
        rows.iter().map(|row| column_value(row, 0)).collect()
    }

    async fn layer_last_updated(
        &self,
        filter: &Predicate,
        direction: InsertDirection,
    ) -> StoreResult<Option<DateTime<Utc>>> {
        let client = self.pool.get().await?;
        let aggregate = match direction {
            InsertDirection::Min => "MIN",
            InsertDirection::Max => "MAX",
        };
        let query = format!(
            "SELECT {aggregate}(last_updated) FROM layers{}",
            filter.where_clause(STYLE)?
        );
        let row = client.query_one(&query, &bind(filter.params())).await?;
        Ok(row.try_get(0)?)
    }

    async fn layer_keywords(&self, layer_id: i64) -> StoreResult<Vec<String>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                "SELECT k.name FROM keywords k \
                 JOIN layer_keywords lk ON lk.keyword_id = k.id \
                 WHERE lk.layer_id = $1 ORDER BY k.name",
                &[&layer_id],
            )
            .await?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    async fn service_srs(&self, service_id: i64) -> StoreResult<Vec<SpatialReferenceSystem>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                "SELECT s.id, s.code FROM spatial_reference_systems s \
                 JOIN service_srs ss ON ss.srs_id = s.id \
                 WHERE ss.service_id = $1 ORDER BY s.code",
                &[&service_id],
            )
            .await?;
        Ok(rows.iter().map(row_to_srs).collect())
    }

    async fn delete_services(&self, filter: &Predicate) -> StoreResult<u64> {
        let client = self.pool.get().await?;
        let query = format!("DELETE FROM services{}", filter.where_clause(STYLE)?);
        let n = client.execute(&query, &bind(filter.params())).await?;
        Ok(n)
    }

    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        let client = self.pool.get().await?;
        client.batch_execute("BEGIN").await?;
        Ok(Box::new(PgTransaction {
            client: Some(client),
        }))
    }
}

// ── Transaction ─────────────────────────────────────────────────

/// One pooled connection inside an open transaction.
struct PgTransaction {
    client: Option<Object>,
}

impl PgTransaction {
    fn client(&self) -> StoreResult<&Object> {
        self.client.as_ref().ok_or(StoreError::TransactionClosed)
    }

    async fn finish(&mut self, statement: &str) -> StoreResult<()> {
        let client = self.client.take().ok_or(StoreError::TransactionClosed)?;
        client.batch_execute(statement).await?;
        Ok(())
    }
}

impl Drop for PgTransaction {
    fn drop(&mut self) {
        let Some(client) = self.client.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = client.batch_execute("ROLLBACK").await {
                        tracing::warn!("Rollback of abandoned transaction failed: {}", e);
                    }
                });
            }
            Err(_) => {
                // No runtime to roll back on; keep the connection out of the pool.
                drop(Object::take(client));
            }
        }
    }
}

#[async_trait::async_trait]
impl StoreTransaction for PgTransaction {
    async fn find_unmonitored_layers(
        &mut self,
        name: &str,
        title: &str,
        abstract_text: &str,
    ) -> StoreResult<Vec<Layer>> {
        let query = format!(
            "SELECT {LAYER_COLUMNS} FROM layers \
             WHERE name = $1 AND title = $2 AND abstract = $3 AND is_monitored = FALSE \
             ORDER BY id"
        );
        let rows = self
            .client()?
            .query(&query, &[&name, &title, &abstract_text])
            .await?;
        Ok(rows.iter().map(row_to_layer).collect())
    }

    async fn update_layers(&mut self, ids: &[i64], update: &LayerUpdate) -> StoreResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let ids = ids.to_vec();
        let n = self
            .client()?
            .execute(
                "UPDATE layers SET \
                   name = $1, title = $2, abstract = $3, is_monitored = FALSE, \
                   xml = $4, wkt_geometry = $5, anytext = $6, last_updated = NOW() \
                 WHERE id = ANY($7)",
                &[
                    &update.name,
                    &update.title,
                    &update.abstract_text,
                    &update.xml,
                    &update.wkt_geometry,
                    &update.anytext,
                    &ids,
                ],
            )
            .await?;
        Ok(n)
    }

    async fn get_or_create_service(
        &mut self,
        url: &str,
        kind: ServiceType,
    ) -> StoreResult<Service> {
        let client = self.client()?;
        let kind = kind.as_str();

        // Serialise concurrent get-or-create calls for the same key.
        let lock_key = format!("{url}|{kind}");
        client
            .execute("SELECT pg_advisory_xact_lock(hashtext($1))", &[&lock_key])
            .await?;

        let existing = client
            .query_opt(
                &format!(
                    "SELECT {SERVICE_COLUMNS} FROM services \
                     WHERE url = $1 AND type = $2 AND is_monitored = FALSE \
                     ORDER BY id LIMIT 1"
                ),
                &[&url, &kind],
            )
            .await?;
        if let Some(row) = existing {
            return row_to_service(&row);
        }

        let row = client
            .query_one(
                &format!(
                    "INSERT INTO services (uuid, url, type, is_monitored) \
                     VALUES ($1, $2, $3, FALSE) \
                     RETURNING {SERVICE_COLUMNS}"
                ),
                &[&Uuid::new_v4(), &url, &kind],
            )
            .await?;
        row_to_service(&row)
    }

    async fn get_or_create_srs(&mut self, code: &str) -> StoreResult<SpatialReferenceSystem> {
        let client = self.client()?;
        client
            .execute(
                "INSERT INTO spatial_reference_systems (code) VALUES ($1) \
                 ON CONFLICT (code) DO NOTHING",
                &[&code],
            )
            .await?;
        let row = client
            .query_one(
                "SELECT id, code FROM spatial_reference_systems WHERE code = $1",
                &[&code],
            )
            .await?;
        Ok(row_to_srs(&row))
    }

    async fn attach_srs(&mut self, service_id: i64, srs_id: i64) -> StoreResult<()> {
        self.client()?
            .execute(
                "INSERT INTO service_srs (service_id, srs_id) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
                &[&service_id, &srs_id],
            )
            .await?;
        Ok(())
    }

    async fn save_layer(&mut self, layer: &NewLayer, existing: Option<i64>) -> StoreResult<Layer> {
        let client = self.client()?;
        let row = match existing {
            Some(id) => {
                client
                    .query_opt(
                        &format!(
                            "UPDATE layers SET \
                               name = $1, title = $2, abstract = $3, url = $4, xml = $5, \
                               wkt_geometry = $6, anytext = $7, is_monitored = $8, \
                               service_id = $9, catalog_id = $10, last_updated = $11 \
                             WHERE id = $12 \
                             RETURNING {LAYER_COLUMNS}"
                        ),
                        &[
                            &layer.name,
                            &layer.title,
                            &layer.abstract_text,
                            &layer.url,
                            &layer.xml,
                            &layer.wkt_geometry,
                            &layer.anytext,
                            &layer.is_monitored,
                            &layer.service_id,
                            &layer.catalog_id,
                            &layer.last_updated,
                            &id,
                        ],
                    )
                    .await?
                    .ok_or_else(|| StoreError::NotFound {
                        entity: "layer".into(),
                        id: id.to_string(),
                    })?
            }
            None => {
                client
                    .query_one(
                        &format!(
                            "INSERT INTO layers \
                             (uuid, name, title, abstract, url, xml, wkt_geometry, anytext, \
                              is_monitored, service_id, catalog_id, last_updated) \
                             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
                             RETURNING {LAYER_COLUMNS}"
                        ),
                        &[
                            &layer.uuid,
                            &layer.name,
                            &layer.title,
                            &layer.abstract_text,
                            &layer.url,
                            &layer.xml,
                            &layer.wkt_geometry,
                            &layer.anytext,
                            &layer.is_monitored,
                            &layer.service_id,
                            &layer.catalog_id,
                            &layer.last_updated,
                        ],
                    )
                    .await?
            }
        };
        Ok(row_to_layer(&row))
    }

    async fn attach_keywords(&mut self, layer_id: i64, keywords: &[String]) -> StoreResult<()> {
        let client = self.client()?;
        for keyword in keywords {
            let row = client
                .query_one(
                    "INSERT INTO keywords (name) VALUES ($1) \
                     ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
                     RETURNING id",
                    &[keyword],
                )
                .await?;
            let keyword_id: i64 = row.get(0);
            client
                .execute(
                    "INSERT INTO layer_keywords (layer_id, keyword_id) VALUES ($1, $2) \
                     ON CONFLICT DO NOTHING",
                    &[&layer_id, &keyword_id],
                )
                .await?;
        }
        Ok(())
    }

    async fn create_endpoint(
        &mut self,
        url: &str,
        catalog_id: Option<i64>,
    ) -> StoreResult<Endpoint> {
        let row = self
            .client()?
            .query_one(
                &format!(
                    "INSERT INTO endpoints (uuid, url, catalog_id) VALUES ($1, $2, $3) \
                     RETURNING {ENDPOINT_COLUMNS}"
                ),
                &[&Uuid::new_v4(), &url, &catalog_id],
            )
            .await?;
        Ok(row_to_endpoint(&row))
    }

    async fn create_service(
        &mut self,
        url: &str,
        kind: ServiceType,
        catalog_id: Option<i64>,
    ) -> StoreResult<Service> {
        let row = self
            .client()?
            .query_one(
                &format!(
                    "INSERT INTO services (uuid, url, type, is_monitored, catalog_id) \
                     VALUES ($1, $2, $3, FALSE, $4) \
                     RETURNING {SERVICE_COLUMNS}"
                ),
                &[&Uuid::new_v4(), &url, &kind.as_str(), &catalog_id],
            )
            .await?;
        row_to_service(&row)
    }

    async fn commit(mut self: Box<Self>) -> StoreResult<()> {
        self.finish("COMMIT").await
    }

    async fn rollback(mut self: Box<Self>) -> StoreResult<()> {
        self.finish("ROLLBACK").await
    }
}

// ── Row mapping ─────────────────────────────────────────────────

fn row_to_layer(row: &tokio_postgres::Row) -> Layer {
    Layer {
        id: row.get(0),
        uuid: row.get(1),
        name: row.get(2),
        title: row.get(3),
        abstract_text: row.get(4),
        url: row.get(5),
        xml: row.get(6),
        wkt_geometry: row.get(7),
        anytext: row.get(8),
        is_monitored: row.get(9),
        service_id: row.get(10),
        catalog_id: row.get(11),
        last_updated: row.get(12),
    }
}

fn row_to_service(row: &tokio_postgres::Row) -> StoreResult<Service> {
    let kind: String = row.get(3);
    Ok(Service {
        id: row.get(0),
        uuid: row.get(1),
        url: row.get(2),
        service_type: kind.parse::<ServiceType>().map_err(StoreError::Database)?,
        title: row.get(4),
        is_monitored: row.get(5),
        catalog_id: row.get(6),
        created_at: row.get(7),
    })
}

fn row_to_endpoint(row: &tokio_postgres::Row) -> Endpoint {
    Endpoint {
        id: row.get(0),
        uuid: row.get(1),
        url: row.get(2),
        catalog_id: row.get(3),
        created_at: row.get(4),
    }
}

fn row_to_catalog(row: &tokio_postgres::Row) -> Catalog {
    Catalog {
        id: row.get(0),
        name: row.get(1),
        slug: row.get(2),
    }
}

fn row_to_srs(row: &tokio_postgres::Row) -> SpatialReferenceSystem {
    SpatialReferenceSystem {
        id: row.get(0),
        code: row.get(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_values_narrow_to_column_width() {
        let mut buf = BytesMut::new();
        Value::Int(7).to_sql(&Type::INT4, &mut buf).unwrap();
        assert_eq!(buf.len(), 4);

        let mut buf = BytesMut::new();
        Value::Int(7).to_sql(&Type::INT8, &mut buf).unwrap();
        assert_eq!(buf.len(), 8);
    }

    #[test]
    fn out_of_range_int_is_rejected() {
        let mut buf = BytesMut::new();
        assert!(Value::Int(i64::MAX).to_sql(&Type::INT2, &mut buf).is_err());
    }

    #[test]
    fn text_binds_to_uuid_columns() {
        let mut buf = BytesMut::new();
        let id = Uuid::new_v4().to_string();
        Value::Text(id).to_sql(&Type::UUID, &mut buf).unwrap();
        assert_eq!(buf.len(), 16);

        let mut buf = BytesMut::new();
        assert!(Value::Text("not-a-uuid".into()).to_sql(&Type::UUID, &mut buf).is_err());
    }

    #[test]
    fn null_binds_as_null() {
        let mut buf = BytesMut::new();
        assert!(matches!(
            Value::Null.to_sql(&Type::TEXT, &mut buf).unwrap(),
            IsNull::Yes
        ));
    }

    #[test]
    fn schema_declares_every_table() {
        for table in [
            "catalogs",
            "services",
            "endpoints",
            "spatial_reference_systems",
            "service_srs",
            "layers",
            "keywords",
            "layer_keywords",
        ] {
            assert!(
                SCHEMA_SQL.contains(&format!("CREATE TABLE IF NOT EXISTS {table} (")),
                "missing {table}"
            );
        }
    }
}
