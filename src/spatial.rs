//! Geometry helpers over WKT text.
//!
//! - extent scoring for in-memory spatial sorts
//! - the binary spatial predicates behind `query_spatial`
//! - bounding box to polygon conversion for parsed metadata
//!
//! Geometries are stored as WKT (optionally EWKT-prefixed with `SRID=...;`)
//! and parsed on demand.

use std::str::FromStr;

use geo::{Area, Distance, Euclidean, Geometry, Relate};

/// Errors from geometry parsing and predicate evaluation.
#[derive(Debug, thiserror::Error)]
pub enum SpatialError {
    #[error("WKT parse error: {0}")]
    WktParse(String),

    #[error("Unsupported spatial predicate: {0}")]
    UnsupportedPredicate(String),
}

pub type Result<T> = std::result::Result<T, SpatialError>;

/// Parse WKT (or EWKT) text into a geometry.
pub fn parse_wkt(text: &str) -> Result<Geometry<f64>> {
    let body = text.rsplit(';').next().unwrap_or(text).trim();
    wkt::Wkt::from_str(body)
        .map_err(|e| SpatialError::WktParse(format!("{:?}", e)))
        .and_then(|w| {
            w.try_into()
                .map_err(|e: wkt::conversion::Error| SpatialError::WktParse(format!("{:?}", e)))
        })
}

/// Planar area of a WKT geometry, used as the spatial sort key.
///
/// Missing or unparseable geometries score zero.
pub fn geometry_area(text: Option<&str>) -> f64 {
    match text.map(parse_wkt) {
        Some(Ok(geom)) => geom.unsigned_area(),
        Some(Err(e)) => {
            tracing::debug!("Scoring unparseable geometry as zero: {}", e);
            0.0
        }
        None => 0.0,
    }
}

/// Binary spatial predicate names accepted by `query_spatial`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpatialPredicate {
    Bbox,
    Beyond,
    Contains,
    Crosses,
    Disjoint,
    DWithin,
    Equals,
    Intersects,
    Overlaps,
    Touches,
    Within,
}

impl FromStr for SpatialPredicate {
    type Err = SpatialError;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bbox" => Ok(Self::Bbox),
            "beyond" => Ok(Self::Beyond),
            "contains" => Ok(Self::Contains),
            "crosses" => Ok(Self::Crosses),
            "disjoint" => Ok(Self::Disjoint),
            "dwithin" => Ok(Self::DWithin),
            "equals" => Ok(Self::Equals),
            "intersects" => Ok(Self::Intersects),
            "overlaps" => Ok(Self::Overlaps),
            "touches" => Ok(Self::Touches),
            "within" => Ok(Self::Within),
            other => Err(SpatialError::UnsupportedPredicate(other.to_string())),
        }
    }
}

/// Evaluate `predicate(data, input)`.
///
/// `distance` only matters for `beyond` and `dwithin`.
pub fn evaluate(data_wkt: &str, input_wkt: &str, predicate: &str, distance: f64) -> Result<bool> {
    let data = parse_wkt(data_wkt)?;
    let input = parse_wkt(input_wkt)?;
    let predicate: SpatialPredicate = predicate.parse()?;

    let result = match predicate {
        SpatialPredicate::Beyond => Euclidean.distance(&data, &input) > distance,
        SpatialPredicate::DWithin => Euclidean.distance(&data, &input) <= distance,
        SpatialPredicate::Bbox | SpatialPredicate::Intersects => {
            data.relate(&input).is_intersects()
        }
        SpatialPredicate::Contains => data.relate(&input).is_contains(),
        SpatialPredicate::Crosses => data.relate(&input).is_crosses(),
        SpatialPredicate::Disjoint => data.relate(&input).is_disjoint(),
        SpatialPredicate::Equals => data.relate(&input).is_equal_topo(),
        SpatialPredicate::Overlaps => data.relate(&input).is_overlaps(),
        SpatialPredicate::Touches => data.relate(&input).is_touches(),
        SpatialPredicate::Within => data.relate(&input).is_within(),
    };
    Ok(result)
}

/// `query_spatial` as the storage engine sees it: any failure is a non-match.
pub fn query_spatial(data_wkt: Option<&str>, input_wkt: &str, predicate: &str, distance: f64) -> bool {
    let Some(data_wkt) = data_wkt else {
        return false;
    };
    evaluate(data_wkt, input_wkt, predicate, distance).unwrap_or_else(|e| {
        tracing::debug!("query_spatial({}) treated as false: {}", predicate, e);
        false
    })
}

/// Closed polygon ring for an axis-aligned bounding box.
pub fn bbox_to_wkt(minx: f64, miny: f64, maxx: f64, maxy: f64) -> String {
    format!(
        "POLYGON(({minx} {miny}, {minx} {maxy}, {maxx} {maxy}, {maxx} {miny}, {minx} {miny}))"
    )
}
