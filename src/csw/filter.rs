//! Constraint, sort and scope-filter types handed over by the protocol engine.

use serde::{Deserialize, Serialize};

use crate::registry::predicate::Predicate;
use crate::registry::types::Value;

/// A storage-level predicate with `%s` placeholders and its bound values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    #[serde(alias = "where")]
    pub predicate: String,
    #[serde(alias = "values", default)]
    pub params: Vec<Value>,
}

impl Constraint {
    pub fn new(predicate: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            predicate: predicate.into(),
            params,
        }
    }

    pub fn to_predicate(&self) -> Predicate {
        Predicate::new(self.predicate.clone(), self.params.clone())
    }
}

/// Requested result ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Queryable name or column to sort on.
    #[serde(alias = "propertyname")]
    pub field: String,
    #[serde(default)]
    pub descending: bool,
    /// Rank rows by the area of the geometry in `field`.
    #[serde(default)]
    pub spatial: bool,
}

impl SortSpec {
    /// Build from the engine's `(propertyname, order, spatial)` triple.
    ///
    /// Any order other than `DESC` (case-insensitive) sorts ascending.
    pub fn from_protocol(field: impl Into<String>, order: &str, spatial: bool) -> Self {
        Self {
            field: field.into(),
            descending: order.trim().eq_ignore_ascii_case("DESC"),
            spatial,
        }
    }
}

/// Operator-configured predicate restricting every read to one catalog.
///
/// The predicate's last whitespace-separated token must be the numeric id of
/// that catalog, e.g. `catalog_id = 3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeFilter {
    predicate: String,
    catalog_id: i64,
}

impl ScopeFilter {
    pub fn parse(predicate: &str) -> Result<Self, String> {
        let predicate = predicate.trim();
        let last = predicate
            .split_whitespace()
            .last()
            .ok_or_else(|| "scope filter is empty".to_string())?;
        let catalog_id = last
            .parse::<i64>()
            .map_err(|_| format!("scope filter must end with a catalog id, got {last:?}"))?;
        Ok(Self {
            predicate: predicate.to_string(),
            catalog_id,
        })
    }

    pub fn catalog_id(&self) -> i64 {
        self.catalog_id
    }

    /// AND the scope predicate onto `query`; `None` passes `query` through.
    pub fn apply(scope: Option<&ScopeFilter>, query: Predicate) -> Predicate {
        match scope {
            Some(scope) => Predicate::new(scope.predicate.clone(), Vec::new()).and(query),
            None => query,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::predicate::PlaceholderStyle;

    #[test]
    fn constraint_accepts_engine_keys() {
        let c: Constraint = serde_json::from_str(r#"{"where": "id = %s", "values": [7]}"#).unwrap();
        assert_eq!(c, Constraint::new("id = %s", vec![Value::Int(7)]));
    }

    #[test]
    fn sort_order_parsing() {
        assert!(SortSpec::from_protocol("title", "DESC", false).descending);
        assert!(SortSpec::from_protocol("title", "desc", false).descending);
        assert!(!SortSpec::from_protocol("title", "ASC", false).descending);
        assert!(!SortSpec::from_protocol("title", "", true).descending);
    }

    #[test]
    fn scope_filter_reads_trailing_catalog_id() {
        let scope = ScopeFilter::parse("catalog_id = 12").unwrap();
        assert_eq!(scope.catalog_id(), 12);
        assert!(ScopeFilter::parse("catalog_id = abc").is_err());
        assert!(ScopeFilter::parse("   ").is_err());
    }

    #[test]
    fn apply_prefixes_scope_predicate() {
        let scope = ScopeFilter::parse("catalog_id = 1").unwrap();
        let query = Predicate::eq("name", "roads");

        let sql = ScopeFilter::apply(Some(&scope), query.clone())
            .where_clause(PlaceholderStyle::Question)
            .unwrap();
        assert_eq!(sql, " WHERE (catalog_id = 1) AND (name = ?1)");

        assert_eq!(ScopeFilter::apply(None, query.clone()), query);
    }
}
