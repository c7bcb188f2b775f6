//! Protocol context: the queryable catalogue and operation parameters the
//! protocol engine declares.
//!
//! The engine owns this structure; the repository reads the queryables to
//! translate field names into columns and writes the allowed resource types
//! into the `Harvest` and `Transaction` operations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const HARVEST: &str = "Harvest";
pub const TRANSACTION: &str = "Transaction";
pub const RESOURCE_TYPE: &str = "ResourceType";
pub const TRANSACTION_SCHEMAS: &str = "TransactionSchemas";

/// One queryable field and the column it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Queryable {
    pub dbcol: String,
}

/// Queryables of one record type name, grouped by queryable set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypenameModel {
    #[serde(default)]
    pub queryables: BTreeMap<String, BTreeMap<String, Queryable>>,
}

/// An operation parameter with its allowed values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default)]
    pub parameters: BTreeMap<String, Parameter>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolContext {
    #[serde(default)]
    pub typenames: BTreeMap<String, TypenameModel>,
    #[serde(default)]
    pub operations: BTreeMap<String, Operation>,
    /// Core model mappings (`pycsw:Title` -> `title`, ...).
    #[serde(default)]
    pub core_mappings: BTreeMap<String, String>,
}

impl ProtocolContext {
    /// Dublin Core record model over the layer table, with harvest and
    /// transaction operations declared.
    pub fn dublin_core() -> Self {
        let queryables: BTreeMap<String, Queryable> = [
            ("dc:identifier", "uuid"),
            ("dc:title", "title"),
            ("dct:abstract", "abstract"),
            ("dc:source", "url"),
            ("dct:modified", "last_updated"),
            ("csw:AnyText", "anytext"),
            ("ows:BoundingBox", "wkt_geometry"),
        ]
        .into_iter()
        .map(|(name, col)| (name.to_string(), Queryable { dbcol: col.to_string() }))
        .collect();

        let mut groups = BTreeMap::new();
        groups.insert("SupportedDublinCoreQueryables".to_string(), queryables);

        let mut typenames = BTreeMap::new();
        typenames.insert("csw:Record".to_string(), TypenameModel { queryables: groups });

        let core_mappings = [
            ("pycsw:Identifier", "uuid"),
            ("pycsw:Title", "title"),
            ("pycsw:Abstract", "abstract"),
            ("pycsw:Source", "url"),
            ("pycsw:Modified", "last_updated"),
            ("pycsw:AnyText", "anytext"),
            ("pycsw:BoundingBox", "wkt_geometry"),
            ("pycsw:XML", "xml"),
        ]
        .into_iter()
        .map(|(name, col)| (name.to_string(), col.to_string()))
        .collect();

        let mut operations = BTreeMap::new();
        for (op, param) in [(HARVEST, RESOURCE_TYPE), (TRANSACTION, TRANSACTION_SCHEMAS)] {
            let mut parameters = BTreeMap::new();
            parameters.insert(param.to_string(), Parameter::default());
            operations.insert(op.to_string(), Operation { parameters });
        }

        Self {
            typenames,
            operations,
            core_mappings,
        }
    }

    /// Every queryable of every type name plus the core mappings, as one
    /// `name -> column` table. Later entries win on name clashes.
    pub fn flatten_queryables(&self) -> BTreeMap<String, String> {
        let mut table = BTreeMap::new();
        for model in self.typenames.values() {
            for group in model.queryables.values() {
                for (name, queryable) in group {
                    table.insert(name.clone(), queryable.dbcol.clone());
                }
            }
        }
        for (name, column) in &self.core_mappings {
            table.insert(name.clone(), column.clone());
        }
        table
    }

    /// Replace the allowed harvest and transaction resource types.
    ///
    /// Only applies when both operations are declared; returns whether it did.
    pub fn inject_resource_types(&mut self, resource_types: &[String]) -> bool {
        if !self.operations.contains_key(HARVEST) || !self.operations.contains_key(TRANSACTION) {
            return false;
        }
        for (op, param) in [(HARVEST, RESOURCE_TYPE), (TRANSACTION, TRANSACTION_SCHEMAS)] {
            if let Some(operation) = self.operations.get_mut(op) {
                operation.parameters.entry(param.to_string()).or_default().values =
                    resource_types.to_vec();
            }
        }
        true
    }

    /// Allowed values of an operation parameter, if declared.
    pub fn parameter_values(&self, operation: &str, parameter: &str) -> Option<&[String]> {
        self.operations
            .get(operation)?
            .parameters
            .get(parameter)
            .map(|p| p.values.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_merges_groups_and_core_mappings() {
        let table = ProtocolContext::dublin_core().flatten_queryables();
        assert_eq!(table.get("dc:title").map(String::as_str), Some("title"));
        assert_eq!(table.get("pycsw:XML").map(String::as_str), Some("xml"));
        assert_eq!(
            table.get("ows:BoundingBox").map(String::as_str),
            Some("wkt_geometry")
        );
    }

    #[test]
    fn inject_requires_both_operations() {
        let types = vec!["http://www.opengis.net/wms".to_string()];

        let mut ctx = ProtocolContext::dublin_core();
        assert!(ctx.inject_resource_types(&types));
        assert_eq!(ctx.parameter_values(HARVEST, RESOURCE_TYPE), Some(types.as_slice()));
        assert_eq!(
            ctx.parameter_values(TRANSACTION, TRANSACTION_SCHEMAS),
            Some(types.as_slice())
        );

        let mut ctx = ProtocolContext::dublin_core();
        ctx.operations.remove(TRANSACTION);
        assert!(!ctx.inject_resource_types(&types));
        assert_eq!(ctx.parameter_values(HARVEST, RESOURCE_TYPE), Some(&[][..]));
    }

    #[test]
    fn deserializes_engine_model() {
        let json = r#"{
            "typenames": {
                "csw:Record": {
                    "queryables": {
                        "SupportedDublinCoreQueryables": {
                            "dc:title": {"dbcol": "title"}
                        }
                    }
                }
            },
            "operations": {"GetRecords": {"parameters": {}}}
        }"#;
        let ctx: ProtocolContext = serde_json::from_str(json).unwrap();
        assert_eq!(ctx.flatten_queryables().len(), 1);
        assert!(ctx.core_mappings.is_empty());
    }
}
