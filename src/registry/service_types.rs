//! Service type enumeration and the resource-type registry.
//!
//! The catalogue protocol names services by resource-type URI
//! (`http://www.opengis.net/wms`), the registry stores them by protocol
//! code (`OGC:WMS`). [`ServiceTypeRegistry`] is the single table between
//! the two.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Every service protocol the registry knows how to store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceType {
    Csw,
    Wms,
    Wmts,
    Tms,
    ArcGisMapServer,
    ArcGisImageServer,
    WorldMap,
    Warper,
    Hgl,
}

impl ServiceType {
    pub const ALL: [ServiceType; 9] = [
        Self::Csw,
        Self::Wms,
        Self::Wmts,
        Self::Tms,
        Self::ArcGisMapServer,
        Self::ArcGisImageServer,
        Self::WorldMap,
        Self::Warper,
        Self::Hgl,
    ];

    /// Protocol code as stored in the `type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csw => "OGC:CSW",
            Self::Wms => "OGC:WMS",
            Self::Wmts => "OGC:WMTS",
            Self::Tms => "OSGeo:TMS",
            Self::ArcGisMapServer => "ESRI:ArcGIS:MapServer",
            Self::ArcGisImageServer => "ESRI:ArcGIS:ImageServer",
            Self::WorldMap => "Hypermap:WorldMap",
            Self::Warper => "Hypermap:WARPER",
            Self::Hgl => "Harvard:HGL",
        }
    }
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ServiceType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| format!("invalid service type: {s}"))
    }
}

impl Serialize for ServiceType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ServiceType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Resource-type URI of the catalogue protocol itself.
pub const CSW_RESOURCE_TYPE: &str = "http://www.opengis.net/cat/csw/2.0.2";

/// Immutable mapping from resource-type URI to [`ServiceType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTypeRegistry {
    entries: Vec<(String, ServiceType)>,
}

impl Default for ServiceTypeRegistry {
    fn default() -> Self {
        Self::new(vec![
            (CSW_RESOURCE_TYPE.to_string(), ServiceType::Csw),
            ("http://www.opengis.net/wms".to_string(), ServiceType::Wms),
            ("http://www.opengis.net/wmts/1.0".to_string(), ServiceType::Wmts),
            ("https://wiki.osgeo.org/wiki/TMS".to_string(), ServiceType::Tms),
            (
                "urn:x-esri:serviceType:ArcGIS:MapServer".to_string(),
                ServiceType::ArcGisMapServer,
            ),
            (
                "urn:x-esri:serviceType:ArcGIS:ImageServer".to_string(),
                ServiceType::ArcGisImageServer,
            ),
        ])
    }
}

impl ServiceTypeRegistry {
    pub fn new(entries: Vec<(String, ServiceType)>) -> Self {
        Self { entries }
    }

    /// Resource-type URIs in registration order.
    pub fn resource_types(&self) -> Vec<String> {
        self.entries.iter().map(|(uri, _)| uri.clone()).collect()
    }

    /// Resolve a resource type given either as URI or as protocol code.
    ///
    /// Returns the canonical URI together with the service type.
    pub fn resolve(&self, resource_type: &str) -> Option<(&str, ServiceType)> {
        let wanted = resource_type.trim();
        self.entries
            .iter()
            .find(|(uri, kind)| uri == wanted || kind.as_str() == wanted)
            .map(|(uri, kind)| (uri.as_str(), *kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_from_str() {
        for kind in ServiceType::ALL {
            assert_eq!(kind.as_str().parse::<ServiceType>().unwrap(), kind);
        }
        assert!("OGC:WFS".parse::<ServiceType>().is_err());
    }

    #[test]
    fn registry_resolves_uri_and_code() {
        let registry = ServiceTypeRegistry::default();
        assert_eq!(
            registry.resolve("http://www.opengis.net/wms"),
            Some(("http://www.opengis.net/wms", ServiceType::Wms))
        );
        assert_eq!(
            registry.resolve("OGC:WMS"),
            Some(("http://www.opengis.net/wms", ServiceType::Wms))
        );
        assert_eq!(registry.resolve("BadType"), None);
    }

    #[test]
    fn registry_excludes_aggregator_only_types() {
        let registry = ServiceTypeRegistry::default();
        assert_eq!(registry.resource_types().len(), 6);
        assert!(registry.resolve("Hypermap:WorldMap").is_none());
    }

    #[test]
    fn service_type_serializes_as_code() {
        let json = serde_json::to_string(&ServiceType::ArcGisMapServer).unwrap();
        assert_eq!(json, "\"ESRI:ArcGIS:MapServer\"");
    }
}
