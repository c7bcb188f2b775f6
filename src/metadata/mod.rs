//! Metadata document parsing.
//!
//! Turns a harvested metadata document into the pieces the registry stores:
//! the service it references, a [`NewLayer`] and its keyword terms. Parsing
//! is pure; nothing here touches the store.

pub mod dublin_core;

pub use dublin_core::DublinCoreParser;

use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::registry::service_types::ServiceType;
use crate::registry::types::{Catalog, NewLayer, Service};

/// Errors from metadata parsing.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("XML error: {0}")]
    Xml(String),

    #[error("Unsupported metadata schema: {0}")]
    UnsupportedSchema(String),

    #[error("Unsupported document root: {0}")]
    UnsupportedDocument(String),

    #[error("Missing required element: {0}")]
    MissingField(&'static str),
}

/// Service endpoint declared by a metadata document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceReference {
    pub url: String,
    pub service_type: ServiceType,
}

/// Extracts registry records from metadata documents.
pub trait MetadataParser: Send + Sync {
    /// The service endpoint the document points at, if it declares one.
    fn parse_service_reference(&self, xml: &str) -> Result<Option<ServiceReference>, MetadataError>;

    /// Build a layer (and its keyword terms) from a document in `schema`.
    fn parse_layer(
        &self,
        schema: &str,
        xml: &str,
        service: Option<&Service>,
        catalog: Option<&Catalog>,
        last_updated: DateTime<Utc>,
    ) -> Result<(NewLayer, Vec<String>), MetadataError>;
}

/// Free-text search blob: non-empty parts joined by single spaces.
pub fn anytext<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(|p| p.as_ref().trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Free-text search blob of every text node in an XML document.
///
/// Documents that fail to parse contribute whatever text was read before
/// the error.
pub fn anytext_from_xml(xml: &str) -> String {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut parts: Vec<String> = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Text(t)) => {
                if let Ok(text) = t.unescape() {
                    parts.push(text.into_owned());
                }
            }
            Ok(Event::CData(c)) => parts.push(String::from_utf8_lossy(&c).into_owned()),
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!("anytext: stopping at XML error: {}", e);
                break;
            }
            _ => {}
        }
    }
    anytext(&parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anytext_skips_blank_parts() {
        assert_eq!(anytext(&["Roads", "", "  ", "transport,roads"]), "Roads transport,roads");
    }

    #[test]
    fn anytext_from_xml_collects_text_nodes() {
        let xml = r#"<a><b>one</b><c><![CDATA[two]]></c><d>three &amp; four</d></a>"#;
        assert_eq!(anytext_from_xml(xml), "one two three & four");
    }

    #[test]
    fn anytext_from_broken_xml_keeps_prefix() {
        assert_eq!(anytext_from_xml("<a>kept</a></b>"), "kept");
    }
}
