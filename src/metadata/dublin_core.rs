//! Dublin Core (`csw:Record`) metadata parser.
//!
//! Elements are matched by local name so documents are accepted regardless
//! of the prefixes they bind. Recognised content:
//!
//! - `dc:identifier`, `dc:title`, `dct:abstract` / `dc:description`
//! - `dc:subject` (one keyword per element)
//! - `dc:source` + `dc:format`: the service endpoint and its protocol
//! - `dct:references` with a `scheme` attribute: access URLs
//! - `ows:BoundingBox` / `ows:WGS84BoundingBox`: the layer footprint

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use uuid::Uuid;

use crate::metadata::{anytext, MetadataError, MetadataParser, ServiceReference};
use crate::registry::service_types::{ServiceType, CSW_RESOURCE_TYPE};
use crate::registry::types::{Catalog, NewLayer, Service};
use crate::spatial::bbox_to_wkt;

const RECORD_ROOTS: [&str; 3] = ["Record", "SummaryRecord", "BriefRecord"];

/// Fields pulled out of one Dublin Core record.
#[derive(Debug, Default, Clone, PartialEq)]
struct DcRecord {
    identifier: Option<String>,
    title: Option<String>,
    abstract_text: Option<String>,
    subjects: Vec<String>,
    format: Option<String>,
    source: Option<String>,
    references: Vec<(Option<String>, String)>,
    lower_corner: Option<String>,
    upper_corner: Option<String>,
    lat_lon_axes: bool,
}

impl DcRecord {
    fn parse(xml: &str) -> Result<Self, MetadataError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut record = DcRecord::default();
        let mut path: Vec<String> = Vec::new();
        let mut scheme: Option<String> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let name = local_name(&e);
                    if path.is_empty() && !RECORD_ROOTS.contains(&name.as_str()) {
                        return Err(MetadataError::UnsupportedDocument(name));
                    }
                    match name.as_str() {
                        "references" => scheme = attribute(&e, "scheme")?,
                        "BoundingBox" => {
                            record.lat_lon_axes = attribute(&e, "crs")?
                                .map(|crs| is_lat_lon_crs(&crs))
                                .unwrap_or(false);
                        }
                        "WGS84BoundingBox" => record.lat_lon_axes = false,
                        _ => {}
                    }
                    path.push(name);
                }
                Ok(Event::Empty(e)) => {
                    if path.is_empty() {
                        let name = local_name(&e);
                        if !RECORD_ROOTS.contains(&name.as_str()) {
                            return Err(MetadataError::UnsupportedDocument(name));
                        }
                    }
                }
                Ok(Event::End(_)) => {
                    path.pop();
                }
                Ok(Event::Text(t)) => {
                    let text = t
                        .unescape()
                        .map_err(|e| MetadataError::Xml(e.to_string()))?
                        .into_owned();
                    record.accept(&path, text, &scheme);
                }
                Ok(Event::CData(c)) => {
                    let text = String::from_utf8_lossy(&c).trim().to_string();
                    record.accept(&path, text, &scheme);
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(MetadataError::Xml(e.to_string())),
                _ => {}
            }
        }

        Ok(record)
    }

    fn accept(&mut self, path: &[String], text: String, scheme: &Option<String>) {
        if text.is_empty() {
            return;
        }
        let Some(element) = path.last() else {
            return;
        };
        let parent = path.len().checked_sub(2).and_then(|i| path.get(i));
        let top_level = path.len() == 2;

        match element.as_str() {
            "identifier" if top_level => set_once(&mut self.identifier, text),
            "title" if top_level => set_once(&mut self.title, text),
            "abstract" | "description" if top_level => set_once(&mut self.abstract_text, text),
            "subject" if top_level => {
                if !self.subjects.contains(&text) {
                    self.subjects.push(text);
                }
            }
            "format" if top_level => set_once(&mut self.format, text),
            "source" if top_level => set_once(&mut self.source, text),
            "references" if top_level => self.references.push((scheme.clone(), text)),
            "LowerCorner" if is_bbox(parent) => set_once(&mut self.lower_corner, text),
            "UpperCorner" if is_bbox(parent) => set_once(&mut self.upper_corner, text),
            _ => {}
        }
    }

    /// Bounding box as a WKT polygon in x/y (lon/lat) order.
    fn footprint(&self) -> Option<String> {
        let (x0, y0) = parse_corner(self.lower_corner.as_deref()?)?;
        let (x1, y1) = parse_corner(self.upper_corner.as_deref()?)?;
        if self.lat_lon_axes {
            Some(bbox_to_wkt(y0, x0, y1, x1))
        } else {
            Some(bbox_to_wkt(x0, y0, x1, y1))
        }
    }

    fn service_reference(&self) -> Option<ServiceReference> {
        if let (Some(url), Some(format)) = (&self.source, &self.format) {
            return match format.parse::<ServiceType>() {
                Ok(service_type) => Some(ServiceReference {
                    url: url.clone(),
                    service_type,
                }),
                Err(_) => {
                    tracing::debug!("Ignoring dc:source with non-service format '{}'", format);
                    None
                }
            };
        }

        // Fall back to a typed access link.
        self.references.iter().find_map(|(scheme, url)| {
            let service_type = scheme.as_deref()?.parse::<ServiceType>().ok()?;
            Some(ServiceReference {
                url: url.clone(),
                service_type,
            })
        })
    }
}

fn set_once(slot: &mut Option<String>, text: String) {
    if slot.is_none() {
        *slot = Some(text);
    }
}

fn is_bbox(parent: Option<&String>) -> bool {
    matches!(
        parent.map(String::as_str),
        Some("BoundingBox") | Some("WGS84BoundingBox")
    )
}

/// URN-style EPSG:4326 references declare latitude-first axes.
fn is_lat_lon_crs(crs: &str) -> bool {
    crs.starts_with("urn:") && crs.ends_with(":4326")
}

fn parse_corner(text: &str) -> Option<(f64, f64)> {
    let mut parts = text.split_whitespace().map(str::parse::<f64>);
    match (parts.next(), parts.next()) {
        (Some(Ok(a)), Some(Ok(b))) => Some((a, b)),
        _ => None,
    }
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attribute(e: &BytesStart<'_>, name: &str) -> Result<Option<String>, MetadataError> {
    let attr = e
        .try_get_attribute(name)
        .map_err(|err| MetadataError::Xml(err.to_string()))?;
    attr.map(|a| {
        a.unescape_value()
            .map(|v| v.into_owned())
            .map_err(|err| MetadataError::Xml(err.to_string()))
    })
    .transpose()
}

/// Parser for CSW 2.0.2 Dublin Core records.
#[derive(Debug, Clone, Copy, Default)]
pub struct DublinCoreParser;

impl MetadataParser for DublinCoreParser {
    fn parse_service_reference(&self, xml: &str) -> Result<Option<ServiceReference>, MetadataError> {
        Ok(DcRecord::parse(xml)?.service_reference())
    }

    fn parse_layer(
        &self,
        schema: &str,
        xml: &str,
        service: Option<&Service>,
        catalog: Option<&Catalog>,
        last_updated: DateTime<Utc>,
    ) -> Result<(NewLayer, Vec<String>), MetadataError> {
        if schema != CSW_RESOURCE_TYPE {
            return Err(MetadataError::UnsupportedSchema(schema.to_string()));
        }

        let record = DcRecord::parse(xml)?;
        let wkt_geometry = record.footprint();
        let title = record.title.clone().ok_or(MetadataError::MissingField("title"))?;
        let name = record.identifier.clone().unwrap_or_else(|| title.clone());
        let abstract_text = record.abstract_text.clone().unwrap_or_default();
        let url = record
            .references
            .first()
            .map(|(_, url)| url.clone())
            .or_else(|| record.source.clone());

        let mut parts = vec![title.clone(), abstract_text.clone()];
        parts.extend(record.subjects.iter().cloned());

        let layer = NewLayer {
            uuid: Uuid::new_v4(),
            name,
            title,
            abstract_text,
            url,
            xml: xml.to_string(),
            wkt_geometry,
            anytext: anytext(&parts),
            is_monitored: false,
            service_id: service.map(|s| s.id),
            catalog_id: catalog.map(|c| c.id),
            last_updated,
        };

        Ok((layer, record.subjects))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<csw:Record xmlns:csw="http://www.opengis.net/cat/csw/2.0.2"
    xmlns:dc="http://purl.org/dc/elements/1.1/"
    xmlns:dct="http://purl.org/dc/terms/"
    xmlns:ows="http://www.opengis.net/ows">
  <dc:identifier>roads_2016</dc:identifier>
  <dc:title>Roads &amp; Highways</dc:title>
  <dct:abstract>Road network of the region</dct:abstract>
  <dc:subject>transport</dc:subject>
  <dc:subject>roads</dc:subject>
  <dc:subject>transport</dc:subject>
  <dc:format>OGC:WMS</dc:format>
  <dc:source>http://maps.example.org/wms</dc:source>
  <dct:references scheme="OGC:WMS">http://maps.example.org/wms?layers=roads</dct:references>
  <ows:WGS84BoundingBox>
    <ows:LowerCorner>-10 -5</ows:LowerCorner>
    <ows:UpperCorner>10 5</ows:UpperCorner>
  </ows:WGS84BoundingBox>
</csw:Record>"#;

    #[test]
    fn extracts_service_from_source_and_format() {
        let reference = DublinCoreParser.parse_service_reference(RECORD).unwrap().unwrap();
        assert_eq!(reference.url, "http://maps.example.org/wms");
        assert_eq!(reference.service_type, ServiceType::Wms);
    }

    #[test]
    fn falls_back_to_typed_reference() {
        let xml = r#"<csw:Record xmlns:csw="x" xmlns:dc="y" xmlns:dct="z">
            <dc:title>t</dc:title>
            <dct:references scheme="ESRI:ArcGIS:MapServer">http://a/MapServer</dct:references>
        </csw:Record>"#;
        let reference = DublinCoreParser.parse_service_reference(xml).unwrap().unwrap();
        assert_eq!(reference.service_type, ServiceType::ArcGisMapServer);
        assert_eq!(reference.url, "http://a/MapServer");
    }

    #[test]
    fn no_service_reference_is_none() {
        let xml = r#"<csw:Record xmlns:csw="x" xmlns:dc="y"><dc:title>t</dc:title>
            <dc:format>image/png</dc:format><dc:source>http://a</dc:source></csw:Record>"#;
        assert_eq!(DublinCoreParser.parse_service_reference(xml).unwrap(), None);
    }

    #[test]
    fn builds_layer_with_keywords_and_footprint() {
        let service = Service {
            id: 4,
            uuid: Uuid::nil(),
            url: Some("http://maps.example.org/wms".into()),
            service_type: ServiceType::Wms,
            title: None,
            is_monitored: false,
            catalog_id: None,
            created_at: Utc::now(),
        };
        let catalog = Catalog {
            id: 1,
            name: "Main".into(),
            slug: "main".into(),
        };
        let now = Utc::now();

        let (layer, keywords) = DublinCoreParser
            .parse_layer(CSW_RESOURCE_TYPE, RECORD, Some(&service), Some(&catalog), now)
            .unwrap();

        assert_eq!(layer.name, "roads_2016");
        assert_eq!(layer.title, "Roads & Highways");
        assert_eq!(layer.abstract_text, "Road network of the region");
        assert_eq!(layer.url.as_deref(), Some("http://maps.example.org/wms?layers=roads"));
        assert_eq!(
            layer.wkt_geometry.as_deref(),
            Some("POLYGON((-10 -5, -10 5, 10 5, 10 -5, -10 -5))")
        );
        assert_eq!(layer.anytext, "Roads & Highways Road network of the region transport roads");
        assert_eq!(layer.service_id, Some(4));
        assert_eq!(layer.catalog_id, Some(1));
        assert_eq!(layer.last_updated, now);
        assert!(!layer.is_monitored);
        assert_eq!(keywords, vec!["transport".to_string(), "roads".to_string()]);
    }

    #[test]
    fn urn_crs_bounding_box_is_latitude_first() {
        let xml = r#"<csw:Record xmlns:csw="x" xmlns:dc="y" xmlns:ows="o">
            <dc:title>t</dc:title>
            <ows:BoundingBox crs="urn:x-ogc:def:crs:EPSG:6.11:4326">
              <ows:LowerCorner>-5 -10</ows:LowerCorner>
              <ows:UpperCorner>5 10</ows:UpperCorner>
            </ows:BoundingBox>
        </csw:Record>"#;
        let (layer, _) = DublinCoreParser
            .parse_layer(CSW_RESOURCE_TYPE, xml, None, None, Utc::now())
            .unwrap();
        assert_eq!(
            layer.wkt_geometry.as_deref(),
            Some("POLYGON((-10 -5, -10 5, 10 5, 10 -5, -10 -5))")
        );
        assert_eq!(layer.name, "t");
    }

    #[test]
    fn rejects_other_schemas_and_roots() {
        assert!(matches!(
            DublinCoreParser.parse_layer("http://www.isotc211.org/2005/gmd", RECORD, None, None, Utc::now()),
            Err(MetadataError::UnsupportedSchema(_))
        ));
        assert!(matches!(
            DublinCoreParser.parse_service_reference("<gmd:MD_Metadata xmlns:gmd=\"g\"/>"),
            Err(MetadataError::UnsupportedDocument(_))
        ));
    }

    #[test]
    fn title_is_required() {
        let xml = r#"<csw:Record xmlns:csw="x" xmlns:dc="y"><dc:identifier>a</dc:identifier></csw:Record>"#;
        assert!(matches!(
            DublinCoreParser.parse_layer(CSW_RESOURCE_TYPE, xml, None, None, Utc::now()),
            Err(MetadataError::MissingField("title"))
        ));
    }
}
