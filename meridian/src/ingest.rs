//! Loading of GeoJSON documents into features and markers.
//!
//! Polygon and line features become dataset [`Feature`]s; point features become markers. Feature properties become
//! attribute records. Since all records of a dataset must have the same fields, a property missing from some
//! features is added to them as null.

use geojson::{GeoJson, JsonValue};
use meridian_types::geojson::points_from_value;
use meridian_types::{Geom, Point2d};

use crate::attributes::{AttributeValue, Attributes};
use crate::error::MeridianError;
use crate::feature::Feature;

/// Contents of a GeoJSON document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoJsonDataset {
    /// Polygon and line features.
    pub features: Vec<Feature>,
    /// Coordinates of point features.
    pub markers: Vec<Point2d>,
    /// Features that could not be converted.
    pub skipped: usize,
}

impl GeoJsonDataset {
    /// Marker coordinates as pairs, ready for [`MapSession::load_markers`](crate::MapSession::load_markers).
    pub fn marker_pairs(&self) -> Vec<(f64, f64)> {
        self.markers.iter().map(|p| (p.x, p.y)).collect()
    }
}

/// Parses a GeoJSON document.
pub fn parse_geojson(text: &str) -> Result<GeoJsonDataset, MeridianError> {
    let geojson: GeoJson = text
        .parse()
        .map_err(|err: geojson::Error| MeridianError::Dataset(err.to_string()))?;
    Ok(from_geojson(geojson))
}

/// Converts a parsed GeoJSON document.
pub fn from_geojson(geojson: GeoJson) -> GeoJsonDataset {
    let features = match geojson {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(geometry) => vec![geojson::Feature {
            geometry: Some(geometry),
            ..Default::default()
        }],
    };

    let mut dataset = GeoJsonDataset::default();
    let mut records = vec![];
    let mut geometries = vec![];
    for (index, feature) in features.into_iter().enumerate() {
        let Some(geometry) = feature.geometry else {
            log::warn!("GeoJSON feature {index} has no geometry, skipping");
            dataset.skipped += 1;
            continue;
        };

        if let Ok(points) = points_from_value(&geometry.value) {
            dataset.markers.extend(points);
            continue;
        }

        match Geom::try_from(&geometry.value) {
            Ok(geom) => {
                geometries.push(geom);
                records.push(to_attributes(feature.properties.unwrap_or_default()));
            }
            Err(err) => {
                log::warn!("GeoJSON feature {index}: {err}, skipping");
                dataset.skipped += 1;
            }
        }
    }

    let fields = field_union(&records);
    dataset.features = geometries
        .into_iter()
        .zip(records)
        .map(|(geometry, record)| Feature::new(geometry, complete_record(record, &fields)))
        .collect();

    log::info!(
        "GeoJSON loaded: {} features, {} markers, {} skipped",
        dataset.features.len(),
        dataset.markers.len(),
        dataset.skipped
    );
    dataset
}

fn to_attributes(properties: geojson::JsonObject) -> Attributes {
    properties
        .into_iter()
        .map(|(name, value)| (name, to_attribute_value(value)))
        .collect()
}

fn to_attribute_value(value: JsonValue) -> AttributeValue {
    match value {
        JsonValue::Null => AttributeValue::Null,
        JsonValue::Bool(v) => AttributeValue::Bool(v),
        JsonValue::Number(n) => match n.as_i64() {
            Some(v) => AttributeValue::Integer(v),
            None => n
                .as_f64()
                .map(AttributeValue::Float)
                .unwrap_or(AttributeValue::Null),
        },
        JsonValue::String(v) => AttributeValue::Text(v),
        other => AttributeValue::Text(other.to_string()),
    }
}

fn field_union(records: &[Attributes]) -> Vec<String> {
    let mut fields: Vec<String> = vec![];
    for name in records.iter().flat_map(|record| record.field_names()) {
        if !fields.iter().any(|f| f == name) {
            fields.push(name.to_string());
        }
    }

    fields
}

fn complete_record(mut record: Attributes, fields: &[String]) -> Attributes {
    for field in fields {
        if record.get(field).is_none() {
            record.insert(field.clone(), AttributeValue::Null);
        }
    }

    record
}
