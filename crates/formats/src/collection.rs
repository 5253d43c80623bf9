//! Lenient reading of the GeoJSON that feature services return.
//!
//! The document model is the `geojson` crate's. Before handing a body to
//! it, each feature is normalized so that an unknown or malformed geometry
//! becomes `null` instead of failing the whole collection.

use foundation::Crs;
pub use geojson::{Feature, FeatureCollection, GeoJson, Geometry};
use serde_json::{Map, Value};

use crate::error::FormatError;

/// Parses a feature collection; a lone `Feature` is accepted as a collection of one.
///
/// A missing `features` member reads as an empty collection.
pub fn parse_feature_collection(body: &str) -> Result<FeatureCollection, FormatError> {
    let mut value: Value = serde_json::from_str(body.trim())?;
    let object = value
        .as_object_mut()
        .ok_or_else(|| FormatError::Json("document is not an object".to_string()))?;

    if object.get("type").and_then(Value::as_str) == Some("Feature") {
        normalize_feature(object);
    } else {
        let features = object
            .entry("features")
            .or_insert_with(|| Value::Array(Vec::new()))
            .as_array_mut()
            .ok_or_else(|| FormatError::Json("`features` is not an array".to_string()))?;
        for feature in features {
            let feature = feature
                .as_object_mut()
                .ok_or_else(|| FormatError::Json("feature is not an object".to_string()))?;
            normalize_feature(feature);
        }
        object.insert("type".to_string(), Value::from("FeatureCollection"));
    }

    match GeoJson::from_json_value(value)? {
        GeoJson::FeatureCollection(fc) => Ok(fc),
        GeoJson::Feature(feature) => Ok(FeatureCollection {
            bbox: None,
            features: vec![feature],
            foreign_members: None,
        }),
        GeoJson::Geometry(_) => Err(FormatError::Json(
            "expected a feature collection, found a bare geometry".to_string(),
        )),
    }
}

/// Declared CRS of the coordinates, from the legacy `crs` member GeoServer
/// still emits. GeoJSON defaults to WGS84.
pub fn coordinate_crs(fc: &FeatureCollection) -> Crs {
    fc.foreign_members
        .as_ref()
        .and_then(|members| members.get("crs"))
        .and_then(|crs| crs.pointer("/properties/name"))
        .and_then(Value::as_str)
        .and_then(|name| Crs::parse(name).ok())
        .unwrap_or(Crs::Wgs84)
}

fn normalize_feature(feature: &mut Map<String, Value>) {
    feature.insert("type".to_string(), Value::from("Feature"));

    let geometry = feature
        .remove("geometry")
        .filter(is_geometry)
        .unwrap_or(Value::Null);
    feature.insert("geometry".to_string(), geometry);

    if !feature.get("properties").is_some_and(Value::is_object) {
        feature.insert("properties".to_string(), Value::Null);
    }

    match feature.get("id") {
        None | Some(Value::String(_)) | Some(Value::Number(_)) => {}
        Some(Value::Null) => {
            feature.remove("id");
        }
        Some(other) => {
            let text = other.to_string();
            feature.insert("id".to_string(), Value::String(text));
        }
    }
}

fn is_geometry(value: &Value) -> bool {
    !value.is_null() && matches!(GeoJson::from_json_value(value.clone()), Ok(GeoJson::Geometry(_)))
}
