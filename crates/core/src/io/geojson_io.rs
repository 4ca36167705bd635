//! GeoJSON boundary loading
//!
//! Boundary layers (GADM exports, user uploads) arrive as GeoJSON feature
//! collections. GeoJSON coordinates are WGS84 by definition, so the loaded
//! collection is tagged EPSG:4326; sources that were reprojected upstream
//! must say so via `FeatureCollection::crs` after loading.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::vector::{AttributeValue, Feature, FeatureCollection};
use geojson::GeoJson;
use std::fs;
use std::path::Path;

/// Parse a GeoJSON string into a [`FeatureCollection`].
///
/// Features with missing or unparseable geometry are kept with
/// `geometry: None` so attribute rows stay aligned with the source; the
/// zonal engine treats them as zero-overlap features.
pub fn read_boundaries_geojson(text: &str) -> Result<FeatureCollection> {
    let geojson: GeoJson = text
        .parse()
        .map_err(|e| Error::Decode(format!("GeoJSON parse error: {}", e)))?;

    let mut collection = FeatureCollection::new(CRS::wgs84());

    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in fc.features {
                collection.push(convert_feature(feature));
            }
        }
        GeoJson::Feature(feature) => {
            collection.push(convert_feature(feature));
        }
        GeoJson::Geometry(geometry) => {
            let mut feature = Feature::empty();
            feature.geometry = convert_geometry(Some(geometry));
            collection.push(feature);
        }
    }

    Ok(collection)
}

/// Read a GeoJSON file into a [`FeatureCollection`]
pub fn read_boundaries_geojson_path<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    let text = fs::read_to_string(path.as_ref())?;
    read_boundaries_geojson(&text)
}

fn convert_feature(feature: geojson::Feature) -> Feature {
    let mut out = Feature::empty();
    out.geometry = convert_geometry(feature.geometry);

    if let Some(id) = feature.id {
        out.id = Some(match id {
            geojson::feature::Id::String(s) => s,
            geojson::feature::Id::Number(n) => n.to_string(),
        });
    }

    if let Some(properties) = feature.properties {
        for (key, value) in properties {
            out.properties.insert(key, convert_value(value));
        }
    }

    out
}

fn convert_geometry(geometry: Option<geojson::Geometry>) -> Option<geo_types::Geometry<f64>> {
    let geometry = geometry?;
    match geo_types::Geometry::<f64>::try_from(geometry.value) {
        Ok(geom) => Some(geom),
        Err(e) => {
            tracing::warn!("Skipping unparseable geometry: {}", e);
            None
        }
    }
}

fn convert_value(value: serde_json::Value) -> AttributeValue {
    match value {
        serde_json::Value::Null => AttributeValue::Null,
        serde_json::Value::Bool(b) => AttributeValue::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                AttributeValue::Int(i)
            } else {
                AttributeValue::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(s) => AttributeValue::String(s),
        other => AttributeValue::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"NAME_1": "Western Area", "GID_1": "SLE.4_1", "pop2015": 1500234},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[-13.3, 8.2], [-13.0, 8.2], [-13.0, 8.5], [-13.3, 8.5], [-13.3, 8.2]]]
                }
            },
            {
                "type": "Feature",
                "properties": {"NAME_1": "NoGeometry"},
                "geometry": null
            }
        ]
    }"#;

    #[test]
    fn test_read_feature_collection() {
        let fc = read_boundaries_geojson(SAMPLE).unwrap();
        assert_eq!(fc.len(), 2);
        assert!(fc.crs.is_equivalent(&CRS::wgs84()));

        let first = &fc.features[0];
        assert!(first.geometry.is_some());
        assert_eq!(first.display_name().as_deref(), Some("Western Area"));
        assert!(matches!(
            first.get_property("pop2015"),
            Some(AttributeValue::Int(1500234))
        ));

        // Null geometry stays in the collection, aligned with its attributes
        assert!(fc.features[1].geometry.is_none());
    }

    #[test]
    fn test_read_bare_geometry() {
        let text = r#"{"type": "Point", "coordinates": [-13.2, 8.4]}"#;
        let fc = read_boundaries_geojson(text).unwrap();
        assert_eq!(fc.len(), 1);
        assert!(fc.features[0].geometry.is_some());
    }

    #[test]
    fn test_invalid_json_is_decode_error() {
        let result = read_boundaries_geojson("{not geojson");
        assert!(matches!(result, Err(Error::Decode(_))));
    }
}
