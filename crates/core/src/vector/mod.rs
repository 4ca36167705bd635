//! Vector data structures: boundary features and facility points

use crate::crs::CRS;
use geo_types::Geometry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Attribute value types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    /// String form for display/export; `Null` renders empty
    pub fn as_display(&self) -> String {
        match self {
            AttributeValue::Null => String::new(),
            AttributeValue::Bool(b) => b.to_string(),
            AttributeValue::Int(i) => i.to_string(),
            AttributeValue::Float(f) => f.to_string(),
            AttributeValue::String(s) => s.clone(),
        }
    }
}

/// A geographic feature with geometry and attributes.
///
/// Boundary features carry polygon or multi-polygon geometry plus the
/// attribute record from their source (GADM name columns, user columns).
/// Attributes are append-only during a run; zonal results are attached as
/// new columns and the geometry is never modified.
#[derive(Debug, Clone)]
pub struct Feature {
    /// Feature geometry
    pub geometry: Option<Geometry<f64>>,
    /// Feature attributes
    pub properties: HashMap<String, AttributeValue>,
    /// Optional feature ID
    pub id: Option<String>,
}

impl Feature {
    /// Create a new feature with geometry
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self {
            geometry: Some(geometry),
            properties: HashMap::new(),
            id: None,
        }
    }

    /// Create a feature with no geometry
    pub fn empty() -> Self {
        Self {
            geometry: None,
            properties: HashMap::new(),
            id: None,
        }
    }

    /// Set an attribute
    pub fn set_property(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.properties.insert(key.into(), value);
    }

    /// Get an attribute
    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }

    /// Best-effort display name: explicit id, then GADM-style name columns
    /// from the most specific level down.
    pub fn display_name(&self) -> Option<String> {
        if let Some(id) = &self.id {
            return Some(id.clone());
        }
        for key in ["NAME_4", "NAME_3", "NAME_2", "NAME_1", "NAME_0", "name"] {
            if let Some(AttributeValue::String(s)) = self.properties.get(key) {
                return Some(s.clone());
            }
        }
        None
    }
}

/// Collection of features sharing one CRS.
///
/// The CRS is best-effort: loaders fall back to WGS84 when the source does
/// not declare one.
#[derive(Debug, Clone)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
    pub crs: CRS,
}

impl FeatureCollection {
    pub fn new(crs: CRS) -> Self {
        Self {
            features: Vec::new(),
            crs,
        }
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self::new(CRS::wgs84())
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

/// A service facility location (health post, clinic, school, ...).
///
/// Coordinates are in the CRS of the raster the point will be measured
/// against; the attributes are only used for pre-filtering before distance
/// computation.
#[derive(Debug, Clone, PartialEq)]
pub struct FacilityPoint {
    pub x: f64,
    pub y: f64,
    /// Optional display name
    pub name: Option<String>,
    /// Optional type/category column used for filtering
    pub category: Option<String>,
}

impl FacilityPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            name: None,
            category: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{polygon, Geometry};

    #[test]
    fn test_feature_properties() {
        let geom: Geometry<f64> = Geometry::Polygon(polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
        ]);
        let mut feature = Feature::new(geom);
        feature.set_property("NAME_1", AttributeValue::String("Western Area".into()));

        assert_eq!(feature.display_name().as_deref(), Some("Western Area"));
    }

    #[test]
    fn test_display_name_prefers_most_specific() {
        let mut feature = Feature::empty();
        feature.set_property("NAME_1", AttributeValue::String("Region".into()));
        feature.set_property("NAME_2", AttributeValue::String("District".into()));

        assert_eq!(feature.display_name().as_deref(), Some("District"));
    }

    #[test]
    fn test_collection_default_is_wgs84() {
        let fc = FeatureCollection::default();
        assert!(fc.crs.is_equivalent(&CRS::wgs84()));
        assert!(fc.is_empty());
    }
}
