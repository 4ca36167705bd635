//! # popgrid Core
//!
//! Core types and I/O for the popgrid population analysis engine.
//!
//! This crate provides:
//! - `Raster<T>`: Generic georeferenced grid type (population surfaces,
//!   distance rasters)
//! - `GeoTransform`: Affine transformation for georeferencing
//! - `CRS`: Coordinate Reference System handling
//! - `Feature`/`FeatureCollection`: boundary polygons with attributes
//! - `FacilityPoint`: service facility locations
//! - I/O for GeoTIFF rasters, GeoJSON boundaries and facility CSV tables
//! - The WorldPop/GADM source catalog (country, age-group and sex codes)

pub mod catalog;
pub mod crs;
pub mod error;
pub mod io;
pub mod raster;
pub mod vector;

pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};
pub use vector::{AttributeValue, FacilityPoint, Feature, FeatureCollection};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::vector::{AttributeValue, FacilityPoint, Feature, FeatureCollection};
}
