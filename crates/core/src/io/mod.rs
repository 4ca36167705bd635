//! I/O operations for reading and writing geospatial data
//!
//! Acquisition lives here, not in the analysis crate: rasters, boundaries and
//! facility tables are fully materialized before any computation starts, and
//! a failure at this layer is fatal to the run.

mod facilities;
mod geojson_io;
mod native;

pub use facilities::{read_facilities_csv, read_facilities_csv_path, FacilityLoad};
pub use geojson_io::{read_boundaries_geojson, read_boundaries_geojson_path};
pub use native::{
    read_geotiff, read_geotiff_from_buffer, write_geotiff, write_geotiff_to_buffer,
};
