//! # popgrid Analysis
//!
//! The geospatial aggregation and accessibility engine:
//!
//! - **zonal**: per-polygon population totals from a gridded surface
//! - **growth**: compound-growth projection of aggregates over future years
//! - **distance**: nearest-facility distance raster (chunked, latitude-corrected)
//! - **access**: population by access radius and fixed distance bands
//!
//! All inputs are already-materialized in-memory structures from
//! `popgrid-core`; nothing here performs I/O or blocks on the network.

pub mod access;
pub mod distance;
pub mod growth;
pub mod zonal;

mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::access::{band_population, summarize_access, AccessSummary, DistanceBandResult};
    pub use crate::distance::{distance_raster, DistanceParams};
    pub use crate::growth::{keyed_aggregates, project, project_value, Aggregate};
    pub use crate::zonal::{zonal_statistics, ZonalResult};
    pub use popgrid_core::prelude::*;
}
