//! Facility distance raster
//!
//! Builds a grid aligned to the population raster where every cell holds
//! the straight-line distance in meters to the nearest facility. Distances
//! are computed per cell against the full facility list with a
//! latitude-based degree-to-meter correction; the grid is processed in
//! fixed-size chunks so peak memory stays bounded on country-scale rasters
//! and chunks parallelize without shared state.

use crate::maybe_rayon::*;
use popgrid_core::raster::Raster;
use popgrid_core::vector::FacilityPoint;
use popgrid_core::{Error, Result};

/// Meters per degree at the equator
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Parameters for the distance raster builder
#[derive(Debug, Clone, Copy)]
pub struct DistanceParams {
    /// Chunk edge length in cells
    pub chunk_size: usize,
    /// Buffer around the raster bounds, in degrees, inside which facilities
    /// are still considered even though they fall off the grid
    pub buffer_degrees: f64,
}

impl Default for DistanceParams {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            buffer_degrees: 0.5,
        }
    }
}

/// A rectangular block of the output grid, half-open in both axes
#[derive(Debug, Clone, Copy)]
struct Chunk {
    row_start: usize,
    row_end: usize,
    col_start: usize,
    col_end: usize,
}

/// Build the nearest-facility distance raster for `raster`'s grid.
///
/// Facility coordinates must already be in the raster's CRS. Facilities
/// beyond the raster bounds plus `params.buffer_degrees` are dropped before
/// computation; they cannot be the nearest facility for any in-grid cell by
/// more than the buffer and would only add per-cell work.
///
/// # Errors
///
/// `Error::NoFacilitiesInExtent` when no facility survives the extent
/// filter; no raster is produced in that case.
pub fn distance_raster(
    raster: &Raster<f64>,
    facilities: &[FacilityPoint],
    params: &DistanceParams,
) -> Result<Raster<f64>> {
    if params.chunk_size == 0 {
        return Err(Error::InvalidParameter {
            name: "chunk_size",
            value: "0".to_string(),
            reason: "chunk edge must be at least 1 cell".to_string(),
        });
    }

    let (min_x, min_y, max_x, max_y) = raster.bounds();
    let buffer = params.buffer_degrees;

    let in_extent: Vec<(f64, f64)> = facilities
        .iter()
        .filter(|f| {
            f.x >= min_x - buffer
                && f.x <= max_x + buffer
                && f.y >= min_y - buffer
                && f.y <= max_y + buffer
        })
        .map(|f| (f.x, f.y))
        .collect();

    if in_extent.is_empty() {
        return Err(Error::NoFacilitiesInExtent);
    }

    let dropped = facilities.len() - in_extent.len();
    if dropped > 0 {
        tracing::debug!(dropped, "facilities outside raster extent excluded");
    }

    let (rows, cols) = raster.shape();
    let chunks = chunk_grid(rows, cols, params.chunk_size);

    // Each chunk computes its block independently; blocks are merged into
    // the preallocated output afterwards, so no synchronization is needed.
    let blocks: Vec<(Chunk, Vec<f64>)> = chunks
        .into_par_iter()
        .map(|chunk| {
            let block = compute_chunk(raster, &in_extent, chunk);
            (chunk, block)
        })
        .collect();

    let mut output = raster.like(0.0);
    output.set_nodata(None);

    for (chunk, block) in blocks {
        let chunk_cols = chunk.col_end - chunk.col_start;
        for (i, value) in block.into_iter().enumerate() {
            let row = chunk.row_start + i / chunk_cols;
            let col = chunk.col_start + i % chunk_cols;
            unsafe {
                output.set_unchecked(row, col, value);
            }
        }
    }

    Ok(output)
}

fn chunk_grid(rows: usize, cols: usize, chunk_size: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();

    let mut row_start = 0;
    while row_start < rows {
        let row_end = (row_start + chunk_size).min(rows);
        let mut col_start = 0;
        while col_start < cols {
            let col_end = (col_start + chunk_size).min(cols);
            chunks.push(Chunk {
                row_start,
                row_end,
                col_start,
                col_end,
            });
            col_start = col_end;
        }
        row_start = row_end;
    }

    chunks
}

/// Minimum facility distance for every cell of one chunk, row-major
fn compute_chunk(raster: &Raster<f64>, facilities: &[(f64, f64)], chunk: Chunk) -> Vec<f64> {
    let mut block = Vec::with_capacity((chunk.row_end - chunk.row_start) * (chunk.col_end - chunk.col_start));

    for row in chunk.row_start..chunk.row_end {
        for col in chunk.col_start..chunk.col_end {
            let (x, y) = raster.pixel_to_geo(col, row);
            let cos_lat = y.to_radians().cos();

            let mut min_sq = f64::INFINITY;
            for &(fx, fy) in facilities {
                let dx_m = (fx - x) * METERS_PER_DEGREE;
                let dy_m = (fy - y) * METERS_PER_DEGREE * cos_lat;
                let d_sq = dx_m * dx_m + dy_m * dy_m;
                if d_sq < min_sq {
                    min_sq = d_sq;
                }
            }

            block.push(min_sq.sqrt());
        }
    }

    block
}
