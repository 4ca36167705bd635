//! Access aggregation
//!
//! Combines a population raster with its aligned facility-distance raster:
//! population within/beyond a user radius, and population bucketed into the
//! fixed reporting bands. Both operations share one validity rule for
//! population pixels and compute percentages against the same total, so
//! their outputs reconcile exactly.

use popgrid_core::raster::Raster;
use popgrid_core::{Error, Result};

/// Open-ended last band cap: anything under 999 km still lands in ">10 km"
const LAST_BAND_CAP_KM: f64 = 999.0;

/// The fixed reporting bands (min km inclusive, max km exclusive)
pub const DISTANCE_BANDS_KM: [(f64, f64, &str); 6] = [
    (0.0, 1.0, "0-1 km"),
    (1.0, 2.0, "1-2 km"),
    (2.0, 3.0, "2-3 km"),
    (3.0, 5.0, "3-5 km"),
    (5.0, 10.0, "5-10 km"),
    (10.0, LAST_BAND_CAP_KM, ">10 km"),
];

/// Population partitioned by a single access radius
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccessSummary {
    pub radius_km: f64,
    pub population_within: f64,
    pub population_beyond: f64,
    pub total_population: f64,
    pub percent_within: f64,
    pub percent_beyond: f64,
}

/// Population falling into one distance band
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceBandResult {
    pub label: &'static str,
    pub min_km: f64,
    pub max_km: f64,
    pub population: f64,
    pub percentage: f64,
}

/// Population pixels count toward access figures only when they carry an
/// actual positive count: nodata, NaN and non-positive cells are excluded.
fn is_valid_population(raster: &Raster<f64>, value: f64) -> bool {
    !raster.is_nodata(value) && !value.is_nan() && value > 0.0
}

fn check_aligned(population: &Raster<f64>, distance: &Raster<f64>) -> Result<()> {
    let (pr, pc) = population.shape();
    let (dr, dc) = distance.shape();
    if pr != dr || pc != dc {
        return Err(Error::SizeMismatch {
            er: pr,
            ec: pc,
            ar: dr,
            ac: dc,
        });
    }
    Ok(())
}

/// Partition the valid population at `radius_km`.
///
/// `within + beyond == total` by construction; with zero total valid
/// population all percentages are 0 rather than NaN.
pub fn summarize_access(
    population: &Raster<f64>,
    distance: &Raster<f64>,
    radius_km: f64,
) -> Result<AccessSummary> {
    if !radius_km.is_finite() || radius_km < 0.0 {
        return Err(Error::InvalidParameter {
            name: "radius_km",
            value: radius_km.to_string(),
            reason: "radius must be finite and non-negative".to_string(),
        });
    }

    check_aligned(population, distance)?;
    let radius_m = radius_km * 1000.0;

    let mut within = 0.0;
    let mut beyond = 0.0;

    for (&pop, &dist) in population.data().iter().zip(distance.data().iter()) {
        if !is_valid_population(population, pop) {
            continue;
        }
        if dist <= radius_m {
            within += pop;
        } else {
            beyond += pop;
        }
    }

    let total = within + beyond;
    let (percent_within, percent_beyond) = if total > 0.0 {
        (within / total * 100.0, beyond / total * 100.0)
    } else {
        (0.0, 0.0)
    };

    Ok(AccessSummary {
        radius_km,
        population_within: within,
        population_beyond: beyond,
        total_population: total,
        percent_within,
        percent_beyond,
    })
}

/// Bucket the valid population into the six fixed distance bands.
///
/// Band bounds are half-open (`min <= d < max`) so each pixel lands in
/// exactly one band; the last band is practically open-ended via its 999 km
/// cap. Percentages are against the total valid population, 0 when that
/// total is 0.
pub fn band_population(
    population: &Raster<f64>,
    distance: &Raster<f64>,
) -> Result<Vec<DistanceBandResult>> {
    check_aligned(population, distance)?;

    let mut sums = [0.0f64; DISTANCE_BANDS_KM.len()];
    let mut total = 0.0;

    for (&pop, &dist) in population.data().iter().zip(distance.data().iter()) {
        if !is_valid_population(population, pop) {
            continue;
        }

        let km = dist / 1000.0;
        for (i, &(min_km, max_km, _)) in DISTANCE_BANDS_KM.iter().enumerate() {
            if km >= min_km && km < max_km {
                sums[i] += pop;
                total += pop;
                break;
            }
        }
    }

    let results = DISTANCE_BANDS_KM
        .iter()
        .zip(sums)
        .map(|(&(min_km, max_km, label), population)| DistanceBandResult {
            label,
            min_km,
            max_km,
            population,
            percentage: if total > 0.0 {
                population / total * 100.0
            } else {
                0.0
            },
        })
        .collect();

    Ok(results)
}
