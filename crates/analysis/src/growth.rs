//! Compound growth projection
//!
//! Projects a base-year aggregate forward with a constant annual growth
//! rate. Every target year is computed independently from the base value
//! (`base * factor^t`), never chained year-to-year, so rounding drift does
//! not accumulate across the horizon.

use crate::zonal::ZonalResult;
use popgrid_core::vector::FeatureCollection;
use std::collections::BTreeMap;

/// Total/mean pair carried through a projection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    pub total: f64,
    pub mean: f64,
}

/// Project a single value `t` years forward at `rate_percent` per year.
///
/// `t = 0` returns the base unchanged; negative rates decay geometrically
/// toward zero without ever changing sign.
pub fn project_value(base: f64, rate_percent: f64, elapsed_years: u32) -> f64 {
    let factor = 1.0 + rate_percent / 100.0;
    base * factor.powi(elapsed_years as i32)
}

/// Project per-unit aggregates over `years` future years.
///
/// Returns a map from target year (`base_year + 1 ..= base_year + years`)
/// to the projected aggregates, keyed the same way as `base`. The base year
/// itself is not included; `years = 0` yields an empty map.
pub fn project(
    base: &BTreeMap<String, Aggregate>,
    base_year: i32,
    rate_percent: f64,
    years: u32,
) -> BTreeMap<i32, BTreeMap<String, Aggregate>> {
    let mut projected = BTreeMap::new();

    for t in 1..=years {
        let year = base_year + t as i32;
        let per_unit = base
            .iter()
            .map(|(key, agg)| {
                (
                    key.clone(),
                    Aggregate {
                        total: project_value(agg.total, rate_percent, t),
                        mean: project_value(agg.mean, rate_percent, t),
                    },
                )
            })
            .collect();
        projected.insert(year, per_unit);
    }

    projected
}

/// Build the keyed base map for [`project`] from zonal results.
///
/// Keys are feature display names where available, with an index suffix to
/// disambiguate duplicates, and `feature_<idx>` for nameless features.
/// Results must be aligned with the collection (as produced by
/// `zonal_statistics`).
pub fn keyed_aggregates(
    polygons: &FeatureCollection,
    results: &[ZonalResult],
) -> BTreeMap<String, Aggregate> {
    let mut map = BTreeMap::new();

    for (idx, (feature, result)) in polygons.iter().zip(results).enumerate() {
        let base_key = feature
            .display_name()
            .unwrap_or_else(|| format!("feature_{}", idx));
        let key = if map.contains_key(&base_key) {
            format!("{} ({})", base_key, idx)
        } else {
            base_key
        };
        map.insert(key, result.aggregate());
    }

    map
}
