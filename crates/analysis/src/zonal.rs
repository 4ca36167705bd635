//! Zonal statistics
//!
//! Aggregates population pixel values under each boundary polygon: total,
//! mean density and valid-pixel count per feature, in input order. Masking
//! crops to each geometry's bounding extent first, so per-feature cost is
//! proportional to the feature's footprint rather than the whole raster.

use crate::growth::Aggregate;
use geo::{BoundingRect, Contains};
use geo_types::{Geometry, Point};
use popgrid_core::raster::Raster;
use popgrid_core::vector::{Feature, FeatureCollection};
use popgrid_core::{Error, Result};

/// Result of zonal statistics for one boundary feature
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZonalResult {
    /// Sum of valid pixel values under the mask
    pub total_population: f64,
    /// Mean of valid pixel values
    pub mean_density: f64,
    /// Number of pixels that survived the nodata/NaN/negative filters
    pub valid_pixels: usize,
}

impl ZonalResult {
    /// The all-zero record emitted for empty intersections and masking failures
    pub fn zero() -> Self {
        Self {
            total_population: 0.0,
            mean_density: 0.0,
            valid_pixels: 0,
        }
    }

    /// Total/mean pair for projection
    pub fn aggregate(&self) -> Aggregate {
        Aggregate {
            total: self.total_population,
            mean: self.mean_density,
        }
    }
}

/// Compute zonal statistics for every feature of a boundary collection.
///
/// One result per feature, order-preserving. A feature whose footprint
/// contains no valid pixels (empty intersection, or every candidate pixel
/// excluded as nodata, NaN or negative) yields `{0, 0, 0}`. So does a
/// feature whose geometry cannot be masked at all (missing geometry,
/// non-areal type, degenerate extent); that case additionally logs a
/// warning, and never aborts the remaining features.
///
/// # Errors
///
/// `Error::CrsMismatch` when the collection and the raster both declare a
/// CRS and they disagree; reprojection must happen before calling in.
pub fn zonal_statistics(
    raster: &Raster<f64>,
    polygons: &FeatureCollection,
) -> Result<Vec<ZonalResult>> {
    if let Some(raster_crs) = raster.crs() {
        if !raster_crs.is_equivalent(&polygons.crs) {
            return Err(Error::CrsMismatch(
                raster_crs.identifier(),
                polygons.crs.identifier(),
            ));
        }
    }

    let results = polygons
        .iter()
        .enumerate()
        .map(|(idx, feature)| match mask_feature(raster, feature) {
            Some(result) => result,
            None => {
                tracing::warn!(
                    feature = idx,
                    name = feature.display_name().as_deref().unwrap_or("<unnamed>"),
                    "cannot mask feature geometry, emitting zero result"
                );
                ZonalResult::zero()
            }
        })
        .collect();

    Ok(results)
}

/// Mask one feature against the raster. `None` means the geometry could not
/// be masked (the warn-and-zero path); a legitimate zero-overlap footprint
/// returns `Some(zero())` silently.
fn mask_feature(raster: &Raster<f64>, feature: &Feature) -> Option<ZonalResult> {
    let geometry = feature.geometry.as_ref()?;

    if !is_areal(geometry) {
        return None;
    }

    let rect = geometry.bounding_rect()?;
    if !rect.min().x.is_finite() || !rect.min().y.is_finite() {
        return None;
    }

    let Some(window) =
        raster.window_for_bounds(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    else {
        // Bounding box entirely off the raster: a legitimate empty intersection
        return Some(ZonalResult::zero());
    };

    let mut sum = 0.0;
    let mut count = 0usize;

    for row in window.row_start..window.row_end {
        for col in window.col_start..window.col_end {
            let value = unsafe { raster.get_unchecked(row, col) };

            // Nodata and NaN are "no measurement"; negative populations are
            // resampling artifacts. All three are invalid, not errors.
            if raster.is_nodata(value) || value.is_nan() || value < 0.0 {
                continue;
            }

            let (x, y) = raster.pixel_to_geo(col, row);
            if geometry.contains(&Point::new(x, y)) {
                sum += value;
                count += 1;
            }
        }
    }

    if count == 0 {
        return Some(ZonalResult::zero());
    }

    Some(ZonalResult {
        total_population: sum,
        mean_density: sum / count as f64,
        valid_pixels: count,
    })
}

fn is_areal(geometry: &Geometry<f64>) -> bool {
    matches!(
        geometry,
        Geometry::Polygon(_) | Geometry::MultiPolygon(_) | Geometry::Rect(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo_types::{polygon, MultiPolygon};
    use popgrid_core::{GeoTransform, CRS};

    /// 2x2 raster of 1-degree cells with origin (0, 2): cell centers at
    /// (0.5, 1.5), (1.5, 1.5), (0.5, 0.5), (1.5, 0.5)
    fn uniform_raster(value: f64) -> Raster<f64> {
        let mut raster = Raster::filled(2, 2, value);
        raster.set_transform(GeoTransform::new(0.0, 2.0, 1.0, -1.0));
        raster.set_nodata(Some(-1.0));
        raster
    }

    fn covering_feature() -> Feature {
        Feature::new(Geometry::Polygon(polygon![
            (x: -0.5, y: -0.5),
            (x: 2.5, y: -0.5),
            (x: 2.5, y: 2.5),
            (x: -0.5, y: 2.5),
        ]))
    }

    fn collection(features: Vec<Feature>) -> FeatureCollection {
        let mut fc = FeatureCollection::new(CRS::wgs84());
        for f in features {
            fc.push(f);
        }
        fc
    }

    #[test]
    fn test_full_coverage() {
        let raster = uniform_raster(100.0);
        let fc = collection(vec![covering_feature()]);

        let results = zonal_statistics(&raster, &fc).unwrap();
        assert_eq!(results.len(), 1);
        assert_relative_eq!(results[0].total_population, 400.0);
        assert_relative_eq!(results[0].mean_density, 100.0);
        assert_eq!(results[0].valid_pixels, 4);
    }

    #[test]
    fn test_zero_overlap_is_zero_result() {
        let raster = uniform_raster(100.0);
        let far_away = Feature::new(Geometry::Polygon(polygon![
            (x: 50.0, y: 50.0),
            (x: 51.0, y: 50.0),
            (x: 51.0, y: 51.0),
            (x: 50.0, y: 51.0),
        ]));
        let fc = collection(vec![far_away]);

        let results = zonal_statistics(&raster, &fc).unwrap();
        assert_eq!(results[0], ZonalResult::zero());
    }

    #[test]
    fn test_invalid_pixels_filtered() {
        let mut raster = uniform_raster(100.0);
        raster.set(0, 0, -1.0).unwrap(); // nodata sentinel
        raster.set(0, 1, f64::NAN).unwrap();
        raster.set(1, 0, -5.0).unwrap(); // negative artifact

        let fc = collection(vec![covering_feature()]);
        let results = zonal_statistics(&raster, &fc).unwrap();

        assert_eq!(results[0].valid_pixels, 1);
        assert_relative_eq!(results[0].total_population, 100.0);
        assert_relative_eq!(results[0].mean_density, 100.0);
    }

    #[test]
    fn test_all_invalid_is_zero_not_nan() {
        let mut raster = uniform_raster(-1.0); // all nodata
        raster.set_nodata(Some(-1.0));

        let fc = collection(vec![covering_feature()]);
        let results = zonal_statistics(&raster, &fc).unwrap();
        assert_eq!(results[0], ZonalResult::zero());
    }

    #[test]
    fn test_degenerate_feature_does_not_abort_batch() {
        let raster = uniform_raster(100.0);
        let fc = collection(vec![
            Feature::empty(), // no geometry at all
            Feature::new(Geometry::Point(Point::new(0.5, 1.5))), // non-areal
            covering_feature(),
        ]);

        let results = zonal_statistics(&raster, &fc).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0], ZonalResult::zero());
        assert_eq!(results[1], ZonalResult::zero());
        assert_relative_eq!(results[2].total_population, 400.0);
    }

    #[test]
    fn test_partial_coverage_multipolygon() {
        let raster = uniform_raster(10.0);
        // Two 1x1 squares covering the left column's cell centers
        let mp = MultiPolygon(vec![
            polygon![(x: 0.0, y: 1.0), (x: 1.0, y: 1.0), (x: 1.0, y: 2.0), (x: 0.0, y: 2.0)],
            polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)],
        ]);
        let fc = collection(vec![Feature::new(Geometry::MultiPolygon(mp))]);

        let results = zonal_statistics(&raster, &fc).unwrap();
        assert_eq!(results[0].valid_pixels, 2);
        assert_relative_eq!(results[0].total_population, 20.0);
    }

    #[test]
    fn test_total_equals_mean_times_count() {
        let mut raster = uniform_raster(0.0);
        raster.set(0, 0, 12.5).unwrap();
        raster.set(0, 1, 7.25).unwrap();
        raster.set(1, 0, 119.0).unwrap();
        raster.set(1, 1, 0.5).unwrap();

        let fc = collection(vec![covering_feature()]);
        let r = zonal_statistics(&raster, &fc).unwrap()[0];

        assert_relative_eq!(
            r.total_population,
            r.mean_density * r.valid_pixels as f64,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_crs_mismatch_is_fatal() {
        let mut raster = uniform_raster(1.0);
        raster.set_crs(Some(CRS::from_epsg(32628)));

        let fc = collection(vec![covering_feature()]); // WGS84
        let result = zonal_statistics(&raster, &fc);
        assert!(matches!(result, Err(Error::CrsMismatch(_, _))));
    }
}
