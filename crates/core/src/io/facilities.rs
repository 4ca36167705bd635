//! Facility CSV loading
//!
//! Facility lists come as loosely structured tables exported from DHIS2,
//! master facility registries or spreadsheets. Coordinate columns are
//! auto-detected by name, values are coerced to numeric, and rows with
//! impossible or placeholder coordinates are dropped with a count reported
//! back to the caller.

use crate::error::{Error, Result};
use crate::vector::FacilityPoint;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const LON_CANDIDATES: [&str; 5] = ["longitude", "long", "lon", "lng", "x"];
const LAT_CANDIDATES: [&str; 3] = ["latitude", "lat", "y"];
const NAME_CANDIDATES: [&str; 3] = ["name", "facility_name", "facility"];
const CATEGORY_CANDIDATES: [&str; 2] = ["type", "category"];

/// Result of loading a facility table
#[derive(Debug, Clone)]
pub struct FacilityLoad {
    pub points: Vec<FacilityPoint>,
    /// Rows dropped for non-numeric, out-of-range or (0,0) coordinates
    pub skipped: usize,
    /// Header names the coordinates were read from
    pub lon_column: String,
    pub lat_column: String,
}

/// Read facility points from CSV data.
///
/// Longitude/latitude columns are detected case-insensitively: an exact
/// match against the known aliases wins, then a header starting with an
/// alias, then one containing it. Rows with `|lon| > 180`,
/// `|lat| > 90` or exactly `(0, 0)` are discarded; `(0, 0)` is the usual
/// "GPS missing" placeholder in facility registries.
pub fn read_facilities_csv<R: Read>(reader: R) -> Result<FacilityLoad> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| Error::Decode(format!("CSV header error: {}", e)))?
        .clone();

    let lon_idx = detect_column(&headers, &LON_CANDIDATES, &[])
        .ok_or_else(|| Error::MissingColumn("longitude".into()))?;
    let lat_idx = detect_column(&headers, &LAT_CANDIDATES, &[lon_idx])
        .ok_or_else(|| Error::MissingColumn("latitude".into()))?;

    let mut claimed = vec![lon_idx, lat_idx];
    let name_idx = detect_column(&headers, &NAME_CANDIDATES, &claimed);
    if let Some(idx) = name_idx {
        claimed.push(idx);
    }
    let category_idx = detect_column(&headers, &CATEGORY_CANDIDATES, &claimed);

    let mut points = Vec::new();
    let mut skipped = 0usize;

    for record in csv_reader.records() {
        let record = record.map_err(|e| Error::Decode(format!("CSV record error: {}", e)))?;

        let lon = record.get(lon_idx).and_then(parse_coord);
        let lat = record.get(lat_idx).and_then(parse_coord);

        let (Some(lon), Some(lat)) = (lon, lat) else {
            skipped += 1;
            continue;
        };

        if lon.abs() > 180.0 || lat.abs() > 90.0 || (lon == 0.0 && lat == 0.0) {
            skipped += 1;
            continue;
        }

        let mut point = FacilityPoint::new(lon, lat);
        point.name = name_idx
            .and_then(|i| record.get(i))
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        point.category = category_idx
            .and_then(|i| record.get(i))
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        points.push(point);
    }

    Ok(FacilityLoad {
        points,
        skipped,
        lon_column: headers[lon_idx].to_string(),
        lat_column: headers[lat_idx].to_string(),
    })
}

/// Read facility points from a CSV file
pub fn read_facilities_csv_path<P: AsRef<Path>>(path: P) -> Result<FacilityLoad> {
    let file = File::open(path.as_ref())?;
    read_facilities_csv(file)
}

/// Exact alias match first, then prefix, then substring as a last resort.
///
/// Headers already claimed for another role are skipped, and the prefix
/// pass runs across all candidates before any substring match is accepted.
/// Without that ordering a one-letter alias like `y` would bind to the
/// first header merely containing the letter (`facility`, `category`)
/// instead of `Y_COORD`.
fn detect_column(
    headers: &csv::StringRecord,
    candidates: &[&str],
    claimed: &[usize],
) -> Option<usize> {
    let lowered: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
    let free = |idx: &usize| !claimed.contains(idx);

    for candidate in candidates {
        if let Some((idx, _)) = lowered
            .iter()
            .enumerate()
            .find(|(idx, h)| free(idx) && h.as_str() == *candidate)
        {
            return Some(idx);
        }
    }
    for candidate in candidates {
        if let Some((idx, _)) = lowered
            .iter()
            .enumerate()
            .find(|(idx, h)| free(idx) && h.starts_with(candidate))
        {
            return Some(idx);
        }
    }
    for candidate in candidates {
        if let Some((idx, _)) = lowered
            .iter()
            .enumerate()
            .find(|(idx, h)| free(idx) && h.contains(candidate))
        {
            return Some(idx);
        }
    }
    None
}

fn parse_coord(text: &str) -> Option<f64> {
    let value: f64 = text.trim().parse().ok()?;
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_exact_columns() {
        let data = "name,longitude,latitude\nConnaught Hospital,-13.236,8.484\nBo Clinic,-11.74,7.96\n";
        let load = read_facilities_csv(data.as_bytes()).unwrap();

        assert_eq!(load.points.len(), 2);
        assert_eq!(load.skipped, 0);
        assert_eq!(load.lon_column, "longitude");
        assert_eq!(load.points[0].name.as_deref(), Some("Connaught Hospital"));
        assert_eq!(load.points[0].x, -13.236);
        assert_eq!(load.points[0].y, 8.484);
    }

    #[test]
    fn test_partial_match_fallback() {
        let data = "facility,X_COORD,Y_COORD\nA,-12.0,8.0\n";
        let load = read_facilities_csv(data.as_bytes()).unwrap();

        assert_eq!(load.points.len(), 1);
        assert_eq!(load.lon_column, "X_COORD");
        assert_eq!(load.lat_column, "Y_COORD");
    }

    #[test]
    fn test_one_letter_alias_prefers_prefix_over_substring() {
        // "facility" and "category" both contain a "y"; latitude must still
        // bind to Y_COORD, not to whichever header happens to come first.
        let data = "facility,category,X_COORD,Y_COORD\nA,clinic,-12.0,8.0\n";
        let load = read_facilities_csv(data.as_bytes()).unwrap();

        assert_eq!(load.lon_column, "X_COORD");
        assert_eq!(load.lat_column, "Y_COORD");
        assert_eq!(load.points.len(), 1);
        assert_eq!(load.points[0].x, -12.0);
        assert_eq!(load.points[0].y, 8.0);
        assert_eq!(load.points[0].name.as_deref(), Some("A"));
        assert_eq!(load.points[0].category.as_deref(), Some("clinic"));
    }

    #[test]
    fn test_prefix_match_skips_unrelated_headers() {
        // "county" contains a "y" and comes first; the lat/lon columns must
        // still be found through their prefixes.
        let data = "county,lon_dd,lat_dd\nBo,-11.74,7.96\n";
        let load = read_facilities_csv(data.as_bytes()).unwrap();

        assert_eq!(load.lon_column, "lon_dd");
        assert_eq!(load.lat_column, "lat_dd");
        assert_eq!(load.points.len(), 1);
    }

    #[test]
    fn test_drops_invalid_rows() {
        let data = "lon,lat\n\
                    -13.2,8.4\n\
                    0,0\n\
                    200.0,8.0\n\
                    -12.0,95.0\n\
                    not_a_number,8.0\n";
        let load = read_facilities_csv(data.as_bytes()).unwrap();

        assert_eq!(load.points.len(), 1);
        assert_eq!(load.skipped, 4);
    }

    #[test]
    fn test_missing_column_is_error() {
        let data = "name,value\nA,1\n";
        let result = read_facilities_csv(data.as_bytes());
        assert!(matches!(result, Err(Error::MissingColumn(_))));
    }
}
