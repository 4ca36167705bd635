//! WorldPop/GADM source catalog
//!
//! Read-only lookup tables and URL constructors for the supported data
//! sources. No networking happens in this crate: the fetcher that resolves
//! these URLs (including the retry across [`worldpop_url`] and
//! [`worldpop_alternative_url`]) lives outside the engine and hands back
//! materialized bytes.

use std::fmt;

/// Supported countries: (display name, ISO3 code), alphabetical by name
pub const COUNTRIES: [(&str, &str); 39] = [
    ("Angola", "AGO"),
    ("Benin", "BEN"),
    ("Botswana", "BWA"),
    ("Burkina Faso", "BFA"),
    ("Burundi", "BDI"),
    ("Cameroon", "CMR"),
    ("Central African Republic", "CAF"),
    ("Chad", "TCD"),
    ("Democratic Republic of the Congo", "COD"),
    ("Equatorial Guinea", "GNQ"),
    ("Ethiopia", "ETH"),
    ("Gabon", "GAB"),
    ("Gambia", "GMB"),
    ("Ghana", "GHA"),
    ("Guinea", "GIN"),
    ("Guinea-Bissau", "GNB"),
    ("Ivory Coast", "CIV"),
    ("Kenya", "KEN"),
    ("Liberia", "LBR"),
    ("Madagascar", "MDG"),
    ("Malawi", "MWI"),
    ("Mali", "MLI"),
    ("Mauritania", "MRT"),
    ("Mozambique", "MOZ"),
    ("Namibia", "NAM"),
    ("Niger", "NER"),
    ("Nigeria", "NGA"),
    ("Republic of the Congo", "COG"),
    ("Rwanda", "RWA"),
    ("Senegal", "SEN"),
    ("Sierra Leone", "SLE"),
    ("South Africa", "ZAF"),
    ("South Sudan", "SSD"),
    ("Sudan", "SDN"),
    ("Tanzania", "TZA"),
    ("Togo", "TGO"),
    ("Uganda", "UGA"),
    ("Zambia", "ZMB"),
    ("Zimbabwe", "ZWE"),
];

/// Years with WorldPop coverage
pub const FIRST_YEAR: i32 = 2000;
pub const LAST_YEAR: i32 = 2020;

/// Look up the ISO3 code for a country display name
pub fn country_code(name: &str) -> Option<&'static str> {
    COUNTRIES
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|&(_, code)| code)
}

/// Check that a code is one of the supported ISO3 codes
pub fn is_supported_code(code: &str) -> bool {
    COUNTRIES.iter().any(|&(_, c)| c.eq_ignore_ascii_case(code))
}

/// WorldPop age-group slices (5-year bands plus the total-population grid)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeGroup {
    /// Total population, all ages (the `ppp` grids)
    Total,
    /// Lower bound of a 5-year band: 0, 1, 5, 10, ..., 80
    Band(u8),
}

impl AgeGroup {
    /// Lower bounds of the published bands
    pub const BAND_STARTS: [u8; 18] = [
        0, 1, 5, 10, 15, 20, 25, 30, 35, 40, 45, 50, 55, 60, 65, 70, 75, 80,
    ];

    /// URL path code for this slice
    pub fn code(&self) -> String {
        match self {
            AgeGroup::Total => "ppp".to_string(),
            AgeGroup::Band(start) => start.to_string(),
        }
    }

    /// Parse a band lower bound; only published bands are accepted
    pub fn from_band_start(start: u8) -> Option<Self> {
        Self::BAND_STARTS
            .contains(&start)
            .then_some(AgeGroup::Band(start))
    }
}

/// Sex slice of the age-structure grids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Both,
    Male,
    Female,
}

impl Sex {
    pub fn code(&self) -> &'static str {
        match self {
            Sex::Both => "both",
            Sex::Male => "m",
            Sex::Female => "f",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Primary WorldPop URL for a country/year/slice.
///
/// Total population uses the UN-adjusted constrained grids; age/sex slices
/// use the global age-structure tree.
pub fn worldpop_url(code: &str, year: i32, age: AgeGroup, sex: Sex) -> String {
    let upper = code.to_uppercase();
    let lower = code.to_lowercase();

    if age == AgeGroup::Total && sex == Sex::Both {
        format!(
            "https://data.worldpop.org/GIS/Population/Global_2000_2020_Constrained/2020/BSGM/{}/{}_ppp_{}_UNadj_constrained.tif",
            upper, lower, year
        )
    } else {
        format!(
            "https://data.worldpop.org/GIS/AgeSex_structures/Global_2000_2020/{}/{}/{}_{}_{}_{}.tif",
            year,
            upper,
            lower,
            sex.code(),
            age.code(),
            year
        )
    }
}

/// Fallback WorldPop URL pattern (unconstrained tree), tried by the fetcher
/// when the primary pattern 404s. Only exists for the total-population grid.
pub fn worldpop_alternative_url(code: &str, year: i32, age: AgeGroup) -> Option<String> {
    (age == AgeGroup::Total).then(|| {
        format!(
            "https://data.worldpop.org/GIS/Population/Global_2000_2020/{}/{}/{}_ppp_{}.tif",
            year,
            code.to_uppercase(),
            code.to_lowercase(),
            year
        )
    })
}

/// GADM 4.1 shapefile archive for a country; admin levels 0-4 live inside
pub fn gadm_url(code: &str) -> String {
    format!(
        "https://geodata.ucdavis.edu/gadm/gadm4.1/shp/gadm41_{}_shp.zip",
        code.to_uppercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_lookup() {
        assert_eq!(country_code("Sierra Leone"), Some("SLE"));
        assert_eq!(country_code("sierra leone"), Some("SLE"));
        assert_eq!(country_code("Atlantis"), None);
        assert!(is_supported_code("sle"));
    }

    #[test]
    fn test_total_population_url() {
        let url = worldpop_url("SLE", 2020, AgeGroup::Total, Sex::Both);
        assert_eq!(
            url,
            "https://data.worldpop.org/GIS/Population/Global_2000_2020_Constrained/2020/BSGM/SLE/sle_ppp_2020_UNadj_constrained.tif"
        );
    }

    #[test]
    fn test_age_sex_url() {
        let url = worldpop_url("KEN", 2015, AgeGroup::Band(15), Sex::Female);
        assert_eq!(
            url,
            "https://data.worldpop.org/GIS/AgeSex_structures/Global_2000_2020/2015/KEN/ken_f_15_2015.tif"
        );
    }

    #[test]
    fn test_alternative_only_for_total() {
        assert!(worldpop_alternative_url("SLE", 2020, AgeGroup::Total).is_some());
        assert!(worldpop_alternative_url("SLE", 2020, AgeGroup::Band(5)).is_none());
    }

    #[test]
    fn test_age_band_validation() {
        assert!(AgeGroup::from_band_start(15).is_some());
        assert!(AgeGroup::from_band_start(3).is_none());
    }

    #[test]
    fn test_gadm_url() {
        assert_eq!(
            gadm_url("sle"),
            "https://geodata.ucdavis.edu/gadm/gadm4.1/shp/gadm41_SLE_shp.zip"
        );
    }
}
