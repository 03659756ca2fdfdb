//! Injectable reference data: standard size series and legacy code maps.
//!
//! The built-in tables are the catalog's fixed domain data. A deployment may
//! override any of them with a JSON document (see
//! [`ReferenceData::from_json_file`]); keys left out keep their defaults.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::defaults::{
    COMMERCIAL_CATEGORY_AUTO_START, COMMERCIAL_CATEGORY_WIDTH, NORMATI_CATEGORY_AUTO_START,
    NORMATI_CATEGORY_WIDTH, SUBCATEGORY_WIDTH,
};
use crate::error::{Error, Result};
use crate::models::Taxonomy;
use crate::normalize::canonical_code;

/// All reference tables the migrations are configured with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ReferenceDataFile")]
pub struct ReferenceData {
    pub series: StandardSeries,
    pub normati: TaxonomyProfile,
    pub commercial: TaxonomyProfile,
}

impl Default for ReferenceData {
    fn default() -> Self {
        Self {
            series: StandardSeries::default(),
            normati: TaxonomyProfile::normati(),
            commercial: TaxonomyProfile::commercial(),
        }
    }
}

/// On-disk shape of [`ReferenceData`]: every key optional, profile fields
/// merged over the built-in profile of their own taxonomy.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReferenceDataFile {
    series: StandardSeries,
    normati: TaxonomyProfileOverride,
    commercial: TaxonomyProfileOverride,
}

impl From<ReferenceDataFile> for ReferenceData {
    fn from(file: ReferenceDataFile) -> Self {
        Self {
            series: file.series,
            normati: file.normati.merge_over(TaxonomyProfile::normati()),
            commercial: file.commercial.merge_over(TaxonomyProfile::commercial()),
        }
    }
}

impl ReferenceData {
    /// Load reference data from a JSON file, falling back to the built-in
    /// tables for any key the file does not set.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let data: ReferenceData = serde_json::from_str(&text)?;
        data.validate()?;
        tracing::debug!(
            subsystem = "core",
            component = "reference",
            path = %path.display(),
            "Reference data loaded"
        );
        Ok(data)
    }

    /// Profile governing the given taxonomy.
    pub fn profile(&self, taxonomy: Taxonomy) -> &TaxonomyProfile {
        match taxonomy {
            Taxonomy::Normati => &self.normati,
            Taxonomy::Commercial => &self.commercial,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.series.validate()?;
        self.normati.validate("normati")?;
        self.commercial.validate("commercial")
    }
}

// =============================================================================
// TAXONOMY PROFILES
// =============================================================================

/// A known legacy (category, subcategory) pair and its target code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownSubcategory {
    pub category: String,
    pub subcategory: String,
    pub target: String,
}

impl KnownSubcategory {
    fn new(category: &str, subcategory: &str, target: &str) -> Self {
        Self {
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            target: target.to_string(),
        }
    }
}

/// Code layout and legacy mappings of one taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyProfile {
    pub category_width: usize,
    pub category_auto_start: u32,
    /// Legacy category code → target numeric code.
    pub known_categories: BTreeMap<String, String>,
    /// Keyed by pre-migration codes of both levels.
    pub known_subcategories: Vec<KnownSubcategory>,
}

/// Partial [`TaxonomyProfile`] as read from a reference file.
#[derive(Debug, Default, Deserialize)]
struct TaxonomyProfileOverride {
    category_width: Option<usize>,
    category_auto_start: Option<u32>,
    known_categories: Option<BTreeMap<String, String>>,
    known_subcategories: Option<Vec<KnownSubcategory>>,
}

impl TaxonomyProfileOverride {
    fn merge_over(self, base: TaxonomyProfile) -> TaxonomyProfile {
        TaxonomyProfile {
            category_width: self.category_width.unwrap_or(base.category_width),
            category_auto_start: self.category_auto_start.unwrap_or(base.category_auto_start),
            known_categories: self.known_categories.unwrap_or(base.known_categories),
            known_subcategories: self.known_subcategories.unwrap_or(base.known_subcategories),
        }
    }
}

impl TaxonomyProfile {
    /// Standards ("normati") taxonomy.
    pub fn normati() -> Self {
        let known_categories = [
            ("VIT", "001"),
            ("ROS", "002"),
            ("DAD", "003"),
            ("GHI", "004"),
            ("SPI", "005"),
            ("PRI", "006"),
            ("AEL", "007"),
            ("CUS", "008"),
            ("LIN", "009"),
            ("CHI", "010"),
        ];
        let known_subcategories = vec![
            KnownSubcategory::new("VIT", "TESA", "0001"),
            KnownSubcategory::new("VIT", "HEPZ", "0002"),
            KnownSubcategory::new("VIT", "HEPA", "0003"),
            KnownSubcategory::new("VIT", "HETZ", "0004"),
            KnownSubcategory::new("VIT", "HETA", "0005"),
            KnownSubcategory::new("VIT", "TCEI", "0006"),
            KnownSubcategory::new("ROS", "PLAN", "0001"),
            KnownSubcategory::new("DAD", "ESAG", "0001"),
            KnownSubcategory::new("CUS", "R625", "0001"),
            KnownSubcategory::new("LIN", "D685", "0001"),
            KnownSubcategory::new("CHI", "D688", "0001"),
        ];
        Self {
            category_width: NORMATI_CATEGORY_WIDTH,
            category_auto_start: NORMATI_CATEGORY_AUTO_START,
            known_categories: known_categories
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            known_subcategories,
        }
    }

    /// Commercial ("commerciali") taxonomy.
    pub fn commercial() -> Self {
        let known_categories = [("COMV", "1000"), ("LAVO", "2000"), ("CONS", "3000")];
        let known_subcategories = vec![
            KnownSubcategory::new("COMV", "PIAS", "0001"),
            KnownSubcategory::new("LAVO", "FRES", "0001"),
            KnownSubcategory::new("CONS", "COLL", "0001"),
        ];
        Self {
            category_width: COMMERCIAL_CATEGORY_WIDTH,
            category_auto_start: COMMERCIAL_CATEGORY_AUTO_START,
            known_categories: known_categories
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            known_subcategories,
        }
    }

    /// Known category map with canonicalized keys.
    pub fn category_map(&self) -> HashMap<String, String> {
        self.known_categories
            .iter()
            .map(|(k, v)| (canonical_code(k), v.clone()))
            .collect()
    }

    /// Known pair map with canonicalized keys.
    pub fn subcategory_map(&self) -> HashMap<(String, String), String> {
        self.known_subcategories
            .iter()
            .map(|k| {
                (
                    (canonical_code(&k.category), canonical_code(&k.subcategory)),
                    k.target.clone(),
                )
            })
            .collect()
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.category_width == 0 || self.category_width > 9 {
            return Err(Error::Config(format!(
                "{}: category width must be between 1 and 9, got {}",
                name, self.category_width
            )));
        }
        if self.category_auto_start.to_string().len() > self.category_width {
            return Err(Error::Config(format!(
                "{}: category auto start {} does not fit in {} digits",
                name, self.category_auto_start, self.category_width
            )));
        }
        for (legacy, target) in &self.known_categories {
            if !is_numeric_code(target, self.category_width) {
                return Err(Error::Config(format!(
                    "{}: target {:?} for legacy category {:?} is not a {}-digit code",
                    name, target, legacy, self.category_width
                )));
            }
        }
        for known in &self.known_subcategories {
            if !is_numeric_code(&known.target, SUBCATEGORY_WIDTH) {
                return Err(Error::Config(format!(
                    "{}: target {:?} for legacy subcategory {:?}/{:?} is not a {}-digit code",
                    name, known.target, known.category, known.subcategory, SUBCATEGORY_WIDTH
                )));
            }
        }
        Ok(())
    }
}

fn is_numeric_code(code: &str, width: usize) -> bool {
    code.len() == width && code.bytes().all(|b| b.is_ascii_digit())
}

// =============================================================================
// STANDARD SERIES
// =============================================================================

/// Standard manufacturable sizes per product family (millimetres).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandardSeries {
    pub round: Vec<f64>,
    pub hex: Vec<f64>,
    pub flat_widths: Vec<f64>,
    pub flat_thicknesses: Vec<f64>,
    pub tube_outer: Vec<f64>,
    pub tube_wall: Vec<f64>,
    pub square_tube_side: Vec<f64>,
    pub square_tube_wall: Vec<f64>,
    pub sheet: Vec<f64>,
    pub beams: Vec<String>,
    pub angles: Vec<String>,
    pub channels: Vec<String>,
    pub tees: Vec<String>,
}

fn tokens(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl Default for StandardSeries {
    fn default() -> Self {
        Self {
            round: vec![
                6.0, 8.0, 10.0, 12.0, 14.0, 15.0, 16.0, 18.0, 19.0, 20.0, 22.0, 24.0, 25.0, 26.0,
                27.0, 28.0, 30.0, 32.0, 35.0, 36.0, 40.0, 45.0, 50.0, 55.0, 60.0, 65.0, 70.0,
                75.0, 80.0, 85.0, 90.0, 95.0, 100.0, 105.0, 110.0, 120.0, 130.0, 140.0, 150.0,
                160.0, 170.0, 180.0, 190.0, 200.0, 210.0, 220.0, 230.0, 240.0, 250.0, 260.0,
                270.0, 280.0, 290.0, 300.0, 310.0, 340.0,
            ],
            hex: vec![
                10.0, 12.0, 13.0, 14.0, 15.0, 17.0, 19.0, 22.0, 24.0, 27.0, 30.0, 32.0, 36.0,
                41.0, 46.0, 50.0, 80.0,
            ],
            flat_widths: vec![
                10.0, 12.0, 15.0, 16.0, 20.0, 25.0, 30.0, 35.0, 40.0, 45.0, 50.0, 55.0, 60.0,
                65.0, 70.0, 75.0, 80.0, 90.0, 100.0, 110.0, 120.0, 130.0, 135.0, 140.0, 150.0,
                160.0, 170.0, 180.0, 190.0, 200.0, 210.0, 220.0, 230.0, 240.0, 250.0, 260.0,
                270.0, 280.0, 300.0, 320.0, 330.0, 340.0, 350.0, 360.0, 380.0, 400.0, 450.0,
                500.0, 600.0,
            ],
            flat_thicknesses: vec![
                2.0, 3.0, 4.0, 5.0, 6.0, 8.0, 10.0, 12.0, 15.0, 20.0, 25.0, 30.0, 35.0, 40.0,
                50.0, 60.0, 70.0, 80.0, 100.0, 120.0, 150.0, 200.0,
            ],
            tube_outer: vec![
                12.0, 15.0, 16.0, 18.0, 20.0, 21.3, 22.0, 25.0, 26.9, 30.0, 32.0, 33.7, 35.0,
                38.0, 40.0, 42.0, 42.4, 45.0, 48.3, 50.0, 55.0, 60.0, 60.3, 70.0, 76.1, 80.0,
                88.9, 90.0, 101.6, 108.0, 114.3, 120.0, 121.0, 127.0, 133.0, 139.7, 152.4,
                159.0, 168.3, 177.8, 193.7, 219.1, 244.5, 273.0, 323.9,
            ],
            tube_wall: vec![
                1.5, 1.75, 2.0, 2.5, 2.6, 2.9, 3.0, 3.2, 3.6, 4.0, 4.5, 5.0, 6.0, 6.3, 7.1, 8.0,
                10.0, 16.0,
            ],
            square_tube_side: vec![
                10.0, 12.0, 15.0, 16.0, 20.0, 25.0, 30.0, 34.0, 35.0, 40.0, 45.0, 50.0, 60.0,
                70.0, 80.0, 90.0, 100.0, 110.0, 120.0, 140.0, 150.0, 160.0, 180.0, 200.0, 220.0,
                250.0, 260.0, 300.0, 350.0, 400.0,
            ],
            square_tube_wall: vec![
                1.0, 1.5, 2.0, 2.5, 3.0, 3.2, 3.5, 4.0, 5.0, 6.0, 6.3, 7.1, 8.0, 10.0, 12.5, 16.0,
            ],
            sheet: vec![
                0.5, 0.63, 0.75, 0.88, 1.0, 1.25, 1.5, 2.0, 2.5, 2.99, 3.0, 4.0, 5.0, 6.0, 8.0,
                10.0, 12.0, 15.0, 18.0, 20.0, 25.0, 30.0, 35.0, 40.0, 50.0,
            ],
            beams: tokens(&[
                "IPE80", "IPE100", "IPE120", "IPE140", "IPE160", "IPE180", "IPE200", "IPE220",
                "IPE240", "IPE270", "IPE300", "IPE330", "IPE360", "IPE400", "IPE450", "IPE500",
                "IPE550", "IPE600", "HEA100", "HEA120", "HEA140", "HEA160", "HEA180", "HEA200",
                "HEA220", "HEA240", "HEA260", "HEA280", "HEA300", "HEA320", "HEA340", "HEA360",
                "HEA400", "HEA450", "HEA500", "HEA600", "HEA700", "HEB100", "HEB120", "HEB140",
                "HEB160", "HEB180", "HEB200", "HEB220", "HEB240", "HEB260", "HEB280", "HEB300",
                "HEB320", "HEB340", "HEB360", "HEB400", "HEB450", "HEB500", "HEB550", "HEB600",
                "HEB650", "HEB700", "HEB800", "HEB900", "HEB1000",
            ]),
            angles: tokens(&[
                "L20X20X3", "L25X25X3", "L30X30X3", "L30X30X4", "L35X35X4", "L40X40X4",
                "L45X45X5", "L50X50X5", "L60X60X6", "L70X70X7", "L80X80X8", "L90X90X9",
                "L100X100X10", "L120X120X12", "L150X150X15", "L40X20X3", "L50X30X4", "L60X40X5",
                "L80X50X6", "L100X65X8", "L120X80X8", "L150X100X12", "L200X100X12", "L250X90X16",
            ]),
            channels: tokens(&[
                "U50X25X5", "U60X30X5", "U80X45X6", "U100X50X6", "U120X55X7", "U140X60X7",
                "U160X65X7.5", "U180X70X8", "U200X75X8.5", "U220X80X9", "U240X85X9.5",
                "U270X90X10", "U300X100X10.5", "U330X105X11.5", "U360X110X12.5", "U400X115X13.5",
            ]),
            tees: tokens(&[
                "T30X30X4", "T40X40X5", "T50X50X6", "T60X60X7", "T70X70X8", "T80X80X9",
                "T100X100X11", "T120X120X13", "T50X30X5", "T60X40X6", "T70X50X7", "T80X60X8",
            ]),
        }
    }
}

impl StandardSeries {
    pub fn validate(&self) -> Result<()> {
        let numeric = [
            ("round", &self.round),
            ("hex", &self.hex),
            ("flat_widths", &self.flat_widths),
            ("flat_thicknesses", &self.flat_thicknesses),
            ("tube_outer", &self.tube_outer),
            ("tube_wall", &self.tube_wall),
            ("square_tube_side", &self.square_tube_side),
            ("square_tube_wall", &self.square_tube_wall),
            ("sheet", &self.sheet),
        ];
        for (name, values) in numeric {
            if values.iter().any(|v| !v.is_finite() || *v <= 0.0) {
                return Err(Error::Config(format!(
                    "series {} must contain positive finite sizes",
                    name
                )));
            }
            if values.windows(2).any(|w| w[0] >= w[1]) {
                return Err(Error::Config(format!(
                    "series {} must be strictly ascending",
                    name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_reference_data_is_valid() {
        let data = ReferenceData::default();
        assert!(data.validate().is_ok());
        assert_eq!(data.normati.category_width, 3);
        assert_eq!(data.commercial.category_auto_start, 4000);
    }

    #[test]
    fn test_subcategory_map_is_keyed_by_legacy_pair() {
        let map = TaxonomyProfile::normati().subcategory_map();
        assert_eq!(
            map.get(&("VIT".to_string(), "TCEI".to_string())),
            Some(&"0006".to_string())
        );
        assert_eq!(map.get(&("ROS".to_string(), "TCEI".to_string())), None);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"series": {{"hex": [10, 13, 17]}}}}"#).unwrap();

        let data = ReferenceData::from_json_file(file.path()).unwrap();
        assert_eq!(data.series.hex, vec![10.0, 13.0, 17.0]);
        assert_eq!(data.series.round, StandardSeries::default().round);
        assert_eq!(data.normati, TaxonomyProfile::normati());
    }

    #[test]
    fn test_partial_profile_keeps_taxonomy_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"normati": {{"known_categories": {{"VIT": "001", "FOO": "042"}}}}}}"#
        )
        .unwrap();

        let data = ReferenceData::from_json_file(file.path()).unwrap();
        let builtin = TaxonomyProfile::normati();
        assert_eq!(data.normati.known_categories.len(), 2);
        assert_eq!(data.normati.known_categories["FOO"], "042");
        assert_eq!(data.normati.category_width, builtin.category_width);
        assert_eq!(data.normati.category_auto_start, builtin.category_auto_start);
        assert_eq!(data.normati.known_subcategories, builtin.known_subcategories);
        assert_eq!(data.commercial, TaxonomyProfile::commercial());
    }

    #[test]
    fn test_commercial_width_override_keeps_commercial_maps() {
        let data: ReferenceData =
            serde_json::from_str(r#"{"commercial": {"category_auto_start": 5000}}"#).unwrap();
        assert_eq!(data.commercial.category_auto_start, 5000);
        assert_eq!(data.commercial.category_width, 4);
        assert_eq!(data.commercial.known_categories["COMV"], "1000");
        assert_eq!(data.normati, TaxonomyProfile::normati());
    }

    #[test]
    fn test_unsorted_series_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"series": {{"sheet": [3, 2]}}}}"#).unwrap();

        let err = ReferenceData::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_bad_target_width_rejected() {
        let mut profile = TaxonomyProfile::commercial();
        profile
            .known_categories
            .insert("NEW".to_string(), "12".to_string());
        let data = ReferenceData {
            commercial: profile,
            ..ReferenceData::default()
        };
        assert!(matches!(data.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_bad_subcategory_target_rejected() {
        let mut profile = TaxonomyProfile::normati();
        profile.known_subcategories.push(KnownSubcategory::new("FOO", "BAR", "42"));
        let data = ReferenceData {
            normati: profile,
            ..ReferenceData::default()
        };
        assert!(matches!(data.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_auto_start_wider_than_code_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"normati": {{"category_auto_start": 4000}}}}"#).unwrap();

        let err = ReferenceData::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
