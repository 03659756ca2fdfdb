//! Legacy dimension range expansion.
//!
//! A legacy semi-finished item carries a single free-text dimension such as
//! `20-45` or `VARIE`. The generators here turn that text into the explicit,
//! ordered list of standard dimension tokens it stands for, one generator per
//! product family, looked up through a [`GeneratorRegistry`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::defaults::{DIMENSION_DECIMALS, FLOAT_TOLERANCE, MISC_MARKER};
use crate::normalize::normalize_upper;
use crate::reference::StandardSeries;

static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:[.,]\d+)?").expect("number pattern is valid"));

static RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\s*-\s*\d+").expect("range pattern is valid"));

// =============================================================================
// TEXT HELPERS
// =============================================================================

/// Every number in `text`, accepting `.` or `,` as decimal separator.
pub fn extract_numbers(text: &str) -> Vec<f64> {
    NUMBER_RE
        .find_iter(text)
        .filter_map(|m| m.as_str().replace(',', ".").parse::<f64>().ok())
        .collect()
}

/// Render a size: integral values without decimals, others with at most
/// three decimals and no trailing zeros.
pub fn format_number(value: f64) -> String {
    if (value - value.round()).abs() < FLOAT_TOLERANCE {
        return format!("{}", value.round() as i64);
    }
    let fixed = format!("{:.*}", DIMENSION_DECIMALS, value);
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Members of `values` inside `[lo, hi]`, tolerant to rounding, in order.
pub fn between(values: &[f64], lo: f64, hi: f64) -> Vec<f64> {
    values
        .iter()
        .copied()
        .filter(|v| v + FLOAT_TOLERANCE >= lo && v - FLOAT_TOLERANCE <= hi)
        .collect()
}

/// Whether a dimension summary is a legacy range descriptor: empty, a
/// `<number> - <number>` span, or the miscellaneous marker.
pub fn is_legacy_ambiguous(text: &str) -> bool {
    let s = normalize_upper(text);
    s.is_empty() || RANGE_RE.is_match(&s) || s.contains(MISC_MARKER)
}

/// Normalize tokens and drop blanks and repeats, keeping first occurrences.
pub fn dedupe_keep_order<I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    values
        .into_iter()
        .map(|v| normalize_upper(&v))
        .filter(|v| !v.is_empty() && seen.insert(v.clone()))
        .collect()
}

fn full_range(series: &[f64]) -> (f64, f64) {
    let lo = series.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (lo, hi)
}

/// Unordered pair `nums[at], nums[at + 1]` as `(min, max)`, or `fallback`
/// when the text does not carry that many numbers.
fn bounds_at(nums: &[f64], at: usize, fallback: (f64, f64)) -> (f64, f64) {
    match (nums.get(at), nums.get(at + 1)) {
        (Some(&a), Some(&b)) => (a.min(b), a.max(b)),
        _ => fallback,
    }
}

// =============================================================================
// FAMILIES
// =============================================================================

/// Product family of a semi-finished item, selected by its type text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Family {
    RoundBar,
    HexBar,
    FlatBar,
    Tube,
    SquareTube,
    Sheet,
    Beam,
    AngleProfile,
    ChannelProfile,
    TeeProfile,
    /// Legacy catch-all profile family predating the L/U/T split.
    GenericProfile,
}

impl Family {
    pub const ALL: [Family; 11] = [
        Family::RoundBar,
        Family::HexBar,
        Family::FlatBar,
        Family::Tube,
        Family::SquareTube,
        Family::Sheet,
        Family::Beam,
        Family::AngleProfile,
        Family::ChannelProfile,
        Family::TeeProfile,
        Family::GenericProfile,
    ];

    /// Stored type description for this family.
    pub fn tag(self) -> &'static str {
        match self {
            Family::RoundBar => "TONDI",
            Family::HexBar => "ESAGONI",
            Family::FlatBar => "PIATTI",
            Family::Tube => "TUBI",
            Family::SquareTube => "TUBOLARI",
            Family::Sheet => "LAMIERE",
            Family::Beam => "TRAVI",
            Family::AngleProfile => "PROFILO L",
            Family::ChannelProfile => "PROFILO U",
            Family::TeeProfile => "PROFILO T",
            Family::GenericProfile => "PROFILATI",
        }
    }

    /// Family for a stored type description, if recognized.
    pub fn from_tag(type_desc: &str) -> Option<Family> {
        let tag = normalize_upper(type_desc);
        Family::ALL.into_iter().find(|f| f.tag() == tag)
    }

    pub fn is_profile(self) -> bool {
        matches!(
            self,
            Family::AngleProfile
                | Family::ChannelProfile
                | Family::TeeProfile
                | Family::GenericProfile
        )
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// =============================================================================
// GENERATORS
// =============================================================================

/// Expansion strategy for one family.
#[derive(Debug, Clone, PartialEq)]
pub enum Generator {
    /// One numeric series filtered by the first two numbers, each value
    /// rendered after `prefix` (`D`, `CH`, `SP`).
    Range { prefix: &'static str, series: Vec<f64> },
    /// Outer diameter × wall, tokens `<outer>X<wall>`.
    Tube { outer: Vec<f64>, wall: Vec<f64> },
    /// Side × wall, tokens `<side>X<side>X<wall>`.
    SquareTube { side: Vec<f64>, wall: Vec<f64> },
    /// Every standard width × range-filtered thickness, tokens
    /// `<width>X<thickness>`.
    Flat {
        widths: Vec<f64>,
        thicknesses: Vec<f64>,
    },
    /// Fixed catalog; the legacy text is ignored.
    Catalog(Vec<String>),
}

impl Generator {
    /// Expand legacy text into dimension tokens, in generation order.
    pub fn generate(&self, legacy: &str) -> Vec<String> {
        let nums = extract_numbers(legacy);
        match self {
            Generator::Range { prefix, series } => {
                let (lo, hi) = bounds_at(&nums, 0, full_range(series));
                between(series, lo, hi)
                    .into_iter()
                    .map(|v| format!("{}{}", prefix, format_number(v)))
                    .collect()
            }
            Generator::Tube { outer, wall } => {
                let (d_lo, d_hi) = bounds_at(&nums, 0, full_range(outer));
                // TODO: confirm with product owners whether a parsed diameter
                // range alone should still sweep every standard wall.
                let (s_lo, s_hi) = bounds_at(&nums, 2, full_range(wall));
                let walls = between(wall, s_lo, s_hi);
                between(outer, d_lo, d_hi)
                    .into_iter()
                    .flat_map(|d| {
                        walls
                            .iter()
                            .filter(move |&&s| 2.0 * s < d)
                            .map(move |&s| format!("{}X{}", format_number(d), format_number(s)))
                    })
                    .collect()
            }
            Generator::SquareTube { side, wall } => {
                let (side_range, wall_range) = if nums.len() >= 6 {
                    // `AxAxS - BxBxS`
                    (
                        (nums[0].min(nums[1]), nums[3].max(nums[4])),
                        (nums[2].min(nums[5]), nums[2].max(nums[5])),
                    )
                } else {
                    (
                        bounds_at(&nums, 0, full_range(side)),
                        bounds_at(&nums, 2, full_range(wall)),
                    )
                };
                let walls = between(wall, wall_range.0, wall_range.1);
                between(side, side_range.0, side_range.1)
                    .into_iter()
                    .flat_map(|a| {
                        walls.iter().filter(move |&&s| 2.0 * s < a).map(move |&s| {
                            let a = format_number(a);
                            format!("{}X{}X{}", a, a, format_number(s))
                        })
                    })
                    .collect()
            }
            Generator::Flat {
                widths,
                thicknesses,
            } => {
                let (lo, hi) = bounds_at(&nums, 0, full_range(thicknesses));
                let selected = between(thicknesses, lo, hi);
                widths
                    .iter()
                    .flat_map(|&b| {
                        selected
                            .iter()
                            .filter(move |&&s| s < b)
                            .map(move |&s| format!("{}X{}", format_number(b), format_number(s)))
                    })
                    .collect()
            }
            Generator::Catalog(tokens) => tokens.clone(),
        }
    }
}

/// Family → generator lookup built from the standard series.
#[derive(Debug, Clone)]
pub struct GeneratorRegistry {
    generators: HashMap<Family, Generator>,
}

impl GeneratorRegistry {
    pub fn from_series(series: &StandardSeries) -> Self {
        let mut generators = HashMap::new();
        generators.insert(
            Family::RoundBar,
            Generator::Range {
                prefix: "D",
                series: series.round.clone(),
            },
        );
        generators.insert(
            Family::HexBar,
            Generator::Range {
                prefix: "CH",
                series: series.hex.clone(),
            },
        );
        generators.insert(
            Family::Sheet,
            Generator::Range {
                prefix: "SP",
                series: series.sheet.clone(),
            },
        );
        generators.insert(
            Family::FlatBar,
            Generator::Flat {
                widths: series.flat_widths.clone(),
                thicknesses: series.flat_thicknesses.clone(),
            },
        );
        generators.insert(
            Family::Tube,
            Generator::Tube {
                outer: series.tube_outer.clone(),
                wall: series.tube_wall.clone(),
            },
        );
        generators.insert(
            Family::SquareTube,
            Generator::SquareTube {
                side: series.square_tube_side.clone(),
                wall: series.square_tube_wall.clone(),
            },
        );
        generators.insert(Family::Beam, Generator::Catalog(series.beams.clone()));
        generators.insert(
            Family::AngleProfile,
            Generator::Catalog(series.angles.clone()),
        );
        generators.insert(
            Family::ChannelProfile,
            Generator::Catalog(series.channels.clone()),
        );
        generators.insert(Family::TeeProfile, Generator::Catalog(series.tees.clone()));
        generators.insert(
            Family::GenericProfile,
            Generator::Catalog(
                series
                    .angles
                    .iter()
                    .chain(&series.channels)
                    .chain(&series.tees)
                    .cloned()
                    .collect(),
            ),
        );
        Self { generators }
    }

    pub fn get(&self, family: Family) -> Option<&Generator> {
        self.generators.get(&family)
    }

    /// Expand `legacy` for `family`, normalized and de-duplicated.
    pub fn expand(&self, family: Family, legacy: &str) -> Vec<String> {
        match self.get(family) {
            Some(generator) => dedupe_keep_order(generator.generate(&normalize_upper(legacy))),
            None => Vec::new(),
        }
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::from_series(&StandardSeries::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> GeneratorRegistry {
        GeneratorRegistry::default()
    }

    #[test]
    fn test_extract_numbers_accepts_both_separators() {
        assert_eq!(extract_numbers("D 21,3 - 42.4"), vec![21.3, 42.4]);
        assert_eq!(extract_numbers("VARIE"), Vec::<f64>::new());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(20.0), "20");
        assert_eq!(format_number(21.3), "21.3");
        assert_eq!(format_number(1.75), "1.75");
        assert_eq!(format_number(0.6300000001), "0.63");
        assert_eq!(format_number(2.0000000001), "2");
    }

    #[test]
    fn test_is_legacy_ambiguous() {
        assert!(is_legacy_ambiguous(""));
        assert!(is_legacy_ambiguous("20 - 45"));
        assert!(is_legacy_ambiguous("d20-45"));
        assert!(is_legacy_ambiguous("misure varie"));
        assert!(!is_legacy_ambiguous("D50"));
        assert!(!is_legacy_ambiguous("80X40X5"));
    }

    #[test]
    fn test_round_bar_range_intersection() {
        let dims = registry().expand(Family::RoundBar, "20-45");
        assert_eq!(
            dims,
            vec![
                "D20", "D22", "D24", "D25", "D26", "D27", "D28", "D30", "D32", "D35", "D36",
                "D40", "D45"
            ]
        );
    }

    #[test]
    fn test_range_bounds_are_unordered() {
        let forward = registry().expand(Family::HexBar, "12 - 19");
        let backward = registry().expand(Family::HexBar, "19 - 12");
        assert_eq!(forward, vec!["CH12", "CH13", "CH14", "CH15", "CH17", "CH19"]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_range_without_numbers_uses_full_series() {
        let dims = registry().expand(Family::Sheet, "VARIE");
        assert_eq!(dims.len(), StandardSeries::default().sheet.len());
        assert_eq!(dims.first().map(String::as_str), Some("SP0.5"));
        assert_eq!(dims.last().map(String::as_str), Some("SP50"));
    }

    #[test]
    fn test_tube_wall_never_reaches_half_diameter() {
        let dims = registry().expand(Family::Tube, "");
        assert!(!dims.is_empty());
        for token in &dims {
            let nums = extract_numbers(token);
            assert!(2.0 * nums[1] < nums[0], "invalid tube {}", token);
        }
    }

    #[test]
    fn test_tube_two_numbers_keep_full_wall_range() {
        let dims = registry().expand(Family::Tube, "12-12");
        // 12 mm tube: every standard wall below 6 mm.
        assert_eq!(
            dims,
            vec![
                "12X1.5", "12X1.75", "12X2", "12X2.5", "12X2.6", "12X2.9", "12X3", "12X3.2",
                "12X3.6", "12X4", "12X4.5", "12X5"
            ]
        );
    }

    #[test]
    fn test_tube_four_numbers_filter_walls() {
        let dims = registry().expand(Family::Tube, "20-22 2-3");
        assert_eq!(
            dims,
            vec![
                "20X2", "20X2.5", "20X2.6", "20X2.9", "20X3", "21.3X2", "21.3X2.5", "21.3X2.6",
                "21.3X2.9", "21.3X3", "22X2", "22X2.5", "22X2.6", "22X2.9", "22X3"
            ]
        );
    }

    #[test]
    fn test_square_tube_paired_section_text() {
        let dims = registry().expand(Family::SquareTube, "20X20X2 - 25X25X3");
        assert_eq!(
            dims,
            vec![
                "20X20X2", "20X20X2.5", "20X20X3", "25X25X2", "25X25X2.5", "25X25X3"
            ]
        );
    }

    #[test]
    fn test_square_tube_validity_filter() {
        let dims = registry().expand(Family::SquareTube, "10-12");
        for token in &dims {
            let nums = extract_numbers(token);
            assert_eq!(nums[0], nums[1]);
            assert!(2.0 * nums[2] < nums[0], "invalid square tube {}", token);
        }
        assert!(dims.contains(&"10X10X4".to_string()));
        assert!(!dims.contains(&"10X10X5".to_string()));
    }

    #[test]
    fn test_flat_bar_crosses_all_widths() {
        let dims = registry().expand(Family::FlatBar, "10-12");
        assert_eq!(&dims[..3], &["12X10", "15X10", "15X12"]);
        assert!(dims.contains(&"600X12".to_string()));
        assert!(!dims.contains(&"10X10".to_string()));
        assert!(!dims.contains(&"12X12".to_string()));
    }

    #[test]
    fn test_catalog_families_ignore_text() {
        let series = StandardSeries::default();
        assert_eq!(registry().expand(Family::Beam, "100-200"), series.beams);
        assert_eq!(registry().expand(Family::ChannelProfile, ""), series.channels);
    }

    #[test]
    fn test_generic_profile_concatenates_catalogs() {
        let series = StandardSeries::default();
        let dims = registry().expand(Family::GenericProfile, "VARIE");
        assert_eq!(
            dims.len(),
            series.angles.len() + series.channels.len() + series.tees.len()
        );
        assert_eq!(dims[0], "L20X20X3");
        assert_eq!(dims.last().map(String::as_str), Some("T80X60X8"));
    }

    #[test]
    fn test_range_outside_series_is_empty() {
        assert!(registry().expand(Family::RoundBar, "1-5").is_empty());
    }

    #[test]
    fn test_family_from_tag() {
        assert_eq!(Family::from_tag(" profilo  l "), Some(Family::AngleProfile));
        assert_eq!(Family::from_tag("TONDI"), Some(Family::RoundBar));
        assert_eq!(Family::from_tag("BARRE"), None);
        for family in Family::ALL {
            assert_eq!(Family::from_tag(family.tag()), Some(family));
        }
    }

    #[test]
    fn test_dedupe_keep_order() {
        let out = dedupe_keep_order(vec![
            "d20".to_string(),
            "D20".to_string(),
            "".to_string(),
            "D10".to_string(),
        ]);
        assert_eq!(out, vec!["D20", "D10"]);
    }
}
