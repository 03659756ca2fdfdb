//! Section geometry and weight-per-meter synthesis.

use std::f64::consts::PI;

use crate::dimensions::{extract_numbers, is_legacy_ambiguous, Family};
use crate::normalize::normalize_upper;

/// Geometric quantity a weight is derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measure {
    /// Cross-section area in mm² (bars, tubes, profiles).
    AreaMm2(f64),
    /// Thickness in mm (sheets, weighed per m²).
    ThicknessMm(f64),
}

/// Lookup of the geometric measure behind a dimension token.
pub trait SectionGeometry: Send + Sync {
    /// Measure of `token` for `family`, or `None` when unavailable.
    fn measure(&self, family: Family, token: &str) -> Option<Measure>;
}

/// Weight per meter (per m² for sheets) in kg, three-decimal precision left
/// to the caller. `None` when density is unknown or the geometry has no
/// answer; never silently zero.
pub fn weight_per_meter(
    geometry: &dyn SectionGeometry,
    family: Family,
    density_g_cm3: Option<f64>,
    token: &str,
) -> Option<f64> {
    let density = density_g_cm3.filter(|d| *d > 0.0)?;
    match geometry.measure(family, token)? {
        Measure::ThicknessMm(t) if t > 0.0 => Some(t * density),
        Measure::AreaMm2(a) if a > 0.0 => Some(a * density / 1000.0),
        _ => None,
    }
}

/// Closed-form sections for the standard families.
///
/// Beams need per-profile tables and are always unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardGeometry;

impl SectionGeometry for StandardGeometry {
    fn measure(&self, family: Family, token: &str) -> Option<Measure> {
        let token = normalize_upper(token);
        if is_legacy_ambiguous(&token) {
            return None;
        }
        let nums = extract_numbers(&token);
        if nums.is_empty() {
            return None;
        }
        match family {
            Family::Sheet => sheet_thickness(&nums).map(Measure::ThicknessMm),
            Family::Beam => None,
            Family::RoundBar => round_area(&nums).map(Measure::AreaMm2),
            Family::HexBar => hex_area(&nums).map(Measure::AreaMm2),
            Family::FlatBar => flat_area(&nums).map(Measure::AreaMm2),
            Family::Tube => tube_area(&nums).map(Measure::AreaMm2),
            Family::SquareTube => rect_tube_area(&nums).map(Measure::AreaMm2),
            f if f.is_profile() => profile_area(&token, &nums).map(Measure::AreaMm2),
            _ => None,
        }
    }
}

fn positive(values: &[f64]) -> bool {
    values.iter().all(|v| *v > 0.0)
}

/// Last number is the thickness (`SP3`, `1000X2000X3`).
fn sheet_thickness(nums: &[f64]) -> Option<f64> {
    nums.last().copied().filter(|t| *t > 0.0)
}

fn round_area(nums: &[f64]) -> Option<f64> {
    let d = nums[0];
    positive(&[d]).then(|| PI * d * d / 4.0)
}

/// Regular hexagon from the across-flats size.
fn hex_area(nums: &[f64]) -> Option<f64> {
    let s = nums[0];
    positive(&[s]).then(|| (3.0_f64.sqrt() / 2.0) * s * s)
}

fn flat_area(nums: &[f64]) -> Option<f64> {
    let (&b, &s) = (nums.first()?, nums.get(1)?);
    positive(&[b, s]).then(|| b * s)
}

fn tube_area(nums: &[f64]) -> Option<f64> {
    let (&d, &s) = (nums.first()?, nums.get(1)?);
    if !positive(&[d, s]) {
        return None;
    }
    let inner = d - 2.0 * s;
    (inner > 0.0).then(|| (PI / 4.0) * (d * d - inner * inner))
}

fn rect_tube_area(nums: &[f64]) -> Option<f64> {
    let (&b, &h, &s) = (nums.first()?, nums.get(1)?, nums.get(2)?);
    if !positive(&[b, h, s]) {
        return None;
    }
    let (bi, hi) = (b - 2.0 * s, h - 2.0 * s);
    (bi > 0.0 && hi > 0.0).then(|| b * h - bi * hi)
}

/// L, U and T sections, selected by the token's leading letter.
fn profile_area(token: &str, nums: &[f64]) -> Option<f64> {
    let compact: String = token.chars().filter(|c| !c.is_whitespace()).collect();
    match compact.chars().next()? {
        'L' => angle_area(nums),
        'U' => channel_area(nums),
        'T' => tee_area(nums),
        _ => None,
    }
}

/// `L AxBxS`, or `L AxS` for equal legs.
fn angle_area(nums: &[f64]) -> Option<f64> {
    let (a, b, s) = match nums {
        [a, s] => (*a, *a, *s),
        [a, b, s, ..] => (*a, *b, *s),
        _ => return None,
    };
    if !positive(&[a, b, s]) || s >= a || s >= b {
        return None;
    }
    Some(s * (a + b - s))
}

/// `U HxBxS` (single thickness) or `U HxBxTFxTW`.
fn channel_area(nums: &[f64]) -> Option<f64> {
    match nums {
        [h, b, tf, tw, ..] => {
            let (h, b, tf, tw) = (*h, *b, *tf, *tw);
            if !positive(&[h, b, tf, tw]) || 2.0 * tf >= h || tw >= b {
                return None;
            }
            Some(2.0 * b * tf + (h - 2.0 * tf) * tw)
        }
        [h, b, s] => {
            let (h, b, s) = (*h, *b, *s);
            if !positive(&[h, b, s]) || 2.0 * s >= h || s >= b {
                return None;
            }
            Some(s * (h + 2.0 * b - 2.0 * s))
        }
        _ => None,
    }
}

/// `T BxHxS` (single thickness) or `T BxHxTFxTW`.
fn tee_area(nums: &[f64]) -> Option<f64> {
    match nums {
        [b, h, tf, tw, ..] => {
            let (b, h, tf, tw) = (*b, *h, *tf, *tw);
            if !positive(&[b, h, tf, tw]) || tf >= h || tw >= b {
                return None;
            }
            Some(b * tf + (h - tf) * tw)
        }
        [b, h, s] => {
            let (b, h, s) = (*b, *h, *s);
            if !positive(&[b, h, s]) || s >= h || s >= b {
                return None;
            }
            Some(b * s + (h - s) * s)
        }
        _ => None,
    }
}
