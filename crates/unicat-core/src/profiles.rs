//! Profile shapes for splitting the legacy generic profile family.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::dimensions::Family;
use crate::models::DimensionRow;
use crate::normalize::normalize_upper;

/// A per-shape profile family the generic family splits into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProfileShape {
    Angle,
    Channel,
    Tee,
}

impl ProfileShape {
    pub const ALL: [ProfileShape; 3] = [ProfileShape::Angle, ProfileShape::Channel, ProfileShape::Tee];

    /// Shape of a dimension token, from its leading letter.
    pub fn of_token(token: &str) -> Option<ProfileShape> {
        match normalize_upper(token).chars().next()? {
            'L' => Some(ProfileShape::Angle),
            'U' => Some(ProfileShape::Channel),
            'T' => Some(ProfileShape::Tee),
            _ => None,
        }
    }

    /// Semi type code of the target family.
    pub fn type_code(self) -> &'static str {
        match self {
            ProfileShape::Angle => "PRFL",
            ProfileShape::Channel => "PRFU",
            ProfileShape::Tee => "PRFT",
        }
    }

    pub fn family(self) -> Family {
        match self {
            ProfileShape::Angle => Family::AngleProfile,
            ProfileShape::Channel => Family::ChannelProfile,
            ProfileShape::Tee => Family::TeeProfile,
        }
    }

    /// Semi type description of the target family (its family tag).
    pub fn type_description(self) -> &'static str {
        self.family().tag()
    }

    /// Summary written on items created for this shape.
    pub fn summary(self) -> &'static str {
        match self {
            ProfileShape::Angle => "L - SERIE STD",
            ProfileShape::Channel => "U - SERIE STD",
            ProfileShape::Tee => "T - SERIE STD",
        }
    }
}

impl fmt::Display for ProfileShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_description())
    }
}

/// Dimension rows of one generic profile item, grouped by shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShapeBuckets {
    pub angle: Vec<DimensionRow>,
    pub channel: Vec<DimensionRow>,
    pub tee: Vec<DimensionRow>,
    pub other: Vec<DimensionRow>,
}

impl ShapeBuckets {
    /// Bucket `rows`, keeping their order inside each bucket.
    pub fn split(rows: Vec<DimensionRow>) -> Self {
        let mut buckets = ShapeBuckets::default();
        for row in rows {
            match ProfileShape::of_token(&row.dimension) {
                Some(ProfileShape::Angle) => buckets.angle.push(row),
                Some(ProfileShape::Channel) => buckets.channel.push(row),
                Some(ProfileShape::Tee) => buckets.tee.push(row),
                None => buckets.other.push(row),
            }
        }
        buckets
    }

    pub fn shape(&self, shape: ProfileShape) -> &[DimensionRow] {
        match shape {
            ProfileShape::Angle => &self.angle,
            ProfileShape::Channel => &self.channel,
            ProfileShape::Tee => &self.tee,
        }
    }

    /// Whether any row belongs to a known shape.
    pub fn has_shaped(&self) -> bool {
        !(self.angle.is_empty() && self.channel.is_empty() && self.tee.is_empty())
    }
}
