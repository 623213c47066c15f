//! Age parsing and the age-group bucketizer.
//!
//! One bin configuration is authoritative for the whole workspace:
//!
//! | Label   | Range       |
//! |---------|-------------|
//! | `<=24`  | (0, 24]     |
//! | `25-34` | (24, 34]    |
//! | `35-44` | (34, 44]    |
//! | `45-54` | (44, 54]    |
//! | `55-64` | (54, 64]    |
//! | `65+`   | (64, 200]   |
//!
//! Bins are closed on the right, so a value on a boundary belongs to the lower
//! bucket. Values outside `(0, 200]` have no bucket.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::{CanonicalRecord, is_missing};

/// Exclusive lower bound of the bucketized domain.
pub const AGE_MIN: f64 = 0.0;
/// Inclusive upper bound of the bucketized domain.
pub const AGE_MAX: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "<=24")]
    UpTo24,
    #[serde(rename = "25-34")]
    From25To34,
    #[serde(rename = "35-44")]
    From35To44,
    #[serde(rename = "45-54")]
    From45To54,
    #[serde(rename = "55-64")]
    From55To64,
    #[serde(rename = "65+")]
    From65,
}

impl AgeGroup {
    /// All groups in bucket order.
    pub const ALL: [AgeGroup; 6] = [
        AgeGroup::UpTo24,
        AgeGroup::From25To34,
        AgeGroup::From35To44,
        AgeGroup::From45To54,
        AgeGroup::From55To64,
        AgeGroup::From65,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AgeGroup::UpTo24 => "<=24",
            AgeGroup::From25To34 => "25-34",
            AgeGroup::From35To44 => "35-44",
            AgeGroup::From45To54 => "45-54",
            AgeGroup::From55To64 => "55-64",
            AgeGroup::From65 => "65+",
        }
    }

    /// Inclusive upper edge of the bucket.
    pub fn upper_edge(self) -> f64 {
        match self {
            AgeGroup::UpTo24 => 24.0,
            AgeGroup::From25To34 => 34.0,
            AgeGroup::From35To44 => 44.0,
            AgeGroup::From45To54 => 54.0,
            AgeGroup::From55To64 => 64.0,
            AgeGroup::From65 => AGE_MAX,
        }
    }

    /// Bucket a numeric age.
    pub fn from_age(age: f64) -> Option<AgeGroup> {
        if !(age > AGE_MIN && age <= AGE_MAX) {
            return None;
        }
        AgeGroup::ALL
            .into_iter()
            .find(|group| age <= group.upper_edge())
    }

    /// Read an age-group label supplied by the source data.
    ///
    /// Accepts the canonical labels and the usual spellings found in survey
    /// exports: `25 a 34`, `25–34`, `65 ou mais`, `até 24`, `<= 24`.
    pub fn parse_label(label: &str) -> Option<AgeGroup> {
        let trimmed = label.trim();
        if let Some(group) = AgeGroup::ALL.into_iter().find(|g| g.label() == trimmed) {
            return Some(group);
        }

        let lower = trimmed.to_lowercase();
        let numbers = digit_runs(&lower);
        match numbers.as_slice() {
            [n] if lower.contains('+') || lower.contains("mais") => AgeGroup::from_age(*n),
            [n] if lower.contains('<') || lower.contains("até") || lower.contains("ate") => {
                AgeGroup::from_age(*n)
            }
            [lo, hi] => {
                let group = AgeGroup::from_age(*hi)?;
                (AgeGroup::from_age(lo.max(1.0)) == Some(group)).then_some(group)
            }
            _ => None,
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

fn digit_runs(text: &str) -> Vec<f64> {
    text.split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .filter_map(|run| run.parse::<f64>().ok())
        .collect()
}

/// Lenient number parsing for survey cells.
///
/// Trims, accepts `,` as the decimal separator and rejects missing markers,
/// NaN and infinities. Anything unparseable is `None`.
pub fn parse_number(value: &str) -> Option<f64> {
    if is_missing(value) {
        return None;
    }
    let cleaned = value.trim().replace(',', ".");
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}

/// Fill in `age_group` from `age`.
///
/// When the source already carried an age-group column it is authoritative
/// and nothing is touched.
pub fn assign_age_groups(records: &mut [CanonicalRecord], source_has_age_group: bool) {
    if source_has_age_group {
        return;
    }
    for record in records.iter_mut() {
        record.age_group = record.age.and_then(AgeGroup::from_age);
    }
}
