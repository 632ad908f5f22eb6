//! Core record types
//!
//! Normalized shapes for the state catalog and the three per-state datasets.
//! All records are immutable once fetched: the catalog is loaded once per
//! process and sub-resource rows are cached permanently per state.

use serde::{Deserialize, Serialize};

/// A top-level catalog entry for one US state.
///
/// `id` is the stable geography identifier (e.g. `04000US01`) used for
/// sub-resource lookups; `key` is the upstream's alternate numeric key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub id: String,
    pub key: String,
    pub name: String,
    pub slug: String,
}

/// One commute-time bucket for a state and year.
///
/// `travel_time` is a human-readable bucket label straight from the upstream:
/// either a numeric range like `"20-29"` or free text with an embedded bound
/// like `"Less than 10 minutes"`. See [`crate::stats::travel_minutes`] for
/// numeric interpretation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommuteTime {
    pub travel_time: String,
    pub number_of_people: i64,
    pub state: String,
    pub year: String,
}

/// Commuter counts for one commute method, state, and year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommuteMethod {
    pub method: String,
    pub number_of_commuters: i64,
    pub state: String,
    pub year: String,
}

/// Degrees awarded in one concentration for a state and year.
///
/// `area` is the broad concentration code, `major` the specific program,
/// `degree_type` the upstream degree level. Multiple raw rows may share an
/// `(area, year)` pair; consumers aggregate with
/// [`crate::stats::degrees_by_area`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concentration {
    pub area: String,
    pub major: String,
    pub degree_type: String,
    pub number_awarded: i64,
    pub state: String,
    pub year: String,
}

/// Records that belong to a single year.
///
/// The sub-resource caches filter on this at read time; population is always
/// per state across all years.
pub trait Yearly {
    fn year(&self) -> &str;
}

impl Yearly for CommuteTime {
    fn year(&self) -> &str {
        &self.year
    }
}

impl Yearly for CommuteMethod {
    fn year(&self) -> &str {
        &self.year
    }
}

impl Yearly for Concentration {
    fn year(&self) -> &str {
        &self.year
    }
}
