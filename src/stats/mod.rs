//! Derived aggregations
//!
//! Pure reductions over resolved record sequences. These sit on the consumer
//! side of the cache: they never fetch, they only summarize what
//! [`crate::resolve::StatService`] returned.

use crate::model::{CommuteMethod, CommuteTime, Concentration};
use std::collections::HashMap;

/// Degrees awarded in one concentration area for one year, summed across the
/// raw rows that share the `(area, year)` pair.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DegreeTotal {
    pub area: String,
    pub year: String,
    pub number_awarded: i64,
}

/// Interpret a travel-time bucket label as minutes.
///
/// Range labels like `"20-29"` yield the midpoint (`24.5`); free-text labels
/// with an embedded bound like `"Less than 10 minutes"` yield that number;
/// labels with no digits yield `None`.
pub fn travel_minutes(travel_time: &str) -> Option<f64> {
    if let Some((low, high)) = travel_time.split_once('-') {
        if let (Ok(low), Ok(high)) = (low.trim().parse::<f64>(), high.trim().parse::<f64>()) {
            return Some((low + high) / 2.0);
        }
    }

    let digits: String = travel_time
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<f64>().ok()
}

/// Headline travel time for a state: the midpoint between the smallest and
/// largest interpretable bucket. `None` when no bucket is interpretable.
pub fn average_travel_time(records: &[CommuteTime]) -> Option<f64> {
    let minutes: Vec<f64> = records
        .iter()
        .filter_map(|r| travel_minutes(&r.travel_time))
        .collect();

    let min = minutes.iter().copied().reduce(f64::min)?;
    let max = minutes.iter().copied().reduce(f64::max)?;
    Some((min + max) / 2.0)
}

/// Total commuter population across all buckets.
pub fn total_commuters(records: &[CommuteTime]) -> i64 {
    records.iter().map(|r| r.number_of_people).sum()
}

/// The commute method with the largest summed commuter count.
pub fn popular_method(records: &[CommuteMethod]) -> Option<(String, i64)> {
    let mut counts: HashMap<&str, i64> = HashMap::new();
    for record in records {
        *counts.entry(record.method.as_str()).or_insert(0) += record.number_of_commuters;
    }

    counts
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(method, count)| (method.to_string(), count))
}

/// Group concentrations by `(area, year)`, summing `number_awarded`.
///
/// Duplicate pairs across raw rows collapse into a single total; groups keep
/// first-seen order.
pub fn degrees_by_area(records: &[Concentration]) -> Vec<DegreeTotal> {
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut totals: Vec<DegreeTotal> = Vec::new();

    for record in records {
        let key = (record.area.clone(), record.year.clone());
        match index.get(&key) {
            Some(&i) => totals[i].number_awarded += record.number_awarded,
            None => {
                index.insert(key, totals.len());
                totals.push(DegreeTotal {
                    area: record.area.clone(),
                    year: record.year.clone(),
                    number_awarded: record.number_awarded,
                });
            }
        }
    }

    totals
}
