//! Remote source adapter
//!
//! The adapter contract for the external statistics API plus the DataUSA
//! implementation.
//!
//! # Overview
//!
//! Everything the cache layer knows about the outside world goes through
//! [`StatSource`]. Each fetch method performs exactly one outbound call and
//! maps the upstream's row-oriented payload into the normalized record shapes
//! in [`crate::model`]. The adapter never retries: a failed call surfaces as
//! [`crate::StatGraphError::SourceUnavailable`] and retry policy, if any,
//! belongs to the caller.
//!
//! Wire-level validation happens here. The upstream rows are loosely typed
//! JSON keyed by human-readable column names; a missing or mistyped field is
//! reported as [`crate::StatGraphError::MalformedUpstream`] rather than
//! silently coerced to zero or empty.

pub mod datausa;

pub use datausa::DataUsaSource;

use crate::model::{CommuteMethod, CommuteTime, Concentration, State};
use crate::Result;
use async_trait::async_trait;

/// Contract for the external statistics source.
///
/// Implementations must be cheap to share (`Arc<dyn StatSource>`); the cache
/// layer holds one instance for the process lifetime.
#[async_trait]
pub trait StatSource: Send + Sync {
    /// Fetch the full state catalog.
    async fn fetch_states(&self) -> Result<Vec<State>>;

    /// Fetch all commute-time buckets for one state, across all years.
    async fn fetch_commute_times(&self, geo_id: &str) -> Result<Vec<CommuteTime>>;

    /// Fetch all commute-method rows for one state, across all years.
    async fn fetch_commute_methods(&self, geo_id: &str) -> Result<Vec<CommuteMethod>>;

    /// Fetch all degree-concentration rows for one state, across all years.
    async fn fetch_concentrations(&self, geo_id: &str) -> Result<Vec<Concentration>>;
}
