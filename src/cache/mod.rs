//! In-memory cache layer
//!
//! Process-wide caches with "populate on first demand, live forever" lifecycle:
//! the state catalog loads at most once, and each sub-resource cache populates
//! at most once per state id. Both enforce a single-flight discipline so
//! concurrent first-time requests for the same key share one outbound fetch.
//!
//! The caches are plain service-owned objects rather than module-level
//! globals, so tests get a fresh instance each.

mod catalog;
mod subresource;

pub use catalog::StateCatalog;
pub use subresource::SubResourceCache;
