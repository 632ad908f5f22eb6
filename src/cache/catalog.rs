//! State catalog
//!
//! Holds the full set of top-level states, loaded lazily from the remote
//! source at most once per process.

use crate::model::State;
use crate::Result;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

/// Lazily-loaded, permanently-cached state catalog.
///
/// "Not yet loaded" is distinct from "loaded but empty": until the first
/// successful fetch, `states` is `None` and every read goes through the load
/// path. The load lock guarantees at most one fetch is in flight; late
/// arrivals re-check the stored catalog after acquiring it.
pub struct StateCatalog {
    states: RwLock<Option<Arc<Vec<State>>>>,
    load_lock: Mutex<()>,
}

impl StateCatalog {
    pub fn new() -> Self {
        Self {
            states: RwLock::new(None),
            load_lock: Mutex::new(()),
        }
    }

    /// Return the states matching `name_filter`, loading the catalog on
    /// first use via `fetch`.
    ///
    /// Filtering is a case-insensitive prefix match on the state name, in
    /// original catalog order; an absent or empty filter returns everything.
    /// A failed load leaves the catalog absent so a later call may retry.
    pub async fn get_or_load<F, Fut>(
        &self,
        name_filter: Option<&str>,
        fetch: F,
    ) -> Result<Vec<State>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<State>>>,
    {
        if let Some(states) = self.loaded().await {
            return Ok(filter_by_prefix(&states, name_filter));
        }

        let _guard = self.load_lock.lock().await;

        // Another caller may have completed the load while we waited.
        if let Some(states) = self.loaded().await {
            return Ok(filter_by_prefix(&states, name_filter));
        }

        let fetched = fetch().await?;
        info!(count = fetched.len(), "State catalog loaded");

        let states = Arc::new(fetched);
        *self.states.write().await = Some(Arc::clone(&states));

        Ok(filter_by_prefix(&states, name_filter))
    }

    /// Look up one state by geography id. Returns `None` both for unknown
    /// ids and for a catalog that has not been loaded yet.
    pub async fn find(&self, geo_id: &str) -> Option<State> {
        let states = self.loaded().await?;
        states.iter().find(|s| s.id == geo_id).cloned()
    }

    /// Whether the catalog has been loaded (even if empty).
    pub async fn is_loaded(&self) -> bool {
        self.states.read().await.is_some()
    }

    async fn loaded(&self) -> Option<Arc<Vec<State>>> {
        self.states.read().await.clone()
    }
}

impl Default for StateCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn filter_by_prefix(states: &[State], name_filter: Option<&str>) -> Vec<State> {
    match name_filter {
        Some(prefix) if !prefix.is_empty() => {
            let prefix = prefix.to_lowercase();
            states
                .iter()
                .filter(|s| s.name.to_lowercase().starts_with(&prefix))
                .cloned()
                .collect()
        }
        _ => states.to_vec(),
    }
}
