//! Per-state sub-resource cache
//!
//! One instance per dataset kind (commute times, commute methods,
//! concentrations). Each state id is populated at most once for the process
//! lifetime; year filtering happens at read time against the stored records.

use crate::model::Yearly;
use crate::Result;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// Cache-aside map from state geography id to the full record set of one
/// sub-resource kind.
///
/// Population is all-or-nothing: the entry is written only after a fully
/// successful fetch, so a failed or cancelled fetch leaves the id absent and
/// a later request repopulates it. The per-key in-flight registry guarantees
/// at most one outbound fetch per id at a time; waiters re-check the cache
/// after acquiring the key lock and find the fetcher's result.
pub struct SubResourceCache<T> {
    label: &'static str,
    entries: RwLock<HashMap<String, Arc<Vec<T>>>>,
    // Bounded by the catalog size (one lock per state id ever requested).
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<T> SubResourceCache<T>
where
    T: Yearly + Clone + Send + Sync,
{
    /// Create an empty cache. `label` names the dataset kind in logs.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            entries: RwLock::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Return the records for `geo_id` filtered by `year`, fetching and
    /// permanently storing the full record set on first use.
    ///
    /// The year filter is exact string equality, applied in stored order; an
    /// absent filter returns every record for the state. Once an id is
    /// cached no fetch ever happens again for it, even for a year the stored
    /// records do not contain (that read returns an empty sequence).
    pub async fn get_or_fetch<F, Fut>(
        &self,
        geo_id: &str,
        year: Option<&str>,
        fetch: F,
    ) -> Result<Vec<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        if let Some(records) = self.cached(geo_id).await {
            debug!(cache = self.label, geo_id = %geo_id, "Cache hit");
            return Ok(filter_by_year(&records, year));
        }

        let key_lock = {
            let mut inflight = self.inflight.lock().await;
            Arc::clone(
                inflight
                    .entry(geo_id.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };

        let _guard = key_lock.lock().await;

        // The fetch may have completed while we waited on the key lock.
        if let Some(records) = self.cached(geo_id).await {
            debug!(cache = self.label, geo_id = %geo_id, "Coalesced with in-flight fetch");
            return Ok(filter_by_year(&records, year));
        }

        let fetched = fetch().await?;
        info!(
            cache = self.label,
            geo_id = %geo_id,
            count = fetched.len(),
            "Populated sub-resource cache"
        );

        let records = Arc::new(fetched);
        self.entries
            .write()
            .await
            .insert(geo_id.to_string(), Arc::clone(&records));

        Ok(filter_by_year(&records, year))
    }

    /// Whether `geo_id` has been populated.
    pub async fn contains(&self, geo_id: &str) -> bool {
        self.entries.read().await.contains_key(geo_id)
    }

    /// Number of populated state ids.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn cached(&self, geo_id: &str) -> Option<Arc<Vec<T>>> {
        self.entries.read().await.get(geo_id).cloned()
    }
}

fn filter_by_year<T: Yearly + Clone>(records: &[T], year: Option<&str>) -> Vec<T> {
    match year {
        Some(year) => records
            .iter()
            .filter(|r| r.year() == year)
            .cloned()
            .collect(),
        None => records.to_vec(),
    }
}
