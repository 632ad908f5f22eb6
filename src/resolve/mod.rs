//! Query resolution engine
//!
//! The sole entry point of the core: [`StatService::resolve`] takes a request
//! naming an optional state filter and a set of requested sub-resource fields,
//! consults the catalog and the per-kind caches (populating them on first
//! use), and assembles a result graph mirroring the request shape.

use crate::cache::{StateCatalog, SubResourceCache};
use crate::model::{CommuteMethod, CommuteTime, Concentration, State};
use crate::source::StatSource;
use crate::{Result, StatGraphError};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Arguments for one requested sub-resource field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRequest {
    /// Exact-match year filter; absent returns all years.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
}

impl FieldRequest {
    /// Request every year of the field.
    pub fn all() -> Self {
        Self { year: None }
    }

    /// Request a single year of the field.
    pub fn year(year: impl Into<String>) -> Self {
        Self {
            year: Some(year.into()),
        }
    }
}

/// A resolution request: which states, and which fields on each.
///
/// Absent fields are not resolved and not present in the result; a request
/// with no fields returns bare states.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// Case-insensitive prefix filter on state names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commute_times: Option<FieldRequest>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commute_methods: Option<FieldRequest>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concentrations: Option<FieldRequest>,
}

/// One state in the composed result graph, decorated with only the
/// sub-resource fields the request asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateView {
    pub id: String,
    pub key: String,
    pub name: String,
    pub slug: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commute_times: Option<Vec<CommuteTime>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commute_methods: Option<Vec<CommuteMethod>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concentrations: Option<Vec<Concentration>>,
}

impl StateView {
    fn bare(state: State) -> Self {
        Self {
            id: state.id,
            key: state.key,
            name: state.name,
            slug: state.slug,
            commute_times: None,
            commute_methods: None,
            concentrations: None,
        }
    }
}

/// The cache service: owns the adapter, the catalog, and one cache per
/// sub-resource kind.
///
/// All state lives here for the process lifetime; construct one instance and
/// share it (`Arc<StatService>`) across callers. Tests construct a fresh
/// service per case for isolation.
pub struct StatService {
    source: Arc<dyn StatSource>,
    catalog: StateCatalog,
    commute_times: SubResourceCache<CommuteTime>,
    commute_methods: SubResourceCache<CommuteMethod>,
    concentrations: SubResourceCache<Concentration>,
}

impl StatService {
    pub fn new(source: Arc<dyn StatSource>) -> Self {
        Self {
            source,
            catalog: StateCatalog::new(),
            commute_times: SubResourceCache::new("commute_times"),
            commute_methods: SubResourceCache::new("commute_methods"),
            concentrations: SubResourceCache::new("concentrations"),
        }
    }

    /// Resolve a request into its composed result graph.
    ///
    /// Matched states keep catalog order; record sequences keep fetch order
    /// after filtering. Resolving the same request twice against an unchanged
    /// cache yields identical results.
    pub async fn resolve(&self, request: &QueryRequest) -> Result<Vec<StateView>> {
        let states = self.states(request.name.as_deref()).await?;

        debug!(
            matched = states.len(),
            name = request.name.as_deref().unwrap_or(""),
            "Resolving query"
        );

        try_join_all(
            states
                .into_iter()
                .map(|state| self.resolve_state(state, request)),
        )
        .await
    }

    /// Look up states by optional name prefix, loading the catalog on first use.
    pub async fn states(&self, name_filter: Option<&str>) -> Result<Vec<State>> {
        let source = Arc::clone(&self.source);
        self.catalog
            .get_or_load(name_filter, move || async move {
                source.fetch_states().await
            })
            .await
    }

    /// Commute-time records for one state, populating its cache entry on
    /// first use. Errors with `UnknownState` for ids outside the catalog.
    pub async fn commute_times(
        &self,
        geo_id: &str,
        year: Option<&str>,
    ) -> Result<Vec<CommuteTime>> {
        self.ensure_known(geo_id).await?;
        self.commute_times_unchecked(geo_id, year).await
    }

    /// Commute-method records for one state. Errors with `UnknownState` for
    /// ids outside the catalog.
    pub async fn commute_methods(
        &self,
        geo_id: &str,
        year: Option<&str>,
    ) -> Result<Vec<CommuteMethod>> {
        self.ensure_known(geo_id).await?;
        self.commute_methods_unchecked(geo_id, year).await
    }

    /// Degree-concentration records for one state. Errors with
    /// `UnknownState` for ids outside the catalog.
    pub async fn concentrations(
        &self,
        geo_id: &str,
        year: Option<&str>,
    ) -> Result<Vec<Concentration>> {
        self.ensure_known(geo_id).await?;
        self.concentrations_unchecked(geo_id, year).await
    }

    /// Assemble the view for one catalog-derived state. Ids here came from
    /// the catalog, so the unchecked cache paths apply.
    async fn resolve_state(&self, state: State, request: &QueryRequest) -> Result<StateView> {
        let geo_id = state.id.clone();
        let mut view = StateView::bare(state);

        if let Some(field) = &request.commute_times {
            view.commute_times = Some(
                self.commute_times_unchecked(&geo_id, field.year.as_deref())
                    .await?,
            );
        }

        if let Some(field) = &request.commute_methods {
            view.commute_methods = Some(
                self.commute_methods_unchecked(&geo_id, field.year.as_deref())
                    .await?,
            );
        }

        if let Some(field) = &request.concentrations {
            view.concentrations = Some(
                self.concentrations_unchecked(&geo_id, field.year.as_deref())
                    .await?,
            );
        }

        Ok(view)
    }

    async fn commute_times_unchecked(
        &self,
        geo_id: &str,
        year: Option<&str>,
    ) -> Result<Vec<CommuteTime>> {
        let source = Arc::clone(&self.source);
        let id = geo_id.to_string();
        self.commute_times
            .get_or_fetch(geo_id, year, move || async move {
                source.fetch_commute_times(&id).await
            })
            .await
    }

    async fn commute_methods_unchecked(
        &self,
        geo_id: &str,
        year: Option<&str>,
    ) -> Result<Vec<CommuteMethod>> {
        let source = Arc::clone(&self.source);
        let id = geo_id.to_string();
        self.commute_methods
            .get_or_fetch(geo_id, year, move || async move {
                source.fetch_commute_methods(&id).await
            })
            .await
    }

    async fn concentrations_unchecked(
        &self,
        geo_id: &str,
        year: Option<&str>,
    ) -> Result<Vec<Concentration>> {
        let source = Arc::clone(&self.source);
        let id = geo_id.to_string();
        self.concentrations
            .get_or_fetch(geo_id, year, move || async move {
                source.fetch_concentrations(&id).await
            })
            .await
    }

    async fn ensure_known(&self, geo_id: &str) -> Result<()> {
        if !self.catalog.is_loaded().await {
            self.states(None).await?;
        }
        match self.catalog.find(geo_id).await {
            Some(_) => Ok(()),
            None => Err(StatGraphError::UnknownState(geo_id.to_string())),
        }
    }
}
