//! DataUSA API adapter
//!
//! Fetches the state catalog and per-state datasets from the DataUSA
//! statistics API and validates the loosely-typed rows into normalized
//! records.

use crate::model::{CommuteMethod, CommuteTime, Concentration, State};
use crate::source::StatSource;
use crate::{Result, StatGraphError};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Default API endpoint
pub const DEFAULT_BASE_URL: &str = "https://datausa.io";

/// Per-request timeout for the catalog search (large result set)
const CATALOG_TIMEOUT: Duration = Duration::from_secs(30);
/// Per-request timeout for per-state dataset fetches
const DATA_TIMEOUT: Duration = Duration::from_secs(15);

/// Reqwest-based [`StatSource`] for the DataUSA API
pub struct DataUsaSource {
    client: Client,
    base_url: String,
}

impl DataUsaSource {
    /// Create a new adapter against the default DataUSA endpoint.
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a new adapter against a specific endpoint (testing, proxies).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers({
                let mut headers = header::HeaderMap::new();
                headers.insert(
                    header::USER_AGENT,
                    header::HeaderValue::from_static("statgraph/0.3"),
                );
                headers.insert(
                    header::ACCEPT,
                    header::HeaderValue::from_static("application/json"),
                );
                headers
            })
            .build()?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    /// Issue one GET and return the named top-level array from the payload.
    ///
    /// Non-2xx responses surface as `SourceUnavailable`; a payload that is
    /// not JSON or lacks the expected array surfaces as `MalformedUpstream`.
    async fn fetch_rows(&self, url: &str, array_field: &str, timeout: Duration) -> Result<Vec<Value>> {
        debug!(url = %url, "Fetching from DataUSA");

        let response = self.client.get(url).timeout(timeout).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StatGraphError::SourceUnavailable(format!(
                "HTTP {} from {}",
                status, url
            )));
        }

        let payload: Value = response.json().await.map_err(|e| {
            StatGraphError::MalformedUpstream(format!("response body is not JSON: {}", e))
        })?;

        let rows = payload
            .get(array_field)
            .and_then(Value::as_array)
            .ok_or_else(|| {
                StatGraphError::MalformedUpstream(format!(
                    "payload missing '{}' array",
                    array_field
                ))
            })?;

        Ok(rows.to_vec())
    }
}

#[async_trait]
impl StatSource for DataUsaSource {
    async fn fetch_states(&self) -> Result<Vec<State>> {
        let url = format!(
            "{}/api/searchLegacy?dimension=Geography&hierarchy=State&limit=50000",
            self.base_url
        );

        let rows = self.fetch_rows(&url, "results", CATALOG_TIMEOUT).await?;
        let states: Vec<State> = rows.iter().map(parse_state_row).collect::<Result<_>>()?;

        info!(count = states.len(), "Fetched state catalog");
        Ok(states)
    }

    async fn fetch_commute_times(&self, geo_id: &str) -> Result<Vec<CommuteTime>> {
        let url = format!(
            "{}/api/data?measure={}&geo={}&drilldowns={}",
            self.base_url,
            urlencoding::encode("Commuter Population,Commuter Population Moe"),
            urlencoding::encode(geo_id),
            urlencoding::encode("Travel Time"),
        );

        let rows = self.fetch_rows(&url, "data", DATA_TIMEOUT).await?;
        let records: Vec<CommuteTime> = rows
            .iter()
            .map(parse_commute_time_row)
            .collect::<Result<_>>()?;

        info!(geo_id = %geo_id, count = records.len(), "Fetched commute times");
        Ok(records)
    }

    async fn fetch_commute_methods(&self, geo_id: &str) -> Result<Vec<CommuteMethod>> {
        let url = format!(
            "{}/api/data?measure={}&geo={}&drilldowns={}",
            self.base_url,
            urlencoding::encode("Commute Means,Commute Means Moe"),
            urlencoding::encode(geo_id),
            urlencoding::encode("Group"),
        );

        let rows = self.fetch_rows(&url, "data", DATA_TIMEOUT).await?;
        let records: Vec<CommuteMethod> = rows
            .iter()
            .map(parse_commute_method_row)
            .collect::<Result<_>>()?;

        info!(geo_id = %geo_id, count = records.len(), "Fetched commute methods");
        Ok(records)
    }

    async fn fetch_concentrations(&self, geo_id: &str) -> Result<Vec<Concentration>> {
        let url = format!(
            "{}/api/data?Geography={}&measure=Completions&drilldowns=CIP6&parents=true&Degree=5",
            self.base_url,
            urlencoding::encode(geo_id),
        );

        let rows = self.fetch_rows(&url, "data", DATA_TIMEOUT).await?;
        let records: Vec<Concentration> = rows
            .iter()
            .map(parse_concentration_row)
            .collect::<Result<_>>()?;

        info!(geo_id = %geo_id, count = records.len(), "Fetched concentrations");
        Ok(records)
    }
}

// ============================================================================
// Row validation
// ============================================================================

/// Extract a string field, rendering numeric values to their string form.
///
/// The upstream is loosely typed: `Year` in particular arrives as either a
/// string or a number depending on the endpoint.
fn str_field(row: &Value, field: &str) -> Result<String> {
    match row.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(StatGraphError::MalformedUpstream(format!(
            "field '{}' has unusable type: {}",
            field, other
        ))),
        None => Err(StatGraphError::MalformedUpstream(format!(
            "row missing field '{}'",
            field
        ))),
    }
}

/// Extract an integer count, accepting the floats the upstream sometimes emits.
fn count_field(row: &Value, field: &str) -> Result<i64> {
    match row.get(field) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| {
                StatGraphError::MalformedUpstream(format!(
                    "field '{}' is not a usable number: {}",
                    field, n
                ))
            }),
        Some(other) => Err(StatGraphError::MalformedUpstream(format!(
            "field '{}' is not numeric: {}",
            field, other
        ))),
        None => Err(StatGraphError::MalformedUpstream(format!(
            "row missing field '{}'",
            field
        ))),
    }
}

fn parse_state_row(row: &Value) -> Result<State> {
    Ok(State {
        id: str_field(row, "id")?,
        key: str_field(row, "key")?,
        name: str_field(row, "name")?,
        slug: str_field(row, "slug")?,
    })
}

fn parse_commute_time_row(row: &Value) -> Result<CommuteTime> {
    Ok(CommuteTime {
        travel_time: str_field(row, "Travel Time")?,
        number_of_people: count_field(row, "Commuter Population")?,
        state: str_field(row, "Geography")?,
        year: str_field(row, "Year")?,
    })
}

fn parse_commute_method_row(row: &Value) -> Result<CommuteMethod> {
    Ok(CommuteMethod {
        method: str_field(row, "Group")?,
        number_of_commuters: count_field(row, "Commute Means")?,
        state: str_field(row, "Geography")?,
        year: str_field(row, "Year")?,
    })
}

fn parse_concentration_row(row: &Value) -> Result<Concentration> {
    Ok(Concentration {
        area: str_field(row, "CIP4")?,
        major: str_field(row, "CIP6")?,
        degree_type: str_field(row, "Degree")?,
        number_awarded: count_field(row, "Completions")?,
        state: str_field(row, "Geography")?,
        year: str_field(row, "Year")?,
    })
}
