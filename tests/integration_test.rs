//! Integration tests for statgraph
//!
//! These tests drive the full path from catalog load through sub-resource
//! population and query resolution, against a counting mock source.

use async_trait::async_trait;
use statgraph::model::{CommuteMethod, CommuteTime, Concentration, State};
use statgraph::resolve::{FieldRequest, QueryRequest, StatService};
use statgraph::source::StatSource;
use statgraph::stats;
use statgraph::{Result, StatGraphError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Mock source with per-method fetch counters and an optional artificial
/// delay to widen concurrency windows.
struct MockSource {
    state_fetches: AtomicUsize,
    commute_time_fetches: AtomicUsize,
    commute_method_fetches: AtomicUsize,
    concentration_fetches: AtomicUsize,
    delay: Duration,
    fail_commute_times_once: AtomicUsize,
}

impl MockSource {
    fn new() -> Arc<Self> {
        Self::with_delay(Duration::ZERO)
    }

    fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            state_fetches: AtomicUsize::new(0),
            commute_time_fetches: AtomicUsize::new(0),
            commute_method_fetches: AtomicUsize::new(0),
            concentration_fetches: AtomicUsize::new(0),
            delay,
            fail_commute_times_once: AtomicUsize::new(0),
        })
    }

    /// Make the next `n` commute-time fetches fail with `SourceUnavailable`.
    fn fail_commute_times(&self, n: usize) {
        self.fail_commute_times_once.store(n, Ordering::SeqCst);
    }
}

fn state(id: &str, key: &str, name: &str, slug: &str) -> State {
    State {
        id: id.to_string(),
        key: key.to_string(),
        name: name.to_string(),
        slug: slug.to_string(),
    }
}

#[async_trait]
impl StatSource for MockSource {
    async fn fetch_states(&self) -> Result<Vec<State>> {
        self.state_fetches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(vec![
            state("04000US01", "01", "Alabama", "alabama"),
            state("04000US02", "02", "Alaska", "alaska"),
            state("04000US06", "06", "California", "california"),
        ])
    }

    async fn fetch_commute_times(&self, geo_id: &str) -> Result<Vec<CommuteTime>> {
        self.commute_time_fetches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;

        let remaining = self.fail_commute_times_once.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_commute_times_once
                .store(remaining - 1, Ordering::SeqCst);
            return Err(StatGraphError::SourceUnavailable("mock outage".to_string()));
        }

        let record = |travel_time: &str, people: i64, year: &str| CommuteTime {
            travel_time: travel_time.to_string(),
            number_of_people: people,
            state: geo_id.to_string(),
            year: year.to_string(),
        };

        Ok(vec![
            record("Less than 10 minutes", 120, "2019"),
            record("20-29", 300, "2019"),
            record("20-29", 280, "2018"),
        ])
    }

    async fn fetch_commute_methods(&self, geo_id: &str) -> Result<Vec<CommuteMethod>> {
        self.commute_method_fetches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;

        let record = |method: &str, count: i64, year: &str| CommuteMethod {
            method: method.to_string(),
            number_of_commuters: count,
            state: geo_id.to_string(),
            year: year.to_string(),
        };

        Ok(vec![
            record("Drove Alone", 900, "2019"),
            record("Carpooled", 150, "2019"),
        ])
    }

    async fn fetch_concentrations(&self, geo_id: &str) -> Result<Vec<Concentration>> {
        self.concentration_fetches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;

        let record = |area: &str, major: &str, awarded: i64, year: &str| Concentration {
            area: area.to_string(),
            major: major.to_string(),
            degree_type: "Bachelors Degree".to_string(),
            number_awarded: awarded,
            state: geo_id.to_string(),
            year: year.to_string(),
        };

        // Two raw rows sharing (area, year) to exercise aggregation.
        Ok(vec![
            record("14", "1402", 50, "2019"),
            record("14", "1408", 30, "2019"),
            record("26", "2601", 12, "2019"),
        ])
    }
}

fn service(source: &Arc<MockSource>) -> StatService {
    StatService::new(Arc::clone(source) as Arc<dyn StatSource>)
}

mod catalog_tests {
    use super::*;

    #[tokio::test]
    async fn test_name_prefix_filtering() {
        let source = MockSource::new();
        let service = service(&source);

        // "al" matches both Alabama and Alaska, case-insensitively.
        let states = service.states(Some("al")).await.unwrap();
        assert_eq!(states.len(), 2);
        assert_eq!(states[0].name, "Alabama");
        assert_eq!(states[1].name, "Alaska");

        // "alas" narrows to Alaska only.
        let states = service.states(Some("alas")).await.unwrap();
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].name, "Alaska");

        // Absent filter returns everything in catalog order.
        let states = service.states(None).await.unwrap();
        assert_eq!(states.len(), 3);
        assert_eq!(states[2].name, "California");

        // All of the above hit the source exactly once.
        assert_eq!(source.state_fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_catalog_loads_coalesce() {
        let source = MockSource::with_delay(Duration::from_millis(50));
        let service = Arc::new(service(&source));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(
                async move { service.states(None).await.unwrap() },
            ));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().len(), 3);
        }

        assert_eq!(source.state_fetches.load(Ordering::SeqCst), 1);
    }
}

mod cache_tests {
    use super::*;

    #[tokio::test]
    async fn test_one_fetch_per_state_across_years() {
        let source = MockSource::new();
        let service = service(&source);

        let all = service.commute_times("04000US01", None).await.unwrap();
        assert_eq!(all.len(), 3);

        let y2019 = service
            .commute_times("04000US01", Some("2019"))
            .await
            .unwrap();
        assert_eq!(y2019.len(), 2);
        assert_eq!(y2019[0].travel_time, "Less than 10 minutes");
        assert_eq!(y2019[1].travel_time, "20-29");

        let y2018 = service
            .commute_times("04000US01", Some("2018"))
            .await
            .unwrap();
        assert_eq!(y2018.len(), 1);

        // A year with no cached records is an empty result, not an error,
        // and not a refetch.
        let y2020 = service
            .commute_times("04000US01", Some("2020"))
            .await
            .unwrap();
        assert!(y2020.is_empty());

        assert_eq!(source.commute_time_fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_requests_single_fetch() {
        let source = MockSource::with_delay(Duration::from_millis(50));
        let service = Arc::new(service(&source));

        // Load the catalog first so only the sub-resource fetch is measured.
        service.states(None).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..10 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                service.commute_times("04000US02", Some("2019")).await
            }));
        }

        for handle in handles {
            let records = handle.await.unwrap().unwrap();
            assert_eq!(records.len(), 2);
        }

        assert_eq!(source.commute_time_fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_population_does_not_poison() {
        let source = MockSource::new();
        let service = service(&source);
        source.fail_commute_times(1);

        let err = service
            .commute_times("04000US01", None)
            .await
            .unwrap_err();
        assert!(matches!(err, StatGraphError::SourceUnavailable(_)));

        // Other states' caches populate independently despite the failure.
        let ok = service.commute_times("04000US02", None).await.unwrap();
        assert_eq!(ok.len(), 3);

        // The failed entry stayed absent, so the next request retries it.
        let retried = service.commute_times("04000US01", None).await.unwrap();
        assert_eq!(retried.len(), 3);
        assert_eq!(source.commute_time_fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_caches_are_independent_per_kind() {
        let source = MockSource::new();
        let service = service(&source);

        service.commute_times("04000US01", None).await.unwrap();
        service.commute_methods("04000US01", None).await.unwrap();
        service.concentrations("04000US01", None).await.unwrap();

        assert_eq!(source.commute_time_fetches.load(Ordering::SeqCst), 1);
        assert_eq!(source.commute_method_fetches.load(Ordering::SeqCst), 1);
        assert_eq!(source.concentration_fetches.load(Ordering::SeqCst), 1);
    }
}

mod resolve_tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_composes_request_shape() {
        let source = MockSource::new();
        let service = service(&source);

        let request = QueryRequest {
            name: Some("alab".to_string()),
            commute_times: Some(FieldRequest::year("2019")),
            commute_methods: Some(FieldRequest::all()),
            ..Default::default()
        };

        let views = service.resolve(&request).await.unwrap();
        assert_eq!(views.len(), 1);

        let view = &views[0];
        assert_eq!(view.id, "04000US01");
        assert_eq!(view.commute_times.as_ref().unwrap().len(), 2);
        assert_eq!(view.commute_methods.as_ref().unwrap().len(), 2);
        assert!(view.concentrations.is_none());
    }

    #[tokio::test]
    async fn test_resolve_idempotent() {
        let source = MockSource::new();
        let service = service(&source);

        let request = QueryRequest {
            commute_times: Some(FieldRequest::all()),
            concentrations: Some(FieldRequest::year("2019")),
            ..Default::default()
        };

        let first = service.resolve(&request).await.unwrap();
        let second = service.resolve(&request).await.unwrap();
        assert_eq!(first, second);

        // One catalog fetch, one fetch per (state, kind).
        assert_eq!(source.state_fetches.load(Ordering::SeqCst), 1);
        assert_eq!(source.commute_time_fetches.load(Ordering::SeqCst), 3);
        assert_eq!(source.concentration_fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_no_fields_returns_bare_states() {
        let source = MockSource::new();
        let service = service(&source);

        let views = service.resolve(&QueryRequest::default()).await.unwrap();
        assert_eq!(views.len(), 3);
        assert!(views.iter().all(|v| v.commute_times.is_none()
            && v.commute_methods.is_none()
            && v.concentrations.is_none()));

        // No sub-resource fetches happened.
        assert_eq!(source.commute_time_fetches.load(Ordering::SeqCst), 0);
        assert_eq!(source.commute_method_fetches.load(Ordering::SeqCst), 0);
        assert_eq!(source.concentration_fetches.load(Ordering::SeqCst), 0);
    }
}

mod aggregation_tests {
    use super::*;

    #[tokio::test]
    async fn test_degrees_by_area_over_resolved_records() {
        let source = MockSource::new();
        let service = service(&source);

        let records = service.concentrations("04000US01", None).await.unwrap();
        let totals = stats::degrees_by_area(&records);

        // The two area-14 rows for 2019 collapse into one 80-degree total.
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].area, "14");
        assert_eq!(totals[0].year, "2019");
        assert_eq!(totals[0].number_awarded, 80);
        assert_eq!(totals[1].area, "26");
        assert_eq!(totals[1].number_awarded, 12);
    }

    #[tokio::test]
    async fn test_commute_summary_over_resolved_records() {
        let source = MockSource::new();
        let service = service(&source);

        let times = service
            .commute_times("04000US01", Some("2019"))
            .await
            .unwrap();
        let methods = service.commute_methods("04000US01", None).await.unwrap();

        // Buckets interpret as 10.0 and 24.5 minutes; summary is their midpoint.
        assert_eq!(stats::travel_minutes(&times[0].travel_time), Some(10.0));
        assert_eq!(stats::travel_minutes(&times[1].travel_time), Some(24.5));
        assert_eq!(stats::average_travel_time(&times), Some(17.25));

        assert_eq!(stats::total_commuters(&times), 420);

        let (method, count) = stats::popular_method(&methods).unwrap();
        assert_eq!(method, "Drove Alone");
        assert_eq!(count, 900);
    }
}
