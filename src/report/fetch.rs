use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::Result;
use crate::report::cache::TtlCache;
use crate::report::query::{build_request, SearchRequest};
use crate::report::ReportTable;
use crate::store::LedgerStore;

/// Default lifetime of a cached report.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);

/// Cache key: the term exactly as supplied, case and whitespace included.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    term: String,
    lookback_years: u32,
}

impl From<&SearchRequest> for CacheKey {
    fn from(request: &SearchRequest) -> Self {
        Self {
            term: request.term().to_string(),
            lookback_years: request.lookback_years(),
        }
    }
}

/// Runs report queries against a store behind a time-bounded cache.
pub struct ReportFetcher<S> {
    store: S,
    clock: Arc<dyn Clock>,
    cache: TtlCache<CacheKey, Arc<ReportTable>>,
}

impl<S: LedgerStore> ReportFetcher<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            store,
            cache: TtlCache::new(ttl, clock.clone()),
            clock,
        }
    }

    /// Fetch a report, distinguishing failures from empty results.
    ///
    /// Only successful loads are cached, empty ones included.
    pub async fn try_fetch(&self, request: &SearchRequest) -> Result<Arc<ReportTable>> {
        let key = CacheKey::from(request);
        if let Some(table) = self.cache.get(&key) {
            debug!(term = request.term(), years = request.lookback_years(), "report cache hit");
            return Ok(table);
        }
        debug!(term = request.term(), years = request.lookback_years(), "report cache miss");

        let query = build_request(request, self.clock.today())?;
        let rows = self.store.load(&query).await?;
        let table = Arc::new(ReportTable::new(rows));

        info!(
            term = request.term(),
            years = request.lookback_years(),
            rows = table.len(),
            ttl_secs = self.cache.ttl().as_secs(),
            "report fetched"
        );
        self.cache.insert(key, table.clone());
        Ok(table)
    }

    /// Fetch a report, collapsing any connection or query failure into an
    /// empty table. The cause is logged; callers see "no results".
    pub async fn fetch(&self, request: &SearchRequest) -> Arc<ReportTable> {
        match self.try_fetch(request).await {
            Ok(table) => table,
            Err(e) => {
                warn!(
                    error = %e,
                    term = request.term(),
                    years = request.lookback_years(),
                    "report fetch failed, returning an empty table"
                );
                Arc::new(ReportTable::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::ReportError;
    use crate::report::{BuiltQuery, ReportRow};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeStore {
        calls: AtomicUsize,
        fail: AtomicBool,
        seen: Mutex<Vec<BuiltQuery>>,
        rows: Vec<ReportRow>,
    }

    #[async_trait]
    impl LedgerStore for Arc<FakeStore> {
        async fn load(&self, query: &BuiltQuery) -> Result<Vec<ReportRow>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().push(query.clone());
            if self.fail.load(Ordering::SeqCst) {
                return Err(ReportError::ConnectTimeout(Duration::from_secs(5)));
            }
            Ok(self.rows.clone())
        }
    }

    fn row(total: f64, doc: &str) -> ReportRow {
        ReportRow {
            date: NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
            product_name: "Widget A".to_string(),
            customer_name: Some("Acme".to_string()),
            quantity: 1.0,
            unit_price: total,
            line_total: total,
            document_number: doc.to_string(),
            warehouse_name: None,
            invoice_link: None,
        }
    }

    fn setup(
        rows: Vec<ReportRow>,
    ) -> (Arc<FakeStore>, Arc<ManualClock>, ReportFetcher<Arc<FakeStore>>) {
        let store = Arc::new(FakeStore {
            rows,
            ..Default::default()
        });
        let clock = Arc::new(ManualClock::new(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()));
        let fetcher = ReportFetcher::new(store.clone(), clock.clone(), DEFAULT_CACHE_TTL);
        (store, clock, fetcher)
    }

    #[tokio::test]
    async fn repeated_request_within_ttl_hits_store_once() {
        let (store, clock, fetcher) = setup(vec![row(100.0, "1")]);
        let req = SearchRequest::new("Widget A", 5).unwrap();

        let first = fetcher.fetch(&req).await;
        clock.advance(Duration::from_secs(599));
        let second = fetcher.fetch(&req).await;

        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
        assert_eq!(second.len(), 1);
    }

    #[tokio::test]
    async fn expired_entry_triggers_a_second_round_trip() {
        let (store, clock, fetcher) = setup(vec![row(100.0, "1")]);
        let req = SearchRequest::new("Widget A", 5).unwrap();

        fetcher.fetch(&req).await;
        clock.advance(Duration::from_secs(600));
        fetcher.fetch(&req).await;

        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn key_is_case_sensitive_and_includes_years() {
        let (store, _, fetcher) = setup(vec![]);
        fetcher.fetch(&SearchRequest::new("widget", 5).unwrap()).await;
        fetcher.fetch(&SearchRequest::new("Widget", 5).unwrap()).await;
        fetcher.fetch(&SearchRequest::new("Widget", 6).unwrap()).await;
        fetcher.fetch(&SearchRequest::new("Widget", 6).unwrap()).await;
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn empty_results_are_cached() {
        let (store, _, fetcher) = setup(vec![]);
        let req = SearchRequest::new("nothing", 1).unwrap();
        assert!(fetcher.fetch(&req).await.is_empty());
        assert!(fetcher.fetch(&req).await.is_empty());
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failures_become_empty_and_are_not_cached() {
        let (store, _, fetcher) = setup(vec![row(10.0, "1")]);
        store.fail.store(true, Ordering::SeqCst);
        let req = SearchRequest::new("Widget", 2).unwrap();

        assert!(fetcher.fetch(&req).await.is_empty());
        assert!(matches!(
            fetcher.try_fetch(&req).await,
            Err(ReportError::ConnectTimeout(_))
        ));

        store.fail.store(false, Ordering::SeqCst);
        assert_eq!(fetcher.fetch(&req).await.len(), 1);
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn query_uses_clock_today_for_the_window() {
        let (store, _, fetcher) = setup(vec![]);
        fetcher.fetch(&SearchRequest::new("Widget A", 5).unwrap()).await;
        let seen = store.seen.lock();
        assert_eq!(seen[0].min_date(), NaiveDate::from_ymd_opt(2021, 10, 20));
        assert_eq!(seen[0].pattern(), Some("%Widget A%"));
    }

    #[tokio::test]
    async fn rows_keep_store_order() {
        let rows = vec![row(3.0, "3"), row(1.0, "1"), row(2.0, "2")];
        let (_, _, fetcher) = setup(rows.clone());
        let table = fetcher.fetch(&SearchRequest::new("", 1).unwrap()).await;
        assert_eq!(table.rows(), rows.as_slice());
    }

    #[tokio::test]
    async fn concurrent_identical_requests_all_succeed() {
        let (_, _, fetcher) = setup(vec![row(5.0, "9")]);
        let fetcher = Arc::new(fetcher);
        let req = SearchRequest::new("Widget", 5).unwrap();

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let fetcher = fetcher.clone();
                let req = req.clone();
                tokio::spawn(async move { fetcher.fetch(&req).await })
            })
            .collect();
        for task in tasks {
            let table = task.await.unwrap();
            assert_eq!(table.len(), 1);
            assert_eq!(table.rows()[0].document_number, "9");
        }
    }
}
