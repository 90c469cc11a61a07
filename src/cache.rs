//! Resource and query caches over the table store.
//!
//! [`ResourceCache`] owns the single long-lived connection handle
//! (construct-once, even under racing first use). [`QueryCache`] memoizes
//! normalized tables per name for a caller-chosen TTL, collapsing
//! concurrent refetches of the same expired key into one store call.
//! Neither has a teardown: both are process-lifetime objects.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::model::types::Table;
use crate::store::{StoreError, SupabaseSource, TableSource};

/// Shared trait object over the connected store.
pub type SharedSource = Arc<dyn TableSource>;

type Connector = Box<dyn Fn() -> Result<SharedSource, StoreError> + Send + Sync>;

// ---------------------------------------------------------------------------
// ResourceCache
// ---------------------------------------------------------------------------

/// One long-lived handle to the connected store, built on first use.
///
/// Concurrent first callers race safely: exactly one connector run wins and
/// its handle is reused for the process lifetime. A failed connect stores
/// nothing, so a later call may retry.
pub struct ResourceCache {
    handle: OnceCell<SharedSource>,
    connect: Connector,
}

impl ResourceCache {
    /// Cache whatever `connect` produces on first use.
    pub fn new(
        connect: impl Fn() -> Result<SharedSource, StoreError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handle: OnceCell::new(),
            connect: Box::new(connect),
        }
    }

    /// The production setup: a [`SupabaseSource`] configured from the
    /// environment. Credentials are read when the handle is first needed.
    pub fn supabase() -> Self {
        Self::new(|| {
            let source = SupabaseSource::from_env()?;
            Ok(Arc::new(source) as SharedSource)
        })
    }

    /// The connected handle, connecting on first call.
    pub fn handle(&self) -> Result<&SharedSource, StoreError> {
        self.handle.get_or_try_init(|| (self.connect)())
    }
}

// ---------------------------------------------------------------------------
// Cache statistics
// ---------------------------------------------------------------------------

/// Counters for cache behavior, readable without locking the cache.
#[derive(Debug, Default)]
pub struct CacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub refreshes: AtomicU64,
}

impl CacheStats {
    /// Current (hits, misses, refreshes).
    pub fn get(&self) -> (u64, u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
            self.refreshes.load(Ordering::Relaxed),
        )
    }

    /// Hit rate in `0.0..=1.0`; zero before any traffic.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;
        if lookups == 0 {
            0.0
        } else {
            hits as f64 / lookups as f64
        }
    }
}

// ---------------------------------------------------------------------------
// QueryCache
// ---------------------------------------------------------------------------

struct CacheEntry {
    table: Arc<Table>,
    fetched_at: Instant,
}

/// TTL-keyed memo of normalized tables, one live entry per table name.
///
/// A fetch either returns a live entry or refetches through the
/// [`ResourceCache`] handle and atomically supersedes the entry. Fetch
/// failures propagate; the expired entry is neither served nor clobbered.
pub struct QueryCache {
    resources: ResourceCache,
    entries: Mutex<HashMap<String, CacheEntry>>,
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    stats: CacheStats,
}

impl QueryCache {
    /// Cache over an already-built resource layer.
    pub fn new(resources: ResourceCache) -> Self {
        Self {
            resources,
            entries: Mutex::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
            stats: CacheStats::default(),
        }
    }

    /// The production setup over [`ResourceCache::supabase`].
    pub fn supabase() -> Self {
        Self::new(ResourceCache::supabase())
    }

    /// The table named `table`, refetched when the cached copy is older
    /// than `ttl`. TTL is per call: two tables (or two callers) may use
    /// different windows without interfering.
    pub fn fetch(&self, table: &str, ttl: Duration) -> Result<Arc<Table>, StoreError> {
        if let Some(live) = self.live_entry(table, ttl) {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            debug!(%table, "cache hit");
            return Ok(live);
        }

        // Collapse concurrent refetches of the same key to one store call;
        // whoever wins the gate fetches, the rest re-check and hit.
        let gate = self.gate(table);
        let _inflight = gate.lock();
        if let Some(live) = self.live_entry(table, ttl) {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            debug!(%table, "cache hit after waiting on in-flight fetch");
            return Ok(live);
        }

        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        debug!(%table, ttl_ms = ttl.as_millis() as u64, "cache miss, fetching");

        let fetched = match self.resources.handle().and_then(|h| h.get(table)) {
            Ok(fetched) => fetched,
            Err(err) => {
                warn!(%table, error = %err, "store fetch failed");
                return Err(err);
            }
        };

        let shared = Arc::new(fetched);
        self.entries.lock().insert(
            table.to_string(),
            CacheEntry {
                table: Arc::clone(&shared),
                fetched_at: Instant::now(),
            },
        );
        self.stats.refreshes.fetch_add(1, Ordering::Relaxed);
        Ok(shared)
    }

    /// Drop the entry for `table`, forcing the next fetch to the store.
    pub fn invalidate(&self, table: &str) {
        self.entries.lock().remove(table);
    }

    /// Drop every entry.
    pub fn invalidate_all(&self) {
        self.entries.lock().clear();
    }

    /// Behavior counters.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    fn live_entry(&self, table: &str, ttl: Duration) -> Option<Arc<Table>> {
        let entries = self.entries.lock();
        entries
            .get(table)
            .filter(|entry| entry.fetched_at.elapsed() < ttl)
            .map(|entry| Arc::clone(&entry.table))
    }

    fn gate(&self, table: &str) -> Arc<Mutex<()>> {
        let mut inflight = self.inflight.lock();
        Arc::clone(inflight.entry(table.to_string()).or_default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    /// Counting fake source; optionally fails after the first call or
    /// stalls to widen race windows.
    struct FakeSource {
        calls: AtomicUsize,
        fail_after: Option<usize>,
        delay: Duration,
    }

    impl FakeSource {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_after: None,
                delay: Duration::ZERO,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl TableSource for FakeSource {
        fn get(&self, table: &str) -> Result<Table, StoreError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(limit) = self.fail_after
                && call >= limit
            {
                return Err(StoreError::Status {
                    table: table.to_string(),
                    status: 503,
                });
            }
            std::thread::sleep(self.delay);
            Ok(Table::from_response(json!([{"table": table, "call": call}])))
        }
    }

    fn cache_over(source: Arc<FakeSource>) -> QueryCache {
        let shared = source as SharedSource;
        QueryCache::new(ResourceCache::new(move || Ok(Arc::clone(&shared))))
    }

    #[test]
    fn second_fetch_within_ttl_is_served_from_cache() {
        let source = Arc::new(FakeSource::new());
        let cache = cache_over(Arc::clone(&source));
        let ttl = Duration::from_secs(600);

        let first = cache.fetch("suppliers", ttl).expect("first fetch");
        let second = cache.fetch("suppliers", ttl).expect("second fetch");

        assert_eq!(source.calls(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        let (hits, misses, refreshes) = cache.stats().get();
        assert_eq!((hits, misses, refreshes), (1, 1, 1));
    }

    #[test]
    fn expired_entry_triggers_a_refetch() {
        let source = Arc::new(FakeSource::new());
        let cache = cache_over(Arc::clone(&source));

        cache.fetch("suppliers", Duration::ZERO).expect("first");
        cache.fetch("suppliers", Duration::ZERO).expect("second");

        assert_eq!(source.calls(), 2);
    }

    #[test]
    fn distinct_tables_do_not_interfere() {
        let source = Arc::new(FakeSource::new());
        let cache = cache_over(Arc::clone(&source));
        let ttl = Duration::from_secs(600);

        cache.fetch("suppliers", ttl).expect("suppliers");
        cache.fetch("events_suppliers", ttl).expect("events");
        cache.fetch("suppliers", ttl).expect("suppliers again");

        assert_eq!(source.calls(), 2);
    }

    #[test]
    fn ttl_is_per_call_not_global() {
        let source = Arc::new(FakeSource::new());
        let cache = cache_over(Arc::clone(&source));

        cache.fetch("suppliers", Duration::from_secs(600)).expect("warm");
        // A caller with a zero window refuses the warm entry.
        cache.fetch("suppliers", Duration::ZERO).expect("strict");

        assert_eq!(source.calls(), 2);
    }

    #[test]
    fn fetch_error_propagates_and_stale_entry_is_not_served() {
        let source = Arc::new(FakeSource {
            calls: AtomicUsize::new(0),
            fail_after: Some(1),
            delay: Duration::ZERO,
        });
        let cache = cache_over(Arc::clone(&source));

        cache.fetch("suppliers", Duration::ZERO).expect("first fetch succeeds");
        let err = cache.fetch("suppliers", Duration::ZERO).unwrap_err();

        assert!(matches!(err, StoreError::Status { status: 503, .. }));
        // The failure did not refresh the entry: a third strict call still
        // reaches the store instead of serving the stale table.
        let err = cache.fetch("suppliers", Duration::ZERO).unwrap_err();
        assert!(matches!(err, StoreError::Status { .. }));
        assert_eq!(source.calls(), 3);
    }

    #[test]
    fn invalidate_forces_a_refetch() {
        let source = Arc::new(FakeSource::new());
        let cache = cache_over(Arc::clone(&source));
        let ttl = Duration::from_secs(600);

        cache.fetch("suppliers", ttl).expect("warm");
        cache.invalidate("suppliers");
        cache.fetch("suppliers", ttl).expect("after invalidate");

        assert_eq!(source.calls(), 2);
    }

    #[test]
    fn handle_is_constructed_once_under_racing_first_use() {
        let constructions = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&constructions);
        let resources = Arc::new(ResourceCache::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(FakeSource::new()) as SharedSource)
        }));

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let resources = Arc::clone(&resources);
                std::thread::spawn(move || {
                    resources.handle().map(|_| ()).expect("connect");
                })
            })
            .collect();
        for thread in threads {
            thread.join().expect("thread");
        }

        assert_eq!(constructions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_connect_is_retried_on_the_next_call() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let resources = ResourceCache::new(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(StoreError::MissingCredentials("SUPABASE_URL"))
            } else {
                Ok(Arc::new(FakeSource::new()) as SharedSource)
            }
        });

        assert!(resources.handle().is_err());
        assert!(resources.handle().is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn concurrent_refetch_of_one_key_collapses_to_one_store_call() {
        let source = Arc::new(FakeSource {
            calls: AtomicUsize::new(0),
            fail_after: None,
            delay: Duration::from_millis(100),
        });
        let cache = Arc::new(cache_over(Arc::clone(&source)));
        let ttl = Duration::from_secs(600);

        let threads: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    cache.fetch("suppliers", ttl).expect("fetch");
                })
            })
            .collect();
        for thread in threads {
            thread.join().expect("thread");
        }

        assert_eq!(source.calls(), 1);
    }

    #[test]
    fn hit_rate_reflects_traffic() {
        let source = Arc::new(FakeSource::new());
        let cache = cache_over(source);
        let ttl = Duration::from_secs(600);

        assert_eq!(cache.stats().hit_rate(), 0.0);
        cache.fetch("suppliers", ttl).expect("miss");
        cache.fetch("suppliers", ttl).expect("hit");
        assert!((cache.stats().hit_rate() - 0.5).abs() < f64::EPSILON);
    }
}
