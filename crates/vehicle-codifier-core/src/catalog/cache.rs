//! Catalog Cache (C2).
//!
//! Holds the active catalog snapshot in memory. Refresh builds a fresh
//! snapshot and atomically publishes it; readers holding a reference to the
//! prior snapshot keep it alive until their match completes (spec.md §4.2,
//! §9 "Cyclic snapshot replacement"). The publish mechanism is the same
//! `Arc<RwLock<Arc<T>>>` swap the teacher's progressive vocabulary encoder
//! uses to hand off scorers across a background task boundary.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crate::error::PipelineError;
use crate::types::CatalogRecord;

/// An immutable, fully materialized view of one catalog version.
pub struct CatalogSnapshot {
    pub version: u64,
    pub records: Vec<CatalogRecord>,
    embedding_by_cvegs: HashMap<String, usize>,
}

impl CatalogSnapshot {
    pub(crate) fn new(version: u64, records: Vec<CatalogRecord>) -> Self {
        let embedding_by_cvegs = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.embedding.is_some())
            .map(|(i, r)| (r.cvegs.clone(), i))
            .collect();
        Self {
            version,
            records,
            embedding_by_cvegs,
        }
    }

    pub fn get_embedding(&self, cvegs: &str) -> Option<&[f32]> {
        self.embedding_by_cvegs
            .get(cvegs)
            .and_then(|&i| self.records[i].embedding.as_deref())
    }

    pub fn records_for_year(&self, year: i32) -> impl Iterator<Item = &CatalogRecord> {
        self.records.iter().filter(move |r| r.modelo == year)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Supplies catalog rows to the cache. The core never writes to the
/// catalog (Non-goals); this is a read-only external collaborator the
/// caller provides (e.g. a CSV reader, a database query).
pub trait CatalogSource: Send + Sync {
    /// Load the latest active/loaded version and its rows. If the source
    /// reports multiple candidate versions, it must resolve ties itself and
    /// return the single winning version (spec.md §4.2: largest version
    /// wins, ties impossible by construction).
    fn load_active_version(&self) -> Result<(u64, Vec<CatalogRecord>), PipelineError>;
}

/// In-memory double-buffered cache over the active catalog snapshot.
pub struct CatalogCache {
    snapshot: RwLock<Arc<CatalogSnapshot>>,
    source: Box<dyn CatalogSource>,
    refresh_interval: Duration,
    last_refresh: RwLock<Instant>,
}

impl CatalogCache {
    /// Load the initial snapshot from `source` at construction time.
    pub fn load(source: Box<dyn CatalogSource>, refresh_interval: Duration) -> Result<Self, PipelineError> {
        let (version, records) = source.load_active_version()?;
        Ok(Self {
            snapshot: RwLock::new(Arc::new(CatalogSnapshot::new(version, records))),
            source,
            refresh_interval,
            last_refresh: RwLock::new(Instant::now()),
        })
    }

    /// Borrow the currently active snapshot. Readers clone the `Arc`, so the
    /// lock is held only long enough to bump the reference count; the
    /// returned snapshot stays valid even if `refresh` runs concurrently.
    pub fn active_snapshot(&self) -> Arc<CatalogSnapshot> {
        Arc::clone(&self.snapshot.read().expect("catalog snapshot lock poisoned"))
    }

    /// Rebuild from the source and atomically publish, if the build
    /// succeeds. On failure the previous snapshot remains in service
    /// (spec.md §7, `SnapshotStale`) and the error is logged, not returned.
    pub fn refresh(&self) {
        match self.source.load_active_version() {
            Ok((version, records)) => {
                let current_version = self.active_snapshot().version;
                if version < current_version {
                    tracing::warn!(
                        version,
                        current_version,
                        "refresh produced an older version than the active snapshot, ignoring"
                    );
                    return;
                }
                let fresh = Arc::new(CatalogSnapshot::new(version, records));
                *self.snapshot.write().expect("catalog snapshot lock poisoned") = fresh;
                *self.last_refresh.write().expect("refresh timestamp lock poisoned") = Instant::now();
                tracing::info!(version, "catalog snapshot refreshed");
            }
            Err(err) => {
                tracing::warn!(error = %err, "catalog refresh failed, keeping previous snapshot");
            }
        }
    }

    /// Refresh if the active snapshot is older than the configured interval.
    pub fn refresh_if_stale(&self) {
        let last = *self.last_refresh.read().expect("refresh timestamp lock poisoned");
        if last.elapsed() >= self.refresh_interval {
            self.refresh();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn record(cvegs: &str, year: i32) -> CatalogRecord {
        CatalogRecord {
            cvegs: cvegs.to_string(),
            marca: "toyota".to_string(),
            submarca: "yaris".to_string(),
            tipveh: "auto".to_string(),
            modelo: year,
            descveh: "yaris sol l".to_string(),
            embedding: Some(vec![1.0, 0.0]),
            catalog_version: 1,
        }
    }

    struct FixedSource(Vec<CatalogRecord>, u64);
    impl CatalogSource for FixedSource {
        fn load_active_version(&self) -> Result<(u64, Vec<CatalogRecord>), PipelineError> {
            Ok((self.1, self.0.clone()))
        }
    }

    struct CountingSource {
        calls: AtomicU64,
    }
    impl CatalogSource for CountingSource {
        fn load_active_version(&self) -> Result<(u64, Vec<CatalogRecord>), PipelineError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((n + 1, vec![record("X", 2020)]))
        }
    }

    #[test]
    fn loads_initial_snapshot() {
        let cache = CatalogCache::load(
            Box::new(FixedSource(vec![record("T1", 2022)], 1)),
            Duration::from_secs(3600),
        )
        .unwrap();
        let snapshot = cache.active_snapshot();
        assert_eq!(snapshot.version, 1);
        assert_eq!(snapshot.records.len(), 1);
    }

    #[test]
    fn get_embedding_returns_stored_vector() {
        let cache = CatalogCache::load(
            Box::new(FixedSource(vec![record("T1", 2022)], 1)),
            Duration::from_secs(3600),
        )
        .unwrap();
        let snapshot = cache.active_snapshot();
        assert_eq!(snapshot.get_embedding("T1"), Some(&[1.0, 0.0][..]));
        assert_eq!(snapshot.get_embedding("unknown"), None);
    }

    #[test]
    fn refresh_publishes_new_version_atomically() {
        let cache = CatalogCache::load(
            Box::new(CountingSource { calls: AtomicU64::new(0) }),
            Duration::from_secs(3600),
        )
        .unwrap();
        let before = cache.active_snapshot();
        assert_eq!(before.version, 1);

        cache.refresh();
        let after = cache.active_snapshot();
        assert_eq!(after.version, 2);
        // The reader holding `before` still observes the old version.
        assert_eq!(before.version, 1);
    }

    #[test]
    fn refresh_if_stale_is_a_noop_before_interval_elapses() {
        let cache = CatalogCache::load(
            Box::new(CountingSource { calls: AtomicU64::new(0) }),
            Duration::from_secs(3600),
        )
        .unwrap();
        cache.refresh_if_stale();
        assert_eq!(cache.active_snapshot().version, 1);
    }

    #[test]
    fn records_for_year_filters_by_modelo() {
        let cache = CatalogCache::load(
            Box::new(FixedSource(
                vec![record("T1", 2022), record("T2", 2021)],
                1,
            )),
            Duration::from_secs(3600),
        )
        .unwrap();
        let snapshot = cache.active_snapshot();
        let matching: Vec<_> = snapshot.records_for_year(2022).collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].cvegs, "T1");
    }
}
