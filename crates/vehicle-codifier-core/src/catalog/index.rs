//! Candidate Index (C3).
//!
//! Year-conditioned distinct-value sets for `marca`, `submarca`, `tipveh`,
//! the `marca -> submarca` relation, and hierarchical frequency tables used
//! when prompting the LLM fallback (C6). Built lazily on first access per
//! year and cached thereafter; invalidated implicitly when the active
//! snapshot's version changes, since the cache key includes it.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use super::cache::CatalogSnapshot;

/// Hierarchical frequency entry for one marca within a year.
#[derive(Debug, Clone, Default)]
pub struct MarcaFrequency {
    pub total: usize,
    pub submarcas: HashMap<String, usize>,
    pub tipvehs: HashSet<String>,
}

/// Derived, year-scoped view of the catalog used by field extraction and
/// filtering.
#[derive(Debug, Default)]
pub struct CandidateIndex {
    pub marca_set: HashSet<String>,
    pub submarca_set: HashSet<String>,
    pub tipveh_set: HashSet<String>,
    pub submarca_by_marca: HashMap<String, HashSet<String>>,
    pub freq_by_marca: HashMap<String, MarcaFrequency>,
}

impl CandidateIndex {
    fn build(snapshot: &CatalogSnapshot, year: i32) -> Self {
        let mut index = CandidateIndex::default();

        for record in snapshot.records_for_year(year) {
            if !record.marca.is_empty() {
                index.marca_set.insert(record.marca.clone());
                let freq = index.freq_by_marca.entry(record.marca.clone()).or_default();
                freq.total += 1;
                if !record.submarca.is_empty() {
                    *freq.submarcas.entry(record.submarca.clone()).or_insert(0) += 1;
                }
                if !record.tipveh.is_empty() {
                    freq.tipvehs.insert(record.tipveh.clone());
                }
            }
            if !record.submarca.is_empty() {
                index.submarca_set.insert(record.submarca.clone());
                if !record.marca.is_empty() {
                    index
                        .submarca_by_marca
                        .entry(record.marca.clone())
                        .or_default()
                        .insert(record.submarca.clone());
                }
            }
            if !record.tipveh.is_empty() {
                index.tipveh_set.insert(record.tipveh.clone());
            }
        }

        index
    }

    pub fn is_empty(&self) -> bool {
        self.marca_set.is_empty() && self.submarca_set.is_empty() && self.tipveh_set.is_empty()
    }

    /// Top marcas by total frequency, each with its ordered submarca list
    /// and observed tipveh set — the table embedded in the C6 LLM prompt.
    pub fn top_marcas_by_frequency(&self, limit: usize) -> Vec<(&str, &MarcaFrequency)> {
        let mut entries: Vec<_> = self
            .freq_by_marca
            .iter()
            .map(|(marca, freq)| (marca.as_str(), freq))
            .collect();
        entries.sort_by(|a, b| b.1.total.cmp(&a.1.total).then_with(|| a.0.cmp(b.0)));
        entries.truncate(limit);
        entries
    }
}

/// Caches one `CandidateIndex` per `(snapshot_version, year)` pair.
#[derive(Default)]
pub struct CandidateIndexCache {
    entries: RwLock<HashMap<(u64, i32), Arc<CandidateIndex>>>,
}

impl CandidateIndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached index for `(snapshot.version, year)`, building it
    /// if absent. Concurrent first-readers may redundantly build (spec.md
    /// §5): both computations are pure and equal, so whichever insert wins
    /// is fine.
    pub fn get_or_build(&self, snapshot: &CatalogSnapshot, year: i32) -> Arc<CandidateIndex> {
        let key = (snapshot.version, year);
        if let Some(existing) = self.entries.read().expect("index cache lock poisoned").get(&key) {
            return Arc::clone(existing);
        }
        let built = Arc::new(CandidateIndex::build(snapshot, year));
        self.entries
            .write()
            .expect("index cache lock poisoned")
            .insert(key, Arc::clone(&built));
        built
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CatalogRecord;

    fn snapshot(records: Vec<CatalogRecord>) -> CatalogSnapshot {
        CatalogSnapshot::new(1, records)
    }

    fn record(marca: &str, submarca: &str, tipveh: &str, year: i32) -> CatalogRecord {
        CatalogRecord {
            cvegs: format!("{marca}-{submarca}-{year}"),
            marca: marca.to_string(),
            submarca: submarca.to_string(),
            tipveh: tipveh.to_string(),
            modelo: year,
            descveh: format!("{marca} {submarca}"),
            embedding: None,
            catalog_version: 1,
        }
    }

    #[test]
    fn builds_year_scoped_sets() {
        let snap = snapshot(vec![
            record("toyota", "yaris", "auto", 2022),
            record("toyota", "corolla", "auto", 2022),
            record("honda", "civic", "auto", 2021),
        ]);
        let cache = CandidateIndexCache::new();
        let idx = cache.get_or_build(&snap, 2022);
        assert!(idx.marca_set.contains("toyota"));
        assert!(!idx.marca_set.contains("honda"));
        assert_eq!(idx.submarca_set.len(), 2);
    }

    #[test]
    fn submarca_by_marca_relation_is_scoped() {
        let snap = snapshot(vec![
            record("toyota", "yaris", "auto", 2022),
            record("toyota", "corolla", "auto", 2022),
            record("honda", "yaris", "auto", 2022),
        ]);
        let cache = CandidateIndexCache::new();
        let idx = cache.get_or_build(&snap, 2022);
        let toyota_subs = idx.submarca_by_marca.get("toyota").unwrap();
        assert!(toyota_subs.contains("yaris"));
        assert!(toyota_subs.contains("corolla"));
        assert!(!toyota_subs.contains("honda"));
    }

    #[test]
    fn caches_by_snapshot_version_and_year() {
        let snap = snapshot(vec![record("toyota", "yaris", "auto", 2022)]);
        let cache = CandidateIndexCache::new();
        let first = cache.get_or_build(&snap, 2022);
        let second = cache.get_or_build(&snap, 2022);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn empty_year_yields_empty_index() {
        let snap = snapshot(vec![record("toyota", "yaris", "auto", 2022)]);
        let cache = CandidateIndexCache::new();
        let idx = cache.get_or_build(&snap, 1999);
        assert!(idx.is_empty());
    }
}
