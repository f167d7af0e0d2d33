//! Content-addressed result cache.
//!
//! Per-file results are cached under a fingerprint of the source bytes, the
//! active rule set, the effective configuration and the engine version, so
//! any change to one of those inputs misses cleanly. The cache is bounded
//! (`max_entries`, LRU eviction), entries expire after a TTL, and the whole
//! map can be snapshotted to a single JSON file under a cache directory.
//! Corrupt snapshots are discarded with a warning, never a fatal error.
//!
//! `probe`/`store` are atomic behind an `RwLock`; a per-fingerprint
//! single-flight lock in [`AnalysisCache::get_or_compute`] guarantees that
//! at most one analysis runs for a given fingerprint across workers.

use std::{
    collections::HashMap,
    fs,
    hash::{DefaultHasher, Hash, Hasher},
    path::PathBuf,
    sync::{Arc, Mutex, RwLock, atomic::{AtomicU64, Ordering}},
    time::{Duration, SystemTime, UNIX_EPOCH}
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    config::AnalyzerConfig,
    error::{AppResult, cache_error},
    rules::{FileReport, RuleRegistry}
};

/// File name of the snapshot inside the cache directory.
pub const SNAPSHOT_FILE_NAME: &str = "analysis-cache.json";

/// Cache bounds and persistence location.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of per-file results kept in memory
    pub max_entries: usize,
    /// Entries older than this are treated as misses
    pub ttl:         Duration,
    /// Snapshot directory; `None` disables persistence
    pub directory:   Option<PathBuf>
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1024,
            ttl:         Duration::from_secs(24 * 60 * 60),
            directory:   None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    result:     FileReport,
    created_at: u64,
    hit_count:  u64
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits:    u64,
    pub misses:  u64,
    pub entries: usize
}

/// Thread-safe, bounded, content-addressed cache of per-file results.
pub struct AnalysisCache {
    config:   CacheConfig,
    entries:  RwLock<IndexMap<u64, CacheEntry>>,
    inflight: Mutex<HashMap<u64, Arc<Mutex<()>>>>,
    hits:     AtomicU64,
    misses:   AtomicU64
}

impl AnalysisCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: RwLock::new(IndexMap::new()),
            inflight: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0)
        }
    }

    /// Create a cache and load the snapshot from the configured directory.
    ///
    /// A missing snapshot starts empty; a corrupt one is discarded with a
    /// warning.
    pub fn load(config: CacheConfig) -> Self {
        let cache = Self::new(config);
        let Some(path) = cache.snapshot_path() else {
            return cache;
        };
        let Ok(content) = fs::read_to_string(&path) else {
            return cache;
        };
        match serde_json::from_str::<Vec<(u64, CacheEntry)>>(&content) {
            Ok(snapshot) => {
                if let Ok(mut entries) = cache.entries.write() {
                    entries.extend(snapshot);
                }
            }
            Err(error) => {
                eprintln!(
                    "warning: discarding corrupt cache snapshot '{}': {}",
                    path.display(),
                    error
                );
            }
        }
        cache
    }

    /// Persist the current entries to the snapshot file.
    ///
    /// # Errors
    ///
    /// Fails when the directory cannot be created or the file not written;
    /// callers log this as a warning rather than aborting.
    pub fn save(&self) -> AppResult<()> {
        let Some(path) = self.snapshot_path() else {
            return Ok(());
        };
        if let Some(directory) = path.parent() {
            fs::create_dir_all(directory)
                .map_err(|e| cache_error(format!("Cannot create cache directory: {}", e)))?;
        }
        let entries = self
            .entries
            .read()
            .map_err(|_| cache_error("Cache lock poisoned"))?;
        let snapshot: Vec<(&u64, &CacheEntry)> = entries.iter().collect();
        let content = serde_json::to_string(&snapshot)
            .map_err(|e| cache_error(format!("Cannot serialize cache: {}", e)))?;
        fs::write(&path, content)
            .map_err(|e| cache_error(format!("Cannot write cache snapshot: {}", e)))?;
        Ok(())
    }

    fn snapshot_path(&self) -> Option<PathBuf> {
        self.config
            .directory
            .as_ref()
            .map(|dir| dir.join(SNAPSHOT_FILE_NAME))
    }

    /// Look up a fingerprint, refreshing its LRU position on hit.
    ///
    /// Expired entries are removed and count as misses.
    pub fn probe(&self, fingerprint: u64) -> Option<FileReport> {
        self.lookup(fingerprint, true)
    }

    /// Shared lookup; `record_stats` lets the single-flight re-check run
    /// without counting the same logical probe twice.
    fn lookup(&self, fingerprint: u64, record_stats: bool) -> Option<FileReport> {
        let Ok(mut entries) = self.entries.write() else {
            return None;
        };
        let Some(mut entry) = entries.shift_remove(&fingerprint) else {
            if record_stats {
                self.misses.fetch_add(1, Ordering::Relaxed);
            }
            return None;
        };
        if unix_now().saturating_sub(entry.created_at) > self.config.ttl.as_secs() {
            if record_stats {
                self.misses.fetch_add(1, Ordering::Relaxed);
            }
            return None;
        }
        entry.hit_count += 1;
        let result = entry.result.clone();
        entries.insert(fingerprint, entry);
        if record_stats {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        Some(result)
    }

    /// Insert a result, evicting least-recently-used entries when full.
    pub fn store(&self, fingerprint: u64, result: FileReport) {
        let Ok(mut entries) = self.entries.write() else {
            return;
        };
        while !entries.is_empty() && entries.len() >= self.config.max_entries {
            entries.shift_remove_index(0);
        }
        entries.insert(
            fingerprint,
            CacheEntry {
                result,
                created_at: unix_now(),
                hit_count: 0
            }
        );
    }

    /// Probe-or-compute with a per-fingerprint single-flight guard.
    ///
    /// Returns the result and whether it came from the cache. Concurrent
    /// callers with the same fingerprint serialize on the guard, so the
    /// computation runs at most once; later callers hit the stored result.
    pub fn get_or_compute(
        &self,
        fingerprint: u64,
        compute: impl FnOnce() -> FileReport
    ) -> (FileReport, bool) {
        if let Some(result) = self.probe(fingerprint) {
            return (result, true);
        }
        let guard = {
            let Ok(mut inflight) = self.inflight.lock() else {
                return (compute(), false);
            };
            inflight
                .entry(fingerprint)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let _flight = guard.lock();
        // Another worker may have finished while we waited for the guard;
        // this caller's miss is already recorded, so re-check quietly.
        if let Some(result) = self.lookup(fingerprint, false) {
            return (result, true);
        }
        let result = compute();
        // Parse failures are never cached; the next run retries the file.
        if !result.parse_failed() {
            self.store(fingerprint, result.clone());
        }
        if let Ok(mut inflight) = self.inflight.lock() {
            inflight.remove(&fingerprint);
        }
        (result, false)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits:    self.hits.load(Ordering::Relaxed),
            misses:  self.misses.load(Ordering::Relaxed),
            entries: self.entries.read().map(|e| e.len()).unwrap_or(0)
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Fingerprint of one file's analysis inputs.
///
/// Identical source + rule set + config + engine version hash identically;
/// any drift in those inputs produces a clean miss.
pub fn fingerprint(source: &str, rule_signature: u64, config_signature: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    source.hash(&mut hasher);
    rule_signature.hash(&mut hasher);
    config_signature.hash(&mut hasher);
    env!("CARGO_PKG_VERSION").hash(&mut hasher);
    hasher.finish()
}

/// Signature of the active rule set: effective ids and severities in
/// registration order.
pub fn rule_set_signature(registry: &RuleRegistry, config: &AnalyzerConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    for (id, rule) in registry.iter() {
        id.hash(&mut hasher);
        let severity = config.severity_for(id, rule.meta().severity);
        (severity as u8).hash(&mut hasher);
    }
    hasher.finish()
}

/// Signature of the effective configuration's rule table.
pub fn config_signature(config: &AnalyzerConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    for (rule_id, entry) in &config.rules {
        rule_id.hash(&mut hasher);
        (entry.severity as u8).hash(&mut hasher);
        if let Some(options) = &entry.options {
            options.to_string().hash(&mut hasher);
        }
    }
    hasher.finish()
}
