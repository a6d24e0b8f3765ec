// Load Cache
// Time-bounded memoization of load results, keyed by (mode, ev_only)

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

use crate::loader::{LoadedData, SourceMode};

/// Cache key: one entry per (source mode, EV-only flag) combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub mode: SourceMode,
    pub ev_only: bool,
}

struct CacheEntry {
    data: LoadedData,
    loaded_at: DateTime<Utc>,
}

/// Time-bounded cache of load results.
///
/// Entries expire after the TTL and are recomputed on next access; there is
/// no manual invalidation. Reads may happen from multiple sessions, but an
/// entry is populated at most once per key per expiry window under the
/// single-threaded request cycle this dashboard runs.
pub struct LoadCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl LoadCache {
    /// Load results stay fresh for one hour by default.
    pub const DEFAULT_TTL_SECS: i64 = 60 * 60;

    pub fn new(ttl: Duration) -> Self {
        LoadCache {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn with_default_ttl() -> Self {
        Self::new(Duration::seconds(Self::DEFAULT_TTL_SECS))
    }

    /// Return the cached value for `key` if fresh, otherwise run `load` and
    /// cache its result. A failed load caches nothing.
    pub fn get_or_load<F>(&self, key: CacheKey, load: F) -> Result<LoadedData>
    where
        F: FnOnce() -> Result<LoadedData>,
    {
        let now = Utc::now();

        {
            let entries = self.entries.read().unwrap();
            if let Some(entry) = entries.get(&key) {
                if now - entry.loaded_at < self.ttl {
                    debug!(mode = key.mode.name(), ev_only = key.ev_only, "load cache hit");
                    return Ok(entry.data.clone());
                }
                debug!(mode = key.mode.name(), ev_only = key.ev_only, "load cache entry expired");
            }
        }

        let data = load()?;
        let mut entries = self.entries.write().unwrap();
        entries.insert(
            key,
            CacheEntry {
                data: data.clone(),
                loaded_at: now,
            },
        );
        Ok(data)
    }
}

// ============================================================================
// TESTS
// ============================================================================
