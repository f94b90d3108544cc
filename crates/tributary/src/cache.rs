//! Memoized lineage views.
//!
//! Keys are short rolling hashes of the query parameters. Because different
//! parameters can hash to the same key, each entry keeps the parameters it
//! was stored with and a lookup only hits when they match exactly.
//!
//! When full, the cache evicts the least recently accessed tenth of its
//! entries (at least one) in a single batch.

use crate::domain::NodeId;
use crate::visibility::VisibilityState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Default maximum number of cached views.
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// Share of entries evicted at once, as a divisor of capacity.
const EVICTION_DIVISOR: usize = 10;

/// The query parameters a cached view was computed for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKeyParams {
    /// Anchor node
    pub anchor_id: NodeId,

    /// Upstream depth
    pub upstream_depth: u32,

    /// Downstream depth
    pub downstream_depth: u32,

    /// Active flow, if any
    pub flow_id: Option<String>,

    /// Focus node, if any
    pub focus_id: Option<NodeId>,

    /// Whether unreached flow members were included
    #[serde(default)]
    pub show_orphans: bool,
}

impl From<&VisibilityState> for CacheKeyParams {
    fn from(state: &VisibilityState) -> Self {
        Self {
            anchor_id: state.anchor.clone(),
            upstream_depth: state.upstream_depth,
            downstream_depth: state.downstream_depth,
            flow_id: state.flow.clone(),
            focus_id: state.focus.clone(),
            show_orphans: state.show_orphans,
        }
    }
}

/// Hex-encoded 32-bit rolling hash of the query parameters.
///
/// The hash runs over `anchor:up:down:flow:focus`, with empty strings for
/// absent values and `:orphans` appended when orphans are shown.
///
/// ```
/// use tributary::cache::{CacheKeyParams, generate_cache_key};
/// use tributary::domain::NodeId;
///
/// let params = CacheKeyParams {
///     anchor_id: NodeId::from("fct_orders"),
///     upstream_depth: 2,
///     downstream_depth: 2,
///     flow_id: None,
///     focus_id: None,
///     show_orphans: false,
/// };
/// let key = generate_cache_key(&params);
/// assert_eq!(key.len(), 8);
/// assert_eq!(key, generate_cache_key(&params.clone()));
/// ```
#[must_use]
pub fn generate_cache_key(params: &CacheKeyParams) -> String {
    let mut signature = format!(
        "{}:{}:{}:{}:{}",
        params.anchor_id,
        params.upstream_depth,
        params.downstream_depth,
        params.flow_id.as_deref().unwrap_or(""),
        params.focus_id.as_ref().map_or("", NodeId::as_str),
    );
    if params.show_orphans {
        signature.push_str(":orphans");
    }
    let hash = signature
        .chars()
        .fold(0u32, |hash, c| hash.wrapping_mul(31).wrapping_add(u32::from(c)));
    format!("{hash:08x}")
}

/// Observable cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups that returned a value
    pub hits: u64,

    /// Lookups that returned nothing, including collisions
    pub misses: u64,

    /// Misses where the key matched but the parameters did not
    pub collisions: u64,

    /// Entries removed to make room
    pub evictions: u64,
}

#[derive(Debug)]
struct CacheEntry<V> {
    params: CacheKeyParams,
    value: Arc<V>,
    last_access: u64,
}

/// Bounded LRU cache of lineage views.
#[derive(Debug)]
pub struct LineageCache<V> {
    entries: HashMap<String, CacheEntry<V>>,
    capacity: usize,
    /// Monotonic access counter; higher means more recent.
    clock: u64,
    stats: CacheStats,
}

impl<V> Default for LineageCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl<V> LineageCache<V> {
    /// Create an empty cache holding at most `capacity` entries (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            clock: 0,
            stats: CacheStats::default(),
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Look up a view, refreshing its recency on a hit.
    pub fn get(&mut self, key: &str, params: &CacheKeyParams) -> Option<Arc<V>> {
        let now = self.tick();
        match self.entries.get_mut(key) {
            Some(entry) if entry.params == *params => {
                entry.last_access = now;
                self.stats.hits += 1;
                Some(Arc::clone(&entry.value))
            }
            Some(_) => {
                tracing::debug!(key, "Cache key collision");
                self.stats.collisions += 1;
                self.stats.misses += 1;
                None
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Store a view, evicting old entries first if the cache is full.
    ///
    /// Replaces any entry under the same key. Returns the shared value.
    pub fn set(&mut self, key: String, params: CacheKeyParams, value: V) -> Arc<V> {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_least_recent();
        }
        let value = Arc::new(value);
        let last_access = self.tick();
        self.entries.insert(
            key,
            CacheEntry {
                params,
                value: Arc::clone(&value),
                last_access,
            },
        );
        value
    }

    /// Drop the oldest tenth of the entries; returns how many went.
    fn evict_least_recent(&mut self) -> u64 {
        let count = (self.capacity / EVICTION_DIVISOR).max(1);
        let mut by_age: Vec<(u64, String)> = self
            .entries
            .iter()
            .map(|(key, entry)| (entry.last_access, key.clone()))
            .collect();
        by_age.sort_unstable();

        let mut evicted = 0;
        for (_, key) in by_age.into_iter().take(count) {
            if self.entries.remove(&key).is_some() {
                evicted += 1;
            }
        }
        self.stats.evictions += evicted;
        tracing::debug!(evicted, remaining = self.entries.len(), "Evicted cached views");
        evicted
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            tracing::debug!(entries = self.entries.len(), "Clearing lineage cache");
        }
        self.entries.clear();
    }

    /// Remove entries anchored on or focused on `id`. Returns how many were removed.
    pub fn invalidate_anchor(&mut self, id: &NodeId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| {
            entry.params.anchor_id != *id && entry.params.focus_id.as_ref() != Some(id)
        });
        before - self.entries.len()
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
