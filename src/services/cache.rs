use crate::models::ComplexityMetrics;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::debug;

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

struct CacheEntry {
    metrics: ComplexityMetrics,
    stored_at: Instant,
}

/// Per-URL memo of extracted metrics. Keys are the raw URL strings; no
/// normalization happens here.
pub struct ResultCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, url: &str) -> Option<ComplexityMetrics> {
        let now = self.clock.now();
        if let Some(entry) = self.entries.get(url) {
            if now.saturating_duration_since(entry.stored_at) < self.ttl {
                debug!("Cache hit for {}", url);
                return Some(entry.metrics.clone());
            }
            debug!("Cache expired for {}", url);
            drop(entry);
            self.entries.remove(url);
        }
        debug!("Cache miss for {}", url);
        None
    }

    pub fn put(&self, url: impl Into<String>, metrics: ComplexityMetrics) {
        let url = url.into();
        debug!("Caching metrics for {} (TTL: {:?})", url, self.ttl);
        self.entries.insert(
            url,
            CacheEntry {
                metrics,
                stored_at: self.clock.now(),
            },
        );
    }

    pub fn invalidate(&self, url: &str) {
        self.entries.remove(url);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = now.saturating_duration_since(entry.stored_at) < self.ttl;
            if !keep {
                removed += 1;
            }
            keep
        });
        debug!("Cache cleanup: removed {} expired entries", removed);
        removed
    }

    /// Sweeps expired entries every `every` until the cache is dropped.
    pub fn spawn_cleanup(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let cache: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every.max(Duration::from_millis(1)));
            loop {
                interval.tick().await;
                match cache.upgrade() {
                    Some(cache) => {
                        cache.cleanup_expired();
                    }
                    None => break,
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}
