use chrono::{DateTime, Utc};
use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};
use serde_json::Value;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info};

use crate::config::Config;

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub data: Value,
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    /// True once the entry is strictly older than `lifespan` at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>, lifespan: Duration) -> bool {
        // A negative age (clock moved backwards) never expires the entry.
        (now - self.stored_at)
            .to_std()
            .map(|age| age > lifespan)
            .unwrap_or(false)
    }
}

/// Search results keyed by the exact term. Reads never look at an entry's age:
/// an entry is served until the sweep removes it, at most one prune interval
/// after it passes its lifespan.
#[derive(Clone, Debug)]
pub struct SearchCache {
    entries: Cache<String, CacheEntry>,
    lifespan: Duration,
    prune_interval: Duration,
}

impl SearchCache {
    pub fn new(lifespan: Duration, prune_interval: Duration) -> Self {
        Self {
            // Unbounded; eviction is purely time based and done by `prune`.
            entries: Cache::builder().build(),
            lifespan,
            prune_interval,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cache_lifespan, config.prune_interval())
    }

    pub fn lifespan(&self) -> Duration {
        self.lifespan
    }

    pub fn prune_interval(&self) -> Duration {
        self.prune_interval
    }

    pub async fn get(&self, term: &str) -> Option<CacheEntry> {
        self.entries.get(term).await
    }

    /// Stores `data` under `term` stamped with the current time, replacing any previous entry.
    pub async fn set(&self, term: &str, data: Value) {
        let entry = CacheEntry {
            data,
            stored_at: Utc::now(),
        };
        self.entries.insert(term.to_string(), entry).await;
    }

    pub fn len(&self) -> usize {
        self.entries.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every entry older than the lifespan at `now`. Returns how many were removed.
    pub async fn prune(&self, now: DateTime<Utc>) -> usize {
        let lifespan = self.lifespan;
        let candidates: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now, lifespan))
            .map(|(term, _)| term.as_ref().clone())
            .collect();

        let mut removed = 0;
        for term in candidates {
            // Re-check under the entry lock so a concurrent refresh survives the sweep.
            let result = self
                .entries
                .entry(term)
                .and_compute_with(|current| async move {
                    match current {
                        Some(entry) if entry.value().is_expired(now, lifespan) => Op::Remove,
                        _ => Op::Nop,
                    }
                })
                .await;
            if matches!(result, CompResult::Removed(_)) {
                removed += 1;
            }
        }
        removed
    }

    /// Starts the background sweep. The first sweep runs one interval after this call.
    pub fn spawn_pruner(&self) -> JoinHandle<()> {
        let cache = self.clone();
        let period = self.prune_interval;
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let removed = cache.prune(Utc::now()).await;
                if removed > 0 {
                    info!("Pruned {} expired cache entries", removed);
                } else {
                    debug!("Cache prune found nothing to remove");
                }
            }
        })
    }
}
