//! Metrics collection module
//!
//! Tracks provider latency, cache effectiveness and failure rates.

use crate::providers::ProviderKind;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Response times kept per provider for the rolling average
const RESPONSE_TIME_WINDOW: usize = 100;

#[derive(Default)]
struct ProviderCounters {
    fetches: u64,
    cache_hits: u64,
    successes: u64,
    failures: u64,
    response_times: VecDeque<u64>,
}

/// Process-wide metrics collector
pub struct Metrics {
    total_searches: AtomicU64,
    providers: RwLock<HashMap<ProviderKind, ProviderCounters>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            total_searches: AtomicU64::new(0),
            providers: RwLock::new(HashMap::new()),
        }
    }

    /// Increment total search count
    pub fn inc_search(&self) {
        self.total_searches.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a lookup answered from the cache
    pub fn record_cache_hit(&self, provider: ProviderKind) {
        self.update(provider, |c| c.cache_hits += 1);
    }

    /// Record a request that went out to the provider
    pub fn record_fetch(&self, provider: ProviderKind, time_ms: u64) {
        self.update(provider, |c| {
            c.fetches += 1;
            if c.response_times.len() >= RESPONSE_TIME_WINDOW {
                c.response_times.pop_front();
            }
            c.response_times.push_back(time_ms);
        });
    }

    pub fn record_success(&self, provider: ProviderKind) {
        self.update(provider, |c| c.successes += 1);
    }

    pub fn record_error(&self, provider: ProviderKind) {
        self.update(provider, |c| c.failures += 1);
    }

    pub fn get_total_searches(&self) -> u64 {
        self.total_searches.load(Ordering::Relaxed)
    }

    /// Average of the recent fetch times for a provider
    pub fn get_avg_response_time(&self, provider: ProviderKind) -> Option<u64> {
        let providers = self.providers.read().unwrap_or_else(|e| e.into_inner());
        providers.get(&provider).and_then(|c| average(&c.response_times))
    }

    /// Success percentage for a provider; 100 when nothing was recorded
    pub fn get_reliability(&self, provider: ProviderKind) -> f64 {
        let providers = self.providers.read().unwrap_or_else(|e| e.into_inner());
        providers.get(&provider).map_or(100.0, reliability)
    }

    /// Snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        let providers = self.providers.read().unwrap_or_else(|e| e.into_inner());
        let stats = ProviderKind::ALL
            .iter()
            .map(|kind| {
                let stats = providers
                    .get(kind)
                    .map(|c| ProviderStats {
                        fetches: c.fetches,
                        cache_hits: c.cache_hits,
                        successes: c.successes,
                        failures: c.failures,
                        avg_response_time: average(&c.response_times),
                        reliability: reliability(c),
                    })
                    .unwrap_or_default();
                (kind.as_str().to_string(), stats)
            })
            .collect();

        MetricsSnapshot {
            total_searches: self.get_total_searches(),
            providers: stats,
        }
    }

    fn update(&self, provider: ProviderKind, f: impl FnOnce(&mut ProviderCounters)) {
        let mut providers = self.providers.write().unwrap_or_else(|e| e.into_inner());
        f(providers.entry(provider).or_default());
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn average(times: &VecDeque<u64>) -> Option<u64> {
    if times.is_empty() {
        None
    } else {
        Some(times.iter().sum::<u64>() / times.len() as u64)
    }
}

fn reliability(counters: &ProviderCounters) -> f64 {
    let total = counters.successes + counters.failures;
    if total == 0 {
        100.0
    } else {
        (counters.successes as f64 / total as f64) * 100.0
    }
}

/// Statistics for a single provider
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStats {
    pub fetches: u64,
    pub cache_hits: u64,
    pub successes: u64,
    pub failures: u64,
    pub avg_response_time: Option<u64>,
    pub reliability: f64,
}

impl Default for ProviderStats {
    fn default() -> Self {
        Self {
            fetches: 0,
            cache_hits: 0,
            successes: 0,
            failures: 0,
            avg_response_time: None,
            reliability: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_searches: u64,
    pub providers: BTreeMap<String, ProviderStats>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics() {
        let metrics = Metrics::new();

        metrics.inc_search();
        metrics.record_fetch(ProviderKind::Web, 100);
        metrics.record_success(ProviderKind::Web);

        assert_eq!(metrics.get_total_searches(), 1);
        assert_eq!(metrics.get_avg_response_time(ProviderKind::Web), Some(100));
        assert_eq!(metrics.get_reliability(ProviderKind::Web), 100.0);
        assert_eq!(metrics.get_avg_response_time(ProviderKind::News), None);
    }

    #[test]
    fn test_reliability_counts_failures() {
        let metrics = Metrics::new();
        metrics.record_success(ProviderKind::News);
        metrics.record_error(ProviderKind::News);
        metrics.record_error(ProviderKind::News);
        metrics.record_error(ProviderKind::News);
        assert_eq!(metrics.get_reliability(ProviderKind::News), 25.0);
    }

    #[test]
    fn test_response_time_window_is_bounded() {
        let metrics = Metrics::new();
        for _ in 0..RESPONSE_TIME_WINDOW {
            metrics.record_fetch(ProviderKind::Neural, 1000);
        }
        for _ in 0..RESPONSE_TIME_WINDOW {
            metrics.record_fetch(ProviderKind::Neural, 10);
        }
        assert_eq!(metrics.get_avg_response_time(ProviderKind::Neural), Some(10));
    }

    #[test]
    fn test_snapshot_lists_every_provider() {
        let metrics = Metrics::new();
        metrics.record_cache_hit(ProviderKind::Web);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.providers.len(), 3);
        assert_eq!(snapshot.providers["web"].cache_hits, 1);
        assert_eq!(snapshot.providers["news"].fetches, 0);
    }
}
