use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

/// Per-mirror success/failure counters. Process-lifetime only: the table
/// starts empty on every boot and is never persisted, so restart forgets
/// mirror health history.
#[derive(Debug, Clone, Copy, Default)]
pub struct MirrorCounters {
    pub successes: u64,
    pub failures: u64,
}

impl MirrorCounters {
    /// Laplace-smoothed success rate. An untried mirror scores a neutral
    /// 0.5: below any proven-reliable mirror, above any majority-failure
    /// one.
    fn score(&self) -> f64 {
        (self.successes + 1) as f64 / (self.successes + self.failures + 2) as f64
    }
}

/// Shared reliability table, cloned into every worker's fetcher. The lock
/// is only held for counter updates and ranking snapshots, never across an
/// await point.
#[derive(Debug, Clone, Default)]
pub struct MirrorStats {
    inner: Arc<Mutex<HashMap<String, MirrorCounters>>>,
}

impl MirrorStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, url: &str) {
        let mut inner = self.inner.lock().expect("mirror stats lock poisoned");
        inner.entry(url.to_owned()).or_default().successes += 1;
    }

    pub fn record_failure(&self, url: &str) {
        let mut inner = self.inner.lock().expect("mirror stats lock poisoned");
        inner.entry(url.to_owned()).or_default().failures += 1;
    }

    pub fn counters(&self, url: &str) -> MirrorCounters {
        let inner = self.inner.lock().expect("mirror stats lock poisoned");
        inner.get(url).copied().unwrap_or_default()
    }

    /// Orders candidate mirrors by reliability score, descending, stable
    /// with respect to input order on ties.
    pub fn rank<'a>(&self, urls: &'a [String]) -> Vec<&'a String> {
        let mut ranked: Vec<(f64, &String)> = {
            let inner = self.inner.lock().expect("mirror stats lock poisoned");
            urls.iter()
                .map(|url| {
                    let counters = inner.get(url).copied().unwrap_or_default();
                    (counters.score(), url)
                })
                .collect()
        };
        ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        ranked.into_iter().map(|(_, url)| url).collect()
    }
}

/// Fetches one logical feed from an ordered list of candidate mirrors,
/// biasing attempt order by historical reliability.
#[derive(Debug, Clone)]
pub struct MirrorFetcher {
    client: Client,
    stats: MirrorStats,
    timeout: Duration,
}

impl MirrorFetcher {
    pub fn new(client: Client, stats: MirrorStats, timeout: Duration) -> Self {
        Self {
            client,
            stats,
            timeout,
        }
    }

    pub fn stats(&self) -> &MirrorStats {
        &self.stats
    }

    /// Tries each candidate in ranked order and returns the first 2xx body.
    /// Every attempt updates the reliability table. Returns `None` once all
    /// candidates have failed; the caller treats that as a transient
    /// per-cycle failure and retries on the next scheduled poll.
    pub async fn fetch(&self, urls: &[String]) -> Option<String> {
        for url in self.stats.rank(urls) {
            match self.try_fetch(url).await {
                Ok(body) => {
                    self.stats.record_success(url);
                    debug!(mirror = %url, bytes = body.len(), "mirror fetch succeeded");
                    return Some(body);
                }
                Err(err) => {
                    self.stats.record_failure(url);
                    warn!(mirror = %url, error = %err, "mirror fetch failed");
                }
            }
        }
        None
    }

    async fn try_fetch(&self, url: &str) -> Result<String, reqwest::Error> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;
        response.text().await
    }
}
