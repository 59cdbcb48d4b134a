use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::FeedConfig;
use crate::delivery::DeliveryChannel;
use crate::error::RelayError;
use crate::feed::{filter_recent, parse_feed};
use crate::fetch::{MirrorFetcher, MirrorStats};
use crate::normalize::normalize;
use crate::store::ItemStore;

/// Per-worker policy knobs shared by all feeds.
#[derive(Debug, Clone, Copy)]
pub struct WorkerOptions {
    /// Entries older than this are dropped before delivery.
    pub max_age: chrono::Duration,
    /// At most this many new entries are delivered per poll cycle.
    pub max_per_cycle: usize,
    /// With `true`, an unparseable entry timestamp aborts the cycle.
    pub strict_timestamps: bool,
    /// Per-mirror request timeout.
    pub request_timeout: Duration,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            max_age: chrono::Duration::days(3),
            max_per_cycle: 3,
            strict_timestamps: true,
            request_timeout: Duration::from_secs(10),
        }
    }
}

pub struct WorkerHandle {
    cancel_tx: broadcast::Sender<()>,
    join: JoinHandle<()>,
}

impl WorkerHandle {
    pub async fn stop(self) -> Result<(), RelayError> {
        let _ = self.cancel_tx.send(());
        self.join.await.map_err(RelayError::from)
    }
}

/// Spawns one long-lived polling task for a feed. The worker sleeps first,
/// then runs a cycle, forever; a failed cycle is logged and the worker goes
/// straight back to sleep. It only stops through the returned handle.
pub fn spawn_worker(
    cfg: FeedConfig,
    interval: Duration,
    fetcher: MirrorFetcher,
    store: ItemStore,
    channel: Arc<dyn DeliveryChannel>,
    opts: WorkerOptions,
) -> WorkerHandle {
    let (cancel_tx, mut cancel_rx) = broadcast::channel(1);
    let join = tokio::spawn(async move {
        let rss_key = cfg.rss_key();
        loop {
            tokio::select! {
                _ = cancel_rx.recv() => {
                    info!(feed = %rss_key, "worker shutdown requested");
                    break;
                }
                _ = tokio::time::sleep(interval) => {}
            }
            match run_cycle(&cfg, &fetcher, &store, channel.as_ref(), &opts).await {
                Ok(0) => {}
                Ok(delivered) => {
                    info!(feed = %rss_key, delivered, "delivered new entries");
                }
                Err(err) => {
                    warn!(feed = %rss_key, error = %err, "poll cycle failed");
                }
            }
        }
    });
    WorkerHandle { cancel_tx, join }
}

/// One poll cycle: fetch, parse, dedup, recency-filter, cap, normalize,
/// deliver, record. Returns the number of entries delivered. Exposed so
/// tests can drive cycles deterministically without the sleep loop.
pub async fn run_cycle(
    cfg: &FeedConfig,
    fetcher: &MirrorFetcher,
    store: &ItemStore,
    channel: &dyn DeliveryChannel,
    opts: &WorkerOptions,
) -> Result<usize, RelayError> {
    let rss_key = cfg.rss_key();
    debug!(feed = %rss_key, "fetching feed");
    let body = fetcher
        .fetch(&cfg.urls)
        .await
        .ok_or(RelayError::MirrorsExhausted)?;
    let entries = parse_feed(&body)?;
    let unseen = store.filter_unseen(entries).await?;
    let fresh = filter_recent(unseen, Utc::now(), opts.max_age, opts.strict_timestamps)?;

    // Cap at the last `max_per_cycle` entries in document order and deliver
    // them oldest first.
    let start = fresh.len().saturating_sub(opts.max_per_cycle);
    let mut delivered = 0;
    for entry in fresh[start..].iter().rev() {
        let text = normalize(&cfg.catalog, entry)?;
        deliver(channel, cfg, &text).await;
        // Recorded even when individual sends failed: at-most-attempted,
        // not at-least-delivered.
        store.record(&rss_key, entry).await?;
        delivered += 1;
    }
    Ok(delivered)
}

async fn deliver(channel: &dyn DeliveryChannel, cfg: &FeedConfig, text: &str) {
    for name in &cfg.groups {
        match channel.resolve_group(name).await {
            Some(target) => {
                if let Err(err) = channel.send(text, &target).await {
                    warn!(group = %name, error = %err, "send to group failed");
                }
            }
            None => error!(group = %name, "group not found"),
        }
    }
    for name in &cfg.receivers {
        match channel.resolve_contact(name).await {
            Some(target) => {
                if let Err(err) = channel.send(text, &target).await {
                    warn!(contact = %name, error = %err, "send to contact failed");
                }
            }
            None => error!(contact = %name, "contact not found"),
        }
    }
}

/// Owns the full set of feed workers, one task per configured feed, all
/// started eagerly. Workers share the HTTP client, the mirror reliability
/// table and the item store; nothing else crosses feed boundaries.
pub struct Dispatcher {
    workers: Vec<WorkerHandle>,
}

impl Dispatcher {
    pub fn start(
        configs: Vec<FeedConfig>,
        client: Client,
        stats: MirrorStats,
        store: ItemStore,
        channel: Arc<dyn DeliveryChannel>,
        opts: WorkerOptions,
    ) -> Self {
        let workers = configs
            .into_iter()
            .map(|cfg| {
                let fetcher =
                    MirrorFetcher::new(client.clone(), stats.clone(), opts.request_timeout);
                let interval = cfg.poll_interval();
                info!(feed = %cfg.rss_key(), interval_secs = interval.as_secs(), "starting worker");
                spawn_worker(cfg, interval, fetcher, store.clone(), channel.clone(), opts)
            })
            .collect();
        Self { workers }
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub async fn shutdown(self) -> Result<(), RelayError> {
        for worker in self.workers {
            worker.stop().await?;
        }
        Ok(())
    }
}
