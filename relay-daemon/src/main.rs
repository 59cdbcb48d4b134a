mod webhook;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use relay_core::{load_feeds, Dispatcher, ItemStore, MirrorStats, WorkerOptions};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::webhook::WebhookChannel;

#[derive(Debug, Parser)]
#[command(name = "relay-daemon", about = "Polls RSS feeds and relays new entries to a webhook")]
struct Opts {
    /// Path to the JSON subscription list (falls back to the bundled
    /// template when absent).
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// SQLite file recording already-delivered entries.
    #[arg(long, default_value = "rss_items.db")]
    database: PathBuf,

    /// Webhook endpoint every message is posted to.
    #[arg(long)]
    webhook_url: String,

    /// Skip entries with unparseable timestamps instead of failing the
    /// poll cycle.
    #[arg(long)]
    lenient_timestamps: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let opts = Opts::parse();

    let feeds = load_feeds(&opts.config).context("failed to load feed configuration")?;
    anyhow::ensure!(!feeds.is_empty(), "no feeds configured");

    let store = ItemStore::new(&opts.database);
    store.init().await.context("failed to initialise item store")?;

    let worker_opts = WorkerOptions {
        strict_timestamps: !opts.lenient_timestamps,
        ..WorkerOptions::default()
    };
    let client = reqwest::Client::builder()
        .user_agent("rss-relay/0.1")
        .build()
        .context("failed to build HTTP client")?;
    let channel = Arc::new(WebhookChannel::new(client.clone(), opts.webhook_url));

    let dispatcher = Dispatcher::start(
        feeds,
        client,
        MirrorStats::new(),
        store,
        channel,
        worker_opts,
    );
    info!(workers = dispatcher.len(), "relay started");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutting down");
    dispatcher.shutdown().await?;
    Ok(())
}
