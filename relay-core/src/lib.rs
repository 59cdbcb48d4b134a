pub mod config;
pub mod delivery;
pub mod error;
pub mod feed;
pub mod fetch;
pub mod normalize;
pub mod store;
pub mod worker;

pub use config::{load_feeds, FeedConfig};
pub use delivery::{DeliveryChannel, DeliveryError, Target};
pub use error::RelayError;
pub use feed::{filter_recent, parse_feed, FeedEntry, PUB_DATE_FORMAT};
pub use fetch::{MirrorFetcher, MirrorStats};
pub use normalize::{clean_markup, convert_to_east_eight, normalize};
pub use store::ItemStore;
pub use worker::{run_cycle, spawn_worker, Dispatcher, WorkerHandle, WorkerOptions};
