use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("feed parsing error: {0}")]
    Parse(#[from] rss::Error),
    #[error("feed item missing required field `{0}`")]
    MissingField(&'static str),
    #[error("unparseable pubDate `{value}`: {source}")]
    Timestamp {
        value: String,
        source: chrono::ParseError,
    },
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
    #[error("all mirrors failed")]
    MirrorsExhausted,
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("worker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
