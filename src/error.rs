use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Manifest fetch failed during install: {url}: {reason}")]
    ManifestFetch { url: String, reason: String },

    #[error("Failed to open store '{name}': {source}")]
    StoreOpen {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to write entry to store '{name}': {reason}")]
    StoreWrite { name: String, reason: String },

    #[error("Failed to delete stale store '{name}': {source}")]
    StaleStoreDeletion {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Entry serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Worker is in state {state} - expected {expected}")]
    InvalidLifecycleState {
        state: &'static str,
        expected: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, ProxyError>;
