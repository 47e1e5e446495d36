use std::path::PathBuf;

use super::models::TournamentKey;

/// Failures while retrieving open-data files.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid data URL {0}")]
    BadUrl(String),

    #[error("no event data could be loaded for {0}")]
    NoEvents(TournamentKey),
}
