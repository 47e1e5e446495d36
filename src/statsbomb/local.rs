use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::error::DataError;
use super::models::{Event, Match, TournamentKey};
use super::source::{decode_events, decode_matches, EventSource};

/// Reads a local checkout of the open-data repository (its `data/` directory).
pub struct LocalOpenData {
    root: PathBuf,
    name: String,
}

impl LocalOpenData {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let name = format!("local open data ({})", root.display());
        LocalOpenData { root, name }
    }

    async fn read(&self, path: PathBuf) -> Result<Vec<u8>, DataError> {
        tokio::fs::read(&path)
            .await
            .map_err(|source| DataError::Io { path, source })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl EventSource for LocalOpenData {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_matches(&self, key: TournamentKey) -> Result<Vec<Match>, DataError> {
        let path = self
            .root
            .join("matches")
            .join(key.competition_id.to_string())
            .join(format!("{}.json", key.season_id));
        let body = self.read(path).await?;
        decode_matches(key, &body)
    }

    async fn fetch_events(&self, match_id: u64) -> Result<Vec<Event>, DataError> {
        let path = self.root.join("events").join(format!("{}.json", match_id));
        let body = self.read(path).await?;
        decode_events(match_id, &body)
    }
}
