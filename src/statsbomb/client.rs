use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::error::DataError;
use super::models::{Event, Match, TournamentKey};
use super::source::{decode_events, decode_matches, EventSource};

/// Default location of the StatsBomb open-data repository.
pub const DEFAULT_DATA_URL: &str =
    "https://raw.githubusercontent.com/statsbomb/open-data/master/data";

/// HTTP client for the hosted StatsBomb open-data files.
#[derive(Clone)]
pub struct StatsBombClient {
    http: Client,
    base_url: Url,
}

impl StatsBombClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(StatsBombClient {
            http,
            base_url: parse_base_url(base_url)?,
        })
    }

    fn url_for(&self, path: &str) -> Result<Url, DataError> {
        self.base_url
            .join(path)
            .map_err(|_| DataError::BadUrl(format!("{}{}", self.base_url, path)))
    }

    async fn get_bytes(&self, url: Url) -> Result<Vec<u8>, DataError> {
        debug!("GET {}", url);
        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| DataError::Http {
                url: url.to_string(),
                source,
            })?;

        if !resp.status().is_success() {
            return Err(DataError::Status {
                url: url.to_string(),
                status: resp.status(),
            });
        }

        let body = resp.bytes().await.map_err(|source| DataError::Http {
            url: url.to_string(),
            source,
        })?;
        Ok(body.to_vec())
    }
}

/// `Url::join` replaces the last path segment unless the base ends with `/`.
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Url::parse(&normalized).with_context(|| format!("Invalid data URL: {}", raw))
}

#[async_trait]
impl EventSource for StatsBombClient {
    fn name(&self) -> &str {
        "StatsBomb open data"
    }

    async fn fetch_matches(&self, key: TournamentKey) -> Result<Vec<Match>, DataError> {
        let url = self.url_for(&format!(
            "matches/{}/{}.json",
            key.competition_id, key.season_id
        ))?;
        let body = self.get_bytes(url).await?;
        decode_matches(key, &body)
    }

    async fn fetch_events(&self, match_id: u64) -> Result<Vec<Event>, DataError> {
        let url = self.url_for(&format!("events/{}.json", match_id))?;
        let body = self.get_bytes(url).await?;
        decode_events(match_id, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_open_data_urls() {
        let client = StatsBombClient::new(DEFAULT_DATA_URL, Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.url_for("matches/55/282.json").unwrap().as_str(),
            "https://raw.githubusercontent.com/statsbomb/open-data/master/data/matches/55/282.json"
        );
        assert_eq!(
            client.url_for("events/3942349.json").unwrap().as_str(),
            "https://raw.githubusercontent.com/statsbomb/open-data/master/data/events/3942349.json"
        );
    }

    #[test]
    fn trailing_slash_is_optional() {
        let a = parse_base_url("http://localhost:9000/data").unwrap();
        let b = parse_base_url("http://localhost:9000/data/").unwrap();
        assert_eq!(a, b);
        assert!(parse_base_url("not a url").is_err());
    }
}
