use async_trait::async_trait;

use super::error::DataError;
use super::models::{Event, Match, TournamentKey};

/// Where tournament data comes from: the hosted open-data repository or a
/// local checkout of it.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// All matches of a tournament.
    async fn fetch_matches(&self, key: TournamentKey) -> Result<Vec<Match>, DataError>;

    /// Events of one match, `match_id` already tagged.
    async fn fetch_events(&self, match_id: u64) -> Result<Vec<Event>, DataError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// Decode an events file record by record. Records that don't fit the model
/// are dropped rather than failing the whole match.
pub fn decode_events(match_id: u64, body: &[u8]) -> Result<Vec<Event>, DataError> {
    let raw: Vec<serde_json::Value> =
        serde_json::from_slice(body).map_err(|source| DataError::Decode {
            what: format!("events of match {}", match_id),
            source,
        })?;

    let total = raw.len();
    let events: Vec<Event> = raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<Event>(value) {
            Ok(mut ev) => {
                ev.match_id = match_id;
                Some(ev)
            }
            Err(e) => {
                tracing::debug!("Dropping malformed event in match {}: {}", match_id, e);
                None
            }
        })
        .collect();

    if events.len() < total {
        tracing::debug!(
            "Match {}: kept {} of {} events",
            match_id,
            events.len(),
            total
        );
    }
    Ok(events)
}

pub fn decode_matches(key: TournamentKey, body: &[u8]) -> Result<Vec<Match>, DataError> {
    serde_json::from_slice(body).map_err(|source| DataError::Decode {
        what: format!("match list for {}", key),
        source,
    })
}
