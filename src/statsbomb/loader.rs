use futures_util::stream::{self, StreamExt};
use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};

use super::error::DataError;
use super::models::{Event, Match, TournamentKey};
use super::source::EventSource;

/// How per-match downloads are scheduled.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Matches downloaded at the same time.
    pub concurrency: usize,
    /// Extra attempts after a failed download.
    pub retries: u32,
    /// First back-off delay; doubled on each retry.
    pub base_backoff: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        FetchOptions {
            concurrency: 8,
            retries: 2,
            base_backoff: Duration::from_millis(500),
        }
    }
}

/// Matches and their concatenated events, both in kick-off order.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub matches: Vec<Match>,
    pub events: Vec<Event>,
}

/// Download a tournament's match list and every match's events.
///
/// A match whose events cannot be fetched after all retries is skipped with
/// a warning. Only a missing match list, or no match loading at all, fails.
pub async fn load_tournament(
    source: &dyn EventSource,
    key: TournamentKey,
    options: &FetchOptions,
) -> Result<LoadedData, DataError> {
    let mut matches = source.fetch_matches(key).await?;
    matches.sort_by(|a, b| {
        a.match_date
            .cmp(&b.match_date)
            .then(a.match_id.cmp(&b.match_id))
    });
    info!(
        "Fetching events for {} matches of {} from {}",
        matches.len(),
        key,
        source.name()
    );

    // Owned ids keep the download futures `Send` for spawned tasks.
    let ids: Vec<u64> = matches.iter().map(|m| m.match_id).collect();
    let results: Vec<(u64, Result<Vec<Event>, DataError>)> = stream::iter(ids)
        .map(|match_id| async move {
            (
                match_id,
                fetch_with_retry(source, match_id, options).await,
            )
        })
        .buffered(options.concurrency.max(1))
        .collect()
        .await;

    let mut loaded = Vec::with_capacity(matches.len());
    let mut events = Vec::new();
    for (m, (match_id, result)) in matches.into_iter().zip(results) {
        debug_assert_eq!(m.match_id, match_id);
        match result {
            Ok(evs) => {
                events.extend(evs);
                loaded.push(m);
            }
            Err(e) => warn!("Could not load events for match {}: {}", match_id, e),
        }
    }

    if loaded.is_empty() {
        return Err(DataError::NoEvents(key));
    }

    info!(
        "Loaded {} events from {} matches of {}",
        events.len(),
        loaded.len(),
        key
    );
    Ok(LoadedData {
        matches: loaded,
        events,
    })
}

async fn fetch_with_retry(
    source: &dyn EventSource,
    match_id: u64,
    options: &FetchOptions,
) -> Result<Vec<Event>, DataError> {
    let mut attempt = 0u32;
    loop {
        match source.fetch_events(match_id).await {
            Ok(events) => return Ok(events),
            Err(e) if attempt < options.retries => {
                let delay = backoff_delay(options.base_backoff, attempt);
                warn!(
                    "Match {} attempt {} failed ({}); retrying in {:?}",
                    match_id,
                    attempt + 1,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Exponential back-off with up to 25% random jitter.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let exp = base.saturating_mul(1u32 << attempt.min(6));
    let jitter_ms = exp.as_millis() as u64 / 4;
    let jitter = if jitter_ms == 0 {
        0
    } else {
        rand::thread_rng().gen_range(0..=jitter_ms)
    };
    exp + Duration::from_millis(jitter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statsbomb::local::{tests::write_fixture, LocalOpenData};
    use crate::statsbomb::models::{Named, TeamRef};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Serves canned matches; each match fails a configured number of times first.
    struct FlakySource {
        failures: Mutex<HashMap<u64, u32>>,
        calls: AtomicU32,
    }

    fn fixture_match(id: u64, date: &str) -> Match {
        Match {
            match_id: id,
            match_date: Some(date.to_string()),
            kick_off: None,
            home_team: TeamRef {
                id: None,
                name: "Spain".into(),
            },
            away_team: TeamRef {
                id: None,
                name: "Georgia".into(),
            },
            home_score: None,
            away_score: None,
            competition_stage: None,
        }
    }

    #[async_trait]
    impl EventSource for FlakySource {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn fetch_matches(&self, _key: TournamentKey) -> Result<Vec<Match>, DataError> {
            Ok(vec![
                fixture_match(30, "2024-06-30"),
                fixture_match(10, "2024-06-14"),
                fixture_match(20, "2024-06-20"),
            ])
        }

        async fn fetch_events(&self, match_id: u64) -> Result<Vec<Event>, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut failures = self.failures.lock().unwrap();
            let left = failures.entry(match_id).or_insert(0);
            if *left > 0 {
                *left -= 1;
                return Err(DataError::NoEvents(TournamentKey::new(0, 0)));
            }
            Ok(vec![Event {
                match_id,
                event_type: Named {
                    id: None,
                    name: "Pass".into(),
                },
                ..Default::default()
            }])
        }
    }

    fn fast() -> FetchOptions {
        FetchOptions {
            concurrency: 2,
            retries: 1,
            base_backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn retries_then_skips_failed_matches() {
        let source = FlakySource {
            failures: Mutex::new(HashMap::from([(20, 1), (30, 5)])),
            calls: AtomicU32::new(0),
        };
        let data = load_tournament(&source, TournamentKey::new(55, 282), &fast())
            .await
            .unwrap();
        let ids: Vec<u64> = data.matches.iter().map(|m| m.match_id).collect();
        assert_eq!(ids, vec![10, 20]);
        let event_ids: Vec<u64> = data.events.iter().map(|e| e.match_id).collect();
        assert_eq!(event_ids, vec![10, 20]);
        // 10: 1 call, 20: 2 calls, 30: 2 calls (retries exhausted).
        assert_eq!(source.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn no_loadable_match_is_an_error() {
        let source = FlakySource {
            failures: Mutex::new(HashMap::from([(10, 9), (20, 9), (30, 9)])),
            calls: AtomicU32::new(0),
        };
        let err = load_tournament(&source, TournamentKey::new(55, 282), &fast())
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::NoEvents(k) if k == TournamentKey::new(55, 282)));
    }

    #[tokio::test]
    async fn loads_local_fixture_in_date_order() {
        let root = write_fixture("loader");
        let source = LocalOpenData::new(&root);
        let data = load_tournament(&source, TournamentKey::new(55, 282), &fast())
            .await
            .unwrap();
        assert_eq!(data.matches.len(), 1);
        assert_eq!(data.matches[0].match_id, 1);
        assert_eq!(data.events.len(), 3);
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn backoff_grows_with_bounded_jitter() {
        let base = Duration::from_millis(100);
        for attempt in 0..4 {
            let d = backoff_delay(base, attempt);
            let floor = base * (1 << attempt);
            assert!(d >= floor && d <= floor + floor / 4, "attempt {}: {:?}", attempt, d);
        }
    }
}
