//! In-memory tournament cache.
//!
//! Downloading a tournament means one request per match (~50 for a Euro), so
//! built `Tournament`s are kept per `(competition_id, season_id)` and served
//! from memory until their time-to-live runs out or a refresh is requested.
//! Pitch diagrams are rendered per request and never cached.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::error::DataError;
use super::loader::{load_tournament, FetchOptions};
use super::models::TournamentKey;
use super::source::EventSource;
use crate::analysis::{PeriodClock, Tournament};

/// How cached tournaments are built and when they go stale.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    /// `None` keeps entries until `refresh`/`invalidate`.
    pub ttl: Option<Duration>,
    pub fetch: FetchOptions,
    pub clock: PeriodClock,
    pub fallback_team: String,
}

/// Shareable tournament cache; clones share the same entries.
#[derive(Clone)]
pub struct TournamentCache {
    inner: Arc<RwLock<HashMap<TournamentKey, CacheEntry>>>,
    /// Serializes loads so concurrent misses trigger one download.
    load_lock: Arc<Mutex<()>>,
    source: Arc<dyn EventSource>,
    policy: Arc<CachePolicy>,
}

struct CacheEntry {
    tournament: Arc<Tournament>,
    stored_at: Instant,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub competition_id: u32,
    pub season_id: u32,
    pub cached: bool,
    pub loaded_at: Option<DateTime<Utc>>,
    /// `None` when nothing is cached or entries never expire.
    pub expires_in_secs: Option<u64>,
}

impl TournamentCache {
    pub fn new(source: Arc<dyn EventSource>, policy: CachePolicy) -> Self {
        TournamentCache {
            inner: Arc::new(RwLock::new(HashMap::new())),
            load_lock: Arc::new(Mutex::new(())),
            source,
            policy: Arc::new(policy),
        }
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        match self.policy.ttl {
            Some(ttl) => entry.stored_at.elapsed() < ttl,
            None => true,
        }
    }

    async fn cached(&self, key: TournamentKey) -> Option<Arc<Tournament>> {
        let inner = self.inner.read().await;
        inner
            .get(&key)
            .filter(|e| self.is_fresh(e))
            .map(|e| Arc::clone(&e.tournament))
    }

    /// Cached tournament if still fresh, otherwise download and build it.
    pub async fn get(&self, key: TournamentKey) -> Result<Arc<Tournament>, DataError> {
        if let Some(t) = self.cached(key).await {
            return Ok(t);
        }

        let _guard = self.load_lock.lock().await;
        // Another request may have loaded it while we waited.
        if let Some(t) = self.cached(key).await {
            debug!("Tournament {} loaded by a concurrent request", key);
            return Ok(t);
        }
        self.load(key).await
    }

    /// Load again regardless of age. The cached copy is only replaced once
    /// the new load succeeds.
    pub async fn refresh(&self, key: TournamentKey) -> Result<Arc<Tournament>, DataError> {
        let _guard = self.load_lock.lock().await;
        info!("Refreshing tournament {}", key);
        self.load(key).await.map_err(|e| {
            warn!("Refresh of {} failed, keeping any cached copy: {}", key, e);
            e
        })
    }

    pub async fn invalidate(&self, key: TournamentKey) {
        self.inner.write().await.remove(&key);
    }

    async fn load(&self, key: TournamentKey) -> Result<Arc<Tournament>, DataError> {
        let data = load_tournament(self.source.as_ref(), key, &self.policy.fetch).await?;
        let tournament = Arc::new(Tournament::build(
            key,
            data.matches,
            data.events,
            &self.policy.clock,
            &self.policy.fallback_team,
        ));
        info!(
            "Tournament {} ready: {} matches, {} events, {} players",
            key,
            tournament.matches.len(),
            tournament.events.len(),
            tournament.summaries.len()
        );
        self.inner.write().await.insert(
            key,
            CacheEntry {
                tournament: Arc::clone(&tournament),
                stored_at: Instant::now(),
            },
        );
        Ok(tournament)
    }

    pub async fn status(&self, key: TournamentKey) -> CacheStatus {
        let inner = self.inner.read().await;
        let entry = inner.get(&key).filter(|e| self.is_fresh(e));
        CacheStatus {
            competition_id: key.competition_id,
            season_id: key.season_id,
            cached: entry.is_some(),
            loaded_at: entry.map(|e| e.tournament.loaded_at),
            expires_in_secs: entry.and_then(|e| {
                self.policy
                    .ttl
                    .map(|ttl| ttl.saturating_sub(e.stored_at.elapsed()).as_secs())
            }),
        }
    }

    /// Number of cached tournaments, stale ones included.
    #[allow(dead_code)]
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}
