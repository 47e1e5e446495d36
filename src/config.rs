use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

use crate::analysis::PeriodClock;
use crate::statsbomb::{FetchOptions, TournamentKey, DEFAULT_DATA_URL};

/// Longest nominal period accepted in `--period-minutes`.
const MAX_PERIOD_MINUTES: u32 = 60;

/// Tournament player dashboard over StatsBomb open data
#[derive(Parser, Debug, Clone)]
#[command(name = "pitchboard", version, about)]
pub struct Config {
    /// Dashboard listen address
    #[arg(long, env = "DASHBOARD_ADDR", default_value = "0.0.0.0:8080")]
    pub dashboard_addr: String,

    /// Open-data base URL (the repository's `data/` directory)
    #[arg(long, env = "STATSBOMB_DATA_URL", default_value = DEFAULT_DATA_URL)]
    pub data_url: String,

    /// Read a local open-data checkout instead of downloading
    #[arg(long, env = "STATSBOMB_DATA_DIR")]
    pub data_dir: Option<String>,

    /// Competition id (55 = UEFA Euro)
    #[arg(long, env = "COMPETITION_ID", default_value = "55")]
    pub competition_id: u32,

    /// Season id (282 = 2024)
    #[arg(long, env = "SEASON_ID", default_value = "282")]
    pub season_id: u32,

    /// Player highlighted in rankings and preselected in the dashboard
    #[arg(
        long,
        env = "TARGET_PLAYER",
        default_value = "Lamine Yamal Nasraoui Ebana"
    )]
    pub target_player: String,

    /// Team reported for players without a team-tagged event
    #[arg(long, env = "TARGET_TEAM", default_value = "Spain")]
    pub target_team: String,

    /// Tournament cache time-to-live in seconds (0 = keep until refreshed)
    #[arg(long, env = "CACHE_TTL_SECS", default_value = "3600")]
    pub cache_ttl_secs: u64,

    /// Concurrent per-match event downloads
    #[arg(long, env = "FETCH_CONCURRENCY", default_value = "8")]
    pub fetch_concurrency: usize,

    /// Retries per failed download
    #[arg(long, env = "FETCH_RETRIES", default_value = "2")]
    pub fetch_retries: u32,

    /// HTTP request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "30")]
    pub request_timeout_secs: u64,

    /// Comma-separated nominal period lengths in minutes; the last one
    /// repeats (e.g. "45,45,15,15" for extra time, "0" for a running clock)
    #[arg(long, env = "PERIOD_MINUTES", default_value = "45")]
    pub period_minutes: String,

    /// Print the target player's report as JSON and exit
    #[arg(long, env = "REPORT", default_value = "false")]
    pub report: bool,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.dashboard_addr.parse::<SocketAddr>().is_err() {
            anyhow::bail!(
                "dashboard_addr '{}' is not a valid socket address",
                self.dashboard_addr
            );
        }
        if self.fetch_concurrency == 0 {
            anyhow::bail!("fetch_concurrency must be at least 1");
        }
        if self.target_player.trim().is_empty() {
            anyhow::bail!("target_player must not be empty");
        }
        let periods = self.period_table()?;
        if let Some(m) = periods.iter().find(|m| **m > MAX_PERIOD_MINUTES) {
            anyhow::bail!(
                "period length {} exceeds {} minutes",
                m,
                MAX_PERIOD_MINUTES
            );
        }
        Ok(())
    }

    fn period_table(&self) -> anyhow::Result<Vec<u32>> {
        let table = self
            .period_minutes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<u32>()
                    .map_err(|_| anyhow::anyhow!("invalid period length '{}'", s))
            })
            .collect::<anyhow::Result<Vec<u32>>>()?;
        if table.is_empty() {
            anyhow::bail!("period_minutes must list at least one period length");
        }
        Ok(table)
    }

    pub fn clock(&self) -> anyhow::Result<PeriodClock> {
        Ok(PeriodClock::from_minutes(&self.period_table()?))
    }

    pub fn tournament(&self) -> TournamentKey {
        TournamentKey::new(self.competition_id, self.season_id)
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_secs > 0).then(|| Duration::from_secs(self.cache_ttl_secs))
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            concurrency: self.fetch_concurrency,
            retries: self.fetch_retries,
            ..FetchOptions::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
