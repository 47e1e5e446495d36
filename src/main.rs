use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

mod analysis;
mod config;
mod dashboard;
mod pitch;
mod statsbomb;

use config::Config;
use dashboard::AppState;
use statsbomb::{CachePolicy, EventSource, LocalOpenData, StatsBombClient, TournamentCache};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let source: Arc<dyn EventSource> = match &config.data_dir {
        Some(dir) => Arc::new(LocalOpenData::new(dir)),
        None => Arc::new(
            StatsBombClient::new(&config.data_url, config.request_timeout())
                .context("building open-data client")?,
        ),
    };
    let key = config.tournament();
    info!("Tournament {} from {}", key, source.name());

    let cache = TournamentCache::new(
        source,
        CachePolicy {
            ttl: config.cache_ttl(),
            fetch: config.fetch_options(),
            clock: config.clock()?,
            fallback_team: config.target_team.clone(),
        },
    );

    if config.report {
        let tournament = cache
            .get(key)
            .await
            .with_context(|| format!("loading {}", key))?;
        let report = tournament
            .report(&config.target_player)
            .with_context(|| format!("no player matching '{}'", config.target_player))?;
        if !report.exact {
            warn!(
                "No exact match for '{}', using best match: {}",
                config.target_player, report.summary.name
            );
        }
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    // Warm the cache so the first page view doesn't wait on ~50 downloads.
    let warm = cache.clone();
    tokio::spawn(async move {
        if let Err(e) = warm.get(key).await {
            warn!("Initial tournament load failed, will retry on request: {}", e);
        }
    });

    let app = dashboard::router(AppState {
        cache,
        key,
        target_player: config.target_player.clone(),
    });
    let addr: SocketAddr = config.dashboard_addr.parse()?;
    info!("Dashboard listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run dashboard server (blocks until shutdown)
    axum::serve(listener, app).await?;

    Ok(())
}
