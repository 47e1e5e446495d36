use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::analysis::{
    compare_players, rank_players, RankingQuery, StatKind, Tournament,
};
use crate::pitch::{escape_xml, render_map, MapKind};
use crate::statsbomb::{CacheStatus, DataError, TournamentCache, TournamentKey};

type ApiError = (StatusCode, String);

/// Statistics compared when `/api/compare` gets no `stats` parameter.
const DEFAULT_COMPARE_STATS: [StatKind; 5] = [
    StatKind::Goals,
    StatKind::Shots,
    StatKind::Xg,
    StatKind::PassSuccessRate,
    StatKind::DribbleSuccessRate,
];

#[derive(Clone)]
pub struct AppState {
    pub cache: TournamentCache,
    pub key: TournamentKey,
    pub target_player: String,
}

/// Build the Axum router for the dashboard.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/status", get(status_handler))
        .route("/api/matches", get(matches_handler))
        .route("/api/players", get(players_handler))
        .route("/api/players/:name", get(player_handler))
        .route("/api/players/:name/maps/:kind", get(map_handler))
        .route("/api/rankings", get(rankings_handler))
        .route("/api/compare", get(compare_handler))
        .route("/api/refresh", post(refresh_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

fn upstream(e: DataError) -> ApiError {
    warn!("Tournament data unavailable: {}", e);
    (StatusCode::BAD_GATEWAY, e.to_string())
}

fn not_found(what: impl Into<String>) -> ApiError {
    (StatusCode::NOT_FOUND, what.into())
}

fn bad_request(e: impl ToString) -> ApiError {
    (StatusCode::BAD_REQUEST, e.to_string())
}

impl AppState {
    async fn tournament(&self) -> Result<Arc<Tournament>, ApiError> {
        self.cache.get(self.key).await.map_err(upstream)
    }
}

/// Comma-separated query value; blanks dropped.
fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_stats(raw: Option<&str>) -> Result<Vec<StatKind>, ApiError> {
    let names = split_list(raw);
    if names.is_empty() {
        return Ok(DEFAULT_COMPARE_STATS.to_vec());
    }
    names
        .iter()
        .map(|s| s.parse::<StatKind>().map_err(bad_request))
        .collect()
}

/// Serve the dashboard page with the target player injected.
async fn index_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let html = DASHBOARD_HTML.replace(
        "<body>",
        &format!(
            r#"<body data-target="{}">"#,
            escape_xml(&state.target_player)
        ),
    );
    Html(html)
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    #[serde(flatten)]
    cache: CacheStatus,
    target_player: String,
    matches: usize,
    events: usize,
    players: usize,
    /// Players that appeared in a lineup or came on as a substitute.
    players_with_minutes: usize,
}

async fn status_response(state: &AppState, t: &Tournament) -> StatusResponse {
    StatusResponse {
        cache: state.cache.status(state.key).await,
        target_player: state.target_player.clone(),
        matches: t.matches.len(),
        events: t.events.len(),
        players: t.summaries.len(),
        players_with_minutes: t.minutes.len(),
    }
}

/// GET /api/status
async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let t = state.tournament().await?;
    Ok(Json(status_response(&state, &t).await))
}

/// POST /api/refresh
async fn refresh_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let t = state.cache.refresh(state.key).await.map_err(upstream)?;
    Ok(Json(status_response(&state, &t).await))
}

#[derive(Debug, Serialize)]
struct MatchRow {
    match_id: u64,
    date: Option<String>,
    stage: Option<String>,
    label: String,
}

/// GET /api/matches
async fn matches_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let t = state.tournament().await?;
    let rows: Vec<MatchRow> = t
        .matches
        .iter()
        .map(|m| MatchRow {
            match_id: m.match_id,
            date: m.match_date.clone(),
            stage: m.competition_stage.as_ref().map(|s| s.name.clone()),
            label: m.label(),
        })
        .collect();
    Ok(Json(rows))
}

#[derive(Debug, Serialize)]
struct PlayerRow {
    name: String,
    team: String,
    minutes: f64,
}

/// GET /api/players
async fn players_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let t = state.tournament().await?;
    let rows: Vec<PlayerRow> = t
        .summaries
        .iter()
        .map(|s| PlayerRow {
            name: s.name.clone(),
            team: s.team.clone(),
            minutes: s.minutes,
        })
        .collect();
    Ok(Json(rows))
}

/// GET /api/players/:name
async fn player_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let t = state.tournament().await?;
    t.report(&name)
        .map(Json)
        .ok_or_else(|| not_found(format!("no player matching '{}'", name)))
}

/// GET /api/players/:name/maps/:kind
async fn map_handler(
    State(state): State<Arc<AppState>>,
    Path((name, kind)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let kind: MapKind = kind.parse().map_err(not_found)?;
    let t = state.tournament().await?;
    let resolved = t
        .resolve_player(&name)
        .ok_or_else(|| not_found(format!("no player matching '{}'", name)))?;
    let events: Vec<_> = t.player_events(&resolved.name).collect();
    let svg = render_map(kind, &resolved.name, &events)
        .ok_or_else(|| not_found(format!("no {} data for {}", kind, resolved.name)))?;
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg))
}

#[derive(Debug, Default, Deserialize)]
struct RankingParams {
    stat: Option<String>,
    limit: Option<usize>,
    per90: Option<bool>,
    min_minutes: Option<f64>,
}

/// GET /api/rankings?stat=xg&limit=10&per90=false&min_minutes=0
async fn rankings_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RankingParams>,
) -> Result<impl IntoResponse, ApiError> {
    let stat = match params.stat.as_deref() {
        Some(s) if !s.trim().is_empty() => s.parse::<StatKind>().map_err(bad_request)?,
        _ => StatKind::Xg,
    };
    let t = state.tournament().await?;
    let mut query = RankingQuery::new(stat);
    query.per90 = params.per90.unwrap_or(false);
    query.limit = params.limit.unwrap_or(query.limit);
    query.min_minutes = params.min_minutes.unwrap_or(0.0);
    query.highlight = t
        .resolve_player(&state.target_player)
        .map(|r| r.name);
    Ok(Json(rank_players(&t.summaries, &query)))
}

#[derive(Debug, Default, Deserialize)]
struct CompareParams {
    players: Option<String>,
    stats: Option<String>,
    per90: Option<bool>,
    min_minutes: Option<f64>,
}

/// GET /api/compare?players=a,b&stats=goals,xg&per90=true
async fn compare_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CompareParams>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = parse_stats(params.stats.as_deref())?;
    let mut requested = split_list(params.players.as_deref());
    if requested.is_empty() {
        requested.push(state.target_player.clone());
    }
    let t = state.tournament().await?;
    let names: Vec<String> = requested
        .iter()
        .filter_map(|q| t.resolve_player(q).map(|r| r.name))
        .collect();
    if names.is_empty() {
        return Err(not_found(format!(
            "no player matching {}",
            requested.join(", ")
        )));
    }
    Ok(Json(compare_players(
        &t.summaries,
        &names,
        &stats,
        params.per90.unwrap_or(false),
        params.min_minutes.unwrap_or(0.0),
    )))
}

/// Embedded single-file dashboard (HTML + CSS + JS)
const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Pitchboard</title>
<style>
  :root {
    --bg: #0f1117;
    --card: #1a1d27;
    --border: #2a2d3a;
    --accent: #6c63ff;
    --green: #00c896;
    --red: #ff4f6a;
    --gold: #f5c542;
    --text: #e0e0e0;
    --muted: #8888aa;
  }
  * { box-sizing: border-box; margin: 0; padding: 0; }
  body { background: var(--bg); color: var(--text); font-family: 'Segoe UI', system-ui, sans-serif; }
  header { display: flex; align-items: center; gap: 1rem; padding: 1rem 2rem; border-bottom: 1px solid var(--border); }
  header h1 { font-size: 1.4rem; font-weight: 700; }
  select, input { background: var(--card); color: var(--text); border: 1px solid var(--border); border-radius: 6px; padding: .3rem .5rem; font-size: .85rem; }
  main { padding: 1.5rem 2rem; display: grid; gap: 1.5rem; }
  .note { color: #ff9800; font-size: .85rem; }
  .stats-grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(160px, 1fr)); gap: 1rem; }
  .stat-card { background: var(--card); border: 1px solid var(--border); border-radius: 10px; padding: 1.2rem; }
  .stat-card .label { color: var(--muted); font-size: .8rem; text-transform: uppercase; letter-spacing: .06em; margin-bottom: .4rem; }
  .stat-card .value { font-size: 1.7rem; font-weight: 700; }
  .stat-card .sub { color: var(--muted); font-size: .75rem; margin-top: .3rem; }
  .panel { background: var(--card); border: 1px solid var(--border); border-radius: 10px; overflow: hidden; }
  .panel-header { padding: .9rem 1.2rem; border-bottom: 1px solid var(--border); font-weight: 600; display: flex; justify-content: space-between; align-items: center; gap: .6rem; }
  .controls { display: flex; gap: .6rem; align-items: center; font-weight: 400; font-size: .85rem; }
  .maps { display: grid; grid-template-columns: 1fr 1fr; gap: 1rem; padding: 1rem; }
  .maps figure { background: #fff; border-radius: 8px; min-height: 120px; display: flex; align-items: center; justify-content: center; }
  .maps img { width: 100%; display: block; }
  .maps .nodata { color: #555; font-size: .9rem; }
  @media (max-width: 900px) { .maps { grid-template-columns: 1fr; } }
  .bars { padding: 1rem 1.2rem; display: grid; gap: .45rem; }
  .bar-row { display: grid; grid-template-columns: 220px 1fr 70px; gap: .6rem; align-items: center; font-size: .85rem; }
  .bar { height: 14px; border-radius: 4px; background: var(--accent); }
  .bar-row.hl .bar { background: var(--gold); }
  .bar-row.hl { color: var(--gold); font-weight: 600; }
  table { width: 100%; border-collapse: collapse; }
  th { padding: .7rem 1rem; text-align: left; font-size: .75rem; text-transform: uppercase; color: var(--muted); border-bottom: 1px solid var(--border); }
  td { padding: .65rem 1rem; font-size: .88rem; border-bottom: 1px solid #1e2130; }
  tr:last-child td { border-bottom: none; }
  .pos { color: var(--green); }
  .neg { color: var(--red); }
  .empty { color: var(--muted); text-align: center; padding: 2rem; font-size: .9rem; }
  .refresh-btn { background: none; border: 1px solid var(--border); color: var(--muted); padding: .3rem .8rem; border-radius: 6px; cursor: pointer; font-size: .8rem; }
  .refresh-btn:hover { border-color: var(--accent); color: var(--accent); }
</style>
</head>
<body>
<header>
  <h1>⚽ Pitchboard</h1>
  <select id="player-select"></select>
  <span style="margin-left:auto;color:var(--muted);font-size:.8rem;" id="last-updated"></span>
  <button class="refresh-btn" onclick="refreshData()">↻ Reload data</button>
</header>

<main>
  <div class="note" id="match-note"></div>

  <div class="stats-grid">
    <div class="stat-card"><div class="label">Team</div><div class="value" id="s-team" style="font-size:1.2rem">–</div></div>
    <div class="stat-card"><div class="label">Minutes Played</div><div class="value" id="s-minutes">–</div><div class="sub" id="s-matches"></div></div>
    <div class="stat-card"><div class="label">Goals</div><div class="value" id="s-goals">–</div><div class="sub" id="p-goals"></div></div>
    <div class="stat-card"><div class="label">Shots</div><div class="value" id="s-shots">–</div><div class="sub" id="p-shots"></div></div>
    <div class="stat-card"><div class="label">xG</div><div class="value" id="s-xg">–</div><div class="sub" id="p-xg"></div></div>
    <div class="stat-card"><div class="label">Assists</div><div class="value" id="s-assists">–</div><div class="sub" id="p-assists"></div></div>
    <div class="stat-card"><div class="label">Pass Success</div><div class="value" id="s-pass">–</div><div class="sub" id="p-pass"></div></div>
    <div class="stat-card"><div class="label">Dribble Success</div><div class="value" id="s-dribble">–</div><div class="sub" id="p-dribble"></div></div>
  </div>

  <div class="panel">
    <div class="panel-header">Pitch Maps</div>
    <div class="maps" id="maps"></div>
  </div>

  <div class="panel">
    <div class="panel-header">Rankings
      <span class="controls">
        <select id="rank-stat"></select>
        <label><input type="checkbox" id="rank-per90"> per 90</label>
        <label>min minutes <input type="number" id="rank-min" value="0" min="0" style="width:5rem"></label>
      </span>
    </div>
    <div class="bars" id="rank-bars"><div class="empty">Loading…</div></div>
  </div>

  <div class="panel">
    <div class="panel-header">Z-Score Comparison
      <span class="controls">
        <input id="cmp-players" placeholder="player, player, …" style="width:22rem">
        <label><input type="checkbox" id="cmp-per90"> per 90</label>
        <button class="refresh-btn" onclick="loadCompare()">Compare</button>
      </span>
    </div>
    <table>
      <thead id="cmp-head"></thead>
      <tbody id="cmp-body"><tr><td class="empty">Loading…</td></tr></tbody>
    </table>
  </div>

  <div class="panel">
    <div class="panel-header">Matches <span class="controls" id="status-line"></span></div>
    <table>
      <thead><tr><th>Date</th><th>Stage</th><th>Match</th></tr></thead>
      <tbody id="matches-tbody"><tr><td colspan="3" class="empty">Loading…</td></tr></tbody>
    </table>
  </div>
</main>

<script>
const STATS = [
  ['xg','xG'], ['goals','Goals'], ['shots','Shots'], ['assists','Assists'],
  ['passes_completed','Passes Completed'], ['pass_success_rate','Pass Success %'],
  ['dribbles_completed','Dribbles Completed'], ['dribble_success_rate','Dribble Success %'],
  ['minutes','Minutes'],
];
const MAPS = ['pass', 'shot', 'dribble', 'heatmap'];
const target = document.body.dataset.target;
const num = (v, d = 2) => v == null ? '–' : Number(v).toFixed(d);
const esc = s => String(s).replace(/[&<>"']/g, c => ({'&':'&amp;','<':'&lt;','>':'&gt;','"':'&quot;',"'":'&#39;'}[c]));
const enc = encodeURIComponent;

function currentPlayer() { return document.getElementById('player-select').value || target; }

async function loadPlayers() {
  const r = await fetch('/api/players');
  if (!r.ok) return;
  const players = await r.json();
  const sel = document.getElementById('player-select');
  const keep = sel.value || target;
  sel.innerHTML = players.map(p => `<option value="${esc(p.name)}">${esc(p.name)} (${esc(p.team)})</option>`).join('');
  if (players.some(p => p.name === keep)) sel.value = keep;
}

async function loadPlayer() {
  const name = currentPlayer();
  const r = await fetch('/api/players/' + enc(name));
  const note = document.getElementById('match-note');
  if (!r.ok) { note.textContent = await r.text(); return; }
  const rep = await r.json();
  const s = rep.summary, p = rep.per90 || {};
  note.textContent = rep.exact ? '' : `No exact match for "${rep.requested}", using best match: ${s.name}`;
  document.getElementById('s-team').textContent = s.team;
  document.getElementById('s-minutes').textContent = num(s.minutes, 0);
  document.getElementById('s-matches').textContent = `${s.matches} matches`;
  document.getElementById('s-goals').textContent = s.goals;
  document.getElementById('p-goals').textContent = num(p.goals) + ' / 90';
  document.getElementById('s-shots').textContent = s.shots;
  document.getElementById('p-shots').textContent = num(p.shots) + ' / 90';
  document.getElementById('s-xg').textContent = num(s.xg);
  document.getElementById('p-xg').textContent = num(p.xg) + ' / 90';
  document.getElementById('s-assists').textContent = s.assists;
  document.getElementById('p-assists').textContent = num(p.assists) + ' / 90';
  document.getElementById('s-pass').textContent = num(s.pass_success_pct, 1) + '%';
  document.getElementById('p-pass').textContent = `${s.passes_completed}/${s.passes} · ${num(p.passes_completed)} / 90`;
  document.getElementById('s-dribble').textContent = num(s.dribble_success_pct, 1) + '%';
  document.getElementById('p-dribble').textContent = `${s.dribbles_completed}/${s.dribbles} · ${num(p.dribbles_completed)} / 90`;

  document.getElementById('maps').innerHTML = MAPS.map(k =>
    `<figure><img alt="${k} map" src="/api/players/${enc(s.name)}/maps/${k}"
      onerror="this.parentElement.innerHTML='<span class=nodata>No ${k} data</span>'"></figure>`).join('');
}

async function loadRankings() {
  const stat = document.getElementById('rank-stat').value;
  const per90 = document.getElementById('rank-per90').checked;
  const min = document.getElementById('rank-min').value || 0;
  const r = await fetch(`/api/rankings?stat=${stat}&per90=${per90}&min_minutes=${min}&limit=15`);
  const box = document.getElementById('rank-bars');
  if (!r.ok) { box.innerHTML = `<div class="empty">${esc(await r.text())}</div>`; return; }
  const rows = await r.json();
  if (!rows.length) { box.innerHTML = '<div class="empty">No players qualify</div>'; return; }
  const max = Math.max(...rows.map(x => x.value)) || 1;
  box.innerHTML = rows.map(x => `<div class="bar-row ${x.highlighted ? 'hl' : ''}">
    <span>${x.rank}. ${esc(x.name)}</span>
    <div class="bar" style="width:${Math.max(2, 100 * x.value / max)}%"></div>
    <span>${num(x.value)}</span>
  </div>`).join('');
}

async function loadCompare() {
  const input = document.getElementById('cmp-players');
  if (!input.value) input.value = currentPlayer();
  const per90 = document.getElementById('cmp-per90').checked;
  const r = await fetch(`/api/compare?players=${enc(input.value)}&per90=${per90}`);
  const body = document.getElementById('cmp-body');
  if (!r.ok) { body.innerHTML = `<tr><td class="empty">${esc(await r.text())}</td></tr>`; return; }
  const rows = await r.json();
  if (!rows.length) { body.innerHTML = '<tr><td class="empty">No players</td></tr>'; return; }
  const stats = rows[0].entries.map(e => e.stat);
  document.getElementById('cmp-head').innerHTML =
    `<tr><th>Player</th><th>Minutes</th>${stats.map(s => `<th>${s.replace(/_/g, ' ')}</th>`).join('')}<th>Total Z</th></tr>`;
  const zc = z => z >= 0 ? 'pos' : 'neg';
  body.innerHTML = rows.map(row => `<tr>
    <td>${esc(row.name)}</td><td>${num(row.minutes, 0)}</td>
    ${row.entries.map(e => `<td>${num(e.value)} <span class="${zc(e.z)}">(${num(e.z)})</span></td>`).join('')}
    <td class="${zc(row.total_z)}">${num(row.total_z)}</td>
  </tr>`).join('');
}

async function loadMatches() {
  const [rm, rs] = await Promise.all([fetch('/api/matches'), fetch('/api/status')]);
  if (rs.ok) {
    const s = await rs.json();
    document.getElementById('status-line').textContent =
      `${s.matches} matches · ${s.events} events · ${s.players} players` +
      (s.loaded_at ? ` · loaded ${new Date(s.loaded_at).toLocaleTimeString()}` : '');
  }
  if (!rm.ok) return;
  const matches = await rm.json();
  const tbody = document.getElementById('matches-tbody');
  if (!matches.length) { tbody.innerHTML = '<tr><td colspan="3" class="empty">No matches</td></tr>'; return; }
  tbody.innerHTML = matches.map(m => `<tr>
    <td>${m.date || '–'}</td><td>${esc(m.stage || '–')}</td><td>${esc(m.label)}</td>
  </tr>`).join('');
}

async function loadAll() {
  await loadPlayers();
  await Promise.all([loadPlayer(), loadRankings(), loadCompare(), loadMatches()]);
  document.getElementById('last-updated').textContent = 'Updated ' + new Date().toLocaleTimeString();
}

async function refreshData() {
  document.getElementById('last-updated').textContent = 'Reloading…';
  await fetch('/api/refresh', { method: 'POST' });
  await loadAll();
}

document.getElementById('rank-stat').innerHTML = STATS.map(([k, l]) => `<option value="${k}">${l}</option>`).join('');
document.getElementById('player-select').addEventListener('change', () => {
  document.getElementById('cmp-players').value = '';
  loadPlayer(); loadCompare();
});
['rank-stat', 'rank-per90', 'rank-min'].forEach(id => document.getElementById(id).addEventListener('change', loadRankings));
loadAll();
</script>
</body>
</html>"#;
