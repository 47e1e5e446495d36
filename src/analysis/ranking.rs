use serde::Serialize;

use super::stats::{PlayerSummary, StatKind};

/// Parameters of a "top N players by statistic" table.
#[derive(Debug, Clone)]
pub struct RankingQuery {
    pub stat: StatKind,
    pub per90: bool,
    pub limit: usize,
    pub min_minutes: f64,
    /// Player to flag in the output (the dashboard's target player).
    pub highlight: Option<String>,
}

impl RankingQuery {
    pub fn new(stat: StatKind) -> Self {
        RankingQuery {
            stat,
            per90: false,
            limit: 10,
            min_minutes: 0.0,
            highlight: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPlayer {
    /// 1-based
    pub rank: usize,
    pub name: String,
    pub team: String,
    pub value: f64,
    pub minutes: f64,
    pub highlighted: bool,
}

/// Rank players by `query.stat`, highest first; ties break on name.
///
/// Players below `min_minutes`, and players without minutes when a per-90
/// value is requested, are left out.
pub fn rank_players(summaries: &[PlayerSummary], query: &RankingQuery) -> Vec<RankedPlayer> {
    let mut rows: Vec<(&PlayerSummary, f64)> = summaries
        .iter()
        .filter(|s| s.minutes >= query.min_minutes)
        .filter_map(|s| s.value_for(query.stat, query.per90).map(|v| (s, v)))
        .collect();

    rows.sort_by(|(a, av), (b, bv)| {
        bv.partial_cmp(av)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });

    rows.into_iter()
        .take(query.limit)
        .enumerate()
        .map(|(i, (s, value))| RankedPlayer {
            rank: i + 1,
            name: s.name.clone(),
            team: s.team.clone(),
            value,
            minutes: s.minutes,
            highlighted: query.highlight.as_deref() == Some(s.name.as_str()),
        })
        .collect()
}
