pub mod minutes;
pub mod ranking;
pub mod stats;
pub mod zscore;

pub use minutes::{compute_minutes, PeriodClock, PlayerMinutes};
pub use ranking::{rank_players, RankingQuery};
pub use stats::{per_90, summarize_players, PlayerSummary, StatKind};
pub use zscore::compare_players;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::statsbomb::models::{Event, Match, TournamentKey};

/// One tournament's events with everything derived from them computed once.
#[derive(Debug, Clone)]
pub struct Tournament {
    pub key: TournamentKey,
    pub matches: Vec<Match>,
    pub events: Vec<Event>,
    pub minutes: PlayerMinutes,
    /// Sorted by player name.
    pub summaries: Vec<PlayerSummary>,
    pub loaded_at: DateTime<Utc>,
}

/// Outcome of looking a player up by a possibly inexact name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolved {
    pub name: String,
    /// False when the name was found through the loose first/last-name match.
    pub exact: bool,
}

/// Per-90 values of the counting statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Per90 {
    pub goals: f64,
    pub shots: f64,
    pub xg: f64,
    pub assists: f64,
    pub passes_completed: f64,
    pub dribbles_completed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerReport {
    pub requested: String,
    pub exact: bool,
    pub summary: PlayerSummary,
    /// `None` for a player without minutes.
    pub per90: Option<Per90>,
}

impl Tournament {
    pub fn build(
        key: TournamentKey,
        matches: Vec<Match>,
        events: Vec<Event>,
        clock: &PeriodClock,
        fallback_team: &str,
    ) -> Self {
        let minutes = compute_minutes(&events, clock);
        let summaries = summarize_players(&events, &minutes, fallback_team);
        Tournament {
            key,
            matches,
            events,
            minutes,
            summaries,
            loaded_at: Utc::now(),
        }
    }

    pub fn player_names(&self) -> impl Iterator<Item = &str> {
        self.summaries.iter().map(|s| s.name.as_str())
    }

    pub fn summary(&self, name: &str) -> Option<&PlayerSummary> {
        self.summaries
            .binary_search_by(|s| s.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.summaries[i])
    }

    pub fn player_events<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        self.events
            .iter()
            .filter(move |e| e.player_name() == Some(name))
    }

    /// Names in the order they first act in the event stream, followed by
    /// players who only appear in a lineup. May repeat names.
    fn names_by_appearance(&self) -> impl Iterator<Item = &str> + '_ {
        self.events
            .iter()
            .filter_map(|e| e.player_name())
            .chain(self.player_names())
    }

    /// Exact name, then case-insensitive name, then the first player (in
    /// event order) whose name contains the query's first or last word.
    pub fn resolve_player(&self, query: &str) -> Option<Resolved> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        if self.summary(query).is_some() {
            return Some(Resolved {
                name: query.to_string(),
                exact: true,
            });
        }

        let lowered = query.to_lowercase();
        if let Some(name) = self.names_by_appearance().find(|n| n.to_lowercase() == lowered) {
            return Some(Resolved {
                name: name.to_string(),
                exact: true,
            });
        }

        let words: Vec<&str> = lowered.split_whitespace().collect();
        let (first, last) = (*words.first()?, *words.last()?);
        self.names_by_appearance()
            .find(|n| {
                let candidate = n.to_lowercase();
                (candidate.contains(first) || candidate.contains(last)) && self.summary(n).is_some()
            })
            .map(|n| Resolved {
                name: n.to_string(),
                exact: false,
            })
    }

    pub fn report(&self, query: &str) -> Option<PlayerReport> {
        let resolved = self.resolve_player(query)?;
        let summary = self.summary(&resolved.name)?.clone();
        let per90 = (summary.minutes > 0.0).then(|| {
            let scale = |v: f64| per_90(v, summary.minutes).unwrap_or(0.0);
            Per90 {
                goals: scale(summary.goals as f64),
                shots: scale(summary.shots as f64),
                xg: scale(summary.xg),
                assists: scale(summary.assists as f64),
                passes_completed: scale(summary.passes_completed as f64),
                dribbles_completed: scale(summary.dribbles_completed as f64),
            }
        });
        Some(PlayerReport {
            requested: query.to_string(),
            exact: resolved.exact,
            summary,
            per90,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statsbomb::models::{Named, ShotDetail};
    use approx::assert_relative_eq;

    fn named(name: &str) -> Named {
        Named {
            id: None,
            name: name.to_string(),
        }
    }

    fn goal(player: &str, minute: u32) -> Event {
        Event {
            match_id: 1,
            period: Some(1),
            minute: Some(minute),
            second: Some(0),
            event_type: named("Shot"),
            team: Some(named("Spain")),
            player: Some(named(player)),
            shot: Some(ShotDetail {
                end_location: None,
                outcome: Some(named("Goal")),
                statsbomb_xg: Some(0.5),
            }),
            ..Default::default()
        }
    }

    fn lineup(players: &[&str]) -> Event {
        Event {
            match_id: 1,
            period: Some(1),
            minute: Some(0),
            second: Some(0),
            event_type: named("Starting XI"),
            tactics: Some(crate::statsbomb::models::Tactics {
                formation: None,
                lineup: players
                    .iter()
                    .map(|p| crate::statsbomb::models::LineupEntry {
                        player: named(p),
                        position: None,
                        jersey_number: None,
                    })
                    .collect(),
            }),
            ..Default::default()
        }
    }

    fn tournament() -> Tournament {
        let events = vec![
            lineup(&["Lamine Yamal Nasraoui Ebana", "Dani Olmo Carvajal"]),
            goal("Lamine Yamal Nasraoui Ebana", 21),
            goal("Dani Olmo Carvajal", 45),
        ];
        Tournament::build(
            TournamentKey::new(55, 282),
            vec![],
            events,
            &PeriodClock::default(),
            "Spain",
        )
    }

    #[test]
    fn resolves_exact_case_insensitive_and_loose_names() {
        let t = tournament();
        assert_eq!(
            t.resolve_player("Dani Olmo Carvajal"),
            Some(Resolved {
                name: "Dani Olmo Carvajal".into(),
                exact: true
            })
        );
        assert!(t.resolve_player("dani olmo carvajal").unwrap().exact);

        let loose = t.resolve_player("Lamine Yamal").unwrap();
        assert_eq!(loose.name, "Lamine Yamal Nasraoui Ebana");
        assert!(!loose.exact);

        assert_eq!(t.resolve_player("Kylian Mbappé"), None);
        assert_eq!(t.resolve_player("   "), None);
    }

    #[test]
    fn loose_match_prefers_first_player_to_act() {
        let events = vec![
            lineup(&["Nico Williams Arthuer", "Iñaki Williams Arthuer", "Unai Simón Mendibil"]),
            goal("Nico Williams Arthuer", 10),
            goal("Iñaki Williams Arthuer", 30),
        ];
        let t = Tournament::build(
            TournamentKey::new(55, 282),
            vec![],
            events,
            &PeriodClock::default(),
            "Spain",
        );
        // Alphabetically Iñaki comes first.
        assert_eq!(t.player_names().next(), Some("Iñaki Williams Arthuer"));
        assert_eq!(t.resolve_player("Williams").unwrap().name, "Nico Williams Arthuer");

        // Lineup-only players are still reachable.
        let keeper = t.resolve_player("Unai Simón").unwrap();
        assert_eq!(keeper.name, "Unai Simón Mendibil");
        assert!(!keeper.exact);
    }

    #[test]
    fn report_includes_minutes_and_per90() {
        let t = tournament();
        let report = t.report("Lamine Yamal").unwrap();
        assert_eq!(report.summary.goals, 1);
        // Match ends with the last event at minute 45.
        assert_relative_eq!(report.summary.minutes, 45.0);
        let per90 = report.per90.unwrap();
        assert_relative_eq!(per90.goals, 2.0);
        assert_relative_eq!(per90.xg, 1.0);
        assert!(!report.exact);
        assert_eq!(report.requested, "Lamine Yamal");
    }

    #[test]
    fn player_events_filters_by_name() {
        let t = tournament();
        assert_eq!(t.player_events("Dani Olmo Carvajal").count(), 1);
        assert_eq!(t.player_events("nobody").count(), 0);
        assert_eq!(t.player_names().count(), 2);
    }
}
