use serde::{Deserialize, Serialize};
use std::fmt;

use crate::analysis::minutes::PeriodClock;

/// Identifies one tournament edition in the open-data catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TournamentKey {
    pub competition_id: u32,
    pub season_id: u32,
}

impl TournamentKey {
    pub fn new(competition_id: u32, season_id: u32) -> Self {
        TournamentKey {
            competition_id,
            season_id,
        }
    }
}

impl fmt::Display for TournamentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "competition {} / season {}",
            self.competition_id, self.season_id
        )
    }
}

/// `{ "id": 35, "name": "Starting XI" }` style reference used all over the feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Named {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: String,
}

/// A match from `matches/{competition_id}/{season_id}.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub match_id: u64,
    #[serde(default)]
    pub match_date: Option<String>,
    #[serde(default)]
    pub kick_off: Option<String>,
    pub home_team: TeamRef,
    pub away_team: TeamRef,
    #[serde(default)]
    pub home_score: Option<u32>,
    #[serde(default)]
    pub away_score: Option<u32>,
    #[serde(default)]
    pub competition_stage: Option<Named>,
}

impl Match {
    /// "Spain 2-1 France" or "Spain vs France" when the score is unknown.
    pub fn label(&self) -> String {
        match (self.home_score, self.away_score) {
            (Some(h), Some(a)) => format!(
                "{} {}-{} {}",
                self.home_team.name, h, a, self.away_team.name
            ),
            _ => format!("{} vs {}", self.home_team.name, self.away_team.name),
        }
    }
}

/// Home/away team reference. Upstream prefixes the field names with the side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamRef {
    #[serde(default, alias = "home_team_id", alias = "away_team_id")]
    pub id: Option<u64>,
    #[serde(default, alias = "home_team_name", alias = "away_team_name")]
    pub name: String,
}

/// Structurally significant event types. Everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    StartingXi,
    Substitution,
    Pass,
    Shot,
    Dribble,
    Other,
}

impl EventKind {
    fn from_name(name: &str) -> Self {
        match name {
            "Starting XI" => EventKind::StartingXi,
            "Substitution" => EventKind::Substitution,
            "Pass" => EventKind::Pass,
            "Shot" => EventKind::Shot,
            "Dribble" => EventKind::Dribble,
            _ => EventKind::Other,
        }
    }
}

/// One record from `events/{match_id}.json`.
///
/// Only the fields the dashboard reads are modelled; everything else in the
/// upstream record is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Event {
    /// Not part of the upstream record; tagged by the loader.
    #[serde(default)]
    pub match_id: u64,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub index: Option<u64>,
    #[serde(default)]
    pub period: Option<u32>,
    #[serde(default)]
    pub minute: Option<u32>,
    #[serde(default)]
    pub second: Option<u32>,
    #[serde(rename = "type", default)]
    pub event_type: Named,
    #[serde(default)]
    pub team: Option<Named>,
    #[serde(default)]
    pub player: Option<Named>,
    #[serde(default)]
    pub location: Option<Vec<f64>>,
    #[serde(default)]
    pub tactics: Option<Tactics>,
    #[serde(default)]
    pub substitution: Option<Substitution>,
    #[serde(default)]
    pub pass: Option<PassDetail>,
    #[serde(default)]
    pub shot: Option<ShotDetail>,
    #[serde(default)]
    pub dribble: Option<DribbleDetail>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tactics {
    #[serde(default)]
    pub formation: Option<u32>,
    #[serde(default)]
    pub lineup: Vec<LineupEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineupEntry {
    pub player: Named,
    #[serde(default)]
    pub position: Option<Named>,
    #[serde(default)]
    pub jersey_number: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Substitution {
    #[serde(default)]
    pub replacement: Option<Named>,
    #[serde(default)]
    pub outcome: Option<Named>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PassDetail {
    #[serde(default)]
    pub recipient: Option<Named>,
    #[serde(default)]
    pub end_location: Option<Vec<f64>>,
    /// Absent for completed passes.
    #[serde(default)]
    pub outcome: Option<Named>,
    #[serde(default)]
    pub goal_assist: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShotDetail {
    #[serde(default)]
    pub end_location: Option<Vec<f64>>,
    #[serde(default)]
    pub outcome: Option<Named>,
    #[serde(default)]
    pub statsbomb_xg: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DribbleDetail {
    #[serde(default)]
    pub outcome: Option<Named>,
}

fn xy(coords: &Option<Vec<f64>>) -> Option<(f64, f64)> {
    match coords.as_deref() {
        Some([x, y, ..]) => Some((*x, *y)),
        _ => None,
    }
}

impl Event {
    pub fn kind(&self) -> EventKind {
        EventKind::from_name(&self.event_type.name)
    }

    pub fn player_name(&self) -> Option<&str> {
        self.player
            .as_ref()
            .map(|p| p.name.as_str())
            .filter(|n| !n.is_empty())
    }

    pub fn team_name(&self) -> Option<&str> {
        self.team
            .as_ref()
            .map(|t| t.name.as_str())
            .filter(|n| !n.is_empty())
    }

    pub fn location_xy(&self) -> Option<(f64, f64)> {
        xy(&self.location)
    }

    /// End point of a pass or shot.
    pub fn end_location_xy(&self) -> Option<(f64, f64)> {
        self.pass
            .as_ref()
            .and_then(|p| xy(&p.end_location))
            .or_else(|| self.shot.as_ref().and_then(|s| xy(&s.end_location)))
    }

    /// Normalized match-clock position, `None` when any clock field is missing.
    pub fn elapsed_seconds(&self, clock: &PeriodClock) -> Option<i64> {
        clock.elapsed(self.period?, self.minute?, self.second?)
    }

    /// Player names announced by a `Starting XI` event, in lineup order.
    pub fn lineup_names(&self) -> impl Iterator<Item = &str> {
        self.tactics
            .iter()
            .flat_map(|t| t.lineup.iter())
            .map(|e| e.player.name.as_str())
            .filter(|n| !n.is_empty())
    }

    /// Incoming player of a `Substitution` event.
    pub fn replacement_name(&self) -> Option<&str> {
        self.substitution
            .as_ref()
            .and_then(|s| s.replacement.as_ref())
            .map(|r| r.name.as_str())
            .filter(|n| !n.is_empty())
    }

    pub fn is_goal(&self) -> bool {
        self.kind() == EventKind::Shot
            && self
                .shot
                .as_ref()
                .and_then(|s| s.outcome.as_ref())
                .is_some_and(|o| o.name == "Goal")
    }

    pub fn xg(&self) -> f64 {
        self.shot
            .as_ref()
            .and_then(|s| s.statsbomb_xg)
            .unwrap_or(0.0)
    }

    /// A pass with no outcome recorded is a completed pass.
    pub fn is_complete_pass(&self) -> bool {
        self.kind() == EventKind::Pass
            && self.pass.as_ref().map_or(true, |p| p.outcome.is_none())
    }

    pub fn is_assist(&self) -> bool {
        self.kind() == EventKind::Pass
            && self
                .pass
                .as_ref()
                .and_then(|p| p.goal_assist)
                .unwrap_or(false)
    }

    pub fn dribble_outcome(&self) -> Option<&str> {
        self.dribble
            .as_ref()
            .and_then(|d| d.outcome.as_ref())
            .map(|o| o.name.as_str())
    }

    pub fn is_complete_dribble(&self) -> bool {
        self.kind() == EventKind::Dribble && self.dribble_outcome() == Some("Complete")
    }
}
