//! Per-player attacking summaries and the statistics they can be compared on.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use super::minutes::PlayerMinutes;
use crate::statsbomb::models::{Event, EventKind};

/// Tournament totals for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub name: String,
    pub team: String,
    /// Matches in which the player has at least one event.
    pub matches: u32,
    pub minutes: f64,
    pub goals: u32,
    pub shots: u32,
    pub xg: f64,
    pub assists: u32,
    pub passes: u32,
    pub passes_completed: u32,
    /// 0–100, 0 when the player attempted no pass.
    pub pass_success_pct: f64,
    pub dribbles: u32,
    pub dribbles_completed: u32,
    /// 0–100, 0 when the player attempted no dribble.
    pub dribble_success_pct: f64,
}

impl PlayerSummary {
    fn empty(name: &str, team: &str) -> Self {
        PlayerSummary {
            name: name.to_string(),
            team: team.to_string(),
            matches: 0,
            minutes: 0.0,
            goals: 0,
            shots: 0,
            xg: 0.0,
            assists: 0,
            passes: 0,
            passes_completed: 0,
            pass_success_pct: 0.0,
            dribbles: 0,
            dribbles_completed: 0,
            dribble_success_pct: 0.0,
        }
    }

    /// Raw value of `stat`.
    pub fn value(&self, stat: StatKind) -> f64 {
        match stat {
            StatKind::Goals => self.goals as f64,
            StatKind::Shots => self.shots as f64,
            StatKind::Xg => self.xg,
            StatKind::Assists => self.assists as f64,
            StatKind::PassesCompleted => self.passes_completed as f64,
            StatKind::PassSuccessRate => self.pass_success_pct,
            StatKind::DribblesCompleted => self.dribbles_completed as f64,
            StatKind::DribbleSuccessRate => self.dribble_success_pct,
            StatKind::Minutes => self.minutes,
        }
    }

    /// Value of `stat`, per 90 minutes for counting stats when `per90` is set.
    /// `None` when a per-90 value is requested for a player without minutes.
    pub fn value_for(&self, stat: StatKind, per90: bool) -> Option<f64> {
        let raw = self.value(stat);
        if per90 && stat.is_counting() {
            per_90(raw, self.minutes)
        } else {
            Some(raw)
        }
    }
}

/// Scale a counted value to a 90-minute rate.
pub fn per_90(value: f64, minutes: f64) -> Option<f64> {
    if minutes > 0.0 {
        Some(value * 90.0 / minutes)
    } else {
        None
    }
}

fn pct(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Build one summary per player that has an event or any minutes played.
/// Sorted by name.
pub fn summarize_players(
    events: &[Event],
    minutes: &PlayerMinutes,
    fallback_team: &str,
) -> Vec<PlayerSummary> {
    let mut by_player: BTreeMap<&str, PlayerSummary> = BTreeMap::new();
    let mut teams: BTreeMap<&str, &str> = BTreeMap::new();
    let mut matches: BTreeMap<&str, HashSet<u64>> = BTreeMap::new();

    for ev in events {
        let Some(name) = ev.player_name() else {
            continue;
        };
        if let Some(team) = ev.team_name() {
            teams.entry(name).or_insert(team);
        }
        matches.entry(name).or_default().insert(ev.match_id);

        let s = by_player
            .entry(name)
            .or_insert_with(|| PlayerSummary::empty(name, fallback_team));

        match ev.kind() {
            EventKind::Shot => {
                s.shots += 1;
                s.xg += ev.xg();
                if ev.is_goal() {
                    s.goals += 1;
                }
            }
            EventKind::Pass => {
                s.passes += 1;
                if ev.is_complete_pass() {
                    s.passes_completed += 1;
                }
                if ev.is_assist() {
                    s.assists += 1;
                }
            }
            EventKind::Dribble => {
                s.dribbles += 1;
                if ev.is_complete_dribble() {
                    s.dribbles_completed += 1;
                }
            }
            _ => {}
        }
    }

    // Unused substitutes named only in a lineup or substitution still get a row.
    for (name, _) in minutes.iter() {
        by_player
            .entry(name)
            .or_insert_with(|| PlayerSummary::empty(name, fallback_team));
    }

    by_player
        .into_iter()
        .map(|(name, mut s)| {
            if let Some(team) = teams.get(name) {
                s.team = team.to_string();
            }
            s.matches = matches.get(name).map_or(0, |m| m.len() as u32);
            s.minutes = minutes.minutes(name);
            s.pass_success_pct = pct(s.passes_completed, s.passes);
            s.dribble_success_pct = pct(s.dribbles_completed, s.dribbles);
            s
        })
        .collect()
}

/// Statistics players can be ranked and compared on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    Goals,
    Shots,
    Xg,
    Assists,
    PassesCompleted,
    PassSuccessRate,
    DribblesCompleted,
    DribbleSuccessRate,
    Minutes,
}

impl StatKind {
    pub const ALL: [StatKind; 9] = [
        StatKind::Goals,
        StatKind::Shots,
        StatKind::Xg,
        StatKind::Assists,
        StatKind::PassesCompleted,
        StatKind::PassSuccessRate,
        StatKind::DribblesCompleted,
        StatKind::DribbleSuccessRate,
        StatKind::Minutes,
    ];

    /// Counting stats scale with playing time; rates and minutes do not.
    pub fn is_counting(self) -> bool {
        !matches!(
            self,
            StatKind::PassSuccessRate | StatKind::DribbleSuccessRate | StatKind::Minutes
        )
    }

    pub fn key(self) -> &'static str {
        match self {
            StatKind::Goals => "goals",
            StatKind::Shots => "shots",
            StatKind::Xg => "xg",
            StatKind::Assists => "assists",
            StatKind::PassesCompleted => "passes_completed",
            StatKind::PassSuccessRate => "pass_success_rate",
            StatKind::DribblesCompleted => "dribbles_completed",
            StatKind::DribbleSuccessRate => "dribble_success_rate",
            StatKind::Minutes => "minutes",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatKind::Goals => "Goals",
            StatKind::Shots => "Total Shots",
            StatKind::Xg => "Total xG",
            StatKind::Assists => "Assists",
            StatKind::PassesCompleted => "Passes Completed",
            StatKind::PassSuccessRate => "Pass Success Rate (%)",
            StatKind::DribblesCompleted => "Dribbles Completed",
            StatKind::DribbleSuccessRate => "Dribble Success Rate (%)",
            StatKind::Minutes => "Minutes Played",
        }
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown statistic '{0}'")]
pub struct UnknownStat(pub String);

impl FromStr for StatKind {
    type Err = UnknownStat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['-', ' '], "_");
        StatKind::ALL
            .into_iter()
            .find(|k| k.key() == wanted)
            .ok_or_else(|| UnknownStat(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::minutes::{compute_minutes, PeriodClock};
    use crate::statsbomb::models::{DribbleDetail, Named, PassDetail, ShotDetail};
    use approx::assert_relative_eq;

    fn named(name: &str) -> Named {
        Named {
            id: None,
            name: name.to_string(),
        }
    }

    fn action(match_id: u64, player: &str, kind: &str) -> Event {
        Event {
            match_id,
            period: Some(1),
            minute: Some(10),
            second: Some(0),
            event_type: named(kind),
            team: Some(named("Spain")),
            player: Some(named(player)),
            location: Some(vec![60.0, 40.0]),
            ..Default::default()
        }
    }

    fn shot(player: &str, xg: f64, outcome: &str) -> Event {
        let mut ev = action(1, player, "Shot");
        ev.shot = Some(ShotDetail {
            end_location: None,
            outcome: Some(named(outcome)),
            statsbomb_xg: Some(xg),
        });
        ev
    }

    fn pass(match_id: u64, player: &str, outcome: Option<&str>, assist: bool) -> Event {
        let mut ev = action(match_id, player, "Pass");
        ev.pass = Some(PassDetail {
            recipient: None,
            end_location: Some(vec![80.0, 30.0]),
            outcome: outcome.map(named),
            goal_assist: assist.then_some(true),
        });
        ev
    }

    fn dribble(player: &str, outcome: &str) -> Event {
        let mut ev = action(1, player, "Dribble");
        ev.dribble = Some(DribbleDetail {
            outcome: Some(named(outcome)),
        });
        ev
    }

    #[test]
    fn summarizes_attacking_stats() {
        let events = vec![
            shot("Yamal", 0.3, "Goal"),
            shot("Yamal", 0.05, "Saved"),
            pass(1, "Yamal", None, true),
            pass(1, "Yamal", None, false),
            pass(2, "Yamal", Some("Incomplete"), false),
            dribble("Yamal", "Complete"),
            dribble("Yamal", "Incomplete"),
            dribble("Yamal", "Incomplete"),
        ];
        let summaries = summarize_players(&events, &PlayerMinutes::new(), "Spain");
        assert_eq!(summaries.len(), 1);
        let s = &summaries[0];
        assert_eq!(s.goals, 1);
        assert_eq!(s.shots, 2);
        assert_relative_eq!(s.xg, 0.35, epsilon = 1e-12);
        assert_eq!(s.assists, 1);
        assert_eq!(s.passes, 3);
        assert_eq!(s.passes_completed, 2);
        assert_relative_eq!(s.pass_success_pct, 200.0 / 3.0, epsilon = 1e-9);
        assert_eq!(s.dribbles_completed, 1);
        assert_relative_eq!(s.dribble_success_pct, 100.0 / 3.0, epsilon = 1e-9);
        assert_eq!(s.matches, 2);
        assert_eq!(s.team, "Spain");
    }

    #[test]
    fn rates_are_zero_without_attempts() {
        let events = vec![shot("Striker", 0.1, "Off T")];
        let s = &summarize_players(&events, &PlayerMinutes::new(), "Spain")[0];
        assert_relative_eq!(s.pass_success_pct, 0.0);
        assert_relative_eq!(s.dribble_success_pct, 0.0);
    }

    #[test]
    fn lineup_only_players_get_a_row_with_fallback_team() {
        let mut xi = action(1, "", "Starting XI");
        xi.player = None;
        xi.tactics = Some(crate::statsbomb::models::Tactics {
            formation: None,
            lineup: vec![crate::statsbomb::models::LineupEntry {
                player: named("Keeper"),
                position: None,
                jersey_number: None,
            }],
        });
        let mut end = action(1, "Other", "Pass");
        end.minute = Some(90);
        let events = vec![xi, end];
        let minutes = compute_minutes(&events, &PeriodClock::default());
        let summaries = summarize_players(&events, &minutes, "Spain");
        let keeper = summaries.iter().find(|s| s.name == "Keeper").unwrap();
        assert_relative_eq!(keeper.minutes, 90.0);
        assert_eq!(keeper.team, "Spain");
        assert_eq!(keeper.matches, 0);
        // Sorted by name.
        assert_eq!(summaries[0].name, "Keeper");
    }

    #[test]
    fn per_90_scales_counting_stats_only() {
        let mut s = PlayerSummary::empty("A", "Spain");
        s.goals = 3;
        s.minutes = 270.0;
        s.pass_success_pct = 80.0;
        assert_relative_eq!(s.value_for(StatKind::Goals, true).unwrap(), 1.0);
        assert_relative_eq!(s.value_for(StatKind::PassSuccessRate, true).unwrap(), 80.0);
        assert_relative_eq!(s.value_for(StatKind::Minutes, true).unwrap(), 270.0);

        s.minutes = 0.0;
        assert_eq!(s.value_for(StatKind::Goals, true), None);
        assert_relative_eq!(s.value_for(StatKind::Goals, false).unwrap(), 3.0);
        assert_eq!(per_90(1.0, -5.0), None);
    }

    #[test]
    fn stat_kind_parses_keys_and_variants() {
        assert_eq!("xg".parse::<StatKind>().unwrap(), StatKind::Xg);
        assert_eq!(
            "Pass-Success-Rate".parse::<StatKind>().unwrap(),
            StatKind::PassSuccessRate
        );
        assert_eq!(
            "dribbles completed".parse::<StatKind>().unwrap(),
            StatKind::DribblesCompleted
        );
        let err = "tackles".parse::<StatKind>().unwrap_err();
        assert_eq!(err.to_string(), "unknown statistic 'tackles'");
        for kind in StatKind::ALL {
            assert_eq!(kind.key().parse::<StatKind>().unwrap(), kind);
        }
    }
}
