//! Minutes-played reconstruction from a match event log.
//!
//! Each match is replayed in clock order: every player named in a
//! `Starting XI` lineup is on the field from kick-off, substitutions close the
//! outgoing player's interval and open the incoming player's, and whoever is
//! still on the field when the last event of the match happens is closed out
//! at that timestamp.
//!
//! Totals are kept in whole seconds so repeated runs, shuffled input and
//! per-match merges all produce bit-identical minutes.

use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::statsbomb::models::{Event, EventKind};

/// Nominal period length used by the default clock (45 minutes).
pub const DEFAULT_PERIOD_MINUTES: u32 = 45;

/// Maps `(period, minute, second)` onto one monotonically ordered scalar.
///
/// `elapsed = offset(period) + minute * 60 + second`, where `offset(p)` is the
/// summed length of periods `1..p`. Periods past the end of the table reuse
/// its last length, so the default `[45]` table gives
/// `(period - 1) * 2700 + minute * 60 + second`.
///
/// A table of `[0]` yields a continuous clock for feeds whose minute counter
/// already runs on across periods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodClock {
    lengths_secs: Vec<i64>,
}

impl PeriodClock {
    /// Build a clock from nominal period lengths in minutes.
    /// An empty table behaves like the default.
    pub fn from_minutes(lengths: &[u32]) -> Self {
        if lengths.is_empty() {
            return Self::default();
        }
        PeriodClock {
            lengths_secs: lengths.iter().map(|m| i64::from(*m) * 60).collect(),
        }
    }

    /// Two 45-minute halves followed by 15-minute extra-time periods.
    #[allow(dead_code)]
    pub fn with_extra_time() -> Self {
        Self::from_minutes(&[45, 45, 15, 15])
    }

    #[allow(dead_code)]
    pub fn continuous() -> Self {
        Self::from_minutes(&[0])
    }

    /// Seconds elapsed before `period` starts. Periods past the table all
    /// take the last length, so this is constant in `period`.
    pub fn offset(&self, period: u32) -> i64 {
        let before = period.saturating_sub(1) as usize;
        let listed = before.min(self.lengths_secs.len());
        let head: i64 = self.lengths_secs[..listed].iter().sum();
        let last = self.lengths_secs.last().copied().unwrap_or(0);
        head.saturating_add(((before - listed) as i64).saturating_mul(last))
    }

    /// `None` for period 0, which no feed uses.
    pub fn elapsed(&self, period: u32, minute: u32, second: u32) -> Option<i64> {
        if period == 0 {
            return None;
        }
        Some(
            self.offset(period)
                .saturating_add(i64::from(minute) * 60 + i64::from(second)),
        )
    }
}

impl Default for PeriodClock {
    fn default() -> Self {
        PeriodClock {
            lengths_secs: vec![i64::from(DEFAULT_PERIOD_MINUTES) * 60],
        }
    }
}

/// Accumulated time on the field per player.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerMinutes {
    seconds: HashMap<String, i64>,
}

impl PlayerMinutes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Minutes played, `0.0` for a player never seen on the field.
    pub fn minutes(&self, player: &str) -> f64 {
        self.get(player).unwrap_or(0.0)
    }

    /// Minutes played, `None` for a player that appeared in no lineup or substitution.
    pub fn get(&self, player: &str) -> Option<f64> {
        self.seconds.get(player).map(|s| *s as f64 / 60.0)
    }

    #[allow(dead_code)]
    pub fn seconds(&self, player: &str) -> Option<i64> {
        self.seconds.get(player).copied()
    }

    pub fn len(&self) -> usize {
        self.seconds.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.seconds.is_empty()
    }

    #[allow(dead_code)]
    pub fn contains(&self, player: &str) -> bool {
        self.seconds.contains_key(player)
    }

    /// `(player, minutes)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.seconds
            .iter()
            .map(|(name, secs)| (name.as_str(), *secs as f64 / 60.0))
    }

    /// Sorted `player -> minutes` view, e.g. for serialization.
    #[allow(dead_code)]
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        self.iter().map(|(n, m)| (n.to_string(), m)).collect()
    }

    /// Additive merge: per-player totals are summed.
    pub fn merge(&mut self, other: PlayerMinutes) {
        for (name, secs) in other.seconds {
            *self.seconds.entry(name).or_insert(0) += secs;
        }
    }

    fn ensure(&mut self, player: &str) {
        if !self.seconds.contains_key(player) {
            self.seconds.insert(player.to_string(), 0);
        }
    }

    fn add(&mut self, player: &str, secs: i64) {
        *self.seconds.entry(player.to_string()).or_insert(0) += secs;
    }
}

/// An event with a usable timestamp and its position in the caller's input.
#[derive(Debug, Clone, Copy)]
pub struct TimedEvent<'a> {
    pub at: i64,
    pub order: usize,
    pub event: &'a Event,
}

/// Reconstruct minutes played for every player across all matches in `events`.
///
/// Input order does not matter; each match is re-sorted by clock. Events
/// without a usable timestamp are skipped.
pub fn compute_minutes(events: &[Event], clock: &PeriodClock) -> PlayerMinutes {
    let mut totals = PlayerMinutes::new();
    for (match_id, timeline) in partition_by_match(events, clock) {
        debug!("Reconstructing minutes for match {} ({} events)", match_id, timeline.len());
        totals.merge(match_minutes(timeline));
    }
    totals
}

/// Group timestamped events by match. Matches iterate in id order so merges
/// are deterministic.
pub fn partition_by_match<'a>(
    events: &'a [Event],
    clock: &PeriodClock,
) -> BTreeMap<u64, Vec<TimedEvent<'a>>> {
    let mut by_match: BTreeMap<u64, Vec<TimedEvent<'a>>> = BTreeMap::new();
    for (order, event) in events.iter().enumerate() {
        match event.elapsed_seconds(clock) {
            Some(at) => by_match.entry(event.match_id).or_default().push(TimedEvent {
                at,
                order,
                event,
            }),
            None => debug!(
                "Skipping event {:?} in match {}: missing period/minute/second",
                event.id, event.match_id
            ),
        }
    }
    by_match
}

/// Minutes played within a single match.
pub fn match_minutes(mut timeline: Vec<TimedEvent<'_>>) -> PlayerMinutes {
    let mut minutes = PlayerMinutes::new();
    timeline.sort_by_key(|t| (t.at, t.order));

    let Some(match_end) = timeline.last().map(|t| t.at) else {
        return minutes;
    };

    // player -> elapsed second they came on
    let mut on_field: HashMap<&str, i64> = HashMap::new();

    // Lineups first: at equal timestamps a lineup always precedes a substitution.
    for t in timeline.iter().filter(|t| t.event.kind() == EventKind::StartingXi) {
        for name in t.event.lineup_names() {
            if on_field.insert(name, 0).is_some() {
                debug!("{} listed in more than one lineup; keeping kick-off start", name);
            }
            minutes.ensure(name);
        }
    }

    for t in timeline.iter().filter(|t| t.event.kind() == EventKind::Substitution) {
        match t.event.player_name() {
            Some(off) => match on_field.remove(off) {
                Some(since) => minutes.add(off, t.at - since),
                None => debug!(
                    "Substitution at {}s takes off {}, who is not on the field; ignored",
                    t.at, off
                ),
            },
            None => debug!("Substitution at {}s without an outgoing player", t.at),
        }

        if let Some(on) = t.event.replacement_name() {
            if on_field.contains_key(on) {
                debug!("{} substituted on while already on the field; ignored", on);
            } else {
                on_field.insert(on, t.at);
                minutes.ensure(on);
            }
        }
    }

    for (name, since) in on_field {
        minutes.add(name, match_end - since);
    }

    minutes
}
