// Z-score comparison of selected players against the tournament pool.

use serde::Serialize;

use super::stats::{PlayerSummary, StatKind};

/// Mean and standard deviation of one statistic across the player pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PoolStats {
    pub mean: f64,
    pub stdev: f64,
}

/// Threshold below which standard deviation is treated as zero.
const STDEV_EPSILON: f64 = 1e-9;

/// Population mean and standard deviation (N denominator): the pool is every
/// player of the tournament, not a sample.
///
/// Returns zeros for an empty slice.
pub fn compute_pool_stats(values: &[f64]) -> PoolStats {
    if values.is_empty() {
        return PoolStats {
            mean: 0.0,
            stdev: 0.0,
        };
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    PoolStats {
        mean,
        stdev: variance.sqrt(),
    }
}

/// 0.0 when the pool has no spread.
pub fn compute_zscore(value: f64, stats: &PoolStats) -> f64 {
    if stats.stdev < STDEV_EPSILON {
        return 0.0;
    }
    (value - stats.mean) / stats.stdev
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatZ {
    pub stat: StatKind,
    pub value: f64,
    pub z: f64,
    pub pool: PoolStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub name: String,
    pub team: String,
    pub minutes: f64,
    pub entries: Vec<StatZ>,
    pub total_z: f64,
}

/// Compare `players` on `stats` against every summary with at least
/// `min_minutes`. Requested names missing from `summaries` are skipped.
///
/// With `per90`, counting stats use per-90 values both for the pool and for
/// the compared players; players without minutes drop out of that pool and
/// score 0 on it.
pub fn compare_players(
    summaries: &[PlayerSummary],
    players: &[String],
    stats: &[StatKind],
    per90: bool,
    min_minutes: f64,
) -> Vec<ComparisonRow> {
    let pool: Vec<&PlayerSummary> = summaries
        .iter()
        .filter(|s| s.minutes >= min_minutes)
        .collect();

    let pools: Vec<PoolStats> = stats
        .iter()
        .map(|stat| {
            let values: Vec<f64> = pool
                .iter()
                .filter_map(|s| s.value_for(*stat, per90))
                .collect();
            compute_pool_stats(&values)
        })
        .collect();

    players
        .iter()
        .filter_map(|name| summaries.iter().find(|s| &s.name == name))
        .map(|s| {
            let entries: Vec<StatZ> = stats
                .iter()
                .zip(&pools)
                .map(|(stat, pool)| {
                    let value = s.value_for(*stat, per90);
                    StatZ {
                        stat: *stat,
                        value: value.unwrap_or(0.0),
                        z: value.map_or(0.0, |v| compute_zscore(v, pool)),
                        pool: *pool,
                    }
                })
                .collect();
            let total_z = entries.iter().map(|e| e.z).sum();
            ComparisonRow {
                name: s.name.clone(),
                team: s.team.clone(),
                minutes: s.minutes,
                entries,
                total_z,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn summary(name: &str, goals: u32, pass_pct: f64, minutes: f64) -> PlayerSummary {
        PlayerSummary {
            name: name.to_string(),
            team: "Spain".to_string(),
            matches: 1,
            minutes,
            goals,
            shots: 0,
            xg: 0.0,
            assists: 0,
            passes: 0,
            passes_completed: 0,
            pass_success_pct: pass_pct,
            dribbles: 0,
            dribbles_completed: 0,
            dribble_success_pct: 0.0,
        }
    }

    #[test]
    fn pool_stats_population_stdev() {
        let stats = compute_pool_stats(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_relative_eq!(stats.mean, 5.0);
        assert_relative_eq!(stats.stdev, 2.0);
    }

    #[test]
    fn pool_stats_empty() {
        let stats = compute_pool_stats(&[]);
        assert_relative_eq!(stats.mean, 0.0);
        assert_relative_eq!(stats.stdev, 0.0);
    }

    #[test]
    fn zscore_guards_zero_spread() {
        let flat = compute_pool_stats(&[3.0, 3.0, 3.0]);
        assert_relative_eq!(compute_zscore(10.0, &flat), 0.0);
        let pool = PoolStats {
            mean: 5.0,
            stdev: 2.0,
        };
        assert_relative_eq!(compute_zscore(9.0, &pool), 2.0);
        assert_relative_eq!(compute_zscore(1.0, &pool), -2.0);
    }

    #[test]
    fn compares_selected_players_against_pool() {
        let summaries = vec![
            summary("A", 0, 70.0, 90.0),
            summary("B", 2, 80.0, 90.0),
            summary("C", 4, 90.0, 90.0),
        ];
        let rows = compare_players(
            &summaries,
            &["C".to_string(), "missing".to_string()],
            &[StatKind::Goals, StatKind::PassSuccessRate],
            false,
            0.0,
        );
        assert_eq!(rows.len(), 1);
        let c = &rows[0];
        assert_eq!(c.name, "C");
        let sd = (8.0f64 / 3.0).sqrt();
        assert_relative_eq!(c.entries[0].z, 2.0 / sd, epsilon = 1e-9);
        assert_relative_eq!(c.entries[1].z, 10.0 / (200.0f64 / 3.0).sqrt(), epsilon = 1e-9);
        assert_relative_eq!(c.total_z, c.entries[0].z + c.entries[1].z, epsilon = 1e-12);
    }

    #[test]
    fn per90_pool_excludes_players_without_minutes() {
        let summaries = vec![
            summary("A", 1, 0.0, 90.0),
            summary("B", 1, 0.0, 45.0),
            summary("Idle", 0, 0.0, 0.0),
        ];
        let rows = compare_players(
            &summaries,
            &["B".to_string(), "Idle".to_string()],
            &[StatKind::Goals],
            true,
            0.0,
        );
        // Pool per-90 goals: A = 1, B = 2.
        assert_relative_eq!(rows[0].entries[0].pool.mean, 1.5);
        assert_relative_eq!(rows[0].entries[0].z, 1.0);
        assert_relative_eq!(rows[1].entries[0].z, 0.0);
        assert_relative_eq!(rows[1].entries[0].value, 0.0);
    }
}
