//! Smoothed density of where a player was on the ball.

use super::{PitchSvg, PITCH_LENGTH, PITCH_WIDTH};
use crate::statsbomb::models::{Event, EventKind};

const CELL: f64 = 5.0;
const COLS: usize = (PITCH_LENGTH / CELL) as usize;
const ROWS: usize = (PITCH_WIDTH / CELL) as usize;
/// Gaussian sigma, in cells.
const SIGMA: f64 = 1.5;
/// Cells under this share of the peak are left transparent.
const FLOOR: f64 = 0.02;
const MAX_OPACITY: f64 = 0.85;

fn is_action(e: &Event) -> bool {
    matches!(
        e.kind(),
        EventKind::Pass | EventKind::Shot | EventKind::Dribble
    )
}

/// Count pass, shot and dribble start points into the 24 × 16 grid.
/// Out-of-range coordinates are clamped onto the edge cells.
fn bin(events: &[&Event]) -> (Vec<f64>, usize) {
    let mut grid = vec![0.0; COLS * ROWS];
    let mut n = 0;
    let located = events
        .iter()
        .filter(|e| is_action(e))
        .filter_map(|e| e.location_xy());
    for (x, y) in located {
        if !x.is_finite() || !y.is_finite() {
            continue;
        }
        let c = ((x / CELL).floor().max(0.0) as usize).min(COLS - 1);
        let r = ((y / CELL).floor().max(0.0) as usize).min(ROWS - 1);
        grid[r * COLS + c] += 1.0;
        n += 1;
    }
    (grid, n)
}

fn kernel() -> Vec<f64> {
    let radius = (3.0 * SIGMA).ceil() as i64;
    let raw: Vec<f64> = (-radius..=radius)
        .map(|i| (-((i * i) as f64) / (2.0 * SIGMA * SIGMA)).exp())
        .collect();
    let sum: f64 = raw.iter().sum();
    raw.into_iter().map(|w| w / sum).collect()
}

/// Separable blur; mass past the pitch edge is dropped.
fn blur(grid: &[f64]) -> Vec<f64> {
    let k = kernel();
    let radius = (k.len() / 2) as i64;

    let mut horizontal = vec![0.0; grid.len()];
    for r in 0..ROWS {
        for c in 0..COLS {
            let mut acc = 0.0;
            for (i, w) in k.iter().enumerate() {
                let cc = c as i64 + i as i64 - radius;
                if (0..COLS as i64).contains(&cc) {
                    acc += w * grid[r * COLS + cc as usize];
                }
            }
            horizontal[r * COLS + c] = acc;
        }
    }

    let mut out = vec![0.0; grid.len()];
    for r in 0..ROWS {
        for c in 0..COLS {
            let mut acc = 0.0;
            for (i, w) in k.iter().enumerate() {
                let rr = r as i64 + i as i64 - radius;
                if (0..ROWS as i64).contains(&rr) {
                    acc += w * horizontal[rr as usize * COLS + c];
                }
            }
            out[r * COLS + c] = acc;
        }
    }
    out
}

/// Black → red → yellow → white over `t` in [0, 1].
fn hot(t: f64) -> String {
    let t = t.clamp(0.0, 1.0);
    let ch = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    let r = ch(t / 0.375);
    let g = ch((t - 0.375) / 0.375);
    let b = ch((t - 0.75) / 0.25);
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

pub fn render_heatmap(title: &str, events: &[&Event]) -> Option<String> {
    let (grid, n) = bin(events);
    if n == 0 {
        return None;
    }
    let density = blur(&grid);
    let peak = density.iter().cloned().fold(0.0, f64::max);
    if peak <= 0.0 {
        return None;
    }

    let mut svg = PitchSvg::new(title);
    for r in 0..ROWS {
        for c in 0..COLS {
            let t = density[r * COLS + c] / peak;
            if t < FLOOR {
                continue;
            }
            svg.cell(
                c as f64 * CELL,
                r as f64 * CELL,
                CELL,
                CELL,
                &hot(0.25 + 0.75 * t),
                MAX_OPACITY * t.sqrt(),
            );
        }
    }
    Some(svg.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statsbomb::models::Named;
    use approx::assert_relative_eq;

    fn at(x: f64, y: f64) -> Event {
        Event {
            event_type: Named {
                id: None,
                name: "Pass".into(),
            },
            location: Some(vec![x, y]),
            ..Default::default()
        }
    }

    #[test]
    fn kernel_is_normalized_and_symmetric() {
        let k = kernel();
        assert_eq!(k.len(), 11);
        assert_relative_eq!(k.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(k[0], k[10]);
        assert!(k[5] > k[4]);
    }

    #[test]
    fn binning_clamps_edges() {
        let evs = vec![at(0.0, 0.0), at(120.0, 80.0), at(-3.0, 90.0), at(62.0, 41.0)];
        let refs: Vec<&Event> = evs.iter().collect();
        let (grid, n) = bin(&refs);
        assert_eq!(n, 4);
        assert_eq!(grid[0], 1.0);
        assert_eq!(grid[ROWS * COLS - 1], 1.0);
        assert_eq!(grid[(ROWS - 1) * COLS], 1.0);
        assert_eq!(grid[8 * COLS + 12], 1.0);
    }

    #[test]
    fn blur_keeps_mass_away_from_edges() {
        let mut grid = vec![0.0; COLS * ROWS];
        grid[8 * COLS + 12] = 1.0;
        let out = blur(&grid);
        assert_relative_eq!(out.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        let peak = out.iter().cloned().fold(0.0, f64::max);
        assert_relative_eq!(out[8 * COLS + 12], peak);
    }

    #[test]
    fn colormap_endpoints() {
        assert_eq!(hot(0.0), "#000000");
        assert_eq!(hot(1.0), "#ffffff");
        assert_eq!(hot(0.375), "#ff0000");
    }

    #[test]
    fn renders_cells_only_near_actions() {
        let evs = vec![at(100.0, 40.0), at(101.0, 41.0)];
        let refs: Vec<&Event> = evs.iter().collect();
        let svg = render_heatmap("Yamal – Action Heatmap", &refs).unwrap();
        assert!(svg.contains(r#"<rect x="100.00" y="40.00" width="5.00" height="5.00""#));
        assert!(!svg.contains(r#"<rect x="0.00" y="0.00""#));
    }

    #[test]
    fn nothing_located_renders_nothing() {
        let mut e = at(0.0, 0.0);
        e.location = None;
        let mut carry = at(50.0, 50.0);
        carry.event_type.name = "Carry".into();
        assert!(render_heatmap("x", &[&e]).is_none());
        assert!(render_heatmap("x", &[&carry]).is_none());
        assert!(render_heatmap("x", &[]).is_none());
    }
}
