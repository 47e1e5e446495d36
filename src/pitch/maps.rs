use std::fmt;
use std::str::FromStr;

use super::heatmap::render_heatmap;
use super::{LegendMark, PitchSvg, Stroke};
use crate::statsbomb::models::{Event, EventKind};

/// Diagrams available per player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapKind {
    Pass,
    Shot,
    Dribble,
    Heatmap,
}

impl MapKind {
    pub const ALL: [MapKind; 4] = [MapKind::Pass, MapKind::Shot, MapKind::Dribble, MapKind::Heatmap];

    pub fn title(self) -> &'static str {
        match self {
            MapKind::Pass => "Pass Map",
            MapKind::Shot => "Shot Map",
            MapKind::Dribble => "Dribble Map",
            MapKind::Heatmap => "Action Heatmap",
        }
    }
}

impl fmt::Display for MapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MapKind::Pass => "pass",
            MapKind::Shot => "shot",
            MapKind::Dribble => "dribble",
            MapKind::Heatmap => "heatmap",
        })
    }
}

impl FromStr for MapKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_end_matches(".svg").to_lowercase();
        MapKind::ALL
            .into_iter()
            .find(|k| k.to_string() == s)
            .ok_or_else(|| format!("unknown map '{}' (expected pass, shot, dribble or heatmap)", s))
    }
}

/// Render `kind` for one player's events. `None` when the player has no
/// action of the required type.
pub fn render_map(kind: MapKind, player: &str, events: &[&Event]) -> Option<String> {
    let title = format!("{} – {}", player, kind.title());
    match kind {
        MapKind::Pass => pass_map(&title, events),
        MapKind::Shot => shot_map(&title, events),
        MapKind::Dribble => dribble_map(&title, events),
        MapKind::Heatmap => render_heatmap(&title, events),
    }
}

fn of_kind<'a>(events: &'a [&'a Event], kind: EventKind) -> Vec<&'a Event> {
    events.iter().copied().filter(|e| e.kind() == kind).collect()
}

fn pass_map(title: &str, events: &[&Event]) -> Option<String> {
    let passes = of_kind(events, EventKind::Pass);
    if passes.is_empty() {
        return None;
    }

    let complete = Stroke {
        color: "green",
        width: 0.35,
        dashed: false,
        opacity: 0.8,
    };
    let incomplete = Stroke {
        color: "red",
        dashed: true,
        ..complete
    };
    let assist = Stroke {
        color: "gold",
        width: 0.6,
        dashed: false,
        opacity: 1.0,
    };

    let mut svg = PitchSvg::new(title);
    let mut drawn = 0;
    for p in &passes {
        let (Some(from), Some(to)) = (p.location_xy(), p.end_location_xy()) else {
            continue;
        };
        let style = if p.is_complete_pass() { complete } else { incomplete };
        svg.arrow(from, to, style);
        drawn += 1;
    }
    // Assists go on top of the ordinary passes.
    for p in passes.iter().filter(|p| p.is_assist()) {
        if let (Some(from), Some(to)) = (p.location_xy(), p.end_location_xy()) {
            svg.arrow(from, to, assist);
        }
    }
    for p in &passes {
        if let Some(from) = p.location_xy() {
            svg.dot(from, 0.45, "lightblue", "black");
        }
    }
    if drawn == 0 {
        return None;
    }

    svg.legend(
        "Successful Pass",
        LegendMark::Line {
            color: complete.color,
            width: 0.6,
            dashed: false,
        },
    );
    svg.legend(
        "Unsuccessful Pass",
        LegendMark::Line {
            color: incomplete.color,
            width: 0.6,
            dashed: true,
        },
    );
    svg.legend(
        "Assist",
        LegendMark::Line {
            color: assist.color,
            width: 0.9,
            dashed: false,
        },
    );
    Some(svg.finish())
}

fn shot_map(title: &str, events: &[&Event]) -> Option<String> {
    let shots: Vec<(&Event, (f64, f64))> = of_kind(events, EventKind::Shot)
        .into_iter()
        .filter_map(|e| e.location_xy().map(|xy| (e, xy)))
        .collect();
    if shots.is_empty() {
        return None;
    }

    let mut svg = PitchSvg::new(title);
    for (_, at) in shots.iter().filter(|(e, _)| !e.is_goal()) {
        svg.dot(*at, 1.0, "orange", "none");
    }
    for (_, at) in shots.iter().filter(|(e, _)| e.is_goal()) {
        svg.dot(*at, 1.8, "white", "black");
        svg.dot(*at, 0.6, "black", "none");
    }
    svg.legend(
        "Shot",
        LegendMark::Dot {
            fill: "orange",
            stroke: "none",
        },
    );
    svg.legend(
        "Goal",
        LegendMark::Dot {
            fill: "white",
            stroke: "black",
        },
    );
    Some(svg.finish())
}

fn dribble_map(title: &str, events: &[&Event]) -> Option<String> {
    let dribbles: Vec<(&Event, (f64, f64))> = of_kind(events, EventKind::Dribble)
        .into_iter()
        .filter_map(|e| e.location_xy().map(|xy| (e, xy)))
        .collect();
    if dribbles.is_empty() {
        return None;
    }

    let mut svg = PitchSvg::new(title);
    for (e, at) in &dribbles {
        match e.dribble_outcome() {
            Some("Complete") => svg.dot(*at, 1.0, "green", "none"),
            Some("Incomplete") => svg.dot(*at, 1.0, "red", "none"),
            _ => {}
        }
    }
    svg.legend(
        "Successful Dribble",
        LegendMark::Dot {
            fill: "green",
            stroke: "none",
        },
    );
    svg.legend(
        "Unsuccessful Dribble",
        LegendMark::Dot {
            fill: "red",
            stroke: "none",
        },
    );
    Some(svg.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statsbomb::models::{DribbleDetail, Named, PassDetail, ShotDetail};

    fn named(name: &str) -> Named {
        Named {
            id: None,
            name: name.to_string(),
        }
    }

    fn base(kind: &str, at: (f64, f64)) -> Event {
        Event {
            event_type: named(kind),
            player: Some(named("Yamal")),
            location: Some(vec![at.0, at.1]),
            ..Default::default()
        }
    }

    fn pass(at: (f64, f64), end: (f64, f64), outcome: Option<&str>, assist: bool) -> Event {
        let mut e = base("Pass", at);
        e.pass = Some(PassDetail {
            recipient: None,
            end_location: Some(vec![end.0, end.1]),
            outcome: outcome.map(named),
            goal_assist: assist.then_some(true),
        });
        e
    }

    fn shot(at: (f64, f64), outcome: &str) -> Event {
        let mut e = base("Shot", at);
        e.shot = Some(ShotDetail {
            end_location: Some(vec![120.0, 40.0, 1.0]),
            outcome: Some(named(outcome)),
            statsbomb_xg: Some(0.1),
        });
        e
    }

    #[test]
    fn pass_map_styles_outcomes_and_assists() {
        let evs = vec![
            pass((50.0, 40.0), (70.0, 30.0), None, false),
            pass((60.0, 20.0), (90.0, 10.0), Some("Incomplete"), false),
            pass((100.0, 20.0), (112.0, 38.0), None, true),
        ];
        let refs: Vec<&Event> = evs.iter().collect();
        let svg = render_map(MapKind::Pass, "Yamal", &refs).unwrap();
        // two complete arrows (one of them the assist) and one legend sample
        assert_eq!(svg.matches(r#"stroke="green""#).count(), 3);
        assert_eq!(svg.matches(r#"stroke="red""#).count(), 2);
        assert_eq!(svg.matches("url(#arrow-gold)").count(), 1);
        assert!(svg.contains("stroke-dasharray"));
        assert!(svg.contains("Yamal – Pass Map"));
    }

    #[test]
    fn shot_map_marks_goals() {
        let evs = vec![shot((100.0, 40.0), "Goal"), shot((95.0, 30.0), "Saved")];
        let refs: Vec<&Event> = evs.iter().collect();
        let svg = render_map(MapKind::Shot, "Yamal", &refs).unwrap();
        assert!(svg.contains(r#"cx="100.00" cy="40.00" r="1.80" fill="white""#));
        assert!(svg.contains(r#"cx="95.00" cy="30.00" r="1.00" fill="orange""#));
    }

    #[test]
    fn dribble_map_colours_by_outcome() {
        let mut ok = base("Dribble", (40.0, 10.0));
        ok.dribble = Some(DribbleDetail {
            outcome: Some(named("Complete")),
        });
        let mut lost = base("Dribble", (80.0, 70.0));
        lost.dribble = Some(DribbleDetail {
            outcome: Some(named("Incomplete")),
        });
        let evs = vec![ok, lost];
        let refs: Vec<&Event> = evs.iter().collect();
        let svg = render_map(MapKind::Dribble, "Yamal", &refs).unwrap();
        assert!(svg.contains(r#"cx="40.00" cy="10.00" r="1.00" fill="green""#));
        assert!(svg.contains(r#"cx="80.00" cy="70.00" r="1.00" fill="red""#));
    }

    #[test]
    fn no_qualifying_actions_renders_nothing() {
        let evs = vec![shot((100.0, 40.0), "Goal")];
        let refs: Vec<&Event> = evs.iter().collect();
        assert!(render_map(MapKind::Pass, "Yamal", &refs).is_none());
        assert!(render_map(MapKind::Dribble, "Yamal", &refs).is_none());
        assert!(render_map(MapKind::Shot, "Yamal", &[]).is_none());
    }

    #[test]
    fn map_kind_parses_with_optional_extension() {
        assert_eq!("pass".parse::<MapKind>().unwrap(), MapKind::Pass);
        assert_eq!("Heatmap.svg".parse::<MapKind>().unwrap(), MapKind::Heatmap);
        assert!("radar".parse::<MapKind>().is_err());
    }
}
