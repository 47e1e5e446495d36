//! SVG pitch diagrams on the 120 × 80 StatsBomb coordinate system.
//!
//! The SVG user space is the pitch itself (x to the right, y downwards, the
//! same orientation as the feed), with a title strip above the pitch and a
//! legend column to its right.

pub mod heatmap;
pub mod maps;

pub use maps::{render_map, MapKind};

use std::collections::BTreeSet;

pub const PITCH_LENGTH: f64 = 120.0;
pub const PITCH_WIDTH: f64 = 80.0;

const LINE_COLOR: &str = "black";
const PITCH_COLOR: &str = "white";
const LINE_WIDTH: f64 = 0.35;
const LEGEND_X: f64 = PITCH_LENGTH + 6.0;
const VIEW_WIDTH: f64 = 166.0;

/// How a legend entry is drawn.
#[derive(Debug, Clone)]
pub enum LegendMark {
    Line {
        color: &'static str,
        width: f64,
        dashed: bool,
    },
    Dot {
        fill: &'static str,
        stroke: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct LegendItem {
    pub label: &'static str,
    pub mark: LegendMark,
}

/// Stroke style for arrows.
#[derive(Debug, Clone, Copy)]
pub struct Stroke {
    pub color: &'static str,
    pub width: f64,
    pub dashed: bool,
    pub opacity: f64,
}

/// Accumulates SVG elements for one diagram.
pub struct PitchSvg {
    title: String,
    underlay: String,
    overlay: String,
    legend: Vec<LegendItem>,
    arrow_colors: BTreeSet<&'static str>,
}

impl PitchSvg {
    pub fn new(title: &str) -> Self {
        PitchSvg {
            title: title.to_string(),
            underlay: String::new(),
            overlay: String::new(),
            legend: Vec::new(),
            arrow_colors: BTreeSet::new(),
        }
    }

    /// Axis-aligned filled cell drawn beneath the pitch markings.
    pub fn cell(&mut self, x: f64, y: f64, w: f64, h: f64, fill: &str, opacity: f64) {
        self.underlay.push_str(&format!(
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}" fill-opacity="{:.3}"/>"#,
            x, y, w, h, fill, opacity
        ));
    }

    pub fn arrow(&mut self, from: (f64, f64), to: (f64, f64), stroke: Stroke) {
        self.arrow_colors.insert(stroke.color);
        let dash = if stroke.dashed {
            r#" stroke-dasharray="0.6 0.6""#
        } else {
            ""
        };
        self.overlay.push_str(&format!(
            r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-width="{:.2}" stroke-opacity="{:.2}"{} marker-end="url(#{})"/>"#,
            from.0,
            from.1,
            to.0,
            to.1,
            stroke.color,
            stroke.width,
            stroke.opacity,
            dash,
            marker_id(stroke.color)
        ));
    }

    pub fn dot(&mut self, at: (f64, f64), radius: f64, fill: &str, stroke: &str) {
        self.overlay.push_str(&format!(
            r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{}" stroke="{}" stroke-width="0.2"/>"#,
            at.0, at.1, radius, fill, stroke
        ));
    }

    pub fn legend(&mut self, label: &'static str, mark: LegendMark) {
        self.legend.push(LegendItem { label, mark });
    }

    pub fn finish(self) -> String {
        let mut svg = String::with_capacity(4096 + self.underlay.len() + self.overlay.len());
        svg.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="-4 -10 {} 94" font-family="sans-serif">"#,
            VIEW_WIDTH
        ));
        svg.push_str("<defs>");
        for color in &self.arrow_colors {
            svg.push_str(&format!(
                r#"<marker id="{}" viewBox="0 0 10 10" refX="9" refY="5" markerWidth="4" markerHeight="4" orient="auto-start-reverse"><path d="M0,0 L10,5 L0,10 z" fill="{}"/></marker>"#,
                marker_id(color),
                color
            ));
        }
        svg.push_str("</defs>");
        svg.push_str(&format!(
            r#"<rect x="-4" y="-10" width="{}" height="94" fill="{}"/>"#,
            VIEW_WIDTH, PITCH_COLOR
        ));
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="-4" font-size="4" text-anchor="middle">{}</text>"#,
            PITCH_LENGTH / 2.0,
            escape_xml(&self.title)
        ));
        svg.push_str(&self.underlay);
        svg.push_str(&pitch_markings());
        svg.push_str(&self.overlay);
        svg.push_str(&render_legend(&self.legend));
        svg.push_str("</svg>");
        svg
    }
}

fn marker_id(color: &str) -> String {
    let safe: String = color
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    format!("arrow-{}", safe)
}

fn pitch_markings() -> String {
    let mut out = format!(
        r#"<g fill="none" stroke="{}" stroke-width="{}">"#,
        LINE_COLOR, LINE_WIDTH
    );
    // Touchlines, goal lines, halfway line, centre circle and spot.
    out.push_str(&format!(
        r#"<rect x="0" y="0" width="{}" height="{}"/>"#,
        PITCH_LENGTH, PITCH_WIDTH
    ));
    out.push_str(r#"<line x1="60" y1="0" x2="60" y2="80"/>"#);
    out.push_str(r#"<circle cx="60" cy="40" r="10"/>"#);
    out.push_str(&format!(
        r#"<circle cx="60" cy="40" r="0.4" fill="{}"/>"#,
        LINE_COLOR
    ));
    for (goal_line, dir) in [(0.0, 1.0), (PITCH_LENGTH, -1.0)] {
        let box_edge = goal_line + dir * 18.0;
        let six_edge = goal_line + dir * 6.0;
        let spot = goal_line + dir * 12.0;
        out.push_str(&format!(
            r#"<polyline points="{gl},18 {be},18 {be},62 {gl},62"/>"#,
            gl = goal_line,
            be = box_edge
        ));
        out.push_str(&format!(
            r#"<polyline points="{gl},30 {se},30 {se},50 {gl},50"/>"#,
            gl = goal_line,
            se = six_edge
        ));
        out.push_str(&format!(
            r#"<circle cx="{}" cy="40" r="0.4" fill="{}"/>"#,
            spot, LINE_COLOR
        ));
        // The "D": radius-10 arc around the spot, outside the box.
        let sweep = if dir > 0.0 { 1 } else { 0 };
        out.push_str(&format!(
            r#"<path d="M{be},32 A10,10 0 0,{sw} {be},48"/>"#,
            be = box_edge,
            sw = sweep
        ));
        out.push_str(&format!(
            r#"<polyline points="{gl},36 {gb},36 {gb},44 {gl},44"/>"#,
            gl = goal_line,
            gb = goal_line - dir * 2.0
        ));
    }
    out.push_str("</g>");
    out
}

fn render_legend(items: &[LegendItem]) -> String {
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        let y = 4.0 + i as f64 * 6.0;
        match &item.mark {
            LegendMark::Line {
                color,
                width,
                dashed,
            } => {
                let dash = if *dashed {
                    r#" stroke-dasharray="0.8 0.6""#
                } else {
                    ""
                };
                out.push_str(&format!(
                    r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-width="{:.2}"{}/>"#,
                    LEGEND_X,
                    y,
                    LEGEND_X + 5.0,
                    y,
                    color,
                    width,
                    dash
                ));
            }
            LegendMark::Dot { fill, stroke } => {
                out.push_str(&format!(
                    r#"<circle cx="{:.1}" cy="{:.1}" r="1.5" fill="{}" stroke="{}" stroke-width="0.2"/>"#,
                    LEGEND_X + 2.5,
                    y,
                    fill,
                    stroke
                ));
            }
        }
        out.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" font-size="2.6" dominant-baseline="middle">{}</text>"#,
            LEGEND_X + 7.0,
            y,
            escape_xml(item.label)
        ));
    }
    out
}

pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_in_names() {
        assert_eq!(escape_xml("Tom & <Jerry>"), "Tom &amp; &lt;Jerry&gt;");
        assert_eq!(escape_xml("Álvaro Morata"), "Álvaro Morata");
    }

    #[test]
    fn finished_svg_has_pitch_title_and_markers() {
        let mut svg = PitchSvg::new("O'Neil – Pass Map");
        svg.arrow(
            (10.0, 10.0),
            (20.0, 20.0),
            Stroke {
                color: "gold",
                width: 0.6,
                dashed: false,
                opacity: 1.0,
            },
        );
        svg.legend(
            "Assist",
            LegendMark::Line {
                color: "gold",
                width: 0.6,
                dashed: false,
            },
        );
        let out = svg.finish();
        assert!(out.starts_with("<svg"));
        assert!(out.ends_with("</svg>"));
        assert!(out.contains(r#"<marker id="arrow-gold""#));
        assert!(out.contains("marker-end=\"url(#arrow-gold)\""));
        assert!(out.contains("O&apos;Neil"));
        assert!(out.contains(">Assist</text>"));
        assert!(out.contains(r#"<rect x="0" y="0" width="120" height="80"/>"#));
    }
}
