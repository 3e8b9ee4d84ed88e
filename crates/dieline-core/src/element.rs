//! Positioned, constrained rectangles and their remediation policy.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::model::{Point, Rect, Size};
use crate::render::{RenderingSurface, TextStyle};

/// Names starting with this prefix (case-insensitive) are margin elements.
pub const MARGIN_PREFIX: &str = "margin";

pub const DEFAULT_MIN_SCALE: f64 = 0.55;

/// Which edge `position.x` is anchored to when the element is handed to the surface.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// `position.x` is the leading (left) edge.
    #[default]
    Start,
    /// `position.x` is the trailing (right) edge; scaling keeps it fixed.
    End,
}

impl FromStr for Alignment {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "start" | "left" => Ok(Self::Start),
            "end" | "right" => Ok(Self::End),
            _ => Err(()),
        }
    }
}

/// Collision remediation strategies, tried in the element's configured order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Remediation {
    Translate,
    Scale,
}

impl FromStr for Remediation {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "translate" | "move" => Ok(Self::Translate),
            "scale" => Ok(Self::Scale),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn axis(self) -> Axis {
        match self {
            Direction::Left | Direction::Right => Axis::X,
            Direction::Up | Direction::Down => Axis::Y,
        }
    }
}

/// A single remediation step chosen for a collision.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "direction", rename_all = "lowercase")]
pub enum Move {
    Translate(Direction),
    /// Directional shrink. `Up`/`Right` also translate before shrinking.
    Scale(Direction),
}

/// Optional floor on the final width/height.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct MinSize {
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

impl MinSize {
    pub fn breached_by(&self, size: Size) -> bool {
        self.width.is_some_and(|w| size.width < w) || self.height.is_some_and(|h| size.height < h)
    }
}

/// What gets drawn inside the element's box.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    /// Opaque artwork; rendered as its bounds.
    #[default]
    Artwork,
    Text {
        lines: Vec<String>,
        style: TextStyle,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Element {
    pub name: String,
    /// Bottom-left corner once placed.
    pub position: Point,
    pub size: Size,
    initial_size: Size,
    /// Buffer other elements keep from this one.
    pub padding: f64,
    pub alignment: Alignment,
    pub rotated: bool,
    pub fix_x: bool,
    pub fix_y: bool,
    pub min_size: MinSize,
    pub min_scale: f64,
    remediation: Vec<Remediation>,
    attempted_moves: Vec<Move>,
    pub group_id: Option<u32>,
    pub critical: bool,
    pub visible: bool,
    pub content: Content,
}

impl Element {
    pub fn new(name: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        let size = Size::new(width, height);
        Self {
            name: name.into(),
            position: Point::new(x, y),
            size,
            initial_size: size,
            padding: 0.0,
            alignment: Alignment::Start,
            rotated: false,
            fix_x: false,
            fix_y: false,
            min_size: MinSize::default(),
            min_scale: DEFAULT_MIN_SCALE,
            remediation: vec![Remediation::Translate, Remediation::Scale],
            attempted_moves: Vec::new(),
            group_id: None,
            critical: false,
            visible: true,
            content: Content::Artwork,
        }
    }

    /// A keep-out zone. `suffix` is appended to the reserved prefix.
    pub fn margin(suffix: &str, x: f64, y: f64, width: f64, height: f64) -> Self {
        let mut e = Self::new(format!("Margin{suffix}"), x, y, width, height);
        e.visible = false;
        e
    }

    /// Single-line text, sized through the surface's font metrics.
    pub fn text(
        name: impl Into<String>,
        x: f64,
        y: f64,
        style: &TextStyle,
        text: &str,
        surface: &dyn RenderingSurface,
    ) -> Self {
        let width = surface.measure_text_width(style.size, &style.font, text);
        let height = style.size / 100.0;
        let mut e = Self::new(name, x, y, width, height);
        e.content = Content::Text {
            lines: vec![text.to_string()],
            style: style.clone(),
        };
        e
    }

    /// Multi-line text block: as wide as its widest line, one leading per line.
    pub fn text_block(
        name: impl Into<String>,
        x: f64,
        y: f64,
        style: &TextStyle,
        lines: &[String],
        surface: &dyn RenderingSurface,
    ) -> Self {
        let width = lines
            .iter()
            .map(|l| surface.measure_text_width(style.size, &style.font, l))
            .fold(0.0, f64::max);
        let height = style.leading() * lines.len() as f64;
        let mut e = Self::new(name, x, y, width, height);
        e.content = Content::Text {
            lines: lines.to_vec(),
            style: style.clone(),
        };
        e
    }

    /// Graphic scaled to fit an available area with the smaller of the two axis factors.
    pub fn graphic(
        name: impl Into<String>,
        x: f64,
        y: f64,
        natural: Size,
        available_width: Option<f64>,
        available_height: Option<f64>,
    ) -> Self {
        let sx = available_width.filter(|_| natural.width > 0.0).map(|w| w / natural.width);
        let sy = available_height.filter(|_| natural.height > 0.0).map(|h| h / natural.height);
        let scale = match (sx, sy) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => 1.0,
        };
        Self::new(name, x, y, natural.width * scale, natural.height * scale)
    }

    /// Steps `start` down by `step` points until `text` is narrower than `max_width`
    /// or `floor` is reached. Never returns less than `floor` unless `start` is.
    pub fn fit_text_size(
        surface: &dyn RenderingSurface,
        font: &str,
        text: &str,
        start: f64,
        step: f64,
        floor: f64,
        max_width: f64,
    ) -> f64 {
        let mut size = start;
        while step > 0.0 && size > floor && surface.measure_text_width(size, font, text) >= max_width
        {
            size = (size - step).max(floor);
        }
        size
    }

    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }
    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }
    pub fn rotated(mut self, v: bool) -> Self {
        self.rotated = v;
        self
    }
    pub fn fix_x(mut self, v: bool) -> Self {
        self.fix_x = v;
        self
    }
    pub fn fix_y(mut self, v: bool) -> Self {
        self.fix_y = v;
        self
    }
    pub fn with_min_size(mut self, width: Option<f64>, height: Option<f64>) -> Self {
        self.min_size = MinSize { width, height };
        self
    }
    pub fn with_min_scale(mut self, v: f64) -> Self {
        self.min_scale = v;
        self
    }
    pub fn with_remediation(mut self, order: &[Remediation]) -> Self {
        self.remediation = order.to_vec();
        self
    }
    pub fn with_group(mut self, id: u32) -> Self {
        self.group_id = Some(id);
        self
    }
    pub fn critical(mut self, v: bool) -> Self {
        self.critical = v;
        self
    }
    pub fn with_content(mut self, content: Content) -> Self {
        self.content = content;
        self
    }

    pub fn is_margin(&self) -> bool {
        self.name
            .get(..MARGIN_PREFIX.len())
            .is_some_and(|p| p.eq_ignore_ascii_case(MARGIN_PREFIX))
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_parts(self.position, self.size)
    }

    pub fn initial_size(&self) -> Size {
        self.initial_size
    }

    pub fn remediation_order(&self) -> &[Remediation] {
        &self.remediation
    }

    pub fn attempted_moves(&self) -> &[Move] {
        &self.attempted_moves
    }

    /// Final size relative to the snapshot taken when placement started.
    pub fn cumulative_scale(&self) -> f64 {
        if self.initial_size.height > 0.0 {
            self.size.height / self.initial_size.height
        } else if self.initial_size.width > 0.0 {
            self.size.width / self.initial_size.width
        } else {
            1.0
        }
    }

    pub fn is_pinned(&self, axis: Axis) -> bool {
        match axis {
            Axis::X => self.fix_x,
            Axis::Y => self.fix_y,
        }
    }

    /// Where the renderer should start drawing. Rotated elements draw from the
    /// opposite corner under a 180 degree turn.
    pub fn draw_origin(&self) -> Point {
        if self.rotated {
            Point::new(
                self.position.x + self.size.width,
                self.position.y + self.size.height,
            )
        } else {
            self.position
        }
    }

    pub(crate) fn snapshot_initial_size(&mut self) {
        self.initial_size = self.size;
    }

    pub(crate) fn record_move(&mut self, mv: Move) {
        self.attempted_moves.push(mv);
    }

    /// Uniform shrink/grow about the bottom-left corner, or about the trailing
    /// edge for end-aligned elements.
    pub(crate) fn scale_in_place(&mut self, factor: f64) {
        let orig_width = self.size.width;
        self.size.width *= factor;
        self.size.height *= factor;
        if self.alignment == Alignment::End {
            self.position.x += orig_width - self.size.width;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingSurface;

    #[test]
    fn margin_prefix_is_case_insensitive() {
        assert!(Element::margin("Left", 0.0, 0.0, 1.0, 1.0).is_margin());
        assert!(Element::new("MARGIN_top", 0.0, 0.0, 1.0, 1.0).is_margin());
        assert!(!Element::new("Logo", 0.0, 0.0, 1.0, 1.0).is_margin());
        assert!(!Element::new("Mar", 0.0, 0.0, 1.0, 1.0).is_margin());
    }

    #[test]
    fn graphic_uses_smaller_axis_factor() {
        let e = Element::graphic("g", 0.0, 0.0, Size::new(4.0, 2.0), Some(2.0), Some(2.0));
        assert!((e.size.width - 2.0).abs() < 1e-12);
        assert!((e.size.height - 1.0).abs() < 1e-12);
        let e = Element::graphic("g", 0.0, 0.0, Size::new(4.0, 2.0), None, None);
        assert_eq!(e.size, Size::new(4.0, 2.0));
    }

    #[test]
    fn end_aligned_scale_keeps_trailing_edge() {
        let mut e = Element::new("e", 2.0, 0.0, 4.0, 2.0).with_alignment(Alignment::End);
        e.scale_in_place(0.5);
        assert!((e.bounds().right() - 6.0).abs() < 1e-12);
    }

    #[test]
    fn fitted_text_size_stops_at_the_floor() {
        let surface = RecordingSurface::new();
        let size = Element::fit_text_size(&surface, "Helvetica", "NET WT", 12.0, 1.0, 8.5, 0.1);
        assert_eq!(size, 8.5);
        let size = Element::fit_text_size(&surface, "Helvetica", "NET WT", 12.0, 20.0, 4.0, 0.1);
        assert_eq!(size, 4.0);
        // Wide enough already: untouched.
        let size = Element::fit_text_size(&surface, "Helvetica", "NET WT", 12.0, 1.0, 4.0, 50.0);
        assert_eq!(size, 12.0);
    }
}
