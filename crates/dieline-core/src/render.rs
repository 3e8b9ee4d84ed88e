//! Narrow drawing interface the engine writes geometry to.
//!
//! Font shaping and vector output belong to whoever implements
//! [`RenderingSurface`]; the engine only needs rectangles, lines, text and
//! a width metric for pre-sizing text elements.

use serde::{Deserialize, Serialize};

use crate::model::POINTS_PER_INCH;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextStyle {
    pub font: String,
    /// Point size.
    pub size: f64,
}

impl TextStyle {
    pub fn new(font: impl Into<String>, size: f64) -> Self {
        Self {
            font: font.into(),
            size,
        }
    }
    /// Line advance in inches.
    pub fn leading(&self) -> f64 {
        self.size / POINTS_PER_INCH
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self::new("Helvetica-Bold", 12.0)
    }
}

/// Drawing target. Coordinates are inches in the current page's space.
pub trait RenderingSurface {
    fn draw_rectangle(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn draw_text(&mut self, x: f64, y: f64, text: &str, size: f64, font: &str);
    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64);
    /// Width of `text` in inches.
    fn measure_text_width(&self, size: f64, font: &str, text: &str) -> f64;
    /// Rotate the coordinate system by `degrees` (counter-clockwise).
    fn rotate(&mut self, _degrees: f64) {}
    /// Finish the current physical page and start a new one.
    fn show_page(&mut self) {}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    Rectangle { x: f64, y: f64, w: f64, h: f64 },
    Text { x: f64, y: f64, text: String, size: f64, font: String },
    Line { x1: f64, y1: f64, x2: f64, y2: f64 },
    Rotate { degrees: f64 },
}

/// Records every call as a [`DrawOp`], one list per page.
///
/// Text is measured with a flat average glyph width (a fraction of the point size).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingSurface {
    pub pages: Vec<Vec<DrawOp>>,
    /// Average glyph advance as a fraction of the point size.
    pub glyph_width_ratio: f64,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            glyph_width_ratio: 0.6,
        }
    }

    pub fn with_glyph_width_ratio(mut self, ratio: f64) -> Self {
        self.glyph_width_ratio = ratio;
        self
    }

    pub fn ops(&self) -> impl Iterator<Item = &DrawOp> {
        self.pages.iter().flatten()
    }

    fn current(&mut self) -> &mut Vec<DrawOp> {
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }
}

impl RenderingSurface for RecordingSurface {
    fn draw_rectangle(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.current().push(DrawOp::Rectangle { x, y, w, h });
    }

    fn draw_text(&mut self, x: f64, y: f64, text: &str, size: f64, font: &str) {
        self.current().push(DrawOp::Text {
            x,
            y,
            text: text.to_string(),
            size,
            font: font.to_string(),
        });
    }

    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.current().push(DrawOp::Line { x1, y1, x2, y2 });
    }

    fn measure_text_width(&self, size: f64, _font: &str, text: &str) -> f64 {
        text.chars().count() as f64 * size * self.glyph_width_ratio / POINTS_PER_INCH
    }

    fn rotate(&mut self, degrees: f64) {
        self.current().push(DrawOp::Rotate { degrees });
    }

    fn show_page(&mut self) {
        self.pages.push(Vec::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measures_proportionally_to_length_and_size() {
        let s = RecordingSurface::new();
        let a = s.measure_text_width(12.0, "Helvetica", "abcd");
        let b = s.measure_text_width(24.0, "Helvetica", "abcdabcd");
        assert!((b - 4.0 * a).abs() < 1e-12);
    }

    #[test]
    fn show_page_starts_a_new_op_list() {
        let mut s = RecordingSurface::new();
        s.draw_line(0.0, 0.0, 1.0, 1.0);
        s.show_page();
        s.draw_rectangle(0.0, 0.0, 1.0, 1.0);
        assert_eq!(s.pages.len(), 2);
        assert_eq!(s.pages[1].len(), 1);
    }
}
