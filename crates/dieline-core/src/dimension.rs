//! Dimension lines drawn around the board: an offset line with end ticks,
//! arrowheads and a centred length label.

use serde::{Deserialize, Serialize};

use crate::render::RenderingSurface;

pub const DIMENSION_FONT: &str = "Helvetica";
pub const DIMENSION_FONT_SIZE: f64 = 48.0;
pub const DEFAULT_TICK_LENGTH: f64 = 0.75;

/// Side of the measured span the line is drawn on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DimensionSide {
    Left,
    Right,
    Top,
    Bottom,
}

impl DimensionSide {
    fn is_vertical(self) -> bool {
        matches!(self, DimensionSide::Left | DimensionSide::Right)
    }
}

/// How the length is printed next to the line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DimensionLabel {
    Hidden,
    Decimal,
    /// Whole inches plus a reduced sixteenths fraction, e.g. `13 3/4`.
    Fraction,
    /// `13.75 (13 3/4)`; plain decimal for whole numbers.
    DecimalAndFraction,
}

/// `value` to the nearest sixteenth as `whole num/den`, or `None` when it is
/// a whole number.
pub fn sixteenths_fraction(value: f64) -> Option<String> {
    let sixteenths = (value.abs() * 16.0).round() as u64;
    let (whole, mut num) = (sixteenths / 16, sixteenths % 16);
    if num == 0 {
        return None;
    }
    let mut den = 16;
    while num % 2 == 0 {
        num /= 2;
        den /= 2;
    }
    let sign = if value < 0.0 { "-" } else { "" };
    Some(format!("{sign}{whole} {num}/{den}"))
}

pub fn format_dimension(value: f64, label: DimensionLabel) -> Option<String> {
    let decimal = format!("{value}");
    match label {
        DimensionLabel::Hidden => None,
        DimensionLabel::Decimal => Some(decimal),
        DimensionLabel::Fraction => Some(sixteenths_fraction(value).unwrap_or(decimal)),
        DimensionLabel::DecimalAndFraction => Some(match sixteenths_fraction(value) {
            Some(frac) => format!("{decimal} ({frac})"),
            None => decimal,
        }),
    }
}

/// Draws a dimension line for the span `from`..`to`, offset by half a tick
/// toward `side`. Vertical spans measure `y`, horizontal spans measure `x`.
pub fn draw_dimension_line(
    surface: &mut dyn RenderingSurface,
    side: DimensionSide,
    from: (f64, f64),
    to: (f64, f64),
    label: DimensionLabel,
    tick_length: f64,
) {
    let off = tick_length / 2.0;
    let (dx, dy) = match side {
        DimensionSide::Left => (-off, 0.0),
        DimensionSide::Right => (off, 0.0),
        DimensionSide::Top => (0.0, off),
        DimensionSide::Bottom => (0.0, -off),
    };
    let (x1, y1) = (from.0 + dx, from.1 + dy);
    let (x2, y2) = (to.0 + dx, to.1 + dy);
    let length = if side.is_vertical() {
        to.1 - from.1
    } else {
        to.0 - from.0
    };

    surface.draw_line(x1, y1, x2, y2);
    // Arrowheads lean slightly off the line.
    let lean = off / 1.5;
    if side.is_vertical() {
        surface.draw_line(x1 - off, y1, x1 + off, y1);
        surface.draw_line(x2 - off, y2, x2 + off, y2);
        surface.draw_line(x1, y1, x1 + lean, y1 + off);
        surface.draw_line(x1, y1, x1 - lean, y1 + off);
        surface.draw_line(x2, y2, x2 - lean, y2 - off);
        surface.draw_line(x2, y2, x2 + lean, y2 - off);
    } else {
        surface.draw_line(x1, y1 - off, x1, y1 + off);
        surface.draw_line(x2, y2 - off, x2, y2 + off);
        surface.draw_line(x1, y1, x1 + off, y1 + lean);
        surface.draw_line(x1, y1, x1 + off, y1 - lean);
        surface.draw_line(x2, y2, x2 - off, y2 + lean);
        surface.draw_line(x2, y2, x2 - off, y2 - lean);
    }

    let Some(text) = format_dimension(length, label) else {
        return;
    };
    let half_width =
        surface.measure_text_width(DIMENSION_FONT_SIZE, DIMENSION_FONT, &text) / 2.0;
    if side.is_vertical() {
        // Text runs up the line; draw in the rotated frame.
        surface.rotate(90.0);
        let along = y1 + length / 2.0 - half_width;
        surface.draw_text(along, -x1, &text, DIMENSION_FONT_SIZE, DIMENSION_FONT);
        surface.rotate(-90.0);
    } else {
        let text_height = DIMENSION_FONT_SIZE / 100.0;
        surface.draw_text(
            x1 + length / 2.0 - half_width,
            y1 - text_height,
            &text,
            DIMENSION_FONT_SIZE,
            DIMENSION_FONT,
        );
    }
}
