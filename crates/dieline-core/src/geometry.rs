//! Panel layout of an unfolded regular slotted carton.
//!
//! The board is laid out left to right as panels A, B, C, D, each with a
//! bottom flap, a body and a top flap. Board coordinates put (0, 0) at the
//! bottom-left corner of panel A's bottom flap.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::config::{GlueFlap, LayoutConfig, PlantProfile, Side};
use crate::dimension::{DEFAULT_TICK_LENGTH, DimensionLabel, DimensionSide, draw_dimension_line};
use crate::element::Element;
use crate::error::{DielineError, Result};
use crate::model::{Point, Rect, Size};
use crate::render::RenderingSurface;

const SIXTEENTH: f64 = 0.0625;

/// Handedness of the board: which nominal dimension panel A takes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// A and C take the length, B and D the width.
    #[default]
    Left,
    /// A and C take the width, B and D the length.
    Right,
}

impl FromStr for Orientation {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Panel {
    A,
    B,
    C,
    D,
}

impl Panel {
    pub const ALL: [Panel; 4] = [Panel::A, Panel::B, Panel::C, Panel::D];

    pub fn index(self) -> usize {
        match self {
            Panel::A => 0,
            Panel::B => 1,
            Panel::C => 2,
            Panel::D => 3,
        }
    }
}

/// Nominal box dimensions in inches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoxDimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl BoxDimensions {
    pub fn new(length: f64, width: f64, height: f64) -> Self {
        Self {
            length,
            width,
            height,
        }
    }

    pub fn validate(&self, plant: &PlantProfile) -> Result<()> {
        let ok = [self.length, self.width, self.height]
            .iter()
            .all(|v| v.is_finite() && *v > plant.panel_trim)
            && self.height > plant.height_trim;
        if ok {
            Ok(())
        } else {
            Err(DielineError::InvalidDimensions {
                length: self.length,
                width: self.width,
                height: self.height,
            })
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PanelWidths {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl PanelWidths {
    pub fn as_array(&self) -> [f64; 4] {
        [self.a, self.b, self.c, self.d]
    }
    pub fn get(&self, panel: Panel) -> f64 {
        self.as_array()[panel.index()]
    }
    pub fn total(&self) -> f64 {
        self.a + self.b + self.c + self.d
    }
}

/// Trimmed panel widths with the plant's additive corrections applied.
pub fn panel_widths(
    length: f64,
    width: f64,
    orientation: Orientation,
    plant: &PlantProfile,
) -> PanelWidths {
    let long = length - plant.panel_trim;
    let short = width - plant.panel_trim;
    let [ca, cb, cc, cd] = plant.panel_corrections;
    let (first, second) = match orientation {
        Orientation::Left => (long, short),
        Orientation::Right => (short, long),
    };
    PanelWidths {
        a: first + ca,
        b: second + cb,
        c: first + cc,
        d: second + cd,
    }
}

/// Height of the top and bottom flaps.
///
/// Corrugators work in sixteenths, so half the inner width must not land on
/// a thirty-second: an odd number of sixteenths is bumped by 1/16 before
/// halving.
pub fn flap_height(width: f64, plant: &PlantProfile) -> f64 {
    let inner = width - plant.panel_trim;
    let fract = inner - inner.trunc();
    let sixteenths = (fract * 16.0).round() as i64;
    if sixteenths == 0 || sixteenths == 16 {
        return inner / 2.0;
    }
    if sixteenths % 2 != 0 {
        (inner + SIXTEENTH) / 2.0 + plant.odd_flap_correction
    } else {
        inner / 2.0 + plant.seam_allowance
    }
}

/// Canvas size: the unfolded board plus bleed, with an optional print header band.
pub fn canvas_size(dims: &BoxDimensions, include_header: bool, cfg: &LayoutConfig) -> Size {
    let width = 2.0 * dims.width + 2.0 * dims.length + cfg.canvas_bleed;
    let mut height = dims.height + dims.width + cfg.canvas_bleed;
    if include_header {
        height += width / cfg.header_ratio;
    }
    Size::new(width, height)
}

/// Left edge of each panel: running sums of the widths from `start`.
pub fn panel_origins(widths: &PanelWidths, start: f64) -> [f64; 4] {
    let x_a = start;
    let x_b = x_a + widths.a;
    let x_c = x_b + widths.b;
    let x_d = x_c + widths.c;
    [x_a, x_b, x_c, x_d]
}

/// Everything about a board that placement needs, computed once per box.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoxGeometry {
    pub dims: BoxDimensions,
    pub plant: String,
    pub orientation: Orientation,
    pub panels: PanelWidths,
    pub panel_x: [f64; 4],
    /// Bottom of every panel body (equal to the flap height).
    pub panel_y: f64,
    pub flap_height: f64,
    /// Printable body height after the plant's height trim.
    pub body_height: f64,
    pub board_width: f64,
    pub board_height: f64,
    pub canvas: Size,
    /// Translation from board coordinates to canvas coordinates.
    pub canvas_origin: Point,
    pub glue_flap: Option<GlueFlap>,
    pub print_header: bool,
}

impl BoxGeometry {
    pub fn compute(
        dims: BoxDimensions,
        plant: &str,
        orientation: Orientation,
        print_header: bool,
        cfg: &LayoutConfig,
    ) -> Result<Self> {
        let profile = cfg.plants.lookup(plant);
        dims.validate(profile)?;

        let panels = panel_widths(dims.length, dims.width, orientation, profile);
        let flap = flap_height(dims.width, profile);
        let body_height = dims.height - profile.height_trim;
        let glue_flap = profile.glue_flap(orientation);
        let side_offset = glue_flap.map_or(0.0, |g| g.offset);

        Ok(Self {
            dims,
            plant: plant.to_string(),
            orientation,
            panel_x: panel_origins(&panels, 0.0),
            panels,
            panel_y: flap,
            flap_height: flap,
            body_height,
            board_width: panels.total(),
            board_height: body_height + 2.0 * flap,
            canvas: canvas_size(&dims, print_header, cfg),
            canvas_origin: Point::new(
                cfg.canvas_bleed / 2.0 + side_offset,
                cfg.canvas_bleed / 2.0,
            ),
            glue_flap,
            print_header,
        })
    }

    /// Body (between the scores) of one panel.
    pub fn panel_rect(&self, panel: Panel) -> Rect {
        Rect::new(
            self.panel_x[panel.index()],
            self.panel_y,
            self.panels.get(panel),
            self.body_height,
        )
    }

    pub fn bottom_flap_rect(&self, panel: Panel) -> Rect {
        Rect::new(
            self.panel_x[panel.index()],
            0.0,
            self.panels.get(panel),
            self.flap_height,
        )
    }

    pub fn top_flap_rect(&self, panel: Panel) -> Rect {
        Rect::new(
            self.panel_x[panel.index()],
            self.panel_y + self.body_height,
            self.panels.get(panel),
            self.flap_height,
        )
    }

    /// Keep-out rectangles along the board edges, the two scores and the three folds.
    pub fn margin_elements(&self, margin_width: f64) -> Vec<Element> {
        let m = margin_width;
        let bw = self.board_width;
        let bh = self.board_height;
        let mut margins = vec![
            Element::margin("Left", 0.0, 0.0, m, bh),
            Element::margin("Bottom", 0.0, 0.0, bw, m),
            Element::margin("Top", 0.0, bh - m, bw, m),
            Element::margin("Right", bw - m, 0.0, m, bh),
            Element::margin("BottomFormed", 0.0, self.panel_y - m, bw, 2.0 * m),
            Element::margin(
                "TopFormed",
                0.0,
                self.panel_y + self.body_height - m,
                bw,
                2.0 * m,
            ),
        ];
        for (label, panel) in [("ABFold", Panel::B), ("BCFold", Panel::C), ("CDFold", Panel::D)] {
            let x = self.panel_x[panel.index()];
            margins.push(Element::margin(label, x - m, 0.0, 2.0 * m, bh));
        }
        margins
    }

    /// Body and both flaps of every panel, plus the glue flap outline.
    pub fn draw_panel_outlines(&self, surface: &mut dyn RenderingSurface) {
        for panel in Panel::ALL {
            for r in [
                self.panel_rect(panel),
                self.bottom_flap_rect(panel),
                self.top_flap_rect(panel),
            ] {
                surface.draw_rectangle(r.x, r.y, r.w, r.h);
            }
        }
        if let Some(flap) = self.glue_flap {
            let (edge, tip) = match flap.side {
                Side::Right => (self.board_width, self.board_width + flap.offset),
                Side::Left => (0.0, -flap.offset),
            };
            let bottom = self.panel_y;
            let top = self.panel_y + self.body_height;
            surface.draw_line(edge, bottom, tip, bottom + 1.0);
            surface.draw_line(edge, top, tip, top - 1.0);
            surface.draw_line(tip, bottom + 1.0, tip, top - 1.0);
        }
    }

    /// Panel widths along the bottom; flap, body and total heights up both sides.
    pub fn draw_dimension_lines(&self, surface: &mut dyn RenderingSurface) {
        use DimensionLabel::{Decimal, DecimalAndFraction};
        let [a, b, c, d] = self.panel_x;
        let end = d + self.panels.d;
        let (shift_left, shift_right) = match self.glue_flap {
            Some(GlueFlap { side: Side::Left, offset, .. }) => (offset, 0.0),
            Some(GlueFlap { side: Side::Right, offset, .. }) => (0.0, offset),
            None => (0.0, 0.0),
        };
        let body_top = self.panel_y + self.body_height;
        let total = self.board_height;

        let mut line = |side, from: (f64, f64), to: (f64, f64), label| {
            draw_dimension_line(surface, side, from, to, label, DEFAULT_TICK_LENGTH);
        };

        let bottom = DimensionSide::Bottom;
        line(bottom, (a, 0.0), (b, 0.0), Decimal);
        line(bottom, (b, 0.0), (c, 0.0), DecimalAndFraction);
        line(bottom, (a, -0.75), (c, -0.75), DecimalAndFraction);
        line(bottom, (c, 0.0), (d, 0.0), DecimalAndFraction);
        line(bottom, (d, 0.0), (end, 0.0), Decimal);
        line(bottom, (c, -0.75), (end, -0.75), DecimalAndFraction);
        line(bottom, (a, -1.5), (end, -1.5), Decimal);

        let left = DimensionSide::Left;
        let lx = a - shift_left;
        line(left, (lx, self.panel_y), (lx, body_top), Decimal);
        line(left, (lx, 0.0), (lx, self.flap_height), Decimal);
        line(left, (lx, body_top), (lx, total), Decimal);
        line(left, (lx - 0.75, 0.0), (lx - 0.75, total), Decimal);

        let right = DimensionSide::Right;
        let rx = end + shift_right;
        line(right, (rx + 0.25, 0.0), (rx + 0.25, self.flap_height), Decimal);
        line(right, (rx + 1.0, 0.0), (rx + 1.0, body_top), Decimal);
        line(right, (rx + 1.75, 0.0), (rx + 1.75, total), Decimal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_prefix_sums() {
        let w = PanelWidths {
            a: 1.0,
            b: 2.0,
            c: 3.0,
            d: 4.0,
        };
        assert_eq!(panel_origins(&w, 0.0), [0.0, 1.0, 3.0, 6.0]);
        assert_eq!(panel_origins(&w, 1.5), [1.5, 2.5, 4.5, 7.5]);
    }

    #[test]
    fn integral_inner_width_halves_directly() {
        let kenton = PlantProfile::kenton();
        assert!((flap_height(10.375, &kenton) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn orientation_swaps_long_and_short_panels() {
        let p = PlantProfile::generic();
        let l = panel_widths(14.0, 12.0, Orientation::Left, &p);
        let r = panel_widths(14.0, 12.0, Orientation::Right, &p);
        assert!(l.a > l.b);
        assert!(r.a < r.b);
        assert!((l.total() - r.total()).abs() < 1e-12);
    }
}
