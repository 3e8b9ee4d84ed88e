use serde::{Deserialize, Serialize};

/// Lengths are inches throughout; points are only used for font sizes.
pub const POINTS_PER_INCH: f64 = 72.0;

/// Float tolerance used when comparing board coordinates.
pub const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Axis-aligned rectangle. `x,y` is the bottom-left corner; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }
    pub fn from_parts(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }
    pub fn right(&self) -> f64 {
        self.x + self.w
    }
    pub fn top(&self) -> f64 {
        self.y + self.h
    }
    pub fn mid_x(&self) -> f64 {
        self.x + self.w / 2.0
    }
    pub fn mid_y(&self) -> f64 {
        self.y + self.h / 2.0
    }
    pub fn area(&self) -> f64 {
        self.w * self.h
    }
    /// Grows the rectangle by `pad` on every side.
    pub fn inflate(&self, pad: f64) -> Rect {
        Rect::new(
            self.x - pad,
            self.y - pad,
            self.w + 2.0 * pad,
            self.h + 2.0 * pad,
        )
    }
    /// Open-interval overlap: rectangles that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(self.x >= other.right()
            || other.x >= self.right()
            || self.y >= other.top()
            || other.y >= self.top())
    }
    /// Returns true if `r` is fully inside `self` (inclusive edges).
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.top() <= self.top()
    }
    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let top = self.top().max(other.top());
        Rect::new(x, y, right - x, top - y)
    }
}

/// Straight segment, used for outlines and registration marks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Line {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Line {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }
    pub fn length(&self) -> f64 {
        ((self.x2 - self.x1).powi(2) + (self.y2 - self.y1).powi(2)).sqrt()
    }
}

/// Document header written into every export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Meta {
    pub schema_version: String,
    pub app: String,
    pub version: String,
    pub units: String,
}

impl Default for Meta {
    fn default() -> Self {
        Self {
            schema_version: "1".into(),
            app: "dieline".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            units: "in".into(),
        }
    }
}

/// Counters collected over one layout session.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LayoutStats {
    /// Non-margin elements that ended up visible.
    pub placed: usize,
    /// Non-margin elements dropped from the board.
    pub suppressed: usize,
    /// Subset of `suppressed` flagged critical.
    pub critical_suppressed: usize,
    /// Visible elements whose final size differs from their initial size.
    pub scaled: usize,
    /// Elements left below their minimum size because they were not deletable.
    pub min_size_violations: usize,
}

impl LayoutStats {
    pub fn summary(&self) -> String {
        format!(
            "Placed: {}, Suppressed: {} ({} critical), Scaled: {}, Min-size violations: {}",
            self.placed,
            self.suppressed,
            self.critical_suppressed,
            self.scaled,
            self.min_size_violations,
        )
    }
}

/// Statistics about slug sheet usage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SlugStats {
    pub num_sheets: usize,
    pub num_slugs: usize,
    pub num_elements: usize,
    /// Sum of sheet areas.
    pub total_sheet_area: f64,
    /// Sum of member element areas.
    pub used_area: f64,
    /// used_area / total_sheet_area (0.0 to 1.0).
    pub occupancy: f64,
}

impl SlugStats {
    pub fn summary(&self) -> String {
        format!(
            "Sheets: {}, Slugs: {}, Elements: {}, Occupancy: {:.2}%, Wasted: {:.1} sq in",
            self.num_sheets,
            self.num_slugs,
            self.num_elements,
            self.occupancy * 100.0,
            self.wasted_area(),
        )
    }

    pub fn wasted_area(&self) -> f64 {
        (self.total_sheet_area - self.used_area).max(0.0)
    }
}
