use crate::config::SlugConfig;
use crate::model::Point;

/// Column-major cursor over a run of identical sheets.
///
/// Slugs stack bottom to top; a full column moves right by the width of the
/// column's first (widest) slug, and a full sheet starts a new one.
#[derive(Debug, Clone)]
pub struct SheetCursor {
    x: f64,
    y: f64,
    column_width: f64,
    first_in_column: bool,
    sheet_index: usize,
    border: f64,
    spacing: f64,
    width_limit: f64,
    height_limit: f64,
}

impl SheetCursor {
    pub fn new(cfg: &SlugConfig) -> Self {
        Self {
            x: cfg.page_border,
            y: cfg.page_border,
            column_width: 0.0,
            first_in_column: true,
            sheet_index: 0,
            border: cfg.page_border,
            spacing: cfg.slug_spacing,
            width_limit: cfg.sheet_width - cfg.page_border,
            height_limit: cfg.sheet_height - cfg.page_border,
        }
    }

    pub fn sheet_index(&self) -> usize {
        self.sheet_index
    }

    /// Reserves a `w` x `h` slot and returns its sheet and bottom-left corner.
    pub fn allocate(&mut self, w: f64, h: f64) -> (usize, Point) {
        if self.y + h > self.height_limit {
            self.next_column();
        }
        if self.x + w > self.width_limit {
            self.sheet_index += 1;
            self.x = self.border;
            self.y = self.border;
            self.first_in_column = true;
        }
        let slot = (self.sheet_index, Point::new(self.x, self.y));

        if self.first_in_column {
            self.column_width = w + self.spacing;
            self.first_in_column = false;
        }
        self.y += h + self.spacing;
        if self.y > self.height_limit {
            self.next_column();
        }
        slot
    }

    fn next_column(&mut self) {
        self.x += self.column_width;
        self.y = self.border;
        self.first_in_column = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stacks_then_wraps_columns_then_sheets() {
        let cfg = SlugConfig::builder().with_sheet(10.0, 7.0).build();
        let mut c = SheetCursor::new(&cfg);
        assert_eq!(c.allocate(3.0, 2.0), (0, Point::new(1.0, 1.0)));
        assert_eq!(c.allocate(2.0, 2.0), (0, Point::new(1.0, 3.25)));
        // Column full: next column starts after the first slug's width.
        assert_eq!(c.allocate(2.0, 2.0), (0, Point::new(4.25, 1.0)));
        assert_eq!(c.allocate(2.0, 2.0), (0, Point::new(4.25, 3.25)));
        assert_eq!(c.allocate(2.0, 2.0), (0, Point::new(6.5, 1.0)));
        assert_eq!(c.allocate(2.0, 2.0), (0, Point::new(6.5, 3.25)));
        assert_eq!(c.allocate(2.0, 2.0), (1, Point::new(1.0, 1.0)));
    }
}
