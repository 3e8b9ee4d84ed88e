use crate::config::SlugConfig;
use crate::model::{Line, Rect};

/// Four center ticks and four two-stroke corner marks framing a slug.
pub fn registration_marks(slug: &Rect, cfg: &SlugConfig) -> Vec<Line> {
    let (x, y, r, t) = (slug.x, slug.y, slug.right(), slug.top());
    let (mx, my) = (slug.mid_x(), slug.mid_y());
    let c = cfg.center_mark_length;
    let k = cfg.corner_mark_length;
    vec![
        Line::new(x, my, x + c, my),
        Line::new(r, my, r - c, my),
        Line::new(mx, y, mx, y + c),
        Line::new(mx, t, mx, t - c),
        Line::new(x, y, x + k, y),
        Line::new(x, y, x, y + k),
        Line::new(x, t, x + k, t),
        Line::new(x, t, x, t - k),
        Line::new(r, y, r - k, y),
        Line::new(r, y, r, y + k),
        Line::new(r, t, r - k, t),
        Line::new(r, t, r, t - k),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_stay_on_the_slug_frame() {
        let cfg = SlugConfig::default();
        let slug = Rect::new(1.0, 1.0, 4.0, 3.0);
        let marks = registration_marks(&slug, &cfg);
        assert_eq!(marks.len(), 12);
        for m in &marks {
            assert!((m.length() - 0.375).abs() < 1e-12);
            for (px, py) in [(m.x1, m.y1), (m.x2, m.y2)] {
                assert!(px >= slug.x && px <= slug.right());
                assert!(py >= slug.y && py <= slug.top());
            }
        }
    }
}
