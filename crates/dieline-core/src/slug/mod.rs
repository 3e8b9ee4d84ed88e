//! Repacking finished elements onto platemaking sheets ("slugs").
//!
//! Groups are sorted widest first and stacked in columns from the bottom-left
//! of each sheet, each framed by registration marks.

pub mod group;
pub mod marks;
pub mod sheet;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::SlugConfig;
use crate::diagnostics::Diagnostic;
use crate::element::Element;
use crate::error::{DielineError, Result};
use crate::model::{Line, Point, Rect, Size, SlugStats};
use crate::placement::render_element;
use crate::render::RenderingSurface;

pub use group::{ElementGroup, GroupKey, GroupMember, partition};
pub use marks::registration_marks;
pub use sheet::SheetCursor;

/// One slug: its frame on a sheet and the marks drawn around it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlugFrame {
    pub sheet_index: usize,
    pub key: GroupKey,
    pub frame: Rect,
    pub marks: Vec<Line>,
}

/// One element's final spot on a sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlugPlacement {
    pub sheet_index: usize,
    /// Index into [`SlugLayout::slugs`].
    pub slug: usize,
    /// The element, with `position` moved to sheet coordinates.
    pub element: Element,
}

impl SlugPlacement {
    pub fn position(&self) -> Point {
        self.element.position
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlugLayout {
    pub sheet: Size,
    pub num_sheets: usize,
    pub slugs: Vec<SlugFrame>,
    pub placements: Vec<SlugPlacement>,
}

impl SlugLayout {
    pub fn stats(&self) -> SlugStats {
        let total_sheet_area = self.num_sheets as f64 * self.sheet.area();
        let used_area: f64 = self
            .placements
            .iter()
            .map(|p| p.element.size.area())
            .sum();
        SlugStats {
            num_sheets: self.num_sheets,
            num_slugs: self.slugs.len(),
            num_elements: self.placements.len(),
            total_sheet_area,
            used_area,
            occupancy: if total_sheet_area > 0.0 {
                used_area / total_sheet_area
            } else {
                0.0
            },
        }
    }

    pub fn placements_on(&self, sheet_index: usize) -> impl Iterator<Item = &SlugPlacement> {
        self.placements
            .iter()
            .filter(move |p| p.sheet_index == sheet_index)
    }

    /// Draws every sheet, breaking pages between them.
    pub fn render(&self, surface: &mut dyn RenderingSurface) {
        for sheet in 0..self.num_sheets {
            if sheet > 0 {
                surface.show_page();
            }
            for p in self.placements_on(sheet) {
                render_element(&p.element, p.element.draw_origin(), surface);
            }
            for slug in self.slugs.iter().filter(|s| s.sheet_index == sheet) {
                for m in &slug.marks {
                    surface.draw_line(m.x1, m.y1, m.x2, m.y2);
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct SlugPacker {
    cfg: SlugConfig,
}

impl SlugPacker {
    pub fn new(cfg: SlugConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &SlugConfig {
        &self.cfg
    }

    /// Packs every non-margin element. Fails only when a group cannot fit a
    /// sheet's interior, before anything is placed.
    #[instrument(skip_all)]
    pub fn pack(&self, elements: &[Element]) -> Result<SlugLayout> {
        let cfg = &self.cfg;
        let rm = cfg.registration_margin();
        let mut groups = partition(elements);

        for g in &groups {
            let (w, h) = (g.width() + rm, g.height() + rm);
            if w > cfg.interior_width() || h > cfg.interior_height() {
                Diagnostic::FatalUnpackableGroup {
                    group_id: g.key.to_string(),
                }
                .emit();
                return Err(DielineError::UnpackableGroup {
                    group: g.key.to_string(),
                    width: w,
                    height: h,
                    max_width: cfg.interior_width(),
                    max_height: cfg.interior_height(),
                });
            }
        }

        // Stable: equal widths keep partition order.
        groups.sort_by(|a, b| b.width().total_cmp(&a.width()));

        let mut cursor = SheetCursor::new(cfg);
        let mut slugs = Vec::with_capacity(groups.len());
        let mut placements = Vec::new();
        for group in groups {
            let (w, h) = (group.width() + rm, group.height() + rm);
            let (sheet_index, corner) = cursor.allocate(w, h);
            let frame = Rect::new(corner.x, corner.y, w, h);
            debug!(slug = %group.key, sheet = sheet_index, x = frame.x, y = frame.y, "slug placed");

            let slug = slugs.len();
            for member in group.members {
                let mut element = member.element;
                element.position = Point::new(
                    corner.x + member.offset.x + rm / 2.0,
                    corner.y + member.offset.y + rm / 2.0,
                );
                placements.push(SlugPlacement {
                    sheet_index,
                    slug,
                    element,
                });
            }
            slugs.push(SlugFrame {
                sheet_index,
                key: group.key,
                marks: registration_marks(&frame, cfg),
                frame,
            });
        }

        Ok(SlugLayout {
            sheet: Size::new(cfg.sheet_width, cfg.sheet_height),
            num_sheets: if slugs.is_empty() {
                0
            } else {
                cursor.sheet_index() + 1
            },
            slugs,
            placements,
        })
    }
}

/// Packs independent element sets; runs them on the rayon pool with the
/// `parallel` feature.
pub fn pack_many(batches: &[Vec<Element>], cfg: &SlugConfig) -> Result<Vec<Result<SlugLayout>>> {
    let packer = SlugPacker::new(cfg.clone())?;
    #[cfg(feature = "parallel")]
    let results = batches.par_iter().map(|b| packer.pack(b)).collect();
    #[cfg(not(feature = "parallel"))]
    let results = batches.iter().map(|b| packer.pack(b)).collect();
    Ok(results)
}
