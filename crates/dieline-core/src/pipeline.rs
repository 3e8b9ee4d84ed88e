use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::{LayoutConfig, SlugConfig};
use crate::diagnostics::Diagnostic;
use crate::element::{Alignment, Element, Remediation};
use crate::error::{DielineError, Result};
use crate::geometry::{BoxDimensions, BoxGeometry, Orientation, Panel};
use crate::model::{LayoutStats, Point, Size};
use crate::placement::{PlaceOptions, PlacementOutcome, PlacementSurface, render_element};
use crate::render::{RenderingSurface, TextStyle};
use crate::slug::{SlugLayout, SlugPacker};

fn default_plant() -> String {
    "default".into()
}
fn default_font() -> String {
    TextStyle::default().font
}
fn default_font_size() -> f64 {
    TextStyle::default().size
}

/// Text content of an element; sized through the rendering surface's metrics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextSpec {
    pub lines: Vec<String>,
    #[serde(default = "default_font")]
    pub font: String,
    #[serde(default = "default_font_size")]
    pub size: f64,
    /// Shrink the font size in whole points until the widest line fits.
    #[serde(default)]
    pub max_width: Option<f64>,
    #[serde(default)]
    pub min_font_size: Option<f64>,
}

/// One element request. Positions are relative to the body of `panel`, or to
/// the board when no panel is given.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementSpec {
    pub name: String,
    #[serde(default)]
    pub panel: Option<Panel>,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    /// Fit the given width/height into this area, keeping proportions.
    #[serde(default)]
    pub available_width: Option<f64>,
    #[serde(default)]
    pub available_height: Option<f64>,
    #[serde(default)]
    pub text: Option<TextSpec>,
    #[serde(default)]
    pub padding: f64,
    #[serde(default)]
    pub alignment: Alignment,
    #[serde(default)]
    pub rotated: bool,
    #[serde(default)]
    pub fix_x: bool,
    #[serde(default)]
    pub fix_y: bool,
    #[serde(default)]
    pub min_width: Option<f64>,
    #[serde(default)]
    pub min_height: Option<f64>,
    #[serde(default)]
    pub min_scale: Option<f64>,
    #[serde(default)]
    pub remediation: Option<Vec<Remediation>>,
    #[serde(default)]
    pub group_id: Option<u32>,
    #[serde(default)]
    pub critical: bool,
    #[serde(default)]
    pub ignore_margins: bool,
    #[serde(default)]
    pub deletable: bool,
    /// Elements with the same key end up at the same scale.
    #[serde(default)]
    pub shared: Option<String>,
}

impl ElementSpec {
    pub fn new(name: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            name: name.into(),
            panel: None,
            x,
            y,
            width: None,
            height: None,
            available_width: None,
            available_height: None,
            text: None,
            padding: 0.0,
            alignment: Alignment::Start,
            rotated: false,
            fix_x: false,
            fix_y: false,
            min_width: None,
            min_height: None,
            min_scale: None,
            remediation: None,
            group_id: None,
            critical: false,
            ignore_margins: false,
            deletable: false,
            shared: None,
        }
    }

    /// Builds the element in board coordinates.
    pub fn to_element(
        &self,
        geometry: &BoxGeometry,
        surface: &dyn RenderingSurface,
    ) -> Result<Element> {
        let origin = match self.panel {
            Some(panel) => {
                let r = geometry.panel_rect(panel);
                Point::new(r.x, r.y)
            }
            None => Point::default(),
        };
        let (x, y) = (origin.x + self.x, origin.y + self.y);

        let mut element = match (&self.text, self.width, self.height) {
            (Some(text), _, _) => {
                if text.lines.is_empty() {
                    return Err(DielineError::InvalidInput(format!(
                        "element '{}' has no text lines",
                        self.name
                    )));
                }
                let size = match text.max_width {
                    Some(max_width) => {
                        let widest = text
                            .lines
                            .iter()
                            .max_by(|a, b| {
                                let wa = surface.measure_text_width(text.size, &text.font, a);
                                let wb = surface.measure_text_width(text.size, &text.font, b);
                                wa.total_cmp(&wb)
                            })
                            .map(String::as_str)
                            .unwrap_or_default();
                        Element::fit_text_size(
                            surface,
                            &text.font,
                            widest,
                            text.size,
                            1.0,
                            text.min_font_size.unwrap_or(1.0),
                            max_width,
                        )
                    }
                    None => text.size,
                };
                let style = TextStyle::new(text.font.clone(), size);
                if let [line] = text.lines.as_slice() {
                    Element::text(&self.name, x, y, &style, line, surface)
                } else {
                    Element::text_block(&self.name, x, y, &style, &text.lines, surface)
                }
            }
            (None, Some(w), Some(h)) => {
                if self.available_width.is_some() || self.available_height.is_some() {
                    Element::graphic(
                        &self.name,
                        x,
                        y,
                        Size::new(w, h),
                        self.available_width,
                        self.available_height,
                    )
                } else {
                    Element::new(&self.name, x, y, w, h)
                }
            }
            _ => {
                return Err(DielineError::InvalidInput(format!(
                    "element '{}' needs text or both width and height",
                    self.name
                )));
            }
        };

        element = element
            .with_padding(self.padding)
            .with_alignment(self.alignment)
            .rotated(self.rotated)
            .fix_x(self.fix_x)
            .fix_y(self.fix_y)
            .with_min_size(self.min_width, self.min_height)
            .critical(self.critical);
        if let Some(v) = self.min_scale {
            element = element.with_min_scale(v);
        }
        if let Some(order) = &self.remediation {
            element = element.with_remediation(order);
        }
        if let Some(id) = self.group_id {
            element = element.with_group(id);
        }
        Ok(element)
    }

    fn options(&self, base: PlaceOptions) -> PlaceOptions {
        base.ignore_margins(self.ignore_margins)
            .deletable(self.deletable)
    }
}

/// A box to lay out: dimensions, plant, and elements in draw-priority order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoxJob {
    pub name: String,
    pub dimensions: BoxDimensions,
    #[serde(default = "default_plant")]
    pub plant: String,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub print_header: bool,
    /// Also pack the placed elements onto slug sheets.
    #[serde(default)]
    pub slugs: bool,
    #[serde(default)]
    pub elements: Vec<ElementSpec>,
}

/// Result of one placement request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementRecord {
    pub name: String,
    pub outcome: PlacementOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxLayout {
    pub name: String,
    pub geometry: BoxGeometry,
    /// Visible elements in placement order.
    pub placed: Vec<Element>,
    pub suppressed: Vec<Element>,
    pub margins: Vec<Element>,
    pub records: Vec<ElementRecord>,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: LayoutStats,
    pub slugs: Option<SlugLayout>,
}

impl BoxLayout {
    /// Panel outlines and dimension lines, then every visible element.
    pub fn render(&self, surface: &mut dyn RenderingSurface) {
        self.geometry.draw_panel_outlines(surface);
        self.geometry.draw_dimension_lines(surface);
        for element in &self.placed {
            render_element(element, element.draw_origin(), surface);
        }
    }
}

/// Lays out one box: geometry, margin-seeded surface, element placement in
/// order, then an optional slug pass.
///
/// The slug pass runs when `slug_cfg` is given or the job asks for it (with
/// default sheet settings).
#[instrument(skip_all, fields(job = %job.name))]
pub fn layout_box(
    job: &BoxJob,
    cfg: &LayoutConfig,
    slug_cfg: Option<&SlugConfig>,
    measure: &dyn RenderingSurface,
) -> Result<BoxLayout> {
    cfg.validate()?;
    let geometry = BoxGeometry::compute(
        job.dimensions,
        &job.plant,
        job.orientation,
        job.print_header,
        cfg,
    )?;
    debug!(
        board_width = geometry.board_width,
        board_height = geometry.board_height,
        flap = geometry.flap_height,
        "geometry computed"
    );

    let mut surface = PlacementSurface::for_box(&geometry, cfg);
    let base = surface.options();
    let mut records = Vec::with_capacity(job.elements.len());
    let mut done_shared: HashSet<&str> = HashSet::new();

    for spec in &job.elements {
        match spec.shared.as_deref() {
            Some(key) => {
                if !done_shared.insert(key) {
                    continue;
                }
                let siblings: Vec<&ElementSpec> = job
                    .elements
                    .iter()
                    .filter(|s| s.shared.as_deref() == Some(key))
                    .collect();
                let elements = siblings
                    .iter()
                    .map(|s| Ok((s.to_element(&geometry, measure)?, s.options(base))))
                    .collect::<Result<Vec<_>>>()?;
                let outcomes = surface.place_shared(elements);
                records.extend(siblings.iter().zip(outcomes).map(|(s, outcome)| {
                    ElementRecord {
                        name: s.name.clone(),
                        outcome,
                    }
                }));
            }
            None => {
                let element = spec.to_element(&geometry, measure)?;
                let outcome = surface.place(element, spec.options(base));
                records.push(ElementRecord {
                    name: spec.name.clone(),
                    outcome,
                });
            }
        }
    }

    let stats = surface.stats();
    info!("{}", stats.summary());
    let (index, suppressed, diagnostics) = surface.into_parts();
    let (margins, placed): (Vec<Element>, Vec<Element>) =
        index.into_iter().partition(Element::is_margin);

    let slug_cfg = slug_cfg
        .cloned()
        .or_else(|| job.slugs.then(SlugConfig::default));
    let slugs = match slug_cfg {
        Some(sc) => Some(SlugPacker::new(sc)?.pack(&placed)?),
        None => None,
    };

    Ok(BoxLayout {
        name: job.name.clone(),
        geometry,
        placed,
        suppressed,
        margins,
        records,
        diagnostics,
        stats,
        slugs,
    })
}

/// Lays out independent jobs; a failing job does not stop the others.
pub fn layout_batch(
    jobs: &[BoxJob],
    cfg: &LayoutConfig,
    slug_cfg: Option<&SlugConfig>,
    measure: &(dyn RenderingSurface + Sync),
) -> Vec<Result<BoxLayout>> {
    #[cfg(feature = "parallel")]
    {
        jobs.par_iter()
            .map(|job| layout_box(job, cfg, slug_cfg, measure))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        jobs.iter()
            .map(|job| layout_box(job, cfg, slug_cfg, measure))
            .collect()
    }
}
