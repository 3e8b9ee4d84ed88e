use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DielineError, Result};
use crate::geometry::Orientation;

/// Which end of the board carries the glue flap.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// Glue (manufacturer's joint) flap attached to one end of the board.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GlueFlap {
    pub side: Side,
    /// How far the board is pushed right on the canvas to make room for artwork near the flap.
    pub offset: f64,
    /// Physical flap width.
    pub width: f64,
}

/// Glue flap per board orientation; `None` means the plant has no flap for it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct HandedGlueFlap {
    #[serde(default)]
    pub left: Option<GlueFlap>,
    #[serde(default)]
    pub right: Option<GlueFlap>,
}

impl HandedGlueFlap {
    pub fn both(flap: GlueFlap) -> Self {
        Self {
            left: Some(flap),
            right: Some(flap),
        }
    }
}

/// Per-plant manufacturing corrections consulted by the geometry calculator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlantProfile {
    pub name: String,
    /// Subtracted from the nominal length/width to get inner panel dimensions.
    pub panel_trim: f64,
    /// Additive corrections for panels A, B, C, D.
    pub panel_corrections: [f64; 4],
    /// Subtracted from the box height for the printable body height.
    pub height_trim: f64,
    /// Added after halving when the inner width has an odd number of sixteenths.
    pub odd_flap_correction: f64,
    /// Added after halving when the inner width has an even, non-zero number of sixteenths.
    pub seam_allowance: f64,
    #[serde(default)]
    pub glue_flap: HandedGlueFlap,
}

impl PlantProfile {
    pub fn glue_flap(&self, orientation: Orientation) -> Option<GlueFlap> {
        match orientation {
            Orientation::Left => self.glue_flap.left,
            Orientation::Right => self.glue_flap.right,
        }
    }

    fn base(name: &str) -> Self {
        Self {
            name: name.into(),
            panel_trim: 0.375,
            panel_corrections: [0.125, 0.1875, 0.1875, 0.125],
            height_trim: 0.4375,
            odd_flap_correction: 0.0,
            seam_allowance: 0.0625,
            glue_flap: HandedGlueFlap::default(),
        }
    }

    pub fn kenton() -> Self {
        Self {
            glue_flap: HandedGlueFlap::both(GlueFlap {
                side: Side::Right,
                offset: 1.0,
                width: 1.375,
            }),
            ..Self::base("Kenton")
        }
    }

    pub fn pittston() -> Self {
        Self {
            panel_corrections: [0.1875, 0.1875, 0.1875, 0.0625],
            height_trim: 0.375,
            glue_flap: HandedGlueFlap::both(GlueFlap {
                side: Side::Left,
                offset: 1.375,
                width: 1.375,
            }),
            ..Self::base("Pittston")
        }
    }

    pub fn clarksville() -> Self {
        Self {
            panel_corrections: [0.125, 0.1875, 0.1875, 0.0625],
            height_trim: 0.375,
            glue_flap: HandedGlueFlap::both(GlueFlap {
                side: Side::Left,
                offset: 1.375,
                width: 1.375,
            }),
            ..Self::base("Clarksville")
        }
    }

    /// Shelbyville trims less and bakes the seam allowance into the trim.
    /// Its glue flap sits opposite the board orientation.
    pub fn shelbyville() -> Self {
        Self {
            panel_trim: 0.3125,
            panel_corrections: [0.125, 0.1875, 0.1875, 0.0],
            height_trim: 0.25,
            odd_flap_correction: -0.0625,
            seam_allowance: 0.0,
            glue_flap: HandedGlueFlap {
                left: Some(GlueFlap {
                    side: Side::Right,
                    offset: 1.0,
                    width: 1.375,
                }),
                right: Some(GlueFlap {
                    side: Side::Left,
                    offset: 1.375,
                    width: 1.375,
                }),
            },
            ..Self::base("Shelbyville")
        }
    }

    /// Row used for plants without their own entry.
    pub fn generic() -> Self {
        Self::base("default")
    }
}

/// Lookup table `plant -> correction constants`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlantTable {
    pub profiles: Vec<PlantProfile>,
    #[serde(default = "PlantProfile::generic")]
    pub fallback: PlantProfile,
}

impl Default for PlantTable {
    fn default() -> Self {
        Self {
            profiles: vec![
                PlantProfile::kenton(),
                PlantProfile::pittston(),
                PlantProfile::clarksville(),
                PlantProfile::shelbyville(),
            ],
            fallback: PlantProfile::generic(),
        }
    }
}

impl PlantTable {
    /// Case-insensitive lookup; unknown plants get the fallback row.
    pub fn lookup(&self, plant: &str) -> &PlantProfile {
        match self.find(plant) {
            Some(p) => p,
            None => {
                debug!(plant, "no plant profile, using fallback row");
                &self.fallback
            }
        }
    }

    /// Like [`lookup`](Self::lookup) but unknown plants are an error.
    pub fn strict(&self, plant: &str) -> Result<&PlantProfile> {
        self.find(plant)
            .ok_or_else(|| DielineError::UnknownPlant(plant.to_string()))
    }

    /// Adds or replaces a row.
    pub fn insert(&mut self, profile: PlantProfile) {
        if let Some(existing) = self
            .profiles
            .iter_mut()
            .find(|p| p.name.eq_ignore_ascii_case(&profile.name))
        {
            *existing = profile;
        } else {
            self.profiles.push(profile);
        }
    }

    fn find(&self, plant: &str) -> Option<&PlantProfile> {
        self.profiles
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(plant))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Keep-out band along every cut and score (inches).
    #[serde(default = "default_margin_width")]
    pub margin_width: f64,
    /// Total bleed added to the canvas in each axis (half on each side).
    #[serde(default = "default_canvas_bleed")]
    pub canvas_bleed: f64,
    /// Print header band height is canvas width divided by this.
    #[serde(default = "default_header_ratio")]
    pub header_ratio: f64,
    /// Collision retries per element before giving up.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default)]
    pub plants: PlantTable,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin_width: default_margin_width(),
            canvas_bleed: default_canvas_bleed(),
            header_ratio: default_header_ratio(),
            max_iterations: default_max_iterations(),
            plants: PlantTable::default(),
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.margin_width >= 0.0) || !self.margin_width.is_finite() {
            return Err(DielineError::InvalidConfig(format!(
                "margin_width must be a non-negative length, got {}",
                self.margin_width
            )));
        }
        if !(self.canvas_bleed >= 0.0) || !self.canvas_bleed.is_finite() {
            return Err(DielineError::InvalidConfig(format!(
                "canvas_bleed must be a non-negative length, got {}",
                self.canvas_bleed
            )));
        }
        if !(self.header_ratio > 0.0) {
            return Err(DielineError::InvalidConfig(format!(
                "header_ratio must be positive, got {}",
                self.header_ratio
            )));
        }
        if self.max_iterations == 0 {
            return Err(DielineError::InvalidConfig(
                "max_iterations must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn builder() -> LayoutConfigBuilder {
        LayoutConfigBuilder::new()
    }
}

fn default_margin_width() -> f64 {
    1.0
}
fn default_canvas_bleed() -> f64 {
    8.0
}
fn default_header_ratio() -> f64 {
    7.6
}
fn default_max_iterations() -> usize {
    4
}

#[derive(Debug, Default, Clone)]
pub struct LayoutConfigBuilder {
    cfg: LayoutConfig,
}

impl LayoutConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: LayoutConfig::default(),
        }
    }
    pub fn margin_width(mut self, v: f64) -> Self {
        self.cfg.margin_width = v;
        self
    }
    pub fn canvas_bleed(mut self, v: f64) -> Self {
        self.cfg.canvas_bleed = v;
        self
    }
    pub fn header_ratio(mut self, v: f64) -> Self {
        self.cfg.header_ratio = v;
        self
    }
    pub fn max_iterations(mut self, v: usize) -> Self {
        self.cfg.max_iterations = v;
        self
    }
    pub fn plant(mut self, profile: PlantProfile) -> Self {
        self.cfg.plants.insert(profile);
        self
    }
    pub fn build(self) -> LayoutConfig {
        self.cfg
    }
}

/// Slug sheet (platemaking film) settings. All lengths in inches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlugConfig {
    pub sheet_width: f64,
    pub sheet_height: f64,
    /// Unused band around each sheet.
    pub page_border: f64,
    pub center_mark_length: f64,
    /// Gap between the artwork bounds and the center marks.
    pub center_mark_distance: f64,
    pub corner_mark_length: f64,
    /// Gap between neighbouring slugs.
    pub slug_spacing: f64,
}

impl Default for SlugConfig {
    fn default() -> Self {
        Self {
            sheet_width: 48.0,
            sheet_height: 14.0,
            page_border: 1.0,
            center_mark_length: 0.375,
            center_mark_distance: 0.5,
            corner_mark_length: 0.375,
            slug_spacing: 0.25,
        }
    }
}

impl SlugConfig {
    /// Extra width/height each slug gets for its marks.
    pub fn registration_margin(&self) -> f64 {
        2.0 * (self.center_mark_length + self.center_mark_distance)
    }

    pub fn interior_width(&self) -> f64 {
        self.sheet_width - 2.0 * self.page_border
    }

    pub fn interior_height(&self) -> f64 {
        self.sheet_height - 2.0 * self.page_border
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.sheet_width > 0.0 && self.sheet_height > 0.0) {
            return Err(DielineError::InvalidConfig(format!(
                "sheet dimensions must be positive, got {}x{}",
                self.sheet_width, self.sheet_height
            )));
        }
        if self.page_border < 0.0 {
            return Err(DielineError::InvalidConfig(format!(
                "page_border must not be negative, got {}",
                self.page_border
            )));
        }
        if self.interior_width() <= 0.0 || self.interior_height() <= 0.0 {
            return Err(DielineError::InvalidConfig(format!(
                "page_border ({}) * 2 exceeds sheet dimensions ({}x{})",
                self.page_border, self.sheet_width, self.sheet_height
            )));
        }
        if self.center_mark_length < 0.0
            || self.center_mark_distance < 0.0
            || self.corner_mark_length < 0.0
            || self.slug_spacing < 0.0
        {
            return Err(DielineError::InvalidConfig(
                "mark lengths and spacing must not be negative".into(),
            ));
        }
        Ok(())
    }

    pub fn builder() -> SlugConfigBuilder {
        SlugConfigBuilder::new()
    }
}

#[derive(Debug, Default, Clone)]
pub struct SlugConfigBuilder {
    cfg: SlugConfig,
}

impl SlugConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: SlugConfig::default(),
        }
    }
    pub fn with_sheet(mut self, w: f64, h: f64) -> Self {
        self.cfg.sheet_width = w;
        self.cfg.sheet_height = h;
        self
    }
    pub fn page_border(mut self, v: f64) -> Self {
        self.cfg.page_border = v;
        self
    }
    pub fn center_mark_length(mut self, v: f64) -> Self {
        self.cfg.center_mark_length = v;
        self
    }
    pub fn center_mark_distance(mut self, v: f64) -> Self {
        self.cfg.center_mark_distance = v;
        self
    }
    pub fn corner_mark_length(mut self, v: f64) -> Self {
        self.cfg.corner_mark_length = v;
        self
    }
    pub fn slug_spacing(mut self, v: f64) -> Self {
        self.cfg.slug_spacing = v;
        self
    }
    pub fn build(self) -> SlugConfig {
        self.cfg
    }
}
