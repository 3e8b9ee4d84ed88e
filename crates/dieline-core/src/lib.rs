//! Layout engine for corrugated box dielines.
//!
//! - Geometry: panel widths, flap heights and canvas size per plant
//! - Placement: collision detection with translate/scale remediation on a margin-seeded board
//! - Slugs: shelf packing of finished elements onto platemaking sheets with registration marks
//! - Rendering goes through the narrow [`RenderingSurface`] trait; exports are plain JSON.
//!
//! Quick example:
//! ```ignore
//! use dieline_core::prelude::*;
//! # fn main() -> dieline_core::Result<()> {
//! let cfg = LayoutConfig::default();
//! let geometry = BoxGeometry::compute(
//!     BoxDimensions::new(14.0, 12.0, 16.375),
//!     "kenton",
//!     Orientation::Left,
//!     false,
//!     &cfg,
//! )?;
//! let mut surface = PlacementSurface::for_box(&geometry, &cfg);
//! let logo = Element::new("Logo", 3.0, 8.0, 4.0, 2.0).with_padding(0.125);
//! let outcome = surface.place(logo, surface.options());
//! println!("{outcome:?} / {}", surface.stats().summary());
//! # Ok(()) }
//! ```

pub mod config;
pub mod diagnostics;
pub mod dimension;
pub mod element;
pub mod error;
pub mod export;
pub mod geometry;
pub mod model;
pub mod pipeline;
pub mod placement;
pub mod render;
pub mod slug;

pub use config::*;
pub use diagnostics::*;
pub use dimension::*;
pub use element::*;
pub use error::*;
pub use export::*;
pub use geometry::*;
pub use model::*;
pub use pipeline::*;
pub use placement::*;
pub use render::*;
pub use slug::{SlugLayout, SlugPacker, pack_many};

/// Convenience prelude for common types and functions.
/// Importing `dieline_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{
        LayoutConfig, LayoutConfigBuilder, PlantProfile, PlantTable, SlugConfig,
        SlugConfigBuilder,
    };
    pub use crate::diagnostics::{Diagnostic, Severity, SuppressReason};
    pub use crate::element::{Alignment, Element, Remediation};
    pub use crate::geometry::{BoxDimensions, BoxGeometry, Orientation, Panel};
    pub use crate::model::{LayoutStats, Point, Rect, Size, SlugStats};
    pub use crate::placement::{PlaceOptions, PlacementOutcome, PlacementSurface};
    pub use crate::render::{RecordingSurface, RenderingSurface, TextStyle};
    pub use crate::slug::{SlugLayout, SlugPacker};
    pub use crate::{BoxJob, BoxLayout, ElementSpec, layout_batch, layout_box};
}
