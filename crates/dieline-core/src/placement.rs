//! Collision detection and iterative remediation for elements placed one at
//! a time onto a board.
//!
//! Every call sees the elements placed before it and none after it, so the
//! order of [`PlacementSurface::place`] calls is the draw priority.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::LayoutConfig;
use crate::diagnostics::{Diagnostic, SuppressReason};
use crate::element::{Alignment, Axis, Content, Direction, Element, Move, Remediation};
use crate::geometry::BoxGeometry;
use crate::model::{EPSILON, LayoutStats, Point, Size};
use crate::render::RenderingSurface;

/// Per-call switches for [`PlacementSurface::place`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaceOptions {
    /// Skip margin elements during collision tests.
    pub ignore_margins: bool,
    /// Suppress the element if it ends up below its minimum size.
    pub deletable: bool,
    pub max_iterations: usize,
}

impl Default for PlaceOptions {
    fn default() -> Self {
        Self {
            ignore_margins: false,
            deletable: false,
            max_iterations: 4,
        }
    }
}

impl PlaceOptions {
    pub fn ignore_margins(mut self, v: bool) -> Self {
        self.ignore_margins = v;
        self
    }
    pub fn deletable(mut self, v: bool) -> Self {
        self.deletable = v;
        self
    }
    pub fn max_iterations(mut self, v: usize) -> Self {
        self.max_iterations = v;
        self
    }
}

/// Handle to an element held in the surface's collision index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ElementId(pub usize);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PlacementOutcome {
    Placed {
        id: ElementId,
        position: Point,
        size: Size,
        /// Cumulative scale relative to the initial size, if the element was scaled.
        applied_scale: Option<f64>,
    },
    Suppressed {
        reason: SuppressReason,
    },
}

impl PlacementOutcome {
    pub fn is_placed(&self) -> bool {
        matches!(self, PlacementOutcome::Placed { .. })
    }
    pub fn id(&self) -> Option<ElementId> {
        match self {
            PlacementOutcome::Placed { id, .. } => Some(*id),
            PlacementOutcome::Suppressed { .. } => None,
        }
    }
    pub fn applied_scale(&self) -> Option<f64> {
        match self {
            PlacementOutcome::Placed { applied_scale, .. } => *applied_scale,
            PlacementOutcome::Suppressed { .. } => None,
        }
    }
}

/// Overlap between the candidate and one indexed element.
#[derive(Debug, Clone, Copy)]
struct Collision {
    existing: usize,
    direction_x: Direction,
    distance_x: f64,
    direction_y: Direction,
    distance_y: f64,
}

impl Collision {
    /// Lesser overlap wins; ties go to Y.
    fn master(&self) -> (Direction, f64) {
        if self.distance_x < self.distance_y {
            (self.direction_x, self.distance_x)
        } else {
            (self.direction_y, self.distance_y)
        }
    }

    fn perpendicular(&self) -> (Direction, f64) {
        if self.distance_x < self.distance_y {
            (self.direction_y, self.distance_y)
        } else {
            (self.direction_x, self.distance_x)
        }
    }
}

enum Probe {
    Clear,
    Covered(usize),
    Hit(Collision),
}

/// One layout session's collision index. Owned by a single caller; never shared.
#[derive(Debug, Clone, Default)]
pub struct PlacementSurface {
    index: Vec<Element>,
    suppressed: Vec<Element>,
    diagnostics: Vec<Diagnostic>,
    max_iterations: usize,
}

impl PlacementSurface {
    pub fn new(max_iterations: usize) -> Self {
        Self {
            index: Vec::new(),
            suppressed: Vec::new(),
            diagnostics: Vec::new(),
            max_iterations: max_iterations.max(1),
        }
    }

    /// A surface seeded with the board's margin elements.
    pub fn for_box(geometry: &BoxGeometry, cfg: &LayoutConfig) -> Self {
        let mut surface = Self::new(cfg.max_iterations);
        let opts = surface.options().ignore_margins(true);
        for margin in geometry.margin_elements(cfg.margin_width) {
            surface.place(margin, opts);
        }
        surface
    }

    /// Default options carrying this surface's iteration cap.
    pub fn options(&self) -> PlaceOptions {
        PlaceOptions::default().max_iterations(self.max_iterations)
    }

    pub fn place(&mut self, mut element: Element, opts: PlaceOptions) -> PlacementOutcome {
        debug!(element = %element.name, "placing element");
        if element.alignment == Alignment::End {
            element.position.x -= element.size.width;
        }
        if element.rotated {
            element.position.x -= element.size.width;
            element.position.y -= element.size.height;
        }
        element.snapshot_initial_size();

        let mut suppressed = None;
        let max_iterations = opts.max_iterations.max(1);
        for iteration in 0..max_iterations {
            let collision = match self.probe(&element, opts.ignore_margins) {
                Probe::Clear => break,
                Probe::Covered(existing) => {
                    trace!(
                        element = %element.name,
                        existing = %self.index[existing].name,
                        "complete coverage"
                    );
                    suppressed = Some(SuppressReason::CompleteCoverage);
                    break;
                }
                Probe::Hit(c) => c,
            };
            if iteration + 1 == max_iterations {
                suppressed = Some(SuppressReason::IterationsExhausted);
                break;
            }
            let Some((mv, distance)) = choose_move(&element, &collision) else {
                suppressed = Some(SuppressReason::NoRemediation);
                break;
            };
            trace!(
                element = %element.name,
                existing = %self.index[collision.existing].name,
                ?mv,
                distance,
                iteration,
                "collision remediation"
            );
            element.record_move(mv);
            if let Err(reason) = apply_move(&mut element, mv, distance) {
                suppressed = Some(reason);
                break;
            }
        }

        if suppressed.is_none() && element.min_size.breached_by(element.size) {
            if opts.deletable {
                suppressed = Some(SuppressReason::BelowMinSize);
            } else {
                self.report(Diagnostic::MinSizeViolation {
                    name: element.name.clone(),
                });
            }
        }

        if element.is_margin() {
            // Margins always join the index; they are never rendered.
            element.visible = false;
            return self.commit(element);
        }

        match suppressed {
            None => {
                element.visible = true;
                self.commit(element)
            }
            Some(reason) => {
                element.visible = false;
                self.report(Diagnostic::ElementSuppressed {
                    name: element.name.clone(),
                    reason,
                });
                if element.critical {
                    self.report(Diagnostic::CriticalSuppressed {
                        name: element.name.clone(),
                    });
                }
                self.suppressed.push(element);
                PlacementOutcome::Suppressed { reason }
            }
        }
    }

    /// Places a sibling set, then shrinks every placed sibling to the
    /// smallest scale any of them needed.
    ///
    /// Each sibling carries its own options. A deletable sibling that the
    /// shared scale pushes below its minimum size is suppressed.
    pub fn place_shared(
        &mut self,
        siblings: Vec<(Element, PlaceOptions)>,
    ) -> Vec<PlacementOutcome> {
        let mut outcomes: Vec<PlacementOutcome> = Vec::with_capacity(siblings.len());
        let mut deletable: Vec<bool> = Vec::with_capacity(siblings.len());
        for (element, opts) in siblings {
            let outcome = self.place(element, opts);
            deletable.push(opts.deletable);
            outcomes.push(outcome);
        }

        let smallest = outcomes
            .iter()
            .filter_map(|o| o.id())
            .map(|id| self.index[id.0].cumulative_scale())
            .fold(1.0_f64, f64::min);
        if smallest >= 1.0 - EPSILON {
            return outcomes;
        }
        debug!(scale = smallest, "equalising shared scale");

        let mut dropped: Vec<(usize, usize)> = Vec::new();
        for (slot, outcome) in outcomes.iter_mut().enumerate() {
            let PlacementOutcome::Placed { id, .. } = *outcome else {
                continue;
            };
            let element = &mut self.index[id.0];
            let current = element.cumulative_scale();
            // Never below the sibling's own floor.
            let target = smallest.max(element.min_scale);
            if current > target + EPSILON {
                let breached_before = element.min_size.breached_by(element.size);
                element.scale_in_place(target / current);
                if !breached_before && element.min_size.breached_by(element.size) {
                    if deletable[slot] {
                        dropped.push((slot, id.0));
                        continue;
                    }
                    let name = element.name.clone();
                    self.report(Diagnostic::MinSizeViolation { name });
                }
            }
            let element = &self.index[id.0];
            *outcome = PlacementOutcome::Placed {
                id,
                position: element.position,
                size: element.size,
                applied_scale: Some(element.cumulative_scale()),
            };
        }

        // The set sits at the end of the index, so removing entries only
        // renumbers this call's own ids.
        for &(slot, index) in dropped.iter().rev() {
            let mut element = self.index.remove(index);
            element.visible = false;
            let reason = SuppressReason::BelowMinSize;
            self.report(Diagnostic::ElementSuppressed {
                name: element.name.clone(),
                reason,
            });
            if element.critical {
                self.report(Diagnostic::CriticalSuppressed {
                    name: element.name.clone(),
                });
            }
            self.suppressed.push(element);
            outcomes[slot] = PlacementOutcome::Suppressed { reason };
        }
        if !dropped.is_empty() {
            for outcome in outcomes.iter_mut() {
                if let PlacementOutcome::Placed { id, .. } = outcome {
                    let shift = dropped.iter().filter(|(_, i)| *i < id.0).count();
                    id.0 -= shift;
                }
            }
        }
        outcomes
    }

    fn commit(&mut self, element: Element) -> PlacementOutcome {
        let scale = element.cumulative_scale();
        let outcome = PlacementOutcome::Placed {
            id: ElementId(self.index.len()),
            position: element.position,
            size: element.size,
            applied_scale: ((scale - 1.0).abs() > EPSILON).then_some(scale),
        };
        self.index.push(element);
        outcome
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        diagnostic.emit();
        self.diagnostics.push(diagnostic);
    }

    /// First overlapping indexed element, in index order.
    fn probe(&self, candidate: &Element, ignore_margins: bool) -> Probe {
        let cand = candidate.bounds();
        for (i, existing) in self.index.iter().enumerate() {
            if ignore_margins && existing.is_margin() {
                continue;
            }
            let unpadded = existing.bounds();
            let padded = unpadded.inflate(existing.padding);
            if !cand.overlaps(&padded) {
                continue;
            }
            if cand.contains(&unpadded) || unpadded.contains(&cand) {
                return Probe::Covered(i);
            }

            // Push toward the side the candidate's midpoint already leans.
            let (direction_y, distance_y) = if padded.mid_y() >= cand.mid_y() {
                (Direction::Down, cand.top() - padded.y)
            } else {
                (Direction::Up, padded.top() - cand.y)
            };
            let (direction_x, distance_x) = if padded.mid_x() > cand.mid_x() {
                (Direction::Left, cand.right() - padded.x)
            } else {
                (Direction::Right, padded.right() - cand.x)
            };
            return Probe::Hit(Collision {
                existing: i,
                direction_x,
                distance_x,
                direction_y,
                distance_y,
            });
        }
        Probe::Clear
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.index.get(id.0)
    }

    /// Everything in the collision index: margins and visible elements.
    pub fn indexed(&self) -> &[Element] {
        &self.index
    }

    /// Visible, non-margin elements in placement order.
    pub fn placed(&self) -> impl Iterator<Item = &Element> {
        self.index.iter().filter(|e| !e.is_margin())
    }

    pub fn margins(&self) -> impl Iterator<Item = &Element> {
        self.index.iter().filter(|e| e.is_margin())
    }

    pub fn suppressed(&self) -> &[Element] {
        &self.suppressed
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn stats(&self) -> LayoutStats {
        let placed: Vec<&Element> = self.placed().collect();
        LayoutStats {
            placed: placed.len(),
            suppressed: self.suppressed.len(),
            critical_suppressed: self.suppressed.iter().filter(|e| e.critical).count(),
            scaled: placed
                .iter()
                .filter(|e| (e.cumulative_scale() - 1.0).abs() > EPSILON)
                .count(),
            min_size_violations: self
                .diagnostics
                .iter()
                .filter(|d| matches!(d, Diagnostic::MinSizeViolation { .. }))
                .count(),
        }
    }

    /// Splits the session into (index, suppressed, diagnostics).
    pub fn into_parts(self) -> (Vec<Element>, Vec<Element>, Vec<Diagnostic>) {
        (self.index, self.suppressed, self.diagnostics)
    }

    /// Draws every visible non-margin element at its draw origin.
    pub fn render(&self, surface: &mut dyn RenderingSurface) {
        for element in self.placed() {
            render_element(element, element.draw_origin(), surface);
        }
    }
}

/// Draws one element with its draw origin at `origin`.
pub(crate) fn render_element(element: &Element, origin: Point, surface: &mut dyn RenderingSurface) {
    let (sign, turn) = if element.rotated { (-1.0, 180.0) } else { (1.0, 0.0) };
    if element.rotated {
        surface.rotate(turn);
    }
    let (ox, oy) = (sign * origin.x, sign * origin.y);
    match &element.content {
        Content::Artwork => surface.draw_rectangle(ox, oy, element.size.width, element.size.height),
        Content::Text { lines, style } => {
            let scale = element.cumulative_scale();
            let size = style.size * scale;
            let leading = style.leading() * scale;
            let n = lines.len();
            for (i, line) in lines.iter().enumerate() {
                let y = oy + leading * (n - 1 - i) as f64;
                surface.draw_text(ox, y, line, size, &style.font);
            }
        }
    }
    if element.rotated {
        surface.rotate(-turn);
    }
}

/// Walks the element's remediation order and returns the first usable move.
fn choose_move(element: &Element, collision: &Collision) -> Option<(Move, f64)> {
    let candidates = [collision.master(), collision.perpendicular()];
    for strategy in element.remediation_order() {
        match strategy {
            Remediation::Translate => {
                for (direction, distance) in candidates {
                    let mv = Move::Translate(direction);
                    if !element.is_pinned(direction.axis()) && !element.attempted_moves().contains(&mv)
                    {
                        return Some((mv, distance));
                    }
                }
            }
            Remediation::Scale => {
                for (direction, distance) in candidates {
                    if scale_translates(element, direction) && element.is_pinned(direction.axis()) {
                        continue;
                    }
                    return Some((Move::Scale(direction), distance));
                }
            }
        }
    }
    None
}

/// `Up` always moves the element; `Right` does unless the trailing edge is anchored.
fn scale_translates(element: &Element, direction: Direction) -> bool {
    match direction {
        Direction::Up => true,
        Direction::Right => element.alignment == Alignment::Start,
        Direction::Down | Direction::Left => false,
    }
}

fn apply_move(element: &mut Element, mv: Move, distance: f64) -> Result<(), SuppressReason> {
    let step = distance + element.padding;
    match mv {
        Move::Translate(direction) => {
            match direction {
                Direction::Right => element.position.x += step,
                Direction::Left => element.position.x -= step,
                Direction::Up => element.position.y += step,
                Direction::Down => element.position.y -= step,
            }
            Ok(())
        }
        Move::Scale(direction) => {
            let dimension = match direction.axis() {
                Axis::X => element.size.width,
                Axis::Y => element.size.height,
            };
            if dimension <= 0.0 {
                return Err(SuppressReason::ScaleFloor);
            }
            let factor = (dimension - element.padding - distance) / dimension;
            let cumulative = element.cumulative_scale() * factor;
            if factor <= 0.0 || cumulative < element.min_scale {
                return Err(SuppressReason::ScaleFloor);
            }
            if scale_translates(element, direction) {
                match direction {
                    Direction::Right => element.position.x += step,
                    Direction::Up => element.position.y += step,
                    Direction::Down | Direction::Left => {}
                }
            }
            element.scale_in_place(factor);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_favour_y() {
        let c = Collision {
            existing: 0,
            direction_x: Direction::Right,
            distance_x: 1.0,
            direction_y: Direction::Up,
            distance_y: 1.0,
        };
        assert_eq!(c.master(), (Direction::Up, 1.0));
        assert_eq!(c.perpendicular(), (Direction::Right, 1.0));
    }

    #[test]
    fn translate_skips_pinned_axis() {
        let e = Element::new("e", 0.0, 0.0, 1.0, 1.0).fix_y(true);
        let c = Collision {
            existing: 0,
            direction_x: Direction::Left,
            distance_x: 0.5,
            direction_y: Direction::Down,
            distance_y: 0.25,
        };
        let (mv, d) = choose_move(&e, &c).expect("move");
        assert_eq!(mv, Move::Translate(Direction::Left));
        assert_eq!(d, 0.5);
    }

    #[test]
    fn fully_pinned_falls_back_to_scale() {
        let e = Element::new("e", 0.0, 0.0, 1.0, 1.0).fix_x(true).fix_y(true);
        let c = Collision {
            existing: 0,
            direction_x: Direction::Left,
            distance_x: 0.5,
            direction_y: Direction::Down,
            distance_y: 0.25,
        };
        let (mv, _) = choose_move(&e, &c).expect("move");
        assert_eq!(mv, Move::Scale(Direction::Down));
    }

    #[test]
    fn pinned_scale_up_uses_perpendicular() {
        let e = Element::new("e", 0.0, 0.0, 1.0, 1.0)
            .fix_x(true)
            .fix_y(true)
            .with_remediation(&[Remediation::Scale]);
        let c = Collision {
            existing: 0,
            direction_x: Direction::Left,
            distance_x: 0.5,
            direction_y: Direction::Up,
            distance_y: 0.25,
        };
        let (mv, _) = choose_move(&e, &c).expect("move");
        assert_eq!(mv, Move::Scale(Direction::Left));
    }
}
