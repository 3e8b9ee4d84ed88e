use dieline_core::diagnostics::{Diagnostic, Severity, SuppressReason};
use dieline_core::element::{Alignment, Direction, Element, Move, Remediation};
use dieline_core::model::Point;
use dieline_core::placement::{PlaceOptions, PlacementOutcome, PlacementSurface};
use dieline_core::render::{DrawOp, RecordingSurface};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn surface_with_block() -> PlacementSurface {
    let mut s = PlacementSurface::new(4);
    let out = s.place(Element::new("Block", 0.0, 0.0, 4.0, 4.0), s.options());
    assert!(out.is_placed());
    s
}

fn placed_position(out: &PlacementOutcome) -> Point {
    match out {
        PlacementOutcome::Placed { position, .. } => *position,
        other => panic!("expected placement, got {other:?}"),
    }
}

#[test]
fn identical_centers_suppress_by_coverage() {
    let mut s = surface_with_block();
    let out = s.place(Element::new("Twin", 0.0, 0.0, 4.0, 4.0), s.options());
    assert_eq!(
        out,
        PlacementOutcome::Suppressed {
            reason: SuppressReason::CompleteCoverage
        }
    );
    let inner = s.place(Element::new("Inner", 1.0, 1.0, 2.0, 2.0), s.options());
    assert!(!inner.is_placed());
    assert_eq!(s.suppressed().len(), 2);
    assert_eq!(
        s.diagnostics()[0],
        Diagnostic::ElementSuppressed {
            name: "Twin".into(),
            reason: SuppressReason::CompleteCoverage
        }
    );
}

#[test]
fn translates_along_the_smaller_overlap() {
    let mut s = surface_with_block();
    let out = s.place(Element::new("Label", 3.0, 1.0, 4.0, 2.0), s.options());
    assert_eq!(placed_position(&out), Point::new(4.0, 1.0));
    let label = s.element(out.id().expect("id")).expect("indexed");
    assert_eq!(label.attempted_moves(), &[Move::Translate(Direction::Right)]);
}

#[test]
fn existing_padding_is_kept_clear() {
    let mut s = PlacementSurface::new(4);
    s.place(
        Element::new("Block", 0.0, 0.0, 4.0, 4.0).with_padding(0.5),
        s.options(),
    );
    let out = s.place(Element::new("Label", 3.0, 1.0, 4.0, 2.0), s.options());
    assert!(close(placed_position(&out).x, 4.5));
}

#[test]
fn pinned_axis_falls_back_to_perpendicular_translate() {
    let mut s = surface_with_block();
    let out = s.place(
        Element::new("Label", 3.0, 1.0, 4.0, 2.0).fix_x(true),
        s.options(),
    );
    assert_eq!(placed_position(&out), Point::new(3.0, -2.0));
}

#[test]
fn end_aligned_scale_keeps_trailing_edge() {
    let mut s = surface_with_block();
    // Anchored at its right edge (x = 9).
    let e = Element::new("Price", 9.0, 1.0, 6.0, 2.0)
        .with_alignment(Alignment::End)
        .fix_x(true)
        .fix_y(true);
    let out = s.place(e, s.options());
    let PlacementOutcome::Placed {
        position,
        size,
        applied_scale,
        ..
    } = out
    else {
        panic!("expected placement, got {out:?}");
    };
    assert!(close(position.x + size.width, 9.0));
    assert!(close(size.width, 5.0));
    assert!(close(applied_scale.expect("scaled"), 5.0 / 6.0));
}

#[test]
fn scale_below_floor_suppresses_and_escalates_critical() {
    let mut s = surface_with_block();
    let e = Element::new("Warning", 1.0, 1.0, 4.0, 2.0)
        .fix_x(true)
        .fix_y(true)
        .critical(true);
    let out = s.place(e, s.options());
    assert_eq!(
        out,
        PlacementOutcome::Suppressed {
            reason: SuppressReason::ScaleFloor
        }
    );
    let severities: Vec<Severity> = s.diagnostics().iter().map(|d| d.severity()).collect();
    assert_eq!(severities, vec![Severity::Warning, Severity::Critical]);
    assert_eq!(s.stats().critical_suppressed, 1);
}

#[test]
fn no_usable_move_suppresses() {
    let mut s = surface_with_block();
    let e = Element::new("Stuck", 3.0, 1.0, 4.0, 2.0)
        .fix_x(true)
        .fix_y(true)
        .with_remediation(&[Remediation::Translate]);
    let out = s.place(e, s.options());
    assert_eq!(
        out,
        PlacementOutcome::Suppressed {
            reason: SuppressReason::NoRemediation
        }
    );
}

#[test]
fn single_iteration_budget_exhausts_on_first_collision() {
    let mut s = surface_with_block();
    let out = s.place(
        Element::new("Label", 3.0, 1.0, 4.0, 2.0),
        s.options().max_iterations(1),
    );
    assert_eq!(
        out,
        PlacementOutcome::Suppressed {
            reason: SuppressReason::IterationsExhausted
        }
    );
}

#[test]
fn min_size_breach_depends_on_deletable() {
    let make = || {
        Element::new("Price", 9.0, 1.0, 6.0, 2.0)
            .with_alignment(Alignment::End)
            .fix_x(true)
            .fix_y(true)
            .with_min_size(Some(5.5), None)
    };

    let mut s = surface_with_block();
    let out = s.place(make(), s.options().deletable(true));
    assert_eq!(
        out,
        PlacementOutcome::Suppressed {
            reason: SuppressReason::BelowMinSize
        }
    );

    let mut s = surface_with_block();
    let out = s.place(make(), s.options());
    assert!(out.is_placed());
    assert_eq!(
        s.diagnostics(),
        &[Diagnostic::MinSizeViolation {
            name: "Price".into()
        }]
    );
    assert_eq!(s.stats().min_size_violations, 1);
}

#[test]
fn margins_can_be_ignored() {
    let mut s = PlacementSurface::new(4);
    let opts = PlaceOptions::default().ignore_margins(true);
    s.place(Element::margin("Band", 0.0, 0.0, 10.0, 1.0), opts);
    let out = s.place(Element::new("Tag", 2.0, 0.5, 1.0, 1.0), opts);
    assert_eq!(placed_position(&out), Point::new(2.0, 0.5));

    let out = s.place(Element::new("Tag2", 5.0, 0.5, 1.0, 1.0), s.options());
    assert_eq!(placed_position(&out), Point::new(5.0, 1.0));
    assert_eq!(s.margins().count(), 1);
    assert_eq!(s.placed().count(), 2);
}

#[test]
fn shared_siblings_end_at_the_smallest_scale() {
    let mut s = surface_with_block();
    let squeezed = Element::new("Price", 9.0, 1.0, 6.0, 2.0)
        .with_alignment(Alignment::End)
        .fix_x(true)
        .fix_y(true);
    let free = Element::new("Unit", 20.0, 0.0, 3.0, 3.0);
    let opts = s.options();
    let outcomes = s.place_shared(vec![(squeezed, opts), (free, opts)]);
    assert_eq!(outcomes.len(), 2);
    for o in &outcomes {
        assert!(close(o.applied_scale().expect("scaled"), 5.0 / 6.0));
    }
    let unit = s.element(outcomes[1].id().expect("id")).expect("indexed");
    assert!(close(unit.size.width, 2.5));
    assert_eq!(unit.position, Point::new(20.0, 0.0));
}

fn squeezed_price() -> Element {
    Element::new("Price", 9.0, 1.0, 6.0, 2.0)
        .with_alignment(Alignment::End)
        .fix_x(true)
        .fix_y(true)
}

#[test]
fn shared_shrink_suppresses_a_deletable_sibling_below_min_size() {
    let mut s = surface_with_block();
    let opts = s.options();
    let unit = Element::new("Unit", 20.0, 0.0, 3.0, 3.0)
        .with_min_size(Some(2.9), None)
        .critical(true);
    let tail = Element::new("Tail", 30.0, 0.0, 2.0, 2.0);
    let outcomes = s.place_shared(vec![
        (squeezed_price(), opts),
        (unit, opts.deletable(true)),
        (tail, opts),
    ]);

    assert_eq!(
        outcomes[1],
        PlacementOutcome::Suppressed {
            reason: SuppressReason::BelowMinSize
        }
    );
    assert!(s.placed().all(|e| e.name != "Unit"));
    assert_eq!(s.suppressed().len(), 1);
    assert!(!s.suppressed()[0].visible);
    assert!(s.diagnostics().contains(&Diagnostic::CriticalSuppressed {
        name: "Unit".into()
    }));

    // Ids of the remaining siblings still resolve to the right elements.
    let price = s.element(outcomes[0].id().expect("id")).expect("indexed");
    assert_eq!(price.name, "Price");
    let tail = s.element(outcomes[2].id().expect("id")).expect("indexed");
    assert_eq!(tail.name, "Tail");
    assert!(close(tail.size.width, 2.0 * 5.0 / 6.0));
}

#[test]
fn shared_shrink_reports_a_kept_sibling_below_min_size() {
    let mut s = surface_with_block();
    let opts = s.options();
    let unit = Element::new("Unit", 20.0, 0.0, 3.0, 3.0).with_min_size(Some(2.9), None);
    let outcomes = s.place_shared(vec![(squeezed_price(), opts.deletable(true)), (unit, opts)]);
    assert!(outcomes.iter().all(PlacementOutcome::is_placed));
    assert_eq!(
        s.diagnostics(),
        &[Diagnostic::MinSizeViolation {
            name: "Unit".into()
        }]
    );
}

#[test]
fn rotated_elements_anchor_at_their_far_corner() {
    let mut s = PlacementSurface::new(4);
    let out = s.place(
        Element::new("Flip", 5.0, 5.0, 2.0, 1.0).rotated(true),
        s.options(),
    );
    assert_eq!(placed_position(&out), Point::new(3.0, 4.0));

    let mut rec = RecordingSurface::new();
    s.render(&mut rec);
    let ops: Vec<&DrawOp> = rec.ops().collect();
    assert_eq!(
        ops,
        vec![
            &DrawOp::Rotate { degrees: 180.0 },
            &DrawOp::Rectangle {
                x: -5.0,
                y: -5.0,
                w: 2.0,
                h: 1.0
            },
            &DrawOp::Rotate { degrees: -180.0 },
        ]
    );
}
