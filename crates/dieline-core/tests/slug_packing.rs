use std::collections::HashMap;

use dieline_core::config::SlugConfig;
use dieline_core::element::Element;
use dieline_core::error::DielineError;
use dieline_core::model::Rect;
use dieline_core::render::{DrawOp, RecordingSurface};
use dieline_core::slug::{GroupKey, SlugPacker, pack_many};
use rand::{Rng, SeedableRng};

const EPS: f64 = 1e-9;

fn inside(outer: &Rect, r: &Rect) -> bool {
    r.x >= outer.x - EPS
        && r.y >= outer.y - EPS
        && r.right() <= outer.right() + EPS
        && r.top() <= outer.top() + EPS
}

fn random_elements(seed: u64, n: usize) -> Vec<Element> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let e = Element::new(
                format!("e{i}"),
                rng.gen_range(0.0..20.0),
                rng.gen_range(0.0..4.0),
                rng.gen_range(0.5..8.0),
                rng.gen_range(0.5..4.0),
            );
            if rng.gen_bool(0.4) {
                e.with_group(rng.gen_range(0..5))
            } else {
                e
            }
        })
        .collect()
}

#[test]
fn every_element_lands_once_inside_the_sheet_interior() {
    let cfg = SlugConfig::default();
    let packer = SlugPacker::new(cfg.clone()).expect("config");
    let interior = Rect::new(
        cfg.page_border,
        cfg.page_border,
        cfg.interior_width(),
        cfg.interior_height(),
    );
    for seed in [1u64, 2, 3, 42, 0xBEEF] {
        let elements = random_elements(seed, 40);
        let layout = packer.pack(&elements).expect("pack");

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for p in &layout.placements {
            *seen.entry(p.element.name.as_str()).or_default() += 1;
            assert!(p.sheet_index < layout.num_sheets);
            assert!(inside(&interior, &p.element.bounds()), "seed {seed}: {}", p.element.name);
            let slug = &layout.slugs[p.slug];
            assert_eq!(slug.sheet_index, p.sheet_index);
            assert!(inside(&slug.frame, &p.element.bounds()));
        }
        assert_eq!(seen.len(), elements.len());
        assert!(seen.values().all(|&n| n == 1));

        for (i, a) in layout.slugs.iter().enumerate() {
            assert!(inside(&interior, &a.frame));
            for b in layout.slugs.iter().skip(i + 1) {
                if a.sheet_index == b.sheet_index {
                    assert!(!a.frame.overlaps(&b.frame), "seed {seed}: slugs overlap");
                }
            }
        }
    }
}

#[test]
fn group_members_keep_their_relative_layout() {
    let els = vec![
        Element::new("Logo", 10.0, 10.0, 3.0, 1.0).with_group(0),
        Element::new("Tag", 12.0, 12.0, 1.0, 1.0).with_group(0),
    ];
    let cfg = SlugConfig::default();
    let layout = SlugPacker::new(cfg.clone())
        .and_then(|p| p.pack(&els))
        .expect("pack");
    assert_eq!(layout.slugs.len(), 1);
    assert_eq!(layout.slugs[0].key, GroupKey::Id(0));
    let rm = cfg.registration_margin();
    let logo = &layout.placements[0].element;
    let tag = &layout.placements[1].element;
    assert!((logo.position.x - (cfg.page_border + rm / 2.0)).abs() < EPS);
    assert!((logo.position.y - (cfg.page_border + rm / 2.0)).abs() < EPS);
    assert!((tag.position.x - logo.position.x - 2.0).abs() < EPS);
    assert!((tag.position.y - logo.position.y - 2.0).abs() < EPS);
    let frame = layout.slugs[0].frame;
    assert!((frame.w - (3.0 + rm)).abs() < EPS);
    assert!((frame.h - (3.0 + rm)).abs() < EPS);
}

#[test]
fn widest_slug_goes_first_and_margins_are_dropped() {
    let els = vec![
        Element::new("narrow", 0.0, 0.0, 1.0, 1.0),
        Element::margin("Left", 0.0, 0.0, 1.0, 30.0),
        Element::new("wide", 0.0, 0.0, 9.0, 1.0),
        Element::new("mid", 0.0, 0.0, 4.0, 1.0),
    ];
    let layout = SlugPacker::new(SlugConfig::default())
        .and_then(|p| p.pack(&els))
        .expect("pack");
    let order: Vec<String> = layout.slugs.iter().map(|s| s.key.to_string()).collect();
    assert_eq!(order, vec!["wide", "mid", "narrow"]);
    assert_eq!(layout.placements.len(), 3);
}

#[test]
fn oversize_group_is_a_hard_error() {
    let els = vec![
        Element::new("ok", 0.0, 0.0, 2.0, 2.0),
        Element::new("a", 0.0, 0.0, 30.0, 2.0).with_group(7),
        Element::new("b", 20.0, 0.0, 30.0, 2.0).with_group(7),
    ];
    let err = SlugPacker::new(SlugConfig::default())
        .and_then(|p| p.pack(&els))
        .expect_err("must not pack");
    match err {
        DielineError::UnpackableGroup { group, .. } => assert_eq!(group, "group 7"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn full_sheets_spill_onto_new_pages() {
    let els: Vec<Element> = (0..30)
        .map(|i| Element::new(format!("p{i}"), 0.0, 0.0, 10.0, 4.0))
        .collect();
    let layout = SlugPacker::new(SlugConfig::default())
        .and_then(|p| p.pack(&els))
        .expect("pack");
    assert!(layout.num_sheets > 1);
    let stats = layout.stats();
    assert_eq!(stats.num_elements, 30);
    assert!(stats.occupancy > 0.0 && stats.occupancy < 1.0);
    assert!((stats.wasted_area() - (stats.total_sheet_area - 30.0 * 40.0)).abs() < 1e-9);
    assert!(stats.summary().contains("Wasted"));

    let mut rec = RecordingSurface::new();
    layout.render(&mut rec);
    assert_eq!(rec.pages.len(), layout.num_sheets);
    let lines = rec
        .ops()
        .filter(|op| matches!(op, DrawOp::Line { .. }))
        .count();
    assert_eq!(lines, 30 * 12);
}

#[test]
fn independent_batches_pack_separately() {
    let batches = vec![random_elements(9, 10), random_elements(10, 12)];
    let results = pack_many(&batches, &SlugConfig::default()).expect("config");
    assert_eq!(results.len(), 2);
    let counts: Vec<usize> = results
        .iter()
        .map(|r| r.as_ref().map(|l| l.placements.len()).unwrap_or(0))
        .collect();
    assert_eq!(counts, vec![10, 12]);
}
