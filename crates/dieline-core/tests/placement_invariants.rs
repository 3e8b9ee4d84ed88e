use dieline_core::element::{Alignment, Element, Remediation};
use dieline_core::placement::{PlacementOutcome, PlacementSurface};
use rand::{Rng, SeedableRng};

fn random_elements(seed: u64, n: usize) -> Vec<Element> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let w = rng.gen_range(0.5..8.0);
            let h = rng.gen_range(0.5..4.0);
            let mut e = Element::new(
                format!("e{i}"),
                rng.gen_range(0.0..50.0),
                rng.gen_range(0.0..25.0),
                w,
                h,
            )
            .with_padding(rng.gen_range(0.0..0.25))
            .fix_x(rng.gen_bool(0.2))
            .fix_y(rng.gen_bool(0.2))
            .rotated(rng.gen_bool(0.1));
            if rng.gen_bool(0.3) {
                e = e.with_alignment(Alignment::End);
            }
            if rng.gen_bool(0.3) {
                e = e.with_remediation(&[Remediation::Scale, Remediation::Translate]);
            }
            e
        })
        .collect()
}

fn run(elements: Vec<Element>) -> (PlacementSurface, Vec<PlacementOutcome>) {
    let mut s = PlacementSurface::new(4);
    let outcomes = elements
        .into_iter()
        .map(|e| {
            let opts = s.options();
            s.place(e, opts)
        })
        .collect();
    (s, outcomes)
}

#[test]
fn visible_elements_never_overlap_earlier_padded_boxes() {
    for seed in [1u64, 7, 42, 2024, 0xDEADBEEF] {
        let (s, _) = run(random_elements(seed, 60));
        let placed: Vec<&Element> = s.placed().collect();
        assert!(placed.iter().all(|e| e.visible));
        for i in 0..placed.len() {
            for j in (i + 1)..placed.len() {
                let earlier = placed[i].bounds().inflate(placed[i].padding);
                assert!(
                    !placed[j].bounds().overlaps(&earlier),
                    "seed {seed}: {} overlaps {}",
                    placed[j].name,
                    placed[i].name
                );
            }
        }
    }
}

#[test]
fn placed_elements_respect_their_scale_floor() {
    for seed in [3u64, 11, 99] {
        let (s, outcomes) = run(random_elements(seed, 80));
        for e in s.placed() {
            assert!(e.cumulative_scale() >= e.min_scale - 1e-9, "seed {seed}: {}", e.name);
            let init = e.initial_size();
            assert!(e.size.width >= init.width * e.min_scale - 1e-9);
            assert!(e.size.height >= init.height * e.min_scale - 1e-9);
        }
        let placed = outcomes.iter().filter(|o| o.is_placed()).count();
        assert_eq!(placed + s.suppressed().len(), outcomes.len());
    }
}

#[test]
fn replay_is_bit_identical() {
    for seed in [5u64, 123, 0xC0FFEE] {
        let (a, oa) = run(random_elements(seed, 50));
        let (b, ob) = run(random_elements(seed, 50));
        assert_eq!(oa, ob);
        assert_eq!(a.indexed(), b.indexed());
        assert_eq!(a.diagnostics(), b.diagnostics());
    }
}
