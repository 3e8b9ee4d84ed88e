use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use dieline_core::prelude::*;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

fn generate_elements(count: usize, seed: u64) -> Vec<Element> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            Element::new(
                format!("el_{}", i),
                rng.gen_range(0.0..48.0),
                rng.gen_range(0.0..24.0),
                rng.gen_range(0.5..6.0),
                rng.gen_range(0.5..3.0),
            )
            .with_padding(0.125)
        })
        .collect()
}

fn bench_placement(c: &mut Criterion) {
    let mut group = c.benchmark_group("placement");
    let cfg = LayoutConfig::default();
    let geometry = BoxGeometry::compute(
        BoxDimensions::new(14.0, 12.0, 16.375),
        "kenton",
        Orientation::Left,
        false,
        &cfg,
    )
    .expect("geometry");

    for count in [25, 100, 400] {
        let elements = generate_elements(count, 7);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(
            BenchmarkId::new("for_box", count),
            &elements,
            |b, elements| {
                b.iter(|| {
                    let mut surface = PlacementSurface::for_box(&geometry, &cfg);
                    let opts = surface.options();
                    for e in elements {
                        black_box(surface.place(e.clone(), opts));
                    }
                    black_box(surface.stats())
                });
            },
        );
    }
    group.finish();
}

fn bench_slugs(c: &mut Criterion) {
    let mut group = c.benchmark_group("slugs");
    let packer = SlugPacker::new(SlugConfig::default()).expect("config");
    for count in [50, 200] {
        let elements: Vec<Element> = generate_elements(count, 11)
            .into_iter()
            .enumerate()
            .map(|(i, mut e)| {
                // Grouped members sit close together so every group fits a sheet.
                e.position = Point::new((i % 4) as f64, (i % 3) as f64);
                if i % 3 == 0 { e.with_group((i % 7) as u32) } else { e }
            })
            .collect();
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("pack", count), &elements, |b, elements| {
            b.iter(|| black_box(packer.pack(elements)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_placement, bench_slugs);
criterion_main!(benches);
