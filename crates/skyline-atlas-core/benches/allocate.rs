use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::{Rng, SeedableRng, rngs::StdRng};
use skyline_atlas_core::prelude::*;

fn generate_sizes(count: usize, min_size: u32, max_size: u32) -> Vec<(u32, u32)> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count)
        .map(|_| {
            (
                rng.gen_range(min_size..=max_size),
                rng.gen_range(min_size..=max_size),
            )
        })
        .collect()
}

fn bench_skyline_allocate(c: &mut Criterion) {
    let mut group = c.benchmark_group("skyline_allocate");

    for count in [100, 500, 2000] {
        let sizes = generate_sizes(count, 8, 48);
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("allocator", count), &sizes, |b, sizes| {
            b.iter(|| {
                let mut sky = SkylineAllocator::new(2048, 2048);
                for &(w, h) in sizes {
                    black_box(sky.allocate(w, h));
                }
                black_box(sky.used())
            });
        });

        group.bench_with_input(BenchmarkId::new("session", count), &sizes, |b, sizes| {
            b.iter(|| {
                let cfg = AtlasConfig::builder()
                    .with_dimensions(512, 512)
                    .depth(PixelDepth::Alpha)
                    .build();
                let Ok(mut session) = AtlasSession::new(cfg) else {
                    return 0;
                };
                for (i, &(w, h)) in sizes.iter().enumerate() {
                    let _ = session.append(format!("tex_{i}"), w, h);
                }
                black_box(session.num_pages())
            });
        });
    }

    group.finish();
}

fn bench_glyph_upload(c: &mut Criterion) {
    let glyph = vec![255u8; 24 * 24];
    c.bench_function("page_set_glyphs", |b| {
        b.iter(|| {
            let Ok(mut page) = AtlasPage::new(1024, 1024, 1) else {
                return;
            };
            while let Some(region) = page.allocate(24, 24) {
                let _ = page.set(&region, &glyph, 24);
            }
            black_box(page.used());
        });
    });
}

criterion_group!(benches, bench_skyline_allocate, bench_glyph_upload);
criterion_main!(benches);
