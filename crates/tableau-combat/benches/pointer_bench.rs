use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use tableau_combat::{compute_grid, nearest_cell};
use tableau_common::PercentPoint;

fn bench_nearest_cell(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest_cell");

    // Reference canvas at shrinking hex sizes: tens up to hundreds of rows.
    for hex_size in [100.0, 25.0, 5.0] {
        let geometry = compute_grid(1667.0, 953.0, hex_size, 3).expect("valid grid");
        let cells = geometry.column_count() * geometry.row_count();

        group.bench_with_input(BenchmarkId::from_parameter(cells), &geometry, |b, geometry| {
            b.iter(|| {
                let cell = nearest_cell(PercentPoint::new(73.4, 61.9), geometry);
                std::hint::black_box(cell);
            });
        });
    }

    group.finish();
}

fn bench_compute_grid(c: &mut Criterion) {
    c.bench_function("compute_grid", |b| {
        b.iter(|| {
            let geometry = compute_grid(1667.0, 953.0, 20.0, 3);
            let _ = std::hint::black_box(geometry);
        });
    });
}

criterion_group!(benches, bench_nearest_cell, bench_compute_grid);
criterion_main!(benches);
