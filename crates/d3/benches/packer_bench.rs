//! Benchmarks for 3D cutting-stock packing.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use u_cutstock_d3::{Config, Packer3D, Piece, Solver, StockBlock, Strategy};

fn catalog() -> (Vec<Piece>, Vec<StockBlock>) {
    let pieces = (0..10)
        .map(|i| {
            let side = 8.0 + (i % 4) as f64 * 3.0;
            Piece::new(format!("P{}", i), side, side + 2.0, side * 0.5 + 4.0).with_quantity(3)
        })
        .collect();
    let stocks = vec![StockBlock::new("S", 100.0, 100.0, 100.0).with_quantity(2)];
    (pieces, stocks)
}

fn packer_benchmark(c: &mut Criterion) {
    let (pieces, stocks) = catalog();

    for strategy in [Strategy::Basic, Strategy::Guillotine] {
        let packer = Packer3D::new(Config::default().with_strategy(strategy));
        c.bench_function(&format!("pack_30_{}", strategy), |b| {
            b.iter(|| {
                let result = packer.solve(black_box(&pieces), black_box(&stocks));
                black_box(result)
            })
        });
    }

    let ga = Packer3D::new(
        Config::default()
            .with_strategy(Strategy::Genetic)
            .with_seed(1)
            .with_population_size(20)
            .with_max_generations(10),
    );
    c.bench_function("pack_30_genetic_10_gens", |b| {
        b.iter(|| {
            let result = ga.solve(black_box(&pieces), black_box(&stocks));
            black_box(result)
        })
    });
}

criterion_group!(benches, packer_benchmark);
criterion_main!(benches);
