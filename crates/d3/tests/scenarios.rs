//! End-to-end scenarios through the public solver API.

use approx::assert_relative_eq;
use u_cutstock_d3::{Config, Orchestrator, Packer3D, Piece, ProgressReporter, Solver, StockBlock, Strategy};

fn best_fitness(config: Config, pieces: &[Piece], stocks: &[StockBlock]) -> f64 {
    Packer3D::new(config)
        .solve(pieces, stocks)
        .unwrap()
        .algorithm_data
        .and_then(|d| d.best_fitness)
        .unwrap()
}

fn mixed_catalog() -> (Vec<Piece>, Vec<StockBlock>) {
    (
        vec![
            Piece::new("A", 45.0, 30.0, 20.0).with_quantity(4),
            Piece::new("B", 25.0, 25.0, 35.0).with_quantity(5),
            Piece::new("C", 60.0, 15.0, 10.0).with_quantity(6),
        ],
        vec![StockBlock::new("S", 100.0, 60.0, 50.0).with_quantity(3)],
    )
}

#[test]
fn eight_cubes_fill_a_quarter_of_the_stock() {
    let pieces = vec![Piece::new("C", 50.0, 50.0, 50.0).with_quantity(8)];
    let stocks = vec![StockBlock::new("S", 200.0, 200.0, 100.0)];

    let result = Packer3D::default_config().solve(&pieces, &stocks).unwrap();

    assert_eq!(result.placed_count(), 8);
    assert!(result.unplaced.is_empty());
    assert_eq!(result.layouts_used(), 1);
    assert_relative_eq!(result.efficiency, 25.0, epsilon = 1e-9);
    assert_relative_eq!(result.total_waste, 75.0, epsilon = 1e-9);
}

#[test]
fn oversized_piece_is_unplaced() {
    let pieces = vec![Piece::new("X", 100.0, 100.0, 101.0)];
    let stocks = vec![StockBlock::new("S", 100.0, 100.0, 100.0)];

    for strategy in [Strategy::Basic, Strategy::Guillotine] {
        let result = Packer3D::new(Config::default().with_strategy(strategy))
            .solve(&pieces, &stocks)
            .unwrap();

        assert_eq!(result.placed_count(), 0);
        assert_eq!(result.unplaced.len(), 1);
        assert_eq!(result.unplaced[0].piece_id, "X");
        assert_relative_eq!(result.efficiency, 0.0);
        assert_relative_eq!(result.total_waste, 0.0);
    }
}

#[test]
fn orchestrator_picks_higher_efficiency() {
    let pieces = vec![
        Piece::new("L", 60.0, 60.0, 60.0),
        Piece::new("M", 50.0, 50.0, 50.0),
    ];
    let stocks = vec![StockBlock::new("S", 100.0, 100.0, 100.0).with_quantity(2)];
    let config = Config::default()
        .with_seed(42)
        .with_population_size(12)
        .with_max_generations(10);

    let result = Orchestrator::new(config, vec![Strategy::Basic, Strategy::Genetic])
        .run(&pieces, &stocks, &ProgressReporter::silent())
        .unwrap();
    let comparison = result.algorithm_comparison.as_ref().unwrap();
    let (basic, genetic) = (&comparison.results[0], &comparison.results[1]);

    let expected = if genetic.efficiency > basic.efficiency + 1e-9 {
        "genetic"
    } else {
        "basic"
    };
    assert_eq!(comparison.best_algorithm, expected);
    assert_eq!(result.placed_count(), 2);
}

#[test]
fn hybrid_surplus_improves_efficiency() {
    let pieces = vec![
        Piece::new("Big", 100.0, 100.0, 50.0),
        Piece::new("Small", 25.0, 25.0, 25.0),
    ];
    let stocks = vec![StockBlock::new("S", 100.0, 100.0, 100.0)];
    let config = Config::default()
        .with_strategy(Strategy::Hybrid)
        .with_seed(3)
        .with_max_iterations(200);

    let result = Packer3D::new(config).solve(&pieces, &stocks).unwrap();
    let analysis = result.hybrid_analysis.as_ref().unwrap();

    assert!(result.all_placed());
    assert!(analysis.surplus_placed > 0);
    assert!(analysis.improvement > 0.0);
    assert_relative_eq!(
        analysis.improvement,
        analysis.stage3_efficiency - analysis.stage1_efficiency,
        epsilon = 1e-9
    );
}

#[test]
fn basic_packing_is_deterministic() {
    let (pieces, stocks) = mixed_catalog();
    let packer = Packer3D::default_config();

    let first = packer.solve(&pieces, &stocks).unwrap();
    let second = packer.solve(&pieces, &stocks).unwrap();
    assert_eq!(first.layouts, second.layouts);
    assert_eq!(first.unplaced, second.unplaced);
}

#[test]
fn seeded_metaheuristics_are_reproducible() {
    let (pieces, stocks) = mixed_catalog();

    for strategy in [Strategy::Genetic, Strategy::Annealing] {
        let config = Config::default()
            .with_strategy(strategy)
            .with_seed(99)
            .with_population_size(10)
            .with_max_generations(6)
            .with_max_iterations(300);
        let a = Packer3D::new(config.clone()).solve(&pieces, &stocks).unwrap();
        let b = Packer3D::new(config).solve(&pieces, &stocks).unwrap();
        assert_eq!(a.layouts, b.layouts, "strategy {}", strategy);
    }
}

#[test]
fn larger_budget_never_lowers_best_fitness() {
    let (pieces, stocks) = mixed_catalog();

    let ga = |generations| {
        Config::default()
            .with_strategy(Strategy::Genetic)
            .with_seed(7)
            .with_population_size(10)
            .with_stagnation_limit(None)
            .with_max_generations(generations)
    };
    assert!(best_fitness(ga(12), &pieces, &stocks) >= best_fitness(ga(3), &pieces, &stocks) - 1e-9);

    let sa = |iterations| {
        Config::default()
            .with_strategy(Strategy::Annealing)
            .with_seed(7)
            .with_max_iterations(iterations)
    };
    assert!(best_fitness(sa(800), &pieces, &stocks) >= best_fitness(sa(100), &pieces, &stocks) - 1e-9);
}

#[test]
fn efficiency_is_weighted_by_stock_volume() {
    let pieces = vec![
        Piece::new("Fill", 10.0, 10.0, 10.0).with_rotatable(false),
        Piece::new("Tiny", 10.0, 10.0, 10.0).with_rotatable(false),
    ];
    let stocks = vec![
        StockBlock::new("Exact", 10.0, 10.0, 10.0),
        StockBlock::new("Large", 20.0, 20.0, 20.0),
    ];

    let result = Packer3D::default_config().solve(&pieces, &stocks).unwrap();

    assert_eq!(result.layouts_used(), 2);
    // 2000 used over 9000 stock, not the mean of 100% and 12.5%.
    assert_relative_eq!(result.efficiency, 2000.0 / 9000.0 * 100.0, epsilon = 1e-9);
}

#[test]
fn progress_reaches_completion() {
    let (tx, rx) = std::sync::mpsc::channel();
    let (pieces, stocks) = mixed_catalog();
    let config = Config::default()
        .with_strategy(Strategy::Annealing)
        .with_seed(5)
        .with_max_iterations(200);

    Packer3D::new(config)
        .solve_with_progress(&pieces, &stocks, &ProgressReporter::channel(tx))
        .unwrap();

    let updates: Vec<_> = rx.try_iter().collect();
    assert!(!updates.is_empty());
    assert!(updates.iter().all(|u| (0.0..=100.0).contains(&u.progress)));
    assert_eq!(updates.last().map(|u| u.stage.as_str()), Some("Complete"));
}
