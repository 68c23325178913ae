//! End-to-end integration tests for cutting outputs.
//!
//! Tests the full pipeline: catalogs → Packer3D.solve() → instructions and reports.

use u_cutstock_core::result::CuttingInstruction;
use u_cutstock_core::solver::{Config, Solver, Strategy};
use u_cutstock_core::{OptimizationResult, Piece, StockBlock};
use u_cutstock_cutting::{
    analyze_waste, attach_instructions, cost_report, max_quantity, total_minutes, CuttingConfig,
};
use u_cutstock_d3::Packer3D;

fn solve(pieces: &[Piece], stocks: &[StockBlock], config: Config) -> OptimizationResult {
    Packer3D::new(config)
        .solve(pieces, stocks)
        .expect("packing should succeed")
}

#[test]
fn test_instructions_cover_every_placement() {
    let pieces = vec![
        Piece::new("A", 40.0, 40.0, 40.0).with_quantity(3),
        Piece::new("B", 20.0, 30.0, 10.0).with_quantity(4),
    ];
    let stocks = vec![StockBlock::new("S", 80.0, 80.0, 50.0).with_quantity(2)];

    let mut result = solve(&pieces, &stocks, Config::default());
    attach_instructions(&mut result, &CuttingConfig::default());
    let steps = result.cutting_instructions.as_ref().unwrap();

    let cuts = steps
        .iter()
        .filter(|s| matches!(s, CuttingInstruction::Cut { .. }))
        .count();
    let setups = steps
        .iter()
        .filter(|s| matches!(s, CuttingInstruction::Setup { .. }))
        .count();

    assert_eq!(cuts, result.placed_count());
    assert_eq!(setups, result.layouts_used());
    assert_eq!(steps.len(), cuts + 2 * setups);
    for (i, step) in steps.iter().enumerate() {
        assert_eq!(step.step(), i + 1);
    }
}

#[test]
fn test_cost_report_matches_result() {
    let pieces = vec![Piece::new("A", 50.0, 50.0, 50.0).with_quantity(10)];
    let stocks = vec![StockBlock::new("S", 100.0, 100.0, 100.0)
        .with_quantity(3)
        .with_price(120.0)];

    let result = solve(&pieces, &stocks, Config::default());
    let report = cost_report(&result, &stocks, &CuttingConfig::default());

    assert_eq!(result.layouts_used(), 2);
    assert!((report.material_cost - 240.0).abs() < 1e-9);
    assert!((report.material_cost - result.total_cost).abs() < 1e-9);
    assert_eq!(report.total_stocks, 3);
    assert!((report.cutting_minutes - 10.0 * 2.5).abs() < 1e-9);
    assert!((report.setup_minutes - 2.0 * 15.0).abs() < 1e-9);

    let mut with_steps = result.clone();
    attach_instructions(&mut with_steps, &CuttingConfig::default());
    let minutes = total_minutes(with_steps.cutting_instructions.as_ref().unwrap());
    assert!((minutes - (report.total_minutes + 2.0 * 5.0)).abs() < 1e-9);
}

#[test]
fn test_waste_analysis_matches_efficiency() {
    let pieces = vec![
        Piece::new("A", 60.0, 60.0, 60.0),
        Piece::new("B", 10.0, 10.0, 10.0).with_quantity(2),
    ];
    let stocks = vec![StockBlock::new("S", 100.0, 100.0, 100.0)];

    let result = solve(&pieces, &stocks, Config::default());
    let analysis = analyze_waste(&result, &pieces);

    let stock_volume: f64 = analysis.layouts.iter().map(|l| l.stock_volume).sum();
    let waste_share = analysis.total_waste_volume / stock_volume * 100.0;
    assert!((waste_share - result.total_waste).abs() < 1e-9);
    assert_eq!(analysis.smallest_piece.as_deref(), Some("B"));
    assert!(analysis.additional_units > 0);
}

#[test]
fn test_guillotine_layouts_carry_patterns() {
    let pieces = vec![Piece::new("A", 30.0, 20.0, 10.0).with_quantity(6)];
    let stocks = vec![StockBlock::new("S", 60.0, 60.0, 60.0)];

    let result = solve(
        &pieces,
        &stocks,
        Config::default().with_strategy(Strategy::Guillotine),
    );

    assert!(result.all_placed());
    assert!(result.total_cuts() > 0);
    assert!(result.layouts.iter().all(|l| l.cutting_pattern.is_some()));
}

#[test]
fn test_max_quantity_is_packable_upper_bound() {
    let piece = Piece::new("A", 25.0, 25.0, 25.0);
    let stocks = vec![StockBlock::new("S", 100.0, 100.0, 50.0)];

    let n = max_quantity(&piece, &stocks, true);
    assert_eq!(n, 32);

    let result = solve(&[piece.with_quantity(n)], &stocks, Config::default());
    assert!(result.all_placed());
    assert!((result.efficiency - 100.0).abs() < 1e-9);
}
