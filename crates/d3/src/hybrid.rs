//! Three-stage hybrid pipeline.
//!
//! 1. Greedy extreme point packing in volume-descending order.
//! 2. A short annealing walk seeded with the stage 1 order; kept only if it
//!    improves the fitness.
//! 3. Residual pass: unplaced instances are retried against the leftover
//!    anchors of every layout, then surplus units of the smallest piece type
//!    fill what remains.
//!
//! The pipeline always decodes with the greedy packer, since stage 3 extends
//! finished layouts through their anchors.

use crate::extreme_point::GreedyPacker;
use crate::packing_utils::{PackOutcome, PackingContext, PlacerKind, StockPacker};
use crate::sa_packing::{anneal, sa_config};
use u_cutstock_core::geometry::{Piece, StockBlock, EPSILON};
use u_cutstock_core::result::{AlgorithmData, HybridAnalysis, Layout, OptimizationResult};
use u_cutstock_core::sa::SaSolution;
use u_cutstock_core::solver::{CancellationToken, Config, ProgressReporter};
use u_cutstock_core::Result;

const ALGORITHM: &str = "hybrid";

/// Outcome of the residual pass.
#[derive(Debug, Clone, Default)]
pub struct ResidualFill {
    /// Layouts after refitting and surplus filling.
    pub outcome: PackOutcome,
    /// Number of surplus units added.
    pub surplus_placed: usize,
}

/// Index of the piece type with the smallest unit volume, first on ties.
pub fn smallest_piece(pieces: &[Piece]) -> Option<usize> {
    pieces
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.unit_volume().total_cmp(&b.unit_volume()))
        .map(|(idx, _)| idx)
}

fn stock_of(layout: &Layout) -> StockBlock {
    let d = layout.stock_dimensions;
    let mut stock = StockBlock::new(layout.stock_id.clone(), d.length, d.width, d.height);
    stock.price = layout.unit_price;
    stock
}

/// Retries unplaced instances in every layout, then adds surplus units.
///
/// Surplus units are numbered from the piece quantity upward, so they never
/// collide with requested instances. At most `config.residual_fill_limit`
/// units are added across all layouts.
pub fn fill_residual(ctx: &PackingContext, outcome: PackOutcome, config: &Config) -> ResidualFill {
    let mut unplaced = outcome.unplaced;
    let mut budget = if config.fill_residual_with_surplus {
        config.residual_fill_limit
    } else {
        0
    };
    let filler = smallest_piece(ctx.pieces());
    let mut next_instance = filler.map_or(0, |idx| ctx.pieces()[idx].quantity);
    let mut surplus_placed = 0;

    let mut layouts = Vec::with_capacity(outcome.layouts.len());
    for layout in outcome.layouts {
        let stock = stock_of(&layout);
        let mut packer = GreedyPacker::with_placed(&stock, layout.stock_instance, layout.pieces);

        unplaced.retain(|&idx| {
            let info = ctx.instances()[idx];
            let piece = &ctx.pieces()[info.piece_idx];
            !packer.try_place_with(piece, info.instance_num, &ctx.preferences(idx, 0), false)
        });

        if let Some(piece_idx) = filler {
            let piece = &ctx.pieces()[piece_idx];
            while budget > 0
                && packer.try_place_with(piece, next_instance, ctx.best_fit(piece_idx), true)
            {
                next_instance += 1;
                budget -= 1;
                surplus_placed += 1;
            }
        }

        layouts.push(packer.into_layout());
    }

    ResidualFill {
        outcome: PackOutcome { layouts, unplaced },
        surplus_placed,
    }
}

/// Runs the hybrid pipeline.
pub fn run_hybrid(
    ctx: &PackingContext,
    config: &Config,
    reporter: &ProgressReporter,
    cancelled: &CancellationToken,
) -> Result<OptimizationResult> {
    let greedy;
    let ctx = if ctx.placer() == PlacerKind::Greedy {
        ctx
    } else {
        greedy = ctx.clone().with_placer(PlacerKind::Greedy);
        &greedy
    };

    // Stage 1
    reporter.report(ALGORITHM, 0.0, "Stage 1: greedy packing");
    let seed_order = ctx.seed_order();
    let stage1 = ctx.decode_seed();
    let stage1_efficiency = stage1.efficiency();
    let stage1_fitness = ctx.fitness(&stage1);
    log::info!(
        "hybrid stage 1: efficiency={:.2}%, unplaced={}",
        stage1_efficiency,
        stage1.unplaced.len()
    );

    // Stage 2
    reporter.report(ALGORITHM, 33.0, "Stage 2: annealing refinement");
    let budget = (config.max_iterations as f64 * config.hybrid_refine_fraction)
        .ceil()
        .max(1.0) as u64;
    let sa = sa_config(config).with_max_iterations(budget);
    let sa_result = anneal(ctx, sa, Some(seed_order), config, cancelled, |fraction| {
        reporter.report(
            ALGORITHM,
            33.0 + fraction * 33.0,
            format!("Stage 2: annealing refinement {:.0}%", fraction * 100.0),
        )
    });

    let stage2 = if sa_result.best.objective() > stage1_fitness + EPSILON {
        ctx.decode(&sa_result.best.sequence, &sa_result.best.genes)
    } else {
        stage1
    };
    let stage2_efficiency = stage2.efficiency();
    log::info!(
        "hybrid stage 2: efficiency={:.2}% after {} iterations",
        stage2_efficiency,
        sa_result.iterations
    );

    // Stage 3
    let partial = sa_result.is_partial();
    let residual = if cancelled.is_cancelled() {
        ResidualFill {
            outcome: stage2,
            surplus_placed: 0,
        }
    } else {
        reporter.report(ALGORITHM, 66.0, "Stage 3: residual fill");
        fill_residual(ctx, stage2, config)
    };

    let mut result = ctx.to_result(residual.outcome);
    result.partial = partial || cancelled.is_cancelled();
    log::info!(
        "hybrid stage 3: efficiency={:.2}%, surplus={}",
        result.efficiency,
        residual.surplus_placed
    );

    result.hybrid_analysis = Some(HybridAnalysis {
        stage1_efficiency,
        stage2_efficiency,
        stage3_efficiency: result.efficiency,
        improvement: result.efficiency - stage1_efficiency,
        surplus_placed: residual.surplus_placed,
    });

    let mut data = AlgorithmData::new(ALGORITHM);
    data.iterations = Some(sa_result.iterations);
    data.best_fitness = Some(sa_result.best.objective().max(stage1_fitness));
    data.fitness_history = Some(sa_result.history);
    result.algorithm_data = Some(data);

    reporter.report(ALGORITHM, 100.0, "Complete");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn config() -> Config {
        Config::default()
            .with_seed(9)
            .with_max_iterations(200)
            .with_residual_fill(true, 60)
    }

    #[test]
    fn test_smallest_piece_first_on_ties() {
        let pieces = vec![
            Piece::new("A", 2.0, 2.0, 2.0),
            Piece::new("B", 1.0, 1.0, 1.0),
            Piece::new("C", 1.0, 1.0, 1.0),
        ];
        assert_eq!(smallest_piece(&pieces), Some(1));
        assert_eq!(smallest_piece(&[]), None);
    }

    #[test]
    fn test_surplus_fills_residual_space() {
        let pieces = vec![
            Piece::new("A", 100.0, 100.0, 60.0),
            Piece::new("B", 10.0, 10.0, 10.0),
        ];
        let stocks = vec![StockBlock::new("S", 100.0, 100.0, 100.0)];
        let config = config();
        let ctx = PackingContext::new(&pieces, &stocks, &config);

        let result =
            run_hybrid(&ctx, &config, &ProgressReporter::silent(), &CancellationToken::new())
                .unwrap();
        let analysis = result.hybrid_analysis.as_ref().unwrap();

        assert!(result.all_placed());
        assert_eq!(analysis.surplus_placed, 60);
        assert!(analysis.improvement > 0.0);
        assert!(analysis.stage3_efficiency >= analysis.stage1_efficiency);

        let surplus: Vec<_> = result.placements().filter(|p| p.surplus).collect();
        assert_eq!(surplus.len(), 60);
        assert!(surplus.iter().all(|p| p.piece_id == "B" && p.instance >= 1));

        let keys: HashSet<_> = result
            .placements()
            .map(|p| (p.piece_id.clone(), p.instance))
            .collect();
        assert_eq!(keys.len(), result.placed_count());
    }

    #[test]
    fn test_surplus_disabled() {
        let pieces = vec![Piece::new("A", 50.0, 50.0, 50.0)];
        let stocks = vec![StockBlock::new("S", 100.0, 100.0, 100.0)];
        let config = config().with_residual_fill(false, 60);
        let ctx = PackingContext::new(&pieces, &stocks, &config);

        let result =
            run_hybrid(&ctx, &config, &ProgressReporter::silent(), &CancellationToken::new())
                .unwrap();
        let analysis = result.hybrid_analysis.as_ref().unwrap();

        assert_eq!(analysis.surplus_placed, 0);
        assert!(result.placements().all(|p| !p.surplus));
        assert!((analysis.improvement).abs() < 1e-9);
    }

    #[test]
    fn test_residual_refits_unplaced() {
        let pieces = vec![Piece::new("A", 10.0, 10.0, 10.0)];
        let stocks = vec![StockBlock::new("S", 50.0, 50.0, 50.0)];
        let config = config().with_residual_fill(false, 0);
        let ctx = PackingContext::new(&pieces, &stocks, &config);

        let outcome = PackOutcome {
            layouts: vec![Layout::new(&stocks[0], 0, Vec::new())],
            unplaced: vec![0],
        };

        let filled = fill_residual(&ctx, outcome, &config);
        assert!(filled.outcome.unplaced.is_empty());
        assert_eq!(filled.outcome.placed_count(), 1);
    }

    #[test]
    fn test_guillotine_context_still_uses_greedy() {
        let pieces = vec![Piece::new("A", 30.0, 30.0, 30.0).with_quantity(2)];
        let stocks = vec![StockBlock::new("S", 100.0, 100.0, 100.0)];
        let config = config().with_guillotine(true);
        let ctx = PackingContext::new(&pieces, &stocks, &config);

        let result =
            run_hybrid(&ctx, &config, &ProgressReporter::silent(), &CancellationToken::new())
                .unwrap();
        assert!(result.layouts.iter().all(|l| l.cutting_pattern.is_none()));
        assert_eq!(result.strategy(), Some("hybrid"));
    }

    #[test]
    fn test_cancelled_skips_residual_pass() {
        let pieces = vec![Piece::new("A", 10.0, 10.0, 10.0).with_quantity(2)];
        let stocks = vec![StockBlock::new("S", 100.0, 100.0, 100.0)];
        let config = config();
        let ctx = PackingContext::new(&pieces, &stocks, &config);
        let token = CancellationToken::new();
        token.cancel();

        let result = run_hybrid(&ctx, &config, &ProgressReporter::silent(), &token).unwrap();
        assert!(result.partial);
        assert_eq!(result.hybrid_analysis.as_ref().unwrap().surplus_placed, 0);
        assert_eq!(result.placed_count(), 2);
    }
}
