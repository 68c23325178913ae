//! Adaptive strategy selection.
//!
//! Measures a few cheap signals of the problem instance, picks one of the
//! concrete strategies with fixed rules and scales the search budgets to the
//! instance count before running it through [`Packer3D`].

use crate::packer::Packer3D;
use u_cutstock_core::geometry::{Piece, StockBlock};
use u_cutstock_core::result::{AdaptiveSelection, AlgorithmData, OptimizationResult};
use u_cutstock_core::solver::{
    AdaptiveThresholds, CancellationToken, Config, ProgressReporter, Solver, Strategy,
};
use u_cutstock_core::Result;

/// Signals the selector decides on.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceSignals {
    /// Number of piece types.
    pub piece_types: usize,
    /// Total number of requested instances.
    pub instance_count: usize,
    /// Largest per-axis coefficient of variation (σ/μ) across piece types.
    ///
    /// Each type's edges are sorted longest first so rotated copies of the
    /// same shape measure alike. A single type always measures 0.
    pub dimension_variation: f64,
    /// Total number of stock instances.
    pub stock_instances: usize,
}

impl InstanceSignals {
    /// Measures the signals of a catalog pair.
    pub fn measure(pieces: &[Piece], stocks: &[StockBlock]) -> Self {
        let edges: Vec<[f64; 3]> = pieces
            .iter()
            .map(|p| {
                let mut e = p.dimensions.as_array();
                e.sort_by(|a, b| b.total_cmp(a));
                e
            })
            .collect();
        let dimension_variation = (0..3)
            .map(|axis| {
                let column: Vec<f64> = edges.iter().map(|e| e[axis]).collect();
                coefficient_of_variation(&column)
            })
            .fold(0.0, f64::max);

        Self {
            piece_types: pieces.len(),
            instance_count: pieces.iter().map(|p| p.quantity).sum(),
            dimension_variation,
            stock_instances: stocks.iter().map(|s| s.quantity).sum(),
        }
    }
}

fn coefficient_of_variation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() / mean
}

/// Picks a strategy. The first matching rule wins.
pub fn select_strategy(
    signals: &InstanceSignals,
    thresholds: &AdaptiveThresholds,
) -> (Strategy, &'static str) {
    if signals.instance_count <= thresholds.small_instance_limit
        && signals.dimension_variation <= thresholds.uniform_variation
        && signals.stock_instances <= thresholds.small_stock_limit
    {
        return (Strategy::Basic, "small uniform problem with few stock blocks");
    }

    if signals.instance_count > thresholds.large_instance_limit
        || signals.dimension_variation > thresholds.high_variation
    {
        return (Strategy::Genetic, "many instances or highly varied dimensions");
    }

    if signals.instance_count <= thresholds.medium_instance_limit
        && thresholds.target_efficiency.is_some()
    {
        return (Strategy::Annealing, "medium problem with an efficiency target");
    }

    (Strategy::Hybrid, "mixed problem")
}

/// Scales search budgets to the instance count and records the choice.
pub fn adapt_config(
    config: &Config,
    strategy: Strategy,
    reason: &str,
    signals: &InstanceSignals,
) -> (Config, AdaptiveSelection) {
    let n = signals.instance_count;
    let mut adapted = config.clone().with_strategy(strategy);
    let mut selection = AdaptiveSelection {
        chosen: strategy.name().to_string(),
        reason: reason.to_string(),
        piece_types: signals.piece_types,
        instance_count: n,
        dimension_variation: signals.dimension_variation,
        stock_instances: signals.stock_instances,
        population_size: None,
        max_generations: None,
        sa_iterations: None,
    };

    match strategy {
        Strategy::Genetic => {
            let population = (n * 2).clamp(20, 100);
            let generations = (n * 3).clamp(30, 200) as u32;
            adapted = adapted
                .with_population_size(population)
                .with_max_generations(generations);
            selection.population_size = Some(population);
            selection.max_generations = Some(generations);
        }
        Strategy::Annealing | Strategy::Hybrid => {
            let iterations = (n as u64 * 100).clamp(1_000, 20_000);
            adapted = adapted.with_max_iterations(iterations);
            selection.sa_iterations = Some(iterations);
        }
        _ => {}
    }

    if strategy == Strategy::Annealing {
        if let Some(target) = config.adaptive.target_efficiency {
            adapted = adapted.with_target_efficiency(target);
        }
    }

    (adapted, selection)
}

/// Selects a strategy from instance signals and runs it.
pub fn run_adaptive(
    pieces: &[Piece],
    stocks: &[StockBlock],
    config: &Config,
    reporter: &ProgressReporter,
    cancelled: &CancellationToken,
) -> Result<OptimizationResult> {
    let signals = InstanceSignals::measure(pieces, stocks);
    let (strategy, reason) = select_strategy(&signals, &config.adaptive);
    let (adapted, selection) = adapt_config(config, strategy, reason, &signals);

    log::info!(
        "adaptive: chose {} ({}), instances={}, variation={:.3}, stock instances={}",
        strategy,
        reason,
        signals.instance_count,
        signals.dimension_variation,
        signals.stock_instances
    );
    reporter.report("adaptive", 0.0, format!("Selected {}", strategy));

    let solver = Packer3D::new(adapted).with_cancellation(cancelled.clone());
    let mut result = solver.solve_with_progress(pieces, stocks, reporter)?;

    let mut data = result
        .algorithm_data
        .take()
        .unwrap_or_else(|| AlgorithmData::new(strategy.name()));
    data.strategy = Strategy::Adaptive.name().to_string();
    data.selection = Some(selection);
    result.algorithm_data = Some(data);

    reporter.report("adaptive", 100.0, "Complete");
    Ok(result)
}
