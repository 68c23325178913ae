//! Engine facade over the 3D strategies and the cutting outputs.

use u_cutstock_core::geometry::{Piece, StockBlock};
use u_cutstock_core::result::OptimizationResult;
use u_cutstock_core::solver::{CancellationToken, Config, ProgressReporter, Solver, Strategy};
use u_cutstock_core::Result;
use u_cutstock_cutting::{attach_instructions, CuttingConfig};
use u_cutstock_d3::{Orchestrator, Packer3D};

/// Runs strategies and attaches cutting instructions to every result.
#[derive(Debug, Clone, Default)]
pub struct CutStockEngine {
    config: Config,
    cutting: CuttingConfig,
    reporter: ProgressReporter,
    cancelled: CancellationToken,
}

impl CutStockEngine {
    /// Creates an engine with the given solver configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Sets the instruction time estimates.
    pub fn with_cutting_config(mut self, cutting: CuttingConfig) -> Self {
        self.cutting = cutting;
        self
    }

    /// Subscribes a progress reporter to every run.
    pub fn with_progress(mut self, reporter: ProgressReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Returns a handle that cancels the engine's runs.
    ///
    /// A cancelled engine stays cancelled; later runs return their seed
    /// candidates as partial results.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancelled.clone()
    }

    /// Returns the solver configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Greedy extreme point packing.
    pub fn optimize(&self, pieces: &[Piece], stocks: &[StockBlock]) -> Result<OptimizationResult> {
        self.run(Strategy::Basic, pieces, stocks)
    }

    /// Guillotine-constrained packing with cut counts.
    pub fn optimize_guillotine(
        &self,
        pieces: &[Piece],
        stocks: &[StockBlock],
    ) -> Result<OptimizationResult> {
        self.run(Strategy::Guillotine, pieces, stocks)
    }

    /// Runs `strategies` concurrently and returns the best with a comparison.
    pub fn optimize_with_multiple_algorithms(
        &self,
        pieces: &[Piece],
        stocks: &[StockBlock],
        strategies: &[Strategy],
    ) -> Result<OptimizationResult> {
        let orchestrator = Orchestrator::new(self.config.clone(), strategies.to_vec())
            .with_cancellation(self.cancelled.clone());
        let result = orchestrator.run(pieces, stocks, &self.reporter)?;
        Ok(self.finish(result))
    }

    /// Greedy, annealing refinement and residual fill.
    pub fn optimize_with_hybrid_approach(
        &self,
        pieces: &[Piece],
        stocks: &[StockBlock],
    ) -> Result<OptimizationResult> {
        self.run(Strategy::Hybrid, pieces, stocks)
    }

    /// Picks a strategy from instance signals and runs it with scaled budgets.
    pub fn optimize_with_adaptive_parameters(
        &self,
        pieces: &[Piece],
        stocks: &[StockBlock],
    ) -> Result<OptimizationResult> {
        self.run(Strategy::Adaptive, pieces, stocks)
    }

    /// Runs one strategy.
    pub fn run(
        &self,
        strategy: Strategy,
        pieces: &[Piece],
        stocks: &[StockBlock],
    ) -> Result<OptimizationResult> {
        let packer = Packer3D::new(self.config.clone().with_strategy(strategy))
            .with_cancellation(self.cancelled.clone());
        let result = packer.solve_with_progress(pieces, stocks, &self.reporter)?;
        Ok(self.finish(result))
    }

    fn finish(&self, mut result: OptimizationResult) -> OptimizationResult {
        attach_instructions(&mut result, &self.cutting);
        result
    }
}

/// Greedy extreme point packing with default settings.
pub fn optimize(pieces: &[Piece], stocks: &[StockBlock]) -> Result<OptimizationResult> {
    CutStockEngine::default().optimize(pieces, stocks)
}

/// Guillotine-constrained packing with default settings.
pub fn optimize_guillotine(pieces: &[Piece], stocks: &[StockBlock]) -> Result<OptimizationResult> {
    CutStockEngine::default().optimize_guillotine(pieces, stocks)
}

/// Runs several strategies with default settings and keeps the best.
pub fn optimize_with_multiple_algorithms(
    pieces: &[Piece],
    stocks: &[StockBlock],
    strategies: &[Strategy],
) -> Result<OptimizationResult> {
    CutStockEngine::default().optimize_with_multiple_algorithms(pieces, stocks, strategies)
}

/// Hybrid pipeline with default settings.
pub fn optimize_with_hybrid_approach(
    pieces: &[Piece],
    stocks: &[StockBlock],
) -> Result<OptimizationResult> {
    CutStockEngine::default().optimize_with_hybrid_approach(pieces, stocks)
}

/// Adaptive strategy selection with default settings.
pub fn optimize_with_adaptive_parameters(
    pieces: &[Piece],
    stocks: &[StockBlock],
) -> Result<OptimizationResult> {
    CutStockEngine::default().optimize_with_adaptive_parameters(pieces, stocks)
}
