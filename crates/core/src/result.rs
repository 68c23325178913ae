//! Optimization result representation and aggregate metrics.

use crate::geometry::{Dimensions, PieceId, StockBlock};
use crate::placement::{Placement, PlacementStats};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A piece instance that could not be placed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct UnplacedPiece {
    /// Catalog id of the piece.
    pub piece_id: PieceId,
    /// Instance number within the piece's quantity.
    pub instance: usize,
}

/// Straight-through cuts that separate a guillotine layout.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CuttingPattern {
    /// Cut positions along z.
    pub horizontal_cuts: Vec<f64>,
    /// Cut positions along x or y.
    pub vertical_cuts: Vec<f64>,
    /// Number of cuts.
    pub total_cuts: usize,
}

/// One step of the shop-floor cutting sequence.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")
)]
pub enum CuttingInstruction {
    /// Mount a stock block on the machine.
    Setup {
        /// Global step number, starting at 1.
        step: usize,
        /// Stock block id.
        stock_id: PieceId,
        /// Stock instance number.
        stock_instance: usize,
        /// Block dimensions.
        dimensions: Dimensions,
        /// Estimated duration.
        estimated_minutes: f64,
    },
    /// Cut out one piece.
    Cut {
        /// Global step number.
        step: usize,
        /// Stock block id.
        stock_id: PieceId,
        /// Stock instance number.
        stock_instance: usize,
        /// Piece id.
        piece_id: PieceId,
        /// Piece instance number.
        instance: usize,
        /// Cut order within the layout, starting at 1.
        sequence: usize,
        /// Anchor x.
        x: f64,
        /// Anchor y.
        y: f64,
        /// Anchor z.
        z: f64,
        /// Whether the piece is rotated.
        rotated: bool,
        /// Oriented piece dimensions.
        dimensions: Dimensions,
        /// Estimated duration.
        estimated_minutes: f64,
    },
    /// Inspect the pieces cut from one block.
    Quality {
        /// Global step number.
        step: usize,
        /// Stock block id.
        stock_id: PieceId,
        /// Stock instance number.
        stock_instance: usize,
        /// Number of pieces to inspect.
        piece_count: usize,
        /// Estimated duration.
        estimated_minutes: f64,
    },
}

impl CuttingInstruction {
    /// Returns the global step number.
    pub fn step(&self) -> usize {
        match self {
            CuttingInstruction::Setup { step, .. }
            | CuttingInstruction::Cut { step, .. }
            | CuttingInstruction::Quality { step, .. } => *step,
        }
    }

    /// Returns the estimated duration of the step.
    pub fn estimated_minutes(&self) -> f64 {
        match self {
            CuttingInstruction::Setup {
                estimated_minutes, ..
            }
            | CuttingInstruction::Cut {
                estimated_minutes, ..
            }
            | CuttingInstruction::Quality {
                estimated_minutes, ..
            } => *estimated_minutes,
        }
    }
}

/// Signals and outcome of an adaptive strategy selection.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct AdaptiveSelection {
    /// Name of the chosen strategy.
    pub chosen: String,
    /// Human-readable rule that fired.
    pub reason: String,
    /// Number of piece types.
    pub piece_types: usize,
    /// Total number of piece instances.
    pub instance_count: usize,
    /// Coefficient of variation of all piece-type dimensions.
    pub dimension_variation: f64,
    /// Total number of stock instances.
    pub stock_instances: usize,
    /// Scaled GA population size, when the GA is involved.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub population_size: Option<usize>,
    /// Scaled GA generation budget.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub max_generations: Option<u32>,
    /// Scaled SA iteration budget.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub sa_iterations: Option<u64>,
}

/// Strategy-specific run data.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct AlgorithmData {
    /// Strategy that produced the result.
    pub strategy: String,
    /// Wall-clock time of the run.
    pub elapsed_ms: u64,
    /// Total guillotine cuts across all layouts.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub total_cuts: Option<usize>,
    /// GA generations run.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub generations: Option<u32>,
    /// SA iterations run.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub iterations: Option<u64>,
    /// Best fitness reached by a metaheuristic.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub best_fitness: Option<f64>,
    /// Best fitness per generation or temperature level.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub fitness_history: Option<Vec<f64>>,
    /// Adaptive selection record.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub selection: Option<AdaptiveSelection>,
}

impl AlgorithmData {
    /// Creates run data for a strategy.
    pub fn new(strategy: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
            ..Default::default()
        }
    }
}

/// Metrics of one candidate run in a multi-algorithm comparison.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct AlgorithmRun {
    /// Strategy name.
    pub algorithm: String,
    /// Volume-weighted efficiency in percent.
    pub efficiency: f64,
    /// Waste in percent.
    pub total_waste: f64,
    /// Number of stock instances used.
    pub layouts_used: usize,
    /// Number of placed instances.
    pub placed_count: usize,
    /// Number of unplaced instances.
    pub unplaced_count: usize,
    /// Guillotine cuts, 0 for non-guillotine runs.
    pub total_cuts: usize,
    /// Wall-clock time of the run.
    pub elapsed_ms: u64,
}

/// Ranked comparison of several strategies on the same input.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct AlgorithmComparison {
    /// Name of the winning strategy.
    pub best_algorithm: String,
    /// One entry per strategy, in run order.
    pub results: Vec<AlgorithmRun>,
}

/// Per-stage efficiencies of the hybrid pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct HybridAnalysis {
    /// Efficiency after greedy packing.
    pub stage1_efficiency: f64,
    /// Efficiency after annealing refinement.
    pub stage2_efficiency: f64,
    /// Efficiency after the residual pass.
    pub stage3_efficiency: f64,
    /// `stage3 - stage1`.
    pub improvement: f64,
    /// Number of surplus units added in the residual pass.
    pub surplus_placed: usize,
}

/// Placements inside one stock instance.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Layout {
    /// Stock block id.
    pub stock_id: PieceId,
    /// Stock instance number.
    pub stock_instance: usize,
    /// Block dimensions.
    pub stock_dimensions: Dimensions,
    /// Block unit price.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub unit_price: Option<f64>,
    /// Placed pieces, in placement order.
    pub pieces: Vec<Placement>,
    /// Placed volume / stock volume × 100.
    pub utilization: f64,
    /// Guillotine cuts, for layouts produced by the guillotine planner.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub cutting_pattern: Option<CuttingPattern>,
}

impl Layout {
    /// Creates a layout and computes its utilization.
    pub fn new(stock: &StockBlock, stock_instance: usize, pieces: Vec<Placement>) -> Self {
        let mut layout = Self {
            stock_id: stock.id.clone(),
            stock_instance,
            stock_dimensions: stock.dimensions,
            unit_price: stock.price,
            pieces,
            utilization: 0.0,
            cutting_pattern: None,
        };
        layout.update_utilization();
        layout
    }

    /// Attaches a guillotine cutting pattern.
    pub fn with_cutting_pattern(mut self, pattern: CuttingPattern) -> Self {
        self.cutting_pattern = Some(pattern);
        self
    }

    /// Recomputes utilization after the piece list changed.
    pub fn update_utilization(&mut self) {
        let stock_volume = self.stock_volume();
        self.utilization = if stock_volume > 0.0 {
            (self.used_volume() / stock_volume * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
    }

    /// Volume of the stock block.
    pub fn stock_volume(&self) -> f64 {
        self.stock_dimensions.volume()
    }

    /// Volume of all placed pieces.
    pub fn used_volume(&self) -> f64 {
        self.pieces.iter().map(Placement::volume).sum()
    }

    /// Stock volume not covered by pieces.
    pub fn waste_volume(&self) -> f64 {
        (self.stock_volume() - self.used_volume()).max(0.0)
    }

    /// Number of guillotine cuts, 0 when no pattern is attached.
    pub fn cut_count(&self) -> usize {
        self.cutting_pattern
            .as_ref()
            .map(|p| p.total_cuts)
            .unwrap_or(0)
    }
}

/// Outcome of an optimization run.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct OptimizationResult {
    /// One layout per used stock instance.
    pub layouts: Vec<Layout>,
    /// Instances that fit nowhere.
    pub unplaced: Vec<UnplacedPiece>,
    /// `100 - efficiency`, or 0 when no stock was used.
    pub total_waste: f64,
    /// Sum of unit prices of used stock instances.
    pub total_cost: f64,
    /// Σ used volume / Σ used stock volume × 100.
    pub efficiency: f64,
    /// True when the run was cancelled or timed out before finishing.
    #[cfg_attr(feature = "serde", serde(default))]
    pub partial: bool,
    /// Ordered shop-floor instructions.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub cutting_instructions: Option<Vec<CuttingInstruction>>,
    /// Strategy-specific data.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub algorithm_data: Option<AlgorithmData>,
    /// Multi-algorithm comparison.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub algorithm_comparison: Option<AlgorithmComparison>,
    /// Hybrid pipeline analysis.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub hybrid_analysis: Option<HybridAnalysis>,
}

impl OptimizationResult {
    /// Creates an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregates layouts into a result.
    ///
    /// Layouts without placements are dropped so every reported stock
    /// instance is actually used.
    pub fn from_layouts(layouts: Vec<Layout>, unplaced: Vec<UnplacedPiece>) -> Self {
        let mut result = Self {
            layouts: layouts.into_iter().filter(|l| !l.pieces.is_empty()).collect(),
            unplaced,
            ..Default::default()
        };
        result.recompute_metrics();
        result
    }

    /// Recomputes efficiency, waste and cost from the current layouts.
    pub fn recompute_metrics(&mut self) {
        for layout in &mut self.layouts {
            layout.update_utilization();
        }

        let stock_volume: f64 = self.layouts.iter().map(Layout::stock_volume).sum();
        let used_volume: f64 = self.layouts.iter().map(Layout::used_volume).sum();

        if self.layouts.is_empty() || stock_volume <= 0.0 {
            self.efficiency = 0.0;
            self.total_waste = 0.0;
        } else {
            self.efficiency = (used_volume / stock_volume * 100.0).clamp(0.0, 100.0);
            self.total_waste = 100.0 - self.efficiency;
        }

        self.total_cost = self.layouts.iter().filter_map(|l| l.unit_price).sum();
    }

    /// Iterates over all placements across layouts.
    pub fn placements(&self) -> impl Iterator<Item = &Placement> {
        self.layouts.iter().flat_map(|l| l.pieces.iter())
    }

    /// Returns the number of placed instances.
    pub fn placed_count(&self) -> usize {
        self.layouts.iter().map(|l| l.pieces.len()).sum()
    }

    /// Returns the number of unplaced instances.
    pub fn unplaced_count(&self) -> usize {
        self.unplaced.len()
    }

    /// Returns the number of stock instances used.
    pub fn layouts_used(&self) -> usize {
        self.layouts.len()
    }

    /// Returns true if every required instance was placed.
    pub fn all_placed(&self) -> bool {
        self.unplaced.is_empty()
    }

    /// Total guillotine cuts across all layouts.
    pub fn total_cuts(&self) -> usize {
        self.layouts.iter().map(Layout::cut_count).sum()
    }

    /// Σ placed volume.
    pub fn used_volume(&self) -> f64 {
        self.layouts.iter().map(Layout::used_volume).sum()
    }

    /// Σ volume of used stock instances.
    pub fn stock_volume(&self) -> f64 {
        self.layouts.iter().map(Layout::stock_volume).sum()
    }

    /// Computes placement statistics.
    pub fn placement_stats(&self) -> PlacementStats {
        PlacementStats::from_placements(self.placements())
    }

    /// Sets the strategy-specific data.
    pub fn with_algorithm_data(mut self, data: AlgorithmData) -> Self {
        self.algorithm_data = Some(data);
        self
    }

    /// Returns the strategy name recorded in the run data.
    pub fn strategy(&self) -> Option<&str> {
        self.algorithm_data.as_ref().map(|d| d.strategy.as_str())
    }

    /// Returns efficiency as a percentage string.
    pub fn efficiency_percent(&self) -> String {
        format!("{:.1}%", self.efficiency)
    }
}

/// Summary statistics for a result.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ResultSummary {
    /// Total instances requested.
    pub total_requested: usize,
    /// Total instances placed (surplus excluded).
    pub total_placed: usize,
    /// Efficiency in percent.
    pub efficiency: f64,
    /// Stock instances used.
    pub layouts_used: usize,
    /// Total cost of used stock.
    pub total_cost: f64,
    /// Computation time in milliseconds.
    pub time_ms: u64,
    /// Strategy used.
    pub strategy: String,
}

impl From<&OptimizationResult> for ResultSummary {
    fn from(result: &OptimizationResult) -> Self {
        let required_placed = result.placements().filter(|p| !p.surplus).count();
        Self {
            total_requested: required_placed + result.unplaced.len(),
            total_placed: required_placed,
            efficiency: result.efficiency,
            layouts_used: result.layouts_used(),
            total_cost: result.total_cost,
            time_ms: result
                .algorithm_data
                .as_ref()
                .map(|d| d.elapsed_ms)
                .unwrap_or(0),
            strategy: result.strategy().unwrap_or("unknown").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rotation;
    use approx::assert_relative_eq;

    fn cube_at(id: &str, x: f64, side: f64, stock: &str) -> Placement {
        Placement::new(
            id,
            0,
            stock,
            0,
            (x, 0.0, 0.0),
            Rotation::Lwh,
            &Dimensions::new(side, side, side),
        )
    }

    #[test]
    fn test_layout_utilization() {
        let stock = StockBlock::new("S", 100.0, 100.0, 100.0);
        let layout = Layout::new(&stock, 0, vec![cube_at("P", 0.0, 50.0, "S")]);
        assert_relative_eq!(layout.utilization, 12.5);
        assert_relative_eq!(layout.waste_volume(), 875_000.0);
    }

    #[test]
    fn test_empty_result() {
        let result = OptimizationResult::from_layouts(Vec::new(), Vec::new());
        assert_eq!(result.efficiency, 0.0);
        assert_eq!(result.total_waste, 0.0);
        assert_eq!(result.total_cost, 0.0);
        assert!(result.all_placed());
    }

    #[test]
    fn test_efficiency_is_volume_weighted() {
        // 100% of a small block and 12.5% of a large one. The unweighted mean
        // would be 56.25%.
        let small = StockBlock::new("small", 50.0, 50.0, 50.0).with_price(10.0);
        let large = StockBlock::new("large", 100.0, 100.0, 100.0).with_price(30.0);

        let layouts = vec![
            Layout::new(&small, 0, vec![cube_at("P", 0.0, 50.0, "small")]),
            Layout::new(&large, 0, vec![cube_at("P", 0.0, 50.0, "large")]),
        ];
        let result = OptimizationResult::from_layouts(layouts, Vec::new());

        let expected = 2.0 * 125_000.0 / (125_000.0 + 1_000_000.0) * 100.0;
        assert_relative_eq!(result.efficiency, expected, epsilon = 1e-9);
        assert_relative_eq!(result.total_waste, 100.0 - expected, epsilon = 1e-9);
        assert_relative_eq!(result.total_cost, 40.0);
    }

    #[test]
    fn test_empty_layouts_are_dropped() {
        let stock = StockBlock::new("S", 10.0, 10.0, 10.0);
        let result = OptimizationResult::from_layouts(vec![Layout::new(&stock, 0, Vec::new())], Vec::new());
        assert_eq!(result.layouts_used(), 0);
        assert_eq!(result.total_waste, 0.0);
    }

    #[test]
    fn test_summary() {
        let stock = StockBlock::new("S", 100.0, 100.0, 100.0);
        let layouts = vec![Layout::new(&stock, 0, vec![cube_at("P", 0.0, 50.0, "S")])];
        let unplaced = vec![UnplacedPiece {
            piece_id: "Q".into(),
            instance: 0,
        }];
        let result = OptimizationResult::from_layouts(layouts, unplaced)
            .with_algorithm_data(AlgorithmData::new("basic"));

        let summary = ResultSummary::from(&result);
        assert_eq!(summary.total_requested, 2);
        assert_eq!(summary.total_placed, 1);
        assert_eq!(summary.strategy, "basic");
        assert_eq!(result.efficiency_percent(), "12.5%");
    }

    #[test]
    fn test_instruction_accessors() {
        let step = CuttingInstruction::Quality {
            step: 7,
            stock_id: "S".into(),
            stock_instance: 0,
            piece_count: 3,
            estimated_minutes: 5.0,
        };
        assert_eq!(step.step(), 7);
        assert_relative_eq!(step.estimated_minutes(), 5.0);
    }
}
