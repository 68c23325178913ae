//! Material cost and production time report.

use crate::config::CuttingConfig;
use u_cutstock_core::geometry::StockBlock;
use u_cutstock_core::result::OptimizationResult;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Cost and time estimates of one result.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CostReport {
    /// Sum of unit prices of the used stock instances.
    pub material_cost: f64,
    /// Share of the material cost lost to waste.
    pub waste_cost: f64,
    /// `material_cost - waste_cost`.
    pub net_cost: f64,
    /// Minutes spent cutting pieces.
    pub cutting_minutes: f64,
    /// Minutes spent mounting blocks.
    pub setup_minutes: f64,
    /// `cutting_minutes + setup_minutes`.
    pub total_minutes: f64,
    /// Placed pieces per hour of total time.
    pub pieces_per_hour: f64,
    /// Stock instances used.
    pub used_stocks: usize,
    /// Stock instances available.
    pub total_stocks: usize,
    /// `used_stocks / total_stocks` in percent.
    pub stock_usage: f64,
    /// Unweighted mean of layout utilizations in percent.
    pub average_utilization: f64,
    /// Waste volume across used layouts.
    pub waste_volume: f64,
}

/// Computes the cost report of a result.
///
/// Material cost comes from the per-layout unit prices, so stock without a
/// price contributes nothing.
pub fn cost_report(
    result: &OptimizationResult,
    stocks: &[StockBlock],
    config: &CuttingConfig,
) -> CostReport {
    let used_stocks = result.layouts_used();
    let total_stocks: usize = stocks.iter().map(|s| s.quantity).sum();
    let placed = result.placed_count();

    let material_cost = result.total_cost;
    let waste_cost = material_cost * result.total_waste / 100.0;

    let cutting_minutes = placed as f64 * config.cut_minutes;
    let setup_minutes = used_stocks as f64 * config.setup_minutes;
    let total_minutes = cutting_minutes + setup_minutes;

    let average_utilization = if used_stocks == 0 {
        0.0
    } else {
        result.layouts.iter().map(|l| l.utilization).sum::<f64>() / used_stocks as f64
    };

    CostReport {
        material_cost,
        waste_cost,
        net_cost: material_cost - waste_cost,
        cutting_minutes,
        setup_minutes,
        total_minutes,
        pieces_per_hour: if total_minutes > 0.0 {
            placed as f64 / (total_minutes / 60.0)
        } else {
            0.0
        },
        used_stocks,
        total_stocks,
        stock_usage: if total_stocks > 0 {
            used_stocks as f64 / total_stocks as f64 * 100.0
        } else {
            0.0
        },
        average_utilization,
        waste_volume: result.layouts.iter().map(|l| l.waste_volume()).sum(),
    }
}
