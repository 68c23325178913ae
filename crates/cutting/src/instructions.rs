//! Shop-floor cutting sequence.
//!
//! Every layout becomes one `setup` step, one `cut` step per placement in
//! placement order and one `quality` step. Steps are numbered globally
//! from 1 across all layouts.

use crate::config::CuttingConfig;
use u_cutstock_core::result::{CuttingInstruction, OptimizationResult};

/// Builds the cutting sequence of a result.
pub fn build_cutting_instructions(
    result: &OptimizationResult,
    config: &CuttingConfig,
) -> Vec<CuttingInstruction> {
    let mut steps = Vec::with_capacity(result.placed_count() + 2 * result.layouts_used());
    let mut step = 0;
    let mut next = || {
        step += 1;
        step
    };

    for layout in &result.layouts {
        steps.push(CuttingInstruction::Setup {
            step: next(),
            stock_id: layout.stock_id.clone(),
            stock_instance: layout.stock_instance,
            dimensions: layout.stock_dimensions,
            estimated_minutes: config.setup_minutes,
        });

        for (idx, p) in layout.pieces.iter().enumerate() {
            steps.push(CuttingInstruction::Cut {
                step: next(),
                stock_id: layout.stock_id.clone(),
                stock_instance: layout.stock_instance,
                piece_id: p.piece_id.clone(),
                instance: p.instance,
                sequence: idx + 1,
                x: p.x,
                y: p.y,
                z: p.z,
                rotated: p.rotated,
                dimensions: p.dimensions(),
                estimated_minutes: config.cut_minutes,
            });
        }

        steps.push(CuttingInstruction::Quality {
            step: next(),
            stock_id: layout.stock_id.clone(),
            stock_instance: layout.stock_instance,
            piece_count: layout.pieces.len(),
            estimated_minutes: config.quality_minutes,
        });
    }

    steps
}

/// Builds the cutting sequence and stores it on the result.
pub fn attach_instructions(result: &mut OptimizationResult, config: &CuttingConfig) {
    let steps = build_cutting_instructions(result, config);
    log::debug!(
        "built {} cutting steps for {} layouts",
        steps.len(),
        result.layouts_used()
    );
    result.cutting_instructions = Some(steps);
}

/// Total estimated minutes of a cutting sequence.
pub fn total_minutes(steps: &[CuttingInstruction]) -> f64 {
    steps.iter().map(CuttingInstruction::estimated_minutes).sum()
}
