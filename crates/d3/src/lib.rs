//! # U-CutStock 3D
//!
//! 3D cutting-stock packers and search strategies for the U-CutStock engine.
//!
//! This crate provides the greedy extreme point packer, the guillotine cut
//! tree planner and the strategies built on them: genetic algorithm,
//! simulated annealing, a three-stage hybrid pipeline, an adaptive selector
//! and a concurrent multi-strategy orchestrator.

pub mod adaptive;
pub mod extreme_point;
pub mod ga_packing;
pub mod guillotine;
pub mod hybrid;
pub mod orchestrator;
pub mod packer;
pub mod packing_utils;
pub mod sa_packing;

// Re-exports
pub use adaptive::{select_strategy, InstanceSignals};
pub use extreme_point::GreedyPacker;
pub use guillotine::{CutAxis, GuillotinePlanner};
pub use orchestrator::Orchestrator;
pub use packer::Packer3D;
pub use packing_utils::{PackingContext, PlacerKind, StockPacker};
pub use u_cutstock_core::{
    CancellationToken, Config, Error, OptimizationResult, Piece, ProgressReporter, Result, Solver,
    StockBlock, Strategy,
};
