//! # U-CutStock Core
//!
//! Core types and abstractions for the U-CutStock 3D cutting-stock engine.
//!
//! This crate provides the foundational types shared by the packing
//! algorithms, the result aggregator and the command-line runner.
//!
//! ## Core Components
//!
//! - **Catalog types**: [`Piece`], [`StockBlock`], [`Dimensions`], [`Rotation`]
//! - **Results**: [`Placement`], [`Layout`], [`OptimizationResult`] and its metrics
//! - **Solver trait**: Common interface for all strategies, with [`Config`],
//!   [`ProgressReporter`] and [`CancellationToken`]
//! - **GA / SA frameworks**: Metaheuristic infrastructure used by the 3D packers
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod aabb;
pub mod error;
pub mod ga;
pub mod geometry;
pub mod placement;
pub mod result;
pub mod sa;
pub mod solver;

// Re-exports
pub use aabb::Aabb3;
pub use error::{Error, Result};
pub use ga::{GaConfig, GaProblem, GaProgress, GaResult, GaRunner, Individual, SelectionMethod};
pub use geometry::{validate_catalogs, Dimensions, Piece, PieceId, Rotation, StockBlock, EPSILON};
pub use placement::{Placement, PlacementStats};
pub use result::{
    AdaptiveSelection, AlgorithmComparison, AlgorithmData, AlgorithmRun, CuttingInstruction,
    CuttingPattern, HybridAnalysis, Layout, OptimizationResult, ResultSummary, UnplacedPiece,
};
pub use sa::{
    NeighborhoodOperator, SaConfig, SaProblem, SaProgress, SaResult, SaRunner, SaSolution,
    SequenceSolution,
};
pub use solver::{
    AdaptiveThresholds, CancellationToken, Config, ProgressCallback, ProgressInfo,
    ProgressReporter, Solver, Strategy,
};
