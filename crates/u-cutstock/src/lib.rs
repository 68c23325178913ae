//! # U-CutStock
//!
//! 3D cutting-stock optimization engine.
//!
//! This crate cuts requested rectangular pieces out of a catalog of stock
//! blocks, minimizing wasted volume. It offers:
//! - **Greedy packing**: Extreme point placement in volume-descending order
//! - **Guillotine packing**: Layouts reachable by straight through-cuts, with cut counts
//! - **Metaheuristics**: Genetic algorithm and simulated annealing over order and rotations
//! - **Hybrid / adaptive**: A three-stage refinement pipeline and a signal-driven selector
//! - **Shop-floor outputs**: Cutting instructions, cost and waste reports
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use u_cutstock::{CutStockEngine, Config, Piece, StockBlock, Strategy};
//!
//! let pieces = vec![Piece::new("A", 40.0, 30.0, 20.0).with_quantity(6)];
//! let stocks = vec![StockBlock::new("S", 100.0, 100.0, 100.0).with_price(80.0)];
//!
//! let engine = CutStockEngine::new(Config::default().with_seed(42));
//! let result = engine.optimize_with_multiple_algorithms(
//!     &pieces,
//!     &stocks,
//!     &[Strategy::Basic, Strategy::Genetic],
//! )?;
//! println!("efficiency: {}", result.efficiency_percent());
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Serialization support

pub mod engine;

/// Core types and abstractions.
pub use u_cutstock_core as core;

/// 3D packers and strategies.
pub use u_cutstock_d3 as d3;

/// Cutting instructions, cost and waste reports.
pub use u_cutstock_cutting as cutting;

pub use engine::{
    optimize, optimize_guillotine, optimize_with_adaptive_parameters,
    optimize_with_hybrid_approach, optimize_with_multiple_algorithms, CutStockEngine,
};

// Re-export commonly used types at root level
pub use u_cutstock_core::{
    CancellationToken, Config, Error, OptimizationResult, Piece, ProgressInfo, ProgressReporter,
    Result, Solver, StockBlock, Strategy,
};
