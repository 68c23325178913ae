//! Catalog runner and benchmark suite for U-CutStock
//!
//! This crate provides:
//! - JSON catalog and solver configuration loading
//! - Synthetic catalog generation
//! - Benchmark runner over multiple strategies
//! - Result recording and comparison

mod dataset;
mod parser;
mod result;
mod runner;
mod synthetic;

pub use dataset::{Catalog, CatalogInfo};
pub use parser::{CatalogParser, ParseError};
pub use result::{BenchmarkResult, RunResult, StrategySummary};
pub use runner::{BenchmarkConfig, BenchmarkRunner};
pub use synthetic::SyntheticGenerator;
