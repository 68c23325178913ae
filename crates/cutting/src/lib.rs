//! Shop-floor outputs for 3D cutting-stock results.
//!
//! Given an optimization result (layouts with placed pieces), this crate
//! derives what the workshop needs:
//! - A numbered cutting sequence (setup, cut, quality steps)
//! - Material cost and production time estimates
//! - Per-layout waste analysis and quantity planning helpers

pub mod config;
pub mod cost;
pub mod instructions;
pub mod waste;

pub use config::CuttingConfig;
pub use cost::{cost_report, CostReport};
pub use instructions::{attach_instructions, build_cutting_instructions, total_minutes};
pub use waste::{
    analyze_waste, max_quantity, suggest_quantities, LayoutWaste, QuantitySuggestion,
    WasteAnalysis,
};
