//! Catalog types for benchmark instances.

use serde::{Deserialize, Serialize};
use u_cutstock_core::{Piece, StockBlock};

/// Information about a catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogInfo {
    /// Catalog name
    pub name: String,
    /// Number of piece types
    pub piece_types: usize,
    /// Total pieces when quantities are expanded
    pub total_pieces: usize,
    /// Number of stock types
    pub stock_types: usize,
    /// Total stock instances
    pub stock_instances: usize,
    /// Volume of all requested pieces
    pub required_volume: f64,
    /// Volume of all stock instances
    pub stock_volume: f64,
}

/// A piece and stock catalog to optimize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    /// Catalog name
    pub name: String,
    /// Requested pieces
    pub pieces: Vec<Piece>,
    /// Available stock blocks
    pub stocks: Vec<StockBlock>,
}

impl Catalog {
    /// Creates a catalog.
    pub fn new(name: impl Into<String>, pieces: Vec<Piece>, stocks: Vec<StockBlock>) -> Self {
        Self {
            name: name.into(),
            pieces,
            stocks,
        }
    }

    /// Returns catalog information.
    pub fn info(&self) -> CatalogInfo {
        CatalogInfo {
            name: self.name.clone(),
            piece_types: self.pieces.len(),
            total_pieces: self.total_pieces(),
            stock_types: self.stocks.len(),
            stock_instances: self.stocks.iter().map(|s| s.quantity).sum(),
            required_volume: self.pieces.iter().map(Piece::total_volume).sum(),
            stock_volume: self
                .stocks
                .iter()
                .map(|s| s.volume() * s.quantity as f64)
                .sum(),
        }
    }

    /// Total pieces when quantities are expanded.
    pub fn total_pieces(&self) -> usize {
        self.pieces.iter().map(|p| p.quantity).sum()
    }

    /// Volume-based lower bound on stock instances of the first stock type.
    pub fn volume_lower_bound(&self) -> Option<usize> {
        let first = self.stocks.first()?;
        let required: f64 = self.pieces.iter().map(Piece::total_volume).sum();
        Some((required / first.volume()).ceil() as usize)
    }
}
