//! Synthetic catalog generator.
//!
//! Produces reproducible piece and stock catalogs for comparing strategies
//! on instances of known shape.

use crate::dataset::Catalog;
use rand::prelude::*;
use u_cutstock_core::{Piece, StockBlock};

/// Generator for synthetic cutting-stock catalogs.
#[derive(Debug, Clone)]
pub struct SyntheticGenerator {
    rng: StdRng,
}

impl Default for SyntheticGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticGenerator {
    /// Creates a new generator with a random seed.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a new generator with a specific seed for reproducibility.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// A few piece types of similar size cut from a single stock block type.
    pub fn uniform(&mut self, piece_types: usize, stock_side: f64) -> Catalog {
        let base = stock_side / 5.0;
        let pieces = (0..piece_types)
            .map(|i| {
                let jitter = |rng: &mut StdRng| (base * rng.gen_range(0.9..1.1)).round().max(1.0);
                let (l, w, h) = (
                    jitter(&mut self.rng),
                    jitter(&mut self.rng),
                    jitter(&mut self.rng),
                );
                Piece::new(format!("P{}", i + 1), l, w, h).with_quantity(self.rng.gen_range(2..=6))
            })
            .collect();

        let stocks =
            vec![StockBlock::new("STOCK", stock_side, stock_side, stock_side).with_quantity(4)];

        Catalog::new("synthetic_uniform", pieces, stocks)
    }

    /// Widely varying piece sizes over several priced stock types.
    pub fn mixed(&mut self, piece_types: usize, stock_side: f64) -> Catalog {
        let pieces = (0..piece_types)
            .map(|i| {
                let l = (stock_side * self.rng.gen_range(0.05..0.6)).round().max(1.0);
                let w = (stock_side * self.rng.gen_range(0.05..0.6)).round().max(1.0);
                let h = (stock_side * self.rng.gen_range(0.05..0.4)).round().max(1.0);
                Piece::new(format!("M{}", i + 1), l, w, h)
                    .with_quantity(self.rng.gen_range(1..=8))
                    .with_rotatable(self.rng.gen_bool(0.8))
            })
            .collect();

        let stocks = vec![
            StockBlock::new("LARGE", stock_side, stock_side, stock_side)
                .with_quantity(3)
                .with_price(stock_side.powi(3) / 1000.0),
            StockBlock::new("SLAB", stock_side, stock_side, stock_side / 2.0)
                .with_quantity(4)
                .with_price(stock_side.powi(3) / 2000.0 * 1.1),
        ];

        Catalog::new("synthetic_mixed", pieces, stocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use u_cutstock_core::validate_catalogs;

    #[test]
    fn test_uniform_is_valid() {
        let catalog = SyntheticGenerator::with_seed(1).uniform(4, 100.0);
        assert_eq!(catalog.pieces.len(), 4);
        assert!(validate_catalogs(&catalog.pieces, &catalog.stocks).is_ok());
        assert!(catalog
            .pieces
            .iter()
            .all(|p| p.fits_in(&catalog.stocks[0].dimensions, false)));
    }

    #[test]
    fn test_mixed_is_valid() {
        let catalog = SyntheticGenerator::with_seed(2).mixed(10, 200.0);
        assert_eq!(catalog.stocks.len(), 2);
        assert!(validate_catalogs(&catalog.pieces, &catalog.stocks).is_ok());
    }

    #[test]
    fn test_seed_reproducible() {
        let a = SyntheticGenerator::with_seed(9).mixed(6, 100.0);
        let b = SyntheticGenerator::with_seed(9).mixed(6, 100.0);
        let dims = |c: &Catalog| -> Vec<[f64; 3]> {
            c.pieces.iter().map(|p| p.dimensions.as_array()).collect()
        };
        assert_eq!(dims(&a), dims(&b));
    }
}
