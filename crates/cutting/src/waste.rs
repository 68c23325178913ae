//! Waste analysis and quantity planning.
//!
//! These are volume estimates for planning; they do not run the packer.
//! [`max_quantity`] is the exception and counts grid-stacked units.

use u_cutstock_core::geometry::{Dimensions, Piece, PieceId, Rotation, StockBlock, EPSILON};
use u_cutstock_core::result::OptimizationResult;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Waste of one used stock instance.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct LayoutWaste {
    /// Stock block id.
    pub stock_id: PieceId,
    /// Stock instance number.
    pub stock_instance: usize,
    /// Volume of the block.
    pub stock_volume: f64,
    /// Volume of the placed pieces.
    pub used_volume: f64,
    /// Unused volume.
    pub waste_volume: f64,
    /// Unused share of the block in percent.
    pub waste_percent: f64,
    /// Units of the smallest piece type the waste could hold by volume.
    pub smallest_piece_capacity: usize,
}

/// Waste across all layouts of a result.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct WasteAnalysis {
    /// Per-layout breakdown in layout order.
    pub layouts: Vec<LayoutWaste>,
    /// Sum of layout waste volumes.
    pub total_waste_volume: f64,
    /// Piece type with the smallest unit volume.
    pub smallest_piece: Option<PieceId>,
    /// Sum of the per-layout capacities.
    pub additional_units: usize,
}

/// Suggested extra quantity for one piece type.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct QuantitySuggestion {
    /// Piece id.
    pub piece_id: PieceId,
    /// Requested quantity.
    pub current: usize,
    /// Extra units the stock volume could still hold.
    pub additional: usize,
}

impl QuantitySuggestion {
    /// `current + additional`.
    pub fn suggested(&self) -> usize {
        self.current + self.additional
    }
}

fn units_by_volume(volume: f64, unit: f64) -> usize {
    if unit <= 0.0 || volume <= 0.0 {
        return 0;
    }
    ((volume + EPSILON) / unit).floor() as usize
}

/// Breaks the waste of a result down per layout.
pub fn analyze_waste(result: &OptimizationResult, pieces: &[Piece]) -> WasteAnalysis {
    let smallest = pieces
        .iter()
        .min_by(|a, b| a.unit_volume().total_cmp(&b.unit_volume()));
    let unit = smallest.map_or(0.0, Piece::unit_volume);

    let layouts: Vec<LayoutWaste> = result
        .layouts
        .iter()
        .map(|layout| {
            let stock_volume = layout.stock_volume();
            let used_volume = layout.used_volume();
            let waste_volume = (stock_volume - used_volume).max(0.0);
            LayoutWaste {
                stock_id: layout.stock_id.clone(),
                stock_instance: layout.stock_instance,
                stock_volume,
                used_volume,
                waste_volume,
                waste_percent: if stock_volume > 0.0 {
                    waste_volume / stock_volume * 100.0
                } else {
                    0.0
                },
                smallest_piece_capacity: units_by_volume(waste_volume, unit),
            }
        })
        .collect();

    WasteAnalysis {
        total_waste_volume: layouts.iter().map(|l| l.waste_volume).sum(),
        additional_units: layouts.iter().map(|l| l.smallest_piece_capacity).sum(),
        smallest_piece: smallest.map(|p| p.id.clone()),
        layouts,
    }
}

/// Extra units per piece type that the total stock volume could still hold.
///
/// Remaining volume is handed out smallest piece type first. Suggestions
/// come back in catalog order; all are zero when the requested volume
/// already exceeds the stock volume.
pub fn suggest_quantities(pieces: &[Piece], stocks: &[StockBlock]) -> Vec<QuantitySuggestion> {
    let stock_volume: f64 = stocks.iter().map(|s| s.volume() * s.quantity as f64).sum();
    let requested: f64 = pieces.iter().map(Piece::total_volume).sum();
    let mut remaining = stock_volume - requested;

    let mut additional = vec![0; pieces.len()];
    let mut by_volume: Vec<usize> = (0..pieces.len()).collect();
    by_volume.sort_by(|&a, &b| pieces[a].unit_volume().total_cmp(&pieces[b].unit_volume()));

    for idx in by_volume {
        let unit = pieces[idx].unit_volume();
        let extra = units_by_volume(remaining, unit);
        additional[idx] = extra;
        remaining -= extra as f64 * unit;
    }

    pieces
        .iter()
        .zip(additional)
        .map(|(p, additional)| QuantitySuggestion {
            piece_id: p.id.clone(),
            current: p.quantity,
            additional,
        })
        .collect()
}

fn grid_count(stock: &Dimensions, piece: &Dimensions) -> usize {
    stock
        .as_array()
        .iter()
        .zip(piece.as_array())
        .map(|(s, p)| ((s + EPSILON) / p).floor() as usize)
        .product()
}

/// Largest number of units of `piece` that grid-stacking can cut from the
/// stock catalog.
///
/// Per stock type the best allowed rotation of `floor(L/l)·floor(W/w)·floor(H/h)`
/// is multiplied by the stock quantity; the counts are summed.
pub fn max_quantity(piece: &Piece, stocks: &[StockBlock], allow_rotation: bool) -> usize {
    let rotations: &[Rotation] = if allow_rotation && piece.rotatable {
        &Rotation::ALL
    } else {
        &[Rotation::Lwh]
    };

    stocks
        .iter()
        .map(|stock| {
            let best = rotations
                .iter()
                .map(|&r| grid_count(&stock.dimensions, &piece.dimensions.rotated(r)))
                .max()
                .unwrap_or(0);
            best * stock.quantity
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use u_cutstock_core::placement::Placement;
    use u_cutstock_core::result::Layout;

    #[test]
    fn test_analyze_waste() {
        let stock = StockBlock::new("S", 10.0, 10.0, 10.0);
        let nominal = Dimensions::new(10.0, 10.0, 6.0);
        let p = Placement::new("A", 0, "S", 0, (0.0, 0.0, 0.0), Rotation::Lwh, &nominal);
        let result = OptimizationResult::from_layouts(vec![Layout::new(&stock, 0, vec![p])], vec![]);
        let pieces = vec![
            Piece::new("A", 10.0, 10.0, 6.0),
            Piece::new("B", 5.0, 5.0, 5.0),
        ];

        let analysis = analyze_waste(&result, &pieces);

        assert_eq!(analysis.layouts.len(), 1);
        assert_relative_eq!(analysis.layouts[0].waste_volume, 400.0);
        assert_relative_eq!(analysis.layouts[0].waste_percent, 40.0);
        // 400 / 125 = 3.2
        assert_eq!(analysis.layouts[0].smallest_piece_capacity, 3);
        assert_eq!(analysis.additional_units, 3);
        assert_eq!(analysis.smallest_piece.as_deref(), Some("B"));
    }

    #[test]
    fn test_analyze_empty_result() {
        let analysis = analyze_waste(&OptimizationResult::new(), &[]);
        assert!(analysis.layouts.is_empty());
        assert_eq!(analysis.smallest_piece, None);
        assert_relative_eq!(analysis.total_waste_volume, 0.0);
    }

    #[test]
    fn test_suggest_smallest_first() {
        let pieces = vec![
            Piece::new("Big", 5.0, 5.0, 4.0),
            Piece::new("Small", 3.0, 3.0, 3.0),
        ];
        let stocks = vec![StockBlock::new("S", 10.0, 10.0, 10.0)];

        let suggestions = suggest_quantities(&pieces, &stocks);

        // 1000 - 100 - 27 = 873; Small takes floor(873 / 27) = 32, leaving 9.
        assert_eq!(suggestions[1].additional, 32);
        assert_eq!(suggestions[0].additional, 0);
        assert_eq!(suggestions[1].suggested(), 33);
        assert_eq!(suggestions[0].piece_id, "Big");
    }

    #[test]
    fn test_suggest_nothing_when_overfull() {
        let pieces = vec![Piece::new("A", 10.0, 10.0, 10.0).with_quantity(3)];
        let stocks = vec![StockBlock::new("S", 10.0, 10.0, 10.0)];
        assert_eq!(suggest_quantities(&pieces, &stocks)[0].additional, 0);
    }

    #[test]
    fn test_max_quantity_uses_best_rotation() {
        let piece = Piece::new("P", 30.0, 10.0, 10.0);
        let stocks = vec![StockBlock::new("S", 20.0, 20.0, 60.0).with_quantity(2)];

        // Identity: 0 along x. Standing up: 2 * 2 * 2 = 8 per block.
        assert_eq!(max_quantity(&piece, &stocks, false), 0);
        assert_eq!(max_quantity(&piece, &stocks, true), 16);

        let fixed = piece.with_rotatable(false);
        assert_eq!(max_quantity(&fixed, &stocks, true), 0);
    }

    #[test]
    fn test_max_quantity_sums_stock_types() {
        let piece = Piece::new("P", 10.0, 10.0, 10.0);
        let stocks = vec![
            StockBlock::new("A", 20.0, 20.0, 20.0),
            StockBlock::new("B", 10.0, 10.0, 30.0).with_quantity(3),
        ];
        assert_eq!(max_quantity(&piece, &stocks, true), 8 + 9);
    }
}
