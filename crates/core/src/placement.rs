//! Placement of one piece instance inside one stock instance.

use crate::aabb::Aabb3;
use crate::geometry::{Dimensions, PieceId, Rotation};
use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A piece instance positioned inside a stock instance.
///
/// `length`, `width` and `height` are the oriented extents along x, y and z,
/// so the occupied box is `[x, x + length) × [y, y + width) × [z, z + height)`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Placement {
    /// Catalog id of the placed piece.
    pub piece_id: PieceId,
    /// Instance number within the piece's quantity.
    pub instance: usize,
    /// Catalog id of the stock block.
    pub stock_id: PieceId,
    /// Instance number within the stock block's quantity.
    pub stock_instance: usize,
    /// Anchor x, measured from the stock origin corner.
    pub x: f64,
    /// Anchor y.
    pub y: f64,
    /// Anchor z.
    pub z: f64,
    /// True for any non-identity rotation.
    pub rotated: bool,
    /// Axis permutation applied to the nominal dimensions.
    pub rotation: Rotation,
    /// Oriented extent along x.
    pub length: f64,
    /// Oriented extent along y.
    pub width: f64,
    /// Oriented extent along z.
    pub height: f64,
    /// Extra unit beyond the required quantity, added while filling residual space.
    #[cfg_attr(feature = "serde", serde(default))]
    pub surplus: bool,
}

impl Placement {
    /// Creates a placement from an anchor, a rotation and the nominal piece dimensions.
    pub fn new(
        piece_id: impl Into<PieceId>,
        instance: usize,
        stock_id: impl Into<PieceId>,
        stock_instance: usize,
        anchor: (f64, f64, f64),
        rotation: Rotation,
        nominal: &Dimensions,
    ) -> Self {
        let oriented = nominal.rotated(rotation);
        Self {
            piece_id: piece_id.into(),
            instance,
            stock_id: stock_id.into(),
            stock_instance,
            x: anchor.0,
            y: anchor.1,
            z: anchor.2,
            rotated: rotation.is_rotated(),
            rotation,
            length: oriented.length,
            width: oriented.width,
            height: oriented.height,
            surplus: false,
        }
    }

    /// Marks the placement as a surplus unit.
    pub fn with_surplus(mut self, surplus: bool) -> Self {
        self.surplus = surplus;
        self
    }

    /// Returns the oriented extents.
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.length, self.width, self.height)
    }

    /// Returns the occupied volume.
    pub fn volume(&self) -> f64 {
        self.dimensions().volume()
    }

    /// Returns the occupied box.
    pub fn aabb(&self) -> Aabb3 {
        Aabb3::from_origin(self.x, self.y, self.z, &self.dimensions())
    }
}

/// Placement statistics for a set of placements.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PlacementStats {
    /// Total number of placements.
    pub count: usize,
    /// Number of rotated placements.
    pub rotated_count: usize,
    /// Number of surplus placements.
    pub surplus_count: usize,
    /// Distribution of rotations used.
    pub rotation_distribution: HashMap<Rotation, usize>,
    /// Placements per piece id.
    pub piece_distribution: HashMap<PieceId, usize>,
}

impl PlacementStats {
    /// Computes statistics from a set of placements.
    pub fn from_placements<'a>(placements: impl IntoIterator<Item = &'a Placement>) -> Self {
        let mut stats = Self::default();

        for p in placements {
            stats.count += 1;
            if p.rotated {
                stats.rotated_count += 1;
            }
            if p.surplus {
                stats.surplus_count += 1;
            }

            *stats.rotation_distribution.entry(p.rotation).or_insert(0) += 1;
            *stats
                .piece_distribution
                .entry(p.piece_id.clone())
                .or_insert(0) += 1;
        }

        stats
    }
}
