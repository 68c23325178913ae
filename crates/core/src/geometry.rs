//! Piece and stock catalog types and the box geometry they share.
//!
//! All lengths are expressed in a single linear unit chosen by the caller;
//! the engine never converts units.

use crate::{Error, Result};
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tolerance used for all geometric comparisons.
pub const EPSILON: f64 = 1e-9;

/// Unique identifier of a catalog entry.
pub type PieceId = String;

/// One of the six ways to assign a box's three dimensions to the stock axes.
///
/// The letters name which source dimension lands on the x, y and z axis
/// respectively (L = length, W = width, H = height).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Rotation {
    /// Identity.
    #[default]
    Lwh,
    /// Rotated 90° around the length axis.
    Lhw,
    /// Rotated 90° around the height axis.
    Wlh,
    /// Rotated around the height axis, then the length axis.
    Whl,
    /// Rotated around the width axis, then the height axis.
    Hlw,
    /// Rotated 90° around the width axis.
    Hwl,
}

impl Rotation {
    /// All rotations: identity first, then the five non-identity permutations.
    pub const ALL: [Rotation; 6] = [
        Rotation::Lwh,
        Rotation::Lhw,
        Rotation::Wlh,
        Rotation::Whl,
        Rotation::Hlw,
        Rotation::Hwl,
    ];

    /// Source axis index for each target axis.
    pub fn axes(self) -> [usize; 3] {
        match self {
            Rotation::Lwh => [0, 1, 2],
            Rotation::Lhw => [0, 2, 1],
            Rotation::Wlh => [1, 0, 2],
            Rotation::Whl => [1, 2, 0],
            Rotation::Hlw => [2, 0, 1],
            Rotation::Hwl => [2, 1, 0],
        }
    }

    /// Position of this rotation in [`Rotation::ALL`].
    pub fn index(self) -> usize {
        Rotation::ALL
            .iter()
            .position(|r| *r == self)
            .unwrap_or_default()
    }

    /// Returns the rotation at `index` in [`Rotation::ALL`], wrapping around.
    pub fn from_index(index: usize) -> Self {
        Rotation::ALL[index % Rotation::ALL.len()]
    }

    /// Returns true for any permutation other than the identity.
    pub fn is_rotated(self) -> bool {
        self != Rotation::Lwh
    }
}

/// Box dimensions (length along x, width along y, height along z).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Dimensions {
    /// Extent along the x axis.
    pub length: f64,
    /// Extent along the y axis.
    pub width: f64,
    /// Extent along the z axis.
    pub height: f64,
}

impl Dimensions {
    /// Creates new dimensions.
    pub fn new(length: f64, width: f64, height: f64) -> Self {
        Self {
            length,
            width,
            height,
        }
    }

    /// Returns the volume.
    pub fn volume(&self) -> f64 {
        self.length * self.width * self.height
    }

    /// Returns the dimensions as `[length, width, height]`.
    pub fn as_array(&self) -> [f64; 3] {
        [self.length, self.width, self.height]
    }

    /// Returns the dimensions as a vector.
    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.length, self.width, self.height)
    }

    /// Creates dimensions from a vector.
    pub fn from_vector(v: &Vector3<f64>) -> Self {
        Self::new(v.x, v.y, v.z)
    }

    /// Returns these dimensions with `rotation` applied.
    pub fn rotated(&self, rotation: Rotation) -> Self {
        let src = self.as_array();
        let [a, b, c] = rotation.axes();
        Self::new(src[a], src[b], src[c])
    }

    /// Returns all six rotated variants in [`Rotation::ALL`] order.
    ///
    /// Duplicates produced by cubes or square faces are kept.
    pub fn rotations(&self) -> [(Rotation, Dimensions); 6] {
        Rotation::ALL.map(|r| (r, self.rotated(r)))
    }

    /// Returns true if these dimensions fit inside `region` component-wise.
    pub fn fits_within(&self, region: &Dimensions) -> bool {
        self.length <= region.length + EPSILON
            && self.width <= region.width + EPSILON
            && self.height <= region.height + EPSILON
    }

    /// Returns true if every dimension is finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        self.as_array().iter().all(|d| d.is_finite() && *d > 0.0)
    }
}

/// A required piece type.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Piece {
    /// Unique identifier.
    pub id: PieceId,
    /// Nominal dimensions.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub dimensions: Dimensions,
    /// Number of units required.
    pub quantity: usize,
    /// Display label (ignored by the engine).
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub label: Option<String>,
    /// Display colour (ignored by the engine).
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub color: Option<String>,
    /// Whether the piece may be rotated.
    #[cfg_attr(feature = "serde", serde(default = "default_true"))]
    pub rotatable: bool,
}

#[cfg(feature = "serde")]
fn default_true() -> bool {
    true
}

impl Piece {
    /// Creates a new piece with quantity 1.
    pub fn new(id: impl Into<PieceId>, length: f64, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            dimensions: Dimensions::new(length, width, height),
            quantity: 1,
            label: None,
            color: None,
            rotatable: true,
        }
    }

    /// Sets the required quantity.
    pub fn with_quantity(mut self, n: usize) -> Self {
        self.quantity = n;
        self
    }

    /// Sets the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets whether the piece may be rotated.
    pub fn with_rotatable(mut self, rotatable: bool) -> Self {
        self.rotatable = rotatable;
        self
    }

    /// Volume of one unit.
    pub fn unit_volume(&self) -> f64 {
        self.dimensions.volume()
    }

    /// Volume of all required units.
    pub fn total_volume(&self) -> f64 {
        self.unit_volume() * self.quantity as f64
    }

    /// Returns true if some allowed rotation of this piece fits in `region`.
    pub fn fits_in(&self, region: &Dimensions, allow_rotation: bool) -> bool {
        if allow_rotation && self.rotatable {
            self.dimensions
                .rotations()
                .iter()
                .any(|(_, d)| d.fits_within(region))
        } else {
            self.dimensions.fits_within(region)
        }
    }

    /// Validates the catalog entry.
    pub fn validate(&self) -> Result<()> {
        if !self.dimensions.is_valid() {
            return Err(Error::InvalidPiece(format!(
                "All dimensions for '{}' must be positive",
                self.id
            )));
        }

        if self.quantity == 0 {
            return Err(Error::InvalidPiece(format!(
                "Quantity for '{}' must be at least 1",
                self.id
            )));
        }

        Ok(())
    }
}

/// An available stock block type.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StockBlock {
    /// Unique identifier.
    pub id: PieceId,
    /// Block dimensions.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub dimensions: Dimensions,
    /// Number of blocks available.
    pub quantity: usize,
    /// Unit price, used only for cost reporting.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub price: Option<f64>,
    /// Display label (ignored by the engine).
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub label: Option<String>,
}

impl StockBlock {
    /// Creates a new stock block with quantity 1.
    pub fn new(id: impl Into<PieceId>, length: f64, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            dimensions: Dimensions::new(length, width, height),
            quantity: 1,
            price: None,
            label: None,
        }
    }

    /// Sets the available quantity.
    pub fn with_quantity(mut self, n: usize) -> Self {
        self.quantity = n;
        self
    }

    /// Sets the unit price.
    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// Sets the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Volume of one block.
    pub fn volume(&self) -> f64 {
        self.dimensions.volume()
    }

    /// Validates the catalog entry.
    pub fn validate(&self) -> Result<()> {
        if !self.dimensions.is_valid() {
            return Err(Error::InvalidStock(format!(
                "All dimensions for '{}' must be positive",
                self.id
            )));
        }

        if self.quantity == 0 {
            return Err(Error::InvalidStock(format!(
                "Quantity for '{}' must be at least 1",
                self.id
            )));
        }

        if let Some(price) = self.price {
            if !price.is_finite() || price < 0.0 {
                return Err(Error::InvalidStock(format!(
                    "Price for '{}' cannot be negative",
                    self.id
                )));
            }
        }

        Ok(())
    }
}

/// Validates both catalogs before a run.
///
/// Every entry is checked first so malformed input is always reported, even
/// when the other catalog is empty. An empty stock catalog is a configuration
/// error only when there is something to place.
pub fn validate_catalogs(pieces: &[Piece], stocks: &[StockBlock]) -> Result<()> {
    for piece in pieces {
        piece.validate()?;
    }
    for stock in stocks {
        stock.validate()?;
    }

    if !pieces.is_empty() && stocks.is_empty() {
        return Err(Error::Configuration(
            "At least one stock block is required".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_volume() {
        let d = Dimensions::new(10.0, 20.0, 30.0);
        assert_relative_eq!(d.volume(), 6000.0, epsilon = 0.001);
    }

    #[test]
    fn test_rotations_keep_duplicates() {
        let cube = Dimensions::new(5.0, 5.0, 5.0);
        let rotations = cube.rotations();
        assert_eq!(rotations.len(), 6);
        assert!(rotations.iter().all(|(_, d)| *d == cube));
        assert_eq!(rotations[0].0, Rotation::Lwh);
    }

    #[test]
    fn test_rotation_permutations() {
        let d = Dimensions::new(1.0, 2.0, 3.0);
        assert_eq!(d.rotated(Rotation::Lhw), Dimensions::new(1.0, 3.0, 2.0));
        assert_eq!(d.rotated(Rotation::Wlh), Dimensions::new(2.0, 1.0, 3.0));
        assert_eq!(d.rotated(Rotation::Whl), Dimensions::new(2.0, 3.0, 1.0));
        assert_eq!(d.rotated(Rotation::Hlw), Dimensions::new(3.0, 1.0, 2.0));
        assert_eq!(d.rotated(Rotation::Hwl), Dimensions::new(3.0, 2.0, 1.0));

        for (i, r) in Rotation::ALL.iter().enumerate() {
            assert_eq!(r.index(), i);
            assert_eq!(Rotation::from_index(i), *r);
        }
        assert!(!Rotation::Lwh.is_rotated());
        assert!(Rotation::Hwl.is_rotated());
    }

    #[test]
    fn test_fits_within() {
        let region = Dimensions::new(100.0, 100.0, 100.0);
        assert!(Dimensions::new(100.0, 50.0, 10.0).fits_within(&region));
        assert!(!Dimensions::new(100.0, 100.0, 101.0).fits_within(&region));
    }

    #[test]
    fn test_piece_fits_with_rotation() {
        let region = Dimensions::new(100.0, 20.0, 20.0);
        let piece = Piece::new("P", 10.0, 10.0, 90.0);
        assert!(piece.fits_in(&region, true));
        assert!(!piece.fits_in(&region, false));
        assert!(!piece.clone().with_rotatable(false).fits_in(&region, true));
    }

    #[test]
    fn test_validation() {
        assert!(Piece::new("P", 1.0, 1.0, 1.0).validate().is_ok());
        assert!(Piece::new("P", 0.0, 1.0, 1.0).validate().is_err());
        assert!(Piece::new("P", 1.0, f64::NAN, 1.0).validate().is_err());
        assert!(Piece::new("P", 1.0, 1.0, 1.0)
            .with_quantity(0)
            .validate()
            .is_err());
        assert!(StockBlock::new("S", 1.0, 1.0, -1.0).validate().is_err());
        assert!(StockBlock::new("S", 1.0, 1.0, 1.0)
            .with_price(-5.0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_validate_catalogs() {
        let pieces = vec![Piece::new("P", 1.0, 1.0, 1.0)];
        let stocks = vec![StockBlock::new("S", 10.0, 10.0, 10.0)];

        assert!(validate_catalogs(&pieces, &stocks).is_ok());
        assert!(validate_catalogs(&[], &[]).is_ok());
        assert!(matches!(
            validate_catalogs(&pieces, &[]),
            Err(Error::Configuration(_))
        ));

        let bad = vec![Piece::new("P", 1.0, 1.0, 1.0).with_quantity(0)];
        assert!(validate_catalogs(&bad, &stocks)
            .unwrap_err()
            .is_validation());
    }
}
