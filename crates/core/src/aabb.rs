//! Axis-aligned boxes used for collision and containment tests.

use crate::geometry::{Dimensions, EPSILON};
use nalgebra::Vector3;

/// An axis-aligned box described by its min and max corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb3 {
    /// Minimum corner.
    pub min: Vector3<f64>,
    /// Maximum corner.
    pub max: Vector3<f64>,
}

impl Aabb3 {
    /// Creates a new box from min/max corners.
    pub fn new(min: Vector3<f64>, max: Vector3<f64>) -> Self {
        Self { min, max }
    }

    /// Creates a box anchored at `(x, y, z)` with the given extents.
    pub fn from_origin(x: f64, y: f64, z: f64, extent: &Dimensions) -> Self {
        let min = Vector3::new(x, y, z);
        Self {
            min,
            max: min + extent.to_vector(),
        }
    }

    /// Creates a box at the origin covering a whole stock block.
    pub fn of_stock(extent: &Dimensions) -> Self {
        Self::from_origin(0.0, 0.0, 0.0, extent)
    }

    /// Returns the extents along each axis.
    pub fn extent(&self) -> Dimensions {
        Dimensions::from_vector(&(self.max - self.min))
    }

    /// Returns the volume.
    pub fn volume(&self) -> f64 {
        self.extent().volume()
    }

    /// Separating-axis test on open intervals.
    ///
    /// Boxes that merely share a face, edge or corner do not overlap.
    pub fn overlaps(&self, other: &Aabb3) -> bool {
        (0..3).all(|axis| {
            self.min[axis] < other.max[axis] - EPSILON && other.min[axis] < self.max[axis] - EPSILON
        })
    }

    /// Returns true if `other` lies entirely inside this box.
    pub fn contains(&self, other: &Aabb3) -> bool {
        (0..3).all(|axis| {
            other.min[axis] >= self.min[axis] - EPSILON && other.max[axis] <= self.max[axis] + EPSILON
        })
    }

    /// Half-open point test: `min <= p < max` on every axis.
    pub fn contains_point(&self, p: &Vector3<f64>) -> bool {
        (0..3).all(|axis| p[axis] >= self.min[axis] - EPSILON && p[axis] < self.max[axis] - EPSILON)
    }
}
