//! Extreme Point heuristic for placing pieces inside one stock block.
//!
//! # Algorithm Overview
//!
//! The packer keeps a list of open anchors, the positions where a new box
//! could touch the stock walls or previously placed boxes. The list starts at
//! the stock origin. Each placement consumes its anchor and emits new anchors
//! on the three outward faces of the placed box. Anchors that fall outside the
//! stock or inside a placed box are dropped.
//!
//! Anchors are scanned bottom-up (lowest z, then y, then x). At each anchor
//! the caller's rotation preference list is tried in order and the first box
//! that stays inside the stock and overlaps nothing is committed.
//!
//! # References
//!
//! - Crainic, T. G., Perboli, G., & Tadei, R. (2008). Extreme point-based heuristics
//!   for three-dimensional bin packing.

use crate::packing_utils::StockPacker;
use nalgebra::Vector3;
use u_cutstock_core::aabb::Aabb3;
use u_cutstock_core::geometry::{Piece, Rotation, StockBlock, EPSILON};
use u_cutstock_core::placement::Placement;
use u_cutstock_core::result::Layout;

/// Greedy anchor-based packer for a single stock instance.
#[derive(Debug, Clone)]
pub struct GreedyPacker {
    stock: StockBlock,
    stock_instance: usize,
    bounds: Aabb3,
    /// Open anchors sorted by (z, y, x).
    anchors: Vec<Vector3<f64>>,
    placed: Vec<Placement>,
    boxes: Vec<Aabb3>,
}

impl GreedyPacker {
    /// Creates an empty packer with a single anchor at the stock origin.
    pub fn new(stock: &StockBlock, stock_instance: usize) -> Self {
        Self {
            stock: stock.clone(),
            stock_instance,
            bounds: Aabb3::of_stock(&stock.dimensions),
            anchors: vec![Vector3::zeros()],
            placed: Vec::new(),
            boxes: Vec::new(),
        }
    }

    /// Creates a packer around placements that are already committed.
    ///
    /// The existing placements are kept untouched; anchors are rebuilt from
    /// the origin and the outward faces of every committed box.
    pub fn with_placed(stock: &StockBlock, stock_instance: usize, placed: Vec<Placement>) -> Self {
        let mut packer = Self::new(stock, stock_instance);
        packer.boxes = placed.iter().map(Placement::aabb).collect();
        packer.placed = placed;

        let candidates: Vec<Vector3<f64>> = packer
            .boxes
            .iter()
            .flat_map(face_anchors)
            .collect();
        packer.anchors.extend(candidates);
        packer.normalize_anchors();
        packer
    }

    /// Returns the open anchors in scan order.
    pub fn anchors(&self) -> &[Vector3<f64>] {
        &self.anchors
    }

    /// Returns the placements committed so far.
    pub fn placed(&self) -> &[Placement] {
        &self.placed
    }

    /// Returns the stock this packer fills.
    pub fn stock(&self) -> &StockBlock {
        &self.stock
    }

    /// Sum of committed piece volumes.
    pub fn used_volume(&self) -> f64 {
        self.placed.iter().map(Placement::volume).sum()
    }

    /// Returns true if a box of the given oriented extent can sit at `anchor`.
    pub fn fits_at(&self, anchor: &Vector3<f64>, extent: &Vector3<f64>) -> bool {
        let candidate = Aabb3::new(*anchor, anchor + extent);
        self.bounds.contains(&candidate) && !self.boxes.iter().any(|b| b.overlaps(&candidate))
    }

    /// Tries to place one piece instance, optionally marking it as surplus.
    ///
    /// Returns false when no anchor accepts any of the given rotations.
    pub fn try_place_with(
        &mut self,
        piece: &Piece,
        instance: usize,
        rotations: &[Rotation],
        surplus: bool,
    ) -> bool {
        if piece.unit_volume() > self.bounds.volume() - self.used_volume() + EPSILON {
            return false;
        }

        let found = self.anchors.iter().enumerate().find_map(|(idx, anchor)| {
            rotations.iter().copied().find_map(|rotation| {
                let extent = piece.dimensions.rotated(rotation).to_vector();
                self.fits_at(anchor, &extent).then_some((idx, rotation))
            })
        });

        match found {
            Some((idx, rotation)) => {
                self.commit(idx, piece, instance, rotation, surplus);
                true
            }
            None => false,
        }
    }

    fn commit(
        &mut self,
        anchor_idx: usize,
        piece: &Piece,
        instance: usize,
        rotation: Rotation,
        surplus: bool,
    ) {
        let anchor = self.anchors.remove(anchor_idx);
        let placement = Placement::new(
            piece.id.clone(),
            instance,
            self.stock.id.clone(),
            self.stock_instance,
            (anchor.x, anchor.y, anchor.z),
            rotation,
            &piece.dimensions,
        )
        .with_surplus(surplus);

        let placed_box = placement.aabb();
        self.anchors.extend(face_anchors(&placed_box));
        self.boxes.push(placed_box);
        self.placed.push(placement);
        self.normalize_anchors();
    }

    /// Drops anchors outside the stock or inside a placed box, then sorts and dedupes.
    fn normalize_anchors(&mut self) {
        let limit = self.bounds.max;
        let boxes = &self.boxes;

        self.anchors.retain(|a| {
            (0..3).all(|i| a[i] < limit[i] - EPSILON) && !boxes.iter().any(|b| b.contains_point(a))
        });

        self.anchors.sort_by(|a, b| {
            a.z.total_cmp(&b.z)
                .then(a.y.total_cmp(&b.y))
                .then(a.x.total_cmp(&b.x))
        });
        self.anchors.dedup_by(|a, b| (*a - *b).norm() < EPSILON);
    }
}

/// Anchors on the three outward faces of a placed box.
fn face_anchors(placed: &Aabb3) -> [Vector3<f64>; 3] {
    let (min, max) = (placed.min, placed.max);
    [
        Vector3::new(max.x, min.y, min.z),
        Vector3::new(min.x, max.y, min.z),
        Vector3::new(min.x, min.y, max.z),
    ]
}

impl StockPacker for GreedyPacker {
    fn open(stock: &StockBlock, stock_instance: usize) -> Self {
        Self::new(stock, stock_instance)
    }

    fn try_place(&mut self, piece: &Piece, instance: usize, rotations: &[Rotation]) -> bool {
        self.try_place_with(piece, instance, rotations, false)
    }

    fn into_layout(self) -> Layout {
        Layout::new(&self.stock, self.stock_instance, self.placed)
    }
}
