//! Guillotine-constrained placement.
//!
//! The planner keeps a binary cut tree over one stock instance. Every node
//! lives in an arena and is referenced by [`NodeId`]. The root is a single
//! free leaf covering the whole stock. Placing a piece picks a free leaf,
//! then splits it with full straight cuts until a child matches the oriented
//! piece exactly. Each cut spans the whole region being cut, so every
//! placement is reachable from the root by a sequence of guillotine cuts.

use crate::packing_utils::StockPacker;
use u_cutstock_core::aabb::Aabb3;
use u_cutstock_core::geometry::{Dimensions, Piece, Rotation, StockBlock, EPSILON};
use u_cutstock_core::placement::Placement;
use u_cutstock_core::result::{CuttingPattern, Layout};

/// Index of a node in the cut-tree arena.
pub type NodeId = usize;

/// Axis a cut is perpendicular to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutAxis {
    /// Cut perpendicular to the length axis.
    X,
    /// Cut perpendicular to the width axis.
    Y,
    /// Cut perpendicular to the height axis (a horizontal cut).
    Z,
}

impl CutAxis {
    const ALL: [CutAxis; 3] = [CutAxis::X, CutAxis::Y, CutAxis::Z];

    /// Vector component index of the axis.
    pub fn index(self) -> usize {
        match self {
            CutAxis::X => 0,
            CutAxis::Y => 1,
            CutAxis::Z => 2,
        }
    }
}

/// What a cut-tree node represents.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Unused region, available for placement.
    Free,
    /// Region holding the placement at this index of the planner's placement list.
    Occupied(usize),
    /// Region split by one straight cut into a low and a high child.
    Split {
        /// Axis of the cut.
        axis: CutAxis,
        /// Absolute cut position along the axis.
        position: f64,
        /// Low and high children.
        children: [NodeId; 2],
    },
}

/// A node of the cut tree.
#[derive(Debug, Clone, PartialEq)]
pub struct CutNode {
    /// Region covered by this node.
    pub region: Aabb3,
    /// Node kind.
    pub kind: NodeKind,
    /// Parent node, `None` for the root.
    pub parent: Option<NodeId>,
}

/// Guillotine planner for a single stock instance.
#[derive(Debug, Clone)]
pub struct GuillotinePlanner {
    stock: StockBlock,
    stock_instance: usize,
    nodes: Vec<CutNode>,
    placed: Vec<Placement>,
}

/// Chosen leaf and rotation, with the scores used to rank candidates.
struct Candidate {
    leaf: NodeId,
    rotation: Rotation,
    leftover: f64,
    largest_residual: f64,
}

impl GuillotinePlanner {
    /// Creates a planner whose tree is one free leaf covering the stock.
    pub fn new(stock: &StockBlock, stock_instance: usize) -> Self {
        Self {
            stock: stock.clone(),
            stock_instance,
            nodes: vec![CutNode {
                region: Aabb3::of_stock(&stock.dimensions),
                kind: NodeKind::Free,
                parent: None,
            }],
            placed: Vec::new(),
        }
    }

    /// Returns the node arena; index 0 is the root.
    pub fn nodes(&self) -> &[CutNode] {
        &self.nodes
    }

    /// Returns a node by id.
    pub fn node(&self, id: NodeId) -> Option<&CutNode> {
        self.nodes.get(id)
    }

    /// Returns the placements committed so far.
    pub fn placed(&self) -> &[Placement] {
        &self.placed
    }

    /// Ids of the free leaves in arena order.
    pub fn free_leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.kind == NodeKind::Free)
            .map(|(id, _)| id)
    }

    /// Number of straight cuts made so far.
    pub fn cut_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n.kind, NodeKind::Split { .. }))
            .count()
    }

    /// Cut positions grouped as horizontal (z) and vertical (x and y) cuts.
    pub fn cutting_pattern(&self) -> CuttingPattern {
        let mut pattern = CuttingPattern::default();
        for node in &self.nodes {
            if let NodeKind::Split { axis, position, .. } = node.kind {
                match axis {
                    CutAxis::Z => pattern.horizontal_cuts.push(position),
                    CutAxis::X | CutAxis::Y => pattern.vertical_cuts.push(position),
                }
            }
        }
        pattern.total_cuts = pattern.horizontal_cuts.len() + pattern.vertical_cuts.len();
        pattern
    }

    /// Places one piece instance, trying `rotations` in preference order.
    ///
    /// Among all (free leaf, rotation) pairs that fit, the one leaving the
    /// least leftover volume in its leaf wins; ties go to the pair whose
    /// biggest residual leaf is smallest, then to the first pair encountered.
    pub fn place(&mut self, piece: &Piece, instance: usize, rotations: &[Rotation]) -> bool {
        let Some(best) = self.best_candidate(&piece.dimensions, rotations) else {
            return false;
        };

        let oriented = piece.dimensions.rotated(best.rotation);
        log::trace!(
            "guillotine: {}#{} into leaf {} (leftover {:.3}, residual {:.3})",
            piece.id,
            instance,
            best.leaf,
            best.leftover,
            best.largest_residual
        );
        let target = self.split_to_fit(best.leaf, &oriented);

        let anchor = self.nodes[target].region.min;
        self.placed.push(Placement::new(
            piece.id.clone(),
            instance,
            self.stock.id.clone(),
            self.stock_instance,
            (anchor.x, anchor.y, anchor.z),
            best.rotation,
            &piece.dimensions,
        ));
        self.nodes[target].kind = NodeKind::Occupied(self.placed.len() - 1);
        true
    }

    fn best_candidate(&self, nominal: &Dimensions, rotations: &[Rotation]) -> Option<Candidate> {
        let mut best: Option<Candidate> = None;

        for leaf in self.free_leaves() {
            let region = self.nodes[leaf].region.extent();
            for &rotation in rotations {
                let oriented = nominal.rotated(rotation);
                if !oriented.fits_within(&region) {
                    continue;
                }

                let leftover = region.volume() - oriented.volume();
                let largest_residual = residual_volumes(&region, &oriented)
                    .into_iter()
                    .fold(0.0, f64::max);

                let better = match &best {
                    None => true,
                    Some(b) => {
                        leftover < b.leftover - EPSILON
                            || (leftover <= b.leftover + EPSILON
                                && largest_residual < b.largest_residual - EPSILON)
                    }
                };
                if better {
                    best = Some(Candidate {
                        leaf,
                        rotation,
                        leftover,
                        largest_residual,
                    });
                }
            }
        }

        best
    }

    /// Splits `leaf` until its low corner child matches `oriented`; returns that child.
    ///
    /// One cut per axis with leftover, so a piece smaller than its leaf on
    /// all three axes takes three cuts and leaves three residual leaves.
    fn split_to_fit(&mut self, leaf: NodeId, oriented: &Dimensions) -> NodeId {
        let axes = cut_order(&self.nodes[leaf].region.extent(), oriented);

        let extent = oriented.to_vector();
        let mut current = leaf;
        for axis in axes {
            let i = axis.index();
            let region = self.nodes[current].region;
            let position = region.min[i] + extent[i];

            let mut low = region;
            low.max[i] = position;
            let mut high = region;
            high.min[i] = position;

            let low_id = self.push_node(low, current);
            let high_id = self.push_node(high, current);
            self.nodes[current].kind = NodeKind::Split {
                axis,
                position,
                children: [low_id, high_id],
            };
            current = low_id;
        }
        current
    }

    fn push_node(&mut self, region: Aabb3, parent: NodeId) -> NodeId {
        self.nodes.push(CutNode {
            region,
            kind: NodeKind::Free,
            parent: Some(parent),
        });
        self.nodes.len() - 1
    }

    /// Checks that every split partitions its region exactly into its two children.
    pub fn is_consistent(&self) -> bool {
        self.nodes.iter().all(|node| match node.kind {
            NodeKind::Split {
                axis,
                position,
                children: [low, high],
            } => {
                let i = axis.index();
                let (Some(l), Some(h)) = (self.nodes.get(low), self.nodes.get(high)) else {
                    return false;
                };
                let mut expected_low = node.region;
                expected_low.max[i] = position;
                let mut expected_high = node.region;
                expected_high.min[i] = position;
                same_region(&l.region, &expected_low) && same_region(&h.region, &expected_high)
            }
            _ => true,
        })
    }
}

fn residual_lengths(region: &Dimensions, oriented: &Dimensions) -> [f64; 3] {
    [
        region.length - oriented.length,
        region.width - oriented.width,
        region.height - oriented.height,
    ]
}

/// Axes needing a cut, largest leftover length first, ties broken x, y, z.
fn cut_order(region: &Dimensions, oriented: &Dimensions) -> Vec<CutAxis> {
    let residual = residual_lengths(region, oriented);
    let mut axes: Vec<CutAxis> = CutAxis::ALL
        .into_iter()
        .filter(|a| residual[a.index()] > EPSILON)
        .collect();
    axes.sort_by(|a, b| residual[b.index()].total_cmp(&residual[a.index()]));
    axes
}

/// Volumes of the residual leaves `split_to_fit` would leave, in cut order.
fn residual_volumes(region: &Dimensions, oriented: &Dimensions) -> Vec<f64> {
    let mut extent = region.to_vector();
    let target = oriented.to_vector();
    cut_order(region, oriented)
        .into_iter()
        .map(|axis| {
            let i = axis.index();
            let mut high = extent;
            high[i] = extent[i] - target[i];
            extent[i] = target[i];
            high.x * high.y * high.z
        })
        .collect()
}

fn same_region(a: &Aabb3, b: &Aabb3) -> bool {
    (a.min - b.min).norm() < EPSILON && (a.max - b.max).norm() < EPSILON
}

impl StockPacker for GuillotinePlanner {
    fn open(stock: &StockBlock, stock_instance: usize) -> Self {
        Self::new(stock, stock_instance)
    }

    fn try_place(&mut self, piece: &Piece, instance: usize, rotations: &[Rotation]) -> bool {
        self.place(piece, instance, rotations)
    }

    fn into_layout(self) -> Layout {
        let pattern = self.cutting_pattern();
        Layout::new(&self.stock, self.stock_instance, self.placed).with_cutting_pattern(pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn planner(l: f64, w: f64, h: f64) -> GuillotinePlanner {
        GuillotinePlanner::new(&StockBlock::new("S", l, w, h), 0)
    }

    #[test]
    fn test_exact_fit_needs_no_cut() {
        let mut g = planner(10.0, 20.0, 30.0);
        assert!(g.place(&Piece::new("P", 10.0, 20.0, 30.0), 0, &[Rotation::Lwh]));
        assert_eq!(g.cut_count(), 0);
        assert_eq!(g.nodes()[0].kind, NodeKind::Occupied(0));
    }

    #[test]
    fn test_three_cuts_for_corner_piece() {
        let mut g = planner(100.0, 100.0, 100.0);
        assert!(g.place(&Piece::new("P", 50.0, 40.0, 30.0), 0, &[Rotation::Lwh]));

        assert_eq!(g.cut_count(), 3);
        assert_eq!(g.free_leaves().count(), 3);
        assert!(g.is_consistent());

        // Largest leftover (z: 70) is cut first.
        match g.nodes()[0].kind {
            NodeKind::Split { axis, position, .. } => {
                assert_eq!(axis, CutAxis::Z);
                assert_relative_eq!(position, 30.0);
            }
            ref other => panic!("unexpected root: {:?}", other),
        }
    }

    #[test]
    fn test_prefers_least_leftover_leaf() {
        let mut g = planner(100.0, 100.0, 100.0);
        g.place(&Piece::new("A", 100.0, 100.0, 60.0), 0, &[Rotation::Lwh]);
        // Only the 100x100x40 residual remains; a 100x100x40 piece fills it exactly.
        assert!(g.place(&Piece::new("B", 100.0, 100.0, 40.0), 0, &[Rotation::Lwh]));
        assert_eq!(g.free_leaves().count(), 0);
        assert_relative_eq!(g.placed()[1].z, 60.0);
    }

    #[test]
    fn test_full_tie_keeps_first_rotation() {
        let mut g = planner(40.0, 40.0, 10.0);
        let piece = Piece::new("P", 40.0, 20.0, 10.0);
        // Both rotations leave one 8000-volume residual.
        assert!(g.place(&piece, 0, &[Rotation::Wlh, Rotation::Lwh]));
        assert_eq!(g.placed()[0].rotation, Rotation::Wlh);
    }

    #[test]
    fn test_equal_leftover_prefers_smaller_residual() {
        let mut g = planner(60.0, 40.0, 20.0);
        let piece = Piece::new("P", 40.0, 20.0, 20.0);
        // Wlh leaves one 40x40x20 residual; Lwh leaves 20x40x20 and 40x20x20.
        assert!(g.place(&piece, 0, &[Rotation::Wlh, Rotation::Lwh]));
        assert_eq!(g.placed()[0].rotation, Rotation::Lwh);
        assert_eq!(g.cut_count(), 2);
        assert_eq!(g.free_leaves().count(), 2);
    }

    #[test]
    fn test_residual_volumes_follow_cut_order() {
        let region = Dimensions::new(100.0, 100.0, 100.0);
        let oriented = Dimensions::new(50.0, 40.0, 30.0);
        // z (70) first, then y (60), then x (50).
        let volumes = residual_volumes(&region, &oriented);
        assert_eq!(volumes.len(), 3);
        assert_relative_eq!(volumes[0], 100.0 * 100.0 * 70.0);
        assert_relative_eq!(volumes[1], 100.0 * 60.0 * 30.0);
        assert_relative_eq!(volumes[2], 50.0 * 40.0 * 30.0);
    }

    #[test]
    fn test_rejects_piece_that_fits_no_leaf() {
        let mut g = planner(100.0, 100.0, 100.0);
        assert!(!g.place(&Piece::new("Big", 100.0, 100.0, 101.0), 0, &Rotation::ALL));
        assert!(g.placed().is_empty());
        assert_eq!(g.cut_count(), 0);
    }

    #[test]
    fn test_cutting_pattern_groups_axes() {
        let mut g = planner(100.0, 100.0, 100.0);
        g.place(&Piece::new("P", 50.0, 40.0, 30.0), 0, &[Rotation::Lwh]);

        let pattern = g.cutting_pattern();
        assert_eq!(pattern.horizontal_cuts, vec![30.0]);
        assert_eq!(pattern.vertical_cuts, vec![40.0, 50.0]);
        assert_eq!(pattern.total_cuts, 3);
    }

    #[test]
    fn test_parent_links() {
        let mut g = planner(100.0, 100.0, 100.0);
        g.place(&Piece::new("P", 50.0, 100.0, 100.0), 0, &[Rotation::Lwh]);

        assert_eq!(g.nodes()[0].parent, None);
        assert!(g.nodes()[1..].iter().all(|n| n.parent == Some(0)));
    }

    #[test]
    fn test_layout_carries_pattern() {
        let mut g = planner(100.0, 100.0, 100.0);
        g.place(&Piece::new("P", 50.0, 50.0, 50.0), 0, &[Rotation::Lwh]);
        let layout = g.into_layout();
        assert_eq!(layout.cut_count(), 3);
        assert_relative_eq!(layout.utilization, 12.5);
    }
}
