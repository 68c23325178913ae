//! Shared utilities for the 3D cutting-stock solvers.
//!
//! This module consolidates the code that the greedy, guillotine, GA, SA and
//! hybrid strategies share.
//!
//! # Extracted Components
//!
//! - [`InstanceInfo`] / [`StockSlot`]: expand catalog quantities into concrete instances
//! - [`best_fit_rotations`] / [`preference_list`]: rotation preference per instance
//! - [`PackingContext::decode`]: feeds an (order, rotation genes) candidate through a
//!   [`StockPacker`] across stock instances
//! - [`packing_fitness`]: unified fitness formula for all metaheuristics
//! - [`build_unplaced_list`]: maps unplaced instance indices back to catalog ids

use crate::extreme_point::GreedyPacker;
use crate::guillotine::GuillotinePlanner;
use rand::rngs::StdRng;
use rand::SeedableRng;
use u_cutstock_core::geometry::{Piece, Rotation, StockBlock};
use u_cutstock_core::result::{Layout, OptimizationResult, UnplacedPiece};
use u_cutstock_core::solver::Config;

/// Instance information mapping expanded instances to source pieces.
///
/// When a piece has quantity > 1, it expands into multiple instances.
/// This struct tracks which piece each instance belongs to and its
/// ordinal within that piece's quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceInfo {
    /// Index into the pieces array.
    pub piece_idx: usize,
    /// Instance number within this piece's quantity.
    pub instance_num: usize,
}

/// Builds the instance mapping from pieces, in catalog order.
pub fn build_instances(pieces: &[Piece]) -> Vec<InstanceInfo> {
    pieces
        .iter()
        .enumerate()
        .flat_map(|(piece_idx, piece)| {
            (0..piece.quantity).map(move |instance_num| InstanceInfo {
                piece_idx,
                instance_num,
            })
        })
        .collect()
}

/// One concrete stock instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockSlot {
    /// Index into the stocks array.
    pub stock_idx: usize,
    /// Instance number within this stock's quantity.
    pub stock_instance: usize,
}

/// Expands stock quantities into the order in which instances are opened.
pub fn build_stock_slots(stocks: &[StockBlock]) -> Vec<StockSlot> {
    stocks
        .iter()
        .enumerate()
        .flat_map(|(stock_idx, stock)| {
            (0..stock.quantity).map(move |stock_instance| StockSlot {
                stock_idx,
                stock_instance,
            })
        })
        .collect()
}

/// Instance indices sorted by unit volume, largest first.
///
/// The sort is stable, so equal volumes keep catalog order.
pub fn volume_descending_order(instances: &[InstanceInfo], pieces: &[Piece]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..instances.len()).collect();
    order.sort_by(|&a, &b| {
        let va = pieces[instances[a].piece_idx].unit_volume();
        let vb = pieces[instances[b].piece_idx].unit_volume();
        vb.total_cmp(&va)
    });
    order
}

/// Allowed rotations of a piece, lowest profile first.
///
/// Rotations are sorted by the oriented (height, width, length), stable in
/// [`Rotation::ALL`] order. A piece that may not rotate only gets the identity.
pub fn best_fit_rotations(piece: &Piece, allow_rotation: bool) -> Vec<Rotation> {
    if !(allow_rotation && piece.rotatable) {
        return vec![Rotation::Lwh];
    }

    let mut rotations = piece.dimensions.rotations();
    rotations.sort_by(|(_, a), (_, b)| {
        a.height
            .total_cmp(&b.height)
            .then(a.width.total_cmp(&b.width))
            .then(a.length.total_cmp(&b.length))
    });
    rotations.iter().map(|(r, _)| *r).collect()
}

/// Rotation preference list for one rotation gene.
///
/// The best-fit list is rotated left so that `best_fit[gene % len]` is tried
/// first and the remaining rotations follow in best-fit order.
pub fn preference_list(best_fit: &[Rotation], gene: usize) -> Vec<Rotation> {
    let mut list = best_fit.to_vec();
    if !list.is_empty() {
        let shift = gene % list.len();
        list.rotate_left(shift);
    }
    list
}

/// Computes packing fitness using the unified formula.
///
/// `fitness = efficiency - penalty * unplaced_percent`, where
/// `unplaced_percent` is the unplaced share of the required volume.
///
/// # Arguments
/// * `efficiency` - Volume-weighted efficiency of the used stock (0 - 100)
/// * `unplaced_volume` - Sum of unit volumes of unplaced instances
/// * `required_volume` - Sum of unit volumes of all instances
/// * `penalty` - Weight of the unplaced percentage
pub fn packing_fitness(
    efficiency: f64,
    unplaced_volume: f64,
    required_volume: f64,
    penalty: f64,
) -> f64 {
    let unplaced_percent = if required_volume > 0.0 {
        unplaced_volume / required_volume * 100.0
    } else {
        0.0
    };
    efficiency - penalty * unplaced_percent
}

/// Maps unplaced instance indices back to catalog ids, in the given order.
pub fn build_unplaced_list(
    unplaced: &[usize],
    instances: &[InstanceInfo],
    pieces: &[Piece],
) -> Vec<UnplacedPiece> {
    unplaced
        .iter()
        .filter_map(|&idx| instances.get(idx))
        .map(|info| UnplacedPiece {
            piece_id: pieces[info.piece_idx].id.clone(),
            instance: info.instance_num,
        })
        .collect()
}

/// Creates the run's random source from the configured seed.
pub fn make_rng(config: &Config) -> StdRng {
    match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// A placer that fills one stock instance.
pub trait StockPacker {
    /// Opens an empty stock instance.
    fn open(stock: &StockBlock, stock_instance: usize) -> Self
    where
        Self: Sized;

    /// Tries to place one piece instance, trying `rotations` in order.
    fn try_place(&mut self, piece: &Piece, instance: usize, rotations: &[Rotation]) -> bool;

    /// Finishes the stock instance.
    fn into_layout(self) -> Layout;
}

/// Which placer decodes a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacerKind {
    /// Extreme point greedy packer.
    #[default]
    Greedy,
    /// Guillotine cut-tree planner.
    Guillotine,
}

/// Layouts and leftover instances produced by one decode.
#[derive(Debug, Clone, Default)]
pub struct PackOutcome {
    /// Non-empty layouts in stock-opening order.
    pub layouts: Vec<Layout>,
    /// Instance indices that fit nowhere, in decode order.
    pub unplaced: Vec<usize>,
}

impl PackOutcome {
    /// Volume-weighted efficiency of the used layouts.
    pub fn efficiency(&self) -> f64 {
        let stock: f64 = self.layouts.iter().map(Layout::stock_volume).sum();
        if stock <= 0.0 {
            return 0.0;
        }
        let used: f64 = self.layouts.iter().map(Layout::used_volume).sum();
        used / stock * 100.0
    }

    /// Number of placed instances.
    pub fn placed_count(&self) -> usize {
        self.layouts.iter().map(|l| l.pieces.len()).sum()
    }
}

/// Read-only problem data shared by every decode of a run.
#[derive(Debug, Clone)]
pub struct PackingContext {
    pieces: Vec<Piece>,
    stocks: Vec<StockBlock>,
    instances: Vec<InstanceInfo>,
    slots: Vec<StockSlot>,
    best_fit: Vec<Vec<Rotation>>,
    required_volume: f64,
    placer: PlacerKind,
    unplaced_penalty: f64,
}

impl PackingContext {
    /// Builds the context for one run.
    pub fn new(pieces: &[Piece], stocks: &[StockBlock], config: &Config) -> Self {
        let instances = build_instances(pieces);
        let required_volume = instances
            .iter()
            .map(|info| pieces[info.piece_idx].unit_volume())
            .sum();

        Self {
            pieces: pieces.to_vec(),
            stocks: stocks.to_vec(),
            best_fit: pieces
                .iter()
                .map(|p| best_fit_rotations(p, config.allow_rotation))
                .collect(),
            slots: build_stock_slots(stocks),
            instances,
            required_volume,
            placer: if config.guillotine {
                PlacerKind::Guillotine
            } else {
                PlacerKind::Greedy
            },
            unplaced_penalty: config.unplaced_penalty,
        }
    }

    /// Overrides the placer.
    pub fn with_placer(mut self, placer: PlacerKind) -> Self {
        self.placer = placer;
        self
    }

    /// Returns the placer used by [`decode`](Self::decode).
    pub fn placer(&self) -> PlacerKind {
        self.placer
    }

    /// Returns the piece catalog.
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// Returns the stock catalog.
    pub fn stocks(&self) -> &[StockBlock] {
        &self.stocks
    }

    /// Returns the expanded piece instances.
    pub fn instances(&self) -> &[InstanceInfo] {
        &self.instances
    }

    /// Returns the expanded stock instances in opening order.
    pub fn slots(&self) -> &[StockSlot] {
        &self.slots
    }

    /// Number of piece instances.
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Best-fit rotation list of a piece.
    pub fn best_fit(&self, piece_idx: usize) -> &[Rotation] {
        &self.best_fit[piece_idx]
    }

    /// Largest number of rotation choices of any piece.
    pub fn rotation_choices(&self) -> usize {
        self.best_fit.iter().map(Vec::len).max().unwrap_or(1)
    }

    /// Total volume of all requested instances.
    pub fn required_volume(&self) -> f64 {
        self.required_volume
    }

    /// The volume-descending seed order.
    pub fn seed_order(&self) -> Vec<usize> {
        volume_descending_order(&self.instances, &self.pieces)
    }

    /// Rotation preference list of one instance under a gene.
    pub fn preferences(&self, instance_idx: usize, gene: usize) -> Vec<Rotation> {
        preference_list(&self.best_fit[self.instances[instance_idx].piece_idx], gene)
    }

    /// Decodes a candidate.
    ///
    /// Stock instances are opened in catalog order. Each one receives the
    /// still-unplaced instances in `order`; whatever does not fit is handed to
    /// the next stock instance. `genes` is indexed by instance, not by position.
    pub fn decode(&self, order: &[usize], genes: &[usize]) -> PackOutcome {
        match self.placer {
            PlacerKind::Greedy => self.decode_with::<GreedyPacker>(order, genes),
            PlacerKind::Guillotine => self.decode_with::<GuillotinePlanner>(order, genes),
        }
    }

    fn decode_with<P: StockPacker>(&self, order: &[usize], genes: &[usize]) -> PackOutcome {
        let mut remaining: Vec<usize> = order.to_vec();
        let mut layouts = Vec::new();

        for slot in &self.slots {
            if remaining.is_empty() {
                break;
            }

            let mut packer = P::open(&self.stocks[slot.stock_idx], slot.stock_instance);
            let mut leftover = Vec::with_capacity(remaining.len());

            for &idx in &remaining {
                let info = self.instances[idx];
                let piece = &self.pieces[info.piece_idx];
                let gene = genes.get(idx).copied().unwrap_or(0);
                let rotations = preference_list(&self.best_fit[info.piece_idx], gene);

                if !packer.try_place(piece, info.instance_num, &rotations) {
                    leftover.push(idx);
                }
            }

            let layout = packer.into_layout();
            if !layout.pieces.is_empty() {
                layouts.push(layout);
            }
            remaining = leftover;
        }

        PackOutcome {
            layouts,
            unplaced: remaining,
        }
    }

    /// Decodes the volume-descending order with every gene 0.
    pub fn decode_seed(&self) -> PackOutcome {
        self.decode(&self.seed_order(), &vec![0; self.instances.len()])
    }

    /// Fitness of a decoded candidate.
    pub fn fitness(&self, outcome: &PackOutcome) -> f64 {
        let unplaced_volume: f64 = outcome
            .unplaced
            .iter()
            .map(|&idx| self.pieces[self.instances[idx].piece_idx].unit_volume())
            .sum();
        packing_fitness(
            outcome.efficiency(),
            unplaced_volume,
            self.required_volume,
            self.unplaced_penalty,
        )
    }

    /// Builds the result structure of a decoded candidate.
    pub fn to_result(&self, outcome: PackOutcome) -> OptimizationResult {
        let unplaced = build_unplaced_list(&outcome.unplaced, &self.instances, &self.pieces);
        OptimizationResult::from_layouts(outcome.layouts, unplaced)
    }
}
