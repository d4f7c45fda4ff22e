// src/spectrum.rs
//
// Spectrum occupancy grid and slot-block search strategies.
//
// The grid holds one boolean occupancy bitmap per fiber edge. The
// search side is read-only: given a path, a block width, a modulation
// threshold and the path's per-slot GSNR profile, it locates a feasible
// contiguous slot block either deterministically (leftmost fit) or
// uniformly at random over all feasible starts. Infeasibility is a
// normal outcome, reported as `None`, never an error.
//
// A candidate window [i, i + required_slots) is feasible when every
// slot is free on every edge the path traverses (the per-path aggregate
// is the OR-reduction of the edge bitmaps) and every GSNR value over
// the window clears the modulation threshold. Both the continuity-
// constrained and the flexible entry points share this predicate:
// per-edge independent windows would imply spectrum conversion at
// intermediate nodes, which this system does not model.

use std::collections::HashMap;

use rand::Rng;

use crate::config::Config;
use crate::rl::action_space::RequestActions;
use crate::types::{Action, EdgeKey, Path, SlotIndex};

/// Per-edge spectrum occupancy for the whole network.
///
/// Owned and mutated by the simulation loop; the search methods only
/// read it. All bitmaps have length `num_channels`, true = occupied.
#[derive(Debug, Clone)]
pub struct SpectrumMap {
    grid: HashMap<EdgeKey, Vec<bool>>,
    num_channels: usize,
    wavelength_continuity: bool,
}

impl SpectrumMap {
    pub fn new(cfg: &Config) -> Self {
        Self {
            grid: HashMap::new(),
            num_channels: cfg.num_channels,
            wavelength_continuity: cfg.wavelength_continuity,
        }
    }

    /// Grid pre-populated with empty bitmaps for the given edges.
    pub fn with_edges(cfg: &Config, edges: impl IntoIterator<Item = EdgeKey>) -> Self {
        let mut map = Self::new(cfg);
        for edge in edges {
            map.add_edge(edge);
        }
        map
    }

    /// Register an edge with an all-free bitmap. Idempotent.
    pub fn add_edge(&mut self, edge: EdgeKey) {
        self.grid
            .entry(edge)
            .or_insert_with(|| vec![false; self.num_channels]);
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn wavelength_continuity(&self) -> bool {
        self.wavelength_continuity
    }

    /// Occupancy bitmap of a single edge, if registered.
    pub fn edge_occupancy(&self, edge: &EdgeKey) -> Option<&[bool]> {
        self.grid.get(edge).map(Vec::as_slice)
    }

    /// Mark `[start, start + required_slots)` occupied on every edge of
    /// the path. Checks first, mutates after: returns false and leaves
    /// the grid untouched if an edge is unregistered or the block falls
    /// outside the grid.
    pub fn occupy(&mut self, path: &Path, start: SlotIndex, required_slots: usize) -> bool {
        self.set_block(path, start, required_slots, true)
    }

    /// Mark `[start, start + required_slots)` free on every edge of the
    /// path. Same validity rules as [`SpectrumMap::occupy`].
    pub fn release(&mut self, path: &Path, start: SlotIndex, required_slots: usize) -> bool {
        self.set_block(path, start, required_slots, false)
    }

    fn set_block(
        &mut self,
        path: &Path,
        start: SlotIndex,
        required_slots: usize,
        occupied: bool,
    ) -> bool {
        let end = match start.checked_add(required_slots) {
            Some(end) if required_slots > 0 && end <= self.num_channels => end,
            _ => return false,
        };
        if path.hop_count() == 0 || path.edges().any(|e| !self.grid.contains_key(&e)) {
            return false;
        }
        for edge in path.edges() {
            if let Some(bitmap) = self.grid.get_mut(&edge) {
                for slot in &mut bitmap[start..end] {
                    *slot = occupied;
                }
            }
        }
        true
    }

    // ----- Search strategies -----

    /// Leftmost fit under the wavelength-continuity constraint.
    ///
    /// Scans start offsets in ascending order and returns the first
    /// feasible one, or `None` when no block is currently available.
    /// Delegates to the flexible variant when the grid was configured
    /// without the continuity constraint.
    pub fn first_fit(
        &self,
        path: &Path,
        required_slots: usize,
        modulation_threshold: f64,
        path_gsnr: &[f64],
    ) -> Option<SlotIndex> {
        if !self.wavelength_continuity {
            return self.first_fit_flexible(path, required_slots, modulation_threshold, path_gsnr);
        }
        self.scan_leftmost(path, required_slots, modulation_threshold, path_gsnr)
    }

    /// Leftmost fit ignoring the continuity flag.
    pub fn first_fit_flexible(
        &self,
        path: &Path,
        required_slots: usize,
        modulation_threshold: f64,
        path_gsnr: &[f64],
    ) -> Option<SlotIndex> {
        self.scan_leftmost(path, required_slots, modulation_threshold, path_gsnr)
    }

    /// Uniform draw over all feasible starts, under the continuity
    /// constraint. The random source is caller-injected so simulation
    /// runs replay deterministically from their seed.
    pub fn random_fit<R: Rng>(
        &self,
        rng: &mut R,
        path: &Path,
        required_slots: usize,
        modulation_threshold: f64,
        path_gsnr: &[f64],
    ) -> Option<SlotIndex> {
        if !self.wavelength_continuity {
            return self.random_fit_flexible(
                rng,
                path,
                required_slots,
                modulation_threshold,
                path_gsnr,
            );
        }
        self.draw_uniform(rng, path, required_slots, modulation_threshold, path_gsnr)
    }

    /// Uniform draw ignoring the continuity flag.
    pub fn random_fit_flexible<R: Rng>(
        &self,
        rng: &mut R,
        path: &Path,
        required_slots: usize,
        modulation_threshold: f64,
        path_gsnr: &[f64],
    ) -> Option<SlotIndex> {
        self.draw_uniform(rng, path, required_slots, modulation_threshold, path_gsnr)
    }

    /// Every feasible start offset for the block, in ascending order.
    pub fn feasible_starts(
        &self,
        path: &Path,
        required_slots: usize,
        modulation_threshold: f64,
        path_gsnr: &[f64],
    ) -> Vec<SlotIndex> {
        let mut starts = Vec::new();
        if let Some(aggregate) = self.path_aggregate(path) {
            if let Some(last) = self.last_start(required_slots) {
                for i in 0..=last {
                    if window_feasible(
                        &aggregate,
                        path_gsnr,
                        i,
                        required_slots,
                        modulation_threshold,
                    ) {
                        starts.push(i);
                    }
                }
            }
        }
        starts
    }

    fn scan_leftmost(
        &self,
        path: &Path,
        required_slots: usize,
        modulation_threshold: f64,
        path_gsnr: &[f64],
    ) -> Option<SlotIndex> {
        let aggregate = self.path_aggregate(path)?;
        let last = self.last_start(required_slots)?;
        (0..=last).find(|&i| {
            window_feasible(
                &aggregate,
                path_gsnr,
                i,
                required_slots,
                modulation_threshold,
            )
        })
    }

    fn draw_uniform<R: Rng>(
        &self,
        rng: &mut R,
        path: &Path,
        required_slots: usize,
        modulation_threshold: f64,
        path_gsnr: &[f64],
    ) -> Option<SlotIndex> {
        let starts = self.feasible_starts(path, required_slots, modulation_threshold, path_gsnr);
        if starts.is_empty() {
            None
        } else {
            Some(starts[rng.gen_range(0..starts.len())])
        }
    }

    fn last_start(&self, required_slots: usize) -> Option<SlotIndex> {
        if required_slots == 0 {
            return None;
        }
        self.num_channels.checked_sub(required_slots)
    }

    /// OR-reduction of the occupancy bitmaps along the path. `None` when
    /// the path has no edges or traverses an unregistered edge; such a
    /// path can never carry an allocation.
    fn path_aggregate(&self, path: &Path) -> Option<Vec<bool>> {
        if path.hop_count() == 0 {
            return None;
        }
        let mut aggregate = vec![false; self.num_channels];
        for edge in path.edges() {
            let occupancy = self.grid.get(&edge)?;
            for (slot, &occupied) in aggregate.iter_mut().zip(occupancy) {
                *slot |= occupied;
            }
        }
        Some(aggregate)
    }
}

fn window_feasible(
    aggregate: &[bool],
    path_gsnr: &[f64],
    start: SlotIndex,
    required_slots: usize,
    modulation_threshold: f64,
) -> bool {
    let end = start + required_slots;
    match (aggregate.get(start..end), path_gsnr.get(start..end)) {
        (Some(occupancy), Some(gsnr)) => {
            occupancy.iter().all(|&occupied| !occupied)
                && gsnr.iter().all(|&value| value >= modulation_threshold)
        }
        _ => false,
    }
}

/// Enumerate the currently feasible actions for a request: for each
/// candidate path and each modulation format, the leftmost feasible
/// block of `required_slots` slots, if any. `path_gsnr` supplies the
/// physical-layer GSNR profile for a candidate path (one value per
/// slot).
///
/// This is the glue the decision loop feeds to
/// [`QLearningAgent::act`](crate::rl::QLearningAgent::act) as the
/// available set.
pub fn enumerate_available_actions<F>(
    request: &RequestActions<'_>,
    spectrum: &SpectrumMap,
    required_slots: usize,
    mut path_gsnr: F,
) -> Vec<Action>
where
    F: FnMut(&Path) -> Vec<f64>,
{
    let mut actions = Vec::new();
    for path in request.paths() {
        let gsnr = path_gsnr(path);
        for format in request.modulations() {
            if let Some(start) =
                spectrum.first_fit(path, required_slots, format.gsnr_threshold_db, &gsnr)
            {
                actions.push(Action {
                    path: path.clone(),
                    modulation: format.name.clone(),
                    start_slot: start,
                    required_slots,
                });
            }
        }
    }
    actions
}
