//! Erosion of the solvent-accessible labeling into the solvent-excluded labeling

use itertools::iproduct;
use num::Float;
use rayon::prelude::*;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::grid::{squared_cell_distance, GridShape, Label, EROSION_MARK, OCCUPIED, SOLVENT};
use crate::workspace::DetectionWorkspace;
use crate::{utils, Parameters, Real};

/// Erodes the occupied set by one probe radius around the accessible boundary
///
/// The rasterized labeling describes the solvent-accessible volume: every voxel within
/// `radius + probe` of an atom center is occupied. This pass converts it to the
/// solvent-excluded labeling by carving solvent back out of the occupied set wherever the
/// probe can reach: around each solvent voxel that touches the occupied set, all occupied
/// voxels within one probe radius are released.
///
/// The carve writes the transient [`EROSION_MARK`] first and remaps it to
/// [`SOLVENT`] in a second pass, so freshly released voxels never trigger further
/// expansion. Neighborhood tests read a snapshot of the labels taken at pass entry, which
/// makes the result deterministic under parallel execution.
///
/// The carve never writes to the index-0 slab of any axis; callers are expected to keep a
/// one-voxel solvent margin around the molecule.
pub fn erode_accessible_surface<R: Real>(
    labels: &mut [Label],
    grid: &GridShape,
    parameters: &Parameters<R>,
    workspace: &mut DetectionWorkspace,
) {
    profile!("erode_accessible_surface");

    let probe_extent = parameters.probe_radius / parameters.voxel_size;
    let carve_radius = match Float::ceil(probe_extent).to_usize() {
        Some(radius) => radius,
        None => return,
    };
    let threshold = probe_extent * probe_extent;

    {
        let snapshot = workspace.take_snapshot(labels);
        let cells = utils::as_shared_atomics(labels);

        let carve_around_slab = |i: usize| {
            for (j, k) in iproduct!(0..grid.ny(), 0..grid.nz()) {
                if snapshot[grid.linearize(i, j, k)] != SOLVENT {
                    continue;
                }
                if !grid.has_neighbor_with_label(snapshot, (i, j, k), OCCUPIED) {
                    continue;
                }
                carve_ball(cells, grid, (i, j, k), carve_radius, threshold);
            }
        };

        if parameters.enable_multi_threading {
            (0..grid.nx()).into_par_iter().for_each(carve_around_slab);
        } else {
            (0..grid.nx()).for_each(carve_around_slab);
        }
    }

    // remap the transient marker to solvent
    let remap = |label: &mut Label| {
        if *label == EROSION_MARK {
            *label = SOLVENT;
        }
    };
    if parameters.enable_multi_threading {
        labels.par_iter_mut().for_each(remap);
    } else {
        labels.iter_mut().for_each(remap);
    }
}

/// Releases every occupied voxel strictly within the probe radius of the given solvent
/// voxel
fn carve_ball<R: Real>(
    cells: &[AtomicI32],
    grid: &GridShape,
    (vi, vj, vk): (usize, usize, usize),
    carve_radius: usize,
    threshold: R,
) {
    // the lower bound starts at index 1: the index-0 slabs are part of the solvent margin
    // and are never eroded
    let ri = vi.saturating_sub(carve_radius).max(1)..=(vi + carve_radius).min(grid.nx() - 1);
    let rj = vj.saturating_sub(carve_radius).max(1)..=(vj + carve_radius).min(grid.ny() - 1);
    let rk = vk.saturating_sub(carve_radius).max(1)..=(vk + carve_radius).min(grid.nz() - 1);

    for (i, j, k) in iproduct!(ri, rj, rk) {
        let distance = R::from_cell_index(squared_cell_distance((vi, vj, vk), (i, j, k)));
        if distance >= threshold {
            continue;
        }
        let cell = &cells[grid.linearize(i, j, k)];
        if cell.load(Ordering::Relaxed) == OCCUPIED {
            cell.store(EROSION_MARK, Ordering::Relaxed);
        }
    }
}
