//! Classification of solvent voxels into surface and bulk solvent

use rayon::prelude::*;

use crate::grid::{GridShape, Label, BULK_SOLVENT, OCCUPIED, SOLVENT, SURFACE};
use crate::workspace::DetectionWorkspace;

/// Splits the solvent voxels into surface and bulk solvent
///
/// A solvent voxel that has at least one occupied voxel in its 26-neighborhood becomes
/// [`SURFACE`], every other solvent voxel becomes [`BULK_SOLVENT`]. Occupied voxels are
/// never relabeled. Neighborhood tests read a snapshot of the labels taken at pass entry.
pub fn classify_solvent_voxels(
    labels: &mut [Label],
    grid: &GridShape,
    enable_multi_threading: bool,
    workspace: &mut DetectionWorkspace,
) {
    profile!("classify_solvent_voxels");

    let snapshot = workspace.take_snapshot(labels);
    let classify = |(index, label): (usize, &mut Label)| {
        if *label != SOLVENT {
            return;
        }
        *label = if grid.has_neighbor_with_label(snapshot, grid.delinearize(index), OCCUPIED) {
            SURFACE
        } else {
            BULK_SOLVENT
        };
    };

    if enable_multi_threading {
        labels.par_iter_mut().enumerate().for_each(classify);
    } else {
        labels.iter_mut().enumerate().for_each(classify);
    }
}

/// Demotes surface voxels that have lost contact to the bulk solvent
///
/// A surface voxel is kept only if at least one of its 26 neighbors is [`BULK_SOLVENT`];
/// voxels buried between occupied and other surface voxels are demoted to [`OCCUPIED`].
pub fn filter_surface_noise(
    labels: &mut [Label],
    grid: &GridShape,
    enable_multi_threading: bool,
    workspace: &mut DetectionWorkspace,
) {
    profile!("filter_surface_noise");

    let snapshot = workspace.take_snapshot(labels);
    let filter = |(index, label): (usize, &mut Label)| {
        if *label != SURFACE {
            return;
        }
        if !grid.has_neighbor_with_label(snapshot, grid.delinearize(index), BULK_SOLVENT) {
            *label = OCCUPIED;
        }
    };

    if enable_multi_threading {
        labels.par_iter_mut().enumerate().for_each(filter);
    } else {
        labels.iter_mut().enumerate().for_each(filter);
    }
}
