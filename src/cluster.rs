//! Flood-fill clustering of connected surface components

use log::debug;

use crate::grid::{GridShape, Label, FIRST_COMPONENT_TAG, OCCUPIED, SURFACE};
use crate::workspace::DetectionWorkspace;

/// Summary of a clustering pass
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ClusteringOutcome {
    /// Number of connected surface components found
    pub components: usize,
    /// Voxel count of the retained component
    pub retained_voxels: usize,
    /// Total voxel count of the discarded components
    pub discarded_voxels: usize,
}

/// Retains the surface component of the biomolecule's outer surface and discards the rest
///
/// The grid is scanned in i-major order and every surface voxel seeds a 26-connected flood
/// fill that tags its component. The scan reaches the outer surface first, so the first
/// component is the outer one: it is kept as [`SURFACE`] while all later components —
/// surfaces of enclosed pockets — are demoted to [`OCCUPIED`].
///
/// Voxels on the outermost shell of the grid are neither seeded nor entered by the fill;
/// the shell acts as a sentinel margin and callers are expected to size the grid so that
/// the surface does not touch it.
///
/// This pass runs serially: the component tags form a cross-voxel dependency.
pub fn keep_outer_surface_component(
    labels: &mut [Label],
    grid: &GridShape,
    workspace: &mut DetectionWorkspace,
) -> ClusteringOutcome {
    profile!("keep_outer_surface_component");

    let stack = &mut workspace.fill_stack;
    stack.clear();

    let mut tag = FIRST_COMPONENT_TAG - 1;
    let mut outcome = ClusteringOutcome::default();

    for i in 1..grid.nx() - 1 {
        for j in 1..grid.ny() - 1 {
            for k in 1..grid.nz() - 1 {
                if labels[grid.linearize(i, j, k)] != SURFACE {
                    continue;
                }
                tag += 1;
                let size = flood_component(labels, grid, stack, (i, j, k), tag);
                if tag == FIRST_COMPONENT_TAG {
                    outcome.retained_voxels = size;
                } else {
                    outcome.discarded_voxels += size;
                }
            }
        }
    }
    outcome.components = (tag + 1 - FIRST_COMPONENT_TAG) as usize;

    for label in labels.iter_mut() {
        if *label == FIRST_COMPONENT_TAG {
            *label = SURFACE;
        } else if *label > FIRST_COMPONENT_TAG {
            *label = OCCUPIED;
        }
    }

    debug!(
        "Found {} surface components, retained {} voxels, discarded {} voxels",
        outcome.components, outcome.retained_voxels, outcome.discarded_voxels
    );
    outcome
}

/// Tags the 26-connected component of surface voxels reachable from the seed
///
/// Uses an explicit work stack, so the component size is only bounded by the grid. The fill
/// never enters voxels on the outermost shell. Returns the voxel count of the component.
fn flood_component(
    labels: &mut [Label],
    grid: &GridShape,
    stack: &mut Vec<(usize, usize, usize)>,
    seed: (usize, usize, usize),
    tag: Label,
) -> usize {
    labels[grid.linearize(seed.0, seed.1, seed.2)] = tag;
    stack.push(seed);
    let mut size = 1;

    while let Some((i, j, k)) = stack.pop() {
        for ii in (i - 1).max(1)..=(i + 1).min(grid.nx() - 2) {
            for jj in (j - 1).max(1)..=(j + 1).min(grid.ny() - 2) {
                for kk in (k - 1).max(1)..=(k + 1).min(grid.nz() - 2) {
                    let index = grid.linearize(ii, jj, kk);
                    if labels[index] == SURFACE {
                        labels[index] = tag;
                        stack.push((ii, jj, kk));
                        size += 1;
                    }
                }
            }
        }
    }
    size
}
