//! The dense background grid of voxel labels used by the surface detection
//!
//! The grid itself is caller allocated: all functions of this crate operate on a plain
//! `&[Label]`/`&mut [Label]` slice whose layout is described by a [`GridShape`]. Voxel
//! `(i, j, k)` is stored at linear index `k + nz * (j + ny * i)`, i.e. the `k` axis is the
//! stride-1 axis and all stencil loops iterate it innermost.

use log::info;
use nalgebra::Vector3;
use num::Float;
use std::ops::Range;
use thiserror::Error as ThisError;

use crate::Real;

/// Storage type of a single voxel label
pub type Label = i32;

/// Label of voxels not covered by any inflated atom sphere
///
/// The same value is used for the surface voxels after the extraction passes; the grid is
/// rewritten in place and the post-condition of each pass documents which meaning applies.
pub const SOLVENT: Label = 1;
/// Label of voxels that are part of the detected molecular surface (intentionally the same
/// value as [`SOLVENT`], see there)
pub const SURFACE: Label = 1;
/// Label of voxels covered by an atom sphere inflated by the probe radius
pub const OCCUPIED: Label = 0;
/// Label of solvent voxels without contact to the molecular surface
pub const BULK_SOLVENT: Label = -1;
/// Transient label marking voxels carved out of the occupied set while eroding the
/// accessible surface by one probe radius
pub const EROSION_MARK: Label = -2;
/// Tag assigned to the first connected surface component found during clustering; later
/// components count upwards from here
pub const FIRST_COMPONENT_TAG: Label = 2;

/// Error type for the construction of a [`GridShape`]
#[derive(Clone, Debug, ThisError)]
pub enum GridConstructionError {
    /// At least one dimension is too small to leave the one-voxel boundary margin
    #[error("every grid dimension must be at least 3 to keep a boundary margin, got {0}x{1}x{2}")]
    GridTooSmall(usize, usize, usize),
    /// The total cell count cannot be represented
    #[error("the cell count of a {0}x{1}x{2} grid overflows usize")]
    CellCountOverflow(usize, usize, usize),
}

/// Dimensions and index layout of a dense voxel label grid
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GridShape {
    nx: usize,
    ny: usize,
    nz: usize,
}

impl GridShape {
    /// Constructs a grid shape, enforcing the minimum dimensions required by the boundary
    /// sentinel of the clustering pass
    pub fn new(nx: usize, ny: usize, nz: usize) -> Result<Self, GridConstructionError> {
        if nx < 3 || ny < 3 || nz < 3 {
            return Err(GridConstructionError::GridTooSmall(nx, ny, nz));
        }
        nx.checked_mul(ny)
            .and_then(|nxy| nxy.checked_mul(nz))
            .ok_or(GridConstructionError::CellCountOverflow(nx, ny, nz))?;
        Ok(Self { nx, ny, nz })
    }

    /// Returns the number of cells along the i-axis
    #[inline]
    pub fn nx(&self) -> usize {
        self.nx
    }

    /// Returns the number of cells along the j-axis
    #[inline]
    pub fn ny(&self) -> usize {
        self.ny
    }

    /// Returns the number of cells along the k-axis
    #[inline]
    pub fn nz(&self) -> usize {
        self.nz
    }

    /// Returns the total number of cells of the grid
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    /// Returns the linear index of voxel `(i, j, k)`
    #[inline]
    pub fn linearize(&self, i: usize, j: usize, k: usize) -> usize {
        debug_assert!(i < self.nx && j < self.ny && k < self.nz);
        k + self.nz * (j + self.ny * i)
    }

    /// Inverse of [`linearize`](Self::linearize)
    #[inline]
    pub fn delinearize(&self, index: usize) -> (usize, usize, usize) {
        let jk = self.ny * self.nz;
        let i = index / jk;
        let rem = index % jk;
        (i, rem / self.nz, rem % self.nz)
    }

    /// Returns whether the voxel lies on the outermost shell of the grid
    ///
    /// Shell voxels act as a sentinel margin: the clustering pass never enters them.
    #[inline]
    pub fn is_on_shell(&self, i: usize, j: usize, k: usize) -> bool {
        i == 0
            || j == 0
            || k == 0
            || i == self.nx - 1
            || j == self.ny - 1
            || k == self.nz - 1
    }

    /// Computes the per-axis index ranges of the bounding box of a sphere in voxel
    /// coordinates, clamped to the grid
    ///
    /// The box spans `⌊c − r⌋..⌈c + r⌉` per axis. Returns `None` if the box does not
    /// intersect the grid at all.
    pub fn sphere_extent<R: Real>(
        &self,
        center: &Vector3<R>,
        radius: R,
    ) -> Option<[Range<usize>; 3]> {
        let mut extent = [0..0, 0..0, 0..0];
        for (axis, cells) in [self.nx, self.ny, self.nz].into_iter().enumerate() {
            let lo = Float::floor(center[axis] - radius);
            let hi = Float::ceil(center[axis] + radius);
            let last = R::from_cell_index(cells - 1);
            if hi < R::zero() || lo > last {
                return None;
            }
            let lo = if lo < R::zero() { 0 } else { lo.to_usize()? };
            let hi = if hi > last { cells - 1 } else { hi.to_usize()? };
            extent[axis] = lo..hi + 1;
        }
        Some(extent)
    }

    /// Returns whether any voxel of the 26-neighborhood of `(i, j, k)` carries the given
    /// label
    ///
    /// Neighbors outside of the grid are skipped, the center voxel is not inspected.
    pub fn has_neighbor_with_label(
        &self,
        labels: &[Label],
        (i, j, k): (usize, usize, usize),
        needle: Label,
    ) -> bool {
        for ii in i.saturating_sub(1)..=(i + 1).min(self.nx - 1) {
            for jj in j.saturating_sub(1)..=(j + 1).min(self.ny - 1) {
                for kk in k.saturating_sub(1)..=(k + 1).min(self.nz - 1) {
                    if (ii, jj, kk) == (i, j, k) {
                        continue;
                    }
                    if labels[self.linearize(ii, jj, kk)] == needle {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Logs the grid dimensions
    pub fn log_grid_info(&self) {
        info!(
            "Grid: {}x{}x{} = {} voxels",
            self.nx,
            self.ny,
            self.nz,
            self.cell_count()
        );
    }
}

/// Squared Euclidean distance between two lattice points
#[inline]
pub(crate) fn squared_cell_distance(
    (ai, aj, ak): (usize, usize, usize),
    (bi, bj, bk): (usize, usize, usize),
) -> usize {
    let di = ai.abs_diff(bi);
    let dj = aj.abs_diff(bj);
    let dk = ak.abs_diff(bk);
    di * di + dj * dj + dk * dk
}

/// Squared Euclidean distance from a point in voxel coordinates to a lattice point
#[inline]
pub(crate) fn squared_distance_to_cell<R: Real>(
    center: &Vector3<R>,
    (i, j, k): (usize, usize, usize),
) -> R {
    let dx = center.x - R::from_cell_index(i);
    let dy = center.y - R::from_cell_index(j);
    let dz = center.z - R::from_cell_index(k);
    dx * dx + dy * dy + dz * dz
}
