//!
//! Library for voxelized detection of the solvent-excluded surface of biomolecules. Entry
//! points are the [detect_surface] and [interface_residues] functions.
//!
//! The caller supplies a dense label grid, the atoms as van der Waals spheres and a
//! rotation aligning the molecule with the grid; the detection rewrites the grid in place
//! until every voxel carries one of the final labels (occupied, surface or bulk solvent).
//! The surface labeling can then be queried for the residues that lie on it.
//!

/// Re-export the version of coarse_prof used by this crate, if profiling is enabled
#[cfg(feature = "profiling")]
pub use coarse_prof;
/// Re-export the version of nalgebra used by this crate
pub use nalgebra;

#[cfg(feature = "profiling")]
/// Invokes coarse_prof::profile! with the given expression
macro_rules! profile {
    ($body:expr) => {
        coarse_prof::profile!($body);
    };
}

#[cfg(not(feature = "profiling"))]
/// No-op macro if profiling is disabled
macro_rules! profile {
    ($body:expr) => {
        $body
    };
}

/// Flood-fill clustering of connected surface components
pub mod cluster;
/// Functions calling the individual stages of the detection pipeline
mod detection;
/// Erosion of the solvent-accessible labeling into the solvent-excluded labeling
pub mod erosion;
/// Atom spheres and the rotation descriptor consumed by the detection
pub mod geometry;
/// The dense label grid, its index layout and the label alphabet
pub mod grid;
/// Extraction of the residues whose atoms touch the detected surface
pub mod interface;
mod numeric_types;
/// Rasterization of inflated atom spheres into the background grid
pub mod rasterize;
/// Classification of solvent voxels into surface and bulk solvent
pub mod surface;
/// Internal helper functions and types
mod utils;
/// Workspace for reusing allocated memory between multiple surface detections
pub mod workspace;

use nalgebra::Vector3;
use thiserror::Error as ThisError;

pub use cluster::ClusteringOutcome;
pub use geometry::{Atom, Rotation};
pub use grid::{GridConstructionError, GridShape, Label};
pub use grid::{BULK_SOLVENT, OCCUPIED, SOLVENT, SURFACE};
pub use interface::{interface_residues, surface_atom_indices};
pub use numeric_types::{Real, ThreadSafe};
pub use workspace::DetectionWorkspace;

// TODO: Expose per-component voxel counts from the clustering pass
// TODO: Make the label type strongly typed

pub(crate) type HashState = fxhash::FxBuildHasher;
pub(crate) type SetType<T> = std::collections::HashSet<T, HashState>;
pub(crate) fn new_set<T>() -> SetType<T> {
    SetType::with_hasher(HashState::default())
}

/// Which surface definition the detection produces
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SurfaceType {
    /// Boundary of the atom volume inflated by the probe radius
    SolventAccessible,
    /// Accessible volume eroded again by one probe radius
    SolventExcluded,
}

/// Parameters for the surface detection
#[derive(Clone, Debug)]
pub struct Parameters<R: Real> {
    /// Edge length of a voxel of the background grid (in Å)
    pub voxel_size: R,
    /// Radius of the spherical solvent probe (in Å)
    pub probe_radius: R,
    /// Which surface definition is used for the final labeling
    pub surface_type: SurfaceType,
    /// World-space position of grid voxel (0, 0, 0)
    pub grid_reference: Vector3<R>,
    /// Rotation that aligns the molecule with the principal frame of the grid
    pub rotation: Rotation<R>,
    /// Whether to allow multi threading within the surface detection procedure
    pub enable_multi_threading: bool,
}

impl<R: Real> Parameters<R> {
    /// Transforms a world-space atom center into the rotated voxel frame of the grid
    #[inline]
    pub fn voxel_space_center(&self, atom: &Atom<R>) -> Vector3<R> {
        let scaled = Vector3::new(
            (atom.center.x - self.grid_reference.x) / self.voxel_size,
            (atom.center.y - self.grid_reference.y) / self.voxel_size,
            (atom.center.z - self.grid_reference.z) / self.voxel_size,
        );
        self.rotation.apply(&scaled)
    }

    /// Returns the radius of the atom inflated by the probe radius, in voxel units
    #[inline]
    pub fn inflated_radius(&self, atom: &Atom<R>) -> R {
        (atom.radius + self.probe_radius) / self.voxel_size
    }

    /// Tries to convert the parameters from one [Real] type to another [Real] type,
    /// returns `None` if conversion fails
    pub fn try_convert<T: Real>(&self) -> Option<Parameters<T>> {
        Some(Parameters {
            voxel_size: T::from_f64(self.voxel_size.to_f64()?)?,
            probe_radius: T::from_f64(self.probe_radius.to_f64()?)?,
            surface_type: self.surface_type,
            grid_reference: Vector3::new(
                T::from_f64(self.grid_reference.x.to_f64()?)?,
                T::from_f64(self.grid_reference.y.to_f64()?)?,
                T::from_f64(self.grid_reference.z.to_f64()?)?,
            ),
            rotation: self.rotation.try_convert()?,
            enable_multi_threading: self.enable_multi_threading,
        })
    }
}

/// Error type returned when a surface detection or interface extraction call is rejected
#[non_exhaustive]
#[derive(Debug, ThisError)]
pub enum SurfaceDetectionError {
    /// Errors that occur during the construction of the grid shape
    #[error("grid construction: {0}")]
    GridConstructionError(GridConstructionError),
    /// The label buffer does not match the cell count of the grid shape
    #[error("the label buffer holds {actual} cells but the grid shape requires {expected}")]
    GridSizeMismatch {
        /// Cell count required by the grid shape
        expected: usize,
        /// Length of the supplied label buffer
        actual: usize,
    },
    /// The flat atom buffer is not made of (x, y, z, r) quadruples
    #[error("the atom buffer holds {len} values, which is not a multiple of four")]
    MalformedAtomBuffer {
        /// Length of the supplied buffer
        len: usize,
    },
    /// One residue identifier has to be supplied per atom
    #[error("{residues} residue identifiers were supplied for {atoms} atoms")]
    ResidueCountMismatch {
        /// Number of supplied residue identifiers
        residues: usize,
        /// Number of supplied atoms
        atoms: usize,
    },
    /// A voxel coordinate of the grid cannot be represented exactly by the scalar type
    #[error("the grid extent {extent} cannot be represented exactly by the scalar type")]
    UnrepresentableGridExtent {
        /// Largest voxel coordinate of the grid
        extent: usize,
    },
    /// The voxel edge length is zero, negative or not finite
    #[error("the voxel size must be positive, got {0}")]
    NonPositiveVoxelSize(f64),
    /// The probe radius is negative or not finite
    #[error("the probe radius must be non-negative, got {0}")]
    NegativeProbeRadius(f64),
    /// A sine/cosine pair of the rotation descriptor is not normalized
    #[error("the rotation descriptor is not made of consistent sine/cosine pairs")]
    InconsistentRotation,
    /// Any error that is not represented by some other explicit variant
    #[error("unknown error")]
    Unknown(anyhow::Error),
}

impl From<GridConstructionError> for SurfaceDetectionError {
    /// Allows automatic conversion of a [GridConstructionError] to a [SurfaceDetectionError]
    fn from(error: GridConstructionError) -> Self {
        SurfaceDetectionError::GridConstructionError(error)
    }
}

impl From<anyhow::Error> for SurfaceDetectionError {
    /// Allows automatic conversion of an anyhow::Error to a [SurfaceDetectionError]
    fn from(error: anyhow::Error) -> Self {
        SurfaceDetectionError::Unknown(error)
    }
}

/// Initializes the global thread pool used by this library with the given parameters.
///
/// Initialization of the global thread pool happens exactly once.
/// Therefore, if you call `initialize_thread_pool` a second time, it will return an error.
/// An `Ok` result indicates that this is the first initialization of the thread pool.
pub fn initialize_thread_pool(num_threads: usize) -> Result<(), anyhow::Error> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;
    Ok(())
}

/// Detects the solvent-exposed surface of the given atoms on the caller-allocated grid
///
/// The grid is seeded and rewritten in place; its previous contents are ignored. After a
/// successful call every voxel carries one of [OCCUPIED], [SURFACE] or [BULK_SOLVENT],
/// and the surface voxels form the single outer component of the molecular surface.
#[inline(never)]
pub fn detect_surface<R: Real>(
    labels: &mut [Label],
    grid: &GridShape,
    atoms: &[Atom<R>],
    parameters: &Parameters<R>,
) -> Result<(), SurfaceDetectionError> {
    profile!("detect_surface");
    let mut workspace = DetectionWorkspace::default();
    detect_surface_with_workspace(labels, grid, atoms, parameters, &mut workspace)
}

/// Performs the surface detection like [detect_surface], reusing the scratch allocations
/// of the given workspace
pub fn detect_surface_with_workspace<R: Real>(
    labels: &mut [Label],
    grid: &GridShape,
    atoms: &[Atom<R>],
    parameters: &Parameters<R>,
    workspace: &mut DetectionWorkspace,
) -> Result<(), SurfaceDetectionError> {
    detection::detect_surface_inplace(labels, grid, atoms, parameters, workspace)
}
