//! Functions calling the individual stages of the detection pipeline

use log::info;

use crate::grid::{GridShape, Label, SOLVENT};
use crate::workspace::DetectionWorkspace;
use crate::{
    cluster, erosion, rasterize, surface, Atom, Parameters, Real, SurfaceDetectionError,
    SurfaceType,
};

/// Runs the full detection pipeline on the caller-allocated label grid
///
/// Stage order is fixed: seed, rasterize, optional erosion to the excluded surface,
/// solvent classification, component clustering, noise filtering. Each stage completes
/// before the next one starts. Validation happens before the first write, so a rejected
/// call leaves the grid untouched.
pub(crate) fn detect_surface_inplace<R: Real>(
    labels: &mut [Label],
    grid: &GridShape,
    atoms: &[Atom<R>],
    parameters: &Parameters<R>,
    workspace: &mut DetectionWorkspace,
) -> Result<(), SurfaceDetectionError> {
    validate_parameters(parameters)?;
    validate_grid_extent::<R>(grid)?;
    validate_label_buffer(labels.len(), grid)?;

    grid.log_grid_info();
    info!(
        "Detecting the {} surface of {} atoms",
        match parameters.surface_type {
            SurfaceType::SolventAccessible => "solvent-accessible",
            SurfaceType::SolventExcluded => "solvent-excluded",
        },
        atoms.len()
    );

    {
        profile!("seed_grid");
        labels.fill(SOLVENT);
    }

    rasterize::rasterize_atoms(labels, grid, atoms, parameters);
    if parameters.surface_type == SurfaceType::SolventExcluded {
        erosion::erode_accessible_surface(labels, grid, parameters, workspace);
    }
    surface::classify_solvent_voxels(labels, grid, parameters.enable_multi_threading, workspace);
    let outcome = cluster::keep_outer_surface_component(labels, grid, workspace);
    surface::filter_surface_noise(labels, grid, parameters.enable_multi_threading, workspace);

    if outcome.components > 1 {
        info!(
            "Retained the outer surface ({} voxels), discarded {} enclosed component(s) ({} voxels)",
            outcome.retained_voxels,
            outcome.components - 1,
            outcome.discarded_voxels
        );
    }
    Ok(())
}

/// Rejects degenerate geometry per the input constraints of the public operations
pub(crate) fn validate_parameters<R: Real>(
    parameters: &Parameters<R>,
) -> Result<(), SurfaceDetectionError> {
    // the negated comparisons also reject NaN values
    if !(parameters.voxel_size > R::zero()) {
        return Err(SurfaceDetectionError::NonPositiveVoxelSize(
            parameters.voxel_size.to_f64().unwrap_or(f64::NAN),
        ));
    }
    if !(parameters.probe_radius >= R::zero()) {
        return Err(SurfaceDetectionError::NegativeProbeRadius(
            parameters.probe_radius.to_f64().unwrap_or(f64::NAN),
        ));
    }
    if !parameters.rotation.is_consistent() {
        return Err(SurfaceDetectionError::InconsistentRotation);
    }
    Ok(())
}

/// Rejects grids with a voxel coordinate that the scalar type cannot represent exactly
///
/// Guarantees that every [`Real::from_cell_index`] conversion inside the passes is exact.
pub(crate) fn validate_grid_extent<R: Real>(
    grid: &GridShape,
) -> Result<(), SurfaceDetectionError> {
    let extent = grid.nx().max(grid.ny()).max(grid.nz()) - 1;
    if !R::represents_cell_index(extent) {
        return Err(SurfaceDetectionError::UnrepresentableGridExtent { extent });
    }
    Ok(())
}

/// Rejects label buffers that do not match the cell count of the grid shape
pub(crate) fn validate_label_buffer(
    len: usize,
    grid: &GridShape,
) -> Result<(), SurfaceDetectionError> {
    if len != grid.cell_count() {
        return Err(SurfaceDetectionError::GridSizeMismatch {
            expected: grid.cell_count(),
            actual: len,
        });
    }
    Ok(())
}
