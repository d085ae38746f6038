//! Rasterization of inflated atom spheres into the background grid

use itertools::iproduct;
use log::debug;
use rayon::prelude::*;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::grid::{squared_distance_to_cell, GridShape, Label, OCCUPIED};
use crate::{utils, Atom, Parameters, Real};

/// Marks every voxel covered by an inflated atom sphere as [`OCCUPIED`]
///
/// Each atom center is transformed into the rotated voxel frame of the grid and its sphere,
/// inflated by the probe radius, is rasterized over the enclosing index box: a voxel becomes
/// occupied when its lattice point lies strictly within the inflated radius. Expects the
/// grid to be seeded with [`SOLVENT`](crate::grid::SOLVENT); all other voxels are left
/// untouched.
///
/// Atoms are processed in parallel when multi threading is enabled. All writes store the
/// same constant, so the scattered stores go through relaxed atomics.
pub fn rasterize_atoms<R: Real>(
    labels: &mut [Label],
    grid: &GridShape,
    atoms: &[Atom<R>],
    parameters: &Parameters<R>,
) {
    profile!("rasterize_atoms");
    debug!("Rasterizing {} atom spheres", atoms.len());

    let cells = utils::as_shared_atomics(labels);
    if parameters.enable_multi_threading {
        atoms
            .par_iter()
            .for_each(|atom| rasterize_atom(cells, grid, atom, parameters));
    } else {
        atoms
            .iter()
            .for_each(|atom| rasterize_atom(cells, grid, atom, parameters));
    }
}

/// Rasterizes a single inflated atom sphere
fn rasterize_atom<R: Real>(
    cells: &[AtomicI32],
    grid: &GridShape,
    atom: &Atom<R>,
    parameters: &Parameters<R>,
) {
    let center = parameters.voxel_space_center(atom);
    let radius = parameters.inflated_radius(atom);
    let [ri, rj, rk] = match grid.sphere_extent(&center, radius) {
        Some(extent) => extent,
        // the sphere does not intersect the grid at all
        None => return,
    };

    // occupancy is strict: a voxel at exactly the inflated radius stays solvent
    let threshold = radius * radius;
    for (i, j, k) in iproduct!(ri, rj, rk) {
        if squared_distance_to_cell(&center, (i, j, k)) < threshold {
            cells[grid.linearize(i, j, k)].store(OCCUPIED, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::SOLVENT;
    use crate::{Rotation, SurfaceType};
    use nalgebra::Vector3;

    fn parameters(voxel_size: f64, probe_radius: f64, rotation: Rotation<f64>) -> Parameters<f64> {
        Parameters {
            voxel_size,
            probe_radius,
            surface_type: SurfaceType::SolventAccessible,
            grid_reference: Vector3::zeros(),
            rotation,
            enable_multi_threading: false,
        }
    }

    /// Reference rasterization: tests every voxel of the grid against the inflated sphere
    fn brute_force_sphere(grid: &GridShape, center: &Vector3<f64>, radius: f64) -> Vec<Label> {
        (0..grid.cell_count())
            .map(|index| {
                if squared_distance_to_cell(center, grid.delinearize(index)) < radius * radius {
                    OCCUPIED
                } else {
                    SOLVENT
                }
            })
            .collect()
    }

    #[test]
    fn test_rasterization_matches_reference_sphere() {
        let grid = GridShape::new(12, 12, 12).unwrap();
        let parameters = parameters(0.8, 1.1, Rotation::identity());
        let atom = Atom::new(Vector3::new(5.5, 5.2, 4.8), 1.7);

        let mut labels = vec![SOLVENT; grid.cell_count()];
        rasterize_atoms(&mut labels, &grid, &[atom], &parameters);

        let center = parameters.voxel_space_center(&atom);
        let radius = parameters.inflated_radius(&atom);
        assert_eq!(labels, brute_force_sphere(&grid, &center, radius));
    }

    #[test]
    fn test_atom_outside_of_the_grid_is_ignored() {
        let grid = GridShape::new(8, 8, 8).unwrap();
        let parameters = parameters(1.0, 1.4, Rotation::identity());

        let mut labels = vec![SOLVENT; grid.cell_count()];
        rasterize_atoms(
            &mut labels,
            &grid,
            &[Atom::new(Vector3::new(-50.0, 4.0, 4.0), 1.5)],
            &parameters,
        );
        assert!(labels.iter().all(|&label| label == SOLVENT));
    }

    #[test]
    fn test_rotation_is_applied_to_the_atom_center() {
        let grid = GridShape::new(9, 9, 9).unwrap();

        // a quarter turn about the y-axis maps (0, 4, 4) onto (4, 4, 0)
        let rotated = parameters(1.0, 1.0, Rotation::new(0.0, 1.0, 1.0, 0.0));
        let mut labels_rotated = vec![SOLVENT; grid.cell_count()];
        rasterize_atoms(
            &mut labels_rotated,
            &grid,
            &[Atom::new(Vector3::new(0.0, 4.0, 4.0), 1.2)],
            &rotated,
        );

        let identity = parameters(1.0, 1.0, Rotation::identity());
        let mut labels_reference = vec![SOLVENT; grid.cell_count()];
        rasterize_atoms(
            &mut labels_reference,
            &grid,
            &[Atom::new(Vector3::new(4.0, 4.0, 0.0), 1.2)],
            &identity,
        );

        assert_eq!(labels_rotated, labels_reference);
    }

    #[test]
    fn test_parallel_rasterization_is_equivalent() {
        let grid = GridShape::new(16, 16, 16).unwrap();
        let atoms = [
            Atom::new(Vector3::new(5.0, 5.0, 5.0), 1.5),
            Atom::new(Vector3::new(8.0, 7.0, 6.0), 1.8),
            Atom::new(Vector3::new(10.0, 10.0, 10.0), 1.2),
        ];

        let serial = parameters(1.0, 1.4, Rotation::identity());
        let mut parallel = serial.clone();
        parallel.enable_multi_threading = true;

        let mut labels_serial = vec![SOLVENT; grid.cell_count()];
        rasterize_atoms(&mut labels_serial, &grid, &atoms, &serial);
        let mut labels_parallel = vec![SOLVENT; grid.cell_count()];
        rasterize_atoms(&mut labels_parallel, &grid, &atoms, &parallel);

        assert_eq!(labels_serial, labels_parallel);
    }
}
