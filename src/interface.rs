//! Extraction of the residues whose atoms touch the detected surface

use itertools::iproduct;
use rayon::prelude::*;

use crate::grid::{squared_distance_to_cell, GridShape, Label, SURFACE};
use crate::{detection, new_set, Atom, Parameters, Real, SurfaceDetectionError};

/// Collects the residue identifiers of all atoms with surface contact
///
/// Re-runs the rasterization geometry read-only against the final labeling produced by
/// [`detect_surface`](crate::detect_surface): an atom is part of the interface if a voxel
/// within its inflated radius (inclusive) carries the [`SURFACE`] label. `residue_ids`
/// supplies one identifier per atom; the returned identifiers keep ascending atom-index
/// order and duplicates are suppressed. The grid is not modified.
///
/// The returned list is freshly allocated; as with every allocation in this crate,
/// running out of memory aborts the process instead of returning an error.
pub fn interface_residues<R: Real>(
    labels: &[Label],
    grid: &GridShape,
    atoms: &[Atom<R>],
    residue_ids: &[String],
    parameters: &Parameters<R>,
) -> Result<Vec<String>, SurfaceDetectionError> {
    profile!("interface_residues");

    detection::validate_parameters(parameters)?;
    detection::validate_grid_extent::<R>(grid)?;
    detection::validate_label_buffer(labels.len(), grid)?;
    if residue_ids.len() != atoms.len() {
        return Err(SurfaceDetectionError::ResidueCountMismatch {
            residues: residue_ids.len(),
            atoms: atoms.len(),
        });
    }

    let mut seen = new_set();
    let mut residues = Vec::new();
    for index in surface_atom_indices(labels, grid, atoms, parameters) {
        let id = residue_ids[index].as_str();
        if seen.insert(id) {
            residues.push(id.to_owned());
        }
    }
    Ok(residues)
}

/// Returns the indices of all atoms with surface contact, in ascending order
///
/// Performs no input validation; every atom is recorded at most once.
pub fn surface_atom_indices<R: Real>(
    labels: &[Label],
    grid: &GridShape,
    atoms: &[Atom<R>],
    parameters: &Parameters<R>,
) -> Vec<usize> {
    if parameters.enable_multi_threading {
        atoms
            .par_iter()
            .enumerate()
            .filter(|(_, atom)| atom_touches_surface(labels, grid, atom, parameters))
            .map(|(index, _)| index)
            .collect()
    } else {
        atoms
            .iter()
            .enumerate()
            .filter(|(_, atom)| atom_touches_surface(labels, grid, atom, parameters))
            .map(|(index, _)| index)
            .collect()
    }
}

/// Scans the inflated bounding box of the atom for a surface voxel
fn atom_touches_surface<R: Real>(
    labels: &[Label],
    grid: &GridShape,
    atom: &Atom<R>,
    parameters: &Parameters<R>,
) -> bool {
    let center = parameters.voxel_space_center(atom);
    let radius = parameters.inflated_radius(atom);
    let [ri, rj, rk] = match grid.sphere_extent(&center, radius) {
        Some(extent) => extent,
        None => return false,
    };

    // contact is inclusive: a voxel at exactly the inflated radius counts
    let threshold = radius * radius;
    for (i, j, k) in iproduct!(ri, rj, rk) {
        if labels[grid.linearize(i, j, k)] == SURFACE
            && squared_distance_to_cell(&center, (i, j, k)) <= threshold
        {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{detect_surface, Rotation, SurfaceType};
    use nalgebra::Vector3;

    fn parameters(
        voxel_size: f64,
        probe_radius: f64,
        surface_type: SurfaceType,
    ) -> Parameters<f64> {
        Parameters {
            voxel_size,
            probe_radius,
            surface_type,
            grid_reference: Vector3::zeros(),
            rotation: Rotation::identity(),
            enable_multi_threading: false,
        }
    }

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_contact_at_exactly_the_inflated_radius_counts() {
        // with these parameters the inflated radius is exactly 2 voxels, so the nearest
        // surface voxels of an accessible-surface labeling lie at distance 2
        let grid = GridShape::new(11, 11, 11).unwrap();
        let parameters = parameters(1.0, 0.5, SurfaceType::SolventAccessible);
        let atoms = [Atom::new(Vector3::new(5.0, 5.0, 5.0), 1.5)];

        let mut labels = vec![0; grid.cell_count()];
        detect_surface(&mut labels, &grid, &atoms, &parameters).unwrap();
        assert_eq!(labels[grid.linearize(5, 5, 7)], SURFACE);

        let residues =
            interface_residues(&labels, &grid, &atoms, &ids(&["42_A"]), &parameters).unwrap();
        assert_eq!(residues, ids(&["42_A"]));
    }

    #[test]
    fn test_duplicate_residue_identifiers_are_suppressed() {
        let grid = GridShape::new(16, 16, 16).unwrap();
        let parameters = parameters(0.6, 1.4, SurfaceType::SolventExcluded);
        let atoms = [
            Atom::new(Vector3::new(4.0, 4.0, 4.0), 1.5),
            Atom::new(Vector3::new(5.5, 4.0, 4.0), 1.5),
            Atom::new(Vector3::new(4.0, 5.5, 4.0), 1.2),
        ];

        let mut labels = vec![0; grid.cell_count()];
        detect_surface(&mut labels, &grid, &atoms, &parameters).unwrap();

        let residues = interface_residues(
            &labels,
            &grid,
            &atoms,
            &ids(&["17_B", "17_B", "18_B"]),
            &parameters,
        )
        .unwrap();
        assert_eq!(residues, ids(&["17_B", "18_B"]));
    }

    #[test]
    fn test_residue_count_has_to_match_the_atom_count() {
        let grid = GridShape::new(5, 5, 5).unwrap();
        let parameters = parameters(1.0, 1.4, SurfaceType::SolventExcluded);
        let atoms = [Atom::new(Vector3::new(2.0, 2.0, 2.0), 1.5)];

        let labels = vec![0; grid.cell_count()];
        assert!(matches!(
            interface_residues(&labels, &grid, &atoms, &ids(&["1_A", "2_A"]), &parameters),
            Err(SurfaceDetectionError::ResidueCountMismatch {
                residues: 2,
                atoms: 1
            })
        ));
    }

    #[test]
    fn test_no_atoms_means_no_interface() {
        let grid = GridShape::new(5, 5, 5).unwrap();
        let parameters = parameters(1.0, 1.4, SurfaceType::SolventExcluded);
        let labels = vec![SURFACE; grid.cell_count()];

        let residues =
            interface_residues(&labels, &grid, &[] as &[Atom<f64>], &[], &parameters).unwrap();
        assert!(residues.is_empty());
    }
}
