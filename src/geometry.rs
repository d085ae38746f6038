//! Atom spheres and the two-axis rotation that aligns them with the grid

use nalgebra::Vector3;

use crate::{Real, SurfaceDetectionError};

/// A single atom given by its van der Waals sphere
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Atom<R: Real> {
    /// World-space center of the atom (in Å)
    pub center: Vector3<R>,
    /// Van der Waals radius of the atom (in Å)
    pub radius: R,
}

impl<R: Real> Atom<R> {
    /// Constructs an atom from its center and van der Waals radius
    pub fn new(center: Vector3<R>, radius: R) -> Self {
        Self { center, radius }
    }

    /// Builds an atom list from the flat `[x, y, z, r, x, y, z, r, ...]` layout
    ///
    /// The slice length has to be a multiple of four.
    pub fn from_interleaved(coordinates: &[R]) -> Result<Vec<Self>, SurfaceDetectionError> {
        if coordinates.len() % 4 != 0 {
            return Err(SurfaceDetectionError::MalformedAtomBuffer {
                len: coordinates.len(),
            });
        }
        Ok(coordinates
            .chunks_exact(4)
            .map(|c| Self::new(Vector3::new(c[0], c[1], c[2]), c[3]))
            .collect())
    }

    /// Tries to convert the atom from one [`Real`] type to another [`Real`] type, returns
    /// `None` if conversion fails
    pub fn try_convert<T: Real>(&self) -> Option<Atom<T>> {
        Some(Atom {
            center: Vector3::new(
                T::from_f64(self.center.x.to_f64()?)?,
                T::from_f64(self.center.y.to_f64()?)?,
                T::from_f64(self.center.z.to_f64()?)?,
            ),
            radius: T::from_f64(self.radius.to_f64()?)?,
        })
    }
}

/// Rotation about two axes that aligns a molecule with the principal frame of the grid
///
/// The rotation is supplied as precomputed sine/cosine pairs and applied as a rotation
/// about the y-axis (`beta`) followed by a rotation about the x-axis (`alpha`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rotation<R: Real> {
    pub sin_alpha: R,
    pub cos_alpha: R,
    pub sin_beta: R,
    pub cos_beta: R,
}

impl<R: Real> Rotation<R> {
    /// Constructs the rotation from its sine/cosine pairs
    pub fn new(sin_alpha: R, cos_alpha: R, sin_beta: R, cos_beta: R) -> Self {
        Self {
            sin_alpha,
            cos_alpha,
            sin_beta,
            cos_beta,
        }
    }

    /// Returns the identity rotation
    pub fn identity() -> Self {
        Self::new(R::zero(), R::one(), R::zero(), R::one())
    }

    /// Applies the rotation to a vector
    #[inline]
    pub fn apply(&self, v: &Vector3<R>) -> Vector3<R> {
        let x = v.x * self.cos_beta + v.z * self.sin_beta;
        let z = v.z * self.cos_beta - v.x * self.sin_beta;
        Vector3::new(
            x,
            v.y * self.cos_alpha - z * self.sin_alpha,
            v.y * self.sin_alpha + z * self.cos_alpha,
        )
    }

    /// Returns whether both sine/cosine pairs satisfy `sin² + cos² ≈ 1`
    ///
    /// The check is evaluated in f64 with an absolute tolerance of `1e-6` per axis.
    pub fn is_consistent(&self) -> bool {
        let pair_consistent = |sin: R, cos: R| -> bool {
            let (s, c) = match (sin.to_f64(), cos.to_f64()) {
                (Some(s), Some(c)) => (s, c),
                _ => return false,
            };
            (s * s + c * c - 1.0).abs() <= 1.0e-6
        };
        pair_consistent(self.sin_alpha, self.cos_alpha)
            && pair_consistent(self.sin_beta, self.cos_beta)
    }

    /// Tries to convert the rotation from one [`Real`] type to another [`Real`] type,
    /// returns `None` if conversion fails
    pub fn try_convert<T: Real>(&self) -> Option<Rotation<T>> {
        Some(Rotation {
            sin_alpha: T::from_f64(self.sin_alpha.to_f64()?)?,
            cos_alpha: T::from_f64(self.cos_alpha.to_f64()?)?,
            sin_beta: T::from_f64(self.sin_beta.to_f64()?)?,
            cos_beta: T::from_f64(self.cos_beta.to_f64()?)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_rotation_is_a_passthrough() {
        let rotation = Rotation::<f64>::identity();
        let v = Vector3::new(1.5, -2.0, 0.25);
        assert_eq!(rotation.apply(&v), v);
        assert!(rotation.is_consistent());
    }

    #[test]
    fn test_quarter_turns() {
        // alpha = 90°: y-z plane rotation
        let alpha = Rotation::new(1.0, 0.0, 0.0, 1.0);
        assert_eq!(
            alpha.apply(&Vector3::new(1.0, 2.0, 3.0)),
            Vector3::new(1.0, -3.0, 2.0)
        );

        // beta = 90°: x-z plane rotation
        let beta = Rotation::new(0.0, 1.0, 1.0, 0.0);
        assert_eq!(
            beta.apply(&Vector3::new(1.0, 2.0, 3.0)),
            Vector3::new(3.0, 2.0, -1.0)
        );
    }

    #[test]
    fn test_consistency_check_rejects_degenerate_pairs() {
        assert!(Rotation::new(0.6, 0.8, 0.0, 1.0).is_consistent());
        assert!(!Rotation::new(0.5, 0.5, 0.0, 1.0).is_consistent());
        assert!(!Rotation::new(f64::NAN, 1.0, 0.0, 1.0).is_consistent());
    }

    #[test]
    fn test_atoms_from_interleaved_layout() {
        let atoms = Atom::from_interleaved(&[1.0, 2.0, 3.0, 1.5, 4.0, 5.0, 6.0, 1.2]).unwrap();
        assert_eq!(atoms.len(), 2);
        assert_eq!(atoms[1].center, Vector3::new(4.0, 5.0, 6.0));
        assert_eq!(atoms[1].radius, 1.2);

        assert!(matches!(
            Atom::from_interleaved(&[1.0, 2.0, 3.0]),
            Err(SurfaceDetectionError::MalformedAtomBuffer { len: 3 })
        ));
    }

    #[test]
    fn test_try_convert_round_trip() {
        let atom = Atom::new(Vector3::new(1.0f64, 2.0, 3.0), 1.5);
        let converted: Atom<f32> = atom.try_convert().unwrap();
        assert_eq!(converted.radius, 1.5f32);
        assert!(Rotation::<f64>::identity().try_convert::<f32>().is_some());
    }
}
