//! Scalar type traits used throughout the crate

use nalgebra::Scalar;
use num::{Float, FromPrimitive, ToPrimitive};

/// Convenience trait alias for types that can be shared between threads
pub trait ThreadSafe: Sync + Send {}
impl<T> ThreadSafe for T where T: Sync + Send {}

/// Trait that has to be implemented by floating point types used for coordinates and radii
///
/// The crate only relies on component-wise arithmetic, so [`num::Float`] together with the
/// primitive conversions is sufficient. All distance comparisons specified by the surface
/// detection are evaluated in this type without intermediate rounding.
///
/// The scalar type has to represent every voxel coordinate of the grid exactly: the public
/// entry points reject grids whose largest extent does not survive a round trip through
/// the scalar type (this limits an `f32` axis to 2^24 cells; `f64` is no restriction for
/// any grid that fits in memory).
pub trait Real: Scalar + Copy + Default + Float + FromPrimitive + ToPrimitive + ThreadSafe {
    /// Converts a voxel coordinate to this scalar type
    ///
    /// The public entry points validate every grid extent with
    /// [`represents_cell_index`](Self::represents_cell_index) before the passes run, so
    /// the conversion cannot fail for coordinates inside a validated grid.
    #[inline]
    fn from_cell_index(value: usize) -> Self {
        <Self as FromPrimitive>::from_usize(value)
            .expect("voxel coordinate not representable by scalar type")
    }

    /// Returns whether the given voxel coordinate survives a round trip through this
    /// scalar type
    #[inline]
    fn represents_cell_index(value: usize) -> bool {
        <Self as FromPrimitive>::from_usize(value).and_then(|v| v.to_usize()) == Some(value)
    }
}

impl<T> Real for T where T: Scalar + Copy + Default + Float + FromPrimitive + ToPrimitive + ThreadSafe
{}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cell_index_is_exact_for_grid_coordinates() {
        assert_eq!(f64::from_cell_index(0), 0.0);
        assert_eq!(f64::from_cell_index(1023), 1023.0);
        assert_eq!(f32::from_cell_index(255), 255.0);
    }

    #[test]
    fn test_cell_index_round_trip_detects_precision_loss() {
        assert!(f32::represents_cell_index(1 << 24));
        assert!(!f32::represents_cell_index((1 << 24) + 1));
        assert!(f64::represents_cell_index((1 << 24) + 1));
    }
}
