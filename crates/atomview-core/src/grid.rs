//! Regular cubical sampling lattices centered on the nucleus.

use glam::{DVec3, UVec3, Vec3};

use crate::error::{AtomViewError, Result};
use crate::options::BuildOptions;
use crate::quantum::QuantumState;

/// A cubical lattice of `num_pts³` nodes around the origin.
///
/// The nucleus is always a node, so nodal planes through it (`z = 0` for
/// `p_z`, ...) are sampled exactly and separate the lobes on either side. For
/// an even `num_pts` the lattice therefore sits half a spacing off-center.
///
/// Nodes are stored x-fastest: node `(i, j, k)` lives at linear index
/// `i + num_pts * (j + num_pts * k)`. All lengths are in Bohr radii.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleGrid {
    origin: DVec3,
    spacing: f64,
    half_extent: f64,
    num_pts: u32,
}

impl SampleGrid {
    /// Creates a grid with spacing `2 * half_extent / (num_pts - 1)` and node
    /// `num_pts / 2` at the origin on every axis.
    pub fn new(half_extent: f64, num_pts: u32) -> Result<Self> {
        if num_pts < 2 || (num_pts as usize).checked_pow(3).is_none() {
            return Err(AtomViewError::InvalidGrid { num_pts });
        }
        if !half_extent.is_finite() || half_extent <= 0.0 {
            return Err(AtomViewError::InvalidOptions(format!(
                "grid half extent must be positive, got {half_extent}"
            )));
        }
        let spacing = 2.0 * half_extent / f64::from(num_pts - 1);
        Ok(Self {
            origin: DVec3::splat(-f64::from(num_pts / 2) * spacing),
            spacing,
            half_extent,
            num_pts,
        })
    }

    /// Creates the grid that encloses `state`, scaled with `n²`.
    ///
    /// Contour and volume builders both use this, so the two views of one
    /// orbital share a frame.
    pub fn for_state(state: &QuantumState, num_pts: u32, options: &BuildOptions) -> Result<Self> {
        let n = f64::from(state.n());
        let grid = Self::new(options.extent_scale * n * n + options.extent_padding, num_pts)?;
        log::debug!(
            "{state}: grid of {num_pts}^3 nodes spanning ±{:.2} a₀, spacing {:.4}",
            grid.half_extent,
            grid.spacing,
        );
        Ok(grid)
    }

    /// Position of node `(0, 0, 0)`.
    #[must_use]
    pub fn origin(&self) -> DVec3 {
        self.origin
    }

    /// Distance between adjacent nodes (identical on every axis).
    #[must_use]
    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Half the edge length of the cube.
    #[must_use]
    pub fn half_extent(&self) -> f64 {
        self.half_extent
    }

    /// Lowest and highest node positions.
    #[must_use]
    pub fn bounds(&self) -> (DVec3, DVec3) {
        let span = self.spacing * f64::from(self.num_pts - 1);
        (self.origin, self.origin + DVec3::splat(span))
    }

    /// Index of the node at the origin along every axis.
    #[must_use]
    pub fn center_index(&self) -> u32 {
        self.num_pts / 2
    }

    /// Number of nodes along each axis.
    #[must_use]
    pub fn num_pts(&self) -> u32 {
        self.num_pts
    }

    /// Node counts as a vector.
    #[must_use]
    pub fn dims(&self) -> UVec3 {
        UVec3::splat(self.num_pts)
    }

    /// Total number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        (self.num_pts as usize).pow(3)
    }

    /// Always false; a grid has at least 8 nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Volume associated with one node.
    #[must_use]
    pub fn cell_volume(&self) -> f64 {
        self.spacing.powi(3)
    }

    /// Flattens a 3D node index to a linear index.
    #[must_use]
    pub fn index(&self, i: u32, j: u32, k: u32) -> usize {
        let n = self.num_pts as usize;
        i as usize + n * (j as usize + n * k as usize)
    }

    /// Unflattens a linear node index.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn unflatten(&self, idx: usize) -> UVec3 {
        let n = self.num_pts as usize;
        UVec3::new((idx % n) as u32, ((idx / n) % n) as u32, (idx / (n * n)) as u32)
    }

    /// World position of node `(i, j, k)`.
    #[must_use]
    pub fn position(&self, i: u32, j: u32, k: u32) -> DVec3 {
        self.origin + DVec3::new(f64::from(i), f64::from(j), f64::from(k)) * self.spacing
    }

    /// Maps a point in grid-index space (fractional node coordinates) to world space.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn index_to_world(&self, p: Vec3) -> Vec3 {
        (self.origin + p.as_dvec3() * self.spacing).as_vec3()
    }

    /// World coordinate of the `i`-th node along any axis.
    #[must_use]
    pub fn axis_coordinate(&self, i: u32) -> f64 {
        self.origin.x + f64::from(i) * self.spacing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_geometry() {
        let grid = SampleGrid::new(10.0, 11).unwrap();
        assert_eq!(grid.len(), 1331);
        assert!((grid.spacing() - 2.0).abs() < 1e-12);
        assert_eq!(grid.position(0, 0, 0), DVec3::splat(-10.0));
        assert_eq!(grid.position(10, 10, 10), DVec3::splat(10.0));
        assert_eq!(grid.position(5, 5, 5), DVec3::ZERO);
        assert!((grid.cell_volume() - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_even_grid_contains_origin() {
        let grid = SampleGrid::new(9.0, 10).unwrap();
        let c = grid.center_index();
        assert_eq!(c, 5);
        assert!(grid.position(c, c, c).length() < 1e-12);
        let (lo, hi) = grid.bounds();
        assert!((hi.x - lo.x - 18.0).abs() < 1e-12);
        assert!((lo.x + 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_index_roundtrip() {
        let grid = SampleGrid::new(1.0, 7).unwrap();
        let idx = grid.index(3, 1, 6);
        assert_eq!(idx, 3 + 7 + 6 * 49);
        assert_eq!(grid.unflatten(idx), UVec3::new(3, 1, 6));
    }

    #[test]
    fn test_rejects_degenerate_grids() {
        assert!(matches!(
            SampleGrid::new(1.0, 1),
            Err(AtomViewError::InvalidGrid { num_pts: 1 })
        ));
        assert!(SampleGrid::new(0.0, 10).is_err());
        assert!(SampleGrid::new(f64::NAN, 10).is_err());
    }

    #[test]
    fn test_extent_scales_with_n_squared() {
        let options = BuildOptions::default();
        let small = SampleGrid::for_state(&QuantumState::new(1, 0, 0).unwrap(), 20, &options).unwrap();
        let large = SampleGrid::for_state(&QuantumState::new(4, 0, 0).unwrap(), 20, &options).unwrap();
        let expected = options.extent_scale * 16.0 + options.extent_padding;
        assert!((large.half_extent() - expected).abs() < 1e-9);
        assert!(large.half_extent() > 5.0 * small.half_extent());
    }

    #[test]
    fn test_index_to_world() {
        let grid = SampleGrid::new(4.0, 5).unwrap();
        let p = grid.index_to_world(Vec3::new(2.0, 0.5, 4.0));
        assert!((p - Vec3::new(0.0, -3.0, 4.0)).length() < 1e-6);
    }
}
