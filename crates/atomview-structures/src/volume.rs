//! Dense RGBA volumes for direct volume rendering.

use atomview_core::{
    AtomViewError, Basis, BuildOptions, FieldSample, QuantumState, Result, Rgba8, SampleGrid,
    WavefunctionField,
};
use glam::{DVec3, UVec3};
use rayon::prelude::*;

/// Densities below this are treated as zero when normalizing, so a field that
/// underflows everywhere maps to transparent instead of dividing by zero.
pub const MIN_NORMALIZATION_DENSITY: f64 = 1e-30;

/// One RGBA voxel per grid node, x fastest then y then z.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeBuffer {
    state: QuantumState,
    basis: Basis,
    grid: SampleGrid,
    max_opacity: f32,
    max_density: f64,
    voxels: Vec<Rgba8>,
}

impl VolumeBuffer {
    /// The orbital this volume depicts.
    #[must_use]
    pub fn state(&self) -> QuantumState {
        self.state
    }

    /// The basis used for coloring.
    #[must_use]
    pub fn basis(&self) -> Basis {
        self.basis
    }

    /// The lattice the voxels sit on.
    #[must_use]
    pub fn grid(&self) -> &SampleGrid {
        &self.grid
    }

    /// Voxel counts per axis.
    #[must_use]
    pub fn dims(&self) -> UVec3 {
        self.grid.dims()
    }

    /// World-space corners of the volume, in Bohr radii.
    #[must_use]
    pub fn bounds(&self) -> (DVec3, DVec3) {
        self.grid.bounds()
    }

    /// The opacity cap the volume was built with.
    #[must_use]
    pub fn max_opacity(&self) -> f32 {
        self.max_opacity
    }

    /// Largest density sampled on the grid.
    #[must_use]
    pub fn max_density(&self) -> f64 {
        self.max_density
    }

    /// Voxels in grid order.
    #[must_use]
    pub fn voxels(&self) -> &[Rgba8] {
        &self.voxels
    }

    /// Voxels as raw RGBA bytes, ready for a 3D texture upload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.voxels)
    }

    /// Voxel at node `(i, j, k)`.
    #[must_use]
    pub fn get(&self, i: u32, j: u32, k: u32) -> Rgba8 {
        self.voxels[self.grid.index(i, j, k)]
    }

    /// Opacity of the voxel at flat index `idx`, in `[0, 1]`.
    #[must_use]
    pub fn opacity(&self, idx: usize) -> f32 {
        self.voxels[idx].alpha()
    }

    /// Number of voxels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    /// Returns true if the buffer holds no voxels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }
}

/// Builds [`VolumeBuffer`]s.
#[derive(Debug, Clone, Default)]
pub struct VolumeFieldBuilder {
    options: BuildOptions,
}

impl VolumeFieldBuilder {
    /// Creates a builder after validating `options`.
    pub fn new(options: BuildOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    /// The options in use.
    #[must_use]
    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Samples `state` and packs it into RGBA voxels.
    ///
    /// Opacity is `max_opacity` times the opacity curve of the density relative
    /// to the sampled maximum. Color comes from the amplitude, dimmed by `|ψ|`
    /// relative to its maximum.
    pub fn build(
        &self,
        state: QuantumState,
        num_pts: u32,
        basis: Basis,
        max_opacity: f32,
    ) -> Result<VolumeBuffer> {
        if !(max_opacity.is_finite() && (0.0..=1.0).contains(&max_opacity)) {
            return Err(AtomViewError::InvalidOpacity(max_opacity));
        }

        let grid = SampleGrid::for_state(&state, num_pts, &self.options)?;
        let sampled = WavefunctionField::new(state, basis)?.evaluate_grid(&grid, self.options.parallel)?;
        let max_density = sampled.max_density();
        let scale = max_density.max(MIN_NORMALIZATION_DENSITY);

        let curve = self.options.opacity_curve;
        let colors = self.options.colors;
        let cap = 255.0 * f64::from(max_opacity);
        let voxel = |sample: &FieldSample| {
            let t = sample.density / scale;
            let alpha = (cap * curve.apply(t)).floor().clamp(0.0, 255.0) as u8;
            colors
                .color(&sample.amplitude, t.sqrt() as f32)
                .with_alpha(alpha)
        };
        let voxels: Vec<Rgba8> = if self.options.parallel {
            sampled.samples().par_iter().map(voxel).collect()
        } else {
            sampled.samples().iter().map(voxel).collect()
        };

        let opaque = voxels.iter().filter(|v| v.a > 0).count();
        log::debug!(
            "{state} {basis:?}: volume {} voxels, max density {max_density:e}, {opaque} non-transparent at cap {max_opacity}",
            voxels.len(),
        );

        Ok(VolumeBuffer {
            state,
            basis,
            grid,
            max_opacity,
            max_density,
            voxels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atomview_core::OpacityCurve;
    use proptest::prelude::*;

    fn state(n: u32, l: u32, m: i32) -> QuantumState {
        QuantumState::new(n, l, m).unwrap()
    }

    fn builder() -> VolumeFieldBuilder {
        VolumeFieldBuilder::new(BuildOptions::default()).unwrap()
    }

    #[test]
    fn test_layout_and_bytes() {
        let volume = builder().build(state(2, 1, 1), 12, Basis::Real, 0.8).unwrap();
        assert_eq!(volume.dims(), UVec3::splat(12));
        assert_eq!(volume.len(), 12 * 12 * 12);
        assert_eq!(volume.as_bytes().len(), 4 * volume.len());
        let idx = volume.grid().index(3, 4, 5);
        assert_eq!(volume.get(3, 4, 5), volume.voxels()[idx]);
        assert_eq!(volume.as_bytes()[4 * idx + 3], volume.voxels()[idx].a);
    }

    #[test]
    fn test_opacity_capped() {
        for max_opacity in [0.0, 0.3, 1.0] {
            let volume = builder().build(state(3, 1, 0), 20, Basis::Complex, max_opacity).unwrap();
            for idx in 0..volume.len() {
                assert!(volume.opacity(idx) <= max_opacity + 1e-6);
            }
        }
        // The brightest voxel reaches the cap (to within quantization).
        let volume = builder().build(state(1, 0, 0), 21, Basis::Real, 1.0).unwrap();
        assert_eq!(volume.voxels().iter().map(|v| v.a).max(), Some(255));
    }

    #[test]
    fn test_zero_opacity_is_transparent() {
        let volume = builder().build(state(2, 0, 0), 15, Basis::Real, 0.0).unwrap();
        assert!(volume.voxels().iter().all(|v| v.a == 0));
    }

    #[test]
    fn test_rejects_bad_opacity() {
        for bad in [-0.1, 1.5, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                builder().build(state(1, 0, 0), 10, Basis::Real, bad),
                Err(AtomViewError::InvalidOpacity(_))
            ));
        }
    }

    #[test]
    fn test_underflowing_field_has_no_nan() {
        // Far enough out that every node except the nucleus underflows.
        let options = BuildOptions {
            extent_padding: 1e5,
            ..BuildOptions::default()
        };
        let volume = VolumeFieldBuilder::new(options)
            .unwrap()
            .build(state(2, 1, 0), 8, Basis::Real, 1.0)
            .unwrap();
        assert_eq!(volume.max_density(), 0.0);
        assert!(volume.voxels().iter().all(|v| *v == Rgba8::TRANSPARENT));
    }

    #[test]
    fn test_gamma_curve_lifts_tails() {
        let linear = builder().build(state(2, 1, 0), 16, Basis::Real, 1.0).unwrap();
        let lifted = VolumeFieldBuilder::new(BuildOptions {
            opacity_curve: OpacityCurve::Gamma(0.5),
            ..BuildOptions::default()
        })
        .unwrap()
        .build(state(2, 1, 0), 16, Basis::Real, 1.0)
        .unwrap();
        for (a, b) in linear.voxels().iter().zip(lifted.voxels()) {
            assert!(b.a >= a.a);
        }
    }

    #[test]
    fn test_deterministic_and_partition_independent() {
        let a = builder().build(state(3, 2, -2), 18, Basis::Complex, 0.7).unwrap();
        let b = builder().build(state(3, 2, -2), 18, Basis::Complex, 0.7).unwrap();
        assert_eq!(a, b);
        let serial = VolumeFieldBuilder::new(BuildOptions {
            parallel: false,
            ..BuildOptions::default()
        })
        .unwrap()
        .build(state(3, 2, -2), 18, Basis::Complex, 0.7)
        .unwrap();
        assert_eq!(a, serial);
    }

    #[test]
    fn test_real_voxels_use_lobe_colors() {
        let volume = builder().build(state(2, 1, 0), 21, Basis::Real, 1.0).unwrap();
        let grid = volume.grid();
        let c = grid.center_index();
        // Nodes on the +z and -z axis at the same distance differ only in sign.
        let up = volume.get(c, c, c + 3);
        let down = volume.get(c, c, c - 3);
        assert!(up.a.abs_diff(down.a) <= 1);
        assert!(up.r > up.b, "positive lobe color {up:?}");
        assert!(down.b > down.r, "negative lobe color {down:?}");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_doubling_opacity_never_decreases(
            n in 1u32..4,
            opacity in 0.0f32..0.5,
        ) {
            let s = state(n, n - 1, 0);
            let low = builder().build(s, 10, Basis::Real, opacity).unwrap();
            let high = builder().build(s, 10, Basis::Real, 2.0 * opacity).unwrap();
            for (a, b) in low.voxels().iter().zip(high.voxels()) {
                prop_assert!(b.a >= a.a);
            }
        }
    }
}
