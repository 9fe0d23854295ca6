//! Probability contour meshes.
//!
//! A contour is the isosurface of `|ψ|²` at the density that encloses a fixed
//! share of the sampled probability (see [`IsoLevel`]). Vertices are colored from
//! the amplitude at their own position, so lobes of opposite sign (or phase)
//! come out in different colors. Every vertex, including those of a cutout's
//! cap, lies on the isosurface where `|ψ|` is fixed, so all are colored at full
//! intensity; only the volume builder scales brightness with `|ψ|`.

mod cap;
mod cut;

use atomview_core::{
    marching_cubes, Basis, BuildOptions, ClipPlane, IsoLevel, QuantumState, Rgba8, SampleGrid,
    SampledField, WavefunctionField,
};
use atomview_core::{AtomViewError, Result};
use glam::{DVec3, Vec3};
use rayon::prelude::*;

/// A colored triangle mesh of one orbital's probability contour.
///
/// Surface triangles come first; when the mesh was clipped with capping
/// enabled, the triangles from [`ContourMesh::cap_start`] on close the cut.
#[derive(Debug, Clone, PartialEq)]
pub struct ContourMesh {
    state: QuantumState,
    basis: Basis,
    isovalue: f32,
    max_density: f32,
    vertices: Vec<Vec3>,
    normals: Vec<Vec3>,
    colors: Vec<Rgba8>,
    triangles: Vec<[u32; 3]>,
    cap_start: usize,
}

impl ContourMesh {
    fn empty(state: QuantumState, basis: Basis, isovalue: f32, max_density: f32) -> Self {
        Self {
            state,
            basis,
            isovalue,
            max_density,
            vertices: Vec::new(),
            normals: Vec::new(),
            colors: Vec::new(),
            triangles: Vec::new(),
            cap_start: 0,
        }
    }

    /// The orbital this mesh depicts.
    #[must_use]
    pub fn state(&self) -> QuantumState {
        self.state
    }

    /// The basis used for coloring.
    #[must_use]
    pub fn basis(&self) -> Basis {
        self.basis
    }

    /// Density at which the surface was extracted.
    #[must_use]
    pub fn isovalue(&self) -> f32 {
        self.isovalue
    }

    /// Largest density sampled on the grid.
    #[must_use]
    pub fn max_density(&self) -> f32 {
        self.max_density
    }

    /// Vertex positions in Bohr radii.
    #[must_use]
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Unit outward normals, one per vertex.
    #[must_use]
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// RGBA colors, one per vertex.
    #[must_use]
    pub fn colors(&self) -> &[Rgba8] {
        &self.colors
    }

    /// Colors as raw bytes for GPU upload.
    #[must_use]
    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }

    /// All triangles, surface then cap.
    #[must_use]
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Index of the first cap triangle (equals the triangle count when uncapped).
    #[must_use]
    pub fn cap_start(&self) -> usize {
        self.cap_start
    }

    /// Triangles of the isosurface itself.
    #[must_use]
    pub fn surface_triangles(&self) -> &[[u32; 3]] {
        &self.triangles[..self.cap_start]
    }

    /// Triangles closing a cutout.
    #[must_use]
    pub fn cap_triangles(&self) -> &[[u32; 3]] {
        &self.triangles[self.cap_start..]
    }

    /// Number of vertices.
    #[must_use]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    #[must_use]
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Returns true if there is nothing to draw.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Turns an empty mesh into [`AtomViewError::EmptyContour`].
    pub fn into_nonempty(self) -> Result<Self> {
        if self.is_empty() {
            return Err(AtomViewError::EmptyContour {
                isovalue: self.isovalue,
                max_density: self.max_density,
            });
        }
        Ok(self)
    }

    /// Axis-aligned bounding box of all vertices.
    #[must_use]
    pub fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        if self.vertices.is_empty() {
            return None;
        }
        Some(self.vertices.iter().fold(
            (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
            |(lo, hi), &v| (lo.min(v), hi.max(v)),
        ))
    }

    /// Groups triangles into connected components (triangles sharing a vertex).
    ///
    /// Each component lists its triangle indices in ascending order; components
    /// are ordered by their first triangle.
    #[must_use]
    pub fn connected_components(&self) -> Vec<Vec<usize>> {
        fn find(parent: &mut [u32], mut x: u32) -> u32 {
            while parent[x as usize] != x {
                parent[x as usize] = parent[parent[x as usize] as usize];
                x = parent[x as usize];
            }
            x
        }

        #[allow(clippy::cast_possible_truncation)]
        let mut parent: Vec<u32> = (0..self.vertices.len() as u32).collect();

        for &[a, b, c] in &self.triangles {
            let ra = find(&mut parent, a);
            for other in [b, c] {
                let ro = find(&mut parent, other);
                if ro != ra {
                    parent[ro as usize] = ra;
                }
            }
        }

        let mut component_of_root: Vec<Option<usize>> = vec![None; self.vertices.len()];
        let mut components: Vec<Vec<usize>> = Vec::new();
        for (t, tri) in self.triangles.iter().enumerate() {
            let root = find(&mut parent, tri[0]) as usize;
            let slot = *component_of_root[root].get_or_insert_with(|| {
                components.push(Vec::new());
                components.len() - 1
            });
            components[slot].push(t);
        }
        components
    }

    /// Mean position of the vertices of the given triangles.
    #[must_use]
    pub fn centroid(&self, triangles: &[usize]) -> Vec3 {
        if triangles.is_empty() {
            return Vec3::ZERO;
        }
        let sum: Vec3 = triangles
            .iter()
            .flat_map(|&t| self.triangles[t])
            .map(|i| self.vertices[i as usize])
            .sum();
        sum / (3 * triangles.len()) as f32
    }
}

/// Builds [`ContourMesh`]es.
#[derive(Debug, Clone, Default)]
pub struct ContourMeshBuilder {
    options: BuildOptions,
}

impl ContourMeshBuilder {
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

    /// Builds the probability contour of `state`, optionally cut open.
    ///
    /// A field without a usable crossing (all zero, constant, or an isovalue
    /// above its maximum) yields an empty mesh rather than an error.
    pub fn build(
        &self,
        state: QuantumState,
        num_pts: u32,
        basis: Basis,
        clip: bool,
    ) -> Result<ContourMesh> {
        let grid = SampleGrid::for_state(&state, num_pts, &self.options)?;
        let field = WavefunctionField::new(state, basis)?;
        let sampled = field.evaluate_grid(&grid, self.options.parallel)?;

        let max_density = sampled.max_density();
        #[allow(clippy::cast_possible_truncation)]
        let max_density_f32 = max_density as f32;

        let Some(isovalue) = choose_isovalue(&sampled, self.options.iso_level) else {
            log::warn!("{state}: degenerate density field (max {max_density:e}), no contour");
            return Ok(ContourMesh::empty(state, basis, 0.0, max_density_f32));
        };
        if f64::from(isovalue) >= max_density {
            log::debug!("{state}: isovalue {isovalue:e} at or above max density {max_density:e}");
            return Ok(ContourMesh::empty(state, basis, isovalue, max_density_f32));
        }

        let (densities, dims) = sampled.padded_densities_f32();
        let iso = marching_cubes(&densities, isovalue, dims);
        let vertices: Vec<Vec3> = iso
            .vertices
            .iter()
            .map(|&v| grid.index_to_world(v - Vec3::ONE))
            .collect();

        let step = 0.25 * grid.spacing();
        // |ψ| is the same everywhere on the isosurface, so every vertex gets full intensity.
        let shade = |(&position, &fallback): (&Vec3, &Vec3)| {
            let normal = outward_normal(&field, position, step).unwrap_or(fallback);
            let color = self.options.colors.color(&field.amplitude(position.as_dvec3()), 1.0);
            (normal, color)
        };
        let shaded: Vec<(Vec3, Rgba8)> = if self.options.parallel {
            vertices.par_iter().zip(iso.normals.par_iter()).map(shade).collect()
        } else {
            vertices.iter().zip(iso.normals.iter()).map(shade).collect()
        };
        let (normals, colors): (Vec<Vec3>, Vec<Rgba8>) = shaded.into_iter().unzip();

        let mut triangles = iso.triangles;
        orient_triangles(&vertices, &normals, &mut triangles);

        let cap_start = triangles.len();
        let mut mesh = ContourMesh {
            state,
            basis,
            isovalue,
            max_density: max_density_f32,
            vertices,
            normals,
            colors,
            triangles,
            cap_start,
        };

        if clip && !mesh.is_empty() {
            let plane = ClipPlane::through_origin(self.options.clip_normal);
            mesh = cut::clip_mesh(
                &mesh,
                &plane,
                &field,
                &grid,
                &self.options,
                self.options.cap_clipped,
            );
        }

        if mesh.vertices.iter().any(|v| !v.is_finite()) {
            return Err(AtomViewError::NumericInstability {
                context: "contour extraction",
                detail: format!("non-finite vertex in contour of {state}"),
            });
        }

        log::debug!(
            "{state} {basis:?}: contour at {isovalue:e} (max {max_density:e}), {} vertices, {} triangles ({} cap){}",
            mesh.num_vertices(),
            mesh.num_triangles(),
            mesh.cap_triangles().len(),
            if clip { ", clipped" } else { "" },
        );
        Ok(mesh)
    }
}

/// Picks the contour isovalue, or `None` if the field has no contrast.
///
/// For [`IsoLevel::EnclosedProbability`] the nodes are ranked by density and
/// accumulated until they hold the requested share of the sampled total; the
/// isovalue sits halfway between the last node taken and the next one, so the
/// taken nodes are exactly those above it.
#[must_use]
pub fn choose_isovalue(sampled: &SampledField, level: IsoLevel) -> Option<f32> {
    let max = sampled.max_density();
    if !(max > 0.0) || max <= sampled.min_density() {
        return None;
    }
    let iso = match level {
        IsoLevel::Fixed(value) => f64::from(value),
        IsoLevel::EnclosedProbability(fraction) => {
            let mut densities: Vec<f64> = sampled.samples().iter().map(|s| s.density).collect();
            densities.sort_unstable_by(|a, b| b.total_cmp(a));
            let total: f64 = densities.iter().sum();
            let target = fraction * total;

            let mut acc = 0.0;
            let mut last = densities.len() - 1;
            for (i, &d) in densities.iter().enumerate() {
                acc += d;
                if acc >= target {
                    last = i;
                    break;
                }
            }
            while last + 1 < densities.len() && densities[last + 1] == densities[last] {
                last += 1;
            }
            let next = densities.get(last + 1).copied().unwrap_or(0.0);
            0.5 * (densities[last] + next)
        }
    };
    #[allow(clippy::cast_possible_truncation)]
    let iso = iso as f32;
    (iso.is_finite() && iso > 0.0).then_some(iso)
}

/// Outward surface normal at `p`: the direction of steepest density descent.
fn outward_normal(field: &WavefunctionField, p: Vec3, step: f64) -> Option<Vec3> {
    let p = p.as_dvec3();
    let diff = |axis: DVec3| field.density(p + axis * step) - field.density(p - axis * step);
    let gradient = DVec3::new(diff(DVec3::X), diff(DVec3::Y), diff(DVec3::Z));
    let normal = (-gradient).normalize_or_zero().as_vec3();
    (normal != Vec3::ZERO && normal.is_finite()).then_some(normal)
}

/// Flips triangles whose winding disagrees with their vertex normals.
fn orient_triangles(vertices: &[Vec3], normals: &[Vec3], triangles: &mut [[u32; 3]]) {
    for tri in triangles {
        let [a, b, c] = tri.map(|i| vertices[i as usize]);
        let face = (b - a).cross(c - a);
        let shading: Vec3 = tri.iter().map(|&i| normals[i as usize]).sum();
        if face.dot(shading) < 0.0 {
            tri.swap(1, 2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(n: u32, l: u32, m: i32) -> QuantumState {
        QuantumState::new(n, l, m).unwrap()
    }

    fn builder() -> ContourMeshBuilder {
        ContourMeshBuilder::new(BuildOptions::default()).unwrap()
    }

    #[test]
    fn test_1s_single_sphere() {
        let mesh = builder().build(state(1, 0, 0), 40, Basis::Real, false).unwrap();
        assert!(!mesh.is_empty());
        assert_eq!(mesh.connected_components().len(), 1);
        assert_eq!(mesh.vertices().len(), mesh.normals().len());
        assert_eq!(mesh.vertices().len(), mesh.colors().len());

        // Roughly spherical about the nucleus.
        let radii: Vec<f32> = mesh.vertices().iter().map(|v| v.length()).collect();
        let mean = radii.iter().sum::<f32>() / radii.len() as f32;
        assert!(radii.iter().all(|r| (r - mean).abs() < 0.1 * mean));

        // Normals point away from the nucleus.
        for (v, n) in mesh.vertices().iter().zip(mesh.normals()) {
            assert!(v.normalize().dot(*n) > 0.9);
        }
    }

    #[test]
    fn test_enclosed_probability_isovalue() {
        let s = state(1, 0, 0);
        let options = BuildOptions::default();
        let grid = SampleGrid::for_state(&s, 50, &options).unwrap();
        let sampled = WavefunctionField::new(s, Basis::Complex)
            .unwrap()
            .evaluate_grid(&grid, false)
            .unwrap();
        let iso = f64::from(choose_isovalue(&sampled, IsoLevel::EnclosedProbability(0.9)).unwrap());

        let above: f64 = sampled
            .samples()
            .iter()
            .map(|s| s.density)
            .filter(|&d| d > iso)
            .sum();
        let total: f64 = sampled.samples().iter().map(|s| s.density).sum();
        let share = above / total;
        assert!((0.9..0.92).contains(&share), "enclosed share {share}");
    }

    #[test]
    fn test_isovalue_degenerate_fields() {
        let s = state(1, 0, 0);
        let grid = SampleGrid::new(1e6, 3).unwrap();
        let sampled = WavefunctionField::new(s, Basis::Complex)
            .unwrap()
            .evaluate_grid(&grid, false)
            .unwrap();
        // Every node but the nucleus underflows to zero; the nucleus alone has contrast.
        assert!(choose_isovalue(&sampled, IsoLevel::EnclosedProbability(0.5)).is_some());

        // A p orbital vanishes at the nucleus, so nothing on this grid survives.
        let flat = WavefunctionField::new(state(2, 1, 0), Basis::Complex)
            .unwrap()
            .evaluate_grid(&grid, false)
            .unwrap();
        assert_eq!(flat.max_density(), 0.0);
        assert!(choose_isovalue(&flat, IsoLevel::EnclosedProbability(0.5)).is_none());
    }

    #[test]
    fn test_forced_isovalue_above_max_is_empty() {
        let options = BuildOptions::default().with_iso_level(IsoLevel::Fixed(1.0e3));
        let mesh = ContourMeshBuilder::new(options)
            .unwrap()
            .build(state(1, 0, 0), 30, Basis::Complex, false)
            .unwrap();
        assert!(mesh.is_empty());
        assert_eq!(mesh.num_vertices(), 0);
        assert!(matches!(
            mesh.into_nonempty(),
            Err(AtomViewError::EmptyContour { .. })
        ));
    }

    #[test]
    fn test_2pz_two_lobes_of_opposite_sign() {
        let mesh = builder().build(state(2, 1, 0), 50, Basis::Real, false).unwrap();
        let components = mesh.connected_components();
        assert_eq!(components.len(), 2);

        let policy = BuildOptions::default().colors;
        let positive = Rgba8::from_rgb(policy.positive, 1.0);
        let negative = Rgba8::from_rgb(policy.negative, 1.0);
        for component in &components {
            let centroid = mesh.centroid(component);
            assert!(centroid.z.abs() > 2.0, "lobe centroid {centroid}");
            assert!(centroid.x.abs() < 0.5 && centroid.y.abs() < 0.5);
            let expected = if centroid.z > 0.0 { positive } else { negative };
            for &t in component {
                for i in mesh.triangles()[t] {
                    assert_eq!(mesh.colors()[i as usize], expected);
                }
            }
        }
    }

    #[test]
    fn test_clip_removes_half() {
        let b = builder();
        let full = b.build(state(1, 0, 0), 40, Basis::Complex, false).unwrap();
        let cut = b.build(state(1, 0, 0), 40, Basis::Complex, true).unwrap();

        assert!(cut.surface_triangles().len() < full.num_triangles());
        assert!(!cut.cap_triangles().is_empty());
        for &[a, b, c] in cut.surface_triangles() {
            for i in [a, b, c] {
                assert!(cut.vertices()[i as usize].y <= 1e-4);
            }
        }
        // Cap faces lie in the plane and point into the removed half.
        for t in cut.cap_triangles() {
            let [a, b, c] = t.map(|i| cut.vertices()[i as usize]);
            assert!([a, b, c].iter().all(|v| v.y.abs() <= 1e-4));
            assert!((b - a).cross(c - a).dot(Vec3::Y) >= 0.0);
        }
        assert_eq!(cut.connected_components().len(), 1);

        let (lo, hi) = full.bounding_box().unwrap();
        let (clo, chi) = cut.bounding_box().unwrap();
        assert!(clo.cmpge(lo).all() && chi.cmple(hi).all());
    }

    #[test]
    fn test_capped_lobes_stay_whole() {
        let b = builder();
        for (s, lobes) in [(state(1, 0, 0), 1), (state(2, 1, 0), 2), (state(2, 1, 1), 2)] {
            let full = b.build(s, 50, Basis::Real, false).unwrap();
            let cut = b.build(s, 50, Basis::Real, true).unwrap();
            assert_eq!(full.connected_components().len(), lobes, "{s}");
            assert_eq!(cut.connected_components().len(), lobes, "{s} clipped");
            assert!(!cut.cap_triangles().is_empty(), "{s}");
        }
    }

    #[test]
    fn test_surface_closes_when_every_node_is_above_isovalue() {
        let options = BuildOptions::default().with_iso_level(IsoLevel::Fixed(1.0e-20));
        let mesh = ContourMeshBuilder::new(options)
            .unwrap()
            .build(state(1, 0, 0), 40, Basis::Real, false)
            .unwrap();
        assert!(!mesh.is_empty());
        assert_eq!(mesh.connected_components().len(), 1);

        // The surface wraps the whole grid, within one spacing of its faces.
        let grid = SampleGrid::for_state(&state(1, 0, 0), 40, &BuildOptions::default()).unwrap();
        let (lo, hi) = grid.bounds();
        let (mlo, mhi) = mesh.bounding_box().unwrap();
        let h = grid.spacing();
        let slack = DVec3::splat(1.01 * h);
        assert!(mlo.as_dvec3().cmplt(lo).all() && mlo.as_dvec3().cmpge(lo - slack).all());
        assert!(mhi.as_dvec3().cmpgt(hi).all() && mhi.as_dvec3().cmple(hi + slack).all());

        // Closed: every edge is shared by exactly two triangles.
        let mut edges = std::collections::HashMap::new();
        for t in mesh.triangles() {
            for e in 0..3 {
                let (a, b) = (t[e], t[(e + 1) % 3]);
                *edges.entry((a.min(b), a.max(b))).or_insert(0) += 1;
            }
        }
        assert!(edges.values().all(|&count| count == 2));
    }

    #[test]
    fn test_build_is_deterministic() {
        let b = builder();
        let a = b.build(state(3, 2, 1), 30, Basis::Complex, true).unwrap();
        let c = b.build(state(3, 2, 1), 30, Basis::Complex, true).unwrap();
        assert_eq!(a, c);

        let serial = ContourMeshBuilder::new(BuildOptions {
            parallel: false,
            ..BuildOptions::default()
        })
        .unwrap()
        .build(state(3, 2, 1), 30, Basis::Complex, true)
        .unwrap();
        assert_eq!(a, serial);
    }

    #[test]
    fn test_rejects_tiny_grid() {
        assert!(matches!(
            builder().build(state(1, 0, 0), 1, Basis::Real, false),
            Err(AtomViewError::InvalidGrid { num_pts: 1 })
        ));
    }
}
