//! Cutting a contour open along a clip plane.
//!
//! Surface triangles are clipped against the plane (Sutherland-Hodgman on each
//! triangle, with cut vertices shared along edges). Each clipped triangle
//! contributes one rim segment between its two cut vertices; the cap closing
//! the cut is built from those rim loops and shares their vertices, so a capped
//! lobe stays one connected piece.

use std::collections::HashMap;

use atomview_core::{BuildOptions, ClipPlane, Rgba8, SampleGrid, WavefunctionField};
use glam::Vec3;

use super::{cap, outward_normal, ContourMesh};

/// Mesh arrays being assembled.
#[derive(Default)]
struct MeshParts {
    vertices: Vec<Vec3>,
    normals: Vec<Vec3>,
    colors: Vec<Rgba8>,
    triangles: Vec<[u32; 3]>,
}

impl MeshParts {
    #[allow(clippy::cast_possible_truncation)]
    fn push_vertex(&mut self, position: Vec3, normal: Vec3, color: Rgba8) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(position);
        self.normals.push(normal);
        self.colors.push(color);
        index
    }

    /// Fan-triangulates a polygon given in winding order.
    fn push_polygon(&mut self, polygon: &[u32]) {
        for k in 1..polygon.len().saturating_sub(1) {
            self.triangles.push([polygon[0], polygon[k], polygon[k + 1]]);
        }
    }
}

/// Removes the part of `mesh` in front of `plane`, optionally capping the cut.
pub(super) fn clip_mesh(
    mesh: &ContourMesh,
    plane: &ClipPlane,
    field: &WavefunctionField,
    grid: &SampleGrid,
    options: &BuildOptions,
    add_cap: bool,
) -> ContourMesh {
    let Some((bb_min, bb_max)) = mesh.bounding_box() else {
        return mesh.clone();
    };
    let step = 0.25 * grid.spacing();
    let kept: Vec<bool> = mesh.vertices.iter().map(|&v| plane.is_kept(v)).collect();

    let mut parts = MeshParts::default();
    let mut remap: Vec<Option<u32>> = vec![None; mesh.vertices.len()];
    let mut cut_vertices: HashMap<(u32, u32), u32> = HashMap::new();

    let mut keep = |parts: &mut MeshParts, i: u32| -> u32 {
        let i = i as usize;
        *remap[i].get_or_insert_with(|| {
            parts.push_vertex(mesh.vertices[i], mesh.normals[i], mesh.colors[i])
        })
    };

    // Cut vertices lie on the isosurface as well, so they also take full intensity.
    let mut cut = |parts: &mut MeshParts, a: u32, b: u32| -> u32 {
        let key = (a.min(b), a.max(b));
        if let Some(&index) = cut_vertices.get(&key) {
            return index;
        }
        let (pa, pb) = (mesh.vertices[key.0 as usize], mesh.vertices[key.1 as usize]);
        let t = plane.crossing(pa, pb).unwrap_or(0.5);
        let position = pa.lerp(pb, t).clamp(bb_min, bb_max);
        let fallback = mesh.normals[key.0 as usize]
            .lerp(mesh.normals[key.1 as usize], t)
            .normalize_or_zero();
        let normal = outward_normal(field, position, step).unwrap_or(fallback);
        let color = options
            .colors
            .color(&field.amplitude(position.as_dvec3()), 1.0);
        let index = parts.push_vertex(position, normal, color);
        cut_vertices.insert(key, index);
        index
    };

    let mut polygon = Vec::with_capacity(4);
    let mut rim: Vec<(u32, u32)> = Vec::new();
    for tri in mesh.surface_triangles() {
        let inside = tri.map(|i| kept[i as usize]);
        if inside.iter().all(|&k| !k) {
            continue;
        }
        polygon.clear();
        let mut crossings = Vec::with_capacity(2);
        for e in 0..3 {
            let (a, b) = (tri[e], tri[(e + 1) % 3]);
            if inside[e] {
                polygon.push(keep(&mut parts, a));
            }
            if inside[e] != inside[(e + 1) % 3] {
                let index = cut(&mut parts, a, b);
                crossings.push(index);
                polygon.push(index);
            }
        }
        if let [a, b] = crossings[..] {
            rim.push((a, b));
        }
        parts.push_polygon(&polygon);
    }

    let cap_start = parts.triangles.len();
    if add_cap {
        let loops = cap::rim_loops(&rim);
        let tolerance = 1e-5 * grid.spacing();
        let cap_triangles = cap::triangulate(&loops, &parts.vertices, plane, tolerance);
        log::debug!(
            "cap: {} rim segments in {} loops, {} triangles",
            rim.len(),
            loops.len(),
            cap_triangles.len(),
        );
        parts.triangles.extend(cap_triangles);
    }

    ContourMesh {
        state: mesh.state,
        basis: mesh.basis,
        isovalue: mesh.isovalue,
        max_density: mesh.max_density,
        vertices: parts.vertices,
        normals: parts.normals,
        colors: parts.colors,
        triangles: parts.triangles,
        cap_start,
    }
}
