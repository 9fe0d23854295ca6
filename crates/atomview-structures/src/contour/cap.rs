//! Triangulation of the cross-section a cut exposes.
//!
//! Every clipped triangle leaves one rim segment in the plane. The segments
//! chain into closed loops; loops are nested by containment into outlines with
//! holes, each hole is bridged into its outline, and the resulting simple
//! polygon is ear-clipped. Cap triangles use the rim vertices themselves.

use std::collections::{HashMap, HashSet};

use atomview_core::ClipPlane;
use glam::{DVec2, Vec3};

/// Chains undirected rim segments into closed loops of vertex indices.
///
/// Loops come out in order of their first segment. Chains that do not close,
/// or that pass through a vertex shared by more than two segments, are dropped.
pub(super) fn rim_loops(segments: &[(u32, u32)]) -> Vec<Vec<u32>> {
    let mut neighbors: HashMap<u32, Vec<u32>> = HashMap::new();
    for &(a, b) in segments {
        neighbors.entry(a).or_default().push(b);
        neighbors.entry(b).or_default().push(a);
    }

    let mut visited: HashSet<u32> = HashSet::new();
    let mut loops = Vec::new();
    let mut open = 0usize;
    for &(start, first) in segments {
        if !visited.insert(start) {
            continue;
        }
        let mut chain = vec![start];
        let (mut prev, mut cur) = (start, first);
        let closed = loop {
            if cur == start {
                break true;
            }
            if !visited.insert(cur) {
                break false;
            }
            chain.push(cur);
            let next = match neighbors.get(&cur).map(Vec::as_slice) {
                Some(&[x, y]) => {
                    if x == prev {
                        y
                    } else {
                        x
                    }
                }
                _ => break false,
            };
            (prev, cur) = (cur, next);
        };
        let degree_two = neighbors.get(&start).is_some_and(|n| n.len() == 2);
        if closed && degree_two && chain.len() >= 3 {
            loops.push(chain);
        } else {
            open += 1;
        }
    }
    if open > 0 {
        log::debug!("cap: skipped {open} rim chain(s) that do not close");
    }
    loops
}

/// Triangulates the region enclosed by `loops` in `plane`.
///
/// Triangles wind counter-clockwise in the plane's tangent frame, so their
/// faces point along the plane normal. `tolerance` is the distance below which
/// rim points count as coincident or collinear.
pub(super) fn triangulate(
    loops: &[Vec<u32>],
    vertices: &[Vec3],
    plane: &ClipPlane,
    tolerance: f64,
) -> Vec<[u32; 3]> {
    let (u, v) = plane.tangent_frame();
    let (u, v, origin) = (u.as_dvec3(), v.as_dvec3(), plane.origin().as_dvec3());
    let project = |i: u32| {
        let d = vertices[i as usize].as_dvec3() - origin;
        DVec2::new(d.dot(u), d.dot(v))
    };

    let outlines: Vec<Outline> = loops
        .iter()
        .map(|indices| Outline::new(indices, indices.iter().map(|&i| project(i)).collect()))
        .filter(|outline| outline.area.abs() > tolerance * tolerance)
        .collect();

    let mut triangles = Vec::new();
    for (outer, holes) in nest(&outlines) {
        let mut rings = Rings::new(tolerance);
        let Some(mut start) = rings.push(&outlines[outer], true) else {
            continue;
        };
        let mut hole_starts = Vec::with_capacity(holes.len());
        for &h in &holes {
            if let Some(ring) = rings.push(&outlines[h], false) {
                hole_starts.push(rings.leftmost(ring));
            }
        }
        hole_starts.sort_by(|&a, &b| {
            let (pa, pb) = (rings.nodes[a].point, rings.nodes[b].point);
            pa.x.total_cmp(&pb.x).then(pa.y.total_cmp(&pb.y))
        });
        for hole in hole_starts {
            let Some(bridge) = rings.bridge(hole, start) else {
                log::debug!("cap: no bridge into a hole, leaving it open");
                continue;
            };
            rings.split(bridge, hole);
            start = bridge;
        }
        rings.clip_ears(start, &mut triangles);
    }
    triangles
}

/// One rim loop projected into the plane.
struct Outline {
    indices: Vec<u32>,
    points: Vec<DVec2>,
    /// Signed area, positive when counter-clockwise.
    area: f64,
}

impl Outline {
    fn new(indices: &[u32], points: Vec<DVec2>) -> Self {
        let area = 0.5
            * points
                .iter()
                .zip(points.iter().cycle().skip(1))
                .map(|(a, b)| a.perp_dot(*b))
                .sum::<f64>();
        Self {
            indices: indices.to_vec(),
            points,
            area,
        }
    }

    /// Even-odd containment test.
    fn contains(&self, p: DVec2) -> bool {
        let mut inside = false;
        let n = self.points.len();
        for i in 0..n {
            let (a, b) = (self.points[i], self.points[(i + 1) % n]);
            if (a.y > p.y) != (b.y > p.y) && p.x < a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x) {
                inside = !inside;
            }
        }
        inside
    }
}

/// Groups outlines into `(outer, holes)` by nesting depth.
///
/// An outline inside an even number of others bounds material; one inside an
/// odd number is a hole of the smallest outline around it.
fn nest(outlines: &[Outline]) -> Vec<(usize, Vec<usize>)> {
    let mut order: Vec<usize> = (0..outlines.len()).collect();
    order.sort_by(|&a, &b| outlines[b].area.abs().total_cmp(&outlines[a].area.abs()));

    let mut groups: Vec<(usize, Vec<usize>)> = Vec::new();
    let mut group_of: HashMap<usize, usize> = HashMap::new();
    for (rank, &i) in order.iter().enumerate() {
        let first = outlines[i].points[0];
        let enclosing: Vec<usize> = order[..rank]
            .iter()
            .copied()
            .filter(|&j| outlines[j].contains(first))
            .collect();
        match enclosing.last() {
            Some(&parent) if enclosing.len() % 2 == 1 => {
                if let Some(&g) = group_of.get(&parent) {
                    groups[g].1.push(i);
                }
            }
            _ => {
                group_of.insert(i, groups.len());
                groups.push((i, Vec::new()));
            }
        }
    }
    groups
}

fn orient(a: DVec2, b: DVec2, c: DVec2) -> f64 {
    (b - a).perp_dot(c - a)
}

#[derive(Debug, Clone, Copy)]
struct Node {
    vertex: u32,
    point: DVec2,
    prev: usize,
    next: usize,
}

/// Doubly linked polygon rings sharing one node arena.
struct Rings {
    nodes: Vec<Node>,
    tolerance: f64,
}

impl Rings {
    fn new(tolerance: f64) -> Self {
        Self {
            nodes: Vec::new(),
            tolerance,
        }
    }

    /// Links an outline into a ring, counter-clockwise for an outer boundary and
    /// clockwise for a hole, and drops coincident and collinear points.
    fn push(&mut self, outline: &Outline, outer: bool) -> Option<usize> {
        let base = self.nodes.len();
        let n = outline.points.len();
        let reverse = (outline.area > 0.0) != outer;
        for k in 0..n {
            let k = if reverse { n - 1 - k } else { k };
            self.nodes.push(Node {
                vertex: outline.indices[k],
                point: outline.points[k],
                prev: 0,
                next: 0,
            });
        }
        for k in 0..n {
            self.nodes[base + k].prev = base + (k + n - 1) % n;
            self.nodes[base + k].next = base + (k + 1) % n;
        }
        self.filter(base)
    }

    fn ring_len(&self, start: usize) -> usize {
        let mut count = 1;
        let mut cur = self.nodes[start].next;
        while cur != start && count <= self.nodes.len() {
            count += 1;
            cur = self.nodes[cur].next;
        }
        count
    }

    fn unlink(&mut self, i: usize) {
        let Node { prev, next, .. } = self.nodes[i];
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
    }

    /// Removes points that coincide with their successor or sit on the line
    /// through their neighbours. Returns a surviving node, if three remain.
    fn filter(&mut self, start: usize) -> Option<usize> {
        let mut len = self.ring_len(start);
        let mut start = start;
        let mut cur = start;
        loop {
            if len < 3 {
                return None;
            }
            let Node { prev, next, point, .. } = self.nodes[cur];
            let (p, q) = (self.nodes[prev].point, self.nodes[next].point);
            let base = (q - p).length();
            let degenerate = point.distance(q) <= self.tolerance
                || base <= self.tolerance
                || orient(p, point, q).abs() <= self.tolerance * base;
            if degenerate {
                self.unlink(cur);
                len -= 1;
                start = prev;
                cur = prev;
                continue;
            }
            cur = next;
            if cur == start {
                return Some(start);
            }
        }
    }

    fn leftmost(&self, start: usize) -> usize {
        let mut best = start;
        let mut cur = self.nodes[start].next;
        while cur != start {
            let (a, b) = (self.nodes[cur].point, self.nodes[best].point);
            if a.x < b.x || (a.x == b.x && a.y < b.y) {
                best = cur;
            }
            cur = self.nodes[cur].next;
        }
        best
    }

    /// Whether the direction from node `m` towards `p` starts inside the polygon.
    fn locally_inside(&self, m: usize, p: DVec2) -> bool {
        let Node { prev, next, point, .. } = self.nodes[m];
        let (a, b) = (self.nodes[prev].point, self.nodes[next].point);
        if orient(a, point, b) >= 0.0 {
            orient(point, b, p) > 0.0 && orient(a, point, p) > 0.0
        } else {
            orient(point, b, p) > 0.0 || orient(a, point, p) > 0.0
        }
    }

    /// Whether segment `a-b` crosses any edge of the ring through `ring`,
    /// ignoring edges that touch either endpoint.
    fn crosses_ring(&self, a: DVec2, b: DVec2, ring: usize) -> bool {
        let mut cur = ring;
        loop {
            let next = self.nodes[cur].next;
            let (c, d) = (self.nodes[cur].point, self.nodes[next].point);
            let touches = [c, d].iter().any(|&q| q == a || q == b);
            if !touches
                && orient(a, b, c) * orient(a, b, d) < 0.0
                && orient(c, d, a) * orient(c, d, b) < 0.0
            {
                return true;
            }
            cur = next;
            if cur == ring {
                return false;
            }
        }
    }

    /// Finds the nearest outer node left of `hole` that can see it.
    fn bridge(&self, hole: usize, outer: usize) -> Option<usize> {
        let h = self.nodes[hole].point;
        let mut best: Option<(f64, usize)> = None;
        let mut cur = outer;
        loop {
            let p = self.nodes[cur].point;
            let d2 = p.distance_squared(h);
            if p.x <= h.x + self.tolerance
                && !matches!(best, Some((b, _)) if b <= d2)
                && self.locally_inside(cur, h)
                && !self.crosses_ring(p, h, outer)
                && !self.crosses_ring(p, h, hole)
            {
                best = Some((d2, cur));
            }
            cur = self.nodes[cur].next;
            if cur == outer {
                break;
            }
        }
        best.map(|(_, node)| node)
    }

    /// Joins the hole ring at `b` into the outer ring at `a` along a doubled edge.
    fn split(&mut self, a: usize, b: usize) {
        let a_next = self.nodes[a].next;
        let b_prev = self.nodes[b].prev;
        let a2 = self.nodes.len();
        let b2 = a2 + 1;
        self.nodes.push(self.nodes[a]);
        self.nodes.push(self.nodes[b]);

        self.nodes[a].next = b;
        self.nodes[b].prev = a;
        self.nodes[b_prev].next = b2;
        self.nodes[b2].prev = b_prev;
        self.nodes[b2].next = a2;
        self.nodes[a2].prev = b2;
        self.nodes[a2].next = a_next;
        self.nodes[a_next].prev = a2;
    }

    fn is_ear(&self, ear: usize) -> bool {
        let Node { prev, next, point: b, .. } = self.nodes[ear];
        let (a, c) = (self.nodes[prev].point, self.nodes[next].point);
        if orient(a, b, c) <= 0.0 {
            return false;
        }
        let mut cur = self.nodes[next].next;
        while cur != prev {
            let Node { point: p, prev: pp, next: pn, .. } = self.nodes[cur];
            let inside = orient(a, b, p) >= 0.0 && orient(b, c, p) >= 0.0 && orient(c, a, p) >= 0.0;
            let reflex = orient(self.nodes[pp].point, p, self.nodes[pn].point) <= 0.0;
            if inside && reflex && p != a && p != c {
                return false;
            }
            cur = pn;
        }
        true
    }

    /// Ear-clips the counter-clockwise ring through `start` into `out`.
    fn clip_ears(&mut self, start: usize, out: &mut Vec<[u32; 3]>) {
        let Some(mut start) = self.filter(start) else {
            return;
        };
        let mut remaining = self.ring_len(start);
        let (mut ear, mut stop) = (start, start);
        let mut refiltered = false;
        while remaining > 2 {
            let Node { prev, next, .. } = self.nodes[ear];
            if self.is_ear(ear) {
                out.push([self.nodes[prev].vertex, self.nodes[ear].vertex, self.nodes[next].vertex]);
                self.unlink(ear);
                remaining -= 1;
                start = next;
                (ear, stop) = (next, next);
                refiltered = false;
                continue;
            }
            ear = next;
            if ear == stop {
                if refiltered {
                    log::debug!("cap: {remaining} rim points left without an ear");
                    return;
                }
                let Some(filtered) = self.filter(start) else {
                    return;
                };
                start = filtered;
                remaining = self.ring_len(start);
                (ear, stop) = (start, start);
                refiltered = true;
            }
        }
    }
}
