//! Half-space clipping used for contour cutouts.
//!
//! A clip plane removes everything on the side its normal points into, exposing
//! the interior of a surface for inspection.

use glam::Vec3;

/// A plane that cuts geometry.
///
/// The plane is defined by a point (origin) and a unit normal. Points with
/// negative signed distance are kept; points on the plane count as kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipPlane {
    origin: Vec3,
    normal: Vec3,
}

impl ClipPlane {
    /// Creates a clip plane with the given pose. The normal is normalized.
    #[must_use]
    pub fn new(origin: Vec3, normal: Vec3) -> Self {
        Self {
            origin,
            normal: normal.normalize_or_zero(),
        }
    }

    /// Creates a clip plane through the origin.
    #[must_use]
    pub fn through_origin(normal: Vec3) -> Self {
        Self::new(Vec3::ZERO, normal)
    }

    /// Returns the origin point of the plane.
    #[must_use]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Returns the unit normal, pointing into the removed half space.
    #[must_use]
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Returns the signed distance from a point to the plane.
    ///
    /// Positive values are on the removed side, negative on the kept side.
    #[must_use]
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        (point - self.origin).dot(self.normal)
    }

    /// Returns whether a point survives the cut.
    #[must_use]
    pub fn is_kept(&self, point: Vec3) -> bool {
        self.signed_distance(point) <= 0.0
    }

    /// Projects a point onto the plane.
    #[must_use]
    pub fn project(&self, point: Vec3) -> Vec3 {
        point - self.signed_distance(point) * self.normal
    }

    /// Parameter `t` in `[0, 1]` where segment `a -> b` crosses the plane, if it does.
    #[must_use]
    pub fn crossing(&self, a: Vec3, b: Vec3) -> Option<f32> {
        let da = self.signed_distance(a);
        let db = self.signed_distance(b);
        if (da > 0.0) == (db > 0.0) {
            return None;
        }
        Some((da / (da - db)).clamp(0.0, 1.0))
    }

    /// Two unit vectors spanning the plane, forming a right-handed frame with the normal.
    #[must_use]
    pub fn tangent_frame(&self) -> (Vec3, Vec3) {
        let helper = if self.normal.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
        let u = helper.cross(self.normal).normalize_or_zero();
        let v = self.normal.cross(u);
        (u, v)
    }
}

impl Default for ClipPlane {
    fn default() -> Self {
        Self::through_origin(Vec3::Y)
    }
}
