//! Color policy shared by contour meshes and volumes.

use std::f64::consts::PI;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::wavefunction::Amplitude;

/// An 8-bit RGBA color, laid out for direct GPU upload.
#[repr(C)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, bytemuck::Pod, bytemuck::Zeroable,
)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    /// Creates a color from its channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Quantizes a linear `[0, 1]` color; out-of-range channels are clamped.
    #[must_use]
    pub fn from_rgb(rgb: Vec3, alpha: f32) -> Self {
        Self::new(
            unit_to_u8(rgb.x),
            unit_to_u8(rgb.y),
            unit_to_u8(rgb.z),
            unit_to_u8(alpha),
        )
    }

    /// Returns the same color with a different alpha.
    #[must_use]
    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Color channels as `[0, 1]` floats.
    #[must_use]
    pub fn rgb(&self) -> Vec3 {
        Vec3::new(
            f32::from(self.r),
            f32::from(self.g),
            f32::from(self.b),
        ) / 255.0
    }

    /// Alpha as a `[0, 1]` float.
    #[must_use]
    pub fn alpha(&self) -> f32 {
        f32::from(self.a) / 255.0
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn unit_to_u8(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Maps amplitudes to colors.
///
/// Real amplitudes use a two-color diverging map keyed on sign. Complex
/// amplitudes use a cyclic hue wheel keyed on phase, so `-π` and `π` meet.
/// In both cases brightness is scaled by a caller-supplied intensity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorPolicy {
    /// Color of lobes with positive real amplitude.
    pub positive: Vec3,
    /// Color of lobes with negative real amplitude.
    pub negative: Vec3,
    /// Saturation of the phase wheel (0 = grey, 1 = fully saturated).
    pub phase_saturation: f32,
}

impl Default for ColorPolicy {
    fn default() -> Self {
        Self {
            positive: Vec3::new(0.957, 0.494, 0.094),
            negative: Vec3::new(0.114, 0.471, 0.953),
            phase_saturation: 1.0,
        }
    }
}

impl ColorPolicy {
    /// Colors an amplitude at the given intensity in `[0, 1]`. Alpha is opaque.
    #[must_use]
    pub fn color(&self, amplitude: &Amplitude, intensity: f32) -> Rgba8 {
        let intensity = if intensity.is_finite() {
            intensity.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let base = match amplitude {
            Amplitude::Real(a) => self.sign_color(*a),
            Amplitude::Complex(c) => self.phase_color(c.arg()),
        };
        Rgba8::from_rgb(base * intensity, 1.0)
    }

    /// Base color for a real amplitude of the given sign.
    #[must_use]
    pub fn sign_color(&self, value: f64) -> Vec3 {
        if value < 0.0 {
            self.negative
        } else {
            self.positive
        }
    }

    /// Base color on the phase wheel; `phase` is taken modulo `2π`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn phase_color(&self, phase: f64) -> Vec3 {
        let hue = if phase.is_finite() {
            ((phase + PI) / (2.0 * PI)).rem_euclid(1.0) as f32
        } else {
            0.0
        };
        hsv_to_rgb(hue, self.phase_saturation.clamp(0.0, 1.0), 1.0)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Vec3 {
    let h6 = (h * 6.0).rem_euclid(6.0);
    let sector = h6.floor();
    let f = h6 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match sector as u32 {
        0 => Vec3::new(v, t, p),
        1 => Vec3::new(q, v, p),
        2 => Vec3::new(p, v, t),
        3 => Vec3::new(p, q, v),
        4 => Vec3::new(t, p, v),
        _ => Vec3::new(v, p, q),
    }
}
