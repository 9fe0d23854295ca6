//! Configuration options for mesh and volume builds.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::color::ColorPolicy;
use crate::error::{AtomViewError, Result};

/// Fraction of the sampled probability mass enclosed by the default contour.
pub const DEFAULT_ENCLOSED_PROBABILITY: f64 = 0.9;

/// Default number of grid points per axis.
pub const DEFAULT_NUM_PTS: u32 = 100;

/// How the contour isovalue is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum IsoLevel {
    /// The density above which the grid holds this fraction (in `(0, 1)`) of
    /// the sampled probability.
    EnclosedProbability(f64),
    /// A fixed density value.
    Fixed(f32),
}

impl Default for IsoLevel {
    fn default() -> Self {
        IsoLevel::EnclosedProbability(DEFAULT_ENCLOSED_PROBABILITY)
    }
}

/// Monotonic map from normalized density to normalized opacity, with `f(1) = 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum OpacityCurve {
    /// Opacity proportional to density.
    #[default]
    Linear,
    /// Opacity proportional to `density^gamma`; `gamma < 1` lifts the tails.
    Gamma(f32),
}

impl OpacityCurve {
    /// Applies the curve to `t`, clamped to `[0, 1]`.
    #[must_use]
    pub fn apply(&self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            OpacityCurve::Linear => t,
            OpacityCurve::Gamma(gamma) => t.powf(f64::from(*gamma)),
        }
    }
}

/// Options shared by the contour and volume builders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Grid half extent per `n²`, in Bohr radii.
    pub extent_scale: f64,

    /// Grid half extent added for every `n`, in Bohr radii.
    pub extent_padding: f64,

    /// Contour isovalue rule.
    pub iso_level: IsoLevel,

    /// Normal of the cutout plane through the origin; the half space the
    /// normal points into is removed.
    pub clip_normal: Vec3,

    /// Whether a clipped contour gets a cap over the cut.
    pub cap_clipped: bool,

    /// Density-to-opacity curve for volumes.
    pub opacity_curve: OpacityCurve,

    /// Amplitude coloring.
    pub colors: ColorPolicy,

    /// Whether to evaluate grids and color voxels on the rayon thread pool.
    pub parallel: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            extent_scale: 3.0,
            extent_padding: 5.0,
            iso_level: IsoLevel::default(),
            clip_normal: Vec3::Y,
            cap_clipped: true,
            opacity_curve: OpacityCurve::Linear,
            colors: ColorPolicy::default(),
            parallel: true,
        }
    }
}

impl BuildOptions {
    /// Returns a copy with a different isovalue rule.
    #[must_use]
    pub fn with_iso_level(mut self, iso_level: IsoLevel) -> Self {
        self.iso_level = iso_level;
        self
    }

    /// Checks every field against its documented range.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(AtomViewError::InvalidOptions(msg));

        if !self.extent_scale.is_finite() || self.extent_scale < 0.0 {
            return invalid(format!("extent_scale must be >= 0, got {}", self.extent_scale));
        }
        if !self.extent_padding.is_finite() || self.extent_padding <= 0.0 {
            return invalid(format!(
                "extent_padding must be > 0, got {}",
                self.extent_padding
            ));
        }
        match self.iso_level {
            IsoLevel::EnclosedProbability(f) if !(f > 0.0 && f < 1.0) => {
                return invalid(format!("enclosed probability must be in (0, 1), got {f}"));
            }
            IsoLevel::Fixed(v) if !(v.is_finite() && v > 0.0) => {
                return invalid(format!("fixed isovalue must be positive, got {v}"));
            }
            _ => {}
        }
        if !self.clip_normal.is_finite() || self.clip_normal.length_squared() == 0.0 {
            return invalid(format!("clip_normal must be non-zero, got {}", self.clip_normal));
        }
        if let OpacityCurve::Gamma(gamma) = self.opacity_curve {
            if !(gamma.is_finite() && gamma > 0.0) {
                return invalid(format!("opacity gamma must be positive, got {gamma}"));
            }
        }
        let unit = |v: Vec3| v.is_finite() && v.min_element() >= 0.0 && v.max_element() <= 1.0;
        if !unit(self.colors.positive) || !unit(self.colors.negative) {
            return invalid("lobe colors must have channels in [0, 1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.colors.phase_saturation) {
            return invalid(format!(
                "phase saturation must be in [0, 1], got {}",
                self.colors.phase_saturation
            ));
        }
        Ok(())
    }

    /// Parses and validates options from JSON. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Loads options from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serializes the options as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
