//! Viewer selection state and the updates a viewer applies to it.
//!
//! A viewer offers `n` from a fixed list, `l` from `0..n` and `m` from `-l..=l`.
//! Changing an outer quantum number re-offers the inner lists and keeps the
//! previous choice where it is still legal, so the selection is always a valid
//! [`QuantumState`].

use std::ops::{Range, RangeInclusive};

use serde::{Deserialize, Serialize};

use atomview_core::{AtomViewError, Basis, BuildOptions, QuantumState, Result, DEFAULT_NUM_PTS};
use atomview_structures::{ContourMesh, ContourMeshBuilder, VolumeBuffer, VolumeFieldBuilder};

/// Which representation of the orbital to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VisMode {
    /// Isoprobability surface.
    #[default]
    Contour,
    /// Semi-transparent voxel volume.
    Volume,
}

/// A single change made through the viewer's controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewUpdate {
    SetN(u32),
    SetL(u32),
    SetM(i32),
    SetBasis(Basis),
    SetCutout(bool),
    SetMode(VisMode),
}

/// Geometry produced for the current selection.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Contour(ContourMesh),
    Volume(VolumeBuffer),
}

impl Rendered {
    /// The mode this geometry belongs to.
    #[must_use]
    pub fn mode(&self) -> VisMode {
        match self {
            Rendered::Contour(_) => VisMode::Contour,
            Rendered::Volume(_) => VisMode::Volume,
        }
    }
}

/// Everything a viewer needs to rebuild its scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    state: QuantumState,
    /// Basis for coloring.
    pub basis: Basis,
    /// Cut contours open along the clip plane.
    pub cutout: bool,
    /// Contour or volume.
    pub mode: VisMode,
    /// Grid points per axis.
    pub num_pts: u32,
    /// Opacity cap for volumes, in `[0, 1]`.
    pub max_opacity: f32,
}

impl Default for ViewState {
    /// The 1s orbital as a complex-basis contour.
    fn default() -> Self {
        Self {
            state: QuantumState::default(),
            basis: Basis::default(),
            cutout: false,
            mode: VisMode::default(),
            num_pts: DEFAULT_NUM_PTS,
            max_opacity: 1.0,
        }
    }
}

impl ViewState {
    /// The selected orbital.
    pub fn state(&self) -> QuantumState {
        self.state
    }

    /// Values currently offered for `l`.
    pub fn l_choices(&self) -> Range<u32> {
        0..self.state.n()
    }

    /// Values currently offered for `m`.
    #[allow(clippy::cast_possible_wrap)]
    pub fn m_choices(&self) -> RangeInclusive<i32> {
        let l = self.state.l() as i32;
        -l..=l
    }

    /// Applies one control change.
    ///
    /// Selecting a new `n` keeps `l` if it is still below `n` (else takes
    /// `n - 1`); selecting a new `l` keeps `m` if `|m| <= l` (else takes the
    /// nearer end of `-l..=l`). Values the controls would never offer are
    /// rejected and leave the state untouched.
    pub fn apply(&mut self, update: ViewUpdate) -> Result<()> {
        match update {
            ViewUpdate::SetN(n) => {
                if n == 0 {
                    return Err(self.invalid(n, self.state.l(), self.state.m()));
                }
                let l = self.state.l().min(n - 1);
                self.state = Self::reclamp(n, l, self.state.m())?;
            }
            ViewUpdate::SetL(l) => {
                if l >= self.state.n() {
                    return Err(self.invalid(self.state.n(), l, self.state.m()));
                }
                self.state = Self::reclamp(self.state.n(), l, self.state.m())?;
            }
            ViewUpdate::SetM(m) => {
                self.state = QuantumState::new(self.state.n(), self.state.l(), m)?;
            }
            ViewUpdate::SetBasis(basis) => self.basis = basis,
            ViewUpdate::SetCutout(cutout) => self.cutout = cutout,
            ViewUpdate::SetMode(mode) => self.mode = mode,
        }
        log::debug!("{update:?} -> {} ({:?}, {:?})", self.state, self.basis, self.mode);
        Ok(())
    }

    /// Builds the geometry for the current selection.
    pub fn render(&self, options: &BuildOptions) -> Result<Rendered> {
        match self.mode {
            VisMode::Contour => ContourMeshBuilder::new(options.clone())?
                .build(self.state, self.num_pts, self.basis, self.cutout)
                .map(Rendered::Contour),
            VisMode::Volume => VolumeFieldBuilder::new(options.clone())?
                .build(self.state, self.num_pts, self.basis, self.max_opacity)
                .map(Rendered::Volume),
        }
    }

    #[allow(clippy::cast_possible_wrap)]
    fn reclamp(n: u32, l: u32, m: i32) -> Result<QuantumState> {
        let l_signed = l as i32;
        QuantumState::new(n, l, m.clamp(-l_signed, l_signed))
    }

    fn invalid(&self, n: u32, l: u32, m: i32) -> AtomViewError {
        log::warn!("rejected selection n={n} l={l} m={m}, keeping {}", self.state);
        AtomViewError::InvalidQuantumState { n, l, m }
    }
}
