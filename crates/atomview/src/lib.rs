//! atomview-rs: contour surfaces and volumes of hydrogen-like atomic orbitals.
//!
//! Pick quantum numbers `(n, l, m)` and get back geometry a renderer can draw
//! directly: a colored isoprobability surface, or a dense RGBA volume.
//!
//! # Quick Start
//!
//! ```no_run
//! use atomview::*;
//!
//! fn main() -> Result<()> {
//!     init_logging();
//!
//!     // 2p_z in the real basis, cut open along the y = 0 plane
//!     let mesh = wavefunction_prob_contour_mesh(2, 1, 0, DEFAULT_NUM_PTS, true, true)?;
//!     println!("{} triangles", mesh.num_triangles());
//!
//!     // 3d_xy as a half-transparent volume
//!     let volume = wavefunction_volume_mesh(3, 2, -2, 64, true, 0.5)?;
//!     println!("{} voxels", volume.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `atomview-core` evaluates `ψ_nlm` on a [`SampleGrid`] and holds the shared
//!   [`ColorPolicy`], [`BuildOptions`] and error types.
//! - `atomview-structures` builds [`ContourMesh`] and [`VolumeBuffer`].
//! - This crate exposes the two entry points a viewer calls, and [`ViewState`],
//!   which models the viewer's selection and turns it into either one.
//!
//! Every call is a pure function of its inputs; nothing is cached between calls.

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::many_single_char_names)]

mod view_state;

pub use atomview_core::{
    amplitude, evaluate_grid, Amplitude, AtomViewError, Basis, BuildOptions, ClipPlane,
    ColorPolicy, FieldSample, IsoLevel, OpacityCurve, QuantumState, Result, Rgba8, SampleGrid,
    SampledField, WavefunctionField, DEFAULT_ENCLOSED_PROBABILITY, DEFAULT_NUM_PTS,
};
pub use atomview_structures::{
    ContourMesh, ContourMeshBuilder, VolumeBuffer, VolumeFieldBuilder,
};
pub use view_state::{Rendered, ViewState, ViewUpdate, VisMode};

pub use glam::{DVec3, UVec3, Vec3};

/// Installs an `env_logger` backend filtered by `RUST_LOG`.
///
/// Safe to call more than once; later calls (or an existing logger) are ignored.
pub fn init_logging() {
    if env_logger::Builder::from_default_env().try_init().is_ok() {
        log::debug!("atomview-rs logging initialized");
    }
}

/// Builds the probability contour of orbital `(n, l, m)`.
///
/// `real` selects the real spherical-harmonic basis (sign coloring) over the
/// complex one (phase coloring). With `clip`, the half of the surface on the
/// `+y` side is removed and the cut is capped.
pub fn wavefunction_prob_contour_mesh(
    n: u32,
    l: u32,
    m: i32,
    num_pts: u32,
    real: bool,
    clip: bool,
) -> Result<ContourMesh> {
    wavefunction_prob_contour_mesh_with_options(
        n,
        l,
        m,
        num_pts,
        real,
        clip,
        &BuildOptions::default(),
    )
}

/// [`wavefunction_prob_contour_mesh`] with explicit build options.
pub fn wavefunction_prob_contour_mesh_with_options(
    n: u32,
    l: u32,
    m: i32,
    num_pts: u32,
    real: bool,
    clip: bool,
    options: &BuildOptions,
) -> Result<ContourMesh> {
    let state = QuantumState::new(n, l, m)?;
    let mesh = ContourMeshBuilder::new(options.clone())?.build(
        state,
        num_pts,
        Basis::from_real_flag(real),
        clip,
    )?;
    log::info!(
        "contour {state}: {} vertices, {} triangles",
        mesh.num_vertices(),
        mesh.num_triangles()
    );
    Ok(mesh)
}

/// Builds the RGBA volume of orbital `(n, l, m)` with opacity capped at `max_opacity`.
pub fn wavefunction_volume_mesh(
    n: u32,
    l: u32,
    m: i32,
    num_pts: u32,
    real: bool,
    max_opacity: f32,
) -> Result<VolumeBuffer> {
    wavefunction_volume_mesh_with_options(
        n,
        l,
        m,
        num_pts,
        real,
        max_opacity,
        &BuildOptions::default(),
    )
}

/// [`wavefunction_volume_mesh`] with explicit build options.
pub fn wavefunction_volume_mesh_with_options(
    n: u32,
    l: u32,
    m: i32,
    num_pts: u32,
    real: bool,
    max_opacity: f32,
    options: &BuildOptions,
) -> Result<VolumeBuffer> {
    let state = QuantumState::new(n, l, m)?;
    let volume = VolumeFieldBuilder::new(options.clone())?.build(
        state,
        num_pts,
        Basis::from_real_flag(real),
        max_opacity,
    )?;
    log::info!("volume {state}: {} voxels", volume.len());
    Ok(volume)
}
