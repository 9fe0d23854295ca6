//! Core numerics for atomview-rs.
//!
//! This crate provides the building blocks shared by the contour and volume builders:
//! - [`QuantumState`] and [`Basis`] describing which orbital to draw
//! - [`WavefunctionField`] evaluating `ψ_nlm` at points or over a [`SampleGrid`]
//! - [`ColorPolicy`] mapping amplitudes to [`Rgba8`] colors
//! - [`marching_cubes`] isosurface extraction and [`ClipPlane`] cutting
//! - [`BuildOptions`] configuration and the [`AtomViewError`] taxonomy

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Quantum numbers n, l, m are the standard names
#![allow(clippy::many_single_char_names)]
#![allow(clippy::similar_names)]

pub mod clip;
pub mod color;
pub mod error;
pub mod grid;
pub mod marching_cubes;
pub mod options;
pub mod quantum;
pub mod wavefunction;

pub use clip::ClipPlane;
pub use color::{ColorPolicy, Rgba8};
pub use error::{AtomViewError, Result};
pub use grid::SampleGrid;
pub use marching_cubes::{marching_cubes, IsoMesh};
pub use options::{BuildOptions, IsoLevel, OpacityCurve, DEFAULT_ENCLOSED_PROBABILITY, DEFAULT_NUM_PTS};
pub use quantum::{Basis, QuantumState};
pub use wavefunction::{
    amplitude, evaluate_grid, Amplitude, AngularFunction, FieldSample, RadialFunction,
    SampledField, WavefunctionField,
};

// Re-export glam types for convenience
pub use glam::{DVec3, UVec3, Vec3};
