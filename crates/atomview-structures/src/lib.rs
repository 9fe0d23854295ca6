//! Renderable orbital geometry for atomview-rs.
//!
//! This crate turns sampled wavefunctions into data a renderer can take directly:
//! - [`ContourMesh`]: a colored isoprobability surface, optionally cut open and capped
//! - [`VolumeBuffer`]: a dense RGBA voxel grid for volume rendering

// Graphics code intentionally uses casts for indices, colors, and coordinates
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]

pub mod contour;
pub mod volume;

pub use contour::{choose_isovalue, ContourMesh, ContourMeshBuilder};
pub use volume::{VolumeBuffer, VolumeFieldBuilder, MIN_NORMALIZATION_DENSITY};
