//! Values sampled on regular grids.
//!
//! A [`Grid2`] or [`Grid3`] fixes the layout (cell counts, spacing, origin
//! and per-axis [`WrapMode`]); [`GridField2`] and [`GridField3`] store one
//! value per cell and interpolate between cells. The [`ops`] kernels work
//! on raw value slices, and the stencils in [`stencil`] differentiate whole
//! fields. Bulk work takes a `parallel` flag like the mesh operators.

pub mod grid;
pub mod grid_field;
pub mod ops;
pub mod stencil;

pub use grid::{Grid2, Grid3, WrapMode};
pub use grid_field::{FieldValue, GridField2, GridField3};
pub use stencil::{
    curl2, curl3, divergence2, divergence3, gradient2, gradient3, laplacian2, laplacian3,
};
