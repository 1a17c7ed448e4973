//! Regular 2D and 3D grid layouts.
//!
//! A grid maps integer cell coordinates to positions and to indices into a
//! flat value buffer. X varies fastest: `index = (k * ny + j) * nx + i`.
//! Out-of-range coordinates are folded back per axis by a [`WrapMode`].

use nalgebra::{Point2, Point3, Vector2, Vector3};

use crate::error::{MeshError, Result};

/// How coordinates outside a grid axis map back onto it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    /// Snap to the nearest edge cell.
    #[default]
    Clamp,
    /// Periodic: leaving one edge re-enters at the other.
    Repeat,
    /// Reflect at the edges; the edge cell is repeated (`-1 -> 0`, `n -> n-1`).
    Mirror,
}

impl WrapMode {
    /// Fold coordinate `i` onto an axis of `n > 0` cells.
    pub fn wrap(self, i: isize, n: usize) -> usize {
        let n_i = n as isize;
        match self {
            WrapMode::Clamp => i.clamp(0, n_i - 1) as usize,
            WrapMode::Repeat => i.rem_euclid(n_i) as usize,
            WrapMode::Mirror => {
                let period = 2 * n_i;
                let m = i.rem_euclid(period);
                if m < n_i {
                    m as usize
                } else {
                    (period - 1 - m) as usize
                }
            }
        }
    }

    /// Coordinates used for a centered difference at `i`, with the number
    /// of cell steps between them.
    pub(crate) fn central_pair(self, i: usize, n: usize) -> (usize, usize, f64) {
        match self {
            WrapMode::Clamp => {
                let lo = i.saturating_sub(1);
                let hi = (i + 1).min(n - 1);
                (lo, hi, (hi - lo) as f64)
            }
            WrapMode::Repeat | WrapMode::Mirror => {
                let ii = i as isize;
                (self.wrap(ii - 1, n), self.wrap(ii + 1, n), 2.0)
            }
        }
    }
}

fn check_axis(name: &'static str, cells: usize, spacing: f64) -> Result<()> {
    if cells == 0 {
        return Err(MeshError::invalid_param(name, cells, "grid axes need at least one cell"));
    }
    if !(spacing.is_finite() && spacing > 0.0) {
        return Err(MeshError::invalid_param(
            "spacing",
            spacing,
            "spacing must be positive and finite",
        ));
    }
    Ok(())
}

/// A 2D grid layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid2 {
    dims: [usize; 2],
    spacing: Vector2<f64>,
    origin: Point2<f64>,
    wrap: [WrapMode; 2],
}

impl Grid2 {
    /// Create a grid of `nx × ny` cells with the given spacing, at the
    /// origin, clamping on both axes.
    pub fn new(nx: usize, ny: usize, spacing: Vector2<f64>) -> Result<Self> {
        check_axis("nx", nx, spacing.x)?;
        check_axis("ny", ny, spacing.y)?;
        Ok(Self {
            dims: [nx, ny],
            spacing,
            origin: Point2::origin(),
            wrap: [WrapMode::Clamp; 2],
        })
    }

    /// Place cell `(0, 0)` at `origin`.
    pub fn with_origin(mut self, origin: Point2<f64>) -> Self {
        self.origin = origin;
        self
    }

    /// Use the same wrap mode on both axes.
    pub fn with_wrap(mut self, mode: WrapMode) -> Self {
        self.wrap = [mode; 2];
        self
    }

    /// Use per-axis wrap modes.
    pub fn with_axis_wrap(mut self, x: WrapMode, y: WrapMode) -> Self {
        self.wrap = [x, y];
        self
    }

    /// Cells per axis.
    #[inline]
    pub fn dims(&self) -> [usize; 2] {
        self.dims
    }

    /// Cell size per axis.
    #[inline]
    pub fn spacing(&self) -> Vector2<f64> {
        self.spacing
    }

    /// Position of cell `(0, 0)`.
    #[inline]
    pub fn origin(&self) -> Point2<f64> {
        self.origin
    }

    /// Wrap modes per axis.
    #[inline]
    pub fn wrap_modes(&self) -> [WrapMode; 2] {
        self.wrap
    }

    /// Total number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.dims[0] * self.dims[1]
    }

    /// Always false: grids have at least one cell.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat index of an in-range cell.
    #[inline]
    pub fn index(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.dims[0] && j < self.dims[1]);
        j * self.dims[0] + i
    }

    /// Cell coordinates of a flat index.
    #[inline]
    pub fn coords(&self, index: usize) -> [usize; 2] {
        [index % self.dims[0], index / self.dims[0]]
    }

    /// Flat index of any cell coordinate after wrapping.
    #[inline]
    pub fn wrapped_index(&self, i: isize, j: isize) -> usize {
        self.index(
            self.wrap[0].wrap(i, self.dims[0]),
            self.wrap[1].wrap(j, self.dims[1]),
        )
    }

    /// Position of a cell.
    #[inline]
    pub fn position(&self, i: usize, j: usize) -> Point2<f64> {
        self.origin + Vector2::new(i as f64 * self.spacing.x, j as f64 * self.spacing.y)
    }

    /// Continuous cell coordinates of a point.
    #[inline]
    pub fn to_grid(&self, p: &Point2<f64>) -> Vector2<f64> {
        (p - self.origin).component_div(&self.spacing)
    }
}

/// A 3D grid layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid3 {
    dims: [usize; 3],
    spacing: Vector3<f64>,
    origin: Point3<f64>,
    wrap: [WrapMode; 3],
}

impl Grid3 {
    /// Create a grid of `nx × ny × nz` cells with the given spacing, at the
    /// origin, clamping on every axis.
    pub fn new(nx: usize, ny: usize, nz: usize, spacing: Vector3<f64>) -> Result<Self> {
        check_axis("nx", nx, spacing.x)?;
        check_axis("ny", ny, spacing.y)?;
        check_axis("nz", nz, spacing.z)?;
        Ok(Self {
            dims: [nx, ny, nz],
            spacing,
            origin: Point3::origin(),
            wrap: [WrapMode::Clamp; 3],
        })
    }

    /// Place cell `(0, 0, 0)` at `origin`.
    pub fn with_origin(mut self, origin: Point3<f64>) -> Self {
        self.origin = origin;
        self
    }

    /// Use the same wrap mode on every axis.
    pub fn with_wrap(mut self, mode: WrapMode) -> Self {
        self.wrap = [mode; 3];
        self
    }

    /// Use per-axis wrap modes.
    pub fn with_axis_wrap(mut self, x: WrapMode, y: WrapMode, z: WrapMode) -> Self {
        self.wrap = [x, y, z];
        self
    }

    /// Cells per axis.
    #[inline]
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Cell size per axis.
    #[inline]
    pub fn spacing(&self) -> Vector3<f64> {
        self.spacing
    }

    /// Position of cell `(0, 0, 0)`.
    #[inline]
    pub fn origin(&self) -> Point3<f64> {
        self.origin
    }

    /// Wrap modes per axis.
    #[inline]
    pub fn wrap_modes(&self) -> [WrapMode; 3] {
        self.wrap
    }

    /// Total number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.dims[0] * self.dims[1] * self.dims[2]
    }

    /// Always false: grids have at least one cell.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat index of an in-range cell.
    #[inline]
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        debug_assert!(i < self.dims[0] && j < self.dims[1] && k < self.dims[2]);
        (k * self.dims[1] + j) * self.dims[0] + i
    }

    /// Cell coordinates of a flat index.
    #[inline]
    pub fn coords(&self, index: usize) -> [usize; 3] {
        let [nx, ny, _] = self.dims;
        [index % nx, (index / nx) % ny, index / (nx * ny)]
    }

    /// Flat index of any cell coordinate after wrapping.
    #[inline]
    pub fn wrapped_index(&self, i: isize, j: isize, k: isize) -> usize {
        self.index(
            self.wrap[0].wrap(i, self.dims[0]),
            self.wrap[1].wrap(j, self.dims[1]),
            self.wrap[2].wrap(k, self.dims[2]),
        )
    }

    /// Position of a cell.
    #[inline]
    pub fn position(&self, i: usize, j: usize, k: usize) -> Point3<f64> {
        self.origin
            + Vector3::new(
                i as f64 * self.spacing.x,
                j as f64 * self.spacing.y,
                k as f64 * self.spacing.z,
            )
    }

    /// Continuous cell coordinates of a point.
    #[inline]
    pub fn to_grid(&self, p: &Point3<f64>) -> Vector3<f64> {
        (p - self.origin).component_div(&self.spacing)
    }
}
