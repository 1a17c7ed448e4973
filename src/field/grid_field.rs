//! Dense values stored on a regular grid.

use std::ops::{Add, Mul, Sub};

use nalgebra::{Point2, Point3};
use rayon::prelude::*;

use crate::error::{MeshError, Result};

use super::grid::{Grid2, Grid3};

/// Values that can live in a grid field: scalars and nalgebra vectors.
pub trait FieldValue:
    Copy + Default + Send + Sync + Add<Output = Self> + Sub<Output = Self> + Mul<f64, Output = Self>
{
}

impl<T> FieldValue for T where
    T: Copy
        + Default
        + Send
        + Sync
        + Add<Output = T>
        + Sub<Output = T>
        + Mul<f64, Output = T>
{
}

#[inline]
pub(crate) fn mix<T: FieldValue>(a: T, b: T, t: f64) -> T {
    a + (b - a) * t
}

pub(crate) fn fill<T, F>(len: usize, parallel: bool, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    if parallel {
        (0..len).into_par_iter().map(f).collect()
    } else {
        (0..len).map(f).collect()
    }
}

/// A 2D field of values, one per grid cell.
#[derive(Debug, Clone, PartialEq)]
pub struct GridField2<T> {
    grid: Grid2,
    values: Vec<T>,
}

impl<T: FieldValue> GridField2<T> {
    /// A field filled with `T::default()`.
    pub fn new(grid: Grid2) -> Self {
        let values = vec![T::default(); grid.len()];
        Self { grid, values }
    }

    /// Wrap an existing buffer laid out in grid index order.
    pub fn from_values(grid: Grid2, values: Vec<T>) -> Result<Self> {
        MeshError::check_len(grid.len(), values.len())?;
        Ok(Self { grid, values })
    }

    pub(crate) fn from_parts(grid: Grid2, values: Vec<T>) -> Self {
        debug_assert_eq!(grid.len(), values.len());
        Self { grid, values }
    }

    /// Evaluate `f` at every cell position.
    pub fn from_fn<F>(grid: Grid2, f: F, parallel: bool) -> Self
    where
        F: Fn(Point2<f64>) -> T + Sync + Send,
    {
        let values = fill(grid.len(), parallel, |idx| {
            let [i, j] = grid.coords(idx);
            f(grid.position(i, j))
        });
        Self { grid, values }
    }

    /// Layout of the field.
    pub fn grid(&self) -> &Grid2 {
        &self.grid
    }

    /// Values in grid index order.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Mutable values in grid index order.
    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Take the value buffer.
    pub fn into_values(self) -> Vec<T> {
        self.values
    }

    /// Value of an in-range cell.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> T {
        self.values[self.grid.index(i, j)]
    }

    /// Value of any cell coordinate after wrapping.
    #[inline]
    pub fn get_wrapped(&self, i: isize, j: isize) -> T {
        self.values[self.grid.wrapped_index(i, j)]
    }

    /// Overwrite an in-range cell.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: T) {
        let idx = self.grid.index(i, j);
        self.values[idx] = value;
    }

    /// Value of the cell closest to `p`.
    pub fn sample_nearest(&self, p: &Point2<f64>) -> T {
        let g = self.grid.to_grid(p);
        self.get_wrapped(g.x.round() as isize, g.y.round() as isize)
    }

    /// Bilinear interpolation of the four cells around `p`.
    pub fn sample_linear(&self, p: &Point2<f64>) -> T {
        let g = self.grid.to_grid(p);
        let (fx, fy) = (g.x.floor(), g.y.floor());
        let (tx, ty) = (g.x - fx, g.y - fy);
        let (i, j) = (fx as isize, fy as isize);

        let bottom = mix(self.get_wrapped(i, j), self.get_wrapped(i + 1, j), tx);
        let top = mix(self.get_wrapped(i, j + 1), self.get_wrapped(i + 1, j + 1), tx);
        mix(bottom, top, ty)
    }
}

/// A 3D field of values, one per grid cell.
#[derive(Debug, Clone, PartialEq)]
pub struct GridField3<T> {
    grid: Grid3,
    values: Vec<T>,
}

impl<T: FieldValue> GridField3<T> {
    /// A field filled with `T::default()`.
    pub fn new(grid: Grid3) -> Self {
        let values = vec![T::default(); grid.len()];
        Self { grid, values }
    }

    /// Wrap an existing buffer laid out in grid index order.
    pub fn from_values(grid: Grid3, values: Vec<T>) -> Result<Self> {
        MeshError::check_len(grid.len(), values.len())?;
        Ok(Self { grid, values })
    }

    pub(crate) fn from_parts(grid: Grid3, values: Vec<T>) -> Self {
        debug_assert_eq!(grid.len(), values.len());
        Self { grid, values }
    }

    /// Evaluate `f` at every cell position.
    pub fn from_fn<F>(grid: Grid3, f: F, parallel: bool) -> Self
    where
        F: Fn(Point3<f64>) -> T + Sync + Send,
    {
        let values = fill(grid.len(), parallel, |idx| {
            let [i, j, k] = grid.coords(idx);
            f(grid.position(i, j, k))
        });
        Self { grid, values }
    }

    /// Layout of the field.
    pub fn grid(&self) -> &Grid3 {
        &self.grid
    }

    /// Values in grid index order.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Mutable values in grid index order.
    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Take the value buffer.
    pub fn into_values(self) -> Vec<T> {
        self.values
    }

    /// Value of an in-range cell.
    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize) -> T {
        self.values[self.grid.index(i, j, k)]
    }

    /// Value of any cell coordinate after wrapping.
    #[inline]
    pub fn get_wrapped(&self, i: isize, j: isize, k: isize) -> T {
        self.values[self.grid.wrapped_index(i, j, k)]
    }

    /// Overwrite an in-range cell.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, k: usize, value: T) {
        let idx = self.grid.index(i, j, k);
        self.values[idx] = value;
    }

    /// Value of the cell closest to `p`.
    pub fn sample_nearest(&self, p: &Point3<f64>) -> T {
        let g = self.grid.to_grid(p);
        self.get_wrapped(
            g.x.round() as isize,
            g.y.round() as isize,
            g.z.round() as isize,
        )
    }

    /// Trilinear interpolation of the eight cells around `p`.
    pub fn sample_linear(&self, p: &Point3<f64>) -> T {
        let g = self.grid.to_grid(p);
        let f = g.map(f64::floor);
        let t = g - f;
        let (i, j, k) = (f.x as isize, f.y as isize, f.z as isize);

        let c = |di, dj, dk| self.get_wrapped(i + di, j + dj, k + dk);
        let c00 = mix(c(0, 0, 0), c(1, 0, 0), t.x);
        let c10 = mix(c(0, 1, 0), c(1, 1, 0), t.x);
        let c01 = mix(c(0, 0, 1), c(1, 0, 1), t.x);
        let c11 = mix(c(0, 1, 1), c(1, 1, 1), t.x);
        mix(mix(c00, c10, t.y), mix(c01, c11, t.y), t.z)
    }
}
