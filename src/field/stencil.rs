//! Finite-difference operators on grid fields.
//!
//! First derivatives use centered differences. On a clamped axis the edge
//! cells fall back to a one-sided difference; repeating and mirrored axes
//! stay centered across the boundary. The Laplacian uses the standard
//! `[1, -2, 1]` stencil per axis with out-of-range neighbors wrapped, so a
//! clamped axis behaves like a zero-flux boundary.
//!
//! ```
//! use nalgebra::{Vector2, Point2};
//! use tessel::field::{laplacian2, Grid2, GridField2};
//!
//! let grid = Grid2::new(8, 8, Vector2::repeat(0.1)).unwrap();
//! let f = GridField2::from_fn(grid, |p: Point2<f64>| p.x * p.x + p.y * p.y, true);
//! let lap = laplacian2(&f, true);
//! assert!((lap.get(3, 4) - 4.0).abs() < 1e-9);
//! ```

use nalgebra::{Vector2, Vector3};

use super::grid_field::{fill, FieldValue, GridField2, GridField3};

fn diff2<T: FieldValue>(field: &GridField2<T>, i: usize, j: usize, axis: usize) -> T {
    let grid = field.grid();
    let dims = grid.dims();
    let h = grid.spacing()[axis];
    let c = [i, j][axis];
    let (lo, hi, steps) = grid.wrap_modes()[axis].central_pair(c, dims[axis]);
    if steps == 0.0 {
        return T::default();
    }
    let (a, b) = if axis == 0 {
        (field.get(lo, j), field.get(hi, j))
    } else {
        (field.get(i, lo), field.get(i, hi))
    };
    (b - a) * (1.0 / (steps * h))
}

fn diff3<T: FieldValue>(field: &GridField3<T>, at: [usize; 3], axis: usize) -> T {
    let grid = field.grid();
    let h = grid.spacing()[axis];
    let (lo, hi, steps) = grid.wrap_modes()[axis].central_pair(at[axis], grid.dims()[axis]);
    if steps == 0.0 {
        return T::default();
    }
    let (mut a, mut b) = (at, at);
    a[axis] = lo;
    b[axis] = hi;
    (field.get(b[0], b[1], b[2]) - field.get(a[0], a[1], a[2])) * (1.0 / (steps * h))
}

/// Gradient of a 2D scalar field.
pub fn gradient2(field: &GridField2<f64>, parallel: bool) -> GridField2<Vector2<f64>> {
    let grid = field.grid();
    let values = fill(grid.len(), parallel, |idx| {
        let [i, j] = grid.coords(idx);
        Vector2::new(diff2(field, i, j, 0), diff2(field, i, j, 1))
    });
    GridField2::from_parts(grid.clone(), values)
}

/// Gradient of a 3D scalar field.
pub fn gradient3(field: &GridField3<f64>, parallel: bool) -> GridField3<Vector3<f64>> {
    let grid = field.grid();
    let values = fill(grid.len(), parallel, |idx| {
        let at = grid.coords(idx);
        Vector3::new(diff3(field, at, 0), diff3(field, at, 1), diff3(field, at, 2))
    });
    GridField3::from_parts(grid.clone(), values)
}

/// Divergence of a 2D vector field.
pub fn divergence2(field: &GridField2<Vector2<f64>>, parallel: bool) -> GridField2<f64> {
    let grid = field.grid();
    let values = fill(grid.len(), parallel, |idx| {
        let [i, j] = grid.coords(idx);
        diff2(field, i, j, 0).x + diff2(field, i, j, 1).y
    });
    GridField2::from_parts(grid.clone(), values)
}

/// Divergence of a 3D vector field.
pub fn divergence3(field: &GridField3<Vector3<f64>>, parallel: bool) -> GridField3<f64> {
    let grid = field.grid();
    let values = fill(grid.len(), parallel, |idx| {
        let at = grid.coords(idx);
        diff3(field, at, 0).x + diff3(field, at, 1).y + diff3(field, at, 2).z
    });
    GridField3::from_parts(grid.clone(), values)
}

/// Scalar curl `∂vy/∂x − ∂vx/∂y` of a 2D vector field.
pub fn curl2(field: &GridField2<Vector2<f64>>, parallel: bool) -> GridField2<f64> {
    let grid = field.grid();
    let values = fill(grid.len(), parallel, |idx| {
        let [i, j] = grid.coords(idx);
        diff2(field, i, j, 0).y - diff2(field, i, j, 1).x
    });
    GridField2::from_parts(grid.clone(), values)
}

/// Curl of a 3D vector field.
pub fn curl3(field: &GridField3<Vector3<f64>>, parallel: bool) -> GridField3<Vector3<f64>> {
    let grid = field.grid();
    let values = fill(grid.len(), parallel, |idx| {
        let at = grid.coords(idx);
        let (dx, dy, dz) = (diff3(field, at, 0), diff3(field, at, 1), diff3(field, at, 2));
        Vector3::new(dy.z - dz.y, dz.x - dx.z, dx.y - dy.x)
    });
    GridField3::from_parts(grid.clone(), values)
}

/// Laplacian of a 2D field, component-wise for vector values.
pub fn laplacian2<T: FieldValue>(field: &GridField2<T>, parallel: bool) -> GridField2<T> {
    let grid = field.grid();
    let h = grid.spacing();
    let (wx, wy) = (1.0 / (h.x * h.x), 1.0 / (h.y * h.y));
    let values = fill(grid.len(), parallel, |idx| {
        let [i, j] = grid.coords(idx);
        let (i, j) = (i as isize, j as isize);
        let center = field.get_wrapped(i, j);
        let ddx = field.get_wrapped(i - 1, j) + field.get_wrapped(i + 1, j) - center * 2.0;
        let ddy = field.get_wrapped(i, j - 1) + field.get_wrapped(i, j + 1) - center * 2.0;
        ddx * wx + ddy * wy
    });
    GridField2::from_parts(grid.clone(), values)
}

/// Laplacian of a 3D field, component-wise for vector values.
pub fn laplacian3<T: FieldValue>(field: &GridField3<T>, parallel: bool) -> GridField3<T> {
    let grid = field.grid();
    let w = grid.spacing().map(|h| 1.0 / (h * h));
    let values = fill(grid.len(), parallel, |idx| {
        let [i, j, k] = grid.coords(idx).map(|c| c as isize);
        let center = field.get_wrapped(i, j, k) * 2.0;
        let ddx = field.get_wrapped(i - 1, j, k) + field.get_wrapped(i + 1, j, k) - center;
        let ddy = field.get_wrapped(i, j - 1, k) + field.get_wrapped(i, j + 1, k) - center;
        let ddz = field.get_wrapped(i, j, k - 1) + field.get_wrapped(i, j, k + 1) - center;
        ddx * w.x + ddy * w.y + ddz * w.z
    });
    GridField3::from_parts(grid.clone(), values)
}
