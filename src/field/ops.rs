//! Element-wise kernels over value buffers.
//!
//! Every kernel writes into its first argument in place. With `parallel`
//! set, the destination is split into contiguous chunks of [`CHUNK_SIZE`]
//! values and each rayon task owns exactly one chunk.
//!
//! ```
//! use tessel::field::ops::{add_scaled, dot};
//!
//! let mut x = vec![1.0, 2.0, 3.0];
//! add_scaled(&mut x, &[1.0, 1.0, 1.0], 0.5, false).unwrap();
//! assert_eq!(x, vec![1.5, 2.5, 3.5]);
//! assert_eq!(dot(&x, &[2.0, 0.0, 0.0], false).unwrap(), 3.0);
//! ```

use rayon::prelude::*;

use crate::error::{MeshError, Result};

use super::grid_field::{mix, FieldValue};

/// Values per parallel task.
pub const CHUNK_SIZE: usize = 4096;

fn update<T, F>(dst: &mut [T], parallel: bool, f: F)
where
    T: Send,
    F: Fn(&mut T) + Sync + Send,
{
    if parallel {
        dst.par_chunks_mut(CHUNK_SIZE)
            .for_each(|chunk| chunk.iter_mut().for_each(&f));
    } else {
        dst.iter_mut().for_each(f);
    }
}

fn update_with<T, F>(dst: &mut [T], src: &[T], parallel: bool, f: F) -> Result<()>
where
    T: Send + Sync + Copy,
    F: Fn(&mut T, T) + Sync + Send,
{
    MeshError::check_len(dst.len(), src.len())?;
    if parallel {
        dst.par_chunks_mut(CHUNK_SIZE)
            .zip(src.par_chunks(CHUNK_SIZE))
            .for_each(|(out, inp)| {
                for (d, &s) in out.iter_mut().zip(inp) {
                    f(d, s);
                }
            });
    } else {
        for (d, &s) in dst.iter_mut().zip(src) {
            f(d, s);
        }
    }
    Ok(())
}

/// `dst += src`
pub fn add<T: FieldValue>(dst: &mut [T], src: &[T], parallel: bool) -> Result<()> {
    update_with(dst, src, parallel, |d, s| *d = *d + s)
}

/// `dst -= src`
pub fn subtract<T: FieldValue>(dst: &mut [T], src: &[T], parallel: bool) -> Result<()> {
    update_with(dst, src, parallel, |d, s| *d = *d - s)
}

/// `dst *= factor`
pub fn scale<T: FieldValue>(dst: &mut [T], factor: f64, parallel: bool) {
    update(dst, parallel, |d| *d = *d * factor);
}

/// `dst += factor * src`
pub fn add_scaled<T: FieldValue>(dst: &mut [T], src: &[T], factor: f64, parallel: bool) -> Result<()> {
    update_with(dst, src, parallel, |d, s| *d = *d + s * factor)
}

/// `dst = dst + t * (src - dst)`; `t = 0` keeps `dst`, `t = 1` copies `src`.
pub fn lerp<T: FieldValue>(dst: &mut [T], src: &[T], t: f64, parallel: bool) -> Result<()> {
    update_with(dst, src, parallel, |d, s| *d = mix(*d, s, t))
}

/// Replace each value `x` with `f(x)`.
pub fn map<T, F>(dst: &mut [T], f: F, parallel: bool)
where
    T: FieldValue,
    F: Fn(T) -> T + Sync + Send,
{
    update(dst, parallel, |d| *d = f(*d));
}

/// Inner product of two scalar buffers.
///
/// The parallel sum may differ from the sequential one in the last bits.
pub fn dot(a: &[f64], b: &[f64], parallel: bool) -> Result<f64> {
    MeshError::check_len(a.len(), b.len())?;
    Ok(if parallel {
        a.par_chunks(CHUNK_SIZE)
            .zip(b.par_chunks(CHUNK_SIZE))
            .map(|(x, y)| x.iter().zip(y).map(|(p, q)| p * q).sum::<f64>())
            .sum()
    } else {
        a.iter().zip(b).map(|(p, q)| p * q).sum()
    })
}
