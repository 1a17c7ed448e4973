//! Per-element values kept outside the topology.
//!
//! Algorithms that need extra data per vertex, edge or face (weights,
//! distances, depths) read and write it through [`PropertyRead`] and
//! [`Property`], keyed by element id. Dense slices and vectors index by the
//! id's slot, hash maps by the id itself, and [`FnProperty`] wraps a closure
//! for values computed on demand.

use std::collections::HashMap;
use std::hash::Hash;

use super::index::ElementId;

/// Read a value for an element.
pub trait PropertyRead<K, T> {
    /// The value of `key`.
    fn get(&self, key: K) -> T;
}

/// Read and write a value for an element.
pub trait Property<K, T>: PropertyRead<K, T> {
    /// Overwrite the value of `key`.
    fn set(&mut self, key: K, value: T);
}

impl<K: ElementId, T: Copy> PropertyRead<K, T> for [T] {
    #[inline]
    fn get(&self, key: K) -> T {
        self[key.index()]
    }
}

impl<K: ElementId, T: Copy> Property<K, T> for [T] {
    #[inline]
    fn set(&mut self, key: K, value: T) {
        self[key.index()] = value;
    }
}

impl<K: ElementId, T: Copy> PropertyRead<K, T> for Vec<T> {
    #[inline]
    fn get(&self, key: K) -> T {
        self[key.index()]
    }
}

impl<K: ElementId, T: Copy> Property<K, T> for Vec<T> {
    #[inline]
    fn set(&mut self, key: K, value: T) {
        self[key.index()] = value;
    }
}

/// Missing keys read as `T::default()`.
impl<K: Eq + Hash, T: Copy + Default> PropertyRead<K, T> for HashMap<K, T> {
    fn get(&self, key: K) -> T {
        HashMap::get(self, &key).copied().unwrap_or_default()
    }
}

impl<K: Eq + Hash, T: Copy + Default> Property<K, T> for HashMap<K, T> {
    fn set(&mut self, key: K, value: T) {
        self.insert(key, value);
    }
}

/// A read-only property computed by a closure.
#[derive(Debug, Clone, Copy)]
pub struct FnProperty<F>(pub F);

impl<K, T, F: Fn(K) -> T> PropertyRead<K, T> for FnProperty<F> {
    #[inline]
    fn get(&self, key: K) -> T {
        (self.0)(key)
    }
}

impl<K, T, P: PropertyRead<K, T> + ?Sized> PropertyRead<K, T> for &P {
    #[inline]
    fn get(&self, key: K) -> T {
        (**self).get(key)
    }
}

impl<K, T, P: PropertyRead<K, T> + ?Sized> PropertyRead<K, T> for &mut P {
    #[inline]
    fn get(&self, key: K) -> T {
        (**self).get(key)
    }
}

impl<K, T, P: Property<K, T> + ?Sized> Property<K, T> for &mut P {
    #[inline]
    fn set(&mut self, key: K, value: T) {
        (**self).set(key, value)
    }
}
