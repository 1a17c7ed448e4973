//! Element storage with soft deletion and slot reuse.
//!
//! An [`ElementStore`] is an arena of records addressed by typed ids. Removing
//! an element only sets its removed bit and puts the slot on a free list, so
//! ids held by an in-progress algorithm (queued nodes, tags, property
//! buffers) stay meaningful. The next insertion recycles the most recently
//! freed slot. [`ElementStore::compact`] squeezes tombstones out and is the
//! only operation that moves live elements.
//!
//! Half-edge stores allocate and free in twin pairs through
//! [`ElementStore::insert_pair`] and [`ElementStore::remove_pair`]; a store
//! is used either singly or pairwise, never both.
//!
//! Ids are plain indices, so [`ElementStore::owns`] can only tell whether an
//! id is in range; an id taken from another mesh of equal or larger size
//! passes. Every store also carries an owner token, drawn from a process-wide
//! counter when the store is created, cloned or compacted. A [`Handle`]
//! issued by [`ElementStore::handle`] remembers that token, and
//! [`ElementStore::resolve`] rejects handles from any other store.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, Ordering};

use rayon::prelude::*;

use super::index::ElementId;
use super::tags::Tags;
use crate::error::{MeshError, Result};

static NEXT_OWNER: AtomicU32 = AtomicU32::new(1);

fn fresh_owner() -> u32 {
    NEXT_OWNER.fetch_add(1, Ordering::Relaxed)
}

/// An element id stamped with the owner token of the store that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle<K> {
    owner: u32,
    id: K,
}

impl<K: Copy> Handle<K> {
    /// The bare id, without any ownership check.
    pub fn id(&self) -> K {
        self.id
    }

    /// Token of the issuing store.
    pub fn owner(&self) -> u32 {
        self.owner
    }
}

/// Arena of records of type `T` addressed by ids of type `K`.
#[derive(Debug)]
pub struct ElementStore<T, K> {
    owner: u32,
    records: Vec<T>,
    removed: Vec<bool>,
    free: Vec<usize>,
    tags: Tags,
    live: usize,
    _marker: PhantomData<fn() -> K>,
}

impl<T: Clone, K> Clone for ElementStore<T, K> {
    fn clone(&self) -> Self {
        Self {
            owner: fresh_owner(),
            records: self.records.clone(),
            removed: self.removed.clone(),
            free: self.free.clone(),
            tags: self.tags.clone(),
            live: self.live,
            _marker: PhantomData,
        }
    }
}

impl<T, K: ElementId> Default for ElementStore<T, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, K: ElementId> ElementStore<T, K> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty store with room for `capacity` records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            owner: fresh_owner(),
            records: Vec::with_capacity(capacity),
            removed: Vec::with_capacity(capacity),
            free: Vec::new(),
            tags: Tags::default(),
            live: 0,
            _marker: PhantomData,
        }
    }

    /// Number of live elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether there are no live elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of slots, live or tombstoned. Ids are always below this.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.records.len()
    }

    /// Number of tombstoned slots.
    #[inline]
    pub fn num_removed(&self) -> usize {
        self.records.len() - self.live
    }

    /// Whether `id` is out of range or tombstoned.
    #[inline]
    pub fn is_unused(&self, id: K) -> bool {
        self.removed.get(id.index()).copied().unwrap_or(true)
    }

    /// Owner token of this store. No two live stores share one.
    #[inline]
    pub fn owner(&self) -> u32 {
        self.owner
    }

    /// Stamp `id` with this store's owner token.
    #[inline]
    pub fn handle(&self, id: K) -> Handle<K> {
        Handle {
            owner: self.owner,
            id,
        }
    }

    /// Unwrap a handle, failing if another store issued it or if it is out
    /// of range.
    pub fn resolve(&self, handle: Handle<K>) -> Result<K> {
        if handle.owner != self.owner {
            return Err(MeshError::WrongOwner {
                kind: K::KIND,
                index: handle.id.index(),
                issuer: handle.owner,
                owner: self.owner,
            });
        }
        self.owns(handle.id)?;
        Ok(handle.id)
    }

    /// Fail unless `id` addresses a slot of this store.
    ///
    /// This is a range check; use [`ElementStore::resolve`] to catch ids
    /// from another store.
    pub fn owns(&self, id: K) -> Result<()> {
        if id.index() < self.records.len() {
            Ok(())
        } else {
            Err(MeshError::ForeignElement {
                kind: K::KIND,
                index: id.index(),
                capacity: self.records.len(),
            })
        }
    }

    /// Fail unless `id` addresses a live element of this store.
    pub fn check(&self, id: K) -> Result<()> {
        self.owns(id)?;
        if self.removed[id.index()] {
            return Err(MeshError::RemovedElement {
                kind: K::KIND,
                index: id.index(),
            });
        }
        Ok(())
    }

    /// Get a record. Removed slots are still readable.
    #[inline]
    pub fn get(&self, id: K) -> &T {
        &self.records[id.index()]
    }

    /// Get a mutable record.
    #[inline]
    pub fn get_mut(&mut self, id: K) -> &mut T {
        &mut self.records[id.index()]
    }

    /// The visit tags of this collection.
    #[inline]
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Issue a fresh visit tag for this collection.
    #[inline]
    pub fn next_tag(&self) -> u64 {
        self.tags.next_tag()
    }

    /// Iterate over live ids in index order.
    pub fn ids(&self) -> impl Iterator<Item = K> + '_ {
        self.removed
            .iter()
            .enumerate()
            .filter(|&(_, &removed)| !removed)
            .map(|(i, _)| K::from_index(i))
    }

    /// Iterate over live records with their ids in index order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &T)> + '_ {
        self.records
            .iter()
            .zip(&self.removed)
            .enumerate()
            .filter(|&(_, (_, &removed))| !removed)
            .map(|(i, (record, _))| (K::from_index(i), record))
    }

    /// Insert a record, recycling a free slot if there is one.
    pub fn insert(&mut self, record: T) -> K {
        self.live += 1;
        match self.free.pop() {
            Some(slot) => {
                self.records[slot] = record;
                self.removed[slot] = false;
                self.tags.clear(slot);
                K::from_index(slot)
            }
            None => {
                self.records.push(record);
                self.removed.push(false);
                self.tags.push();
                K::from_index(self.records.len() - 1)
            }
        }
    }

    /// Insert two records into an adjacent even/odd slot pair and return the
    /// id of the even one.
    pub fn insert_pair(&mut self, first: T, second: T) -> K {
        self.live += 2;
        match self.free.pop() {
            Some(slot) => {
                debug_assert!(slot % 2 == 0, "pair store freed an odd slot");
                self.records[slot] = first;
                self.records[slot + 1] = second;
                self.removed[slot] = false;
                self.removed[slot + 1] = false;
                self.tags.clear(slot);
                self.tags.clear(slot + 1);
                K::from_index(slot)
            }
            None => {
                debug_assert!(self.records.len() % 2 == 0);
                let slot = self.records.len();
                self.records.push(first);
                self.records.push(second);
                self.removed.extend([false, false]);
                self.tags.push();
                self.tags.push();
                K::from_index(slot)
            }
        }
    }

    /// Tombstone a single element. Removing twice is a no-op.
    pub fn remove(&mut self, id: K) {
        let slot = id.index();
        if !self.removed[slot] {
            self.removed[slot] = true;
            self.live -= 1;
            self.free.push(slot);
        }
    }

    /// Tombstone the pair containing `id`. Removing twice is a no-op.
    pub fn remove_pair(&mut self, id: K) {
        let slot = id.index() & !1;
        if !self.removed[slot] {
            self.removed[slot] = true;
            self.removed[slot + 1] = true;
            self.live -= 2;
            self.free.push(slot);
        }
    }

    /// Apply `f` to every live record, optionally across the rayon pool.
    ///
    /// Records are disjoint so the parallel pass needs no synchronization.
    pub fn for_each_mut<F>(&mut self, parallel: bool, f: F)
    where
        T: Send,
        F: Fn(K, &mut T) + Sync + Send,
    {
        let removed = &self.removed;
        if parallel {
            self.records
                .par_iter_mut()
                .enumerate()
                .filter(|(i, _)| !removed[*i])
                .for_each(|(i, record)| f(K::from_index(i), record));
        } else {
            for (i, record) in self.records.iter_mut().enumerate() {
                if !removed[i] {
                    f(K::from_index(i), record);
                }
            }
        }
    }

    /// All slots, live or not, for passes that rewrite stored references.
    pub(crate) fn records_mut(&mut self) -> &mut [T] {
        &mut self.records
    }

    /// Drop tombstones, moving live records down while keeping their order.
    ///
    /// Returns a map from old slot to new id (`None` for removed slots).
    /// Because pairs are always removed together and order is preserved, a
    /// pair store stays pair aligned.
    pub fn compact(&mut self) -> Vec<Option<K>> {
        let mut map = Vec::with_capacity(self.records.len());
        let mut next = 0;
        for &removed in &self.removed {
            if removed {
                map.push(None);
            } else {
                map.push(Some(K::from_index(next)));
                next += 1;
            }
        }

        let mut slot = 0;
        let removed = std::mem::take(&mut self.removed);
        self.records.retain(|_| {
            let keep = !removed[slot];
            slot += 1;
            keep
        });

        self.removed = vec![false; self.records.len()];
        self.free.clear();
        self.tags.resize(0);
        self.tags.resize(self.records.len());
        self.live = self.records.len();
        // Handles issued before compaction address moved slots.
        self.owner = fresh_owner();
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::index::{HalfEdgeId, VertexId};

    #[test]
    fn test_insert_and_remove() {
        let mut store: ElementStore<char, VertexId> = ElementStore::new();
        let a = store.insert('a');
        let b = store.insert('b');
        let c = store.insert('c');
        assert_eq!(store.len(), 3);

        store.remove(b);
        assert_eq!(store.len(), 2);
        assert_eq!(store.capacity(), 3);
        assert!(store.is_unused(b));
        assert!(!store.is_unused(a));
        assert_eq!(store.ids().collect::<Vec<_>>(), vec![a, c]);
    }

    #[test]
    fn test_removal_filtering_is_stable() {
        let mut store: ElementStore<u8, VertexId> = ElementStore::new();
        for i in 0..5 {
            store.insert(i);
        }
        store.remove(VertexId::new(2));
        store.remove(VertexId::new(2));
        let first: Vec<_> = store.ids().collect();
        let second: Vec<_> = store.ids().collect();
        assert_eq!(first, second);
        assert!(!first.contains(&VertexId::new(2)));
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_slot_reuse() {
        let mut store: ElementStore<u8, VertexId> = ElementStore::new();
        store.insert(0);
        let b = store.insert(1);
        store.insert(2);
        store.remove(b);
        let d = store.insert(9);
        assert_eq!(d, b);
        assert_eq!(*store.get(d), 9);
        assert_eq!(store.capacity(), 3);
    }

    #[test]
    fn test_pairs() {
        let mut store: ElementStore<u8, HalfEdgeId> = ElementStore::new();
        let p = store.insert_pair(0, 1);
        let q = store.insert_pair(2, 3);
        assert_eq!(p.index(), 0);
        assert_eq!(q.index(), 2);

        store.remove_pair(q.twin());
        assert_eq!(store.len(), 2);
        let r = store.insert_pair(7, 8);
        assert_eq!(r, q);
        assert_eq!(*store.get(r.twin()), 8);
    }

    #[test]
    fn test_ownership_and_removed_checks() {
        let mut store: ElementStore<u8, VertexId> = ElementStore::new();
        let a = store.insert(1);
        assert!(store.check(a).is_ok());
        assert!(matches!(
            store.owns(VertexId::new(10)),
            Err(MeshError::ForeignElement { index: 10, .. })
        ));
        store.remove(a);
        assert!(matches!(
            store.check(a),
            Err(MeshError::RemovedElement { index: 0, .. })
        ));
    }

    #[test]
    fn test_handles_do_not_cross_meshes() {
        use crate::mesh::{build_from_triangles, HeMesh, Topology};
        use nalgebra::Point3;

        let positions = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let a: HeMesh = build_from_triangles(&positions, &[[0, 1, 2]]).unwrap();
        let b: HeMesh = build_from_triangles(&positions, &[[0, 2, 1]]).unwrap();
        assert_ne!(a.vertex_store().owner(), b.vertex_store().owner());

        let v = VertexId::new(1);
        // The bare id is in range for both meshes.
        assert!(b.vertex_store().owns(v).is_ok());

        let h = a.vertex_store().handle(v);
        assert_eq!(a.vertex_store().resolve(h), Ok(v));
        assert!(matches!(
            b.vertex_store().resolve(h),
            Err(MeshError::WrongOwner { index: 1, .. })
        ));

        let copy = a.clone();
        assert!(copy.vertex_store().resolve(h).is_err());
        assert_eq!(copy.vertex_store().resolve(copy.vertex_store().handle(v)), Ok(v));
    }

    #[test]
    fn test_compaction_retires_handles() {
        let mut store: ElementStore<u8, VertexId> = ElementStore::new();
        let a = store.insert(0);
        let b = store.insert(1);
        let stale = store.handle(b);
        store.remove(a);
        store.compact();
        assert!(matches!(store.resolve(stale), Err(MeshError::WrongOwner { .. })));
        // Range checks still apply to fresh handles.
        assert!(matches!(
            store.resolve(store.handle(VertexId::new(5))),
            Err(MeshError::ForeignElement { index: 5, .. })
        ));
    }

    #[test]
    fn test_compact() {
        let mut store: ElementStore<u8, HalfEdgeId> = ElementStore::new();
        store.insert_pair(0, 1);
        let dead = store.insert_pair(2, 3);
        store.insert_pair(4, 5);
        store.remove_pair(dead);

        let map = store.compact();
        assert_eq!(store.capacity(), 4);
        assert_eq!(map[2], None);
        assert_eq!(map[4], Some(HalfEdgeId::new(2)));
        assert_eq!(*store.get(HalfEdgeId::new(3)), 5);
        assert_eq!(store.tags().len(), 4);
    }

    #[test]
    fn test_for_each_mut_skips_removed() {
        for parallel in [false, true] {
            let mut store: ElementStore<usize, VertexId> = ElementStore::new();
            for _ in 0..100 {
                store.insert(0);
            }
            store.remove(VertexId::new(5));
            store.for_each_mut(parallel, |id, value| *value = id.index() + 1);
            assert_eq!(*store.get(VertexId::new(4)), 5);
            assert_eq!(*store.get(VertexId::new(5)), 0);
            assert_eq!(*store.get(VertexId::new(99)), 100);
        }
    }

    #[test]
    fn test_recycled_slot_tag_is_cleared() {
        let mut store: ElementStore<u8, VertexId> = ElementStore::new();
        let a = store.insert(0);
        let t = store.next_tag();
        store.tags().mark(a.index(), t);
        store.remove(a);
        let b = store.insert(1);
        assert_eq!(a, b);
        assert!(!store.tags().is_marked(b.index(), t));
    }
}
