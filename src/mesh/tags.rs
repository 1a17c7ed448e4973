//! Visit tags for traversal bookkeeping.
//!
//! Every element collection owns one [`Tags`] array. A search asks the array
//! for a fresh epoch with [`Tags::next_tag`] and then marks elements by
//! writing that epoch into their slot. An element counts as visited when its
//! stored tag equals the current epoch, so no visited-set has to be cleared
//! or allocated between searches.
//!
//! Tags are atomics so marking works through a shared reference while the
//! search reads adjacency from the same structure. Atomics make this memory
//! safe, not correct: two searches over the same collection at the same time
//! will corrupt each other's marks.

use std::sync::atomic::{AtomicU64, Ordering};

/// A dense array of visit tags plus the epoch counter that issues them.
#[derive(Debug, Default)]
pub struct Tags {
    counter: AtomicU64,
    tags: Vec<AtomicU64>,
}

impl Tags {
    /// Create a tag array for `len` elements.
    pub fn with_len(len: usize) -> Self {
        let mut tags = Self::default();
        tags.resize(len);
        tags
    }

    /// Number of slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether there are no slots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Issue a new epoch, strictly greater than every previously issued one.
    #[inline]
    pub fn next_tag(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// The tag currently stored for slot `index`.
    #[inline]
    pub fn get(&self, index: usize) -> u64 {
        self.tags[index].load(Ordering::Relaxed)
    }

    /// Overwrite the tag of slot `index`.
    #[inline]
    pub fn set(&self, index: usize, tag: u64) {
        self.tags[index].store(tag, Ordering::Relaxed);
    }

    /// Whether slot `index` carries `tag`.
    #[inline]
    pub fn is_marked(&self, index: usize, tag: u64) -> bool {
        self.get(index) == tag
    }

    /// Mark slot `index` with `tag`. Returns `false` if it already was.
    #[inline]
    pub fn mark(&self, index: usize, tag: u64) -> bool {
        self.tags[index].swap(tag, Ordering::Relaxed) != tag
    }

    /// Grow or shrink to `len` slots. New slots are unmarked.
    pub fn resize(&mut self, len: usize) {
        self.tags.resize_with(len, || AtomicU64::new(0));
    }

    /// Append one unmarked slot.
    pub(crate) fn push(&mut self) {
        self.tags.push(AtomicU64::new(0));
    }

    /// Forget the tag of a recycled slot.
    pub(crate) fn clear(&mut self, index: usize) {
        *self.tags[index].get_mut() = 0;
    }
}

impl Clone for Tags {
    fn clone(&self) -> Self {
        Self {
            counter: AtomicU64::new(self.counter.load(Ordering::Relaxed)),
            tags: self
                .tags
                .iter()
                .map(|t| AtomicU64::new(t.load(Ordering::Relaxed)))
                .collect(),
        }
    }
}
