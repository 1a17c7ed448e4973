//! Index types for topology elements.
//!
//! Type-safe index wrappers for vertices, half-edges, edges and faces. The
//! indices are generic over the underlying integer type so small structures
//! can use `u16` and very large ones `u64`.
//!
//! Half-edges are always allocated in pairs: half-edges `2k` and `2k + 1` are
//! twins and together form [`EdgeId`] `k`. Twin lookup is therefore a bit
//! flip and never needs storage.

use std::fmt::{self, Debug};
use std::hash::Hash;

/// Trait for types that can be used as element indices.
///
/// Implemented for `u16`, `u32` and `u64`.
pub trait MeshIndex:
    Copy + Clone + Eq + PartialEq + Ord + PartialOrd + Hash + Debug + Send + Sync + 'static
{
    /// The maximum valid index value.
    const MAX: Self;

    /// A sentinel value representing an invalid/null index.
    const INVALID: Self;

    /// Convert from usize to this index type.
    ///
    /// # Panics
    /// Panics in debug builds if the value is too large for this index type.
    fn from_usize(v: usize) -> Self;

    /// Convert to usize.
    fn to_usize(self) -> usize;

    /// Check if this is a valid (non-sentinel) index.
    fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

macro_rules! impl_mesh_index {
    ($ty:ty) => {
        impl MeshIndex for $ty {
            const MAX: Self = <$ty>::MAX - 1;
            const INVALID: Self = <$ty>::MAX;

            #[inline]
            fn from_usize(v: usize) -> Self {
                debug_assert!(
                    v <= Self::MAX as usize,
                    "index {} too large for {}",
                    v,
                    stringify!($ty)
                );
                v as $ty
            }

            #[inline]
            fn to_usize(self) -> usize {
                self as usize
            }
        }
    };
}

impl_mesh_index!(u16);
impl_mesh_index!(u32);
impl_mesh_index!(u64);

/// Anything that can be used as a node in a search or as a property key:
/// a copyable handle that maps to a dense slot index.
pub trait ElementId: Copy + Eq + Hash + Debug {
    /// Human readable element kind, used in error messages.
    const KIND: &'static str;

    /// The dense slot index of this element.
    fn index(self) -> usize;

    /// Build a handle from a dense slot index.
    fn from_index(index: usize) -> Self;
}

impl ElementId for usize {
    const KIND: &'static str = "node";

    #[inline]
    fn index(self) -> usize {
        self
    }

    #[inline]
    fn from_index(index: usize) -> Self {
        index
    }
}

/// A type-safe vertex index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct VertexId<I: MeshIndex = u32>(I);

/// A type-safe half-edge index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct HalfEdgeId<I: MeshIndex = u32>(I);

/// A type-safe face index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct FaceId<I: MeshIndex = u32>(I);

/// A type-safe edge index (a twin pair of half-edges).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct EdgeId<I: MeshIndex = u32>(I);

macro_rules! impl_index_type {
    ($name:ident, $display:literal, $kind:literal) => {
        impl<I: MeshIndex> $name<I> {
            /// Create a new index from a raw value.
            #[inline]
            pub fn new(index: usize) -> Self {
                Self(I::from_usize(index))
            }

            /// Create an invalid/null index.
            #[inline]
            pub fn invalid() -> Self {
                Self(I::INVALID)
            }

            /// Get the raw index value.
            #[inline]
            pub fn index(self) -> usize {
                self.0.to_usize()
            }

            /// Get the raw value of the underlying type.
            #[inline]
            pub fn raw(self) -> I {
                self.0
            }

            /// Check if this is a valid (non-null) index.
            #[inline]
            pub fn is_valid(self) -> bool {
                self.0.is_valid()
            }
        }

        impl<I: MeshIndex> ElementId for $name<I> {
            const KIND: &'static str = $kind;

            #[inline]
            fn index(self) -> usize {
                self.0.to_usize()
            }

            #[inline]
            fn from_index(index: usize) -> Self {
                Self::new(index)
            }
        }

        impl<I: MeshIndex> Debug for $name<I> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", $display, self.index())
                } else {
                    write!(f, "{}(INVALID)", $display)
                }
            }
        }

        impl<I: MeshIndex> Default for $name<I> {
            fn default() -> Self {
                Self::invalid()
            }
        }

        impl<I: MeshIndex> From<usize> for $name<I> {
            fn from(v: usize) -> Self {
                Self::new(v)
            }
        }
    };
}

impl_index_type!(VertexId, "V", "vertex");
impl_index_type!(HalfEdgeId, "HE", "half-edge");
impl_index_type!(FaceId, "F", "face");
impl_index_type!(EdgeId, "E", "edge");

impl<I: MeshIndex> HalfEdgeId<I> {
    /// The oppositely directed half-edge of the same edge.
    #[inline]
    pub fn twin(self) -> Self {
        Self::new(self.index() ^ 1)
    }

    /// The undirected edge this half-edge belongs to.
    #[inline]
    pub fn edge(self) -> EdgeId<I> {
        EdgeId::new(self.index() >> 1)
    }

    /// Whether this is the even (first allocated) half of its pair.
    #[inline]
    pub fn is_primary(self) -> bool {
        self.index() & 1 == 0
    }
}

impl<I: MeshIndex> EdgeId<I> {
    /// The even half-edge of this edge.
    #[inline]
    pub fn halfedge(self) -> HalfEdgeId<I> {
        HalfEdgeId::new(self.index() << 1)
    }

    /// Both half-edges of this edge, even one first.
    #[inline]
    pub fn halfedges(self) -> [HalfEdgeId<I>; 2] {
        let he = self.halfedge();
        [he, he.twin()]
    }
}
