//! The half-edge relationship contract shared by graphs and meshes.
//!
//! [`Topology`] gives read access to vertices and half-edges and provides all
//! queries and circulators on top of two store accessors, so one
//! implementation of every traversal serves [`HeGraph`](super::HeGraph) and
//! [`HeMesh`](super::HeMesh) alike. [`FaceTopology`] adds faces.
//!
//! # Conventions
//!
//! - `twin(h)` is the other half of `h`'s pair (index parity).
//! - `end(h) == start(twin(h))`.
//! - The outgoing half-edges of a vertex are visited by repeatedly taking
//!   `next(twin(h))`, starting at the vertex's first half-edge.
//! - A half-edge without a face borders a hole (or belongs to a graph).
//!
//! Circulators are cheap iterator values holding only the start and a cursor;
//! asking for the same circulation twice yields two independent iterators.
//! Every circulation is bounded by the half-edge slot count. A broken
//! `next`/twin chain therefore ends the iteration (with an error logged)
//! instead of spinning forever; [`Topology::vertex_degree`],
//! [`FaceTopology::face_degree`] and the validators report it as
//! [`MeshError::TopologyCorruption`].

use super::index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};
use super::store::ElementStore;
use crate::error::{MeshError, Result};

/// A vertex record: one outgoing half-edge plus the user payload.
#[derive(Debug, Clone)]
pub struct Vertex<V, I: MeshIndex = u32> {
    /// One outgoing half-edge. For boundary vertices this is a half-edge
    /// bordering a hole. Invalid while the vertex is isolated.
    pub halfedge: HalfEdgeId<I>,

    /// User payload (position, normal, ...).
    pub data: V,
}

impl<V, I: MeshIndex> Vertex<V, I> {
    /// Create an isolated vertex.
    pub fn new(data: V) -> Self {
        Self {
            halfedge: HalfEdgeId::invalid(),
            data,
        }
    }
}

/// A half-edge record. The twin is implied by index parity.
#[derive(Debug, Clone, Copy)]
pub struct HalfEdge<I: MeshIndex = u32> {
    /// The vertex this half-edge starts at.
    pub origin: VertexId<I>,

    /// The next half-edge around the face or boundary loop.
    pub next: HalfEdgeId<I>,

    /// The previous half-edge around the face or boundary loop.
    pub prev: HalfEdgeId<I>,

    /// The face this half-edge belongs to. Invalid for holes and graphs.
    pub face: FaceId<I>,
}

impl<I: MeshIndex> HalfEdge<I> {
    /// Create a new unlinked half-edge starting at `origin`.
    pub fn new(origin: VertexId<I>) -> Self {
        Self {
            origin,
            next: HalfEdgeId::invalid(),
            prev: HalfEdgeId::invalid(),
            face: FaceId::invalid(),
        }
    }

    /// Check if this half-edge borders a hole.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        !self.face.is_valid()
    }
}

/// A face record: one boundary half-edge plus the user payload.
#[derive(Debug, Clone)]
pub struct Face<F, I: MeshIndex = u32> {
    /// One half-edge on the boundary of this face.
    pub halfedge: HalfEdgeId<I>,

    /// User payload.
    pub data: F,
}

impl<F, I: MeshIndex> Face<F, I> {
    /// Create a new face with the given half-edge.
    pub fn new(halfedge: HalfEdgeId<I>, data: F) -> Self {
        Self { halfedge, data }
    }
}

/// Store of vertex records.
pub type VertexStore<V, I> = ElementStore<Vertex<V, I>, VertexId<I>>;
/// Store of half-edge records.
pub type HalfEdgeStore<I> = ElementStore<HalfEdge<I>, HalfEdgeId<I>>;
/// Store of face records.
pub type FaceStore<F, I> = ElementStore<Face<F, I>, FaceId<I>>;

/// Read access to vertex/half-edge connectivity.
pub trait Topology {
    /// Underlying integer type of all ids.
    type Index: MeshIndex;
    /// Vertex payload type.
    type Vertex;

    /// The vertex collection.
    fn vertex_store(&self) -> &VertexStore<Self::Vertex, Self::Index>;

    /// The half-edge collection.
    fn halfedge_store(&self) -> &HalfEdgeStore<Self::Index>;

    // ==================== Counts & iteration ====================

    /// Number of live vertices.
    #[inline]
    fn num_vertices(&self) -> usize {
        self.vertex_store().len()
    }

    /// Number of live half-edges.
    #[inline]
    fn num_halfedges(&self) -> usize {
        self.halfedge_store().len()
    }

    /// Number of live edges (half-edge pairs).
    #[inline]
    fn num_edges(&self) -> usize {
        self.halfedge_store().len() / 2
    }

    /// Iterate over live vertex ids.
    fn vertex_ids(&self) -> impl Iterator<Item = VertexId<Self::Index>> + '_ {
        self.vertex_store().ids()
    }

    /// Iterate over live half-edge ids.
    fn halfedge_ids(&self) -> impl Iterator<Item = HalfEdgeId<Self::Index>> + '_ {
        self.halfedge_store().ids()
    }

    /// Iterate over live edge ids.
    fn edge_ids(&self) -> impl Iterator<Item = EdgeId<Self::Index>> + '_ {
        self.halfedge_store()
            .ids()
            .filter(|he| he.is_primary())
            .map(|he| he.edge())
    }

    // ==================== Element queries ====================

    /// The payload of a vertex.
    #[inline]
    fn vertex_data(&self, v: VertexId<Self::Index>) -> &Self::Vertex {
        &self.vertex_store().get(v).data
    }

    /// The first outgoing half-edge of a vertex (invalid if isolated).
    #[inline]
    fn first(&self, v: VertexId<Self::Index>) -> HalfEdgeId<Self::Index> {
        self.vertex_store().get(v).halfedge
    }

    /// Get a half-edge record.
    #[inline]
    fn halfedge(&self, he: HalfEdgeId<Self::Index>) -> &HalfEdge<Self::Index> {
        self.halfedge_store().get(he)
    }

    /// The twin (opposite) half-edge.
    #[inline]
    fn twin(&self, he: HalfEdgeId<Self::Index>) -> HalfEdgeId<Self::Index> {
        he.twin()
    }

    /// The next half-edge around the face.
    #[inline]
    fn next(&self, he: HalfEdgeId<Self::Index>) -> HalfEdgeId<Self::Index> {
        self.halfedge(he).next
    }

    /// The previous half-edge around the face.
    #[inline]
    fn prev(&self, he: HalfEdgeId<Self::Index>) -> HalfEdgeId<Self::Index> {
        self.halfedge(he).prev
    }

    /// The start vertex of a half-edge.
    #[inline]
    fn start(&self, he: HalfEdgeId<Self::Index>) -> VertexId<Self::Index> {
        self.halfedge(he).origin
    }

    /// The end vertex of a half-edge.
    #[inline]
    fn end(&self, he: HalfEdgeId<Self::Index>) -> VertexId<Self::Index> {
        self.halfedge(he.twin()).origin
    }

    /// The face of a half-edge (invalid for holes and graph edges).
    #[inline]
    fn face_of(&self, he: HalfEdgeId<Self::Index>) -> FaceId<Self::Index> {
        self.halfedge(he).face
    }

    /// Check if a half-edge borders a hole.
    #[inline]
    fn is_boundary_halfedge(&self, he: HalfEdgeId<Self::Index>) -> bool {
        self.halfedge(he).is_boundary()
    }

    /// Check if either side of an edge borders a hole.
    #[inline]
    fn is_boundary_edge(&self, he: HalfEdgeId<Self::Index>) -> bool {
        self.is_boundary_halfedge(he) || self.is_boundary_halfedge(he.twin())
    }

    /// Check if a vertex has no incident edges.
    #[inline]
    fn is_isolated(&self, v: VertexId<Self::Index>) -> bool {
        !self.first(v).is_valid()
    }

    /// Check if a vertex touches a hole. Isolated vertices count as boundary.
    fn is_boundary_vertex(&self, v: VertexId<Self::Index>) -> bool {
        if self.is_isolated(v) {
            return true;
        }
        self.outgoing(v).any(|he| self.is_boundary_halfedge(he))
    }

    // ==================== Circulation ====================

    /// Outgoing half-edges of a vertex.
    fn outgoing(&self, v: VertexId<Self::Index>) -> Outgoing<'_, Self> {
        Outgoing::new(self, self.first(v))
    }

    /// Outgoing half-edges of a vertex, failing if the vertex is not live.
    fn try_outgoing(&self, v: VertexId<Self::Index>) -> Result<Outgoing<'_, Self>> {
        self.vertex_store().check(v)?;
        Ok(self.outgoing(v))
    }

    /// Incoming half-edges of a vertex (twins of the outgoing ones).
    fn incoming(
        &self,
        v: VertexId<Self::Index>,
    ) -> impl Iterator<Item = HalfEdgeId<Self::Index>> + '_ {
        self.outgoing(v).map(HalfEdgeId::twin)
    }

    /// Vertices connected to a vertex by an edge.
    fn connected_vertices(
        &self,
        v: VertexId<Self::Index>,
    ) -> impl Iterator<Item = VertexId<Self::Index>> + '_ {
        self.outgoing(v).map(move |he| self.end(he))
    }

    /// Half-edges reached by following `next` from `he` until it comes back.
    fn loop_from(&self, he: HalfEdgeId<Self::Index>) -> Loop<'_, Self> {
        Loop::new(self, he)
    }

    /// Number of edges at a vertex, walking with a corruption bound.
    fn vertex_degree(&self, v: VertexId<Self::Index>) -> Result<usize> {
        self.vertex_store().check(v)?;
        bounded_walk(self, self.first(v), |he| self.next(he.twin()), "vertex", v.index())
    }

    /// The half-edge from `a` to `b`, if they are connected.
    fn find_halfedge(
        &self,
        a: VertexId<Self::Index>,
        b: VertexId<Self::Index>,
    ) -> Option<HalfEdgeId<Self::Index>> {
        self.outgoing(a).find(|&he| self.end(he) == b)
    }

    /// Check invariants of vertices and half-edges.
    ///
    /// Verifies twin symmetry, `next`/`prev` reciprocity, that consecutive
    /// half-edges meet at a vertex and share a face, and that every live
    /// vertex's first half-edge is live and leaves that vertex. Loops are
    /// walked with a bound so corrupted chains are reported, not followed.
    fn validate_connectivity(&self) -> Result<()> {
        let vertices = self.vertex_store();
        let halfedges = self.halfedge_store();

        for (he, rec) in halfedges.iter() {
            let i = he.index();
            if halfedges.is_unused(he.twin()) {
                return Err(MeshError::corrupt("half-edge", i, "twin is removed"));
            }
            if he.twin().twin() != he {
                return Err(MeshError::corrupt("half-edge", i, "twin is not symmetric"));
            }
            if vertices.is_unused(rec.origin) {
                return Err(MeshError::corrupt("half-edge", i, "start vertex is removed"));
            }
            if halfedges.is_unused(rec.next) || halfedges.is_unused(rec.prev) {
                return Err(MeshError::corrupt("half-edge", i, "next or prev is removed"));
            }
            if self.prev(rec.next) != he || self.next(rec.prev) != he {
                return Err(MeshError::corrupt("half-edge", i, "next/prev not reciprocal"));
            }
            if self.start(rec.next) != self.end(he) {
                return Err(MeshError::corrupt("half-edge", i, "next does not start at end"));
            }
            if self.face_of(rec.next) != rec.face {
                return Err(MeshError::corrupt("half-edge", i, "next has a different face"));
            }
        }

        for (v, rec) in vertices.iter() {
            if !rec.halfedge.is_valid() {
                continue;
            }
            if halfedges.is_unused(rec.halfedge) {
                return Err(MeshError::corrupt("vertex", v.index(), "first half-edge is removed"));
            }
            if self.start(rec.halfedge) != v {
                return Err(MeshError::corrupt(
                    "vertex",
                    v.index(),
                    "first half-edge does not leave the vertex",
                ));
            }
            self.vertex_degree(v)?;
        }

        Ok(())
    }
}

/// Read access to faces on top of [`Topology`].
pub trait FaceTopology: Topology {
    /// Face payload type.
    type Face;

    /// The face collection.
    fn face_store(&self) -> &FaceStore<Self::Face, Self::Index>;

    /// Number of live faces.
    #[inline]
    fn num_faces(&self) -> usize {
        self.face_store().len()
    }

    /// Iterate over live face ids.
    fn face_ids(&self) -> impl Iterator<Item = FaceId<Self::Index>> + '_ {
        self.face_store().ids()
    }

    /// The payload of a face.
    #[inline]
    fn face_data(&self, f: FaceId<Self::Index>) -> &Self::Face {
        &self.face_store().get(f).data
    }

    /// The first half-edge of a face.
    #[inline]
    fn face_first(&self, f: FaceId<Self::Index>) -> HalfEdgeId<Self::Index> {
        self.face_store().get(f).halfedge
    }

    /// Half-edges around a face.
    fn face_halfedges(&self, f: FaceId<Self::Index>) -> Loop<'_, Self> {
        Loop::new(self, self.face_first(f))
    }

    /// Half-edges around a face, failing if the face is not live.
    fn try_face_halfedges(&self, f: FaceId<Self::Index>) -> Result<Loop<'_, Self>> {
        self.face_store().check(f)?;
        Ok(self.face_halfedges(f))
    }

    /// Vertices of a face in loop order.
    fn face_vertices(
        &self,
        f: FaceId<Self::Index>,
    ) -> impl Iterator<Item = VertexId<Self::Index>> + '_ {
        self.face_halfedges(f).map(move |he| self.start(he))
    }

    /// Faces sharing an edge with `f`, skipping holes.
    fn adjacent_faces(
        &self,
        f: FaceId<Self::Index>,
    ) -> impl Iterator<Item = FaceId<Self::Index>> + '_ {
        self.face_halfedges(f)
            .map(move |he| self.face_of(he.twin()))
            .filter(|g| g.is_valid())
    }

    /// Faces around a vertex, skipping holes.
    fn vertex_faces(
        &self,
        v: VertexId<Self::Index>,
    ) -> impl Iterator<Item = FaceId<Self::Index>> + '_ {
        self.outgoing(v)
            .map(move |he| self.face_of(he))
            .filter(|f| f.is_valid())
    }

    /// Number of sides of a face, walking with a corruption bound.
    fn face_degree(&self, f: FaceId<Self::Index>) -> Result<usize> {
        self.face_store().check(f)?;
        bounded_walk(self, self.face_first(f), |he| self.next(he), "face", f.index())
    }

    /// Check if any edge of the face borders a hole.
    fn is_boundary_face(&self, f: FaceId<Self::Index>) -> bool {
        self.face_halfedges(f)
            .any(|he| self.is_boundary_halfedge(he.twin()))
    }

    /// The three vertices of a triangular face.
    fn face_triangle(&self, f: FaceId<Self::Index>) -> [VertexId<Self::Index>; 3] {
        let he0 = self.face_first(f);
        let he1 = self.next(he0);
        let he2 = self.next(he1);
        [self.start(he0), self.start(he1), self.start(he2)]
    }

    /// Check that every live face's loop is closed and labelled with it.
    fn validate_faces(&self) -> Result<()> {
        let faces = self.face_store();
        let halfedges = self.halfedge_store();

        for (f, rec) in faces.iter() {
            if halfedges.is_unused(rec.halfedge) {
                return Err(MeshError::corrupt("face", f.index(), "first half-edge is removed"));
            }
            let degree = self.face_degree(f)?;
            if degree < 3 {
                return Err(MeshError::corrupt("face", f.index(), "fewer than three sides"));
            }
            if self.face_halfedges(f).any(|he| self.face_of(he) != f) {
                return Err(MeshError::corrupt("face", f.index(), "loop crosses into another face"));
            }
            // Walking back with prev must close after the same number of steps.
            let first = rec.halfedge;
            let mut he = first;
            for _ in 0..degree {
                he = self.prev(he);
            }
            if he != first {
                return Err(MeshError::corrupt("face", f.index(), "prev loop does not close"));
            }
        }

        for (he, rec) in halfedges.iter() {
            if rec.face.is_valid() && faces.is_unused(rec.face) {
                return Err(MeshError::corrupt("half-edge", he.index(), "face is removed"));
            }
        }

        Ok(())
    }
}

/// Walk `step` from `start` until it returns, counting steps. Fails once the
/// walk exceeds the number of half-edge slots.
fn bounded_walk<T, S>(
    topo: &T,
    start: HalfEdgeId<T::Index>,
    mut step: S,
    kind: &'static str,
    index: usize,
) -> Result<usize>
where
    T: Topology + ?Sized,
    S: FnMut(HalfEdgeId<T::Index>) -> HalfEdgeId<T::Index>,
{
    if !start.is_valid() {
        return Ok(0);
    }
    let bound = topo.halfedge_store().capacity();
    let mut he = start;
    let mut count = 0;
    loop {
        if !he.is_valid() || he.index() >= bound {
            return Err(MeshError::corrupt(kind, index, "loop leaves the half-edge store"));
        }
        count += 1;
        if count > bound {
            return Err(MeshError::corrupt(kind, index, "loop does not close"));
        }
        he = step(he);
        if he == start {
            return Ok(count);
        }
    }
}

/// Iterator over the outgoing half-edges of a vertex.
pub struct Outgoing<'a, T: Topology + ?Sized> {
    topo: &'a T,
    start: HalfEdgeId<T::Index>,
    current: Option<HalfEdgeId<T::Index>>,
    remaining: usize,
}

impl<'a, T: Topology + ?Sized> Outgoing<'a, T> {
    fn new(topo: &'a T, start: HalfEdgeId<T::Index>) -> Self {
        Self {
            topo,
            start,
            current: start.is_valid().then_some(start),
            remaining: topo.halfedge_store().capacity(),
        }
    }
}

impl<'a, T: Topology + ?Sized> Clone for Outgoing<'a, T> {
    fn clone(&self) -> Self {
        Self {
            topo: self.topo,
            start: self.start,
            current: self.current,
            remaining: self.remaining,
        }
    }
}

impl<'a, T: Topology + ?Sized> Iterator for Outgoing<'a, T> {
    type Item = HalfEdgeId<T::Index>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.current?;

        // If he goes v -> w, twin(he) goes w -> v and the half-edge after it
        // leaves v again: the next outgoing half-edge.
        let next = self.topo.next(result.twin());
        self.remaining = self.remaining.saturating_sub(1);
        self.current = if next == self.start {
            None
        } else if self.remaining == 0 || !next.is_valid() {
            log::error!(
                "vertex circulation from {:?} does not close; topology is corrupt",
                self.start
            );
            None
        } else {
            Some(next)
        };

        Some(result)
    }
}

/// Iterator following `next` around a face or boundary loop.
pub struct Loop<'a, T: Topology + ?Sized> {
    topo: &'a T,
    start: HalfEdgeId<T::Index>,
    current: Option<HalfEdgeId<T::Index>>,
    remaining: usize,
}

impl<'a, T: Topology + ?Sized> Loop<'a, T> {
    fn new(topo: &'a T, start: HalfEdgeId<T::Index>) -> Self {
        Self {
            topo,
            start,
            current: start.is_valid().then_some(start),
            remaining: topo.halfedge_store().capacity(),
        }
    }
}

impl<'a, T: Topology + ?Sized> Clone for Loop<'a, T> {
    fn clone(&self) -> Self {
        Self {
            topo: self.topo,
            start: self.start,
            current: self.current,
            remaining: self.remaining,
        }
    }
}

impl<'a, T: Topology + ?Sized> Iterator for Loop<'a, T> {
    type Item = HalfEdgeId<T::Index>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.current?;

        let next = self.topo.next(result);
        self.remaining = self.remaining.saturating_sub(1);
        self.current = if next == self.start {
            None
        } else if self.remaining == 0 || !next.is_valid() {
            log::error!(
                "loop from {:?} does not close; topology is corrupt",
                self.start
            );
            None
        } else {
            Some(next)
        };

        Some(result)
    }
}
