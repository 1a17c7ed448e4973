//! Half-edge mesh data structure.
//!
//! This module provides a half-edge (doubly-connected edge list) representation
//! for polygon meshes. Faces may have any number of sides; holes are the
//! loops of half-edges without a face.
//!
//! # Structure
//!
//! - Each edge is split into two **half-edges** stored in one even/odd slot
//!   pair, so the **twin** of a half-edge is found from its index
//! - Each half-edge knows its **next** and **prev** half-edge around its face
//!   or hole, its **origin vertex**, and its **face**
//! - Each vertex stores one outgoing half-edge
//! - Each face stores one half-edge on its boundary
//!
//! # Boundary Handling
//!
//! Boundary half-edges (on mesh boundaries) have an invalid face ID. Their twins
//! are the interior half-edges. Boundary loops can be traversed using the `next`
//! pointer on boundary half-edges. The first half-edge of a boundary vertex is
//! kept on the boundary by every edit.

use nalgebra::Point3;

use super::edit::{self, Remapping};
use super::index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};
use super::topology::{
    Face, FaceStore, FaceTopology, HalfEdge, HalfEdgeStore, Topology, Vertex, VertexStore,
};
use crate::error::{MeshError, Result};

/// How [`HeMesh::triangulate`] cuts polygons into triangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriangulationStrategy {
    /// All diagonals share the face's first vertex.
    #[default]
    Fan,
    /// Diagonals alternate between the two ends of the polygon, giving a
    /// zig-zag strip with fewer sliver triangles on long quads and n-gons.
    Strip,
}

/// Options for [`HeMesh::triangulate`].
#[derive(Debug, Clone, Default)]
pub struct TriangulateOptions {
    /// How polygons are cut (default: fan).
    pub strategy: TriangulationStrategy,
}

impl TriangulateOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the triangulation strategy.
    pub fn with_strategy(mut self, strategy: TriangulationStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// A half-edge mesh.
///
/// The mesh is generic over:
/// - `V`: the vertex payload, a position by default
/// - `F`: the face payload, nothing by default
/// - `I`: the index type, `u32` by default
///
/// Read access goes through the [`Topology`] and [`FaceTopology`] traits.
#[derive(Debug, Clone)]
pub struct HeMesh<V = Point3<f64>, F = (), I: MeshIndex = u32> {
    pub(crate) vertices: VertexStore<V, I>,
    pub(crate) halfedges: HalfEdgeStore<I>,
    pub(crate) faces: FaceStore<F, I>,
}

impl<V, F, I: MeshIndex> Default for HeMesh<V, F, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, F, I: MeshIndex> Topology for HeMesh<V, F, I> {
    type Index = I;
    type Vertex = V;

    #[inline]
    fn vertex_store(&self) -> &VertexStore<V, I> {
        &self.vertices
    }

    #[inline]
    fn halfedge_store(&self) -> &HalfEdgeStore<I> {
        &self.halfedges
    }
}

impl<V, F, I: MeshIndex> FaceTopology for HeMesh<V, F, I> {
    type Face = F;

    #[inline]
    fn face_store(&self) -> &FaceStore<F, I> {
        &self.faces
    }
}

impl<V, F, I: MeshIndex> HeMesh<V, F, I> {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: VertexStore::new(),
            halfedges: HalfEdgeStore::new(),
            faces: FaceStore::new(),
        }
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(num_vertices: usize, num_faces: usize) -> Self {
        // Estimate: each face has ~3 half-edges, and half-edges come in pairs
        Self {
            vertices: VertexStore::with_capacity(num_vertices),
            halfedges: HalfEdgeStore::with_capacity(num_faces * 3 + num_vertices),
            faces: FaceStore::with_capacity(num_faces),
        }
    }

    // ==================== Payload access ====================

    /// Mutable access to a vertex payload.
    #[inline]
    pub fn vertex_data_mut(&mut self, v: VertexId<I>) -> &mut V {
        &mut self.vertices.get_mut(v).data
    }

    /// Mutable access to a face payload.
    #[inline]
    pub fn face_data_mut(&mut self, f: FaceId<I>) -> &mut F {
        &mut self.faces.get_mut(f).data
    }

    /// Apply `f` to every live vertex payload.
    pub fn for_each_vertex_mut<G>(&mut self, parallel: bool, f: G)
    where
        V: Send,
        G: Fn(VertexId<I>, &mut V) + Sync + Send,
    {
        self.vertices
            .for_each_mut(parallel, |v, rec| f(v, &mut rec.data));
    }

    /// Apply `f` to every live face payload.
    pub fn for_each_face_mut<G>(&mut self, parallel: bool, f: G)
    where
        F: Send,
        G: Fn(FaceId<I>, &mut F) + Sync + Send,
    {
        self.faces.for_each_mut(parallel, |id, rec| f(id, &mut rec.data));
    }

    // ==================== Global queries ====================

    /// Euler characteristic `V - E + F` over live elements.
    pub fn euler_characteristic(&self) -> i64 {
        self.num_vertices() as i64 - self.num_edges() as i64 + self.num_faces() as i64
    }

    /// One half-edge from each hole loop.
    ///
    /// Marks half-edges with a fresh tag, so it must not run during another
    /// half-edge traversal.
    pub fn boundary_loops(&self) -> Vec<HalfEdgeId<I>> {
        let tags = self.halfedges.tags();
        let tag = tags.next_tag();
        let mut loops = Vec::new();
        for he in self.halfedge_ids() {
            if !self.is_boundary_halfedge(he) || !tags.mark(he.index(), tag) {
                continue;
            }
            loops.push(he);
            for other in self.loop_from(he).skip(1) {
                tags.mark(other.index(), tag);
            }
        }
        loops
    }

    // ==================== Edits ====================

    /// Add an isolated vertex.
    pub fn add_vertex(&mut self, data: V) -> VertexId<I> {
        self.vertices.insert(Vertex::new(data))
    }

    /// Remove an edge.
    ///
    /// An interior edge merges its two faces into one, keeping the face of the
    /// edge's even half-edge. An edge on the boundary removes its face
    /// instead, exactly like [`remove_face`](Self::remove_face).
    pub fn remove_edge(&mut self, e: EdgeId<I>) -> Result<()> {
        let h = e.halfedge();
        self.halfedges.check(h)?;
        let t = h.twin();
        let (fh, ft) = (self.face_of(h), self.face_of(t));

        if !fh.is_valid() && !ft.is_valid() {
            return Err(MeshError::InvalidOperation("edge borders holes on both sides"));
        }
        if !fh.is_valid() {
            return self.remove_face(ft);
        }
        if !ft.is_valid() {
            return self.remove_face(fh);
        }
        if fh == ft {
            return Err(MeshError::InvalidOperation("edge has the same face on both sides"));
        }

        for he in self.loop_from(t).skip(1).collect::<Vec<_>>() {
            self.halfedges.get_mut(he).face = fh;
        }
        if self.face_first(fh) == h {
            self.faces.get_mut(fh).halfedge = self.next(h);
        }
        self.faces.remove(ft);

        let orphans = edit::remove_edge(&mut self.vertices, &mut self.halfedges, h);
        debug_assert!(orphans.is_empty(), "interior edge orphaned a vertex");
        Ok(())
    }

    /// Remove a face, turning its loop into a hole.
    ///
    /// Edges left with holes on both sides are removed, and vertices left
    /// without edges are removed with them.
    pub fn remove_face(&mut self, f: FaceId<I>) -> Result<()> {
        self.faces.check(f)?;
        let sides: Vec<_> = self.face_halfedges(f).collect();
        let corners: Vec<_> = sides.iter().map(|&he| self.start(he)).collect();

        for &he in &sides {
            self.halfedges.get_mut(he).face = FaceId::invalid();
        }
        self.faces.remove(f);

        for &he in &sides {
            if !self.halfedges.is_unused(he) && self.is_boundary_halfedge(he.twin()) {
                edit::remove_edge(&mut self.vertices, &mut self.halfedges, he);
            }
        }
        for v in corners {
            if !self.vertices.is_unused(v) {
                edit::prefer_boundary_first(&mut self.vertices, &self.halfedges, v);
            }
        }
        Ok(())
    }

    /// Remove a vertex together with every face around it.
    pub fn remove_vertex(&mut self, v: VertexId<I>) -> Result<()> {
        self.vertices.check(v)?;
        let mut faces: Vec<_> = self.vertex_faces(v).collect();
        faces.sort();
        faces.dedup();
        for f in faces {
            self.remove_face(f)?;
        }

        // Face-less edges cannot survive face removal in a valid mesh, but an
        // isolated vertex never had any faces to begin with.
        while !self.vertices.is_unused(v) && self.first(v).is_valid() {
            let he = self.first(v);
            edit::remove_edge(&mut self.vertices, &mut self.halfedges, he);
        }
        self.vertices.remove(v);
        Ok(())
    }

    /// Insert a new vertex in the middle of an edge.
    ///
    /// Both incident faces gain a side. `he` keeps its start and ends at the
    /// new vertex.
    pub fn split_edge(&mut self, he: HalfEdgeId<I>, data: V) -> Result<VertexId<I>> {
        self.halfedges.check(he)?;
        let (m, _) = edit::split_edge(&mut self.vertices, &mut self.halfedges, he, data);
        Ok(m)
    }

    /// Connect the start vertices of two half-edges of the same face with a
    /// new edge, cutting the face in two.
    ///
    /// The loop starting at `a` keeps the face; the loop starting at `b` gets
    /// a new face with a copy of the payload. Returns the new half-edge that
    /// closes `a`'s loop (it runs from `start(b)` to `start(a)`).
    pub fn split_face(&mut self, a: HalfEdgeId<I>, b: HalfEdgeId<I>) -> Result<HalfEdgeId<I>>
    where
        F: Clone,
    {
        self.halfedges.check(a)?;
        self.halfedges.check(b)?;
        let f = self.face_of(a);
        if !f.is_valid() {
            return Err(MeshError::InvalidOperation("cannot split a hole"));
        }
        if self.face_of(b) != f {
            return Err(MeshError::InvalidOperation("half-edges belong to different faces"));
        }
        if a == b || self.next(a) == b || self.next(b) == a {
            return Err(MeshError::InvalidOperation("split would create a two-sided face"));
        }
        let (u, w) = (self.start(a), self.start(b));
        if u == w {
            return Err(MeshError::InvalidOperation("split would create a self-loop"));
        }

        let (pa, pb) = (self.prev(a), self.prev(b));
        let x = self
            .halfedges
            .insert_pair(HalfEdge::new(w), HalfEdge::new(u));
        let y = x.twin();

        self.link(pb, x);
        self.link(x, a);
        self.link(pa, y);
        self.link(y, b);

        self.halfedges.get_mut(x).face = f;
        self.faces.get_mut(f).halfedge = x;

        let data = self.faces.get(f).data.clone();
        let g = self.faces.insert(Face::new(y, data));
        for he in self.loop_from(y).collect::<Vec<_>>() {
            self.halfedges.get_mut(he).face = g;
        }

        Ok(x)
    }

    /// Rotate the edge shared by two triangles to connect their opposite
    /// corners.
    pub fn flip_edge(&mut self, e: EdgeId<I>) -> Result<()> {
        let h = e.halfedge();
        self.halfedges.check(h)?;
        let t = h.twin();
        let (f1, f2) = (self.face_of(h), self.face_of(t));
        if !f1.is_valid() || !f2.is_valid() {
            return Err(MeshError::InvalidOperation("cannot flip a boundary edge"));
        }
        if self.face_degree(f1)? != 3 || self.face_degree(f2)? != 3 {
            return Err(MeshError::InvalidOperation(
                "can only flip an edge between two triangles",
            ));
        }

        let (h1, t1) = (self.next(h), self.next(t));
        let (h2, t2) = (self.next(h1), self.next(t1));
        let (a, b) = (self.start(h), self.start(t));
        let (c, d) = (self.start(h2), self.start(t2));
        if c == d || self.find_halfedge(c, d).is_some() {
            return Err(MeshError::InvalidOperation("flip would duplicate an existing edge"));
        }

        // (a, b, c) + (b, a, d) becomes (c, d, b) + (d, c, a).
        self.halfedges.get_mut(h).origin = c;
        self.halfedges.get_mut(t).origin = d;
        self.link(h, t2);
        self.link(t2, h1);
        self.link(h1, h);
        self.link(t, h2);
        self.link(h2, t1);
        self.link(t1, t);

        self.halfedges.get_mut(t2).face = f1;
        self.halfedges.get_mut(h2).face = f2;
        self.faces.get_mut(f1).halfedge = h;
        self.faces.get_mut(f2).halfedge = t;

        if self.first(a) == h {
            self.vertices.get_mut(a).halfedge = t1;
        }
        if self.first(b) == t {
            self.vertices.get_mut(b).halfedge = h1;
        }
        Ok(())
    }

    /// Split every face with more than three sides into triangles.
    ///
    /// Returns the number of faces created.
    pub fn triangulate(&mut self, options: &TriangulateOptions) -> Result<usize>
    where
        F: Clone,
    {
        let polygons: Vec<_> = self
            .face_ids()
            .filter(|&f| self.face_degree(f).map_or(false, |d| d > 3))
            .collect();

        let mut created = 0;
        for f in polygons {
            let mut cur = self.face_first(f);
            let mut from_start = true;
            while self.face_degree(self.face_of(cur))? > 3 {
                let x = match options.strategy {
                    TriangulationStrategy::Fan => self.split_face(cur, self.next(self.next(cur)))?,
                    TriangulationStrategy::Strip if from_start => {
                        self.split_face(cur, self.next(self.next(cur)))?
                    }
                    TriangulationStrategy::Strip => self.split_face(self.prev(cur), self.next(cur))?,
                };
                from_start = !from_start;
                cur = x.twin();
                created += 1;
            }
        }

        log::debug!("triangulated {} faces into {} triangles", created, self.num_faces());
        Ok(created)
    }

    /// Squeeze out removed elements. Invalidates all ids held elsewhere.
    pub fn compact(&mut self) -> Remapping<I> {
        let (vertices, halfedges) = edit::compact(&mut self.vertices, &mut self.halfedges);
        let faces = self.faces.compact();

        for rec in self.halfedges.records_mut() {
            if rec.face.is_valid() {
                rec.face = faces[rec.face.index()].unwrap_or_else(FaceId::invalid);
            }
        }
        for rec in self.faces.records_mut() {
            rec.halfedge = halfedges[rec.halfedge.index()].unwrap_or_else(HalfEdgeId::invalid);
        }

        log::debug!(
            "compacted mesh to {} vertices, {} edges, {} faces",
            self.num_vertices(),
            self.num_edges(),
            self.num_faces()
        );
        Remapping {
            vertices,
            halfedges,
            faces,
        }
    }

    /// Check every structural invariant.
    pub fn validate(&self) -> Result<()> {
        self.validate_connectivity()?;
        self.validate_faces()
    }

    /// Check if the mesh is valid (for debugging).
    pub fn is_valid(&self) -> bool {
        match self.validate() {
            Ok(()) => true,
            Err(err) => {
                log::warn!("mesh validation failed: {err}");
                false
            }
        }
    }

    #[inline]
    fn link(&mut self, a: HalfEdgeId<I>, b: HalfEdgeId<I>) {
        self.halfedges.get_mut(a).next = b;
        self.halfedges.get_mut(b).prev = a;
    }
}
