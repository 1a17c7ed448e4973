//! Half-edge graph: vertices joined by edges, without faces.
//!
//! A [`HeGraph`] stores the same vertex and half-edge records as a mesh but
//! every half-edge has an invalid face. The outgoing half-edges of a vertex
//! still form a closed cycle under `next(twin(h))`, so every circulator and
//! search in the crate works on graphs unchanged.

use nalgebra::Point3;

use super::edit::{self, Remapping};
use super::index::{EdgeId, HalfEdgeId, MeshIndex, VertexId};
use super::topology::{HalfEdgeStore, Topology, Vertex, VertexStore};
use crate::error::{MeshError, Result};

/// A graph with half-edge connectivity.
///
/// `V` is the vertex payload (a position by default) and `I` the index type.
#[derive(Debug, Clone)]
pub struct HeGraph<V = Point3<f64>, I: MeshIndex = u32> {
    pub(crate) vertices: VertexStore<V, I>,
    pub(crate) halfedges: HalfEdgeStore<I>,
}

impl<V, I: MeshIndex> Default for HeGraph<V, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, I: MeshIndex> Topology for HeGraph<V, I> {
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

impl<V, I: MeshIndex> HeGraph<V, I> {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self {
            vertices: VertexStore::new(),
            halfedges: HalfEdgeStore::new(),
        }
    }

    /// Create an empty graph with room for the given element counts.
    pub fn with_capacity(num_vertices: usize, num_edges: usize) -> Self {
        Self {
            vertices: VertexStore::with_capacity(num_vertices),
            halfedges: HalfEdgeStore::with_capacity(2 * num_edges),
        }
    }

    /// Mutable access to a vertex payload.
    #[inline]
    pub fn vertex_data_mut(&mut self, v: VertexId<I>) -> &mut V {
        &mut self.vertices.get_mut(v).data
    }

    /// Apply `f` to every live vertex payload.
    pub fn for_each_vertex_mut<F>(&mut self, parallel: bool, f: F)
    where
        V: Send,
        F: Fn(VertexId<I>, &mut V) + Sync + Send,
    {
        self.vertices
            .for_each_mut(parallel, |v, rec| f(v, &mut rec.data));
    }

    /// Add an isolated vertex.
    pub fn add_vertex(&mut self, data: V) -> VertexId<I> {
        self.vertices.insert(Vertex::new(data))
    }

    /// Join two live vertices by a new edge and return the `a -> b`
    /// half-edge. Parallel edges are allowed; self-loops are not.
    pub fn add_edge(&mut self, a: VertexId<I>, b: VertexId<I>) -> Result<HalfEdgeId<I>> {
        self.vertices.check(a)?;
        self.vertices.check(b)?;
        if a == b {
            return Err(MeshError::InvalidOperation("an edge cannot join a vertex to itself"));
        }
        Ok(edit::insert_edge(&mut self.vertices, &mut self.halfedges, a, b))
    }

    /// Remove an edge. End vertices left without edges are removed too.
    pub fn remove_edge(&mut self, e: EdgeId<I>) -> Result<()> {
        let he = e.halfedge();
        self.halfedges.check(he)?;
        let orphans = edit::remove_edge(&mut self.vertices, &mut self.halfedges, he);
        if !orphans.is_empty() {
            log::trace!("remove_edge({e:?}) orphaned {orphans:?}");
        }
        Ok(())
    }

    /// Remove a vertex with all its edges. Neighbors left without edges are
    /// removed too.
    pub fn remove_vertex(&mut self, v: VertexId<I>) -> Result<()> {
        self.vertices.check(v)?;
        while self.first(v).is_valid() {
            let he = self.first(v);
            edit::remove_edge(&mut self.vertices, &mut self.halfedges, he);
        }
        // Isolated from the start, or orphaned by the last removal.
        self.vertices.remove(v);
        Ok(())
    }

    /// Insert a new vertex in the middle of an edge.
    ///
    /// `he` keeps its start and ends at the new vertex. Returns the new vertex.
    pub fn split_edge(&mut self, he: HalfEdgeId<I>, data: V) -> Result<VertexId<I>> {
        self.halfedges.check(he)?;
        let (m, _) = edit::split_edge(&mut self.vertices, &mut self.halfedges, he, data);
        Ok(m)
    }

    /// Squeeze out removed elements. Invalidates all ids held elsewhere.
    ///
    /// Returns the old-to-new id maps.
    pub fn compact(&mut self) -> Remapping<I> {
        let (vertices, halfedges) = edit::compact(&mut self.vertices, &mut self.halfedges);
        log::debug!(
            "compacted graph to {} vertices, {} edges",
            self.vertices.len(),
            self.halfedges.len() / 2
        );
        Remapping {
            vertices,
            halfedges,
            faces: Vec::new(),
        }
    }

    /// Check every structural invariant.
    pub fn validate(&self) -> Result<()> {
        self.validate_connectivity()?;
        if let Some((he, _)) = self.halfedges.iter().find(|(_, rec)| rec.face.is_valid()) {
            return Err(MeshError::corrupt("half-edge", he.index(), "graph half-edge has a face"));
        }
        Ok(())
    }

    /// Whether [`validate`](Self::validate) passes.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}
