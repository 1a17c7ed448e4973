//! Low-level splicing shared by graph and mesh edits.
//!
//! These helpers work directly on the vertex and half-edge stores and keep
//! `next`/`prev`/first pointers consistent. Face labels are left to the
//! callers, which know whether faces exist.

use super::index::{FaceId, HalfEdgeId, MeshIndex, VertexId};
use super::topology::{HalfEdge, HalfEdgeStore, VertexStore};

/// Allocate a half-edge pair `a -> b` / `b -> a` and splice both halves into
/// the fans of their start vertices. Returns the `a -> b` half-edge.
pub(crate) fn insert_edge<V, I: MeshIndex>(
    vertices: &mut VertexStore<V, I>,
    halfedges: &mut HalfEdgeStore<I>,
    a: VertexId<I>,
    b: VertexId<I>,
) -> HalfEdgeId<I> {
    let he = halfedges.insert_pair(HalfEdge::new(a), HalfEdge::new(b));
    let twin = he.twin();

    // A lone pair forms its own two-step loop.
    {
        let rec = halfedges.get_mut(he);
        rec.next = twin;
        rec.prev = twin;
    }
    {
        let rec = halfedges.get_mut(twin);
        rec.next = he;
        rec.prev = he;
    }

    attach(vertices, halfedges, he);
    attach(vertices, halfedges, twin);
    he
}

/// Splice an outgoing half-edge into its start vertex's fan, just before the
/// vertex's first half-edge.
pub(crate) fn attach<V, I: MeshIndex>(
    vertices: &mut VertexStore<V, I>,
    halfedges: &mut HalfEdgeStore<I>,
    he: HalfEdgeId<I>,
) {
    let v = halfedges.get(he).origin;
    let first = vertices.get(v).halfedge;
    if !first.is_valid() {
        vertices.get_mut(v).halfedge = he;
        return;
    }

    let prev = halfedges.get(first).prev;
    halfedges.get_mut(prev).next = he;
    halfedges.get_mut(he).prev = prev;
    halfedges.get_mut(he.twin()).next = first;
    halfedges.get_mut(first).prev = he.twin();
}

/// Unsplice an outgoing half-edge from its start vertex's fan.
///
/// Returns `true` if the vertex has no edges left.
pub(crate) fn detach<V, I: MeshIndex>(
    vertices: &mut VertexStore<V, I>,
    halfedges: &mut HalfEdgeStore<I>,
    he: HalfEdgeId<I>,
) -> bool {
    let v = halfedges.get(he).origin;
    let twin = he.twin();
    let after = halfedges.get(twin).next;

    if after == he {
        vertices.get_mut(v).halfedge = HalfEdgeId::invalid();
        return true;
    }

    let before = halfedges.get(he).prev;
    halfedges.get_mut(before).next = after;
    halfedges.get_mut(after).prev = before;
    if vertices.get(v).halfedge == he {
        vertices.get_mut(v).halfedge = after;
    }
    false
}

/// Unsplice both halves of an edge, free the pair and tombstone vertices left
/// without edges. Returns the orphaned vertices.
pub(crate) fn remove_edge<V, I: MeshIndex>(
    vertices: &mut VertexStore<V, I>,
    halfedges: &mut HalfEdgeStore<I>,
    he: HalfEdgeId<I>,
) -> Vec<VertexId<I>> {
    let a = halfedges.get(he).origin;
    let b = halfedges.get(he.twin()).origin;

    let mut orphans = Vec::new();
    if detach(vertices, halfedges, he) {
        orphans.push(a);
    }
    if detach(vertices, halfedges, he.twin()) {
        orphans.push(b);
    }
    halfedges.remove_pair(he);

    for &v in &orphans {
        vertices.remove(v);
    }
    orphans
}

/// Insert a new vertex on the edge of `he`.
///
/// `he` keeps its start and now ends at the new vertex; a new pair covers the
/// rest of the edge and inherits the faces of the old halves. Returns the new
/// vertex and the new half-edge leaving it in `he`'s direction.
pub(crate) fn split_edge<V, I: MeshIndex>(
    vertices: &mut VertexStore<V, I>,
    halfedges: &mut HalfEdgeStore<I>,
    he: HalfEdgeId<I>,
    data: V,
) -> (VertexId<I>, HalfEdgeId<I>) {
    let twin = he.twin();
    let b = halfedges.get(twin).origin;
    let he_rec = *halfedges.get(he);
    let twin_rec = *halfedges.get(twin);

    let m = vertices.insert(super::topology::Vertex::new(data));
    let he2 = halfedges.insert_pair(HalfEdge::new(m), HalfEdge::new(b));
    let twin2 = he2.twin();

    // he2 follows he.
    {
        let rec = halfedges.get_mut(he2);
        rec.face = he_rec.face;
        rec.prev = he;
        rec.next = if he_rec.next == twin { twin2 } else { he_rec.next };
    }
    if he_rec.next != twin {
        halfedges.get_mut(he_rec.next).prev = he2;
    }
    halfedges.get_mut(he).next = he2;

    // twin2 precedes twin, which now starts at m.
    {
        let rec = halfedges.get_mut(twin2);
        rec.face = twin_rec.face;
        rec.next = twin;
        rec.prev = if twin_rec.prev == he { he2 } else { twin_rec.prev };
    }
    if twin_rec.prev != he {
        halfedges.get_mut(twin_rec.prev).next = twin2;
    }
    {
        let rec = halfedges.get_mut(twin);
        rec.prev = twin2;
        rec.origin = m;
    }
    if vertices.get(b).halfedge == twin {
        vertices.get_mut(b).halfedge = twin2;
    }
    // Hole-bordering first, like every other vertex.
    vertices.get_mut(m).halfedge = if twin_rec.face.is_valid() { he2 } else { twin };

    (m, he2)
}

/// Re-point a vertex's first half-edge at a hole-bordering outgoing
/// half-edge if it has one.
pub(crate) fn prefer_boundary_first<V, I: MeshIndex>(
    vertices: &mut VertexStore<V, I>,
    halfedges: &HalfEdgeStore<I>,
    v: VertexId<I>,
) {
    let start = vertices.get(v).halfedge;
    if !start.is_valid() {
        return;
    }
    let bound = halfedges.capacity();
    let mut he = start;
    for _ in 0..bound {
        if halfedges.get(he).is_boundary() {
            vertices.get_mut(v).halfedge = he;
            return;
        }
        he = halfedges.get(he.twin()).next;
        if he == start {
            return;
        }
    }
}

/// Old-slot to new-id maps produced by compaction. `None` marks a slot that
/// held a removed element.
#[derive(Debug, Clone, Default)]
pub struct Remapping<I: MeshIndex = u32> {
    /// Vertex map.
    pub vertices: Vec<Option<VertexId<I>>>,
    /// Half-edge map.
    pub halfedges: Vec<Option<HalfEdgeId<I>>>,
    /// Face map (empty for graphs).
    pub faces: Vec<Option<FaceId<I>>>,
}

/// Compact both stores and rewrite every stored reference.
///
/// Returns the old-slot to new-id maps of vertices and half-edges.
pub(crate) fn compact<V, I: MeshIndex>(
    vertices: &mut VertexStore<V, I>,
    halfedges: &mut HalfEdgeStore<I>,
) -> (Vec<Option<VertexId<I>>>, Vec<Option<HalfEdgeId<I>>>) {
    let vmap = vertices.compact();
    let hmap = halfedges.compact();

    let he_of = |he: HalfEdgeId<I>| {
        if he.is_valid() {
            hmap[he.index()].unwrap_or_else(HalfEdgeId::invalid)
        } else {
            he
        }
    };

    // After compaction every slot is live.
    for rec in vertices.records_mut() {
        rec.halfedge = he_of(rec.halfedge);
    }
    for rec in halfedges.records_mut() {
        rec.origin = vmap[rec.origin.index()].unwrap_or_else(VertexId::invalid);
        rec.next = he_of(rec.next);
        rec.prev = he_of(rec.prev);
    }

    (vmap, hmap)
}
