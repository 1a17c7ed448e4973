//! Hop-count and distance labeling.
//!
//! Each function runs a search from a set of sources and writes one label
//! per element into a caller-supplied [`Property`]. Unreached live elements
//! get a sentinel: `usize::MAX` for depths and `f64::INFINITY` for distances.
//!
//! Edge lengths for the distance functions are read through a
//! [`PropertyRead`] keyed by [`EdgeId`], so the weights can be stored, hashed
//! or computed on the fly with [`FnProperty`](crate::mesh::FnProperty).
//!
//! # Example
//!
//! ```
//! use tessel::algo::geometry::halfedge_length;
//! use tessel::algo::labels::{vertex_distances, DistanceOptions};
//! use tessel::mesh::{build_from_triangles, EdgeId, FnProperty, HeMesh, Topology, VertexId};
//! use nalgebra::Point3;
//!
//! let positions = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(3.0, 0.0, 0.0),
//!     Point3::new(3.0, 4.0, 0.0),
//! ];
//! let mesh: HeMesh = build_from_triangles(&positions, &[[0, 1, 2]]).unwrap();
//!
//! let lengths = FnProperty(|e: EdgeId| halfedge_length(&mesh, e.halfedge()));
//! let mut distances = vec![0.0; mesh.vertex_store().capacity()];
//! vertex_distances(
//!     &mesh,
//!     &[VertexId::new(0)],
//!     &[],
//!     &lengths,
//!     &mut distances,
//!     &DistanceOptions::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(distances[2], 5.0);
//! ```

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

use crate::error::{MeshError, Result};
use crate::mesh::{
    EdgeId, ElementId, FaceId, FaceTopology, HalfEdgeId, Property, PropertyRead, Tags, Topology,
    VertexId,
};

use super::search::breadth_first_edges;

/// Depth of elements no search reached.
pub const UNREACHED_DEPTH: usize = usize::MAX;

/// Distance of elements no search reached.
pub const UNREACHED_DISTANCE: f64 = f64::INFINITY;

/// Options for distance labeling.
#[derive(Debug, Clone)]
pub struct DistanceOptions {
    /// Settle elements in order of distance with a priority queue.
    ///
    /// When false, a FIFO queue re-relaxes elements until no label improves.
    /// Both give exact shortest distances for non-negative lengths.
    pub best_first: bool,
}

impl Default for DistanceOptions {
    fn default() -> Self {
        Self { best_first: true }
    }
}

impl DistanceOptions {
    /// Choose between priority-queue and FIFO relaxation.
    pub fn with_best_first(mut self, best_first: bool) -> Self {
        self.best_first = best_first;
        self
    }
}

/// Write hop counts from the nearest source, reading the parent's label to
/// produce the child's. Returns the number of elements reached.
fn hop_labels<N, F, I>(
    tags: &Tags,
    sources: &[N],
    exclude: &[N],
    mut neighbors: F,
    mut visit: impl FnMut(Option<N>, N),
) -> usize
where
    N: ElementId,
    F: FnMut(N) -> I,
    I: IntoIterator<Item = N>,
{
    let search = breadth_first_edges(
        tags,
        sources.iter().copied(),
        exclude.iter().copied(),
        move |n: N| neighbors(n).into_iter().map(move |m| (n, m)),
    );
    let mut reached = 0;
    for (parent, n) in search {
        visit(parent, n);
        reached += 1;
    }
    reached
}

/// Label vertices with their hop count from the nearest source.
///
/// Vertices in `exclude` are never entered, so they act as walls; they keep
/// [`UNREACHED_DEPTH`] like any other unreached vertex. Returns the number of
/// vertices reached (sources included), not the largest depth.
pub fn vertex_depths<T, P>(
    topo: &T,
    sources: &[VertexId<T::Index>],
    exclude: &[VertexId<T::Index>],
    depths: &mut P,
) -> Result<usize>
where
    T: Topology,
    P: Property<VertexId<T::Index>, usize> + ?Sized,
{
    for &s in sources {
        topo.vertex_store().check(s)?;
    }
    for &x in exclude {
        topo.vertex_store().owns(x)?;
    }
    for v in topo.vertex_ids() {
        depths.set(v, UNREACHED_DEPTH);
    }

    let reached = hop_labels(
        topo.vertex_store().tags(),
        sources,
        exclude,
        move |v| topo.connected_vertices(v),
        |parent, v| {
            let d = parent.map_or(0, |p| depths.get(p) + 1);
            depths.set(v, d);
        },
    );
    log::trace!("vertex_depths reached {reached} of {}", topo.num_vertices());
    Ok(reached)
}

/// Label edges with their hop count from the nearest source edge. Edges are
/// adjacent when they share an end vertex.
///
/// Returns the number of edges reached.
pub fn edge_depths<T, P>(
    topo: &T,
    sources: &[EdgeId<T::Index>],
    exclude: &[EdgeId<T::Index>],
    depths: &mut P,
) -> Result<usize>
where
    T: Topology,
    P: Property<EdgeId<T::Index>, usize> + ?Sized,
{
    for &s in sources {
        topo.halfedge_store().check(s.halfedge())?;
    }
    for &x in exclude {
        topo.halfedge_store().owns(x.halfedge())?;
    }
    for e in topo.edge_ids() {
        depths.set(e, UNREACHED_DEPTH);
    }

    // Edges are searched through their primary half-edges, which own the
    // edge's tag slot.
    let primaries: Vec<HalfEdgeId<T::Index>> = sources.iter().map(|e| e.halfedge()).collect();
    let walls: Vec<HalfEdgeId<T::Index>> = exclude.iter().map(|e| e.halfedge()).collect();
    let reached = hop_labels(
        topo.halfedge_store().tags(),
        &primaries,
        &walls,
        move |he: HalfEdgeId<T::Index>| {
            let [a, b] = [topo.start(he), topo.end(he)];
            topo.outgoing(a)
                .chain(topo.outgoing(b))
                .map(|g| g.edge().halfedge())
        },
        |parent, he| {
            let d = parent.map_or(0, |p| depths.get(p.edge()) + 1);
            depths.set(he.edge(), d);
        },
    );
    Ok(reached)
}

/// Label faces with their hop count from the nearest source face across
/// shared edges.
///
/// Returns the number of faces reached.
pub fn face_depths<M, P>(
    mesh: &M,
    sources: &[FaceId<M::Index>],
    exclude: &[FaceId<M::Index>],
    depths: &mut P,
) -> Result<usize>
where
    M: FaceTopology,
    P: Property<FaceId<M::Index>, usize> + ?Sized,
{
    for &s in sources {
        mesh.face_store().check(s)?;
    }
    for &x in exclude {
        mesh.face_store().owns(x)?;
    }
    for f in mesh.face_ids() {
        depths.set(f, UNREACHED_DEPTH);
    }

    let reached = hop_labels(
        mesh.face_store().tags(),
        sources,
        exclude,
        move |f| mesh.adjacent_faces(f),
        |parent, f| {
            let d = parent.map_or(0, |p| depths.get(p) + 1);
            depths.set(f, d);
        },
    );
    Ok(reached)
}

/// Label vertices with their shortest-path distance from the nearest source
/// along edges. Paths never pass through a vertex in `exclude`.
pub fn vertex_distances<T, L, P>(
    topo: &T,
    sources: &[VertexId<T::Index>],
    exclude: &[VertexId<T::Index>],
    lengths: &L,
    distances: &mut P,
    options: &DistanceOptions,
) -> Result<()>
where
    T: Topology,
    L: PropertyRead<EdgeId<T::Index>, f64> + ?Sized,
    P: Property<VertexId<T::Index>, f64> + ?Sized,
{
    for &s in sources {
        topo.vertex_store().check(s)?;
    }
    for &x in exclude {
        topo.vertex_store().owns(x)?;
    }
    for v in topo.vertex_ids() {
        distances.set(v, UNREACHED_DISTANCE);
    }

    shortest_distances(
        topo.vertex_store().tags(),
        sources,
        exclude,
        move |v| {
            topo.outgoing(v)
                .map(move |he| (topo.end(he), lengths.get(he.edge())))
        },
        distances,
        options.best_first,
    )
}

/// Label faces with their shortest-path distance from the nearest source
/// face. Crossing an edge costs its length; faces in `exclude` are never
/// crossed.
pub fn face_distances<M, L, P>(
    mesh: &M,
    sources: &[FaceId<M::Index>],
    exclude: &[FaceId<M::Index>],
    lengths: &L,
    distances: &mut P,
    options: &DistanceOptions,
) -> Result<()>
where
    M: FaceTopology,
    L: PropertyRead<EdgeId<M::Index>, f64> + ?Sized,
    P: Property<FaceId<M::Index>, f64> + ?Sized,
{
    for &s in sources {
        mesh.face_store().check(s)?;
    }
    for &x in exclude {
        mesh.face_store().owns(x)?;
    }
    for f in mesh.face_ids() {
        distances.set(f, UNREACHED_DISTANCE);
    }

    shortest_distances(
        mesh.face_store().tags(),
        sources,
        exclude,
        move |f| {
            mesh.face_halfedges(f)
                .map(move |he| (mesh.face_of(he.twin()), lengths.get(he.edge())))
                .filter(|(g, _)| g.is_valid())
        },
        distances,
        options.best_first,
    )
}

/// Entry in the distance priority queue.
#[derive(Debug, Clone, Copy)]
struct DistanceEntry<N> {
    node: N,
    distance: f64,
}

impl<N> PartialEq for DistanceEntry<N> {
    fn eq(&self, other: &Self) -> bool {
        self.distance == other.distance
    }
}

impl<N> Eq for DistanceEntry<N> {}

impl<N> PartialOrd for DistanceEntry<N> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<N> Ord for DistanceEntry<N> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior
        other
            .distance
            .partial_cmp(&self.distance)
            .unwrap_or(Ordering::Equal)
    }
}

fn check_length(w: f64) -> Result<()> {
    if w >= 0.0 {
        Ok(())
    } else {
        Err(MeshError::invalid_param(
            "length",
            w,
            "edge lengths must be non-negative",
        ))
    }
}

/// Relax distances from `sources`; labels must start at infinity.
///
/// Excluded nodes and settled nodes share one epoch tag, so neither is
/// relaxed again. The FIFO variant marks queued nodes with a second, later
/// epoch and clears the mark on dequeue.
fn shortest_distances<N, F, I, P>(
    tags: &Tags,
    sources: &[N],
    exclude: &[N],
    mut neighbors: F,
    distances: &mut P,
    best_first: bool,
) -> Result<()>
where
    N: ElementId,
    F: FnMut(N) -> I,
    I: IntoIterator<Item = (N, f64)>,
    P: Property<N, f64> + ?Sized,
{
    let blocked = tags.next_tag();
    for &x in exclude {
        tags.set(x.index(), blocked);
    }
    let sources: Vec<N> = sources
        .iter()
        .copied()
        .filter(|s| !tags.is_marked(s.index(), blocked))
        .collect();
    for &s in &sources {
        distances.set(s, 0.0);
    }

    if best_first {
        let mut heap: BinaryHeap<DistanceEntry<N>> = sources
            .iter()
            .map(|&node| DistanceEntry {
                node,
                distance: 0.0,
            })
            .collect();

        while let Some(DistanceEntry { node, distance }) = heap.pop() {
            // Stale entry: a shorter path already settled this node.
            if distance > distances.get(node) || !tags.mark(node.index(), blocked) {
                continue;
            }
            for (m, w) in neighbors(node) {
                check_length(w)?;
                if tags.is_marked(m.index(), blocked) {
                    continue;
                }
                let candidate = distance + w;
                if candidate < distances.get(m) {
                    distances.set(m, candidate);
                    heap.push(DistanceEntry {
                        node: m,
                        distance: candidate,
                    });
                }
            }
        }
    } else {
        let queued = tags.next_tag();
        let mut queue = VecDeque::new();
        for &s in &sources {
            if tags.mark(s.index(), queued) {
                queue.push_back(s);
            }
        }

        while let Some(node) = queue.pop_front() {
            tags.set(node.index(), 0);
            let distance = distances.get(node);
            for (m, w) in neighbors(node) {
                check_length(w)?;
                if tags.is_marked(m.index(), blocked) {
                    continue;
                }
                let candidate = distance + w;
                if candidate < distances.get(m) {
                    distances.set(m, candidate);
                    if tags.mark(m.index(), queued) {
                        queue.push_back(m);
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::geometry::halfedge_length;
    use crate::mesh::{build_from_quads, FnProperty, HeGraph, HeMesh};
    use nalgebra::Point3;
    use std::collections::HashMap;

    fn grid_graph(n: usize) -> (HeGraph, Vec<VertexId>) {
        let mut g = HeGraph::new();
        let vs: Vec<_> = (0..n * n)
            .map(|i| g.add_vertex(Point3::new((i % n) as f64, (i / n) as f64, 0.0)))
            .collect();
        for j in 0..n {
            for i in 0..n {
                let v = j * n + i;
                if i + 1 < n {
                    g.add_edge(vs[v], vs[v + 1]).unwrap();
                }
                if j + 1 < n {
                    g.add_edge(vs[v], vs[v + n]).unwrap();
                }
            }
        }
        (g, vs)
    }

    fn quad_grid(n: usize) -> HeMesh {
        let mut positions = Vec::new();
        for j in 0..=n {
            for i in 0..=n {
                positions.push(Point3::new(i as f64, j as f64, 0.0));
            }
        }
        let mut quads = Vec::new();
        for j in 0..n {
            for i in 0..n {
                let v0 = j * (n + 1) + i;
                quads.push([v0, v0 + 1, v0 + n + 2, v0 + n + 1]);
            }
        }
        build_from_quads(&positions, &quads).unwrap()
    }

    #[test]
    fn test_vertex_depths_on_grid_equal_manhattan() {
        let (g, vs) = grid_graph(4);
        let mut depths = vec![0; g.vertex_store().capacity()];
        let reached = vertex_depths(&g, &[vs[0]], &[], &mut depths).unwrap();

        assert_eq!(reached, 16);
        for &v in &vs {
            let p = g.vertex_data(v);
            assert_eq!(depths[v.index()], (p.x + p.y) as usize);
        }
    }

    #[test]
    fn test_vertex_depths_multi_source() {
        let (g, vs) = grid_graph(4);
        let mut depths = vec![0; 16];
        vertex_depths(&g, &[vs[0], vs[15]], &[], &mut depths).unwrap();
        assert_eq!(depths[15], 0);
        assert_eq!(depths[3], 3);
        assert_eq!(depths[5], 2);
        assert_eq!(depths[10], 2);
    }

    #[test]
    fn test_vertex_depths_unreached_sentinel() {
        let (mut g, vs) = grid_graph(2);
        let lone = g.add_vertex(Point3::new(10.0, 10.0, 0.0));
        let mut depths: HashMap<VertexId, usize> = HashMap::new();
        let reached = vertex_depths(&g, &[vs[0]], &[], &mut depths).unwrap();
        assert_eq!(reached, 4);
        assert_eq!(depths[&lone], UNREACHED_DEPTH);
        assert_eq!(depths[&vs[3]], 2);
    }

    #[test]
    fn test_depth_labelers_return_reached_count() {
        let graph: HeGraph = crate::mesh::build_graph(4, &[[0, 1], [1, 2], [2, 3]], |i| {
            Point3::new(i as f64, 0.0, 0.0)
        })
        .unwrap();
        let mut depths = vec![0; 4];
        let reached = vertex_depths(&graph, &[VertexId::new(0)], &[], &mut depths).unwrap();

        // Four vertices reached; the deepest sits three hops away.
        assert_eq!(reached, 4);
        assert_eq!(depths.iter().max(), Some(&3));

        let reached = vertex_depths(&graph, &[VertexId::new(1)], &[], &mut depths).unwrap();
        assert_eq!(reached, 4);
        assert_eq!(depths, vec![1, 0, 1, 2]);
    }

    #[test]
    fn test_excluded_vertices_act_as_walls() {
        let (g, vs) = grid_graph(3);
        let mut depths = vec![0; 9];
        // Wall off the middle column.
        let wall = [vs[1], vs[4], vs[7]];
        let reached = vertex_depths(&g, &[vs[0]], &wall, &mut depths).unwrap();
        assert_eq!(reached, 3);
        assert_eq!(depths[6], 2);
        for v in [1, 2, 4, 5, 7, 8] {
            assert_eq!(depths[v], UNREACHED_DEPTH);
        }

        // An excluded source is dropped.
        let reached = vertex_depths(&g, &[vs[0]], &[vs[0]], &mut depths).unwrap();
        assert_eq!(reached, 0);
        assert_eq!(depths[0], UNREACHED_DEPTH);
    }

    #[test]
    fn test_excluded_vertices_reroute_distances() {
        let (g, vs) = grid_graph(3);
        let lengths = FnProperty(|_: EdgeId| 1.0);
        for best_first in [true, false] {
            let options = DistanceOptions::default().with_best_first(best_first);
            let mut distances = vec![0.0; 9];
            vertex_distances(&g, &[vs[0]], &[vs[1], vs[4]], &lengths, &mut distances, &options)
                .unwrap();
            // 0 -> 3 -> 6 -> 7 -> 8 -> 5 -> 2
            assert_eq!(distances[2], 6.0);
            assert_eq!(distances[1], UNREACHED_DISTANCE);
            assert_eq!(distances[4], UNREACHED_DISTANCE);
        }
    }

    #[test]
    fn test_excluded_faces_reroute_depths() {
        let mesh = quad_grid(3);
        let mut depths = vec![0; 9];
        let exclude = [FaceId::new(1), FaceId::new(4)];
        let reached = face_depths(&mesh, &[FaceId::new(0)], &exclude, &mut depths).unwrap();
        assert_eq!(reached, 7);
        assert_eq!(depths[2], 6);
        assert_eq!(depths[4], UNREACHED_DEPTH);
    }

    #[test]
    fn test_edge_exclusion_splits_path() {
        let mut g: HeGraph = HeGraph::new();
        let p: Vec<_> = (0..4)
            .map(|i| g.add_vertex(Point3::new(i as f64, 0.0, 0.0)))
            .collect();
        let edges: Vec<_> = p
            .windows(2)
            .map(|w| g.add_edge(w[0], w[1]).unwrap().edge())
            .collect();
        let mut depths = vec![0; g.num_edges()];
        let reached = edge_depths(&g, &[edges[0]], &[edges[1]], &mut depths).unwrap();
        assert_eq!(reached, 1);
        assert_eq!(depths[edges[2].index()], UNREACHED_DEPTH);
    }

    #[test]
    fn test_vertex_depths_rejects_removed_source() {
        let (mut g, vs) = grid_graph(3);
        g.remove_vertex(vs[4]).unwrap();
        let mut depths = vec![0; 9];
        assert!(matches!(
            vertex_depths(&g, &[vs[4]], &[], &mut depths),
            Err(MeshError::RemovedElement { .. })
        ));
        assert!(matches!(
            vertex_depths(&g, &[VertexId::new(100)], &[], &mut depths),
            Err(MeshError::ForeignElement { .. })
        ));
    }

    #[test]
    fn test_edge_depths_on_path() {
        let mut g: HeGraph = HeGraph::new();
        let p: Vec<_> = (0..5)
            .map(|i| g.add_vertex(Point3::new(i as f64, 0.0, 0.0)))
            .collect();
        let edges: Vec<_> = p
            .windows(2)
            .map(|w| g.add_edge(w[0], w[1]).unwrap().edge())
            .collect();

        let mut depths = vec![0; g.num_edges()];
        let reached = edge_depths(&g, &[edges[0]], &[], &mut depths).unwrap();
        assert_eq!(reached, 4);
        for (i, e) in edges.iter().enumerate() {
            assert_eq!(depths[e.index()], i);
        }
    }

    #[test]
    fn test_face_depths_on_quad_grid() {
        let mesh = quad_grid(3);
        let mut depths = vec![0; mesh.face_store().capacity()];
        let reached = face_depths(&mesh, &[FaceId::new(0)], &[], &mut depths).unwrap();
        assert_eq!(reached, 9);
        // Faces are numbered row by row.
        for f in 0..9 {
            assert_eq!(depths[f], f % 3 + f / 3);
        }
    }

    /// Floyd-Warshall over the live vertices.
    fn brute_force(g: &HeGraph, lengths: &HashMap<EdgeId, f64>) -> Vec<Vec<f64>> {
        let n = g.vertex_store().capacity();
        let mut d = vec![vec![f64::INFINITY; n]; n];
        for v in g.vertex_ids() {
            d[v.index()][v.index()] = 0.0;
        }
        for e in g.edge_ids() {
            let he = e.halfedge();
            let (a, b) = (g.start(he).index(), g.end(he).index());
            let w = lengths[&e];
            d[a][b] = d[a][b].min(w);
            d[b][a] = d[b][a].min(w);
        }
        for k in 0..n {
            for i in 0..n {
                for j in 0..n {
                    if d[i][k] + d[k][j] < d[i][j] {
                        d[i][j] = d[i][k] + d[k][j];
                    }
                }
            }
        }
        d
    }

    #[test]
    fn test_vertex_distances_match_brute_force() {
        let (g, vs) = grid_graph(4);
        // Distinct positive lengths.
        let lengths: HashMap<EdgeId, f64> = g
            .edge_ids()
            .enumerate()
            .map(|(i, e)| (e, 1.0 + ((i * 7) % 11) as f64 * 0.37 + i as f64 * 0.001))
            .collect();
        let reference = brute_force(&g, &lengths);

        for best_first in [true, false] {
            let options = DistanceOptions::default().with_best_first(best_first);
            for &s in &[vs[0], vs[6], vs[15]] {
                let mut distances = vec![0.0; 16];
                vertex_distances(&g, &[s], &[], &lengths, &mut distances, &options).unwrap();
                for &v in &vs {
                    let expected = reference[s.index()][v.index()];
                    assert!(
                        (distances[v.index()] - expected).abs() < 1e-9,
                        "source {s:?} vertex {v:?}: {} vs {}",
                        distances[v.index()],
                        expected
                    );
                }
            }
        }
    }

    #[test]
    fn test_vertex_distances_geometric_lengths() {
        let mesh = quad_grid(2);
        let lengths = FnProperty(|e: EdgeId| halfedge_length(&mesh, e.halfedge()));
        let mut distances = vec![0.0; 9];
        vertex_distances(
            &mesh,
            &[VertexId::new(0)],
            &[],
            &lengths,
            &mut distances,
            &DistanceOptions::default(),
        )
        .unwrap();
        // Quads have no diagonals: edge distance is Manhattan.
        assert_eq!(distances[8], 4.0);
        assert_eq!(distances[4], 2.0);
    }

    #[test]
    fn test_negative_length_rejected() {
        let (g, vs) = grid_graph(2);
        let lengths = FnProperty(|_: EdgeId| -1.0);
        let mut distances = vec![0.0; 4];
        assert!(matches!(
            vertex_distances(
                &g,
                &[vs[0]],
                &[],
                &lengths,
                &mut distances,
                &DistanceOptions::default()
            ),
            Err(MeshError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_face_distances_both_modes_agree() {
        let mesh = quad_grid(3);
        let lengths = FnProperty(|e: EdgeId| 1.0 + e.index() as f64 * 0.1);
        let mut a = vec![0.0; 9];
        let mut b = vec![0.0; 9];
        let sources = [FaceId::new(4)];
        face_distances(&mesh, &sources, &[], &lengths, &mut a, &DistanceOptions::default()).unwrap();
        face_distances(
            &mesh,
            &sources,
            &[],
            &lengths,
            &mut b,
            &DistanceOptions::default().with_best_first(false),
        )
        .unwrap();

        assert_eq!(a[4], 0.0);
        for f in 0..9 {
            assert!(a[f].is_finite());
            assert!((a[f] - b[f]).abs() < 1e-12);
        }
        // A neighbor across one edge costs at most that edge's length.
        for he in mesh.face_halfedges(FaceId::new(4)) {
            let g = mesh.face_of(he.twin());
            assert!(a[g.index()] <= lengths.get(he.edge()) + 1e-12);
        }
    }
}
