//! Mesh and graph construction utilities.
//!
//! This module builds half-edge meshes from face-vertex lists and graphs
//! from segment lists, and walks them back out into index buffers. Payloads
//! are produced by caller-supplied functions so any vertex or face type can
//! be populated without the builder knowing about it.

use std::collections::{HashMap, HashSet};

use nalgebra::Point3;

use super::attributes::{SetNormal, SetPosition, SetTexCoord, VertexAttributes};
use super::edit;
use super::graph::HeGraph;
use super::halfedge::HeMesh;
use super::index::{HalfEdgeId, MeshIndex, VertexId};
use super::topology::{Face, FaceTopology, HalfEdge, Topology, Vertex};
use crate::error::{MeshError, Result};

/// Build a half-edge mesh from polygons of any size.
///
/// `vertex_fn(i)` produces the payload of input vertex `i` and `face_fn(f)`
/// the payload of input face `f`. Vertex and face ids match the input
/// indices; vertices no face refers to are created and immediately removed.
///
/// # Errors
/// - [`MeshError::EmptyMesh`] if there are no faces
/// - [`MeshError::InvalidVertexIndex`] for out-of-range indices
/// - [`MeshError::DegenerateFace`] for faces with fewer than three or
///   repeated vertices
/// - [`MeshError::NonManifoldEdge`] if two faces use the same directed edge
/// - [`MeshError::NonManifoldVertex`] if separate face fans share a vertex
///
/// # Example
/// ```
/// use tessel::mesh::{build_from_polygons, FaceTopology, HeMesh, Topology};
/// use nalgebra::Point3;
///
/// let positions = [
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
///     Point3::new(0.5, 1.5, 0.0),
/// ];
/// let faces = vec![vec![0, 1, 2, 3], vec![3, 2, 4]];
///
/// let mesh: HeMesh<Point3<f64>, usize> =
///     build_from_polygons(positions.len(), &faces, |i| positions[i], |f| f).unwrap();
/// assert_eq!(mesh.num_faces(), 2);
/// assert_eq!(mesh.num_edges(), 6);
/// ```
pub fn build_from_polygons<V, F, I, P, VF, FF>(
    num_vertices: usize,
    faces: &[P],
    mut vertex_fn: VF,
    mut face_fn: FF,
) -> Result<HeMesh<V, F, I>>
where
    I: MeshIndex,
    P: AsRef<[usize]>,
    VF: FnMut(usize) -> V,
    FF: FnMut(usize) -> F,
{
    if faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }
    validate_polygons(num_vertices, faces)?;

    let mut mesh = HeMesh::with_capacity(num_vertices, faces.len());
    let vertex_ids: Vec<VertexId<I>> = (0..num_vertices)
        .map(|i| mesh.vertices.insert(Vertex::new(vertex_fn(i))))
        .collect();

    // Directed edge (a, b) -> half-edge a -> b. Both halves are entered when
    // the pair is allocated.
    let mut edge_map: HashMap<(usize, usize), HalfEdgeId<I>> = HashMap::new();
    let mut degree = vec![0usize; num_vertices];

    for (fi, face) in faces.iter().enumerate() {
        let face = face.as_ref();
        let n = face.len();
        let f = mesh
            .faces
            .insert(Face::new(HalfEdgeId::invalid(), face_fn(fi)));

        let mut sides = Vec::with_capacity(n);
        for k in 0..n {
            let (a, b) = (face[k], face[(k + 1) % n]);
            let he = match edge_map.get(&(a, b)) {
                Some(&he) => {
                    if mesh.halfedges.get(he).face.is_valid() {
                        return Err(MeshError::NonManifoldEdge { v0: a, v1: b });
                    }
                    he
                }
                None => {
                    let he = mesh.halfedges.insert_pair(
                        HalfEdge::new(vertex_ids[a]),
                        HalfEdge::new(vertex_ids[b]),
                    );
                    edge_map.insert((a, b), he);
                    edge_map.insert((b, a), he.twin());
                    degree[a] += 1;
                    degree[b] += 1;
                    mesh.vertices.get_mut(vertex_ids[a]).halfedge = he;
                    mesh.vertices.get_mut(vertex_ids[b]).halfedge = he.twin();
                    he
                }
            };
            mesh.halfedges.get_mut(he).face = f;
            sides.push(he);
        }

        for k in 0..n {
            let (he, next) = (sides[k], sides[(k + 1) % n]);
            mesh.halfedges.get_mut(he).next = next;
            mesh.halfedges.get_mut(next).prev = he;
        }
        mesh.faces.get_mut(f).halfedge = sides[0];
    }

    link_boundary_loops(&mut mesh)?;

    let mut unreferenced = 0;
    for (i, &v) in vertex_ids.iter().enumerate() {
        if degree[i] == 0 {
            mesh.vertices.remove(v);
            unreferenced += 1;
            continue;
        }
        edit::prefer_boundary_first(&mut mesh.vertices, &mesh.halfedges, v);
        let reached = mesh.vertex_degree(v)?;
        if reached != degree[i] {
            return Err(MeshError::NonManifoldVertex {
                vertex: i,
                reached,
                expected: degree[i],
            });
        }
    }

    if unreferenced > 0 {
        log::debug!("removed {unreferenced} vertices not used by any face");
    }
    log::debug!(
        "built mesh: {} vertices, {} edges, {} faces",
        mesh.num_vertices(),
        mesh.num_edges(),
        mesh.num_faces()
    );
    Ok(mesh)
}

/// Build a half-edge mesh from vertex positions and triangle faces.
///
/// # Example
/// ```
/// use tessel::mesh::{build_from_triangles, FaceTopology, HeMesh, Topology};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2]];
///
/// let mesh: HeMesh = build_from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_from_triangles<V, I>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<HeMesh<V, (), I>>
where
    V: From<Point3<f64>>,
    I: MeshIndex,
{
    build_from_polygons(vertices.len(), faces, |i| V::from(vertices[i]), |_| ())
}

/// Build a half-edge mesh from vertex positions and quad faces
/// (counter-clockwise).
pub fn build_from_quads<V, I>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 4]],
) -> Result<HeMesh<V, (), I>>
where
    V: From<Point3<f64>>,
    I: MeshIndex,
{
    build_from_polygons(vertices.len(), faces, |i| V::from(vertices[i]), |_| ())
}

/// Build a mesh whose vertex payloads are assembled from attribute buffers
/// through the setter traits.
pub fn build_from_attributes<V, I, P>(
    attributes: &VertexAttributes,
    faces: &[P],
) -> Result<HeMesh<V, (), I>>
where
    V: Default + SetPosition + SetNormal + SetTexCoord,
    I: MeshIndex,
    P: AsRef<[usize]>,
{
    attributes.validate()?;
    build_from_polygons(attributes.len(), faces, |i| attributes.vertex(i), |_| ())
}

fn validate_polygons<P: AsRef<[usize]>>(num_vertices: usize, faces: &[P]) -> Result<()> {
    for (fi, face) in faces.iter().enumerate() {
        let face = face.as_ref();
        if face.len() < 3 {
            return Err(MeshError::DegenerateFace { face: fi });
        }
        for (k, &vi) in face.iter().enumerate() {
            if vi >= num_vertices {
                return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
            }
            if face[..k].contains(&vi) {
                return Err(MeshError::DegenerateFace { face: fi });
            }
        }
    }
    Ok(())
}

/// Link boundary half-edges into hole loops.
///
/// The boundary half-edge after `h` (ending at `b`) is found by rotating
/// from `twin(h)` through the faces around `b` until a boundary half-edge
/// leaves `b`. Rotating instead of looking `b` up in a table keeps the faces
/// around a pinched vertex in separate loops, which the degree check then
/// reports.
fn link_boundary_loops<V, F, I: MeshIndex>(mesh: &mut HeMesh<V, F, I>) -> Result<()> {
    let boundary: Vec<HalfEdgeId<I>> = mesh
        .halfedge_ids()
        .filter(|&he| mesh.is_boundary_halfedge(he))
        .collect();
    let bound = mesh.halfedges.capacity();

    for he in boundary {
        let mut candidate = he.twin();
        let mut steps = 0;
        while !mesh.is_boundary_halfedge(candidate) {
            candidate = mesh.prev(candidate).twin();
            steps += 1;
            if steps > bound {
                return Err(MeshError::corrupt(
                    "vertex",
                    mesh.end(he).index(),
                    "boundary rotation does not terminate",
                ));
            }
        }
        mesh.halfedges.get_mut(he).next = candidate;
        mesh.halfedges.get_mut(candidate).prev = he;
    }
    Ok(())
}

/// Build a half-edge graph from a segment list.
///
/// Repeated segments (in either direction) are kept once. Vertices no segment
/// refers to are created and immediately removed.
///
/// # Errors
/// - [`MeshError::EmptyMesh`] if there are no segments
/// - [`MeshError::InvalidVertexIndex`] for out-of-range indices (`face` is
///   the segment index)
/// - [`MeshError::DegenerateFace`] for a segment joining a vertex to itself
pub fn build_graph<V, I, VF>(
    num_vertices: usize,
    segments: &[[usize; 2]],
    mut vertex_fn: VF,
) -> Result<HeGraph<V, I>>
where
    I: MeshIndex,
    VF: FnMut(usize) -> V,
{
    if segments.is_empty() {
        return Err(MeshError::EmptyMesh);
    }
    for (si, &[a, b]) in segments.iter().enumerate() {
        for vi in [a, b] {
            if vi >= num_vertices {
                return Err(MeshError::InvalidVertexIndex { face: si, vertex: vi });
            }
        }
        if a == b {
            return Err(MeshError::DegenerateFace { face: si });
        }
    }

    let mut graph = HeGraph::with_capacity(num_vertices, segments.len());
    let ids: Vec<VertexId<I>> = (0..num_vertices)
        .map(|i| graph.add_vertex(vertex_fn(i)))
        .collect();

    let mut seen = HashSet::with_capacity(segments.len());
    let mut duplicates = 0;
    for &[a, b] in segments {
        if !seen.insert((a.min(b), a.max(b))) {
            duplicates += 1;
            continue;
        }
        edit::insert_edge(&mut graph.vertices, &mut graph.halfedges, ids[a], ids[b]);
    }

    for &v in &ids {
        if graph.is_isolated(v) {
            graph.vertices.remove(v);
        }
    }

    if duplicates > 0 {
        log::debug!("skipped {duplicates} repeated segments");
    }
    log::debug!(
        "built graph: {} vertices, {} edges",
        graph.num_vertices(),
        graph.num_edges()
    );
    Ok(graph)
}

/// Build a graph from unconnected line segments, welding endpoints closer
/// than `tolerance`.
///
/// Segments that collapse to a point after welding are dropped.
pub fn graph_from_line_soup<V, I>(lines: &[[Point3<f64>; 2]], tolerance: f64) -> Result<HeGraph<V, I>>
where
    V: From<Point3<f64>>,
    I: MeshIndex,
{
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(MeshError::invalid_param(
            "tolerance",
            tolerance,
            "must be finite and non-negative",
        ));
    }

    let mut welder = Welder::new(tolerance);
    let mut segments = Vec::with_capacity(lines.len());
    let mut collapsed = 0;
    for &[p, q] in lines {
        let (a, b) = (welder.insert(p), welder.insert(q));
        if a == b {
            collapsed += 1;
        } else {
            segments.push([a, b]);
        }
    }
    if collapsed > 0 {
        log::debug!("dropped {collapsed} segments shorter than the weld tolerance");
    }

    let points = welder.points;
    build_graph(points.len(), &segments, |i| V::from(points[i]))
}

/// Spatial hash merging points within a tolerance.
struct Welder {
    tolerance: f64,
    cell: f64,
    points: Vec<Point3<f64>>,
    grid: HashMap<[i64; 3], Vec<usize>>,
}

impl Welder {
    fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            cell: if tolerance > 0.0 { tolerance } else { 1.0 },
            points: Vec::new(),
            grid: HashMap::new(),
        }
    }

    fn key(&self, p: &Point3<f64>) -> [i64; 3] {
        [
            (p.x / self.cell).floor() as i64,
            (p.y / self.cell).floor() as i64,
            (p.z / self.cell).floor() as i64,
        ]
    }

    /// Index of an existing point within tolerance, or of `p` newly added.
    fn insert(&mut self, p: Point3<f64>) -> usize {
        let [x, y, z] = self.key(&p);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if let Some(bucket) = self.grid.get(&[x + dx, y + dy, z + dz]) {
                        if let Some(&i) = bucket
                            .iter()
                            .find(|&&i| (self.points[i] - p).norm() <= self.tolerance)
                        {
                            return i;
                        }
                    }
                }
            }
        }
        let i = self.points.len();
        self.points.push(p);
        self.grid.entry([x, y, z]).or_default().push(i);
        i
    }
}

/// Dense renumbering of live vertices in index order.
fn dense_vertices<M, T, G>(topo: &M, mut vertex_fn: G) -> (Vec<T>, Vec<usize>)
where
    M: Topology,
    G: FnMut(&M::Vertex) -> T,
{
    let mut index = vec![usize::MAX; topo.vertex_store().capacity()];
    let mut out = Vec::with_capacity(topo.num_vertices());
    for v in topo.vertex_ids() {
        index[v.index()] = out.len();
        out.push(vertex_fn(topo.vertex_data(v)));
    }
    (out, index)
}

/// Convert a mesh back to a face-vertex representation.
///
/// Live vertices are renumbered densely in index order and mapped through
/// `vertex_fn`.
pub fn to_face_vertex<M, T, G>(mesh: &M, vertex_fn: G) -> (Vec<T>, Vec<Vec<usize>>)
where
    M: FaceTopology,
    G: FnMut(&M::Vertex) -> T,
{
    let (vertices, index) = dense_vertices(mesh, vertex_fn);
    let faces = mesh
        .face_ids()
        .map(|f| mesh.face_vertices(f).map(|v| index[v.index()]).collect())
        .collect();
    (vertices, faces)
}

/// Convert a mesh to a triangle list, fanning polygons around their first
/// vertex.
pub fn to_triangles<M, T, G>(mesh: &M, vertex_fn: G) -> (Vec<T>, Vec<[usize; 3]>)
where
    M: FaceTopology,
    G: FnMut(&M::Vertex) -> T,
{
    let (vertices, index) = dense_vertices(mesh, vertex_fn);
    let mut triangles = Vec::with_capacity(mesh.num_faces());
    for f in mesh.face_ids() {
        let corners: Vec<usize> = mesh.face_vertices(f).map(|v| index[v.index()]).collect();
        for k in 1..corners.len().saturating_sub(1) {
            triangles.push([corners[0], corners[k], corners[k + 1]]);
        }
    }
    (vertices, triangles)
}

/// Convert the edges of a graph (or mesh) to a segment list.
pub fn graph_segments<M, T, G>(topo: &M, vertex_fn: G) -> (Vec<T>, Vec<[usize; 2]>)
where
    M: Topology,
    G: FnMut(&M::Vertex) -> T,
{
    let (vertices, index) = dense_vertices(topo, vertex_fn);
    let segments = topo
        .edge_ids()
        .map(|e| {
            let he = e.halfedge();
            [index[topo.start(he).index()], index[topo.end(he).index()]]
        })
        .collect();
    (vertices, segments)
}

/// Split a graph into maximal polylines.
///
/// A polyline runs between vertices whose degree is not two, passing
/// through degree-two vertices. Cycles made only of degree-two vertices come
/// out as closed polylines whose last vertex repeats the first.
///
/// Marks half-edges with a fresh tag, so it must not run during another
/// half-edge traversal.
pub fn polylines<M: Topology>(topo: &M) -> Vec<Vec<VertexId<M::Index>>> {
    let tags = topo.halfedge_store().tags();
    let tag = tags.next_tag();
    let degree = |v: VertexId<M::Index>| topo.outgoing(v).count();

    let trace = |start: HalfEdgeId<M::Index>| {
        let mut line = vec![topo.start(start)];
        let mut he = start;
        loop {
            tags.mark(he.index(), tag);
            tags.mark(he.twin().index(), tag);
            let v = topo.end(he);
            line.push(v);
            if degree(v) != 2 {
                break;
            }
            he = topo.next(he);
            if tags.is_marked(he.index(), tag) {
                break;
            }
        }
        line
    };

    let mut lines = Vec::new();
    for v in topo.vertex_ids() {
        if degree(v) == 2 {
            continue;
        }
        for he in topo.outgoing(v) {
            if !tags.is_marked(he.index(), tag) {
                lines.push(trace(he));
            }
        }
    }
    for he in topo.halfedge_ids() {
        if !tags.is_marked(he.index(), tag) {
            lines.push(trace(he));
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::attributes::MeshVertex;
    use nalgebra::Vector3;

    fn single_triangle() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2]];
        (vertices, faces)
    }

    fn two_triangles() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        // Two triangles sharing an edge
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [1, 0, 3]];
        (vertices, faces)
    }

    fn octahedron() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let vertices = vec![
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, -1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, -1.0),
        ];
        let faces = vec![
            [0, 2, 4],
            [2, 1, 4],
            [1, 3, 4],
            [3, 0, 4],
            [2, 0, 5],
            [1, 2, 5],
            [3, 1, 5],
            [0, 3, 5],
        ];
        (vertices, faces)
    }

    #[test]
    fn test_single_triangle() {
        let (vertices, faces) = single_triangle();
        let mesh: HeMesh = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_faces(), 1);
        // 3 interior half-edges + 3 boundary half-edges
        assert_eq!(mesh.num_halfedges(), 6);
        assert!(mesh.is_valid());

        for v in mesh.vertex_ids() {
            assert!(mesh.is_boundary_vertex(v));
            assert!(mesh.is_boundary_halfedge(mesh.first(v)));
        }
    }

    #[test]
    fn test_two_triangles() {
        let (vertices, faces) = two_triangles();
        let mesh: HeMesh = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 2);
        // 6 interior half-edges + 4 boundary half-edges
        assert_eq!(mesh.num_halfedges(), 10);
        assert!(mesh.is_valid());
        assert_eq!(mesh.boundary_loops().len(), 1);
    }

    #[test]
    fn test_closed_mesh_degrees() {
        let (vertices, faces) = octahedron();
        let mesh: HeMesh<Point3<f64>, (), u16> = build_from_triangles(&vertices, &faces).unwrap();

        assert!(mesh.is_valid());
        assert_eq!(mesh.num_edges(), 12);
        assert_eq!(mesh.euler_characteristic(), 2);
        assert!(mesh.boundary_loops().is_empty());

        // Degree from circulation matches the incidence count of the input.
        let mut expected = [0usize; 6];
        for face in &faces {
            for &v in face {
                expected[v] += 2;
            }
        }
        for v in mesh.vertex_ids() {
            assert_eq!(mesh.vertex_degree(v).unwrap(), expected[v.index()] / 2);
            assert_eq!(mesh.outgoing(v).count(), 4);
            assert_eq!(mesh.vertex_faces(v).count(), 4);
        }
    }

    #[test]
    fn test_restartable_circulation() {
        let (vertices, faces) = octahedron();
        let mesh: HeMesh = build_from_triangles(&vertices, &faces).unwrap();
        let v = VertexId::new(4);

        let first: Vec<_> = mesh.outgoing(v).collect();
        let circ = mesh.outgoing(v);
        let again: Vec<_> = circ.clone().collect();
        assert_eq!(first, again);
        assert_eq!(circ.count(), 4);
        let incoming: Vec<_> = mesh.incoming(v).collect();
        for (o, i) in first.iter().zip(&incoming) {
            assert_eq!(o.twin(), *i);
            assert_eq!(mesh.end(*i), v);
        }
    }

    #[test]
    fn test_polygon_payloads() {
        let faces = vec![vec![0, 1, 2, 3], vec![3, 2, 4]];
        let mesh: HeMesh<usize, char> = build_from_polygons(
            5,
            &faces,
            |i| i * 10,
            |f| if f == 0 { 'q' } else { 't' },
        )
        .unwrap();

        assert!(mesh.is_valid());
        assert_eq!(*mesh.vertex_data(VertexId::new(4)), 40);
        let degrees: Vec<_> = mesh
            .face_ids()
            .map(|f| (*mesh.face_data(f), mesh.face_degree(f).unwrap()))
            .collect();
        assert_eq!(degrees, vec![('q', 4), ('t', 3)]);
    }

    #[test]
    fn test_unreferenced_vertex_removed() {
        let (mut vertices, faces) = single_triangle();
        vertices.push(Point3::new(5.0, 5.0, 5.0));
        let mesh: HeMesh = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 3);
        assert!(mesh.vertex_store().is_unused(VertexId::new(3)));
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_invalid_vertex_index() {
        let vertices = vec![Point3::new(0.0, 0.0, 0.0)];
        let faces = vec![[0, 1, 2]];

        let result: Result<HeMesh> = build_from_triangles(&vertices, &faces);
        assert_eq!(
            result.unwrap_err(),
            MeshError::InvalidVertexIndex { face: 0, vertex: 1 }
        );
    }

    #[test]
    fn test_degenerate_face() {
        let (vertices, _) = single_triangle();
        let result: Result<HeMesh> = build_from_triangles(&vertices, &[[0, 0, 2]]);
        assert_eq!(result.unwrap_err(), MeshError::DegenerateFace { face: 0 });

        let result: Result<HeMesh> = build_from_quads(&vertices, &[[0, 1, 0, 2]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_non_manifold_edge() {
        let (vertices, _) = two_triangles();
        // Both faces traverse 0 -> 1.
        let result: Result<HeMesh> = build_from_triangles(&vertices, &[[0, 1, 2], [0, 1, 3]]);
        assert_eq!(result.unwrap_err(), MeshError::NonManifoldEdge { v0: 0, v1: 1 });
    }

    #[test]
    fn test_non_manifold_vertex() {
        // Two triangles touching only at vertex 0.
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(-1.0, -1.0, 0.0),
        ];
        let result: Result<HeMesh> = build_from_triangles(&vertices, &[[0, 1, 2], [0, 3, 4]]);
        assert!(matches!(
            result,
            Err(MeshError::NonManifoldVertex { vertex: 0, .. })
        ));
    }

    #[test]
    fn test_empty() {
        let result: Result<HeMesh> = build_from_triangles(&[], &[]);
        assert_eq!(result.unwrap_err(), MeshError::EmptyMesh);
    }

    #[test]
    fn test_roundtrip() {
        let (vertices, faces) = two_triangles();
        let mesh: HeMesh = build_from_triangles(&vertices, &faces).unwrap();

        let (out_verts, out_faces) = to_face_vertex(&mesh, |p| *p);
        assert_eq!(vertices.len(), out_verts.len());
        for (v_in, v_out) in vertices.iter().zip(out_verts.iter()) {
            assert!((v_in - v_out).norm() < 1e-10);
        }
        let expected: Vec<Vec<usize>> = faces.iter().map(|f| f.to_vec()).collect();
        assert_eq!(out_faces, expected);
    }

    #[test]
    fn test_to_triangles_renumbers() {
        let vertices = vec![
            Point3::new(9.0, 9.0, 9.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh: HeMesh = build_from_quads(&vertices, &[[1, 2, 3, 4]]).unwrap();
        let (out_verts, tris) = to_triangles(&mesh, |p| p.x);

        assert_eq!(out_verts, vec![0.0, 1.0, 1.0, 0.0]);
        assert_eq!(tris, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_build_from_attributes() {
        let (positions, faces) = single_triangle();
        let attrs = VertexAttributes::from_positions(positions)
            .with_normals(vec![Vector3::z(); 3]);
        let mesh: HeMesh<MeshVertex> = build_from_attributes(&attrs, &faces).unwrap();

        assert_eq!(mesh.vertex_data(VertexId::new(2)).normal, Vector3::z());
        assert_eq!(mesh.vertex_data(VertexId::new(1)).position.x, 1.0);
    }

    #[test]
    fn test_build_graph() {
        let graph: HeGraph<usize> =
            build_graph(5, &[[0, 1], [1, 2], [2, 1], [1, 3]], |i| i).unwrap();

        assert!(graph.is_valid());
        assert_eq!(graph.num_edges(), 3);
        assert_eq!(graph.num_vertices(), 4);
        assert_eq!(graph.vertex_degree(VertexId::new(1)).unwrap(), 3);
        assert!(graph.vertex_store().is_unused(VertexId::new(4)));

        let result: Result<HeGraph<usize>> = build_graph(2, &[[1, 1]], |i| i);
        assert_eq!(result.unwrap_err(), MeshError::DegenerateFace { face: 0 });
    }

    #[test]
    fn test_line_soup_welding() {
        let p = |x: f64, y: f64| Point3::new(x, y, 0.0);
        let lines = [
            [p(0.0, 0.0), p(1.0, 0.0)],
            [p(1.0 + 1e-9, 0.0), p(1.0, 1.0)],
            [p(1.0, 1.0 - 1e-9), p(0.0, 0.0)],
            [p(5.0, 5.0), p(5.0, 5.0 + 1e-12)],
        ];
        let graph: HeGraph = graph_from_line_soup(&lines, 1e-6).unwrap();

        assert!(graph.is_valid());
        assert_eq!(graph.num_vertices(), 3);
        assert_eq!(graph.num_edges(), 3);
        for v in graph.vertex_ids() {
            assert_eq!(graph.vertex_degree(v).unwrap(), 2);
        }

        assert!(graph_from_line_soup::<Point3<f64>, u32>(&lines, -1.0).is_err());
    }

    #[test]
    fn test_polylines() {
        // A "T": 0-1-2 with a branch 1-3-4, plus a separate triangle 5-6-7.
        let graph: HeGraph<usize> = build_graph(
            8,
            &[[0, 1], [1, 2], [1, 3], [3, 4], [5, 6], [6, 7], [7, 5]],
            |i| i,
        )
        .unwrap();
        let lines = polylines(&graph);
        let as_indices: Vec<Vec<usize>> = lines
            .iter()
            .map(|l| l.iter().map(|v| v.index()).collect())
            .collect();

        assert_eq!(lines.len(), 4);
        let covered: usize = lines.iter().map(|l| l.len() - 1).sum();
        assert_eq!(covered, graph.num_edges());
        assert!(as_indices.contains(&vec![0, 1]));
        assert!(as_indices
            .iter()
            .any(|l| l.len() == 4 && l.first() == l.last() && l[0] >= 5));
        assert!(as_indices
            .iter()
            .any(|l| l == &vec![1, 3, 4] || l == &vec![4, 3, 1]));

        let (_, segments) = graph_segments(&graph, |&i| i);
        assert_eq!(segments.len(), 7);
    }
}
