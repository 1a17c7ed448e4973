//! Geometric measures on half-edge structures.
//!
//! Every function is generic over the topology and works for any vertex
//! payload implementing [`Position`], so the same code measures a 3D mesh,
//! a 2D graph or a mesh with full [`MeshVertex`](crate::mesh::MeshVertex)
//! attributes.
//!
//! Functions documented as triangle-only do not check the face degree; on a
//! larger polygon they use the first three corners.

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use crate::mesh::{EdgeId, FaceId, FaceTopology, HalfEdgeId, Position, Topology, VertexId};

/// Below this the cross product of a corner is treated as degenerate.
const DEGENERATE_EPS: f64 = 1e-10;

/// Position of a vertex.
#[inline]
pub fn position<T>(topo: &T, v: VertexId<T::Index>) -> Point3<f64>
where
    T: Topology + ?Sized,
    T::Vertex: Position,
{
    topo.vertex_data(v).position()
}

/// Vector from the start to the end of a half-edge.
#[inline]
pub fn halfedge_vector<T>(topo: &T, he: HalfEdgeId<T::Index>) -> Vector3<f64>
where
    T: Topology + ?Sized,
    T::Vertex: Position,
{
    position(topo, topo.end(he)) - position(topo, topo.start(he))
}

/// Length of a half-edge.
#[inline]
pub fn halfedge_length<T>(topo: &T, he: HalfEdgeId<T::Index>) -> f64
where
    T: Topology + ?Sized,
    T::Vertex: Position,
{
    halfedge_vector(topo, he).norm()
}

/// Midpoint of an edge.
pub fn edge_midpoint<T>(topo: &T, e: EdgeId<T::Index>) -> Point3<f64>
where
    T: Topology + ?Sized,
    T::Vertex: Position,
{
    let he = e.halfedge();
    let p0 = position(topo, topo.start(he));
    let p1 = position(topo, topo.end(he));
    Point3::from((p0.coords + p1.coords) * 0.5)
}

/// Interior angle at the start of `he`, between `he` and the reverse of its
/// predecessor. In `[0, π]`; a zero-length side gives `NaN`.
pub fn halfedge_angle<T>(topo: &T, he: HalfEdgeId<T::Index>) -> f64
where
    T: Topology + ?Sized,
    T::Vertex: Position,
{
    let a = halfedge_vector(topo, he);
    let b = -halfedge_vector(topo, topo.prev(he));
    let cos = a.dot(&b) / (a.norm() * b.norm());
    cos.clamp(-1.0, 1.0).acos()
}

/// Cotangent of the angle opposite `he` in its face.
///
/// Triangle-only. Returns 0 on the hole side of a boundary edge and for
/// degenerate triangles.
pub fn halfedge_cotangent<T>(topo: &T, he: HalfEdgeId<T::Index>) -> f64
where
    T: Topology + ?Sized,
    T::Vertex: Position,
{
    if !topo.face_of(he).is_valid() {
        return 0.0;
    }
    let opposite = position(topo, topo.start(topo.prev(he)));
    let u = position(topo, topo.start(he)) - opposite;
    let w = position(topo, topo.end(he)) - opposite;
    let cross_norm = u.cross(&w).norm();
    if cross_norm < DEGENERATE_EPS {
        0.0
    } else {
        u.dot(&w) / cross_norm
    }
}

/// Cotangent weight of an edge: `(cot α + cot β) / 2` over the angles
/// opposite it.
pub fn edge_cotangent_weight<T>(topo: &T, e: EdgeId<T::Index>) -> f64
where
    T: Topology + ?Sized,
    T::Vertex: Position,
{
    let [h, t] = e.halfedges();
    0.5 * (halfedge_cotangent(topo, h) + halfedge_cotangent(topo, t))
}

/// Unit normal of the corner at the start of `he`, oriented like the face
/// of `he`. Zero for a degenerate corner.
pub fn halfedge_normal<T>(topo: &T, he: HalfEdgeId<T::Index>) -> Vector3<f64>
where
    T: Topology + ?Sized,
    T::Vertex: Position,
{
    let a = halfedge_vector(topo, he);
    let b = -halfedge_vector(topo, topo.prev(he));
    a.cross(&b)
        .try_normalize(DEGENERATE_EPS)
        .unwrap_or_else(Vector3::zeros)
}

/// Newell's vector of a face: twice its area times its normal.
fn newell<M>(mesh: &M, f: FaceId<M::Index>) -> Vector3<f64>
where
    M: FaceTopology + ?Sized,
    M::Vertex: Position,
{
    let mut n = Vector3::zeros();
    for he in mesh.face_halfedges(f) {
        let p = position(mesh, mesh.start(he));
        let q = position(mesh, mesh.end(he));
        n.x += (p.y - q.y) * (p.z + q.z);
        n.y += (p.z - q.z) * (p.x + q.x);
        n.z += (p.x - q.x) * (p.y + q.y);
    }
    n
}

/// Area vector of a face: the cross product for triangles, Newell's vector
/// for larger polygons. Its norm is twice the area.
fn area_vector<M>(mesh: &M, f: FaceId<M::Index>) -> Vector3<f64>
where
    M: FaceTopology + ?Sized,
    M::Vertex: Position,
{
    let h0 = mesh.face_first(f);
    let h1 = mesh.next(h0);
    let h2 = mesh.next(h1);
    if mesh.next(h2) == h0 {
        let p0 = position(mesh, mesh.start(h0));
        let e1 = position(mesh, mesh.start(h1)) - p0;
        let e2 = position(mesh, mesh.start(h2)) - p0;
        e1.cross(&e2)
    } else {
        newell(mesh, f)
    }
}

/// Unit normal of a face. Zero for a degenerate face.
pub fn face_normal<M>(mesh: &M, f: FaceId<M::Index>) -> Vector3<f64>
where
    M: FaceTopology + ?Sized,
    M::Vertex: Position,
{
    area_vector(mesh, f)
        .try_normalize(DEGENERATE_EPS)
        .unwrap_or_else(Vector3::zeros)
}

/// Area of a face.
pub fn face_area<M>(mesh: &M, f: FaceId<M::Index>) -> f64
where
    M: FaceTopology + ?Sized,
    M::Vertex: Position,
{
    0.5 * area_vector(mesh, f).norm()
}

/// Average of the corner positions of a face.
pub fn face_centroid<M>(mesh: &M, f: FaceId<M::Index>) -> Point3<f64>
where
    M: FaceTopology + ?Sized,
    M::Vertex: Position,
{
    let mut sum = Vector3::zeros();
    let mut n = 0usize;
    for v in mesh.face_vertices(f) {
        sum += position(mesh, v).coords;
        n += 1;
    }
    Point3::from(sum / n.max(1) as f64)
}

fn triangle_positions<M>(mesh: &M, f: FaceId<M::Index>) -> [Point3<f64>; 3]
where
    M: FaceTopology + ?Sized,
    M::Vertex: Position,
{
    mesh.face_triangle(f).map(|v| position(mesh, v))
}

/// Circumcenter of a triangular face. Triangle-only; non-finite for a
/// degenerate triangle.
pub fn face_circumcenter<M>(mesh: &M, f: FaceId<M::Index>) -> Point3<f64>
where
    M: FaceTopology + ?Sized,
    M::Vertex: Position,
{
    let [p0, p1, p2] = triangle_positions(mesh, f);
    let a = p1 - p0;
    let b = p2 - p0;
    let axb = a.cross(&b);
    let offset = (a.norm_squared() * b - b.norm_squared() * a).cross(&axb)
        / (2.0 * axb.norm_squared());
    p0 + offset
}

/// Incenter of a triangular face. Triangle-only.
pub fn face_incenter<M>(mesh: &M, f: FaceId<M::Index>) -> Point3<f64>
where
    M: FaceTopology + ?Sized,
    M::Vertex: Position,
{
    let [p0, p1, p2] = triangle_positions(mesh, f);
    // Each corner is weighted by the length of the side opposite it.
    let l0 = (p2 - p1).norm();
    let l1 = (p0 - p2).norm();
    let l2 = (p1 - p0).norm();
    let sum = l0 + l1 + l2;
    Point3::from((l0 * p0.coords + l1 * p1.coords + l2 * p2.coords) / sum)
}

/// Largest distance of a corner from the plane through the centroid with
/// the face normal. Zero for planar faces.
pub fn face_planarity<M>(mesh: &M, f: FaceId<M::Index>) -> f64
where
    M: FaceTopology + ?Sized,
    M::Vertex: Position,
{
    let n = newell(mesh, f)
        .try_normalize(DEGENERATE_EPS)
        .unwrap_or_else(Vector3::zeros);
    let c = face_centroid(mesh, f);
    mesh.face_vertices(f)
        .map(|v| (position(mesh, v) - c).dot(&n).abs())
        .fold(0.0, f64::max)
}

/// Area-weighted unit normal at a vertex. Zero for a vertex without faces.
pub fn vertex_normal<M>(mesh: &M, v: VertexId<M::Index>) -> Vector3<f64>
where
    M: FaceTopology + ?Sized,
    M::Vertex: Position,
{
    let mut normal = Vector3::zeros();
    for f in mesh.vertex_faces(v) {
        normal += area_vector(mesh, f);
    }
    normal
        .try_normalize(DEGENERATE_EPS)
        .unwrap_or_else(Vector3::zeros)
}

/// Evaluate `measure` for every slot of a collection of `capacity` slots.
/// Removed slots get `fill`.
fn per_slot<T, G, H>(capacity: usize, parallel: bool, fill: T, is_unused: G, measure: H) -> Vec<T>
where
    T: Send + Sync + Clone,
    G: Fn(usize) -> bool + Sync,
    H: Fn(usize) -> T + Sync,
{
    let compute = |i: usize| {
        if is_unused(i) {
            fill.clone()
        } else {
            measure(i)
        }
    };
    if parallel {
        (0..capacity).into_par_iter().map(compute).collect()
    } else {
        (0..capacity).map(compute).collect()
    }
}

/// Area of every face, indexed by face slot. Removed slots read 0.
pub fn face_areas<M>(mesh: &M, parallel: bool) -> Vec<f64>
where
    M: FaceTopology + Sync,
    M::Vertex: Position,
{
    per_slot(
        mesh.face_store().capacity(),
        parallel,
        0.0,
        |i| mesh.face_store().is_unused(FaceId::new(i)),
        |i| face_area(mesh, FaceId::<M::Index>::new(i)),
    )
}

/// Unit normal of every face, indexed by face slot. Removed slots read zero.
pub fn face_normals<M>(mesh: &M, parallel: bool) -> Vec<Vector3<f64>>
where
    M: FaceTopology + Sync,
    M::Vertex: Position,
{
    per_slot(
        mesh.face_store().capacity(),
        parallel,
        Vector3::zeros(),
        |i| mesh.face_store().is_unused(FaceId::new(i)),
        |i| face_normal(mesh, FaceId::<M::Index>::new(i)),
    )
}

/// Area-weighted unit normal of every vertex, indexed by vertex slot.
pub fn vertex_normals<M>(mesh: &M, parallel: bool) -> Vec<Vector3<f64>>
where
    M: FaceTopology + Sync,
    M::Vertex: Position,
{
    per_slot(
        mesh.vertex_store().capacity(),
        parallel,
        Vector3::zeros(),
        |i| mesh.vertex_store().is_unused(VertexId::new(i)),
        |i| vertex_normal(mesh, VertexId::<M::Index>::new(i)),
    )
}

/// Total area of all live faces.
pub fn surface_area<M>(mesh: &M) -> f64
where
    M: FaceTopology + ?Sized,
    M::Vertex: Position,
{
    mesh.face_ids().map(|f| face_area(mesh, f)).sum()
}

/// Total length of all live edges.
pub fn total_edge_length<T>(topo: &T) -> f64
where
    T: Topology + ?Sized,
    T::Vertex: Position,
{
    topo.edge_ids()
        .map(|e| halfedge_length(topo, e.halfedge()))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_from_polygons, build_from_triangles, HeGraph, HeMesh};
    use nalgebra::Point2;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    fn right_triangle() -> HeMesh {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        build_from_triangles(&positions, &[[0, 1, 2]]).unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-10
    }

    #[test]
    fn test_lengths_and_vectors() {
        let mesh = right_triangle();
        let he = mesh.find_halfedge(VertexId::new(1), VertexId::new(2)).unwrap();
        assert!(approx(halfedge_length(&mesh, he), 2f64.sqrt()));
        assert_eq!(halfedge_vector(&mesh, he), Vector3::new(-1.0, 1.0, 0.0));
        assert_eq!(edge_midpoint(&mesh, he.edge()), Point3::new(0.5, 0.5, 0.0));
        assert!(approx(total_edge_length(&mesh), 2.0 + 2f64.sqrt()));
    }

    #[test]
    fn test_angles_sum_to_pi() {
        let mesh = right_triangle();
        let f = mesh.face_ids().next().unwrap();
        let angles: Vec<f64> = mesh
            .face_halfedges(f)
            .map(|he| halfedge_angle(&mesh, he))
            .collect();
        assert!(approx(angles.iter().sum::<f64>(), PI));

        let he0 = mesh.find_halfedge(VertexId::new(0), VertexId::new(1)).unwrap();
        assert!(approx(halfedge_angle(&mesh, he0), FRAC_PI_2));
        let he1 = mesh.find_halfedge(VertexId::new(1), VertexId::new(2)).unwrap();
        assert!(approx(halfedge_angle(&mesh, he1), FRAC_PI_4));
    }

    #[test]
    fn test_zero_length_angle_is_nan() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh: HeMesh = build_from_triangles(&positions, &[[0, 1, 2]]).unwrap();
        let he = mesh.find_halfedge(VertexId::new(0), VertexId::new(1)).unwrap();
        assert!(halfedge_angle(&mesh, he).is_nan());
    }

    #[test]
    fn test_cotangents() {
        let mesh = right_triangle();
        // Opposite the hypotenuse sits the right angle.
        let hyp = mesh.find_halfedge(VertexId::new(1), VertexId::new(2)).unwrap();
        assert!(approx(halfedge_cotangent(&mesh, hyp), 0.0));
        let leg = mesh.find_halfedge(VertexId::new(0), VertexId::new(1)).unwrap();
        assert!(approx(halfedge_cotangent(&mesh, leg), 1.0));
        // Hole side contributes nothing.
        assert_eq!(halfedge_cotangent(&mesh, leg.twin()), 0.0);
        assert!(approx(edge_cotangent_weight(&mesh, leg.edge()), 0.5));
    }

    #[test]
    fn test_face_measures() {
        let mesh = right_triangle();
        let f = mesh.face_ids().next().unwrap();
        assert!(approx(face_area(&mesh, f), 0.5));
        assert_eq!(face_normal(&mesh, f), Vector3::z());
        let c = face_centroid(&mesh, f);
        assert!(approx(c.x, 1.0 / 3.0) && approx(c.y, 1.0 / 3.0));

        let cc = face_circumcenter(&mesh, f);
        assert!(approx(cc.x, 0.5) && approx(cc.y, 0.5) && approx(cc.z, 0.0));

        // Inradius of the unit right triangle is 1 - 1/sqrt(2).
        let ic = face_incenter(&mesh, f);
        let r = 1.0 - 1.0 / 2f64.sqrt();
        assert!(approx(ic.x, r) && approx(ic.y, r));

        assert!(approx(face_planarity(&mesh, f), 0.0));
        assert_eq!(vertex_normal(&mesh, VertexId::new(0)), Vector3::z());
        assert_eq!(halfedge_normal(&mesh, mesh.face_first(f)), Vector3::z());
    }

    #[test]
    fn test_polygon_area_and_planarity() {
        let positions = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh: HeMesh<Point3<f64>> =
            build_from_polygons(5, &[vec![0, 1, 2, 3, 4]], |i| positions[i], |_| ()).unwrap();
        let f = mesh.face_ids().next().unwrap();
        assert!(approx(face_area(&mesh, f), 3.0));
        assert_eq!(face_normal(&mesh, f), Vector3::z());
        assert!(approx(surface_area(&mesh), 3.0));

        // Lift one corner: the quad is no longer planar.
        let warped = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.5),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let quad: HeMesh<Point3<f64>> =
            build_from_polygons(4, &[[0, 1, 2, 3]], |i| warped[i], |_| ()).unwrap();
        let g = quad.face_ids().next().unwrap();
        assert!(face_planarity(&quad, g) > 0.05);
    }

    #[test]
    fn test_batch_measures_match_parallel() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 1.0),
        ];
        let mesh: HeMesh = build_from_triangles(&positions, &[[0, 1, 2], [0, 2, 3]]).unwrap();
        assert_eq!(face_areas(&mesh, true), face_areas(&mesh, false));
        assert_eq!(face_normals(&mesh, true), face_normals(&mesh, false));
        let normals = vertex_normals(&mesh, true);
        assert_eq!(normals, vertex_normals(&mesh, false));
        assert!(normals.iter().all(|n| approx(n.norm(), 1.0)));
    }

    #[test]
    fn test_graph_with_2d_positions() {
        let mut g: HeGraph<Point2<f64>> = HeGraph::new();
        let a = g.add_vertex(Point2::new(0.0, 0.0));
        let b = g.add_vertex(Point2::new(3.0, 4.0));
        let he = g.add_edge(a, b).unwrap();
        assert!(approx(halfedge_length(&g, he), 5.0));
        // No faces on a graph.
        assert_eq!(halfedge_cotangent(&g, he), 0.0);
    }
}
