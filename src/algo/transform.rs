//! Deformation of vertex positions.
//!
//! Transforms move vertices without touching connectivity. They run over
//! every live vertex payload, optionally across the rayon pool.
//!
//! # Example
//!
//! ```
//! use tessel::algo::transform::{bounding_box, transform_positions};
//! use tessel::mesh::{build_from_triangles, HeMesh};
//! use nalgebra::Point3;
//!
//! let positions = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mut mesh: HeMesh = build_from_triangles(&positions, &[[0, 1, 2]]).unwrap();
//!
//! transform_positions(&mut mesh, |p| p * 2.0, true);
//! let (_, max) = bounding_box(&mesh).unwrap();
//! assert_eq!(max, Point3::new(2.0, 2.0, 0.0));
//! ```

use nalgebra::{Matrix4, Point3, Vector3};

use crate::mesh::{HeGraph, HeMesh, MeshIndex, Position, SetPosition, Topology, VertexId};

use super::geometry::position;

/// Structures whose vertex payloads can be rewritten in bulk.
pub trait VertexPayloadsMut: Topology {
    /// Apply `f` to every live vertex payload.
    fn for_each_payload_mut<F>(&mut self, parallel: bool, f: F)
    where
        Self::Vertex: Send,
        F: Fn(VertexId<Self::Index>, &mut Self::Vertex) + Sync + Send;
}

impl<V, I: MeshIndex> VertexPayloadsMut for HeGraph<V, I> {
    fn for_each_payload_mut<F>(&mut self, parallel: bool, f: F)
    where
        V: Send,
        F: Fn(VertexId<I>, &mut V) + Sync + Send,
    {
        self.for_each_vertex_mut(parallel, f);
    }
}

impl<V, F, I: MeshIndex> VertexPayloadsMut for HeMesh<V, F, I> {
    fn for_each_payload_mut<G>(&mut self, parallel: bool, f: G)
    where
        V: Send,
        G: Fn(VertexId<I>, &mut V) + Sync + Send,
    {
        self.for_each_vertex_mut(parallel, f);
    }
}

/// Replace every vertex position `p` with `f(p)`.
pub fn transform_positions<T, F>(topo: &mut T, f: F, parallel: bool)
where
    T: VertexPayloadsMut,
    T::Vertex: Position + SetPosition + Send,
    F: Fn(Point3<f64>) -> Point3<f64> + Sync + Send,
{
    topo.for_each_payload_mut(parallel, |_, data| {
        let p = f(data.position());
        data.set_position(p);
    });
}

/// Apply a homogeneous 4×4 transform to every position.
pub fn transform_affine<T>(topo: &mut T, matrix: &Matrix4<f64>, parallel: bool)
where
    T: VertexPayloadsMut,
    T::Vertex: Position + SetPosition + Send,
{
    transform_positions(topo, |p| matrix.transform_point(&p), parallel);
}

/// Move every vertex by `offset`.
pub fn translate<T>(topo: &mut T, offset: Vector3<f64>, parallel: bool)
where
    T: VertexPayloadsMut,
    T::Vertex: Position + SetPosition + Send,
{
    transform_positions(topo, |p| p + offset, parallel);
}

/// Axis-aligned bounds of the live vertices, `None` without vertices.
pub fn bounding_box<T>(topo: &T) -> Option<(Point3<f64>, Point3<f64>)>
where
    T: Topology + ?Sized,
    T::Vertex: Position,
{
    let mut points = topo.vertex_ids().map(|v| position(topo, v));
    let first = points.next()?;
    Some(points.fold((first, first), |(lo, hi), p| (lo.inf(&p), hi.sup(&p))))
}

/// Center the vertices on the origin and scale them so the longest side of
/// the bounding box has unit length. Returns the applied `(offset, scale)`.
pub fn normalize_to_unit_box<T>(topo: &mut T, parallel: bool) -> Option<(Vector3<f64>, f64)>
where
    T: VertexPayloadsMut,
    T::Vertex: Position + SetPosition + Send,
{
    let (lo, hi) = bounding_box(topo)?;
    let extent = (hi - lo).max();
    let scale = if extent > 0.0 { 1.0 / extent } else { 1.0 };
    let offset = -(lo.coords + hi.coords) * 0.5;
    transform_positions(topo, |p| Point3::from((p.coords + offset) * scale), parallel);
    log::debug!("normalized {} vertices (scale {scale})", topo.num_vertices());
    Some((offset, scale))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_from_quads, MeshVertex};
    use nalgebra::{Point2, Rotation3};

    fn unit_square<V: From<Point3<f64>>>() -> HeMesh<V> {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        build_from_quads(&positions, &[[0, 1, 2, 3]]).unwrap()
    }

    #[test]
    fn test_transform_parallel_and_sequential() {
        for parallel in [false, true] {
            let mut mesh: HeMesh = unit_square();
            transform_positions(&mut mesh, |p| Point3::new(p.y, p.x, 1.0), parallel);
            assert_eq!(*mesh.vertex_data(VertexId::new(1)), Point3::new(0.0, 1.0, 1.0));
        }
    }

    #[test]
    fn test_affine_rotation() {
        let mut mesh: HeMesh = unit_square();
        let rot = Rotation3::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2);
        transform_affine(&mut mesh, &rot.to_homogeneous(), true);
        let p = *mesh.vertex_data(VertexId::new(1));
        assert!((p - Point3::new(0.0, 1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_transform_keeps_other_attributes() {
        let mut mesh: HeMesh<MeshVertex> = unit_square();
        for v in mesh.vertex_ids().collect::<Vec<_>>() {
            mesh.vertex_data_mut(v).normal = Vector3::z();
        }
        translate(&mut mesh, Vector3::new(0.0, 0.0, 5.0), false);
        let data = mesh.vertex_data(VertexId::new(2));
        assert_eq!(data.position, Point3::new(1.0, 1.0, 5.0));
        assert_eq!(data.normal, Vector3::z());
    }

    #[test]
    fn test_bounding_box_and_normalize() {
        let mut graph: HeGraph<Point2<f64>> = HeGraph::new();
        let a = graph.add_vertex(Point2::new(-1.0, 2.0));
        let b = graph.add_vertex(Point2::new(3.0, 4.0));
        graph.add_edge(a, b).unwrap();

        let (lo, hi) = bounding_box(&graph).unwrap();
        assert_eq!(lo, Point3::new(-1.0, 2.0, 0.0));
        assert_eq!(hi, Point3::new(3.0, 4.0, 0.0));

        let (_, scale) = normalize_to_unit_box(&mut graph, false).unwrap();
        assert_eq!(scale, 0.25);
        assert_eq!(*graph.vertex_data(a), Point2::new(-0.5, -0.25));
        assert_eq!(*graph.vertex_data(b), Point2::new(0.5, 0.25));

        let empty: HeGraph = HeGraph::new();
        assert!(bounding_box(&empty).is_none());
    }
}
