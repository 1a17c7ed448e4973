//! Discrete curvature on triangle meshes.
//!
//! This module provides the building blocks of discrete differential
//! geometry (dual vertex areas, angle defects, cotangent Laplacians) and a
//! batch estimator of Gaussian, mean and principal curvature.
//!
//! All operators assume triangular faces and do not check it. They are
//! generic over the mesh type and work with any vertex payload implementing
//! [`Position`].
//!
//! # Example
//!
//! ```
//! use tessel::algo::curvature::{
//!     angle_defect, compute_curvature, CurvatureOptions, DualAreaScheme,
//! };
//! use tessel::mesh::{build_from_triangles, HeMesh, VertexId};
//! use nalgebra::Point3;
//!
//! // An octahedron: four triangles meet at every vertex.
//! let positions = vec![
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(-1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(0.0, -1.0, 0.0),
//!     Point3::new(0.0, 0.0, 1.0),
//!     Point3::new(0.0, 0.0, -1.0),
//! ];
//! let faces = vec![
//!     [0, 2, 4], [2, 1, 4], [1, 3, 4], [3, 0, 4],
//!     [2, 0, 5], [1, 2, 5], [3, 1, 5], [0, 3, 5],
//! ];
//! let mesh: HeMesh = build_from_triangles(&positions, &faces).unwrap();
//!
//! let defect = angle_defect(&mesh, VertexId::new(0));
//! assert!((defect - std::f64::consts::FRAC_PI_3 * 2.0).abs() < 1e-9);
//!
//! let result = compute_curvature(&mesh, &CurvatureOptions::new(DualAreaScheme::Mixed));
//! assert!(result.gaussian(VertexId::new(0)) > 0.0);
//! ```
//!
//! # References
//!
//! - Meyer, M., et al. (2003). "Discrete Differential-Geometry Operators for
//!   Triangulated 2-Manifolds." Visualization and Mathematics III.

use std::f64::consts::PI;
use std::marker::PhantomData;

use nalgebra::{DMatrix, Vector3};
use rayon::prelude::*;

use crate::mesh::{FaceTopology, HalfEdgeId, MeshIndex, Position, PropertyRead, VertexId};

use super::geometry::{
    edge_cotangent_weight, face_area, halfedge_angle, halfedge_cotangent, halfedge_vector,
    vertex_normal,
};

/// How the area around a vertex is carved out of its incident triangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DualAreaScheme {
    /// A third of every incident triangle.
    Barycentric,
    /// The Voronoi cell clipped to the one-ring. Negative contributions from
    /// obtuse triangles are kept.
    Circumcentric,
    /// Voronoi cells for non-obtuse triangles, with the fallback of Meyer et
    /// al. for obtuse ones. Always positive.
    Mixed,
}

/// Options for batch curvature estimation.
#[derive(Debug, Clone)]
pub struct CurvatureOptions {
    /// Dual area used to turn integrated curvature into pointwise values.
    pub scheme: DualAreaScheme,
    /// Spread per-vertex work over the rayon pool.
    pub parallel: bool,
}

impl CurvatureOptions {
    /// Options for the given dual area scheme, running in parallel.
    ///
    /// There is no default scheme: the choice changes the values, so callers
    /// name it.
    pub fn new(scheme: DualAreaScheme) -> Self {
        Self {
            scheme,
            parallel: true,
        }
    }

    /// Use the given dual area scheme.
    pub fn with_scheme(mut self, scheme: DualAreaScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Enable or disable parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run single-threaded.
    pub fn sequential(self) -> Self {
        self.with_parallel(false)
    }
}

/// Result of curvature computation.
///
/// Holds one value per vertex slot. Removed and boundary vertices read 0:
/// the estimators are only meaningful on a closed one-ring.
#[derive(Debug, Clone)]
pub struct CurvatureResult<I: MeshIndex = u32> {
    gaussian: Vec<f64>,
    mean: Vec<f64>,
    principal_max: Vec<f64>,
    principal_min: Vec<f64>,
    _marker: PhantomData<I>,
}

impl<I: MeshIndex> CurvatureResult<I> {
    /// Gaussian curvature at a vertex.
    #[inline]
    pub fn gaussian(&self, v: VertexId<I>) -> f64 {
        self.gaussian[v.index()]
    }

    /// Signed mean curvature at a vertex, positive where the surface bends
    /// away from its normal (a sphere with outward normals).
    #[inline]
    pub fn mean(&self, v: VertexId<I>) -> f64 {
        self.mean[v.index()]
    }

    /// Principal curvatures `(k1, k2)` with `k1 >= k2`.
    #[inline]
    pub fn principal(&self, v: VertexId<I>) -> (f64, f64) {
        (self.principal_max[v.index()], self.principal_min[v.index()])
    }

    /// All Gaussian curvatures, indexed by vertex slot.
    #[inline]
    pub fn gaussian_values(&self) -> &[f64] {
        &self.gaussian
    }

    /// All mean curvatures, indexed by vertex slot.
    #[inline]
    pub fn mean_values(&self) -> &[f64] {
        &self.mean
    }

    /// Number of vertex slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.gaussian.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.gaussian.is_empty()
    }

    /// Shape index `(2/π) atan((k1 + k2) / (k1 - k2))`.
    ///
    /// Range: [-1, 1], where -1 = cup, 0 = saddle, 1 = cap. Umbilical points
    /// read 0.
    pub fn shape_index(&self, v: VertexId<I>) -> f64 {
        let (k1, k2) = self.principal(v);
        let diff = k1 - k2;
        if diff.abs() < 1e-10 {
            0.0
        } else {
            (2.0 / PI) * ((k1 + k2) / diff).atan()
        }
    }

    /// Curvedness `sqrt((k1² + k2²) / 2)`.
    pub fn curvedness(&self, v: VertexId<I>) -> f64 {
        let (k1, k2) = self.principal(v);
        ((k1 * k1 + k2 * k2) / 2.0).sqrt()
    }
}

/// Voronoi share of the triangle of `he` owned by the start of `he`:
/// `(|pq|² cot r + |pr|² cot q) / 8`.
fn voronoi_contribution<M>(mesh: &M, he: HalfEdgeId<M::Index>) -> f64
where
    M: FaceTopology + ?Sized,
    M::Vertex: Position,
{
    let prev = mesh.prev(he);
    let pq = halfedge_vector(mesh, he).norm_squared();
    let pr = halfedge_vector(mesh, prev).norm_squared();
    0.125 * (pq * halfedge_cotangent(mesh, he) + pr * halfedge_cotangent(mesh, prev))
}

/// Mixed-area share of the triangle of `he` for the start of `he`.
fn mixed_contribution<M>(mesh: &M, he: HalfEdgeId<M::Index>) -> f64
where
    M: FaceTopology + ?Sized,
    M::Vertex: Position,
{
    let half_pi = PI / 2.0;
    let here = halfedge_angle(mesh, he);
    let obtuse_elsewhere = halfedge_angle(mesh, mesh.next(he)) > half_pi
        || halfedge_angle(mesh, mesh.prev(he)) > half_pi;

    if here > half_pi {
        face_area(mesh, mesh.face_of(he)) / 2.0
    } else if obtuse_elsewhere {
        face_area(mesh, mesh.face_of(he)) / 4.0
    } else {
        voronoi_contribution(mesh, he)
    }
}

/// Area of the dual cell of a vertex.
pub fn vertex_dual_area<M>(mesh: &M, v: VertexId<M::Index>, scheme: DualAreaScheme) -> f64
where
    M: FaceTopology + ?Sized,
    M::Vertex: Position,
{
    let corners = mesh
        .outgoing(v)
        .filter(|&he| mesh.face_of(he).is_valid());

    match scheme {
        DualAreaScheme::Barycentric => corners
            .map(|he| face_area(mesh, mesh.face_of(he)) / 3.0)
            .sum(),
        DualAreaScheme::Circumcentric => corners.map(|he| voronoi_contribution(mesh, he)).sum(),
        DualAreaScheme::Mixed => corners.map(|he| mixed_contribution(mesh, he)).sum(),
    }
}

/// Dual area of every vertex, indexed by vertex slot. Removed slots read 0.
pub fn dual_areas<M>(mesh: &M, scheme: DualAreaScheme, parallel: bool) -> Vec<f64>
where
    M: FaceTopology + Sync,
    M::Vertex: Position,
{
    per_vertex(mesh, parallel, 0.0, |v| vertex_dual_area(mesh, v, scheme))
}

fn corner_angle_sum<M>(mesh: &M, v: VertexId<M::Index>) -> f64
where
    M: FaceTopology + ?Sized,
    M::Vertex: Position,
{
    mesh.outgoing(v)
        .filter(|&he| mesh.face_of(he).is_valid())
        .map(|he| halfedge_angle(mesh, he))
        .sum()
}

/// Angle defect of a vertex: `2π` minus the sum of its corner angles.
///
/// This is the integrated Gaussian curvature at an interior vertex. The
/// formula is applied unchanged at boundary vertices, where the result is
/// not a curvature estimate; callers decide how to treat the boundary, for
/// example with [`boundary_turning_angle`].
pub fn angle_defect<M>(mesh: &M, v: VertexId<M::Index>) -> f64
where
    M: FaceTopology + ?Sized,
    M::Vertex: Position,
{
    2.0 * PI - corner_angle_sum(mesh, v)
}

/// Turning angle of the boundary at a vertex: `π` minus the sum of its
/// corner angles.
///
/// Summing [`angle_defect`] over interior vertices and this over boundary
/// vertices gives `2πχ` (discrete Gauss-Bonnet).
pub fn boundary_turning_angle<M>(mesh: &M, v: VertexId<M::Index>) -> f64
where
    M: FaceTopology + ?Sized,
    M::Vertex: Position,
{
    PI - corner_angle_sum(mesh, v)
}

/// `Σ w(h) (p_j − p_i)` over the outgoing half-edges `h = (i → j)` of a
/// vertex.
pub fn weighted_laplacian<M, W>(mesh: &M, v: VertexId<M::Index>, weights: &W) -> Vector3<f64>
where
    M: FaceTopology + ?Sized,
    M::Vertex: Position,
    W: PropertyRead<HalfEdgeId<M::Index>, f64> + ?Sized,
{
    mesh.outgoing(v)
        .map(|he| weights.get(he) * halfedge_vector(mesh, he))
        .fold(Vector3::zeros(), |acc, x| acc + x)
}

/// Unsigned mean curvature `|weighted_laplacian| / 2`.
///
/// With [`area_normalized_cotangent_weights`] this is the mean curvature
/// estimate of Meyer et al.
pub fn mean_curvature<M, W>(mesh: &M, v: VertexId<M::Index>, weights: &W) -> f64
where
    M: FaceTopology + ?Sized,
    M::Vertex: Position,
    W: PropertyRead<HalfEdgeId<M::Index>, f64> + ?Sized,
{
    weighted_laplacian(mesh, v, weights).norm() / 2.0
}

/// Cotangent weights divided by the dual area of the start vertex, indexed
/// by half-edge slot.
///
/// `w(i → j) = (cot α + cot β) / (2 A_i)`. Half-edges leaving a vertex with
/// zero dual area, and removed slots, read 0.
pub fn area_normalized_cotangent_weights<M>(
    mesh: &M,
    scheme: DualAreaScheme,
    parallel: bool,
) -> Vec<f64>
where
    M: FaceTopology + Sync,
    M::Vertex: Position,
{
    let areas = dual_areas(mesh, scheme, parallel);
    let weight = |i: usize| {
        let he = HalfEdgeId::<M::Index>::new(i);
        if mesh.halfedge_store().is_unused(he) {
            return 0.0;
        }
        let area = areas[mesh.start(he).index()];
        if area > 1e-10 {
            edge_cotangent_weight(mesh, he.edge()) / area
        } else {
            0.0
        }
    };

    let n = mesh.halfedge_store().capacity();
    if parallel {
        (0..n).into_par_iter().map(weight).collect()
    } else {
        (0..n).map(weight).collect()
    }
}

/// Dense cotangent Laplacian indexed by vertex slot.
///
/// Off-diagonal entries hold the edge cotangent weights and each diagonal
/// the negated row sum, so rows sum to zero and the matrix is negative
/// semi-definite. Entries are accumulated into the lower triangle and then
/// mirrored. With a `normalize` scheme the result is `M^{-1/2} L M^{-1/2}`
/// for the diagonal dual-area matrix `M`; rows of zero-area vertices are
/// left unscaled.
pub fn cotangent_laplacian_matrix<M>(mesh: &M, normalize: Option<DualAreaScheme>) -> DMatrix<f64>
where
    M: FaceTopology + Sync,
    M::Vertex: Position,
{
    let n = mesh.vertex_store().capacity();
    let mut laplacian = DMatrix::zeros(n, n);

    for e in mesh.edge_ids() {
        let he = e.halfedge();
        let i = mesh.start(he).index();
        let j = mesh.end(he).index();
        let w = edge_cotangent_weight(mesh, e);
        let (hi, lo) = if i > j { (i, j) } else { (j, i) };
        laplacian[(hi, lo)] += w;
        laplacian[(i, i)] -= w;
        laplacian[(j, j)] -= w;
    }
    laplacian.fill_upper_triangle_with_lower_triangle();

    if let Some(scheme) = normalize {
        let areas = dual_areas(mesh, scheme, false);
        let scale: Vec<f64> = areas
            .iter()
            .map(|&a| if a > 1e-10 { 1.0 / a.sqrt() } else { 1.0 })
            .collect();
        for c in 0..n {
            for r in 0..n {
                laplacian[(r, c)] *= scale[r] * scale[c];
            }
        }
    }

    log::debug!("assembled {n}x{n} cotangent Laplacian");
    laplacian
}

/// Evaluate `f` for every vertex slot; removed slots get `fill`.
fn per_vertex<M, T, G>(mesh: &M, parallel: bool, fill: T, f: G) -> Vec<T>
where
    M: FaceTopology + Sync,
    T: Send + Sync + Clone,
    G: Fn(VertexId<M::Index>) -> T + Sync,
{
    let compute = |i: usize| {
        let v = VertexId::<M::Index>::new(i);
        if mesh.vertex_store().is_unused(v) {
            fill.clone()
        } else {
            f(v)
        }
    };
    let n = mesh.vertex_store().capacity();
    if parallel {
        (0..n).into_par_iter().map(compute).collect()
    } else {
        (0..n).map(compute).collect()
    }
}

/// Per-vertex curvature data computed in parallel.
#[derive(Debug, Clone, Copy, Default)]
struct VertexCurvature {
    gaussian: f64,
    mean: f64,
    principal_max: f64,
    principal_min: f64,
}

/// `0.5 Σ (cot α + cot β)(p_j − p_i)`, the mean curvature normal times the
/// dual area.
fn cotangent_laplacian_at<M>(mesh: &M, v: VertexId<M::Index>) -> Vector3<f64>
where
    M: FaceTopology + ?Sized,
    M::Vertex: Position,
{
    mesh.outgoing(v)
        .map(|he| edge_cotangent_weight(mesh, he.edge()) * halfedge_vector(mesh, he))
        .fold(Vector3::zeros(), |acc, x| acc + x)
}

fn vertex_curvature<M>(mesh: &M, v: VertexId<M::Index>, scheme: DualAreaScheme) -> VertexCurvature
where
    M: FaceTopology + ?Sized,
    M::Vertex: Position,
{
    if mesh.is_boundary_vertex(v) || mesh.is_isolated(v) {
        return VertexCurvature::default();
    }
    let area = vertex_dual_area(mesh, v, scheme);
    if area.abs() < 1e-10 {
        return VertexCurvature::default();
    }

    let k = angle_defect(mesh, v) / area;

    // For outward normals the Laplacian of position points inward on a
    // convex surface.
    let laplacian = cotangent_laplacian_at(mesh, v) / area;
    let h_unsigned = laplacian.norm() / 2.0;
    let sign = if laplacian.dot(&vertex_normal(mesh, v)) <= 0.0 {
        1.0
    } else {
        -1.0
    };
    let h = sign * h_unsigned;

    // k1, k2 = H ± sqrt(H² − K); round-off can make the discriminant slightly
    // negative at umbilical points.
    let root = (h * h - k).max(0.0).sqrt();
    VertexCurvature {
        gaussian: k,
        mean: h,
        principal_max: h + root,
        principal_min: h - root,
    }
}

/// Compute Gaussian, mean and principal curvature at every vertex.
///
/// Gaussian curvature is the angle defect over the dual area; mean curvature
/// comes from the cotangent Laplacian of the positions.
pub fn compute_curvature<M>(mesh: &M, options: &CurvatureOptions) -> CurvatureResult<M::Index>
where
    M: FaceTopology + Sync,
    M::Vertex: Position,
{
    let scheme = options.scheme;
    let results = per_vertex(mesh, options.parallel, VertexCurvature::default(), |v| {
        vertex_curvature(mesh, v, scheme)
    });

    let n = results.len();
    let mut gaussian = Vec::with_capacity(n);
    let mut mean = Vec::with_capacity(n);
    let mut principal_max = Vec::with_capacity(n);
    let mut principal_min = Vec::with_capacity(n);
    for vc in results {
        gaussian.push(vc.gaussian);
        mean.push(vc.mean);
        principal_max.push(vc.principal_max);
        principal_min.push(vc.principal_min);
    }

    log::debug!(
        "computed curvature for {} vertices ({:?} areas)",
        mesh.num_vertices(),
        scheme
    );
    CurvatureResult {
        gaussian,
        mean,
        principal_max,
        principal_min,
        _marker: PhantomData,
    }
}

/// Gaussian curvature at every vertex.
pub fn gaussian_curvature<M>(mesh: &M, options: &CurvatureOptions) -> Vec<f64>
where
    M: FaceTopology + Sync,
    M::Vertex: Position,
{
    compute_curvature(mesh, options).gaussian
}

/// Signed mean curvature at every vertex.
pub fn mean_curvatures<M>(mesh: &M, options: &CurvatureOptions) -> Vec<f64>
where
    M: FaceTopology + Sync,
    M::Vertex: Position,
{
    compute_curvature(mesh, options).mean
}
