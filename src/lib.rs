//! # Tessel
//!
//! A half-edge topology engine for graphs and polygon meshes.
//!
//! Tessel stores connectivity in paired half-edges over stable, soft-deleted
//! element slots, and builds generic traversals and discrete
//! differential-geometry operators on top of it.
//!
//! ## Features
//!
//! - **One topology core**: [`HeGraph`](mesh::HeGraph) and
//!   [`HeMesh`](mesh::HeMesh) share the [`Topology`](mesh::Topology) trait
//!   and its circulators
//! - **Stable ids**: removal tombstones a slot; ids survive until `compact`
//! - **Flexible indexing**: 16-bit, 32-bit, and 64-bit indices
//! - **Generic searches**: BFS, DFS and best-first over any neighbor function,
//!   with visited state kept in per-store tags
//! - **Geometry**: cotangents, dual areas, angle defect, mean curvature and a
//!   cotangent Laplacian matrix
//! - **Grid fields**: sampled scalar and vector fields with finite-difference
//!   stencils
//!
//! ## Quick Start
//!
//! ```
//! use tessel::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//! let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
//!
//! let mesh: HeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert_eq!(mesh.num_vertices(), 4);
//! assert_eq!(mesh.num_faces(), 4);
//! assert_eq!(mesh.euler_characteristic(), 2);
//!
//! // Hop depth from vertex 0: every other vertex is a neighbor. The return
//! // value counts the vertices reached, the depths land in the property.
//! let mut depths = vec![0usize; 4];
//! let reached = vertex_depths(&mesh, &[VertexId::new(0)], &[], &mut depths).unwrap();
//! assert_eq!(reached, 4);
//! assert_eq!(depths.iter().max(), Some(&1));
//!
//! // A closed surface carries total Gaussian curvature 4π.
//! let k: f64 = mesh.vertex_ids().map(|v| angle_defect(&mesh, v)).sum();
//! assert!((k - 4.0 * std::f64::consts::PI).abs() < 1e-9);
//! ```
//!
//! ## Traversal
//!
//! ```
//! use tessel::prelude::*;
//! use nalgebra::Point3;
//!
//! # let vertices = vec![
//! #     Point3::new(0.0, 0.0, 0.0),
//! #     Point3::new(1.0, 0.0, 0.0),
//! #     Point3::new(0.5, 1.0, 0.0),
//! # ];
//! # let mesh: HeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
//! let v = VertexId::new(0);
//! let neighbors: Vec<_> = mesh.connected_vertices(v).collect();
//! assert_eq!(neighbors.len(), 2);
//!
//! let f = mesh.face_ids().next().unwrap();
//! assert_eq!(mesh.face_vertices(f).count(), 3);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod field;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// ```
/// use tessel::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::curvature::{
        angle_defect, compute_curvature, CurvatureOptions, DualAreaScheme,
    };
    pub use crate::algo::labels::{face_depths, vertex_depths, vertex_distances, DistanceOptions};
    pub use crate::algo::search::{best_first, breadth_first, depth_first};
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        build_from_polygons, build_from_triangles, build_graph, to_face_vertex, EdgeId, FaceId,
        FaceTopology, HalfEdgeId, HeGraph, HeMesh, MeshIndex, Property, PropertyRead, Topology,
        VertexId,
    };
}

pub use nalgebra;
