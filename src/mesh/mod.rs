//! Core topology data structures.
//!
//! This module provides the half-edge graph and mesh representations and
//! the storage they are built on.
//!
//! # Overview
//!
//! Two structures share one connectivity core:
//! - [`HeGraph`] - vertices joined by edges, no faces
//! - [`HeMesh`] - a polygon mesh with faces and holes
//!
//! Both implement [`Topology`], which provides every query and circulator;
//! [`HeMesh`] also implements [`FaceTopology`]. Algorithms are written
//! against the traits, so they run on either structure and on any payload
//! type.
//!
//! # Index Types
//!
//! Elements are identified by type-safe index wrappers:
//! - [`VertexId`] - Identifies a vertex
//! - [`HalfEdgeId`] - Identifies a half-edge
//! - [`FaceId`] - Identifies a face
//! - [`EdgeId`] - Identifies a full edge (a half-edge pair)
//!
//! These indices are generic over the underlying integer type ([`MeshIndex`] trait),
//! allowing you to choose `u16`, `u32`, or `u64` based on mesh size.
//!
//! # Storage
//!
//! Each element kind lives in an [`ElementStore`]: removal tombstones a slot
//! and later insertions recycle it, so ids stay stable until
//! [`HeMesh::compact`] or [`HeGraph::compact`]. Every store owns a [`Tags`]
//! array that searches use to mark visited elements.
//!
//! # Construction
//!
//! ```
//! use tessel::mesh::{build_from_triangles, FaceTopology, HeMesh, Topology};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh: HeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert_eq!(mesh.num_edges(), 3);
//! assert_eq!(mesh.face_degree(mesh.face_ids().next().unwrap()).unwrap(), 3);
//! ```

mod attributes;
mod builder;
mod edit;
mod graph;
mod halfedge;
mod index;
mod property;
mod store;
mod tags;
mod topology;

pub use attributes::{
    MeshVertex, Normal, Position, SetNormal, SetPosition, SetTexCoord, TexCoord, VertexAttributes,
};
pub use builder::{
    build_from_attributes, build_from_polygons, build_from_quads, build_from_triangles,
    build_graph, graph_from_line_soup, graph_segments, polylines, to_face_vertex, to_triangles,
};
pub use edit::Remapping;
pub use graph::HeGraph;
pub use halfedge::{HeMesh, TriangulateOptions, TriangulationStrategy};
pub use index::{EdgeId, ElementId, FaceId, HalfEdgeId, MeshIndex, VertexId};
pub use property::{FnProperty, Property, PropertyRead};
pub use store::{ElementStore, Handle};
pub use tags::Tags;
pub use topology::{
    Face, FaceStore, FaceTopology, HalfEdge, HalfEdgeStore, Loop, Outgoing, Topology, Vertex,
    VertexStore,
};
