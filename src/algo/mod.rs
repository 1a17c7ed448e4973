//! Algorithms over the topology traits.
//!
//! Everything here is written against [`Topology`](crate::mesh::Topology)
//! and [`FaceTopology`](crate::mesh::FaceTopology), so it runs on graphs and
//! meshes with any payload type:
//!
//! - [`search`]: breadth-first, depth-first and best-first traversals plus
//!   greedy walks toward a key extremum
//! - [`labels`]: hop depths and shortest-path distances written into
//!   caller-supplied properties
//! - [`geometry`]: lengths, angles, cotangents, normals, areas and centers
//! - [`curvature`]: dual areas, angle defect, cotangent Laplacian and
//!   discrete curvature
//! - [`transform`]: bulk position deformation

pub mod curvature;
pub mod geometry;
pub mod labels;
pub mod search;
pub mod transform;
