//! Vertex payload capabilities.
//!
//! Geometry algorithms do not care what a vertex payload is, only what it can
//! provide. A payload that can report a point implements [`Position`]; one
//! that can be moved implements [`SetPosition`], and so on for normals and
//! texture coordinates. `Point3<f64>` is the simplest payload; [`MeshVertex`]
//! carries all three attributes.

use nalgebra::{Point2, Point3, Vector2, Vector3};

use crate::error::{MeshError, Result};

/// A payload with a position.
pub trait Position {
    /// The position in space.
    fn position(&self) -> Point3<f64>;
}

/// A payload whose position can be overwritten.
pub trait SetPosition {
    /// Move the payload to `p`.
    fn set_position(&mut self, p: Point3<f64>);
}

/// A payload with a normal.
pub trait Normal {
    /// The normal vector.
    fn normal(&self) -> Vector3<f64>;
}

/// A payload whose normal can be overwritten.
pub trait SetNormal {
    /// Overwrite the normal.
    fn set_normal(&mut self, n: Vector3<f64>);
}

/// A payload with a texture coordinate.
pub trait TexCoord {
    /// The texture coordinate.
    fn texcoord(&self) -> Vector2<f64>;
}

/// A payload whose texture coordinate can be overwritten.
pub trait SetTexCoord {
    /// Overwrite the texture coordinate.
    fn set_texcoord(&mut self, uv: Vector2<f64>);
}

impl Position for Point3<f64> {
    #[inline]
    fn position(&self) -> Point3<f64> {
        *self
    }
}

impl SetPosition for Point3<f64> {
    #[inline]
    fn set_position(&mut self, p: Point3<f64>) {
        *self = p;
    }
}

/// Planar points live in the `z = 0` plane.
impl Position for Point2<f64> {
    #[inline]
    fn position(&self) -> Point3<f64> {
        Point3::new(self.x, self.y, 0.0)
    }
}

/// Drops `z`.
impl SetPosition for Point2<f64> {
    #[inline]
    fn set_position(&mut self, p: Point3<f64>) {
        self.x = p.x;
        self.y = p.y;
    }
}

/// A vertex payload with position, normal and texture coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshVertex {
    /// Position.
    pub position: Point3<f64>,
    /// Unit normal, zero when unknown.
    pub normal: Vector3<f64>,
    /// Texture coordinate.
    pub texcoord: Vector2<f64>,
}

impl MeshVertex {
    /// A vertex at `position` with zero normal and texture coordinate.
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            normal: Vector3::zeros(),
            texcoord: Vector2::zeros(),
        }
    }
}

impl Default for MeshVertex {
    fn default() -> Self {
        Self::new(Point3::origin())
    }
}

impl From<Point3<f64>> for MeshVertex {
    fn from(position: Point3<f64>) -> Self {
        Self::new(position)
    }
}

impl Position for MeshVertex {
    #[inline]
    fn position(&self) -> Point3<f64> {
        self.position
    }
}

impl SetPosition for MeshVertex {
    #[inline]
    fn set_position(&mut self, p: Point3<f64>) {
        self.position = p;
    }
}

impl Normal for MeshVertex {
    #[inline]
    fn normal(&self) -> Vector3<f64> {
        self.normal
    }
}

impl SetNormal for MeshVertex {
    #[inline]
    fn set_normal(&mut self, n: Vector3<f64>) {
        self.normal = n;
    }
}

impl TexCoord for MeshVertex {
    #[inline]
    fn texcoord(&self) -> Vector2<f64> {
        self.texcoord
    }
}

impl SetTexCoord for MeshVertex {
    #[inline]
    fn set_texcoord(&mut self, uv: Vector2<f64>) {
        self.texcoord = uv;
    }
}

/// Parallel attribute buffers as they come out of a file or generator.
///
/// Normals and texture coordinates are optional but, if present, must have
/// one entry per position.
#[derive(Debug, Clone, Default)]
pub struct VertexAttributes {
    /// Positions, one per vertex.
    pub positions: Vec<Point3<f64>>,
    /// Optional per-vertex normals.
    pub normals: Option<Vec<Vector3<f64>>>,
    /// Optional per-vertex texture coordinates.
    pub texcoords: Option<Vec<Vector2<f64>>>,
}

impl VertexAttributes {
    /// Attributes with positions only.
    pub fn from_positions(positions: Vec<Point3<f64>>) -> Self {
        Self {
            positions,
            ..Self::default()
        }
    }

    /// Attach per-vertex normals.
    pub fn with_normals(mut self, normals: Vec<Vector3<f64>>) -> Self {
        self.normals = Some(normals);
        self
    }

    /// Attach per-vertex texture coordinates.
    pub fn with_texcoords(mut self, texcoords: Vec<Vector2<f64>>) -> Self {
        self.texcoords = Some(texcoords);
        self
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether there are no vertices.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Check that the optional buffers match the position count.
    pub fn validate(&self) -> Result<()> {
        let n = self.positions.len();
        if let Some(normals) = &self.normals {
            MeshError::check_len(n, normals.len())?;
        }
        if let Some(texcoords) = &self.texcoords {
            MeshError::check_len(n, texcoords.len())?;
        }
        Ok(())
    }

    /// Assemble the payload of vertex `i` from the buffers.
    pub fn vertex<V>(&self, i: usize) -> V
    where
        V: Default + SetPosition + SetNormal + SetTexCoord,
    {
        let mut v = V::default();
        v.set_position(self.positions[i]);
        if let Some(normals) = &self.normals {
            v.set_normal(normals[i]);
        }
        if let Some(texcoords) = &self.texcoords {
            v.set_texcoord(texcoords[i]);
        }
        v
    }
}
