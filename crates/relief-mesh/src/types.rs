//! Core mesh data types.

use nalgebra::{Point3, Vector3};

use crate::error::{MeshError, MeshResult};

/// A vertex with its position and shading normal.
///
/// Coordinates are in millimeters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// 3D position.
    pub position: Point3<f64>,

    /// Unit normal vector.
    pub normal: Vector3<f64>,
}

impl Vertex {
    /// Create a new vertex from a position and a normal.
    #[inline]
    pub fn new(position: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self { position, normal }
    }

    /// Create a vertex from raw coordinates with an upward normal.
    #[inline]
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z), Vector3::z())
    }
}

/// A triangle mesh with indexed vertices and faces.
///
/// Normals are stored per vertex, so the normal sequence always has the same
/// length as the position sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex data.
    pub vertices: Vec<Vertex>,

    /// Triangle faces as indices into the vertex array.
    /// Each face is [v0, v1, v2] with counter-clockwise winding seen from outside.
    pub faces: Vec<[u32; 3]>,
}

impl Mesh {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    /// Append a vertex and return its index.
    #[inline]
    pub fn push_vertex(&mut self, vertex: Vertex) -> u32 {
        let idx = self.vertices.len() as u32;
        self.vertices.push(vertex);
        idx
    }

    /// Number of vertices in the mesh.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces (triangles) in the mesh.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if mesh is empty (no vertices or faces).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Flattened triangle index list, three entries per face.
    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.faces.iter().flat_map(|face| face.iter().copied())
    }

    /// Verify that every face index addresses an existing vertex.
    pub fn check_indices(&self) -> MeshResult<()> {
        let vertex_count = self.vertices.len();
        for (face, indices) in self.faces.iter().enumerate() {
            if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(MeshError::IndexOutOfRange {
                    face,
                    index,
                    vertex_count,
                });
            }
        }
        Ok(())
    }

    /// Compute the axis-aligned bounding box.
    /// Returns (min_corner, max_corner) or None if mesh is empty.
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.vertices.first()?.position;
        let mut min = first;
        let mut max = first;

        for vertex in &self.vertices[1..] {
            let p = &vertex.position;
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }

        Some((min, max))
    }

    /// Iterate over triangles, yielding Triangle structs with actual vertex data.
    /// Faces with an out-of-range index are skipped.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        (0..self.faces.len()).filter_map(|face_idx| self.triangle(face_idx))
    }

    /// Get a specific triangle by face index.
    pub fn triangle(&self, face_idx: usize) -> Option<Triangle> {
        let &[i0, i1, i2] = self.faces.get(face_idx)?;
        Some(Triangle {
            v0: self.vertices.get(i0 as usize)?.position,
            v1: self.vertices.get(i1 as usize)?.position,
            v2: self.vertices.get(i2 as usize)?.position,
        })
    }
}

/// A triangle with concrete vertex positions.
///
/// Winding is counter-clockwise when viewed from the front (normal points
/// toward viewer).
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub v0: Point3<f64>,
    pub v1: Point3<f64>,
    pub v2: Point3<f64>,
}

impl Triangle {
    /// Create a new triangle from three points.
    #[inline]
    pub fn new(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Self {
        Self { v0, v1, v2 }
    }

    /// Compute the (unnormalized) face normal via cross product.
    /// The direction follows the right-hand rule with CCW winding.
    #[inline]
    pub fn normal_unnormalized(&self) -> Vector3<f64> {
        let e1 = self.v1 - self.v0;
        let e2 = self.v2 - self.v0;
        e1.cross(&e2)
    }

    /// Compute the unit face normal.
    /// Returns None for degenerate triangles (zero area).
    pub fn normal(&self) -> Option<Vector3<f64>> {
        let n = self.normal_unnormalized();
        let len_sq = n.norm_squared();
        if len_sq > f64::EPSILON {
            Some(n / len_sq.sqrt())
        } else {
            None
        }
    }

    /// Compute the area of the triangle.
    #[inline]
    pub fn area(&self) -> f64 {
        self.normal_unnormalized().norm() * 0.5
    }

    /// Check if the triangle is degenerate (zero or near-zero area).
    pub fn is_degenerate(&self, epsilon: f64) -> bool {
        self.area() < epsilon
    }
}
