//! GPU-ready triangle meshes
//!
//! A [`VertexMesh`] is a flat list of `(x, y, depth)` float triples with a
//! parallel list of RGBA bytes, three vertices per triangle in input order.
//! It serialises to JSON with base64 payloads for compact transfer.

use base64::{engine::general_purpose, Engine as _};
use serde::{Serialize, Serializer};

use super::types::Triangle;

/// RGBA color, one byte per channel
pub type Rgba = [u8; 4];

/// Floats per vertex: x, y, depth
pub const FLOATS_PER_VERTEX: usize = 3;

/// Bytes per vertex color
pub const BYTES_PER_COLOR: usize = 4;

/// Serialize Vec<f32> as a base64 string of little-endian floats
pub fn serialize_f32_vec_base64<S>(data: &[f32], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut bytes = Vec::with_capacity(data.len() * std::mem::size_of::<f32>());
    for value in data {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    serializer.serialize_str(&general_purpose::STANDARD.encode(bytes))
}

/// Serialize raw bytes as a base64 string
pub fn serialize_u8_vec_base64<S>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&general_purpose::STANDARD.encode(data))
}

/// Immutable-after-build triangle mesh for one tile
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VertexMesh {
    /// Base64-encoded Float32 vertex data (x, y, depth, x, y, depth, ...)
    #[serde(rename = "vertexData", serialize_with = "serialize_f32_vec_base64")]
    positions: Vec<f32>,

    /// Base64-encoded RGBA bytes, one color per vertex
    #[serde(rename = "colorData", serialize_with = "serialize_u8_vec_base64")]
    colors: Vec<u8>,

    /// Number of vertices (not floats)
    #[serde(rename = "vertexCount")]
    vertex_count: usize,
}

impl VertexMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one triangle. Triangles that are not finite once narrowed to
    /// f32 are rejected and `false` is returned; the mesh is left unchanged.
    pub fn push_triangle(&mut self, triangle: &Triangle, color: Rgba, depth: f32) -> bool {
        let mut coords = [0.0f32; 9];
        for (i, p) in triangle.vertices().iter().enumerate() {
            coords[i * 3] = p.x as f32;
            coords[i * 3 + 1] = p.y as f32;
            coords[i * 3 + 2] = depth;
        }
        if coords.iter().any(|c| !c.is_finite()) {
            return false;
        }

        self.positions.extend_from_slice(&coords);
        for _ in 0..3 {
            self.colors.extend_from_slice(&color);
        }
        self.vertex_count += 3;
        true
    }

    /// Append triangles with a shared color and depth. Returns how many were
    /// dropped for being non-finite.
    pub fn push_triangles(&mut self, triangles: &[Triangle], color: Rgba, depth: f32) -> usize {
        self.positions.reserve(triangles.len() * 9);
        self.colors.reserve(triangles.len() * 12);
        triangles
            .iter()
            .filter(|t| !self.push_triangle(t, color, depth))
            .count()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn triangle_count(&self) -> usize {
        self.vertex_count / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0
    }

    /// Flat `(x, y, depth)` floats
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Flat RGBA bytes, parallel to [`positions`](Self::positions)
    pub fn colors(&self) -> &[u8] {
        &self.colors
    }

    /// Vertex triples grouped per triangle
    pub fn triangles(&self) -> impl Iterator<Item = [[f32; 3]; 3]> + '_ {
        self.positions.chunks_exact(9).map(|c| {
            [
                [c[0], c[1], c[2]],
                [c[3], c[4], c[5]],
                [c[6], c[7], c[8]],
            ]
        })
    }

    /// Summed planar area of all triangles
    pub fn area(&self) -> f64 {
        self.triangles()
            .map(|[a, b, c]| {
                let abx = (b[0] - a[0]) as f64;
                let aby = (b[1] - a[1]) as f64;
                let acx = (c[0] - a[0]) as f64;
                let acy = (c[1] - a[1]) as f64;
                (abx * acy - aby * acx).abs() * 0.5
            })
            .sum()
    }
}
