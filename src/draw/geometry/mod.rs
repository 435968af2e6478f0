//! Geometry module for projected map data
//!
//! This module provides the geometric primitives consumed by the tessellators
//! and the mesh types they produce.
//!
//! # Submodules
//! - `types` - Core geometric primitives (Point, Ring, Polygon, Geometry, etc.)
//! - `orientation` - Signed-area ring classification
//! - `projection` - Spherical Mercator lon/lat conversion
//! - `mesh` - Colored triangle meshes for GPU rendering
//! - `binary` - Binary mesh frames for zero-copy transfer

mod types;
mod orientation;
pub mod projection;
mod mesh;
mod binary;

pub use types::{
    Point,
    Bounds,
    LineCap,
    Ring,
    Polygon,
    Triangle,
    Geometry,
};

pub use orientation::{
    RingOrientation,
    signed_area,
    ring_orientation,
    classify_closed_ring,
};

pub use mesh::{
    serialize_f32_vec_base64,
    serialize_u8_vec_base64,
    Rgba,
    VertexMesh,
    FLOATS_PER_VERTEX,
    BYTES_PER_COLOR,
};

pub use binary::{
    MESH_MAGIC,
    write_mesh,
    mesh_to_bytes,
    read_mesh,
};
