//! Tessellation module for map geometry
//!
//! This module converts polygons, polylines and point markers into triangles
//! for GPU rendering.
//!
//! # Submodules
//! - `ring` - Doubly-linked vertex ring used during ear clipping
//! - `polygon` - Ear-clipping triangulation with hole bridging
//! - `polyline` - Polyline stroking with round caps and miter joins
//! - `shapes` - Standard shape tessellation (circle fans)

mod ring;
mod polygon;
mod polyline;
mod shapes;

pub use ring::{
    VertexRing,
    dedup_ring,
    point_in_triangle_strict,
};

pub use polygon::{
    Triangulation,
    TriangulationStatus,
    triangulate,
    triangulate_ring,
    merge_holes,
};

pub use polyline::{
    ROUND_CAP_SEGMENTS,
    stroke,
    stroke_multi,
};

pub use shapes::circle_fan;
