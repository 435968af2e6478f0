//! Feature geometry to triangle meshes
//!
//! # Submodules
//! - `geometry` - Core types, projection, meshes and their binary format
//! - `tessellation` - Ear clipping, line stroking and circle fans
//! - `generation` - Styled per-layer mesh building for a tile

pub mod geometry;
pub mod tessellation;
pub mod generation;
