//! Vector map tiles: polygon triangulation, line stroking and a tile
//! quadtree that refines as the view zooms in.
//!
//! - [`draw`] turns feature geometry into colored triangle meshes
//! - [`tiles`] organises those meshes in a pyramid that splits in the background
//! - [`config`] holds pyramid and style settings

pub mod config;
pub mod draw;
pub mod error;
pub mod logging;
pub mod tiles;

pub use config::{PyramidConfig, StyleConfig};
pub use error::{Result, TileError};
pub use tiles::{TileKey, TilePyramid};
