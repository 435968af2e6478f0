//! Tile quadtree
//!
//! # Submodules
//! - `key` - Tile keys, layer types and quadrants
//! - `feed` - Geometry feed trait and implementations
//! - `node` - Quadtree nodes and their split state
//! - `pool` - Bounded worker pool for split jobs
//! - `pyramid` - Pyramid orchestration: render, split requests, statistics
//! - `viewport` - Camera and visible bounds

mod key;
mod feed;
mod node;
mod pool;
mod pyramid;
mod viewport;

pub use key::{
    LayerType,
    Quadrant,
    TileKey,
    MAX_SUPPORTED_ZOOM,
};

pub use feed::{
    Attributes,
    Feature,
    GeometryFeed,
    EmptyFeed,
    DirectoryFeed,
};

pub use node::{
    NodeId,
    SplitState,
    TileNode,
};

pub use pool::{
    Permit,
    SplitPool,
};

pub use pyramid::{
    MeshSink,
    RenderStats,
    SplitRequest,
    TilePyramid,
};

pub use viewport::{
    Camera,
    Viewport,
    target_zoom,
};
