use std::path::PathBuf;

use thiserror::Error;

use crate::draw::geometry::LineCap;

/// Geometry that cannot be tessellated. Callers skip the offending feature.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("ring has {0} points, at least 3 are required")]
    TooFewPoints(usize),
    #[error("ring has zero area")]
    ZeroArea,
    #[error("ring contains a non-finite coordinate")]
    NonFinite,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TessellationError {
    #[error("line cap {0:?} is not implemented")]
    UnsupportedCap(LineCap),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Failure inside a geometry feed. The pyramid treats any of these as an
/// empty tile.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("feed unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for {name}: {value:?}")]
    Env { name: &'static str, value: String },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum TileError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Tessellation(#[from] TessellationError),
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("worker pool error: {0}")]
    Pool(String),
}

pub type Result<T> = std::result::Result<T, TileError>;
