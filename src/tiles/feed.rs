//! Geometry feeds
//!
//! A feed turns a [`TileKey`] into the features inside that tile. Feeds are
//! shared between split workers and may be called concurrently for different
//! keys.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::draw::geometry::Geometry;
use crate::error::FeedError;

use super::key::TileKey;

pub type Attributes = IndexMap<String, String>;

/// One geometry with its string attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub geometry: Geometry,
    #[serde(default)]
    pub attributes: Attributes,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            attributes: Attributes::new(),
        }
    }

    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

pub trait GeometryFeed: Send + Sync {
    /// Features for `key`. An absent tile is an empty vector, not an error.
    fn fetch(&self, key: TileKey) -> Result<Vec<Feature>, FeedError>;
}

impl<F> GeometryFeed for F
where
    F: Fn(TileKey) -> Result<Vec<Feature>, FeedError> + Send + Sync,
{
    fn fetch(&self, key: TileKey) -> Result<Vec<Feature>, FeedError> {
        self(key)
    }
}

/// Feed that never has any geometry
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyFeed;

impl GeometryFeed for EmptyFeed {
    fn fetch(&self, _key: TileKey) -> Result<Vec<Feature>, FeedError> {
        Ok(Vec::new())
    }
}

/// Reads pre-cut tiles from `<root>/<layer>/<zoom>/<x>/<y>.json`, each file a
/// JSON array of features
#[derive(Debug, Clone)]
pub struct DirectoryFeed {
    root: PathBuf,
}

impl DirectoryFeed {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tile_path(&self, key: TileKey) -> PathBuf {
        self.root
            .join(key.layer.name())
            .join(key.zoom.to_string())
            .join(key.x.to_string())
            .join(format!("{}.json", key.y))
    }
}

impl GeometryFeed for DirectoryFeed {
    fn fetch(&self, key: TileKey) -> Result<Vec<Feature>, FeedError> {
        let path = self.tile_path(key);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No tile file for {} at {}", key, path.display());
                return Ok(Vec::new());
            }
            Err(source) => return Err(FeedError::Io { path, source }),
        };
        serde_json::from_str(&text).map_err(|source| FeedError::Parse { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::geometry::Point;
    use crate::tiles::LayerType;

    #[test]
    fn test_closure_feed() {
        let feed = |key: TileKey| -> Result<Vec<Feature>, FeedError> {
            Ok(vec![Feature::new(Geometry::Point(Point::new(key.x as f64, key.y as f64)))])
        };
        let features = feed.fetch(TileKey::new(2, 3, 1, LayerType::PointsOfInterest)).unwrap();
        assert_eq!(features[0].geometry, Geometry::Point(Point::new(2.0, 3.0)));
    }

    #[test]
    fn test_directory_feed_paths_and_missing_tiles() {
        let dir = std::env::temp_dir().join(format!("tile_feed_test_{}", std::process::id()));
        let feed = DirectoryFeed::new(&dir);
        let key = TileKey::new(4, 7, 3, LayerType::Buildings);
        assert_eq!(feed.tile_path(key), dir.join("buildings").join("3").join("4").join("7.json"));
        assert!(feed.fetch(key).unwrap().is_empty());

        let path = feed.tile_path(key);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let features = vec![Feature::new(Geometry::Point(Point::new(1.0, 2.0))).with_attr("kind", "cafe")];
        fs::write(&path, serde_json::to_string(&features).unwrap()).unwrap();
        let loaded = feed.fetch(key).unwrap();
        assert_eq!(loaded, features);
        assert_eq!(loaded[0].attr("kind"), Some("cafe"));

        fs::write(&path, "not json").unwrap();
        assert!(matches!(feed.fetch(key), Err(FeedError::Parse { .. })));

        let _ = fs::remove_dir_all(&dir);
    }
}
