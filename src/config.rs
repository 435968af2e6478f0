//! Runtime configuration
//!
//! [`PyramidConfig`] controls the quadtree and its workers, [`StyleConfig`]
//! holds every colour, depth and width table used to build tile meshes.
//! Both load from JSON; missing fields fall back to the defaults below.

use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::draw::geometry::Rgba;
use crate::error::ConfigError;
use crate::tiles::{LayerType, MAX_SUPPORTED_ZOOM};

/// Camera position at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub lon: f64,
    pub lat: f64,
    pub scale: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            lon: 8.881389,
            lat: 50.243056,
            scale: 1500.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PyramidConfig {
    /// Split worker threads
    pub worker_threads: usize,
    /// Split jobs allowed in flight before requests are rejected
    pub max_pending_splits: usize,
    pub root_zoom: u32,
    pub max_zoom: u32,
    /// One root per layer, rendered in this order
    pub layers: Vec<LayerType>,
    /// Screen width used to convert pixel sizes into world units
    pub screen_width_px: u32,
    pub profile_timing: bool,
    pub initial_camera: CameraConfig,
    pub style: StyleConfig,
}

impl Default for PyramidConfig {
    fn default() -> Self {
        Self {
            worker_threads: std::thread::available_parallelism().map_or(4, |n| n.get()),
            max_pending_splits: 64,
            root_zoom: 0,
            max_zoom: 18,
            layers: LayerType::default_order(),
            screen_width_px: 1080,
            profile_timing: false,
            initial_camera: CameraConfig::default(),
            style: StyleConfig::default(),
        }
    }
}

fn env_override<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env { name, value }),
        Err(_) => Ok(None),
    }
}

impl PyramidConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Apply `TILE_WORKERS`, `TILE_MAX_PENDING`, `TILE_MAX_ZOOM` and
    /// `PROFILE_TIMING` from the environment
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Some(workers) = env_override("TILE_WORKERS")? {
            self.worker_threads = workers;
        }
        if let Some(pending) = env_override("TILE_MAX_PENDING")? {
            self.max_pending_splits = pending;
        }
        if let Some(zoom) = env_override("TILE_MAX_ZOOM")? {
            self.max_zoom = zoom;
        }
        if env::var("PROFILE_TIMING").is_ok() {
            self.profile_timing = true;
        }
        Ok(self)
    }

    /// File (if any), then environment, then validation
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        let config = config.with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_threads == 0 {
            return Err(ConfigError::Invalid("worker_threads must be at least 1".into()));
        }
        if self.max_pending_splits == 0 {
            return Err(ConfigError::Invalid("max_pending_splits must be at least 1".into()));
        }
        if self.max_zoom > MAX_SUPPORTED_ZOOM {
            return Err(ConfigError::Invalid(format!(
                "max_zoom {} exceeds {}",
                self.max_zoom, MAX_SUPPORTED_ZOOM
            )));
        }
        if self.root_zoom > self.max_zoom {
            return Err(ConfigError::Invalid(format!(
                "root_zoom {} is above max_zoom {}",
                self.root_zoom, self.max_zoom
            )));
        }
        if self.screen_width_px == 0 {
            return Err(ConfigError::Invalid("screen_width_px must be at least 1".into()));
        }
        if self.layers.is_empty() {
            return Err(ConfigError::Invalid("at least one layer is required".into()));
        }
        Ok(())
    }
}

fn table<V: Copy>(entries: &[(&str, V)]) -> IndexMap<String, V> {
    entries.iter().map(|&(k, v)| (k.to_string(), v)).collect()
}

const fn rgb(r: u8, g: u8, b: u8) -> Rgba {
    [r, g, b, 255]
}

/// Colours, depths and widths for every layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Clear colour; also used to over-paint holes when they are not merged
    pub background: Rgba,
    /// Bridge holes into the exterior instead of over-painting them
    pub merge_holes: bool,
    /// Depth added to a polygon's depth for over-painted holes
    pub hole_depth_offset: f32,

    pub water_color: Rgba,
    pub water_depth: f32,

    pub building_color: Rgba,
    pub building_depth: f32,

    pub landuse_depth: f32,
    pub landuse_colors: IndexMap<String, Rgba>,
    pub landuse_fallback: Rgba,

    pub highway_colors: IndexMap<String, Rgba>,
    pub highway_unknown_color: Rgba,
    pub highway_priorities: IndexMap<String, f32>,
    pub highway_default_priority: f32,
    /// Inner road width in pixels by `highway` value
    pub highway_widths_px: IndexMap<String, f64>,
    /// Inner road width in pixels by `kind` value, checked after `highway`
    pub kind_widths_px: IndexMap<String, f64>,
    pub default_width_px: f64,
    pub casing_extra_px: f64,
    pub casing_shade: f32,
    pub casing_depth_offset: f32,
    pub tunnel_alpha: u8,
    /// Roads are rescaled so the lowest depth stays above `-road_depth_span`
    pub road_depth_span: f32,

    pub poi_inner_radius_px: f64,
    pub poi_outer_radius_px: f64,
    pub poi_inner_color: Rgba,
    pub poi_outer_color: Rgba,
    pub poi_segments: usize,
    pub poi_depth: f32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            background: rgb(240, 237, 229),
            merge_holes: true,
            hole_depth_offset: 9.0,

            water_color: rgb(179, 209, 255),
            water_depth: -15000.0,

            building_color: rgb(200, 154, 149),
            building_depth: -12999.0,

            landuse_depth: -19999.0,
            landuse_colors: table(&[
                ("residential", rgb(233, 229, 220)),
                ("pedestrian", rgb(233, 229, 220)),
                ("playground", rgb(233, 229, 220)),
                ("urban area", rgb(233, 229, 220)),
                ("farmland", rgb(240, 237, 229)),
                ("forest", rgb(210, 228, 200)),
                ("scrub", rgb(210, 228, 200)),
                ("grass", rgb(210, 228, 200)),
                ("meadow", rgb(210, 228, 200)),
                ("allotments", rgb(210, 228, 200)),
                ("garden", rgb(210, 228, 200)),
                ("wood", rgb(210, 228, 200)),
                ("miniature_golf", rgb(210, 228, 200)),
                ("commercial", rgb(223, 219, 212)),
                ("industrial", rgb(223, 219, 212)),
                ("railway", rgb(182, 182, 182)),
                ("park", rgb(168, 226, 133)),
                ("parking", rgb(237, 227, 208)),
                ("cemetery", rgb(237, 227, 208)),
                ("golf_course", rgb(200, 220, 200)),
                ("cinema", rgb(235, 210, 207)),
                ("school", rgb(235, 210, 207)),
                ("university", rgb(235, 210, 207)),
                ("hospital", rgb(235, 210, 207)),
                ("pitch", rgb(237, 227, 208)),
                ("farmyard", rgb(237, 227, 208)),
                ("farm", rgb(237, 227, 208)),
                ("stadium", rgb(234, 157, 157)),
                ("place_of_worship", rgb(244, 243, 236)),
                ("quarry", rgb(233, 219, 212)),
                ("sports_centre", rgb(237, 227, 208)),
                ("landuse", rgb(238, 228, 207)),
                ("village_green", rgb(238, 228, 207)),
                ("leisure", rgb(221, 230, 213)),
                ("recreation_ground", rgb(221, 230, 213)),
                ("nature_reserve", rgb(221, 230, 213)),
                ("retail", rgb(230, 230, 230)),
                ("common", rgb(240, 237, 229)),
            ]),
            landuse_fallback: rgb(0, 255, 0),

            highway_colors: table(&[
                ("motorway", rgb(250, 158, 37)),
                ("motorway_link", rgb(255, 225, 153)),
                ("trunk", rgb(250, 225, 104)),
                ("trunk_link", rgb(255, 225, 153)),
                ("primary", rgb(250, 225, 104)),
                ("primary_link", rgb(255, 255, 255)),
                ("secondary", rgb(255, 255, 255)),
                ("secondary_link", rgb(255, 255, 255)),
                ("tertiary", rgb(255, 255, 255)),
                ("tertiary_link", rgb(255, 255, 255)),
                ("track", rgb(255, 255, 255)),
                ("residential", rgb(248, 246, 242)),
                ("unclassified", rgb(248, 246, 242)),
                ("road", rgb(255, 255, 255)),
                ("service", rgb(226, 221, 214)),
                ("footway", rgb(225, 220, 214)),
                ("steps", rgb(225, 220, 214)),
                ("pedestrian", rgb(225, 220, 214)),
                ("cycleway", rgb(225, 220, 214)),
                ("path", rgb(225, 220, 214)),
                ("rail", rgb(192, 192, 192)),
            ]),
            highway_unknown_color: rgb(255, 0, 255),
            highway_priorities: table(&[
                ("motorway", 0.0),
                ("trunk", 1.0),
                ("primary", 2.0),
                ("secondary", 3.0),
                ("tertiary", 4.0),
                ("motorway_link", 5.0),
                ("trunk_link", 5.0),
                ("primary_link", 5.0),
                ("secondary_link", 5.0),
                ("tertiary_link", 5.0),
                ("residential", 6.0),
                ("unclassified", 6.0),
                ("road", 6.0),
                ("service", 7.0),
                ("minor", 7.0),
            ]),
            highway_default_priority: 9.0,
            highway_widths_px: table(&[
                ("motorway", 20.0),
                ("trunk", 20.0),
                ("primary", 16.0),
                ("tertiary", 10.0),
                ("residential", 4.0),
                ("unclassified", 4.0),
                ("track", 6.0),
                ("service", 3.0),
                ("pedestrian", 3.0),
            ]),
            kind_widths_px: table(&[("path", 3.0), ("rail", 3.0)]),
            default_width_px: 6.0,
            casing_extra_px: 3.0,
            casing_shade: 0.9,
            casing_depth_offset: -10.0,
            tunnel_alpha: 102,
            road_depth_span: 10000.0,

            poi_inner_radius_px: 4.0,
            poi_outer_radius_px: 5.5,
            poi_inner_color: rgb(255, 255, 255),
            poi_outer_color: rgb(191, 191, 191),
            poi_segments: 10,
            poi_depth: 0.0,
        }
    }
}

impl StyleConfig {
    pub fn landuse_color(&self, kind: &str) -> Option<Rgba> {
        self.landuse_colors.get(kind).copied()
    }

    pub fn highway_color(&self, highway: &str) -> Option<Rgba> {
        self.highway_colors.get(highway).copied()
    }

    pub fn highway_priority(&self, highway: &str) -> f32 {
        self.highway_priorities
            .get(highway)
            .copied()
            .unwrap_or(self.highway_default_priority)
    }

    /// Inner width in pixels: `highway` table, then `kind` table, then default
    pub fn inner_width_px(&self, highway: &str, kind: &str) -> f64 {
        self.highway_widths_px
            .get(highway)
            .or_else(|| self.kind_widths_px.get(kind))
            .copied()
            .unwrap_or(self.default_width_px)
    }
}

/// Scale the RGB channels, keeping alpha
pub fn shade(color: Rgba, factor: f32) -> Rgba {
    let scale = |c: u8| (c as f32 * factor).round().clamp(0.0, 255.0) as u8;
    [scale(color[0]), scale(color[1]), scale(color[2]), color[3]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = PyramidConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.layers[0], LayerType::WaterAreas);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = PyramidConfig::from_json_str(
            r#"{"worker_threads": 2, "layers": ["buildings"], "style": {"merge_holes": false}}"#,
        )
        .unwrap();
        assert_eq!(config.worker_threads, 2);
        assert_eq!(config.layers, vec![LayerType::Buildings]);
        assert!(!config.style.merge_holes);
        assert_eq!(config.style.water_depth, -15000.0);
        assert_eq!(config.max_pending_splits, 64);
    }

    #[test]
    fn test_validation_errors() {
        let config = PyramidConfig {
            root_zoom: 5,
            max_zoom: 4,
            ..PyramidConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = PyramidConfig {
            worker_threads: 0,
            ..PyramidConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_style_lookups() {
        let style = StyleConfig::default();
        assert_eq!(style.inner_width_px("motorway", ""), 20.0);
        assert_eq!(style.inner_width_px("footway", "path"), 3.0);
        assert_eq!(style.inner_width_px("footway", ""), 6.0);
        assert_eq!(style.highway_priority("nonsense"), 9.0);
        assert_eq!(style.landuse_color("park"), Some(rgb(168, 226, 133)));
        assert_eq!(shade(rgb(100, 200, 0), 0.9), [90, 180, 0, 255]);
    }
}
