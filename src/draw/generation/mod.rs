//! Mesh generation for map tiles
//!
//! This module converts the features of one tile into a single colored
//! [`VertexMesh`]. Which tessellator runs, and with which colour and depth,
//! depends on the tile's layer and the [`StyleConfig`].
//!
//! # Submodules
//! - `polygons` - Water, building and land-use fills
//! - `roads` - Road strokes with casings and depth ordering
//! - `points` - Point-of-interest dots

mod polygons;
mod roads;
mod points;

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::StyleConfig;
use crate::draw::geometry::{Bounds, Rgba, Triangle, VertexMesh};
use crate::tiles::{Feature, LayerType, TileKey};

pub use roads::{normalize_road_depths, road_layer};

/// Everything about the tile being built that styling depends on
#[derive(Debug, Clone, Copy)]
pub struct TileContext {
    pub key: TileKey,
    pub bounds: Bounds,
    /// World units covered by one screen pixel at this tile's zoom
    pub pixel_size: f64,
    pub profile_timing: bool,
}

impl TileContext {
    pub fn new(key: TileKey, bounds: Bounds, screen_width_px: u32, profile_timing: bool) -> Self {
        Self {
            key,
            bounds,
            pixel_size: bounds.width() / screen_width_px.max(1) as f64,
            profile_timing,
        }
    }
}

/// Triangles sharing one colour and depth
#[derive(Debug, Clone)]
pub(crate) struct Fill {
    pub triangles: Vec<Triangle>,
    pub color: Rgba,
    pub depth: f32,
}

impl Fill {
    pub fn new(triangles: Vec<Triangle>, color: Rgba, depth: f32) -> Self {
        Self { triangles, color, depth }
    }
}

/// Accumulates fills into a mesh, counting triangles rejected as non-finite
#[derive(Debug, Default)]
pub(crate) struct MeshBuilder {
    mesh: VertexMesh,
    dropped: usize,
}

impl MeshBuilder {
    pub fn add(&mut self, fill: &Fill) {
        self.dropped += self.mesh.push_triangles(&fill.triangles, fill.color, fill.depth);
    }

    pub fn extend(&mut self, fills: impl IntoIterator<Item = Fill>) {
        for fill in fills {
            self.add(&fill);
        }
    }

    pub fn finish(self, key: TileKey) -> VertexMesh {
        if self.dropped > 0 {
            warn!("[{}] Dropped {} non-finite triangles", key, self.dropped);
        }
        self.mesh
    }
}

/// Build the mesh for one tile from its features
pub fn build_tile_mesh(features: &[Feature], ctx: &TileContext, style: &StyleConfig) -> VertexMesh {
    let start = Instant::now();
    let mut builder = MeshBuilder::default();

    match ctx.key.layer {
        LayerType::WaterAreas => {
            polygons::add_polygon_layer(&mut builder, features, style, style.water_depth, |_| style.water_color)
        }
        LayerType::Buildings => {
            polygons::add_polygon_layer(&mut builder, features, style, style.building_depth, |_| style.building_color)
        }
        LayerType::LandUsages => polygons::add_landuse_layer(&mut builder, features, style),
        LayerType::RoadLines => roads::add_road_layer(&mut builder, features, ctx, style),
        LayerType::PointsOfInterest => points::add_poi_layer(&mut builder, features, ctx, style),
        LayerType::RoadLabels | LayerType::Default => {
            if !features.is_empty() {
                debug!("[{}] {} features carry no drawable geometry", ctx.key, features.len());
            }
        }
    }

    let mesh = builder.finish(ctx.key);
    if ctx.profile_timing {
        info!(
            "[{}] {} features -> {} triangles in {:.2}ms",
            ctx.key,
            features.len(),
            mesh.triangle_count(),
            start.elapsed().as_secs_f64() * 1000.0
        );
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::geometry::{Geometry, Point, Polygon, Ring};

    fn square(x: f64, y: f64, size: f64) -> Ring {
        Ring::new(vec![
            Point::new(x, y),
            Point::new(x + size, y),
            Point::new(x + size, y + size),
            Point::new(x, y + size),
        ])
    }

    fn ctx(layer: LayerType) -> TileContext {
        TileContext::new(
            TileKey::root(layer, 0),
            Bounds::new(0.0, 0.0, 1000.0, 1000.0),
            100,
            false,
        )
    }

    #[test]
    fn test_pixel_size() {
        assert_eq!(ctx(LayerType::RoadLines).pixel_size, 10.0);
    }

    #[test]
    fn test_water_polygon_uses_layer_style() {
        let style = StyleConfig::default();
        let features = vec![Feature::new(Geometry::Polygon(Polygon::new(square(0.0, 0.0, 10.0), vec![])))];
        let mesh = build_tile_mesh(&features, &ctx(LayerType::WaterAreas), &style);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.positions()[2], style.water_depth);
        assert_eq!(&mesh.colors()[0..4], &style.water_color);
        assert!((mesh.area() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_label_layer_is_empty() {
        let features = vec![Feature::new(Geometry::LineString(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]))];
        let mesh = build_tile_mesh(&features, &ctx(LayerType::RoadLabels), &StyleConfig::default());
        assert!(mesh.is_empty());
    }
}
