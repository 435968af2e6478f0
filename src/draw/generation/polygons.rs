//! Polygon fills for water, building and land-use layers
//!
//! Polygons are triangulated in parallel and appended in feature order.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::StyleConfig;
use crate::draw::geometry::{Geometry, Polygon, Rgba};
use crate::draw::tessellation::{triangulate, triangulate_ring, TriangulationStatus};
use crate::tiles::Feature;

use super::{Fill, MeshBuilder};

fn feature_polygons(feature: &Feature) -> &[Polygon] {
    match &feature.geometry {
        Geometry::Polygon(p) => std::slice::from_ref(p),
        Geometry::MultiPolygon(ps) => ps.as_slice(),
        other => {
            debug!("Ignoring {} in polygon layer", other.kind());
            &[]
        }
    }
}

/// Fill one polygon. Holes are either bridged into the exterior or
/// over-painted with the background colour just above `depth`.
pub(super) fn fill_polygon(polygon: &Polygon, color: Rgba, depth: f32, style: &StyleConfig) -> Vec<Fill> {
    let result = triangulate(polygon, style.merge_holes);
    if let TriangulationStatus::Degenerate(err) = &result.status {
        debug!("Skipping polygon: {}", err);
        return Vec::new();
    }

    let mut fills = vec![Fill::new(result.triangles, color, depth)];
    if !style.merge_holes {
        for hole in &polygon.holes {
            let hole_fill = triangulate_ring(hole.points());
            if !hole_fill.triangles.is_empty() {
                fills.push(Fill::new(
                    hole_fill.triangles,
                    style.background,
                    depth + style.hole_depth_offset,
                ));
            }
        }
    }
    fills
}

pub(super) fn add_polygon_layer<F>(
    builder: &mut MeshBuilder,
    features: &[Feature],
    style: &StyleConfig,
    depth: f32,
    color_of: F,
) where
    F: Fn(&Feature) -> Rgba + Sync,
{
    let results: Vec<Vec<Fill>> = features
        .par_iter()
        .map(|feature| {
            let color = color_of(feature);
            feature_polygons(feature)
                .iter()
                .flat_map(|polygon| fill_polygon(polygon, color, depth, style))
                .collect()
        })
        .collect();

    for fills in results {
        builder.extend(fills);
    }
}

pub(super) fn add_landuse_layer(builder: &mut MeshBuilder, features: &[Feature], style: &StyleConfig) {
    add_polygon_layer(builder, features, style, style.landuse_depth, |feature| {
        let kind = feature.attr("kind").unwrap_or("unknown");
        style.landuse_color(kind).unwrap_or_else(|| {
            warn!("Unknown land usage kind {:?}", kind);
            style.landuse_fallback
        })
    });
}
