//! Road strokes
//!
//! Every road is stroked twice: a round-capped inner fill and a wider,
//! slightly darker butt-capped casing drawn just below it. Depth follows the
//! feature's explicit `sort_key`, bridge/tunnel flags and highway priority.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::{shade, StyleConfig};
use crate::draw::geometry::{Geometry, LineCap, Rgba, Triangle};
use crate::draw::tessellation::{stroke, stroke_multi};
use crate::error::TessellationError;
use crate::tiles::Feature;

use super::{Fill, MeshBuilder, TileContext};

/// Unnormalised depth of one road feature
pub fn road_layer(feature: &Feature, style: &StyleConfig) -> f32 {
    let sort_key = match feature.attr("sort_key").map(str::trim) {
        None | Some("") => 0.0,
        Some(raw) => raw.parse::<f32>().unwrap_or_else(|_| {
            debug!("Ignoring unparsable sort_key {:?}", raw);
            0.0
        }),
    };

    // explicit layering wins, bridge/tunnel next, highway class last
    let mut layer = sort_key * 1000.0;
    if feature.attr("is_bridge") == Some("yes") {
        layer += 100.0;
    }
    if feature.attr("is_tunnel") == Some("yes") {
        layer -= 100.0;
    }
    layer - style.highway_priority(feature.attr("highway").unwrap_or(""))
}

/// Shift so the highest layer sits at 0, then compress so the lowest is not
/// below `-span`
pub fn normalize_road_depths(layers: &[f32], span: f32) -> Vec<f32> {
    let Some(highest) = layers.iter().copied().reduce(f32::max) else {
        return Vec::new();
    };
    let lowest = layers.iter().copied().fold(highest, f32::min) - highest;
    let scaling = if lowest < -span { -span / lowest } else { 1.0 };
    layers.iter().map(|l| (l - highest) * scaling).collect()
}

fn stroke_geometry(geometry: &Geometry, cap: LineCap, width: f64) -> Result<Vec<Triangle>, TessellationError> {
    match geometry {
        Geometry::LineString(points) => stroke(points, cap, width),
        Geometry::MultiLineString(parts) => stroke_multi(parts, cap, width),
        other => {
            debug!("Ignoring {} in road layer", other.kind());
            Ok(Vec::new())
        }
    }
}

fn road_color(feature: &Feature, style: &StyleConfig) -> Rgba {
    let highway = if feature.attr("kind") == Some("rail") {
        "rail"
    } else {
        feature.attr("highway").unwrap_or("")
    };
    let mut color = style.highway_color(highway).unwrap_or_else(|| {
        warn!("Unknown highway {:?}", highway);
        style.highway_unknown_color
    });
    if feature.attr("is_tunnel") == Some("yes") {
        color[3] = style.tunnel_alpha;
    }
    color
}

fn road_fills(feature: &Feature, depth: f32, ctx: &TileContext, style: &StyleConfig) -> Result<Vec<Fill>, TessellationError> {
    let highway = feature.attr("highway").unwrap_or("");
    let kind = feature.attr("kind").unwrap_or("");
    let inner_px = style.inner_width_px(highway, kind);
    let inner = inner_px * ctx.pixel_size;
    let outer = (inner_px + style.casing_extra_px) * ctx.pixel_size;
    let color = road_color(feature, style);

    Ok(vec![
        Fill::new(stroke_geometry(&feature.geometry, LineCap::Round, inner)?, color, depth),
        Fill::new(
            stroke_geometry(&feature.geometry, LineCap::Butt, outer)?,
            shade(color, style.casing_shade),
            depth + style.casing_depth_offset,
        ),
    ])
}

pub(super) fn add_road_layer(builder: &mut MeshBuilder, features: &[Feature], ctx: &TileContext, style: &StyleConfig) {
    let layers: Vec<f32> = features.iter().map(|f| road_layer(f, style)).collect();
    let depths = normalize_road_depths(&layers, style.road_depth_span);

    let results: Vec<Vec<Fill>> = features
        .par_iter()
        .zip(depths.par_iter())
        .map(|(feature, &depth)| {
            road_fills(feature, depth, ctx, style).unwrap_or_else(|err| {
                warn!("[{}] Skipping road: {}", ctx.key, err);
                Vec::new()
            })
        })
        .collect();

    for fills in results {
        builder.extend(fills);
    }
}
