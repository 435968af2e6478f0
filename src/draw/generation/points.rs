//! Point-of-interest markers: a white dot inside a slightly larger grey one

use tracing::debug;

use crate::config::StyleConfig;
use crate::draw::geometry::Geometry;
use crate::draw::tessellation::circle_fan;
use crate::tiles::Feature;

use super::{Fill, MeshBuilder, TileContext};

pub(super) fn add_poi_layer(builder: &mut MeshBuilder, features: &[Feature], ctx: &TileContext, style: &StyleConfig) {
    let inner_radius = style.poi_inner_radius_px * ctx.pixel_size;
    let outer_radius = style.poi_outer_radius_px * ctx.pixel_size;

    for feature in features {
        let Geometry::Point(center) = feature.geometry else {
            debug!("Ignoring {} in POI layer", feature.geometry.kind());
            continue;
        };
        builder.add(&Fill::new(
            circle_fan(center, inner_radius, style.poi_segments),
            style.poi_inner_color,
            style.poi_depth,
        ));
        builder.add(&Fill::new(
            circle_fan(center, outer_radius, style.poi_segments),
            style.poi_outer_color,
            style.poi_depth,
        ));
    }
}
