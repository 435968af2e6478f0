use std::fmt;

use serde::{Deserialize, Serialize};

use crate::draw::geometry::projection::world_bounds;
use crate::draw::geometry::Bounds;

/// Deepest zoom whose child indices still fit in a u32
pub const MAX_SUPPORTED_ZOOM: u32 = 30;

/// Feature layer served by the geometry feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerType {
    RoadLines,
    RoadLabels,
    Buildings,
    PointsOfInterest,
    LandUsages,
    WaterAreas,
    Default,
}

impl LayerType {
    pub const ALL: [LayerType; 7] = [
        LayerType::RoadLines,
        LayerType::RoadLabels,
        LayerType::Buildings,
        LayerType::PointsOfInterest,
        LayerType::LandUsages,
        LayerType::WaterAreas,
        LayerType::Default,
    ];

    /// Stable integer id
    pub fn id(self) -> u8 {
        match self {
            LayerType::RoadLines => 0,
            LayerType::RoadLabels => 1,
            LayerType::Buildings => 2,
            LayerType::PointsOfInterest => 3,
            LayerType::LandUsages => 4,
            LayerType::WaterAreas => 5,
            LayerType::Default => 6,
        }
    }

    pub fn from_id(id: u8) -> Option<LayerType> {
        LayerType::ALL.iter().copied().find(|l| l.id() == id)
    }

    /// Directory / log name
    pub fn name(self) -> &'static str {
        match self {
            LayerType::RoadLines => "road_lines",
            LayerType::RoadLabels => "road_labels",
            LayerType::Buildings => "buildings",
            LayerType::PointsOfInterest => "points_of_interest",
            LayerType::LandUsages => "land_usages",
            LayerType::WaterAreas => "water_areas",
            LayerType::Default => "default",
        }
    }

    /// Draw order used when no layer list is configured
    pub fn default_order() -> Vec<LayerType> {
        vec![
            LayerType::WaterAreas,
            LayerType::LandUsages,
            LayerType::RoadLines,
            LayerType::Buildings,
            LayerType::RoadLabels,
            LayerType::PointsOfInterest,
        ]
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Position of a child inside its parent. Row index `y` grows southwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
}

impl Quadrant {
    /// Child order used throughout the pyramid
    pub const ALL: [Quadrant; 4] = [
        Quadrant::NorthWest,
        Quadrant::NorthEast,
        Quadrant::SouthWest,
        Quadrant::SouthEast,
    ];

    pub fn is_east(self) -> bool {
        matches!(self, Quadrant::NorthEast | Quadrant::SouthEast)
    }

    pub fn is_south(self) -> bool {
        matches!(self, Quadrant::SouthWest | Quadrant::SouthEast)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileKey {
    pub x: u32,
    pub y: u32,
    pub zoom: u32,
    pub layer: LayerType,
}

impl TileKey {
    pub const fn new(x: u32, y: u32, zoom: u32, layer: LayerType) -> Self {
        Self { x, y, zoom, layer }
    }

    /// The single tile covering the world at `zoom`
    pub const fn root(layer: LayerType, zoom: u32) -> Self {
        Self::new(0, 0, zoom, layer)
    }

    pub fn child(&self, quadrant: Quadrant) -> TileKey {
        let x = self.x * 2 + u32::from(quadrant.is_east());
        let y = self.y * 2 + u32::from(quadrant.is_south());
        TileKey::new(x, y, self.zoom + 1, self.layer)
    }

    /// Children in [`Quadrant::ALL`] order
    pub fn children(&self) -> [TileKey; 4] {
        Quadrant::ALL.map(|q| self.child(q))
    }

    /// Projected bounds of this tile in a pyramid whose single root tile at
    /// `root_zoom` covers the world. Row 0 is the northern edge.
    pub fn bounds(&self, root_zoom: u32) -> Bounds {
        let world = world_bounds();
        let depth = self.zoom.saturating_sub(root_zoom);
        let tiles = f64::from(depth).exp2();
        let w = world.width() / tiles;
        let h = world.height() / tiles;
        let min_x = world.min_x + f64::from(self.x) * w;
        let max_y = world.max_y - f64::from(self.y) * h;
        Bounds::new(min_x, max_y - h, min_x + w, max_y)
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}/{}", self.layer, self.zoom, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_keys() {
        let key = TileKey::new(3, 5, 4, LayerType::Buildings);
        let children = key.children();
        assert_eq!(children[0], TileKey::new(6, 10, 5, LayerType::Buildings));
        assert_eq!(children[1], TileKey::new(7, 10, 5, LayerType::Buildings));
        assert_eq!(children[2], TileKey::new(6, 11, 5, LayerType::Buildings));
        assert_eq!(children[3], TileKey::new(7, 11, 5, LayerType::Buildings));
    }

    #[test]
    fn test_bounds_match_quarters() {
        let root = TileKey::root(LayerType::Buildings, 0);
        assert_eq!(root.bounds(0), world_bounds());
        for quadrant in Quadrant::ALL {
            let child = root.child(quadrant);
            let expected = world_bounds().quarter(quadrant.is_east(), quadrant.is_south());
            assert_eq!(child.bounds(0), expected);
        }
        let grandchild = root.child(Quadrant::SouthEast).child(Quadrant::NorthWest);
        let expected = world_bounds().quarter(true, true).quarter(false, false);
        assert_eq!(grandchild.bounds(0), expected);
    }

    #[test]
    fn test_layer_ids_are_stable() {
        for layer in LayerType::ALL {
            assert_eq!(LayerType::from_id(layer.id()), Some(layer));
        }
        assert_eq!(LayerType::WaterAreas.id(), 5);
        assert_eq!(LayerType::from_id(7), None);
    }

    #[test]
    fn test_display() {
        let key = TileKey::new(1, 2, 3, LayerType::RoadLines);
        assert_eq!(key.to_string(), "road_lines/3/1/2");
    }
}
