//! Camera and the visible region derived from it

use crate::draw::geometry::projection::{project, WORLD_HALF_EXTENT};
use crate::draw::geometry::{Bounds, Point};

/// What render and split decisions look at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub bounds: Bounds,
    pub target_zoom: u32,
}

impl Viewport {
    pub fn new(bounds: Bounds, target_zoom: u32) -> Self {
        Self { bounds, target_zoom }
    }
}

/// Zoom level a pyramid should reach at `scale`: `floor(log2(scale) + 1)`,
/// clamped to `[0, max_zoom]`
pub fn target_zoom(scale: f64, max_zoom: u32) -> u32 {
    if !(scale.is_finite() && scale > 0.0) {
        return 0;
    }
    let zoom = (scale.log2() + 1.0).floor();
    if zoom <= 0.0 {
        0
    } else {
        (zoom as u32).min(max_zoom)
    }
}

/// Orthographic map camera. At scale 1 with aspect 1 the whole world is visible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub center: Point,
    pub scale: f64,
    /// Screen width / height
    pub aspect_ratio: f64,
}

impl Camera {
    pub fn new(center: Point, scale: f64, aspect_ratio: f64) -> Self {
        Self {
            center,
            scale,
            aspect_ratio,
        }
    }

    pub fn from_lon_lat(lon: f64, lat: f64, scale: f64, aspect_ratio: f64) -> Self {
        Self::new(project(lon, lat), scale, aspect_ratio)
    }

    pub fn set_scale(&mut self, scale: f64) {
        if scale.is_finite() && scale > 0.0 {
            self.scale = scale;
        }
    }

    pub fn zoom_by(&mut self, factor: f64) {
        self.set_scale(self.scale * factor);
    }

    /// Move the camera so the map follows a drag of `(dx, dy)` screen pixels.
    /// Screen y grows downwards.
    pub fn pan_pixels(&mut self, dx: f64, dy: f64, screen_width: f64, screen_height: f64) {
        if screen_width <= 0.0 || screen_height <= 0.0 {
            return;
        }
        let world_w = 2.0 * WORLD_HALF_EXTENT * self.aspect_ratio / self.scale;
        let world_h = 2.0 * WORLD_HALF_EXTENT / self.scale;
        self.center.x -= dx / screen_width * world_w;
        self.center.y += dy / screen_height * world_h;
    }

    pub fn bounds(&self) -> Bounds {
        let half_w = WORLD_HALF_EXTENT * self.aspect_ratio / self.scale;
        let half_h = WORLD_HALF_EXTENT / self.scale;
        Bounds::new(
            self.center.x - half_w,
            self.center.y - half_h,
            self.center.x + half_w,
            self.center.y + half_h,
        )
    }

    pub fn target_zoom(&self, max_zoom: u32) -> u32 {
        target_zoom(self.scale, max_zoom)
    }

    pub fn viewport(&self, max_zoom: u32) -> Viewport {
        Viewport::new(self.bounds(), self.target_zoom(max_zoom))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_zoom() {
        assert_eq!(target_zoom(1.0, 18), 1);
        assert_eq!(target_zoom(1500.0, 18), 11);
        assert_eq!(target_zoom(2.0, 18), 2);
        assert_eq!(target_zoom(0.25, 18), 0);
        assert_eq!(target_zoom(1e9, 18), 18);
        assert_eq!(target_zoom(f64::NAN, 18), 0);
    }

    #[test]
    fn test_bounds_follow_scale_and_aspect() {
        let camera = Camera::new(Point::new(0.0, 0.0), 2.0, 2.0);
        let b = camera.bounds();
        assert!((b.max_x - WORLD_HALF_EXTENT).abs() < 1e-6);
        assert!((b.max_y - WORLD_HALF_EXTENT / 2.0).abs() < 1e-6);
        assert_eq!(b.center(), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_pan_moves_against_drag() {
        let mut camera = Camera::new(Point::new(0.0, 0.0), 1.0, 1.0);
        camera.pan_pixels(50.0, 50.0, 100.0, 100.0);
        assert!((camera.center.x + WORLD_HALF_EXTENT).abs() < 1e-6);
        assert!((camera.center.y - WORLD_HALF_EXTENT).abs() < 1e-6);
    }
}
