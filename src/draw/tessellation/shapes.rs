//! Standard shape tessellation

use std::f64::consts::PI;

use crate::draw::geometry::{Point, Triangle};

/// Tessellate a filled circle into a triangle fan of `segments` triangles
pub fn circle_fan(center: Point, radius: f64, segments: usize) -> Vec<Triangle> {
    if segments < 3 || radius <= 0.0 || !radius.is_finite() {
        return Vec::new();
    }

    let rim = |i: usize| {
        let angle = (i as f64 / segments as f64) * 2.0 * PI;
        Point::new(center.x + angle.cos() * radius, center.y + angle.sin() * radius)
    };

    let mut triangles = Vec::with_capacity(segments);
    let mut prev = rim(0);
    for i in 1..=segments {
        let cur = rim(i);
        triangles.push(Triangle::new(center, prev, cur));
        prev = cur;
    }
    triangles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_fan() {
        let tris = circle_fan(Point::new(2.0, 3.0), 4.0, 10);
        assert_eq!(tris.len(), 10);
        let area: f64 = tris.iter().map(Triangle::area).sum();
        let expected = 0.5 * 10.0 * 16.0 * (2.0 * PI / 10.0).sin();
        assert!((area - expected).abs() < 1e-9);
    }

    #[test]
    fn test_zero_radius_is_empty() {
        assert!(circle_fan(Point::new(0.0, 0.0), 0.0, 10).is_empty());
    }
}
