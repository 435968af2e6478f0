//! Ring orientation via signed area
//!
//! The sign convention is `A = ½ Σ (x_j + x_i)(y_j − y_i)` with `j` the
//! previous vertex, so a counter-clockwise ring (y up) has negative area.
//! Convexity tests in the triangulator are written against this convention.

use serde::Serialize;

use super::types::Point;

/// Winding of a closed ring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RingOrientation {
    Clockwise,
    CounterClockwise,
    Degenerate,
}

/// Signed area of an open ring (closing edge implied)
pub fn signed_area(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    let mut j = n - 1;
    for i in 0..n {
        area += (points[j].x + points[i].x) * (points[j].y - points[i].y);
        j = i;
    }
    area * 0.5
}

/// Orientation of an open ring (closing point already stripped)
pub fn ring_orientation(points: &[Point]) -> RingOrientation {
    let area = signed_area(points);
    if area < 0.0 {
        RingOrientation::CounterClockwise
    } else if area > 0.0 {
        RingOrientation::Clockwise
    } else {
        // zero or NaN
        RingOrientation::Degenerate
    }
}

/// Orientation of a raw ring that must repeat its first point at the end.
/// Anything that is not explicitly closed is degenerate.
pub fn classify_closed_ring(points: &[Point]) -> RingOrientation {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) if points.len() >= 4 && first == last => {
            ring_orientation(&points[..points.len() - 1])
        }
        _ => RingOrientation::Degenerate,
    }
}
