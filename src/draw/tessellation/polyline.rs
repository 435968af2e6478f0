//! Polyline stroking
//!
//! Converts a polyline with a width into a band of triangles, two per
//! segment. Interior vertices are joined at the intersection of the adjoining
//! segments' offset lines (implicit miter, no limit). Ends are either left
//! flat (`Butt`) or closed with a half-turn fan (`Round`).

use std::f64::consts::PI;

use crate::draw::geometry::{LineCap, Point, Triangle};
use crate::error::{GeometryError, TessellationError};

/// Number of fan triangles in one round cap
pub const ROUND_CAP_SEGMENTS: usize = 10;

/// |sin| of the turn angle below which two segments count as parallel
const PARALLEL_EPS: f64 = 1e-12;

/// Left and right boundary of the band at one end of a segment
#[derive(Debug, Clone, Copy)]
struct Section {
    left: Point,
    right: Point,
}

/// Unit direction and scaled left normal of one segment
#[derive(Debug, Clone, Copy)]
struct Segment {
    dir: Point,
    normal: Point,
}

impl Segment {
    fn new(a: Point, b: Point, half_width: f64) -> Self {
        let d = b.sub(a);
        let dir = d.scale(1.0 / d.length());
        Self {
            dir,
            normal: Point::new(-dir.y, dir.x).scale(half_width),
        }
    }
}

/// Stroke a single polyline
pub fn stroke(points: &[Point], cap: LineCap, width: f64) -> Result<Vec<Triangle>, TessellationError> {
    if cap == LineCap::Square {
        return Err(TessellationError::UnsupportedCap(cap));
    }
    if points.iter().any(|p| !p.is_finite()) {
        return Err(GeometryError::NonFinite.into());
    }

    let mut work: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        if work.last() != Some(&p) {
            work.push(p);
        }
    }
    if work.len() < 2 || width <= 0.0 || !width.is_finite() {
        return Ok(Vec::new());
    }

    let half_width = width * 0.5;
    let segments: Vec<Segment> = work
        .windows(2)
        .map(|w| Segment::new(w[0], w[1], half_width))
        .collect();

    let cap_count = if cap == LineCap::Round { 2 * ROUND_CAP_SEGMENTS } else { 0 };
    let mut triangles = Vec::with_capacity(segments.len() * 2 + cap_count);

    // Start section of the first segment
    let first = segments[0];
    let mut start = Section {
        left: work[0].add(first.normal),
        right: work[0].sub(first.normal),
    };

    for (k, seg) in segments.iter().enumerate() {
        let end_point = work[k + 1];
        let (end, next_start) = match segments.get(k + 1) {
            Some(next) => join(end_point, seg, next),
            None => {
                let s = Section {
                    left: end_point.add(seg.normal),
                    right: end_point.sub(seg.normal),
                };
                (s, s)
            }
        };

        triangles.push(Triangle::new(start.left, start.right, end.left));
        triangles.push(Triangle::new(end.left, start.right, end.right));
        start = next_start;
    }

    if cap == LineCap::Round {
        let last = segments[segments.len() - 1];
        add_round_cap(&mut triangles, work[0], first.normal, half_width);
        add_round_cap(&mut triangles, work[work.len() - 1], last.normal.scale(-1.0), half_width);
    }

    Ok(triangles)
}

/// Stroke every part of a multi-part line and concatenate the results
pub fn stroke_multi(parts: &[Vec<Point>], cap: LineCap, width: f64) -> Result<Vec<Triangle>, TessellationError> {
    let mut triangles = Vec::new();
    for part in parts {
        triangles.extend(stroke(part, cap, width)?);
    }
    Ok(triangles)
}

/// Boundary at the shared vertex `p` of `a` and `b`. Returns the end section
/// of `a` and the start section of `b`; they differ only on a reversal.
fn join(p: Point, a: &Segment, b: &Segment) -> (Section, Section) {
    let cross = a.dir.cross(b.dir);

    if cross.abs() > PARALLEL_EPS {
        // p + n_a + t*d_a == p + n_b + s*d_b
        let w = b.normal.sub(a.normal);
        let t = w.cross(b.dir) / cross;
        let offset = a.normal.add(a.dir.scale(t));
        let section = Section {
            left: p.add(offset),
            right: p.sub(offset),
        };
        if section.left.is_finite() && section.right.is_finite() {
            return (section, section);
        }
    } else if a.dir.dot(b.dir) > 0.0 {
        let section = Section {
            left: p.add(a.normal),
            right: p.sub(a.normal),
        };
        return (section, section);
    }

    // Line doubles back on itself: square off both segments at p
    let end = Section {
        left: p.add(a.normal),
        right: p.sub(a.normal),
    };
    let start = Section {
        left: p.add(b.normal),
        right: p.sub(b.normal),
    };
    (end, start)
}

/// Half-turn fan around `center`, sweeping counter-clockwise from `from`
fn add_round_cap(triangles: &mut Vec<Triangle>, center: Point, from: Point, radius: f64) {
    let base_angle = from.y.atan2(from.x);
    let arc = |i: usize| {
        let ang = base_angle + PI * i as f64 / ROUND_CAP_SEGMENTS as f64;
        Point::new(center.x + ang.cos() * radius, center.y + ang.sin() * radius)
    };

    let mut prev = arc(0);
    for i in 1..=ROUND_CAP_SEGMENTS {
        let cur = arc(i);
        triangles.push(Triangle::new(center, prev, cur));
        prev = cur;
    }
}
