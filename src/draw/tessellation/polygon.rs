//! Polygon tessellation by ear clipping
//!
//! The exterior ring is normalised to counter-clockwise and every hole to
//! clockwise. Holes are bridged into the exterior one at a time (rightmost
//! first) through a mutually visible vertex, which yields a single weakly
//! simple ring. That ring is then clipped ear by ear on a [`VertexRing`], with
//! only the two neighbours of a clipped ear re-classified.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::draw::geometry::{ring_orientation, Point, Polygon, Ring, RingOrientation, Triangle};
use crate::error::GeometryError;

use super::ring::{dedup_ring, point_in_triangle_strict, VertexRing};

#[derive(Debug, Clone, PartialEq)]
pub enum TriangulationStatus {
    Complete,
    /// No ear could be found with `remaining` vertices still linked. The
    /// triangles emitted up to that point are kept.
    Incomplete { remaining: usize },
    /// The exterior ring could not be triangulated at all
    Degenerate(GeometryError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Triangulation {
    pub triangles: Vec<Triangle>,
    pub status: TriangulationStatus,
    /// Holes that were malformed or had no visible exterior vertex
    pub skipped_holes: usize,
}

impl Triangulation {
    fn degenerate(err: GeometryError) -> Self {
        Self {
            triangles: Vec::new(),
            status: TriangulationStatus::Degenerate(err),
            skipped_holes: 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == TriangulationStatus::Complete
    }

    pub fn area(&self) -> f64 {
        self.triangles.iter().map(Triangle::area).sum()
    }
}

/// Triangulate a polygon. With `include_holes` the holes are bridged into the
/// exterior; without it only the exterior ring is filled.
pub fn triangulate(polygon: &Polygon, include_holes: bool) -> Triangulation {
    let exterior = match prepare_ring(polygon.exterior.points(), RingOrientation::CounterClockwise) {
        Ok(points) => points,
        Err(err) => return Triangulation::degenerate(err),
    };

    let mut skipped_holes = 0;
    let ring = if include_holes && !polygon.holes.is_empty() {
        let mut holes = Vec::with_capacity(polygon.holes.len());
        for hole in &polygon.holes {
            match prepare_ring(hole.points(), RingOrientation::Clockwise) {
                Ok(points) => holes.push(points),
                Err(err) => {
                    debug!("Skipping hole: {}", err);
                    skipped_holes += 1;
                }
            }
        }
        let (merged, dropped) = merge_holes(exterior, holes);
        skipped_holes += dropped;
        merged
    } else {
        exterior
    };

    let (triangles, status) = clip_ears(ring);
    if let TriangulationStatus::Incomplete { remaining } = status {
        warn!(
            "Triangulation incomplete: no ear with {} vertices left ({} triangles emitted)",
            remaining,
            triangles.len()
        );
    }

    Triangulation {
        triangles,
        status,
        skipped_holes,
    }
}

/// Triangulate a single ring without holes
pub fn triangulate_ring(points: &[Point]) -> Triangulation {
    triangulate(&Polygon::new(Ring::new(points.to_vec()), Vec::new()), false)
}

/// Validate a ring and bring it to the requested winding
fn prepare_ring(points: &[Point], winding: RingOrientation) -> Result<Vec<Point>, GeometryError> {
    if points.iter().any(|p| !p.is_finite()) {
        return Err(GeometryError::NonFinite);
    }
    let mut points = dedup_ring(points);
    if points.len() < 3 {
        return Err(GeometryError::TooFewPoints(points.len()));
    }
    match ring_orientation(&points) {
        RingOrientation::Degenerate => Err(GeometryError::ZeroArea),
        current if current == winding => Ok(points),
        _ => {
            points.reverse();
            Ok(points)
        }
    }
}

fn max_x(points: &[Point]) -> f64 {
    points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max)
}

/// Bridge every hole into the exterior, rightmost hole first. Returns the
/// merged ring and the number of holes that could not be bridged.
pub fn merge_holes(mut outer: Vec<Point>, mut holes: Vec<Vec<Point>>) -> (Vec<Point>, usize) {
    holes.sort_by(|a, b| max_x(b).total_cmp(&max_x(a)));

    let mut dropped = 0;
    for hole in &holes {
        match bridge_hole(&outer, hole) {
            Some(merged) => outer = merged,
            None => {
                warn!("Hole with {} vertices has no visible exterior vertex, dropping it", hole.len());
                dropped += 1;
            }
        }
    }
    (outer, dropped)
}

/// Splice `hole` into `outer` as `v, m, ..hole.., m, v`
fn bridge_hole(outer: &[Point], hole: &[Point]) -> Option<Vec<Point>> {
    let mut mi = 0;
    for (i, p) in hole.iter().enumerate() {
        if p.x > hole[mi].x {
            mi = i;
        }
    }
    let vi = visible_vertex(outer, hole[mi])?;
    let vi = facing_copy(outer, vi, hole[mi]);

    let mut merged = Vec::with_capacity(outer.len() + hole.len() + 2);
    merged.extend_from_slice(&outer[..=vi]);
    merged.extend(hole[mi..].iter().chain(hole[..mi].iter()).copied());
    merged.push(hole[mi]);
    merged.push(outer[vi]);
    merged.extend_from_slice(&outer[vi + 1..]);
    Some(merged)
}

/// Find an exterior vertex that `m` can see along a segment crossing no edge
fn visible_vertex(outer: &[Point], m: Point) -> Option<usize> {
    let n = outer.len();

    // Nearest crossing of the ray y = m.y, x >= m.x
    let mut hit: Option<(f64, usize)> = None;
    for i in 0..n {
        let a = outer[i];
        let b = outer[(i + 1) % n];
        if a.y == b.y || m.y < a.y.min(b.y) || m.y > a.y.max(b.y) {
            continue;
        }
        let x = a.x + (m.y - a.y) / (b.y - a.y) * (b.x - a.x);
        if x >= m.x && hit.map_or(true, |(best, _)| x < best) {
            hit = Some((x, i));
        }
    }
    let (hit_x, edge) = hit?;

    let ai = edge;
    let bi = (edge + 1) % n;
    if outer[ai].y == m.y {
        return Some(ai);
    }
    if outer[bi].y == m.y {
        return Some(bi);
    }

    let pi = if outer[ai].x > outer[bi].x { ai } else { bi };
    let p = outer[pi];
    let i_pt = Point::new(hit_x, m.y);

    // Reflex vertices inside (m, I, p) or on the segment m-p block the view
    let mut best: Option<(f64, f64, usize)> = None;
    for j in 0..n {
        let r = outer[j];
        if j == pi || r == p {
            continue;
        }
        let prev = outer[(j + n - 1) % n];
        let next = outer[(j + 1) % n];
        let reflex = r.sub(prev).cross(next.sub(r)) < 0.0;
        if !reflex {
            continue;
        }
        if !point_in_triangle_strict(r, m, i_pt, p) && !on_open_segment(r, m, p) {
            continue;
        }

        let dx = r.x - m.x;
        let tan = if dx > 0.0 { (r.y - m.y).abs() / dx } else { f64::INFINITY };
        let dist = r.distance_sq(m);
        let better = match best {
            None => true,
            Some((best_tan, best_dist, _)) => tan < best_tan || (tan == best_tan && dist < best_dist),
        };
        if better {
            best = Some((tan, dist, j));
        }
    }

    Some(best.map_or(pi, |(_, _, j)| j))
}

/// Earlier bridges leave coincident copies of a vertex in the ring. Pick the
/// copy whose interior angle contains the direction towards `m`, so the new
/// bridge cannot cross an old one.
fn facing_copy(outer: &[Point], vi: usize, m: Point) -> usize {
    if sector_contains(outer, vi, m) {
        return vi;
    }
    let v = outer[vi];
    (0..outer.len())
        .find(|&j| j != vi && outer[j] == v && sector_contains(outer, j, m))
        .unwrap_or(vi)
}

/// Whether the direction `v -> m` lies strictly inside the interior angle at
/// vertex `j` of a counter-clockwise ring
fn sector_contains(outer: &[Point], j: usize, m: Point) -> bool {
    let n = outer.len();
    let v = outer[j];
    let to_prev = outer[(j + n - 1) % n].sub(v);
    let to_next = outer[(j + 1) % n].sub(v);
    let d = m.sub(v);
    let after_next = to_next.cross(d) > 0.0;
    let before_prev = d.cross(to_prev) > 0.0;
    if to_prev.cross(to_next) <= 0.0 {
        // convex corner
        after_next && before_prev
    } else {
        after_next || before_prev
    }
}

fn on_open_segment(r: Point, a: Point, b: Point) -> bool {
    let ab = b.sub(a);
    let ar = r.sub(a);
    if ab.cross(ar) != 0.0 {
        return false;
    }
    let t = ab.dot(ar);
    t > 0.0 && t < ab.dot(ab)
}

struct EarState {
    reflex: Vec<bool>,
    ear: Vec<bool>,
    reflex_list: Vec<usize>,
    queue: VecDeque<usize>,
}

impl EarState {
    fn is_ear(&self, ring: &VertexRing, i: usize) -> bool {
        if self.reflex[i] {
            return false;
        }
        let p = ring.prev(i);
        let n = ring.next(i);
        let (a, b, c) = (ring.point(p), ring.point(i), ring.point(n));
        !self.reflex_list.iter().any(|&r| {
            r != p
                && r != i
                && r != n
                && ring.is_alive(r)
                && self.reflex[r]
                && point_in_triangle_strict(ring.point(r), a, b, c)
        })
    }

    fn classify(&mut self, ring: &VertexRing, i: usize) {
        let now_reflex = ring.turn(i) < 0.0;
        if now_reflex && !self.reflex[i] {
            self.reflex_list.push(i);
        }
        self.reflex[i] = now_reflex;

        let now_ear = self.is_ear(ring, i);
        if now_ear && !self.ear[i] {
            self.queue.push_back(i);
        }
        self.ear[i] = now_ear;
    }

    /// Re-examine every live vertex; used only when the queue runs dry
    fn rescan(&mut self, ring: &VertexRing) {
        self.reflex_list.retain(|&r| ring.is_alive(r));
        for i in ring.indices() {
            self.ear[i] = false;
            self.classify(ring, i);
        }
    }
}

fn clip_ears(points: Vec<Point>) -> (Vec<Triangle>, TriangulationStatus) {
    let mut ring = VertexRing::new(points);
    let n = ring.capacity();
    let mut triangles = Vec::with_capacity(n.saturating_sub(2));

    let mut state = EarState {
        reflex: vec![false; n],
        ear: vec![false; n],
        reflex_list: Vec::new(),
        queue: VecDeque::new(),
    };
    for i in 0..n {
        if ring.turn(i) < 0.0 {
            state.reflex[i] = true;
            state.reflex_list.push(i);
        }
    }
    for i in 0..n {
        if state.is_ear(&ring, i) {
            state.ear[i] = true;
            state.queue.push_back(i);
        }
    }

    while ring.len() > 3 {
        let i = match state.queue.pop_front() {
            Some(i) => i,
            None => {
                state.rescan(&ring);
                match state.queue.pop_front() {
                    Some(i) => i,
                    None => {
                        let remaining = ring.len();
                        return (triangles, TriangulationStatus::Incomplete { remaining });
                    }
                }
            }
        };
        if !ring.is_alive(i) || !state.ear[i] {
            continue;
        }

        let prev = ring.prev(i);
        let next = ring.next(i);
        triangles.push(Triangle::new(ring.point(prev), ring.point(i), ring.point(next)));
        ring.remove(i);
        state.ear[i] = false;

        state.classify(&ring, prev);
        state.classify(&ring, next);
    }

    let h = ring.head();
    triangles.push(Triangle::new(ring.point(ring.prev(h)), ring.point(h), ring.point(ring.next(h))));
    (triangles, TriangulationStatus::Complete)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn test_facing_copy_picks_side_of_bridge() {
        let outer = pts(&[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)]);
        let hole = pts(&[(60.0, 70.0), (60.0, 90.0), (80.0, 90.0), (80.0, 70.0)]);
        let (merged, dropped) = merge_holes(outer, vec![hole]);
        assert_eq!(dropped, 0);

        let corner = Point::new(100.0, 100.0);
        let copies: Vec<usize> = (0..merged.len()).filter(|&i| merged[i] == corner).collect();
        assert_eq!(copies.len(), 2);

        // Above the bridge only the second copy faces the target
        let above = Point::new(75.0, 93.0);
        assert_eq!(facing_copy(&merged, copies[0], above), copies[1]);
        assert_eq!(facing_copy(&merged, copies[1], above), copies[1]);

        // Below it the first copy does
        let below = Point::new(90.0, 50.0);
        assert_eq!(facing_copy(&merged, copies[1], below), copies[0]);
    }

    #[test]
    fn test_convex_polygon_gives_n_minus_two() {
        let hexagon: Vec<Point> = (0..6)
            .map(|i| {
                let a = i as f64 * std::f64::consts::PI / 3.0;
                Point::new(a.cos() * 10.0, a.sin() * 10.0)
            })
            .collect();
        let result = triangulate_ring(&hexagon);
        assert!(result.is_complete());
        assert_eq!(result.triangles.len(), 4);
        let expected = Ring::new(hexagon).area();
        assert!((result.area() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_clockwise_input_is_normalised() {
        let cw = pts(&[(0.0, 0.0), (0.0, 2.0), (2.0, 2.0), (2.0, 0.0)]);
        let result = triangulate_ring(&cw);
        assert_eq!(result.triangles.len(), 2);
        assert!((result.area() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_concave_polygon_area() {
        // L shape
        let l = pts(&[(0.0, 0.0), (4.0, 0.0), (4.0, 1.0), (1.0, 1.0), (1.0, 4.0), (0.0, 4.0)]);
        let result = triangulate_ring(&l);
        assert!(result.is_complete());
        assert_eq!(result.triangles.len(), 4);
        assert!((result.area() - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_square_with_hole() {
        let outer = Ring::new(pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]));
        let hole = Ring::new(pts(&[(3.0, 3.0), (6.0, 3.0), (6.0, 6.0), (3.0, 6.0)]));
        let polygon = Polygon::new(outer, vec![hole]);

        let with_holes = triangulate(&polygon, true);
        assert!(with_holes.is_complete());
        assert_eq!(with_holes.skipped_holes, 0);
        assert!((with_holes.area() - 91.0).abs() < 1e-9);
        // n + h + 2 bridged vertices
        assert_eq!(with_holes.triangles.len(), 8);

        let without = triangulate(&polygon, false);
        assert!((without.area() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_bridge_goes_to_visible_vertex() {
        let outer = pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        let m = Point::new(6.0, 5.0);
        // ray hits edge (10,0)-(10,10); endpoint with max x is either, tie picks the end
        let vi = visible_vertex(&outer, m).unwrap();
        assert!(vi == 1 || vi == 2);
    }

    #[test]
    fn test_degenerate_inputs() {
        let two = triangulate_ring(&pts(&[(0.0, 0.0), (1.0, 1.0)]));
        assert_eq!(two.status, TriangulationStatus::Degenerate(GeometryError::TooFewPoints(2)));
        assert!(two.triangles.is_empty());

        let flat = triangulate_ring(&pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]));
        assert_eq!(flat.status, TriangulationStatus::Degenerate(GeometryError::ZeroArea));

        let nan = triangulate_ring(&pts(&[(0.0, 0.0), (f64::NAN, 0.0), (1.0, 1.0)]));
        assert_eq!(nan.status, TriangulationStatus::Degenerate(GeometryError::NonFinite));
    }

    #[test]
    fn test_malformed_hole_is_skipped() {
        let outer = Ring::new(pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]));
        let hole = Ring::new(pts(&[(3.0, 3.0), (6.0, 3.0)]));
        let result = triangulate(&Polygon::new(outer, vec![hole]), true);
        assert_eq!(result.skipped_holes, 1);
        assert!((result.area() - 100.0).abs() < 1e-9);
    }
}
