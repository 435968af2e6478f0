//! Doubly-linked vertex ring used by the ear clipper
//!
//! Vertices live in a flat array and are addressed by their original index.
//! Removal only rewires the `prev`/`next` links of the two neighbours, so
//! clipping an ear and finding the vertices whose status may have changed are
//! both O(1).

use crate::draw::geometry::Point;

#[derive(Debug, Clone)]
pub struct VertexRing {
    points: Vec<Point>,
    prev: Vec<usize>,
    next: Vec<usize>,
    alive: Vec<bool>,
    len: usize,
    head: usize,
}

impl VertexRing {
    /// Link `points` into a cycle in order
    pub fn new(points: Vec<Point>) -> Self {
        let n = points.len();
        let prev = (0..n).map(|i| if i == 0 { n.saturating_sub(1) } else { i - 1 }).collect();
        let next = (0..n).map(|i| if i + 1 == n { 0 } else { i + 1 }).collect();
        Self {
            points,
            prev,
            next,
            alive: vec![true; n],
            len: n,
            head: 0,
        }
    }

    /// Number of vertices still linked
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total slots, including removed vertices
    pub fn capacity(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn point(&self, i: usize) -> Point {
        self.points[i]
    }

    #[inline]
    pub fn prev(&self, i: usize) -> usize {
        self.prev[i]
    }

    #[inline]
    pub fn next(&self, i: usize) -> usize {
        self.next[i]
    }

    #[inline]
    pub fn is_alive(&self, i: usize) -> bool {
        self.alive[i]
    }

    /// Any vertex still in the ring
    pub fn head(&self) -> usize {
        self.head
    }

    /// Unlink vertex `i`. Removing an already removed vertex is a no-op.
    pub fn remove(&mut self, i: usize) {
        if !self.alive[i] {
            return;
        }
        let p = self.prev[i];
        let n = self.next[i];
        self.next[p] = n;
        self.prev[n] = p;
        self.alive[i] = false;
        self.len -= 1;
        if self.head == i {
            self.head = n;
        }
    }

    /// Live vertex indices in ring order starting at the head
    pub fn indices(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.len);
        if self.len == 0 {
            return out;
        }
        let mut i = self.head;
        for _ in 0..self.len {
            out.push(i);
            i = self.next[i];
        }
        out
    }

    /// Turn at vertex `i`: cross of incoming and outgoing edge vectors.
    /// Positive is a left turn.
    pub fn turn(&self, i: usize) -> f64 {
        let prev = self.points[self.prev[i]];
        let cur = self.points[i];
        let next = self.points[self.next[i]];
        cur.sub(prev).cross(next.sub(cur))
    }
}

/// Drop consecutive duplicates, including a trailing copy of the first point
pub fn dedup_ring(points: &[Point]) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        if out.last() != Some(&p) {
            out.push(p);
        }
    }
    while out.len() > 1 && out.first() == out.last() {
        out.pop();
    }
    out
}

/// Barycentric containment test that excludes the boundary. The three signed
/// sub-areas must share a strict sign; a zero-area triangle contains nothing.
pub fn point_in_triangle_strict(p: Point, a: Point, b: Point, c: Point) -> bool {
    let denom = b.sub(a).cross(c.sub(a));
    if denom == 0.0 || !denom.is_finite() {
        return false;
    }
    let s1 = b.sub(a).cross(p.sub(a));
    let s2 = c.sub(b).cross(p.sub(b));
    let s3 = a.sub(c).cross(p.sub(c));
    if denom > 0.0 {
        s1 > 0.0 && s2 > 0.0 && s3 > 0.0
    } else {
        s1 < 0.0 && s2 < 0.0 && s3 < 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ]
    }

    #[test]
    fn test_remove_relinks_neighbours() {
        let mut ring = VertexRing::new(square());
        ring.remove(1);
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.next(0), 2);
        assert_eq!(ring.prev(2), 0);
        assert!(!ring.is_alive(1));

        ring.remove(0);
        assert_eq!(ring.indices(), vec![2, 3]);
    }

    #[test]
    fn test_turn_sign_on_counter_clockwise_ring() {
        let ring = VertexRing::new(square());
        for i in 0..4 {
            assert!(ring.turn(i) > 0.0);
        }
    }

    #[test]
    fn test_dedup_ring() {
        let pts = vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 0.0),
        ];
        assert_eq!(dedup_ring(&pts).len(), 3);
    }

    #[test]
    fn test_point_on_edge_is_outside() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(4.0, 0.0);
        let c = Point::new(0.0, 4.0);
        assert!(point_in_triangle_strict(Point::new(1.0, 1.0), a, b, c));
        assert!(point_in_triangle_strict(Point::new(1.0, 1.0), a, c, b));
        assert!(!point_in_triangle_strict(Point::new(2.0, 0.0), a, b, c));
        assert!(!point_in_triangle_strict(a, a, b, c));
        assert!(!point_in_triangle_strict(Point::new(5.0, 5.0), a, b, c));
    }
}
