//! Core geometry types for projected map data
//!
//! Everything here is already in planar (spherical Mercator) meters. Rings are
//! stored open: an explicit closing point is stripped when the ring is built.

use serde::{Deserialize, Serialize};

use super::orientation::{ring_orientation, RingOrientation};

/// A 2D point in projected coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    #[inline]
    pub fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    #[inline]
    pub fn scale(self, factor: f64) -> Point {
        Point::new(self.x * factor, self.y * factor)
    }

    /// z component of the 2D cross product
    #[inline]
    pub fn cross(self, other: Point) -> f64 {
        self.x * other.y - self.y * other.x
    }

    #[inline]
    pub fn dot(self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    #[inline]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    #[inline]
    pub fn distance_sq(self, other: Point) -> f64 {
        let d = self.sub(other);
        d.dot(d)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Axis-aligned bounds, y grows north
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Smallest bounds containing all points, `None` for an empty slice
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Bounds::new(first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            bounds.min_x = bounds.min_x.min(p.x);
            bounds.min_y = bounds.min_y.min(p.y);
            bounds.max_x = bounds.max_x.max(p.x);
            bounds.max_y = bounds.max_y.max(p.y);
        }
        Some(bounds)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
        )
    }

    /// Open-interval overlap test; bounds that only share an edge do not intersect
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min_x < other.max_x
            && other.min_x < self.max_x
            && self.min_y < other.max_y
            && other.min_y < self.max_y
    }

    pub fn contains(&self, other: &Bounds) -> bool {
        self.min_x <= other.min_x
            && self.min_y <= other.min_y
            && self.max_x >= other.max_x
            && self.max_y >= other.max_y
    }

    /// One quarter of these bounds. `east` picks the right half, `south` the
    /// lower half. Split lines are shared midpoints so siblings tile exactly.
    pub fn quarter(&self, east: bool, south: bool) -> Bounds {
        let mid_x = (self.min_x + self.max_x) * 0.5;
        let mid_y = (self.min_y + self.max_y) * 0.5;
        let (min_x, max_x) = if east { (mid_x, self.max_x) } else { (self.min_x, mid_x) };
        let (min_y, max_y) = if south { (self.min_y, mid_y) } else { (mid_y, self.max_y) };
        Bounds::new(min_x, min_y, max_x, max_y)
    }
}

/// Line cap style for stroked polylines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

/// A closed ring of points, stored without the closing duplicate
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Point>", into = "Vec<Point>")]
pub struct Ring {
    points: Vec<Point>,
}

impl Ring {
    /// Build a ring, dropping an explicit closing point if present
    pub fn new(mut points: Vec<Point>) -> Self {
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// At least three vertices
    pub fn is_valid(&self) -> bool {
        self.points.len() >= 3
    }

    pub fn orientation(&self) -> RingOrientation {
        ring_orientation(&self.points)
    }

    pub fn reversed(&self) -> Ring {
        let mut points = self.points.clone();
        points.reverse();
        Ring { points }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.points)
    }

    /// Absolute enclosed area
    pub fn area(&self) -> f64 {
        super::orientation::signed_area(&self.points).abs()
    }
}

impl From<Vec<Point>> for Ring {
    fn from(points: Vec<Point>) -> Self {
        Ring::new(points)
    }
}

impl From<Ring> for Vec<Point> {
    fn from(ring: Ring) -> Self {
        ring.points
    }
}

/// Exterior ring plus zero or more holes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon {
    pub exterior: Ring,
    #[serde(default)]
    pub holes: Vec<Ring>,
}

impl Polygon {
    pub fn new(exterior: Ring, holes: Vec<Ring>) -> Self {
        Self { exterior, holes }
    }

    /// Exterior area minus hole areas
    pub fn area(&self) -> f64 {
        self.exterior.area() - self.holes.iter().map(Ring::area).sum::<f64>()
    }
}

/// Output triangle; never mutated after tessellation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub a: Point,
    pub b: Point,
    pub c: Point,
}

impl Triangle {
    pub const fn new(a: Point, b: Point, c: Point) -> Self {
        Self { a, b, c }
    }

    pub fn area(&self) -> f64 {
        (self.b.sub(self.a).cross(self.c.sub(self.a)) * 0.5).abs()
    }

    pub fn is_finite(&self) -> bool {
        self.a.is_finite() && self.b.is_finite() && self.c.is_finite()
    }

    pub fn vertices(&self) -> [Point; 3] {
        [self.a, self.b, self.c]
    }
}

/// Feature geometry as delivered by a tile feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Point),
    LineString(Vec<Point>),
    Polygon(Polygon),
    MultiLineString(Vec<Vec<Point>>),
    MultiPolygon(Vec<Polygon>),
}

impl Geometry {
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::LineString(_) => "LineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiLineString(_) => "MultiLineString",
            Geometry::MultiPolygon(_) => "MultiPolygon",
        }
    }
}
