// Line stroking and styled road output
use std::f64::consts::PI;

use tile_pyramid::config::StyleConfig;
use tile_pyramid::draw::generation::{build_tile_mesh, TileContext};
use tile_pyramid::draw::geometry::{Bounds, Geometry, LineCap, Point, Triangle};
use tile_pyramid::draw::tessellation::{stroke, stroke_multi, ROUND_CAP_SEGMENTS};
use tile_pyramid::error::{GeometryError, TessellationError};
use tile_pyramid::tiles::{Feature, LayerType, TileKey};

fn area(triangles: &[Triangle]) -> f64 {
    triangles.iter().map(Triangle::area).sum()
}

fn max_distance_to_polyline(p: Point, line: &[Point]) -> f64 {
    line.windows(2)
        .map(|w| {
            let (a, b) = (w[0], w[1]);
            let ab = b.sub(a);
            let t = (p.sub(a).dot(ab) / ab.dot(ab)).clamp(0.0, 1.0);
            p.distance_sq(a.add(ab.scale(t))).sqrt()
        })
        .fold(f64::INFINITY, f64::min)
}

#[test]
fn test_straight_butt_line_is_a_rectangle() {
    let line = [Point::new(-5.0, 2.0), Point::new(5.0, 2.0)];
    let triangles = stroke(&line, LineCap::Butt, 4.0).unwrap();
    assert_eq!(triangles.len(), 2);
    assert!((area(&triangles) - 40.0).abs() < 1e-9);
    for t in &triangles {
        for v in t.vertices() {
            assert!(v.x >= -5.0 - 1e-12 && v.x <= 5.0 + 1e-12);
            assert!((v.y - 2.0).abs() <= 2.0 + 1e-12);
        }
    }
}

#[test]
fn test_collinear_points_keep_constant_width() {
    let line = [Point::new(0.0, 0.0), Point::new(3.0, 0.0), Point::new(7.0, 0.0)];
    let triangles = stroke(&line, LineCap::Butt, 1.0).unwrap();
    assert_eq!(triangles.len(), 4);
    assert!((area(&triangles) - 7.0).abs() < 1e-9);
}

#[test]
fn test_round_caps_add_twenty_triangles() {
    let line = [Point::new(0.0, 0.0), Point::new(4.0, 3.0)];
    let butt = stroke(&line, LineCap::Butt, 2.0).unwrap();
    let round = stroke(&line, LineCap::Round, 2.0).unwrap();
    assert_eq!(round.len(), butt.len() + 2 * ROUND_CAP_SEGMENTS);

    // Every cap vertex lies on the circle of half the width around an endpoint
    for t in &round[butt.len()..] {
        for v in t.vertices() {
            let d0 = v.distance_sq(line[0]).sqrt();
            let d1 = v.distance_sq(line[1]).sqrt();
            assert!(d0 <= 1.0 + 1e-9 || d1 <= 1.0 + 1e-9);
        }
    }
    let caps = area(&round) - area(&butt);
    let regular_20_gon = 0.5 * 20.0 * (2.0 * PI / 20.0).sin();
    assert!((caps - regular_20_gon).abs() < 1e-9);
}

#[test]
fn test_square_caps_are_rejected() {
    let line = [Point::new(0.0, 0.0), Point::new(1.0, 1.0)];
    assert_eq!(
        stroke(&line, LineCap::Square, 1.0),
        Err(TessellationError::UnsupportedCap(LineCap::Square))
    );
    assert!(stroke_multi(&[line.to_vec()], LineCap::Square, 1.0).is_err());
}

#[test]
fn test_non_finite_points_are_rejected() {
    let line = [Point::new(0.0, 0.0), Point::new(f64::NAN, 1.0)];
    assert_eq!(
        stroke(&line, LineCap::Butt, 1.0),
        Err(TessellationError::Geometry(GeometryError::NonFinite))
    );
}

#[test]
fn test_zigzag_stays_near_the_line() {
    let line: Vec<Point> = (0..12)
        .map(|i| Point::new(i as f64 * 3.0, if i % 2 == 0 { 0.0 } else { 2.0 }))
        .collect();
    let width = 0.5;
    let triangles = stroke(&line, LineCap::Round, width).unwrap();
    assert_eq!(triangles.len(), 2 * (line.len() - 1) + 2 * ROUND_CAP_SEGMENTS);
    assert!(triangles.iter().all(Triangle::is_finite));

    // Miter corners reach at most half the width / sin(half the turn angle)
    let turn = (2.0f64).atan2(3.0) * 2.0;
    let miter = width * 0.5 / ((PI - turn) * 0.5).sin();
    for t in &triangles {
        for v in t.vertices() {
            assert!(max_distance_to_polyline(v, &line) <= miter + 1e-9);
        }
    }
}

#[test]
fn test_multi_part_lines_concatenate() {
    let parts = vec![
        vec![Point::new(0.0, 0.0), Point::new(2.0, 0.0)],
        vec![Point::new(5.0, 5.0)],
        vec![Point::new(0.0, 3.0), Point::new(0.0, 6.0), Point::new(4.0, 6.0)],
    ];
    let triangles = stroke_multi(&parts, LineCap::Butt, 1.0).unwrap();
    assert_eq!(triangles.len(), 2 + 0 + 4);
}

#[test]
fn test_road_tile_gets_casing_and_inner_line() {
    let key = TileKey::new(0, 0, 0, LayerType::RoadLines);
    let bounds = Bounds::new(0.0, 0.0, 1080.0, 1080.0);
    let ctx = TileContext::new(key, bounds, 1080, false);
    let style = StyleConfig::default();

    let road = Feature::new(Geometry::LineString(vec![Point::new(100.0, 500.0), Point::new(900.0, 500.0)]))
        .with_attr("highway", "primary")
        .with_attr("kind", "highway");
    let mesh = build_tile_mesh(&[road], &ctx, &style);

    // Round-capped inner line plus a butt-capped casing
    assert_eq!(mesh.triangle_count(), (2 + 2 * ROUND_CAP_SEGMENTS) + 2);
    let colors: Vec<[u8; 4]> = mesh.colors().chunks(4).map(|c| [c[0], c[1], c[2], c[3]]).collect();
    assert!(colors.contains(&[250, 225, 104, 255]));

    // Casing is wider than the inner line: primary is 16 px plus 3 px at 1 unit per pixel
    let max_y = mesh.positions().chunks(3).map(|v| v[1]).fold(f32::MIN, f32::max);
    assert!((max_y - (500.0 + 19.0 / 2.0)).abs() < 1e-3);
}
