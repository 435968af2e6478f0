//! Spherical (Web) Mercator projection helpers

use std::f64::consts::PI;

use super::types::{Bounds, Point};

/// Earth radius used by the spherical Mercator projection
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Half the projected world width in meters (x of longitude 180)
pub const WORLD_HALF_EXTENT: f64 = EARTH_RADIUS * PI;

#[inline]
pub fn lon_to_x(lon: f64) -> f64 {
    EARTH_RADIUS * lon.to_radians()
}

#[inline]
pub fn lat_to_y(lat: f64) -> f64 {
    (PI / 4.0 + lat.to_radians() / 2.0).tan().ln() * EARTH_RADIUS
}

#[inline]
pub fn x_to_lon(x: f64) -> f64 {
    (x / EARTH_RADIUS).to_degrees()
}

#[inline]
pub fn y_to_lat(y: f64) -> f64 {
    (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees()
}

/// Project a (lon, lat) pair
#[inline]
pub fn project(lon: f64, lat: f64) -> Point {
    Point::new(lon_to_x(lon), lat_to_y(lat))
}

/// Bounds of the root tile. The world is square in projected space.
pub fn world_bounds() -> Bounds {
    Bounds::new(
        -WORLD_HALF_EXTENT,
        -WORLD_HALF_EXTENT,
        WORLD_HALF_EXTENT,
        WORLD_HALF_EXTENT,
    )
}
