//! Headless zoom simulation over a tile pyramid
//!
//! Usage:
//!   cargo run --release --bin pyramid_sim -- [options]
//!
//! Options:
//!   --config <file>     Pyramid config JSON (defaults otherwise)
//!   --tiles <dir>       Read tiles from <dir>/<layer>/<zoom>/<x>/<y>.json
//!   --frames <n>        Number of frames to simulate (default 12)
//!   --zoom-step <f>     Scale factor applied between frames (default 2.0)
//!   --export <dir>      Write the meshes drawn in the last frame as .tmsh files
//!   --json <file>       Write the meshes drawn in the last frame as JSON
//!
//! Without `--tiles` a synthetic feed generates a regular city block pattern
//! for every tile, so splits always have something to tessellate.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::info;

use tile_pyramid::config::PyramidConfig;
use tile_pyramid::draw::geometry::{mesh_to_bytes, Geometry, Point, Polygon, Ring, VertexMesh};
use tile_pyramid::error::FeedError;
use tile_pyramid::logging;
use tile_pyramid::tiles::{Camera, DirectoryFeed, Feature, GeometryFeed, LayerType, TileKey, TilePyramid};

const CELLS: u32 = 4;
const HIGHWAYS: [&str; 5] = ["primary", "secondary", "residential", "service", "footway"];
const LAND_KINDS: [&str; 4] = ["park", "residential", "forest", "commercial"];

/// Generates a grid of blocks, streets and points inside each tile
struct SyntheticFeed {
    root_zoom: u32,
    calls: AtomicUsize,
}

impl SyntheticFeed {
    fn new(root_zoom: u32) -> Self {
        Self {
            root_zoom,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

fn rect(min: Point, max: Point) -> Ring {
    Ring::new(vec![
        Point::new(min.x, min.y),
        Point::new(max.x, min.y),
        Point::new(max.x, max.y),
        Point::new(min.x, max.y),
    ])
}

impl GeometryFeed for SyntheticFeed {
    fn fetch(&self, key: TileKey) -> Result<Vec<Feature>, FeedError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let bounds = key.bounds(self.root_zoom);
        let cell_w = bounds.width() / f64::from(CELLS);
        let cell_h = bounds.height() / f64::from(CELLS);
        let cell = |i: u32, j: u32, inset: f64| {
            let min = Point::new(
                bounds.min_x + (f64::from(i) + inset) * cell_w,
                bounds.min_y + (f64::from(j) + inset) * cell_h,
            );
            let max = Point::new(
                bounds.min_x + (f64::from(i + 1) - inset) * cell_w,
                bounds.min_y + (f64::from(j + 1) - inset) * cell_h,
            );
            (min, max)
        };

        let mut features = Vec::new();
        match key.layer {
            LayerType::WaterAreas => {
                let (min, _) = cell(0, 0, 0.1);
                let (_, max) = cell(0, CELLS - 1, 0.1);
                features.push(Feature::new(Geometry::Polygon(Polygon::new(rect(min, max), Vec::new()))));
            }
            LayerType::LandUsages => {
                for i in 0..CELLS {
                    for j in 0..CELLS {
                        let (min, max) = cell(i, j, 0.05);
                        let kind = LAND_KINDS[((i + j) as usize) % LAND_KINDS.len()];
                        features.push(
                            Feature::new(Geometry::Polygon(Polygon::new(rect(min, max), Vec::new())))
                                .with_attr("kind", kind),
                        );
                    }
                }
            }
            LayerType::Buildings => {
                for i in 0..CELLS {
                    for j in 0..CELLS {
                        let (min, max) = cell(i, j, 0.2);
                        let (hole_min, hole_max) = cell(i, j, 0.4);
                        let courtyard = rect(hole_min, hole_max).reversed();
                        features.push(Feature::new(Geometry::Polygon(Polygon::new(rect(min, max), vec![courtyard]))));
                    }
                }
            }
            LayerType::RoadLines => {
                for i in 1..CELLS {
                    let x = bounds.min_x + f64::from(i) * cell_w;
                    let y = bounds.min_y + f64::from(i) * cell_h;
                    let highway = HIGHWAYS[(i as usize) % HIGHWAYS.len()];
                    features.push(
                        Feature::new(Geometry::LineString(vec![
                            Point::new(x, bounds.min_y),
                            Point::new(x, bounds.max_y),
                        ]))
                        .with_attr("highway", highway)
                        .with_attr("kind", "highway"),
                    );
                    let mut street = Feature::new(Geometry::LineString(vec![
                        Point::new(bounds.min_x, y),
                        Point::new(bounds.center().x, y + cell_h * 0.25),
                        Point::new(bounds.max_x, y),
                    ]))
                    .with_attr("highway", highway)
                    .with_attr("kind", "highway");
                    if i == CELLS / 2 {
                        street = street.with_attr("is_bridge", "yes");
                    }
                    features.push(street);
                }
            }
            LayerType::PointsOfInterest => {
                for i in 0..CELLS {
                    for j in 0..CELLS {
                        let (min, max) = cell(i, j, 0.5);
                        features.push(Feature::new(Geometry::Point(Point::new(
                            (min.x + max.x) * 0.5,
                            (min.y + max.y) * 0.5,
                        ))));
                    }
                }
            }
            LayerType::RoadLabels | LayerType::Default => {}
        }
        Ok(features)
    }
}

#[derive(Serialize)]
struct DrawnTile<'a> {
    key: TileKey,
    mesh: &'a VertexMesh,
}

fn main() -> Result<()> {
    logging::init();
    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut tiles_dir: Option<PathBuf> = None;
    let mut frames: usize = 12;
    let mut zoom_step: f64 = 2.0;
    let mut export_dir: Option<PathBuf> = None;
    let mut json_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1);
        match (args[i].as_str(), value) {
            ("--config", Some(v)) => config_path = Some(PathBuf::from(v)),
            ("--tiles", Some(v)) => tiles_dir = Some(PathBuf::from(v)),
            ("--frames", Some(v)) => frames = v.parse().context("--frames expects an integer")?,
            ("--zoom-step", Some(v)) => zoom_step = v.parse().context("--zoom-step expects a number")?,
            ("--export", Some(v)) => export_dir = Some(PathBuf::from(v)),
            ("--json", Some(v)) => json_path = Some(PathBuf::from(v)),
            ("--help", _) | ("-h", _) => {
                eprintln!("Usage: {} [--config <file>] [--tiles <dir>] [--frames <n>] [--zoom-step <f>] [--export <dir>] [--json <file>]", args[0]);
                return Ok(());
            }
            (flag, _) => bail!("Unknown or incomplete option: {}", flag),
        }
        i += 2;
    }
    if !(zoom_step.is_finite() && zoom_step > 0.0) {
        bail!("--zoom-step must be a positive number");
    }

    let config = PyramidConfig::load(config_path.as_deref()).context("Failed to load config")?;

    let synthetic = Arc::new(SyntheticFeed::new(config.root_zoom));
    let feed: Arc<dyn GeometryFeed> = match &tiles_dir {
        Some(dir) => {
            if !dir.is_dir() {
                bail!("Tile directory {} does not exist", dir.display());
            }
            Arc::new(DirectoryFeed::new(dir))
        }
        None => synthetic.clone(),
    };

    let start = Instant::now();
    let pyramid = TilePyramid::new(&config, feed)?;
    info!("Roots built in {:.2}ms", start.elapsed().as_secs_f64() * 1000.0);

    let aspect = 16.0 / 9.0;
    let target = config.initial_camera.clone();
    let mut camera = Camera::from_lon_lat(target.lon, target.lat, 1.0, aspect);

    println!("{:>5} {:>10} {:>5} {:>7} {:>6} {:>6} {:>9} {:>8} {:>10}",
        "frame", "scale", "zoom", "visited", "culled", "drawn", "requested", "rejected", "triangles");

    let mut last_frame: Vec<(TileKey, VertexMesh)> = Vec::new();
    for frame in 0..frames {
        let viewport = camera.viewport(pyramid.max_zoom());
        let is_last = frame + 1 == frames;

        let mut triangles = 0usize;
        let mut sink = |key: TileKey, mesh: &VertexMesh| {
            triangles += mesh.triangle_count();
            if is_last {
                last_frame.push((key, mesh.clone()));
            }
        };
        let stats = pyramid.render(&viewport, &mut sink);

        println!("{:>5} {:>10.1} {:>5} {:>7} {:>6} {:>6} {:>9} {:>8} {:>10}",
            frame, camera.scale, viewport.target_zoom, stats.visited, stats.culled,
            stats.drawn, stats.split_requests, stats.rejected, triangles);

        // Give background splits a frame's worth of time, then keep zooming
        pyramid.wait_idle(Duration::from_millis(250));
        if camera.scale < target.scale {
            camera.zoom_by(zoom_step);
        }
    }

    if !pyramid.wait_idle(Duration::from_secs(30)) {
        eprintln!("Warning: {} splits still pending at exit", pyramid.pending_splits());
    }

    println!();
    println!("Nodes:          {}", pyramid.node_count());
    if tiles_dir.is_none() {
        println!("Feed calls:     {}", synthetic.calls());
    }
    println!("Elapsed:        {:.2}s", start.elapsed().as_secs_f64());

    if let Some(dir) = export_dir {
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
        for (key, mesh) in &last_frame {
            let path = dir.join(format!("{}_{}_{}_{}.tmsh", key.layer, key.zoom, key.x, key.y));
            let bytes = mesh_to_bytes(mesh).with_context(|| format!("Failed to encode {}", key))?;
            fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
        }
        println!("Exported {} meshes to {}", last_frame.len(), dir.display());
    }

    if let Some(path) = json_path {
        let tiles: Vec<DrawnTile> = last_frame.iter().map(|(key, mesh)| DrawnTile { key: *key, mesh }).collect();
        let json = serde_json::to_string(&tiles)?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Wrote {} tiles to {}", tiles.len(), path.display());
    }

    Ok(())
}
