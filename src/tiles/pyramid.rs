//! Tile pyramid
//!
//! Nodes live in an append-only arena and are addressed by [`NodeId`]. Render
//! takes the arena read lock only long enough to clone a node's `Arc`; split
//! workers fetch and tessellate without any lock and take the write lock once
//! to append their four finished children.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::{PyramidConfig, StyleConfig};
use crate::draw::geometry::projection::world_bounds;
use crate::draw::geometry::{Bounds, VertexMesh};
use crate::error::Result;

use super::feed::{Feature, GeometryFeed};
use super::key::{LayerType, Quadrant, TileKey};
use super::node::{NodeId, SplitState, TileNode};
use super::pool::SplitPool;
use super::viewport::Viewport;

/// Consumer of tile meshes, one call per drawn node
pub trait MeshSink {
    fn draw(&mut self, key: TileKey, mesh: &VertexMesh);
}

impl<F> MeshSink for F
where
    F: FnMut(TileKey, &VertexMesh),
{
    fn draw(&mut self, key: TileKey, mesh: &VertexMesh) {
        self(key, mesh)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitRequest {
    /// A job was queued
    Submitted,
    /// The node is already splitting or split
    AlreadyRequested,
    /// The worker pool is full; the node stays unsplit
    Rejected,
    /// Children would exceed the configured maximum zoom
    AtMaxZoom,
}

/// Per-frame counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub visited: usize,
    pub culled: usize,
    pub drawn: usize,
    pub split_requests: usize,
    pub rejected: usize,
}

impl RenderStats {
    fn record(&mut self, request: SplitRequest) {
        match request {
            SplitRequest::Submitted => self.split_requests += 1,
            SplitRequest::Rejected => self.rejected += 1,
            SplitRequest::AlreadyRequested | SplitRequest::AtMaxZoom => {}
        }
    }
}

/// State shared with split workers
struct Shared {
    nodes: RwLock<Vec<Arc<TileNode>>>,
    feed: Arc<dyn GeometryFeed>,
    style: StyleConfig,
    screen_width_px: u32,
    profile_timing: bool,
}

impl Shared {
    fn node(&self, id: NodeId) -> Option<Arc<TileNode>> {
        let nodes = self.nodes.read().unwrap_or_else(PoisonError::into_inner);
        nodes.get(id).cloned()
    }

    /// Fetch one tile; a feed failure degrades to an empty tile
    fn fetch(&self, key: TileKey) -> Vec<Feature> {
        match self.feed.fetch(key) {
            Ok(features) => {
                debug!("Fetched {} features for {}", features.len(), key);
                features
            }
            Err(err) => {
                warn!("Feed failed for {}: {}", key, err);
                Vec::new()
            }
        }
    }

    fn build_node(&self, key: TileKey, bounds: Bounds, parent: Option<NodeId>) -> TileNode {
        let features = self.fetch(key);
        TileNode::build(
            key,
            bounds,
            parent,
            &features,
            &self.style,
            self.screen_width_px,
            self.profile_timing,
        )
    }

    /// Body of a split job. Children are fully built before they are attached.
    fn split(&self, parent_id: NodeId, parent: &TileNode) {
        let start = Instant::now();
        let keys = parent.key().children();

        let children: Vec<TileNode> = Quadrant::ALL
            .par_iter()
            .zip(keys.par_iter())
            .map(|(&quadrant, &key)| self.build_node(key, parent.child_bounds(quadrant), Some(parent_id)))
            .collect();
        let triangles: usize = children.iter().map(|c| c.mesh().triangle_count()).sum();

        let ids = {
            let mut nodes = self.nodes.write().unwrap_or_else(PoisonError::into_inner);
            let base = nodes.len();
            nodes.extend(children.into_iter().map(Arc::new));
            [base, base + 1, base + 2, base + 3]
        };
        parent.publish_children(ids);

        info!(
            "Split {} into 4 children ({} triangles) in {:.2}ms",
            parent.key(),
            triangles,
            start.elapsed().as_secs_f64() * 1000.0
        );
    }
}

pub struct TilePyramid {
    shared: Arc<Shared>,
    pool: SplitPool,
    roots: Vec<NodeId>,
    max_zoom: u32,
}

impl TilePyramid {
    /// Build the pool and one root per configured layer. Roots are fetched and
    /// tessellated before this returns.
    pub fn new(config: &PyramidConfig, feed: Arc<dyn GeometryFeed>) -> Result<Self> {
        config.validate()?;
        let pool = SplitPool::new(config.worker_threads, config.max_pending_splits)?;

        let shared = Arc::new(Shared {
            nodes: RwLock::new(Vec::new()),
            feed,
            style: config.style.clone(),
            screen_width_px: config.screen_width_px,
            profile_timing: config.profile_timing,
        });

        let roots: Vec<TileNode> = pool.install(|| {
            config
                .layers
                .par_iter()
                .map(|&layer| shared.build_node(TileKey::root(layer, config.root_zoom), world_bounds(), None))
                .collect()
        });
        let root_ids = {
            let mut nodes = shared.nodes.write().unwrap_or_else(PoisonError::into_inner);
            let ids: Vec<NodeId> = (nodes.len()..nodes.len() + roots.len()).collect();
            nodes.extend(roots.into_iter().map(Arc::new));
            ids
        };

        info!(
            "Tile pyramid ready: {} layers, {} workers, {} pending splits max",
            config.layers.len(),
            pool.threads(),
            pool.capacity()
        );

        Ok(Self {
            shared,
            pool,
            roots: root_ids,
            max_zoom: config.max_zoom,
        })
    }

    /// Root ids in draw order
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn root(&self, layer: LayerType) -> Option<NodeId> {
        self.roots
            .iter()
            .copied()
            .find(|&id| self.node(id).is_some_and(|n| n.key().layer == layer))
    }

    pub fn node(&self, id: NodeId) -> Option<Arc<TileNode>> {
        self.shared.node(id)
    }

    pub fn node_count(&self) -> usize {
        self.shared.nodes.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn max_zoom(&self) -> u32 {
        self.max_zoom
    }

    /// Split jobs currently queued or running
    pub fn pending_splits(&self) -> usize {
        self.pool.pending()
    }

    /// Block until all submitted splits have finished. Returns `false` on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.pool.wait_idle(timeout)
    }

    pub fn should_split(&self, id: NodeId, viewport: &Viewport) -> bool {
        self.node(id)
            .is_some_and(|n| n.should_split(&viewport.bounds, viewport.target_zoom))
    }

    /// Ask for `id` to be split. At most one job is ever submitted per node,
    /// however many threads call this concurrently.
    pub fn request_split(&self, id: NodeId) -> SplitRequest {
        let Some(node) = self.node(id) else {
            warn!("Split requested for unknown node {}", id);
            return SplitRequest::Rejected;
        };
        if node.state() != SplitState::Unsplit {
            return SplitRequest::AlreadyRequested;
        }
        if node.zoom() >= self.max_zoom {
            return SplitRequest::AtMaxZoom;
        }

        // Reserve capacity before claiming the node so a full pool never
        // leaves it stuck in Splitting
        let Some(permit) = self.pool.try_reserve() else {
            warn!("Split of {} rejected: {} jobs in flight", node.key(), self.pool.capacity());
            return SplitRequest::Rejected;
        };
        if !node.try_begin_split() {
            return SplitRequest::AlreadyRequested;
        }

        debug!("Submitting split of {}", node.key());
        let shared = Arc::clone(&self.shared);
        self.pool.spawn(permit, move || shared.split(id, &node));
        SplitRequest::Submitted
    }

    /// Draw every visible root and request splits where the view needs more
    /// detail. Never blocks on pending splits.
    pub fn render(&self, viewport: &Viewport, sink: &mut dyn MeshSink) -> RenderStats {
        let mut stats = RenderStats::default();
        for &root in &self.roots {
            self.render_node(root, viewport, sink, &mut stats);
        }
        stats
    }

    fn render_node(&self, id: NodeId, viewport: &Viewport, sink: &mut dyn MeshSink, stats: &mut RenderStats) {
        let Some(node) = self.node(id) else {
            return;
        };
        stats.visited += 1;

        if !node.bounds().intersects(&viewport.bounds) {
            stats.culled += 1;
            return;
        }

        match node.children() {
            Some(children) if node.zoom() < viewport.target_zoom => {
                for child in children {
                    self.render_node(child, viewport, sink, stats);
                }
            }
            _ => {
                sink.draw(node.key(), node.mesh());
                stats.drawn += 1;
            }
        }

        if node.should_split(&viewport.bounds, viewport.target_zoom) {
            stats.record(self.request_split(id));
        }
    }

    /// Request splits for every visible node below the target zoom without
    /// drawing anything. Useful right after a zoom change.
    pub fn refine(&self, viewport: &Viewport) -> RenderStats {
        let mut stats = RenderStats::default();
        let mut stack: Vec<NodeId> = self.roots.clone();
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            stats.visited += 1;
            if !node.should_split(&viewport.bounds, viewport.target_zoom) {
                continue;
            }
            match node.children() {
                Some(children) => stack.extend(children),
                None => stats.record(self.request_split(id)),
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::EmptyFeed;

    fn config(layers: Vec<LayerType>) -> PyramidConfig {
        PyramidConfig {
            worker_threads: 2,
            max_pending_splits: 8,
            layers,
            ..PyramidConfig::default()
        }
    }

    #[test]
    fn test_one_root_per_layer() {
        let pyramid = TilePyramid::new(
            &config(vec![LayerType::WaterAreas, LayerType::Buildings]),
            Arc::new(EmptyFeed),
        )
        .unwrap();
        assert_eq!(pyramid.roots().len(), 2);
        assert_eq!(pyramid.node_count(), 2);
        let water = pyramid.root(LayerType::WaterAreas).unwrap();
        assert_eq!(pyramid.node(water).unwrap().bounds(), world_bounds());
        assert!(pyramid.root(LayerType::RoadLines).is_none());
    }

    #[test]
    fn test_max_zoom_stops_splitting() {
        let cfg = PyramidConfig {
            max_zoom: 0,
            ..config(vec![LayerType::Buildings])
        };
        let pyramid = TilePyramid::new(&cfg, Arc::new(EmptyFeed)).unwrap();
        assert_eq!(pyramid.request_split(pyramid.roots()[0]), SplitRequest::AtMaxZoom);
    }

    #[test]
    fn test_render_draws_roots_and_splits() {
        let pyramid = TilePyramid::new(&config(vec![LayerType::Buildings]), Arc::new(EmptyFeed)).unwrap();
        let viewport = Viewport::new(world_bounds(), 1);

        let mut drawn = Vec::new();
        let mut sink = |key: TileKey, _mesh: &VertexMesh| drawn.push(key);
        let stats = pyramid.render(&viewport, &mut sink);
        assert_eq!(stats.drawn, 1);
        assert_eq!(stats.split_requests, 1);

        assert!(pyramid.wait_idle(Duration::from_secs(10)));
        assert_eq!(pyramid.node_count(), 5);

        drawn.clear();
        let mut sink = |key: TileKey, _mesh: &VertexMesh| drawn.push(key);
        let stats = pyramid.render(&viewport, &mut sink);
        assert_eq!(stats.drawn, 4);
        assert_eq!(stats.split_requests, 0);
        assert!(drawn.iter().all(|k| k.zoom == 1));
    }
}
