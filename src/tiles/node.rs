//! Quadtree nodes
//!
//! A node's mesh is built once at construction. The only mutable part is the
//! split state, which moves `Unsplit -> Splitting -> Split` exactly once. The
//! child ids are written before the state is stored as `Split` with release
//! ordering, so a reader that loads `Split` with acquire ordering always sees
//! all four children.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

use crate::config::StyleConfig;
use crate::draw::generation::{build_tile_mesh, TileContext};
use crate::draw::geometry::{Bounds, VertexMesh};

use super::feed::Feature;
use super::key::{Quadrant, TileKey};

/// Stable index of a node inside its pyramid
pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SplitState {
    Unsplit = 0,
    Splitting = 1,
    Split = 2,
}

impl SplitState {
    fn from_u8(value: u8) -> SplitState {
        match value {
            0 => SplitState::Unsplit,
            1 => SplitState::Splitting,
            _ => SplitState::Split,
        }
    }
}

#[derive(Debug)]
pub struct TileNode {
    key: TileKey,
    bounds: Bounds,
    parent: Option<NodeId>,
    mesh: VertexMesh,
    state: AtomicU8,
    children: OnceLock<[NodeId; 4]>,
}

impl TileNode {
    pub fn new(key: TileKey, bounds: Bounds, parent: Option<NodeId>, mesh: VertexMesh) -> Self {
        Self {
            key,
            bounds,
            parent,
            mesh,
            state: AtomicU8::new(SplitState::Unsplit as u8),
            children: OnceLock::new(),
        }
    }

    /// Build a node and its mesh from already fetched features
    pub fn build(
        key: TileKey,
        bounds: Bounds,
        parent: Option<NodeId>,
        features: &[Feature],
        style: &StyleConfig,
        screen_width_px: u32,
        profile_timing: bool,
    ) -> Self {
        let ctx = TileContext::new(key, bounds, screen_width_px, profile_timing);
        let mesh = build_tile_mesh(features, &ctx, style);
        Self::new(key, bounds, parent, mesh)
    }

    pub fn key(&self) -> TileKey {
        self.key
    }

    pub fn zoom(&self) -> u32 {
        self.key.zoom
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn mesh(&self) -> &VertexMesh {
        &self.mesh
    }

    pub fn state(&self) -> SplitState {
        SplitState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Bounds of the child in `quadrant`, derived from these bounds only
    pub fn child_bounds(&self, quadrant: Quadrant) -> Bounds {
        self.bounds.quarter(quadrant.is_east(), quadrant.is_south())
    }

    /// Whether this node should subdivide for the given view
    pub fn should_split(&self, viewport_bounds: &Bounds, target_zoom: u32) -> bool {
        self.key.zoom < target_zoom && self.bounds.intersects(viewport_bounds)
    }

    /// Child ids, present only once the node is `Split`
    pub fn children(&self) -> Option<[NodeId; 4]> {
        if self.state() == SplitState::Split {
            self.children.get().copied()
        } else {
            None
        }
    }

    /// Claim the split. Exactly one caller ever gets `true`.
    pub(crate) fn try_begin_split(&self) -> bool {
        self.state
            .compare_exchange(
                SplitState::Unsplit as u8,
                SplitState::Splitting as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Attach the children and mark the node `Split`
    pub(crate) fn publish_children(&self, children: [NodeId; 4]) {
        if self.children.set(children).is_ok() {
            self.state.store(SplitState::Split as u8, Ordering::Release);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::LayerType;

    fn node() -> TileNode {
        TileNode::new(
            TileKey::new(3, 5, 4, LayerType::Buildings),
            Bounds::new(0.0, 0.0, 16.0, 16.0),
            None,
            VertexMesh::new(),
        )
    }

    #[test]
    fn test_state_transitions_once() {
        let n = node();
        assert_eq!(n.state(), SplitState::Unsplit);
        assert!(n.children().is_none());

        assert!(n.try_begin_split());
        assert!(!n.try_begin_split());
        assert_eq!(n.state(), SplitState::Splitting);
        assert!(n.children().is_none());

        n.publish_children([1, 2, 3, 4]);
        assert_eq!(n.state(), SplitState::Split);
        assert_eq!(n.children(), Some([1, 2, 3, 4]));
        assert!(!n.try_begin_split());
    }

    #[test]
    fn test_children_tile_parent() {
        let n = node();
        let quarters = Quadrant::ALL.map(|q| n.child_bounds(q));
        let area: f64 = quarters.iter().map(Bounds::area).sum();
        assert_eq!(area, n.bounds().area());

        // north-west is the upper left quarter
        assert_eq!(quarters[0], Bounds::new(0.0, 8.0, 8.0, 16.0));
        assert_eq!(quarters[3], Bounds::new(8.0, 0.0, 16.0, 8.0));
        for (i, a) in quarters.iter().enumerate() {
            for b in &quarters[i + 1..] {
                assert!(!a.intersects(b));
            }
        }
    }

    #[test]
    fn test_should_split() {
        let n = node();
        let inside = Bounds::new(1.0, 1.0, 2.0, 2.0);
        let outside = Bounds::new(20.0, 20.0, 30.0, 30.0);
        assert!(n.should_split(&inside, 5));
        assert!(!n.should_split(&inside, 4));
        assert!(!n.should_split(&outside, 10));
    }
}
