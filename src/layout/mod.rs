mod direct;
mod error;
mod grid;
mod path;
mod priority;
mod routing;
mod self_loop;
mod storage;
pub(crate) mod types;

pub use error::LayoutError;
pub use grid::Grid;
pub use path::EdgePath;
pub use priority::{EdgePriority, RoutingMode, is_segmented, is_stored_edge, priority_of};
pub use storage::{EdgeStorage, StoredEdge};
pub use types::*;

use crate::config::LayoutConfig;
use crate::ir::{Diagram, EdgeId, NodeId};
use routing::RouteContext;

/// Runs layout passes over diagrams with one validated configuration.
#[derive(Debug, Clone)]
pub struct Layouter {
    config: LayoutConfig,
}

impl Layouter {
    pub fn new(config: LayoutConfig) -> Result<Self, LayoutError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Routes every stored edge of `diagram`.
    ///
    /// Segmented priorities go first in their fixed order, then dependency
    /// edges, then self edges. Each step sees the paths stored by earlier
    /// steps and by earlier edges of its own step. Storage is fresh per call,
    /// so repeated calls on the same diagram give identical paths.
    pub fn layout(&self, diagram: &Diagram) -> Layout {
        let ctx = RouteContext::new(diagram, &self.config);
        let mut storage = EdgeStorage::new();
        tracing::debug!(
            nodes = diagram.nodes().len(),
            edges = diagram.edges().len(),
            "starting layout pass"
        );
        for priority in EdgePriority::SEGMENTED {
            routing::layout_segmented_edges(&ctx, &mut storage, priority);
        }
        direct::layout_dependency_edges(&ctx, &mut storage);
        self_loop::layout_self_edges(&ctx, &mut storage);
        tracing::debug!(routed = storage.len(), "layout pass finished");
        Layout {
            storage,
            node_bounds: ctx.node_bounds,
            grid_size: self.config.grid_size,
        }
    }
}

pub fn compute_layout(diagram: &Diagram, config: &LayoutConfig) -> Result<Layout, LayoutError> {
    Ok(Layouter::new(config.clone())?.layout(diagram))
}

/// Paths produced by one layout pass.
#[derive(Debug, Clone)]
pub struct Layout {
    storage: EdgeStorage,
    node_bounds: Vec<Rectangle>,
    grid_size: i32,
}

impl Layout {
    pub fn path(&self, edge: EdgeId) -> Option<&EdgePath> {
        self.storage.get(edge)
    }

    pub fn require_path(&self, edge: EdgeId) -> Result<&EdgePath, LayoutError> {
        self.path(edge).ok_or(LayoutError::NotRouted(edge))
    }

    /// Routed edges in routing order.
    pub fn paths(&self) -> impl Iterator<Item = (EdgeId, &EdgePath)> + '_ {
        self.storage
            .entries()
            .iter()
            .map(|stored| (stored.edge, &stored.path))
    }

    /// Grid-snapped bounds of `node`, the rectangle its edges attach to.
    pub fn node_bounds(&self, node: NodeId) -> Option<Rectangle> {
        self.node_bounds.get(node.index()).copied()
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// The most recently routed edge passing within half a grid unit of `point`.
    pub fn edge_at(&self, point: Point) -> Option<EdgeId> {
        self.storage.edge_at(point, f64::from(self.grid_size) / 2.0)
    }

    /// Smallest rectangle covering every routed point.
    pub fn bounds(&self) -> Option<Rectangle> {
        let mut points = self
            .storage
            .entries()
            .iter()
            .flat_map(|stored| stored.path.points().iter().copied());
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| {
            (
                Point::new(min.x.min(p.x), min.y.min(p.y)),
                Point::new(max.x.max(p.x), max.y.max(p.y)),
            )
        });
        Some(Rectangle::new(min.x, min.y, max.x - min.x, max.y - min.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::ir::EdgeKind;

    fn sample() -> Diagram {
        Diagram::builder()
            .node("A", Rectangle::new(0, 0, 100, 60))
            .node("B", Rectangle::new(0, 200, 100, 60))
            .node("C", Rectangle::new(300, 200, 100, 60))
            .edge(EdgeKind::Inheritance, "B", "A")
            .edge(EdgeKind::Dependency, "A", "C")
            .edge(EdgeKind::Note, "C", "A")
            .edge(EdgeKind::Composition, "C", "C")
            .build()
            .unwrap()
    }

    #[test]
    fn rejects_invalid_config() {
        let config = LayoutConfig {
            max_slot: 5,
            ..LayoutConfig::default()
        };
        assert_eq!(
            Layouter::new(config).unwrap_err(),
            LayoutError::Config(ConfigError::SlotCap(5))
        );
    }

    #[test]
    fn routes_every_stored_edge_in_category_order() {
        let layout = compute_layout(&sample(), &LayoutConfig::default()).unwrap();
        let order: Vec<_> = layout.paths().map(|(id, _)| id.index()).collect();
        assert_eq!(order, vec![0, 1, 3]);
        assert!(layout.path(EdgeId(2)).is_none());
        assert_eq!(
            layout.require_path(EdgeId(2)).unwrap_err(),
            LayoutError::NotRouted(EdgeId(2))
        );
        assert_eq!(layout.require_path(EdgeId(1)).unwrap().len(), 2);
        assert_eq!(layout.require_path(EdgeId(3)).unwrap().len(), 5);
    }

    #[test]
    fn edge_at_hits_routed_paths() {
        let layout = compute_layout(&sample(), &LayoutConfig::default()).unwrap();
        assert_eq!(layout.edge_at(Point::new(52, 130)), Some(EdgeId(0)));
        assert_eq!(layout.edge_at(Point::new(-200, -200)), None);
    }

    #[test]
    fn unaligned_nodes_route_on_the_grid() {
        let diagram = Diagram::builder()
            .node("A", Rectangle::new(5, 3, 100, 60))
            .node("B", Rectangle::new(205, 203, 100, 60))
            .node("C", Rectangle::new(417, 2, 113, 47))
            .edge(EdgeKind::Inheritance, "A", "B")
            .edge(EdgeKind::Dependency, "A", "C")
            .edge(EdgeKind::Dependency, "B", "C")
            .edge(EdgeKind::Composition, "C", "C")
            .build()
            .unwrap();
        let config = LayoutConfig::default();
        let grid = config.grid();
        let layout = compute_layout(&diagram, &config).unwrap();
        assert_eq!(
            layout.require_path(EdgeId(0)).unwrap().points(),
            &[
                Point::new(60, 60),
                Point::new(60, 130),
                Point::new(260, 130),
                Point::new(260, 200),
            ]
        );
        for (id, path) in layout.paths() {
            for point in path.points() {
                assert!(grid.is_aligned(*point), "{id} has off-grid point {point:?}");
            }
        }
        let c = diagram.node_id("C").unwrap();
        assert_eq!(layout.node_bounds(c), Some(Rectangle::new(420, 0, 120, 50)));
    }

    #[test]
    fn bounds_cover_all_paths() {
        let layout = compute_layout(&sample(), &LayoutConfig::default()).unwrap();
        let bounds = layout.bounds().unwrap();
        for (_, path) in layout.paths() {
            for point in path.points() {
                assert!(bounds.contains(*point));
            }
        }
        let empty = Layouter::new(LayoutConfig::default())
            .unwrap()
            .layout(&Diagram::builder().build().unwrap());
        assert!(empty.is_empty());
        assert_eq!(empty.bounds(), None);
    }
}
