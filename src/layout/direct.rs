use crate::ir::Edge;

use super::path::EdgePath;
use super::priority::{EdgePriority, priority_of};
use super::routing::{RouteContext, along, face_point, get_connection_point, preferred_side};
use super::storage::EdgeStorage;
use super::types::{Line, Point, Rectangle, Side};

/// Moves `point` along `side` of `bounds` by `delta`, staying on the face
/// and on the grid.
fn shift_along(
    ctx: &RouteContext<'_>,
    bounds: &Rectangle,
    side: Side,
    point: Point,
    delta: i32,
) -> Point {
    let face = bounds.face(side);
    let low = along(face.p1, side).min(along(face.p2, side));
    let high = along(face.p1, side).max(along(face.p2, side));
    let position = ctx.grid.snap(along(point, side) + delta).clamp(low, high);
    face_point(bounds, side, position)
}

/// Straight line between the facing sides of the two nodes, preferring
/// east/west faces. When the line would run within a grid unit of a stored
/// path segment, both ends slide one slot along their faces, toward whichever
/// direction clears that segment more.
///
/// Nodes that touch get both ends on the shared border. The end then moves
/// one slot along it so the line keeps a length.
pub(crate) fn build_direct_path(ctx: &RouteContext<'_>, storage: &EdgeStorage, edge: &Edge) -> EdgePath {
    let start_bounds = ctx.bounds(edge.start);
    let end_bounds = ctx.bounds(edge.end);
    let side = preferred_side(&start_bounds, &end_bounds, false);
    let step = ctx.config.slot_spacing;
    let start = get_connection_point(ctx, storage, edge.start, side, end_bounds.center());
    let mut end = get_connection_point(ctx, storage, edge.end, side.opposite(), start_bounds.center());
    if end == start {
        end = [step, -step]
            .into_iter()
            .map(|delta| shift_along(ctx, &end_bounds, side.opposite(), end, delta))
            .find(|point| *point != start)
            .unwrap_or(end);
        tracing::debug!(edge = %edge.id, ?side, "dependency between touching nodes");
    }

    let tolerance = f64::from(ctx.grid.size());
    let Some((conflict, segment)) = storage.closest_segment_near(Line::new(start, end), tolerance) else {
        return EdgePath::new(start, end);
    };

    let [ahead, behind] = [step, -step].map(|delta| {
        let moved_start = shift_along(ctx, &start_bounds, side, start, delta);
        let moved_end = shift_along(ctx, &end_bounds, side.opposite(), end, delta);
        let clearance = Line::new(moved_start, moved_end).distance_to_line(&segment);
        (moved_start, moved_end, clearance)
    });
    let (start, end, _) = if behind.2 > ahead.2 { behind } else { ahead };
    tracing::debug!(edge = %edge.id, %conflict, ?side, "nudged dependency edge");
    EdgePath::new(start, end)
}

/// Routes every unrouted dependency edge as a two-point line.
pub(crate) fn layout_dependency_edges(ctx: &RouteContext<'_>, storage: &mut EdgeStorage) {
    let edges: Vec<&Edge> = ctx
        .diagram
        .edges()
        .iter()
        .filter(|edge| priority_of(edge) == EdgePriority::Dependency && !storage.contains(edge.id))
        .collect();
    tracing::debug!(edges = edges.len(), "routing dependency edges");
    for edge in edges {
        let path = build_direct_path(ctx, storage, edge);
        tracing::trace!(edge = %edge.id, "routed dependency edge");
        storage.store(edge, path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::ir::{Diagram, EdgeId, EdgeKind};

    fn points(path: &EdgePath) -> Vec<(i32, i32)> {
        path.points().iter().map(|p| (p.x, p.y)).collect()
    }

    #[test]
    fn prefers_east_west_faces() {
        let diagram = Diagram::builder()
            .node("A", Rectangle::new(0, 0, 100, 60))
            .node("B", Rectangle::new(300, 200, 100, 60))
            .edge(EdgeKind::Dependency, "A", "B")
            .build()
            .unwrap();
        let config = LayoutConfig::default();
        let ctx = RouteContext::new(&diagram, &config);
        let mut storage = EdgeStorage::new();
        layout_dependency_edges(&ctx, &mut storage);
        let path = storage.get(EdgeId(0)).unwrap();
        assert_eq!(points(path), vec![(100, 30), (300, 230)]);
    }

    #[test]
    fn falls_back_to_north_south_for_stacked_nodes() {
        let diagram = Diagram::builder()
            .node("A", Rectangle::new(0, 0, 100, 60))
            .node("B", Rectangle::new(20, 200, 100, 60))
            .edge(EdgeKind::Dependency, "B", "A")
            .build()
            .unwrap();
        let config = LayoutConfig::default();
        let ctx = RouteContext::new(&diagram, &config);
        let storage = EdgeStorage::new();
        let path = build_direct_path(&ctx, &storage, &diagram.edges()[0]);
        assert_eq!(points(&path), vec![(70, 200), (50, 60)]);
    }

    fn nudged_path(stored: [(i32, i32); 4]) -> EdgePath {
        let diagram = Diagram::builder()
            .node("A", Rectangle::new(0, 0, 100, 60))
            .node("B", Rectangle::new(300, 0, 100, 60))
            .node("C", Rectangle::new(150, -200, 100, 60))
            .node("D", Rectangle::new(400, 200, 100, 60))
            .edge(EdgeKind::Association, "C", "D")
            .edge(EdgeKind::Dependency, "A", "B")
            .build()
            .unwrap();
        let config = LayoutConfig::default();
        let ctx = RouteContext::new(&diagram, &config);
        let mut storage = EdgeStorage::new();
        storage.store(
            &diagram.edges()[0],
            EdgePath::from_points(stored.map(|(x, y)| Point::new(x, y))),
        );
        build_direct_path(&ctx, &storage, &diagram.edges()[1])
    }

    #[test]
    fn nudges_past_a_stored_corner() {
        let path = nudged_path([(200, -140), (200, 30), (450, 30), (450, 200)]);
        assert_eq!(points(&path), vec![(100, 40), (300, 40)]);
    }

    #[test]
    fn nudges_away_from_a_long_stored_segment() {
        // Every vertex of the stored path is far from the line; only the
        // middle of its horizontal run comes close.
        let path = nudged_path([(-300, -100), (-300, 25), (600, 25), (600, -100)]);
        assert_eq!(points(&path), vec![(100, 40), (300, 40)]);
        let path = nudged_path([(-300, 100), (-300, 35), (600, 35), (600, 100)]);
        assert_eq!(points(&path), vec![(100, 20), (300, 20)]);
    }

    #[test]
    fn touching_nodes_keep_a_visible_line() {
        let diagram = Diagram::builder()
            .node("A", Rectangle::new(0, 0, 100, 60))
            .node("B", Rectangle::new(100, 0, 100, 60))
            .edge(EdgeKind::Dependency, "A", "B")
            .build()
            .unwrap();
        let config = LayoutConfig::default();
        let ctx = RouteContext::new(&diagram, &config);
        let storage = EdgeStorage::new();
        let path = build_direct_path(&ctx, &storage, &diagram.edges()[0]);
        assert_eq!(points(&path), vec![(100, 30), (100, 40)]);
        assert_ne!(path.start_point(), path.end_point());
    }

    #[test]
    fn shift_stays_on_the_face() {
        let diagram = Diagram::builder()
            .node("A", Rectangle::new(0, 0, 100, 60))
            .build()
            .unwrap();
        let config = LayoutConfig::default();
        let ctx = RouteContext::new(&diagram, &config);
        let bounds = Rectangle::new(0, 0, 100, 60);
        let moved = shift_along(&ctx, &bounds, Side::East, Point::new(100, 55), 10);
        assert_eq!(moved, Point::new(100, 60));
        let moved = shift_along(&ctx, &bounds, Side::North, Point::new(50, 0), -10);
        assert_eq!(moved, Point::new(40, 0));
        let moved = shift_along(&ctx, &bounds, Side::North, Point::new(50, 0), 7);
        assert_eq!(moved, Point::new(60, 0));
    }
}
