use crate::ir::{Edge, NodeId};

use super::path::EdgePath;
use super::priority::{EdgePriority, priority_of};
use super::routing::RouteContext;
use super::storage::EdgeStorage;
use super::types::{NodeCorner, Point, Rectangle};

/// The two points where a loop around `corner` touches the node: one slot in
/// from the corner on the north/south face, then on the east/west face.
fn loop_endpoints(ctx: &RouteContext<'_>, bounds: &Rectangle, corner: NodeCorner) -> (Point, Point) {
    let at = bounds.corner(corner);
    let sx = corner.vertical_side().outward_sign();
    let sy = corner.horizontal_side().outward_sign();
    let inset = ctx.config.slot_spacing;
    (
        ctx.grid.snapped(Point::new(at.x - sx * inset, at.y)),
        ctx.grid.snapped(Point::new(at.x, at.y - sy * inset)),
    )
}

/// First corner, in search order, whose loop endpoints are both unused.
/// Falls back to the top-right corner when every corner is taken.
pub(crate) fn get_self_edge_corner(
    ctx: &RouteContext<'_>,
    storage: &EdgeStorage,
    node: NodeId,
) -> NodeCorner {
    let bounds = ctx.bounds(node);
    NodeCorner::SEARCH_ORDER
        .into_iter()
        .find(|&corner| {
            let (start, end) = loop_endpoints(ctx, &bounds, corner);
            storage.is_connection_point_available(start) && storage.is_connection_point_available(end)
        })
        .unwrap_or_else(|| {
            tracing::debug!(%node, "no free corner for self edge");
            NodeCorner::TopRight
        })
}

/// Five-point loop leaving the horizontal face next to `corner`, passing
/// `self_edge_size` outside both faces and re-entering on the vertical face.
pub(crate) fn build_self_edge(ctx: &RouteContext<'_>, bounds: &Rectangle, corner: NodeCorner) -> EdgePath {
    let at = bounds.corner(corner);
    let sx = corner.vertical_side().outward_sign();
    let sy = corner.horizontal_side().outward_sign();
    let size = ctx.config.self_edge_size;
    let (start, end) = loop_endpoints(ctx, bounds, corner);
    let outer_x = ctx.grid.snap(at.x + sx * size);
    let outer_y = ctx.grid.snap(at.y + sy * size);
    EdgePath::from_points([
        start,
        Point::new(start.x, outer_y),
        Point::new(outer_x, outer_y),
        Point::new(outer_x, end.y),
        end,
    ])
}

/// Routes every unrouted self edge around a free corner of its node.
pub(crate) fn layout_self_edges(ctx: &RouteContext<'_>, storage: &mut EdgeStorage) {
    let edges: Vec<&Edge> = ctx
        .diagram
        .edges()
        .iter()
        .filter(|edge| priority_of(edge) == EdgePriority::SelfEdge && !storage.contains(edge.id))
        .collect();
    tracing::debug!(edges = edges.len(), "routing self edges");
    for edge in edges {
        let corner = get_self_edge_corner(ctx, storage, edge.start);
        let path = build_self_edge(ctx, &ctx.bounds(edge.start), corner);
        tracing::trace!(edge = %edge.id, ?corner, "routed self edge");
        storage.store(edge, path);
    }
}
