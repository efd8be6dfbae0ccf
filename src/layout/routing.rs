use std::collections::BTreeSet;

use crate::config::LayoutConfig;
use crate::ir::{Diagram, Edge, NodeId};

use super::grid::Grid;
use super::path::EdgePath;
use super::priority::{EdgePriority, priority_of};
use super::storage::EdgeStorage;
use super::types::{NodeIndex, Point, Rectangle, Side};

/// Read-only inputs shared by every routing step of a pass.
///
/// Node bounds are snapped onto the grid once, so every face, corner and
/// midpoint the router derives from them is a grid multiple.
pub(crate) struct RouteContext<'a> {
    pub(crate) diagram: &'a Diagram,
    pub(crate) config: &'a LayoutConfig,
    pub(crate) grid: Grid,
    pub(crate) node_bounds: Vec<Rectangle>,
}

impl<'a> RouteContext<'a> {
    pub(crate) fn new(diagram: &'a Diagram, config: &'a LayoutConfig) -> Self {
        let grid = config.grid();
        let node_bounds = diagram
            .nodes()
            .iter()
            .map(|node| grid.snapped_rect(node.bounds))
            .collect();
        Self {
            diagram,
            config,
            grid,
            node_bounds,
        }
    }

    pub(crate) fn bounds(&self, node: NodeId) -> Rectangle {
        self.node_bounds[node.index()]
    }
}

/// Which end of an edge a merge group shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MergeEnd {
    Start,
    End,
}

impl MergeEnd {
    fn node(self, edge: &Edge) -> NodeId {
        match self {
            MergeEnd::Start => edge.start,
            MergeEnd::End => edge.end,
        }
    }

    fn label(self, edge: &Edge) -> Option<&str> {
        let label = match self {
            MergeEnd::Start => edge.start_label.as_deref(),
            MergeEnd::End => edge.end_label.as_deref(),
        };
        label.filter(|text| !text.is_empty())
    }

    /// Side on the shared node, given the side the edge leaves its start node.
    fn side(self, start_side: Side) -> Side {
        match self {
            MergeEnd::Start => start_side,
            MergeEnd::End => start_side.opposite(),
        }
    }
}

/// Coordinate along a face: `x` on north/south faces, `y` on east/west faces.
pub(crate) fn along(point: Point, side: Side) -> i32 {
    if side.is_north_south() { point.x } else { point.y }
}

/// The point on `side` of `bounds` at the given along-face coordinate.
pub(crate) fn face_point(bounds: &Rectangle, side: Side, position: i32) -> Point {
    let face = bounds.face_coordinate(side);
    if side.is_north_south() {
        Point::new(position, face)
    } else {
        Point::new(face, position)
    }
}

/// Where a path leaving through `side` at `point` turns onto the mid-line.
fn bend(point: Point, mid: i32, side: Side) -> Point {
    if side.is_north_south() {
        Point::new(point.x, mid)
    } else {
        Point::new(mid, point.y)
    }
}

fn ordered(a: i32, b: i32) -> (i32, i32) {
    (a.min(b), a.max(b))
}

fn cross(a: (i64, i64), b: (i64, i64)) -> i64 {
    a.0 * b.1 - a.1 * b.0
}

fn north_south_side(start: &Rectangle, end: &Rectangle) -> Option<Side> {
    if !start.separated_vertically(end) {
        return None;
    }
    Some(if end.y >= start.max_y() { Side::South } else { Side::North })
}

fn east_west_side(start: &Rectangle, end: &Rectangle) -> Option<Side> {
    if !start.separated_horizontally(end) {
        return None;
    }
    Some(if end.x >= start.max_x() { Side::East } else { Side::West })
}

/// Side facing `end` by comparing node centers, for overlapping nodes.
fn dominant_axis_side(start: &Rectangle, end: &Rectangle, prefers_north_south: bool) -> Side {
    let from = start.center();
    let to = end.center();
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx == 0 && dy == 0 {
        tracing::debug!("coincident node centers, using default side");
        return if prefers_north_south { Side::South } else { Side::East };
    }
    let vertical = match dy.abs().cmp(&dx.abs()) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => prefers_north_south,
    };
    if vertical {
        if dy >= 0 { Side::South } else { Side::North }
    } else if dx >= 0 {
        Side::East
    } else {
        Side::West
    }
}

fn other_axis_side(start: &Rectangle, end: &Rectangle, side: Side) -> Side {
    let from = start.center();
    let to = end.center();
    if side.is_north_south() {
        if to.x >= from.x { Side::East } else { Side::West }
    } else if to.y >= from.y {
        Side::South
    } else {
        Side::North
    }
}

pub(crate) fn preferred_side(start: &Rectangle, end: &Rectangle, prefers_north_south: bool) -> Side {
    let north_south = north_south_side(start, end);
    let east_west = east_west_side(start, end);
    let chosen = if prefers_north_south {
        north_south.or(east_west)
    } else {
        east_west.or(north_south)
    };
    chosen.unwrap_or_else(|| dominant_axis_side(start, end, prefers_north_south))
}

/// Side of the start node used by a segmented edge between the same two
/// nodes that is already stored.
fn existing_side(ctx: &RouteContext<'_>, storage: &EdgeStorage, edge: &Edge) -> Option<Side> {
    let start_bounds = ctx.bounds(edge.start);
    let end_bounds = ctx.bounds(edge.end);
    storage
        .edges_between(edge.start, edge.end)
        .filter(|stored| stored.edge != edge.id && stored.priority.is_segmented())
        .find_map(|stored| {
            let (near, far) = if stored.start == edge.start {
                (stored.path.start_point(), stored.path.end_point())
            } else {
                (stored.path.end_point(), stored.path.start_point())
            };
            let side = start_bounds.side_of(near)?;
            (end_bounds.side_of(far) == Some(side.opposite())).then_some(side)
        })
}

/// True when the face `edge` leaves through and the face it enters through
/// lie on the same line, as for nodes sharing a border.
fn faces_touch(ctx: &RouteContext<'_>, edge: &Edge, side: Side) -> bool {
    let leaving = ctx.bounds(edge.start).face_coordinate(side);
    leaving == ctx.bounds(edge.end).face_coordinate(side.opposite())
}

/// Swaps a side whose faces touch for the other axis when the nodes are
/// separated along it.
fn avoid_touching_faces(ctx: &RouteContext<'_>, edge: &Edge, side: Side) -> Side {
    if !faces_touch(ctx, edge, side) {
        return side;
    }
    let start = ctx.bounds(edge.start);
    let end = ctx.bounds(edge.end);
    let across = if side.is_north_south() {
        east_west_side(&start, &end)
    } else {
        north_south_side(&start, &end)
    };
    match across {
        Some(other) if !faces_touch(ctx, edge, other) => {
            tracing::debug!(edge = %edge.id, ?side, ?other, "faces touch, using the other axis");
            other
        }
        _ => side,
    }
}

/// The side of the start node a segmented edge attaches to. The end node
/// always uses the opposite side.
pub(crate) fn attached_side(ctx: &RouteContext<'_>, storage: &EdgeStorage, edge: &Edge) -> Side {
    if let Some(side) = existing_side(ctx, storage, edge) {
        return side;
    }
    let start = ctx.bounds(edge.start);
    let end = ctx.bounds(edge.end);
    let side = preferred_side(&start, &end, priority_of(edge).prefers_north_south());
    if node_is_closer_than_segment(ctx, storage, edge, edge.start, side)
        || node_is_closer_than_segment(ctx, storage, edge, edge.end, side.opposite())
    {
        let fallback = other_axis_side(&start, &end, side);
        tracing::trace!(edge = %edge.id, ?side, ?fallback, "node sits inside sibling trunk");
        return avoid_touching_faces(ctx, edge, fallback);
    }
    avoid_touching_faces(ctx, edge, side)
}

/// True when the far node of `edge` is nearer to `shared` than the mid-line
/// of a same-priority sibling leaving `shared_side`, so following the sibling
/// would cut through the far node.
pub(crate) fn node_is_closer_than_segment(
    ctx: &RouteContext<'_>,
    storage: &EdgeStorage,
    edge: &Edge,
    shared: NodeId,
    shared_side: Side,
) -> bool {
    let priority = priority_of(edge);
    let shared_bounds = ctx.bounds(shared);
    let other_bounds = ctx.bounds(edge.other_end(shared));
    let outward = shared_side.outward_sign();
    let shared_face = shared_bounds.face_coordinate(shared_side);
    let node_distance =
        (other_bounds.face_coordinate(shared_side.opposite()) - shared_face) * outward;
    if node_distance <= 0 {
        return false;
    }
    let horizontal = shared_side.is_north_south();
    storage
        .edges_on_face(shared, shared_bounds, shared_side)
        .filter(|(stored, _)| stored.edge != edge.id && stored.priority == priority)
        .filter_map(|(stored, _)| stored.path.parallel_segments(horizontal).next())
        .any(|segment| {
            let position = if horizontal { segment.p1.y } else { segment.p1.x };
            node_distance < (position - shared_face) * outward
        })
}

/// True when no stored edge attached to `side` of `shared` leads to a node
/// whose direction lies strictly between the far ends of `a` and `b`.
pub(crate) fn no_other_edges_between(
    ctx: &RouteContext<'_>,
    storage: &EdgeStorage,
    a: &Edge,
    b: &Edge,
    shared: NodeId,
    side: Side,
) -> bool {
    let shared_bounds = ctx.bounds(shared);
    let center = shared_bounds.center();
    let direction = |node: NodeId| {
        let target = ctx.bounds(node).center();
        (
            i64::from(target.x - center.x),
            i64::from(target.y - center.y),
        )
    };
    let to_a = direction(a.other_end(shared));
    let to_b = direction(b.other_end(shared));
    let turn = cross(to_a, to_b).signum();
    if turn == 0 {
        return true;
    }
    !storage
        .edges_on_face(shared, shared_bounds, side)
        .filter(|(stored, _)| !stored.is_self_edge() && stored.edge != a.id && stored.edge != b.id)
        .any(|(stored, _)| {
            let other = if stored.start == shared { stored.end } else { stored.start };
            let to_other = direction(other);
            cross(to_a, to_other).signum() == turn && cross(to_other, to_b).signum() == turn
        })
}

/// Whether `a` and `b` can share a trunk at the given end.
pub(crate) fn can_merge(
    ctx: &RouteContext<'_>,
    storage: &EdgeStorage,
    a: &Edge,
    b: &Edge,
    end: MergeEnd,
) -> bool {
    if a.id == b.id || a.is_self_edge() || b.is_self_edge() {
        return false;
    }
    if priority_of(a) != priority_of(b) {
        return false;
    }
    let shared = end.node(a);
    if end.node(b) != shared || end.label(a) != end.label(b) {
        return false;
    }
    let start_a = attached_side(ctx, storage, a);
    let start_b = attached_side(ctx, storage, b);
    if faces_touch(ctx, a, start_a) || faces_touch(ctx, b, start_b) {
        return false;
    }
    let side_a = end.side(start_a);
    let side_b = end.side(start_b);
    side_a == side_b && no_other_edges_between(ctx, storage, a, b, shared, side_a)
}

/// Grows a merge group around `edge` from the still unrouted `pending` edges.
pub(crate) fn merge_group<'e>(
    ctx: &RouteContext<'_>,
    storage: &EdgeStorage,
    edge: &'e Edge,
    pending: &[&'e Edge],
    end: MergeEnd,
) -> Vec<&'e Edge> {
    let mut group = vec![edge];
    for &candidate in pending {
        if candidate.id == edge.id {
            continue;
        }
        if group
            .iter()
            .all(|member| can_merge(ctx, storage, member, candidate, end))
        {
            group.push(candidate);
        }
    }
    group
}

fn choose_slot(used: &BTreeSet<NodeIndex>, direction: i32, cap: i32) -> NodeIndex {
    if !used.contains(&NodeIndex::Zero) {
        return NodeIndex::Zero;
    }
    for magnitude in 1..=cap {
        if let Some(slot) = NodeIndex::from_value(direction * magnitude)
            && !used.contains(&slot)
        {
            return slot;
        }
    }
    tracing::debug!(direction, cap, "face slots exhausted, reusing outermost slot");
    NodeIndex::from_value(direction * cap).unwrap_or(NodeIndex::Zero)
}

/// Picks the attachment point on `side` of `node` for an edge heading toward
/// `toward`.
///
/// The first edge on a face takes the midpoint. Later edges take the nearest
/// free slot on the half of the face pointing at `toward`, up to the
/// configured cap; past the cap they share the outermost slot.
pub(crate) fn get_connection_point(
    ctx: &RouteContext<'_>,
    storage: &EdgeStorage,
    node: NodeId,
    side: Side,
    toward: Point,
) -> Point {
    let bounds = ctx.bounds(node);
    let spacing = ctx.config.slot_spacing;
    let face = bounds.face(side);
    let (lo, hi) = ordered(along(face.p1, side), along(face.p2, side));
    let origin = ctx.grid.snap(along(face.midpoint(), side)).clamp(lo, hi);

    let used: BTreeSet<NodeIndex> = storage
        .edges_on_face(node, bounds, side)
        .map(|(_, point)| NodeIndex::nearest(along(point, side) - origin, spacing))
        .collect();
    let direction = if along(toward, side) >= origin { 1 } else { -1 };
    let slot = choose_slot(&used, direction, ctx.config.max_slot);

    let unit = ctx.grid.size();
    let limit = ((hi - lo) / 2 - spacing).max(0) / unit * unit;
    let offset = ctx.grid.snap(slot.offset(spacing)).clamp(-limit, limit);
    face_point(&bounds, side, (origin + offset).clamp(lo, hi))
}

/// Coordinate of the shared mid-line of a segmented edge leaving its start
/// node through `side`.
///
/// Normally the grid-snapped midpoint between the two faces. An edge that
/// repeats a stored connection between the same nodes runs one grid unit
/// beside it. Otherwise, when a stored edge on either attached face already
/// runs a parallel segment on that line, the new line moves one grid unit
/// away from the node that edge is attached to.
pub(crate) fn get_mid_line(
    ctx: &RouteContext<'_>,
    storage: &EdgeStorage,
    edge: &Edge,
    side: Side,
    start_point: Point,
    end_point: Point,
) -> i32 {
    let start_bounds = ctx.bounds(edge.start);
    let end_bounds = ctx.bounds(edge.end);
    let start_face = start_bounds.face_coordinate(side);
    let end_face = end_bounds.face_coordinate(side.opposite());
    let natural = ctx.grid.snap((start_face + end_face).div_euclid(2));
    let unit = ctx.grid.size();
    let outward = side.outward_sign();
    let horizontal = side.is_north_south();
    let priority = priority_of(edge);

    for stored in storage.edges_between(edge.start, edge.end) {
        if stored.edge == edge.id || !stored.priority.is_segmented() {
            continue;
        }
        if let Some(segment) = stored.path.parallel_segments(horizontal).next() {
            let position = if horizontal { segment.p1.y } else { segment.p1.x };
            let direction = if priority > stored.priority { outward } else { -outward };
            return position + direction * unit;
        }
    }

    let span = ordered(along(start_point, side), along(end_point, side));
    let at_start = storage
        .closest_conflicting_segment(edge.start, start_bounds, side, natural, span, edge.id)
        .map(|(_, position)| (position, outward));
    let at_end = storage
        .closest_conflicting_segment(
            edge.end,
            end_bounds,
            side.opposite(),
            natural,
            span,
            edge.id,
        )
        .map(|(_, position)| (position, -outward));
    let conflict = [at_start, at_end]
        .into_iter()
        .flatten()
        .filter(|(position, _)| (position - natural).abs() < unit)
        .min_by_key(|(position, _)| (position - natural).abs());

    let Some((position, direction)) = conflict else {
        return natural;
    };
    let (low, high) = ordered(start_face, end_face);
    let shifted = position + direction * unit;
    if shifted > low && shifted < high {
        shifted
    } else {
        position - direction * unit
    }
}

/// Path for nodes whose facing sides lie on one line with no room to turn.
/// Both ends attach to the same face on the other axis and the path steps
/// out one grid unit beyond the outer of the two faces, one more unit for
/// each edge already stored between the pair.
fn build_bracket_path(
    ctx: &RouteContext<'_>,
    storage: &EdgeStorage,
    edge: &Edge,
    side: Side,
) -> EdgePath {
    let start_bounds = ctx.bounds(edge.start);
    let end_bounds = ctx.bounds(edge.end);
    let beside = other_axis_side(&start_bounds, &end_bounds, side);
    let start_point = get_connection_point(ctx, storage, edge.start, beside, end_bounds.center());
    let end_point = get_connection_point(ctx, storage, edge.end, beside, start_bounds.center());
    let outward = beside.outward_sign();
    let start_face = start_bounds.face_coordinate(beside);
    let end_face = end_bounds.face_coordinate(beside);
    let outer = if outward > 0 {
        start_face.max(end_face)
    } else {
        start_face.min(end_face)
    };
    let stacked = storage
        .edges_between(edge.start, edge.end)
        .filter(|stored| stored.edge != edge.id)
        .count() as i32;
    let line = outer + outward * ctx.grid.size() * (1 + stacked);
    tracing::debug!(edge = %edge.id, ?side, ?beside, "faces touch, routing beside both nodes");
    EdgePath::from_points([
        start_point,
        bend(start_point, line, beside),
        bend(end_point, line, beside),
        end_point,
    ])
}

/// Routes a single segmented edge leaving its start node through `side`.
///
/// When the two faces lie on one line the nodes share a border and a
/// straight or mid-line route would have no length, so the edge goes
/// around the side instead.
pub(crate) fn build_segmented_path(
    ctx: &RouteContext<'_>,
    storage: &EdgeStorage,
    edge: &Edge,
    side: Side,
) -> EdgePath {
    if faces_touch(ctx, edge, side) {
        return build_bracket_path(ctx, storage, edge, side);
    }
    let start_center = ctx.bounds(edge.start).center();
    let end_center = ctx.bounds(edge.end).center();
    let start_point = get_connection_point(ctx, storage, edge.start, side, end_center);
    let end_point = get_connection_point(ctx, storage, edge.end, side.opposite(), start_center);
    if along(start_point, side) == along(end_point, side) {
        return EdgePath::new(start_point, end_point);
    }
    let mid = get_mid_line(ctx, storage, edge, side, start_point, end_point);
    EdgePath::from_points([
        start_point,
        bend(start_point, mid, side),
        bend(end_point, mid, side),
        end_point,
    ])
}

/// Mid-line for a merge group: halfway between the shared face and the
/// nearest facing side among the far nodes.
fn merged_mid_line(ctx: &RouteContext<'_>, shared: NodeId, side: Side, far_nodes: &[NodeId]) -> i32 {
    let shared_face = ctx.bounds(shared).face_coordinate(side);
    let outward = side.outward_sign();
    let nearest = far_nodes
        .iter()
        .map(|&node| ctx.bounds(node).face_coordinate(side.opposite()))
        .min_by_key(|face| (face - shared_face) * outward)
        .unwrap_or(shared_face);
    ctx.grid.snap((shared_face + nearest).div_euclid(2))
}

/// Routes a group sharing a start node through one trunk leaving that node.
pub(crate) fn store_merged_start_edges(
    ctx: &RouteContext<'_>,
    storage: &mut EdgeStorage,
    group: &[&Edge],
) {
    let Some(first) = group.first() else {
        return;
    };
    let shared = first.start;
    let side = attached_side(ctx, storage, first);
    let far_nodes: Vec<NodeId> = group.iter().map(|edge| edge.end).collect();
    let mid = merged_mid_line(ctx, shared, side, &far_nodes);
    let trunk = get_connection_point(ctx, storage, shared, side, ctx.bounds(first.end).center());
    tracing::trace!(node = %shared, ?side, edges = group.len(), "merging start trunk");
    for edge in group {
        let far = get_connection_point(ctx, storage, edge.end, side.opposite(), trunk);
        let path = EdgePath::from_points([trunk, bend(trunk, mid, side), bend(far, mid, side), far]);
        storage.store(edge, path);
    }
}

/// Routes a group sharing an end node through one trunk entering that node.
pub(crate) fn store_merged_end_edges(
    ctx: &RouteContext<'_>,
    storage: &mut EdgeStorage,
    group: &[&Edge],
) {
    let Some(first) = group.first() else {
        return;
    };
    let shared = first.end;
    let side = attached_side(ctx, storage, first).opposite();
    let far_nodes: Vec<NodeId> = group.iter().map(|edge| edge.start).collect();
    let mid = merged_mid_line(ctx, shared, side, &far_nodes);
    let trunk = get_connection_point(ctx, storage, shared, side, ctx.bounds(first.start).center());
    tracing::trace!(node = %shared, ?side, edges = group.len(), "merging end trunk");
    for edge in group {
        let far = get_connection_point(ctx, storage, edge.start, side.opposite(), trunk);
        let path = EdgePath::from_points([far, bend(far, mid, side), bend(trunk, mid, side), trunk]);
        storage.store(edge, path);
    }
}

/// Routes every unrouted edge of one segmented priority.
pub(crate) fn layout_segmented_edges(
    ctx: &RouteContext<'_>,
    storage: &mut EdgeStorage,
    priority: EdgePriority,
) {
    let edges: Vec<&Edge> = ctx
        .diagram
        .edges()
        .iter()
        .filter(|edge| priority_of(edge) == priority && !storage.contains(edge.id))
        .collect();
    tracing::debug!(?priority, edges = edges.len(), "routing segmented edges");

    for &edge in &edges {
        if storage.contains(edge.id) {
            continue;
        }
        let pending: Vec<&Edge> = edges
            .iter()
            .copied()
            .filter(|candidate| !storage.contains(candidate.id))
            .collect();

        let start_group = merge_group(ctx, storage, edge, &pending, MergeEnd::Start);
        if start_group.len() > 1 {
            store_merged_start_edges(ctx, storage, &start_group);
            continue;
        }
        let end_group = merge_group(ctx, storage, edge, &pending, MergeEnd::End);
        if end_group.len() > 1 {
            store_merged_end_edges(ctx, storage, &end_group);
            continue;
        }

        let side = attached_side(ctx, storage, edge);
        let path = build_segmented_path(ctx, storage, edge, side);
        tracing::trace!(edge = %edge.id, ?side, points = path.len(), "routed segmented edge");
        storage.store(edge, path);
    }
}
