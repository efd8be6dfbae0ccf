use std::collections::BTreeMap;

use crate::ir::{Edge, EdgeId, NodeId};

use super::path::EdgePath;
use super::priority::{EdgePriority, priority_of};
use super::types::{Line, Point, Rectangle, Side};

/// A routed edge together with the facts later edges query about it.
#[derive(Debug, Clone)]
pub struct StoredEdge {
    pub edge: EdgeId,
    pub start: NodeId,
    pub end: NodeId,
    pub priority: EdgePriority,
    pub path: EdgePath,
}

impl StoredEdge {
    pub fn is_self_edge(&self) -> bool {
        self.start == self.end
    }

    pub fn connects(&self, a: NodeId, b: NodeId) -> bool {
        (self.start == a && self.end == b) || (self.start == b && self.end == a)
    }

    /// Endpoints of the path that touch `node`, start first.
    pub fn endpoints_on(&self, node: NodeId) -> impl Iterator<Item = Point> + '_ {
        let start = (self.start == node).then(|| self.path.start_point());
        let end = (self.end == node).then(|| self.path.end_point());
        start.into_iter().chain(end)
    }
}

/// Paths routed so far in one layout pass, in routing order.
///
/// Storage only grows during a pass. Every query reads the current snapshot,
/// so an edge only ever sees edges routed before it.
#[derive(Debug, Clone, Default)]
pub struct EdgeStorage {
    entries: Vec<StoredEdge>,
    index: BTreeMap<EdgeId, usize>,
}

impl EdgeStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the path of `edge`, replacing an earlier path for the same edge.
    pub fn store(&mut self, edge: &Edge, path: EdgePath) {
        let stored = StoredEdge {
            edge: edge.id,
            start: edge.start,
            end: edge.end,
            priority: priority_of(edge),
            path,
        };
        match self.index.get(&edge.id) {
            Some(&slot) => self.entries[slot] = stored,
            None => {
                self.index.insert(edge.id, self.entries.len());
                self.entries.push(stored);
            }
        }
    }

    pub fn contains(&self, edge: EdgeId) -> bool {
        self.index.contains_key(&edge)
    }

    pub fn get(&self, edge: EdgeId) -> Option<&EdgePath> {
        self.stored(edge).map(|stored| &stored.path)
    }

    pub fn stored(&self, edge: EdgeId) -> Option<&StoredEdge> {
        self.index.get(&edge).map(|&slot| &self.entries[slot])
    }

    pub fn entries(&self) -> &[StoredEdge] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored non-self edges joining `a` and `b` in either direction.
    pub fn edges_between(&self, a: NodeId, b: NodeId) -> impl Iterator<Item = &StoredEdge> + '_ {
        self.entries
            .iter()
            .filter(move |stored| !stored.is_self_edge() && stored.connects(a, b))
    }

    /// Stored edges attached to `side` of `node`, with the attachment point.
    pub fn edges_on_face(
        &self,
        node: NodeId,
        bounds: Rectangle,
        side: Side,
    ) -> impl Iterator<Item = (&StoredEdge, Point)> + '_ {
        self.entries.iter().flat_map(move |stored| {
            stored
                .endpoints_on(node)
                .filter(move |point| bounds.side_of(*point) == Some(side))
                .map(move |point| (stored, point))
        })
    }

    /// True when no stored path starts or ends at `point`.
    pub fn is_connection_point_available(&self, point: Point) -> bool {
        !self
            .entries
            .iter()
            .any(|stored| stored.path.start_point() == point || stored.path.end_point() == point)
    }

    /// Among segmented edges attached to `side` of `node`, the one whose
    /// segment parallel to that face lies closest to `coordinate`.
    ///
    /// Only segments outside the node and overlapping `span` along the face
    /// axis count. Returns the edge and the segment's coordinate.
    pub fn closest_conflicting_segment(
        &self,
        node: NodeId,
        bounds: Rectangle,
        side: Side,
        coordinate: i32,
        span: (i32, i32),
        exclude: EdgeId,
    ) -> Option<(EdgeId, i32)> {
        let face = bounds.face_coordinate(side);
        let horizontal = side.is_north_south();
        let mut best: Option<(EdgeId, i32)> = None;
        for (stored, _) in self.edges_on_face(node, bounds, side) {
            if stored.edge == exclude || !stored.priority.is_segmented() {
                continue;
            }
            for segment in stored.path.parallel_segments(horizontal) {
                let (position, segment_span) = if horizontal {
                    (segment.p1.y, segment.x_span())
                } else {
                    (segment.p1.x, segment.y_span())
                };
                if (position - face) * side.outward_sign() <= 0 {
                    continue;
                }
                if segment_span.0 > span.1 || span.0 > segment_span.1 {
                    continue;
                }
                let distance = (position - coordinate).abs();
                if best.is_none_or(|(_, current)| distance < (current - coordinate).abs()) {
                    best = Some((stored.edge, position));
                }
            }
        }
        best
    }

    /// The stored path segment lying closest to `line` within `tolerance`.
    /// Segments that share an endpoint with the line are skipped.
    pub fn closest_segment_near(&self, line: Line, tolerance: f64) -> Option<(EdgeId, Line)> {
        let mut best: Option<(EdgeId, Line, f64)> = None;
        for stored in &self.entries {
            for segment in stored.path.segments() {
                let shares_endpoint = [segment.p1, segment.p2]
                    .iter()
                    .any(|point| *point == line.p1 || *point == line.p2);
                if shares_endpoint {
                    continue;
                }
                let distance = line.distance_to_line(&segment);
                if distance >= tolerance {
                    continue;
                }
                if best.is_none_or(|(_, _, current)| distance < current) {
                    best = Some((stored.edge, segment, distance));
                }
            }
        }
        best.map(|(edge, segment, _)| (edge, segment))
    }

    /// The most recently routed edge passing within `tolerance` of `point`.
    pub fn edge_at(&self, point: Point, tolerance: f64) -> Option<EdgeId> {
        self.entries
            .iter()
            .rev()
            .find(|stored| stored.path.distance_to(point) <= tolerance)
            .map(|stored| stored.edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::EdgeKind;

    fn edge(id: usize, kind: EdgeKind, start: usize, end: usize) -> Edge {
        Edge {
            id: EdgeId(id),
            start: NodeId(start),
            end: NodeId(end),
            kind,
            start_label: None,
            end_label: None,
        }
    }

    fn path(points: &[(i32, i32)]) -> EdgePath {
        EdgePath::from_points(points.iter().map(|&(x, y)| Point::new(x, y)))
    }

    #[test]
    fn store_and_get() {
        let mut storage = EdgeStorage::new();
        let e = edge(0, EdgeKind::Inheritance, 0, 1);
        assert!(!storage.contains(e.id));
        assert!(storage.get(e.id).is_none());
        storage.store(&e, path(&[(50, 60), (50, 200)]));
        assert!(storage.contains(e.id));
        assert_eq!(storage.get(e.id).unwrap().len(), 2);
        storage.store(&e, path(&[(60, 60), (60, 200)]));
        assert_eq!(storage.len(), 1);
        assert_eq!(storage.get(e.id).unwrap().start_point(), Point::new(60, 60));
    }

    #[test]
    fn edges_on_face_reports_attachment_points() {
        let mut storage = EdgeStorage::new();
        let bounds = Rectangle::new(0, 0, 100, 60);
        storage.store(
            &edge(0, EdgeKind::Inheritance, 0, 1),
            path(&[(50, 60), (50, 130), (150, 130), (150, 200)]),
        );
        storage.store(
            &edge(1, EdgeKind::Association, 2, 0),
            path(&[(300, 30), (100, 30)]),
        );
        let south: Vec<_> = storage.edges_on_face(NodeId(0), bounds, Side::South).collect();
        assert_eq!(south.len(), 1);
        assert_eq!(south[0].1, Point::new(50, 60));
        let east: Vec<_> = storage.edges_on_face(NodeId(0), bounds, Side::East).collect();
        assert_eq!(east[0].0.edge, EdgeId(1));
        assert_eq!(storage.edges_between(NodeId(1), NodeId(0)).count(), 1);
    }

    #[test]
    fn connection_point_availability_checks_endpoints_only() {
        let mut storage = EdgeStorage::new();
        storage.store(
            &edge(0, EdgeKind::Inheritance, 0, 1),
            path(&[(50, 60), (50, 130), (150, 130), (150, 200)]),
        );
        assert!(!storage.is_connection_point_available(Point::new(50, 60)));
        assert!(!storage.is_connection_point_available(Point::new(150, 200)));
        assert!(storage.is_connection_point_available(Point::new(50, 130)));
    }

    #[test]
    fn closest_conflicting_segment_respects_span_and_side() {
        let mut storage = EdgeStorage::new();
        let bounds = Rectangle::new(100, 0, 100, 60);
        storage.store(
            &edge(0, EdgeKind::Inheritance, 0, 1),
            path(&[(150, 60), (150, 130), (50, 130), (50, 200)]),
        );
        let hit = storage.closest_conflicting_segment(
            NodeId(0),
            bounds,
            Side::South,
            130,
            (-70, 140),
            EdgeId(9),
        );
        assert_eq!(hit, Some((EdgeId(0), 130)));
        let miss = storage.closest_conflicting_segment(
            NodeId(0),
            bounds,
            Side::South,
            130,
            (160, 400),
            EdgeId(9),
        );
        assert_eq!(miss, None);
        let excluded = storage.closest_conflicting_segment(
            NodeId(0),
            bounds,
            Side::South,
            130,
            (-70, 140),
            EdgeId(0),
        );
        assert_eq!(excluded, None);
    }

    #[test]
    fn closest_segment_near_line() {
        let mut storage = EdgeStorage::new();
        storage.store(
            &edge(0, EdgeKind::Association, 0, 1),
            path(&[(0, 0), (0, 50), (100, 50)]),
        );
        let line = Line::new(Point::new(20, 52), Point::new(200, 52));
        assert_eq!(
            storage.closest_segment_near(line, 10.0),
            Some((EdgeId(0), Line::new(Point::new(0, 50), Point::new(100, 50))))
        );
        let far = Line::new(Point::new(-100, 90), Point::new(200, 90));
        assert_eq!(storage.closest_segment_near(far, 10.0), None);
    }

    #[test]
    fn closest_segment_sees_long_segments_between_vertices() {
        let mut storage = EdgeStorage::new();
        storage.store(
            &edge(0, EdgeKind::Association, 0, 1),
            path(&[(-300, -100), (-300, 30), (600, 30), (600, -100)]),
        );
        let line = Line::new(Point::new(100, 30), Point::new(300, 30));
        assert_eq!(
            storage.closest_segment_near(line, 10.0),
            Some((EdgeId(0), Line::new(Point::new(-300, 30), Point::new(600, 30))))
        );
        let attached = Line::new(Point::new(600, 30), Point::new(800, 30));
        assert_eq!(storage.closest_segment_near(attached, 10.0), None);
    }

    #[test]
    fn edge_at_prefers_latest_edge() {
        let mut storage = EdgeStorage::new();
        storage.store(&edge(0, EdgeKind::Association, 0, 1), path(&[(0, 0), (100, 0)]));
        storage.store(&edge(1, EdgeKind::Dependency, 0, 1), path(&[(0, 2), (100, 2)]));
        assert_eq!(storage.edge_at(Point::new(50, 1), 5.0), Some(EdgeId(1)));
        assert_eq!(storage.edge_at(Point::new(50, 40), 5.0), None);
    }
}
