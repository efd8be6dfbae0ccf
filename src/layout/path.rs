use super::types::{Line, Point};

/// An immutable polyline of at least two points.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgePath {
    points: Vec<Point>,
}

impl EdgePath {
    /// A straight two-point path.
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            points: vec![start, end],
        }
    }

    /// Builds a path from a point sequence, dropping consecutive duplicates.
    ///
    /// Panics when fewer than two points are supplied; every caller in the
    /// router constructs paths from a start and an end point.
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Self {
        let mut deduped: Vec<Point> = Vec::new();
        for point in points {
            if deduped.last() != Some(&point) {
                deduped.push(point);
            }
        }
        assert!(
            !deduped.is_empty(),
            "edge path needs at least one point"
        );
        if deduped.len() == 1 {
            // A zero-length edge still has a start and an end.
            deduped.push(deduped[0]);
        }
        Self { points: deduped }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn start_point(&self) -> Point {
        self.points[0]
    }

    pub fn end_point(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    pub fn segments(&self) -> impl Iterator<Item = Line> + '_ {
        self.points.windows(2).map(|pair| Line::new(pair[0], pair[1]))
    }

    /// True when every segment is purely horizontal or purely vertical.
    pub fn is_orthogonal(&self) -> bool {
        self.segments().all(|line| line.is_horizontal() || line.is_vertical())
    }

    /// Segments running along the given axis: horizontal ones when
    /// `horizontal` is set, vertical ones otherwise.
    pub fn parallel_segments(&self, horizontal: bool) -> impl Iterator<Item = Line> + '_ {
        self.segments().filter(move |line| {
            if horizontal {
                line.is_horizontal()
            } else {
                line.is_vertical()
            }
        })
    }

    pub fn distance_to(&self, point: Point) -> f64 {
        self.segments()
            .map(|line| line.distance_to(point))
            .fold(f64::INFINITY, f64::min)
    }
}
