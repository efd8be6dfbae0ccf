use serde::{Deserialize, Serialize};

/// A point in diagram coordinates.
///
/// Coordinates are integer pixels so that grid alignment and equality checks
/// between stored paths are exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        let dx = f64::from(other.x - self.x);
        let dy = f64::from(other.y - self.y);
        (dx * dx + dy * dy).sqrt()
    }
}

/// Axis-aligned bounding rectangle of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rectangle {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn max_x(&self) -> i32 {
        self.x + self.width
    }

    pub fn max_y(&self) -> i32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn is_degenerate(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.max_x() && point.y >= self.y && point.y <= self.max_y()
    }

    /// The segment of the rectangle's border facing `side`.
    pub fn face(&self, side: Side) -> Line {
        match side {
            Side::North => Line::new(Point::new(self.x, self.y), Point::new(self.max_x(), self.y)),
            Side::South => Line::new(
                Point::new(self.x, self.max_y()),
                Point::new(self.max_x(), self.max_y()),
            ),
            Side::West => Line::new(Point::new(self.x, self.y), Point::new(self.x, self.max_y())),
            Side::East => Line::new(
                Point::new(self.max_x(), self.y),
                Point::new(self.max_x(), self.max_y()),
            ),
        }
    }

    /// Coordinate of the face on its perpendicular axis: `y` for north/south
    /// faces, `x` for east/west faces.
    pub fn face_coordinate(&self, side: Side) -> i32 {
        match side {
            Side::North => self.y,
            Side::South => self.max_y(),
            Side::West => self.x,
            Side::East => self.max_x(),
        }
    }

    /// The face a border point lies on, if any. North and south win on corners.
    pub fn side_of(&self, point: Point) -> Option<Side> {
        let within_x = point.x >= self.x && point.x <= self.max_x();
        let within_y = point.y >= self.y && point.y <= self.max_y();
        if within_x && point.y == self.y {
            Some(Side::North)
        } else if within_x && point.y == self.max_y() {
            Some(Side::South)
        } else if within_y && point.x == self.x {
            Some(Side::West)
        } else if within_y && point.x == self.max_x() {
            Some(Side::East)
        } else {
            None
        }
    }

    pub fn corner(&self, corner: NodeCorner) -> Point {
        let x = match corner.vertical_side() {
            Side::East => self.max_x(),
            _ => self.x,
        };
        let y = match corner.horizontal_side() {
            Side::North => self.y,
            _ => self.max_y(),
        };
        Point::new(x, y)
    }

    pub fn union(&self, other: &Rectangle) -> Rectangle {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let max_x = self.max_x().max(other.max_x());
        let max_y = self.max_y().max(other.max_y());
        Rectangle::new(x, y, max_x - x, max_y - y)
    }

    /// True when the projections of both rectangles onto the x axis are disjoint.
    pub fn separated_horizontally(&self, other: &Rectangle) -> bool {
        other.x >= self.max_x() || other.max_x() <= self.x
    }

    /// True when the projections of both rectangles onto the y axis are disjoint.
    pub fn separated_vertically(&self, other: &Rectangle) -> bool {
        other.y >= self.max_y() || other.max_y() <= self.y
    }
}

/// A line segment between two points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Line {
    pub p1: Point,
    pub p2: Point,
}

impl Line {
    pub const fn new(p1: Point, p2: Point) -> Self {
        Self { p1, p2 }
    }

    pub fn is_horizontal(&self) -> bool {
        self.p1.y == self.p2.y && self.p1.x != self.p2.x
    }

    pub fn is_vertical(&self) -> bool {
        self.p1.x == self.p2.x && self.p1.y != self.p2.y
    }

    pub fn midpoint(&self) -> Point {
        Point::new((self.p1.x + self.p2.x) / 2, (self.p1.y + self.p2.y) / 2)
    }

    /// Shortest distance from `point` to any point of the segment.
    pub fn distance_to(&self, point: Point) -> f64 {
        let (x1, y1) = (f64::from(self.p1.x), f64::from(self.p1.y));
        let (x2, y2) = (f64::from(self.p2.x), f64::from(self.p2.y));
        let (px, py) = (f64::from(point.x), f64::from(point.y));
        let dx = x2 - x1;
        let dy = y2 - y1;
        let len_sq = dx * dx + dy * dy;
        if len_sq == 0.0 {
            return point.distance(self.p1);
        }
        let t = (((px - x1) * dx + (py - y1) * dy) / len_sq).clamp(0.0, 1.0);
        let cx = x1 + t * dx;
        let cy = y1 + t * dy;
        ((px - cx) * (px - cx) + (py - cy) * (py - cy)).sqrt()
    }

    /// Shortest distance between any point of this segment and any point of
    /// `other`. Crossing segments are at distance zero.
    pub fn distance_to_line(&self, other: &Line) -> f64 {
        let d1 = turn(self.p1, self.p2, other.p1);
        let d2 = turn(self.p1, self.p2, other.p2);
        let d3 = turn(other.p1, other.p2, self.p1);
        let d4 = turn(other.p1, other.p2, self.p2);
        if d1 * d2 < 0 && d3 * d4 < 0 {
            return 0.0;
        }
        [
            self.distance_to(other.p1),
            self.distance_to(other.p2),
            other.distance_to(self.p1),
            other.distance_to(self.p2),
        ]
        .into_iter()
        .fold(f64::INFINITY, f64::min)
    }

    /// Closed range covered on the x axis.
    pub fn x_span(&self) -> (i32, i32) {
        (self.p1.x.min(self.p2.x), self.p1.x.max(self.p2.x))
    }

    /// Closed range covered on the y axis.
    pub fn y_span(&self) -> (i32, i32) {
        (self.p1.y.min(self.p2.y), self.p1.y.max(self.p2.y))
    }
}

/// Sign of the turn from `a -> b` to `a -> c`.
fn turn(a: Point, b: Point, c: Point) -> i64 {
    let ab = (i64::from(b.x - a.x), i64::from(b.y - a.y));
    let ac = (i64::from(c.x - a.x), i64::from(c.y - a.y));
    (ab.0 * ac.1 - ab.1 * ac.0).signum()
}

/// The face of a node a path touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    North,
    South,
    East,
    West,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::North, Side::South, Side::East, Side::West];

    pub fn opposite(self) -> Side {
        match self {
            Side::North => Side::South,
            Side::South => Side::North,
            Side::East => Side::West,
            Side::West => Side::East,
        }
    }

    pub fn is_north_south(self) -> bool {
        matches!(self, Side::North | Side::South)
    }

    pub fn is_east_west(self) -> bool {
        !self.is_north_south()
    }

    /// Sign of the outward direction along the side's perpendicular axis.
    pub fn outward_sign(self) -> i32 {
        match self {
            Side::North | Side::West => -1,
            Side::South | Side::East => 1,
        }
    }
}

/// One of the four corners of a node; used to anchor self-edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeCorner {
    TopRight,
    TopLeft,
    BottomLeft,
    BottomRight,
}

impl NodeCorner {
    /// Order in which free corners are searched for a new self-edge.
    pub const SEARCH_ORDER: [NodeCorner; 4] = [
        NodeCorner::TopRight,
        NodeCorner::TopLeft,
        NodeCorner::BottomLeft,
        NodeCorner::BottomRight,
    ];

    /// North or south.
    pub fn horizontal_side(self) -> Side {
        match self {
            NodeCorner::TopRight | NodeCorner::TopLeft => Side::North,
            NodeCorner::BottomLeft | NodeCorner::BottomRight => Side::South,
        }
    }

    /// East or west.
    pub fn vertical_side(self) -> Side {
        match self {
            NodeCorner::TopRight | NodeCorner::BottomRight => Side::East,
            NodeCorner::TopLeft | NodeCorner::BottomLeft => Side::West,
        }
    }
}

/// A discrete attachment slot along a node face, relative to the face midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeIndex {
    MinusThree,
    MinusTwo,
    MinusOne,
    Zero,
    PlusOne,
    PlusTwo,
    PlusThree,
}

impl NodeIndex {
    pub const MAX_MAGNITUDE: i32 = 3;

    pub fn value(self) -> i32 {
        match self {
            NodeIndex::MinusThree => -3,
            NodeIndex::MinusTwo => -2,
            NodeIndex::MinusOne => -1,
            NodeIndex::Zero => 0,
            NodeIndex::PlusOne => 1,
            NodeIndex::PlusTwo => 2,
            NodeIndex::PlusThree => 3,
        }
    }

    pub fn from_value(value: i32) -> Option<NodeIndex> {
        match value {
            -3 => Some(NodeIndex::MinusThree),
            -2 => Some(NodeIndex::MinusTwo),
            -1 => Some(NodeIndex::MinusOne),
            0 => Some(NodeIndex::Zero),
            1 => Some(NodeIndex::PlusOne),
            2 => Some(NodeIndex::PlusTwo),
            3 => Some(NodeIndex::PlusThree),
            _ => None,
        }
    }

    /// Nearest slot to a pixel offset from the face midpoint.
    pub fn nearest(offset: i32, spacing: i32) -> NodeIndex {
        let spacing = spacing.max(1);
        let half = spacing / 2;
        let slot = if offset >= 0 {
            (offset + half) / spacing
        } else {
            -((-offset + half) / spacing)
        };
        let slot = slot.clamp(-Self::MAX_MAGNITUDE, Self::MAX_MAGNITUDE);
        Self::from_value(slot).unwrap_or(NodeIndex::Zero)
    }

    pub fn offset(self, spacing: i32) -> i32 {
        self.value() * spacing
    }
}
