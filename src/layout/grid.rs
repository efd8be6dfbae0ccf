use super::types::{Point, Rectangle};

/// Snaps coordinates to a fixed spacing unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    size: i32,
}

impl Grid {
    pub fn new(size: i32) -> Self {
        Self { size: size.max(1) }
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    /// Rounds a magnitude up to the next multiple of the grid unit.
    ///
    /// Zero stays zero; anything in `1..=size` becomes one unit. The sign of a
    /// negative value is kept and its magnitude rounded the same way.
    pub fn to_multiple(&self, value: i32) -> i32 {
        let magnitude = value.abs();
        let rounded = (magnitude + self.size - 1) / self.size * self.size;
        if value < 0 { -rounded } else { rounded }
    }

    /// Rounds one coordinate to the nearest multiple, halves going up.
    pub fn snap(&self, value: i32) -> i32 {
        (value + self.size / 2).div_euclid(self.size) * self.size
    }

    pub fn snapped(&self, point: Point) -> Point {
        Point::new(self.snap(point.x), self.snap(point.y))
    }

    /// Snaps the origin and rounds the size up so the rectangle never shrinks
    /// below one unit on either axis.
    pub fn snapped_rect(&self, rect: Rectangle) -> Rectangle {
        Rectangle::new(
            self.snap(rect.x),
            self.snap(rect.y),
            self.to_multiple(rect.width).max(self.size),
            self.to_multiple(rect.height).max(self.size),
        )
    }

    pub fn is_aligned(&self, point: Point) -> bool {
        point.x.rem_euclid(self.size) == 0 && point.y.rem_euclid(self.size) == 0
    }
}
