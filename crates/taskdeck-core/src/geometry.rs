#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! Board coordinates are signed so a dragged rectangle can overshoot the
//! viewport (negative origin) without wrapping. Extents are unsigned.

/// A point in board coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Create a new point.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        dx.hypot(dy)
    }

    /// Offset from `origin` to `self` as `(dx, dy)`.
    #[inline]
    #[must_use]
    pub const fn delta_from(self, origin: Self) -> (i32, i32) {
        (
            self.x.saturating_sub(origin.x),
            self.y.saturating_sub(origin.y),
        )
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle used for droppable regions and hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: i32,
    /// Top edge (inclusive).
    pub y: i32,
    /// Width in board units.
    pub width: u32,
    /// Height in board units.
    pub height: u32,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Left edge (alias for x).
    #[inline]
    #[must_use]
    pub const fn left(&self) -> i32 {
        self.x
    }

    /// Top edge (alias for y).
    #[inline]
    #[must_use]
    pub const fn top(&self) -> i32 {
        self.y
    }

    /// Right edge (exclusive).
    #[inline]
    #[must_use]
    pub fn right(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    #[must_use]
    pub fn bottom(&self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    /// Area in board units.
    #[inline]
    #[must_use]
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Check if the rectangle has zero area.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Geometric center as floating point coordinates.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (
            f64::from(self.x) + f64::from(self.width) / 2.0,
            f64::from(self.y) + f64::from(self.height) / 2.0,
        )
    }

    /// Distance between the centers of two rectangles.
    #[must_use]
    pub fn center_distance(&self, other: &Rect) -> f64 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        (ax - bx).hypot(ay - by)
    }

    /// The four corners, clockwise from the top-left.
    #[must_use]
    pub fn corners(&self) -> [(f64, f64); 4] {
        let left = f64::from(self.x);
        let top = f64::from(self.y);
        let right = left + f64::from(self.width);
        let bottom = top + f64::from(self.height);
        [(left, top), (right, top), (right, bottom), (left, bottom)]
    }

    /// Sum of the distances from `point` to each corner.
    ///
    /// Smaller rectangles around the same point score lower, which lets the
    /// innermost of several nested regions win a containment test.
    #[must_use]
    pub fn corner_distance_sum(&self, point: Point) -> f64 {
        let px = f64::from(point.x);
        let py = f64::from(point.y);
        self.corners()
            .iter()
            .map(|(cx, cy)| (cx - px).hypot(cy - py))
            .sum()
    }

    /// Check if a point is inside the rectangle.
    ///
    /// Edges are inclusive on the top-left and exclusive on the bottom-right,
    /// so adjacent regions never both contain the same point.
    #[inline]
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        let px = i64::from(point.x);
        let py = i64::from(point.y);
        px >= i64::from(self.x) && px < self.right() && py >= i64::from(self.y) && py < self.bottom()
    }

    /// Translate the rectangle by `(dx, dy)`.
    #[inline]
    #[must_use]
    pub const fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            width: self.width,
            height: self.height,
        }
    }

    /// Compute the intersection with another rectangle.
    ///
    /// Returns an empty rectangle if the rectangles don't overlap.
    #[inline]
    #[must_use]
    pub fn intersection(&self, other: &Rect) -> Rect {
        self.intersection_opt(other).unwrap_or_default()
    }

    /// Compute the intersection with another rectangle, returning `None` if no overlap.
    #[must_use]
    pub fn intersection_opt(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if i64::from(x) < right && i64::from(y) < bottom {
            let width = u32::try_from(right - i64::from(x)).ok()?;
            let height = u32::try_from(bottom - i64::from(y)).ok()?;
            Some(Rect::new(x, y, width, height))
        } else {
            None
        }
    }

    /// Overlap area with another rectangle (zero when disjoint).
    #[inline]
    #[must_use]
    pub fn overlap_area(&self, other: &Rect) -> u64 {
        self.intersection_opt(other).map_or(0, |r| r.area())
    }
}
