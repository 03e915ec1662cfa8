//! Geometry primitives shared by the scroller, the gesture recognizers and
//! the items engine.
//!
//! Content space uses integer rectangles ([`Rect`]); the viewport position is
//! tracked as floats ([`RectF`]) so animations can move by sub-pixel amounts
//! and is rounded only when handed to the host.

/// A point in view or content space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Point {
    /// Creates a point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns this point moved by `(dx, dy)`.
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Point) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Length of the vector from the origin to this point.
    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }
}

/// Integer width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Size {
    /// Creates a size.
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Integer rectangle, right/bottom exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rect {
    /// Left edge.
    pub left: i32,
    /// Top edge.
    pub top: i32,
    /// Right edge (exclusive).
    pub right: i32,
    /// Bottom edge (exclusive).
    pub bottom: i32,
}

impl Rect {
    /// Creates a rectangle from its edges.
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Creates a rectangle from an origin and a size.
    pub const fn from_origin_size(left: i32, top: i32, size: Size) -> Self {
        Self::new(left, top, left + size.width, top + size.height)
    }

    /// Width, possibly negative for malformed rectangles.
    pub const fn width(&self) -> i32 {
        self.right - self.left
    }

    /// Height, possibly negative for malformed rectangles.
    pub const fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Size of the rectangle.
    pub const fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    /// True when the rectangle covers no area.
    pub const fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    /// True when `(x, y)` lies inside the rectangle.
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        self.left < self.right
            && self.top < self.bottom
            && x >= self.left
            && x < self.right
            && y >= self.top
            && y < self.bottom
    }

    /// True when `other` lies entirely inside this rectangle.
    pub const fn contains_rect(&self, other: &Rect) -> bool {
        !self.is_empty()
            && self.left <= other.left
            && self.top <= other.top
            && self.right >= other.right
            && self.bottom >= other.bottom
    }

    /// True when the two rectangles overlap with a non-empty area.
    pub const fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }

    /// Overlapping part of both rectangles, if any.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        Some(Rect::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        ))
    }

    /// Returns the rectangle moved by `(dx, dy)`.
    pub const fn offset(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(
            self.left + dx,
            self.top + dy,
            self.right + dx,
            self.bottom + dy,
        )
    }

    /// Returns the rectangle shrunk by `dx`/`dy` on each side (grown when negative).
    pub const fn inset(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(
            self.left + dx,
            self.top + dy,
            self.right - dx,
            self.bottom - dy,
        )
    }
}

/// Float rectangle used for the sub-pixel viewport position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RectF {
    /// Left edge.
    pub left: f32,
    /// Top edge.
    pub top: f32,
    /// Right edge.
    pub right: f32,
    /// Bottom edge.
    pub bottom: f32,
}

impl RectF {
    /// Creates a float rectangle from an origin and a size.
    pub fn from_origin_size(left: f32, top: f32, size: Size) -> Self {
        Self {
            left,
            top,
            right: left + size.width as f32,
            bottom: top + size.height as f32,
        }
    }

    /// Width.
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Height.
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Rounds every edge to the nearest integer.
    pub fn round(&self) -> Rect {
        Rect::new(
            self.left.round() as i32,
            self.top.round() as i32,
            self.right.round() as i32,
            self.bottom.round() as i32,
        )
    }
}

/// Placement along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    /// Align to the left/top edge.
    #[default]
    Start,
    /// Center within the container.
    Center,
    /// Align to the right/bottom edge.
    End,
}

/// Two-axis placement of a box inside a container rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Gravity {
    /// Horizontal placement.
    pub horizontal: Align,
    /// Vertical placement.
    pub vertical: Align,
}

impl Gravity {
    /// Top-left placement.
    pub const TOP_LEFT: Gravity = Gravity::new(Align::Start, Align::Start);
    /// Centered on both axes.
    pub const CENTER: Gravity = Gravity::new(Align::Center, Align::Center);
    /// Bottom-right placement.
    pub const BOTTOM_RIGHT: Gravity = Gravity::new(Align::End, Align::End);

    /// Creates a gravity from its per-axis alignment.
    pub const fn new(horizontal: Align, vertical: Align) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    /// Places a `width` x `height` box inside `container`.
    pub fn apply(&self, width: i32, height: i32, container: &Rect) -> Rect {
        let left = align_start(self.horizontal, width, container.left, container.right);
        let top = align_start(self.vertical, height, container.top, container.bottom);
        Rect::new(left, top, left + width, top + height)
    }
}

fn align_start(align: Align, extent: i32, start: i32, end: i32) -> i32 {
    match align {
        Align::Start => start,
        Align::Center => start + (end - start - extent) / 2,
        Align::End => end - extent,
    }
}
