/// Integer pixel position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle. Used both for shapes and as the clip region
/// every draw call is translated into and clipped against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle at the origin covering `width` x `height`.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, clamp_extent(width), clamp_extent(height))
    }

    #[inline]
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// Whether a point given relative to this rectangle's origin lies inside it.
    #[inline]
    pub fn contains_local(&self, p: Point) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.w && p.y < self.h
    }

    /// The same rectangle moved by `offset`.
    pub fn translate(&self, offset: Point) -> Self {
        Self::new(
            self.x.saturating_add(offset.x),
            self.y.saturating_add(offset.y),
            self.w,
            self.h,
        )
    }

    /// Overlap of two rectangles, `None` when they do not overlap.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        if self.is_empty() || other.is_empty() {
            return None;
        }
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = right(self).min(right(other));
        let y1 = bottom(self).min(bottom(other));
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Rect::new(x0, y0, x1 - x0, y1 - y0))
    }
}

#[inline]
fn right(r: &Rect) -> i32 {
    r.x.saturating_add(r.w)
}

#[inline]
fn bottom(r: &Rect) -> i32 {
    r.y.saturating_add(r.h)
}

fn clamp_extent(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}
