use crate::foundation::error::{MipviewError, MipviewResult};

/// Packed `0xAARRGGBB` color with straight (non-premultiplied) alpha.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Argb(pub u32);

impl Argb {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self(0);
    /// Opaque black.
    pub const BLACK: Self = Self(0xff00_0000);
    /// Opaque white.
    pub const WHITE: Self = Self(0xffff_ffff);

    /// Pack individual channels.
    pub const fn from_channels(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32))
    }

    /// Alpha channel.
    pub const fn a(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Red channel.
    pub const fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    /// Green channel.
    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Blue channel.
    pub const fn b(self) -> u8 {
        self.0 as u8
    }

    /// Channels in `[a, r, g, b]` order.
    pub const fn channels(self) -> [u8; 4] {
        [self.a(), self.r(), self.g(), self.b()]
    }
}

/// Canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CanvasSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl CanvasSize {
    /// Create a canvas size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Return `true` when the canvas has no pixels.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Interval covering the whole canvas.
    pub fn interval(self) -> Interval {
        Interval::from_size(self.width, self.height)
    }
}

/// Half-open integer rectangle `[x0, x1) x [y0, y1)` in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Interval {
    /// Inclusive left edge.
    pub x0: i64,
    /// Inclusive top edge.
    pub y0: i64,
    /// Exclusive right edge.
    pub x1: i64,
    /// Exclusive bottom edge.
    pub y1: i64,
}

impl Interval {
    /// Create a validated interval with `x0 <= x1` and `y0 <= y1`.
    pub fn new(x0: i64, y0: i64, x1: i64, y1: i64) -> MipviewResult<Self> {
        if x0 > x1 || y0 > y1 {
            return Err(MipviewError::validation(format!(
                "interval bounds must be ordered, got [{x0}, {x1}) x [{y0}, {y1})"
            )));
        }
        Ok(Self { x0, y0, x1, y1 })
    }

    /// Interval of size `width x height` anchored at the origin.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self {
            x0: 0,
            y0: 0,
            x1: i64::from(width),
            y1: i64::from(height),
        }
    }

    /// Number of columns.
    pub fn width(self) -> i64 {
        (self.x1 - self.x0).max(0)
    }

    /// Number of rows.
    pub fn height(self) -> i64 {
        (self.y1 - self.y0).max(0)
    }

    /// Return `true` when the interval has no pixels.
    pub fn is_empty(self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Return `true` when `(x, y)` lies inside the interval.
    pub fn contains(self, x: i64, y: i64) -> bool {
        self.x0 <= x && x < self.x1 && self.y0 <= y && y < self.y1
    }

    /// Smallest interval containing both.
    ///
    /// Empty operands are ignored.
    pub fn union(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        Self {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Overlap of both intervals (possibly empty, never inverted).
    pub fn intersect(self, other: Self) -> Self {
        let x0 = self.x0.max(other.x0);
        let y0 = self.y0.max(other.y0);
        Self {
            x0,
            y0,
            x1: self.x1.min(other.x1).max(x0),
            y1: self.y1.min(other.y1).max(y0),
        }
    }

    /// Map a canvas-space interval into a buffer rendered at `scale`, clamped to `bounds`.
    ///
    /// The result conservatively covers every buffer pixel whose footprint touches the input.
    pub fn scaled(self, scale: f64, bounds: Self) -> Self {
        let x0 = (self.x0 as f64 * scale).floor() as i64;
        let y0 = (self.y0 as f64 * scale).floor() as i64;
        let x1 = (self.x1 as f64 * scale).ceil() as i64;
        let y1 = (self.y1 as f64 * scale).ceil() as i64;
        Self { x0, y0, x1, y1 }.intersect(bounds)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
