use std::sync::Arc;

use kurbo::Affine;

use crate::foundation::core::{Argb, CanvasSize, Interval};
use crate::foundation::error::{MipviewError, MipviewResult};
use crate::foundation::math::AffineTransform3D;
use crate::transform::pipeline::screen_scale_transform;

/// Row-major packed ARGB pixel buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl RenderBuffer {
    /// Allocate a transparent buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    /// Wrap existing pixels; `pixels.len()` must equal `width * height`.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u32>) -> MipviewResult<Self> {
        if pixels.len() != width as usize * height as usize {
            return Err(MipviewError::validation(format!(
                "buffer has {} pixels, expected {width}x{height}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Interval covering the whole buffer.
    pub fn interval(&self) -> Interval {
        Interval::from_size(self.width, self.height)
    }

    /// Packed pixels, row-major.
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Mutable packed pixels, row-major.
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    /// Pixel at `(x, y)`, or `None` outside the buffer.
    pub fn get(&self, x: u32, y: u32) -> Option<Argb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .map(|&p| Argb(p))
    }

    /// Overwrite all pixels with those of an equally sized buffer.
    pub fn copy_from(&mut self, other: &Self) -> MipviewResult<()> {
        if self.width != other.width || self.height != other.height {
            return Err(MipviewError::validation(format!(
                "cannot copy {}x{} buffer into {}x{}",
                other.width, other.height, self.width, self.height
            )));
        }
        self.pixels.copy_from_slice(&other.pixels);
        Ok(())
    }

    /// Straight-alpha RGBA8 bytes, for image encoders.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 4);
        for &p in &self.pixels {
            let [a, r, g, b] = Argb(p).channels();
            out.extend_from_slice(&[r, g, b, a]);
        }
        out
    }
}

/// One entry of the screen scale ladder, sized for the current canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenScale {
    /// Buffer-to-canvas resolution ratio in `(0, 1]`.
    pub factor: f64,
    /// Buffer width in pixels.
    pub width: u32,
    /// Buffer height in pixels.
    pub height: u32,
}

impl ScreenScale {
    /// Size a scale for `canvas`. Non-empty canvases always get at least one buffer pixel.
    pub fn for_canvas(factor: f64, canvas: CanvasSize) -> Self {
        let dim = |d: u32| {
            if d == 0 {
                0
            } else {
                (f64::from(d) * factor).ceil().max(1.0) as u32
            }
        };
        Self {
            factor,
            width: dim(canvas.width),
            height: dim(canvas.height),
        }
    }

    /// Canvas-to-buffer transform.
    pub fn screen_transform(&self) -> AffineTransform3D {
        screen_scale_transform(self.factor)
    }

    /// Buffer-to-canvas mapping for display.
    pub fn buffer_to_canvas(&self) -> Affine {
        let inv = 1.0 / self.factor;
        let offset = 0.5 * inv - 0.5;
        Affine::new([inv, 0.0, 0.0, inv, offset, offset])
    }

    /// Interval covering the whole buffer.
    pub fn interval(&self) -> Interval {
        Interval::from_size(self.width, self.height)
    }
}

/// Pool configuration for per-scale buffers.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BufferPoolOpts {
    /// Maximum number of idle buffers retained per screen scale.
    pub(crate) max_spares_per_scale: usize,
}

impl Default for BufferPoolOpts {
    fn default() -> Self {
        // One buffer being written plus one coming back from the display.
        Self {
            max_spares_per_scale: 2,
        }
    }
}

/// Counters describing pool behaviour.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BufferPoolStats {
    /// Idle buffers currently retained.
    pub retained_buffers: usize,
    /// Buffers allocated since the last resize.
    pub alloc_buffers: u64,
    /// Acquisitions served from retained buffers.
    pub reused_buffers: u64,
    /// Buffers dropped because the pool was full.
    pub dropped_on_release: u64,
}

/// Per-scale reusable render buffers.
///
/// Published buffers are shared with the display as `Arc`s and are only reclaimed once the
/// pool holds the last reference, so a buffer is never written while a reader can see it.
pub(crate) struct BufferPool {
    opts: BufferPoolOpts,
    stats: BufferPoolStats,
    canvas: CanvasSize,
    scales: Vec<ScreenScale>,
    spares: Vec<Vec<RenderBuffer>>,
    published: Vec<Vec<Arc<RenderBuffer>>>,
}

impl BufferPool {
    pub(crate) fn new(opts: BufferPoolOpts) -> Self {
        Self {
            opts,
            stats: BufferPoolStats::default(),
            canvas: CanvasSize::default(),
            scales: Vec::new(),
            spares: Vec::new(),
            published: Vec::new(),
        }
    }

    pub(crate) fn stats(&self) -> BufferPoolStats {
        self.stats.clone()
    }

    pub(crate) fn scale(&self, index: usize) -> Option<ScreenScale> {
        self.scales.get(index).copied()
    }

    /// Size the ladder for `canvas`; returns `true` when buffers had to be discarded.
    pub(crate) fn check_resize(&mut self, canvas: CanvasSize, factors: &[f64]) -> bool {
        let unchanged = self.canvas == canvas
            && self.scales.len() == factors.len()
            && self.scales.iter().zip(factors).all(|(s, &f)| s.factor == f);
        if unchanged {
            return false;
        }
        self.canvas = canvas;
        self.scales = factors
            .iter()
            .map(|&f| ScreenScale::for_canvas(f, canvas))
            .collect();
        self.spares = vec![Vec::new(); factors.len()];
        self.published = vec![Vec::new(); factors.len()];
        self.stats = BufferPoolStats::default();
        true
    }

    /// Hand out a buffer for `scale_index` that no reader can observe.
    ///
    /// Contents are unspecified; callers overwrite what they publish.
    pub(crate) fn acquire(&mut self, scale_index: usize) -> RenderBuffer {
        self.reclaim(scale_index);
        if let Some(spares) = self.spares.get_mut(scale_index)
            && let Some(buffer) = spares.pop()
        {
            self.stats.retained_buffers = self.stats.retained_buffers.saturating_sub(1);
            self.stats.reused_buffers = self.stats.reused_buffers.saturating_add(1);
            return buffer;
        }

        self.stats.alloc_buffers = self.stats.alloc_buffers.saturating_add(1);
        match self.scales.get(scale_index) {
            Some(s) => RenderBuffer::new(s.width, s.height),
            None => RenderBuffer::new(0, 0),
        }
    }

    /// Return a buffer that was never published (e.g. after a cancelled pass).
    pub(crate) fn release(&mut self, scale_index: usize, buffer: RenderBuffer) {
        let Some(scale) = self.scales.get(scale_index) else {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        };
        if buffer.width != scale.width || buffer.height != scale.height {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }
        let spares = &mut self.spares[scale_index];
        if spares.len() >= self.opts.max_spares_per_scale {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }
        spares.push(buffer);
        self.stats.retained_buffers = self.stats.retained_buffers.saturating_add(1);
    }

    /// Freeze a finished buffer for sharing with the display.
    pub(crate) fn publish(&mut self, scale_index: usize, buffer: RenderBuffer) -> Arc<RenderBuffer> {
        let shared = Arc::new(buffer);
        if let Some(published) = self.published.get_mut(scale_index) {
            published.push(Arc::clone(&shared));
            // Stop tracking the oldest handles once the display hoards more than the cap;
            // those buffers are freed when the display lets go of them.
            let cap = self.opts.max_spares_per_scale.max(1);
            if published.len() > cap {
                let excess = published.len() - cap;
                published.drain(..excess);
            }
        }
        shared
    }

    fn reclaim(&mut self, scale_index: usize) {
        let Some(published) = self.published.get_mut(scale_index) else {
            return;
        };
        let mut still_shared = Vec::with_capacity(published.len());
        let mut reclaimed = Vec::new();
        for handle in published.drain(..) {
            match Arc::try_unwrap(handle) {
                Ok(buffer) => reclaimed.push(buffer),
                Err(handle) => still_shared.push(handle),
            }
        }
        *published = still_shared;
        for buffer in reclaimed {
            self.release(scale_index, buffer);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/buffer.rs"]
mod tests;
