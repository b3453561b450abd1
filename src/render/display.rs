use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use kurbo::Affine;

use crate::foundation::core::{CanvasSize, Interval};
use crate::render::buffer::{RenderBuffer, ScreenScale};

/// Output of one render pass, handed to the display.
#[derive(Clone, Debug)]
pub struct RenderResult {
    pub(crate) buffer: Arc<RenderBuffer>,
    pub(crate) scale_index: usize,
    pub(crate) screen_scale: ScreenScale,
    pub(crate) valid_interval: Interval,
    pub(crate) complete: bool,
    pub(crate) data_valid: bool,
    pub(crate) timepoint: usize,
    pub(crate) render_nanos: u64,
}

impl RenderResult {
    /// Rendered pixels. The renderer never writes a buffer while a result holds it.
    pub fn buffer(&self) -> &Arc<RenderBuffer> {
        &self.buffer
    }

    /// Index into the configured screen scales.
    pub fn scale_index(&self) -> usize {
        self.scale_index
    }

    /// Screen scale the buffer was rendered at.
    pub fn screen_scale(&self) -> ScreenScale {
        self.screen_scale
    }

    /// Buffer-to-canvas mapping.
    pub fn buffer_to_canvas(&self) -> Affine {
        self.screen_scale.buffer_to_canvas()
    }

    /// Buffer sub-interval rewritten by this pass.
    pub fn valid_interval(&self) -> Interval {
        self.valid_interval
    }

    /// `true` once the whole canvas shows full resolution and ideal mipmap levels.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// `false` when some pixels came from a fallback level because data was still loading.
    pub fn is_data_valid(&self) -> bool {
        self.data_valid
    }

    /// Timepoint that was rendered.
    pub fn timepoint(&self) -> usize {
        self.timepoint
    }

    /// Wall-clock time spent in the projector.
    pub fn render_nanos(&self) -> u64 {
        self.render_nanos
    }
}

/// Display consumer and canvas size provider.
///
/// `present` is called from the painter thread and should return quickly.
pub trait RenderTarget: Send + Sync {
    /// Current canvas size in pixels.
    fn canvas_size(&self) -> CanvasSize;

    /// Receive a finished pass.
    fn present(&self, result: RenderResult);
}

#[derive(Default)]
struct LatestInner {
    canvas: CanvasSize,
    latest: Option<RenderResult>,
    presents: u64,
    history: Option<Vec<RenderResult>>,
}

/// In-memory [`RenderTarget`] for tests, headless use and debugging.
#[derive(Default)]
pub struct LatestResult {
    inner: Mutex<LatestInner>,
    presented: Condvar,
}

impl LatestResult {
    /// Target reporting `canvas` as its size.
    pub fn new(canvas: CanvasSize) -> Self {
        Self {
            inner: Mutex::new(LatestInner {
                canvas,
                ..LatestInner::default()
            }),
            presented: Condvar::new(),
        }
    }

    /// Also keep every presented result, in order.
    pub fn with_history(self) -> Self {
        self.lock().history = Some(Vec::new());
        self
    }

    /// Change the reported canvas size.
    pub fn set_canvas_size(&self, canvas: CanvasSize) {
        self.lock().canvas = canvas;
    }

    /// Most recently presented result.
    pub fn latest(&self) -> Option<RenderResult> {
        self.lock().latest.clone()
    }

    /// Number of results presented so far.
    pub fn present_count(&self) -> u64 {
        self.lock().presents
    }

    /// Drain the recorded history (empty unless [`with_history`](Self::with_history) was used).
    pub fn take_history(&self) -> Vec<RenderResult> {
        self.lock()
            .history
            .as_mut()
            .map(std::mem::take)
            .unwrap_or_default()
    }

    /// Block until a complete result is presented or `timeout` elapses.
    pub fn wait_for_complete(&self, timeout: Duration) -> Option<RenderResult> {
        self.wait_until(timeout, |r| r.is_complete())
    }

    /// Block until the latest result satisfies `pred` or `timeout` elapses.
    pub fn wait_until(
        &self,
        timeout: Duration,
        pred: impl Fn(&RenderResult) -> bool,
    ) -> Option<RenderResult> {
        let deadline = Instant::now() + timeout;
        let mut guard = self.lock();
        loop {
            if let Some(r) = guard.latest.as_ref()
                && pred(r)
            {
                return Some(r.clone());
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            guard = self
                .presented
                .wait_timeout(guard, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    fn lock(&self) -> MutexGuard<'_, LatestInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RenderTarget for LatestResult {
    fn canvas_size(&self) -> CanvasSize {
        self.lock().canvas
    }

    fn present(&self, result: RenderResult) {
        let mut guard = self.lock();
        guard.presents += 1;
        if let Some(history) = guard.history.as_mut() {
            history.push(result.clone());
        }
        guard.latest = Some(result);
        drop(guard);
        self.presented.notify_all();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/display.rs"]
mod tests;
