use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::foundation::core::Interval;
use crate::foundation::error::{MipviewError, MipviewResult};
use crate::foundation::math::AffineTransform3D;
use crate::render::buffer::{
    BufferPool, BufferPoolOpts, BufferPoolStats, RenderBuffer, ScreenScale,
};
use crate::render::display::{RenderResult, RenderTarget};
use crate::render::opts::RendererOpts;
use crate::render::painter::RepaintSignal;
use crate::render::projector::{Projector, ProjectorSource};
use crate::render::request::{RepaintRequest, RequestState};
use crate::render::state::{RenderSource, RenderState};
use crate::source::access::LoadingStrategy;
use crate::transform::pipeline::{best_mipmap_level, concatenate};

/// What one [`MultiResolutionRenderer::paint`] call did.
#[derive(Debug)]
pub enum PaintOutcome {
    /// Nothing was pending.
    Idle,
    /// A pass finished and was presented.
    Rendered(RenderResult),
    /// The pass was superseded by a newer request. Both are merged into the pending request.
    Cancelled,
    /// The pass failed; the last presented result stays on display.
    Failed(MipviewError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PassKind {
    Full,
    Interval,
}

struct PainterState {
    buffers: BufferPool,
    displayed: Option<RenderResult>,
    fast_streak: u32,
    incomplete_retries: u32,
}

struct PreparedSources {
    sources: Vec<ProjectorSource>,
    ideal_levels: bool,
}

/// Progressive renderer: coarse screen scales first, then finer ones until the canvas shows full
/// resolution at ideal mipmap levels.
///
/// Trigger methods may be called from any thread; [`paint`](Self::paint) is driven by one
/// painter thread (see [`PainterThread`](crate::PainterThread)) or a headless loop.
pub struct MultiResolutionRenderer {
    opts: RendererOpts,
    target: Arc<dyn RenderTarget>,
    pool: Arc<rayon::ThreadPool>,
    signal: Arc<RepaintSignal>,
    max_scale_index: AtomicUsize,
    mipmap_bias: AtomicUsize,
    requests: Mutex<RequestState>,
    painter: Mutex<PainterState>,
}

impl MultiResolutionRenderer {
    /// Validate `opts` and build the worker pool.
    pub fn new(opts: RendererOpts, target: Arc<dyn RenderTarget>) -> MipviewResult<Self> {
        opts.validate()?;
        let pool = build_thread_pool(opts.num_rendering_threads)?;
        let coarsest = opts.coarsest_scale_index();
        Ok(Self {
            opts,
            target,
            pool: Arc::new(pool),
            signal: Arc::new(RepaintSignal::new()),
            max_scale_index: AtomicUsize::new(coarsest),
            mipmap_bias: AtomicUsize::new(0),
            requests: Mutex::new(RequestState::default()),
            painter: Mutex::new(PainterState {
                buffers: BufferPool::new(BufferPoolOpts::default()),
                displayed: None,
                fast_streak: 0,
                incomplete_retries: 0,
            }),
        })
    }

    /// Configuration in use.
    pub fn opts(&self) -> &RendererOpts {
        &self.opts
    }

    /// Wake-up signal shared with the painter thread.
    pub fn signal(&self) -> &Arc<RepaintSignal> {
        &self.signal
    }

    /// Screen scale index that full repaints currently start at.
    pub fn max_screen_scale_index(&self) -> usize {
        self.max_scale_index.load(Ordering::Relaxed)
    }

    /// Mipmap levels currently added on top of the ideal ones while data loads.
    pub fn mipmap_bias(&self) -> usize {
        self.mipmap_bias.load(Ordering::Relaxed)
    }

    /// Buffer pool counters.
    pub fn buffer_stats(&self) -> BufferPoolStats {
        self.lock_painter().buffers.stats()
    }

    /// Whether a repaint is waiting to be painted.
    pub fn is_repaint_pending(&self) -> bool {
        self.lock_requests().is_pending()
    }

    /// Request a whole-canvas refresh, starting from the coarsest adaptive scale.
    ///
    /// Cancels a running pass and never blocks on rendering.
    pub fn request_repaint(&self) {
        self.submit(RepaintRequest::full(
            self.max_screen_scale_index(),
            self.mipmap_bias(),
        ));
    }

    /// Request a refresh of the canvas region `interval`.
    pub fn request_repaint_interval(&self, interval: Interval) {
        self.submit(RepaintRequest {
            scale_index: self.max_screen_scale_index(),
            mipmap_bias: self.mipmap_bias(),
            dirty: Some(interval),
        });
    }

    fn submit(&self, request: RepaintRequest) {
        self.lock_requests().submit(request);
        self.signal.request_repaint();
    }

    fn submit_followup(&self, request: RepaintRequest) {
        self.lock_requests().submit_followup(request);
        self.signal.request_repaint();
    }

    /// Run one pass for the pending request against `state`.
    #[tracing::instrument(skip_all, fields(timepoint = state.timepoint()))]
    pub fn paint(&self, state: &RenderState) -> PaintOutcome {
        let Some(request) = self.lock_requests().take() else {
            return PaintOutcome::Idle;
        };

        let mut guard = self.lock_painter();
        let painter = &mut *guard;
        let canvas = self.target.canvas_size();
        if painter.buffers.check_resize(canvas, &self.opts.screen_scales) {
            debug!(width = canvas.width, height = canvas.height, "canvas resized");
            painter.displayed = None;
        }

        let (kind, scale_index) = match (request.dirty, painter.displayed.as_ref()) {
            (Some(_), Some(displayed)) => (PassKind::Interval, displayed.scale_index),
            _ => (
                PassKind::Full,
                request.scale_index.min(self.opts.coarsest_scale_index()),
            ),
        };
        let Some(screen) = painter.buffers.scale(scale_index) else {
            return PaintOutcome::Failed(MipviewError::render(format!(
                "no buffer for screen scale {scale_index}"
            )));
        };

        let prepared = match self.prepare_sources(state, &screen, request.mipmap_bias) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "failed to prepare sources");
                return PaintOutcome::Failed(e);
            }
        };

        let mut buffer = painter.buffers.acquire(scale_index);
        let region = match (kind, request.dirty, painter.displayed.as_ref()) {
            (PassKind::Interval, Some(dirty), Some(displayed)) => {
                if let Err(e) = buffer.copy_from(displayed.buffer()) {
                    painter.buffers.release(scale_index, buffer);
                    return PaintOutcome::Failed(e);
                }
                dirty.scaled(screen.factor, screen.interval())
            }
            _ => screen.interval(),
        };

        let projector = Projector::new(
            prepared.sources,
            self.opts.background_argb,
            Arc::clone(&self.pool),
            self.opts.bands_per_thread,
        );
        if !self
            .lock_requests()
            .begin_pass(projector.cancel_handle(), request)
        {
            painter.buffers.release(scale_index, buffer);
            return PaintOutcome::Cancelled;
        }

        let started = Instant::now();
        let ok = projector.map(&mut buffer, region);
        let render_nanos = u64::try_from(started.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.lock_requests().end_pass();

        if !ok {
            painter.buffers.release(scale_index, buffer);
            return match projector.take_error() {
                Some(e) => {
                    warn!(error = %e, scale_index, "render pass failed");
                    PaintOutcome::Failed(e)
                }
                None => {
                    debug!(scale_index, "render pass cancelled");
                    PaintOutcome::Cancelled
                }
            };
        }

        let data_valid = projector.is_valid();
        if kind == PassKind::Full {
            self.adapt_screen_scale(scale_index, render_nanos);
        }
        self.update_mipmap_bias(painter, data_valid);

        let at_full_detail = scale_index == 0 && prepared.ideal_levels && data_valid;
        let complete = match kind {
            PassKind::Full => at_full_detail,
            PassKind::Interval => {
                at_full_detail && painter.displayed.as_ref().is_some_and(|d| d.complete)
            }
        };

        let shared = painter.buffers.publish(scale_index, buffer);
        let result = RenderResult {
            buffer: shared,
            scale_index,
            screen_scale: screen,
            valid_interval: region,
            complete,
            data_valid,
            timepoint: state.timepoint(),
            render_nanos,
        };
        painter.displayed = Some(result.clone());
        debug!(
            scale_index,
            render_nanos,
            complete,
            data_valid,
            interval_pass = kind == PassKind::Interval,
            "render pass done"
        );

        let followup = if scale_index > 0 {
            painter.incomplete_retries = 0;
            Some((RepaintRequest::full(scale_index - 1, self.mipmap_bias()), None))
        } else if complete {
            painter.incomplete_retries = 0;
            None
        } else if painter.incomplete_retries < self.opts.max_incomplete_retries {
            painter.incomplete_retries += 1;
            Some((
                RepaintRequest::full(0, self.mipmap_bias()),
                Some(Duration::from_millis(self.opts.incomplete_retry_delay_ms)),
            ))
        } else {
            debug!("giving up on refining incomplete data until the next request");
            None
        };
        drop(guard);

        self.target.present(result.clone());

        if let Some((next, delay)) = followup {
            if let Some(delay) = delay
                && !delay.is_zero()
            {
                // Gives pending loads a moment before the retry; bounded by the option.
                std::thread::sleep(delay);
            }
            self.submit_followup(next);
        }

        PaintOutcome::Rendered(result)
    }

    /// Render the whole canvas once at full resolution and ideal mipmap levels.
    ///
    /// The pass is independent of the progressive state: it is not cancellable, is not
    /// presented, and does not touch the pooled buffers.
    #[tracing::instrument(skip_all, fields(timepoint = state.timepoint()))]
    pub fn render_full(&self, state: &RenderState) -> MipviewResult<RenderResult> {
        let canvas = self.target.canvas_size();
        let factor = self.opts.screen_scales.first().copied().unwrap_or(1.0);
        let screen = ScreenScale::for_canvas(factor, canvas);
        let prepared = self.prepare_sources(state, &screen, 0)?;

        let mut buffer = RenderBuffer::new(screen.width, screen.height);
        let projector = Projector::new(
            prepared.sources,
            self.opts.background_argb,
            Arc::clone(&self.pool),
            self.opts.bands_per_thread,
        );
        let started = Instant::now();
        if !projector.map(&mut buffer, screen.interval()) {
            return Err(projector
                .take_error()
                .unwrap_or_else(|| MipviewError::render("headless render pass was cancelled")));
        }
        let data_valid = projector.is_valid();
        Ok(RenderResult {
            buffer: Arc::new(buffer),
            scale_index: 0,
            screen_scale: screen,
            valid_interval: screen.interval(),
            complete: prepared.ideal_levels && data_valid,
            data_valid,
            timepoint: state.timepoint(),
            render_nanos: u64::try_from(started.elapsed().as_nanos()).unwrap_or(u64::MAX),
        })
    }

    fn prepare_sources(
        &self,
        state: &RenderState,
        screen: &ScreenScale,
        bias: usize,
    ) -> MipviewResult<PreparedSources> {
        let screen_transform = screen.screen_transform();
        let t = state.timepoint();
        let mut sources = Vec::new();
        let mut ideal_levels = true;

        for rs in state.visible_sources() {
            let source = rs.source();
            let num_levels = source.num_mipmap_levels();
            if num_levels == 0 {
                continue;
            }
            let to_screen = |level: usize| -> AffineTransform3D {
                concatenate(
                    &source.source_transform(t, level),
                    state.viewer_transform(),
                    &screen_transform,
                )
            };
            let best = best_mipmap_level(num_levels, &to_screen);
            let levels = self.consulted_levels(rs, best, bias, num_levels);
            if levels.first() != Some(&best) {
                ideal_levels = false;
            }

            let mut ps = ProjectorSource::new();
            let last = levels.len().saturating_sub(1);
            for (i, &level) in levels.iter().enumerate() {
                let strategy = if i == last || !self.opts.allow_coarse_fallback {
                    LoadingStrategy::Blocking
                } else {
                    LoadingStrategy::Volatile
                };
                rs.cache_hinter().hint(t, level, strategy);
                let sampler = source.argb_sampler(t, level, rs.interpolation())?;
                ps.push_level(level, &to_screen(level), sampler)?;
            }
            sources.push(ps);
        }

        Ok(PreparedSources {
            sources,
            ideal_levels,
        })
    }

    fn consulted_levels(
        &self,
        rs: &RenderSource,
        best: usize,
        bias: usize,
        num_levels: usize,
    ) -> SmallVec<[usize; 8]> {
        if !self.opts.allow_coarse_fallback {
            return SmallVec::from_slice(&[best]);
        }
        let target = best.saturating_add(bias).min(num_levels - 1);
        let levels = rs.orderer().levels(target, num_levels);
        if levels.is_empty() {
            SmallVec::from_slice(&[target])
        } else {
            levels
        }
    }

    fn adapt_screen_scale(&self, scale_index: usize, render_nanos: u64) {
        let max = self.max_screen_scale_index();
        let target = self.opts.target_render_nanos;
        let next = if scale_index == max {
            if render_nanos > target && max < self.opts.coarsest_scale_index() {
                max + 1
            } else {
                max
            }
        } else if max > 0
            && scale_index == max - 1
            && (render_nanos as f64) < target as f64 * self.opts.finer_start_fraction
        {
            max - 1
        } else {
            max
        };
        if next != max {
            debug!(from = max, to = next, render_nanos, "adjusted starting screen scale");
            self.max_scale_index.store(next, Ordering::Relaxed);
        }
    }

    fn update_mipmap_bias(&self, painter: &mut PainterState, data_valid: bool) {
        if !self.opts.allow_coarse_fallback {
            return;
        }
        if !data_valid {
            painter.fast_streak = 0;
            if self.mipmap_bias.swap(1, Ordering::Relaxed) == 0 {
                debug!("data still loading; rendering one mipmap level coarser");
            }
            return;
        }
        if self.mipmap_bias() > 0 {
            painter.fast_streak += 1;
            if painter.fast_streak >= self.opts.fast_frames_to_refine {
                painter.fast_streak = 0;
                self.mipmap_bias.store(0, Ordering::Relaxed);
                debug!("data caught up; back to ideal mipmap levels");
            }
        }
    }

    fn lock_requests(&self) -> MutexGuard<'_, RequestState> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_painter(&self) -> MutexGuard<'_, PainterState> {
        self.painter.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn build_thread_pool(threads: Option<usize>) -> MipviewResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(MipviewError::validation(
            "num_rendering_threads must be >= 1 when set",
        ));
    }
    let mut builder =
        rayon::ThreadPoolBuilder::new().thread_name(|i| format!("mipview-band-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| MipviewError::render(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/render/renderer.rs"]
mod tests;
