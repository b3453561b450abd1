use std::ops::Range;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use rayon::prelude::*;
use smallvec::SmallVec;
use tracing::warn;

use crate::foundation::core::{Argb, Interval};
use crate::foundation::error::{MipviewError, MipviewResult};
use crate::foundation::math::AffineTransform3D;
use crate::render::accumulate::AlphaAverage;
use crate::render::buffer::RenderBuffer;
use crate::source::access::ArgbSampler;

/// Shared cancellation flag for one projector.
///
/// Cloning shares the flag; cancellation is sticky.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Fresh, uncancelled handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Callable from any thread.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

struct ProjectorLevel {
    level: usize,
    screen_to_source: AffineTransform3D,
    sampler: Box<dyn ArgbSampler>,
}

/// One source prepared for a pass: a color sampler per consulted mipmap level, in fallback order.
#[derive(Default)]
pub struct ProjectorSource {
    levels: SmallVec<[ProjectorLevel; 4]>,
}

impl ProjectorSource {
    /// Source with no levels yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Source sampled from a single level.
    pub fn single(
        level: usize,
        source_to_screen: &AffineTransform3D,
        sampler: Box<dyn ArgbSampler>,
    ) -> MipviewResult<Self> {
        let mut s = Self::new();
        s.push_level(level, source_to_screen, sampler)?;
        Ok(s)
    }

    /// Append a fallback level. `source_to_screen` maps level voxels to buffer pixels.
    pub fn push_level(
        &mut self,
        level: usize,
        source_to_screen: &AffineTransform3D,
        sampler: Box<dyn ArgbSampler>,
    ) -> MipviewResult<()> {
        let screen_to_source = source_to_screen.inverse().ok_or_else(|| {
            MipviewError::validation(format!(
                "source-to-screen transform of level {level} is not invertible"
            ))
        })?;
        self.levels.push(ProjectorLevel {
            level,
            screen_to_source,
            sampler,
        });
        Ok(())
    }

    /// Mipmap levels in fallback order.
    pub fn levels(&self) -> impl Iterator<Item = usize> + '_ {
        self.levels.iter().map(|l| l.level)
    }

    /// Color at buffer pixel `(x, y)` and whether it came from the first level.
    ///
    /// Transparent and not primary when no level had data loaded.
    fn sample(&self, x: f64, y: f64) -> MipviewResult<(Argb, bool)> {
        for (i, l) in self.levels.iter().enumerate() {
            let pos = l.screen_to_source.apply([x, y, 0.0]);
            if let Some(c) = l.sampler.sample(pos)? {
                return Ok((c, i == 0));
            }
        }
        Ok((Argb::TRANSPARENT, false))
    }
}

enum BandOutcome {
    Done { data_valid: bool },
    Cancelled,
    Failed(MipviewError),
}

/// Fills a buffer interval from prepared sources, split into row bands on a rayon pool.
///
/// A `Projector` is built for one pass. Once cancelled it stays cancelled; build a new one to
/// retry.
pub struct Projector {
    sources: Vec<ProjectorSource>,
    background: Argb,
    pool: Arc<rayon::ThreadPool>,
    bands_per_thread: usize,
    cancel: CancelHandle,
    data_valid: AtomicBool,
    error: Mutex<Option<MipviewError>>,
}

impl Projector {
    /// Projector compositing `sources` in order; `background` fills pixels when there are none.
    pub fn new(
        sources: Vec<ProjectorSource>,
        background: Argb,
        pool: Arc<rayon::ThreadPool>,
        bands_per_thread: usize,
    ) -> Self {
        Self {
            sources,
            background,
            pool,
            bands_per_thread: bands_per_thread.max(1),
            cancel: CancelHandle::new(),
            data_valid: AtomicBool::new(true),
            error: Mutex::new(None),
        }
    }

    /// Abort the running or next [`map`](Self::map).
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Handle that cancels this projector from another thread.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// `false` when the last successful `map` used fallback levels for some pixels.
    pub fn is_valid(&self) -> bool {
        self.data_valid.load(Ordering::Relaxed)
    }

    /// Error recorded by the last failed `map`, if any.
    pub fn take_error(&self) -> Option<MipviewError> {
        self.error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Render `interval` (clamped to the buffer) into `buffer`.
    ///
    /// Returns `false` when cancelled or when a band failed; pixels already written stay.
    pub fn map(&self, buffer: &mut RenderBuffer, interval: Interval) -> bool {
        let interval = interval.intersect(buffer.interval());
        if self.cancel.is_cancelled() {
            return false;
        }
        if interval.is_empty() {
            self.data_valid.store(true, Ordering::Relaxed);
            return true;
        }

        let width = buffer.width() as usize;
        let rows = interval.height();
        let n = num_tasks(self.pool.current_num_threads(), self.bands_per_thread, rows);
        let ranges = partition_rows(rows, n);

        let start = interval.y0 as usize * width;
        let end = interval.y1 as usize * width;
        let mut rest = &mut buffer.pixels_mut()[start..end];
        let mut bands = Vec::with_capacity(ranges.len());
        for r in ranges {
            let len = (r.end - r.start) as usize * width;
            let (band, tail) = std::mem::take(&mut rest).split_at_mut(len);
            rest = tail;
            let y = interval.y0 + r.start..interval.y0 + r.end;
            bands.push((y, band));
        }

        let outcomes: Vec<BandOutcome> = self.pool.install(|| {
            bands
                .into_par_iter()
                .map(|(rows, pixels)| self.run_band(rows, interval.x0, interval.x1, width, pixels))
                .collect()
        });

        let mut data_valid = true;
        let mut cancelled = false;
        let mut failure = None;
        for outcome in outcomes {
            match outcome {
                BandOutcome::Done { data_valid: v } => data_valid &= v,
                BandOutcome::Cancelled => cancelled = true,
                BandOutcome::Failed(e) => {
                    if failure.is_none() {
                        failure = Some(e);
                    }
                }
            }
        }

        if let Some(e) = failure {
            warn!(error = %e, "projector band failed");
            *self.error.lock().unwrap_or_else(PoisonError::into_inner) = Some(e);
            return false;
        }
        if cancelled {
            return false;
        }
        self.data_valid.store(data_valid, Ordering::Relaxed);
        true
    }

    fn run_band(
        &self,
        rows: Range<i64>,
        x0: i64,
        x1: i64,
        width: usize,
        pixels: &mut [u32],
    ) -> BandOutcome {
        match catch_unwind(AssertUnwindSafe(|| {
            self.fill_band(rows, x0, x1, width, pixels)
        })) {
            Ok(Ok(Some(data_valid))) => BandOutcome::Done { data_valid },
            Ok(Ok(None)) => BandOutcome::Cancelled,
            Ok(Err(e)) => BandOutcome::Failed(e),
            Err(panic) => {
                let msg = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_owned())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_owned());
                BandOutcome::Failed(MipviewError::render(format!("band panicked: {msg}")))
            }
        }
    }

    // `Ok(None)` when cancelled.
    fn fill_band(
        &self,
        rows: Range<i64>,
        x0: i64,
        x1: i64,
        width: usize,
        pixels: &mut [u32],
    ) -> MipviewResult<Option<bool>> {
        let mut data_valid = true;
        for (row, y) in pixels.chunks_exact_mut(width).zip(rows) {
            if self.cancel.is_cancelled() {
                return Ok(None);
            }
            let row = &mut row[x0 as usize..x1 as usize];
            match self.sources.as_slice() {
                [] => row.fill(self.background.0),
                [single] => {
                    for (px, x) in row.iter_mut().zip(x0..) {
                        if self.cancel.is_cancelled() {
                            return Ok(None);
                        }
                        let (c, primary) = single.sample(x as f64, y as f64)?;
                        data_valid &= primary;
                        *px = c.0;
                    }
                }
                sources => {
                    for (px, x) in row.iter_mut().zip(x0..) {
                        if self.cancel.is_cancelled() {
                            return Ok(None);
                        }
                        let mut acc = AlphaAverage::new();
                        for s in sources {
                            let (c, primary) = s.sample(x as f64, y as f64)?;
                            data_valid &= primary;
                            acc.add(c);
                        }
                        *px = acc.finish().0;
                    }
                }
            }
        }
        Ok(Some(data_valid))
    }
}

/// Number of row bands for `rows` rows on `threads` workers.
pub fn num_tasks(threads: usize, bands_per_thread: usize, rows: i64) -> usize {
    let rows = usize::try_from(rows).unwrap_or(0);
    threads
        .max(1)
        .saturating_mul(bands_per_thread.max(1))
        .min(rows)
        .max(1)
}

/// Split `0..rows` into `n` contiguous, non-empty (when `n <= rows`) bands in order.
pub fn partition_rows(rows: i64, n: usize) -> Vec<Range<i64>> {
    let rows = rows.max(0);
    let n = n.max(1) as i64;
    let base = rows / n;
    let extra = rows % n;
    let mut out = Vec::with_capacity(n as usize);
    let mut start = 0;
    for i in 0..n {
        let len = base + i64::from(i < extra);
        out.push(start..start + len);
        start += len;
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/projector.rs"]
mod tests;
