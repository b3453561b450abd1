use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use tracing::{debug, error};

use crate::foundation::error::{MipviewError, MipviewResult};
use crate::render::renderer::{MultiResolutionRenderer, PaintOutcome};
use crate::render::state::ViewerStateProvider;

#[derive(Debug, Default)]
struct SignalState {
    please_repaint: bool,
    shutdown: bool,
}

/// Guarded wake-up flag between trigger threads and the painter.
#[derive(Debug, Default)]
pub struct RepaintSignal {
    state: Mutex<SignalState>,
    cond: Condvar,
}

impl RepaintSignal {
    /// Signal with nothing requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag and wake the painter. Never blocks on rendering.
    pub fn request_repaint(&self) {
        self.lock().please_repaint = true;
        self.cond.notify_all();
    }

    /// Ask the painter loop to exit.
    pub fn shutdown(&self) {
        self.lock().shutdown = true;
        self.cond.notify_all();
    }

    /// Block until a repaint is requested (`true`, flag cleared) or shutdown (`false`).
    pub fn wait(&self) -> bool {
        let mut guard = self.lock();
        while !guard.please_repaint && !guard.shutdown {
            guard = self
                .cond
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if guard.shutdown {
            return false;
        }
        guard.please_repaint = false;
        true
    }

    fn lock(&self) -> MutexGuard<'_, SignalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Dedicated thread that paints whenever a repaint is requested.
///
/// Dropping the handle shuts the thread down and joins it.
pub struct PainterThread {
    renderer: Arc<MultiResolutionRenderer>,
    handle: Option<JoinHandle<()>>,
}

impl PainterThread {
    /// Start painting with snapshots from `provider`.
    pub fn spawn(
        renderer: Arc<MultiResolutionRenderer>,
        provider: Arc<dyn ViewerStateProvider>,
    ) -> MipviewResult<Self> {
        let worker = Arc::clone(&renderer);
        let handle = std::thread::Builder::new()
            .name("mipview-painter".to_owned())
            .spawn(move || run(&worker, provider.as_ref()))
            .map_err(|e| MipviewError::render(format!("failed to spawn painter thread: {e}")))?;
        Ok(Self {
            renderer,
            handle: Some(handle),
        })
    }

    /// Renderer driven by this thread.
    pub fn renderer(&self) -> &Arc<MultiResolutionRenderer> {
        &self.renderer
    }

    /// Request a whole-canvas repaint.
    pub fn request_repaint(&self) {
        self.renderer.request_repaint();
    }

    /// Stop the loop and wait for the thread to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.renderer.signal().shutdown();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            error!("painter thread panicked");
        }
    }
}

impl Drop for PainterThread {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(renderer: &MultiResolutionRenderer, provider: &dyn ViewerStateProvider) {
    debug!("painter thread started");
    while renderer.signal().wait() {
        // Drain: a pass may queue its own refinement, and several requests may have merged.
        while renderer.is_repaint_pending() {
            let state = provider.render_state();
            match catch_unwind(AssertUnwindSafe(|| renderer.paint(&state))) {
                Ok(PaintOutcome::Failed(e)) => {
                    debug!(error = %e, "pass failed; waiting for the next request");
                    break;
                }
                Ok(PaintOutcome::Idle) => break,
                Ok(_) => {}
                Err(_) => {
                    error!("paint panicked; waiting for the next request");
                    break;
                }
            }
        }
    }
    debug!("painter thread stopped");
}

#[cfg(test)]
#[path = "../../tests/unit/render/painter.rs"]
mod tests;
