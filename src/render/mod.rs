//! Progressive rendering: per-pass projection of sources into pooled buffers, the
//! multi-resolution state machine that schedules passes, and the painter thread driving it.
//!
//! A pass flows `RenderState` -> `Projector` -> `RenderBuffer` -> `RenderTarget`. After each
//! successful pass the renderer queues the next finer one until the canvas is complete.

/// Order-independent multi-source blending.
pub mod accumulate;
/// Pixel buffers, screen scales and the per-scale buffer pool.
pub mod buffer;
/// Pass results and display consumers.
pub mod display;
/// Renderer configuration.
pub mod opts;
/// Painter thread and repaint signal.
pub mod painter;
/// Band-parallel, cancellable source projection.
pub mod projector;
/// Multi-resolution renderer state machine.
pub mod renderer;
pub(crate) mod request;
/// Viewer state snapshots and rendered sources.
pub mod state;
