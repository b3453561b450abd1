//! mipview progressively renders large multi-resolution volumetric image pyramids.
//!
//! The renderer shows a coarse preview immediately and refines it pass by pass, moving toward
//! full screen resolution and the finest needed mipmap level:
//!
//! - Describe what to draw as an immutable [`RenderState`]
//! - Create a [`MultiResolutionRenderer`] for a [`RenderTarget`]
//! - Drive it from a [`PainterThread`] (interactive) or call
//!   [`MultiResolutionRenderer::paint`] / [`MultiResolutionRenderer::render_full`] directly
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Progressive rendering pipeline.
pub mod render;
/// Data sources, converters and in-memory pyramids.
pub mod source;
/// Source, viewer and screen transform composition.
pub mod transform;

pub use crate::foundation::core::{Argb, CanvasSize, Interval};
pub use crate::foundation::error::{MipviewError, MipviewResult};
pub use crate::foundation::math::AffineTransform3D;

pub use crate::render::accumulate::{AlphaAverage, blend};
pub use crate::render::buffer::{BufferPoolStats, RenderBuffer, ScreenScale};
pub use crate::render::display::{LatestResult, RenderResult, RenderTarget};
pub use crate::render::opts::RendererOpts;
pub use crate::render::painter::{PainterThread, RepaintSignal};
pub use crate::render::projector::{
    CancelHandle, Projector, ProjectorSource, num_tasks, partition_rows,
};
pub use crate::render::renderer::{MultiResolutionRenderer, PaintOutcome};
pub use crate::render::state::{RenderSource, RenderState, ViewerStateCell, ViewerStateProvider};
pub use crate::source::access::{
    ArgbSampler, CacheHinter, CoarserFallbackOrderer, ConvertedSource, LoadingStrategy,
    MipmapOrderer, NoCacheHints, Source, SourceAndConverter,
};
pub use crate::source::converter::{ArgbPassthrough, Converter, RealArgbConverter};
pub use crate::source::pyramid::ImagePyramid;
pub use crate::source::voxel::{ArrayGrid, Interpolant, Interpolation, Voxel, VoxelGrid};
