use std::fmt;
use std::sync::{Arc, RwLock};

use smallvec::SmallVec;

use crate::foundation::math::AffineTransform3D;
use crate::source::access::{
    CacheHinter, CoarserFallbackOrderer, ConvertedSource, MipmapOrderer, NoCacheHints,
};
use crate::source::voxel::Interpolation;

/// A visible source together with the strategies used to render it.
#[derive(Clone)]
pub struct RenderSource {
    source: Arc<dyn ConvertedSource>,
    interpolation: Interpolation,
    orderer: Arc<dyn MipmapOrderer>,
    cache_hinter: Arc<dyn CacheHinter>,
}

impl RenderSource {
    /// Render `source` with `interpolation`, coarser-level fallback, and no cache hints.
    pub fn new(source: Arc<dyn ConvertedSource>, interpolation: Interpolation) -> Self {
        Self {
            source,
            interpolation,
            orderer: Arc::new(CoarserFallbackOrderer),
            cache_hinter: Arc::new(NoCacheHints),
        }
    }

    /// Replace the mipmap orderer.
    pub fn with_orderer(mut self, orderer: Arc<dyn MipmapOrderer>) -> Self {
        self.orderer = orderer;
        self
    }

    /// Replace the cache hinter.
    pub fn with_cache_hinter(mut self, hinter: Arc<dyn CacheHinter>) -> Self {
        self.cache_hinter = hinter;
        self
    }

    /// Underlying source.
    pub fn source(&self) -> &Arc<dyn ConvertedSource> {
        &self.source
    }

    /// Interpolation used for sampling.
    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Mipmap level orderer.
    pub fn orderer(&self) -> &Arc<dyn MipmapOrderer> {
        &self.orderer
    }

    /// Cache hinter.
    pub fn cache_hinter(&self) -> &Arc<dyn CacheHinter> {
        &self.cache_hinter
    }
}

impl fmt::Debug for RenderSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderSource")
            .field("name", &self.source.name())
            .field("interpolation", &self.interpolation)
            .finish_non_exhaustive()
    }
}

/// Immutable snapshot of what the viewer wants to see.
#[derive(Clone, Debug, Default)]
pub struct RenderState {
    viewer_transform: AffineTransform3D,
    timepoint: usize,
    sources: SmallVec<[RenderSource; 4]>,
}

impl RenderState {
    /// Snapshot with the given global-to-viewer transform, timepoint and sources.
    pub fn new(
        viewer_transform: AffineTransform3D,
        timepoint: usize,
        sources: impl IntoIterator<Item = RenderSource>,
    ) -> Self {
        Self {
            viewer_transform,
            timepoint,
            sources: sources.into_iter().collect(),
        }
    }

    /// Global-to-viewer transform.
    pub fn viewer_transform(&self) -> &AffineTransform3D {
        &self.viewer_transform
    }

    /// Current timepoint.
    pub fn timepoint(&self) -> usize {
        self.timepoint
    }

    /// All sources, visible or not.
    pub fn sources(&self) -> &[RenderSource] {
        &self.sources
    }

    /// Sources with data at the current timepoint, in display order.
    pub fn visible_sources(&self) -> impl Iterator<Item = &RenderSource> {
        self.sources
            .iter()
            .filter(move |s| s.source.is_present(self.timepoint))
    }
}

/// Supplies the state a pass should render.
pub trait ViewerStateProvider: Send + Sync {
    /// Current snapshot. Called once at the start of every pass.
    fn render_state(&self) -> Arc<RenderState>;
}

/// Thread-safe holder for the latest [`RenderState`], written by the UI side.
#[derive(Debug, Default)]
pub struct ViewerStateCell {
    state: RwLock<Arc<RenderState>>,
}

impl ViewerStateCell {
    /// Cell holding `state`.
    pub fn new(state: RenderState) -> Self {
        Self {
            state: RwLock::new(Arc::new(state)),
        }
    }

    /// Replace the snapshot.
    pub fn set(&self, state: RenderState) {
        let mut guard = self
            .state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = Arc::new(state);
    }

    /// Derive a new snapshot from the current one.
    pub fn update(&self, f: impl FnOnce(&RenderState) -> RenderState) {
        let mut guard = self
            .state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let next = f(&guard);
        *guard = Arc::new(next);
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<RenderState> {
        let guard = self
            .state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Arc::clone(&guard)
    }
}

impl ViewerStateProvider for ViewerStateCell {
    fn render_state(&self) -> Arc<RenderState> {
        self.snapshot()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/state.rs"]
mod tests;
