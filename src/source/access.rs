use std::sync::Arc;

use smallvec::SmallVec;

use crate::foundation::core::Argb;
use crate::foundation::error::MipviewResult;
use crate::foundation::math::AffineTransform3D;
use crate::source::converter::Converter;
use crate::source::voxel::{Interpolant, Interpolation, Voxel, VoxelGrid};

/// Image pyramid accessor for one channel/angle of a dataset.
///
/// Implementations must be safe to call from several worker threads at once for different
/// (timepoint, level) pairs. Calls may block on a cache miss.
pub trait Source<T: Voxel>: Send + Sync {
    /// Display name (used in logs).
    fn name(&self) -> &str;

    /// Whether the source has data at `timepoint`.
    fn is_present(&self, timepoint: usize) -> bool;

    /// Number of pyramid levels; level 0 is the finest.
    fn num_mipmap_levels(&self) -> usize;

    /// Voxel-to-global transform of `level` at `timepoint`.
    fn source_transform(&self, timepoint: usize, level: usize) -> AffineTransform3D;

    /// Discrete voxel grid of `level` at `timepoint`.
    fn voxels(&self, timepoint: usize, level: usize) -> MipviewResult<Arc<dyn VoxelGrid<T>>>;

    /// Continuous sampler of `level` at `timepoint`.
    fn interpolated(
        &self,
        timepoint: usize,
        level: usize,
        method: Interpolation,
    ) -> MipviewResult<Interpolant<T>> {
        Ok(Interpolant::new(self.voxels(timepoint, level)?, method))
    }
}

/// Samples display colors at continuous voxel positions of one pyramid level.
pub trait ArgbSampler: Send + Sync {
    /// `Ok(None)` when the data at `pos` is not loaded yet.
    fn sample(&self, pos: [f64; 3]) -> MipviewResult<Option<Argb>>;
}

/// A [`Source`] bound to its converter, with the voxel type erased.
pub trait ConvertedSource: Send + Sync {
    /// Display name.
    fn name(&self) -> &str;

    /// Whether the source has data at `timepoint`.
    fn is_present(&self, timepoint: usize) -> bool;

    /// Number of pyramid levels.
    fn num_mipmap_levels(&self) -> usize;

    /// Voxel-to-global transform of `level` at `timepoint`.
    fn source_transform(&self, timepoint: usize, level: usize) -> AffineTransform3D;

    /// Color sampler for `level` at `timepoint`.
    fn argb_sampler(
        &self,
        timepoint: usize,
        level: usize,
        method: Interpolation,
    ) -> MipviewResult<Box<dyn ArgbSampler>>;
}

/// Pairs a typed [`Source`] with a [`Converter`].
pub struct SourceAndConverter<T: Voxel> {
    source: Arc<dyn Source<T>>,
    converter: Arc<dyn Converter<T>>,
}

impl<T: Voxel> SourceAndConverter<T> {
    /// Bind `converter` to `source`.
    pub fn new(source: Arc<dyn Source<T>>, converter: Arc<dyn Converter<T>>) -> Self {
        Self { source, converter }
    }
}

struct ConvertedSampler<T: Voxel> {
    interpolant: Interpolant<T>,
    converter: Arc<dyn Converter<T>>,
}

impl<T: Voxel> ArgbSampler for ConvertedSampler<T> {
    fn sample(&self, pos: [f64; 3]) -> MipviewResult<Option<Argb>> {
        Ok(self
            .interpolant
            .sample(pos)?
            .map(|v| self.converter.convert(v)))
    }
}

impl<T: Voxel> ConvertedSource for SourceAndConverter<T> {
    fn name(&self) -> &str {
        self.source.name()
    }

    fn is_present(&self, timepoint: usize) -> bool {
        self.source.is_present(timepoint)
    }

    fn num_mipmap_levels(&self) -> usize {
        self.source.num_mipmap_levels()
    }

    fn source_transform(&self, timepoint: usize, level: usize) -> AffineTransform3D {
        self.source.source_transform(timepoint, level)
    }

    fn argb_sampler(
        &self,
        timepoint: usize,
        level: usize,
        method: Interpolation,
    ) -> MipviewResult<Box<dyn ArgbSampler>> {
        Ok(Box::new(ConvertedSampler {
            interpolant: self.source.interpolated(timepoint, level, method)?,
            converter: Arc::clone(&self.converter),
        }))
    }
}

/// Order in which pyramid levels are consulted for one pass.
///
/// The projector samples the first level of the list and falls back along it, pixel by
/// pixel, while data is not loaded.
pub trait MipmapOrderer: Send + Sync {
    /// Levels to consult, starting with `target`. `target < num_levels`.
    fn levels(&self, target: usize, num_levels: usize) -> SmallVec<[usize; 8]>;
}

/// Target level first, then every coarser level.
#[derive(Clone, Copy, Debug, Default)]
pub struct CoarserFallbackOrderer;

impl MipmapOrderer for CoarserFallbackOrderer {
    fn levels(&self, target: usize, num_levels: usize) -> SmallVec<[usize; 8]> {
        (target.min(num_levels.saturating_sub(1))..num_levels).collect()
    }
}

/// How a cache should treat requests for one level during the coming pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoadingStrategy {
    /// Block until data is available.
    Blocking,
    /// Return immediately; missing data is reported as not loaded.
    Volatile,
}

/// Receives loading hints before each pass.
pub trait CacheHinter: Send + Sync {
    /// Called once per consulted level before the projector runs.
    fn hint(&self, timepoint: usize, level: usize, strategy: LoadingStrategy);
}

/// Ignores all hints.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCacheHints;

impl CacheHinter for NoCacheHints {
    fn hint(&self, _timepoint: usize, _level: usize, _strategy: LoadingStrategy) {}
}

#[cfg(test)]
#[path = "../../tests/unit/source/access.rs"]
mod tests;
