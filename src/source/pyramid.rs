use std::sync::Arc;

use crate::foundation::error::{MipviewError, MipviewResult};
use crate::foundation::math::AffineTransform3D;
use crate::source::access::Source;
use crate::source::voxel::{ArrayGrid, Voxel, VoxelGrid};

/// In-memory multi-resolution source built by repeated 2x2 (x/y) averaging.
///
/// Level `l` voxels are `2^l` level-0 voxels wide in x and y, with their centres aligned to the
/// centre of the block they summarize. The same pyramid is served for every timepoint in
/// `0..num_timepoints`.
pub struct ImagePyramid<T: Voxel> {
    name: String,
    levels: Vec<Arc<ArrayGrid<T>>>,
    base_transform: AffineTransform3D,
    num_timepoints: usize,
}

impl<T: Voxel> ImagePyramid<T> {
    /// Build up to `max_levels` levels from `full_res`; stops early once a level is 1x1.
    pub fn build(
        name: impl Into<String>,
        full_res: ArrayGrid<T>,
        max_levels: usize,
    ) -> MipviewResult<Self> {
        if max_levels == 0 {
            return Err(MipviewError::validation("pyramid needs at least one level"));
        }
        let dims = full_res.dimensions();
        if dims.contains(&0) {
            return Err(MipviewError::validation(format!(
                "pyramid base must be non-empty, got {dims:?}"
            )));
        }

        let mut levels = vec![Arc::new(full_res)];
        while levels.len() < max_levels {
            let prev = &levels[levels.len() - 1];
            let [w, h, _] = prev.dimensions();
            if w == 1 && h == 1 {
                break;
            }
            let next = downsample_xy(prev);
            levels.push(Arc::new(next));
        }

        Ok(Self {
            name: name.into(),
            levels,
            base_transform: AffineTransform3D::identity(),
            num_timepoints: 1,
        })
    }

    /// Set the level-0 voxel-to-global transform.
    pub fn with_transform(mut self, base: AffineTransform3D) -> Self {
        self.base_transform = base;
        self
    }

    /// Serve the pyramid for timepoints `0..n`.
    pub fn with_timepoints(mut self, n: usize) -> Self {
        self.num_timepoints = n;
        self
    }

    /// Borrow one level.
    pub fn level(&self, level: usize) -> Option<&ArrayGrid<T>> {
        self.levels.get(level).map(|g| g.as_ref())
    }
}

fn downsample_xy<T: Voxel>(src: &ArrayGrid<T>) -> ArrayGrid<T> {
    let [w, h, d] = src.dimensions();
    let nw = w.div_ceil(2);
    let nh = h.div_ceil(2);
    let at = |x: usize, y: usize, z: usize| -> T {
        src.get(
            x.min(w - 1) as i64,
            y.min(h - 1) as i64,
            z as i64,
        )
        .copied()
        .unwrap_or(T::ZERO)
    };
    ArrayGrid::from_fn([nw, nh, d], |x, y, z| {
        let (sx, sy) = (2 * x, 2 * y);
        let top = at(sx, sy, z).lerp(at(sx + 1, sy, z), 0.5);
        let bottom = at(sx, sy + 1, z).lerp(at(sx + 1, sy + 1, z), 0.5);
        top.lerp(bottom, 0.5)
    })
}

impl<T: Voxel> Source<T> for ImagePyramid<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_present(&self, timepoint: usize) -> bool {
        timepoint < self.num_timepoints
    }

    fn num_mipmap_levels(&self) -> usize {
        self.levels.len()
    }

    fn source_transform(&self, _timepoint: usize, level: usize) -> AffineTransform3D {
        let f = (1u64 << level.min(62)) as f64;
        let offset = 0.5 * (f - 1.0);
        let level_to_base = AffineTransform3D::from_rows([
            [f, 0.0, 0.0, offset],
            [0.0, f, 0.0, offset],
            [0.0, 0.0, 1.0, 0.0],
        ]);
        self.base_transform.concatenate(&level_to_base)
    }

    fn voxels(&self, timepoint: usize, level: usize) -> MipviewResult<Arc<dyn VoxelGrid<T>>> {
        if !self.is_present(timepoint) {
            return Err(MipviewError::source(format!(
                "source '{}' has no timepoint {timepoint}",
                self.name
            )));
        }
        let grid = self.levels.get(level).ok_or_else(|| {
            MipviewError::source(format!(
                "source '{}' has no mipmap level {level} (levels: {})",
                self.name,
                self.levels.len()
            ))
        })?;
        Ok(Arc::clone(grid) as Arc<dyn VoxelGrid<T>>)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/pyramid.rs"]
mod tests;
