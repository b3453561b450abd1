use std::sync::Arc;

use crate::foundation::core::Argb;
use crate::foundation::error::{MipviewError, MipviewResult};

/// Pixel value type stored in a source grid.
pub trait Voxel: Copy + Send + Sync + 'static {
    /// Value used outside the grid bounds (zero extension).
    const ZERO: Self;

    /// Linear blend `self + (other - self) * t` for `t` in `[0, 1]`.
    fn lerp(self, other: Self, t: f64) -> Self;
}

impl Voxel for u8 {
    const ZERO: Self = 0;

    fn lerp(self, other: Self, t: f64) -> Self {
        lerp_channel(self, other, t)
    }
}

impl Voxel for u16 {
    const ZERO: Self = 0;

    fn lerp(self, other: Self, t: f64) -> Self {
        let a = f64::from(self);
        let b = f64::from(other);
        (a + (b - a) * t).round().clamp(0.0, f64::from(u16::MAX)) as u16
    }
}

impl Voxel for f32 {
    const ZERO: Self = 0.0;

    fn lerp(self, other: Self, t: f64) -> Self {
        let a = f64::from(self);
        let b = f64::from(other);
        (a + (b - a) * t) as f32
    }
}

impl Voxel for Argb {
    const ZERO: Self = Argb::TRANSPARENT;

    fn lerp(self, other: Self, t: f64) -> Self {
        let a = self.channels();
        let b = other.channels();
        Argb::from_channels(
            lerp_channel(a[0], b[0], t),
            lerp_channel(a[1], b[1], t),
            lerp_channel(a[2], b[2], t),
            lerp_channel(a[3], b[3], t),
        )
    }
}

fn lerp_channel(a: u8, b: u8, t: f64) -> u8 {
    let a = f64::from(a);
    let b = f64::from(b);
    (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
}

/// Discrete voxel access for one (timepoint, mipmap level) of a source.
///
/// Implementations backed by an asynchronous cache return `Ok(None)` for voxels that are not
/// loaded yet; positions outside the grid return `Ok(Some(T::ZERO))`. Must be callable from
/// several worker threads at once and may block on a cache miss.
pub trait VoxelGrid<T>: Send + Sync {
    /// Grid size along x, y, z.
    fn dimensions(&self) -> [usize; 3];

    /// Fetch one voxel.
    fn voxel(&self, pos: [i64; 3]) -> MipviewResult<Option<T>>;
}

/// Dense in-memory grid, x fastest, then y, then z.
#[derive(Clone, Debug)]
pub struct ArrayGrid<T> {
    dims: [usize; 3],
    data: Vec<T>,
}

impl<T: Voxel> ArrayGrid<T> {
    /// Wrap existing data; `data.len()` must equal the product of `dims`.
    pub fn new(dims: [usize; 3], data: Vec<T>) -> MipviewResult<Self> {
        let expected = dims[0]
            .checked_mul(dims[1])
            .and_then(|v| v.checked_mul(dims[2]))
            .ok_or_else(|| MipviewError::validation("grid dimensions overflow"))?;
        if data.len() != expected {
            return Err(MipviewError::validation(format!(
                "grid data has {} voxels, expected {expected} for {dims:?}",
                data.len()
            )));
        }
        Ok(Self { dims, data })
    }

    /// Build a grid by evaluating `f(x, y, z)` for every voxel.
    pub fn from_fn(dims: [usize; 3], mut f: impl FnMut(usize, usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(dims[0] * dims[1] * dims[2]);
        for z in 0..dims[2] {
            for y in 0..dims[1] {
                for x in 0..dims[0] {
                    data.push(f(x, y, z));
                }
            }
        }
        Self { dims, data }
    }

    /// Borrow a voxel, or `None` outside the grid.
    pub fn get(&self, x: i64, y: i64, z: i64) -> Option<&T> {
        let [w, h, d] = self.dims;
        if x < 0 || y < 0 || z < 0 {
            return None;
        }
        let (x, y, z) = (x as usize, y as usize, z as usize);
        if x >= w || y >= h || z >= d {
            return None;
        }
        self.data.get((z * h + y) * w + x)
    }

    /// Raw voxel storage.
    pub fn data(&self) -> &[T] {
        &self.data
    }
}

impl<T: Voxel> VoxelGrid<T> for ArrayGrid<T> {
    fn dimensions(&self) -> [usize; 3] {
        self.dims
    }

    fn voxel(&self, pos: [i64; 3]) -> MipviewResult<Option<T>> {
        Ok(Some(
            self.get(pos[0], pos[1], pos[2]).copied().unwrap_or(T::ZERO),
        ))
    }
}

/// Interpolation method used to sample a grid at continuous positions.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Value of the voxel whose centre is closest.
    #[default]
    NearestNeighbor,
    /// Tri-linear blend of the surrounding voxels.
    NLinear,
}

/// Continuous sampler over a [`VoxelGrid`].
pub struct Interpolant<T> {
    grid: Arc<dyn VoxelGrid<T>>,
    method: Interpolation,
}

impl<T: Voxel> Interpolant<T> {
    /// Sample `grid` with `method`.
    pub fn new(grid: Arc<dyn VoxelGrid<T>>, method: Interpolation) -> Self {
        Self { grid, method }
    }

    /// Interpolation method in use.
    pub fn method(&self) -> Interpolation {
        self.method
    }

    /// Sample at a continuous position in voxel coordinates.
    ///
    /// `Ok(None)` when a contributing voxel is not loaded yet.
    pub fn sample(&self, p: [f64; 3]) -> MipviewResult<Option<T>> {
        match self.method {
            Interpolation::NearestNeighbor => self.grid.voxel([
                (p[0] + 0.5).floor() as i64,
                (p[1] + 0.5).floor() as i64,
                (p[2] + 0.5).floor() as i64,
            ]),
            Interpolation::NLinear => self.sample_nlinear(p),
        }
    }

    fn sample_nlinear(&self, p: [f64; 3]) -> MipviewResult<Option<T>> {
        let base = [p[0].floor(), p[1].floor(), p[2].floor()];
        let frac = [p[0] - base[0], p[1] - base[1], p[2] - base[2]];
        let origin = [base[0] as i64, base[1] as i64, base[2] as i64];

        let Some(near) = self.sample_plane(origin, frac)? else {
            return Ok(None);
        };
        if frac[2] == 0.0 {
            return Ok(Some(near));
        }
        let Some(far) = self.sample_plane([origin[0], origin[1], origin[2] + 1], frac)? else {
            return Ok(None);
        };
        Ok(Some(near.lerp(far, frac[2])))
    }

    fn sample_plane(&self, origin: [i64; 3], frac: [f64; 3]) -> MipviewResult<Option<T>> {
        let Some(top) = self.sample_row(origin, frac[0])? else {
            return Ok(None);
        };
        if frac[1] == 0.0 {
            return Ok(Some(top));
        }
        let Some(bottom) = self.sample_row([origin[0], origin[1] + 1, origin[2]], frac[0])? else {
            return Ok(None);
        };
        Ok(Some(top.lerp(bottom, frac[1])))
    }

    // Neighbours with zero weight are not fetched, so integer positions never touch
    // (possibly unloaded) adjacent voxels.
    fn sample_row(&self, origin: [i64; 3], fx: f64) -> MipviewResult<Option<T>> {
        let Some(left) = self.grid.voxel(origin)? else {
            return Ok(None);
        };
        if fx == 0.0 {
            return Ok(Some(left));
        }
        let Some(right) = self.grid.voxel([origin[0] + 1, origin[1], origin[2]])? else {
            return Ok(None);
        };
        Ok(Some(left.lerp(right, fx)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/voxel.rs"]
mod tests;
