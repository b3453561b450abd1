use crate::foundation::math::AffineTransform3D;

/// Slack below one screen pixel that still counts as "one voxel per pixel".
///
/// Exactly-matched zoom levels produce voxel sizes like `0.9999999`; without the slack they
/// would bounce to the next coarser level.
pub const VOXEL_SIZE_TOLERANCE: f64 = 0.01;

/// Canvas-to-buffer transform for a render buffer at `scale` (in `(0, 1]`).
///
/// Pixel centres stay aligned: buffer pixel `b` covers canvas pixels around
/// `(b + 0.5) / scale - 0.5`.
pub fn screen_scale_transform(scale: f64) -> AffineTransform3D {
    let offset = 0.5 * scale - 0.5;
    AffineTransform3D::from_rows([
        [scale, 0.0, 0.0, offset],
        [0.0, scale, 0.0, offset],
        [0.0, 0.0, 1.0, 0.0],
    ])
}

/// Compose `source -> global -> viewer -> screen`.
///
/// Application order is right to left: the source transform first, the screen scale last.
pub fn concatenate(
    source_transform: &AffineTransform3D,
    viewer_transform: &AffineTransform3D,
    screen_scale_transform: &AffineTransform3D,
) -> AffineTransform3D {
    screen_scale_transform
        .concatenate(viewer_transform)
        .concatenate(source_transform)
}

/// Largest 2D screen-space extent of a unit voxel edge under `source_to_screen`.
///
/// `source_to_screen` must already include the source transform of the mipmap level in
/// question, so the result is the footprint of one voxel of that level in screen pixels.
pub fn voxel_screen_size(source_to_screen: &AffineTransform3D) -> f64 {
    let mut size = 0.0f64;
    for d in 0..3 {
        let mut unit = [0.0; 3];
        unit[d] = 1.0;
        let v = source_to_screen.apply_vector(unit);
        size = size.max(v[0].hypot(v[1]));
    }
    size
}

/// Pick the mipmap level whose voxels best match the screen resolution.
///
/// Walks from the coarsest level toward finer ones while a voxel still covers at least one
/// screen pixel, and returns the finest level that satisfies this. When no level reaches one
/// pixel (far zoomed out) the coarsest level is returned. Levels whose footprint falls short of
/// a pixel are never chosen over a coarser neighbour, so ties resolve toward the cheaper level.
pub fn best_mipmap_level(
    num_levels: usize,
    level_to_screen: impl Fn(usize) -> AffineTransform3D,
) -> usize {
    if num_levels == 0 {
        return 0;
    }
    let coarsest = num_levels - 1;
    let mut best = coarsest;
    for level in (0..num_levels).rev() {
        if voxel_screen_size(&level_to_screen(level)) >= 1.0 - VOXEL_SIZE_TOLERANCE {
            best = level;
        } else if level < coarsest {
            break;
        }
    }
    best
}

#[cfg(test)]
#[path = "../../tests/unit/transform/pipeline.rs"]
mod tests;
