use super::*;

/// Level transforms of a 2x pyramid: scale `2^l` with centre-aligning offset.
fn level_transform(level: usize) -> AffineTransform3D {
    let f = f64::from(1u32 << level);
    let offset = 0.5 * (f - 1.0);
    AffineTransform3D::from_rows([
        [f, 0.0, 0.0, offset],
        [0.0, f, 0.0, offset],
        [0.0, 0.0, f, offset],
    ])
}

fn best_for_zoom(zoom: f64, num_levels: usize) -> usize {
    let viewer = AffineTransform3D::from_scale(zoom);
    let screen = screen_scale_transform(1.0);
    best_mipmap_level(num_levels, |l| {
        concatenate(&level_transform(l), &viewer, &screen)
    })
}

#[test]
fn screen_scale_keeps_pixel_centres_aligned() {
    let t = screen_scale_transform(0.5);
    // Buffer pixel 0 is centred between canvas pixels 0 and 1.
    let canvas = t.inverse().unwrap().apply([0.0, 0.0, 0.0]);
    assert!((canvas[0] - 0.5).abs() < 1e-12);
    assert!((canvas[1] - 0.5).abs() < 1e-12);

    let identity = screen_scale_transform(1.0);
    assert_eq!(identity, AffineTransform3D::identity());
}

#[test]
fn concatenate_applies_screen_scale_last() {
    let source = AffineTransform3D::from_translation([10.0, 0.0, 0.0]);
    let viewer = AffineTransform3D::from_scale(2.0);
    let screen = AffineTransform3D::from_scale(0.5);
    let t = concatenate(&source, &viewer, &screen);
    let p = t.apply([1.0, 0.0, 0.0]);
    assert!((p[0] - 11.0).abs() < 1e-12);
}

#[test]
fn voxel_screen_size_uses_largest_projected_edge() {
    let t = AffineTransform3D::from_scales([2.0, 3.0, 7.0]);
    // z projects onto the view axis and has no 2D footprint.
    assert!((voxel_screen_size(&t) - 3.0).abs() < 1e-12);

    let rotated = AffineTransform3D::from_rotation_z(0.3).concatenate(&t);
    assert!((voxel_screen_size(&rotated) - 3.0).abs() < 1e-9);
}

#[test]
fn best_level_is_finest_level_covering_a_pixel() {
    assert_eq!(best_for_zoom(1.0, 4), 0);
    assert_eq!(best_for_zoom(4.0, 4), 0);
    assert_eq!(best_for_zoom(0.5, 4), 1);
    assert_eq!(best_for_zoom(0.3, 4), 2);
    assert_eq!(best_for_zoom(0.25, 4), 2);
    // Far zoomed out clamps to the coarsest level.
    assert_eq!(best_for_zoom(0.001, 4), 3);
}

#[test]
fn best_level_tolerates_rounding_just_below_one_pixel() {
    assert_eq!(best_for_zoom(0.999_999, 3), 0);
    assert_eq!(best_for_zoom(0.5 * 0.999_999, 3), 1);
}

#[test]
fn best_level_never_coarsens_while_zooming_in() {
    let mut previous = usize::MAX;
    let mut zoom = 0.01;
    while zoom < 50.0 {
        let level = best_for_zoom(zoom, 6);
        assert!(
            level <= previous,
            "zoom {zoom}: level {level} coarser than previous {previous}"
        );
        previous = level;
        zoom *= 1.07;
    }
    assert_eq!(previous, 0);
}

#[test]
fn best_level_handles_degenerate_pyramids() {
    assert_eq!(best_mipmap_level(0, |_| AffineTransform3D::identity()), 0);
    assert_eq!(best_for_zoom(0.01, 1), 0);
}
