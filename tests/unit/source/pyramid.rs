use super::*;
use crate::source::voxel::Interpolation;

fn gradient(w: usize, h: usize) -> ArrayGrid<f32> {
    ArrayGrid::from_fn([w, h, 1], |x, y, _| (x + y) as f32)
}

#[test]
fn build_halves_dimensions_until_single_voxel() {
    let p = ImagePyramid::build("g", gradient(5, 3), 10).unwrap();
    assert_eq!(p.num_mipmap_levels(), 4);
    assert_eq!(p.level(1).unwrap().dimensions(), [3, 2, 1]);
    assert_eq!(p.level(2).unwrap().dimensions(), [2, 1, 1]);
    assert_eq!(p.level(3).unwrap().dimensions(), [1, 1, 1]);
}

#[test]
fn build_respects_max_levels_and_rejects_empty_input() {
    assert_eq!(
        ImagePyramid::build("g", gradient(64, 64), 2)
            .unwrap()
            .num_mipmap_levels(),
        2
    );
    assert!(ImagePyramid::build("g", gradient(4, 4), 0).is_err());
    assert!(ImagePyramid::build("g", gradient(0, 4), 3).is_err());
}

#[test]
fn downsampled_voxels_average_their_block() {
    let p = ImagePyramid::build("g", gradient(4, 4), 2).unwrap();
    // Block (0..2, 0..2) of x + y holds 0, 1, 1, 2.
    assert_eq!(p.level(1).unwrap().get(0, 0, 0), Some(&1.0));
    assert_eq!(p.level(1).unwrap().get(1, 1, 0), Some(&5.0));
}

#[test]
fn level_transform_aligns_voxel_centres() {
    let p = ImagePyramid::build("g", gradient(8, 8), 3).unwrap();
    let t = p.source_transform(0, 1);
    // Level-1 voxel 0 sits between level-0 voxels 0 and 1.
    let c = t.apply([0.0, 0.0, 0.0]);
    assert!((c[0] - 0.5).abs() < 1e-12);
    let c = t.apply([1.0, 0.0, 0.0]);
    assert!((c[0] - 2.5).abs() < 1e-12);
}

#[test]
fn timepoints_and_levels_are_bounds_checked() {
    let p = ImagePyramid::build("g", gradient(4, 4), 2)
        .unwrap()
        .with_timepoints(3);
    assert!(p.is_present(2));
    assert!(!p.is_present(3));
    assert!(p.voxels(3, 0).is_err());
    assert!(p.voxels(0, 5).is_err());
    let s = p.interpolated(1, 1, Interpolation::NearestNeighbor).unwrap();
    assert_eq!(s.sample([0.0, 0.0, 0.0]).unwrap(), Some(1.0));
}
