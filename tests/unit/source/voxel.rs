use super::*;

fn ramp_grid() -> Arc<dyn VoxelGrid<f32>> {
    Arc::new(ArrayGrid::from_fn([4, 3, 1], |x, y, _| (x + 10 * y) as f32))
}

#[test]
fn array_grid_rejects_mismatched_length() {
    assert!(ArrayGrid::new([2, 2, 1], vec![0u8; 3]).is_err());
    assert!(ArrayGrid::new([2, 2, 1], vec![0u8; 4]).is_ok());
}

#[test]
fn out_of_bounds_is_zero_extended() {
    let g = ArrayGrid::from_fn([2, 2, 1], |_, _, _| 7u8);
    assert_eq!(g.voxel([0, 0, 0]).unwrap(), Some(7));
    assert_eq!(g.voxel([-1, 0, 0]).unwrap(), Some(0));
    assert_eq!(g.voxel([0, 2, 0]).unwrap(), Some(0));
    assert_eq!(g.voxel([0, 0, 1]).unwrap(), Some(0));
}

#[test]
fn nearest_rounds_to_closest_centre() {
    let s = Interpolant::new(ramp_grid(), Interpolation::NearestNeighbor);
    assert_eq!(s.sample([1.4, 0.0, 0.0]).unwrap(), Some(1.0));
    assert_eq!(s.sample([1.5, 0.0, 0.0]).unwrap(), Some(2.0));
    assert_eq!(s.sample([0.0, 1.6, 0.2]).unwrap(), Some(20.0));
}

#[test]
fn nlinear_blends_neighbours() {
    let s = Interpolant::new(ramp_grid(), Interpolation::NLinear);
    let v = s.sample([1.5, 0.5, 0.0]).unwrap().unwrap();
    assert!((v - 6.5).abs() < 1e-6);
}

#[test]
fn nlinear_is_exact_at_integer_positions() {
    let s = Interpolant::new(ramp_grid(), Interpolation::NLinear);
    assert_eq!(s.sample([3.0, 2.0, 0.0]).unwrap(), Some(23.0));
}

#[test]
fn argb_lerp_is_channelwise() {
    let a = Argb::from_channels(255, 0, 100, 200);
    let b = Argb::from_channels(255, 100, 100, 0);
    assert_eq!(a.lerp(b, 0.5), Argb::from_channels(255, 50, 100, 100));
    assert_eq!(a.lerp(b, 0.0), a);
    assert_eq!(a.lerp(b, 1.0), b);
}

struct PendingRight;

impl VoxelGrid<u8> for PendingRight {
    fn dimensions(&self) -> [usize; 3] {
        [2, 1, 1]
    }

    fn voxel(&self, pos: [i64; 3]) -> MipviewResult<Option<u8>> {
        Ok(if pos[0] == 0 { Some(9) } else { None })
    }
}

#[test]
fn unloaded_neighbours_only_matter_with_nonzero_weight() {
    let s = Interpolant::new(Arc::new(PendingRight), Interpolation::NLinear);
    assert_eq!(s.sample([0.0, 0.0, 0.0]).unwrap(), Some(9));
    assert_eq!(s.sample([0.5, 0.0, 0.0]).unwrap(), None);
}
