use super::*;
use crate::source::converter::{ArgbPassthrough, RealArgbConverter};
use crate::source::pyramid::ImagePyramid;
use crate::source::voxel::ArrayGrid;

#[test]
fn converted_source_samples_through_converter() {
    let grid = ArrayGrid::from_fn([2, 1, 1], |x, _, _| if x == 0 { 0u8 } else { 255u8 });
    let pyramid: Arc<dyn Source<u8>> = Arc::new(ImagePyramid::build("ch0", grid, 1).unwrap());
    let sac = SourceAndConverter::new(pyramid, Arc::new(RealArgbConverter::gray(0.0, 255.0)));

    assert_eq!(sac.name(), "ch0");
    assert_eq!(sac.num_mipmap_levels(), 1);
    let sampler = sac
        .argb_sampler(0, 0, Interpolation::NearestNeighbor)
        .unwrap();
    assert_eq!(sampler.sample([0.0, 0.0, 0.0]).unwrap(), Some(Argb::BLACK));
    assert_eq!(sampler.sample([1.0, 0.0, 0.0]).unwrap(), Some(Argb::WHITE));
}

#[test]
fn converted_source_reports_missing_levels() {
    let grid = ArrayGrid::from_fn([2, 2, 1], |_, _, _| Argb::WHITE);
    let pyramid: Arc<dyn Source<Argb>> = Arc::new(ImagePyramid::build("rgb", grid, 1).unwrap());
    let sac = SourceAndConverter::new(pyramid, Arc::new(ArgbPassthrough));
    assert!(sac.argb_sampler(0, 3, Interpolation::NLinear).is_err());
}

#[test]
fn coarser_fallback_lists_target_then_coarser_levels() {
    let o = CoarserFallbackOrderer;
    assert_eq!(o.levels(1, 4).as_slice(), &[1, 2, 3]);
    assert_eq!(o.levels(3, 4).as_slice(), &[3]);
    assert_eq!(o.levels(9, 4).as_slice(), &[3]);
}
