use super::*;

#[test]
fn argb_channels_round_trip() {
    let c = Argb::from_channels(10, 20, 30, 40);
    assert_eq!(c.0, 0x0a14_1e28);
    assert_eq!(c.channels(), [10, 20, 30, 40]);
    assert_eq!(Argb::BLACK.a(), 255);
    assert_eq!(Argb::BLACK.r(), 0);
}

#[test]
fn interval_rejects_inverted_bounds() {
    assert!(Interval::new(2, 0, 1, 4).is_err());
    assert!(Interval::new(0, 5, 1, 4).is_err());
    assert!(Interval::new(1, 1, 1, 1).unwrap().is_empty());
}

#[test]
fn interval_union_ignores_empty_operands() {
    let a = Interval::new(0, 0, 4, 2).unwrap();
    let empty = Interval::new(10, 10, 10, 10).unwrap();
    assert_eq!(a.union(empty), a);
    assert_eq!(empty.union(a), a);

    let b = Interval::new(6, 1, 8, 9).unwrap();
    assert_eq!(a.union(b), Interval::new(0, 0, 8, 9).unwrap());
}

#[test]
fn interval_intersect_never_inverts() {
    let a = Interval::new(0, 0, 4, 4).unwrap();
    let b = Interval::new(10, 10, 12, 12).unwrap();
    let i = a.intersect(b);
    assert!(i.is_empty());
    assert!(i.x0 <= i.x1 && i.y0 <= i.y1);
}

#[test]
fn scaled_interval_is_conservative_and_clamped() {
    let bounds = Interval::from_size(50, 40);
    let iv = Interval::new(3, 5, 7, 9).unwrap();
    assert_eq!(iv.scaled(0.5, bounds), Interval::new(1, 2, 4, 5).unwrap());
    assert_eq!(iv.scaled(1.0, bounds), iv);

    let outside = Interval::new(-10, -10, 200, 200).unwrap();
    assert_eq!(outside.scaled(0.5, bounds), bounds);
}

#[test]
fn canvas_size_emptiness() {
    assert!(CanvasSize::new(0, 10).is_empty());
    assert!(!CanvasSize::new(3, 10).is_empty());
    assert_eq!(CanvasSize::new(3, 10).interval(), Interval::from_size(3, 10));
}
