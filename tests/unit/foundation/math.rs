use super::*;

fn assert_close(a: [f64; 3], b: [f64; 3]) {
    for d in 0..3 {
        assert!((a[d] - b[d]).abs() < 1e-9, "{a:?} != {b:?}");
    }
}

#[test]
fn concatenate_applies_right_operand_first() {
    let scale = AffineTransform3D::from_scale(2.0);
    let shift = AffineTransform3D::from_translation([1.0, 0.0, 0.0]);

    // scale(shift(p)) = 2 * (p + 1)
    let a = scale.concatenate(&shift);
    assert_close(a.apply([1.0, 1.0, 0.0]), [4.0, 2.0, 0.0]);

    // shift(scale(p)) = 2p + 1
    let b = scale.pre_concatenate(&shift);
    assert_close(b.apply([1.0, 1.0, 0.0]), [3.0, 2.0, 0.0]);
}

#[test]
fn inverse_round_trips_points() {
    let t = AffineTransform3D::from_rotation_z(0.7)
        .concatenate(&AffineTransform3D::from_scales([2.0, 3.0, 0.5]))
        .pre_concatenate(&AffineTransform3D::from_translation([5.0, -2.0, 1.5]));
    let inv = t.inverse().unwrap();
    let p = [1.25, -7.0, 3.0];
    assert_close(inv.apply(t.apply(p)), p);
    assert_close(t.concatenate(&inv).apply(p), p);
}

#[test]
fn singular_transform_has_no_inverse() {
    let flat = AffineTransform3D::from_scales([1.0, 1.0, 0.0]);
    assert!(flat.inverse().is_none());
}

#[test]
fn apply_vector_ignores_translation() {
    let t = AffineTransform3D::from_translation([9.0, 9.0, 9.0]);
    assert_eq!(t.apply_vector([1.0, 2.0, 3.0]), [1.0, 2.0, 3.0]);
}
