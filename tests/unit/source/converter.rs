use super::*;

#[test]
fn passthrough_is_identity() {
    let c = Argb::from_channels(12, 34, 56, 78);
    assert_eq!(ArgbPassthrough.convert(c), c);
}

#[test]
fn real_converter_stretches_and_clamps() {
    let conv = RealArgbConverter::gray(100.0, 200.0);
    assert_eq!(conv.convert(50u16), Argb::from_channels(255, 0, 0, 0));
    assert_eq!(conv.convert(150u16), Argb::from_channels(255, 128, 128, 128));
    assert_eq!(conv.convert(1000u16), Argb::WHITE);
}

#[test]
fn real_converter_tints_with_channel_color() {
    let conv = RealArgbConverter {
        min: 0.0,
        max: 1.0,
        color: Argb::from_channels(200, 0, 255, 0),
    };
    assert_eq!(conv.convert(0.5f32), Argb::from_channels(200, 0, 128, 0));
}

#[test]
fn degenerate_range_thresholds() {
    let conv = RealArgbConverter::gray(10.0, 10.0);
    assert_eq!(conv.convert(9u8), Argb::BLACK);
    assert_eq!(conv.convert(10u8), Argb::WHITE);
}
