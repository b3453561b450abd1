use super::*;

#[test]
fn single_opaque_color_is_unchanged() {
    let c = Argb::from_channels(255, 10, 20, 30);
    assert_eq!(blend([c]), c);
}

#[test]
fn transparent_contributions_are_ignored() {
    let c = Argb::from_channels(128, 200, 100, 50);
    assert_eq!(blend([Argb::TRANSPARENT, c, Argb::TRANSPARENT]), c);
    assert_eq!(blend([Argb::TRANSPARENT]), Argb::TRANSPARENT);
    assert_eq!(blend([]), Argb::TRANSPARENT);
}

#[test]
fn opaque_colors_average_channelwise() {
    let red = Argb::from_channels(255, 255, 0, 0);
    let blue = Argb::from_channels(255, 0, 0, 255);
    assert_eq!(blend([red, blue]), Argb::from_channels(255, 128, 0, 128));
}

#[test]
fn weaker_alpha_contributes_less_color() {
    let strong = Argb::from_channels(255, 255, 0, 0);
    let weak = Argb::from_channels(85, 0, 0, 255);
    let out = blend([strong, weak]);
    // Weights 3:1.
    assert_eq!(out, Argb::from_channels(170, 191, 0, 64));
}

#[test]
fn blend_is_order_independent() {
    let colors = [
        Argb::from_channels(255, 1, 2, 3),
        Argb::from_channels(17, 250, 9, 77),
        Argb::from_channels(200, 30, 240, 128),
        Argb::from_channels(0, 99, 99, 99),
    ];
    let expected = blend(colors);
    let mut reversed = colors;
    reversed.reverse();
    assert_eq!(blend(reversed), expected);
    assert_eq!(blend([colors[2], colors[0], colors[3], colors[1]]), expected);
}
