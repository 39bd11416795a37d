use super::*;

#[test]
fn over_opacity_0_is_noop() {
    let dst = [1, 2, 3, 4];
    assert_eq!(over(dst, [200, 200, 200, 200], 0.0), dst);
}

#[test]
fn over_src_alpha_0_is_noop() {
    let dst = [10, 20, 30, 40];
    assert_eq!(over(dst, [255, 255, 255, 0], 1.0), dst);
}

#[test]
fn opaque_src_replaces_dst() {
    let src = [255, 0, 0, 255];
    assert_eq!(over([0, 0, 0, 255], src, 1.0), src);
}

#[test]
fn half_opacity_mixes_with_opaque_background() {
    let out = over([0, 0, 0, 255], [255, 255, 255, 255], 0.5);
    assert_eq!(out[3], 255);
    assert!((127..=129).contains(&out[0]));
}

#[test]
fn premultiply_round_trips_opaque_and_clear() {
    assert_eq!(premultiply([10, 20, 30, 255]), [10, 20, 30, 255]);
    assert_eq!(premultiply([10, 20, 30, 0]), [0, 0, 0, 0]);
    assert_eq!(unpremultiply([10, 20, 30, 255]), [10, 20, 30, 255]);
    assert_eq!(unpremultiply([10, 20, 30, 0]), [0, 0, 0, 0]);
    assert_eq!(unpremultiply(premultiply([255, 0, 0, 128])), [255, 0, 0, 128]);
}
