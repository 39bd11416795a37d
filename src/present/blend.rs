/// One premultiplied RGBA8 pixel.
pub type PremulRgba8 = [u8; 4];

/// Source-over of `src` scaled by `opacity` onto `dst`.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255(u16::from(dst[3]), inv));
    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Premultiply a straight-alpha color.
pub fn premultiply(rgba: [u8; 4]) -> PremulRgba8 {
    let a = u16::from(rgba[3]);
    [
        mul_div255(u16::from(rgba[0]), a),
        mul_div255(u16::from(rgba[1]), a),
        mul_div255(u16::from(rgba[2]), a),
        rgba[3],
    ]
}

/// Undo premultiplication for PNG output.
pub fn unpremultiply(px: PremulRgba8) -> [u8; 4] {
    let a = px[3];
    match a {
        0 => [0, 0, 0, 0],
        255 => px,
        _ => {
            let a = u32::from(a);
            let un = |c: u8| ((u32::from(c) * 255 + a / 2) / a).min(255) as u8;
            [un(px[0]), un(px[1]), un(px[2]), px[3]]
        }
    }
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/present/blend.rs"]
mod tests;
