use crate::foundation::core::{Bitmap, Point, Rect};
use crate::foundation::math::mul_div255_u8;

pub type StraightRgba8 = [u8; 4];

/// Porter-Duff "over" on straight-alpha pixels.
pub fn over(dst: StraightRgba8, src: StraightRgba8, opacity: f32) -> StraightRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return [src[0], src[1], src[2], 255];
    }

    let sa = u32::from(sa);
    let inv = 255 - sa;
    let da = u32::from(dst[3]);

    // Coverage scaled by 255: out_a * 255.
    let cov = sa * 255 + da * inv;
    if cov == 0 {
        return [0, 0, 0, 0];
    }

    let mut out = [0u8; 4];
    for i in 0..3 {
        let num = u32::from(src[i]) * sa * 255 + u32::from(dst[i]) * da * inv;
        out[i] = ((num + cov / 2) / cov).min(255) as u8;
    }
    out[3] = ((cov + 127) / 255).min(255) as u8;
    out
}

/// Composite `src` over `dst` with its top-left corner at `at`, clipping to `dst`.
pub fn draw_over(dst: &mut Bitmap, src: &Bitmap, at: Point) {
    let rect = Rect {
        origin: at,
        size: src.size(),
    };
    let Some((x0, y0, x1, y1)) = rect.clip_to(dst.size()) else {
        return;
    };

    let dst_w = dst.width() as usize;
    let src_w = src.width() as usize;
    let sx0 = (i64::from(x0) - at.x) as usize;
    let sy0 = (i64::from(y0) - at.y) as usize;
    let span = (x1 - x0) as usize;

    let src_data = src.data();
    let dst_data = dst.data_mut();
    for row in 0..(y1 - y0) as usize {
        let d_start = ((y0 as usize + row) * dst_w + x0 as usize) * 4;
        let s_start = ((sy0 + row) * src_w + sx0) * 4;
        let d_row = &mut dst_data[d_start..d_start + span * 4];
        let s_row = &src_data[s_start..s_start + span * 4];
        for (d, s) in d_row.chunks_exact_mut(4).zip(s_row.chunks_exact(4)) {
            let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], 1.0);
            d.copy_from_slice(&out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::Color;

    #[test]
    fn over_opacity_0_is_noop() {
        let dst = [1, 2, 3, 4];
        let src = [200, 200, 200, 200];
        assert_eq!(over(dst, src, 0.0), dst);
    }

    #[test]
    fn over_src_alpha_0_is_noop() {
        let dst = [10, 20, 30, 40];
        let src = [255, 255, 255, 0];
        assert_eq!(over(dst, src, 1.0), dst);
    }

    #[test]
    fn over_src_opaque_replaces_dst() {
        let dst = [0, 0, 0, 255];
        let src = [255, 0, 0, 255];
        assert_eq!(over(dst, src, 1.0), src);
    }

    #[test]
    fn over_dst_transparent_returns_src() {
        let dst = [0, 0, 0, 0];
        let src = [100, 110, 120, 200];
        assert_eq!(over(dst, src, 1.0), src);
    }

    #[test]
    fn over_half_alpha_on_opaque_averages() {
        let dst = [0, 0, 0, 255];
        let src = [255, 255, 255, 128];
        let out = over(dst, src, 1.0);
        assert_eq!(out[3], 255);
        assert!((i16::from(out[0]) - 128).abs() <= 1);
    }

    #[test]
    fn draw_over_places_and_clips() {
        let mut dst = Bitmap::filled(4, 4, Color::BLACK).unwrap();
        let src = Bitmap::filled(2, 2, Color::WHITE).unwrap();

        draw_over(&mut dst, &src, Point::new(1, 1));
        assert_eq!(dst.pixel(0, 0), Some(Color::BLACK));
        assert_eq!(dst.pixel(1, 1), Some(Color::WHITE));
        assert_eq!(dst.pixel(2, 2), Some(Color::WHITE));
        assert_eq!(dst.pixel(3, 3), Some(Color::BLACK));

        let mut dst = Bitmap::filled(4, 4, Color::BLACK).unwrap();
        draw_over(&mut dst, &src, Point::new(-1, 3));
        assert_eq!(dst.pixel(0, 3), Some(Color::WHITE));
        assert_eq!(dst.pixel(1, 3), Some(Color::BLACK));
        assert_eq!(dst.pixel(0, 2), Some(Color::BLACK));
    }
}
