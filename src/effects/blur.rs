use rayon::prelude::*;

use crate::foundation::core::Bitmap;
use crate::foundation::error::{BackdropError, BackdropResult};
use crate::foundation::math::{premultiply_rgba8_in_place, rgba_len, unpremultiply_rgba8_in_place};

/// Repeated separable box blur over premultiplied RGBA8.
///
/// Each pass is a clamp-to-edge moving average of width `2*radius + 1`; three passes
/// come close to a Gaussian with `sigma ~ radius`.
pub fn box_blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    passes: u32,
) -> BackdropResult<Vec<u8>> {
    let expected_len = rgba_len(width, height)
        .ok_or_else(|| BackdropError::invalid_bitmap("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(BackdropError::invalid_bitmap(
            "box_blur_rgba8_premul expects src matching width*height*4",
        ));
    }
    if radius == 0 || passes == 0 || expected_len == 0 {
        return Ok(src.to_vec());
    }

    let mut buf = src.to_vec();
    for _ in 0..passes {
        buf = horizontal_pass(&buf, width, radius);
    }
    let mut cols = transpose(&buf, width, height);
    for _ in 0..passes {
        cols = horizontal_pass(&cols, height, radius);
    }
    Ok(transpose(&cols, height, width))
}

/// Blur a straight-alpha bitmap; premultiplies around the passes.
#[tracing::instrument(skip(bitmap), fields(w = bitmap.width(), h = bitmap.height()))]
pub fn blur_bitmap(bitmap: &Bitmap, radius: u32, passes: u32) -> BackdropResult<Bitmap> {
    if radius == 0 || passes == 0 {
        return Ok(bitmap.clone());
    }
    let mut premul = bitmap.data().to_vec();
    premultiply_rgba8_in_place(&mut premul);
    let mut out = box_blur_rgba8_premul(&premul, bitmap.width(), bitmap.height(), radius, passes)?;
    unpremultiply_rgba8_in_place(&mut out);
    Bitmap::new(bitmap.width(), bitmap.height(), out)
}

fn horizontal_pass(src: &[u8], width: u32, radius: u32) -> Vec<u8> {
    let row_len = width as usize * 4;
    let mut dst = vec![0u8; src.len()];
    dst.par_chunks_mut(row_len)
        .zip(src.par_chunks(row_len))
        .for_each(|(d, s)| blur_row(s, d, width as i64, i64::from(radius)));
    dst
}

fn blur_row(src: &[u8], dst: &mut [u8], w: i64, r: i64) {
    let n = (2 * r + 1) as u32;
    let at = |x: i64| (x.clamp(0, w - 1) as usize) * 4;

    let mut acc = [0u32; 4];
    for k in -r..=r {
        let idx = at(k);
        for c in 0..4 {
            acc[c] += u32::from(src[idx + c]);
        }
    }

    for x in 0..w {
        let out_idx = (x as usize) * 4;
        for c in 0..4 {
            dst[out_idx + c] = ((acc[c] + n / 2) / n).min(255) as u8;
        }
        let add = at(x + r + 1);
        let sub = at(x - r);
        for c in 0..4 {
            acc[c] = acc[c] + u32::from(src[add + c]) - u32::from(src[sub + c]);
        }
    }
}

/// `w x h` pixels in, `h x w` pixels out.
fn transpose(src: &[u8], width: u32, height: u32) -> Vec<u8> {
    let (w, h) = (width as usize, height as usize);
    let mut out = vec![0u8; src.len()];
    out.par_chunks_mut(h * 4).enumerate().for_each(|(x, col)| {
        for y in 0..h {
            let s = (y * w + x) * 4;
            col[y * 4..y * 4 + 4].copy_from_slice(&src[s..s + 4]);
        }
    });
    out
}
