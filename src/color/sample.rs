use image::imageops;
use serde::{Deserialize, Serialize};

use crate::foundation::core::{Bitmap, Color};
use crate::foundation::error::{BackdropError, BackdropResult};

/// How a bitmap is reduced to a single dominant color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SampleStrategy {
    /// Area-average the whole bitmap down to one pixel.
    Downscale,
    /// Average every `step`-th pixel on both axes.
    Stride { step: u32 },
}

impl Default for SampleStrategy {
    fn default() -> Self {
        Self::Stride { step: 10 }
    }
}

pub fn sample(bitmap: &Bitmap, strategy: SampleStrategy) -> BackdropResult<Color> {
    let (w, h) = (bitmap.width(), bitmap.height());
    if w == 0 || h == 0 {
        return Err(BackdropError::invalid_bitmap(format!(
            "cannot sample a {w}x{h} bitmap"
        )));
    }

    match strategy {
        SampleStrategy::Downscale => {
            let one = imageops::thumbnail(&bitmap.as_image_view()?, 1, 1);
            Ok(Color::from_array(one.get_pixel(0, 0).0))
        }
        SampleStrategy::Stride { step } => {
            if step == 0 {
                return Err(BackdropError::invalid_config("sample stride must be >= 1"));
            }
            let step = if w < step || h < step { 1 } else { step };
            Ok(stride_average(bitmap, step))
        }
    }
}

fn stride_average(bitmap: &Bitmap, step: u32) -> Color {
    let mut sum = [0u64; 4];
    let mut count = 0u64;
    for y in (0..bitmap.height()).step_by(step as usize) {
        for x in (0..bitmap.width()).step_by(step as usize) {
            if let Some(px) = bitmap.pixel(x, y) {
                for (acc, v) in sum.iter_mut().zip(px.to_array()) {
                    *acc += u64::from(v);
                }
                count += 1;
            }
        }
    }

    let avg = |total: u64| ((total + count / 2) / count.max(1)).min(255) as u8;
    Color::rgba(avg(sum[0]), avg(sum[1]), avg(sum[2]), avg(sum[3]))
}
