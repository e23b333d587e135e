use image::imageops::{self, FilterType};
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::effects::composite::draw_over;
use crate::foundation::core::{Bitmap, Rect, Size};
use crate::foundation::error::{BackdropError, BackdropResult};

/// How large the foreground image is drawn relative to the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalePolicy {
    /// Largest size that fits the canvas.
    #[default]
    Fit,
    /// Largest size that fits `fraction` of the canvas on both axes.
    Fraction { fraction: f32 },
}

/// Aspect-preserving target size for `source` inside `bounds`.
///
/// Each axis is rounded independently and clamped to `[1, bounds]`, so the result never
/// overflows the canvas and `|nw*sh - nh*sw| <= max(sw, sh)`.
pub fn fit_size(source: Size, bounds: Size, policy: ScalePolicy) -> BackdropResult<Size> {
    if source.is_empty() {
        return Err(BackdropError::invalid_bitmap(format!(
            "cannot scale a {}x{} image",
            source.width, source.height
        )));
    }
    if bounds.is_empty() {
        return Err(BackdropError::invalid_dimensions(format!(
            "cannot fit into {}x{}",
            bounds.width, bounds.height
        )));
    }

    let fraction = match policy {
        ScalePolicy::Fit => 1.0,
        ScalePolicy::Fraction { fraction } => {
            if !fraction.is_finite() || fraction <= 0.0 || fraction > 1.0 {
                return Err(BackdropError::invalid_config(
                    "scale fraction must be in (0, 1]",
                ));
            }
            f64::from(fraction)
        }
    };

    let (sw, sh) = (f64::from(source.width), f64::from(source.height));
    let bw = f64::from(bounds.width) * fraction;
    let bh = f64::from(bounds.height) * fraction;
    let scale = (bw / sw).min(bh / sh);

    let axis = |len: f64, max: u32| ((len * scale).round() as u64).clamp(1, u64::from(max)) as u32;
    Ok(Size::new(axis(sw, bounds.width), axis(sh, bounds.height)))
}

/// Resize `source` per `policy` with a bilinear filter.
pub fn scale_to_fit(source: &Bitmap, bounds: Size, policy: ScalePolicy) -> BackdropResult<Bitmap> {
    let size = fit_size(source.size(), bounds, policy)?;
    if size == source.size() {
        return Ok(source.clone());
    }
    let resized = imageops::resize(
        &source.as_image_view()?,
        size.width,
        size.height,
        FilterType::Triangle,
    );
    Bitmap::from_rgba_image(resized)
}

/// Draw `foreground` centered on `background`; returns the canvas and where it landed.
pub fn place_centered(mut background: Bitmap, foreground: &Bitmap) -> (Bitmap, Rect) {
    let rect = Rect::centered(background.size(), foreground.size());
    draw_over(&mut background, foreground, rect.origin);
    (background, rect)
}

/// Scale `source` into `background` and composite it centered.
///
/// The result always has the background's dimensions.
pub fn compose(
    source: &Bitmap,
    background: Bitmap,
    config: &PipelineConfig,
) -> BackdropResult<Bitmap> {
    let scaled = scale_to_fit(source, background.size(), config.scale)?;
    let (out, _) = place_centered(background, &scaled);
    Ok(out)
}
