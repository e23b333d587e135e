use image::imageops::{self, FilterType};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::color::mix::mix;
use crate::color::sample::sample;
use crate::config::PipelineConfig;
use crate::effects::blend::blend_pixel;
use crate::effects::blur::blur_bitmap;
use crate::effects::composite::{draw_over, over};
use crate::foundation::core::{Bitmap, Color, Point};
use crate::foundation::error::{BackdropError, BackdropResult};

/// Default backdrop tint, a warm orange.
pub const DEFAULT_TINT: Color = Color::rgb(0xf0, 0x95, 0x34);

/// Where the background tint comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TintSource {
    Fixed(Color),
    /// Mix of the source's dominant color and that of its 180-degree rotation.
    Derived,
}

impl Default for TintSource {
    fn default() -> Self {
        Self::Fixed(DEFAULT_TINT)
    }
}

impl Serialize for TintSource {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Fixed(c) => serializer.serialize_str(&c.to_hex()),
            Self::Derived => serializer.serialize_str("derive"),
        }
    }
}

impl<'de> Deserialize<'de> for TintSource {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl std::str::FromStr for TintSource {
    type Err = BackdropError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "derive" | "derived" | "auto" => Ok(Self::Derived),
            other => Color::from_hex(other).map(Self::Fixed),
        }
    }
}

/// How the blurred layer and the tint are combined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundLook {
    /// Tint canvas with the blurred image blended onto it.
    #[default]
    Overlay,
    /// Blurred image under a tint gradient fading from opaque (top) to clear (bottom).
    Gradient,
}

pub fn resolve_tint(source: &Bitmap, config: &PipelineConfig) -> BackdropResult<Color> {
    match config.tint {
        TintSource::Fixed(c) => Ok(c),
        TintSource::Derived => {
            let upright = sample(source, config.sample)?;
            let flipped = sample(&source.rotated_180(), config.sample)?;
            Ok(mix(upright, flipped, config.mix_weight, config.alpha_mode))
        }
    }
}

pub fn synthesize(
    source: &Bitmap,
    target_width: u32,
    target_height: u32,
    config: &PipelineConfig,
) -> BackdropResult<Bitmap> {
    let tint = resolve_tint(source, config)?;
    synthesize_with_tint(source, target_width, target_height, tint, config)
}

/// Build an opaque `target_width x target_height` background from `source`.
///
/// The source is stretched to the target (aspect is not kept), blurred, and combined
/// with `tint` according to `config.look`.
pub fn synthesize_with_tint(
    source: &Bitmap,
    target_width: u32,
    target_height: u32,
    tint: Color,
    config: &PipelineConfig,
) -> BackdropResult<Bitmap> {
    if source.size().is_empty() {
        return Err(BackdropError::invalid_bitmap("background source is empty"));
    }
    if target_width == 0 || target_height == 0 {
        return Err(BackdropError::invalid_dimensions(format!(
            "background target must be non-empty (got {target_width}x{target_height})"
        )));
    }

    let stretched = stretch(source, target_width, target_height)?;
    let blurred = blur_bitmap(&stretched, config.blur_radius, config.blur_passes)?;

    match config.look {
        BackgroundLook::Overlay => overlay_look(&blurred, tint, config),
        BackgroundLook::Gradient => gradient_look(&blurred, tint, config.overlay_opacity),
    }
}

fn stretch(source: &Bitmap, width: u32, height: u32) -> BackdropResult<Bitmap> {
    if source.width() == width && source.height() == height {
        return Ok(source.clone());
    }
    let resized = imageops::resize(
        &source.as_image_view()?,
        width,
        height,
        FilterType::Triangle,
    );
    Bitmap::from_rgba_image(resized)
}

fn overlay_look(blurred: &Bitmap, tint: Color, config: &PipelineConfig) -> BackdropResult<Bitmap> {
    let base = tint.opaque().to_array();
    let mut out = Bitmap::filled(blurred.width(), blurred.height(), tint.opaque())?;
    out.data_mut()
        .par_chunks_exact_mut(4)
        .zip(blurred.data().par_chunks_exact(4))
        .for_each(|(d, s)| {
            let px = blend_pixel(
                config.blend,
                base,
                [s[0], s[1], s[2], s[3]],
                config.overlay_opacity,
            );
            d.copy_from_slice(&px);
        });
    Ok(out)
}

fn gradient_look(blurred: &Bitmap, tint: Color, opacity: f32) -> BackdropResult<Bitmap> {
    let (w, h) = (blurred.width(), blurred.height());
    let mut out = Bitmap::filled(w, h, tint.opaque())?;
    draw_over(&mut out, blurred, Point::default());

    let strength = opacity.clamp(0.0, 1.0) * f32::from(tint.a) / 255.0;
    let row_len = w as usize * 4;
    out.data_mut()
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            let t = if h > 1 {
                y as f32 / (h - 1) as f32
            } else {
                0.0
            };
            let a = ((1.0 - t) * strength * 255.0).round().clamp(0.0, 255.0) as u8;
            let layer = [tint.r, tint.g, tint.b, a];
            for px in row.chunks_exact_mut(4) {
                let blended = over([px[0], px[1], px[2], px[3]], layer, 1.0);
                px.copy_from_slice(&blended);
            }
        });
    Ok(out)
}
