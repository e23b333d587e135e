use serde::{Deserialize, Serialize};

use crate::codec::{DecodeLimits, OutputFormat};
use crate::color::mix::{AlphaMode, DEFAULT_MIX_WEIGHT};
use crate::color::sample::SampleStrategy;
use crate::effects::blend::BlendMode;
use crate::foundation::error::{BackdropError, BackdropResult};
use crate::render::background::{BackgroundLook, TintSource};
use crate::render::compose::ScalePolicy;

pub const MAX_CANVAS_DIMENSION: u32 = 16_384;
pub const MAX_BLUR_RADIUS: u32 = 512;
pub const MAX_BLUR_PASSES: u32 = 8;
/// Partial strength, so the tint still reads through the blurred layer.
pub const DEFAULT_OVERLAY_OPACITY: f32 = 0.3;

/// Everything one pipeline invocation needs besides the input bytes.
///
/// Every field has a default, so `{}` is a valid JSON config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub width: u32,
    pub height: u32,
    pub blur_radius: u32,
    pub blur_passes: u32,
    pub look: BackgroundLook,
    pub blend: BlendMode,
    pub tint: TintSource,
    /// Strength of the blurred layer over the tint (overlay look) or of the tint
    /// gradient over the blurred layer (gradient look).
    pub overlay_opacity: f32,
    pub mix_weight: f32,
    pub alpha_mode: AlphaMode,
    pub sample: SampleStrategy,
    pub scale: ScalePolicy,
    pub format: OutputFormat,
    pub quality: u8,
    pub limits: DecodeLimits,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 700,
            blur_radius: 35,
            blur_passes: 3,
            look: BackgroundLook::default(),
            blend: BlendMode::default(),
            tint: TintSource::default(),
            overlay_opacity: DEFAULT_OVERLAY_OPACITY,
            mix_weight: DEFAULT_MIX_WEIGHT,
            alpha_mode: AlphaMode::default(),
            sample: SampleStrategy::default(),
            scale: ScalePolicy::default(),
            format: OutputFormat::default(),
            quality: 85,
            limits: DecodeLimits::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(s: &str) -> BackdropResult<Self> {
        let config: Self = serde_json::from_str(s)
            .map_err(|e| BackdropError::invalid_config(format!("parse config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> BackdropResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(BackdropError::invalid_dimensions(format!(
                "target canvas must be non-empty (got {}x{})",
                self.width, self.height
            )));
        }
        if self.width > MAX_CANVAS_DIMENSION || self.height > MAX_CANVAS_DIMENSION {
            return Err(BackdropError::invalid_dimensions(format!(
                "target canvas {}x{} exceeds {MAX_CANVAS_DIMENSION} px per side",
                self.width, self.height
            )));
        }
        if self.blur_radius > MAX_BLUR_RADIUS {
            return Err(BackdropError::invalid_config(format!(
                "blur_radius must be <= {MAX_BLUR_RADIUS}"
            )));
        }
        if self.blur_passes > MAX_BLUR_PASSES {
            return Err(BackdropError::invalid_config(format!(
                "blur_passes must be <= {MAX_BLUR_PASSES}"
            )));
        }
        unit_interval("overlay_opacity", self.overlay_opacity)?;
        unit_interval("mix_weight", self.mix_weight)?;
        if self.quality > 100 {
            return Err(BackdropError::invalid_config("quality must be in 0..=100"));
        }
        if let SampleStrategy::Stride { step } = self.sample
            && step == 0
        {
            return Err(BackdropError::invalid_config("sample stride must be >= 1"));
        }
        if let ScalePolicy::Fraction { fraction } = self.scale
            && !(fraction.is_finite() && fraction > 0.0 && fraction <= 1.0)
        {
            return Err(BackdropError::invalid_config(
                "scale fraction must be in (0, 1]",
            ));
        }
        Ok(())
    }
}

fn unit_interval(name: &str, v: f32) -> BackdropResult<()> {
    if !(0.0..=1.0).contains(&v) {
        return Err(BackdropError::invalid_config(format!(
            "{name} must be in [0, 1] (got {v})"
        )));
    }
    Ok(())
}
