use crate::codec::{decode, encode};
use crate::config::PipelineConfig;
use crate::foundation::core::Bitmap;
use crate::foundation::error::BackdropResult;
use crate::render::background::{resolve_tint, synthesize_with_tint};
use crate::render::compose::{place_centered, scale_to_fit};

/// Pipeline stages in execution order. A failing stage aborts the whole run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Decoded,
    Sampled,
    BackgroundBuilt,
    Scaled,
    Composited,
    Encoded,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Decoded => "decoded",
            Self::Sampled => "sampled",
            Self::BackgroundBuilt => "background_built",
            Self::Scaled => "scaled",
            Self::Composited => "composited",
            Self::Encoded => "encoded",
        }
    }
}

/// Turn raw image bytes into the encoded poster composite.
///
/// Pipeline:
/// 1. [`render`] (decode, tint, background, scale, composite)
/// 2. [`encode`](crate::codec::encode) with `config.format` / `config.quality`
///
/// Either every stage succeeds or the first stage error is returned unchanged.
#[tracing::instrument(
    skip(bytes, config),
    fields(input_bytes = bytes.len(), target_w = config.width, target_h = config.height)
)]
pub fn process(bytes: &[u8], config: &PipelineConfig) -> BackdropResult<Vec<u8>> {
    let composite = render(bytes, config)?;
    let out = encode(&composite, config.format, config.quality)?;
    tracing::debug!(
        stage = Stage::Encoded.as_str(),
        format = config.format.extension(),
        output_bytes = out.len()
    );
    Ok(out)
}

/// Every stage of [`process`] except encoding; returns the composite pixels.
#[tracing::instrument(skip(bytes, config), fields(input_bytes = bytes.len()))]
pub fn render(bytes: &[u8], config: &PipelineConfig) -> BackdropResult<Bitmap> {
    config.validate()?;

    let source = decode(bytes, &config.limits)?;
    tracing::debug!(
        stage = Stage::Decoded.as_str(),
        w = source.width(),
        h = source.height()
    );

    let tint = resolve_tint(&source, config)?;
    tracing::debug!(stage = Stage::Sampled.as_str(), tint = %tint.to_hex());

    let background = synthesize_with_tint(&source, config.width, config.height, tint, config)?;
    tracing::debug!(
        stage = Stage::BackgroundBuilt.as_str(),
        w = background.width(),
        h = background.height()
    );

    let scaled = scale_to_fit(&source, background.size(), config.scale)?;
    drop(source);
    tracing::debug!(
        stage = Stage::Scaled.as_str(),
        w = scaled.width(),
        h = scaled.height()
    );

    let (composite, placed) = place_centered(background, &scaled);
    tracing::debug!(
        stage = Stage::Composited.as_str(),
        x = placed.origin.x,
        y = placed.origin.y
    );
    Ok(composite)
}
