//! Separable blend modes on normalized `[0, 1]` channels.
//!
//! `base` is the backdrop and `blend` the layer being applied to it, following the
//! W3C compositing naming (`Cb`, `Cs`).

use serde::{Deserialize, Serialize};

use crate::foundation::math::{u8_to_unit, unit_to_u8};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    #[default]
    Overlay,
    SoftLight,
}

impl BlendMode {
    pub fn apply(self, base: f32, blend: f32) -> f32 {
        match self {
            Self::Overlay => overlay(base, blend),
            Self::SoftLight => soft_light(base, blend),
        }
    }
}

/// `base < 0.5 ? 2*base*blend : 1 - 2*(1-base)*(1-blend)`.
pub fn overlay(base: f32, blend: f32) -> f32 {
    let (b, o) = (base.clamp(0.0, 1.0), blend.clamp(0.0, 1.0));
    if b < 0.5 {
        2.0 * b * o
    } else {
        1.0 - 2.0 * (1.0 - b) * (1.0 - o)
    }
}

pub fn soft_light(base: f32, blend: f32) -> f32 {
    let (b, s) = (base.clamp(0.0, 1.0), blend.clamp(0.0, 1.0));
    if s <= 0.5 {
        b - (1.0 - 2.0 * s) * b * (1.0 - b)
    } else {
        let d = if b <= 0.25 {
            ((16.0 * b - 12.0) * b + 4.0) * b
        } else {
            b.sqrt()
        };
        b + (2.0 * s - 1.0) * (d - b)
    }
}

/// Blend one RGB channel and mix the result back toward `base` by `amount`.
pub fn blend_channel_u8(mode: BlendMode, base: u8, blend: u8, amount: f32) -> u8 {
    let b = u8_to_unit(base);
    let blended = mode.apply(b, u8_to_unit(blend));
    let amount = amount.clamp(0.0, 1.0);
    unit_to_u8(b + (blended - b) * amount)
}

/// Apply `layer` onto the opaque-or-not `base` pixel, weighting by `opacity * layer.a`.
/// The base alpha is kept.
pub fn blend_pixel(mode: BlendMode, base: [u8; 4], layer: [u8; 4], opacity: f32) -> [u8; 4] {
    let amount = opacity.clamp(0.0, 1.0) * u8_to_unit(layer[3]);
    if amount <= 0.0 {
        return base;
    }
    [
        blend_channel_u8(mode, base[0], layer[0], amount),
        blend_channel_u8(mode, base[1], layer[1], amount),
        blend_channel_u8(mode, base[2], layer[2], amount),
        base[3],
    ]
}
