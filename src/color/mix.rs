use serde::{Deserialize, Serialize};

use crate::foundation::core::Color;

/// How alpha participates when two colors are mixed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlphaMode {
    /// Mix RGB only; the result is fully opaque.
    #[default]
    Ignore,
    /// Mix RGB only; the result keeps the first color's alpha.
    PreserveBase,
    /// Mix alpha with the same weights as RGB.
    Blend,
}

pub const DEFAULT_MIX_WEIGHT: f32 = 0.5;

/// `round(a*weight + b*(1-weight))` per channel. `weight` is clamped to `[0, 1]`.
pub fn mix(a: Color, b: Color, weight: f32, alpha: AlphaMode) -> Color {
    let w = f64::from(weight.clamp(0.0, 1.0));
    let ch = |x: u8, y: u8| {
        (f64::from(x) * w + f64::from(y) * (1.0 - w))
            .round()
            .clamp(0.0, 255.0) as u8
    };

    let out_a = match alpha {
        AlphaMode::Ignore => 255,
        AlphaMode::PreserveBase => a.a,
        AlphaMode::Blend => ch(a.a, b.a),
    };
    Color::rgba(ch(a.r, b.r), ch(a.g, b.g), ch(a.b, b.b), out_a)
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: Color = Color::rgba(240, 149, 52, 200);
    const B: Color = Color::rgba(13, 77, 255, 90);

    #[test]
    fn mixing_with_itself_is_identity() {
        for w in [0.0, 0.1, 0.33, 0.5, 0.9, 1.0] {
            assert_eq!(mix(A, A, w, AlphaMode::Blend), A);
            assert_eq!(mix(A, A, w, AlphaMode::PreserveBase), A);
            assert_eq!(mix(A.opaque(), A.opaque(), w, AlphaMode::Ignore), A.opaque());
        }
    }

    #[test]
    fn equal_weight_is_symmetric() {
        assert_eq!(
            mix(A, B, 0.5, AlphaMode::Ignore),
            mix(B, A, 0.5, AlphaMode::Ignore)
        );
        assert_eq!(
            mix(A, B, 0.5, AlphaMode::Blend),
            mix(B, A, 0.5, AlphaMode::Blend)
        );
    }

    #[test]
    fn weight_endpoints_select_inputs() {
        assert_eq!(mix(A, B, 1.0, AlphaMode::Blend), A);
        assert_eq!(mix(A, B, 0.0, AlphaMode::Blend), B);
    }

    #[test]
    fn alpha_modes() {
        assert_eq!(mix(A, B, 0.5, AlphaMode::Ignore).a, 255);
        assert_eq!(mix(A, B, 0.5, AlphaMode::PreserveBase).a, 200);
        assert_eq!(mix(A, B, 0.5, AlphaMode::Blend).a, 145);
    }

    #[test]
    fn rounds_half_away_from_zero() {
        let c = mix(Color::rgb(0, 0, 0), Color::rgb(1, 3, 255), 0.5, AlphaMode::Ignore);
        assert_eq!(c, Color::rgb(1, 2, 128));
    }
}
