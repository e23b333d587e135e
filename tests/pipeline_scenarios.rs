use backdrop::{
    BackdropError, BackgroundLook, Bitmap, Color, DecodeLimits, ErrorKind, OutputFormat,
    PipelineConfig, TintSource, compose, decode, encode, process, render, synthesize,
};

const RED: [u8; 4] = [255, 0, 0, 255];

fn png(bmp: &Bitmap) -> Vec<u8> {
    encode(bmp, OutputFormat::Png, 100).unwrap()
}

fn small_config() -> PipelineConfig {
    PipelineConfig {
        width: 64,
        height: 48,
        blur_radius: 4,
        ..PipelineConfig::default()
    }
}

#[test]
fn wide_red_image_lands_centered_over_a_derived_border() {
    let src = Bitmap::filled(2000, 1000, Color::rgb(255, 0, 0)).unwrap();
    let out = render(&png(&src), &PipelineConfig::default()).unwrap();
    assert_eq!((out.width(), out.height()), (1000, 700));

    let w = out.width() as usize;
    for (i, px) in out.data().chunks_exact(4).enumerate() {
        let y = i / w;
        if (100..600).contains(&y) {
            assert_eq!(px, RED, "inside pixel {i} (row {y})");
        } else {
            assert_ne!(px, RED, "border pixel {i} (row {y}) is raw red");
        }
    }
}

#[test]
fn single_pixel_input_fills_the_configured_canvas() {
    let src = Bitmap::filled(1, 1, Color::rgb(0x33, 0x66, 0x99)).unwrap();
    let bytes = png(&src);

    let composite = render(&bytes, &PipelineConfig::default()).unwrap();
    assert_eq!((composite.width(), composite.height()), (1000, 700));
    // 1x1 scales to 700x700 at x = 150.
    assert_eq!(composite.pixel(150, 0), Some(Color::rgb(0x33, 0x66, 0x99)));
    assert_eq!(composite.pixel(849, 699), Some(Color::rgb(0x33, 0x66, 0x99)));
    assert_ne!(composite.pixel(149, 350), Some(Color::rgb(0x33, 0x66, 0x99)));

    let jpeg = process(&bytes, &PipelineConfig::default()).unwrap();
    let back = decode(&jpeg, &DecodeLimits::default()).unwrap();
    assert_eq!((back.width(), back.height()), (1000, 700));
}

#[test]
fn empty_bytes_are_a_decode_error() {
    let err = process(&[], &PipelineConfig::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[test]
fn zero_target_is_invalid_dimensions_before_decoding() {
    let config = PipelineConfig {
        width: 0,
        height: 0,
        ..PipelineConfig::default()
    };
    let err = process(&[], &config).unwrap_err();
    assert!(matches!(err, BackdropError::InvalidDimensions(_)));
}

#[test]
fn compose_output_always_matches_background() {
    let config = small_config();
    for (sw, sh) in [(1, 1), (3, 100), (100, 3), (64, 48), (500, 499)] {
        let src = Bitmap::filled(sw, sh, Color::rgb(10, 20, 30)).unwrap();
        for (bw, bh) in [(1, 1), (64, 48), (7, 300)] {
            let bg = synthesize(&src, bw, bh, &config).unwrap();
            let out = compose(&src, bg, &config).unwrap();
            assert_eq!((out.width(), out.height()), (bw, bh), "{sw}x{sh} into {bw}x{bh}");
        }
    }
}

#[test]
fn output_is_deterministic() {
    let mut src = Bitmap::filled(37, 23, Color::rgb(0, 80, 160)).unwrap();
    for x in 0..37 {
        src.put_pixel(x, x % 23, Color::rgb(250, 250, 0));
    }
    let bytes = png(&src);
    let config = PipelineConfig {
        tint: TintSource::Derived,
        ..small_config()
    };
    assert_eq!(
        process(&bytes, &config).unwrap(),
        process(&bytes, &config).unwrap()
    );
}

#[test]
fn transparent_input_still_yields_an_opaque_poster() {
    let mut src = Bitmap::filled(10, 10, Color::rgba(0, 0, 0, 0)).unwrap();
    src.put_pixel(5, 5, Color::rgb(0, 255, 0));
    for look in [BackgroundLook::Overlay, BackgroundLook::Gradient] {
        let config = PipelineConfig {
            look,
            ..small_config()
        };
        let out = render(&png(&src), &config).unwrap();
        assert!(out.is_opaque(), "{look:?}");
    }
}

#[test]
fn gradient_look_with_derived_tint_runs_end_to_end() {
    let src = Bitmap::filled(30, 60, Color::rgb(40, 120, 200)).unwrap();
    let config = PipelineConfig {
        look: BackgroundLook::Gradient,
        tint: TintSource::Derived,
        format: OutputFormat::Png,
        ..small_config()
    };
    let out = process(&png(&src), &config).unwrap();
    let back = decode(&out, &DecodeLimits::default()).unwrap();
    assert_eq!((back.width(), back.height()), (64, 48));
    // Uniform source: derived tint equals the image color, so the whole canvas does too.
    assert!(
        back.data()
            .chunks_exact(4)
            .all(|px| px == [40, 120, 200, 255])
    );
}

#[test]
fn oversized_input_is_rejected_by_limits() {
    let src = Bitmap::filled(50, 50, Color::WHITE).unwrap();
    let config = PipelineConfig {
        limits: DecodeLimits {
            max_pixels: 2_000,
            ..DecodeLimits::default()
        },
        ..small_config()
    };
    let err = process(&png(&src), &config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}
