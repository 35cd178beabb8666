//! Pipeline tests: load, view, process and save through real files.

mod common;

use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tone_engine::{ColorMode, DitherAlgorithm, Point};

use common::{fixtures, TestWorkspace};
use tonekit::error::AppError;
use tonekit::formats::ImageFormat;
use tonekit::services::{self, GammaOptions};

#[test]
fn test_info_for_plain_gray_map() {
    let ws = TestWorkspace::new();
    let path = ws.write_bytes("ramp.pgm", fixtures::PLAIN_GRAY);

    let loaded = ws.pipeline.load(&path, ColorMode::Rgb).unwrap();
    let info = ws.pipeline.info(&loaded);

    assert_eq!(info.format, ImageFormat::Pnm);
    assert_eq!((info.width, info.height, info.channels), (4, 2, 1));
    assert_eq!(info.max_value, 15);
    assert_eq!(info.gamma, 2.2);
}

#[test]
fn test_png_gamma_is_taken_from_file() {
    let ws = TestWorkspace::new();
    let path = ws.write_png("linear.png", &fixtures::gradient(8, 2), 1.0);

    let loaded = ws.pipeline.load(&path, ColorMode::Rgb).unwrap();

    assert_eq!(loaded.format, ImageFormat::Png);
    assert_eq!(loaded.image.gamma(), 1.0);
}

#[test]
fn test_png_convert_round_trip_is_lossless() {
    let ws = TestWorkspace::new();
    let pixels = fixtures::gradient(16, 4);
    let input = ws.write_png("in.png", &pixels, 2.2);
    let output = ws.path("out.png");

    let loaded = ws.pipeline.load(&input, ColorMode::Rgb).unwrap();
    let (view, gamma) = ws
        .pipeline
        .convert(&loaded.image, ColorMode::Rgb, None, GammaOptions::default())
        .unwrap();
    services::save(&output, &view, gamma).unwrap();

    common::assert_png_file(&output);
    let raw = ws.read(&output);
    assert_eq!(raw.samples, pixels.map(u16::from));
    assert_eq!(raw.gamma, Some(2.2));
}

#[test]
fn test_single_channel_view_saved_as_gray_map() {
    let ws = TestWorkspace::new();
    let input = ws.write_png("in.png", &fixtures::gradient(16, 4), 2.2);
    let output = ws.path("lightness.pgm");

    let loaded = ws.pipeline.load(&input, ColorMode::Rgb).unwrap();
    let (view, gamma) = ws
        .pipeline
        .convert(&loaded.image, ColorMode::Hsl, Some(3), GammaOptions::default())
        .unwrap();
    services::save(&output, &view, gamma).unwrap();

    common::assert_pnm_file(&output, "P5");
    common::assert_shape(&ws.read(&output).samples, 16, 4, 1);
}

#[test]
fn test_pnm_uses_configured_default_gamma() {
    let ws = TestWorkspace::with_yaml(fixtures::CUSTOM_CONFIG);
    let path = ws.write_bytes("ramp.pgm", fixtures::PLAIN_GRAY);

    let loaded = ws.pipeline.load(&path, ColorMode::Rgb).unwrap();
    assert_eq!(loaded.image.gamma(), 1.0);

    // Linear thirds re-encoded for a 2.2 display
    let view = services::render_view(&loaded.image, ColorMode::Rgb, None, 2.2).unwrap();
    assert_eq!(view.as_slice(), &[0, 155, 212, 255, 255, 212, 155, 0]);
}

#[test]
fn test_assign_then_convert_gamma() {
    let ws = TestWorkspace::new();
    let input = ws.write_png("in.png", &fixtures::gradient(8, 2), 2.2);
    let loaded = ws.pipeline.load(&input, ColorMode::Rgb).unwrap();
    let family_before = loaded.image.family();

    let options = GammaOptions {
        assign: Some(1.0),
        convert: Some(1.0),
    };
    let (view, gamma) = ws
        .pipeline
        .convert(&loaded.image, ColorMode::Rgb, None, options)
        .unwrap();

    // Relabeling leaves the samples alone and starts a new family
    assert_eq!(gamma, 1.0);
    assert_eq!(view, fixtures::gradient(8, 2));
    assert!(!Arc::ptr_eq(&family_before, &loaded.image.family()));
}

#[test]
fn test_dither_output_uses_only_quantized_levels() {
    let ws = TestWorkspace::new();
    let input = ws.write_png("in.png", &fixtures::gradient(32, 8), 2.2);
    let output = ws.path("dithered.png");
    let loaded = ws.pipeline.load(&input, ColorMode::Rgb).unwrap();
    let mut rng = StdRng::seed_from_u64(3);

    for algorithm in DitherAlgorithm::ALL {
        let pixels = ws
            .pipeline
            .dither(&loaded.image, ColorMode::Rgb, algorithm, 2, &mut rng)
            .unwrap();
        ws.pipeline.save(&output, &pixels).unwrap();
        common::assert_levels(ws.read(&output).samples.as_slice(), &[0, 85, 170, 255]);
    }
}

#[test]
fn test_seeded_random_dither_is_reproducible() {
    let ws = TestWorkspace::new();
    let input = ws.write_png("in.png", &fixtures::gradient(16, 16), 2.2);
    let loaded = ws.pipeline.load(&input, ColorMode::Rgb).unwrap();

    let run = |seed| {
        let mut rng = StdRng::seed_from_u64(seed);
        ws.pipeline
            .dither(&loaded.image, ColorMode::Rgb, DitherAlgorithm::RandomIndependent, 1, &mut rng)
            .unwrap()
    };

    assert_eq!(run(9), run(9));
}

#[test]
fn test_histogram_of_flat_image() {
    let ws = TestWorkspace::new();
    let input = ws.write_png("flat.png", &fixtures::gray(4, 4, &[128; 16]), 2.2);
    let loaded = ws.pipeline.load(&input, ColorMode::Rgb).unwrap();

    let graph = ws.pipeline.histogram(&loaded.image, ColorMode::Rgb, None).unwrap();

    common::assert_shape(&graph, 256, 256, 1);
    // Every sample lands in bin 128, whose column fills the graph
    for y in 0..256 {
        assert_eq!(graph.pixel(128, y), &[0]);
        assert_eq!(graph.pixel(0, y), &[255]);
    }
}

#[test]
fn test_level_stretches_to_full_range() {
    let ws = TestWorkspace::new();
    let input = ws.write_png("dull.png", &fixtures::gray(4, 1, &[60, 84, 132, 180]), 2.2);
    let loaded = ws.pipeline.load(&input, ColorMode::Rgb).unwrap();

    let leveled = ws.pipeline.level(&loaded.image, 0.0).unwrap();

    assert_eq!(leveled.as_slice(), &[0, 51, 153, 255]);
}

#[test]
fn test_annotation_blends_configured_color() {
    let ws = TestWorkspace::with_yaml(fixtures::CUSTOM_CONFIG);
    let input = ws.write_png("black.png", &fixtures::solid(10, [0, 0, 0]), 2.2);
    let loaded = ws.pipeline.load(&input, ColorMode::Rgb).unwrap();
    let annotation = &ws.config.annotation;

    let pixels = ws
        .pipeline
        .annotate(
            &loaded.image,
            Point::new(0.0, 5.0),
            Point::new(10.0, 5.0),
            annotation.width,
            annotation.color,
        )
        .unwrap();

    assert_eq!(pixels.pixel(5, 4), &[255, 0, 0]);
    assert_eq!(pixels.pixel(5, 5), &[255, 0, 0]);
    assert_eq!(pixels.pixel(5, 0), &[0, 0, 0]);
    assert_eq!(pixels.pixel(5, 9), &[0, 0, 0]);
}

#[test]
fn test_non_rgb_source_mode_needs_color_input() {
    let ws = TestWorkspace::new();
    let path = ws.write_bytes("ramp.pgm", fixtures::PLAIN_GRAY);

    let err = ws.pipeline.load(&path, ColorMode::Hsv).unwrap_err();

    assert!(matches!(err, AppError::InvalidArgument(_)));
}

#[test]
fn test_missing_input_reports_file_open() {
    let ws = TestWorkspace::new();
    let path = ws.path("absent.ppm");

    let err = ws.pipeline.load(&path, ColorMode::Rgb).unwrap_err();

    assert_eq!(err.to_string(), format!("Error opening file {}", path.display()));
}
