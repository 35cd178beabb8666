use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::Rng;
use serde::Serialize;
use tone_engine::buffer::{normalize, to_8bit};
use tone_engine::{dither, draw, histogram};
use tone_engine::{ColorMode, DitherAlgorithm, Image, PixelBuffer, Point};

use crate::error::AppError;
use crate::formats::{self, ImageFormat};
use crate::models::AppConfig;

/// An input file turned into the first node of a gamma family.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub path: PathBuf,
    pub format: ImageFormat,
    /// Largest sample value of the source file.
    pub max_value: u32,
    pub image: Arc<Image>,
}

/// Summary printed by `info`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageInfo {
    pub path: String,
    pub format: ImageFormat,
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub max_value: u32,
    pub gamma: f64,
    pub color_mode: String,
}

/// Gamma handling applied before a view is taken.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GammaOptions {
    /// Relabel the samples as encoded at this gamma without resampling.
    pub assign: Option<f64>,
    /// Resample to this gamma; the output is written at it.
    pub convert: Option<f64>,
}

/// One view of a cached image: converted to `display_gamma`, fetched in
/// `mode`, optionally narrowed to one channel (1-based), still unclamped.
pub fn view(
    image: &Arc<Image>,
    mode: ColorMode,
    channel: Option<usize>,
    display_gamma: f64,
) -> Result<PixelBuffer<f64>, AppError> {
    let buffer = image.convert_gamma(display_gamma).get(mode);
    match channel {
        None => Ok((*buffer).clone()),
        Some(c) if (1..=buffer.channels()).contains(&c) => Ok(buffer.channel(c - 1)),
        Some(c) => Err(AppError::InvalidArgument(format!(
            "channel {c} out of range for a {}-channel view",
            buffer.channels()
        ))),
    }
}

/// [`view`] clamped and quantized to 8 bits, ready to be shown or saved.
pub fn render_view(
    image: &Arc<Image>,
    mode: ColorMode,
    channel: Option<usize>,
    display_gamma: f64,
) -> Result<PixelBuffer<u8>, AppError> {
    Ok(to_8bit(&view(image, mode, channel, display_gamma)?))
}

/// Write 8-bit samples as PNG (with a gamma chunk) or PNM, chosen by the
/// extension of `path`.
pub fn save(path: &Path, pixels: &PixelBuffer<u8>, gamma: f64) -> Result<(), AppError> {
    formats::write(path, pixels, gamma)?;
    tracing::info!(
        path = %path.display(),
        width = pixels.width(),
        height = pixels.height(),
        gamma,
        "Saved image"
    );
    Ok(())
}

fn clamp_unit(buffer: &PixelBuffer<f64>) -> PixelBuffer<f64> {
    buffer.map(|v| v.clamp(0.0, 1.0))
}

/// Processing pipeline behind the CLI commands
pub struct ImagePipeline {
    config: Arc<AppConfig>,
}

impl ImagePipeline {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Read `path` and interpret its samples as `source_mode`.
    ///
    /// PNG files bring their own gamma; PNM files get `default_gamma`.
    pub fn load(&self, path: &Path, source_mode: ColorMode) -> Result<LoadedImage, AppError> {
        let raw = formats::read(path)?;
        if source_mode != ColorMode::Rgb && !raw.samples.is_color() {
            return Err(AppError::InvalidArgument(format!(
                "{source_mode} input needs three channels, {} has one",
                path.display()
            )));
        }
        let gamma = raw.gamma.unwrap_or(self.config.default_gamma);
        let image = Image::new(normalize(&raw.samples, raw.max_value), source_mode, gamma);

        tracing::info!(
            path = %path.display(),
            format = %raw.format,
            width = raw.samples.width(),
            height = raw.samples.height(),
            channels = raw.samples.channels(),
            gamma,
            "Loaded image"
        );

        Ok(LoadedImage {
            path: path.to_path_buf(),
            format: raw.format,
            max_value: raw.max_value,
            image,
        })
    }

    pub fn info(&self, loaded: &LoadedImage) -> ImageInfo {
        let mode = loaded.image.canonical_mode();
        let buffer = loaded.image.get(mode);
        ImageInfo {
            path: loaded.path.display().to_string(),
            format: loaded.format,
            width: buffer.width(),
            height: buffer.height(),
            channels: buffer.channels(),
            max_value: loaded.max_value,
            gamma: loaded.image.gamma(),
            color_mode: mode.to_string(),
        }
    }

    /// Apply gamma options and render one view.
    ///
    /// Returns the pixels and the gamma they are encoded at.
    pub fn convert(
        &self,
        image: &Arc<Image>,
        mode: ColorMode,
        channel: Option<usize>,
        gamma: GammaOptions,
    ) -> Result<(PixelBuffer<u8>, f64), AppError> {
        for value in [gamma.assign, gamma.convert].into_iter().flatten() {
            if !(value.is_finite() && value > 0.0) {
                return Err(AppError::InvalidArgument(format!(
                    "gamma must be positive, got {value}"
                )));
            }
        }
        if let Some(assign) = gamma.assign {
            image.reassign_gamma(assign);
        }
        let output_gamma = gamma.convert.unwrap_or(self.config.display_gamma);
        tracing::info!(%mode, ?channel, gamma = output_gamma, "Converting");
        let pixels = render_view(image, mode, channel, output_gamma)?;
        Ok((pixels, output_gamma))
    }

    /// Dither the display view in `mode` to `bits` per channel.
    pub fn dither<R: Rng>(
        &self,
        image: &Arc<Image>,
        mode: ColorMode,
        algorithm: DitherAlgorithm,
        bits: u8,
        rng: &mut R,
    ) -> Result<PixelBuffer<u8>, AppError> {
        let source = clamp_unit(&view(image, mode, None, self.config.display_gamma)?);
        tracing::info!(%mode, %algorithm, bits, "Dithering");
        let dithered = dither::dither_with_rng(&source, bits, algorithm, rng)?;
        Ok(to_8bit(&dithered))
    }

    /// Histogram graph of the display view.
    pub fn histogram(
        &self,
        image: &Arc<Image>,
        mode: ColorMode,
        channel: Option<usize>,
    ) -> Result<PixelBuffer<u8>, AppError> {
        let source = view(image, mode, channel, self.config.display_gamma)?;
        tracing::info!(%mode, ?channel, "Building histogram");
        Ok(to_8bit(&histogram::histogram(&source)))
    }

    /// Stretch the RGB display view so the kept pixels span [0, 1].
    pub fn level(&self, image: &Arc<Image>, ignore_fraction: f64) -> Result<PixelBuffer<u8>, AppError> {
        if !(0.0..=0.5).contains(&ignore_fraction) {
            return Err(AppError::InvalidArgument(format!(
                "ignore fraction must be in [0, 0.5], got {ignore_fraction}"
            )));
        }
        let source = view(image, ColorMode::Rgb, None, self.config.display_gamma)?;
        tracing::info!(ignore_fraction, "Auto-leveling");
        Ok(to_8bit(&histogram::auto_correct(&source, ignore_fraction)))
    }

    /// Blend an anti-aliased line over the RGB display view.
    pub fn annotate(
        &self,
        image: &Arc<Image>,
        from: Point,
        to: Point,
        width: f64,
        color: [f64; 3],
    ) -> Result<PixelBuffer<u8>, AppError> {
        if !(width.is_finite() && width >= 0.0) {
            return Err(AppError::InvalidArgument(format!(
                "line width must be non-negative, got {width}"
            )));
        }
        let source = view(image, ColorMode::Rgb, None, self.config.display_gamma)?;
        tracing::info!(?from, ?to, width, ?color, "Drawing line");
        let coverage = draw::draw_line(source.width(), source.height(), from, to, width);
        Ok(to_8bit(&draw::overlay(&source, &coverage, color)?))
    }

    /// Save at the configured display gamma.
    pub fn save(&self, path: &Path, pixels: &PixelBuffer<u8>) -> Result<(), AppError> {
        save(path, pixels, self.config.display_gamma)
    }
}
