use serde::Deserialize;
use std::path::Path;
use tone_engine::{ColorMode, DitherAlgorithm};

use crate::error::AppError;

/// Application configuration loaded from a YAML file
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Gamma that views are converted to before rendering or saving
    pub display_gamma: f64,

    /// Gamma assigned to inputs that carry none (PNM)
    pub default_gamma: f64,

    /// Color mode used when none is given on the command line
    pub color_mode: String,

    pub dither: DitherConfig,

    pub leveling: LevelingConfig,

    pub annotation: AnnotationConfig,
}

/// Defaults for the `dither` command
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DitherConfig {
    /// One of ordered, random_sync, random_nosync, floyd, atkinson
    pub algorithm: String,

    /// Output bit depth per channel (1..=8)
    pub bits: u8,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LevelingConfig {
    /// Fraction of darkest and brightest pixels ignored on each end
    pub ignore_fraction: f64,
}

/// Defaults for the `line` command
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AnnotationConfig {
    /// Full stroke width in pixels
    pub width: f64,

    /// RGB color in [0, 1]
    pub color: [f64; 3],
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            display_gamma: 2.2,
            default_gamma: 2.2,
            color_mode: "rgb".to_string(),
            dither: DitherConfig::default(),
            leveling: LevelingConfig::default(),
            annotation: AnnotationConfig::default(),
        }
    }
}

impl Default for DitherConfig {
    fn default() -> Self {
        Self {
            algorithm: "floyd".to_string(),
            bits: 1,
        }
    }
}

impl Default for LevelingConfig {
    fn default() -> Self {
        Self {
            ignore_fraction: 0.01,
        }
    }
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            width: 1.0,
            color: [1.0, 1.0, 1.0],
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, falling back to defaults.
    ///
    /// A missing or unparsable file is logged and replaced by the defaults;
    /// values that parse but are out of range are an error.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let config = match std::fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str::<Self>(&content) {
                Ok(config) => {
                    tracing::info!(path = %path.display(), "Loaded configuration");
                    config
                }
                Err(e) => {
                    tracing::warn!(%e, path = %path.display(), "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(%e, path = %path.display(), "Failed to read config, using defaults");
                Self::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, AppError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| AppError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.color_mode()?;
        self.dither_algorithm()?;
        for (name, gamma) in [
            ("display_gamma", self.display_gamma),
            ("default_gamma", self.default_gamma),
        ] {
            if !(gamma.is_finite() && gamma > 0.0) {
                return Err(AppError::Config(format!("{name} must be positive, got {gamma}")));
            }
        }
        if !(1..=8).contains(&self.dither.bits) {
            return Err(AppError::Config(format!(
                "dither.bits must be between 1 and 8, got {}",
                self.dither.bits
            )));
        }
        if !(0.0..=0.5).contains(&self.leveling.ignore_fraction) {
            return Err(AppError::Config(format!(
                "leveling.ignore_fraction must be in [0, 0.5], got {}",
                self.leveling.ignore_fraction
            )));
        }
        if !(self.annotation.width.is_finite() && self.annotation.width >= 0.0) {
            return Err(AppError::Config(format!(
                "annotation.width must be non-negative, got {}",
                self.annotation.width
            )));
        }
        if self.annotation.color.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(AppError::Config(format!(
                "annotation.color components must be in [0, 1], got {:?}",
                self.annotation.color
            )));
        }
        Ok(())
    }

    pub fn color_mode(&self) -> Result<ColorMode, AppError> {
        self.color_mode
            .parse()
            .map_err(|e| AppError::Config(format!("color_mode: {e}")))
    }

    pub fn dither_algorithm(&self) -> Result<DitherAlgorithm, AppError> {
        self.dither
            .algorithm
            .parse()
            .map_err(|e| AppError::Config(format!("dither.algorithm: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.display_gamma, 2.2);
        assert_eq!(config.default_gamma, 2.2);
        assert_eq!(config.color_mode().unwrap(), ColorMode::Rgb);
        assert_eq!(config.dither_algorithm().unwrap(), DitherAlgorithm::FloydSteinberg);
        assert_eq!(config.dither.bits, 1);
        assert_eq!(config.leveling.ignore_fraction, 0.01);
        assert_eq!(config.annotation.width, 1.0);
        assert_eq!(config.annotation.color, [1.0, 1.0, 1.0]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
display_gamma: 1.8
color_mode: ycbcr709
dither:
  algorithm: atkinson
  bits: 2
annotation:
  color: [1.0, 0.0, 0.0]
"#;

        let config = AppConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.display_gamma, 1.8);
        assert_eq!(config.default_gamma, 2.2);
        assert_eq!(config.color_mode().unwrap(), ColorMode::YCbCr709);
        assert_eq!(config.dither_algorithm().unwrap(), DitherAlgorithm::Atkinson);
        assert_eq!(config.dither.bits, 2);
        assert_eq!(config.leveling, LevelingConfig::default());
        assert_eq!(config.annotation.width, 1.0);
        assert_eq!(config.annotation.color, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(AppConfig::from_yaml("{}").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_rejects_unknown_mode() {
        let err = AppConfig::from_yaml("color_mode: lab").unwrap_err();
        assert!(matches!(err, AppError::Config(ref m) if m.starts_with("color_mode")));
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        for yaml in [
            "display_gamma: 0",
            "default_gamma: -1.0",
            "dither: {bits: 9}",
            "dither: {bits: 0}",
            "dither: {algorithm: blue_noise}",
            "leveling: {ignore_fraction: 0.6}",
            "annotation: {width: -2}",
            "annotation: {color: [2.0, 0.0, 0.0]}",
        ] {
            assert!(
                matches!(AppConfig::from_yaml(yaml), Err(AppError::Config(_))),
                "{yaml} should be rejected"
            );
        }
    }

    #[test]
    fn test_load_without_path_is_default() {
        assert_eq!(AppConfig::load(None).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let config = AppConfig::load(Some(Path::new("/nonexistent/tonekit.yaml"))).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_unparsable_file_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "display_gamma: [not, a, number").unwrap();
        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "dither:\n  bits: 12").unwrap();
        assert!(matches!(
            AppConfig::load(Some(file.path())),
            Err(AppError::Config(_))
        ));
    }
}
