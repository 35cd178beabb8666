//! Scratch workspace for integration tests.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::Arc;

use tempfile::TempDir;
use tone_engine::{codec, PixelBuffer};

use tonekit::formats::{self, RawImage};
use tonekit::models::AppConfig;
use tonekit::services::ImagePipeline;

/// Temporary directory with a pipeline built from a test configuration
pub struct TestWorkspace {
    dir: TempDir,
    pub config: Arc<AppConfig>,
    pub pipeline: ImagePipeline,
}

impl TestWorkspace {
    /// Workspace with the default configuration
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Workspace with a configuration parsed from YAML
    pub fn with_yaml(yaml: &str) -> Self {
        Self::with_config(AppConfig::from_yaml(yaml).expect("valid test config"))
    }

    pub fn with_config(config: AppConfig) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = Arc::new(config);
        let pipeline = ImagePipeline::new(config.clone());
        Self {
            dir,
            config,
            pipeline,
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write raw bytes and return the file's path
    pub fn write_bytes(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, bytes).expect("Failed to write fixture");
        path
    }

    /// Encode `pixels` as PNG with a `gAMA` chunk
    pub fn write_png(&self, name: &str, pixels: &PixelBuffer<u8>, gamma: f64) -> PathBuf {
        let bytes = codec::encode(pixels, gamma).expect("Failed to encode fixture");
        self.write_bytes(name, &bytes)
    }

    /// Read back an output file
    pub fn read(&self, path: &Path) -> RawImage {
        formats::read(path).expect("Failed to read output")
    }

    /// Run the `tonekit` binary inside the workspace directory
    pub fn run_cli(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_tonekit"))
            .args(args)
            .current_dir(self.dir.path())
            .env_remove("CONFIG_FILE")
            .env("RUST_LOG", "warn")
            .output()
            .expect("Failed to run tonekit")
    }
}
