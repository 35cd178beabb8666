pub mod config;

pub use config::{AnnotationConfig, AppConfig, DitherConfig, LevelingConfig};
