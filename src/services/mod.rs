pub mod pipeline;

pub use pipeline::{render_view, save, view, GammaOptions, ImageInfo, ImagePipeline, LoadedImage};
