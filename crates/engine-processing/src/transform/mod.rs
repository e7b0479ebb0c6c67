pub mod convert;
pub mod pipeline;
pub mod plugin;

pub use convert::ConvertTransform;
pub use pipeline::{Transform, TransformPipeline};
pub use plugin::{FnPlugin, Plugin, PluginRegistry};
