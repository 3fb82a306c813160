pub mod file;

pub use file::{LoadedPipeline, PipelineFile};
