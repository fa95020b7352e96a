pub mod analysis;
pub mod config;
pub mod consts;
pub mod error;
pub mod inference;
pub mod layout;
pub mod pipeline;
pub mod server;

// Re-export commonly used types
pub use error::LayoutError;
pub use inference::{LayoutModel, ModelLoader, ModelOutput, ModelSource};
pub use pipeline::{Annotator, LayoutPipeline, ParsedLayout, PipelineConfig};
