use std::sync::Arc;

use image::RgbImage;
use ort::{
    execution_providers::CPUExecutionProvider,
    session::{
        Session,
        builder::{GraphOptimizationLevel, SessionBuilder},
    },
};
use snafu::ResultExt;

use crate::{
    error::{LayoutError, OrtInitSnafu},
    layout::element::RawDetection,
};

/// Wrapped detection result carrying metadata next to the regions.
#[derive(Debug, Clone, Default)]
pub struct LayoutResponse {
    pub layout: Vec<RawDetection>,
    /// Side lengths of the tensor the model actually consumed.
    pub input_size: Option<(usize, usize)>,
    pub inference_ms: Option<u128>,
}

/// The two return conventions a layout model may follow.
#[derive(Debug, Clone)]
pub enum ModelOutput {
    Response(LayoutResponse),
    Blocks(Vec<RawDetection>),
}

impl ModelOutput {
    pub fn into_layout(self) -> Vec<RawDetection> {
        match self {
            ModelOutput::Response(response) => response.layout,
            ModelOutput::Blocks(blocks) => blocks,
        }
    }
}

/// A pre-trained document layout detector.
///
/// Coordinates of returned regions are pixels of the image passed in.
pub trait LayoutModel: Send + Sync {
    fn name(&self) -> &str;

    /// Primary detection call, may return either output convention.
    fn detect_with_response(&self, image: &RgbImage) -> Result<ModelOutput, LayoutError>;

    /// Plain detection call, used when the primary call fails.
    fn detect(&self, image: &RgbImage) -> Result<Vec<RawDetection>, LayoutError>;
}

pub type SharedModel = Arc<dyn LayoutModel>;

/// One entry of the ordered model candidate list.
pub trait ModelSource: Send + Sync {
    fn name(&self) -> &str;

    fn load(&self) -> Result<SharedModel, LayoutError>;
}

/// common session builder
pub fn session_builder(intra_threads: usize) -> Result<SessionBuilder, LayoutError> {
    let session_builder = Session::builder()
        .context(OrtInitSnafu { stage: "builder" })?
        .with_execution_providers(vec![
            #[cfg(all(feature = "coreml", target_os = "macos"))]
            {
                use ort::execution_providers::CoreMLExecutionProvider;
                use ort::execution_providers::coreml::*;
                CoreMLExecutionProvider::default()
                    .with_model_format(CoreMLModelFormat::MLProgram)
                    .build()
            },
            #[cfg(feature = "cuda")]
            {
                use ort::execution_providers::CUDAExecutionProvider;
                CUDAExecutionProvider::default().build()
            },
            CPUExecutionProvider::default().build(),
        ])
        .context(OrtInitSnafu { stage: "provider" })?
        .with_optimization_level(GraphOptimizationLevel::Level1)
        .context(OrtInitSnafu {
            stage: "optimization",
        })?
        .with_intra_threads(intra_threads)
        .context(OrtInitSnafu {
            stage: "intra-threads",
        })?;

    Ok(session_builder)
}
