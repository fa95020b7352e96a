pub mod annotate;
pub mod detect;
pub mod filter;
pub mod preprocess;

use std::time::Instant;

use derive_builder::Builder;
use serde::Serialize;
use tracing::*;

pub use annotate::Annotator;

use crate::{
    consts::{CONFIDENCE_THRESHOLD, MAX_DIMENSION},
    error::LayoutError,
    inference::ModelLoader,
    layout::element::LayoutPayload,
};

#[derive(Debug, Clone, Builder)]
#[builder(default, build_fn(validate = "Self::validate"))]
pub struct PipelineConfig {
    /// detections must score strictly above this
    pub threshold: f32,
    /// longest side handed to the model
    pub max_dimension: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold: CONFIDENCE_THRESHOLD,
            max_dimension: MAX_DIMENSION,
        }
    }
}

impl PipelineConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(threshold) = self.threshold {
            if !(0.0..1.0).contains(&threshold) {
                return Err(format!("threshold must be in [0, 1), got {threshold}"));
            }
        }
        if self.max_dimension == Some(0) {
            return Err("max_dimension must be positive".to_string());
        }
        Ok(())
    }
}

/// Result of one layout analysis, shaped like the JSON response body.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedLayout {
    pub layout: Vec<LayoutPayload>,
    /// base64 PNG of the processed image with every kept detection drawn
    pub image_with_layout: String,
    pub element_count: usize,
}

/// Upload bytes in, filtered layout and annotated image out.
///
/// All work is synchronous and CPU bound; async callers should run
/// [`LayoutPipeline::parse`] on a blocking thread.
pub struct LayoutPipeline {
    loader: ModelLoader,
    annotator: Annotator,
    config: PipelineConfig,
}

impl LayoutPipeline {
    pub fn new(loader: ModelLoader, annotator: Annotator, config: PipelineConfig) -> Self {
        Self {
            loader,
            annotator,
            config,
        }
    }

    pub fn loader(&self) -> &ModelLoader {
        &self.loader
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn parse(&self, bytes: &[u8]) -> Result<ParsedLayout, LayoutError> {
        let start = Instant::now();

        // decode first, a bad upload is reported as such even without a model
        let processed = preprocess::preprocess(bytes, self.config.max_dimension)?;
        let decoded = start.elapsed();

        let model = self.loader.get_model()?;
        let detections = detect::detect(model.as_ref(), &processed.image)?;
        let detected = start.elapsed();
        let total = detections.len();

        let detections = filter::filter_and_sort(detections, self.config.threshold);
        let layout = filter::to_payload(&detections);
        let image_with_layout = self.annotator.annotate(&processed.image, &detections)?;

        info!(
            "Layout of {}x{} image: {} of {} regions kept, decode {:?}, detect {:?}, total {:?}",
            processed.width(),
            processed.height(),
            layout.len(),
            total,
            decoded,
            detected - decoded,
            start.elapsed()
        );

        Ok(ParsedLayout {
            element_count: layout.len(),
            layout,
            image_with_layout,
        })
    }
}
