use image::RgbImage;
use tracing::*;

use crate::{
    error::{DetectionSnafu, LayoutError},
    inference::model::{LayoutModel, ModelOutput},
    layout::element::{Detection, RawDetection},
};

/// Runs the model on `image` and returns its detections, unfiltered and in
/// model order.
///
/// The primary call is tried first; if it fails, the plain call is made
/// once before giving up.
pub fn detect(model: &dyn LayoutModel, image: &RgbImage) -> Result<Vec<Detection>, LayoutError> {
    let raw = match model.detect_with_response(image) {
        Ok(output) => normalize(output),
        Err(primary) => {
            warn!(
                "`{}` primary detection failed, falling back to plain detection: {}",
                model.name(),
                primary
            );
            model.detect(image).map_err(|fallback| {
                DetectionSnafu {
                    primary: primary.to_string(),
                    fallback: fallback.to_string(),
                }
                .build()
            })?
        }
    };

    let total = raw.len();
    let detections: Vec<Detection> = raw.into_iter().filter_map(Detection::from_raw).collect();
    if detections.len() < total {
        warn!(
            "`{}` returned {} invalid detections, dropped",
            model.name(),
            total - detections.len()
        );
    }

    Ok(detections)
}

fn normalize(output: ModelOutput) -> Vec<RawDetection> {
    if let ModelOutput::Response(response) = &output {
        debug!(
            "layout response: {} regions, input {:?}, {:?} ms",
            response.layout.len(),
            response.input_size,
            response.inference_ms
        );
    }
    output.into_layout()
}
