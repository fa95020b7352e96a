use std::{
    path::Path,
    sync::{Mutex, PoisonError},
    time::Instant,
};

use glam::Vec2;
use image::{RgbImage, imageops::FilterType};
use ndarray::{Array3, Array4, ArrayView3, Axis, Ix3};
use ort::{
    session::{Session, builder::SessionBuilder},
    value::TensorRef,
};
use snafu::{OptionExt, ResultExt};
use tracing::*;

use crate::{
    analysis::bbox::Bbox,
    error::*,
    inference::{
        model::{LayoutModel, LayoutResponse, ModelOutput},
        yolo::model::YoloConfig,
    },
    layout::element::RawDetection,
};

/// ONNX Runtime session running a YOLO document layout head.
pub struct YoloSession {
    name: String,
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    config: YoloConfig,
}

/// Where the image landed inside the square model input.
#[derive(Debug, Clone, Copy)]
pub struct Letterbox {
    /// model pixels per image pixel
    pub scale: f32,
    /// resized image size inside the tensor
    pub size: Vec2,
}

/// A decoded prediction before overlap merging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub class_idx: usize,
    pub proba: f32,
    pub bbox: Bbox,
}

impl YoloSession {
    pub fn from_file(
        builder: SessionBuilder,
        name: &str,
        path: &Path,
        config: YoloConfig,
    ) -> Result<Self, LayoutError> {
        let session = builder
            .commit_from_file(path)
            .context(OrtInitSnafu { stage: "commit" })?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());
        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .unwrap_or_else(|| "output0".to_string());

        info!(
            "layout session `{name}` ready, input `{input_name}`, output `{output_name}`, labels {}",
            config.labels
        );

        Ok(Self {
            name: name.to_string(),
            session: Mutex::new(session),
            input_name,
            output_name,
            config,
        })
    }

    /// Letterboxes the image into the top-left corner of a square tensor,
    /// normalized to `[0, 1]` and padded with the background value.
    pub fn preprocess(config: &YoloConfig, image: &RgbImage) -> (Array4<f32>, Letterbox) {
        let size = config.required_size as f32;
        let (w0, h0) = image.dimensions();
        let scale = f32::min(size / w0 as f32, size / h0 as f32);
        let w_new = ((w0 as f32 * scale).round() as u32).clamp(1, config.required_size as u32);
        let h_new = ((h0 as f32 * scale).round() as u32).clamp(1, config.required_size as u32);

        let resized = image::imageops::resize(image, w_new, h_new, FilterType::Triangle);

        let mut input_tensor = Array4::from_elem(
            [
                config.batch_size,
                config.input_channels,
                config.required_size,
                config.required_size,
            ],
            config.background_fill_value,
        );

        for (x, y, pixel) in resized.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            let [r, g, b] = pixel.0;
            input_tensor[[0, 0, y, x]] = r as f32 / 255.0;
            input_tensor[[0, 1, y, x]] = g as f32 / 255.0;
            input_tensor[[0, 2, y, x]] = b as f32 / 255.0;
        }

        let letterbox = Letterbox {
            scale,
            size: Vec2::new(w_new as f32, h_new as f32),
        };
        (input_tensor, letterbox)
    }

    fn infer(&self, input: &Array4<f32>) -> Result<Array3<f32>, LayoutError> {
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);

        let output = session
            .run(ort::inputs![
                self.input_name.as_str() => TensorRef::from_array_view(input).context(TensorSnafu { stage: "input" })?
            ])
            .context(InferenceSnafu {})?;

        let tensor = output
            .get(&self.output_name)
            .context(NotFoundOutputSnafu {
                output_name: &self.output_name,
            })?
            .try_extract_array::<f32>()
            .context(TensorSnafu { stage: "extract" })?;

        let output = tensor
            .into_dimensionality::<Ix3>()
            .context(ShapeSnafu { stage: "output" })?
            .to_owned();

        Ok(output)
    }

    /// Turns the raw head output into candidates in image coordinates.
    ///
    /// Accepts both `[batch, features, anchors]` and the transposed
    /// `[batch, anchors, features]` export layout.
    pub fn decode(
        config: &YoloConfig,
        output: ArrayView3<'_, f32>,
        letterbox: &Letterbox,
    ) -> Vec<Candidate> {
        let feature_size = config.feature_size();
        let output = output.index_axis_move(Axis(0), 0);
        let predictions = if output.shape()[0] == feature_size {
            output
        } else if output.shape()[1] == feature_size {
            output.reversed_axes()
        } else {
            warn!(
                "unexpected layout head shape {:?}, expected {} features",
                output.shape(),
                feature_size
            );
            return Vec::new();
        };

        let mut candidates = Vec::new();
        for prediction in predictions.axis_iter(Axis(1)) {
            let scores = prediction.slice(ndarray::s![config.cxywh_size..feature_size]);

            let Some((class_idx, &proba)) = scores
                .iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.total_cmp(b))
            else {
                continue;
            };

            if proba < config.proba_threshold {
                continue;
            }

            let center = Vec2::new(prediction[0], prediction[1]);
            let size = Vec2::new(prediction[2], prediction[3]);
            let bbox = Bbox::from_center_size(center, size)
                .clamp(Vec2::ZERO, letterbox.size)
                .scale(1. / letterbox.scale);

            candidates.push(Candidate {
                class_idx,
                proba,
                bbox,
            });
        }

        candidates
    }

    /// Suppresses candidates overlapping a more confident one of the same
    /// class. Kept boxes are left untouched and regions of different classes
    /// never suppress each other. Output is ordered by descending confidence.
    pub fn nms(candidates: &mut Vec<Candidate>, iou_threshold: f32) {
        candidates.sort_by(|a, b| b.proba.total_cmp(&a.proba));

        let mut kept: Vec<Candidate> = Vec::with_capacity(candidates.len());
        for candidate in candidates.drain(..) {
            let suppressed = kept.iter().any(|k| {
                k.class_idx == candidate.class_idx
                    && (k.bbox.contains(&candidate.bbox)
                        || candidate.bbox.contains(&k.bbox)
                        || candidate.bbox.iou(&k.bbox) > iou_threshold
                        || candidate.bbox.overlap_ratio(&k.bbox) > iou_threshold)
            });
            if !suppressed {
                kept.push(candidate);
            }
        }

        *candidates = kept;
    }

    fn run(&self, image: &RgbImage) -> Result<(Vec<RawDetection>, Letterbox), LayoutError> {
        let (input, letterbox) = Self::preprocess(&self.config, image);
        let output = self.infer(&input)?;

        let mut candidates = Self::decode(&self.config, output.view(), &letterbox);
        let decoded = candidates.len();
        Self::nms(&mut candidates, self.config.iou_threshold);
        debug!(
            "`{}` decoded {decoded} candidates, {} after suppression",
            self.name,
            candidates.len()
        );

        let detections = candidates
            .into_iter()
            .map(|candidate| {
                let kind = self
                    .config
                    .labels
                    .name(candidate.class_idx)
                    .unwrap_or("Unknown");
                let Bbox { min, max } = candidate.bbox;
                RawDetection::new(kind, candidate.proba, [min.x, min.y, max.x, max.y])
            })
            .collect();

        Ok((detections, letterbox))
    }
}

impl LayoutModel for YoloSession {
    fn name(&self) -> &str {
        &self.name
    }

    fn detect_with_response(&self, image: &RgbImage) -> Result<ModelOutput, LayoutError> {
        let start = Instant::now();
        let (layout, letterbox) = self.run(image)?;

        Ok(ModelOutput::Response(LayoutResponse {
            layout,
            input_size: Some((letterbox.size.x as usize, letterbox.size.y as usize)),
            inference_ms: Some(start.elapsed().as_millis()),
        }))
    }

    fn detect(&self, image: &RgbImage) -> Result<Vec<RawDetection>, LayoutError> {
        self.run(image).map(|(layout, _)| layout)
    }
}
