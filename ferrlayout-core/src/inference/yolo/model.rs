use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

use snafu::ensure;
use tracing::*;

use crate::{
    analysis::labels::LabelSet,
    consts::*,
    error::{LayoutError, ModelMissingSnafu},
    inference::{
        model::{ModelSource, SharedModel, session_builder},
        yolo::session::YoloSession,
    },
};

#[derive(Debug, Clone)]
pub struct YoloConfig {
    /// Side of the square input tensor.
    pub required_size: usize,
    pub batch_size: usize,
    pub input_channels: usize,
    pub background_fill_value: f32,
    pub cxywh_size: usize,
    pub labels: LabelSet,
    pub proba_threshold: f32,
    pub iou_threshold: f32,
}

impl Default for YoloConfig {
    fn default() -> Self {
        Self {
            required_size: REQUIRED_SIZE,
            batch_size: BATCH_SIZE,
            input_channels: INPUT_CHANNELS,
            background_fill_value: BACKGROUND_FILL_VALUE,
            cxywh_size: CXYWH_OFFSET,
            labels: LabelSet::default(),
            proba_threshold: PROBA_THRESHOLD,
            iou_threshold: NMS_IOU_THRESHOLD,
        }
    }
}

impl YoloConfig {
    /// Feature length of a single prediction: box plus class scores.
    pub fn feature_size(&self) -> usize {
        self.cxywh_size + self.labels.label_size()
    }
}

/// A YOLO layout model on disk, one candidate of the loader's list.
///
/// Parsed from `name=path[:labels]`, e.g.
/// `doclaynet=models/yolov12s-doclaynet.onnx:doclaynet`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpec {
    pub name: String,
    pub path: PathBuf,
    pub labels: LabelSet,
    pub intra_threads: usize,
}

impl ModelSpec {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, labels: LabelSet) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            labels,
            intra_threads: INTRA_THREADS,
        }
    }

    /// Built-in candidate list, most accurate first.
    pub fn defaults(model_dir: &Path) -> Vec<Self> {
        vec![
            Self::new(
                "yolov12s-doclaynet",
                model_dir.join("yolov12s-doclaynet.onnx"),
                LabelSet::DocLayNet,
            ),
            Self::new(
                "yolov8-publaynet",
                model_dir.join("yolov8-publaynet.onnx"),
                LabelSet::PubLayNet,
            ),
        ]
    }

    /// Resolves a relative path against `model_dir`.
    pub fn relative_to(mut self, model_dir: &Path) -> Self {
        if self.path.is_relative() && !self.path.exists() {
            self.path = model_dir.join(&self.path);
        }
        self
    }

    pub fn with_intra_threads(mut self, intra_threads: usize) -> Self {
        self.intra_threads = intra_threads;
        self
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}:{}", self.name, self.path.display(), self.labels)
    }
}

impl FromStr for ModelSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, rest) = s
            .split_once('=')
            .ok_or_else(|| format!("model `{s}` must look like name=path[:labels]"))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("model `{s}` has an empty name"));
        }

        // a trailing `:labels` only counts when it names a label set, so
        // Windows drive letters survive
        let (path, labels) = match rest.rsplit_once(':') {
            Some((path, labels)) if labels.parse::<LabelSet>().is_ok() => {
                (path, labels.parse::<LabelSet>()?)
            }
            _ => (rest, LabelSet::default()),
        };
        if path.trim().is_empty() {
            return Err(format!("model `{s}` has an empty path"));
        }

        Ok(Self::new(name, path.trim(), labels))
    }
}

impl ModelSource for ModelSpec {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<SharedModel, LayoutError> {
        ensure!(
            self.path.is_file(),
            ModelMissingSnafu {
                path: self.path.to_string_lossy(),
            }
        );

        debug!(
            "building ort session for {} with {} intra threads",
            self.path.display(),
            self.intra_threads
        );
        let config = YoloConfig {
            labels: self.labels,
            ..YoloConfig::default()
        };
        let session =
            YoloSession::from_file(session_builder(self.intra_threads)?, &self.name, &self.path, config)?;

        Ok(Arc::new(session))
    }
}
