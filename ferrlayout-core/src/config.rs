use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
};

use clap::Parser;

use crate::{
    consts::*,
    inference::yolo::ModelSpec,
    pipeline::{PipelineConfig, PipelineConfigBuilder},
};

/// Document layout detection HTTP service.
#[derive(Debug, Clone, Parser)]
#[command(name = "layout-server", version, about)]
pub struct ServerArgs {
    /// Address to bind
    #[arg(long, env = "LAYOUT_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    #[arg(long, env = "LAYOUT_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Directory relative model paths are resolved against
    #[arg(long, env = "LAYOUT_MODEL_DIR", default_value = "models")]
    pub model_dir: PathBuf,

    /// Model candidate as `name=path[:labels]`, tried in the given order.
    /// Defaults to the bundled DocLayNet then PubLayNet models.
    #[arg(long = "model", env = "LAYOUT_MODELS", value_delimiter = ',')]
    pub models: Vec<ModelSpec>,

    /// TrueType font for box labels, system fonts are probed when unset
    #[arg(long, env = "LAYOUT_FONT")]
    pub font: Option<PathBuf>,

    /// Detections must score strictly above this to be returned
    #[arg(long, default_value_t = CONFIDENCE_THRESHOLD)]
    pub threshold: f32,

    /// Longest image side handed to the model
    #[arg(long, default_value_t = MAX_DIMENSION)]
    pub max_dimension: u32,

    #[arg(long, default_value_t = MAX_UPLOAD_MB)]
    pub max_upload_mb: usize,

    /// ONNX Runtime intra-op threads per model
    #[arg(long, default_value_t = INTRA_THREADS)]
    pub intra_threads: usize,

    /// Load the model on first request instead of at startup
    #[arg(long)]
    pub no_preload: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

impl ServerArgs {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    /// Configured candidates, or the built-in list when none were given.
    pub fn model_specs(&self) -> Vec<ModelSpec> {
        let specs = if self.models.is_empty() {
            ModelSpec::defaults(&self.model_dir)
        } else {
            self.models
                .iter()
                .cloned()
                .map(|spec| spec.relative_to(&self.model_dir))
                .collect()
        };

        specs
            .into_iter()
            .map(|spec| spec.with_intra_threads(self.intra_threads))
            .collect()
    }

    pub fn pipeline_config(&self) -> Result<PipelineConfig, String> {
        PipelineConfigBuilder::default()
            .threshold(self.threshold)
            .max_dimension(self.max_dimension)
            .build()
            .map_err(|err| err.to_string())
    }
}
