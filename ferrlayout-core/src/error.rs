use snafu::prelude::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum LayoutError {
    #[snafu(display("No layout model could be loaded, tried: [{}]", attempts.join("; ")))]
    ModelLoad { attempts: Vec<String> },
    #[snafu(display("Decode image error: {}", source))]
    Decode { source: image::ImageError },
    #[snafu(display("Uploaded image is empty"))]
    EmptyImage,
    #[snafu(display(
        "Layout detection failed, primary call: {}, fallback call: {}",
        primary,
        fallback
    ))]
    Detection { primary: String, fallback: String },
    #[snafu(display("Ort Session init stage `{}` error: {}", stage, source))]
    OrtInit {
        source: ort::error::Error,
        stage: String,
    },
    #[snafu(display("Build Tensor for `{}` error: {}", stage, source))]
    Tensor {
        source: ort::error::Error,
        stage: String,
    },
    #[snafu(display("Onnx Inference error: {}", source))]
    Inference { source: ort::error::Error },
    #[snafu(display("Onnx Output can not found {}", output_name))]
    NotFoundOutput { output_name: String },
    #[snafu(display("Ndarray Shape error at stage `{}`: {}", stage, source))]
    Shape {
        source: ndarray::ShapeError,
        stage: String,
    },
    #[snafu(display("Model file `{}` not found", path))]
    ModelMissing { path: String },
    #[snafu(display("Load Font error: {}", source))]
    Font { source: ab_glyph::InvalidFont },
    #[snafu(display("Read font `{}` error: {}", path, source))]
    FontRead {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Encode annotated image error: {}", source))]
    Encode { source: image::ImageError },
    #[snafu(display("Layout task aborted: {}", source))]
    Join { source: tokio::task::JoinError },
    #[snafu(display("{}", message))]
    Processing { message: String },
}

impl LayoutError {
    /// Errors caused by the uploaded content rather than by the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, LayoutError::Decode { .. } | LayoutError::EmptyImage)
    }
}
