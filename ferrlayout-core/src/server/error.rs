use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use snafu::prelude::*;
use tracing::*;

use crate::{error::LayoutError, server::response::ErrorBody};

/// Failures of a `/parse-layout` request, mapped to a status code and an
/// `{"error": ...}` body.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ApiError {
    #[snafu(display("No image file provided"))]
    NoImage,
    #[snafu(display("No file selected"))]
    NoFileSelected,
    #[snafu(display("Invalid multipart request: {}", source))]
    Multipart { source: MultipartError },
    #[snafu(display("{}", source))]
    Pipeline { source: LayoutError },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoImage | ApiError::NoFileSelected => StatusCode::BAD_REQUEST,
            // 400 for malformed bodies, 413 when the upload limit is hit
            ApiError::Multipart { source } => source.status(),
            ApiError::Pipeline { source } if source.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Pipeline { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text of the `error` field returned to the client.
    pub fn message(&self) -> String {
        match self {
            ApiError::Multipart { source } => {
                format!("Invalid multipart request: {}", source.body_text())
            }
            ApiError::Pipeline { source } => match source {
                LayoutError::Decode { source } => format!("Invalid image: {source}"),
                LayoutError::EmptyImage => format!("Invalid image: {source}"),
                LayoutError::ModelLoad { .. } => {
                    "Model failed to load. Please check server logs.".to_string()
                }
                other => format!("Error processing image: {other}"),
            },
            other => other.to_string(),
        }
    }
}

impl From<LayoutError> for ApiError {
    fn from(source: LayoutError) -> Self {
        ApiError::Pipeline { source }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("parse-layout failed: {}", self);
        } else {
            warn!("parse-layout rejected: {}", self);
        }

        (
            status,
            Json(ErrorBody {
                error: self.message(),
            }),
        )
            .into_response()
    }
}
