use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, State},
};
use bytes::Bytes;
use snafu::{ResultExt, ensure};
use tracing::*;
use uuid::Uuid;

use crate::{
    error::JoinSnafu,
    pipeline::LayoutPipeline,
    server::{
        error::{ApiError, MultipartSnafu, NoFileSelectedSnafu, NoImageSnafu, PipelineSnafu},
        response::{HealthResponse, ParseLayoutResponse},
    },
};

/// Multipart field carrying the uploaded image.
pub const IMAGE_FIELD: &str = "image";

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

pub async fn parse_layout(
    State(pipeline): State<Arc<LayoutPipeline>>,
    mut multipart: Multipart,
) -> Result<Json<ParseLayoutResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("parse_layout", %request_id);

    let upload = read_upload(&mut multipart).instrument(span.clone()).await?;

    let parsed = tokio::task::spawn_blocking(move || {
        let _entered = span.enter();
        pipeline.parse(&upload)
    })
    .await
    .context(JoinSnafu)
    .and_then(|parsed| parsed)
    .context(PipelineSnafu)?;

    Ok(Json(parsed.into()))
}

/// Returns the bytes of the first `image` file part.
///
/// A part without a filename is not a file and is skipped.
async fn read_upload(multipart: &mut Multipart) -> Result<Bytes, ApiError> {
    while let Some(field) = multipart.next_field().await.context(MultipartSnafu)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let Some(file_name) = field.file_name() else {
            continue;
        };
        ensure!(!file_name.is_empty(), NoFileSelectedSnafu);

        let file_name = file_name.to_string();
        let bytes = field.bytes().await.context(MultipartSnafu)?;
        info!("Received `{}` ({} bytes)", file_name, bytes.len());
        return Ok(bytes);
    }

    NoImageSnafu.fail()
}
