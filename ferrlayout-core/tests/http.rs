use std::{io::Cursor, sync::Arc};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::Value;
use tower::ServiceExt;

use ferrlayout_core::{
    LayoutError, LayoutModel, ModelLoader, ModelOutput, ModelSource,
    error::ProcessingSnafu,
    inference::SharedModel,
    layout::element::RawDetection,
    pipeline::{Annotator, LayoutPipeline, PipelineConfig},
    server,
};

const BOUNDARY: &str = "layout-test-boundary";

/// Finds one text block covering the middle of whatever image it sees.
struct CenterModel;

impl LayoutModel for CenterModel {
    fn name(&self) -> &str {
        "center"
    }

    fn detect_with_response(&self, image: &RgbImage) -> Result<ModelOutput, LayoutError> {
        Ok(ModelOutput::Blocks(self.detect(image)?))
    }

    fn detect(&self, image: &RgbImage) -> Result<Vec<RawDetection>, LayoutError> {
        let (w, h) = (image.width() as f32, image.height() as f32);
        Ok(vec![
            RawDetection::new("Text", 0.9, [0.25 * w, 0.25 * h, 0.75 * w, 0.75 * h]),
            RawDetection::new("Figure", 0.05, [0.0, 0.0, w, h]),
        ])
    }
}

struct FakeSource {
    succeed: bool,
}

impl ModelSource for FakeSource {
    fn name(&self) -> &str {
        "fake"
    }

    fn load(&self) -> Result<SharedModel, LayoutError> {
        if self.succeed {
            Ok(Arc::new(CenterModel))
        } else {
            ProcessingSnafu {
                message: "weights missing",
            }
            .fail()
        }
    }
}

fn app(model_loads: bool) -> Router {
    let loader = ModelLoader::new(vec![Box::new(FakeSource {
        succeed: model_loads,
    })]);
    let pipeline = LayoutPipeline::new(loader, Annotator::new(None), PipelineConfig::default());
    server::router(Arc::new(pipeline), 64 * 1024 * 1024)
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([240, 240, 240])))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// A multipart body with one part; `file_name` of `None` omits the
/// filename parameter entirely.
fn multipart(field: &str, file_name: Option<&str>, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    let disposition = match file_name {
        Some(name) => format!("form-data; name=\"{field}\"; filename=\"{name}\""),
        None => format!("form-data; name=\"{field}\""),
    };
    body.extend_from_slice(format!("Content-Disposition: {disposition}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_is_up_without_a_model() {
    for uri in ["/health", "/api/health"] {
        let (status, body) = send(app(false), get(uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["message"], "Layout Parser API is running");
    }
}

#[tokio::test]
async fn missing_image_field_is_rejected() {
    let (status, body) = send(
        app(true),
        upload("/parse-layout", multipart("document", Some("page.png"), &png(8, 8))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No image file provided");

    // a plain form value named `image` is not a file
    let (status, body) = send(
        app(true),
        upload("/parse-layout", multipart("image", None, b"page.png")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No image file provided");
}

#[tokio::test]
async fn empty_filename_is_rejected() {
    let (status, body) = send(
        app(true),
        upload("/parse-layout", multipart("image", Some(""), b"")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file selected");
}

#[tokio::test]
async fn undecodable_upload_is_a_client_error() {
    // reported as such even though no model can load
    let (status, body) = send(
        app(false),
        upload(
            "/parse-layout",
            multipart("image", Some("notes.txt"), b"plain text, not pixels"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid image: "));
}

#[tokio::test]
async fn model_failure_is_a_server_error() {
    let app = app(false);
    for _ in 0..2 {
        let (status, body) = send(
            app.clone(),
            upload("/parse-layout", multipart("image", Some("page.png"), &png(32, 32))),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Model failed to load. Please check server logs.");
    }

    let (status, _) = send(app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn large_upload_is_downscaled_and_annotated() {
    let (status, body) = send(
        app(true),
        upload(
            "/api/parse-layout",
            multipart("image", Some("scan.png"), &png(4000, 3000)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["element_count"], 1);

    let layout = body["layout"].as_array().unwrap();
    assert_eq!(layout.len(), 1);
    let item = &layout[0];
    assert_eq!(item["type"], "Text");
    assert!(item["score"].as_f64().unwrap() > 0.15);
    for key in ["x_1", "y_1", "x_2", "y_2"] {
        let value = item["block"][key].as_f64().unwrap();
        assert!((0.0..=2000.0).contains(&value), "{key} = {value}");
    }
    assert_eq!(item["block"]["x_1"], 500.0);
    assert_eq!(item["block"]["width"], 1000.0);
    assert_eq!(item["block"]["height"], 750.0);

    let png = STANDARD
        .decode(body["image_with_layout"].as_str().unwrap())
        .unwrap();
    let annotated = image::load_from_memory(&png).unwrap();
    assert_eq!((annotated.width(), annotated.height()), (2000, 1500));
}

#[tokio::test]
async fn malformed_multipart_is_rejected() {
    let request = Request::builder()
        .method("POST")
        .uri("/parse-layout")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from("--layout-test-boundary\r\nno headers and no end"))
        .unwrap();

    let (status, body) = send(app(true), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid multipart request")
    );
}
