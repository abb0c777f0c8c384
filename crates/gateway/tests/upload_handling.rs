//! Multipart upload handling through the full pipeline.

mod common;

use std::collections::HashMap;

use axum::{Router, http::StatusCode, routing::post};
use axum_test::multipart::{MultipartForm, Part};
use serde_json::{Value, json};

use atelier_gateway::pipeline::Endpoint;
use atelier_gateway::policy::{AuthLevel, Policy};
use atelier_gateway::upload::FileFieldConfig;

use common::harness::TestPlatform;

/// `POST /uploads`: required image thumbnail (max 1 KiB) and optional
/// captions file.
fn upload_router(platform: &TestPlatform) -> Router {
    let mut files = HashMap::new();
    files.insert(
        "thumbnail".to_string(),
        FileFieldConfig::required()
            .max_size(1024)
            .mime_types(["image/png", "image/jpeg"]),
    );
    files.insert("captions".to_string(), FileFieldConfig::optional());

    let endpoint = Endpoint::new(Policy::new().auth(AuthLevel::None), |ctx| async move {
        let thumbnail = ctx.files.get("thumbnail").expect("required field present");
        Ok(json!({
            "thumbnail": {
                "mime": thumbnail.mime_type,
                "size": thumbnail.size_bytes,
            },
            "has_captions": ctx.files.contains_key("captions"),
        }))
    })
    .files(files);

    Router::new().route("/uploads", post(endpoint.into_handler(platform.state())))
}

fn png_part(size: usize) -> Part {
    Part::bytes(vec![0u8; size])
        .file_name("thumb.png")
        .mime_type("image/png")
}

#[tokio::test]
async fn test_upload_success() {
    let platform = TestPlatform::new();
    let server = platform.server(upload_router(&platform));

    let form = MultipartForm::new().add_part("thumbnail", png_part(512));
    let response = server.post("/uploads").multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["data"]["thumbnail"]["mime"], "image/png");
    assert_eq!(body["data"]["thumbnail"]["size"], 512);
    assert_eq!(body["data"]["has_captions"], false);
}

#[tokio::test]
async fn test_optional_field_extracted_when_present() {
    let platform = TestPlatform::new();
    let server = platform.server(upload_router(&platform));

    let captions = Part::bytes(b"1\n00:00:01 --> 00:00:02\nhello\n".to_vec())
        .file_name("captions.srt")
        .mime_type("text/plain");
    let form = MultipartForm::new()
        .add_part("thumbnail", png_part(100))
        .add_part("captions", captions);
    let response = server.post("/uploads").multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["data"]["has_captions"], true);
}

#[tokio::test]
async fn test_missing_required_file() {
    let platform = TestPlatform::new();
    let server = platform.server(upload_router(&platform));

    let form = MultipartForm::new();
    let response = server.post("/uploads").multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body = response.json::<Value>();
    assert_eq!(body["error"]["code"], "MISSING_FILE");
    assert!(body["error"]["message"].as_str().unwrap().contains("thumbnail"));
}

#[tokio::test]
async fn test_disallowed_mime_type() {
    let platform = TestPlatform::new();
    let server = platform.server(upload_router(&platform));

    let part = Part::bytes(vec![0u8; 64])
        .file_name("thumb.gif")
        .mime_type("image/gif");
    let form = MultipartForm::new().add_part("thumbnail", part);
    let response = server.post("/uploads").multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body = response.json::<Value>();
    assert_eq!(body["error"]["code"], "INVALID_FILE_TYPE");
    assert!(body["error"]["message"].as_str().unwrap().contains("image/gif"));
}

#[tokio::test]
async fn test_file_over_limit() {
    let platform = TestPlatform::new();
    let server = platform.server(upload_router(&platform));

    let form = MultipartForm::new().add_part("thumbnail", png_part(2048));
    let response = server.post("/uploads").multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body = response.json::<Value>();
    assert_eq!(body["error"]["code"], "FILE_TOO_LARGE");
}

#[tokio::test]
async fn test_undeclared_fields_are_ignored() {
    let platform = TestPlatform::new();
    let server = platform.server(upload_router(&platform));

    let extra = Part::bytes(b"ignored".to_vec()).file_name("extra.bin");
    let form = MultipartForm::new()
        .add_part("thumbnail", png_part(100))
        .add_part("extra", extra);
    let response = server.post("/uploads").multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::OK);
}
