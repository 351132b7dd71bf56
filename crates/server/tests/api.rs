//! Integration tests for the HTTP surface
//!
//! The router is driven in-process with `oneshot`; fakes stand in for every model.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use civic_ai::{
    ChatMessage, ChatModel, Detection, MediaError, SafetyDetector, SafetyReport, SemanticConfig,
    StagedUpload, StubEncoder, TextEncoder, Transcriber, Transcript, TriageError,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use server::{build_router, Capability, ServerConfig, ServerState};
use tower::ServiceExt;

const BOUNDARY: &str = "civic-test-boundary";

struct CannedChat(String);

#[async_trait]
impl ChatModel for CannedChat {
    fn model_name(&self) -> &str {
        "canned"
    }

    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, TriageError> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
struct EchoTranscriber {
    staged: Mutex<Vec<std::path::PathBuf>>,
}

#[async_trait]
impl Transcriber for EchoTranscriber {
    fn model_name(&self) -> &str {
        "echo"
    }

    async fn transcribe(&self, upload: &StagedUpload) -> Result<Transcript, MediaError> {
        self.staged.lock().unwrap().push(upload.path().to_path_buf());
        let text = std::fs::read_to_string(upload.path())?;
        Ok(Transcript {
            filename: upload.filename().to_string(),
            text: text.trim().to_string(),
        })
    }
}

struct FlaggingDetector;

impl SafetyDetector for FlaggingDetector {
    fn model_name(&self) -> &str {
        "flagging"
    }

    fn inspect(&self, _image_path: &Path) -> Result<SafetyReport, MediaError> {
        Ok(SafetyReport::from_detections(
            vec![Detection {
                label: "FEMALE_BREAST_EXPOSED".into(),
                score: 0.87,
                bbox: [10, 20, 30, 40],
            }],
            0.5,
        ))
    }
}

fn stub_encoder() -> Arc<dyn TextEncoder> {
    let cfg = SemanticConfig {
        mode: "fast".into(),
        stub_dim: 32,
        ..Default::default()
    };
    Arc::new(StubEncoder::new(&cfg).expect("stub encoder"))
}

fn full_state(chat_reply: &str, transcriber: Arc<EchoTranscriber>) -> Arc<ServerState> {
    Arc::new(ServerState::new(
        ServerConfig::default(),
        Capability::loaded("Embedding", stub_encoder()),
        Capability::loaded("Generator", Arc::new(CannedChat(chat_reply.into())) as Arc<dyn ChatModel>),
        Capability::loaded("Whisper", transcriber as Arc<dyn Transcriber>),
        Capability::loaded("NudeNet", Arc::new(FlaggingDetector) as Arc<dyn SafetyDetector>),
    ))
}

fn empty_state() -> Arc<ServerState> {
    Arc::new(ServerState::new(
        ServerConfig::default(),
        Capability::failed("Embedding", "model file not found: ./models/model.onnx"),
        Capability::unloaded("Generator"),
        Capability::unloaded("Whisper"),
        Capability::unloaded("NudeNet"),
    ))
}

fn app() -> Router {
    build_router(full_state(
        r#"{"summary":"power outage","category":"Electricity","urgency":"high"}"#,
        Arc::new(EchoTranscriber::default()),
    ))
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_request(uri: &str, field: &str, filename: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_to_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_always_ok() {
    let response = build_router(empty_state())
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response).await["status"], "healthy");
}

#[tokio::test]
async fn ready_reports_each_model() {
    let response = build_router(empty_state())
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_to_json(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(
        body["models"]["embedding"],
        "failed: model file not found: ./models/model.onnx"
    );
    assert_eq!(body["models"]["generator"], "unloaded");

    let body = body_to_json(
        app()
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["models"]["nudenet"], "loaded");
}

#[tokio::test]
async fn analyze_returns_unit_embedding() {
    let response = app()
        .oneshot(json_request("/analyze", json!({"input_text": "Burst pipe on Main Street"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_to_json(response).await;
    let embedding: Vec<f32> = serde_json::from_value(body["embedding"].clone()).unwrap();
    assert_eq!(embedding.len(), 32);
    let norm: f32 = embedding.iter().map(|v| v * v).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-4);
}

#[tokio::test]
async fn classify_returns_best_label_and_all_scores() {
    let response = app()
        .oneshot(json_request(
            "/classify",
            json!({"text": "water", "candidate_labels": ["roads", "water", "health"]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_to_json(response).await;
    assert_eq!(body["best_label"], "water");
    assert!((body["score"].as_f64().unwrap() - 1.0).abs() < 1e-4);
    assert_eq!(body["scores"].as_object().unwrap().len(), 3);
}

#[tokio::test]
async fn classify_without_labels_is_bad_request() {
    let response = app()
        .oneshot(json_request(
            "/classify",
            json!({"text": "water", "candidate_labels": []}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_to_json(response).await["code"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn malformed_json_uses_error_body() {
    let truncated = Request::builder()
        .method("POST")
        .uri("/analyze")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"input_text": "#))
        .unwrap();
    let missing_field = json_request("/analyze-issue", json!({"text": "no description key"}));

    for request in [truncated, missing_field] {
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_to_json(response).await;
        assert_eq!(body["code"], "BAD_REQUEST");
        assert!(body["detail"].as_str().unwrap().starts_with("Bad request: Invalid JSON body"));
    }
}

#[tokio::test]
async fn unloaded_embedding_model_is_503() {
    let response = build_router(empty_state())
        .oneshot(json_request("/analyze", json!({"input_text": "hello"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = body_to_json(response).await;
    assert_eq!(body["detail"], "Embedding model is not loaded");
    assert_eq!(body["code"], "MODEL_UNAVAILABLE");
}

#[tokio::test]
async fn analyze_issue_returns_extracted_fields() {
    let response = app()
        .oneshot(json_request(
            "/analyze-issue",
            json!({"description": "It has been over a week without electricity."}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_to_json(response).await,
        json!({"summary": "power outage", "category": "Electricity", "urgency": "high"})
    );
}

#[tokio::test]
async fn analyze_issue_falls_back_on_prose() {
    let router = build_router(full_state(
        "Sorry, I am not sure.",
        Arc::new(EchoTranscriber::default()),
    ));
    let response = router
        .oneshot(json_request(
            "/analyze-issue",
            json!({"description": "A streetlight near my house is flickering.", "categories": "Roads, Other"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_to_json(response).await,
        json!({
            "summary": "A streetlight near my house is...",
            "category": "Uncategorized",
            "urgency": "medium"
        })
    );
}

#[tokio::test]
async fn transcribe_returns_text_and_removes_staged_file() {
    let transcriber = Arc::new(EchoTranscriber::default());
    let router = build_router(full_state("{}", transcriber.clone()));

    let response = router
        .oneshot(multipart_request(
            "/transcribe",
            "file",
            "note.ogg",
            b"  water is brown  ",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_to_json(response).await,
        json!({"filename": "note.ogg", "text": "water is brown"})
    );

    let staged = transcriber.staged.lock().unwrap();
    assert_eq!(staged.len(), 1);
    assert!(!staged[0].exists());
}

#[tokio::test]
async fn transcribe_without_file_field_is_bad_request() {
    let response = app()
        .oneshot(multipart_request("/transcribe", "audio", "note.ogg", b"abc"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_to_json(response).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn classify_image_reports_verdict() {
    let response = app()
        .oneshot(multipart_request(
            "/classify-image",
            "image",
            "photo.png",
            b"\x89PNG",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_to_json(response).await;
    assert_eq!(body["status"], "nude");
    assert_eq!(body["detections"][0]["class"], "FEMALE_BREAST_EXPOSED");
    assert_eq!(body["detections"][0]["box"], json!([10, 20, 30, 40]));
}

#[tokio::test]
async fn unloaded_safety_model_is_503() {
    let response = build_router(empty_state())
        .oneshot(multipart_request("/classify-image", "image", "a.jpg", b"x"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body_to_json(response).await["detail"],
        "NudeNet model is not loaded"
    );
}

#[tokio::test]
async fn unknown_route_is_404() {
    let response = app()
        .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn request_id_is_echoed() {
    let response = app()
        .oneshot(
            Request::get("/health")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");
}

#[tokio::test]
async fn metrics_without_recorder_is_404() {
    let response = app()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
