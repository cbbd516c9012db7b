use super::*;
use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Multipart, Query, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Debug, Clone, Default)]
struct RecordedRequest {
    path: &'static str,
    api_key: Option<String>,
    mode: Option<String>,
    question: Option<String>,
    parts: Vec<(String, Option<String>, String)>,
    body_len: usize,
}

#[derive(Clone, Default)]
struct Recorder {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

fn api_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn handle_ingest(
    State(recorder): State<Recorder>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Json<Value> {
    let mut parts = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let text = field.text().await.unwrap_or_default();
        parts.push((name, file_name, text));
    }
    let total_files = parts.len();
    recorder.requests.lock().await.push(RecordedRequest {
        path: "/ingest",
        api_key: api_key(&headers),
        parts,
        ..RecordedRequest::default()
    });
    Json(json!({ "total_files": total_files, "total_chunks": 7 }))
}

async fn handle_query(
    State(recorder): State<Recorder>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<QueryRequest>,
) -> Json<Value> {
    recorder.requests.lock().await.push(RecordedRequest {
        path: "/query",
        api_key: api_key(&headers),
        mode: params.get("mode").cloned(),
        question: Some(body.question.clone()),
        ..RecordedRequest::default()
    });
    Json(json!({
        "answer": format!("echo: {}", body.question),
        "citations": [{"document_id": "d1", "chunk_id": "c1", "text": "t1", "score": 0.5}],
        "metrics": {"latency": 0.25}
    }))
}

async fn handle_eval(
    State(recorder): State<Recorder>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Value> {
    recorder.requests.lock().await.push(RecordedRequest {
        path: "/eval/run",
        api_key: api_key(&headers),
        body_len: body.len(),
        ..RecordedRequest::default()
    });
    Json(json!({ "count": 2, "pass_rate": 0.5, "results": [] }))
}

async fn spawn_server(app: Router) -> anyhow::Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

async fn spawn_recording_backend() -> anyhow::Result<(HttpBackend, Recorder)> {
    let recorder = Recorder::default();
    let app = Router::new()
        .route("/ingest", post(handle_ingest))
        .route("/query", post(handle_query))
        .route("/eval/run", post(handle_eval))
        .with_state(recorder.clone());
    let base = spawn_server(app).await?;
    let backend = HttpBackend::new(ClientConfig::new(base, "test-key")?)?;
    Ok((backend, recorder))
}

async fn backend_for(app: Router) -> HttpBackend {
    let base = spawn_server(app).await.expect("server");
    HttpBackend::new(ClientConfig::new(base, "test-key").expect("config")).expect("backend")
}

#[tokio::test]
async fn ingest_sends_every_file_under_shared_field_with_api_key() {
    let (backend, recorder) = spawn_recording_backend().await.expect("backend");
    let files = vec![
        UploadFile::new("handbook.pdf", b"pdf bytes".to_vec()),
        UploadFile::new("faq.txt", b"faq text".to_vec()),
    ];

    let response = backend.ingest(&files).await.expect("ingest");
    assert_eq!(response.total_files, Some(2));
    assert_eq!(response.total_chunks, Some(7));

    let requests = recorder.requests.lock().await;
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.api_key.as_deref(), Some("test-key"));
    assert_eq!(
        request.parts,
        vec![
            ("files".to_string(), Some("handbook.pdf".to_string()), "pdf bytes".to_string()),
            ("files".to_string(), Some("faq.txt".to_string()), "faq text".to_string()),
        ]
    );
}

#[tokio::test]
async fn chat_query_uses_base_path_and_form_fill_adds_mode_flag() {
    let (backend, recorder) = spawn_recording_backend().await.expect("backend");

    let chat = backend
        .query("What is the leave policy?", QueryMode::Chat)
        .await
        .expect("chat query");
    assert_eq!(chat.answer.as_deref(), Some("echo: What is the leave policy?"));
    assert_eq!(chat.citations.as_ref().map(Vec::len), Some(1));

    backend
        .query("Fill the leave form", QueryMode::FormFill)
        .await
        .expect("form query");

    let requests = recorder.requests.lock().await;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].mode, None);
    assert_eq!(requests[0].question.as_deref(), Some("What is the leave policy?"));
    assert_eq!(requests[1].mode.as_deref(), Some("form"));
    assert!(requests.iter().all(|r| r.api_key.as_deref() == Some("test-key")));
}

#[tokio::test]
async fn evaluation_posts_empty_body_and_returns_raw_json() {
    let (backend, recorder) = spawn_recording_backend().await.expect("backend");

    let result = backend.run_evaluation().await.expect("evaluation");
    assert_eq!(result["count"], json!(2));
    assert_eq!(result["pass_rate"], json!(0.5));

    let requests = recorder.requests.lock().await;
    assert_eq!(requests[0].path, "/eval/run");
    assert_eq!(requests[0].body_len, 0);
    assert_eq!(requests[0].api_key.as_deref(), Some("test-key"));
}

#[tokio::test]
async fn non_success_status_maps_to_http_failure_with_code() {
    let backend = backend_for(
        Router::new()
            .route("/query", post(|| async { StatusCode::SERVICE_UNAVAILABLE }))
            .route("/eval/run", post(|| async { StatusCode::UNAUTHORIZED })),
    )
    .await;

    let err = backend
        .query("anything", QueryMode::Chat)
        .await
        .expect_err("503 must fail");
    assert_eq!(err.status(), Some(503));
    assert!(err.to_string().contains("503"));

    let err = backend.run_evaluation().await.expect_err("401 must fail");
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn unparseable_body_maps_to_malformed_response() {
    let backend = backend_for(
        Router::new()
            .route("/query", post(|| async { "definitely not json" }))
            .route("/ingest", post(|| async { Json(json!("just a string")) })),
    )
    .await;

    let err = backend
        .query("anything", QueryMode::Chat)
        .await
        .expect_err("text body must fail");
    assert_eq!(err.kind(), shared::error::FailureKind::MalformedResponse);

    let err = backend
        .ingest(&[UploadFile::new("a.txt", b"a".to_vec())])
        .await
        .expect_err("string body must fail");
    assert_eq!(err.kind(), shared::error::FailureKind::MalformedResponse);
}

#[tokio::test]
async fn unreachable_backend_maps_to_transport_failure() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let backend = HttpBackend::new(
        ClientConfig::new(format!("http://{addr}"), "test-key").expect("config"),
    )
    .expect("backend");
    let err = backend.run_evaluation().await.expect_err("nothing listens");
    assert_eq!(err.kind(), shared::error::FailureKind::Transport);
}

#[test]
fn rejects_api_key_that_cannot_be_a_header() {
    let config = ClientConfig::new("http://127.0.0.1:1", "bad\nkey").expect("config");
    assert!(HttpBackend::new(config).is_err());
}
