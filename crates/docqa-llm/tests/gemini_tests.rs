use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use docqa_core::config::GenerationConfig;
use docqa_core::error::Error;
use docqa_core::traits::Generator;
use docqa_core::types::OutputFormat;
use docqa_llm::GeminiGenerator;

#[derive(Clone, Default)]
struct Seen {
    calls: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
}

async fn generate_ok(
    State(seen): State<Seen>,
    Path(call): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let key = headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()).map(str::to_string);
    seen.calls.lock().unwrap().push((call, key, body));
    Json(json!({
        "candidates": [{ "content": { "parts": [{ "text": "AI is the simulation " }, { "text": "of human intelligence." }] } }]
    }))
}

async fn generate_fail() -> (StatusCode, &'static str) {
    (StatusCode::TOO_MANY_REQUESTS, "quota exceeded")
}

async fn generate_empty() -> Json<Value> {
    Json(json!({ "candidates": [] }))
}

async fn serve(app: Router) -> anyhow::Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{}/v1beta", addr))
}

fn config(base_url: String, api_key: Option<&str>) -> GenerationConfig {
    GenerationConfig {
        api_key: api_key.map(str::to_string),
        model: "test-model".to_string(),
        base_url,
        timeout_secs: 5,
    }
}

#[tokio::test]
async fn sends_prompt_and_joins_answer_parts() -> anyhow::Result<()> {
    let seen = Seen::default();
    let app = Router::new().route("/v1beta/models/:call", post(generate_ok)).with_state(seen.clone());
    let base = serve(app).await?;

    let generator = GeminiGenerator::new(&config(base, Some("secret")))?;
    let answer = generator.generate("What is AI?", OutputFormat::PlainText).await?;
    assert_eq!(answer, "AI is the simulation of human intelligence.");

    let calls = seen.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let (call, key, body) = &calls[0];
    assert_eq!(call, "test-model:generateContent");
    assert_eq!(key.as_deref(), Some("secret"));
    assert_eq!(body["contents"][0]["parts"][0]["text"], "What is AI?");
    assert_eq!(body["generationConfig"]["responseMimeType"], "text/plain");
    Ok(())
}

#[tokio::test]
async fn error_status_and_empty_answer_fail_generation() -> anyhow::Result<()> {
    let failing = serve(Router::new().route("/v1beta/models/:call", post(generate_fail))).await?;
    let err = GeminiGenerator::new(&config(failing, Some("k")))?
        .generate("q", OutputFormat::PlainText)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::GenerationFailed(ref m) if m.contains("429")));

    let empty = serve(Router::new().route("/v1beta/models/:call", post(generate_empty))).await?;
    let err = GeminiGenerator::new(&config(empty, Some("k")))?
        .generate("q", OutputFormat::Json)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::GenerationFailed(_)));
    Ok(())
}

#[tokio::test]
async fn missing_key_or_unreachable_host_fail_generation() -> anyhow::Result<()> {
    let err = GeminiGenerator::new(&config("http://127.0.0.1:9/v1beta".into(), None))?
        .generate("q", OutputFormat::PlainText)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::GenerationFailed(ref m) if m.contains("API key")));

    let err = GeminiGenerator::new(&config("http://127.0.0.1:9/v1beta".into(), Some("k")))?
        .generate("q", OutputFormat::PlainText)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::GenerationFailed(_)));
    Ok(())
}
