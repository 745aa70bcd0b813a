//! A local stand-in for the chat-completions API, for tests that drive the
//! analysis pipeline end to end.
//!
//! Replies are canned per analysis kind, picked by the system prompt role.

use axum::{routing::post, Json, Router};
use serde_json::{json, Value};

use super::LlmClient;
use crate::analysis::prompts::{
    CONTACT_SYSTEM, FOLLOW_UP_SYSTEM, INTERVIEW_SYSTEM, JOB_ANALYSIS_SYSTEM, MATCH_SYSTEM,
    TAILOR_SYSTEM,
};

fn canned_reply(system: &str) -> Value {
    if system.starts_with(CONTACT_SYSTEM) {
        json!({"name": "Ada Lovelace", "email": "ada@example.com", "phone": "  "})
    } else if system.starts_with(JOB_ANALYSIS_SYSTEM) {
        json!({
            "title": "Rust Engineer",
            "company": "Acme",
            "required_skills": ["Rust", "PostgreSQL"],
            "keywords": ["async"]
        })
    } else if system.starts_with(MATCH_SYSTEM) {
        json!({"overall_score": "82", "skills_score": 90, "matched_skills": ["Rust"]})
    } else if system.starts_with(TAILOR_SYSTEM) {
        json!({
            "summary": "Rust engineer focused on services",
            "experience": [{"title": "Engineer", "company": "Initech", "bullets": ["Built APIs"]}],
            "skills": ["Rust", "SQL"]
        })
    } else if system.starts_with(INTERVIEW_SYSTEM) {
        json!({"questions": [
            {"question": "Why Rust?", "category": "Technical"},
            {"question": ""}
        ]})
    } else if system.starts_with(FOLLOW_UP_SYSTEM) {
        json!({"subject": "", "body": "Hello again"})
    } else {
        json!({})
    }
}

async fn completions(Json(body): Json<Value>) -> Json<Value> {
    let system = body["messages"][0]["content"].as_str().unwrap_or_default();
    let content = canned_reply(system).to_string();
    Json(json!({
        "choices": [{"message": {"content": content}}],
        "usage": {"prompt_tokens": 10, "completion_tokens": 20}
    }))
}

/// Serves the fake API on an ephemeral port and returns a client pointed at it.
pub async fn fake_llm() -> LlmClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake llm");
    let addr = listener.local_addr().expect("fake llm addr");
    let app = Router::new().route("/chat/completions", post(completions));
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake llm server");
    });
    LlmClient::new("test-key".to_string(), format!("http://{addr}"), "test-model".to_string())
        .expect("llm client")
}
