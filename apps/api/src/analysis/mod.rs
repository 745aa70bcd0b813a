// Resume analysis: contact extraction, job analysis, match scoring, tailoring,
// interview prep and follow-up drafting.
// All LLM calls go through llm_client; no direct API calls here.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::AppError;
use crate::llm_client::LlmClient;

pub mod contact;
pub mod follow_up;
pub mod interview;
pub mod job;
pub mod matching;
pub mod normalize;
pub mod prompts;
pub mod tailoring;

/// Sends one prompt and reads the reply into `T`. Any failure, network or
/// shape, becomes a single `Failed to <operation>` error.
async fn request<T: DeserializeOwned>(
    llm: &LlmClient,
    prompt: &str,
    system: &str,
    operation: &str,
) -> Result<T, AppError> {
    let value: Value = llm
        .call_json(prompt, system)
        .await
        .map_err(|e| AppError::Llm(format!("Failed to {operation}: {e}")))?;
    parse_reply(value, operation)
}

/// Reads a model reply into `T`. The reply must be a JSON object; the fields
/// inside it are normalized by `T`'s lenient deserializers.
fn parse_reply<T: DeserializeOwned>(value: Value, operation: &str) -> Result<T, AppError> {
    if !value.is_object() {
        return Err(AppError::Llm(format!(
            "Failed to {operation}: expected a JSON object"
        )));
    }
    serde_json::from_value(value).map_err(|e| AppError::Llm(format!("Failed to {operation}: {e}")))
}

fn to_prompt_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}
