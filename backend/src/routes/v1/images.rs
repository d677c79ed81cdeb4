use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tracing::{error, info, instrument};

use common_types::ImageGenerationResponse;

use crate::{state::AppState, types::AppError};

/// Handle an image generation request.
///
/// Contract: 400 only for malformed input at the boundary, 500 only for a
/// fault in the handler itself. Upstream generation failures are absorbed
/// by the service into a 200 response carrying a fallback image, so the
/// caller always gets a displayable result.
#[instrument(skip(state, payload))]
pub async fn generate_image(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Some(prompt) = extract_prompt(payload) else {
        return AppError::invalid_prompt().into_response();
    };

    info!(prompt = %prompt, "Received image generation request");

    match try_generate(&state, &prompt).await {
        Ok(result) => Json(result).into_response(),
        Err(err) => {
            error!(error = %err, "Image generation handler failed");
            AppError::internal().into_response()
        }
    }
}

/// Guard for faults in the handler boundary; the generation service itself
/// never fails.
async fn try_generate(
    state: &AppState,
    prompt: &str,
) -> anyhow::Result<ImageGenerationResponse> {
    Ok(state.generation.generate(prompt).await)
}

/// A usable prompt is a non-empty string field in a JSON object body.
fn extract_prompt(payload: Result<Json<Value>, JsonRejection>) -> Option<String> {
    let Json(body) = payload.ok()?;
    let prompt = body.get("prompt")?.as_str()?;
    if prompt.is_empty() {
        return None;
    }
    Some(prompt.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn accepted(body: Value) -> Option<String> {
        extract_prompt(Ok(Json(body)))
    }

    #[test]
    fn accepts_a_non_empty_string_prompt() {
        assert_eq!(accepted(json!({ "prompt": "eloquent" })).as_deref(), Some("eloquent"));
    }

    #[test]
    fn rejects_missing_empty_and_non_string_prompts() {
        assert_eq!(accepted(json!({})), None);
        assert_eq!(accepted(json!({ "prompt": "" })), None);
        assert_eq!(accepted(json!({ "prompt": 42 })), None);
        assert_eq!(accepted(json!({ "prompt": ["a"] })), None);
        assert_eq!(accepted(json!({ "prompt": null })), None);
    }
}
