use crate::api::AppState;
use crate::error::{AppError, AppErrorKind, AppResult, ValidationError};
use crate::services::payment_orchestrator::WebhookOutcome;
use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use tracing::{info, warn};

const SIGNATURE_HEADER: &str = "stripe-signature";

/// POST /webhooks/immediate
pub async fn handle_immediate_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<WebhookOutcome>> {
    info!(bytes = body.len(), "Received immediate-capture webhook");

    let signature = match headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) {
        Some(signature) => signature.to_string(),
        None => {
            warn!("Missing webhook signature");
            return Err(AppError::new(AppErrorKind::Validation(
                ValidationError::MissingField {
                    field: SIGNATURE_HEADER.to_string(),
                },
            )));
        }
    };

    let outcome = state.orchestrator.handle_webhook(&body, &signature).await?;
    Ok(Json(outcome))
}
