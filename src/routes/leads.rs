use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::warn;

use crate::error::AppError;
use crate::leads::{LeadForm, LeadReceipt};
use crate::AppState;

/// Submit the care-manager sign-up form
#[utoipa::path(
    post,
    path = "/leads",
    request_body = LeadForm,
    responses(
        (status = 200, description = "Lead accepted; the returned form is reset", body = LeadReceipt),
        (status = 400, description = "Required fields missing, email malformed or body not a JSON form"),
        (status = 502, description = "Form relay rejected the submission or was unreachable; safe to retry")
    ),
    description = "Validates the lead form and relays it once to the form-relay service."
)]
pub async fn submit_lead(
    State(state): State<AppState>,
    form: Result<Json<LeadForm>, JsonRejection>,
) -> Result<Json<LeadReceipt>, AppError> {
    let Json(form) = form.map_err(|rejection| {
        warn!("Unreadable lead form: {}", rejection.body_text());
        AppError::InvalidRequest(rejection.body_text())
    })?;
    let receipt = state.leads.submit(&form).await?;
    Ok(Json(receipt))
}
