use crate::{
    app::AppState,
    error::CheckoutError,
    handlers::parse_json,
    models::{ApiResponse, VerificationResult},
};
use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub transaction_id: Option<String>,
    /// Record to annotate with the result.
    #[serde(alias = "checkoutId")]
    pub reference: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub transaction_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(flatten)]
    pub result: VerificationResult,
}

fn report(transaction_id: String, reference: Option<String>, result: VerificationResult) -> Json<ApiResponse<VerificationReport>> {
    Json(ApiResponse::with_outcome(
        result.verified,
        VerificationReport {
            transaction_id,
            reference,
            result,
        },
    ))
}

pub async fn verify_hedera(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ApiResponse<VerificationReport>>, CheckoutError> {
    let request: VerifyRequest = parse_json(&body, "verification request")?;
    let transaction_id = request
        .transaction_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| CheckoutError::validation("Missing transactionId in request body"))?;

    let result = state
        .status
        .verify_and_record(&transaction_id, request.reference.as_deref())
        .await?;
    Ok(report(transaction_id, request.reference, result))
}

pub async fn verify_hedera_by_id(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> Result<Json<ApiResponse<VerificationReport>>, CheckoutError> {
    let result = state.status.verify_on_chain(&transaction_id).await?;
    Ok(report(transaction_id, None, result))
}
