use crate::{
    app::AppState,
    error::CheckoutError,
    handlers::parse_json,
    models::{decode_base64, ApiResponse},
    services::status::StatusReport,
};
use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct DecodedTransfer {
    pub decoded: Value,
    pub raw: String,
}

/// Single status poll for a checkout, without waiting.
pub async fn debug_status(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<Json<ApiResponse<StatusReport>>, CheckoutError> {
    let report = state.status.poll_status(&uuid, None, 1).await?;
    Ok(Json(ApiResponse::ok(report)))
}

/// Decode an `encodedHHTransfer` given directly or inside a `p2pObj`.
pub async fn decode_transfer(body: Bytes) -> Result<Json<ApiResponse<DecodedTransfer>>, CheckoutError> {
    let request: Value = parse_json(&body, "request body")?;

    let encoded = request
        .get("encodedHHTransfer")
        .or_else(|| request.get("p2pObj").and_then(|p| p.get("encodedHHTransfer")))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CheckoutError::validation("Missing encodedHHTransfer in body or p2pObj."))?;

    let bytes = decode_base64(encoded)
        .map_err(|_| CheckoutError::validation("Invalid base64 in encodedHHTransfer"))?;
    let decoded = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

    tracing::debug!(%decoded, "Decoded encodedHHTransfer");

    Ok(Json(ApiResponse::ok(DecodedTransfer {
        decoded,
        raw: encoded.to_string(),
    })))
}
