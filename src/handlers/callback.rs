use crate::{
    app::AppState,
    error::CheckoutError,
    handlers::parse_json,
    models::{ApiResponse, CallbackOutcome, PromiseToPay},
};
use axum::{
    body::Bytes,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub p2p: Option<String>,
}

/// Wallet callback with the proof in the request body.
pub async fn post_callback(State(state): State<AppState>, body: Bytes) -> Result<Response, CheckoutError> {
    let proof: PromiseToPay = parse_json(&body, "P2P object")?;
    let outcome = state.callbacks.handle_callback(proof).await?;
    Ok(respond(outcome))
}

/// Wallet callback with the proof as URL-encoded JSON in `?p2p=`.
pub async fn get_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, CheckoutError> {
    let raw = query
        .p2p
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| CheckoutError::validation("Missing p2p query parameter"))?;
    let proof: PromiseToPay = parse_json(raw.as_bytes(), "p2p JSON")?;
    let outcome = state.callbacks.handle_callback(proof).await?;
    Ok(respond(outcome))
}

fn respond(outcome: CallbackOutcome) -> Response {
    match outcome.redirect_url() {
        Some(url) => {
            tracing::info!(
                reference = %outcome.reference,
                status = outcome.payment_status,
                "Redirecting callback to {}",
                url
            );
            Redirect::to(url.as_str()).into_response()
        }
        None => Json(ApiResponse::with_outcome(outcome.is_success, outcome)).into_response(),
    }
}
