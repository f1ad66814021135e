use crate::{
    app::AppState,
    error::CheckoutError,
    handlers::parse_json,
    models::{ApiResponse, CheckoutCreated, CheckoutRequest},
};
use axum::{body::Bytes, extract::State, Json};

pub async fn create_checkout(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ApiResponse<CheckoutCreated>>, CheckoutError> {
    let request: CheckoutRequest = parse_json(&body, "checkout request")?;
    let created = state.checkout.create_checkout(request).await?;
    Ok(Json(ApiResponse::ok(created)))
}
