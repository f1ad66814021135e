use crate::{
    app::AppState,
    error::CheckoutError,
    models::ApiResponse,
    services::status::StatusReport,
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    pub retries: Option<u32>,
    pub merchant_id: Option<String>,
}

pub async fn get_status(
    State(state): State<AppState>,
    Path(checkout_id): Path<String>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<ApiResponse<StatusReport>>, CheckoutError> {
    let retries = state.config.poll_retries(query.retries);
    let report = state
        .status
        .poll_status(&checkout_id, query.merchant_id, retries)
        .await?;
    Ok(Json(ApiResponse::ok(report)))
}
