use crate::{
    app::AppState,
    error::CheckoutError,
    models::ApiResponse,
    services::status::TransactionPage,
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Path(merchant_id): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<TransactionPage>>, CheckoutError> {
    let listing = state
        .status
        .list_transactions(&merchant_id, page.offset, page.limit)
        .await?;
    Ok(Json(ApiResponse::ok(listing)))
}
