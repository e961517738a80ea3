//! Receiving goods from a supplier.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};

use crate::error::ApiResult;
use crate::state::AppState;
use toko_core::SupplyInvoiceRequest;
use toko_db::SupplyReceipt;

pub fn routes() -> Router<AppState> {
    Router::new().route("/supplies", post(create_supply_invoice))
}

async fn create_supply_invoice(
    State(state): State<AppState>,
    Json(request): Json<SupplyInvoiceRequest>,
) -> ApiResult<(StatusCode, Json<SupplyReceipt>)> {
    let receipt = state.db.supplies().create_supply_invoice(&request).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
