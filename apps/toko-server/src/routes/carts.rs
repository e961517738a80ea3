//! # Cart Routes
//!
//! Customers and cashiers each have their own cart, addressed by
//! `/carts/{owner_kind}/{owner_id}`. Every edit is checked against the
//! product's current stock but reserves nothing; stock is only taken at
//! checkout.

use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiResult;
use crate::state::AppState;
use toko_core::{Actor, ActorKind, CartSummary};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/carts/{owner_kind}/{owner_id}",
            get(list_cart).delete(clear_cart),
        )
        .route(
            "/carts/{owner_kind}/{owner_id}/items",
            axum::routing::post(add_item),
        )
        .route(
            "/carts/{owner_kind}/{owner_id}/items/{product_id}",
            put(set_quantity).delete(remove_item),
        )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemBody {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct SetQuantityBody {
    pub quantity: i64,
}

/// Line quantity after an edit. `None` means the line is gone.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineResponse {
    pub product_id: String,
    pub quantity: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RemovedResponse {
    pub removed: u64,
}

async fn list_cart(
    State(state): State<AppState>,
    Path((kind, owner_id)): Path<(ActorKind, String)>,
) -> ApiResult<Json<CartSummary>> {
    let owner = Actor::new(kind, owner_id);
    Ok(Json(state.db.carts().list(&owner).await?))
}

async fn add_item(
    State(state): State<AppState>,
    Path((kind, owner_id)): Path<(ActorKind, String)>,
    Json(body): Json<AddItemBody>,
) -> ApiResult<Json<LineResponse>> {
    let owner = Actor::new(kind, owner_id);
    debug!(%owner, product_id = %body.product_id, qty = body.quantity, "add_item");

    let quantity = state
        .db
        .carts()
        .add_item(&owner, &body.product_id, body.quantity)
        .await?;

    Ok(Json(LineResponse {
        product_id: body.product_id,
        quantity: Some(quantity),
    }))
}

async fn set_quantity(
    State(state): State<AppState>,
    Path((kind, owner_id, product_id)): Path<(ActorKind, String, String)>,
    Json(body): Json<SetQuantityBody>,
) -> ApiResult<Json<LineResponse>> {
    let owner = Actor::new(kind, owner_id);
    let quantity = state
        .db
        .carts()
        .set_quantity(&owner, &product_id, body.quantity)
        .await?;

    Ok(Json(LineResponse {
        product_id,
        quantity,
    }))
}

async fn remove_item(
    State(state): State<AppState>,
    Path((kind, owner_id, product_id)): Path<(ActorKind, String, String)>,
) -> ApiResult<Json<RemovedResponse>> {
    let owner = Actor::new(kind, owner_id);
    let removed = state.db.carts().remove_item(&owner, &product_id).await?;
    Ok(Json(RemovedResponse {
        removed: u64::from(removed),
    }))
}

async fn clear_cart(
    State(state): State<AppState>,
    Path((kind, owner_id)): Path<(ActorKind, String)>,
) -> ApiResult<Json<RemovedResponse>> {
    let owner = Actor::new(kind, owner_id);
    let removed = state.db.carts().clear(&owner).await?;
    Ok(Json(RemovedResponse { removed }))
}
