//! # HTTP Routes
//!
//! | Method | Path | Operation |
//! |---|---|---|
//! | GET | `/health` | liveness + DB check |
//! | GET, DELETE | `/carts/{owner_kind}/{owner_id}` | list / clear cart |
//! | POST | `/carts/{owner_kind}/{owner_id}/items` | add item |
//! | PUT, DELETE | `/carts/{owner_kind}/{owner_id}/items/{product_id}` | set quantity / remove |
//! | POST | `/checkout/{owner_kind}/{owner_id}` | check out the cart |
//! | GET | `/orders/{invoice_id}` | invoice, lines, status, payment |
//! | GET, PUT | `/orders/{invoice_id}/status` | read / advance status |
//! | POST | `/orders/{invoice_id}/cancel` | cancel and restock |
//! | GET | `/orders/{invoice_id}/status-log` | status history |
//! | POST | `/orders/{invoice_id}/payment` | upload transfer proof |
//! | GET, PUT | `/settings/cancellation-timeout` | unpaid-order timeout |
//! | POST | `/supplies` | receive a supplier invoice |
//! | PUT | `/products/{product_id}/price` | change price |
//! | GET | `/customers/{customer_id}/orders` | order history |
//!
//! `owner_kind` is `customer` or `cashier`. Bodies are camelCase JSON.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

pub mod carts;
pub mod checkout;
pub mod orders;
pub mod products;
pub mod settings;
pub mod supplies;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(carts::routes())
        .merge(checkout::routes())
        .merge(orders::routes())
        .merge(settings::routes())
        .merge(supplies::routes())
        .merge(products::routes())
        .with_state(state)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    database: bool,
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let database = state.db.health_check().await;
    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(HealthResponse {
            status: if database { "ok" } else { "degraded" },
            database,
        }),
    )
}
