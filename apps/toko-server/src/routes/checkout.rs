//! # Checkout Route
//!
//! ```text
//! POST /checkout/customer/{id}   { "shippingOption": "delivery",
//!                                  "paymentOption": "transfer",
//!                                  "address": "Jl. Anggrek 12" }
//!      │
//!      ▼
//! db.checkout().checkout_cart(..)   one transaction:
//!      stock decrement, invoice + lines, status + log, cart emptied
//!      │
//!      ▼
//! 201 { invoiceId, invoiceNumber, orderType, status, total }
//! ```

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};

use crate::error::ApiResult;
use crate::state::AppState;
use toko_core::{Actor, ActorKind, CheckoutOptions, CheckoutReceipt};

pub fn routes() -> Router<AppState> {
    Router::new().route("/checkout/{owner_kind}/{owner_id}", post(checkout_cart))
}

async fn checkout_cart(
    State(state): State<AppState>,
    Path((kind, owner_id)): Path<(ActorKind, String)>,
    Json(options): Json<CheckoutOptions>,
) -> ApiResult<(StatusCode, Json<CheckoutReceipt>)> {
    let actor = Actor::new(kind, owner_id);
    let receipt = state.db.checkout().checkout_cart(&actor, &options).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::TestApp;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_customer_delivery_checkout() {
        let app = TestApp::new().await;
        let (customer, _) = app.people().await;
        let kopi = app.product("KPI-200", 25_000, 10).await;

        app.db
            .carts()
            .add_item(&toko_core::Actor::Customer(customer.id.clone()), &kopi.id, 3)
            .await
            .unwrap();

        let (status, receipt) = app
            .call(
                Method::POST,
                &format!("/checkout/customer/{}", customer.id),
                Some(json!({
                    "shippingOption": "delivery",
                    "paymentOption": "transfer",
                    "address": "Jl. Anggrek 12"
                })),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(receipt["status"], "menunggu pembayaran");
        assert_eq!(receipt["orderType"], "delivery");
        assert_eq!(receipt["total"], 75_000);
        assert!(receipt["invoiceNumber"].as_str().unwrap().starts_with("INV-"));
        assert_eq!(app.db.products().stock_of(&kopi.id).await.unwrap(), Some(7));
    }

    #[tokio::test]
    async fn test_empty_cart_is_unprocessable() {
        let app = TestApp::new().await;
        let (customer, _) = app.people().await;

        let (status, body) = app
            .call(
                Method::POST,
                &format!("/checkout/customer/{}", customer.id),
                Some(json!({ "shippingOption": "pickup", "paymentOption": "transfer" })),
            )
            .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "EMPTY_CART");
    }

    #[tokio::test]
    async fn test_delivery_without_address_is_bad_request() {
        let app = TestApp::new().await;
        let (_, cashier) = app.people().await;

        let (status, body) = app
            .call(
                Method::POST,
                &format!("/checkout/cashier/{}", cashier.id),
                Some(json!({ "shippingOption": "delivery", "paymentOption": "cash" })),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_counter_sale_completes_at_once() {
        let app = TestApp::new().await;
        let (_, cashier) = app.people().await;
        let mie = app.product("MIE-GRG", 3_100, 40).await;

        app.db
            .carts()
            .add_item(&toko_core::Actor::Cashier(cashier.id.clone()), &mie.id, 10)
            .await
            .unwrap();

        let (status, receipt) = app
            .call(
                Method::POST,
                &format!("/checkout/cashier/{}", cashier.id),
                Some(json!({ "shippingOption": "pickup", "paymentOption": "cash" })),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(receipt["status"], "selesai");
        assert_eq!(receipt["total"], 31_000);
    }
}
