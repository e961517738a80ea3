//! # Order Routes
//!
//! Reading an order, moving it along its status path, cancelling it and
//! accepting the customer's transfer proof.
//!
//! ```text
//! pickup:    menunggu pembayaran → diproses → menunggu pengambilan → selesai
//! delivery:  menunggu pembayaran → diproses → diantar → selesai
//!            any non-terminal status → dibatalkan (stock returned)
//! ```

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::state::AppState;
use toko_core::{Invoice, OrderStatus, OrderStatusRecord, OrderView, PaymentProof, StatusLogEntry};
use toko_db::{PaymentOutcome, Transition};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders/{invoice_id}", get(get_order))
        .route(
            "/orders/{invoice_id}/status",
            get(get_status).put(update_status),
        )
        .route("/orders/{invoice_id}/cancel", post(cancel_order))
        .route("/orders/{invoice_id}/status-log", get(status_log))
        .route("/orders/{invoice_id}/payment", post(upload_payment))
        .route("/customers/{customer_id}/orders", get(customer_orders))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusBody {
    pub status: OrderStatus,
    #[serde(default)]
    pub cashier_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelBody {
    #[serde(default)]
    pub cashier_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_history_limit")]
    pub limit: u32,
}

fn default_history_limit() -> u32 {
    50
}

async fn customer_orders(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<Invoice>>> {
    let orders = state
        .db
        .invoices()
        .list_for_customer(&customer_id, query.limit.min(200))
        .await?;
    Ok(Json(orders))
}

async fn get_order(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
) -> ApiResult<Json<OrderView>> {
    Ok(Json(state.db.invoices().get_order(&invoice_id).await?))
}

async fn get_status(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
) -> ApiResult<Json<OrderStatusRecord>> {
    Ok(Json(state.db.orders().get_status(&invoice_id).await?))
}

async fn update_status(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
    Json(body): Json<UpdateStatusBody>,
) -> ApiResult<Json<Transition>> {
    let transition = state
        .db
        .orders()
        .update_status(&invoice_id, body.status, body.cashier_id.as_deref())
        .await?;
    Ok(Json(transition))
}

/// The body is optional: a bare POST cancels without recording a cashier.
async fn cancel_order(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
    body: Option<Json<CancelBody>>,
) -> ApiResult<Json<Transition>> {
    let cashier_id = body.and_then(|Json(body)| body.cashier_id);
    let transition = state
        .db
        .orders()
        .cancel_order(&invoice_id, cashier_id.as_deref())
        .await?;
    Ok(Json(transition))
}

async fn status_log(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
) -> ApiResult<Json<Vec<StatusLogEntry>>> {
    Ok(Json(state.db.orders().history(&invoice_id).await?))
}

async fn upload_payment(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
    Json(proof): Json<PaymentProof>,
) -> ApiResult<Json<PaymentOutcome>> {
    let outcome = state
        .db
        .payments()
        .upload_payment_proof(&invoice_id, &proof)
        .await?;
    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::TestApp;
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use toko_core::{
        Actor, CheckoutLine, CheckoutOptions, CheckoutReceipt, CheckoutRequest, Customer,
        OrderType, PaymentOption,
    };

    async fn place_order(
        app: &TestApp,
        customer: &Customer,
        product_id: &str,
        qty: i64,
    ) -> CheckoutReceipt {
        app.db
            .checkout()
            .checkout(&CheckoutRequest {
                actor: Actor::Customer(customer.id.clone()),
                items: vec![CheckoutLine::new(product_id, qty)],
                options: CheckoutOptions::new(OrderType::Pickup, PaymentOption::Transfer),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_pay_then_walk_the_pickup_path() {
        let app = TestApp::new().await;
        let (customer, cashier) = app.people().await;
        let beras = app.product("BRS-05", 72_000, 5).await;
        let receipt = place_order(&app, &customer, &beras.id, 1).await;
        let base = format!("/orders/{}", receipt.invoice_id);

        let (status, outcome) = app
            .call(
                Method::POST,
                &format!("{base}/payment"),
                Some(json!({ "amount": 72_000, "proofImage": "bukti/001.jpg" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["status"], "diproses");

        let (status, transition) = app
            .call(
                Method::PUT,
                &format!("{base}/status"),
                Some(json!({ "status": "menunggu pengambilan", "cashierId": cashier.id })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(transition["from"], "diproses");
        assert_eq!(transition["to"], "menunggu pengambilan");

        let (_, record) = app.call(Method::GET, &format!("{base}/status"), None).await;
        assert_eq!(record["status"], "menunggu pengambilan");

        let (_, log) = app.call(Method::GET, &format!("{base}/status-log"), None).await;
        assert_eq!(log.as_array().unwrap().len(), 3);

        let (status, order) = app.call(Method::GET, &base, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(order["details"].as_array().unwrap().len(), 1);
        assert_eq!(order["payment"]["amount"], 72_000);

        let (_, history) = app
            .call(Method::GET, &format!("/customers/{}/orders", customer.id), None)
            .await;
        assert_eq!(history[0]["id"], receipt.invoice_id.as_str());
    }

    #[tokio::test]
    async fn test_skipping_a_step_is_conflict() {
        let app = TestApp::new().await;
        let (customer, _) = app.people().await;
        let p = app.product("P", 1_000, 5).await;
        let receipt = place_order(&app, &customer, &p.id, 1).await;

        let (status, body) = app
            .call(
                Method::PUT,
                &format!("/orders/{}/status", receipt.invoice_id),
                Some(json!({ "status": "selesai" })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "INVALID_TRANSITION");
    }

    #[tokio::test]
    async fn test_cancel_restocks_once() {
        let app = TestApp::new().await;
        let (customer, _) = app.people().await;
        let p = app.product("P", 1_000, 5).await;
        let receipt = place_order(&app, &customer, &p.id, 2).await;
        let uri = format!("/orders/{}/cancel", receipt.invoice_id);

        let (status, transition) = app.call(Method::POST, &uri, Some(json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(transition["to"], "dibatalkan");
        assert_eq!(app.db.products().stock_of(&p.id).await.unwrap(), Some(5));

        let (status, body) = app.call(Method::POST, &uri, Some(json!({}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "TERMINAL_STATE");
        assert_eq!(app.db.products().stock_of(&p.id).await.unwrap(), Some(5));
    }

    #[tokio::test]
    async fn test_cancel_accepts_a_bare_post() {
        let app = TestApp::new().await;
        let (customer, cashier) = app.people().await;
        let p = app.product("P", 1_000, 5).await;

        let receipt = place_order(&app, &customer, &p.id, 3).await;
        let uri = format!("/orders/{}/cancel", receipt.invoice_id);
        let (status, transition) = app.call(Method::POST, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(transition["to"], "dibatalkan");
        assert_eq!(transition["cashierId"], serde_json::Value::Null);
        assert_eq!(app.db.products().stock_of(&p.id).await.unwrap(), Some(5));

        let receipt = place_order(&app, &customer, &p.id, 1).await;
        let uri = format!("/orders/{}/cancel", receipt.invoice_id);
        let (status, transition) = app
            .call(Method::POST, &uri, Some(json!({ "cashierId": cashier.id })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(transition["cashierId"], cashier.id.as_str());

        let (status, body) = app.call(Method::POST, "/orders/ghost/cancel", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_unknown_invoice_is_not_found() {
        let app = TestApp::new().await;
        for uri in ["/orders/ghost", "/orders/ghost/status", "/orders/ghost/status-log"] {
            let (status, body) = app.call(Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body["code"], "NOT_FOUND");
        }
    }

    #[tokio::test]
    async fn test_non_positive_payment_is_bad_request() {
        let app = TestApp::new().await;
        let (customer, _) = app.people().await;
        let p = app.product("P", 1_000, 5).await;
        let receipt = place_order(&app, &customer, &p.id, 1).await;

        let (status, _) = app
            .call(
                Method::POST,
                &format!("/orders/{}/payment", receipt.invoice_id),
                Some(json!({ "amount": 0 })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
