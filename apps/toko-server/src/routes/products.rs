//! Price changes. Each change is written to the pricing log; carts pick
//! up the new price at once, placed orders keep theirs.

use axum::extract::{Path, State};
use axum::routing::put;
use axum::{Json, Router};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::state::AppState;
use toko_core::{Money, Product};

pub fn routes() -> Router<AppState> {
    Router::new().route("/products/{product_id}/price", put(update_price))
}

#[derive(Debug, Deserialize)]
pub struct PriceBody {
    pub price: Money,
}

async fn update_price(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    Json(body): Json<PriceBody>,
) -> ApiResult<Json<Product>> {
    let product = state
        .db
        .products()
        .update_price(&product_id, body.price)
        .await?;
    Ok(Json(product))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::TestApp;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_price_change_is_logged() {
        let app = TestApp::new().await;
        let telur = app.product("TLR-10", 28_000, 10).await;

        let (status, product) = app
            .call(
                Method::PUT,
                &format!("/products/{}/price", telur.id),
                Some(json!({ "price": 29_500 })),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(product["price"], 29_500);

        let history = app.db.products().pricing_history(&telur.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].old_price.rupiah(), 28_000);
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let app = TestApp::new().await;
        let (status, _) = app
            .call(Method::PUT, "/products/ghost/price", Some(json!({ "price": 1_000 })))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
