//! Unpaid-order timeout. The sweep reads it on every run, so a change
//! here applies from the next tick without a restart.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/settings/cancellation-timeout",
        get(get_timeout).put(set_timeout),
    )
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TimeoutBody {
    pub hours: i64,
}

async fn get_timeout(State(state): State<AppState>) -> ApiResult<Json<TimeoutBody>> {
    let hours = state.db.settings().cancellation_timeout_hours().await?;
    Ok(Json(TimeoutBody { hours }))
}

async fn set_timeout(
    State(state): State<AppState>,
    Json(body): Json<TimeoutBody>,
) -> ApiResult<Json<TimeoutBody>> {
    state
        .db
        .settings()
        .set_cancellation_timeout_hours(body.hours)
        .await?;
    info!(hours = body.hours, "Cancellation timeout updated over HTTP");
    Ok(Json(body))
}
