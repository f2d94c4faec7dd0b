// src/routes/customers.rs

use axum::extract::{Query, State};
use axum::Json;

use super::{client_error, non_empty, ApiResult, SearchQ};
use crate::{models::Customer, AppState};

/// GET /api/customer[?q=..]: name or email contains `q`.
pub async fn list_customers(
    State(state): State<AppState>,
    Query(q): Query<SearchQ>,
) -> ApiResult<Vec<Customer>> {
    let rows = state
        .store
        .customers(non_empty(&q.q))
        .await
        .map_err(client_error)?;
    Ok(Json(rows))
}
