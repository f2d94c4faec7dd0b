// src/routes/products.rs

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::{client_error, non_empty, ApiError};
use crate::aggregate::{series_for_category, summarize};
use crate::models::{SeriesResponse, SummaryResponse};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ProductsQ {
    pub category: Option<String>,
}

/// GET /api/products[?category=..]
///
/// Without a category: per-category summary over every purchase.
/// With one: that category's monthly series, including return counts.
pub async fn get_products(
    State(state): State<AppState>,
    Query(q): Query<ProductsQ>,
) -> Result<Response, ApiError> {
    let Some(category) = non_empty(&q.category) else {
        let purchases = state.store.purchases(None).await.map_err(client_error)?;
        let summary = summarize(&purchases);
        tracing::debug!(rows = purchases.len(), categories = summary.categories.len(), "summarized purchases");
        return Ok(Json(SummaryResponse::from(summary)).into_response());
    };

    let purchases = state.store.purchases(Some(category)).await.map_err(client_error)?;
    let returns = state.store.returns().await.map_err(client_error)?;
    let series = series_for_category(&purchases, &returns, category);
    tracing::debug!(category, rows = purchases.len(), months = series.len(), "built monthly series");

    Ok(Json(SeriesResponse { category: category.to_string(), series }).into_response())
}
