// src/routes/marketing.rs

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{internal_error, ApiError, ApiResult};
use crate::models::{Message, UserListCriteria};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQ {
    pub listid: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRef {
    pub list_id: Option<i64>,
}

const ACTIONS: [&str; 3] = ["refreshAll", "createUserList", "getCustomersByList"];

/// POST body, dispatched on `action`.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum MarketingAction {
    RefreshAll,
    CreateUserList(UserListCriteria),
    GetCustomersByList(ListRef),
}

#[derive(Serialize)]
pub struct Deleted { pub deleted: bool }

/// GET /api/marketing: all lists, or the customers on `?listid=`.
pub async fn get_lists(
    State(state): State<AppState>,
    Query(q): Query<ListQ>,
) -> Result<Response, ApiError> {
    if let Some(id) = q.listid {
        let rows = state.store.list_customers(id).await.map_err(internal_error)?;
        return Ok(Json(rows).into_response());
    }
    let lists = state.store.email_lists().await.map_err(internal_error)?;
    Ok(Json(lists).into_response())
}

/// DELETE /api/marketing?listid=..
pub async fn delete_list(
    State(state): State<AppState>,
    Query(q): Query<ListQ>,
) -> ApiResult<Deleted> {
    let id = q.listid.ok_or_else(|| ApiError::bad_request("listid is required"))?;
    let deleted = state.store.delete_email_list(id).await.map_err(internal_error)?;
    tracing::info!(list_id = id, deleted, "email list delete");
    Ok(Json(Deleted { deleted }))
}

/// POST /api/marketing
pub async fn post_action(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, ApiError> {
    let name = body.get("action").and_then(serde_json::Value::as_str).unwrap_or_default();
    if !ACTIONS.contains(&name) {
        tracing::debug!(action = name, "unrecognised marketing action");
        return Err(ApiError::bad_request("Invalid action"));
    }
    let name = name.to_string();
    let action: MarketingAction = serde_json::from_value(body)
        .map_err(|e| ApiError::bad_request(format!("invalid {name} request: {e}")))?;

    match action {
        MarketingAction::RefreshAll => {
            state.store.refresh_email_lists().await.map_err(internal_error)?;
            Ok(message("All lists refreshed successfully"))
        }
        MarketingAction::CreateUserList(criteria) => {
            let has_title = criteria.list_title.as_deref().is_some_and(|t| !t.trim().is_empty());
            if !has_title {
                return Err(ApiError::bad_request("listTitle is required"));
            }
            state.store.create_user_list(&criteria).await.map_err(internal_error)?;
            tracing::info!(title = ?criteria.list_title, "user list created/updated");
            Ok(message("User list created/updated successfully"))
        }
        MarketingAction::GetCustomersByList(ListRef { list_id }) => {
            let id = list_id.ok_or_else(|| ApiError::bad_request("listId is required"))?;
            let rows = state.store.list_customers(id).await.map_err(internal_error)?;
            Ok(Json(rows).into_response())
        }
    }
}

fn message(text: &str) -> Response {
    Json(Message { message: text.to_string() }).into_response()
}
