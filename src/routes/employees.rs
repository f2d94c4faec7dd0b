// src/routes/employees.rs

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{client_error, internal_error, non_empty, ApiError, ApiResult, SearchQ};
use crate::models::{Employee, EMPLOYEE_TITLES};
use crate::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchRoleBody {
    pub empname: String,
    pub new_role: String,
}

#[derive(Serialize)]
pub struct Updated { pub updated: bool }

/// GET /api/employee[?q=..]
pub async fn list_employees(
    State(state): State<AppState>,
    Query(q): Query<SearchQ>,
) -> ApiResult<Vec<Employee>> {
    let rows = state
        .store
        .employees(non_empty(&q.q))
        .await
        .map_err(client_error)?;
    Ok(Json(rows))
}

/// PATCH /api/employee: change an employee's title.
pub async fn patch_role(
    State(state): State<AppState>,
    Json(b): Json<PatchRoleBody>,
) -> ApiResult<Updated> {
    if !EMPLOYEE_TITLES.contains(&b.new_role.as_str()) {
        return Err(ApiError::bad_request(format!(
            "newRole must be one of {}",
            EMPLOYEE_TITLES.join(", ")
        )));
    }

    let n = state
        .store
        .set_employee_title(&b.empname, &b.new_role)
        .await
        .map_err(internal_error)?;
    if n == 0 {
        return Err(ApiError::not_found(format!("no employee named '{}'", b.empname)));
    }

    tracing::info!(empname = %b.empname, role = %b.new_role, rows = n, "employee title updated");
    Ok(Json(Updated { updated: true }))
}
