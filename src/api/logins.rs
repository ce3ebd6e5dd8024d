// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login item endpoints.
//!
//! Every handler authenticates first, then validates the request body, then
//! checks the shape of the `{id}` path segment, and only then reaches the
//! repository bound to the caller.

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::{
    auth::Auth,
    error::{ApiError, ErrorDocument},
    models::{
        validate_create, validate_update, CreateLoginItemRequest, LoginItemApi,
        LoginItemDocument, LoginItemListDocument, UpdateLoginItemRequest, VersionQuery,
    },
    state::AppState,
    storage::{is_valid_item_id, ItemRepository, LoginItem},
};

fn to_api(item: &LoginItem) -> Result<LoginItemApi, ApiError> {
    Ok(LoginItemApi::try_from(item)?)
}

/// Unparseable bodies are reported like any other invalid document.
fn body_or_422(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        tracing::info!(error = %rejection, "Rejected request body");
        ApiError::unprocessable([("/".to_string(), rejection.body_text())])
    })
}

fn check_item_id(id: &str) -> Result<(), ApiError> {
    if is_valid_item_id(id) {
        Ok(())
    } else {
        tracing::info!(id, "Malformed login item id");
        Err(ApiError::not_found())
    }
}

#[utoipa::path(
    get,
    path = "/api/v1.0/logins",
    tag = "Logins",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = LoginItemListDocument),
        (status = 401, body = ErrorDocument),
        (status = 500, body = ErrorDocument)
    )
)]
pub async fn list_login_items(
    Auth(identity): Auth,
    State(state): State<AppState>,
) -> Result<Json<LoginItemListDocument>, ApiError> {
    let repo = state.login_items(identity);
    let items = repo.list().await?;

    let data = items.iter().map(to_api).collect::<Result<Vec<_>, _>>()?;
    Ok(Json(LoginItemListDocument { data }))
}

#[utoipa::path(
    post,
    path = "/api/v1.0/logins",
    request_body = CreateLoginItemRequest,
    tag = "Logins",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = LoginItemDocument),
        (status = 401, body = ErrorDocument),
        (status = 422, body = ErrorDocument),
        (status = 500, body = ErrorDocument)
    )
)]
pub async fn create_login_item(
    Auth(identity): Auth,
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<LoginItemDocument>, ApiError> {
    let body = body_or_422(payload)?;
    let data = validate_create(&body).map_err(ApiError::unprocessable)?;

    let repo = state.login_items(identity);
    let item = repo.create(data).await?;

    tracing::info!(id = %item.id, "Login item created");
    Ok(Json(LoginItemDocument {
        data: to_api(&item)?,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1.0/logins/{id}",
    params(
        ("id" = String, Path, description = "Identifier of the login item"),
        VersionQuery
    ),
    tag = "Logins",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = LoginItemDocument),
        (status = 401, body = ErrorDocument),
        (status = 404, body = ErrorDocument),
        (status = 500, body = ErrorDocument)
    )
)]
pub async fn get_login_item(
    Auth(identity): Auth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<VersionQuery>, QueryRejection>,
) -> Result<Json<LoginItemDocument>, ApiError> {
    check_item_id(&id)?;
    let version = query
        .map(|Query(q)| q.requested_version())
        .unwrap_or_default();

    let repo = state.login_items(identity);
    let item = repo.get(&id, version).await?;

    Ok(Json(LoginItemDocument {
        data: to_api(&item)?,
    }))
}

#[utoipa::path(
    patch,
    path = "/api/v1.0/logins/{id}",
    params(
        ("id" = String, Path, description = "Identifier of the login item")
    ),
    request_body = UpdateLoginItemRequest,
    tag = "Logins",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = LoginItemDocument),
        (status = 401, body = ErrorDocument),
        (status = 404, body = ErrorDocument),
        (status = 422, body = ErrorDocument),
        (status = 500, body = ErrorDocument)
    )
)]
pub async fn update_login_item(
    Auth(identity): Auth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<LoginItemDocument>, ApiError> {
    let body = body_or_422(payload)?;
    let data = validate_update(&body, &id).map_err(ApiError::unprocessable)?;
    check_item_id(&id)?;

    let repo = state.login_items(identity);
    let item = repo.update(&id, data.into()).await?;

    tracing::info!(id = %item.id, version = item.version, "Login item updated");
    Ok(Json(LoginItemDocument {
        data: to_api(&item)?,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1.0/logins/{id}",
    params(
        ("id" = String, Path, description = "Identifier of the login item")
    ),
    tag = "Logins",
    security(("bearer_auth" = [])),
    responses(
        (status = 204),
        (status = 401, body = ErrorDocument),
        (status = 404, body = ErrorDocument),
        (status = 500, body = ErrorDocument)
    )
)]
pub async fn delete_login_item(
    Auth(identity): Auth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    check_item_id(&id)?;

    let repo = state.login_items(identity);
    repo.delete(&id).await?;

    tracing::info!(id = %id, "Login item deleted");
    Ok(StatusCode::NO_CONTENT)
}
