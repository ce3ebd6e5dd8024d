// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP error responses in the JSON:API error format.
//!
//! ```json
//! {"errors":[{"status":404,"title":"Not Found","detail":"Not Found"}]}
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::storage::RepositoryError;

/// Location of the offending member in the request document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ErrorSource {
    /// JSON pointer, e.g. `/data/attributes/title`.
    pub pointer: String,
}

/// One JSON:API error object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ErrorObject {
    pub status: u16,
    pub title: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ErrorSource>,
}

/// Error document returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorDocument {
    pub errors: Vec<ErrorObject>,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub errors: Vec<ErrorObject>,
}

fn reason(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or("Error").to_string()
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            errors: vec![ErrorObject {
                status: status.as_u16(),
                title: reason(status),
                detail: detail.into(),
                source: None,
            }],
        }
    }

    /// Error whose detail repeats its title, so nothing about the cause leaks.
    fn generic(status: StatusCode) -> Self {
        Self::new(status, reason(status))
    }

    pub fn not_found() -> Self {
        Self::generic(StatusCode::NOT_FOUND)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Authentication failed")
    }

    pub fn internal() -> Self {
        Self::generic(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// 422 with one error object per `(pointer, detail)` pair.
    pub fn unprocessable<I>(issues: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let status = StatusCode::UNPROCESSABLE_ENTITY;
        Self {
            status,
            errors: issues
                .into_iter()
                .map(|(pointer, detail)| ErrorObject {
                    status: status.as_u16(),
                    title: reason(status),
                    detail,
                    source: Some(ErrorSource { pointer }),
                })
                .collect(),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => ApiError::not_found(),
            other => {
                tracing::error!(error = %other, "Login item operation failed");
                ApiError::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorDocument {
            errors: self.errors,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ParameterStoreError;
    use axum::body::to_bytes;

    async fn body_of(error: ApiError) -> serde_json::Value {
        let response = error.into_response();
        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body_bytes).unwrap()
    }

    #[test]
    fn constructors_set_status() {
        assert_eq!(ApiError::not_found().status, StatusCode::NOT_FOUND);
        assert_eq!(ApiError::unauthorized().status, StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::internal().status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            ApiError::unprocessable(Vec::new()).status,
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[tokio::test]
    async fn into_response_returns_error_document() {
        let response = ApiError::not_found().into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(
            body,
            r#"{"errors":[{"status":404,"title":"Not Found","detail":"Not Found"}]}"#
        );
    }

    #[tokio::test]
    async fn unprocessable_carries_pointers() {
        let body = body_of(ApiError::unprocessable([
            ("/data/attributes/title".to_string(), "\"title\" is required".to_string()),
            ("/data/type".to_string(), "\"type\" must be [logins]".to_string()),
        ]))
        .await;

        let errors = body["errors"].as_array().unwrap();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0]["status"], 422);
        assert_eq!(errors[0]["source"]["pointer"], "/data/attributes/title");
        assert_eq!(errors[1]["detail"], "\"type\" must be [logins]");
    }

    #[tokio::test]
    async fn repository_errors_map_to_404_or_500() {
        assert_eq!(
            ApiError::from(RepositoryError::NotFound).status,
            StatusCode::NOT_FOUND
        );

        let upstream = ApiError::from(RepositoryError::Upstream(ParameterStoreError::Other(
            "ThrottlingException: rate exceeded".into(),
        )));
        assert_eq!(upstream.status, StatusCode::INTERNAL_SERVER_ERROR);

        // Server-side causes are never echoed to the client.
        let body = body_of(upstream).await;
        assert_eq!(body["errors"][0]["detail"], "Internal Server Error");
    }
}
