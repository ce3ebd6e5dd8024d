// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! Every client-side failure renders the same JSON:API body
//! (`401 Unauthorized / Authentication failed`); the specific reason is only
//! logged, so callers cannot probe which check rejected their token.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;

/// Authentication error type.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No authorization header present
    #[error("Authorization header is required")]
    MissingAuthHeader,
    /// Invalid authorization header format
    #[error("Invalid authorization header format (expected 'Bearer <token>')")]
    InvalidAuthHeader,
    /// Token is malformed
    #[error("Token is malformed")]
    MalformedToken,
    /// Token signature is invalid
    #[error("Token signature is invalid")]
    InvalidSignature,
    /// Token has expired
    #[error("Token has expired")]
    TokenExpired,
    /// Token issuer is invalid
    #[error("Token issuer is invalid")]
    InvalidIssuer,
    /// Token audience is invalid
    #[error("Token audience is invalid")]
    InvalidAudience,
    /// Token is not yet valid
    #[error("Token is not yet valid")]
    TokenNotYetValid,
    /// Token is not an ID token
    #[error("Token is not an ID token")]
    InvalidTokenUse,
    /// Identity claims do not resolve to `region:uuid`
    #[error("Token does not carry a valid identity")]
    InvalidIdentity,
    /// No matching key in JWKS
    #[error("No matching key found in JWKS")]
    NoMatchingKey,
    /// JWKS fetch failed
    #[error("Failed to fetch JWKS: {0}")]
    JwksFetchError(String),
    /// Internal error
    #[error("Internal authentication error: {0}")]
    InternalError(String),
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::InvalidAudience => "invalid_audience",
            AuthError::TokenNotYetValid => "token_not_yet_valid",
            AuthError::InvalidTokenUse => "invalid_token_use",
            AuthError::InvalidIdentity => "invalid_identity",
            AuthError::NoMatchingKey => "no_matching_key",
            AuthError::JwksFetchError(_) => "jwks_fetch_error",
            AuthError::InternalError(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::JwksFetchError(_) | AuthError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if self.status_code() == StatusCode::UNAUTHORIZED {
            tracing::info!(error_code = self.error_code(), reason = %self, "Authentication failed");
            ApiError::unauthorized().into_response()
        } else {
            tracing::error!(error_code = self.error_code(), reason = %self, "Authentication unavailable");
            ApiError::internal().into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn missing_auth_returns_401() {
        let response = AuthError::MissingAuthHeader.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["errors"][0]["status"], 401);
        assert_eq!(body["errors"][0]["title"], "Unauthorized");
        assert_eq!(body["errors"][0]["detail"], "Authentication failed");
    }

    #[tokio::test]
    async fn rejection_reasons_are_not_disclosed() {
        let expired = AuthError::TokenExpired.into_response();
        let wrong_use = AuthError::InvalidTokenUse.into_response();
        let a = to_bytes(expired.into_body(), usize::MAX).await.unwrap();
        let b = to_bytes(wrong_use.into_body(), usize::MAX).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn jwks_failure_returns_500() {
        let response = AuthError::JwksFetchError("timeout".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
