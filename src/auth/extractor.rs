// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the authenticated caller.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(identity): Auth) -> impl IntoResponse {
//!     // identity is CallerIdentity
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, decode_header, errors::ErrorKind, Validation};

use super::{AuthError, CallerIdentity, IdTokenClaims, JwksManager};
use crate::state::{AppState, AuthConfig};

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Extractor for the authenticated caller identity.
///
/// ## Authentication Modes
///
/// - **Production mode** (`JWKS_URL` set): signature, expiry, issuer and
///   audience are verified against the provider's JWKS
/// - **Development mode** (no `JWKS_URL`): structure and expiry only
///
/// In both modes tokens declaring a `token_use` other than `id` are rejected.
pub struct Auth(pub CallerIdentity);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<CallerIdentity>().cloned() {
            return Ok(Auth(identity));
        }

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let token = bearer_token(auth_header)?;
        let identity = verify_token(token, &state.auth_config).await?;

        tracing::debug!(identity_id = %identity, "Caller authenticated");
        Ok(Auth(identity))
    }
}

/// Extract the token from `Bearer <token>`; a bare token is also accepted.
fn bearer_token(header: &str) -> Result<&str, AuthError> {
    let token = match header.strip_prefix("Bearer ") {
        Some(token) => token.trim(),
        None => header.trim(),
    };
    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(AuthError::InvalidAuthHeader);
    }
    Ok(token)
}

async fn verify_token(token: &str, auth_config: &AuthConfig) -> Result<CallerIdentity, AuthError> {
    let claims = match &auth_config.jwks {
        Some(jwks) => verify_token_production(token, jwks, auth_config).await?,
        None => verify_token_development(token)?,
    };

    if !claims.is_id_token() {
        return Err(AuthError::InvalidTokenUse);
    }

    claims.resolve_identity(&auth_config.identity_region)
}

/// Production verification against the JWKS.
async fn verify_token_production(
    token: &str,
    jwks: &JwksManager,
    auth_config: &AuthConfig,
) -> Result<IdTokenClaims, AuthError> {
    let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;

    let (decoding_key, algorithm) = match &header.kid {
        Some(kid) => jwks.get_decoding_key(kid).await?,
        None => jwks.get_any_decoding_key().await?,
    };

    let mut validation = Validation::new(algorithm);
    validation.leeway = CLOCK_SKEW_LEEWAY;

    if let Some(issuer) = &auth_config.issuer {
        validation.set_issuer(&[issuer]);
    }

    match &auth_config.audience {
        Some(audience) => validation.set_audience(&[audience]),
        None => validation.validate_aud = false,
    }

    let token_data = decode::<IdTokenClaims>(token, &decoding_key, &validation).map_err(|e| {
        match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
            ErrorKind::InvalidAudience => AuthError::InvalidAudience,
            ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
            _ => AuthError::MalformedToken,
        }
    })?;

    Ok(token_data.claims)
}

/// Development verification (no signature check).
///
/// WARNING: This should only be used in development environments.
fn verify_token_development(token: &str) -> Result<IdTokenClaims, AuthError> {
    let token_data = jsonwebtoken::dangerous::insecure_decode::<IdTokenClaims>(token)
        .map_err(|_| AuthError::MalformedToken)?;

    let claims = token_data.claims;
    let now = chrono::Utc::now().timestamp();
    if claims.exp > 0 && claims.exp < now - CLOCK_SKEW_LEEWAY as i64 {
        return Err(AuthError::TokenExpired);
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_state;
    use axum::http::Request;

    const UUID: &str = "b184a1e4-5327-49fb-9030-eeee3f8a5d14";

    /// Unsigned test JWT; development mode ignores the signature.
    fn create_test_jwt(claims: serde_json::Value) -> String {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

        let header = r#"{"alg":"RS256","typ":"JWT"}"#;
        let header_b64 = URL_SAFE_NO_PAD.encode(header.as_bytes());
        let claims_b64 = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
        format!("{header_b64}.{claims_b64}.fake_signature")
    }

    fn id_token(sub: &str) -> String {
        create_test_jwt(serde_json::json!({
            "sub": sub,
            "exp": 9999999999i64,
            "iss": "test",
            "token_use": "id",
        }))
    }

    fn parts_with(header: Option<String>) -> Parts {
        let mut builder = Request::builder().uri("/test");
        if let Some(value) = header {
            builder = builder.header("Authorization", value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn auth_extractor_requires_auth_header() {
        let state = test_state();
        let mut parts = parts_with(None);

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingAuthHeader)));
    }

    #[tokio::test]
    async fn auth_extractor_resolves_identity_from_subject() {
        let state = test_state();
        let mut parts = parts_with(Some(format!("Bearer {}", id_token(UUID))));

        let Auth(identity) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(identity.identity_id(), format!("eu-central-1:{UUID}"));
    }

    #[tokio::test]
    async fn auth_extractor_accepts_bare_token() {
        let state = test_state();
        let mut parts = parts_with(Some(id_token(UUID)));

        let Auth(identity) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(identity.uuid(), UUID);
    }

    #[tokio::test]
    async fn auth_extractor_prefers_identity_claim() {
        let state = test_state();
        let token = create_test_jwt(serde_json::json!({
            "sub": "some-user-pool-sub",
            "exp": 9999999999i64,
            "token_use": "id",
            "identity_id": "us-east-1:6f1c3a52-0d8e-4b7a-9d55-2f3e8c1b9a70",
        }));
        let mut parts = parts_with(Some(format!("Bearer {token}")));

        let Auth(identity) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(identity.region(), "us-east-1");
        assert_eq!(identity.uuid(), "6f1c3a52-0d8e-4b7a-9d55-2f3e8c1b9a70");
    }

    #[tokio::test]
    async fn auth_extractor_rejects_access_tokens() {
        let state = test_state();
        let token = create_test_jwt(serde_json::json!({
            "sub": UUID,
            "exp": 9999999999i64,
            "token_use": "access",
        }));
        let mut parts = parts_with(Some(format!("Bearer {token}")));

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InvalidTokenUse)));
    }

    #[tokio::test]
    async fn auth_extractor_rejects_expired_tokens() {
        let state = test_state();
        let token = create_test_jwt(serde_json::json!({
            "sub": UUID,
            "exp": 1609459200i64,
            "token_use": "id",
        }));
        let mut parts = parts_with(Some(format!("Bearer {token}")));

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[tokio::test]
    async fn auth_extractor_rejects_unresolvable_identity() {
        let state = test_state();
        let mut parts = parts_with(Some(format!("Bearer {}", id_token("user_123"))));

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InvalidIdentity)));
    }

    #[tokio::test]
    async fn auth_extractor_rejects_garbage() {
        let state = test_state();
        let mut parts = parts_with(Some("Bearer not.a.jwt".to_string()));

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MalformedToken)));
    }

    #[tokio::test]
    async fn auth_extractor_prefers_extensions() {
        let state = test_state();
        let mut parts = parts_with(None);
        let identity = CallerIdentity::new("eu-central-1", UUID).unwrap();
        parts.extensions.insert(identity.clone());

        let Auth(resolved) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(resolved, identity);
    }

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc").unwrap(), "abc");
        assert_eq!(bearer_token("abc").unwrap(), "abc");
        assert!(matches!(bearer_token("Bearer "), Err(AuthError::InvalidAuthHeader)));
        assert!(matches!(bearer_token("Basic a b"), Err(AuthError::InvalidAuthHeader)));
    }
}
