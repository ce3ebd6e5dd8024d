// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ID token claims and the resolved caller identity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::AuthError;

/// Claims read from an identity provider ID token.
///
/// Signature, expiry, issuer and audience are validated by `jsonwebtoken`
/// before these fields are used.
#[derive(Debug, Clone, Deserialize)]
pub struct IdTokenClaims {
    /// Subject (user pool user id)
    pub sub: String,

    /// Expiration timestamp
    #[serde(default)]
    pub exp: i64,

    /// Issuer
    #[serde(default)]
    pub iss: String,

    /// Audience (validated by jsonwebtoken, not read directly)
    #[serde(default)]
    pub aud: Option<serde_json::Value>,

    /// `id` for ID tokens, `access` for access tokens
    #[serde(default)]
    pub token_use: Option<String>,

    /// Federated identity id (`region:uuid`) when the provider supplies it
    #[serde(default)]
    pub identity_id: Option<String>,
}

impl IdTokenClaims {
    /// Only ID tokens are accepted. Tokens that don't declare a use pass.
    pub fn is_id_token(&self) -> bool {
        self.token_use.as_deref().map_or(true, |u| u == "id")
    }

    /// Resolve the caller identity from the claims.
    ///
    /// Uses the `identity_id` claim when present, otherwise `region:sub`.
    pub fn resolve_identity(&self, default_region: &str) -> Result<CallerIdentity, AuthError> {
        match &self.identity_id {
            Some(identity_id) => CallerIdentity::parse(identity_id),
            None => CallerIdentity::new(default_region, &self.sub),
        }
    }
}

/// The authenticated caller, owner of everything under `/sm/{uuid}/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CallerIdentity {
    region: String,
    uuid: String,
}

impl CallerIdentity {
    /// Build an identity from its parts.
    ///
    /// # Errors
    /// `AuthError::InvalidIdentity` if the region is empty or the uuid part
    /// is not a UUID.
    pub fn new(region: &str, uuid: &str) -> Result<Self, AuthError> {
        if region.is_empty() || region.contains(':') {
            return Err(AuthError::InvalidIdentity);
        }
        let uuid = Uuid::parse_str(uuid).map_err(|_| AuthError::InvalidIdentity)?;
        Ok(Self {
            region: region.to_string(),
            uuid: uuid.hyphenated().to_string(),
        })
    }

    /// Parse a full identity id (`region:uuid`).
    pub fn parse(identity_id: &str) -> Result<Self, AuthError> {
        let (region, uuid) = identity_id
            .split_once(':')
            .ok_or(AuthError::InvalidIdentity)?;
        Self::new(region, uuid)
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// The UUID part, used as the top-level segment of the caller's names.
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// Full identity id (`region:uuid`).
    pub fn identity_id(&self) -> String {
        format!("{}:{}", self.region, self.uuid)
    }
}

impl std::fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.region, self.uuid)
    }
}
