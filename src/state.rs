// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{CallerIdentity, JwksManager};
use crate::config::DEFAULT_IDENTITY_REGION;
use crate::storage::{ParameterStoreConnector, ParameterStoreLoginItemRepository, PassphraseCipher};

/// Token verification settings.
#[derive(Clone)]
pub struct AuthConfig {
    /// `None` selects development mode (no signature check).
    pub jwks: Option<JwksManager>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    /// Region used when a token carries no `identity_id` claim.
    pub identity_region: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwks: None,
            issuer: None,
            audience: None,
            identity_region: DEFAULT_IDENTITY_REGION.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub connector: Arc<dyn ParameterStoreConnector>,
    pub cipher: Arc<PassphraseCipher>,
    pub auth_config: AuthConfig,
}

impl AppState {
    pub fn new(connector: Arc<dyn ParameterStoreConnector>, cipher: PassphraseCipher) -> Self {
        Self {
            connector,
            cipher: Arc::new(cipher),
            auth_config: AuthConfig::default(),
        }
    }

    pub fn with_auth_config(mut self, auth_config: AuthConfig) -> Self {
        self.auth_config = auth_config;
        self
    }

    /// Login item repository bound to the caller.
    pub fn login_items(&self, identity: CallerIdentity) -> ParameterStoreLoginItemRepository {
        ParameterStoreLoginItemRepository::connect(
            self.connector.as_ref(),
            identity,
            Arc::clone(&self.cipher),
        )
    }
}

/// Development-mode state over a fresh in-memory store.
#[cfg(test)]
pub(crate) fn test_state() -> AppState {
    use crate::storage::InMemoryParameterStore;

    let cipher = PassphraseCipher::new("test-encryption-passphrase").unwrap();
    AppState::new(Arc::new(InMemoryParameterStore::new()), cipher)
}
