// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the parameter store.
//!
//! Repositories are bound to one caller identity and one store client at
//! construction and hold no other state between calls.

pub mod login_items;

use async_trait::async_trait;

use super::encryption::CipherError;
use super::parameter_store::ParameterStoreError;

pub use login_items::{
    generate_item_id, is_valid_item_id, LoginItem, LoginItemData, LoginItemUpdate,
    ParameterStoreLoginItemRepository, ITEM_ID_LENGTH,
};

/// Domain errors surfaced by repositories.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The item or version does not exist, or the caller may not access it.
    /// The two cases are deliberately indistinguishable.
    #[error("item not found")]
    NotFound,
    /// The item id is already taken.
    #[error("item already exists: {0}")]
    Conflict(String),
    /// Any other store failure, passed through unchanged.
    #[error("parameter store failure: {0}")]
    Upstream(#[source] ParameterStoreError),
    /// The codec is not configured (missing passphrase).
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Stored ciphertext cannot be read under the configured passphrase.
    #[error("decryption failed: {0}")]
    Decryption(String),
    /// The record could not be encrypted.
    #[error("encryption failed: {0}")]
    Encryption(String),
}

impl From<CipherError> for RepositoryError {
    fn from(e: CipherError) -> Self {
        match e {
            CipherError::MissingPassphrase => {
                RepositoryError::Configuration(CipherError::MissingPassphrase.to_string())
            }
            CipherError::Decryption(msg) => RepositoryError::Decryption(msg),
            CipherError::Encryption(msg) => RepositoryError::Encryption(msg),
        }
    }
}

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Fold store errors that reveal nothing to the caller into `NotFound`.
///
/// The store's access policy answers `AccessDenied` for every name outside
/// the caller's hierarchy, existing or not, so access denial is reported
/// exactly like absence.
pub(crate) fn fold_not_found(error: ParameterStoreError) -> RepositoryError {
    match error {
        ParameterStoreError::ParameterNotFound(_)
        | ParameterStoreError::ParameterVersionNotFound(_)
        | ParameterStoreError::AccessDenied(_) => RepositoryError::NotFound,
        other => RepositoryError::Upstream(other),
    }
}

/// CRUD contract for login items.
///
/// Implemented by [`ParameterStoreLoginItemRepository`]; other backends only
/// need to honour the same error semantics.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Store a new item at version 1.
    async fn create(&self, data: LoginItemData) -> RepositoryResult<LoginItem>;

    /// Read the latest version of an item, or a specific one.
    async fn get(&self, id: &str, version: Option<u64>) -> RepositoryResult<LoginItem>;

    /// Read the latest version of every item owned by the caller.
    async fn list(&self) -> RepositoryResult<Vec<LoginItem>>;

    /// Replace an item's content, creating a new version unless nothing changed.
    async fn update(&self, id: &str, changes: LoginItemUpdate) -> RepositoryResult<LoginItem>;

    /// Remove an item and its history.
    async fn delete(&self, id: &str) -> RepositoryResult<()>;
}
