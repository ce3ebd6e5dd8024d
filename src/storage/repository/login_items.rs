// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login item repository backed by the parameter store.
//!
//! Each item is one parameter at `/sm/{identity_uuid}/logins/{id}` whose
//! value is the encrypted JSON record. The store's per-name versioning
//! provides the item history; `get(id, Some(n))` reads `{id}:{n}`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

use super::{fold_not_found, ItemRepository, RepositoryError, RepositoryResult};
use crate::auth::CallerIdentity;
use crate::storage::encryption::PassphraseCipher;
use crate::storage::ownership::ownership_tags;
use crate::storage::parameter_store::{
    ParameterStore, ParameterStoreConnector, ParameterStoreError, PathPager, PutParameter,
};
use crate::storage::paths::ItemPaths;

/// Length of generated item ids.
pub const ITEM_ID_LENGTH: usize = 21;

/// Generate a random URL-safe item id.
pub fn generate_item_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ITEM_ID_LENGTH)
        .map(char::from)
        .collect()
}

/// Whether `id` has the shape of a generated item id.
pub fn is_valid_item_id(id: &str) -> bool {
    id.len() == ITEM_ID_LENGTH && id.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Decrypted content of a login item. Never persisted in clear.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginItemData {
    pub title: String,
    pub path: String,
    pub username: String,
    pub secret: String,
    #[serde(default)]
    pub note: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub otp: String,
}

/// New field values for an update.
///
/// Fields left as `None` are written as empty strings, not carried over
/// from the current version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginItemUpdate {
    pub title: Option<String>,
    pub path: Option<String>,
    pub username: Option<String>,
    pub secret: Option<String>,
    pub note: Option<String>,
    pub otp: Option<String>,
}

impl LoginItemUpdate {
    fn into_data(self) -> LoginItemData {
        LoginItemData {
            title: self.title.unwrap_or_default(),
            path: self.path.unwrap_or_default(),
            username: self.username.unwrap_or_default(),
            secret: self.secret.unwrap_or_default(),
            note: self.note.unwrap_or_default(),
            otp: self.otp.unwrap_or_default(),
        }
    }
}

impl From<LoginItemData> for LoginItemUpdate {
    fn from(data: LoginItemData) -> Self {
        Self {
            title: Some(data.title),
            path: Some(data.path),
            username: Some(data.username),
            secret: Some(data.secret),
            note: Some(data.note),
            otp: Some(data.otp),
        }
    }
}

/// A stored login item.
#[derive(Clone)]
pub struct LoginItem {
    /// Unique id, immutable after creation.
    pub id: String,
    /// Starts at 1, incremented by every content-changing update.
    pub version: u64,
    /// Time of the write that produced this version.
    pub last_modified_date: DateTime<Utc>,
    /// Base64 ciphertext of the [`LoginItemData`] record.
    pub encrypted_data: String,
    cipher: Arc<PassphraseCipher>,
}

impl LoginItem {
    /// Mint a new item (fresh id, version 1) by encrypting `data`.
    pub fn create(data: &LoginItemData, cipher: Arc<PassphraseCipher>) -> RepositoryResult<Self> {
        let encrypted_data = cipher.encrypt(data)?;
        Ok(Self {
            id: generate_item_id(),
            version: 1,
            last_modified_date: Utc::now(),
            encrypted_data,
            cipher,
        })
    }

    /// Rebuild an item from the fields read back from the store.
    pub fn from_stored(
        id: impl Into<String>,
        version: u64,
        last_modified_date: DateTime<Utc>,
        encrypted_data: impl Into<String>,
        cipher: Arc<PassphraseCipher>,
    ) -> Self {
        Self {
            id: id.into(),
            version,
            last_modified_date,
            encrypted_data: encrypted_data.into(),
            cipher,
        }
    }

    /// Successor of this item carrying `data` at `version + 1`.
    fn next_version(&self, data: &LoginItemData) -> RepositoryResult<Self> {
        Ok(Self {
            id: self.id.clone(),
            version: self.version + 1,
            last_modified_date: Utc::now(),
            encrypted_data: self.cipher.encrypt(data)?,
            cipher: Arc::clone(&self.cipher),
        })
    }

    /// Decrypt and parse the item content.
    ///
    /// # Errors
    /// `RepositoryError::Decryption` if the ciphertext cannot be read under
    /// the configured passphrase.
    pub fn decrypted_data(&self) -> RepositoryResult<LoginItemData> {
        Ok(self.cipher.decrypt(&self.encrypted_data)?)
    }
}

impl PartialEq for LoginItem {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.version == other.version
            && self.last_modified_date == other.last_modified_date
            && self.encrypted_data == other.encrypted_data
    }
}

impl Eq for LoginItem {}

impl std::fmt::Debug for LoginItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginItem")
            .field("id", &self.id)
            .field("version", &self.version)
            .field("last_modified_date", &self.last_modified_date)
            .field("encrypted_data_len", &self.encrypted_data.len())
            .finish()
    }
}

/// Login item repository on the parameter store, bound to one caller.
pub struct ParameterStoreLoginItemRepository {
    store: Arc<dyn ParameterStore>,
    identity: CallerIdentity,
    paths: ItemPaths,
    cipher: Arc<PassphraseCipher>,
}

impl ParameterStoreLoginItemRepository {
    /// Create a repository over a store client already bound to `identity`.
    pub fn new(
        store: Arc<dyn ParameterStore>,
        identity: CallerIdentity,
        cipher: Arc<PassphraseCipher>,
    ) -> Self {
        let paths = ItemPaths::logins(identity.uuid());
        Self {
            store,
            identity,
            paths,
            cipher,
        }
    }

    /// Connect a store client for `identity` and bind a repository to it.
    pub fn connect(
        connector: &dyn ParameterStoreConnector,
        identity: CallerIdentity,
        cipher: Arc<PassphraseCipher>,
    ) -> Self {
        let store = connector.connect(&identity);
        Self::new(store, identity, cipher)
    }
}

#[async_trait]
impl ItemRepository for ParameterStoreLoginItemRepository {
    async fn create(&self, data: LoginItemData) -> RepositoryResult<LoginItem> {
        let item = LoginItem::create(&data, Arc::clone(&self.cipher))?;
        let name = self.paths.item(&item.id);

        tracing::info!(name = %name, "Parameter store PutParameter (create)");
        self.store
            .put_parameter(PutParameter {
                name,
                value: item.encrypted_data.clone(),
                tags: ownership_tags(&self.identity, self.paths.item_type()),
                overwrite: false,
            })
            .await
            .map_err(|e| match e {
                ParameterStoreError::ParameterAlreadyExists(name) => {
                    RepositoryError::Conflict(name)
                }
                other => RepositoryError::Upstream(other),
            })?;

        Ok(item)
    }

    async fn get(&self, id: &str, version: Option<u64>) -> RepositoryResult<LoginItem> {
        let name = match version {
            Some(version) => self.paths.item_version(id, version),
            None => self.paths.item(id),
        };

        tracing::info!(name = %name, "Parameter store GetParameter");
        let parameter = self.store.get_parameter(&name).await.map_err(|e| {
            tracing::info!(name = %name, error = %e, "Login item not readable");
            fold_not_found(e)
        })?;

        Ok(LoginItem::from_stored(
            id,
            parameter.version,
            parameter.last_modified_date,
            parameter.value,
            Arc::clone(&self.cipher),
        ))
    }

    async fn list(&self) -> RepositoryResult<Vec<LoginItem>> {
        let dir = self.paths.items_dir();

        tracing::info!(path = %dir, "Parameter store GetParametersByPath");
        let parameters = PathPager::new(self.store.as_ref(), dir, true)
            .collect_all()
            .await
            .map_err(RepositoryError::Upstream)?;

        Ok(parameters
            .into_iter()
            .map(|p| {
                LoginItem::from_stored(
                    ItemPaths::id_from_name(&p.name),
                    p.version,
                    p.last_modified_date,
                    p.value,
                    Arc::clone(&self.cipher),
                )
            })
            .collect())
    }

    async fn update(&self, id: &str, changes: LoginItemUpdate) -> RepositoryResult<LoginItem> {
        let current = self.get(id, None).await?;
        let current_data = current.decrypted_data()?;
        let new_data = changes.into_data();

        // Records serialize canonically, so equal structs mean equal content.
        if new_data == current_data {
            tracing::info!(id = %id, version = current.version, "Login item unchanged, skipping write");
            return Ok(current);
        }

        let mut updated = current.next_version(&new_data)?;
        let name = self.paths.item(id);

        tracing::info!(name = %name, version = updated.version, "Parameter store PutParameter (update)");
        let stored_version = self
            .store
            .put_parameter(PutParameter {
                name,
                value: updated.encrypted_data.clone(),
                tags: Vec::new(),
                overwrite: true,
            })
            .await
            .map_err(fold_not_found)?;

        if stored_version != updated.version {
            tracing::warn!(
                id = %id,
                expected = updated.version,
                stored = stored_version,
                "Store version diverged from item version (concurrent update?)"
            );
            updated.version = stored_version;
        }

        Ok(updated)
    }

    async fn delete(&self, id: &str) -> RepositoryResult<()> {
        let name = self.paths.item(id);

        tracing::info!(name = %name, "Parameter store DeleteParameter");
        self.store
            .delete_parameter(&name)
            .await
            .map_err(fold_not_found)
    }
}
