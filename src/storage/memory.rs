// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory parameter store.
//!
//! Mirrors the semantics of the remote store closely enough to run the
//! service locally and to exercise the repositories in tests:
//!
//! - every write appends a version, `name:{version}` reads old versions
//! - deletes remove the whole history
//! - tags can only be attached on creation
//! - listing is paginated with opaque continuation tokens
//! - a handle connected for a caller only reaches `/sm/{uuid}/...`; every
//!   other name answers `AccessDenied`, whether or not it exists

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::ownership::Tag;
use super::parameter_store::{
    Parameter, ParameterPage, ParameterStore, ParameterStoreConnector, ParameterStoreError,
    PutParameter,
};
use super::paths::ItemPaths;
use crate::auth::CallerIdentity;

/// Default number of parameters per listing page (the remote store's default).
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone)]
struct StoredVersion {
    value: String,
    version: u64,
    last_modified_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
struct StoredParameter {
    versions: Vec<StoredVersion>,
    tags: Vec<Tag>,
}

impl StoredParameter {
    fn latest(&self) -> Option<&StoredVersion> {
        self.versions.last()
    }

    fn version(&self, version: u64) -> Option<&StoredVersion> {
        self.versions.iter().find(|v| v.version == version)
    }
}

#[derive(Debug, Default)]
struct Shared {
    parameters: RwLock<BTreeMap<String, StoredParameter>>,
    writes: AtomicUsize,
}

/// Versioned in-memory parameter store.
///
/// Cloning yields another handle on the same data.
#[derive(Debug, Clone)]
pub struct InMemoryParameterStore {
    shared: Arc<Shared>,
    page_size: usize,
    /// Name prefix the handle's credentials grant access to (`None` = unrestricted).
    allowed_prefix: Option<String>,
}

impl Default for InMemoryParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryParameterStore {
    /// Create an empty, unrestricted store.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            page_size: DEFAULT_PAGE_SIZE,
            allowed_prefix: None,
        }
    }

    /// Set the listing page size (minimum 1).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Handle on the same data that may only access names under `prefix`.
    pub fn scoped_to(&self, prefix: impl Into<String>) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            page_size: self.page_size,
            allowed_prefix: Some(prefix.into()),
        }
    }

    /// Number of successful writes across all handles.
    pub fn write_count(&self) -> usize {
        self.shared.writes.load(Ordering::SeqCst)
    }

    /// Tags attached to a parameter, if it exists.
    pub async fn tags_for(&self, name: &str) -> Option<Vec<Tag>> {
        let parameters = self.shared.parameters.read().await;
        parameters.get(name).map(|p| p.tags.clone())
    }

    /// Number of versions retained for a parameter (0 if absent).
    pub async fn version_count(&self, name: &str) -> usize {
        let parameters = self.shared.parameters.read().await;
        parameters.get(name).map(|p| p.versions.len()).unwrap_or(0)
    }

    fn check_access(&self, name: &str) -> Result<(), ParameterStoreError> {
        match &self.allowed_prefix {
            Some(prefix) if !name.starts_with(prefix.as_str()) => {
                Err(ParameterStoreError::AccessDenied(name.to_string()))
            }
            _ => Ok(()),
        }
    }
}

/// Split `name:{version}` into its base name and version selector.
fn split_selector(name: &str) -> (&str, Option<u64>) {
    if let Some((base, selector)) = name.rsplit_once(':') {
        if let Ok(version) = selector.parse::<u64>() {
            return (base, Some(version));
        }
    }
    (name, None)
}

fn validate_name(name: &str) -> Result<(), ParameterStoreError> {
    if !name.starts_with('/') || name.ends_with('/') {
        return Err(ParameterStoreError::Validation(format!(
            "invalid parameter name: {name}"
        )));
    }
    Ok(())
}

#[async_trait]
impl ParameterStore for InMemoryParameterStore {
    async fn get_parameter(&self, name: &str) -> Result<Parameter, ParameterStoreError> {
        let (base, selector) = split_selector(name);
        self.check_access(base)?;

        let parameters = self.shared.parameters.read().await;
        let stored = parameters
            .get(base)
            .ok_or_else(|| ParameterStoreError::ParameterNotFound(base.to_string()))?;

        let found = match selector {
            Some(version) => stored
                .version(version)
                .ok_or_else(|| ParameterStoreError::ParameterVersionNotFound(name.to_string()))?,
            None => stored
                .latest()
                .ok_or_else(|| ParameterStoreError::ParameterNotFound(base.to_string()))?,
        };

        Ok(Parameter {
            name: base.to_string(),
            value: found.value.clone(),
            version: found.version,
            last_modified_date: found.last_modified_date,
        })
    }

    async fn put_parameter(&self, request: PutParameter) -> Result<u64, ParameterStoreError> {
        validate_name(&request.name)?;
        self.check_access(&request.name)?;

        if request.value.is_empty() {
            return Err(ParameterStoreError::Validation(
                "parameter value must not be empty".to_string(),
            ));
        }
        if request.overwrite && !request.tags.is_empty() {
            return Err(ParameterStoreError::Validation(
                "tags cannot be set when overwriting a parameter".to_string(),
            ));
        }

        let mut parameters = self.shared.parameters.write().await;
        let exists = parameters.contains_key(&request.name);
        if exists && !request.overwrite {
            return Err(ParameterStoreError::ParameterAlreadyExists(request.name));
        }

        let stored = parameters.entry(request.name).or_default();
        if !exists {
            stored.tags = request.tags;
        }
        let version = stored.latest().map(|v| v.version + 1).unwrap_or(1);
        stored.versions.push(StoredVersion {
            value: request.value,
            version,
            last_modified_date: Utc::now(),
        });

        self.shared.writes.fetch_add(1, Ordering::SeqCst);
        Ok(version)
    }

    async fn delete_parameter(&self, name: &str) -> Result<(), ParameterStoreError> {
        self.check_access(name)?;

        let mut parameters = self.shared.parameters.write().await;
        parameters
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| ParameterStoreError::ParameterNotFound(name.to_string()))
    }

    async fn get_parameters_by_path(
        &self,
        path: &str,
        recursive: bool,
        next_token: Option<&str>,
    ) -> Result<ParameterPage, ParameterStoreError> {
        if !path.starts_with('/') {
            return Err(ParameterStoreError::Validation(format!(
                "invalid hierarchy: {path}"
            )));
        }
        let prefix = format!("{}/", path.trim_end_matches('/'));
        self.check_access(&prefix)?;

        let offset = match next_token {
            Some(token) => token.parse::<usize>().map_err(|_| {
                ParameterStoreError::Validation("invalid continuation token".to_string())
            })?,
            None => 0,
        };

        let parameters = self.shared.parameters.read().await;
        let mut matching = parameters.iter().filter(|(name, _)| {
            name.strip_prefix(prefix.as_str())
                .map(|rest| recursive || !rest.contains('/'))
                .unwrap_or(false)
        });

        let page: Vec<Parameter> = matching
            .by_ref()
            .skip(offset)
            .take(self.page_size)
            .filter_map(|(name, stored)| {
                stored.latest().map(|latest| Parameter {
                    name: name.clone(),
                    value: latest.value.clone(),
                    version: latest.version,
                    last_modified_date: latest.last_modified_date,
                })
            })
            .collect();

        let has_more = matching.next().is_some();
        Ok(ParameterPage {
            next_token: has_more.then(|| (offset + self.page_size).to_string()),
            parameters: page,
        })
    }
}

impl ParameterStoreConnector for InMemoryParameterStore {
    fn connect(&self, identity: &CallerIdentity) -> Arc<dyn ParameterStore> {
        Arc::new(self.scoped_to(ItemPaths::identity_root(identity.uuid())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(name: &str, value: &str) -> PutParameter {
        PutParameter {
            name: name.to_string(),
            value: value.to_string(),
            tags: Vec::new(),
            overwrite: false,
        }
    }

    fn overwrite(name: &str, value: &str) -> PutParameter {
        PutParameter {
            overwrite: true,
            ..put(name, value)
        }
    }

    #[tokio::test]
    async fn writes_create_increasing_versions() {
        let store = InMemoryParameterStore::new();
        assert_eq!(store.put_parameter(put("/sm/u/logins/a", "v1")).await.unwrap(), 1);
        assert_eq!(
            store.put_parameter(overwrite("/sm/u/logins/a", "v2")).await.unwrap(),
            2
        );

        let latest = store.get_parameter("/sm/u/logins/a").await.unwrap();
        assert_eq!(latest.value, "v2");
        assert_eq!(latest.version, 2);

        let first = store.get_parameter("/sm/u/logins/a:1").await.unwrap();
        assert_eq!(first.value, "v1");
        assert_eq!(first.version, 1);
        assert_eq!(first.name, "/sm/u/logins/a");
        assert!(first.last_modified_date <= latest.last_modified_date);

        assert_eq!(store.write_count(), 2);
        assert_eq!(store.version_count("/sm/u/logins/a").await, 2);
    }

    #[tokio::test]
    async fn missing_parameter_and_version_are_distinguished() {
        let store = InMemoryParameterStore::new();
        store.put_parameter(put("/sm/u/logins/a", "v1")).await.unwrap();

        assert!(matches!(
            store.get_parameter("/sm/u/logins/missing").await,
            Err(ParameterStoreError::ParameterNotFound(_))
        ));
        assert!(matches!(
            store.get_parameter("/sm/u/logins/a:7").await,
            Err(ParameterStoreError::ParameterVersionNotFound(_))
        ));
        assert!(matches!(
            store.get_parameter("/sm/u/logins/missing:1").await,
            Err(ParameterStoreError::ParameterNotFound(_))
        ));
    }

    #[tokio::test]
    async fn create_without_overwrite_rejects_existing_name() {
        let store = InMemoryParameterStore::new();
        store.put_parameter(put("/sm/u/logins/a", "v1")).await.unwrap();
        let result = store.put_parameter(put("/sm/u/logins/a", "v2")).await;
        assert!(matches!(
            result,
            Err(ParameterStoreError::ParameterAlreadyExists(_))
        ));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn tags_are_set_on_create_only() {
        let store = InMemoryParameterStore::new();
        let mut request = put("/sm/u/logins/a", "v1");
        request.tags = vec![Tag::new("type", "logins")];
        store.put_parameter(request).await.unwrap();

        let mut tagged_overwrite = overwrite("/sm/u/logins/a", "v2");
        tagged_overwrite.tags = vec![Tag::new("type", "other")];
        assert!(matches!(
            store.put_parameter(tagged_overwrite).await,
            Err(ParameterStoreError::Validation(_))
        ));

        store
            .put_parameter(overwrite("/sm/u/logins/a", "v2"))
            .await
            .unwrap();
        assert_eq!(
            store.tags_for("/sm/u/logins/a").await,
            Some(vec![Tag::new("type", "logins")])
        );
    }

    #[tokio::test]
    async fn invalid_requests_are_rejected() {
        let store = InMemoryParameterStore::new();
        assert!(matches!(
            store.put_parameter(put("relative/name", "v")).await,
            Err(ParameterStoreError::Validation(_))
        ));
        assert!(matches!(
            store.put_parameter(put("/sm/u/logins/a", "")).await,
            Err(ParameterStoreError::Validation(_))
        ));
        assert!(matches!(
            store
                .get_parameters_by_path("/sm/u", true, Some("not-a-token"))
                .await,
            Err(ParameterStoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn delete_removes_all_versions() {
        let store = InMemoryParameterStore::new();
        store.put_parameter(put("/sm/u/logins/a", "v1")).await.unwrap();
        store
            .put_parameter(overwrite("/sm/u/logins/a", "v2"))
            .await
            .unwrap();

        store.delete_parameter("/sm/u/logins/a").await.unwrap();

        assert!(matches!(
            store.get_parameter("/sm/u/logins/a:1").await,
            Err(ParameterStoreError::ParameterNotFound(_))
        ));
        assert!(matches!(
            store.delete_parameter("/sm/u/logins/a").await,
            Err(ParameterStoreError::ParameterNotFound(_))
        ));
    }

    #[tokio::test]
    async fn listing_respects_hierarchy_and_recursion() {
        let store = InMemoryParameterStore::new();
        store.put_parameter(put("/sm/u/logins/a", "1")).await.unwrap();
        store.put_parameter(put("/sm/u/logins/b", "2")).await.unwrap();
        store
            .put_parameter(put("/sm/u/logins/nested/c", "3"))
            .await
            .unwrap();
        store.put_parameter(put("/sm/u/notes/d", "4")).await.unwrap();
        store
            .put_parameter(put("/sm/u/loginsextra/e", "5"))
            .await
            .unwrap();

        let flat = store
            .get_parameters_by_path("/sm/u/logins", false, None)
            .await
            .unwrap();
        let names: Vec<_> = flat.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["/sm/u/logins/a", "/sm/u/logins/b"]);

        let deep = store
            .get_parameters_by_path("/sm/u/logins/", true, None)
            .await
            .unwrap();
        assert_eq!(deep.parameters.len(), 3);
        assert!(deep.next_token.is_none());
    }

    #[tokio::test]
    async fn listing_paginates() {
        let store = InMemoryParameterStore::new().with_page_size(2);
        for name in ["a", "b", "c"] {
            store
                .put_parameter(put(&format!("/sm/u/logins/{name}"), name))
                .await
                .unwrap();
        }

        let first = store
            .get_parameters_by_path("/sm/u/logins", true, None)
            .await
            .unwrap();
        assert_eq!(first.parameters.len(), 2);
        let token = first.next_token.expect("more pages");

        let second = store
            .get_parameters_by_path("/sm/u/logins", true, Some(&token))
            .await
            .unwrap();
        assert_eq!(second.parameters.len(), 1);
        assert_eq!(second.parameters[0].name, "/sm/u/logins/c");
        assert!(second.next_token.is_none());
    }

    #[tokio::test]
    async fn scoped_handle_denies_foreign_names() {
        let store = InMemoryParameterStore::new();
        store
            .put_parameter(put("/sm/other/logins/a", "theirs"))
            .await
            .unwrap();

        let scoped = store.scoped_to("/sm/mine/");

        // Existing and missing foreign names look the same.
        assert!(matches!(
            scoped.get_parameter("/sm/other/logins/a").await,
            Err(ParameterStoreError::AccessDenied(_))
        ));
        assert!(matches!(
            scoped.get_parameter("/sm/other/logins/missing").await,
            Err(ParameterStoreError::AccessDenied(_))
        ));
        assert!(matches!(
            scoped.delete_parameter("/sm/other/logins/a").await,
            Err(ParameterStoreError::AccessDenied(_))
        ));
        assert!(matches!(
            scoped.put_parameter(overwrite("/sm/other/logins/a", "x")).await,
            Err(ParameterStoreError::AccessDenied(_))
        ));
        assert!(matches!(
            scoped.get_parameters_by_path("/sm/other", true, None).await,
            Err(ParameterStoreError::AccessDenied(_))
        ));

        // Own names remain reachable and share data with the root handle.
        scoped.put_parameter(put("/sm/mine/logins/b", "mine")).await.unwrap();
        assert_eq!(
            store.get_parameter("/sm/mine/logins/b").await.unwrap().value,
            "mine"
        );
    }

    #[tokio::test]
    async fn connector_scopes_to_identity_root() {
        let store = InMemoryParameterStore::new();
        let identity =
            CallerIdentity::parse("eu-central-1:b184a1e4-5327-49fb-9030-eeee3f8a5d14").unwrap();
        let client = store.connect(&identity);

        client
            .put_parameter(put(
                "/sm/b184a1e4-5327-49fb-9030-eeee3f8a5d14/logins/a",
                "v",
            ))
            .await
            .unwrap();
        assert!(matches!(
            client.get_parameter("/sm/someone-else/logins/a").await,
            Err(ParameterStoreError::AccessDenied(_))
        ));
    }

    #[test]
    fn selector_parsing() {
        assert_eq!(split_selector("/a/b:3"), ("/a/b", Some(3)));
        assert_eq!(split_selector("/a/b"), ("/a/b", None));
        assert_eq!(split_selector("/a/b:x"), ("/a/b:x", None));
    }
}
