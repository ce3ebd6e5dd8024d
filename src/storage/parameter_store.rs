// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client interface of the hierarchical parameter store.
//!
//! The store is a remote key-value service addressed by slash-separated
//! names. Every write to a name creates a new version; a specific version is
//! read by appending `:{version}` to the name. Listing walks a hierarchy in
//! pages linked by continuation tokens.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::ownership::Tag;
use crate::auth::CallerIdentity;

/// Error classification reported by the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParameterStoreError {
    /// No parameter exists under the name.
    #[error("parameter not found: {0}")]
    ParameterNotFound(String),
    /// The parameter exists but the requested version does not.
    #[error("parameter version not found: {0}")]
    ParameterVersionNotFound(String),
    /// The caller's credentials do not grant access to the name.
    #[error("access denied: {0}")]
    AccessDenied(String),
    /// A write without overwrite hit an existing name.
    #[error("parameter already exists: {0}")]
    ParameterAlreadyExists(String),
    /// The request was malformed.
    #[error("validation error: {0}")]
    Validation(String),
    /// Any other failure (throttling, transport, timeouts).
    #[error("parameter store error: {0}")]
    Other(String),
}

/// A parameter as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Full name without version selector.
    pub name: String,
    pub value: String,
    pub version: u64,
    pub last_modified_date: DateTime<Utc>,
}

/// Write request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutParameter {
    pub name: String,
    pub value: String,
    /// Tags may only be set when creating (`overwrite == false`).
    pub tags: Vec<Tag>,
    pub overwrite: bool,
}

/// One page of a hierarchy listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterPage {
    pub parameters: Vec<Parameter>,
    /// Present when more results are available.
    pub next_token: Option<String>,
}

/// Parameter store client.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Read a parameter. `name` may end in a `:{version}` selector.
    async fn get_parameter(&self, name: &str) -> Result<Parameter, ParameterStoreError>;

    /// Write a parameter and return the version that was created.
    async fn put_parameter(&self, request: PutParameter) -> Result<u64, ParameterStoreError>;

    /// Delete a parameter and its whole version history.
    async fn delete_parameter(&self, name: &str) -> Result<(), ParameterStoreError>;

    /// Read one page of the parameters below `path`.
    async fn get_parameters_by_path(
        &self,
        path: &str,
        recursive: bool,
        next_token: Option<&str>,
    ) -> Result<ParameterPage, ParameterStoreError>;
}

/// Produces store clients bound to a resolved caller's credentials.
pub trait ParameterStoreConnector: Send + Sync {
    fn connect(&self, identity: &CallerIdentity) -> Arc<dyn ParameterStore>;
}

/// Lazy walk over the pages of a hierarchy listing.
///
/// The walk cannot be resumed once interrupted; start a new pager instead.
pub struct PathPager<'a> {
    store: &'a dyn ParameterStore,
    path: String,
    recursive: bool,
    next_token: Option<String>,
    finished: bool,
}

impl<'a> PathPager<'a> {
    pub fn new(store: &'a dyn ParameterStore, path: impl Into<String>, recursive: bool) -> Self {
        Self {
            store,
            path: path.into(),
            recursive,
            next_token: None,
            finished: false,
        }
    }

    /// Fetch the next page, or `None` once the store reported no continuation.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Parameter>>, ParameterStoreError> {
        if self.finished {
            return Ok(None);
        }

        let page = self
            .store
            .get_parameters_by_path(&self.path, self.recursive, self.next_token.as_deref())
            .await?;

        tracing::debug!(
            path = %self.path,
            count = page.parameters.len(),
            has_more = page.next_token.is_some(),
            "Parameter store GetParametersByPath page"
        );

        match page.next_token {
            Some(token) => self.next_token = Some(token),
            None => self.finished = true,
        }

        Ok(Some(page.parameters))
    }

    /// Drain every remaining page into one collection, in store order.
    pub async fn collect_all(mut self) -> Result<Vec<Parameter>, ParameterStoreError> {
        let mut parameters = Vec::new();
        while let Some(page) = self.next_page().await? {
            parameters.extend(page);
        }
        Ok(parameters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::InMemoryParameterStore;

    async fn seeded_store(count: usize, page_size: usize) -> InMemoryParameterStore {
        let store = InMemoryParameterStore::new().with_page_size(page_size);
        for i in 0..count {
            store
                .put_parameter(PutParameter {
                    name: format!("/sm/owner/logins/item{i:02}"),
                    value: format!("value-{i}"),
                    tags: Vec::new(),
                    overwrite: false,
                })
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn pager_walks_every_page() {
        let store = seeded_store(7, 3).await;
        let mut pager = PathPager::new(&store, "/sm/owner/logins", true);

        let mut sizes = Vec::new();
        while let Some(page) = pager.next_page().await.unwrap() {
            sizes.push(page.len());
        }
        assert_eq!(sizes, vec![3, 3, 1]);

        // Exhausted pagers stay exhausted.
        assert!(pager.next_page().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn collect_all_concatenates_pages() {
        let store = seeded_store(5, 2).await;
        let all = PathPager::new(&store, "/sm/owner/logins", true)
            .collect_all()
            .await
            .unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(all[0].name, "/sm/owner/logins/item00");
        assert_eq!(all[4].name, "/sm/owner/logins/item04");
    }

    #[tokio::test]
    async fn empty_hierarchy_yields_single_empty_page() {
        let store = InMemoryParameterStore::new();
        let all = PathPager::new(&store, "/sm/nobody/logins", true)
            .collect_all()
            .await
            .unwrap();
        assert!(all.is_empty());
    }
}
