// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Encrypted Item Storage
//!
//! Login items are stored as encrypted parameters in a hierarchical,
//! versioned parameter store.
//!
//! ## Security Model
//!
//! - Item content is encrypted before it leaves the process
//! - Each caller's store client can only reach `/sm/{uuid}/...`
//! - Items are tagged with their owner at creation
//! - Foreign and missing items are indistinguishable (both `NotFound`)
//!
//! ## Storage Layout
//!
//! ```text
//! /sm/{identity_uuid}/
//!   logins/
//!     {id}       # value: base64 ciphertext, one store version per item version
//! ```

pub mod encryption;
pub mod memory;
pub mod ownership;
pub mod parameter_store;
pub mod paths;
pub mod repository;

pub use encryption::{decrypt, encrypt, CipherError, PassphraseCipher};
pub use memory::InMemoryParameterStore;
pub use ownership::{ownership_tags, Tag};
pub use parameter_store::{
    Parameter, ParameterPage, ParameterStore, ParameterStoreConnector, ParameterStoreError,
    PathPager, PutParameter,
};
pub use paths::ItemPaths;
pub use repository::{
    is_valid_item_id, ItemRepository, LoginItem, LoginItemData, LoginItemUpdate,
    ParameterStoreLoginItemRepository, RepositoryError, RepositoryResult,
};
