// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership tagging for stored items.
//!
//! Ownership is enforced by the parameter name (`/sm/{uuid}/...`, which the
//! store's access policy restricts to the caller) and recorded by two tags
//! written at creation time. It is never inferred from item content.

use crate::auth::CallerIdentity;

/// Tag key carrying the owner's full identity id (`region:uuid`).
pub const IDENTITY_ID_TAG: &str = "identityId";

/// Tag key carrying the item type.
pub const TYPE_TAG: &str = "type";

/// A key/value tag attached to a stored parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Tags recording ownership of a newly created item.
pub fn ownership_tags(owner: &CallerIdentity, item_type: &str) -> Vec<Tag> {
    vec![
        Tag::new(IDENTITY_ID_TAG, owner.identity_id()),
        Tag::new(TYPE_TAG, item_type),
    ]
}
