// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Parameter names for the item hierarchy.
//!
//! ```text
//! /sm/{identity_uuid}/
//!   logins/
//!     {id}            # latest version
//!     {id}:{version}  # specific version (selector, not a separate name)
//! ```

/// Application namespace, the first segment of every parameter name.
pub const NAMESPACE: &str = "sm";

/// Item type segment (and `type` ownership tag value) for login items.
pub const LOGIN_ITEM_TYPE: &str = "logins";

/// Parameter name utilities scoped to one caller identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemPaths {
    identity_uuid: String,
    item_type: String,
}

impl ItemPaths {
    /// Create paths for the given identity UUID and item type.
    pub fn new(identity_uuid: impl Into<String>, item_type: impl Into<String>) -> Self {
        Self {
            identity_uuid: identity_uuid.into(),
            item_type: item_type.into(),
        }
    }

    /// Paths for login items owned by `identity_uuid`.
    pub fn logins(identity_uuid: impl Into<String>) -> Self {
        Self::new(identity_uuid, LOGIN_ITEM_TYPE)
    }

    /// Root of everything the identity owns, with trailing slash.
    ///
    /// This is the prefix the store's access policy grants to the caller.
    pub fn identity_root(identity_uuid: &str) -> String {
        format!("/{NAMESPACE}/{identity_uuid}/")
    }

    /// The item type segment.
    pub fn item_type(&self) -> &str {
        &self.item_type
    }

    /// Hierarchy containing all items of this type (no trailing slash).
    pub fn items_dir(&self) -> String {
        format!("/{NAMESPACE}/{}/{}", self.identity_uuid, self.item_type)
    }

    /// Name of the latest version of an item.
    pub fn item(&self, id: &str) -> String {
        format!("{}/{id}", self.items_dir())
    }

    /// Name addressing a specific version of an item.
    pub fn item_version(&self, id: &str, version: u64) -> String {
        format!("{}:{version}", self.item(id))
    }

    /// Extract the item id from a parameter name (last path segment).
    pub fn id_from_name(name: &str) -> &str {
        name.rsplit('/').next().unwrap_or(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UUID: &str = "b184a1e4-5327-49fb-9030-eeee3f8a5d14";

    #[test]
    fn item_paths_are_correct() {
        let paths = ItemPaths::logins(UUID);
        assert_eq!(
            paths.items_dir(),
            "/sm/b184a1e4-5327-49fb-9030-eeee3f8a5d14/logins"
        );
        assert_eq!(
            paths.item("TWOD0FCXdBFGOVUXVgdq1"),
            "/sm/b184a1e4-5327-49fb-9030-eeee3f8a5d14/logins/TWOD0FCXdBFGOVUXVgdq1"
        );
    }

    #[test]
    fn version_selector_is_colon_suffixed() {
        let paths = ItemPaths::logins(UUID);
        assert_eq!(
            paths.item_version("abc", 3),
            "/sm/b184a1e4-5327-49fb-9030-eeee3f8a5d14/logins/abc:3"
        );
    }

    #[test]
    fn identity_root_has_trailing_slash() {
        assert_eq!(
            ItemPaths::identity_root(UUID),
            "/sm/b184a1e4-5327-49fb-9030-eeee3f8a5d14/"
        );
    }

    #[test]
    fn id_from_name_takes_last_segment() {
        let paths = ItemPaths::logins(UUID);
        assert_eq!(ItemPaths::id_from_name(&paths.item("xyz")), "xyz");
        assert_eq!(ItemPaths::id_from_name("plain"), "plain");
    }

    #[test]
    fn custom_item_type() {
        let paths = ItemPaths::new(UUID, "notes");
        assert_eq!(paths.item_type(), "notes");
        assert!(paths.items_dir().ends_with("/notes"));
    }
}
