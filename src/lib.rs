// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Secret Manager - Encrypted Login Item Service
//!
//! Stores login items (title, path, username, secret, note) encrypted at
//! rest in a hierarchical, versioned parameter store, scoped to the
//! authenticated caller identity.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - ID token verification and caller identity resolution
//! - `config` - Environment configuration
//! - `storage` - Item codec, parameter store client, repositories

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
