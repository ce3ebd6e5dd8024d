// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Resolves the caller identity that scopes every store access.
//!
//! ## Auth Flow
//!
//! 1. The client signs in with the identity provider
//! 2. The client sends `Authorization: Bearer <ID token>`
//! 3. The server:
//!    - Fetches the provider JWKS via HTTPS
//!    - Verifies signature, expiry, issuer, audience and `token_use`
//!    - Resolves `region:uuid` from the `identity_id` claim, or from the
//!      configured region and `sub`
//!
//! ## Security
//!
//! - All non-health endpoints require authentication
//! - Rejections render one generic 401 body; the reason is logged only
//! - JWKS is cached with TTL for performance
//! - Clock skew tolerance is 60 seconds

pub mod claims;
pub mod error;
pub mod extractor;
pub mod jwks;

pub use claims::{CallerIdentity, IdTokenClaims};
pub use error::AuthError;
pub use extractor::Auth;
pub use jwks::JwksManager;
