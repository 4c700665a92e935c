// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Establishes, for every inbound request, *who is calling* before any
//! business logic runs. Two independent trust schemes coexist:
//!
//! 1. **Mini App initData** (`Authorization: tma <initData>`): the host
//!    application vouches for an embedded client session with a
//!    shared-secret HMAC over a canonical check-string.
//! 2. **Bearer tokens** (`Authorization: Bearer <JWT>`): asymmetric tokens
//!    from the identity backend, verified against its published key set.
//!
//! ## Flow
//!
//! 1. Handler uses the [`Auth`] extractor
//! 2. [`AuthVerifier`] routes on the header prefix
//! 3. The matching verifier returns [`Principal`] or a typed [`AuthError`]
//!
//! ## Security
//!
//! - Signature comparison is constant-time via one shared utility
//! - Token verification algorithms are pinned by the key set, never
//!   selected by the token header
//! - The key cache refreshes single-flight under a fetch-rate ceiling
//! - Raw credentials are request-scoped and never logged or persisted

pub mod canonical;
pub mod error;
pub mod extractor;
pub mod facade;
pub mod hmac;
pub mod init_data;
pub mod keys;
pub mod principal;
pub mod token;

pub use error::AuthError;
pub use extractor::{Auth, OptionalAuth};
pub use facade::AuthVerifier;
pub use init_data::InitDataVerifier;
pub use keys::{HttpKeySetSource, KeySetSource, SigningKeyCache};
pub use principal::Principal;
pub use token::TokenVerifier;

/// Outcome of a verification: a verified principal or a typed rejection.
pub type VerificationResult = Result<Principal, AuthError>;
