// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Scheme dispatch: the single entry point handlers authenticate through.
//!
//! The `Authorization` header's prefix selects the trust scheme; the
//! matching verifier produces the uniform [`VerificationResult`]. The
//! facade holds no state beyond the two verifiers.

use super::error::AuthError;
use super::init_data::InitDataVerifier;
use super::token::TokenVerifier;
use super::VerificationResult;

/// Prefix selecting the Mini App initData scheme.
pub const INIT_DATA_SCHEME: &str = "tma ";

/// Prefix selecting the bearer-token scheme.
pub const BEARER_SCHEME: &str = "Bearer ";

/// Dispatches a credential-bearing header to the matching verifier.
///
/// Either scheme may be left unconfigured; presenting a credential for an
/// unconfigured scheme is a server-side failure
/// ([`AuthError::ServerMisconfiguration`]), never a silent bypass.
#[derive(Default)]
pub struct AuthVerifier {
    init_data: Option<InitDataVerifier>,
    tokens: Option<TokenVerifier>,
}

impl AuthVerifier {
    /// Create a facade with no schemes configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable the Mini App initData scheme.
    pub fn with_init_data(mut self, verifier: InitDataVerifier) -> Self {
        self.init_data = Some(verifier);
        self
    }

    /// Enable the bearer-token scheme.
    pub fn with_tokens(mut self, verifier: TokenVerifier) -> Self {
        self.tokens = Some(verifier);
        self
    }

    /// Verify the value of an `Authorization` header.
    ///
    /// `"tma "` selects the Mini App scheme, `"Bearer "` the token scheme;
    /// anything else carries no recognizable credential.
    pub async fn verify_header(&self, header: &str) -> VerificationResult {
        if let Some(raw) = header.strip_prefix(INIT_DATA_SCHEME) {
            let verifier = self.init_data.as_ref().ok_or_else(|| {
                AuthError::ServerMisconfiguration("Mini App scheme is not configured".to_string())
            })?;
            verifier.verify(raw)
        } else if let Some(token) = header.strip_prefix(BEARER_SCHEME) {
            let verifier = self.tokens.as_ref().ok_or_else(|| {
                AuthError::ServerMisconfiguration("token scheme is not configured".to_string())
            })?;
            verifier.verify(token.trim()).await
        } else {
            Err(AuthError::MissingCredential)
        }
    }
}
