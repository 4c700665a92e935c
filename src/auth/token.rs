// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer-token verification against the cached signing keys.
//!
//! ## Security
//!
//! The verification algorithm comes from the key set entry resolved by
//! `kid`, never from the token's own header. The header's `alg` is read
//! only to fail fast when it disagrees with the key; accepting it as a
//! selector is the classic algorithm-confusion vulnerability.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use jsonwebtoken::{decode, decode_header, errors::ErrorKind, Validation};
use serde::Deserialize;

use super::error::AuthError;
use super::keys::SigningKeyCache;
use super::principal::Principal;
use super::VerificationResult;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Standard claims read from a verified token.
#[derive(Debug, Deserialize)]
struct TokenClaims {
    /// Subject (user ID)
    #[serde(default)]
    sub: String,
    /// Issued at timestamp
    #[serde(default)]
    iat: Option<i64>,
    /// Expiration timestamp (validated by the jsonwebtoken crate)
    #[serde(default)]
    #[allow(dead_code)]
    exp: i64,
    /// Issuer (validated by the jsonwebtoken crate when pinned)
    #[serde(default)]
    #[allow(dead_code)]
    iss: Option<String>,
    /// Audience (validated by the jsonwebtoken crate when pinned)
    #[serde(default)]
    #[allow(dead_code)]
    aud: Option<serde_json::Value>,
}

/// Verifier for identity-backend bearer tokens.
pub struct TokenVerifier {
    keys: Arc<SigningKeyCache>,
    issuer: Option<String>,
    audience: Option<String>,
}

impl TokenVerifier {
    /// Create a verifier over the shared signing-key cache.
    pub fn new(keys: Arc<SigningKeyCache>) -> Self {
        Self {
            keys,
            issuer: None,
            audience: None,
        }
    }

    /// Pin the expected `iss` claim.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Pin the expected `aud` claim.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Verify a bearer token and extract its subject.
    pub async fn verify(&self, token: &str) -> VerificationResult {
        // Header is read unverified, only to route to the right key.
        let header = decode_header(token).map_err(|_| AuthError::MalformedCredential)?;
        let kid = header.kid.as_deref().ok_or(AuthError::MalformedCredential)?;

        let key = self.keys.get_key(kid).await?;

        if header.alg != key.algorithm {
            tracing::debug!(
                kid,
                header_alg = ?header.alg,
                key_alg = ?key.algorithm,
                "token algorithm disagrees with key set"
            );
            return Err(AuthError::SignatureMismatch);
        }

        let mut validation = Validation::new(key.algorithm);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.validate_nbf = true;

        if let Some(ref issuer) = self.issuer {
            validation.set_issuer(&[issuer]);
        }
        if let Some(ref audience) = self.audience {
            validation.set_audience(&[audience]);
        } else {
            validation.validate_aud = false;
        }

        let token_data = decode::<TokenClaims>(token, &key.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => AuthError::Expired,
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidIssuer
                | ErrorKind::InvalidAudience => AuthError::SignatureMismatch,
                _ => AuthError::MalformedCredential,
            })?;

        let claims = token_data.claims;
        if claims.sub.is_empty() {
            return Err(AuthError::MalformedCredential);
        }

        let issued_at = claims.iat.and_then(|ts| Utc.timestamp_opt(ts, 0).single());

        Ok(Principal {
            user_id: claims.sub,
            issued_at,
        })
    }
}
