// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! Every expected verification failure is a variant here; verifiers return
//! `Result<Principal, AuthError>` and never panic on adversarial input.
//! Response bodies stay terse and non-identifying; which field failed or
//! which `kid` was missing is logged server-side only.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication error taxonomy.
///
/// The variants distinguish "the caller presented something untrusted"
/// (401 family) from "this server cannot verify anything right now"
/// (500 family). `KeyNotFound` is deliberately 401: a token referencing an
/// unknown `kid` is untrusted input, not a server fault.
#[derive(Debug)]
pub enum AuthError {
    /// No recognizable credential on the request
    MissingCredential,
    /// Credential present but unparsable or missing required fields
    MalformedCredential,
    /// Signature present but does not match the recomputed value
    SignatureMismatch,
    /// Signature valid but outside the allowed time window
    Expired,
    /// Token references a key id unknown even after a fresh key-set fetch
    KeyNotFound,
    /// Transient inability to reach the key-set endpoint
    KeyFetchFailed(String),
    /// Required secrets/configuration absent for the selected scheme
    ServerMisconfiguration(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::MalformedCredential => "malformed_credential",
            AuthError::SignatureMismatch => "signature_mismatch",
            AuthError::Expired => "credential_expired",
            AuthError::KeyNotFound => "key_not_found",
            AuthError::KeyFetchFailed(_) => "key_fetch_failed",
            AuthError::ServerMisconfiguration(_) => "server_misconfiguration",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingCredential
            | AuthError::MalformedCredential
            | AuthError::SignatureMismatch
            | AuthError::Expired
            | AuthError::KeyNotFound => StatusCode::UNAUTHORIZED,
            AuthError::KeyFetchFailed(_) | AuthError::ServerMisconfiguration(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingCredential => write!(f, "Authorization credential is required"),
            AuthError::MalformedCredential => write!(f, "Credential is malformed"),
            AuthError::SignatureMismatch => write!(f, "Credential signature is invalid"),
            AuthError::Expired => write!(f, "Credential has expired"),
            AuthError::KeyNotFound => write!(f, "Credential signature is invalid"),
            AuthError::KeyFetchFailed(_) => write!(f, "Authentication is temporarily unavailable"),
            AuthError::ServerMisconfiguration(_) => {
                write!(f, "Authentication is not configured for this scheme")
            }
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        // Internal detail (fetch error text, misconfigured scheme) stays in
        // the server log; the body carries only the terse message.
        match &self {
            AuthError::KeyFetchFailed(detail) | AuthError::ServerMisconfiguration(detail) => {
                tracing::error!(
                    error_code = self.error_code(),
                    detail = %detail,
                    "authentication failed"
                );
            }
            _ => {
                tracing::debug!(error_code = self.error_code(), "authentication rejected");
            }
        }

        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn missing_credential_returns_401() {
        let response = AuthError::MissingCredential.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "missing_credential");
    }

    #[tokio::test]
    async fn key_fetch_failure_returns_500_without_detail() {
        let response =
            AuthError::KeyFetchFailed("connect timeout to 10.0.0.1".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        // Transport detail must not leak into the response body.
        assert!(!body.contains("10.0.0.1"));
    }

    #[test]
    fn key_not_found_is_unauthorized_not_server_error() {
        assert_eq!(AuthError::KeyNotFound.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn unknown_kid_message_matches_signature_mismatch() {
        // A probing client must not be able to distinguish "bad signature"
        // from "unknown key id" by the response text.
        assert_eq!(
            AuthError::KeyNotFound.to_string(),
            AuthError::SignatureMismatch.to_string()
        );
    }
}
