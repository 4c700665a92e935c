// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated principals.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(principal): Auth) -> impl IntoResponse {
//!     // principal.user_id identifies the verified caller
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::{AuthError, Principal};
use crate::state::AppState;

/// Extractor requiring a verified principal.
///
/// Reads the `Authorization` header and delegates to the facade; the
/// handler never sees the raw credential. A principal already placed in
/// request extensions (e.g. by middleware) is honored without re-verifying.
pub struct Auth(pub Principal);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<Principal>().cloned() {
            return Ok(Auth(principal));
        }

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingCredential)?
            .to_str()
            .map_err(|_| AuthError::MalformedCredential)?;

        let principal = state.auth.verify_header(header).await?;
        Ok(Auth(principal))
    }
}

/// Optional authentication extractor.
///
/// Returns `None` instead of rejecting when no valid credential is present.
/// For endpoints that can serve anonymous callers with reduced data.
pub struct OptionalAuth(pub Option<Principal>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match Auth::from_request_parts(parts, state).await {
            Ok(Auth(principal)) => Ok(OptionalAuth(Some(principal))),
            Err(_) => Ok(OptionalAuth(None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::init_data::test_support::signed_credential;
    use crate::auth::{AuthVerifier, InitDataVerifier};
    use axum::http::Request;
    use chrono::Utc;

    const APP_SECRET: &[u8] = b"110201543:TEST-application-secret";

    fn test_state() -> AppState {
        let auth = AuthVerifier::new().with_init_data(InitDataVerifier::new(APP_SECRET));
        AppState::new(auth)
    }

    fn fresh_credential() -> String {
        let auth_date = Utc::now().timestamp().to_string();
        signed_credential(
            APP_SECRET,
            &[("auth_date", auth_date.as_str()), ("user", r#"{"id":42}"#)],
        )
    }

    #[tokio::test]
    async fn auth_extractor_requires_credential() {
        let state = test_state();
        let mut parts = Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingCredential)));
    }

    #[tokio::test]
    async fn auth_extractor_accepts_valid_init_data() {
        let state = test_state();
        let mut parts = Request::builder()
            .uri("/test")
            .header("Authorization", format!("tma {}", fresh_credential()))
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert_eq!(result.unwrap().0.user_id, "42");
    }

    #[tokio::test]
    async fn auth_extractor_prefers_extensions() {
        let state = test_state();
        let mut parts = Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let principal = Principal {
            user_id: "user_from_middleware".to_string(),
            issued_at: None,
        };
        parts.extensions.insert(principal);

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert_eq!(result.unwrap().0.user_id, "user_from_middleware");
    }

    #[tokio::test]
    async fn optional_auth_returns_none_without_credential() {
        let state = test_state();
        let mut parts = Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let result = OptionalAuth::from_request_parts(&mut parts, &state).await;
        assert!(result.unwrap().0.is_none());
    }

    #[tokio::test]
    async fn optional_auth_returns_principal_when_present() {
        let state = test_state();
        let mut parts = Request::builder()
            .uri("/test")
            .header("Authorization", format!("tma {}", fresh_credential()))
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let result = OptionalAuth::from_request_parts(&mut parts, &state).await;
        assert_eq!(result.unwrap().0.unwrap().user_id, "42");
    }
}
