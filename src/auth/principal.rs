// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Verified principal and the identity payloads it is built from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The verified identity produced by successful authentication.
///
/// This is the only artifact handed to downstream handlers. It never
/// contains the raw credential; the credential string is dropped as soon
/// as verification completes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Principal {
    /// Canonical user ID.
    ///
    /// For the token scheme this is the `sub` claim; for the Mini App
    /// scheme it is the numeric user id from the signed `user` payload,
    /// rendered as a string.
    pub user_id: String,

    /// When the credential was issued (`auth_date` or `iat`), if carried.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<DateTime<Utc>>,
}

/// User payload embedded in a Mini App credential's `user` field.
///
/// The host application serializes this as JSON inside the URL-encoded
/// credential. Only `id` is required; the remaining fields are
/// display-oriented and optional.
#[derive(Debug, Clone, Deserialize)]
pub struct InitDataUser {
    /// Numeric user id assigned by the host application.
    pub id: i64,

    #[serde(default)]
    pub first_name: Option<String>,

    #[serde(default)]
    pub last_name: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub language_code: Option<String>,
}

impl Principal {
    /// Build a principal from a decoded Mini App user payload.
    pub fn from_init_data(user: &InitDataUser, issued_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user.id.to_string(),
            issued_at: Some(issued_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn from_init_data_renders_numeric_id() {
        let user: InitDataUser =
            serde_json::from_str(r#"{"id":42,"first_name":"Ada","username":"ada"}"#).unwrap();
        let issued = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        let principal = Principal::from_init_data(&user, issued);
        assert_eq!(principal.user_id, "42");
        assert_eq!(principal.issued_at, Some(issued));
    }

    #[test]
    fn init_data_user_requires_id() {
        let result = serde_json::from_str::<InitDataUser>(r#"{"first_name":"Ada"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn principal_serializes_without_empty_issued_at() {
        let principal = Principal {
            user_id: "user_123".into(),
            issued_at: None,
        };
        let json = serde_json::to_string(&principal).unwrap();
        assert_eq!(json, r#"{"user_id":"user_123"}"#);
    }
}
