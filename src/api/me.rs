// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::Json;

use crate::auth::{Auth, Principal};

/// Return the verified identity of the caller.
///
/// Useful for clients to confirm which principal their credential maps to;
/// the response never echoes the credential itself.
#[utoipa::path(
    get,
    path = "/v1/me",
    tag = "Me",
    responses(
        (status = 200, description = "Verified caller identity", body = Principal),
        (status = 401, description = "Missing or invalid credential")
    )
)]
pub async fn me(Auth(principal): Auth) -> Json<Principal> {
    Json(principal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn me_echoes_principal() {
        let principal = Principal {
            user_id: "42".into(),
            issued_at: None,
        };

        let Json(body) = me(Auth(principal)).await;
        assert_eq!(body.user_id, "42");
    }
}
