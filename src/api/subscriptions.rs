// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::Auth,
    error::ApiError,
    models::{CreateSubscriptionRequest, Subscription},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/v1/subscriptions",
    tag = "Subscriptions",
    responses(
        (status = 200, body = [Subscription]),
        (status = 401, description = "Missing or invalid credential")
    )
)]
pub async fn list_subscriptions(
    Auth(principal): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Subscription>>, ApiError> {
    let store = state.store.read().await;
    Ok(Json(store.list_subscriptions(&principal.user_id)))
}

#[utoipa::path(
    post,
    path = "/v1/subscriptions",
    request_body = CreateSubscriptionRequest,
    tag = "Subscriptions",
    responses(
        (status = 201, body = Subscription),
        (status = 401, description = "Missing or invalid credential")
    )
)]
pub async fn create_subscription(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateSubscriptionRequest>,
) -> Result<(StatusCode, Json<Subscription>), ApiError> {
    let mut store = state.store.write().await;
    let subscription = store.create_subscription(&principal.user_id, request)?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

#[utoipa::path(
    delete,
    path = "/v1/subscriptions/{subscription_id}",
    params(
        ("subscription_id" = String, Path, description = "Identifier of the subscription to delete")
    ),
    tag = "Subscriptions",
    responses(
        (status = 204),
        (status = 401, description = "Missing or invalid credential"),
        (status = 404, description = "No such subscription for this user")
    )
)]
pub async fn delete_subscription(
    Auth(principal): Auth,
    Path(subscription_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let mut store = state.store.write().await;
    store.delete_subscription(&principal.user_id, &subscription_id)?;
    Ok(StatusCode::NO_CONTENT)
}
