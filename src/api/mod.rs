// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::Principal,
    models::{CreateSubscriptionRequest, Subscription},
    state::AppState,
};

pub mod health;
pub mod me;
pub mod subscriptions;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/me", get(me::me))
        .route(
            "/subscriptions",
            get(subscriptions::list_subscriptions).post(subscriptions::create_subscription),
        )
        .route(
            "/subscriptions/{subscription_id}",
            delete(subscriptions::delete_subscription),
        );

    Router::new()
        .nest("/v1", v1_routes)
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        me::me,
        subscriptions::list_subscriptions,
        subscriptions::create_subscription,
        subscriptions::delete_subscription
    ),
    components(
        schemas(
            Principal,
            Subscription,
            CreateSubscriptionRequest,
            health::ReadyResponse,
            health::HealthResponse,
            health::HealthChecks
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Me", description = "Verified caller identity"),
        (name = "Subscriptions", description = "Per-user subscription records")
    )
)]
struct ApiDoc;
