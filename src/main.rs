// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;
use std::sync::Arc;

use subtrack_server::api::router;
use subtrack_server::auth::{
    AuthVerifier, HttpKeySetSource, InitDataVerifier, SigningKeyCache, TokenVerifier,
};
use subtrack_server::config::{AppConfig, LogFormat};
use subtrack_server::state::AppState;

#[tokio::main]
async fn main() {
    // Fail fast: a server with no verifiable scheme must not come up.
    let config = AppConfig::from_env().expect("configuration error");

    init_tracing(config.log_format);

    let (auth, key_cache) = build_auth(&config);

    let mut state = AppState::new(auth);
    if let Some(keys) = key_cache {
        state = state.with_key_cache(keys);
    }

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Failed to parse bind address");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server address");

    tracing::info!(
        %addr,
        init_data = config.init_data_secret.is_some(),
        bearer_tokens = config.jwks_base_url.is_some(),
        "Subtrack server listening (docs at /docs)"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("HTTP server failed");
}

/// Wire the configured trust schemes into the authentication facade.
fn build_auth(config: &AppConfig) -> (AuthVerifier, Option<Arc<SigningKeyCache>>) {
    let mut auth = AuthVerifier::new();
    let mut key_cache = None;

    if let Some(ref secret) = config.init_data_secret {
        auth = auth.with_init_data(
            InitDataVerifier::new(secret.as_bytes()).with_max_age(config.init_data_max_age),
        );
    }

    if let Some(ref base_url) = config.jwks_base_url {
        let source = HttpKeySetSource::new(base_url).expect("invalid key-set base URL");
        let cache = Arc::new(SigningKeyCache::new(Arc::new(source)));

        let mut tokens = TokenVerifier::new(cache.clone());
        if let Some(ref issuer) = config.issuer {
            tokens = tokens.with_issuer(issuer);
        }
        if let Some(ref audience) = config.audience {
            tokens = tokens.with_audience(audience);
        }

        auth = auth.with_tokens(tokens);
        key_cache = Some(cache);
    }

    (auth, key_cache)
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=debug"));

    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("shutdown signal received");
}
