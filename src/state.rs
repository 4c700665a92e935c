// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::auth::{AuthVerifier, SigningKeyCache};
use crate::store::InMemoryStore;

/// Shared application state.
///
/// `auth` is the single authentication entry point for all handlers. The
/// key cache is held separately only so health checks can probe freshness;
/// it is the same instance the token verifier reads through.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthVerifier>,
    pub keys: Option<Arc<SigningKeyCache>>,
    pub store: Arc<RwLock<InMemoryStore>>,
}

impl AppState {
    pub fn new(auth: AuthVerifier) -> Self {
        Self {
            auth: Arc::new(auth),
            keys: None,
            store: Arc::new(RwLock::new(InMemoryStore::new())),
        }
    }

    /// Attach the signing-key cache for health reporting.
    pub fn with_key_cache(mut self, keys: Arc<SigningKeyCache>) -> Self {
        self.keys = Some(keys);
        self
    }
}
