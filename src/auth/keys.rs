// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signing-key cache backed by a remote JSON Web Key Set.
//!
//! The identity backend publishes its public keys at a well-known endpoint
//! and rotates them over time. This module fetches that key set, indexes it
//! by `kid`, and caches it process-wide so token verification normally
//! costs no network access.
//!
//! ## Security
//!
//! - The verification algorithm is pinned per key from the key set's own
//!   declaration; a token's self-declared `alg` never selects it
//! - A single-flight refresh coalesces concurrent fetches; a fetch-rate
//!   ceiling bounds key-set load during cache-busting attacks (repeated
//!   unknown `kid` values)
//! - `KeyNotFound` (untrusted input) is kept distinct from
//!   `KeyFetchFailed` (transient backend failure)

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::{AlgorithmParameters, EllipticCurve, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::{Mutex, RwLock};

use super::error::AuthError;

/// Well-known key-set path appended to the configured base URL.
pub const WELL_KNOWN_JWKS_PATH: &str = "/.well-known/jwks.json";

/// Default key-set cache TTL (24 hours).
pub const DEFAULT_KEY_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default fetch-rate ceiling: at most 5 fetches per minute.
pub const DEFAULT_FETCH_LIMIT: usize = 5;

/// Window over which the fetch-rate ceiling applies.
pub const DEFAULT_FETCH_WINDOW: Duration = Duration::from_secs(60);

/// Where signing keys come from.
///
/// Injectable so tests substitute a fake source; production uses
/// [`HttpKeySetSource`].
#[async_trait]
pub trait KeySetSource: Send + Sync {
    /// Fetch the complete current key set.
    ///
    /// Transport failures map to [`AuthError::KeyFetchFailed`].
    async fn fetch_key_set(&self) -> Result<JwkSet, AuthError>;
}

/// Key-set source fetching from the identity backend over HTTPS.
pub struct HttpKeySetSource {
    jwks_url: url::Url,
    client: reqwest::Client,
}

impl HttpKeySetSource {
    /// Build a source from the identity backend's base URL.
    ///
    /// The key-set URL is derived deterministically by appending the
    /// well-known path, e.g. `https://issuer.example.com` becomes
    /// `https://issuer.example.com/.well-known/jwks.json`.
    pub fn new(base_url: &str) -> Result<Self, AuthError> {
        let jwks_url = url::Url::parse(&format!(
            "{}{WELL_KNOWN_JWKS_PATH}",
            base_url.trim_end_matches('/')
        ))
        .map_err(|e| {
            AuthError::ServerMisconfiguration(format!("invalid key-set base URL: {e}"))
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                AuthError::ServerMisconfiguration(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self { jwks_url, client })
    }

    /// The derived key-set URL.
    pub fn jwks_url(&self) -> &str {
        self.jwks_url.as_str()
    }
}

#[async_trait]
impl KeySetSource for HttpKeySetSource {
    async fn fetch_key_set(&self) -> Result<JwkSet, AuthError> {
        let response = self
            .client
            .get(self.jwks_url.clone())
            .send()
            .await
            .map_err(|e| AuthError::KeyFetchFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::KeyFetchFailed(format!(
                "HTTP {} from key-set endpoint",
                response.status()
            )));
        }

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| AuthError::KeyFetchFailed(e.to_string()))
    }
}

/// A verification key resolved from the key set.
///
/// Immutable once fetched. `algorithm` is the key's own declaration and is
/// the only algorithm verification will accept for this key.
#[derive(Clone)]
pub struct CachedKey {
    pub kid: String,
    pub algorithm: Algorithm,
    pub decoding_key: Arc<DecodingKey>,
}

struct CacheState {
    /// `kid` index, replaced wholesale on every successful fetch.
    keys: HashMap<String, CachedKey>,
    fetched_at: Option<Instant>,
    /// Bumped on every refresh so callers queued behind an in-flight fetch
    /// can tell the cache they observed has been replaced.
    generation: u64,
}

/// Process-wide cache of the identity backend's signing keys.
///
/// Read-mostly: the common path is a shared read of a fresh cache. A miss
/// or stale entry funnels through a refresh mutex so concurrent callers
/// trigger at most one network fetch between them.
pub struct SigningKeyCache {
    source: Arc<dyn KeySetSource>,
    ttl: Duration,
    fetch_limit: usize,
    fetch_window: Duration,
    state: RwLock<CacheState>,
    refresh_lock: Mutex<()>,
    fetch_log: std::sync::Mutex<VecDeque<Instant>>,
}

impl SigningKeyCache {
    /// Create a cache over the given source with default TTL and ceiling.
    pub fn new(source: Arc<dyn KeySetSource>) -> Self {
        Self {
            source,
            ttl: DEFAULT_KEY_TTL,
            fetch_limit: DEFAULT_FETCH_LIMIT,
            fetch_window: DEFAULT_FETCH_WINDOW,
            state: RwLock::new(CacheState {
                keys: HashMap::new(),
                fetched_at: None,
                generation: 0,
            }),
            refresh_lock: Mutex::new(()),
            fetch_log: std::sync::Mutex::new(VecDeque::new()),
        }
    }

    /// Override the cache TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Override the fetch-rate ceiling.
    pub fn with_fetch_limit(mut self, limit: usize, window: Duration) -> Self {
        self.fetch_limit = limit;
        self.fetch_window = window;
        self
    }

    /// Resolve the signing key for `kid`.
    ///
    /// A fresh cache hit returns directly with no network access. A miss or
    /// stale entry refreshes the whole key set (single-flight). `kid` still
    /// absent after a fresh fetch is [`AuthError::KeyNotFound`], the
    /// expected signal for rotation in progress or a forged `kid`.
    pub async fn get_key(&self, kid: &str) -> Result<CachedKey, AuthError> {
        let generation = {
            let state = self.state.read().await;
            if self.is_fresh_state(&state) {
                if let Some(key) = state.keys.get(kid) {
                    return Ok(key.clone());
                }
            }
            state.generation
        };

        // Miss or stale entry: all refresh traffic funnels through here.
        let _flight = self.refresh_lock.lock().await;

        {
            let state = self.state.read().await;
            if state.generation != generation && self.is_fresh_state(&state) {
                // A refresh completed while we were queued; observe its
                // result instead of fetching again.
                return match state.keys.get(kid) {
                    Some(key) => Ok(key.clone()),
                    None => Err(AuthError::KeyNotFound),
                };
            }
        }

        if !self.record_fetch() {
            // Ceiling reached: repeated unknown-`kid` traffic must not turn
            // into key-set load. Serve what is still cached, stale or not.
            let state = self.state.read().await;
            return match state.keys.get(kid) {
                Some(key) => Ok(key.clone()),
                None => Err(AuthError::KeyNotFound),
            };
        }

        let key_set = self.source.fetch_key_set().await?;
        let keys = index_key_set(&key_set);

        let mut state = self.state.write().await;
        state.keys = keys;
        state.fetched_at = Some(Instant::now());
        state.generation = state.generation.wrapping_add(1);

        tracing::debug!(keys = state.keys.len(), "signing key set refreshed");

        match state.keys.get(kid) {
            Some(key) => Ok(key.clone()),
            None => Err(AuthError::KeyNotFound),
        }
    }

    /// Force a key-set refresh, honoring the fetch-rate ceiling.
    ///
    /// Used by the readiness probe to confirm the identity backend is
    /// reachable before the first token arrives.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let _flight = self.refresh_lock.lock().await;

        if !self.record_fetch() {
            return Err(AuthError::KeyFetchFailed(
                "key-set fetch rate ceiling reached".to_string(),
            ));
        }

        let key_set = self.source.fetch_key_set().await?;
        let keys = index_key_set(&key_set);

        let mut state = self.state.write().await;
        state.keys = keys;
        state.fetched_at = Some(Instant::now());
        state.generation = state.generation.wrapping_add(1);
        Ok(())
    }

    /// Whether a key set is cached and within its TTL.
    pub async fn is_fresh(&self) -> bool {
        let state = self.state.read().await;
        self.is_fresh_state(&state)
    }

    fn is_fresh_state(&self, state: &CacheState) -> bool {
        state
            .fetched_at
            .is_some_and(|fetched| fetched.elapsed() < self.ttl)
    }

    /// Record a fetch attempt against the sliding-window ceiling.
    ///
    /// Returns `false` when the ceiling is reached.
    fn record_fetch(&self) -> bool {
        let mut log = self.fetch_log.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();

        if let Some(cutoff) = now.checked_sub(self.fetch_window) {
            while log.front().is_some_and(|t| *t <= cutoff) {
                log.pop_front();
            }
        }

        if log.len() >= self.fetch_limit {
            return false;
        }
        log.push_back(now);
        true
    }
}

/// Index a fetched key set by `kid`, skipping unusable entries.
///
/// One bad key must not take the whole set down during rotation.
fn index_key_set(key_set: &JwkSet) -> HashMap<String, CachedKey> {
    let mut keys = HashMap::new();
    for jwk in &key_set.keys {
        let Some(kid) = jwk.common.key_id.clone() else {
            tracing::warn!("key set entry without kid, skipping");
            continue;
        };
        match jwk_to_cached_key(&kid, jwk) {
            Ok(key) => {
                keys.insert(kid, key);
            }
            Err(reason) => {
                tracing::warn!(kid = %kid, reason = %reason, "unusable key in key set, skipping");
            }
        }
    }
    keys
}

/// Convert a JWK into a verification key with a pinned algorithm.
///
/// The algorithm is taken from the key's own type and `alg` declaration; a
/// declaration inconsistent with the key material rejects the key outright
/// rather than widening what verification would accept.
fn jwk_to_cached_key(kid: &str, jwk: &Jwk) -> Result<CachedKey, String> {
    let (decoding_key, algorithm) = match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => {
            let key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
                .map_err(|e| format!("invalid RSA components: {e}"))?;
            let alg = match jwk.common.key_algorithm {
                None | Some(KeyAlgorithm::RS256) => Algorithm::RS256,
                Some(KeyAlgorithm::RS384) => Algorithm::RS384,
                Some(KeyAlgorithm::RS512) => Algorithm::RS512,
                Some(other) => return Err(format!("algorithm {other:?} not valid for RSA key")),
            };
            (key, alg)
        }
        AlgorithmParameters::EllipticCurve(ec) => {
            let key = DecodingKey::from_ec_components(&ec.x, &ec.y)
                .map_err(|e| format!("invalid EC components: {e}"))?;
            let alg = match (&ec.curve, jwk.common.key_algorithm) {
                (EllipticCurve::P256, None | Some(KeyAlgorithm::ES256)) => Algorithm::ES256,
                (EllipticCurve::P384, None | Some(KeyAlgorithm::ES384)) => Algorithm::ES384,
                (curve, alg) => {
                    return Err(format!("curve {curve:?} with algorithm {alg:?} not supported"))
                }
            };
            (key, alg)
        }
        AlgorithmParameters::OctetKeyPair(okp) => {
            if okp.curve != EllipticCurve::Ed25519 {
                return Err(format!("OKP curve {:?} not supported", okp.curve));
            }
            let key = DecodingKey::from_ed_components(&okp.x)
                .map_err(|e| format!("invalid Ed25519 component: {e}"))?;
            match jwk.common.key_algorithm {
                None | Some(KeyAlgorithm::EdDSA) => {}
                Some(other) => return Err(format!("algorithm {other:?} not valid for OKP key")),
            }
            (key, Algorithm::EdDSA)
        }
        other => return Err(format!("unsupported key type {other:?}")),
    };

    Ok(CachedKey {
        kid: kid.to_string(),
        algorithm,
        decoding_key: Arc::new(decoding_key),
    })
}
