// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Keyed HMAC-SHA256 digests.
//!
//! Pure functions, no state. The Mini App scheme uses [`sign`] twice: once
//! through [`derive_secret`] to turn the long-lived application secret into
//! a scheme-specific key, and once to sign the canonical check-string with
//! that derived key.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 digest length in bytes.
pub const DIGEST_LEN: usize = 32;

/// Compute `HMAC-SHA256(key, message)`.
pub fn sign(key: &[u8], message: &[u8]) -> [u8; DIGEST_LEN] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(message);
    mac.finalize().into_bytes().into()
}

/// Derive a scheme-specific signing key from a long-lived secret.
///
/// `label` is a fixed domain-separation string used as the HMAC *key* with
/// the application secret as the message. The derived key is unusable in
/// any other signing context even if the underlying secret leaks into
/// another protocol.
pub fn derive_secret(label: &str, app_secret: &[u8]) -> [u8; DIGEST_LEN] {
    sign(label.as_bytes(), app_secret)
}
