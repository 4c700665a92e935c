// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Mini App credential (initData) verification.
//!
//! The host application signs a URL-encoded set of fields and hands the
//! result to the embedded client, which forwards it verbatim on every
//! request. Verification recomputes the signature from the canonical
//! check-string with a key derived from the application secret.
//!
//! ## Security
//!
//! - The two-step HMAC (domain-separation label, then check-string) must
//!   byte-match the host application's construction exactly
//! - Signature comparison is constant-time over equal-length buffers;
//!   a malformed or wrong-length signature is inequality, not an error
//!   path with different timing
//! - `auth_date` bounds replay: credentials older than the configured
//!   window are rejected even with a valid signature

use chrono::{DateTime, TimeZone, Utc};
use std::time::Duration;

use super::canonical::{check_string, constant_time_eq};
use super::error::AuthError;
use super::hmac;
use super::principal::{InitDataUser, Principal};
use super::VerificationResult;

/// Field carrying the credential's own signature.
const SIGNATURE_FIELD: &str = "hash";

/// Field carrying the Unix issue time.
const AUTH_DATE_FIELD: &str = "auth_date";

/// Field carrying the JSON user payload.
const USER_FIELD: &str = "user";

/// Domain-separation label for deriving the signing key.
const SECRET_DERIVATION_LABEL: &str = "WebAppData";

/// Default maximum credential age (24 hours).
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Verifier for Mini App credentials.
///
/// Pure CPU-bound computation with one wall-clock read; no I/O, no retries.
pub struct InitDataVerifier {
    app_secret: Vec<u8>,
    max_age: Duration,
}

impl InitDataVerifier {
    /// Create a verifier for the given application secret.
    pub fn new(app_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            app_secret: app_secret.into(),
            max_age: DEFAULT_MAX_AGE,
        }
    }

    /// Override the maximum accepted credential age.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Verify a raw credential string against the application secret.
    pub fn verify(&self, raw: &str) -> VerificationResult {
        self.verify_at(raw, Utc::now())
    }

    /// Verify with an explicit clock, so tests can pin `now`.
    pub fn verify_at(&self, raw: &str, now: DateTime<Utc>) -> VerificationResult {
        // Parse as URL-encoded pairs; values are percent-decoded here and
        // signed in decoded form.
        let pairs: Vec<(String, String)> = url::form_urlencoded::parse(raw.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let presented = pairs
            .iter()
            .find(|(k, _)| k == SIGNATURE_FIELD)
            .map(|(_, v)| v.as_str())
            .ok_or(AuthError::MalformedCredential)?;

        // A signature that does not even decode to the digest length is
        // inequality; decoding happens before any byte of the expected
        // digest is compared.
        let presented_bytes = match hex::decode(presented) {
            Ok(bytes) if bytes.len() == hmac::DIGEST_LEN => bytes,
            _ => return Err(AuthError::SignatureMismatch),
        };

        let canonical = check_string(&pairs, SIGNATURE_FIELD);
        let derived = hmac::derive_secret(SECRET_DERIVATION_LABEL, &self.app_secret);
        let expected = hmac::sign(&derived, canonical.as_bytes());

        if !constant_time_eq(&expected, &presented_bytes) {
            return Err(AuthError::SignatureMismatch);
        }

        // Signature holds; now enforce the replay window.
        let auth_date = pairs
            .iter()
            .find(|(k, _)| k == AUTH_DATE_FIELD)
            .and_then(|(_, v)| v.parse::<i64>().ok())
            .ok_or(AuthError::MalformedCredential)?;

        let age = now.timestamp() - auth_date;
        if age > self.max_age.as_secs() as i64 {
            return Err(AuthError::Expired);
        }

        // Every principal in this service carries a user id, so an absent
        // or undecodable user payload fails the credential.
        let user: InitDataUser = pairs
            .iter()
            .find(|(k, _)| k == USER_FIELD)
            .and_then(|(_, v)| serde_json::from_str(v).ok())
            .ok_or(AuthError::MalformedCredential)?;

        let issued_at = Utc
            .timestamp_opt(auth_date, 0)
            .single()
            .ok_or(AuthError::MalformedCredential)?;

        Ok(Principal::from_init_data(&user, issued_at))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    const APP_SECRET: &[u8] = b"110201543:TEST-application-secret";

    fn signed_credential(pairs: &[(&str, &str)]) -> String {
        test_support::signed_credential(APP_SECRET, pairs)
    }

    fn verifier() -> InitDataVerifier {
        InitDataVerifier::new(APP_SECRET)
    }

    fn now_at(ts: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(ts, 0).unwrap()
    }

    #[test]
    fn valid_credential_round_trips() {
        let raw = signed_credential(&[
            ("auth_date", "1700000000"),
            ("user", r#"{"id":42,"first_name":"Ada"}"#),
            ("query_id", "AAF3Xk0aAAAAAHdeTRrRG6Yx"),
        ]);

        let principal = verifier().verify_at(&raw, now_at(1_700_000_100)).unwrap();
        assert_eq!(principal.user_id, "42");
        assert_eq!(principal.issued_at, Some(now_at(1_700_000_000)));
    }

    #[test]
    fn verification_is_order_independent() {
        // Same fields, serialized in reverse order: the canonical form is
        // identical, so the same hash verifies.
        let canonical = check_string(
            &[("auth_date", "1700000000"), ("user", r#"{"id":7}"#)],
            SIGNATURE_FIELD,
        );
        let derived = hmac::derive_secret(SECRET_DERIVATION_LABEL, APP_SECRET);
        let hash = hex::encode(hmac::sign(&derived, canonical.as_bytes()));

        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        serializer.append_pair("user", r#"{"id":7}"#);
        serializer.append_pair(SIGNATURE_FIELD, &hash);
        serializer.append_pair("auth_date", "1700000000");
        let raw = serializer.finish();

        let principal = verifier().verify_at(&raw, now_at(1_700_000_100)).unwrap();
        assert_eq!(principal.user_id, "7");
    }

    #[test]
    fn end_to_end_documented_vector() {
        let canonical = "auth_date=1700000000\nuser={\"id\":42}";
        let derived = hmac::derive_secret(SECRET_DERIVATION_LABEL, APP_SECRET);
        let hash = hex::encode(hmac::sign(&derived, canonical.as_bytes()));

        let raw = format!("auth_date=1700000000&user=%7B%22id%22%3A42%7D&hash={hash}");

        let principal = verifier().verify_at(&raw, now_at(1_700_000_100)).unwrap();
        assert_eq!(principal.user_id, "42");
    }

    #[test]
    fn tampered_field_fails_closed() {
        let raw = signed_credential(&[("auth_date", "1700000000"), ("user", r#"{"id":42}"#)]);
        let tampered = raw.replace("auth_date=1700000000", "auth_date=1700000001");

        let result = verifier().verify_at(&tampered, now_at(1_700_000_100));
        assert!(matches!(result, Err(AuthError::SignatureMismatch)));
    }

    #[test]
    fn tampered_signature_fails_closed() {
        let raw = signed_credential(&[("auth_date", "1700000000"), ("user", r#"{"id":42}"#)]);
        // Flip one hex digit of the signature.
        let hash_start = raw.find("hash=").unwrap() + 5;
        let original = raw.as_bytes()[hash_start] as char;
        let flipped = if original == '0' { '1' } else { '0' };
        let mut tampered = raw.clone();
        tampered.replace_range(hash_start..hash_start + 1, &flipped.to_string());

        let result = verifier().verify_at(&tampered, now_at(1_700_000_100));
        assert!(matches!(result, Err(AuthError::SignatureMismatch)));
    }

    #[test]
    fn missing_signature_is_malformed() {
        let result = verifier().verify_at("auth_date=1700000000", now_at(1_700_000_100));
        assert!(matches!(result, Err(AuthError::MalformedCredential)));

        let result = verifier().verify_at("", now_at(1_700_000_100));
        assert!(matches!(result, Err(AuthError::MalformedCredential)));
    }

    #[test]
    fn wrong_length_signature_is_mismatch_not_error() {
        let result = verifier().verify_at("auth_date=1&hash=abcd", now_at(1_700_000_100));
        assert!(matches!(result, Err(AuthError::SignatureMismatch)));

        let result = verifier().verify_at("auth_date=1&hash=zz-not-hex", now_at(1_700_000_100));
        assert!(matches!(result, Err(AuthError::SignatureMismatch)));
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let now = 1_700_086_400;
        let fresh_date = (now - 86_399).to_string();
        let stale_date = (now - 86_401).to_string();

        let fresh = signed_credential(&[
            ("auth_date", fresh_date.as_str()),
            ("user", r#"{"id":42}"#),
        ]);
        assert!(verifier().verify_at(&fresh, now_at(now)).is_ok());

        let stale = signed_credential(&[
            ("auth_date", stale_date.as_str()),
            ("user", r#"{"id":42}"#),
        ]);
        let result = verifier().verify_at(&stale, now_at(now));
        assert!(matches!(result, Err(AuthError::Expired)));
    }

    #[test]
    fn shorter_max_age_can_be_configured() {
        let verifier = InitDataVerifier::new(APP_SECRET).with_max_age(Duration::from_secs(60));
        let raw = signed_credential(&[("auth_date", "1700000000"), ("user", r#"{"id":42}"#)]);

        assert!(verifier.verify_at(&raw, now_at(1_700_000_059)).is_ok());
        let result = verifier.verify_at(&raw, now_at(1_700_000_061));
        assert!(matches!(result, Err(AuthError::Expired)));
    }

    #[test]
    fn missing_auth_date_is_malformed_even_with_valid_signature() {
        let raw = signed_credential(&[("user", r#"{"id":42}"#)]);
        let result = verifier().verify_at(&raw, now_at(1_700_000_100));
        assert!(matches!(result, Err(AuthError::MalformedCredential)));
    }

    #[test]
    fn missing_or_invalid_user_is_malformed() {
        let missing = signed_credential(&[("auth_date", "1700000000")]);
        let result = verifier().verify_at(&missing, now_at(1_700_000_100));
        assert!(matches!(result, Err(AuthError::MalformedCredential)));

        let invalid =
            signed_credential(&[("auth_date", "1700000000"), ("user", "not-json")]);
        let result = verifier().verify_at(&invalid, now_at(1_700_000_100));
        assert!(matches!(result, Err(AuthError::MalformedCredential)));
    }

    #[test]
    fn wrong_secret_fails_closed() {
        let raw = signed_credential(&[("auth_date", "1700000000"), ("user", r#"{"id":42}"#)]);
        let other = InitDataVerifier::new(&b"other-secret"[..]);

        let result = other.verify_at(&raw, now_at(1_700_000_100));
        assert!(matches!(result, Err(AuthError::SignatureMismatch)));
    }
}
