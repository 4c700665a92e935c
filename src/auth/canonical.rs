// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Canonical check-string construction and constant-time comparison.
//!
//! Both HMAC-verified schemes sign the same deterministic representation of
//! a credential's fields, and every signature comparison in the crate goes
//! through [`constant_time_eq`]. Keeping both in one module means there is
//! exactly one canonicalization and one comparison to audit.
//!
//! ## Check-string format
//!
//! ```text
//! key1=value1 "\n" key2=value2 "\n" ... keyN=valueN
//! ```
//!
//! Keys sorted ascending by byte-wise comparison, the signature field
//! excluded, no trailing newline. Any difference in sort order, escaping,
//! or separator invalidates every signature.

use std::collections::BTreeMap;

use subtle::ConstantTimeEq;

/// Build the canonical check-string for a set of credential fields.
///
/// The pair carrying the signature itself (`signature_field`) is excluded;
/// the remaining pairs are sorted by ordinal key comparison and emitted as
/// newline-joined `key=value` lines. Duplicate keys keep the last value,
/// matching the signer's map semantics.
///
/// Pure function: deterministic for a given input set regardless of the
/// original pair order.
pub fn check_string<K, V>(pairs: &[(K, V)], signature_field: &str) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let sorted: BTreeMap<&str, &str> = pairs
        .iter()
        .map(|(k, v)| (k.as_ref(), v.as_ref()))
        .filter(|(k, _)| *k != signature_field)
        .collect();

    sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Constant-time equality over byte buffers.
///
/// A length mismatch returns `false` before any byte comparison; the
/// signature schemes in this crate produce fixed-length digests, so the
/// length itself carries no secret information. Equal-length buffers are
/// compared with equal effort regardless of where they differ.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
