// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response data structures used by the REST API. All types
//! derive `Serialize`, `Deserialize`, and `ToSchema` for automatic JSON
//! handling and OpenAPI documentation.
//!
//! Records are always scoped to the verified principal's `user_id`; no
//! model carries credential material.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A tracked subscription.
///
/// Owned by the authenticated user who created it; `user_id` comes from
/// the verified principal, never from the request body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Subscription {
    /// Unique identifier for this subscription.
    pub id: String,
    /// Verified user this subscription belongs to.
    pub user_id: String,
    /// Display name of the subscribed service.
    pub name: String,
    /// Price per billing cycle, in minor currency units.
    pub amount_minor: i64,
    /// ISO 4217 currency code.
    pub currency_code: String,
    /// Billing cycle length in days.
    pub billing_cycle_days: i32,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

/// Request body for creating a subscription.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateSubscriptionRequest {
    /// Display name of the subscribed service.
    pub name: String,
    /// Price per billing cycle, in minor currency units.
    pub amount_minor: i64,
    /// ISO 4217 currency code.
    pub currency_code: String,
    /// Billing cycle length in days.
    pub billing_cycle_days: i32,
}
