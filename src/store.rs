// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory subscription store.
//!
//! Persistence is an external collaborator of this service; this store is
//! the minimal stand-in that lets handlers demonstrate the authenticated
//! contract. Every operation is keyed by the verified `user_id`, so a
//! caller can never read or delete another principal's records.

use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{CreateSubscriptionRequest, Subscription};

#[derive(Default)]
pub struct InMemoryStore {
    subscriptions: HashMap<String, Subscription>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list_subscriptions(&self, user_id: &str) -> Vec<Subscription> {
        self.subscriptions
            .values()
            .filter(|subscription| subscription.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn create_subscription(
        &mut self,
        user_id: &str,
        request: CreateSubscriptionRequest,
    ) -> Result<Subscription, ApiError> {
        validate_subscription(&request)?;

        let id = Uuid::new_v4().to_string();
        let subscription = Subscription {
            id: id.clone(),
            user_id: user_id.to_string(),
            name: request.name,
            amount_minor: request.amount_minor,
            currency_code: request.currency_code,
            billing_cycle_days: request.billing_cycle_days,
            created_at: Utc::now(),
        };
        self.subscriptions.insert(id, subscription.clone());
        Ok(subscription)
    }

    /// Delete a subscription owned by `user_id`.
    ///
    /// A record owned by another user reports not-found, so existence is
    /// not leaked across principals.
    pub fn delete_subscription(
        &mut self,
        user_id: &str,
        subscription_id: &str,
    ) -> Result<(), ApiError> {
        let owned = self
            .subscriptions
            .get(subscription_id)
            .is_some_and(|subscription| subscription.user_id == user_id);

        if owned {
            self.subscriptions.remove(subscription_id);
            Ok(())
        } else {
            Err(ApiError::not_found("Subscription not found"))
        }
    }
}

fn validate_subscription(request: &CreateSubscriptionRequest) -> Result<(), ApiError> {
    if request.name.trim().is_empty() {
        return Err(ApiError::bad_request("name must not be empty"));
    }

    if request.amount_minor <= 0 {
        return Err(ApiError::bad_request(
            "amount_minor must be a positive amount in minor units",
        ));
    }

    if request.billing_cycle_days <= 0 {
        return Err(ApiError::bad_request(
            "billing_cycle_days must be a positive number of days",
        ));
    }

    Ok(())
}
