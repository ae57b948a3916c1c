//! Payment attempt records
//!
//! One record per settlement attempt. Lookups go through any gateway
//! reference the attempt carries: order id, authorization id or charge id.

use crate::payments::types::{GatewayName, PaymentStatus};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentAttempt {
    pub id: Uuid,
    pub booking_id: Option<Uuid>,
    pub client_id: Option<String>,
    pub provider_id: Option<String>,
    pub gateway: GatewayName,
    /// Gateway order id (delayed) or payment intent id (immediate)
    pub gateway_reference: Option<String>,
    pub authorization_id: Option<String>,
    pub capture_id: Option<String>,
    pub amount_local: Option<BigDecimal>,
    pub settlement_amount: Option<BigDecimal>,
    pub rate: Option<f64>,
    pub status: PaymentStatus,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentAttempt {
    pub fn new(gateway: GatewayName, status: PaymentStatus) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            booking_id: None,
            client_id: None,
            provider_id: None,
            gateway,
            gateway_reference: None,
            authorization_id: None,
            capture_id: None,
            amount_local: None,
            settlement_amount: None,
            rate: None,
            status,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn references(&self) -> impl Iterator<Item = &String> {
        self.gateway_reference
            .iter()
            .chain(self.authorization_id.iter())
    }
}

#[derive(Default)]
struct Attempts {
    by_id: HashMap<Uuid, PaymentAttempt>,
    by_reference: HashMap<String, Uuid>,
}

impl Attempts {
    fn index(&mut self, attempt: &PaymentAttempt) {
        for reference in attempt.references() {
            self.by_reference.insert(reference.clone(), attempt.id);
        }
    }
}

#[derive(Default)]
pub struct PaymentAttemptStore {
    attempts: RwLock<Attempts>,
}

impl PaymentAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, attempt: PaymentAttempt) -> PaymentAttempt {
        let mut attempts = self.attempts.write().await;
        attempts.index(&attempt);
        attempts.by_id.insert(attempt.id, attempt.clone());
        attempt
    }

    pub async fn get(&self, id: Uuid) -> Option<PaymentAttempt> {
        self.attempts.read().await.by_id.get(&id).cloned()
    }

    pub async fn find_by_reference(&self, reference: &str) -> Option<PaymentAttempt> {
        let attempts = self.attempts.read().await;
        attempts
            .by_reference
            .get(reference)
            .and_then(|id| attempts.by_id.get(id))
            .cloned()
    }

    /// Apply `change` to the attempt and re-index its references
    pub async fn update<F>(&self, id: Uuid, change: F) -> Option<PaymentAttempt>
    where
        F: FnOnce(&mut PaymentAttempt),
    {
        let mut attempts = self.attempts.write().await;
        let attempt = attempts.by_id.get_mut(&id)?;
        change(attempt);
        attempt.updated_at = Utc::now();
        let updated = attempt.clone();
        attempts.index(&updated);
        Some(updated)
    }

    pub async fn list_for_booking(&self, booking_id: Uuid) -> Vec<PaymentAttempt> {
        let attempts = self.attempts.read().await;
        let mut found: Vec<PaymentAttempt> = attempts
            .by_id
            .values()
            .filter(|a| a.booking_id == Some(booking_id))
            .cloned()
            .collect();
        found.sort_by_key(|a| a.created_at);
        found
    }

    pub async fn captured_for_booking(&self, booking_id: Uuid) -> Option<PaymentAttempt> {
        self.list_for_booking(booking_id)
            .await
            .into_iter()
            .find(|a| a.status == PaymentStatus::Captured)
    }
}
