use crate::domain::merchant::Merchant;
use crate::domain::payment::Payment;
use crate::domain::ports::{CreateOutcome, DeliveryLog, MerchantStore, PaymentStore};
use crate::domain::webhook::WebhookDelivery;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for merchants.
///
/// Uses `Arc<RwLock<HashMap>>` for shared concurrent access. The reference
/// collaborator for tests and the demo binary.
#[derive(Default, Clone)]
pub struct InMemoryMerchantStore {
    merchants: Arc<RwLock<HashMap<u64, Merchant>>>,
}

impl InMemoryMerchantStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, merchant: Merchant) {
        let mut merchants = self.merchants.write().await;
        merchants.insert(merchant.id, merchant);
    }
}

#[async_trait]
impl MerchantStore for InMemoryMerchantStore {
    async fn get(&self, merchant_id: u64) -> Result<Option<Merchant>> {
        let merchants = self.merchants.read().await;
        Ok(merchants.get(&merchant_id).cloned())
    }
}

#[derive(Default)]
struct PaymentTables {
    payments: HashMap<String, Payment>,
    /// `(idempotency_key, merchant_id)` -> payment id, maintained under the
    /// same write lock so `create` is atomic.
    idempotency: HashMap<(String, u64), String>,
}

/// A thread-safe in-memory store for payments with an idempotency index.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    tables: Arc<RwLock<PaymentTables>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tables.read().await.payments.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn create(&self, payment: Payment) -> Result<CreateOutcome> {
        let mut tables = self.tables.write().await;
        if let Some(key) = payment.idempotency_key.clone() {
            let index_key = (key, payment.merchant_id);
            let existing = tables
                .idempotency
                .get(&index_key)
                .and_then(|id| tables.payments.get(id))
                .cloned();
            if let Some(existing) = existing {
                return Ok(CreateOutcome::Duplicate(existing));
            }
            tables.idempotency.insert(index_key, payment.id.clone());
        }
        tables.payments.insert(payment.id.clone(), payment);
        Ok(CreateOutcome::Created)
    }

    async fn get(&self, payment_id: &str) -> Result<Option<Payment>> {
        let tables = self.tables.read().await;
        Ok(tables.payments.get(payment_id).cloned())
    }

    async fn find_by_idempotency_key(
        &self,
        key: &str,
        merchant_id: u64,
    ) -> Result<Option<Payment>> {
        let tables = self.tables.read().await;
        let payment = tables
            .idempotency
            .get(&(key.to_string(), merchant_id))
            .and_then(|id| tables.payments.get(id))
            .cloned();
        Ok(payment)
    }

    async fn update(&self, payment: Payment) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.payments.insert(payment.id.clone(), payment);
        Ok(())
    }
}

/// An append-only in-memory log of webhook delivery attempts.
#[derive(Default, Clone)]
pub struct InMemoryDeliveryLog {
    deliveries: Arc<RwLock<Vec<WebhookDelivery>>>,
}

impl InMemoryDeliveryLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeliveryLog for InMemoryDeliveryLog {
    async fn record(&self, delivery: WebhookDelivery) -> Result<()> {
        let mut deliveries = self.deliveries.write().await;
        deliveries.push(delivery);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<WebhookDelivery>> {
        let deliveries = self.deliveries.read().await;
        Ok(deliveries.clone())
    }
}
