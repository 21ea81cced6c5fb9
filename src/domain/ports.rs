use super::merchant::Merchant;
use super::payment::Payment;
use super::webhook::WebhookDelivery;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Stores are shared between the synchronous pipeline and the settlement
/// workers, so they travel as `Arc`s; the delivery log is owned by its sink.
pub type MerchantStoreArc = Arc<dyn MerchantStore>;
pub type PaymentStoreArc = Arc<dyn PaymentStore>;
pub type DeliveryLogBox = Box<dyn DeliveryLog>;

/// Outcome of an atomic payment insert. `Duplicate` carries the record that
/// already owns the `(idempotency_key, merchant_id)` pair, so concurrent
/// submissions with the same key resolve to a single stored payment.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    Created,
    Duplicate(Payment),
}

#[async_trait]
pub trait MerchantStore: Send + Sync {
    async fn get(&self, merchant_id: u64) -> Result<Option<Merchant>>;
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Inserts a new payment, atomically checking the idempotency index.
    /// This is the linearization point for concurrent idempotent creates.
    async fn create(&self, payment: Payment) -> Result<CreateOutcome>;
    async fn get(&self, payment_id: &str) -> Result<Option<Payment>>;
    async fn find_by_idempotency_key(
        &self,
        key: &str,
        merchant_id: u64,
    ) -> Result<Option<Payment>>;
    /// Replaces an existing record. Writes for a given id are serialized by
    /// the store.
    async fn update(&self, payment: Payment) -> Result<()>;
}

/// Append-only log of webhook delivery attempts.
#[async_trait]
pub trait DeliveryLog: Send + Sync {
    async fn record(&self, delivery: WebhookDelivery) -> Result<()>;
    async fn all(&self) -> Result<Vec<WebhookDelivery>>;
}
