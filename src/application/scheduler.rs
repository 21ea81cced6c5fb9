use crate::config::Config;
use crate::domain::payment::PaymentStatus;
use crate::domain::ports::{MerchantStoreArc, PaymentStoreArc};
use crate::error::{PaymentError, Result};
use crate::webhook::dispatcher::WebhookDispatcher;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Bounded worker pool for asynchronous settlement.
///
/// Each submitted task holds one of `settlement_workers` slots, sleeps the
/// simulated processing delay, draws the outcome and notifies webhook sinks.
/// Submission never blocks: when no slot is free it fails with
/// `SchedulerSaturated` and the caller's synchronous response path is
/// unaffected. In-flight tasks are not cancellable; `drain` waits for them
/// on shutdown.
pub struct SettlementScheduler {
    slots: Arc<Semaphore>,
    worker_count: u32,
    delay: Duration,
    failure_rate: f64,
    payments: PaymentStoreArc,
    merchants: MerchantStoreArc,
    dispatcher: Arc<WebhookDispatcher>,
}

impl SettlementScheduler {
    pub fn new(
        config: &Config,
        payments: PaymentStoreArc,
        merchants: MerchantStoreArc,
        dispatcher: Arc<WebhookDispatcher>,
    ) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(config.settlement_workers)),
            worker_count: config.settlement_workers as u32,
            delay: Duration::from_millis(config.processing_delay_ms),
            failure_rate: config.failure_rate,
            payments,
            merchants,
            dispatcher,
        }
    }

    /// Submits a settlement task for a payment that is already durably
    /// `Pending`. Callers must persist before submitting.
    pub fn submit(&self, payment_id: String, merchant_id: u64) -> Result<()> {
        let permit = self
            .slots
            .clone()
            .try_acquire_owned()
            .map_err(|_| PaymentError::SchedulerSaturated)?;

        let payments = self.payments.clone();
        let merchants = self.merchants.clone();
        let dispatcher = self.dispatcher.clone();
        let delay = self.delay;
        let failure_rate = self.failure_rate;

        tokio::spawn(async move {
            let _slot = permit;
            settle(
                payments,
                merchants,
                dispatcher,
                delay,
                failure_rate,
                payment_id,
                merchant_id,
            )
            .await;
        });
        Ok(())
    }

    /// Waits until every worker slot is free again, abandoning whatever is
    /// still in flight once the grace period elapses. Task writes are
    /// self-contained, so abandoning cannot corrupt payment state.
    pub async fn drain(&self, grace: Duration) -> bool {
        match timeout(grace, self.slots.acquire_many(self.worker_count)).await {
            Ok(Ok(_permits)) => true,
            Ok(Err(_)) | Err(_) => {
                warn!("settlement scheduler drain timed out, abandoning in-flight tasks");
                false
            }
        }
    }
}

async fn settle(
    payments: PaymentStoreArc,
    merchants: MerchantStoreArc,
    dispatcher: Arc<WebhookDispatcher>,
    delay: Duration,
    failure_rate: f64,
    payment_id: String,
    merchant_id: u64,
) {
    tokio::time::sleep(delay).await;

    let payment = match payments.get(&payment_id).await {
        Ok(Some(payment)) => payment,
        Ok(None) => {
            // Record removed out of band; best-effort simulation, not an error.
            debug!(%payment_id, "payment gone before settlement, skipping");
            return;
        }
        Err(e) => {
            warn!(%payment_id, "failed to load payment for settlement: {e}");
            return;
        }
    };
    let merchant = match merchants.get(merchant_id).await {
        Ok(Some(merchant)) => merchant,
        Ok(None) => {
            debug!(merchant_id, "merchant gone before settlement, skipping");
            return;
        }
        Err(e) => {
            warn!(merchant_id, "failed to load merchant for settlement: {e}");
            return;
        }
    };

    let approved = rand::random::<f64>() > failure_rate;
    let next = if approved {
        PaymentStatus::Approved
    } else {
        PaymentStatus::Declined
    };

    let mut payment = payment;
    if let Err(e) = payment.transition(next) {
        // Already settled or refunded out of band; leave the record alone.
        warn!(payment_id = %payment.id, "skipping settlement write: {e}");
        return;
    }
    if let Err(e) = payments.update(payment.clone()).await {
        warn!(payment_id = %payment.id, "failed to persist settlement: {e}");
        return;
    }

    info!(
        payment_id = %payment.id,
        status = payment.status.as_str(),
        "payment settled"
    );
    dispatcher.dispatch_payment_updated(&payment, &merchant).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::merchant::Merchant;
    use crate::domain::payment::{CreatePaymentRequest, Payment};
    use crate::domain::ports::PaymentStore;
    use crate::infrastructure::in_memory::{InMemoryMerchantStore, InMemoryPaymentStore};
    use rust_decimal_macros::dec;

    fn config(failure_rate: f64, workers: usize) -> Config {
        Config {
            processing_delay_ms: 10,
            failure_rate,
            settlement_workers: workers,
            ..Config::default()
        }
    }

    async fn setup(
        failure_rate: f64,
        workers: usize,
    ) -> (SettlementScheduler, InMemoryPaymentStore, Payment) {
        let merchants = InMemoryMerchantStore::new();
        let merchant = Merchant::new(1, "Acme Store");
        merchants.insert(merchant.clone()).await;

        let payments = InMemoryPaymentStore::new();
        let request = CreatePaymentRequest {
            method: "debit".to_string(),
            amount: dec!(10.00),
            currency: "BRL".to_string(),
            installments: None,
            metadata_order_id: None,
        };
        let payment = Payment::pending(&merchant, &request, None);
        payments.create(payment.clone()).await.unwrap();

        let scheduler = SettlementScheduler::new(
            &config(failure_rate, workers),
            Arc::new(payments.clone()),
            Arc::new(merchants),
            Arc::new(WebhookDispatcher::new()),
        );
        (scheduler, payments, payment)
    }

    #[tokio::test]
    async fn test_zero_failure_rate_always_approves() {
        let (scheduler, payments, payment) = setup(0.0, 10).await;
        scheduler.submit(payment.id.clone(), 1).unwrap();
        assert!(scheduler.drain(Duration::from_secs(2)).await);

        let settled = payments.get(&payment.id).await.unwrap().unwrap();
        assert_eq!(settled.status, PaymentStatus::Approved);
        assert!(settled.updated_at >= payment.created_at);
    }

    #[tokio::test]
    async fn test_full_failure_rate_always_declines() {
        let (scheduler, payments, payment) = setup(1.0, 10).await;
        scheduler.submit(payment.id.clone(), 1).unwrap();
        assert!(scheduler.drain(Duration::from_secs(2)).await);

        let settled = payments.get(&payment.id).await.unwrap().unwrap();
        assert_eq!(settled.status, PaymentStatus::Declined);
    }

    #[tokio::test]
    async fn test_missing_payment_is_a_benign_noop() {
        let (scheduler, _payments, _) = setup(0.0, 10).await;
        scheduler.submit("pay_missing".to_string(), 1).unwrap();
        assert!(scheduler.drain(Duration::from_secs(2)).await);
    }

    #[tokio::test]
    async fn test_missing_merchant_is_a_benign_noop() {
        let (scheduler, payments, payment) = setup(0.0, 10).await;
        scheduler.submit(payment.id.clone(), 99).unwrap();
        assert!(scheduler.drain(Duration::from_secs(2)).await);

        let untouched = payments.get(&payment.id).await.unwrap().unwrap();
        assert_eq!(untouched.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_saturated_pool_rejects_submission() {
        let (scheduler, _payments, payment) = setup(0.0, 1).await;
        scheduler.submit(payment.id.clone(), 1).unwrap();
        let second = scheduler.submit(payment.id, 1);
        assert!(matches!(second, Err(PaymentError::SchedulerSaturated)));
        scheduler.drain(Duration::from_secs(2)).await;
    }

    #[tokio::test]
    async fn test_settlement_skips_non_pending_payment() {
        let (scheduler, payments, mut payment) = setup(1.0, 10).await;
        payment.transition(PaymentStatus::Approved).unwrap();
        payments.update(payment.clone()).await.unwrap();

        scheduler.submit(payment.id.clone(), 1).unwrap();
        assert!(scheduler.drain(Duration::from_secs(2)).await);

        // A declining draw must not rewind an already approved payment.
        let current = payments.get(&payment.id).await.unwrap().unwrap();
        assert_eq!(current.status, PaymentStatus::Approved);
    }
}
