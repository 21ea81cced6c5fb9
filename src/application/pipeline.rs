use crate::config::Config;
use crate::domain::merchant::Merchant;
use crate::domain::payment::{
    CreatePaymentRequest, Payment, PaymentResponse, PaymentStatus, RefundResponse,
};
use crate::domain::ports::{CreateOutcome, MerchantStoreArc, PaymentStoreArc};
use crate::error::{PaymentError, Result};
use crate::rules::antifraud::AntiFraudRegistry;
use crate::rules::method::PaymentMethodRegistry;
use crate::webhook::dispatcher::WebhookDispatcher;
use std::sync::Arc;
use tracing::{error, info};

use super::scheduler::SettlementScheduler;

const BEARER_PREFIX: &str = "Bearer FAKE-";

/// The payment lifecycle orchestrator.
///
/// Owns the rule registries and the settlement scheduler, and drives a
/// creation call through authentication, idempotent deduplication, method and
/// anti-fraud rules, persistence and asynchronous settlement. The caller
/// always gets the `Pending` representation back synchronously; settlement
/// and webhooks happen on the worker pool.
pub struct PaymentPipeline {
    merchants: MerchantStoreArc,
    payments: PaymentStoreArc,
    methods: PaymentMethodRegistry,
    fraud_rules: AntiFraudRegistry,
    dispatcher: Arc<WebhookDispatcher>,
    scheduler: SettlementScheduler,
}

impl PaymentPipeline {
    pub fn new(
        config: &Config,
        merchants: MerchantStoreArc,
        payments: PaymentStoreArc,
        methods: PaymentMethodRegistry,
        fraud_rules: AntiFraudRegistry,
        dispatcher: Arc<WebhookDispatcher>,
    ) -> Self {
        let scheduler = SettlementScheduler::new(
            config,
            payments.clone(),
            merchants.clone(),
            dispatcher.clone(),
        );
        Self {
            merchants,
            payments,
            methods,
            fraud_rules,
            dispatcher,
            scheduler,
        }
    }

    /// Pipeline with the built-in Card/Debit and HighAmount rules.
    pub fn with_builtin_rules(
        config: &Config,
        merchants: MerchantStoreArc,
        payments: PaymentStoreArc,
        dispatcher: Arc<WebhookDispatcher>,
    ) -> Self {
        Self::new(
            config,
            merchants,
            payments,
            PaymentMethodRegistry::builtin(config),
            AntiFraudRegistry::builtin(config),
            dispatcher,
        )
    }

    pub fn scheduler(&self) -> &SettlementScheduler {
        &self.scheduler
    }

    /// Resolves a `Bearer FAKE-<merchantId>` credential to an active
    /// merchant. Malformed, unknown and suspended credentials are all
    /// indistinguishable to the caller.
    pub async fn authenticate(&self, bearer: &str) -> Result<Merchant> {
        let raw = bearer
            .strip_prefix(BEARER_PREFIX)
            .ok_or(PaymentError::Unauthorized)?;
        let merchant_id: u64 = raw.parse().map_err(|_| PaymentError::Unauthorized)?;
        let merchant = self
            .merchants
            .get(merchant_id)
            .await?
            .ok_or(PaymentError::Unauthorized)?;
        if !merchant.is_active() {
            return Err(PaymentError::Unauthorized);
        }
        Ok(merchant)
    }

    pub async fn create_payment(
        &self,
        bearer: &str,
        idempotency_key: Option<&str>,
        request: CreatePaymentRequest,
    ) -> Result<PaymentResponse> {
        let merchant = self.authenticate(bearer).await?;

        // Idempotent replay: same key for the same merchant returns the
        // original record untouched, with no rule evaluation or scheduling.
        if let Some(key) = idempotency_key
            && let Some(existing) = self
                .payments
                .find_by_idempotency_key(key, merchant.id)
                .await?
        {
            info!(payment_id = %existing.id, key, "idempotent replay");
            return Ok(PaymentResponse::from(&existing));
        }

        let (meta, rule) = self.methods.get(&request.method)?;
        let installments = request.installments.unwrap_or(1);
        if installments < 1 {
            return Err(PaymentError::InvalidRequest(
                "installments must be at least 1".to_string(),
            ));
        }
        if installments > 1 && !meta.supports_installments {
            return Err(PaymentError::InvalidRequest(format!(
                "method {} does not support installments",
                meta.method_key
            )));
        }
        if installments > meta.max_installments {
            return Err(PaymentError::InvalidRequest(format!(
                "method {} accepts at most {} installments",
                meta.method_key, meta.max_installments
            )));
        }

        let mut payment = Payment::pending(&merchant, &request, idempotency_key);
        rule.apply(&mut payment, &request, &merchant);

        for (_, fraud_rule) in self.fraud_rules.rules() {
            fraud_rule
                .validate(&payment, &merchant)
                .map_err(|rejection| PaymentError::FraudRejected {
                    rule: rejection.rule,
                    reason: rejection.reason,
                })?;
        }

        // The persist below happens-before scheduling, so no settlement task
        // can observe a payment that is not yet durably Pending.
        match self.payments.create(payment.clone()).await? {
            CreateOutcome::Created => {}
            CreateOutcome::Duplicate(existing) => {
                // A concurrent submission with the same key won the race;
                // hand back its record and schedule nothing.
                info!(payment_id = %existing.id, "lost idempotent create race");
                return Ok(PaymentResponse::from(&existing));
            }
        }

        if let Err(e) = self.scheduler.submit(payment.id.clone(), merchant.id) {
            // Reportable server fault, but the Pending response already
            // computed still goes back to the caller.
            error!(payment_id = %payment.id, "failed to schedule settlement: {e}");
        }

        info!(
            payment_id = %payment.id,
            merchant_id = merchant.id,
            method = %payment.method,
            "payment created"
        );
        Ok(PaymentResponse::from(&payment))
    }

    pub async fn get_payment(&self, payment_id: &str) -> Result<PaymentResponse> {
        let payment = self
            .payments
            .get(payment_id)
            .await?
            .ok_or(PaymentError::NotFound)?;
        Ok(PaymentResponse::from(&payment))
    }

    /// Refunds an approved payment owned by the authenticated merchant and
    /// dispatches a `payment.updated` notification synchronously. The call
    /// waits for dispatch attempts to be issued, not for their success.
    pub async fn refund(&self, bearer: &str, payment_id: &str) -> Result<RefundResponse> {
        let merchant = self.authenticate(bearer).await?;

        let mut payment = self
            .payments
            .get(payment_id)
            .await?
            .ok_or(PaymentError::NotFound)?;
        if payment.merchant_id != merchant.id {
            return Err(PaymentError::Forbidden);
        }
        if payment.status != PaymentStatus::Approved {
            return Err(PaymentError::InvalidRequest(
                "only approved payments can be refunded".to_string(),
            ));
        }

        payment.transition(PaymentStatus::Refunded)?;
        self.payments.update(payment.clone()).await?;

        info!(payment_id = %payment.id, merchant_id = merchant.id, "payment refunded");
        self.dispatcher
            .dispatch_payment_updated(&payment, &merchant)
            .await;

        Ok(RefundResponse::new(payment.status))
    }
}
