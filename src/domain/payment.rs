use crate::domain::merchant::Merchant;
use crate::error::PaymentError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Declined,
    Refunded,
}

impl PaymentStatus {
    /// Legal edges of the payment state machine. Everything else is frozen:
    /// Declined and Refunded are terminal, and an Approved payment can only
    /// move to Refunded.
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Pending, PaymentStatus::Approved)
                | (PaymentStatus::Pending, PaymentStatus::Declined)
                | (PaymentStatus::Approved, PaymentStatus::Refunded)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Approved => "APPROVED",
            PaymentStatus::Declined => "DECLINED",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }
}

/// The payment aggregate.
///
/// Created `Pending` by the pipeline, settled to `Approved`/`Declined` exactly
/// once by the scheduler, and optionally refunded once thereafter.
/// `total_with_interest` is computed by the method rule before the first
/// persist and never recomputed.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Payment {
    pub id: String,
    pub merchant_id: u64,
    pub method: String,
    pub amount: Decimal,
    pub currency: String,
    pub installments: u32,
    pub monthly_interest_percent: Decimal,
    pub total_with_interest: Decimal,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub idempotency_key: Option<String>,
    pub metadata_order_id: Option<String>,
}

impl Payment {
    /// Builds a new `Pending` payment from a creation request. The method key
    /// is normalized to uppercase; interest fields start at zero and are set
    /// by the method rule before persistence.
    pub fn pending(
        merchant: &Merchant,
        request: &CreatePaymentRequest,
        idempotency_key: Option<&str>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: format!("pay_{}", short_uuid()),
            merchant_id: merchant.id,
            method: request.method.to_uppercase(),
            amount: request.amount,
            currency: request.currency.clone(),
            installments: request.installments.unwrap_or(1),
            monthly_interest_percent: Decimal::ZERO,
            total_with_interest: request.amount,
            status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
            idempotency_key: idempotency_key.map(str::to_string),
            metadata_order_id: request.metadata_order_id.clone(),
        }
    }

    /// Moves the payment to `next`, refreshing `updated_at`. Illegal edges
    /// are rejected so a settled or refunded payment can never be rewound.
    pub fn transition(&mut self, next: PaymentStatus) -> Result<(), PaymentError> {
        if !self.status.can_transition_to(next) {
            return Err(PaymentError::InvalidRequest(format!(
                "illegal status transition {} -> {}",
                self.status.as_str(),
                next.as_str()
            )));
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Logical shape of a creation request, as received from the transport
/// adapter. Field names follow the public wire format.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct CreatePaymentRequest {
    pub method: String,
    pub amount: Decimal,
    pub currency: String,
    pub installments: Option<u32>,
    #[serde(rename = "metadataOrderId")]
    pub metadata_order_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PaymentResponse {
    pub id: String,
    pub status: PaymentStatus,
    pub method: String,
    pub amount: Decimal,
    pub installments: u32,
    #[serde(rename = "monthlyInterestPercent")]
    pub monthly_interest_percent: Decimal,
    #[serde(rename = "totalWithInterest")]
    pub total_with_interest: Decimal,
}

impl From<&Payment> for PaymentResponse {
    fn from(payment: &Payment) -> Self {
        Self {
            id: payment.id.clone(),
            status: payment.status,
            method: payment.method.clone(),
            amount: payment.amount,
            installments: payment.installments,
            monthly_interest_percent: payment.monthly_interest_percent,
            total_with_interest: payment.total_with_interest,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct RefundResponse {
    pub id: String,
    pub status: PaymentStatus,
}

impl RefundResponse {
    pub fn new(status: PaymentStatus) -> Self {
        Self {
            id: format!("ref_{}", short_uuid()),
            status,
        }
    }
}

fn short_uuid() -> String {
    Uuid::new_v4().to_string()[..8].to_string()
}
