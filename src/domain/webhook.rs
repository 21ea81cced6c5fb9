use crate::domain::payment::{Payment, PaymentStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Outbound event envelope, serialized once into the exact byte form that is
/// both signed and delivered.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct WebhookEventData {
    pub object: WebhookEventObject,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct WebhookEventObject {
    pub id: String,
    pub status: PaymentStatus,
    pub amount: Decimal,
    pub method: String,
}

pub const PAYMENT_UPDATED: &str = "payment.updated";

impl WebhookEvent {
    pub fn payment_updated(payment: &Payment) -> Self {
        Self {
            id: format!("evt_{}", payment.id),
            event_type: PAYMENT_UPDATED.to_string(),
            data: WebhookEventData {
                object: WebhookEventObject {
                    id: payment.id.clone(),
                    status: payment.status,
                    amount: payment.amount,
                    method: payment.method.clone(),
                },
            },
        }
    }
}

/// Audit record of a single delivery attempt. Written once per dispatch,
/// success or failure, and never mutated afterwards; there is no retry loop,
/// so `attempts` is always 1.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct WebhookDelivery {
    pub event_id: String,
    pub event_type: String,
    pub payment_id: String,
    pub target_url: String,
    pub signature: String,
    pub payload: String,
    pub attempts: u32,
    pub delivered: bool,
    pub last_attempt_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::merchant::Merchant;
    use crate::domain::payment::CreatePaymentRequest;
    use rust_decimal_macros::dec;

    #[test]
    fn test_payment_updated_envelope_shape() {
        let merchant = Merchant::new(1, "Acme Store");
        let request = CreatePaymentRequest {
            method: "card".to_string(),
            amount: dec!(50.00),
            currency: "BRL".to_string(),
            installments: None,
            metadata_order_id: None,
        };
        let payment = Payment::pending(&merchant, &request, None);
        let event = WebhookEvent::payment_updated(&payment);

        assert_eq!(event.id, format!("evt_{}", payment.id));
        assert_eq!(event.event_type, "payment.updated");
        assert_eq!(event.data.object.method, "CARD");

        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&event).unwrap()).unwrap();
        assert_eq!(json["type"], "payment.updated");
        assert_eq!(json["data"]["object"]["status"], "PENDING");
    }
}
