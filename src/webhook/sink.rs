use crate::config::Config;
use crate::domain::merchant::Merchant;
use crate::domain::payment::Payment;
use crate::domain::ports::DeliveryLogBox;
use crate::domain::webhook::{PAYMENT_UPDATED, WebhookDelivery, WebhookEvent};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;
use tracing::{debug, info};

type HmacSha256 = Hmac<Sha256>;

/// A pluggable consumer of payment lifecycle notifications.
#[async_trait]
pub trait WebhookSink: Send + Sync {
    async fn send_payment_updated(&self, payment: &Payment, merchant: &Merchant) -> Result<()>;
}

pub const SIGNATURE_HEADER: &str = "X-FiadoPay-Signature";

/// Signs the event envelope with HMAC-SHA256 and POSTs it to the merchant's
/// webhook URL. Every attempt is recorded in the delivery log, delivered or
/// not, so the log is a complete audit trail.
pub struct HttpWebhookSink {
    client: reqwest::Client,
    secret: String,
    deliveries: DeliveryLogBox,
}

impl HttpWebhookSink {
    pub fn new(config: &Config, deliveries: DeliveryLogBox) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.webhook_timeout_ms))
            .build()
            .map_err(|e| PaymentError::WebhookTransport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            secret: config.webhook_secret.clone(),
            deliveries,
        })
    }

    /// base64(HMAC-SHA256(secret, payload)) over the exact serialized bytes.
    fn sign(&self, payload: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(payload);
        BASE64.encode(mac.finalize().into_bytes())
    }
}

#[async_trait]
impl WebhookSink for HttpWebhookSink {
    async fn send_payment_updated(&self, payment: &Payment, merchant: &Merchant) -> Result<()> {
        let Some(target_url) = merchant.webhook_url.as_deref() else {
            debug!(merchant_id = merchant.id, "merchant has no webhook URL, skipping");
            return Ok(());
        };

        let event = WebhookEvent::payment_updated(payment);
        let payload = serde_json::to_string(&event)?;
        let signature = self.sign(payload.as_bytes());

        let response = self
            .client
            .post(target_url)
            .header("Content-Type", "application/json")
            .header(SIGNATURE_HEADER, &signature)
            .body(payload.clone())
            .send()
            .await;

        let delivered = match &response {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        };

        self.deliveries
            .record(WebhookDelivery {
                event_id: event.id.clone(),
                event_type: PAYMENT_UPDATED.to_string(),
                payment_id: payment.id.clone(),
                target_url: target_url.to_string(),
                signature,
                payload,
                attempts: 1,
                delivered,
                last_attempt_at: Utc::now(),
            })
            .await?;

        info!(
            payment_id = %payment.id,
            target_url,
            delivered,
            "webhook delivery attempt recorded"
        );

        response
            .map(|_| ())
            .map_err(|e| PaymentError::WebhookTransport(format!("webhook POST failed: {e}")))
    }
}
