use crate::domain::merchant::Merchant;
use crate::domain::payment::Payment;
use crate::webhook::sink::WebhookSink;
use tracing::warn;

/// Best-effort fan-out of `payment.updated` events to every registered sink.
///
/// Each sink's failure is swallowed individually: one sink failing never
/// prevents the others from running and never propagates to the caller.
/// There is no retry; delivery outcomes live in the delivery log.
#[derive(Default)]
pub struct WebhookDispatcher {
    sinks: Vec<Box<dyn WebhookSink>>,
}

impl WebhookDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, sink: Box<dyn WebhookSink>) {
        self.sinks.push(sink);
    }

    pub async fn dispatch_payment_updated(&self, payment: &Payment, merchant: &Merchant) {
        for sink in &self.sinks {
            if let Err(e) = sink.send_payment_updated(payment, merchant).await {
                warn!(payment_id = %payment.id, "webhook sink failed: {e}");
            }
        }
    }
}
