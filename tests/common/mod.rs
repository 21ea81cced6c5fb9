use fiadopay::application::pipeline::PaymentPipeline;
use fiadopay::config::Config;
use fiadopay::domain::merchant::Merchant;
use fiadopay::domain::payment::CreatePaymentRequest;
use fiadopay::infrastructure::in_memory::{
    InMemoryDeliveryLog, InMemoryMerchantStore, InMemoryPaymentStore,
};
use fiadopay::webhook::dispatcher::WebhookDispatcher;
use fiadopay::webhook::sink::HttpWebhookSink;
use rust_decimal::Decimal;
use std::sync::Arc;

pub const MERCHANT_ID: u64 = 1;
pub const OTHER_MERCHANT_ID: u64 = 2;
pub const BEARER: &str = "Bearer FAKE-1";
pub const OTHER_BEARER: &str = "Bearer FAKE-2";

/// A fully wired pipeline over in-memory collaborators. The concrete stores
/// stay accessible (they share state with the `Arc`s handed to the pipeline)
/// so tests can assert on persisted records and the delivery audit trail.
pub struct TestEnv {
    pub pipeline: PaymentPipeline,
    pub merchants: InMemoryMerchantStore,
    pub payments: InMemoryPaymentStore,
    pub deliveries: InMemoryDeliveryLog,
}

pub async fn env_with(config: Config, webhook_url: Option<String>) -> TestEnv {
    let merchants = InMemoryMerchantStore::new();
    let mut merchant = Merchant::new(MERCHANT_ID, "Acme Store");
    if let Some(url) = webhook_url {
        merchant = merchant.with_webhook_url(url);
    }
    merchants.insert(merchant).await;
    merchants.insert(Merchant::new(OTHER_MERCHANT_ID, "Other Store")).await;

    let payments = InMemoryPaymentStore::new();
    let deliveries = InMemoryDeliveryLog::new();

    let mut dispatcher = WebhookDispatcher::new();
    dispatcher.register(Box::new(
        HttpWebhookSink::new(&config, Box::new(deliveries.clone()))
            .expect("HTTP sink should build"),
    ));

    let pipeline = PaymentPipeline::with_builtin_rules(
        &config,
        Arc::new(merchants.clone()),
        Arc::new(payments.clone()),
        Arc::new(dispatcher),
    );

    TestEnv {
        pipeline,
        merchants,
        payments,
        deliveries,
    }
}

/// Environment with a short settlement delay and no webhook target.
pub async fn env(failure_rate: f64) -> TestEnv {
    env_with(fast_config(failure_rate), None).await
}

pub fn fast_config(failure_rate: f64) -> Config {
    Config {
        processing_delay_ms: 10,
        failure_rate,
        ..Config::default()
    }
}

pub fn request(method: &str, amount: Decimal, installments: Option<u32>) -> CreatePaymentRequest {
    CreatePaymentRequest {
        method: method.to_string(),
        amount,
        currency: "BRL".to_string(),
        installments,
        metadata_order_id: None,
    }
}
