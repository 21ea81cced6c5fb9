use clap::Parser;
use fiadopay::application::pipeline::PaymentPipeline;
use fiadopay::config::Config;
use fiadopay::domain::merchant::Merchant;
use fiadopay::domain::payment::CreatePaymentRequest;
use fiadopay::domain::ports::DeliveryLog;
use fiadopay::infrastructure::in_memory::{
    InMemoryDeliveryLog, InMemoryMerchantStore, InMemoryPaymentStore,
};
use fiadopay::webhook::dispatcher::WebhookDispatcher;
use fiadopay::webhook::sink::HttpWebhookSink;
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

/// Demo driver: seeds one merchant, runs a payment through the pipeline and
/// waits for settlement.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Payment method (CARD or DEBIT)
    method: String,

    /// Payment amount, e.g. 100.00
    amount: Decimal,

    /// Number of installments
    #[arg(long)]
    installments: Option<u32>,

    /// ISO currency code
    #[arg(long, default_value = "BRL")]
    currency: String,

    /// Idempotency key for the creation call
    #[arg(long)]
    idempotency_key: Option<String>,

    /// Webhook URL for the demo merchant; settlement events are signed and
    /// POSTed here
    #[arg(long)]
    webhook_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("fiadopay=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    let merchants = InMemoryMerchantStore::new();
    let mut merchant = Merchant::new(1, "Demo Store");
    if let Some(url) = cli.webhook_url.clone() {
        merchant = merchant.with_webhook_url(url);
    }
    merchants.insert(merchant).await;

    let payments = InMemoryPaymentStore::new();
    let deliveries = InMemoryDeliveryLog::new();

    let mut dispatcher = WebhookDispatcher::new();
    dispatcher.register(Box::new(
        HttpWebhookSink::new(&config, Box::new(deliveries.clone())).into_diagnostic()?,
    ));

    let pipeline = PaymentPipeline::with_builtin_rules(
        &config,
        Arc::new(merchants),
        Arc::new(payments),
        Arc::new(dispatcher),
    );

    let request = CreatePaymentRequest {
        method: cli.method,
        amount: cli.amount,
        currency: cli.currency,
        installments: cli.installments,
        metadata_order_id: None,
    };

    let created = pipeline
        .create_payment("Bearer FAKE-1", cli.idempotency_key.as_deref(), request)
        .await
        .into_diagnostic()?;
    println!(
        "created: {}",
        serde_json::to_string_pretty(&created).into_diagnostic()?
    );

    let grace = Duration::from_millis(config.processing_delay_ms + 2000);
    pipeline.scheduler().drain(grace).await;

    let settled = pipeline.get_payment(&created.id).await.into_diagnostic()?;
    println!(
        "settled: {}",
        serde_json::to_string_pretty(&settled).into_diagnostic()?
    );

    for delivery in deliveries.all().await.into_diagnostic()? {
        println!(
            "webhook {} -> {} delivered={}",
            delivery.event_id, delivery.target_url, delivery.delivered
        );
    }

    Ok(())
}
