use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::env;

/// Operational constants consumed by the pipeline, scheduler and webhook sink.
///
/// Values are read from `FIADOPAY_*` environment variables; missing or
/// unparsable values fall back to the defaults below.
#[derive(Debug, Clone)]
pub struct Config {
    /// Simulated settlement processing delay, in milliseconds.
    pub processing_delay_ms: u64,
    /// Probability in `[0, 1]` that settlement declines a payment.
    pub failure_rate: f64,
    /// Shared secret used to sign outbound webhook payloads.
    pub webhook_secret: String,
    /// Amounts strictly above this are vetoed by the HighAmount rule.
    pub high_amount_threshold: Decimal,
    /// Monthly compounding interest for card installments, in percent.
    pub card_monthly_interest: Decimal,
    /// Largest installment count accepted for card payments.
    pub card_max_installments: u32,
    /// Number of settlement worker slots.
    pub settlement_workers: usize,
    /// Timeout applied to each outbound webhook POST, in milliseconds.
    pub webhook_timeout_ms: u64,
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            processing_delay_ms: parse_env("FIADOPAY_PROCESSING_DELAY_MS")
                .unwrap_or(defaults.processing_delay_ms),
            failure_rate: parse_env("FIADOPAY_FAILURE_RATE").unwrap_or(defaults.failure_rate),
            webhook_secret: env::var("FIADOPAY_WEBHOOK_SECRET")
                .unwrap_or(defaults.webhook_secret),
            high_amount_threshold: parse_env("FIADOPAY_HIGH_AMOUNT_THRESHOLD")
                .unwrap_or(defaults.high_amount_threshold),
            card_monthly_interest: parse_env("FIADOPAY_CARD_MONTHLY_INTEREST")
                .unwrap_or(defaults.card_monthly_interest),
            card_max_installments: parse_env("FIADOPAY_CARD_MAX_INSTALLMENTS")
                .unwrap_or(defaults.card_max_installments),
            settlement_workers: parse_env("FIADOPAY_SETTLEMENT_WORKERS")
                .unwrap_or(defaults.settlement_workers),
            webhook_timeout_ms: parse_env("FIADOPAY_WEBHOOK_TIMEOUT_MS")
                .unwrap_or(defaults.webhook_timeout_ms),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            processing_delay_ms: 200,
            failure_rate: 0.15,
            webhook_secret: "whsec_fiadopay_dev".to_string(),
            high_amount_threshold: dec!(5000.00),
            card_monthly_interest: dec!(1.0),
            card_max_installments: 48,
            settlement_workers: 10,
            webhook_timeout_ms: 5000,
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.settlement_workers, 10);
        assert_eq!(config.high_amount_threshold, dec!(5000.00));
        assert_eq!(config.card_monthly_interest, dec!(1.0));
    }
}
