use thiserror::Error;

pub type Result<T> = std::result::Result<T, PaymentError>;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("payment not found")]
    NotFound,
    #[error("payment belongs to another merchant")]
    Forbidden,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("unsupported payment method: {0}")]
    UnsupportedMethod(String),
    #[error("payment rejected by anti-fraud rule {rule}: {reason}")]
    FraudRejected { rule: String, reason: String },
    #[error("settlement scheduler is saturated")]
    SchedulerSaturated,
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("webhook transport error: {0}")]
    WebhookTransport(String),
    #[error("store error: {0}")]
    Store(String),
}
