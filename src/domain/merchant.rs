use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "UPPERCASE")]
pub enum MerchantStatus {
    Active,
    Suspended,
}

/// A merchant account as seen by the pipeline.
///
/// Owned by the merchant store; the pipeline only ever reads it to check
/// the status and to find the webhook delivery target.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Merchant {
    pub id: u64,
    pub name: String,
    pub status: MerchantStatus,
    pub webhook_url: Option<String>,
}

impl Merchant {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            status: MerchantStatus::Active,
            webhook_url: None,
        }
    }

    pub fn with_webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == MerchantStatus::Active
    }
}
