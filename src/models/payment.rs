use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Standard envelope returned by every payment-network call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DroppResponse {
    pub response_code: i64,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

impl DroppResponse {
    pub fn is_success(&self) -> bool {
        self.response_code == 0
    }

    pub fn first_error(&self) -> Option<&str> {
        self.errors.first().map(String::as_str)
    }

    fn data_str(&self, key: &str) -> Option<&str> {
        self.data
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn payment_ref(&self) -> Option<&str> {
        self.data_str("paymentRef")
    }

    pub fn transaction_reference(&self) -> Option<&str> {
        self.data_str("transactionReference")
    }

    pub fn checkout_uuid(&self) -> Option<&str> {
        self.data_str("uuid")
    }

    pub fn checkout_link(&self) -> Option<&str> {
        self.data_str("link")
    }
}

/// Terminal classification of a payment-network status poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckoutStatus {
    Success,
    Wait,
    Failed,
    Unknown,
}

impl CheckoutStatus {
    pub fn classify(data: &Value) -> Self {
        match data.as_str() {
            Some("SUCCESS") => CheckoutStatus::Success,
            Some("WAIT") => CheckoutStatus::Wait,
            Some("FAILED") => CheckoutStatus::Failed,
            _ => CheckoutStatus::Unknown,
        }
    }
}

/// Parameters for the merchant transaction listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    pub user_id: String,
    pub offset: u32,
    pub limit: u32,
}
