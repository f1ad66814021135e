use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Lifecycle of one checkout attempt as stored in the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Initiated,
    DroppCheckoutCreated,
    PaymentReceived,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Initiated => "initiated",
            PaymentStatus::DroppCheckoutCreated => "dropp_checkout_created",
            PaymentStatus::PaymentReceived => "payment_received",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Completed | PaymentStatus::Failed)
    }

    fn rank(&self) -> u8 {
        match self {
            PaymentStatus::Initiated => 0,
            PaymentStatus::DroppCheckoutCreated => 1,
            PaymentStatus::PaymentReceived => 2,
            PaymentStatus::Completed | PaymentStatus::Failed => 3,
        }
    }

    /// Forward-only progression; `Failed` is reachable from any non-terminal state.
    /// Re-asserting the current state is allowed so duplicate callbacks stay harmless.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        if *self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        next == PaymentStatus::Failed || next.rank() > self.rank()
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload for `create_transaction`. Mirrors the record store's field names.
#[derive(Debug, Clone, Serialize)]
pub struct NewTransaction {
    #[serde(rename = "merchantAccount")]
    pub merchant_account: String,
    /// Only a caller-supplied per-checkout override is persisted, never the process default.
    #[serde(rename = "signingKey", skip_serializing_if = "Option::is_none")]
    pub signing_key: Option<String>,
    pub payment_status: PaymentStatus,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "successUrl", skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,
    #[serde(rename = "failureUrl", skip_serializing_if = "Option::is_none")]
    pub failure_url: Option<String>,
    pub user_id: String,
    pub amount: f64,
    pub currency: String,
    pub service_id: String,
    pub store_id: String,
    #[serde(rename = "emailId")]
    pub email_id: String,
    pub payment_method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub additional_details: Map<String, Value>,
    #[serde(rename = "successMessage", skip_serializing_if = "Option::is_none")]
    pub success_message: Option<String>,
}

/// Merge-patch sent to `update_transaction`. Absent fields are left untouched remotely.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransactionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(rename = "p2pData", skip_serializing_if = "Option::is_none")]
    pub p2p_data: Option<Value>,
    #[serde(rename = "invoiceData", skip_serializing_if = "Option::is_none")]
    pub invoice_data: Option<Value>,
    #[serde(rename = "paymentResponse", skip_serializing_if = "Option::is_none")]
    pub payment_response: Option<Value>,
    #[serde(rename = "hederaTransactionId", skip_serializing_if = "Option::is_none")]
    pub hedera_transaction_id: Option<String>,
    #[serde(rename = "hederaVerified", skip_serializing_if = "Option::is_none")]
    pub hedera_verified: Option<bool>,
    #[serde(rename = "hederaVerificationData", skip_serializing_if = "Option::is_none")]
    pub hedera_verification_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TransactionPatch {
    pub fn status(status: PaymentStatus) -> Self {
        Self {
            payment_status: Some(status),
            updated_at: Some(Utc::now()),
            ..Default::default()
        }
    }
}

/// Result of `create_transaction`. `ok` is true only when the store reports its success code.
#[derive(Debug, Clone, Default)]
pub struct RecordCreated {
    pub ok: bool,
    pub transaction_id: Option<String>,
    pub data: Option<Value>,
}

/// Result of `update_transaction`, including the per-transaction state the
/// callback path treats as authoritative.
#[derive(Debug, Clone, Default)]
pub struct RecordUpdated {
    pub ok: bool,
    pub data: Option<Value>,
    pub success_url: Option<String>,
    pub failure_url: Option<String>,
    pub signing_key: Option<String>,
    pub merchant_id: Option<String>,
}

impl RecordUpdated {
    /// Status the store reports back after applying the patch, when it echoes one.
    pub fn current_status(&self) -> Option<PaymentStatus> {
        let status = self.data.as_ref()?.get("payment_status")?.clone();
        serde_json::from_value(status).ok()
    }
}
