use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationKind {
    HederaTransaction,
    PaymentReference,
}

/// Why a chain lookup did not verify. None of these are faults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum VerificationFailure {
    /// The mirror answered but holds no matching transaction.
    NotFound,
    /// The mirror has never seen the id; it may still be propagating.
    PendingOrUnknown,
    /// The transaction exists but its receipt is not `SUCCESS`.
    ReceiptStatus(String),
}

impl VerificationFailure {
    pub fn message(&self) -> String {
        match self {
            VerificationFailure::NotFound => "Transaction not found on Hedera".to_string(),
            VerificationFailure::PendingOrUnknown => {
                "Transaction not found on Hedera Mirror Node (may be pending or payment reference)"
                    .to_string()
            }
            VerificationFailure::ReceiptStatus(status) => format!("Transaction status: {}", status),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub verified: bool,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<VerificationKind>,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<VerificationFailure>,
    pub data: Option<Value>,
}

impl VerificationResult {
    pub fn verified(kind: VerificationKind, data: Value) -> Self {
        Self {
            verified: true,
            kind: Some(kind),
            error: None,
            failure: None,
            data: Some(data),
        }
    }

    pub fn unverified(failure: VerificationFailure, data: Option<Value>) -> Self {
        Self {
            verified: false,
            kind: None,
            error: Some(failure.message()),
            failure: Some(failure),
            data,
        }
    }

    pub fn is_chain_verified(&self) -> bool {
        self.verified && self.kind == Some(VerificationKind::HederaTransaction)
    }
}
