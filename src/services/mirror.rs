use crate::error::CheckoutError;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Read-only view of the public ledger.
#[async_trait]
pub trait ChainVerifier: Send + Sync {
    /// Look up a transaction by `account@seconds.nanos` id.
    ///
    /// `Ok(None)` means the mirror does not know the id at all (HTTP 404), which
    /// is a normal outcome for transactions that have not propagated yet.
    async fn get_transaction(&self, transaction_id: &str) -> Result<Option<MirrorTransactions>, CheckoutError>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MirrorTransactions {
    #[serde(default)]
    pub transactions: Vec<MirrorTransaction>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Receipt {
    pub status: Option<String>,
    pub entity_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transfer {
    pub account: Option<String>,
    pub amount: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MirrorTransaction {
    pub transaction_id: Option<String>,
    pub consensus_timestamp: Option<String>,
    #[serde(default)]
    pub receipt: Option<Receipt>,
    /// Newer mirror versions report the outcome here instead of in `receipt`.
    #[serde(default)]
    pub result: Option<String>,
    pub entity_id: Option<String>,
    pub memo_base64: Option<String>,
    #[serde(default)]
    pub transfers: Vec<Transfer>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MirrorTransaction {
    pub fn status(&self) -> Option<&str> {
        self.receipt
            .as_ref()
            .and_then(|r| r.status.as_deref())
            .or(self.result.as_deref())
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.receipt
            .as_ref()
            .and_then(|r| r.entity_id.as_deref())
            .or(self.entity_id.as_deref())
    }

    /// Paying account, read from the transaction id (`0.0.x-seconds-nanos`).
    pub fn payer_account(&self) -> Option<&str> {
        self.transaction_id.as_deref()?.split('-').next()
    }
}

/// True for `account@timestamp` ids; opaque payment references fail this check.
pub fn is_chain_transaction_id(id: &str) -> bool {
    id.contains('@') && id.contains('.')
}

/// `0.0.500@1700000000.123456789` -> `0.0.500-1700000000-123456789`, the form the
/// mirror REST API expects. The account part keeps its dots.
pub fn mirror_id(transaction_id: &str) -> String {
    match transaction_id.split_once('@') {
        Some((account, timestamp)) => format!("{}-{}", account, timestamp.replace('.', "-")),
        None => transaction_id.to_string(),
    }
}

pub struct MirrorNodeClient {
    base_url: String,
    client: reqwest::Client,
}

impl MirrorNodeClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CheckoutError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl ChainVerifier for MirrorNodeClient {
    async fn get_transaction(&self, transaction_id: &str) -> Result<Option<MirrorTransactions>, CheckoutError> {
        let url = format!("{}/transactions/{}", self.base_url, mirror_id(transaction_id));
        tracing::debug!(transaction_id, %url, "Querying mirror node");

        let response = self.client.get(&url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => Err(CheckoutError::dependency(format!(
                "mirror node returned HTTP {}",
                status
            ))),
        }
    }
}
