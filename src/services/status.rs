use crate::{
    error::CheckoutError,
    models::{CheckoutStatus, DroppResponse, TransactionPatch, TransactionQuery, VerificationResult},
    services::{
        best_effort,
        dropp::PaymentNetwork,
        records::TransactionRecords,
        signing::MerchantKey,
        verification::VerificationService,
    },
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub checkout_id: String,
    pub merchant_id: String,
    pub status: CheckoutStatus,
    pub response: DroppResponse,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    pub merchant_id: String,
    pub offset: u32,
    pub limit: u32,
    pub transaction_count: usize,
    pub transactions: Vec<Value>,
}

/// On-demand reads usable at any point after a checkout exists.
pub struct StatusService {
    network: Arc<dyn PaymentNetwork>,
    records: Arc<dyn TransactionRecords>,
    verification: Arc<VerificationService>,
    parent_merchant_id: String,
    signing_key: MerchantKey,
}

impl StatusService {
    pub fn new(
        network: Arc<dyn PaymentNetwork>,
        records: Arc<dyn TransactionRecords>,
        verification: Arc<VerificationService>,
        parent_merchant_id: String,
        signing_key: MerchantKey,
    ) -> Self {
        Self {
            network,
            records,
            verification,
            parent_merchant_id,
            signing_key,
        }
    }

    pub async fn poll_status(
        &self,
        checkout_id: &str,
        merchant_id: Option<String>,
        retries: u32,
    ) -> Result<StatusReport, CheckoutError> {
        if checkout_id.trim().is_empty() {
            return Err(CheckoutError::validation("Missing checkoutId parameter"));
        }

        let response = self.network.wait_for_completion(checkout_id, retries).await?;
        let status = CheckoutStatus::classify(&response.data);
        tracing::info!(checkout_id, retries, ?status, "Checkout status polled");

        Ok(StatusReport {
            checkout_id: checkout_id.to_string(),
            merchant_id: merchant_id.unwrap_or_else(|| self.parent_merchant_id.clone()),
            status,
            response,
        })
    }

    pub async fn verify_on_chain(&self, identifier: &str) -> Result<VerificationResult, CheckoutError> {
        self.verification.verify(identifier).await
    }

    /// Verify, then attach a positive ledger result to the record for `reference`.
    pub async fn verify_and_record(
        &self,
        identifier: &str,
        reference: Option<&str>,
    ) -> Result<VerificationResult, CheckoutError> {
        let result = self.verify_on_chain(identifier).await?;

        if let Some(reference) = reference.filter(|r| !r.is_empty()) {
            if result.is_chain_verified() {
                let patch = TransactionPatch {
                    hedera_transaction_id: Some(identifier.to_string()),
                    hedera_verified: Some(true),
                    hedera_verification_data: result.data.clone(),
                    updated_at: Some(chrono::Utc::now()),
                    ..Default::default()
                };
                best_effort(
                    self.records.update_transaction(reference, &patch).await,
                    "record_verification",
                    reference,
                );
            }
        }

        Ok(result)
    }

    pub async fn list_transactions(
        &self,
        merchant_id: &str,
        offset: Option<u32>,
        limit: Option<u32>,
    ) -> Result<TransactionPage, CheckoutError> {
        if merchant_id.trim().is_empty() {
            return Err(CheckoutError::validation("Missing merchantId parameter"));
        }

        let query = TransactionQuery {
            user_id: merchant_id.to_string(),
            offset: offset.unwrap_or(0),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE),
        };

        let response = self
            .network
            .get_transactions(&query, &self.parent_merchant_id, &self.signing_key)
            .await?;

        if !response.is_success() {
            return Err(CheckoutError::UpstreamRejected {
                code: response.response_code,
                message: response
                    .first_error()
                    .unwrap_or("Unknown error")
                    .to_string(),
            });
        }

        let transactions = match response.data {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => vec![other],
        };
        tracing::info!(merchant_id, count = transactions.len(), "Merchant transactions listed");

        Ok(TransactionPage {
            merchant_id: query.user_id,
            offset: query.offset,
            limit: query.limit,
            transaction_count: transactions.len(),
            transactions,
        })
    }
}
