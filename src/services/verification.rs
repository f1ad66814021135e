use crate::{
    error::CheckoutError,
    models::{decode_base64, VerificationFailure, VerificationKind, VerificationResult},
    services::{
        cache::CacheService,
        mirror::{is_chain_transaction_id, ChainVerifier, MirrorTransaction},
    },
};
use serde_json::{json, Value};
use std::sync::Arc;

const SUCCESS_RECEIPT: &str = "SUCCESS";

/// Independent confirmation of settlement against the public ledger.
pub struct VerificationService {
    chain: Arc<dyn ChainVerifier>,
    cache: Arc<CacheService>,
}

fn cache_key(transaction_id: &str) -> String {
    format!("verification:{}", transaction_id)
}

fn receipt_summary(tx: &MirrorTransaction) -> Value {
    let memo = tx
        .memo_base64
        .as_deref()
        .filter(|m| !m.is_empty())
        .and_then(|m| decode_base64(m).ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());

    json!({
        "transactionId": tx.transaction_id,
        "status": tx.status(),
        "amount": tx.transfers.first().and_then(|t| t.amount),
        "entityId": tx.entity_id(),
        "timestamp": tx.consensus_timestamp,
        "from": tx.payer_account(),
        "to": tx.entity_id(),
        "memo": memo,
    })
}

impl VerificationService {
    pub fn new(chain: Arc<dyn ChainVerifier>, cache: Arc<CacheService>) -> Self {
        Self { chain, cache }
    }

    /// Verify `identifier` on the ledger.
    ///
    /// Only transport failures are errors. A missing or unsuccessful transaction is
    /// an ordinary `verified: false` result, and opaque payment references pass
    /// with `type: payment_reference` since the ledger cannot be asked about them.
    pub async fn verify(&self, identifier: &str) -> Result<VerificationResult, CheckoutError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(CheckoutError::validation("Missing transactionId"));
        }

        if !is_chain_transaction_id(identifier) {
            tracing::info!(identifier, "Not a ledger transaction id, treating as payment reference");
            return Ok(VerificationResult::verified(
                VerificationKind::PaymentReference,
                json!({
                    "paymentReference": identifier,
                    "timestamp": chrono::Utc::now(),
                    "note": "Payment reference recorded. For full on-chain verification, a Hedera Transaction ID (0.0.XXXXX@timestamp) is needed.",
                }),
            ));
        }

        let key = cache_key(identifier);
        match self.cache.get::<VerificationResult>(&key).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(e) => tracing::warn!(identifier, "Verification cache read failed: {}", e),
        }

        let lookup = self.chain.get_transaction(identifier).await?;
        let result = match lookup {
            None => VerificationResult::unverified(VerificationFailure::PendingOrUnknown, None),
            Some(found) => match found.transactions.first() {
                None => VerificationResult::unverified(VerificationFailure::NotFound, None),
                Some(tx) => match tx.status() {
                    Some(SUCCESS_RECEIPT) => {
                        VerificationResult::verified(VerificationKind::HederaTransaction, receipt_summary(tx))
                    }
                    other => VerificationResult::unverified(
                        VerificationFailure::ReceiptStatus(other.unwrap_or("unknown").to_string()),
                        serde_json::to_value(tx).ok(),
                    ),
                },
            },
        };

        tracing::info!(
            identifier,
            verified = result.verified,
            error = ?result.error,
            "Ledger verification finished"
        );

        // A successful receipt never changes; anything else may still settle.
        if result.is_chain_verified() {
            if let Err(e) = self.cache.set(&key, &result).await {
                tracing::warn!(identifier, "Verification cache write failed: {}", e);
            }
        }

        Ok(result)
    }
}
