//! Locating the ledger transaction behind a settled payment.
//!
//! The wallet and the payment network each expose the id in different places,
//! and sometimes only a network-internal payment reference is available.

use crate::models::{decode_base64_json, DroppResponse, PromiseToPay};
use serde::Deserialize;
use serde_json::{Number, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxIdSource {
    Proof,
    PaymentResponse,
    EncodedTransfer,
    PayerTimestamp,
    /// Not a ledger id; only useful for correlating with the payment network.
    PaymentRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedTxId {
    pub id: String,
    pub source: TxIdSource,
}

impl ExtractedTxId {
    fn new(id: impl Into<String>, source: TxIdSource) -> Self {
        Self {
            id: id.into(),
            source,
        }
    }

    pub fn is_chain_id(&self) -> bool {
        self.source != TxIdSource::PaymentRef
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EncodedTransfer {
    transaction_id: Option<String>,
    from: Option<String>,
    timestamp: Option<Value>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Timestamps whose printed form is at most ten characters are taken as
/// seconds and scaled to nanoseconds. Fractional seconds are rounded to the
/// nearest nanosecond. Longer values pass through untouched, so a full
/// `1700000000.5` is left as is.
pub fn normalize_timestamp(timestamp: &Number) -> String {
    let printed = timestamp.to_string();
    if printed.len() > 10 {
        return printed;
    }
    match (timestamp.as_u64(), timestamp.as_f64()) {
        (Some(seconds), _) => (u128::from(seconds) * 1_000_000_000).to_string(),
        (None, Some(seconds)) if seconds >= 0.0 => format!("{:.0}", seconds * 1e9),
        _ => printed,
    }
}

fn from_encoded_transfer(encoded: &str) -> Option<String> {
    let transfer: EncodedTransfer = match decode_base64_json(encoded) {
        Ok(transfer) => transfer,
        Err(e) => {
            tracing::debug!("Ignoring undecodable encodedHHTransfer: {}", e);
            return None;
        }
    };

    if let Some(id) = non_empty(transfer.transaction_id.as_deref()) {
        return Some(id.to_string());
    }

    let from = non_empty(transfer.from.as_deref())?;
    let timestamp = match transfer.timestamp? {
        Value::String(s) if !s.is_empty() => s,
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    Some(format!("{}@{}", from, timestamp))
}

/// First available id, in decreasing order of trust.
pub fn extract_transaction_id(
    proof: &PromiseToPay,
    response: Option<&DroppResponse>,
) -> Option<ExtractedTxId> {
    if let Some(id) = non_empty(proof.transaction_id.as_deref()) {
        return Some(ExtractedTxId::new(id, TxIdSource::Proof));
    }

    if let Some(id) = response.and_then(|r| non_empty(r.transaction_id.as_deref())) {
        return Some(ExtractedTxId::new(id, TxIdSource::PaymentResponse));
    }

    if let Some(id) = proof.encoded_hh_transfer.as_deref().and_then(from_encoded_transfer) {
        return Some(ExtractedTxId::new(id, TxIdSource::EncodedTransfer));
    }

    if let (Some(payer), Some(timestamp)) = (non_empty(Some(proof.payer.as_str())), &proof.time_stamp) {
        let id = format!("{}@{}", payer, normalize_timestamp(timestamp));
        return Some(ExtractedTxId::new(id, TxIdSource::PayerTimestamp));
    }

    let payment_ref = response.and_then(DroppResponse::payment_ref)?;
    tracing::warn!(payment_ref, "No ledger transaction id available, falling back to paymentRef");
    Some(ExtractedTxId::new(payment_ref, TxIdSource::PaymentRef))
}
