//! Wallet callback payloads: the promise-to-pay proof and the invoice it carries.

use crate::error::CheckoutError;
use base64::{
    alphabet,
    engine::{general_purpose::GeneralPurpose, DecodePaddingMode, GeneralPurposeConfig},
    Engine,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Wallets are inconsistent about padding, so decoding accepts either form.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

pub fn decode_base64(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    LENIENT_BASE64.decode(encoded.trim())
}

/// Decode a base64-wrapped JSON document.
pub fn decode_base64_json<T: DeserializeOwned>(encoded: &str) -> Result<T, CheckoutError> {
    let bytes = decode_base64(encoded)
        .map_err(|e| CheckoutError::validation(format!("Invalid base64 encoding: {}", e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| CheckoutError::validation(format!("Invalid JSON payload: {}", e)))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Signatures {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dropp: Option<String>,
    #[serde(rename = "droppMerchant", skip_serializing_if = "Option::is_none")]
    pub dropp_merchant: Option<String>,
}

/// The wallet-signed promise-to-pay. Untrusted until the payment network accepts it.
///
/// Fields the reconciler does not interpret are kept in `extra` so the proof is
/// forwarded to the network exactly as the wallet sent it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PromiseToPay {
    #[serde(default)]
    pub payer: String,
    #[serde(default)]
    pub invoice_bytes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_stamp: Option<Number>,
    #[serde(default)]
    pub signatures: Signatures,
    #[serde(rename = "encodedHHTransfer", default, skip_serializing_if = "Option::is_none")]
    pub encoded_hh_transfer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution_bytes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PromiseToPay {
    /// Reject proofs that lack the two fields everything else depends on.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        if self.payer.trim().is_empty() || self.invoice_bytes.trim().is_empty() {
            return Err(CheckoutError::validation(
                "Invalid P2P object: missing required fields (payer, invoiceBytes)",
            ));
        }
        Ok(())
    }

    pub fn decode_invoice(&self) -> Result<Invoice, CheckoutError> {
        decode_base64_json(&self.invoice_bytes)
            .map_err(|e| CheckoutError::validation(format!("Invalid invoiceBytes encoding: {}", e)))
    }
}

/// Merchant-authored payment terms embedded in the proof. Decoded, never re-encoded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub merchant_account: String,
    pub reference: String,
    pub amount: f64,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(rename = "qrCodeUUID", default, skip_serializing_if = "Option::is_none")]
    pub qr_code_uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
