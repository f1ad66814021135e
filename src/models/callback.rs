use crate::models::{DroppResponse, Invoice, VerificationResult};
use reqwest::Url;
use serde::Serialize;

/// Classified result of one wallet callback.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackOutcome {
    pub is_success: bool,
    pub payment_status: &'static str,
    pub checkout_id: Option<String>,
    pub reference: String,
    pub amount: f64,
    pub currency: String,
    pub payer: String,
    pub payment_ref: Option<String>,
    pub transaction_reference: Option<String>,
    pub hedera_transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationResult>,
    pub invoice_data: Invoice,
    pub payment_response: Option<DroppResponse>,
    /// Outcome-specific redirect target from the record store, if one was registered.
    #[serde(skip)]
    pub redirect_target: Option<String>,
}

impl CallbackOutcome {
    /// Append the outcome to the registered redirect target.
    ///
    /// Returns `None` when no target is registered or it is not a valid absolute URL,
    /// in which case the caller answers with JSON instead.
    pub fn redirect_url(&self) -> Option<Url> {
        let target = self.redirect_target.as_deref()?;
        let mut url = match Url::parse(target) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(
                    reference = %self.reference,
                    redirect_target = target,
                    "Ignoring invalid redirect target: {}",
                    e
                );
                return None;
            }
        };

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("checkoutId", self.checkout_id.as_deref().unwrap_or_default());
            query.append_pair("status", self.payment_status);
            query.append_pair("reference", &self.reference);
            query.append_pair("amount", &self.amount.to_string());
            query.append_pair("currency", &self.currency);
            query.append_pair("payer", &self.payer);
            if let Some(payment_ref) = &self.payment_ref {
                query.append_pair("paymentRef", payment_ref);
            }
            if let Some(transaction_reference) = &self.transaction_reference {
                query.append_pair("transactionReference", transaction_reference);
            }
            if let Some(tx_id) = &self.hedera_transaction_id {
                query.append_pair("hederaTransactionId", tx_id);
            }
            if let Some(error) = &self.error {
                query.append_pair("error", error);
            }
        }

        Some(url)
    }
}
