use crate::{
    error::CheckoutError,
    models::{decode_base64, DroppResponse, PaymentRequest, PromiseToPay, TransactionQuery},
    services::signing::MerchantKey,
};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// The third-party payment network, as the checkout flow needs it.
#[async_trait]
pub trait PaymentNetwork: Send + Sync {
    /// Obtain a checkout identifier (`data.uuid`) and wallet link (`data.link`).
    async fn generate_checkout(&self, request: &PaymentRequest) -> Result<DroppResponse, CheckoutError>;

    /// Settle a wallet proof. The network recognises resubmission of an identical
    /// proof, so callers may invoke this more than once and never retry on their own.
    async fn submit(&self, proof: &PromiseToPay, signing_key: &MerchantKey) -> Result<DroppResponse, CheckoutError>;

    /// Poll a checkout until it leaves `WAIT`, giving up after `retries` attempts.
    async fn wait_for_completion(&self, checkout_id: &str, retries: u32) -> Result<DroppResponse, CheckoutError>;

    async fn get_transactions(
        &self,
        query: &TransactionQuery,
        parent_merchant_id: &str,
        signing_key: &MerchantKey,
    ) -> Result<DroppResponse, CheckoutError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignedQuery<'a> {
    #[serde(flatten)]
    query: &'a TransactionQuery,
    parent_merchant_account_id: &'a str,
    signature: String,
}

pub struct DroppClient {
    base_url: String,
    client: reqwest::Client,
    poll_interval: Duration,
}

impl DroppClient {
    pub fn new(base_url: &str, timeout: Duration, poll_interval: Duration) -> Result<Self, CheckoutError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("dropp-checkout/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            poll_interval,
        })
    }

    async fn read_response(response: reqwest::Response) -> Result<DroppResponse, CheckoutError> {
        let status = response.status();
        // Business failures come back as 4xx with a normal envelope.
        if status.is_server_error() {
            return Err(CheckoutError::dependency(format!(
                "payment network returned HTTP {}",
                status
            )));
        }
        response
            .json::<DroppResponse>()
            .await
            .map_err(|e| CheckoutError::dependency(format!("unreadable payment network response: {}", e)))
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<DroppResponse, CheckoutError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;
        Self::read_response(response).await
    }

    async fn poll_once(&self, checkout_id: &str) -> Result<DroppResponse, CheckoutError> {
        let response = self
            .client
            .get(format!(
                "{}/merchant/v1/payment-requests/{}/status",
                self.base_url, checkout_id
            ))
            .send()
            .await?;
        Self::read_response(response).await
    }
}

/// Attach the merchant signature over the raw invoice bytes.
fn countersign(proof: &PromiseToPay, signing_key: &MerchantKey) -> Result<PromiseToPay, CheckoutError> {
    let invoice = decode_base64(&proof.invoice_bytes)
        .map_err(|e| CheckoutError::validation(format!("Invalid invoiceBytes encoding: {}", e)))?;

    let mut signed = proof.clone();
    signed.signatures.merchant = Some(signing_key.sign_hex(&invoice));
    Ok(signed)
}

#[async_trait]
impl PaymentNetwork for DroppClient {
    async fn generate_checkout(&self, request: &PaymentRequest) -> Result<DroppResponse, CheckoutError> {
        tracing::debug!(reference = %request.reference, "Requesting checkout identifier");
        self.post("/merchant/v1/payment-requests", request).await
    }

    async fn submit(&self, proof: &PromiseToPay, signing_key: &MerchantKey) -> Result<DroppResponse, CheckoutError> {
        let signed = countersign(proof, signing_key)?;
        tracing::debug!(payer = %proof.payer, "Submitting promise-to-pay");
        self.post("/merchant/v1/payments", &signed).await
    }

    async fn wait_for_completion(&self, checkout_id: &str, retries: u32) -> Result<DroppResponse, CheckoutError> {
        let attempts = retries.max(1);
        let mut attempt = 1;

        loop {
            let response = self.poll_once(checkout_id).await?;
            let pending = response.data.as_str() == Some("WAIT");

            if !pending || attempt >= attempts {
                tracing::debug!(checkout_id, attempt, pending, "Status poll finished");
                return Ok(response);
            }

            attempt += 1;
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn get_transactions(
        &self,
        query: &TransactionQuery,
        parent_merchant_id: &str,
        signing_key: &MerchantKey,
    ) -> Result<DroppResponse, CheckoutError> {
        let payload = serde_json::to_vec(query)
            .map_err(|e| CheckoutError::InternalError(format!("cannot encode query: {}", e)))?;
        let body = SignedQuery {
            query,
            parent_merchant_account_id: parent_merchant_id,
            signature: signing_key.sign_hex(&payload),
        };
        self.post("/merchant/v1/transactions", &body).await
    }
}
