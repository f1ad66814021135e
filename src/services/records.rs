use crate::{
    error::CheckoutError,
    models::{NewTransaction, RecordCreated, RecordUpdated, TransactionPatch},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// The external order/transaction store. It owns every transaction end to end;
/// nothing here keeps a copy between requests.
#[async_trait]
pub trait TransactionRecords: Send + Sync {
    async fn create_transaction(&self, payload: &NewTransaction) -> Result<RecordCreated, CheckoutError>;

    /// Merge `patch` into the record keyed by `reference`.
    async fn update_transaction(
        &self,
        reference: &str,
        patch: &TransactionPatch,
    ) -> Result<RecordUpdated, CheckoutError>;
}

const STORE_SUCCESS_CODE: i64 = 200;

#[derive(Debug, Deserialize)]
struct StoreEnvelope {
    status_code: Option<i64>,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Serialize)]
struct UpdateBody<'a> {
    transaction_id: &'a str,
    #[serde(flatten)]
    patch: &'a TransactionPatch,
}

pub struct HttpRecordStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRecordStore {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CheckoutError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: format!("{}/transactions", base_url.trim_end_matches('/')),
            client,
        })
    }

    async fn read_envelope(response: reqwest::Response) -> Result<StoreEnvelope, CheckoutError> {
        let status = response.status();
        if !status.is_success() {
            return Err(CheckoutError::dependency(format!(
                "record store returned HTTP {}",
                status
            )));
        }
        Ok(response.json().await?)
    }
}

fn data_string(data: &Option<Value>, key: &str) -> Option<String> {
    data.as_ref()?
        .get(key)?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl TransactionRecords for HttpRecordStore {
    async fn create_transaction(&self, payload: &NewTransaction) -> Result<RecordCreated, CheckoutError> {
        let response = self
            .client
            .post(format!("{}/create_transaction/", self.base_url))
            .json(payload)
            .send()
            .await?;
        let envelope = Self::read_envelope(response).await?;

        let ok = envelope.status_code == Some(STORE_SUCCESS_CODE);
        let transaction_id = data_string(&envelope.data, "transaction_id");
        tracing::debug!(ok, transaction_id = ?transaction_id, "create_transaction answered");

        Ok(RecordCreated {
            ok,
            transaction_id,
            data: envelope.data,
        })
    }

    async fn update_transaction(
        &self,
        reference: &str,
        patch: &TransactionPatch,
    ) -> Result<RecordUpdated, CheckoutError> {
        let body = UpdateBody {
            transaction_id: reference,
            patch,
        };
        let response = self
            .client
            .put(format!("{}/update_transaction/", self.base_url))
            .json(&body)
            .send()
            .await?;
        let envelope = Self::read_envelope(response).await?;

        let ok = envelope.status_code == Some(STORE_SUCCESS_CODE);
        tracing::debug!(reference, ok, status = ?patch.payment_status, "update_transaction answered");

        Ok(RecordUpdated {
            ok,
            success_url: data_string(&envelope.data, "successUrl"),
            failure_url: data_string(&envelope.data, "failureUrl"),
            signing_key: data_string(&envelope.data, "signingKey"),
            merchant_id: data_string(&envelope.data, "merchantId"),
            data: envelope.data,
        })
    }
}
