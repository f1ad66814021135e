//! In-process stand-ins for the record store, the payment network and the mirror.

#![allow(dead_code)]

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use dropp_checkout::{
    config::{Config, DroppEnvironment, Environment},
    error::CheckoutError,
    models::{
        DroppResponse, NewTransaction, PaymentRequest, PromiseToPay, RecordCreated, RecordUpdated,
        TransactionPatch, TransactionQuery,
    },
    services::{
        mirror::MirrorTransactions, CacheService, ChainVerifier, MerchantKey, PaymentNetwork,
        TransactionRecords,
    },
    AppState,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SEED: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

pub fn test_config() -> Config {
    Config {
        environment: Environment::Development,
        host: "127.0.0.1".into(),
        port: 8080,
        dropp_environment: DroppEnvironment::Sandbox,
        dropp_api_url: "http://dropp.invalid".into(),
        merchant_id: "0.0.100".into(),
        merchant_signing_key: SEED.parse().unwrap(),
        record_store_url: "http://records.invalid".into(),
        mirror_node_url: "http://mirror.invalid".into(),
        public_base_url: None,
        http_timeout: Duration::from_secs(5),
        status_poll_retries: 3,
        status_poll_max_retries: 10,
        status_poll_interval: Duration::from_millis(1),
        verify_on_callback: false,
        redis_url: "redis://127.0.0.1:1".into(),
        rate_limit_max_requests: 100,
        rate_limit_window: Duration::from_secs(900),
    }
}

// ---------------------------------------------------------------------------
// Record store
// ---------------------------------------------------------------------------

pub struct StubRecords {
    pub create_ok: bool,
    pub fail_updates: bool,
    pub success_url: Option<String>,
    pub failure_url: Option<String>,
    pub signing_key: Option<String>,
    /// Last status written, echoed back like the real store does.
    pub stored_status: Mutex<Option<String>>,
    pub creates: Mutex<Vec<Value>>,
    pub updates: Mutex<Vec<(String, Value)>>,
}

impl Default for StubRecords {
    fn default() -> Self {
        Self {
            create_ok: true,
            fail_updates: false,
            success_url: None,
            failure_url: None,
            signing_key: None,
            stored_status: Mutex::new(None),
            creates: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
        }
    }
}

impl StubRecords {
    /// A record that already reached `status`.
    pub fn at(status: &str) -> Self {
        Self {
            stored_status: Mutex::new(Some(status.to_string())),
            ..Default::default()
        }
    }

    pub fn stored_status(&self) -> Option<String> {
        self.stored_status.lock().unwrap().clone()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.updates
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, patch)| patch["payment_status"].as_str().map(str::to_string))
            .collect()
    }

    pub fn last_update(&self) -> Option<(String, Value)> {
        self.updates.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TransactionRecords for StubRecords {
    async fn create_transaction(&self, payload: &NewTransaction) -> Result<RecordCreated, CheckoutError> {
        self.creates.lock().unwrap().push(serde_json::to_value(payload).unwrap());
        Ok(RecordCreated {
            ok: self.create_ok,
            transaction_id: self.create_ok.then(|| "TX-1".to_string()),
            data: None,
        })
    }

    async fn update_transaction(
        &self,
        reference: &str,
        patch: &TransactionPatch,
    ) -> Result<RecordUpdated, CheckoutError> {
        let patch = serde_json::to_value(patch).unwrap();
        self.updates.lock().unwrap().push((reference.to_string(), patch.clone()));

        if self.fail_updates {
            return Err(CheckoutError::dependency("record store unavailable"));
        }

        let mut stored = self.stored_status.lock().unwrap();
        if let Some(status) = patch["payment_status"].as_str() {
            *stored = Some(status.to_string());
        }
        Ok(RecordUpdated {
            ok: true,
            data: stored.as_ref().map(|status| json!({ "payment_status": status })),
            success_url: self.success_url.clone(),
            failure_url: self.failure_url.clone(),
            signing_key: self.signing_key.clone(),
            merchant_id: Some("0.0.100".into()),
        })
    }
}

// ---------------------------------------------------------------------------
// Payment network
// ---------------------------------------------------------------------------

pub struct StubNetwork {
    pub checkout: DroppResponse,
    /// `None` makes `submit` fail at the transport level.
    pub submission: Option<DroppResponse>,
    /// Answer for every submission after the first, when set.
    pub replay: Option<DroppResponse>,
    pub status: DroppResponse,
    pub transactions: DroppResponse,
    pub generate_calls: AtomicUsize,
    pub submit_calls: AtomicUsize,
    pub poll_retries: Mutex<Vec<u32>>,
    pub submitted_keys: Mutex<Vec<String>>,
    pub last_payment_request: Mutex<Option<Value>>,
    pub last_query: Mutex<Option<(TransactionQuery, String)>>,
}

pub fn response(code: i64, data: Value) -> DroppResponse {
    DroppResponse {
        response_code: code,
        errors: if code == 0 { vec![] } else { vec!["declined".into()] },
        data,
        transaction_id: None,
    }
}

impl Default for StubNetwork {
    fn default() -> Self {
        Self {
            checkout: response(0, json!({ "uuid": "abc", "link": "https://pay/abc" })),
            submission: Some(response(
                0,
                json!({ "paymentRef": "PR-1", "transactionReference": "TR-1" }),
            )),
            status: response(0, json!("SUCCESS")),
            transactions: response(0, json!([{ "id": 1 }, { "id": 2 }])),
            replay: None,
            generate_calls: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
            poll_retries: Mutex::new(Vec::new()),
            submitted_keys: Mutex::new(Vec::new()),
            last_payment_request: Mutex::new(None),
            last_query: Mutex::new(None),
        }
    }
}

impl StubNetwork {
    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentNetwork for StubNetwork {
    async fn generate_checkout(&self, request: &PaymentRequest) -> Result<DroppResponse, CheckoutError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_payment_request.lock().unwrap() = Some(serde_json::to_value(request).unwrap());
        Ok(self.checkout.clone())
    }

    async fn submit(&self, _proof: &PromiseToPay, signing_key: &MerchantKey) -> Result<DroppResponse, CheckoutError> {
        let previous = self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted_keys.lock().unwrap().push(signing_key.public_key_hex());
        let answer = match &self.replay {
            Some(replay) if previous > 0 => Some(replay.clone()),
            _ => self.submission.clone(),
        };
        answer
            .ok_or_else(|| CheckoutError::dependency("connection reset"))
    }

    async fn wait_for_completion(&self, _checkout_id: &str, retries: u32) -> Result<DroppResponse, CheckoutError> {
        self.poll_retries.lock().unwrap().push(retries);
        Ok(self.status.clone())
    }

    async fn get_transactions(
        &self,
        query: &TransactionQuery,
        parent_merchant_id: &str,
        _signing_key: &MerchantKey,
    ) -> Result<DroppResponse, CheckoutError> {
        *self.last_query.lock().unwrap() = Some((query.clone(), parent_merchant_id.to_string()));
        Ok(self.transactions.clone())
    }
}

// ---------------------------------------------------------------------------
// Mirror
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct StubMirror {
    /// `None` answers like an HTTP 404.
    pub answer: Option<Value>,
    pub calls: AtomicUsize,
}

impl StubMirror {
    pub fn with(answer: Value) -> Self {
        Self {
            answer: Some(answer),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn successful() -> Self {
        Self::with(json!({
            "transactions": [{
                "transaction_id": "0.0.200-1700000000-000000000",
                "consensus_timestamp": "1700000001.000000001",
                "receipt": { "status": "SUCCESS", "entity_id": "0.0.100" },
                "transfers": [{ "account": "0.0.200", "amount": -1000 }]
            }]
        }))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainVerifier for StubMirror {
    async fn get_transaction(&self, _id: &str) -> Result<Option<MirrorTransactions>, CheckoutError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .answer
            .clone()
            .map(|v| serde_json::from_value(v).unwrap()))
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub struct Harness {
    pub records: Arc<StubRecords>,
    pub network: Arc<StubNetwork>,
    pub mirror: Arc<StubMirror>,
    pub state: AppState,
}

pub fn harness_with(config: Config, records: StubRecords, network: StubNetwork, mirror: StubMirror) -> Harness {
    let records = Arc::new(records);
    let network = Arc::new(network);
    let mirror = Arc::new(mirror);
    let cache = Arc::new(CacheService::in_memory(Duration::from_secs(3600)));

    let state = AppState::with_services(config, records.clone(), network.clone(), mirror.clone(), cache);
    Harness {
        records,
        network,
        mirror,
        state,
    }
}

pub fn harness(records: StubRecords, network: StubNetwork) -> Harness {
    harness_with(test_config(), records, network, StubMirror::default())
}

pub fn invoice_bytes() -> String {
    STANDARD.encode(
        json!({
            "merchantAccount": "0.0.100",
            "reference": "TX-1",
            "amount": 10,
            "currency": "USD",
            "qrCodeUUID": "abc"
        })
        .to_string(),
    )
}

pub fn proof() -> PromiseToPay {
    serde_json::from_value(json!({
        "payer": "0.0.200",
        "invoiceBytes": invoice_bytes(),
        "timeStamp": 1700000000u64,
        "signatures": { "payer": "wallet-signature" }
    }))
    .unwrap()
}
