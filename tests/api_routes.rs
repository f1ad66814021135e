mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use common::*;
use dropp_checkout::{config::Environment, router};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app(h: &Harness) -> Router {
    router(h.state.clone())
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn checkout_endpoint_returns_redirect_target() {
    let h = harness(StubRecords::default(), StubNetwork::default());
    let (status, body) = send(
        app(&h),
        Method::POST,
        "/api/payments/checkout",
        Some(json!({
            "amount": 10, "currency": "USD", "userId": "u1", "storeId": "s1",
            "serviceId": "srv1", "emailId": "e@x.com", "merchantAccount": "0.0.100"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["checkoutId"], "abc");
    assert_eq!(body["data"]["redirectUrl"], "https://pay/abc");
}

#[tokio::test]
async fn checkout_validation_error_envelope() {
    let h = harness(StubRecords::default(), StubNetwork::default());
    let (status, body) = send(
        app(&h),
        Method::POST,
        "/api/payments/checkout",
        Some(json!({ "amount": 10, "userId": "u1", "storeId": "s1", "serviceId": "srv1" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error_code"], "VALIDATION_ERROR");
    assert_eq!(body["error"], "Missing required field: emailId");
}

#[tokio::test]
async fn malformed_json_body_is_a_bad_request() {
    let h = harness(StubRecords::default(), StubNetwork::default());
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/payments/post-callback")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app(&h).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn post_callback_redirects_when_target_is_registered() {
    let records = StubRecords {
        success_url: Some("https://shop.example/ok".into()),
        ..Default::default()
    };
    let h = harness(records, StubNetwork::default());
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/payments/post-callback")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&proof()).unwrap()))
        .unwrap();

    let response = app(&h).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with("https://shop.example/ok?"));
    assert!(location.contains("status=success"));
    assert!(location.contains("paymentRef=PR-1"));
}

#[tokio::test]
async fn get_callback_returns_json_without_target() {
    let h = harness(StubRecords::default(), StubNetwork::default());
    let p2p = serde_json::to_string(&proof()).unwrap();
    let uri = format!(
        "/api/payments/callback?p2p={}",
        url_encode(&p2p)
    );

    let (status, body) = send(app(&h), Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["paymentStatus"], "success");
    assert_eq!(body["data"]["invoiceData"]["reference"], "TX-1");
}

#[tokio::test]
async fn get_callback_reports_failure_in_json() {
    let network = StubNetwork {
        submission: Some(response(1, Value::Null)),
        ..Default::default()
    };
    let h = harness(StubRecords::default(), network);
    let uri = format!(
        "/api/payments/post-callback?p2p={}",
        url_encode(&serde_json::to_string(&proof()).unwrap())
    );

    let (status, body) = send(app(&h), Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["paymentStatus"], "failed");
}

#[tokio::test]
async fn get_callback_requires_p2p() {
    let h = harness(StubRecords::default(), StubNetwork::default());
    let (status, body) = send(app(&h), Method::GET, "/api/payments/callback", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing p2p query parameter");
}

#[tokio::test]
async fn status_clamps_retries() {
    let h = harness(StubRecords::default(), StubNetwork::default());
    let (status, body) = send(
        app(&h),
        Method::GET,
        "/api/payments/status/abc?retries=500&merchantId=0.0.999",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "SUCCESS");
    assert_eq!(body["data"]["merchantId"], "0.0.999");

    let (_, _) = send(app(&h), Method::GET, "/api/payments/status/abc", None).await;
    assert_eq!(*h.network.poll_retries.lock().unwrap(), vec![10, 3]);
}

#[tokio::test]
async fn verify_reports_not_found_without_failing() {
    let h = harness_with(
        test_config(),
        StubRecords::default(),
        StubNetwork::default(),
        StubMirror::with(json!({ "transactions": [] })),
    );

    let (status, body) = send(
        app(&h),
        Method::GET,
        "/api/payments/verify-hedera/0.0.500@1700000000.123456789",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["verified"], false);
    assert_eq!(body["data"]["error"], "Transaction not found on Hedera");
    assert_eq!(body["data"]["data"], Value::Null);
}

#[tokio::test]
async fn verify_post_records_positive_result() {
    let h = harness_with(
        test_config(),
        StubRecords::default(),
        StubNetwork::default(),
        StubMirror::successful(),
    );

    let (status, body) = send(
        app(&h),
        Method::POST,
        "/api/payments/verify-hedera",
        Some(json!({ "transactionId": "0.0.200@1700000000.000000000", "reference": "TX-1" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["verified"], true);
    assert_eq!(body["data"]["type"], "hedera_transaction");

    let (reference, patch) = h.records.last_update().unwrap();
    assert_eq!(reference, "TX-1");
    assert_eq!(patch["hederaVerified"], true);
    assert_eq!(patch["hederaTransactionId"], "0.0.200@1700000000.000000000");
}

#[tokio::test]
async fn verify_post_requires_transaction_id() {
    let h = harness(StubRecords::default(), StubNetwork::default());
    let (status, _) = send(app(&h), Method::POST, "/api/payments/verify-hedera", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn transactions_are_listed_with_capped_limit() {
    let h = harness(StubRecords::default(), StubNetwork::default());
    let (status, body) = send(
        app(&h),
        Method::GET,
        "/api/payments/transactions/0.0.555?offset=20&limit=500",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["merchantId"], "0.0.555");
    assert_eq!(body["data"]["offset"], 20);
    assert_eq!(body["data"]["limit"], 100);
    assert_eq!(body["data"]["transactionCount"], 2);

    let (query, parent) = h.network.last_query.lock().unwrap().clone().unwrap();
    assert_eq!(query.user_id, "0.0.555");
    assert_eq!(parent, "0.0.100");
}

#[tokio::test]
async fn rejected_listing_is_upstream_error() {
    let network = StubNetwork {
        transactions: response(3, Value::Null),
        ..Default::default()
    };
    let h = harness(StubRecords::default(), network);
    let (status, body) = send(app(&h), Method::GET, "/api/payments/transactions/0.0.555", None).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error_code"], "UPSTREAM_REJECTED");
}

#[tokio::test]
async fn health_reports_environment_and_redis() {
    let h = harness(StubRecords::default(), StubNetwork::default());
    let (status, body) = send(app(&h), Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["redis"], false);
    assert_eq!(body["environment"], "development");
}

#[tokio::test]
async fn decode_transfer_accepts_embedded_proof() {
    let h = harness(StubRecords::default(), StubNetwork::default());
    let encoded = STANDARD.encode(r#"{"from":"0.0.200","timestamp":"1700000000.1"}"#);

    let (status, body) = send(
        app(&h),
        Method::POST,
        "/api/payments/debug/decode-transfer",
        Some(json!({ "p2pObj": { "encodedHHTransfer": encoded } })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["decoded"]["from"], "0.0.200");

    let (status, _) = send(
        app(&h),
        Method::POST,
        "/api/payments/debug/decode-transfer",
        Some(json!({ "encodedHHTransfer": "%%%" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn debug_routes_are_hidden_in_production() {
    let mut config = test_config();
    config.environment = Environment::Production;
    let h = harness_with(config, StubRecords::default(), StubNetwork::default(), StubMirror::default());

    let (status, _) = send(app(&h), Method::GET, "/api/payments/debug/abc", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rate_limit_returns_429() {
    let mut config = test_config();
    config.rate_limit_max_requests = 1;
    let h = harness_with(config, StubRecords::default(), StubNetwork::default(), StubMirror::default());
    let app = app(&h);

    let (first, _) = send(app.clone(), Method::GET, "/api/payments/status/abc", None).await;
    let (second, body) = send(app, Method::GET, "/api/payments/status/abc", None).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error_code"], "RATE_LIMIT_EXCEEDED");
}

fn url_encode(raw: &str) -> String {
    reqwest::Url::parse_with_params("http://x/", &[("p", raw)])
        .unwrap()
        .query()
        .unwrap()
        .trim_start_matches("p=")
        .to_string()
}
