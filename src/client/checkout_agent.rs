//! Manual end-to-end check against a running checkout service: create a
//! checkout, print where the shopper would be sent, then poll its status.

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let base_url = std::env::var("CHECKOUT_SERVICE_URL")
        .unwrap_or_else(|_| "http://localhost:8080".to_string());
    let amount: f64 = std::env::var("AGENT_AMOUNT")
        .unwrap_or_else(|_| "1.00".to_string())
        .parse()
        .context("Invalid AGENT_AMOUNT")?;
    let polls: u32 = std::env::var("AGENT_STATUS_POLLS")
        .unwrap_or_else(|_| "5".to_string())
        .parse()
        .context("Invalid AGENT_STATUS_POLLS")?;

    println!("Dropp Checkout Agent");
    println!("====================");
    println!("Server: {}", base_url);
    println!();

    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

    let health: Value = client
        .get(format!("{}/health", base_url))
        .send()
        .await?
        .json()
        .await?;
    println!("Health: {}", health["status"]);

    let request = json!({
        "amount": amount,
        "currency": "USD",
        "userId": "agent-user",
        "storeId": "agent-store",
        "serviceId": "agent-service",
        "emailId": "agent@example.com",
        "title": "Checkout agent test",
        "successUrl": std::env::var("AGENT_SUCCESS_URL").ok(),
        "failureUrl": std::env::var("AGENT_FAILURE_URL").ok(),
    });

    let created = post_json(&client, &format!("{}/api/payments/checkout", base_url), &request).await?;
    let checkout_id = created["data"]["checkoutId"]
        .as_str()
        .context("response has no checkoutId")?
        .to_string();

    println!("[SUCCESS] Checkout created");
    println!("  checkoutId:  {}", checkout_id);
    println!("  reference:   {}", created["data"]["reference"]);
    println!("  redirectUrl: {}", created["data"]["redirectUrl"]);
    println!();
    println!("Open the redirect URL in a wallet to pay. Polling status...");

    for attempt in 1..=polls {
        let status: Value = client
            .get(format!("{}/api/payments/status/{}?retries=1", base_url, checkout_id))
            .send()
            .await?
            .json()
            .await?;
        let state = status["data"]["status"].as_str().unwrap_or("UNKNOWN");
        println!("  poll {}/{}: {}", attempt, polls, state);

        if state != "WAIT" {
            println!();
            println!("{}", serde_json::to_string_pretty(&status)?);
            return Ok(());
        }
        tokio::time::sleep(Duration::from_secs(5)).await;
    }

    println!("[PENDING] Checkout still waiting after {} polls", polls);
    Ok(())
}

async fn post_json(client: &Client, url: &str, body: &Value) -> Result<Value> {
    let response = client.post(url).json(body).send().await?;
    let status = response.status();
    let payload: Value = response.json().await?;

    if !status.is_success() {
        bail!("{} returned {}: {}", url, status, payload["error"]);
    }
    Ok(payload)
}
