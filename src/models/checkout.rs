use crate::error::CheckoutError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of `POST /api/payments/checkout`, as sent by the storefront.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub amount: Option<f64>,
    pub currency: Option<String>,
    #[serde(alias = "user_id")]
    pub user_id: Option<String>,
    #[serde(alias = "store_id")]
    pub store_id: Option<String>,
    #[serde(alias = "service_id")]
    pub service_id: Option<String>,
    #[serde(alias = "email_id")]
    pub email_id: Option<String>,
    #[serde(alias = "merchantId")]
    pub merchant_account: Option<String>,
    pub signing_key: Option<String>,
    #[serde(alias = "additional_details")]
    pub additional_details: Option<Map<String, Value>>,
    pub thumbnail: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub success_message: Option<String>,
    pub callback_url: Option<String>,
    pub success_url: Option<String>,
    pub failure_url: Option<String>,
    pub distribution: Option<Value>,
    pub purchase_expiration: Option<i64>,
    pub referral_fee: Option<f64>,
    pub referral_account: Option<String>,
    pub accept_payment_delay: Option<bool>,
    pub no_offers: Option<bool>,
    #[serde(rename = "payByCC")]
    pub pay_by_cc: Option<bool>,
    pub pay_by_bank: Option<bool>,
}

/// Process-wide values a request may omit.
#[derive(Debug, Clone)]
pub struct CheckoutDefaults {
    pub merchant_account: String,
    pub callback_url: String,
}

/// A checkout request that passed boundary validation. Every field the rest of
/// the flow relies on is present.
#[derive(Debug, Clone)]
pub struct ValidatedCheckout {
    pub amount: f64,
    pub currency: String,
    pub user_id: String,
    pub store_id: String,
    pub service_id: String,
    pub email_id: String,
    pub merchant_account: String,
    pub signing_key_override: Option<String>,
    pub additional_details: Map<String, Value>,
    pub callback_url: String,
    pub success_url: Option<String>,
    pub failure_url: Option<String>,
    pub options: PaymentOptions,
}

/// Display, distribution and fee settings forwarded to the payment network.
#[derive(Debug, Clone)]
pub struct PaymentOptions {
    pub thumbnail: String,
    pub title: String,
    pub kind: String,
    pub success_message: Option<String>,
    pub distribution: Option<Value>,
    pub purchase_expiration: Option<i64>,
    pub referral_fee: Option<f64>,
    pub referral_account: Option<String>,
    pub accept_payment_delay: bool,
    pub no_offers: bool,
    pub pay_by_cc: bool,
    pub pay_by_bank: bool,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required(value: Option<String>, name: &str) -> Result<String, CheckoutError> {
    present(value).ok_or_else(|| CheckoutError::validation(format!("Missing required field: {}", name)))
}

impl CheckoutRequest {
    /// Check mandatory fields in a fixed order and report the first one missing.
    pub fn validate(self, defaults: &CheckoutDefaults) -> Result<ValidatedCheckout, CheckoutError> {
        let amount = self
            .amount
            .ok_or_else(|| CheckoutError::validation("Missing required field: amount"))?;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(CheckoutError::validation("amount must be a positive number"));
        }

        let currency = match self.currency {
            None => "USD".to_string(),
            some => required(some, "currency")?,
        };
        let user_id = required(self.user_id, "userId")?;
        let store_id = required(self.store_id, "storeId")?;
        let email_id = required(self.email_id, "emailId")?;
        let service_id = required(self.service_id, "serviceId")?;
        let merchant_account = present(self.merchant_account)
            .or_else(|| present(Some(defaults.merchant_account.clone())))
            .ok_or_else(|| CheckoutError::validation("Missing required field: merchantAccount"))?;

        Ok(ValidatedCheckout {
            amount,
            currency,
            user_id,
            store_id,
            service_id,
            email_id,
            merchant_account,
            signing_key_override: present(self.signing_key),
            additional_details: self.additional_details.unwrap_or_default(),
            callback_url: present(self.callback_url).unwrap_or_else(|| defaults.callback_url.clone()),
            success_url: present(self.success_url),
            failure_url: present(self.failure_url),
            options: PaymentOptions {
                thumbnail: self.thumbnail.unwrap_or_default(),
                title: self.title.unwrap_or_default(),
                kind: self.kind.unwrap_or_default(),
                success_message: self.success_message,
                distribution: self.distribution,
                purchase_expiration: self.purchase_expiration,
                referral_fee: self.referral_fee,
                referral_account: present(self.referral_account),
                accept_payment_delay: self.accept_payment_delay.unwrap_or(false),
                no_offers: self.no_offers.unwrap_or(false),
                pay_by_cc: self.pay_by_cc.unwrap_or(true),
                pay_by_bank: self.pay_by_bank.unwrap_or(true),
            },
        })
    }
}

impl ValidatedCheckout {
    /// `key=value; key=value` summary for the invoice's description field. The
    /// correlation identifiers are always included and win over same-named details.
    pub fn description(&self) -> String {
        let mut details = self.additional_details.clone();
        details.insert("user_id".into(), Value::from(self.user_id.clone()));
        details.insert("store_id".into(), Value::from(self.store_id.clone()));
        details.insert("emailId".into(), Value::from(self.email_id.clone()));
        details.insert("service_id".into(), Value::from(self.service_id.clone()));

        let mut entries: Vec<_> = details.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        entries
            .into_iter()
            .map(|(key, value)| match value {
                Value::String(s) => format!("{}={}", key, s),
                other => format!("{}={}", key, other),
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Payment-request payload handed to the network to obtain a checkout identifier.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub merchant_account: String,
    pub amount: f64,
    pub currency: String,
    pub reference: String,
    pub description: String,
    pub thumbnail: String,
    pub url: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_expiration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_fee: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution: Option<Value>,
    pub accept_payment_delay: bool,
    pub no_offers: bool,
    #[serde(rename = "payByCC")]
    pub pay_by_cc: bool,
    pub pay_by_bank: bool,
    #[serde(rename = "successURL")]
    pub success_url: String,
    #[serde(rename = "failureURL")]
    pub failure_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_message: Option<String>,
    pub submit_to_call_back: &'static str,
}

impl PaymentRequest {
    pub fn for_checkout(checkout: &ValidatedCheckout, reference: &str) -> Self {
        let options = &checkout.options;
        Self {
            merchant_account: checkout.merchant_account.clone(),
            amount: checkout.amount,
            currency: checkout.currency.clone(),
            reference: reference.to_string(),
            description: checkout.description(),
            thumbnail: options.thumbnail.clone(),
            url: checkout.callback_url.clone(),
            title: options.title.clone(),
            kind: options.kind.clone(),
            purchase_expiration: options.purchase_expiration,
            referral_fee: options.referral_fee,
            referral_account: options.referral_account.clone(),
            distribution: options.distribution.clone(),
            accept_payment_delay: options.accept_payment_delay,
            no_offers: options.no_offers,
            pay_by_cc: options.pay_by_cc,
            pay_by_bank: options.pay_by_bank,
            success_url: checkout.success_url.clone().unwrap_or_default(),
            failure_url: checkout.failure_url.clone().unwrap_or_default(),
            success_message: options.success_message.clone(),
            submit_to_call_back: "POST",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutCreated {
    pub checkout_id: String,
    pub redirect_url: String,
    pub qr_code_url: Option<String>,
    pub reference: String,
}
