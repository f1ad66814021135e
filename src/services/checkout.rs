use crate::{
    error::CheckoutError,
    models::{
        CheckoutCreated, CheckoutDefaults, CheckoutRequest, NewTransaction, PaymentRequest, PaymentStatus,
        TransactionPatch, ValidatedCheckout,
    },
    services::{best_effort, dropp::PaymentNetwork, records::TransactionRecords},
};
use std::sync::Arc;

const FALLBACK_CHECKOUT_LINK: &str = "https://dropp.app.link/checkouts";

/// Creates the record and the payment-network checkout behind one storefront purchase.
pub struct CheckoutService {
    records: Arc<dyn TransactionRecords>,
    network: Arc<dyn PaymentNetwork>,
    defaults: CheckoutDefaults,
}

fn new_transaction(checkout: &ValidatedCheckout) -> NewTransaction {
    NewTransaction {
        merchant_account: checkout.merchant_account.clone(),
        signing_key: checkout.signing_key_override.clone(),
        payment_status: PaymentStatus::Initiated,
        created_at: chrono::Utc::now(),
        success_url: checkout.success_url.clone(),
        failure_url: checkout.failure_url.clone(),
        user_id: checkout.user_id.clone(),
        amount: checkout.amount,
        currency: checkout.currency.clone(),
        service_id: checkout.service_id.clone(),
        store_id: checkout.store_id.clone(),
        email_id: checkout.email_id.clone(),
        payment_method: "dropp",
        title: Some(checkout.options.title.clone()).filter(|t| !t.is_empty()),
        kind: Some(checkout.options.kind.clone()).filter(|k| !k.is_empty()),
        additional_details: checkout.additional_details.clone(),
        success_message: checkout.options.success_message.clone(),
    }
}

impl CheckoutService {
    pub fn new(
        records: Arc<dyn TransactionRecords>,
        network: Arc<dyn PaymentNetwork>,
        defaults: CheckoutDefaults,
    ) -> Self {
        Self {
            records,
            network,
            defaults,
        }
    }

    pub async fn create_checkout(&self, request: CheckoutRequest) -> Result<CheckoutCreated, CheckoutError> {
        let checkout = request.validate(&self.defaults)?;

        // The reference comes from the record, so nothing can proceed without it.
        let created = self.records.create_transaction(&new_transaction(&checkout)).await?;
        let reference = match created.transaction_id {
            Some(reference) if created.ok => reference,
            _ => {
                return Err(CheckoutError::dependency(
                    "record store did not create the transaction",
                ))
            }
        };

        tracing::info!(
            reference = %reference,
            merchant = %checkout.merchant_account,
            amount = checkout.amount,
            currency = %checkout.currency,
            "Transaction record created"
        );

        let payment_request = PaymentRequest::for_checkout(&checkout, &reference);
        let response = self.network.generate_checkout(&payment_request).await?;

        if !response.is_success() {
            return Err(CheckoutError::UpstreamRejected {
                code: response.response_code,
                message: response
                    .first_error()
                    .unwrap_or("Failed to generate checkout UUID")
                    .to_string(),
            });
        }
        let checkout_id = response
            .checkout_uuid()
            .ok_or_else(|| CheckoutError::UpstreamRejected {
                code: response.response_code,
                message: "payment network returned no checkout identifier".to_string(),
            })?
            .to_string();
        let link = response.checkout_link().map(str::to_string);

        let patch = TransactionPatch {
            payment_link: link.clone(),
            payment_id: Some(checkout_id.clone()),
            ..TransactionPatch::status(PaymentStatus::DroppCheckoutCreated)
        };
        if let Some(updated) = best_effort(
            self.records.update_transaction(&reference, &patch).await,
            "checkout_created",
            &reference,
        ) {
            if !updated.ok {
                tracing::warn!(reference = %reference, failure = "best_effort", "Record store did not accept checkout details");
            }
        }

        let redirect_url = link
            .clone()
            .unwrap_or_else(|| format!("{}/{}?uuid={}", FALLBACK_CHECKOUT_LINK, checkout_id, checkout_id));

        tracing::info!(reference = %reference, checkout_id = %checkout_id, "Checkout created");

        Ok(CheckoutCreated {
            checkout_id,
            redirect_url,
            qr_code_url: link,
            reference,
        })
    }
}
