use crate::{
    error::CheckoutError,
    models::{CallbackOutcome, DroppResponse, PaymentStatus, PromiseToPay, RecordUpdated, TransactionPatch},
    services::{
        best_effort,
        dropp::PaymentNetwork,
        records::TransactionRecords,
        signing::MerchantKey,
        txid::extract_transaction_id,
        verification::VerificationService,
    },
};
use chrono::Utc;
use std::sync::Arc;

/// Turns a wallet callback into a settled (or failed) payment and a record update.
///
/// GET and POST callbacks both land in [`CallbackService::handle_callback`]; the
/// transports differ only in how the proof is carried.
pub struct CallbackService {
    records: Arc<dyn TransactionRecords>,
    network: Arc<dyn PaymentNetwork>,
    default_key: MerchantKey,
    verification: Option<Arc<VerificationService>>,
}

impl CallbackService {
    pub fn new(
        records: Arc<dyn TransactionRecords>,
        network: Arc<dyn PaymentNetwork>,
        default_key: MerchantKey,
    ) -> Self {
        Self {
            records,
            network,
            default_key,
            verification: None,
        }
    }

    /// Verify settled payments against the ledger before finalising the record.
    pub fn with_verification(mut self, verification: Arc<VerificationService>) -> Self {
        self.verification = Some(verification);
        self
    }

    /// The record store's per-transaction key wins over the process default.
    fn signing_key(&self, record: Option<&RecordUpdated>, reference: &str) -> MerchantKey {
        let Some(stored) = record.and_then(|r| r.signing_key.as_deref()) else {
            return self.default_key.clone();
        };
        match stored.parse::<MerchantKey>() {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(reference, "Stored signing key is unusable, using default: {}", e);
                self.default_key.clone()
            }
        }
    }

    pub async fn handle_callback(&self, proof: PromiseToPay) -> Result<CallbackOutcome, CheckoutError> {
        proof.validate()?;
        let invoice = proof.decode_invoice()?;
        let reference = invoice.reference.clone();
        let checkout_id = invoice
            .qr_code_uuid
            .clone()
            .or_else(|| proof.checkout_id.clone());

        tracing::info!(
            reference = %reference,
            payer = %proof.payer,
            checkout_id = ?checkout_id,
            amount = invoice.amount,
            currency = %invoice.currency,
            "Wallet callback received"
        );

        // A status-free patch attaches the proof and reads back the stored
        // state, redirect targets and signing key for this reference.
        let lookup = TransactionPatch {
            p2p_data: serde_json::to_value(&proof).ok(),
            invoice_data: serde_json::to_value(&invoice).ok(),
            updated_at: Some(Utc::now()),
            ..Default::default()
        };
        let record = best_effort(
            self.records.update_transaction(&reference, &lookup).await,
            "record_lookup",
            &reference,
        )
        .filter(|updated| {
            if !updated.ok {
                tracing::warn!(reference = %reference, failure = "best_effort", "Record store rejected callback lookup");
            }
            updated.ok
        });
        let stored = record.as_ref().and_then(RecordUpdated::current_status);

        if stored.map_or(true, |s| s.can_transition_to(PaymentStatus::PaymentReceived)) {
            best_effort(
                self.records
                    .update_transaction(&reference, &TransactionPatch::status(PaymentStatus::PaymentReceived))
                    .await,
                "payment_received",
                &reference,
            );
        } else {
            tracing::info!(reference = %reference, status = ?stored, "Callback for an already finalised transaction");
        }

        let signing_key = self.signing_key(record.as_ref(), &reference);

        let (response, mut error) = match self.network.submit(&proof, &signing_key).await {
            Ok(response) if response.is_success() => (Some(response), None),
            Ok(response) => {
                let message = response
                    .first_error()
                    .unwrap_or("Payment rejected by payment network")
                    .to_string();
                (Some(response), Some(message))
            }
            Err(e) => {
                tracing::error!(reference = %reference, "Payment submission failed: {}", e);
                (None, Some(format!("Payment processing failed: {}", e)))
            }
        };
        // A replayed proof may be rejected once the first delivery settled.
        let replay_rejected = stored == Some(PaymentStatus::Completed) && error.is_some();
        if replay_rejected {
            tracing::info!(reference = %reference, rejection = ?error, "Replayed proof rejected for a settled payment");
            error = None;
        }
        let is_success = error.is_none();

        let extracted = extract_transaction_id(&proof, response.as_ref());
        let chain_id = extracted
            .as_ref()
            .filter(|tx| tx.is_chain_id())
            .map(|tx| tx.id.clone());

        let verification = match (&self.verification, &chain_id) {
            (Some(verifier), Some(id)) if is_success && !replay_rejected => {
                best_effort(verifier.verify(id).await, "verify_on_callback", &reference)
            }
            _ => None,
        };

        let payment_response = response
            .as_ref()
            .and_then(|r| serde_json::to_value(r).ok());
        let finalised = if is_success {
            TransactionPatch {
                payment_response,
                hedera_transaction_id: chain_id.clone(),
                hedera_verified: verification.as_ref().map(|v| v.is_chain_verified()),
                hedera_verification_data: verification.as_ref().and_then(|v| v.data.clone()),
                ..TransactionPatch::status(PaymentStatus::Completed)
            }
        } else {
            TransactionPatch {
                payment_response,
                error: error.clone(),
                ..TransactionPatch::status(PaymentStatus::Failed)
            }
        };
        let next = if is_success { PaymentStatus::Completed } else { PaymentStatus::Failed };
        if replay_rejected || !stored.map_or(true, |s| s.can_transition_to(next)) {
            tracing::info!(reference = %reference, status = ?stored, attempted = %next, "Keeping stored status");
        } else {
            best_effort(
                self.records.update_transaction(&reference, &finalised).await,
                next.as_str(),
                &reference,
            );
        }

        tracing::info!(
            reference = %reference,
            is_success,
            hedera_transaction_id = ?chain_id,
            "Callback reconciled"
        );

        let redirect_target = record.as_ref().and_then(|r| {
            if is_success {
                r.success_url.clone()
            } else {
                r.failure_url.clone()
            }
        });

        Ok(CallbackOutcome {
            is_success,
            payment_status: if is_success { "success" } else { "failed" },
            checkout_id,
            amount: invoice.amount,
            currency: invoice.currency.clone(),
            payer: proof.payer.clone(),
            payment_ref: response.as_ref().and_then(DroppResponse::payment_ref).map(str::to_string),
            transaction_reference: response
                .as_ref()
                .and_then(DroppResponse::transaction_reference)
                .map(str::to_string),
            hedera_transaction_id: extracted.map(|tx| tx.id),
            error,
            verification,
            invoice_data: invoice,
            payment_response: response,
            reference,
            redirect_target,
        })
    }
}
