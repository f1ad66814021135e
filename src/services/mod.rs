pub mod cache;
pub mod checkout;
pub mod dropp;
pub mod mirror;
pub mod reconciler;
pub mod records;
pub mod signing;
pub mod status;
pub mod txid;
pub mod verification;

pub use cache::CacheService;
pub use checkout::CheckoutService;
pub use dropp::{DroppClient, PaymentNetwork};
pub use mirror::{ChainVerifier, MirrorNodeClient};
pub use reconciler::CallbackService;
pub use records::{HttpRecordStore, TransactionRecords};
pub use signing::MerchantKey;
pub use status::StatusService;
pub use verification::VerificationService;

use crate::error::CheckoutError;

/// Run a non-critical side effect: failures are logged and swallowed so they
/// never change an outcome that has already been decided.
pub fn best_effort<T>(result: Result<T, CheckoutError>, operation: &str, reference: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(reference, operation, failure = "best_effort", "{}", e);
            None
        }
    }
}
