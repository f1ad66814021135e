pub mod callback;
pub mod checkout;
pub mod debug;
pub mod health;
pub mod status;
pub mod transactions;
pub mod verify;

pub use callback::*;
pub use checkout::*;
pub use debug::*;
pub use health::*;
pub use status::*;
pub use transactions::*;
pub use verify::*;

use crate::error::CheckoutError;
use serde::de::DeserializeOwned;

/// Parse a JSON request body, reporting malformed input as a validation failure
/// so it gets the same error envelope as every other rejection.
pub(crate) fn parse_json<T: DeserializeOwned>(body: &[u8], what: &str) -> Result<T, CheckoutError> {
    serde_json::from_slice(body).map_err(|e| CheckoutError::validation(format!("Invalid {}: {}", what, e)))
}
