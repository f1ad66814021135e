pub mod callback;
pub mod checkout;
pub mod invoice;
pub mod payment;
pub mod response;
pub mod transaction;
pub mod verification;

pub use callback::*;
pub use checkout::*;
pub use invoice::*;
pub use payment::*;
pub use response::*;
pub use transaction::*;
pub use verification::*;
