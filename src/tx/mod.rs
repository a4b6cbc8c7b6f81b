//! Transaction building, signing and submission

mod envelope;
mod preflight;
mod receipt;
mod sender;

pub use envelope::{SignedTransaction, TransactionEnvelope};
pub use preflight::{run_preflight, PreflightReport};
pub use receipt::ReceiptWaiter;
pub use sender::{SendOptions, SendReport, TransactionSender};
