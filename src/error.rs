use crate::application::session::PaymentPhase;
use crate::domain::money::Money;
use crate::domain::transaction::TransactionStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Payment amount {proposed} does not match the expected amount {expected}")]
    AmountMismatch { proposed: Money, expected: Money },
    #[error("A payment for {0} is already being submitted")]
    ConcurrentSubmission(String),
    #[error("Billing service failure: {0}")]
    CollaboratorFailure(String),
    #[error(
        "Payment for {reference} was recorded, but the transaction list could not be re-read: {message}"
    )]
    PaymentUnreconciled { reference: String, message: String },
    #[error("Malformed record: {0}")]
    MalformedRecord(String),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),
    #[error("Transaction {reference} is {status} and accepts no further payments")]
    NotPayable {
        reference: String,
        status: TransactionStatus,
    },
    #[error("Cannot {action} while the payment is {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: PaymentPhase,
    },
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    StorageError(#[from] rocksdb::Error),
}

pub type Result<T> = std::result::Result<T, BillingError>;
