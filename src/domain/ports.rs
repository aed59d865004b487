use super::payment::PaymentRequest;
use super::transaction::Transaction;
use crate::error::Result;
use async_trait::async_trait;

/// The billing service that owns transactions and records payments.
///
/// The engine never writes records itself: it submits requests through this port
/// and re-reads the canonical list afterwards.
#[async_trait]
pub trait BillingService: Send + Sync {
    /// Returns the full transaction snapshot.
    async fn list_transactions(&self) -> Result<Vec<Transaction>>;

    /// Records a payment. Success means the payment was durably stored and the
    /// transaction's balance and status recomputed.
    async fn submit_payment(&self, request: PaymentRequest) -> Result<()>;
}

pub type BillingServiceBox = Box<dyn BillingService>;
