use super::ledger;
use crate::domain::payment::PaymentRequest;
use crate::domain::ports::BillingService;
use crate::domain::transaction::Transaction;
use crate::error::{BillingError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory billing service.
///
/// Keeps transactions in snapshot order behind `Arc<RwLock<..>>`; clones share the
/// same records. Suitable for tests and one-off batch runs.
#[derive(Default, Clone)]
pub struct InMemoryBillingService {
    transactions: Arc<RwLock<Vec<Transaction>>>,
}

impl InMemoryBillingService {
    /// Creates a new, empty billing service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the service from a snapshot. Later duplicates of a reference number
    /// are dropped.
    pub fn with_transactions(records: impl IntoIterator<Item = Transaction>) -> Self {
        let mut transactions: Vec<Transaction> = Vec::new();
        for record in records {
            if transactions
                .iter()
                .any(|tx| tx.reference_number == record.reference_number)
            {
                tracing::warn!(
                    reference = %record.reference_number,
                    "Duplicate reference number in snapshot ignored"
                );
                continue;
            }
            transactions.push(record);
        }
        Self {
            transactions: Arc::new(RwLock::new(transactions)),
        }
    }
}

#[async_trait]
impl BillingService for InMemoryBillingService {
    async fn list_transactions(&self) -> Result<Vec<Transaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions.clone())
    }

    async fn submit_payment(&self, request: PaymentRequest) -> Result<()> {
        let mut transactions = self.transactions.write().await;
        let transaction = transactions
            .iter_mut()
            .find(|tx| tx.reference_number == request.reference_number)
            .ok_or_else(|| BillingError::TransactionNotFound(request.reference_number.clone()))?;
        ledger::post_payment(transaction, &request, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::discount::DiscountSelection;
    use crate::domain::money::Money;
    use crate::domain::transaction::TransactionStatus;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_in_memory_list_keeps_snapshot_order() {
        let service = InMemoryBillingService::with_transactions(vec![
            Transaction::new("B", Money::new(dec!(1))),
            Transaction::new("A", Money::new(dec!(2))),
            Transaction::new("B", Money::new(dec!(3))),
        ]);

        let records = service.list_transactions().await.unwrap();
        let references: Vec<&str> = records
            .iter()
            .map(|tx| tx.reference_number.as_str())
            .collect();
        assert_eq!(references, vec!["B", "A"]);
        assert_eq!(records[0].amount, Money::new(dec!(1)));
    }

    #[tokio::test]
    async fn test_in_memory_submit_payment() {
        let service = InMemoryBillingService::new();
        assert!(service.list_transactions().await.unwrap().is_empty());

        let service =
            InMemoryBillingService::with_transactions(vec![Transaction::new("A", Money::new(dec!(500)))]);
        let handle = service.clone();
        let snapshot = service.list_transactions().await.unwrap();
        let request = PaymentRequest::for_selection(&snapshot[0], &DiscountSelection::None);

        service.submit_payment(request).await.unwrap();

        let records = handle.list_transactions().await.unwrap();
        assert_eq!(records[0].status, TransactionStatus::Paid);
        assert_eq!(records[0].payments[0].amount, Money::new(dec!(500)));
        assert!(records[0].payments[0].payment_date.is_some());
    }

    #[tokio::test]
    async fn test_in_memory_submit_unknown_reference() {
        let service = InMemoryBillingService::new();
        let request = PaymentRequest::for_selection(
            &Transaction::new("GHOST", Money::new(dec!(1))),
            &DiscountSelection::None,
        );

        assert!(matches!(
            service.submit_payment(request).await,
            Err(BillingError::TransactionNotFound(reference)) if reference == "GHOST"
        ));
    }
}
