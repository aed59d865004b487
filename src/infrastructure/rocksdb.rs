use super::ledger;
use crate::domain::payment::PaymentRequest;
use crate::domain::ports::BillingService;
use crate::domain::transaction::Transaction;
use crate::error::{BillingError, Result};
use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing transactions, keyed by reference number.
pub const CF_TRANSACTIONS: &str = "transactions";

/// A persistent billing service backed by RocksDB.
///
/// Records are stored as JSON so a ledger survives between runs. `Clone` shares
/// the underlying `Arc<DB>`; payment posting is serialized by a write lock.
#[derive(Clone)]
pub struct RocksDBBillingService {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBBillingService {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the database will be stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_transactions = ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_transactions])?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Stores every record whose reference number is not yet known.
    ///
    /// Existing records are never overwritten: they carry the payments of earlier
    /// runs. Returns the number of records added.
    pub fn seed(&self, records: impl IntoIterator<Item = Transaction>) -> Result<usize> {
        let mut added = 0;
        for record in records {
            if self.get(&record.reference_number)?.is_none() {
                self.put(&record)?;
                added += 1;
            }
        }
        Ok(added)
    }

    fn cf(&self) -> Result<&ColumnFamily> {
        self.db.cf_handle(CF_TRANSACTIONS).ok_or_else(|| {
            BillingError::IoError(std::io::Error::other(
                "Transactions column family not found",
            ))
        })
    }

    fn get(&self, reference: &str) -> Result<Option<Transaction>> {
        match self.db.get_cf(self.cf()?, reference.as_bytes())? {
            Some(bytes) => decode(reference, &bytes).map(Some),
            None => Ok(None),
        }
    }

    fn put(&self, transaction: &Transaction) -> Result<()> {
        let value = serde_json::to_vec(transaction)?;
        self.db
            .put_cf(self.cf()?, transaction.reference_number.as_bytes(), value)?;
        Ok(())
    }
}

fn decode(reference: &str, bytes: &[u8]) -> Result<Transaction> {
    serde_json::from_slice(bytes)
        .map_err(|e| BillingError::MalformedRecord(format!("{reference}: {e}")))
}

#[async_trait]
impl BillingService for RocksDBBillingService {
    async fn list_transactions(&self) -> Result<Vec<Transaction>> {
        let mut transactions = Vec::new();
        for item in self.db.iterator_cf(self.cf()?, rocksdb::IteratorMode::Start) {
            let (key, value) = item?;
            let reference = String::from_utf8_lossy(&key);
            transactions.push(decode(&reference, &value)?);
        }
        Ok(transactions)
    }

    async fn submit_payment(&self, request: PaymentRequest) -> Result<()> {
        let _write = self.write_lock.lock().await;
        let mut transaction = self
            .get(&request.reference_number)?
            .ok_or_else(|| BillingError::TransactionNotFound(request.reference_number.clone()))?;
        ledger::post_payment(&mut transaction, &request, Utc::now())?;
        self.put(&transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::discount::{DiscountSelection, DiscountTier};
    use crate::domain::money::Money;
    use crate::domain::transaction::TransactionStatus;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBBillingService::open(dir.path()).expect("Failed to open RocksDB");
        assert!(store.db.cf_handle(CF_TRANSACTIONS).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_seed_does_not_overwrite() {
        let dir = tempdir().unwrap();
        let store = RocksDBBillingService::open(dir.path()).unwrap();

        let added = store
            .seed(vec![Transaction::new("A", Money::new(dec!(1000)))])
            .unwrap();
        assert_eq!(added, 1);

        let snapshot = store.list_transactions().await.unwrap();
        let request = PaymentRequest::for_selection(
            &snapshot[0],
            &DiscountSelection::FixedTier(DiscountTier::Five),
        );
        store.submit_payment(request).await.unwrap();

        let added = store
            .seed(vec![
                Transaction::new("A", Money::new(dec!(1000))),
                Transaction::new("B", Money::new(dec!(50))),
            ])
            .unwrap();
        assert_eq!(added, 1);

        let records = store.list_transactions().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].reference_number, "A");
        assert_eq!(records[0].status, TransactionStatus::Paid);
        assert_eq!(records[0].payments[0].amount, Money::new(dec!(950)));
    }

    #[tokio::test]
    async fn test_rocksdb_submit_unknown_reference() {
        let dir = tempdir().unwrap();
        let store = RocksDBBillingService::open(dir.path()).unwrap();
        let request = PaymentRequest::for_selection(
            &Transaction::new("GHOST", Money::new(dec!(1))),
            &DiscountSelection::None,
        );

        assert!(matches!(
            store.submit_payment(request).await,
            Err(BillingError::TransactionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_rocksdb_keeps_exact_amounts() {
        let dir = tempdir().unwrap();
        let amount = Money::new(dec!(1234567890123456.78));
        {
            let store = RocksDBBillingService::open(dir.path()).unwrap();
            store
                .seed(vec![Transaction::new("A", amount)])
                .unwrap();
        }

        let store = RocksDBBillingService::open(dir.path()).unwrap();
        let records = store.list_transactions().await.unwrap();
        assert_eq!(records[0].amount, amount);
    }
}
