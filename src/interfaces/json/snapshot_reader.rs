use crate::domain::transaction::Transaction;
use crate::error::{BillingError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Deserialize)]
#[serde(untagged)]
enum Snapshot {
    Listing { records: Vec<serde_json::Value> },
    Records(Vec<serde_json::Value>),
}

/// Reads a transaction snapshot as returned by the billing service's listing
/// endpoint: `{"records": [...]}`, or a bare array of records.
pub struct SnapshotReader<R: Read> {
    source: R,
}

impl<R: Read> SnapshotReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    /// Parses the snapshot envelope and returns the records one by one.
    ///
    /// An unreadable envelope fails outright; an unreadable record yields a
    /// `MalformedRecord` error in its place.
    pub fn transactions(self) -> Result<impl Iterator<Item = Result<Transaction>>> {
        let records = match serde_json::from_reader(self.source)? {
            Snapshot::Listing { records } | Snapshot::Records(records) => records,
        };

        Ok(records.into_iter().enumerate().map(|(position, value)| {
            serde_json::from_value(value)
                .map_err(|e| BillingError::MalformedRecord(format!("record {position}: {e}")))
        }))
    }
}
