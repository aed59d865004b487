use crate::domain::pricing;
use crate::domain::transaction::{Transaction, TransactionStatus};
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

const HEADER: [&str; 7] = [
    "reference",
    "client",
    "amount",
    "paid",
    "discounted",
    "balance",
    "status",
];

#[derive(Serialize)]
struct StatementRow<'a> {
    reference: &'a str,
    client: &'a str,
    amount: Decimal,
    paid: Decimal,
    discounted: Decimal,
    balance: Decimal,
    status: TransactionStatus,
}

impl<'a> From<&'a Transaction> for StatementRow<'a> {
    fn from(tx: &'a Transaction) -> Self {
        Self {
            reference: &tx.reference_number,
            client: &tx.client_name,
            amount: tx.amount.normalize().value(),
            paid: pricing::amount_paid(tx).normalize().value(),
            discounted: pricing::amount_discounted(tx).normalize().value(),
            balance: pricing::outstanding_balance(tx).normalize().value(),
            status: tx.status,
        }
    }
}

/// Writes the reconciled state of each transaction as CSV.
pub struct StatementWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> StatementWriter<W> {
    pub fn new(destination: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(destination);
        Self { writer }
    }

    /// Writes the header followed by one row per transaction.
    pub fn write_statements<'a>(
        &mut self,
        transactions: impl IntoIterator<Item = &'a Transaction>,
    ) -> Result<()> {
        self.writer.write_record(HEADER)?;
        for tx in transactions {
            self.writer.serialize(StatementRow::from(tx))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
