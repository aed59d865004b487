use super::session::PaymentSession;
use crate::config::EngineConfig;
use crate::domain::money::Money;
use crate::domain::payment::{PaymentInstruction, PaymentOutcome};
use crate::domain::ports::BillingServiceBox;
use crate::domain::transaction::Transaction;
use crate::error::{BillingError, Result};
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use tracing::{info, instrument, warn};

/// The main entry point for recording payments.
///
/// `ReconciliationEngine` gates every payment behind a fresh recomputation of the
/// expected amount, allows one submission per transaction at a time, and never
/// patches records locally: after each accepted payment it re-reads the billing
/// service's list.
pub struct ReconciliationEngine {
    billing: BillingServiceBox,
    config: EngineConfig,
    in_flight: Mutex<HashSet<String>>,
}

/// Releases a transaction's submission slot when dropped.
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<String>>,
    reference: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.reference);
    }
}

/// Keeps a session out of a stranded `Submitting` state when `submit` does not
/// run to completion, e.g. because its future was dropped.
///
/// Before the billing service accepts the payment the draft goes back to
/// `Selecting`; after, the dialog ends as it would on a failed re-read.
struct SubmissionGuard<'a> {
    session: &'a mut PaymentSession,
    accepted: bool,
    settled: bool,
}

impl<'a> SubmissionGuard<'a> {
    fn new(session: &'a mut PaymentSession) -> Self {
        Self {
            session,
            accepted: false,
            settled: false,
        }
    }

    fn reject(&mut self) {
        self.session.reject();
        self.settled = true;
    }

    fn finish(&mut self, record: Option<Transaction>) {
        self.session.finish(record);
        self.settled = true;
    }
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        if self.accepted {
            warn!(
                reference = %self.session.reference(),
                "Submission abandoned after the payment was accepted"
            );
            self.session.finish(None);
        } else {
            warn!(
                reference = %self.session.reference(),
                "Submission abandoned before the billing service answered"
            );
            self.session.reject();
        }
    }
}

impl ReconciliationEngine {
    /// Creates a new `ReconciliationEngine`.
    ///
    /// # Arguments
    ///
    /// * `billing` - The billing service that owns transactions and payments.
    /// * `config` - Engine settings, such as the amount tolerance.
    pub fn new(billing: BillingServiceBox, config: EngineConfig) -> Self {
        Self {
            billing,
            config,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The billing service's current transaction list.
    pub async fn transactions(&self) -> Result<Vec<Transaction>> {
        self.billing
            .list_transactions()
            .await
            .map_err(collaborator_failure)
    }

    /// Whether a payment for `reference` is currently being submitted.
    pub fn is_submitting(&self, reference: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(reference)
    }

    /// Opens the payment dialog for a transaction, from a fresh snapshot.
    #[instrument(skip(self))]
    pub async fn open_session(&self, reference: &str) -> Result<PaymentSession> {
        let record = self
            .transactions()
            .await?
            .into_iter()
            .find(|tx| tx.reference_number == reference)
            .ok_or_else(|| BillingError::TransactionNotFound(reference.to_string()))?;

        if !record.status.accepts_payments() {
            return Err(BillingError::NotPayable {
                reference: record.reference_number,
                status: record.status,
            });
        }

        let mut session = PaymentSession::new(record);
        session.begin()?;
        Ok(session)
    }

    /// Submits the payment of a session awaiting confirmation.
    ///
    /// Fails with `ConcurrentSubmission` if the same transaction already has a
    /// payment in flight and with `AmountMismatch` if the draft disagrees with the
    /// expected amount; neither reaches the billing service. A refused payment
    /// returns the session to `Selecting`; an accepted one ends it, even when the
    /// list cannot be re-read afterwards (`PaymentUnreconciled`).
    ///
    /// Dropping the returned future mid-flight leaves the session re-enterable.
    #[instrument(skip(self, session), fields(reference = %session.reference()))]
    pub async fn submit(&self, session: &mut PaymentSession) -> Result<PaymentOutcome> {
        let _slot = self.claim(session.reference())?;
        let request = session.confirm(self.config.tolerance)?;
        let mut submission = SubmissionGuard::new(session);

        if let Err(e) = self.billing.submit_payment(request.clone()).await {
            warn!(error = %e, "Billing service refused the payment");
            submission.reject();
            return Err(collaborator_failure(e));
        }
        submission.accepted = true;

        let records = match self.billing.list_transactions().await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "Payment accepted but the transaction list could not be re-read");
                submission.finish(None);
                return Err(BillingError::PaymentUnreconciled {
                    reference: request.reference_number,
                    message: e.to_string(),
                });
            }
        };

        let record = records
            .into_iter()
            .find(|tx| tx.reference_number == request.reference_number);
        if record.is_none() {
            warn!("Transaction missing from the billing service after payment");
        }
        submission.finish(record.clone());

        let outcome = PaymentOutcome { request, record };
        info!(
            amount = %outcome.request.payment_amount,
            discount = %outcome.request.discount.peso,
            paid = outcome.is_paid(),
            "Payment applied"
        );
        Ok(outcome)
    }

    /// Applies one batch instruction: opens the dialog, selects the discount,
    /// optionally overrides the cash amount, confirms and submits.
    #[instrument(skip(self, instruction), fields(reference = %instruction.reference))]
    pub async fn process_instruction(
        &self,
        instruction: PaymentInstruction,
    ) -> Result<PaymentOutcome> {
        let mut session = self.open_session(&instruction.reference).await?;
        session.select_discount(instruction.selection())?;
        if let Some(amount) = instruction.amount {
            session.set_amount(Some(Money::new(amount)))?;
        }
        session.request_confirmation()?;
        self.submit(&mut session).await
    }

    fn claim(&self, reference: &str) -> Result<InFlightGuard<'_>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(reference.to_string()) {
            warn!(reference, "Payment already in flight");
            return Err(BillingError::ConcurrentSubmission(reference.to_string()));
        }
        Ok(InFlightGuard {
            in_flight: &self.in_flight,
            reference: reference.to_string(),
        })
    }
}

fn collaborator_failure(error: BillingError) -> BillingError {
    match error {
        BillingError::CollaboratorFailure(_) => error,
        other => BillingError::CollaboratorFailure(other.to_string()),
    }
}
