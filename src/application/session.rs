use crate::domain::discount::DiscountSelection;
use crate::domain::money::Money;
use crate::domain::payment::PaymentRequest;
use crate::domain::pricing::{self, PaymentQuote};
use crate::domain::transaction::Transaction;
use crate::error::{BillingError, Result};
use std::fmt;
use std::mem;

/// Observable phase of a payment session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentPhase {
    Idle,
    Selecting,
    Confirming,
    Submitting,
}

impl fmt::Display for PaymentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Selecting => "selecting a discount",
            Self::Confirming => "awaiting confirmation",
            Self::Submitting => "being submitted",
        })
    }
}

/// The discount and amount currently entered in the payment dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentDraft {
    pub selection: DiscountSelection,
    /// Cash amount field. Cleared (`None`) for a full waiver.
    pub amount_field: Option<Money>,
}

impl PaymentDraft {
    fn prefilled(transaction: &Transaction, selection: DiscountSelection) -> Self {
        Self {
            selection,
            amount_field: pricing::cash_due(transaction, &selection),
        }
    }

    /// The amount this draft would record.
    ///
    /// The field holds cash collected. For a full waiver the recorded amount is that
    /// cash plus the peso discount, so an empty field records the original amount.
    pub fn proposed_amount(&self, transaction: &Transaction) -> Money {
        let cash = self.amount_field.unwrap_or(Money::ZERO);
        if self.selection.is_full_waiver() {
            cash + pricing::discount_peso_amount(transaction.amount, &self.selection)
        } else {
            cash
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum PaymentState {
    Idle,
    Selecting(PaymentDraft),
    Confirming(PaymentDraft),
    Submitting(PaymentDraft),
}

/// State machine for one transaction's payment dialog.
///
/// `Idle -> Selecting -> Confirming -> Submitting`, after which the engine either
/// applies the outcome (back to `Idle`) or rejects it (back to `Selecting`).
#[derive(Debug, Clone)]
pub struct PaymentSession {
    transaction: Transaction,
    state: PaymentState,
}

impl PaymentSession {
    pub fn new(transaction: Transaction) -> Self {
        Self {
            transaction,
            state: PaymentState::Idle,
        }
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn reference(&self) -> &str {
        &self.transaction.reference_number
    }

    pub fn phase(&self) -> PaymentPhase {
        match self.state {
            PaymentState::Idle => PaymentPhase::Idle,
            PaymentState::Selecting(_) => PaymentPhase::Selecting,
            PaymentState::Confirming(_) => PaymentPhase::Confirming,
            PaymentState::Submitting(_) => PaymentPhase::Submitting,
        }
    }

    pub fn draft(&self) -> Option<&PaymentDraft> {
        match &self.state {
            PaymentState::Idle => None,
            PaymentState::Selecting(draft)
            | PaymentState::Confirming(draft)
            | PaymentState::Submitting(draft) => Some(draft),
        }
    }

    /// Figures for the current selection, or for no discount when idle.
    pub fn quote(&self) -> PaymentQuote {
        let selection = self.draft().map(|d| d.selection).unwrap_or_default();
        pricing::quote(&self.transaction, &selection)
    }

    /// Opens the dialog with no discount and the amount pre-filled.
    pub fn begin(&mut self) -> Result<()> {
        match self.state {
            PaymentState::Idle => {
                self.state = PaymentState::Selecting(PaymentDraft::prefilled(
                    &self.transaction,
                    DiscountSelection::None,
                ));
                Ok(())
            }
            PaymentState::Selecting(_) => Ok(()),
            _ => Err(self.invalid("open the payment dialog")),
        }
    }

    /// Changes the discount and re-fills the amount field from it.
    pub fn select_discount(&mut self, selection: DiscountSelection) -> Result<()> {
        let draft = PaymentDraft::prefilled(&self.transaction, selection);
        if let PaymentState::Selecting(current) = &mut self.state {
            *current = draft;
            return Ok(());
        }
        Err(self.invalid("change the discount"))
    }

    /// Attaching a supporting document waives the full amount.
    pub fn attach_waiver(&mut self) -> Result<()> {
        self.select_discount(DiscountSelection::waiver())
    }

    /// Overrides the cash amount field.
    pub fn set_amount(&mut self, amount: Option<Money>) -> Result<()> {
        if let PaymentState::Selecting(draft) = &mut self.state {
            draft.amount_field = amount;
            return Ok(());
        }
        Err(self.invalid("edit the amount"))
    }

    pub fn request_confirmation(&mut self) -> Result<()> {
        match mem::replace(&mut self.state, PaymentState::Idle) {
            PaymentState::Selecting(draft) => {
                self.state = PaymentState::Confirming(draft);
                Ok(())
            }
            other => {
                self.state = other;
                Err(self.invalid("request confirmation"))
            }
        }
    }

    pub fn cancel_confirmation(&mut self) -> Result<()> {
        match mem::replace(&mut self.state, PaymentState::Idle) {
            PaymentState::Confirming(draft) => {
                self.state = PaymentState::Selecting(draft);
                Ok(())
            }
            other => {
                self.state = other;
                Err(self.invalid("cancel confirmation"))
            }
        }
    }

    /// Closes the dialog, discarding the draft.
    pub fn close(&mut self) -> Result<()> {
        match self.state {
            PaymentState::Submitting(_) => Err(self.invalid("close the payment dialog")),
            _ => {
                self.state = PaymentState::Idle;
                Ok(())
            }
        }
    }

    /// Re-derives the expected amount and, if the draft agrees with it within
    /// `tolerance`, moves to `Submitting` and returns the request to send.
    ///
    /// A mismatch sends the session back to `Selecting`.
    pub(crate) fn confirm(&mut self, tolerance: Money) -> Result<PaymentRequest> {
        match mem::replace(&mut self.state, PaymentState::Idle) {
            PaymentState::Confirming(draft) => {
                let expected = pricing::expected_payment_amount(&self.transaction, &draft.selection);
                let proposed = draft.proposed_amount(&self.transaction);
                if proposed.within(expected, tolerance) {
                    let request = PaymentRequest::for_selection(&self.transaction, &draft.selection);
                    self.state = PaymentState::Submitting(draft);
                    Ok(request)
                } else {
                    tracing::debug!(
                        reference = %self.transaction.reference_number,
                        selection = %draft.selection,
                        %proposed,
                        %expected,
                        "Proposed payment does not match the expected amount"
                    );
                    self.state = PaymentState::Selecting(draft);
                    Err(BillingError::AmountMismatch { proposed, expected })
                }
            }
            PaymentState::Submitting(draft) => {
                self.state = PaymentState::Submitting(draft);
                Err(BillingError::ConcurrentSubmission(
                    self.transaction.reference_number.clone(),
                ))
            }
            other => {
                self.state = other;
                Err(self.invalid("submit the payment"))
            }
        }
    }

    /// The billing service refused the payment; the draft is kept for a retry.
    pub(crate) fn reject(&mut self) {
        if let PaymentState::Submitting(draft) = mem::replace(&mut self.state, PaymentState::Idle)
        {
            self.state = PaymentState::Selecting(draft);
        }
    }

    /// The payment was accepted. Ends the dialog and adopts the re-read record.
    pub(crate) fn finish(&mut self, record: Option<Transaction>) {
        self.state = PaymentState::Idle;
        if let Some(record) = record {
            self.transaction = record;
        }
    }

    fn invalid(&self, action: &'static str) -> BillingError {
        BillingError::InvalidTransition {
            action,
            phase: self.phase(),
        }
    }
}
