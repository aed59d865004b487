//! Posting rules of the local billing service.
//!
//! These run on the billing-service side of the port: they are how the bundled
//! adapters record a payment and recompute a transaction, never called by the
//! engine itself.

use crate::domain::discount::NO_DISCOUNT;
use crate::domain::payment::PaymentRequest;
use crate::domain::pricing;
use crate::domain::transaction::{Payment, PaymentDiscount, Transaction, TransactionStatus};
use crate::error::{BillingError, Result};
use chrono::{DateTime, Utc};

/// Records `request` against `transaction`.
///
/// The discount and cash portions are capped by the outstanding balance, so the
/// recorded payments never exceed the billed amount.
pub fn post_payment(
    transaction: &mut Transaction,
    request: &PaymentRequest,
    paid_at: DateTime<Utc>,
) -> Result<()> {
    if !transaction.status.accepts_payments() {
        return Err(BillingError::NotPayable {
            reference: transaction.reference_number.clone(),
            status: transaction.status,
        });
    }

    let balance = pricing::outstanding_balance(transaction);
    let discount = request.discount.peso.clamp_to(balance);
    let cash = request.payment_amount.clamp_to(balance - discount);

    let discount = if request.discount.r#type == NO_DISCOUNT {
        None
    } else {
        Some(PaymentDiscount {
            r#type: request.discount.r#type.clone(),
            value: request.discount.value,
            peso_amount: discount,
        })
    };

    transaction.payments.push(Payment {
        amount: cash,
        payment_date: Some(paid_at),
        discount,
    });
    reconcile(transaction);
    Ok(())
}

/// Refreshes the cached balance and advances the status from it.
///
/// A zero balance means `paid`; an unpaid transaction with payments becomes
/// `partially_paid`. Work statuses such as `in_progress` are left alone until paid.
pub fn reconcile(transaction: &mut Transaction) {
    let balance = pricing::outstanding_balance(transaction);
    transaction.balance = Some(balance);

    if balance.is_zero() {
        transaction.status = TransactionStatus::Paid;
    } else if transaction.status == TransactionStatus::Unpaid && !transaction.payments.is_empty()
    {
        transaction.status = TransactionStatus::PartiallyPaid;
    }
}
