use super::discount::DiscountSelection;
use super::money::{Money, Percent};
use super::pricing;
use super::transaction::{Transaction, TransactionStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Discount block of a payment request.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct RequestDiscount {
    pub r#type: String,
    pub value: Percent,
    pub peso: Money,
}

/// The request handed to the billing service's payment endpoint.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub reference_number: String,
    pub payment_amount: Money,
    pub discount: RequestDiscount,
}

impl PaymentRequest {
    /// Builds the request for `selection`, always from freshly derived figures.
    pub fn for_selection(transaction: &Transaction, selection: &DiscountSelection) -> Self {
        Self {
            reference_number: transaction.reference_number.clone(),
            payment_amount: pricing::expected_payment_amount(transaction, selection),
            discount: RequestDiscount {
                r#type: selection.wire_type().to_string(),
                value: pricing::discount_percent(selection),
                peso: pricing::discount_peso_amount(transaction.amount, selection),
            },
        }
    }
}

/// What the engine learned after an accepted payment.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOutcome {
    pub request: PaymentRequest,
    /// The canonical record re-read after submission, if it could be located.
    pub record: Option<Transaction>,
}

impl PaymentOutcome {
    /// Whether the billing service reports the transaction as settled, either by
    /// its status or by a zero balance.
    pub fn is_paid(&self) -> bool {
        self.record.as_ref().is_some_and(|record| {
            record.status == TransactionStatus::Paid || record.balance == Some(Money::ZERO)
        })
    }

    pub fn status(&self) -> Option<TransactionStatus> {
        self.record.as_ref().map(|record| record.status)
    }
}

/// One row of a batch of payments to apply.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct PaymentInstruction {
    pub reference: String,
    #[serde(default)]
    pub discount: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    /// Cash amount entered by hand; the pre-filled amount is used when empty.
    #[serde(default, deserialize_with = "exact_decimal")]
    pub amount: Option<Decimal>,
}

/// Parses the textual form directly so no value passes through a float.
fn exact_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(text) if !text.trim().is_empty() => text
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid amount '{text}': {e}"))),
        _ => Ok(None),
    }
}

impl PaymentInstruction {
    pub fn selection(&self) -> DiscountSelection {
        DiscountSelection::from_wire_text(
            self.discount.as_deref().unwrap_or_default(),
            self.value.as_deref(),
        )
    }
}
