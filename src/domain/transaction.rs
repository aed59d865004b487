use super::money::{Money, Percent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a reservation, as reported by the billing service.
#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    #[default]
    Unpaid,
    PartiallyPaid,
    Paid,
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::PartiallyPaid => "partially_paid",
            Self::Paid => "paid",
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether a new payment may be recorded against a transaction in this status.
    pub fn accepts_payments(&self) -> bool {
        !matches!(self, Self::Paid | Self::Cancelled)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    /// Case-insensitive; `-` and spaces are accepted in place of `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "unpaid" => Ok(Self::Unpaid),
            "partially_paid" => Ok(Self::PartiallyPaid),
            "paid" => Ok(Self::Paid),
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(format!("unknown transaction status '{s}'")),
        }
    }
}

impl<'de> Deserialize<'de> for TransactionStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One billable sample or piece of equipment on a transaction.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct LineItem {
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub r#type: String,
    #[serde(default)]
    pub range: String,
    #[serde(default)]
    pub price: Money,
}

/// Discount recorded alongside a payment.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDiscount {
    #[serde(default)]
    pub r#type: String,
    #[serde(default)]
    pub value: Percent,
    #[serde(default)]
    pub peso_amount: Money,
}

/// A payment recorded by the billing service.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Cash portion actually collected.
    #[serde(default)]
    pub amount: Money,
    #[serde(default)]
    pub payment_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub discount: Option<PaymentDiscount>,
}

impl Payment {
    /// Peso value of the discount applied with this payment, zero if none.
    pub fn discount_amount(&self) -> Money {
        self.discount
            .as_ref()
            .map(|d| d.peso_amount)
            .unwrap_or(Money::ZERO)
    }

    /// Amount this payment settles: cash collected plus discount.
    pub fn settled_amount(&self) -> Money {
        self.amount + self.discount_amount()
    }
}

/// A billable reservation as returned by the billing service.
///
/// The engine only ever reads these snapshots; `payments`, `amount`, `status` and
/// `balance` are owned by the billing service.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub reference_number: String,
    #[serde(default)]
    pub client_name: String,
    /// Authoritative total owed. Not derived from the line items.
    #[serde(default)]
    pub amount: Money,
    #[serde(default)]
    pub status: TransactionStatus,
    #[serde(default, alias = "samples")]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub payments: Vec<Payment>,
    /// Outstanding amount as last computed by the billing service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<Money>,
}

impl Transaction {
    pub fn new(reference_number: impl Into<String>, amount: Money) -> Self {
        Self {
            reference_number: reference_number.into(),
            amount,
            ..Default::default()
        }
    }
}
