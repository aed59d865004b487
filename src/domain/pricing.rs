//! Pricing calculator.
//!
//! Pure derivations of the figures shown in the payment dialog. Nothing here
//! fails: partially loaded records simply contribute zero, and every function
//! returns the same output for the same input.

use super::discount::DiscountSelection;
use super::money::{Money, Percent};
use super::transaction::{LineItem, Transaction};
use std::collections::HashMap;

/// One display row of identical line items.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItemGroup {
    pub section: String,
    pub r#type: String,
    pub range: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub total: Money,
}

/// Everything the payment dialog displays for a transaction and a discount.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentQuote {
    pub subtotal: Money,
    pub line_items: Vec<LineItemGroup>,
    pub outstanding_balance: Money,
    pub discount_percent: Percent,
    pub discount_amount: Money,
    pub total_after_discount: Money,
    pub expected_payment: Money,
    /// Pre-filled cash amount; `None` when the field is cleared for a full waiver.
    pub cash_due: Option<Money>,
}

/// Sum of all line item prices.
pub fn line_item_subtotal(transaction: &Transaction) -> Money {
    transaction.line_items.iter().map(|item| item.price).sum()
}

/// Cash collected across the payment history.
pub fn amount_paid(transaction: &Transaction) -> Money {
    transaction.payments.iter().map(|p| p.amount).sum()
}

/// Peso discounts granted across the payment history.
pub fn amount_discounted(transaction: &Transaction) -> Money {
    transaction.payments.iter().map(|p| p.discount_amount()).sum()
}

/// Amount still owed, derived from the authoritative `amount`.
///
/// Always within `[0, amount]`.
pub fn outstanding_balance(transaction: &Transaction) -> Money {
    let settled: Money = transaction
        .payments
        .iter()
        .map(|p| p.settled_amount())
        .sum();
    (transaction.amount - settled).clamp_to(transaction.amount)
}

/// Groups identical line items, keeping first-seen order.
pub fn grouped_line_items(transaction: &Transaction) -> Vec<LineItemGroup> {
    let mut groups: Vec<LineItemGroup> = Vec::new();
    let mut index: HashMap<(&str, &str, &str, Money), usize> = HashMap::new();

    for item in &transaction.line_items {
        let key = group_key(item);
        if let Some(&position) = index.get(&key) {
            let group = &mut groups[position];
            group.quantity += 1;
            group.total = group.unit_price * group.quantity;
        } else {
            index.insert(key, groups.len());
            groups.push(LineItemGroup {
                section: item.section.clone(),
                r#type: item.r#type.clone(),
                range: item.range.clone(),
                unit_price: item.price,
                quantity: 1,
                total: item.price,
            });
        }
    }

    groups
}

fn group_key(item: &LineItem) -> (&str, &str, &str, Money) {
    (&item.section, &item.r#type, &item.range, item.price)
}

pub fn discount_percent(selection: &DiscountSelection) -> Percent {
    selection.percent()
}

/// Peso value of the discount on `base`, which must be the transaction's original
/// amount rather than its running balance.
pub fn discount_peso_amount(base: Money, selection: &DiscountSelection) -> Money {
    base.percent(discount_percent(selection))
}

pub fn total_after_discount(transaction: &Transaction, selection: &DiscountSelection) -> Money {
    transaction.amount - discount_peso_amount(transaction.amount, selection)
}

/// The amount a payment must be recorded with for this selection.
///
/// A full waiver still records the original amount, covered by the peso discount.
pub fn expected_payment_amount(transaction: &Transaction, selection: &DiscountSelection) -> Money {
    if discount_percent(selection).is_full() {
        transaction.amount
    } else {
        total_after_discount(transaction, selection)
    }
}

/// Value pre-filled into the cash amount field.
pub fn cash_due(transaction: &Transaction, selection: &DiscountSelection) -> Option<Money> {
    if selection.is_full_waiver() {
        None
    } else {
        Some(expected_payment_amount(transaction, selection))
    }
}

pub fn quote(transaction: &Transaction, selection: &DiscountSelection) -> PaymentQuote {
    PaymentQuote {
        subtotal: line_item_subtotal(transaction),
        line_items: grouped_line_items(transaction),
        outstanding_balance: outstanding_balance(transaction),
        discount_percent: discount_percent(selection),
        discount_amount: discount_peso_amount(transaction.amount, selection),
        total_after_discount: total_after_discount(transaction, selection),
        expected_payment: expected_payment_amount(transaction, selection),
        cash_due: cash_due(transaction, selection),
    }
}
