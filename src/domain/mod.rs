//! Domain layer: billing records, money, discounts and the pricing calculator.

pub mod discount;
pub mod money;
pub mod payment;
pub mod ports;
pub mod pricing;
pub mod transaction;
