use crate::domain::money::Money;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Default currency-rounding tolerance between a proposed and an expected payment.
pub const DEFAULT_TOLERANCE: Decimal = dec!(0.01);

/// Runtime settings of the reconciliation engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Largest accepted difference between proposed and expected payment amounts.
    pub tolerance: Money,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tolerance: Money::new(DEFAULT_TOLERANCE),
        }
    }
}

impl EngineConfig {
    /// Negative tolerances are treated as zero.
    pub fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = Money::new(tolerance.max(Decimal::ZERO));
        self
    }
}
