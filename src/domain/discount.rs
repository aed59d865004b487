use super::money::Percent;
use rust_decimal::Decimal;
use std::fmt;

/// Wire value for "no discount".
pub const NO_DISCOUNT: &str = "N/A";
/// Wire value for a free-form percentage.
pub const CUSTOM_DISCOUNT: &str = "custom";

/// The preset discount tiers offered in the payment dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscountTier {
    Five,
    Ten,
    Fifteen,
    Twenty,
}

impl DiscountTier {
    pub const ALL: [DiscountTier; 4] = [Self::Five, Self::Ten, Self::Fifteen, Self::Twenty];

    pub fn percent(&self) -> Percent {
        Percent::clamped(Decimal::from(self.points()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Five => "5",
            Self::Ten => "10",
            Self::Fifteen => "15",
            Self::Twenty => "20",
        }
    }

    fn points(&self) -> u32 {
        match self {
            Self::Five => 5,
            Self::Ten => 10,
            Self::Fifteen => 15,
            Self::Twenty => 20,
        }
    }

    fn from_wire(kind: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tier| tier.as_str() == kind)
    }
}

/// The discount chosen for one payment attempt.
///
/// Only the wire form is string-typed; `from_wire` and `wire_type` are the sole
/// conversion points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DiscountSelection {
    #[default]
    None,
    FixedTier(DiscountTier),
    Custom(Percent),
}

impl DiscountSelection {
    /// A custom percentage, clamped into `[0, 100]`.
    pub fn custom(value: Decimal) -> Self {
        Self::Custom(Percent::clamped(value))
    }

    /// The full waiver, as selected when a supporting document is attached.
    pub fn waiver() -> Self {
        Self::Custom(Percent::FULL)
    }

    /// Builds a selection from the dialog's `(type, value)` pair.
    ///
    /// Unknown types fall back to no discount. A custom value that is absent or
    /// non-numeric counts as zero.
    pub fn from_wire(kind: &str, value: Option<Decimal>) -> Self {
        let kind = kind.trim();
        if kind.is_empty() || kind.eq_ignore_ascii_case(NO_DISCOUNT) {
            return Self::None;
        }
        if kind.eq_ignore_ascii_case(CUSTOM_DISCOUNT) {
            return Self::custom(value.unwrap_or(Decimal::ZERO));
        }
        match DiscountTier::from_wire(kind) {
            Some(tier) => Self::FixedTier(tier),
            None => {
                tracing::warn!(kind, "Unknown discount type, applying no discount");
                Self::None
            }
        }
    }

    /// Like `from_wire`, with the value still in its textual form.
    pub fn from_wire_text(kind: &str, value: Option<&str>) -> Self {
        let value = value.and_then(|v| v.trim().parse::<Decimal>().ok());
        Self::from_wire(kind, value)
    }

    pub fn wire_type(&self) -> &'static str {
        match self {
            Self::None => NO_DISCOUNT,
            Self::FixedTier(tier) => tier.as_str(),
            Self::Custom(_) => CUSTOM_DISCOUNT,
        }
    }

    pub fn percent(&self) -> Percent {
        match self {
            Self::None => Percent::ZERO,
            Self::FixedTier(tier) => tier.percent(),
            Self::Custom(percent) => *percent,
        }
    }

    /// Whether the selection waives the whole billed amount.
    pub fn is_full_waiver(&self) -> bool {
        self.percent().is_full()
    }
}

impl fmt::Display for DiscountSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str(NO_DISCOUNT),
            Self::FixedTier(tier) => write!(f, "{}", tier.percent()),
            Self::Custom(percent) => write!(f, "custom {percent}"),
        }
    }
}
