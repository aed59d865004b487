use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

/// Number of decimal places of the currency minor unit.
pub const MONEY_SCALE: u32 = 2;

/// Represents a monetary value in the billing currency.
///
/// This is a wrapper around `rust_decimal::Decimal` so that amounts, balances and
/// discounts cannot be mixed up with percentages. Arithmetic saturates at the
/// `Decimal` bounds instead of panicking. Amounts travel as JSON numbers when a
/// float holds them exactly, as decimal strings otherwise, and are read
/// leniently: a missing or non-numeric value is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Clamps the value into `[0, ceiling]`. A negative ceiling clamps to zero.
    pub fn clamp_to(self, ceiling: Money) -> Self {
        let ceiling = ceiling.max(Self::ZERO);
        self.max(Self::ZERO).min(ceiling)
    }

    /// Rounds to the currency minor unit, midpoint away from zero.
    pub fn round_to_minor_unit(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Whether `other` lies within `tolerance` of this value.
    pub fn within(self, other: Money, tolerance: Money) -> bool {
        self.0.saturating_sub(other.0).abs() <= tolerance.0
    }

    /// Applies a percentage to this amount, rounded to the minor unit.
    pub fn percent(self, percent: Percent) -> Self {
        let share = match self.0.checked_mul(percent.value()) {
            Some(product) => product / Decimal::ONE_HUNDRED,
            None => (self.0 / Decimal::ONE_HUNDRED).saturating_mul(percent.value()),
        };
        Self(share).round_to_minor_unit()
    }

    /// Value with trailing zeros stripped, for display.
    pub fn normalize(self) -> Self {
        Self(self.0.normalize())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul<u32> for Money {
    type Output = Self;
    fn mul(self, rhs: u32) -> Self::Output {
        Self(self.0.saturating_mul(Decimal::from(rhs)))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serialize_exact(self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Self(lenient_decimal(deserializer, "amount")?))
    }
}

/// A discount percentage, always within `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Percent(Decimal);

impl Percent {
    pub const ZERO: Self = Self(Decimal::ZERO);
    pub const FULL: Self = Self(Decimal::ONE_HUNDRED);

    /// Clamps `value` into `[0, 100]`.
    pub fn clamped(value: Decimal) -> Self {
        Self(value.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_full(&self) -> bool {
        self.0 == Decimal::ONE_HUNDRED
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0.normalize())
    }
}

impl Serialize for Percent {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serialize_exact(self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Percent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Self::clamped(lenient_decimal(deserializer, "percent")?))
    }
}

/// Writes a number when its shortest float form reads back as the same decimal,
/// and the decimal string otherwise.
fn serialize_exact<S>(value: Decimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value.to_f64() {
        Some(float) if float.to_string().parse::<Decimal>().ok() == Some(value) => {
            serializer.serialize_f64(float)
        }
        _ => serializer.collect_str(&value),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientNumber {
    Number(Decimal),
    Other(serde::de::IgnoredAny),
}

fn lenient_decimal<'de, D>(deserializer: D, field: &'static str) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<LenientNumber>::deserialize(deserializer)? {
        Some(LenientNumber::Number(value)) => Ok(value),
        Some(LenientNumber::Other(_)) => {
            tracing::warn!(field, "Non-numeric value treated as zero");
            Ok(Decimal::ZERO)
        }
        None => Ok(Decimal::ZERO),
    }
}
