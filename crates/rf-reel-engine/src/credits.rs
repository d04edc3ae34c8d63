//! Decimal money and payout multipliers
//!
//! Balances, bets and wins are [`Credits`]: a non-negative [`Decimal`] with at
//! most four decimal places. Payout multipliers carry at most two, so a
//! cent-granular bet times any catalog multiplier is exact.

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ReelError, ReelResult};

/// Decimal places an amount may carry (1/10 000 of a unit)
pub const CREDIT_DECIMALS: u32 = 4;

/// Decimal places a multiplier may carry
pub const MULTIPLIER_DECIMALS: u32 = 2;

/// Decimal places a bet step may carry
const CENT_DECIMALS: u32 = 2;

const fn decimal(magnitude: u64, negative: bool, scale: u32) -> Decimal {
    Decimal::from_parts(magnitude as u32, (magnitude >> 32) as u32, 0, negative, scale)
}

/// Check a parsed value against the allowed precision, ignoring trailing zeros
fn within_scale(value: Decimal, max_scale: u32) -> ReelResult<Decimal> {
    if value.normalize().scale() > max_scale {
        return Err(ReelError::InvalidAmount(format!(
            "{value} has more than {max_scale} decimal places"
        )));
    }
    Ok(value)
}

fn parse_decimal(text: &str) -> ReelResult<Decimal> {
    Decimal::from_str(text.trim()).map_err(|e| ReelError::InvalidAmount(format!("{text}: {e}")))
}

/// A non-negative money amount
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Credits(Decimal);

impl Credits {
    pub const ZERO: Self = Self(Decimal::ZERO);
    pub const MAX: Self = Self(Decimal::MAX);

    /// Amount from sub-units (1/10 000 of a unit)
    pub const fn from_units(units: u64) -> Self {
        Self(decimal(units, false, CREDIT_DECIMALS))
    }

    pub const fn from_cents(cents: u64) -> Self {
        Self(decimal(cents, false, CENT_DECIMALS))
    }

    pub const fn from_whole(whole: u64) -> Self {
        Self(decimal(whole, false, 0))
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0
            .checked_sub(other.0)
            .filter(|v| !v.is_sign_negative() || v.is_zero())
            .map(|v| Self(v.abs()))
    }

    pub fn saturating_add(self, other: Self) -> Self {
        self.checked_add(other).unwrap_or(Self::MAX)
    }

    /// Apply a signed delta, `None` if the result would be negative or overflow
    pub fn checked_apply(self, delta: CreditDelta) -> Option<Self> {
        self.0
            .checked_add(delta.0)
            .filter(|v| !v.is_sign_negative() || v.is_zero())
            .map(|v| Self(v.abs()))
    }

    /// Amount times a payout multiplier.
    ///
    /// Products finer than 1/10 000 round half away from zero; a cent bet
    /// never needs it. Saturates at [`Credits::MAX`].
    pub fn scaled_by(self, multiplier: Multiplier) -> Self {
        match self.0.checked_mul(multiplier.0) {
            Some(product) => Self(product.round_dp_with_strategy(
                CREDIT_DECIMALS,
                RoundingStrategy::MidpointAwayFromZero,
            )),
            None => Self::MAX,
        }
    }

    /// Approximate value in whole units, for ratios and display only
    pub fn to_f64(self) -> f64 {
        self.0.to_f64().unwrap_or(f64::MAX)
    }
}

impl TryFrom<Decimal> for Credits {
    type Error = ReelError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(ReelError::InvalidAmount(format!("{value} is negative")));
        }
        within_scale(value.abs(), CREDIT_DECIMALS).map(Self)
    }
}

impl fmt::Display for Credits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.normalize().scale() <= CENT_DECIMALS {
            write!(f, "{:.2}", self.0)
        } else {
            write!(f, "{:.4}", self.0)
        }
    }
}

impl FromStr for Credits {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_decimal(s)?.try_into()
    }
}

impl Serialize for Credits {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Credits {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <Decimal as Deserialize>::deserialize(deserializer)?
            .try_into()
            .map_err(serde::de::Error::custom)
    }
}

/// A signed change to an amount, used for bet adjustment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CreditDelta(Decimal);

impl CreditDelta {
    pub const fn from_units(units: i64) -> Self {
        Self(decimal(units.unsigned_abs(), units < 0, CREDIT_DECIMALS))
    }

    pub const fn from_cents(cents: i64) -> Self {
        Self(decimal(cents.unsigned_abs(), cents < 0, CENT_DECIMALS))
    }

    pub const fn from_whole(whole: i64) -> Self {
        Self(decimal(whole.unsigned_abs(), whole < 0, 0))
    }

    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// True when the step is a whole number of cents
    pub fn is_whole_cents(self) -> bool {
        self.0.normalize().scale() <= CENT_DECIMALS
    }
}

impl fmt::Display for CreditDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "+" };
        write!(f, "{}{}", sign, Credits(self.0.abs()))
    }
}

impl FromStr for CreditDelta {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        within_scale(parse_decimal(s)?, CREDIT_DECIMALS).map(Self)
    }
}

/// Payout multiplier applied to the bet (`1.5`, `75`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Multiplier(Decimal);

impl Multiplier {
    pub const fn from_hundredths(hundredths: u32) -> Self {
        Self(decimal(hundredths as u64, false, MULTIPLIER_DECIMALS))
    }

    pub const fn whole(times: u32) -> Self {
        Self(decimal(times as u64, false, 0))
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn to_f64(self) -> f64 {
        self.0.to_f64().unwrap_or(f64::MAX)
    }
}

impl TryFrom<Decimal> for Multiplier {
    type Error = ReelError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(ReelError::InvalidAmount(format!("multiplier {value} is negative")));
        }
        within_scale(value.abs(), MULTIPLIER_DECIMALS).map(Self)
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl FromStr for Multiplier {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_decimal(s)?.try_into()
    }
}

impl Serialize for Multiplier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Multiplier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <Decimal as Deserialize>::deserialize(deserializer)?
            .try_into()
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_credits() {
        assert_eq!("0.05".parse::<Credits>().unwrap(), Credits::from_cents(5));
        assert_eq!("100".parse::<Credits>().unwrap(), Credits::from_whole(100));
        assert_eq!("100.00".parse::<Credits>().unwrap(), Credits::from_whole(100));
        assert_eq!("0.0125".parse::<Credits>().unwrap(), Credits::from_units(125));
        assert_eq!("1.50000".parse::<Credits>().unwrap(), Credits::from_cents(150));

        assert!("".parse::<Credits>().is_err());
        assert!("abc".parse::<Credits>().is_err());
        assert!("-1".parse::<Credits>().is_err());
        assert!("1.23456".parse::<Credits>().is_err());
    }

    #[test]
    fn test_display_credits() {
        assert_eq!(Credits::from_whole(100).to_string(), "100.00");
        assert_eq!(Credits::from_cents(5).to_string(), "0.05");
        assert_eq!(Credits::from_units(250).to_string(), "0.0250");
        assert_eq!(Credits::from_units(500).to_string(), "0.05");
    }

    #[test]
    fn test_units_cents_and_whole_agree() {
        assert_eq!(Credits::from_units(500), Credits::from_cents(5));
        assert_eq!(Credits::from_cents(100), Credits::from_whole(1));
        assert_eq!(Credits::try_from(dec!(0.0125)).unwrap(), Credits::from_units(125));
        assert!(Multiplier::try_from(dec!(-0.5)).is_err());
    }

    #[test]
    fn test_parse_delta() {
        assert_eq!("-0.05".parse::<CreditDelta>().unwrap(), CreditDelta::from_cents(-5));
        assert_eq!("+1".parse::<CreditDelta>().unwrap(), CreditDelta::from_whole(1));
        assert_eq!(CreditDelta::from_cents(-5).to_string(), "-0.05");
        assert!("0.00001".parse::<CreditDelta>().is_err());
    }

    #[test]
    fn test_delta_whole_cents() {
        assert!(CreditDelta::from_cents(-5).is_whole_cents());
        assert!(CreditDelta::from_units(300).is_whole_cents());
        assert!(!CreditDelta::from_units(1).is_whole_cents());
    }

    #[test]
    fn test_checked_apply() {
        let bet = Credits::from_cents(5);
        assert_eq!(bet.checked_apply(CreditDelta::from_cents(5)), Some(Credits::from_cents(10)));
        assert_eq!(bet.checked_apply(CreditDelta::from_cents(-5)), Some(Credits::ZERO));
        assert_eq!(bet.checked_apply(CreditDelta::from_whole(-1000)), None);
        assert_eq!(bet.checked_sub(Credits::from_cents(6)), None);
        assert_eq!(Credits::MAX.checked_add(Credits::from_cents(1)), None);
    }

    #[test]
    fn test_scaled_by_is_exact_for_cent_bets() {
        let bet = Credits::from_cents(5);
        assert_eq!(bet.scaled_by(Multiplier::whole(100)), Credits::from_whole(5));
        assert_eq!(bet.scaled_by(Multiplier::from_hundredths(150)), Credits::from_units(750));
        assert_eq!(bet.scaled_by(Multiplier::from_hundredths(120)), Credits::from_cents(6));
        assert_eq!(bet.scaled_by(Multiplier::from_hundredths(50)), Credits::from_units(250));
    }

    #[test]
    fn test_scaled_by_rounds_sub_unit_products() {
        // 0.0101 × 0.5 = 0.00505
        let bet = Credits::from_units(101);
        assert_eq!(bet.scaled_by(Multiplier::from_hundredths(50)), Credits::from_units(51));
        // 0.0001 × 0.25 = 0.000025
        let dust = Credits::from_units(1);
        assert_eq!(dust.scaled_by(Multiplier::from_hundredths(25)), Credits::ZERO);
        assert_eq!(Credits::MAX.scaled_by(Multiplier::whole(2)), Credits::MAX);
    }

    #[test]
    fn test_multiplier_display_and_parse() {
        assert_eq!(Multiplier::whole(75).to_string(), "75");
        assert_eq!(Multiplier::from_hundredths(150).to_string(), "1.5");
        assert_eq!(Multiplier::from_hundredths(125).to_string(), "1.25");
        assert_eq!("1.2".parse::<Multiplier>().unwrap(), Multiplier::from_hundredths(120));
        assert!("1.255".parse::<Multiplier>().is_err());
        assert!("-1".parse::<Multiplier>().is_err());
    }

    #[test]
    fn test_serde_accepts_numbers_and_strings() {
        let from_number: Credits = serde_json::from_str("0.05").unwrap();
        let from_text: Credits = serde_json::from_str("\"0.05\"").unwrap();
        let from_int: Credits = serde_json::from_str("100").unwrap();
        assert_eq!(from_number, Credits::from_cents(5));
        assert_eq!(from_text, Credits::from_cents(5));
        assert_eq!(from_int, Credits::from_whole(100));

        let multiplier: Multiplier = serde_json::from_str("1.5").unwrap();
        assert_eq!(multiplier, Multiplier::from_hundredths(150));
        assert!(serde_json::from_str::<Credits>("-2.0").is_err());
        assert!(serde_yml::from_str::<Credits>("-5").is_err());
    }

    #[test]
    fn test_serde_rejects_excess_precision() {
        assert!(serde_json::from_str::<Multiplier>("1.255").is_err());
        assert!(serde_json::from_str::<Multiplier>("\"1.255\"").is_err());
        assert!(serde_yml::from_str::<Multiplier>("1.255").is_err());
        assert!(serde_yml::from_str::<Multiplier>("\"1.255\"").is_err());

        assert!(serde_json::from_str::<Credits>("0.00005").is_err());
        assert!(serde_yml::from_str::<Credits>("0.00005").is_err());
    }

    #[test]
    fn test_large_amounts_survive_serde() {
        let amount = Credits::from_units(9_007_199_254_740_993);
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"900719925474.0993\"");
        assert_eq!(serde_json::from_str::<Credits>(&json).unwrap(), amount);
    }
}
