//! Value objects for the order desk domain.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::workflow::ValidationError;

/// Customer identifier derived from the customer name and the instant the
/// name was accepted.
///
/// Format: three alphanumeric characters of the name, uppercased and padded
/// with `X`, a dash, then the UTC instant as `yymmddHHMMSSmmm`. Two
/// customers with the same prefix identified in the same millisecond collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    /// Width of the name-derived prefix.
    pub const PREFIX_WIDTH: usize = 3;

    /// Derives the id for `name` accepted at `at`.
    pub fn derive(name: &str, at: DateTime<Utc>) -> Self {
        let mut prefix: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(Self::PREFIX_WIDTH)
            .map(|c| c.to_ascii_uppercase())
            .collect();
        while prefix.len() < Self::PREFIX_WIDTH {
            prefix.push('X');
        }

        Self(format!("{prefix}-{}", at.format("%y%m%d%H%M%S%3f")))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Money amount represented in cents to avoid floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in cents (e.g., 1000 = 10.00)
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Parses an operator-entered price such as `"9.99"` or `"12"`.
    ///
    /// Negative amounts and more than two fractional digits are rejected.
    pub fn parse_price(input: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidPrice {
            input: input.to_string(),
        };

        let mut amount = Decimal::from_str(input.trim()).map_err(|_| invalid())?;
        if amount.is_sign_negative() || amount.scale() > 2 {
            return Err(invalid());
        }
        amount.rescale(2);
        let cents = i64::try_from(amount.mantissa()).map_err(|_| invalid())?;
        Ok(Self { cents })
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the dollar portion (whole number).
    pub fn dollars(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after dollars).
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }

    /// Multiplies by a quantity. Returns None on overflow.
    pub fn checked_mul(&self, quantity: u32) -> Option<Money> {
        self.cents
            .checked_mul(i64::from(quantity))
            .map(Money::from_cents)
    }

    /// Adds two amounts. Returns None on overflow.
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.cents.checked_add(other.cents).map(Money::from_cents)
    }

    /// Sums `amounts`, or None if the total does not fit.
    pub fn checked_sum<I>(amounts: I) -> Option<Money>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
    }

    /// Returns the amount as plain decimal text, as written to the sheets.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.cents < 0 { "-" } else { "" };
        format!("{sign}{}.{:02}", self.dollars().abs(), self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_decimal_string())
    }
}
