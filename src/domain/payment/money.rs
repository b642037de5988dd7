//! Monetary value objects.
//!
//! All amounts crossing a trust boundary are integers in minor units
//! (cents). Floating point only appears in cart input and is converted
//! line by line.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::PaymentError;
use crate::domain::foundation::{ProductId, ValidationError, VariantId};

/// An amount in the currency's smallest unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MinorUnits(i64);

impl MinorUnits {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, other: MinorUnits) -> Option<MinorUnits> {
        self.0.checked_add(other.0).map(Self)
    }
}

impl fmt::Display for MinorUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ISO-4217 alphabetic currency code, stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Colombian peso, the gateway's settlement currency.
    pub fn cop() -> Self {
        Self("COP".to_string())
    }

    pub fn parse(code: &str) -> Result<Self, ValidationError> {
        let code = code.trim();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::invalid_format(
                "currency",
                "expected a three-letter ISO-4217 code",
            ));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Currency {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Currency> for String {
    fn from(c: Currency) -> Self {
        c.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A cart line as submitted by the storefront, priced in major units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    pub title: String,
    pub quantity: u32,
    pub unit_price: f64,
}

impl CartLine {
    /// This line's contribution in minor units, rounded on its own.
    pub fn amount(&self) -> Result<MinorUnits, PaymentError> {
        if self.quantity == 0 {
            return Err(PaymentError::InvalidAmount(format!(
                "line '{}' has zero quantity",
                self.title
            )));
        }
        if !self.unit_price.is_finite() || self.unit_price < 0.0 {
            return Err(PaymentError::InvalidAmount(format!(
                "line '{}' has an invalid unit price",
                self.title
            )));
        }

        let minor = (self.unit_price * f64::from(self.quantity) * 100.0).round();
        if minor > i64::MAX as f64 {
            return Err(PaymentError::InvalidAmount(format!(
                "line '{}' overflows",
                self.title
            )));
        }
        Ok(MinorUnits(minor as i64))
    }
}

/// Canonical charge amount for a cart.
///
/// Each line is rounded to minor units before summing so that float drift
/// cannot accumulate across lines. A non-positive total is rejected.
pub fn amount_from_lines(lines: &[CartLine]) -> Result<MinorUnits, PaymentError> {
    let mut total = MinorUnits(0);
    for line in lines {
        total = total
            .checked_add(line.amount()?)
            .ok_or_else(|| PaymentError::InvalidAmount("cart total overflows".to_string()))?;
    }

    if !total.is_positive() {
        return Err(PaymentError::InvalidAmount(
            "cart total must be greater than zero".to_string(),
        ));
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(qty: u32, price: f64) -> CartLine {
        CartLine {
            product_id: ProductId::new(),
            variant_id: None,
            title: "Camiseta".to_string(),
            quantity: qty,
            unit_price: price,
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Cart Totals
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn converts_major_units_to_minor_units() {
        let total = amount_from_lines(&[line(1, 50_000.0)]).unwrap();
        assert_eq!(total, MinorUnits::new(5_000_000));
    }

    #[test]
    fn rounds_each_line_before_summing() {
        // 0.1 * 3 * 100 = 30.000000000000004 per line in f64
        let total = amount_from_lines(&[line(3, 0.1), line(3, 0.1), line(1, 0.25)]).unwrap();
        assert_eq!(total, MinorUnits::new(85));
    }

    #[test]
    fn multiplies_quantity() {
        let total = amount_from_lines(&[line(4, 12_500.0), line(2, 990.5)]).unwrap();
        assert_eq!(total, MinorUnits::new(5_000_000 + 198_100));
    }

    #[test]
    fn empty_cart_is_invalid_amount() {
        assert!(matches!(
            amount_from_lines(&[]),
            Err(PaymentError::InvalidAmount(_))
        ));
    }

    #[test]
    fn zero_total_is_invalid_amount() {
        assert!(matches!(
            amount_from_lines(&[line(2, 0.0)]),
            Err(PaymentError::InvalidAmount(_))
        ));
    }

    #[test]
    fn negative_or_nan_price_is_rejected() {
        assert!(amount_from_lines(&[line(1, -5.0)]).is_err());
        assert!(amount_from_lines(&[line(1, f64::NAN)]).is_err());
        assert!(amount_from_lines(&[line(1, f64::INFINITY)]).is_err());
    }

    #[test]
    fn zero_quantity_is_rejected() {
        assert!(amount_from_lines(&[line(0, 100.0)]).is_err());
    }

    // ══════════════════════════════════════════════════════════════
    // Currency
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn currency_is_normalised_to_upper_case() {
        assert_eq!(Currency::parse("cop").unwrap(), Currency::cop());
    }

    #[test]
    fn currency_rejects_bad_codes() {
        assert!(Currency::parse("CO").is_err());
        assert!(Currency::parse("C0P").is_err());
        assert!(Currency::parse("COPS").is_err());
    }

    #[test]
    fn currency_deserializes_through_validation() {
        let ok: Currency = serde_json::from_str("\"usd\"").unwrap();
        assert_eq!(ok.as_str(), "USD");
        assert!(serde_json::from_str::<Currency>("\"dollars\"").is_err());
    }
}
