//! # Stacked Supplier Discounts
//!
//! Supplier invoices in Indonesian wholesale quote discounts as a chain of
//! percentages: `"10+5"` means 10% off, then 5% off what remains
//! (effective 14.5%, not 15%).
//!
//! ```text
//! unit cost 20.000 × 10 = 200.000
//!      │  -10%  (20.000)
//!      ▼
//!   180.000
//!      │  -5%   (9.000)
//!      ▼
//!   171.000  ← line total
//! ```
//!
//! Each step is rounded half-up to whole rupiah.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::money::Money;

/// Most steps accepted in one discount string.
const MAX_STEPS: usize = 5;

/// A parsed chain of percentage discounts, held in basis points.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackedDiscount {
    steps_bps: Vec<u32>,
}

impl StackedDiscount {
    /// No discount.
    pub fn none() -> Self {
        StackedDiscount::default()
    }

    /// Parses strings like `"10"`, `"10+5"`, `"2.5 + 2.5%"`. Empty means none.
    ///
    /// ## Example
    /// ```rust
    /// use toko_core::{Money, StackedDiscount};
    ///
    /// let d = StackedDiscount::parse("10+5").unwrap();
    /// assert_eq!(d.apply(Money::from_rupiah(200_000)).rupiah(), 171_000);
    /// ```
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(StackedDiscount::none());
        }

        let steps_bps = trimmed
            .split('+')
            .map(|part| parse_percentage_bps(part).map_err(|reason| invalid(input, reason)))
            .collect::<Result<Vec<_>, _>>()?;

        if steps_bps.len() > MAX_STEPS {
            return Err(invalid(input, format!("at most {} steps allowed", MAX_STEPS)));
        }

        Ok(StackedDiscount { steps_bps })
    }

    pub fn steps_bps(&self) -> &[u32] {
        &self.steps_bps
    }

    pub fn is_none(&self) -> bool {
        self.steps_bps.is_empty()
    }

    /// Applies every step in order to `amount`.
    pub fn apply(&self, amount: Money) -> Money {
        self.steps_bps
            .iter()
            .fold(amount, |acc, bps| acc.apply_percentage_discount(*bps))
    }
}

impl FromStr for StackedDiscount {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StackedDiscount::parse(s)
    }
}

/// Canonical form, e.g. `10+2.5`.
impl fmt::Display for StackedDiscount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, bps) in self.steps_bps.iter().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            let whole = bps / 100;
            let frac = bps % 100;
            if frac == 0 {
                write!(f, "{}", whole)?;
            } else if frac % 10 == 0 {
                write!(f, "{}.{}", whole, frac / 10)?;
            } else {
                write!(f, "{}.{:02}", whole, frac)?;
            }
        }
        Ok(())
    }
}

fn invalid(input: &str, reason: impl Into<String>) -> CoreError {
    CoreError::InvalidDiscount {
        input: input.to_string(),
        reason: reason.into(),
    }
}

/// `"12.5"` → 1250. At most two decimals, range (0, 100].
fn parse_percentage_bps(part: &str) -> Result<u32, String> {
    let part = part.trim().trim_end_matches('%').trim();
    if part.is_empty() {
        return Err("empty step".to_string());
    }

    let (whole, frac) = match part.split_once(['.', ',']) {
        Some((w, f)) => (w, f),
        None => (part, ""),
    };

    if frac.len() > 2 {
        return Err(format!("'{}' has more than two decimals", part));
    }
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if whole.is_empty() || !all_digits(whole) || !all_digits(frac) {
        return Err(format!("'{}' is not a number", part));
    }

    let whole: u32 = whole
        .parse()
        .map_err(|_| format!("'{}' is out of range", part))?;
    let frac_bps: u32 = match frac.len() {
        0 => 0,
        1 => frac.parse::<u32>().map_err(|e| e.to_string())? * 10,
        _ => frac.parse::<u32>().map_err(|e| e.to_string())?,
    };

    let bps = whole
        .checked_mul(100)
        .and_then(|b| b.checked_add(frac_bps))
        .ok_or_else(|| format!("'{}' is out of range", part))?;

    if bps == 0 || bps > 10_000 {
        return Err(format!("'{}' must be above 0 and at most 100", part));
    }
    Ok(bps)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_and_stacked() {
        let amount = Money::from_rupiah(200_000);
        assert_eq!(StackedDiscount::parse("10").unwrap().apply(amount).rupiah(), 180_000);
        assert_eq!(StackedDiscount::parse("10+5").unwrap().apply(amount).rupiah(), 171_000);
        assert_eq!(
            StackedDiscount::parse(" 2.5 + 2.5% ").unwrap().steps_bps(),
            &[250, 250]
        );
    }

    #[test]
    fn test_compounding_is_not_additive() {
        let amount = Money::from_rupiah(100_000);
        let stacked = StackedDiscount::parse("10+5").unwrap().apply(amount);
        let flat = StackedDiscount::parse("15").unwrap().apply(amount);
        assert_eq!(stacked.rupiah(), 85_500);
        assert_eq!(flat.rupiah(), 85_000);
    }

    #[test]
    fn test_empty_means_no_discount() {
        let d = StackedDiscount::parse("   ").unwrap();
        assert!(d.is_none());
        assert_eq!(d.apply(Money::from_rupiah(7_777)).rupiah(), 7_777);
    }

    #[test]
    fn test_rejects_garbage() {
        for bad in ["abc", "10+", "+5", "0", "101", "10+x", "1.234", "-5", "1+1+1+1+1+1"] {
            let err = StackedDiscount::parse(bad).unwrap_err();
            assert!(
                matches!(err, CoreError::InvalidDiscount { .. }),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_display_is_canonical() {
        assert_eq!(StackedDiscount::parse("10 + 2,5%").unwrap().to_string(), "10+2.5");
        assert_eq!(StackedDiscount::parse("7.25").unwrap().to_string(), "7.25");
        assert_eq!(StackedDiscount::none().to_string(), "");
    }

    #[test]
    fn test_comma_decimal_separator() {
        assert_eq!(StackedDiscount::parse("2,5").unwrap().steps_bps(), &[250]);
    }
}
