//! # Number Format Module
//!
//! Rounding and display policy for every monetary figure the cart produces.
//!
//! ## The Rounding Cascade
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  EACH STAGE ROUNDS ITS OWN RESULT                                       │
//! │                                                                         │
//! │  unit price 5.24 ──round──► 5.24                                        │
//! │       │                                                                 │
//! │       ├── × qty 2 ──round──► 10.48   (price_sum_without_conditions)     │
//! │       │                                                                 │
//! │       └── fold "-2" ──round──► 3.24  (price)                            │
//! │                 │                                                       │
//! │                 └── × qty 2 ──round──► 6.48 (price_sum)                 │
//! │                                                                         │
//! │  Later stages consume the ROUNDED value of earlier ones.                │
//! │  Totals depend on this, so it must not be deferred to the end.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use cart_core::NumberFormat;
//!
//! let format = NumberFormat::default(); // 2 decimals, "." separator
//! assert_eq!(format.round(15.244), 15.24);
//! assert_eq!(format.round(1.005), 1.01);
//!
//! // Disabled formatting leaves values untouched
//! assert_eq!(NumberFormat::Disabled.round(15.244), 15.244);
//! ```

use serde::{Deserialize, Serialize};

/// How monetary values are rounded and rendered.
///
/// ## Config File Format
/// ```toml
/// [number_format]
/// mode = "fixed"
/// decimals = 2
/// decimal_separator = "."
/// thousands_separator = ""
/// ```
/// or
/// ```toml
/// [number_format]
/// mode = "disabled"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum NumberFormat {
    /// No rounding at any stage; values pass through unchanged.
    Disabled,

    /// Round to a fixed number of decimals (half away from zero).
    Fixed {
        #[serde(default = "default_decimals")]
        decimals: u32,
        #[serde(default = "default_decimal_separator")]
        decimal_separator: String,
        #[serde(default)]
        thousands_separator: String,
    },
}

fn default_decimals() -> u32 {
    2
}

fn default_decimal_separator() -> String {
    ".".to_string()
}

impl Default for NumberFormat {
    fn default() -> Self {
        NumberFormat::Fixed {
            decimals: default_decimals(),
            decimal_separator: default_decimal_separator(),
            thousands_separator: String::new(),
        }
    }
}

impl NumberFormat {
    /// Creates a fixed format with `decimals` places and default separators.
    pub fn fixed(decimals: u32) -> Self {
        NumberFormat::Fixed {
            decimals,
            decimal_separator: default_decimal_separator(),
            thousands_separator: String::new(),
        }
    }

    /// Returns true when rounding is turned off.
    pub fn is_disabled(&self) -> bool {
        matches!(self, NumberFormat::Disabled)
    }

    /// Number of decimals, if rounding is enabled.
    pub fn decimals(&self) -> Option<u32> {
        match self {
            NumberFormat::Disabled => None,
            NumberFormat::Fixed { decimals, .. } => Some(*decimals),
        }
    }

    /// Rounds a value according to this policy.
    ///
    /// This is the function every pricing stage calls on its own result.
    pub fn round(&self, value: f64) -> f64 {
        match self {
            NumberFormat::Disabled => value,
            NumberFormat::Fixed { decimals, .. } => round_half_away(value, *decimals),
        }
    }

    /// Renders a value for display.
    ///
    /// ## Example
    /// ```rust
    /// use cart_core::NumberFormat;
    ///
    /// let format = NumberFormat::Fixed {
    ///     decimals: 2,
    ///     decimal_separator: ",".to_string(),
    ///     thousands_separator: ".".to_string(),
    /// };
    /// assert_eq!(format.format(1234567.891), "1.234.567,89");
    /// assert_eq!(format.format(-5.5), "-5,50");
    /// ```
    pub fn format(&self, value: f64) -> String {
        let NumberFormat::Fixed {
            decimals,
            decimal_separator,
            thousands_separator,
        } = self
        else {
            return value.to_string();
        };

        let rounded = round_half_away(value, *decimals);
        let digits = format!("{:.*}", *decimals as usize, rounded.abs());
        let (whole, fraction) = match digits.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (digits.as_str(), ""),
        };

        let mut out = String::with_capacity(digits.len() + 4);
        if rounded < 0.0 && digits.chars().any(|c| c != '0' && c != '.') {
            out.push('-');
        }
        out.push_str(&group_thousands(whole, thousands_separator));
        if !fraction.is_empty() {
            out.push_str(decimal_separator);
            out.push_str(fraction);
        }
        out
    }
}

/// Rounds half away from zero at `decimals` places.
///
/// Scaling by a power of ten can land just below a half (1.005 × 100 is
/// 100.49999999999999), so the scaled value is first reduced to
/// [`SIGNIFICANT_DIGITS`] significant digits. Genuine digits further out
/// (0.124999999) are kept and round down.
fn round_half_away(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }

    let factor = 10f64.powi(decimals as i32);
    let scaled = value * factor;
    to_significant_digits(scaled).round() / factor
}

/// Digits of an f64 that survive a decimal round trip.
const SIGNIFICANT_DIGITS: usize = 15;

fn to_significant_digits(value: f64) -> f64 {
    format!("{:.*e}", SIGNIFICANT_DIGITS - 1, value)
        .parse()
        .unwrap_or(value)
}

fn group_thousands(whole: &str, separator: &str) -> String {
    if separator.is_empty() || whole.len() <= 3 {
        return whole.to_string();
    }

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3 * separator.len());
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push_str(separator);
        }
        grouped.push(c);
    }
    grouped
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_two_decimals() {
        let format = NumberFormat::default();
        assert_eq!(format.round(5.764), 5.76);
        assert_eq!(format.round(5.716), 5.72);
        assert_eq!(format.round(16.196), 16.2);
        assert_eq!(format.round(3.2400000000000002), 3.24);
    }

    #[test]
    fn test_round_half_away_from_zero() {
        let format = NumberFormat::default();
        assert_eq!(format.round(0.125), 0.13);
        assert_eq!(format.round(1.005), 1.01);
        assert_eq!(format.round(-0.125), -0.13);
        assert_eq!(format.round(2.675), 2.68);
    }

    #[test]
    fn test_round_keeps_digits_below_the_half() {
        let format = NumberFormat::default();
        assert_eq!(format.round(0.124999999), 0.12);
        assert_eq!(format.round(0.12499999999), 0.12);
        assert_eq!(format.round(-0.124999999), -0.12);
        assert_eq!(NumberFormat::fixed(4).round(1.00004999), 1.0);
    }

    #[test]
    fn test_zero_decimals() {
        let format = NumberFormat::fixed(0);
        assert_eq!(format.round(2.5), 3.0);
        assert_eq!(format.format(1234.4), "1234");
    }

    #[test]
    fn test_disabled_passes_through() {
        let format = NumberFormat::Disabled;
        assert_eq!(format.round(4.764), 4.764);
        assert!(format.is_disabled());
        assert_eq!(format.decimals(), None);
    }

    #[test]
    fn test_format_pads_decimals() {
        let format = NumberFormat::default();
        assert_eq!(format.format(16.2), "16.20");
        assert_eq!(format.format(0.0), "0.00");
        assert_eq!(format.format(1234567.0), "1234567.00");
    }

    #[test]
    fn test_format_thousands_separator() {
        let format = NumberFormat::Fixed {
            decimals: 2,
            decimal_separator: ".".to_string(),
            thousands_separator: ",".to_string(),
        };
        assert_eq!(format.format(1234.5), "1,234.50");
        assert_eq!(format.format(999.999), "1,000.00");
        assert_eq!(format.format(123.0), "123.00");
    }

    #[test]
    fn test_format_negative_zero_has_no_sign() {
        let format = NumberFormat::default();
        assert_eq!(format.format(-0.001), "0.00");
    }

    #[test]
    fn test_deserialize_from_toml() {
        let format: NumberFormat = toml::from_str("mode = \"disabled\"").unwrap();
        assert_eq!(format, NumberFormat::Disabled);

        let format: NumberFormat =
            toml::from_str("mode = \"fixed\"\ndecimals = 3\nthousands_separator = \" \"").unwrap();
        assert_eq!(
            format,
            NumberFormat::Fixed {
                decimals: 3,
                decimal_separator: ".".to_string(),
                thousands_separator: " ".to_string(),
            }
        );
    }
}
