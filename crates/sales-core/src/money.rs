//! Currency-string parsing.
//!
//! Prices arrive as display strings such as `"$18,731.76"`. Parsing is
//! driven entirely by an explicit [`NumberFormat`] so results never depend on
//! the process locale.

use rust_decimal::Decimal;

use crate::error::{PriceError, ReportError, Result};

/// How currency amounts are written in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberFormat {
    /// Symbol that prefixes every amount.
    pub currency_symbol: String,
    /// Digit grouping character removed before parsing, if any.
    pub grouping_separator: Option<char>,
    /// Character separating the integer and fractional parts.
    pub decimal_separator: char,
    /// Reject amounts that do not start with `currency_symbol`.
    pub require_symbol: bool,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            currency_symbol: "$".to_string(),
            grouping_separator: Some(','),
            decimal_separator: '.',
            require_symbol: true,
        }
    }
}

impl NumberFormat {
    /// Build a format, rejecting combinations that would make amounts
    /// ambiguous.
    pub fn new(
        currency_symbol: impl Into<String>,
        grouping_separator: Option<char>,
        decimal_separator: char,
        require_symbol: bool,
    ) -> Result<Self> {
        let currency_symbol = currency_symbol.into();
        if currency_symbol.chars().any(|c| c.is_ascii_digit()) {
            return Err(ReportError::Config(format!(
                "currency symbol {currency_symbol:?} must not contain digits"
            )));
        }
        if decimal_separator.is_ascii_digit() {
            return Err(ReportError::Config(format!(
                "decimal separator {decimal_separator:?} must not be a digit"
            )));
        }
        if let Some(group) = grouping_separator {
            if group == decimal_separator {
                return Err(ReportError::Config(format!(
                    "grouping and decimal separators are both {group:?}"
                )));
            }
            if group.is_ascii_digit() {
                return Err(ReportError::Config(format!(
                    "grouping separator {group:?} must not be a digit"
                )));
            }
        }
        Ok(Self {
            currency_symbol,
            grouping_separator,
            decimal_separator,
            require_symbol,
        })
    }
}

/// Parse a formatted price such as `"$1,234.56"` into a [`Decimal`].
///
/// The scale of the input is kept as-is; nothing is rounded. Signs,
/// exponents and stray characters are rejected so a parsed price is always
/// non-negative.
pub fn parse_price(raw: &str, format: &NumberFormat) -> std::result::Result<Decimal, PriceError> {
    let trimmed = raw.trim();

    let amount = match trimmed.strip_prefix(format.currency_symbol.as_str()) {
        Some(rest) if !format.currency_symbol.is_empty() => rest,
        _ if format.require_symbol && !format.currency_symbol.is_empty() => {
            return Err(PriceError::MissingSymbol {
                raw: raw.to_string(),
                symbol: format.currency_symbol.clone(),
            });
        }
        _ => trimmed,
    };

    let mut normalised = String::with_capacity(amount.len());
    for c in amount.chars() {
        if Some(c) == format.grouping_separator {
            continue;
        }
        normalised.push(if c == format.decimal_separator { '.' } else { c });
    }

    if normalised.is_empty() {
        return Err(PriceError::Empty(raw.to_string()));
    }

    let well_formed = normalised.chars().all(|c| c.is_ascii_digit() || c == '.')
        && normalised.chars().filter(|&c| c == '.').count() <= 1
        && normalised.chars().any(|c| c.is_ascii_digit());
    if !well_formed {
        return Err(PriceError::InvalidNumber(raw.to_string()));
    }

    Decimal::from_str_exact(&normalised).map_err(|_| PriceError::InvalidNumber(raw.to_string()))
}
