//! Conversion between human readable amounts and base units.

use std::iter;

use crate::errors::UnitsError;

/// Decimal places of the reference dollar-pegged asset.
pub const USD_DECIMALS: u32 = 6;

/// Parses a string like `"12.5"` into base units with `decimals` fractional
/// digits.  Refuses inputs with more precision than that instead of rounding.
pub fn parse_units(s: &str, decimals: u32) -> Result<u128, UnitsError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(UnitsError::Empty);
    }

    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(UnitsError::Empty);
    }

    if frac.len() > decimals as usize {
        return Err(UnitsError::TooPrecise(decimals));
    }

    let mut acc: u128 = 0;
    let padding = decimals as usize - frac.len();
    let digits = whole
        .chars()
        .chain(frac.chars())
        .chain(iter::repeat_n('0', padding));
    for ch in digits {
        let d = ch.to_digit(10).ok_or(UnitsError::InvalidChar(ch))?;
        acc = acc
            .checked_mul(10)
            .and_then(|v| v.checked_add(d as u128))
            .ok_or(UnitsError::Overflow)?;
    }

    Ok(acc)
}

/// Formats base units as a human readable string, trimming trailing
/// fractional zeros.
pub fn format_units(value: u128, decimals: u32) -> String {
    let scale = 10u128.pow(decimals);
    let whole = value / scale;
    let frac = value % scale;
    if frac == 0 {
        return whole.to_string();
    }

    let frac_str = format!("{:0width$}", frac, width = decimals as usize);
    format!("{whole}.{}", frac_str.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_units("12.5", USD_DECIMALS), Ok(12_500_000));
        assert_eq!(parse_units("0.000001", USD_DECIMALS), Ok(1));
        assert_eq!(parse_units("7", USD_DECIMALS), Ok(7_000_000));
        assert_eq!(parse_units(".5", USD_DECIMALS), Ok(500_000));
        assert_eq!(parse_units("3.", USD_DECIMALS), Ok(3_000_000));
    }

    #[test]
    fn test_parse_units_errors() {
        assert_eq!(parse_units("", USD_DECIMALS), Err(UnitsError::Empty));
        assert_eq!(parse_units(".", USD_DECIMALS), Err(UnitsError::Empty));
        assert_eq!(
            parse_units("1.0000001", USD_DECIMALS),
            Err(UnitsError::TooPrecise(USD_DECIMALS))
        );
        assert_eq!(
            parse_units("1x", USD_DECIMALS),
            Err(UnitsError::InvalidChar('x'))
        );
        assert_eq!(
            parse_units(&"9".repeat(60), USD_DECIMALS),
            Err(UnitsError::Overflow)
        );
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(12_500_000, USD_DECIMALS), "12.5");
        assert_eq!(format_units(1, USD_DECIMALS), "0.000001");
        assert_eq!(format_units(7_000_000, USD_DECIMALS), "7");
    }
}
