//! Conversion between human-readable amounts and integer base units

use super::TradeError;

/// Convert `amount` to base units at `decimals` precision
///
/// Goes through the decimal string representation so that values like `0.1`
/// become exactly `100_000_000` at 9 decimals.
pub fn to_base_units(amount: f64, decimals: u8) -> Result<u64, TradeError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(TradeError::QuoteUnavailable(format!(
            "amount {} cannot be traded",
            amount
        )));
    }

    let text = format!("{:.*}", decimals as usize, amount);
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let digits = format!("{}{}", whole, fraction);
    let units: u64 = digits.parse().map_err(|_| {
        TradeError::QuoteUnavailable(format!(
            "amount {} overflows {} decimal base units",
            amount, decimals
        ))
    })?;

    if units == 0 {
        return Err(TradeError::QuoteUnavailable(format!(
            "amount {} is below the smallest unit",
            amount
        )));
    }
    Ok(units)
}

/// Human-readable amount for `units`
pub fn from_base_units(units: u64, decimals: u8) -> f64 {
    units as f64 / 10f64.powi(decimals as i32)
}

/// Exact decimal rendering of `units`, trailing zeros trimmed
pub fn format_units(units: u64, decimals: u8) -> String {
    let scale = 10u128.pow(decimals as u32);
    let whole = units as u128 / scale;
    let fraction = units as u128 % scale;
    if fraction == 0 {
        return whole.to_string();
    }
    let padded = format!("{:0width$}", fraction, width = decimals as usize);
    format!("{}.{}", whole, padded.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_base_units_is_exact() {
        assert_eq!(to_base_units(0.1, 9).unwrap(), 100_000_000);
        assert_eq!(to_base_units(0.01, 9).unwrap(), 10_000_000);
        assert_eq!(to_base_units(1.5, 6).unwrap(), 1_500_000);
        assert_eq!(to_base_units(0.000000001, 9).unwrap(), 1);
    }

    #[test]
    fn test_to_base_units_rejects_untradable() {
        assert!(to_base_units(0.0, 9).is_err());
        assert!(to_base_units(-1.0, 9).is_err());
        assert!(to_base_units(f64::NAN, 9).is_err());
        assert!(to_base_units(0.0000001, 6).is_err());
        assert!(to_base_units(1e12, 9).is_err());
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(0, 9), "0");
        assert_eq!(format_units(1_000_000_000, 9), "1");
        assert_eq!(format_units(1_250_000_000, 9), "1.25");
        assert_eq!(format_units(50_000, 9), "0.00005");
        assert_eq!(format_units(1_500_000, 6), "1.5");
    }

    #[test]
    fn test_from_base_units() {
        assert_eq!(from_base_units(1_500_000, 6), 1.5);
        assert_eq!(from_base_units(100_000_000, 9), 0.1);
    }
}
