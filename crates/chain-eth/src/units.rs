use alloy_primitives::U256;

use crate::error::EthError;

/// Renders an integer amount in the token's smallest unit as a decimal
/// string, e.g. `1500000000000000000` with 18 decimals becomes `"1.5"`.
///
/// Trailing fractional zeros are dropped; whole amounts have no point.
pub fn format_units(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    let decimals = decimals as usize;

    if decimals == 0 {
        return digits;
    }

    let padded = format!("{digits:0>width$}", width = decimals + 1);
    let (integer, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');

    if fraction.is_empty() {
        integer.to_string()
    } else {
        format!("{integer}.{fraction}")
    }
}

/// Parses a decimal string into the token's smallest unit.
///
/// Fractional digits beyond `decimals` are rounded half-up, so `"0.0000005"`
/// with 6 decimals yields `1`. Negative and non-numeric input is rejected.
pub fn parse_units(value: &str, decimals: u8) -> Result<U256, EthError> {
    let value = value.trim();
    let decimals = decimals as usize;

    if value.starts_with('-') {
        return Err(EthError::InvalidAmount(
            "negative amounts are not supported".into(),
        ));
    }

    let (integer, fraction) = match value.split_once('.') {
        Some((i, f)) => (i, f),
        None => (value, ""),
    };

    if integer.is_empty() && fraction.is_empty() {
        return Err(EthError::InvalidAmount(format!("'{value}' is not a number")));
    }

    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(integer) || !all_digits(fraction) {
        return Err(EthError::InvalidAmount(format!("'{value}' is not a number")));
    }

    let (kept, rest) = if fraction.len() > decimals {
        fraction.split_at(decimals)
    } else {
        (fraction, "")
    };
    let round_up = rest.chars().next().is_some_and(|c| c >= '5');

    let digits = format!("{integer}{kept:0<decimals$}");
    let digits = if digits.is_empty() { "0" } else { digits.as_str() };

    let overflow = || EthError::InvalidAmount(format!("'{value}' does not fit in 256 bits"));
    let amount = U256::from_str_radix(digits, 10).map_err(|_| overflow())?;

    if round_up {
        amount.checked_add(U256::from(1)).ok_or_else(overflow)
    } else {
        Ok(amount)
    }
}
