use std::str::FromStr;

use alloy_primitives::Address;

use crate::error::EthError;

/// Splits off the `0x` prefix and checks the remaining 40 hex characters.
fn hex_body(address: &str) -> Result<&str, EthError> {
    let hex_part = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| EthError::InvalidAddress("address must start with 0x".into()))?;

    if hex_part.len() != 40 {
        return Err(EthError::InvalidAddress(format!(
            "expected 40 hex characters, got {}",
            hex_part.len()
        )));
    }

    if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(EthError::InvalidAddress(
            "address contains non-hex characters".into(),
        ));
    }

    Ok(hex_part)
}

fn is_mixed_case(hex_part: &str) -> bool {
    hex_part.chars().any(|c| c.is_ascii_uppercase()) && hex_part.chars().any(|c| c.is_ascii_lowercase())
}

/// Parses user input (e.g. a destination field) into an [`Address`].
///
/// Mixed-case input must carry a valid EIP-55 checksum. All-lowercase and
/// all-uppercase input carries none and is accepted as-is.
pub fn parse_address(address: &str) -> Result<Address, EthError> {
    let input = address.trim();
    let hex_part = hex_body(input)?;

    if is_mixed_case(hex_part) {
        return Address::parse_checksummed(format!("0x{hex_part}"), None)
            .map_err(|_| EthError::InvalidAddress("EIP-55 checksum mismatch".into()));
    }

    Address::from_str(hex_part).map_err(|e| EthError::InvalidAddress(e.to_string()))
}

/// Renders an address with EIP-55 mixed-case checksum encoding.
pub fn checksum_address(address: &Address) -> String {
    address.to_checksum(None)
}
