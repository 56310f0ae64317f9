// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::errors::{SyncError, SyncResult};
use num::{BigUint, Integer, Zero};
use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer,
};
use std::fmt;

/// Number of fractional digits kept when rendering token amounts.
pub const MAX_DISPLAY_FRACTION_DIGITS: usize = 6;
/// Token metadata comes from the transaction service; anything above this is not a real token.
pub const MAX_TOKEN_DECIMALS: u32 = 255;

/// Addresses are compared case-insensitively, checksummed and lower-cased forms are the same
/// account.
pub fn standardize_address(address: &str) -> String {
    address.trim().to_lowercase()
}

/// Renders a raw integer token amount as a decimal string.
///
/// The fraction is truncated (never rounded) to six digits and trailing zeros are dropped, so
/// `1500000000000000000` with 18 decimals renders as `1.5`.
pub fn format_token_value(raw: &str, decimals: u32) -> SyncResult<String> {
    if decimals > MAX_TOKEN_DECIMALS {
        return Err(SyncError::MalformedRecord(format!(
            "token decimals {} exceed {}",
            decimals, MAX_TOKEN_DECIMALS
        )));
    }
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SyncError::MalformedRecord(format!(
            "token value {:?} is not a non-negative integer",
            raw
        )));
    }
    let value = trimmed
        .parse::<BigUint>()
        .map_err(|e| SyncError::MalformedRecord(format!("token value {:?}: {}", raw, e)))?;
    if value.is_zero() {
        return Ok("0".to_string());
    }

    let divisor = BigUint::from(10u32).pow(decimals);
    let (whole, fraction) = value.div_rem(&divisor);
    if decimals == 0 || fraction.is_zero() {
        return Ok(whole.to_string());
    }

    let digits = fraction.to_string();
    let padded = "0".repeat((decimals as usize).saturating_sub(digits.len())) + &digits;
    let truncated: String = padded.chars().take(MAX_DISPLAY_FRACTION_DIGITS).collect();
    let fraction_digits = truncated.trim_end_matches('0');
    if fraction_digits.is_empty() {
        Ok(whole.to_string())
    } else {
        Ok(format!("{}.{}", whole, fraction_digits))
    }
}

/// Keeps integer amounts as text. JSON numbers are only accepted when they are exact
/// unsigned integers; a float has already lost digits and is rejected.
struct IntegerTextVisitor;

impl<'de> Visitor<'de> for IntegerTextVisitor {
    type Value = String;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an unsigned integer or a string of digits")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
        if v < 0 {
            return Err(E::custom(format!("negative amount {}", v)));
        }
        Ok(v.to_string())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
        Err(E::custom(format!(
            "numeric amount {} is not an exact integer, send it as a string",
            v
        )))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
        Ok(v)
    }
}

/// Accepts either `"42"` or `42` and keeps the digits as text.
pub fn deserialize_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(IntegerTextVisitor)
}

pub fn deserialize_u64_from_string_or_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let s = deserializer.deserialize_any(IntegerTextVisitor)?;
    s.parse::<u64>().map_err(de::Error::custom)
}

/// Treats an explicit `null` the same as a missing field.
pub fn deserialize_null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
