//! Amount Units
//!
//! Helpers for base-unit amounts (lamports, micro-USDC, ...).
//! Amounts are `u128` base units end to end. Conversions to and from
//! human-readable decimals go through strings, never through `f64`.

/// Amount in token base units
pub type Amount = u128;

/// Lamports per SOL
pub const LAMPORTS_PER_SOL: Amount = 1_000_000_000;

/// Basis points in 100%
pub const BPS_DENOMINATOR: Amount = 10_000;

/// Take `bps` basis points of an amount (rounds down)
///
/// `None` when `amount * bps` does not fit in `u128`.
pub fn bps_of(amount: Amount, bps: u32) -> Option<Amount> {
    amount
        .checked_mul(bps as Amount)
        .map(|scaled| scaled / BPS_DENOMINATOR)
}

/// Fee as a display percentage of the input amount
pub fn fee_percent(fee: Amount, input: Amount) -> f64 {
    if input == 0 {
        return 0.0;
    }
    // Display only; the integer fee is authoritative
    (fee as f64 / input as f64) * 100.0
}

/// Format base units as a decimal string (e.g. 250_000_000 lamports -> "0.25")
pub fn format_base_units(amount: Amount, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }

    let scale = 10u128.pow(decimals as u32);
    let whole = amount / scale;
    let frac = amount % scale;

    if frac == 0 {
        return whole.to_string();
    }

    let frac_str = format!("{:0width$}", frac, width = decimals as usize);
    format!("{}.{}", whole, frac_str.trim_end_matches('0'))
}

/// Parse a decimal string into base units (e.g. "1.5" SOL -> 1_500_000_000)
///
/// Returns `None` for malformed input or more fractional digits than `decimals`.
pub fn to_base_units(value: &str, decimals: u8) -> Option<Amount> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let (whole, frac) = match value.split_once('.') {
        Some((w, f)) => (w, f),
        None => (value, ""),
    };

    if frac.len() > decimals as usize {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let scale = 10u128.pow(decimals as u32);
    let whole: Amount = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let frac_scaled: Amount = if frac.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac, width = decimals as usize);
        padded.parse().ok()?
    };

    whole.checked_mul(scale)?.checked_add(frac_scaled)
}

/// Format number with thousands separators
pub fn format_with_commas(n: Amount) -> String {
    let s = n.to_string();
    let mut result = String::new();
    let chars: Vec<char> = s.chars().collect();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }

    result
}

/// Parse a raw base-unit amount from string ("1,000,000" and "1_000_000" accepted)
pub fn parse_amount(s: &str) -> Option<Amount> {
    s.trim().replace([',', '_'], "").parse().ok()
}

/// Amounts as decimal strings; numbers are accepted on input
pub mod serde_amount {
    use super::Amount;
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        struct AmountVisitor;

        impl<'de> Visitor<'de> for AmountVisitor {
            type Value = Amount;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a base-unit amount as string or unsigned integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
                v.parse().map_err(|_| E::custom(format!("invalid amount: {}", v)))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
                Ok(v as Amount)
            }

            fn visit_u128<E: de::Error>(self, v: u128) -> Result<Amount, E> {
                Ok(v)
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bps_of() {
        assert_eq!(bps_of(100_000_000, 35), Some(350_000));
        assert_eq!(bps_of(1_000, 10), Some(1));
        assert_eq!(bps_of(999, 10), Some(0));
        assert_eq!(bps_of(Amount::MAX, 1), Some(Amount::MAX / BPS_DENOMINATOR));
        assert_eq!(bps_of(Amount::MAX, 10_000), None);
        assert_eq!(bps_of(Amount::MAX / 2, 35), None);
    }

    #[test]
    fn test_format_base_units() {
        assert_eq!(format_base_units(0, 9), "0");
        assert_eq!(format_base_units(250_000_000, 9), "0.25");
        assert_eq!(format_base_units(LAMPORTS_PER_SOL, 9), "1");
        assert_eq!(format_base_units(1_234_567, 6), "1.234567");
        assert_eq!(format_base_units(42, 0), "42");
    }

    #[test]
    fn test_to_base_units() {
        assert_eq!(to_base_units("1.5", 9), Some(1_500_000_000));
        assert_eq!(to_base_units("0.1", 9), Some(100_000_000));
        assert_eq!(to_base_units("10", 6), Some(10_000_000));
        assert_eq!(to_base_units(".5", 6), Some(500_000));
        assert_eq!(to_base_units("1.0000001", 6), None);
        assert_eq!(to_base_units("abc", 6), None);
        assert_eq!(to_base_units("-1", 6), None);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1000"), Some(1000));
        assert_eq!(parse_amount("1,000,000"), Some(1_000_000));
        assert_eq!(parse_amount("250_000_000"), Some(250_000_000));
        assert_eq!(parse_amount("nope"), None);
    }

    #[test]
    fn test_format_with_commas() {
        assert_eq!(format_with_commas(150_000_000), "150,000,000");
        assert_eq!(format_with_commas(999), "999");
    }

    #[test]
    fn test_serde_amount_accepts_string_and_number() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Wrapper {
            #[serde(with = "serde_amount")]
            amount: Amount,
        }

        let json = serde_json::to_string(&Wrapper { amount: 340_282_366_920_938_463 }).unwrap();
        assert_eq!(json, r#"{"amount":"340282366920938463"}"#);

        let from_str: Wrapper = serde_json::from_str(r#"{"amount":"42"}"#).unwrap();
        assert_eq!(from_str.amount, 42);

        let from_num: Wrapper = serde_json::from_str(r#"{"amount":42}"#).unwrap();
        assert_eq!(from_num.amount, 42);
    }
}
