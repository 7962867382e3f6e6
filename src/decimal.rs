//! Decimal <-> integer helpers for tick/lot arithmetic (spec §4.2).
//!
//! Prices and quantities are arbitrary-precision decimals
//! ([`BigDecimal`]); ticks and lots are arbitrary-precision integers
//! ([`BigInt`]/[`BigUint`]), since no exchange's tick/lot scale can be
//! assumed to fit a fixed-width fast path (§9's Design Notes).

use bigdecimal::BigDecimal;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{Signed, ToPrimitive, Zero};

use crate::error::{Error, Result};

fn ten_pow(n: u64) -> BigInt {
    BigInt::from(10u8).pow(n as u32)
}

/// `value / unit` as an exact integer, or [`Error::Precision`] if it
/// isn't exact.
fn exact_ratio(value: &BigDecimal, unit: &BigDecimal) -> Result<BigInt> {
    let (v_val, v_scale) = value.as_bigint_and_exponent();
    let (u_val, u_scale) = unit.as_bigint_and_exponent();

    // Rescale both integer parts to a common decimal scale so the
    // 10^-scale factors cancel, leaving a plain integer division.
    let scale = v_scale.max(u_scale);
    let v_scaled = &v_val * ten_pow((scale - v_scale) as u64);
    let u_scaled = &u_val * ten_pow((scale - u_scale) as u64);

    if u_scaled.is_zero() {
        return Err(Error::Precision);
    }

    let (quot, rem) = (&v_scaled / &u_scaled, &v_scaled % &u_scaled);
    if !rem.is_zero() {
        return Err(Error::Precision);
    }
    Ok(quot)
}

/// The exact integer number of ticks in `price`.
pub fn to_ticks(price: &BigDecimal, tick_size: &BigDecimal) -> Result<BigUint> {
    let ticks = exact_ratio(price, tick_size)?;
    non_negative(ticks)
}

/// The exact integer number of lots in `qty`.
pub fn to_lots(qty: &BigDecimal, lot_size: &BigDecimal) -> Result<BigUint> {
    let lots = exact_ratio(qty, lot_size)?;
    non_negative(lots)
}

fn non_negative(v: BigInt) -> Result<BigUint> {
    if v.is_negative() {
        return Err(Error::Precision);
    }
    let (_, magnitude) = v.into_parts();
    Ok(magnitude)
}

/// Decompose a decimal into `(v, s)` with `d == v * 10^(-s)`, `s` the
/// scale after stripping trailing zeros, `v` fitting in one signed byte.
/// Used only for tick/lot sizes carried in a snapshot header.
pub fn dec_to_ints(d: &BigDecimal) -> Result<(i8, i8)> {
    let normalized = d.normalized();
    let (v, s) = normalized.as_bigint_and_exponent();

    let v = v.to_i64().ok_or(Error::Precision)?;
    let v = i8::try_from(v).map_err(|_| Error::Precision)?;
    let s = i8::try_from(s).map_err(|_| Error::Precision)?;
    Ok((v, s))
}

/// Inverse of [`dec_to_ints`].
pub fn ints_to_dec(v: i8, s: i8) -> BigDecimal {
    BigDecimal::new(BigInt::from(v), s as i64)
}

/// Reconstruct a price from its integer tick count.
pub fn from_ticks(ticks: &BigUint, tick_size: &BigDecimal) -> BigDecimal {
    BigDecimal::new(BigInt::from_biguint(Sign::Plus, ticks.clone()), 0) * tick_size.clone()
}

/// Reconstruct a quantity from its integer lot count.
pub fn from_lots(lots: &BigUint, lot_size: &BigDecimal) -> BigDecimal {
    BigDecimal::new(BigInt::from_biguint(Sign::Plus, lots.clone()), 0) * lot_size.clone()
}

/// `bitlength(max(price)/tick_size as integer)` over a set of levels'
/// prices.
pub fn max_price_bits<'a>(
    tick_size: &BigDecimal,
    prices: impl Iterator<Item = &'a BigDecimal>,
) -> Result<u32> {
    let mut max_bits = 0u32;
    for price in prices {
        let ticks = to_ticks(price, tick_size)?;
        max_bits = max_bits.max(ticks.bits() as u32);
    }
    Ok(max_bits)
}

/// `bitlength(max(qty)/lot_size as integer)` over a set of levels' qtys.
pub fn max_qty_bits<'a>(
    lot_size: &BigDecimal,
    qtys: impl Iterator<Item = &'a BigDecimal>,
) -> Result<u32> {
    let mut max_bits = 0u32;
    for qty in qtys {
        let lots = to_lots(qty, lot_size)?;
        max_bits = max_bits.max(lots.bits() as u32);
    }
    Ok(max_bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn to_ticks_exact() {
        let price = dec("125000.01");
        let tick = dec("0.01");
        assert_eq!(to_ticks(&price, &tick).unwrap(), BigUint::from(12500001u32));
    }

    #[test]
    fn to_ticks_inexact_is_precision_error() {
        let price = dec("125000.015");
        let tick = dec("0.01");
        assert!(matches!(to_ticks(&price, &tick), Err(Error::Precision)));
    }

    #[test]
    fn dec_to_ints_round_trip() {
        let (v, s) = dec_to_ints(&dec("0.01")).unwrap();
        assert_eq!((v, s), (1, 2));
        assert_eq!(ints_to_dec(v, s), dec("0.01"));

        let (v, s) = dec_to_ints(&dec("0.000001")).unwrap();
        assert_eq!((v, s), (1, 6));
    }

    #[test]
    fn huge_price_overflows_byte_scale_but_not_ticks() {
        // 10^59 itself doesn't need dec_to_ints (only tick/lot sizes do),
        // but to_ticks must handle it as an ordinary big integer.
        let price = dec("100000000000000000000000000000000000000000000000000000000");
        let tick = dec("1");
        let ticks = to_ticks(&price, &tick).unwrap();
        assert!(ticks.bits() > 64);
    }
}
