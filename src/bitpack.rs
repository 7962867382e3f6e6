//! Pack/unpack unsigned integers of arbitrary bit width into a minimal
//! byte sequence (spec §4.1).
//!
//! Widths up to 64 bits take a fast path through native `u64` shifts;
//! wider values (extreme ticks/lots, per §9's Design Notes) fall back to
//! bit-by-bit extraction on a [`BigUint`].

use bitvec::prelude::*;
use num_bigint::BigUint;
use num_traits::Zero;

use crate::error::{Error, Result};

type Bits = BitVec<Msb0, u8>;

const FAST_PATH_MAX_WIDTH: u32 = 64;

/// Pack `values` into a byte sequence, each value occupying its
/// corresponding entry in `widths` (most-significant value first,
/// zero-padded on the right to the next byte boundary).
pub fn pack(values: &[BigUint], widths: &[u32]) -> Result<Vec<u8>> {
    assert_eq!(values.len(), widths.len(), "values/widths length mismatch");

    let mut bits: Bits = BitVec::with_capacity(widths.iter().sum::<u32>() as usize);
    for (value, &width) in values.iter().zip(widths) {
        push_value(&mut bits, value, width)?;
    }
    Ok(bits.into_vec())
}

/// Inverse of [`pack`]: split `bytes` into values of the given `widths`,
/// ignoring any trailing pad bits.
pub fn unpack(bytes: &[u8], widths: &[u32]) -> Result<Vec<BigUint>> {
    let total: usize = widths.iter().map(|&w| w as usize).sum();
    if total > bytes.len() * 8 {
        return Err(Error::CorruptStream(format!(
            "expected {} bits but only {} bytes available",
            total,
            bytes.len()
        )));
    }

    let bits: Bits = BitVec::from_vec(bytes.to_vec());
    let mut offset = 0usize;
    let mut out = Vec::with_capacity(widths.len());
    for &width in widths {
        let width = width as usize;
        out.push(read_value(&bits[offset..offset + width]));
        offset += width;
    }
    Ok(out)
}

fn push_value(bits: &mut Bits, value: &BigUint, width: u32) -> Result<()> {
    if value.bits() > width as u64 {
        return Err(Error::Overflow);
    }

    if width <= FAST_PATH_MAX_WIDTH {
        let v = value
            .iter_u64_digits()
            .next()
            .unwrap_or(0u64);
        for i in (0..width).rev() {
            bits.push((v >> i) & 1 == 1);
        }
        return Ok(());
    }

    let one = BigUint::from(1u8);
    for i in (0..width).rev() {
        let bit = (value >> (i as usize)) & &one == one;
        bits.push(bit);
    }
    Ok(())
}

fn read_value(slice: &BitSlice<Msb0, u8>) -> BigUint {
    if slice.len() <= FAST_PATH_MAX_WIDTH as usize {
        let mut v: u64 = 0;
        for bit in slice.iter() {
            v = (v << 1) | (*bit as u64);
        }
        return BigUint::from(v);
    }

    let mut v = BigUint::zero();
    for bit in slice.iter() {
        v <<= 1u32;
        if *bit {
            v += 1u8;
        }
    }
    v
}

/// The minimal little-endian byte representation of a nonnegative
/// integer: one byte for zero, `ceil(bitlength(n)/8)` otherwise.
pub fn uint_to_ubytes(n: &BigUint) -> Vec<u8> {
    if n.is_zero() {
        return vec![0];
    }
    n.to_bytes_le()
}

/// Inverse of [`uint_to_ubytes`].
pub fn ubytes_to_uint(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_le(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(n: u64) -> BigUint {
        BigUint::from(n)
    }

    #[test]
    fn pack_unpack_round_trip() {
        let values = vec![b(5), b(1), b(1023)];
        let widths = vec![4, 1, 10];
        let bytes = pack(&values, &widths).unwrap();
        assert_eq!(bytes.len(), 2); // ceil(15/8)
        let back = unpack(&bytes, &widths).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn pack_overflow_is_rejected() {
        let values = vec![b(16)];
        let widths = vec![4];
        assert!(matches!(pack(&values, &widths), Err(Error::Overflow)));
    }

    #[test]
    fn pack_wide_value_uses_bigint_path() {
        let huge = BigUint::from(10u32).pow(30);
        let values = vec![huge.clone()];
        let widths = vec![128];
        let bytes = pack(&values, &widths).unwrap();
        let back = unpack(&bytes, &widths).unwrap();
        assert_eq!(back[0], huge);
    }

    #[test]
    fn uint_ubytes_round_trip() {
        assert_eq!(uint_to_ubytes(&b(0)), vec![0]);
        assert_eq!(uint_to_ubytes(&b(255)), vec![255]);
        assert_eq!(uint_to_ubytes(&b(256)), vec![0, 1]);
        assert_eq!(ubytes_to_uint(&[0, 1]), b(256));
    }

    #[test]
    fn zero_width_value_must_be_zero() {
        assert!(pack(&[b(1)], &[0]).is_err());
        assert!(pack(&[b(0)], &[0]).is_ok());
    }
}
