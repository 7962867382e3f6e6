//! Encode/decode a single book-level update (spec §4.5).
//!
//! A removal carries only a price, the low `pbits` bits of a
//! `ceil(pbits/8)`-byte payload (the reader already knows the level is
//! gone because `qty == 0`); an add/change packs `[lots | ticks]` as
//! one big unsigned integer, ticks in the low `pbits` bits and lots in
//! whatever bits remain once the payload's own byte length is fixed —
//! a lot value has no declared width of its own, it simply consumes
//! the rest of the frame. Side and add-vs-remove are carried by the
//! frame's [`crate::frame::MessageType`], not by anything in this
//! payload.

use bigdecimal::BigDecimal;
use num_bigint::BigUint;

use crate::bitpack;
use crate::context::Context;
use crate::decimal::{from_lots, from_ticks, to_lots, to_ticks};
use crate::error::{Error, Result};

pub(crate) fn ticks_within_width(ctx: &Context, price: &BigDecimal) -> Result<BigUint> {
    let ticks = to_ticks(price, ctx.tick_size())?;
    if ticks.bits() > ctx.pbits() as u64 {
        return Err(Error::Overflow);
    }
    Ok(ticks)
}

pub(crate) fn lots_within_width(ctx: &Context, qty: &BigDecimal) -> Result<BigUint> {
    let lots = to_lots(qty, ctx.lot_size())?;
    if lots.bits() > ctx.qbits() as u64 {
        return Err(Error::Overflow);
    }
    Ok(lots)
}

/// Every frame payload must carry at least one byte (spec §3); a
/// context with `pbits == 0` (no price level ever observed) would
/// otherwise pack to zero bytes.
fn pad_min_one_byte(mut bytes: Vec<u8>) -> Vec<u8> {
    if bytes.is_empty() {
        bytes.push(0);
    }
    bytes
}

/// Encode a removal: just the price, in `ceil(ctx.pbits()/8)` bytes.
///
/// [`Error::Overflow`] means the price no longer fits the context's
/// current width; the caller (the driver) must resolve the diff's
/// `snapshot_delay` and re-encode as a snapshot instead.
pub fn encode_removal(ctx: &Context, price: &BigDecimal) -> Result<Vec<u8>> {
    let ticks = ticks_within_width(ctx, price)?;
    bitpack::pack(&[ticks], &[ctx.pbits() as u32]).map(pad_min_one_byte)
}

/// Decode a removal payload back into a price.
pub fn decode_removal(ctx: &Context, payload: &[u8]) -> Result<BigDecimal> {
    let values = bitpack::unpack(payload, &[ctx.pbits() as u32])?;
    Ok(from_ticks(&values[0], ctx.tick_size()))
}

/// Encode an add/change: `ticks` in the low `pbits` bits, `lots` in
/// whatever bits remain once rounded up to a whole byte. Only the
/// price is checked against the context's width; the lot count simply
/// consumes the rest of the payload (spec §4.5).
pub fn encode_change(ctx: &Context, price: &BigDecimal, qty: &BigDecimal) -> Result<Vec<u8>> {
    let ticks = ticks_within_width(ctx, price)?;
    let lots = to_lots(qty, ctx.lot_size())?;

    let pbits = ctx.pbits() as u32;
    let needed_bits = pbits + lots.bits() as u32;
    let total_bytes = ((needed_bits.max(1) + 7) / 8).max(1);
    let lot_width = total_bytes * 8 - pbits;

    bitpack::pack(&[lots, ticks], &[lot_width, pbits])
}

/// Decode an add/change payload back into `(price, qty)`.
pub fn decode_change(ctx: &Context, payload: &[u8]) -> Result<(BigDecimal, BigDecimal)> {
    let pbits = ctx.pbits() as u32;
    let total_bits = payload.len() as u32 * 8;
    if total_bits < pbits {
        return Err(Error::CorruptStream("diff payload shorter than pbits".into()));
    }
    let lot_width = total_bits - pbits;

    let values = bitpack::unpack(payload, &[lot_width, pbits])?;
    let lots = &values[0];
    let ticks = &values[1];

    let price = from_ticks(ticks, ctx.tick_size());
    let qty = from_lots(lots, ctx.lot_size());
    Ok((price, qty))
}
