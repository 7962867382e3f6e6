//! Encode/decode a trade print (spec §4.6).
//!
//! Layout: a bit-packed fixed header (`ticks:pbits | lots:qbits |
//! maker_is_bid:1 | numeric_id?:1`, padded to the next byte boundary
//! the way [`crate::bitpack::pack`] always pads), followed by the
//! trade id's raw bytes running to the end of the payload: the
//! minimal unsigned big-endian integer for a numeric id, or raw UTF-8
//! bytes for a string id. There is no length field for the id; the
//! frame's own payload length is what delimits it.

use bigdecimal::BigDecimal;
use num_bigint::BigUint;

use crate::bitpack::{self, ubytes_to_uint, uint_to_ubytes};
use crate::context::Context;
use crate::decimal::{from_lots, from_ticks};
use crate::diff::{lots_within_width, ticks_within_width};
use crate::error::{Error, Result};
use crate::message::TradeId;

fn fixed_bit_widths(ctx: &Context) -> [u32; 4] {
    [ctx.pbits() as u32, ctx.qbits() as u32, 1, 1]
}

/// Encode a trade's price, qty, maker side, and id.
///
/// [`Error::Overflow`] means price or qty no longer fit the context's
/// current widths; the caller must resolve the snapshot delay and
/// re-encode as a snapshot instead (spec §4.8).
pub fn encode(ctx: &Context, price: &BigDecimal, qty: &BigDecimal, maker_is_bid: bool, tid: &TradeId) -> Result<Vec<u8>> {
    let ticks = ticks_within_width(ctx, price)?;
    let lots = lots_within_width(ctx, qty)?;
    let numeric_id = matches!(tid, TradeId::Numeric(_));

    let values = vec![
        ticks,
        lots,
        BigUint::from(maker_is_bid as u8),
        BigUint::from(numeric_id as u8),
    ];
    let mut payload = bitpack::pack(&values, &fixed_bit_widths(ctx))?;

    let id_bytes = match tid {
        TradeId::Numeric(n) => uint_to_ubytes(n),
        TradeId::String(s) => s.as_bytes().to_vec(),
    };
    payload.extend_from_slice(&id_bytes);
    Ok(payload)
}

/// Decode a trade payload back into `(price, qty, maker_is_bid, tid)`.
pub fn decode(ctx: &Context, payload: &[u8]) -> Result<(BigDecimal, BigDecimal, bool, TradeId)> {
    let widths = fixed_bit_widths(ctx);
    let total_bits: u32 = widths.iter().sum();
    let fixed_bytes = ((total_bits + 7) / 8) as usize;
    if payload.len() < fixed_bytes {
        return Err(Error::CorruptStream("trade payload shorter than its fixed header".into()));
    }

    let values = bitpack::unpack(payload, &widths)?;

    let price = from_ticks(&values[0], ctx.tick_size());
    let qty = from_lots(&values[1], ctx.lot_size());
    let maker_is_bid = !values[2].eq(&BigUint::from(0u8));
    let numeric_id = !values[3].eq(&BigUint::from(0u8));

    let id_bytes = &payload[fixed_bytes..];

    let tid = if numeric_id {
        TradeId::Numeric(ubytes_to_uint(id_bytes))
    } else {
        TradeId::String(String::from_utf8(id_bytes.to_vec())?)
    };

    Ok((price, qty, maker_is_bid, tid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn ctx_with(pbits: u8, qbits: u8) -> Context {
        let mut ctx = Context::default();
        ctx.pbits = pbits;
        ctx.qbits = qbits;
        ctx.tick_size = dec("0.01");
        ctx.lot_size = dec("0.001");
        ctx.ready = true;
        ctx
    }

    #[test]
    fn numeric_id_round_trip() {
        let ctx = ctx_with(24, 24);
        let tid = TradeId::Numeric(BigUint::from(123456789u64));
        let payload = encode(&ctx, &dec("100.25"), &dec("3.500"), true, &tid).unwrap();
        let (price, qty, maker_is_bid, decoded_tid) = decode(&ctx, &payload).unwrap();
        assert_eq!(price, dec("100.25"));
        assert_eq!(qty, dec("3.500"));
        assert!(maker_is_bid);
        assert_eq!(decoded_tid, tid);
    }

    #[test]
    fn string_id_round_trip() {
        let ctx = ctx_with(24, 24);
        let tid = TradeId::String("abc-trade-9".to_owned());
        let payload = encode(&ctx, &dec("99.99"), &dec("0.001"), false, &tid).unwrap();
        let (_, _, maker_is_bid, decoded_tid) = decode(&ctx, &payload).unwrap();
        assert!(!maker_is_bid);
        assert_eq!(decoded_tid, tid);
    }

    #[test]
    fn price_overflow_is_reported() {
        let ctx = ctx_with(4, 24);
        let tid = TradeId::Numeric(BigUint::from(1u8));
        let err = encode(&ctx, &dec("100.25"), &dec("1"), true, &tid).unwrap_err();
        assert!(matches!(err, Error::Overflow));
    }
}
