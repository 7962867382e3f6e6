use std::str::FromStr;

use arthur_codec::{BookDiff, BookSnapshot, Disconnect, Error, Level, Message, Reader, Trade, TradeId, Writer};
use bigdecimal::BigDecimal;
use num_bigint::BigUint;

fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

fn base_snapshot(timestamp: u64) -> BookSnapshot {
    BookSnapshot {
        bids: vec![],
        asks: vec![],
        timestamp,
        tick_size: dec("0.01"),
        lot_size: dec("0.0001"),
        redundant: false,
    }
}

#[test]
fn empty_snapshot_diff_and_removal_round_trip() {
    let mut buf = Vec::new();
    let mut w = Writer::new(&mut buf);
    w.write(base_snapshot(1_000)).unwrap();
    w.write(BookDiff::new(dec("100.50"), dec("2.5"), true, 1_005)).unwrap();
    w.write(BookDiff::new(dec("100.50"), dec("0"), true, 1_010)).unwrap();
    w.close().unwrap();

    let mut r = Reader::new(buf.as_slice());
    assert!(matches!(r.read().unwrap().unwrap(), Message::Snapshot(_)));

    let diff = match r.read().unwrap().unwrap() {
        Message::Diff(d) => d,
        other => panic!("expected diff, got {:?}", other),
    };
    assert!(!diff.is_removal());
    assert_eq!(diff.price, dec("100.50"));

    let removal = match r.read().unwrap().unwrap() {
        Message::Diff(d) => d,
        other => panic!("expected removal, got {:?}", other),
    };
    assert!(removal.is_removal());
    assert_eq!(removal.price, dec("100.50"));

    assert!(r.read().unwrap().is_none());
}

#[test]
fn overflow_with_snapshot_delay_widens_and_keeps_the_trade() {
    let mut buf = Vec::new();
    let mut w = Writer::new(&mut buf);
    let snap = base_snapshot(0);
    w.write(snap.clone()).unwrap();

    let huge_price = dec("123456789123456789123456789.12");
    let delayed_snap = snap.clone();
    let trade = Trade::new(huge_price.clone(), dec("1"), false, TradeId::Numeric(BigUint::from(7u32)), 5)
        .with_snapshot_delay(Box::new(move || delayed_snap));
    w.write(trade).unwrap();
    w.close().unwrap();

    let mut r = Reader::new(buf.as_slice());
    assert!(matches!(r.read().unwrap().unwrap(), Message::Snapshot(_)));
    assert!(matches!(r.read().unwrap().unwrap(), Message::Snapshot(_))); // in-line recovery snapshot
    let trade = match r.read().unwrap().unwrap() {
        Message::Trade(t) => t,
        other => panic!("expected trade, got {:?}", other),
    };
    assert_eq!(trade.price, huge_price);
    assert!(r.read().unwrap().is_none());
}

#[test]
fn overflowing_diff_with_delay_recovers_but_the_diff_itself_is_dropped() {
    let mut buf = Vec::new();
    let mut w = Writer::new(&mut buf);
    w.write(base_snapshot(0)).unwrap();

    let huge_price = dec("123456789123456789123456789.12");
    let delayed_snap = base_snapshot(0);
    let diff = BookDiff::new(huge_price, dec("2.5"), true, 1).with_snapshot_delay(Box::new(move || delayed_snap));
    w.write(diff).unwrap();
    w.close().unwrap();

    let mut r = Reader::new(buf.as_slice());
    assert!(matches!(r.read().unwrap().unwrap(), Message::Snapshot(_)));
    assert!(matches!(r.read().unwrap().unwrap(), Message::Snapshot(_))); // in-line recovery snapshot
    // The original diff is dropped: the recovery snapshot already
    // reflects the state change.
    assert!(r.read().unwrap().is_none());
}

#[test]
fn overflow_without_snapshot_delay_is_missing_snapshot() {
    let mut buf = Vec::new();
    let mut w = Writer::new(&mut buf);
    w.write(base_snapshot(0)).unwrap();

    let huge_price = dec("123456789123456789123456789.12");
    let trade = Trade::new(huge_price, dec("1"), false, TradeId::Numeric(BigUint::from(7u32)), 5);
    assert!(matches!(w.write(trade), Err(Error::MissingSnapshot)));
}

#[test]
fn trade_with_numeric_and_string_ids_round_trip() {
    let mut buf = Vec::new();
    let mut w = Writer::new(&mut buf);
    w.write(base_snapshot(0)).unwrap();
    w.write(Trade::new(dec("50.01"), dec("3"), true, TradeId::Numeric(BigUint::from(42u32)), 1))
        .unwrap();
    w.write(Trade::new(dec("50.02"), dec("1.5"), false, TradeId::String("order-xyz".into()), 2))
        .unwrap();
    w.close().unwrap();

    let mut r = Reader::new(buf.as_slice());
    r.read().unwrap().unwrap(); // snapshot

    let t1 = match r.read().unwrap().unwrap() {
        Message::Trade(t) => t,
        other => panic!("expected trade, got {:?}", other),
    };
    assert_eq!(t1.tid, TradeId::Numeric(BigUint::from(42u32)));

    let t2 = match r.read().unwrap().unwrap() {
        Message::Trade(t) => t,
        other => panic!("expected trade, got {:?}", other),
    };
    assert_eq!(t2.tid, TradeId::String("order-xyz".into()));
}

#[test]
fn disconnect_round_trips_with_its_timestamp() {
    let mut buf = Vec::new();
    let mut w = Writer::new(&mut buf);
    w.write(base_snapshot(0)).unwrap();
    w.write(Disconnect { timestamp: 42 }).unwrap();
    w.close().unwrap();

    let mut r = Reader::new(buf.as_slice());
    r.read().unwrap().unwrap(); // snapshot
    let msg = r.read().unwrap().unwrap();
    assert_eq!(msg, Message::Disconnect(Disconnect { timestamp: 42 }));
}

#[test]
fn close_is_idempotent_and_blocks_further_writes() {
    let mut buf = Vec::new();
    let mut w = Writer::new(&mut buf);
    w.write(base_snapshot(0)).unwrap();
    w.close().unwrap();
    w.close().unwrap();
    assert!(matches!(w.write(Disconnect { timestamp: 1 }), Err(Error::StreamClosed)));
}

#[test]
fn timestamp_resyncs_once_the_16_bit_offset_window_is_exceeded() {
    let mut buf = Vec::new();
    let mut w = Writer::new(&mut buf);
    w.write(base_snapshot(0)).unwrap();
    // A timestamp far beyond what a u16 offset can express forces a
    // fresh TIMESTAMP frame instead of an out-of-range ts_off.
    w.write(Disconnect { timestamp: 100_000 }).unwrap();
    w.close().unwrap();

    let mut r = Reader::new(buf.as_slice());
    r.read().unwrap().unwrap(); // snapshot
    let msg = r.read().unwrap().unwrap();
    assert_eq!(msg, Message::Disconnect(Disconnect { timestamp: 100_000 }));
}

#[test]
fn a_full_sequence_of_messages_round_trips_in_order() {
    let mut buf = Vec::new();
    let mut w = Writer::new(&mut buf);

    let snap = BookSnapshot {
        bids: vec![Level::new(dec("100.00"), dec("2"))],
        asks: vec![Level::new(dec("100.50"), dec("3"))],
        timestamp: 0,
        tick_size: dec("0.01"),
        lot_size: dec("1"),
        redundant: false,
    };
    w.write(snap.clone()).unwrap();
    w.write(BookDiff::new(dec("100.25"), dec("5"), false, 1)).unwrap();
    w.write(Trade::new(dec("100.25"), dec("1"), true, TradeId::Numeric(BigUint::from(1u8)), 2))
        .unwrap();
    w.write(Disconnect { timestamp: 3 }).unwrap();
    w.close().unwrap();

    let mut r = Reader::new(buf.as_slice());
    let kinds: Vec<&'static str> = std::iter::from_fn(|| r.read().unwrap())
        .map(|m| match m {
            Message::Snapshot(_) => "snapshot",
            Message::Diff(_) => "diff",
            Message::Trade(_) => "trade",
            Message::Disconnect(_) => "disconnect",
        })
        .collect();
    assert_eq!(kinds, vec!["snapshot", "diff", "trade", "disconnect"]);
}
