//! The logical message types at the codec's API boundary (spec §3),
//! flattened into a tagged sum type in place of the source's
//! dynamic-typed dispatch (spec §9).

use bigdecimal::BigDecimal;
use num_bigint::BigUint;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// A single `{price, qty}` level inside a [`BookSnapshot`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(crate = "serde_crate"))]
pub struct Level {
    pub price: BigDecimal,
    pub qty: BigDecimal,
}

impl Level {
    pub fn new(price: BigDecimal, qty: BigDecimal) -> Self {
        Level { price, qty }
    }
}

/// A full book snapshot (spec §3, §4.4).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(crate = "serde_crate"))]
pub struct BookSnapshot {
    pub bids: Vec<Level>,
    pub asks: Vec<Level>,
    pub timestamp: u64,
    pub tick_size: BigDecimal,
    pub lot_size: BigDecimal,
    /// Carries no new information relative to the reader's own
    /// reconstructed book; exists purely for consistency checks.
    pub redundant: bool,
}

/// The callback a diff or trade supplies to resolve an overflow: "a
/// lazy thunk resolved only on overflow" in the source, re-expressed as
/// an `FnOnce` invoked at most once (spec §9).
pub type SnapshotDelay = Box<dyn FnOnce() -> BookSnapshot>;

/// A single price-level update. `qty == 0` denotes a removal (spec §3).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(crate = "serde_crate"))]
pub struct BookDiff {
    pub price: BigDecimal,
    pub qty: BigDecimal,
    pub is_bid: bool,
    pub timestamp: u64,
    /// Input-only: resolved at most once if this diff overflows the
    /// context's current bit widths. Never retained across a
    /// round-trip.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub snapshot_delay: Option<SnapshotDelay>,
}

impl std::fmt::Debug for BookDiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookDiff")
            .field("price", &self.price)
            .field("qty", &self.qty)
            .field("is_bid", &self.is_bid)
            .field("timestamp", &self.timestamp)
            .field("snapshot_delay", &self.snapshot_delay.as_ref().map(|_| "Fn"))
            .finish()
    }
}

impl PartialEq for BookDiff {
    /// `snapshot_delay` is input-only metadata (spec §8's round-trip
    /// property explicitly excludes it), so equality ignores it.
    fn eq(&self, other: &Self) -> bool {
        self.price == other.price
            && self.qty == other.qty
            && self.is_bid == other.is_bid
            && self.timestamp == other.timestamp
    }
}

impl BookDiff {
    pub fn new(price: BigDecimal, qty: BigDecimal, is_bid: bool, timestamp: u64) -> Self {
        BookDiff {
            price,
            qty,
            is_bid,
            timestamp,
            snapshot_delay: None,
        }
    }

    pub fn with_snapshot_delay(mut self, delay: SnapshotDelay) -> Self {
        self.snapshot_delay = Some(delay);
        self
    }

    pub fn is_removal(&self) -> bool {
        use num_traits::Zero;
        self.qty.is_zero()
    }
}

/// A trade id: either a nonnegative integer or a UTF-8 string (spec §3,
/// §4.6).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(crate = "serde_crate"))]
pub enum TradeId {
    Numeric(BigUint),
    String(String),
}

/// A single trade print (spec §3, §4.6).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(crate = "serde_crate"))]
pub struct Trade {
    pub price: BigDecimal,
    pub qty: BigDecimal,
    pub maker_is_bid: bool,
    pub tid: TradeId,
    pub timestamp: u64,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub snapshot_delay: Option<SnapshotDelay>,
}

impl std::fmt::Debug for Trade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trade")
            .field("price", &self.price)
            .field("qty", &self.qty)
            .field("maker_is_bid", &self.maker_is_bid)
            .field("tid", &self.tid)
            .field("timestamp", &self.timestamp)
            .field("snapshot_delay", &self.snapshot_delay.as_ref().map(|_| "Fn"))
            .finish()
    }
}

impl PartialEq for Trade {
    fn eq(&self, other: &Self) -> bool {
        self.price == other.price
            && self.qty == other.qty
            && self.maker_is_bid == other.maker_is_bid
            && self.tid == other.tid
            && self.timestamp == other.timestamp
    }
}

impl Trade {
    pub fn new(price: BigDecimal, qty: BigDecimal, maker_is_bid: bool, tid: TradeId, timestamp: u64) -> Self {
        Trade {
            price,
            qty,
            maker_is_bid,
            tid,
            timestamp,
            snapshot_delay: None,
        }
    }

    pub fn with_snapshot_delay(mut self, delay: SnapshotDelay) -> Self {
        self.snapshot_delay = Some(delay);
        self
    }
}

/// A disconnect marker; carries only a timestamp (spec §3, §4.7).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(crate = "serde_crate"))]
pub struct Disconnect {
    pub timestamp: u64,
}

/// The tagged sum type flattening the source's dynamic-typed message
/// dispatch (spec §9): every logical message the API accepts or
/// produces.
#[derive(Debug, PartialEq)]
pub enum Message {
    Snapshot(BookSnapshot),
    Diff(BookDiff),
    Trade(Trade),
    Disconnect(Disconnect),
}

impl Message {
    pub fn timestamp(&self) -> u64 {
        match self {
            Message::Snapshot(s) => s.timestamp,
            Message::Diff(d) => d.timestamp,
            Message::Trade(t) => t.timestamp,
            Message::Disconnect(d) => d.timestamp,
        }
    }
}

impl From<BookSnapshot> for Message {
    fn from(s: BookSnapshot) -> Self {
        Message::Snapshot(s)
    }
}

impl From<BookDiff> for Message {
    fn from(d: BookDiff) -> Self {
        Message::Diff(d)
    }
}

impl From<Trade> for Message {
    fn from(t: Trade) -> Self {
        Message::Trade(t)
    }
}

impl From<Disconnect> for Message {
    fn from(d: Disconnect) -> Self {
        Message::Disconnect(d)
    }
}
