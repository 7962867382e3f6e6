//! The serialization context: process-local state shared between a
//! stream's writer and reader, rebuilt from the stream itself on read
//! (spec §3).

use bigdecimal::BigDecimal;
use num_traits::Zero;

/// The writer/reader state machine derived from the context (spec
/// §4.8). Not stored redundantly — computed from `timestamp`/`ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// No TIMESTAMP or SNAPSHOT frame has been seen yet.
    Uninitialized,
    /// A TIMESTAMP frame has been seen, but no SNAPSHOT yet.
    Timed,
    /// At least one SNAPSHOT frame has been seen; diffs/trades/disconnects
    /// may now be written or are expected on read.
    Ready,
}

/// Live encoding state: reference timestamp and the bit widths/scales
/// established by the most recent snapshot.
#[derive(Debug, Clone)]
pub struct Context {
    pub(crate) timestamp: Option<u64>,
    pub(crate) pbits: u8,
    pub(crate) qbits: u8,
    pub(crate) tick_size: BigDecimal,
    pub(crate) lot_size: BigDecimal,
    pub(crate) ready: bool,
}

impl Default for Context {
    fn default() -> Self {
        Context {
            timestamp: None,
            pbits: 0,
            qbits: 0,
            tick_size: BigDecimal::zero(),
            lot_size: BigDecimal::zero(),
            ready: false,
        }
    }
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// The reference epoch timestamp (milliseconds), if established.
    pub fn timestamp(&self) -> Option<u64> {
        self.timestamp
    }

    /// Bits used to encode a price (integer ticks) under the most
    /// recent snapshot.
    pub fn pbits(&self) -> u8 {
        self.pbits
    }

    /// Bits used to encode a quantity (integer lots) under the most
    /// recent snapshot.
    pub fn qbits(&self) -> u8 {
        self.qbits
    }

    pub fn tick_size(&self) -> &BigDecimal {
        &self.tick_size
    }

    pub fn lot_size(&self) -> &BigDecimal {
        &self.lot_size
    }

    /// The current position in the §4.8 state machine.
    pub fn state(&self) -> StreamState {
        if self.ready {
            StreamState::Ready
        } else if self.timestamp.is_some() {
            StreamState::Timed
        } else {
            StreamState::Uninitialized
        }
    }
}
