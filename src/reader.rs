//! The read half of a stream: consumes TIMESTAMP frames transparently
//! and reconstructs each logical message from the frame that follows
//! (spec §4.8).

use std::io::Read;

use bigdecimal::BigDecimal;
use num_traits::Zero;

use crate::context::{Context, StreamState};
use crate::diff;
use crate::disconnect;
use crate::error::{Error, Result};
use crate::frame::{self, MessageType};
use crate::message::{BookDiff, Disconnect, Message, Trade};
use crate::snapshot;
use crate::trade;

/// Reads logical messages back out of an ARTHUR byte stream.
pub struct Reader<R: Read> {
    source: R,
    ctx: Context,
    closed: bool,
}

impl<R: Read> Reader<R> {
    pub fn new(source: R) -> Self {
        Reader {
            source,
            ctx: Context::default(),
            closed: false,
        }
    }

    /// The reader's current view of the stream's bit widths and
    /// reference timestamp.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Read the next logical message, transparently consuming any
    /// TIMESTAMP frames along the way. `Ok(None)` is a clean
    /// end-of-stream.
    pub fn read(&mut self) -> Result<Option<Message>> {
        if self.closed {
            return Err(Error::StreamClosed);
        }

        loop {
            let frame = match frame::read_frame(&mut self.source)? {
                None => return Ok(None),
                Some(f) => f,
            };

            match frame.msg_type {
                MessageType::Timestamp => {
                    let ts = frame::decode_timestamp_payload(&frame.payload)?;
                    self.ctx.timestamp = Some(ts);
                    continue;
                }
                MessageType::Snapshot => {
                    self.require_timed()?;
                    let timestamp = self.frame_timestamp(frame.ts_off)?;
                    let (mut snap, mut new_ctx) = snapshot::decode(&frame.payload)?;
                    snap.timestamp = timestamp;
                    new_ctx.timestamp = self.ctx.timestamp;
                    self.ctx = new_ctx;
                    return Ok(Some(Message::Snapshot(snap)));
                }
                MessageType::BidDiff | MessageType::BidRemoval | MessageType::AskDiff | MessageType::AskRemoval => {
                    self.require_ready()?;
                    let is_bid = matches!(frame.msg_type, MessageType::BidDiff | MessageType::BidRemoval);
                    let is_removal = matches!(frame.msg_type, MessageType::BidRemoval | MessageType::AskRemoval);
                    let (price, qty) = if is_removal {
                        (diff::decode_removal(&self.ctx, &frame.payload)?, BigDecimal::zero())
                    } else {
                        diff::decode_change(&self.ctx, &frame.payload)?
                    };
                    let timestamp = self.frame_timestamp(frame.ts_off)?;
                    return Ok(Some(Message::Diff(BookDiff::new(price, qty, is_bid, timestamp))));
                }
                MessageType::Trade => {
                    self.require_ready()?;
                    let (price, qty, maker_is_bid, tid) = trade::decode(&self.ctx, &frame.payload)?;
                    let timestamp = self.frame_timestamp(frame.ts_off)?;
                    return Ok(Some(Message::Trade(Trade::new(price, qty, maker_is_bid, tid, timestamp))));
                }
                MessageType::Disconnect => {
                    disconnect::decode(&frame.payload)?;
                    let timestamp = self.frame_timestamp(frame.ts_off)?;
                    return Ok(Some(Message::Disconnect(Disconnect { timestamp })));
                }
            }
        }
    }

    /// Mark the stream closed; further reads fail with
    /// [`Error::StreamClosed`]. Calling this more than once is a no-op.
    pub fn close(&mut self) {
        self.closed = true;
    }

    fn frame_timestamp(&self, ts_off: u16) -> Result<u64> {
        let base = self
            .ctx
            .timestamp()
            .ok_or_else(|| Error::CorruptStream("message frame before any timestamp frame".into()))?;
        base.checked_add(ts_off as u64)
            .ok_or_else(|| Error::CorruptStream("timestamp offset overflowed the reference timestamp".into()))
    }

    fn require_timed(&self) -> Result<()> {
        if self.ctx.timestamp().is_none() {
            return Err(Error::CorruptStream("snapshot before any timestamp frame".into()));
        }
        Ok(())
    }

    fn require_ready(&self) -> Result<()> {
        if self.ctx.state() != StreamState::Ready {
            return Err(Error::CorruptStream("diff, trade, or disconnect before any snapshot".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{BookSnapshot, Level};
    use crate::writer::Writer;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn round_trips_snapshot_then_diff_then_trade() {
        let mut buf = Vec::new();
        let mut w = Writer::new(&mut buf);
        let snap = BookSnapshot {
            bids: vec![Level::new(dec("100.00"), dec("1"))],
            asks: vec![Level::new(dec("101.00"), dec("1"))],
            timestamp: 10,
            tick_size: dec("0.01"),
            lot_size: dec("0.01"),
            redundant: false,
        };
        w.write(snap.clone()).unwrap();
        let diff = BookDiff::new(dec("100.50"), dec("2"), true, 20);
        w.write(diff.clone()).unwrap();
        w.close().unwrap();

        let mut r = Reader::new(buf.as_slice());
        let first = r.read().unwrap().unwrap();
        assert_eq!(first, Message::Snapshot(BookSnapshot { timestamp: 10, ..snap }));
        let second = r.read().unwrap().unwrap();
        assert_eq!(second, Message::Diff(diff));
        assert!(r.read().unwrap().is_none());
    }

    #[test]
    fn diff_before_snapshot_is_corrupt() {
        let mut raw = Vec::new();
        frame::write_frame(MessageType::Timestamp, &frame::encode_timestamp_payload(0), 0, &mut raw).unwrap();
        frame::write_frame(MessageType::BidDiff, &[0u8], 0, &mut raw).unwrap();
        let mut r = Reader::new(raw.as_slice());
        assert!(matches!(r.read(), Err(Error::CorruptStream(_))));
    }
}
