//! The write half of a stream: dispatches each logical message to its
//! frame encoding, emits TIMESTAMP frames as the 16-bit offset window
//! demands, and recovers in-line from a bit-width overflow by splicing
//! in a wider snapshot (spec §4.8).

use std::convert::TryFrom;
use std::io::Write;

use bigdecimal::BigDecimal;

use crate::context::Context;
use crate::diff;
use crate::disconnect;
use crate::error::{Error, Result};
use crate::frame::{self, MessageType};
use crate::message::{BookDiff, BookSnapshot, Message, SnapshotDelay, Trade};
use crate::snapshot;
use crate::trade;

/// Writes logical messages as an ARTHUR byte stream.
pub struct Writer<W: Write> {
    sink: W,
    ctx: Context,
    closed: bool,
}

impl<W: Write> Writer<W> {
    pub fn new(sink: W) -> Self {
        Writer {
            sink,
            ctx: Context::default(),
            closed: false,
        }
    }

    /// The writer's current view of the stream's bit widths and
    /// reference timestamp.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Write one logical message, re-syncing the timestamp and
    /// recovering from any bit-width overflow as needed.
    pub fn write<M: Into<Message>>(&mut self, msg: M) -> Result<()> {
        if self.closed {
            return Err(Error::StreamClosed);
        }
        let msg = msg.into();
        self.ensure_timestamp(msg.timestamp())?;

        match msg {
            Message::Snapshot(snap) => self.write_snapshot(snap, None, None),
            Message::Diff(diff) => self.write_diff(diff),
            Message::Trade(trade) => self.write_trade(trade),
            Message::Disconnect(d) => self.write_disconnect(d.timestamp),
        }
    }

    /// Flush the sink and mark the stream closed; further writes fail
    /// with [`Error::StreamClosed`]. Calling this more than once is a
    /// no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.sink.flush().map_err(Error::Io)
    }

    fn ensure_timestamp(&mut self, timestamp: u64) -> Result<()> {
        let needs_resync = match self.ctx.timestamp() {
            None => true,
            Some(base) => match timestamp.checked_sub(base) {
                Some(delta) => delta > u16::MAX as u64,
                None => true,
            },
        };
        if needs_resync {
            self.emit_timestamp(timestamp)?;
        }
        Ok(())
    }

    fn emit_timestamp(&mut self, timestamp: u64) -> Result<()> {
        let payload = frame::encode_timestamp_payload(timestamp);
        frame::write_frame(MessageType::Timestamp, &payload, 0, &mut self.sink)?;
        self.ctx.timestamp = Some(timestamp);
        Ok(())
    }

    fn ts_off(&self, timestamp: u64) -> Result<u16> {
        let base = self
            .ctx
            .timestamp()
            .ok_or_else(|| Error::CorruptStream("no reference timestamp established".into()))?;
        let delta = timestamp
            .checked_sub(base)
            .ok_or_else(|| Error::CorruptStream("message timestamp precedes reference timestamp".into()))?;
        u16::try_from(delta).map_err(|_| Error::CorruptStream("message timestamp exceeds resync window".into()))
    }

    fn write_snapshot(&mut self, snap: BookSnapshot, min_price: Option<&BigDecimal>, min_qty: Option<&BigDecimal>) -> Result<()> {
        let ts_off = self.ts_off(snap.timestamp)?;
        let (payload, new_ctx) = snapshot::encode(&self.ctx, &snap, min_price, min_qty)?;
        frame::write_frame(MessageType::Snapshot, &payload, ts_off, &mut self.sink)?;
        self.ctx = new_ctx;
        Ok(())
    }

    fn write_diff(&mut self, diff: BookDiff) -> Result<()> {
        let ts_off = self.ts_off(diff.timestamp)?;
        let is_removal = diff.is_removal();
        let msg_type = match (diff.is_bid, is_removal) {
            (true, true) => MessageType::BidRemoval,
            (true, false) => MessageType::BidDiff,
            (false, true) => MessageType::AskRemoval,
            (false, false) => MessageType::AskDiff,
        };

        let encoded = if is_removal {
            diff::encode_removal(&self.ctx, &diff.price)
        } else {
            diff::encode_change(&self.ctx, &diff.price, &diff.qty)
        };

        let payload = match encoded {
            Ok(payload) => payload,
            Err(Error::Overflow) => {
                // The recovery snapshot already reflects this state
                // change, so the diff itself is dropped rather than
                // retried (spec §4.8).
                self.recover_overflow(diff.snapshot_delay, diff.timestamp, Some(&diff.price), Some(&diff.qty))?;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        frame::write_frame(msg_type, &payload, ts_off, &mut self.sink)
    }

    fn write_trade(&mut self, trade: Trade) -> Result<()> {
        let ts_off = self.ts_off(trade.timestamp)?;
        let encoded = trade::encode(&self.ctx, &trade.price, &trade.qty, trade.maker_is_bid, &trade.tid);

        let payload = match encoded {
            Ok(payload) => payload,
            Err(Error::Overflow) => {
                self.recover_overflow(trade.snapshot_delay, trade.timestamp, Some(&trade.price), Some(&trade.qty))?;
                trade::encode(&self.ctx, &trade.price, &trade.qty, trade.maker_is_bid, &trade.tid)?
            }
            Err(e) => return Err(e),
        };

        frame::write_frame(MessageType::Trade, &payload, ts_off, &mut self.sink)
    }

    fn write_disconnect(&mut self, timestamp: u64) -> Result<()> {
        let ts_off = self.ts_off(timestamp)?;
        frame::write_frame(MessageType::Disconnect, &disconnect::encode(), ts_off, &mut self.sink)
    }

    /// Resolve `delay`, widen the context with the resulting snapshot,
    /// and write it in-line. The recovery SNAPSHOT frame reuses the
    /// *original* overflowing message's timestamp offset rather than a
    /// fresh one (spec §4.8).
    fn recover_overflow(
        &mut self,
        delay: Option<SnapshotDelay>,
        timestamp: u64,
        min_price: Option<&BigDecimal>,
        min_qty: Option<&BigDecimal>,
    ) -> Result<()> {
        let delay = delay.ok_or(Error::MissingSnapshot)?;
        let snap = delay();
        let ts_off = self.ts_off(timestamp)?;
        let (payload, new_ctx) = snapshot::encode(&self.ctx, &snap, min_price, min_qty)?;
        frame::write_frame(MessageType::Snapshot, &payload, ts_off, &mut self.sink)?;
        self.ctx = new_ctx;
        Ok(())
    }
}
