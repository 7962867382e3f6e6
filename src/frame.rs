//! The message frame: a compact/extended variable-length envelope
//! carrying a type tag, payload length, and a 16-bit timestamp delta
//! (spec §4.3).
//!
//! The header byte is read the way the teacher crate's legacy
//! `decoder.rs` reads an ITM header byte: one byte up front, then a
//! branch on its bit pattern. `bitmatch` extracts the two header
//! sub-fields in one pattern instead of manual shifts.

use std::io::{self, ErrorKind, Read, Write};

use bitmatch::bitmatch;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};

/// The eight message kinds a frame can carry (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Timestamp,
    Snapshot,
    AskDiff,
    AskRemoval,
    BidDiff,
    BidRemoval,
    Trade,
    Disconnect,
}

impl MessageType {
    fn to_u8(self) -> u8 {
        match self {
            MessageType::Timestamp => 0,
            MessageType::Snapshot => 1,
            MessageType::AskDiff => 2,
            MessageType::AskRemoval => 3,
            MessageType::BidDiff => 4,
            MessageType::BidRemoval => 5,
            MessageType::Trade => 6,
            MessageType::Disconnect => 7,
        }
    }

    fn from_u8(b: u8) -> MessageType {
        match b {
            0 => MessageType::Timestamp,
            1 => MessageType::Snapshot,
            2 => MessageType::AskDiff,
            3 => MessageType::AskRemoval,
            4 => MessageType::BidDiff,
            5 => MessageType::BidRemoval,
            6 => MessageType::Trade,
            7 => MessageType::Disconnect,
            _ => unreachable!("3-bit field, all 8 patterns assigned"),
        }
    }
}

/// A decoded frame header: type, reconstructed payload length, and the
/// raw 16-bit timestamp offset. Doesn't carry the payload bytes, so it
/// can be produced by [`read_header`] without paying for decoding a
/// body the caller only wants to skip.
#[derive(Debug, Clone, Copy)]
pub struct FrameHeader {
    pub msg_type: MessageType,
    pub ts_off: u16,
    pub len: u32,
}

/// A fully read frame, payload included.
#[derive(Debug, Clone)]
pub struct Frame {
    pub msg_type: MessageType,
    pub ts_off: u16,
    pub payload: Vec<u8>,
}

#[bitmatch]
fn split_prefix(byte: u8) -> (u8, u8) {
    #[bitmatch]
    let "ttt_lllll" = byte;
    (t, l)
}

fn join_prefix(msg_type: u8, l5: u8) -> u8 {
    (msg_type << 5) | l5
}

/// Write one frame: header, optional extended length, timestamp offset,
/// then the raw payload.
pub fn write_frame(
    msg_type: MessageType,
    payload: &[u8],
    ts_off: u16,
    sink: &mut impl Write,
) -> Result<()> {
    let len = payload.len() as u64;
    debug_assert!(len >= 1 && len <= u32::MAX as u64, "payload length out of range");

    if len < 32 {
        sink.write_u8(join_prefix(msg_type.to_u8(), len as u8))?;
    } else {
        sink.write_u8(join_prefix(msg_type.to_u8(), 0))?;
        sink.write_u32::<BigEndian>(len as u32)?;
    }
    sink.write_u16::<BigEndian>(ts_off)?;
    sink.write_all(payload)?;
    log::trace!("wrote frame type={:?} len={} ts_off={}", msg_type, len, ts_off);
    Ok(())
}

/// Read a frame's header (type, length, timestamp offset) without
/// consuming its payload. Returns `Ok(None)` on a clean end-of-stream
/// (no bytes at all before the header byte); any truncation past that
/// point is [`Error::CorruptStream`].
pub fn read_header(source: &mut impl Read) -> Result<Option<FrameHeader>> {
    let mut byte = [0u8; 1];
    match source.read(&mut byte) {
        Ok(0) => return Ok(None),
        Ok(_) => {}
        Err(e) => return Err(Error::Io(e)),
    }

    let (msg_type, l5) = split_prefix(byte[0]);
    let msg_type = MessageType::from_u8(msg_type);

    let len = if l5 != 0 {
        l5 as u32
    } else {
        read_exact_or_corrupt(source, 4)
            .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))?
    };

    let ts_off_bytes = read_exact_or_corrupt(source, 2)?;
    let ts_off = u16::from_be_bytes([ts_off_bytes[0], ts_off_bytes[1]]);

    Ok(Some(FrameHeader { msg_type, ts_off, len }))
}

/// Discard `len` payload bytes without interpreting them — the
/// operation that makes a stream seekable at the codec level (spec §1).
pub fn skip_payload(source: &mut impl Read, len: u32) -> Result<()> {
    let mut remaining = len as u64;
    let mut buf = [0u8; 4096];
    while remaining > 0 {
        let chunk = remaining.min(buf.len() as u64) as usize;
        let bytes = read_exact_or_corrupt(source, chunk)?;
        debug_assert_eq!(bytes.len(), chunk);
        remaining -= chunk as u64;
    }
    Ok(())
}

/// Read a full frame (header and payload).
pub fn read_frame(source: &mut impl Read) -> Result<Option<Frame>> {
    let header = match read_header(source)? {
        None => return Ok(None),
        Some(h) => h,
    };
    let payload = read_exact_or_corrupt(source, header.len as usize)?;
    log::trace!(
        "read frame type={:?} len={} ts_off={}",
        header.msg_type,
        header.len,
        header.ts_off
    );
    Ok(Some(Frame {
        msg_type: header.msg_type,
        ts_off: header.ts_off,
        payload,
    }))
}

fn read_exact_or_corrupt(source: &mut impl Read, len: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    match source.read_exact(&mut buf) {
        Ok(()) => Ok(buf),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
            Err(Error::CorruptStream("frame truncated mid-structure".into()))
        }
        Err(e) => Err(Error::Io(e)),
    }
}

/// Build the 8-byte big-endian millisecond payload of a TIMESTAMP frame.
pub fn encode_timestamp_payload(ts: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(8);
    buf.write_u64::<BigEndian>(ts).expect("Vec<u8> write never fails");
    buf
}

/// Parse the payload of a TIMESTAMP frame.
pub fn decode_timestamp_payload(payload: &[u8]) -> Result<u64> {
    let mut cursor = io::Cursor::new(payload);
    cursor
        .read_u64::<BigEndian>()
        .map_err(|_| Error::CorruptStream("malformed TIMESTAMP payload".into()))
}
