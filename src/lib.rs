//! ARTHUR: a bit-packed binary codec for L2 order-book market data.
//!
//! A stream is a sequence of length-prefixed frames (see [`frame`]):
//! a `TIMESTAMP` frame establishes a reference epoch, a `SNAPSHOT`
//! frame establishes the book and the bit widths every subsequent
//! `DIFF`/`REMOVAL`/`TRADE` frame is packed against, until the next
//! `SNAPSHOT` supersedes them. [`Writer`] and [`Reader`] drive that
//! state machine so callers only ever see the logical [`Message`]
//! types in [`message`].
//!
//! ```no_run
//! use arthur_codec::Writer;
//!
//! fn roundtrip(stream: &mut Vec<u8>) -> arthur_codec::Result<()> {
//!     let mut writer = Writer::new(&mut *stream);
//!     // writer.write(some_snapshot)?;
//!     writer.close()?;
//!     Ok(())
//! }
//! ```

pub mod bitpack;
pub mod context;
pub mod decimal;
pub mod diff;
pub mod disconnect;
pub mod error;
pub mod frame;
pub mod message;
pub mod reader;
pub mod snapshot;
pub mod trade;
pub mod writer;

pub use context::{Context, StreamState};
pub use error::{Error, Result};
pub use frame::{Frame, FrameHeader, MessageType};
pub use message::{BookDiff, BookSnapshot, Disconnect, Level, Message, SnapshotDelay, Trade, TradeId};
pub use reader::Reader;
pub use writer::Writer;
