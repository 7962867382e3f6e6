//! The error taxonomy used throughout the codec (spec §7).

use std::string::FromUtf8Error;

/// Errors produced while encoding or decoding ARTHUR messages.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A decimal price or qty is not an exact integer multiple of the
    /// context's tick/lot size.
    #[error("price or qty is not an exact multiple of the current tick/lot size")]
    Precision,

    /// A ticks or lots integer does not fit in the context's current bit
    /// width. Crate-internal: the serialization driver always intercepts
    /// this for diffs and trades (§4.8) and either resolves it via an
    /// in-line snapshot or turns it into [`Error::MissingSnapshot`]. If
    /// this variant escapes a [`crate::Writer::write`] call, that's a bug
    /// in the driver.
    #[error("value does not fit in the current pbits/qbits width")]
    Overflow,

    /// [`Error::Overflow`] occurred but the message carried no
    /// `snapshot_delay`, or the delay produced nothing useful.
    #[error("overflow occurred but no snapshot was supplied to resolve it")]
    MissingSnapshot,

    /// Operation attempted on a [`crate::Writer`] or [`crate::Reader`]
    /// after `close()`.
    #[error("operation attempted on a closed stream")]
    StreamClosed,

    /// A frame was truncated mid-structure, carried a payload that
    /// couldn't be decoded per its type, or appeared in a position the
    /// stream's context state machine disallows.
    #[error("corrupt stream: {0}")]
    CorruptStream(String),

    /// A trade's string id was not valid UTF-8.
    #[error("invalid UTF-8 trade id")]
    InvalidUtf8(#[from] FromUtf8Error),

    /// The underlying sink/source failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
