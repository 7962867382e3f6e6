//! Encode/decode a disconnect marker (spec §4.7).
//!
//! Carries no information beyond its frame's timestamp offset; the
//! single reserved payload byte exists only because every frame must
//! carry at least one payload byte.

use crate::error::{Error, Result};

pub fn encode() -> Vec<u8> {
    vec![0u8]
}

pub fn decode(payload: &[u8]) -> Result<()> {
    if payload.is_empty() {
        return Err(Error::CorruptStream("disconnect payload missing its reserved byte".into()));
    }
    Ok(())
}
