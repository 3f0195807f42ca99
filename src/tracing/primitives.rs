//! Hex/integer decoding shared by every trace front-end.
//!
//! Struct-log, call-tracer and Parity payloads all mix native JSON numbers with hex strings for
//! the same logical field (geth's `debug_traceTransaction` emits `gas`/`depth` as numbers but
//! Parity's RPCs emit `gas`/`value` as `0x`-prefixed hex). This module normalises both into the
//! typed values the rest of the crate works with.

use crate::error::{Error, Result};
use alloy_primitives::{hex, Address, Bytes, B256, U256};
use serde::Deserialize;

/// A field that may arrive as a native JSON integer or as a hex string.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum NumberOrHex {
    /// A native JSON number.
    Number(u64),
    /// A `0x`-prefixed (or bare) hex string.
    Hex(String),
}

impl NumberOrHex {
    /// Decodes this field into a `u64`, base-16 if it arrived as text.
    pub fn into_u64(self, field: &'static str) -> Result<u64> {
        match self {
            Self::Number(n) => Ok(n),
            Self::Hex(s) => {
                let trimmed = s.strip_prefix("0x").unwrap_or(&s);
                if trimmed.is_empty() {
                    return Ok(0);
                }
                u64::from_str_radix(trimmed, 16)
                    .map_err(|_| Error::InvalidHex { field, value: s })
            }
        }
    }
}

/// Parses a hex string (`0x`-prefixed or bare) into [`Bytes`].
///
/// An odd number of hex digits is left-padded with a single `0` nibble, matching the tolerant
/// decoding geth and Parity RPC responses both rely on. An empty string decodes to empty bytes,
/// distinct from a single zero byte.
pub fn parse_bytes(field: &'static str, raw: &str) -> Result<Bytes> {
    let trimmed = raw.strip_prefix("0x").unwrap_or(raw);
    if trimmed.is_empty() {
        return Ok(Bytes::new());
    }
    let padded = if trimmed.len() % 2 == 1 { format!("0{trimmed}") } else { trimmed.to_string() };
    hex::decode(padded)
        .map(Bytes::from)
        .map_err(|_| Error::InvalidHex { field, value: raw.to_string() })
}

/// Parses a stack/memory word into a left-padded 32-byte [`B256`].
///
/// Geth's default tracer renders stack and memory entries at their shortest hex representation,
/// not zero-padded to 64 hex digits, so this always pads on the left. A word longer than 32 bytes
/// (malformed input) is truncated to its trailing 32 bytes rather than rejected.
pub fn parse_word(field: &'static str, raw: &str) -> Result<B256> {
    let trimmed = raw.strip_prefix("0x").unwrap_or(raw);
    let padded = if trimmed.len() % 2 == 1 { format!("0{trimmed}") } else { trimmed.to_string() };
    let bytes = hex::decode(&padded).map_err(|_| Error::InvalidHex {
        field,
        value: raw.to_string(),
    })?;

    let mut word = [0u8; 32];
    if bytes.len() >= 32 {
        word.copy_from_slice(&bytes[bytes.len() - 32..]);
    } else {
        word[32 - bytes.len()..].copy_from_slice(&bytes);
    }
    Ok(B256::from(word))
}

/// Left-pads an arbitrary-length byte slice into a 32-byte [`B256`], truncating to the trailing
/// 32 bytes if longer.
///
/// Used to push `VMExecutedOperation::push` items (which geth renders at their shortest byte
/// length, e.g. a single `0x01` for a `PUSH1 1`) onto a synthetic stack of full words.
pub fn word_from_bytes(bytes: &[u8]) -> B256 {
    let mut word = [0u8; 32];
    if bytes.len() >= 32 {
        word.copy_from_slice(&bytes[bytes.len() - 32..]);
    } else {
        word[32 - bytes.len()..].copy_from_slice(bytes);
    }
    B256::from(word)
}

/// Extracts the 20-byte address suffix of a stack word.
pub fn address_from_word(word: &B256) -> Address {
    Address::from_slice(&word.as_slice()[12..])
}

/// Decodes a big-endian 32-byte word as a [`U256`].
pub fn word_to_u256(word: &B256) -> U256 {
    U256::from_be_bytes(word.0)
}

/// Decodes a big-endian unsigned integer word, saturating to `u64::MAX` on overflow.
///
/// Used for gas limits and similar fields read directly off the stack, which are logically
/// 256-bit but never meaningfully exceed `u64` in practice.
pub fn word_to_u64_saturating(word: &B256) -> u64 {
    let bytes = word.as_slice();
    let nonzero_prefix = bytes.iter().position(|&b| b != 0);
    match nonzero_prefix {
        None => 0,
        Some(start) if bytes.len() - start > 8 => u64::MAX,
        Some(start) => {
            let mut buf = [0u8; 8];
            let tail = &bytes[start..];
            buf[8 - tail.len()..].copy_from_slice(tail);
            u64::from_be_bytes(buf)
        }
    }
}
