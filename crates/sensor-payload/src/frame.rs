//! Byte-level helpers shared by the device decoders.

use crate::{PayloadError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Decode a base64 uplink payload into its raw frame bytes
pub fn decode_base64(frame: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(frame.trim())?)
}

pub(crate) fn ensure_len(bytes: &[u8], expected: usize) -> Result<()> {
    if bytes.len() < expected {
        return Err(PayloadError::InsufficientData {
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}

pub(crate) fn read_u16_be(data: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([data[offset], data[offset + 1]])
}

pub(crate) fn read_i16_be(data: &[u8], offset: usize) -> i16 {
    i16::from_be_bytes([data[offset], data[offset + 1]])
}
