//! Primitive wire encodings: variable byte integers and length-prefixed
//! strings and binary fields. Multi-byte integers are big-endian and go
//! through [`bytes::Buf`]/[`bytes::BufMut`] directly.

use crate::constants::{MAX_REMAINING_LENGTH, MAX_STRING_LENGTH};
use crate::error::{MqttError, Result};
use crate::validation::{validate_utf8, Utf8Validation};
use bytes::{Buf, BufMut, Bytes};

/// Encodes `value` as a variable byte integer in shortest form (1-4 bytes).
pub fn encode_variable_int<B: BufMut>(buf: &mut B, value: u32) -> Result<()> {
    if value > MAX_REMAINING_LENGTH {
        return Err(MqttError::MalformedPacket(format!(
            "Variable byte integer out of range: {value}"
        )));
    }

    let mut remaining = value;
    loop {
        let mut byte = (remaining % 128) as u8;
        remaining /= 128;
        if remaining > 0 {
            byte |= 0x80;
        }
        buf.put_u8(byte);
        if remaining == 0 {
            return Ok(());
        }
    }
}

/// Decodes a variable byte integer. Rejects a fourth continuation byte,
/// truncated input, and non-shortest encodings (a final 0x00 byte after a
/// continuation).
pub fn decode_variable_int<B: Buf>(buf: &mut B) -> Result<u32> {
    let mut value: u32 = 0;
    let mut shift: u32 = 0;

    for _ in 0..4 {
        if !buf.has_remaining() {
            return Err(MqttError::MalformedPacket(
                "Truncated variable byte integer".to_string(),
            ));
        }
        let byte = buf.get_u8();
        value |= u32::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            if byte == 0 && shift > 0 {
                return Err(MqttError::MalformedPacket(
                    "Variable byte integer not in shortest form".to_string(),
                ));
            }
            return Ok(value);
        }
        shift += 7;
    }

    Err(MqttError::MalformedPacket(
        "Variable byte integer exceeds 4 bytes".to_string(),
    ))
}

/// Number of bytes `encode_variable_int` emits for `value`.
#[must_use]
pub fn variable_int_len(value: u32) -> usize {
    match value {
        0..=127 => 1,
        128..=16_383 => 2,
        16_384..=2_097_151 => 3,
        _ => 4,
    }
}

/// Encodes a UTF-8 string with a u16 length prefix.
pub fn encode_string<B: BufMut>(buf: &mut B, s: &str) -> Result<()> {
    if s.len() > MAX_STRING_LENGTH {
        return Err(MqttError::StringTooLong(s.len()));
    }
    buf.put_u16(s.len() as u16);
    buf.put_slice(s.as_bytes());
    Ok(())
}

/// Decodes a length-prefixed string, enforcing the strict MQTT UTF-8 rules.
pub fn decode_string<B: Buf>(buf: &mut B) -> Result<String> {
    let bytes = decode_binary(buf)?;
    match validate_utf8(&bytes) {
        Utf8Validation::WellFormed => String::from_utf8(bytes.to_vec())
            .map_err(|e| MqttError::Utf8Invalid(e.to_string())),
        Utf8Validation::IllFormed => Err(MqttError::Utf8Invalid(
            "string is not well-formed UTF-8".to_string(),
        )),
        Utf8Validation::Disallowed => Err(MqttError::Utf8Invalid(
            "string contains a code point forbidden by MQTT".to_string(),
        )),
    }
}

/// Encodes a binary field with a u16 length prefix.
pub fn encode_binary<B: BufMut>(buf: &mut B, data: &[u8]) -> Result<()> {
    if data.len() > MAX_STRING_LENGTH {
        return Err(MqttError::StringTooLong(data.len()));
    }
    buf.put_u16(data.len() as u16);
    buf.put_slice(data);
    Ok(())
}

/// Decodes a length-prefixed binary field without copying the contents.
pub fn decode_binary<B: Buf>(buf: &mut B) -> Result<Bytes> {
    if buf.remaining() < 2 {
        return Err(MqttError::MalformedPacket(
            "Truncated length prefix".to_string(),
        ));
    }
    let len = buf.get_u16() as usize;
    if buf.remaining() < len {
        return Err(MqttError::MalformedPacket(format!(
            "Declared length {len} exceeds remaining {} bytes",
            buf.remaining()
        )));
    }
    Ok(buf.copy_to_bytes(len))
}

/// Wire size of a length-prefixed string.
#[must_use]
pub fn string_len(s: &str) -> usize {
    2 + s.len()
}

/// Wire size of a length-prefixed binary field.
#[must_use]
pub fn binary_len(data: &[u8]) -> usize {
    2 + data.len()
}
