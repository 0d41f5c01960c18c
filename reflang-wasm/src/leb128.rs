//! LEB128 variable-length integers
//!
//! Encoders append to a byte buffer. Decoders read from `bytes[offset..]`
//! and return the value together with the number of bytes consumed.

use crate::error::DecodeError;

pub fn encode_u32(buf: &mut Vec<u8>, mut value: u32) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

pub fn encode_i32(buf: &mut Vec<u8>, value: i32) {
    encode_i64(buf, i64::from(value));
}

pub fn encode_i64(buf: &mut Vec<u8>, mut value: i64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        let sign_bit = (byte & 0x40) != 0;
        let done = (value == 0 && !sign_bit) || (value == -1 && sign_bit);
        if done {
            buf.push(byte);
            break;
        }
        buf.push(byte | 0x80);
    }
}

/// Length-prefixed UTF-8 name
pub fn encode_name(buf: &mut Vec<u8>, name: &str) {
    encode_u32(buf, name.len() as u32);
    buf.extend_from_slice(name.as_bytes());
}

pub fn decode_u32(bytes: &[u8], offset: usize) -> Result<(u32, usize), DecodeError> {
    let (value, read) = decode_unsigned(bytes, offset, 32)?;
    Ok((value as u32, read))
}

pub fn decode_i32(bytes: &[u8], offset: usize) -> Result<(i32, usize), DecodeError> {
    let (value, read) = decode_signed(bytes, offset, 32)?;
    Ok((value as i32, read))
}

pub fn decode_i64(bytes: &[u8], offset: usize) -> Result<(i64, usize), DecodeError> {
    decode_signed(bytes, offset, 64)
}

fn max_bytes(bits: u32) -> usize {
    bits.div_ceil(7) as usize
}

fn decode_unsigned(bytes: &[u8], offset: usize, bits: u32) -> Result<(u64, usize), DecodeError> {
    let mut result: u64 = 0;
    let mut shift = 0u32;
    let mut read = 0usize;

    loop {
        let byte = *bytes
            .get(offset + read)
            .ok_or(DecodeError::UnexpectedEof { offset: offset + read })?;
        read += 1;

        if read > max_bytes(bits) {
            return Err(DecodeError::LebOverflow { offset });
        }
        let payload = u64::from(byte & 0x7f);
        // The last permitted byte may only carry the bits that remain
        if read == max_bytes(bits) && (payload >> (bits - shift)) != 0 {
            return Err(DecodeError::LebOverflow { offset });
        }

        result |= payload << shift;
        shift += 7;

        if byte & 0x80 == 0 {
            return Ok((result, read));
        }
    }
}

fn decode_signed(bytes: &[u8], offset: usize, bits: u32) -> Result<(i64, usize), DecodeError> {
    let mut result: i64 = 0;
    let mut shift = 0u32;
    let mut read = 0usize;

    loop {
        let byte = *bytes
            .get(offset + read)
            .ok_or(DecodeError::UnexpectedEof { offset: offset + read })?;
        read += 1;

        if read > max_bytes(bits) {
            return Err(DecodeError::LebOverflow { offset });
        }
        if read == max_bytes(bits) {
            // Unused high bits of the final byte must all match the sign bit
            let remaining = bits - shift;
            if remaining < 7 {
                let sign_and_unused = (byte & 0x7f) >> (remaining - 1);
                let all_clear = sign_and_unused == 0;
                let all_set = sign_and_unused == (0x7f >> (remaining - 1));
                if !all_clear && !all_set {
                    return Err(DecodeError::LebOverflow { offset });
                }
            }
        }

        result |= i64::from(byte & 0x7f) << shift;
        shift += 7;

        if byte & 0x80 == 0 {
            if shift < 64 && (byte & 0x40) != 0 {
                result |= -1i64 << shift;
            }
            return Ok((result, read));
        }
    }
}
