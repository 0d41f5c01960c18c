use crate::error::DecodeError;
use crate::leb128::*;

fn unsigned(value: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_u32(&mut buf, value);
    buf
}

fn signed(value: i32) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_i32(&mut buf, value);
    buf
}

#[test]
fn test_unsigned_known_encodings() {
    assert_eq!(unsigned(0), vec![0x00]);
    assert_eq!(unsigned(127), vec![0x7f]);
    assert_eq!(unsigned(128), vec![0x80, 0x01]);
    assert_eq!(unsigned(624485), vec![0xe5, 0x8e, 0x26]);
    assert_eq!(unsigned(u32::MAX), vec![0xff, 0xff, 0xff, 0xff, 0x0f]);
}

#[test]
fn test_signed_known_encodings() {
    assert_eq!(signed(0), vec![0x00]);
    assert_eq!(signed(-1), vec![0x7f]);
    assert_eq!(signed(63), vec![0x3f]);
    assert_eq!(signed(64), vec![0xc0, 0x00]);
    assert_eq!(signed(-64), vec![0x40]);
    assert_eq!(signed(-65), vec![0xbf, 0x7f]);
    assert_eq!(signed(-123456), vec![0xc0, 0xbb, 0x78]);
    assert_eq!(signed(i32::MIN), vec![0x80, 0x80, 0x80, 0x80, 0x78]);
}

#[test]
fn test_i64_encoding() {
    let mut buf = Vec::new();
    encode_i64(&mut buf, i64::MIN);
    assert_eq!(buf.len(), 10);
    assert_eq!(decode_i64(&buf, 0), Ok((i64::MIN, 10)));
}

#[test]
fn test_round_trip_boundaries() {
    for value in [0u32, 1, 127, 128, 16383, 16384, 1 << 21, 1 << 28, u32::MAX] {
        let buf = unsigned(value);
        assert_eq!(decode_u32(&buf, 0), Ok((value, buf.len())));
    }

    for value in [0i32, 1, -1, 63, 64, -64, -65, 8191, -8192, i32::MAX, i32::MIN] {
        let buf = signed(value);
        assert_eq!(decode_i32(&buf, 0), Ok((value, buf.len())));
    }
}

#[test]
fn test_decode_at_offset() {
    let buf = vec![0xaa, 0xe5, 0x8e, 0x26, 0xbb];
    assert_eq!(decode_u32(&buf, 1), Ok((624485, 3)));
}

#[test]
fn test_decode_truncated_input() {
    assert_eq!(
        decode_u32(&[0x80], 0),
        Err(DecodeError::UnexpectedEof { offset: 1 })
    );
    assert_eq!(decode_i32(&[], 0), Err(DecodeError::UnexpectedEof { offset: 0 }));
}

#[test]
fn test_decode_overflow() {
    // Sixth byte
    assert_eq!(
        decode_u32(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x00], 0),
        Err(DecodeError::LebOverflow { offset: 0 })
    );
    // Fifth byte carries bits beyond 32
    assert_eq!(
        decode_u32(&[0xff, 0xff, 0xff, 0xff, 0x7f], 0),
        Err(DecodeError::LebOverflow { offset: 0 })
    );
    // Unused bits disagree with the sign bit
    assert_eq!(
        decode_i32(&[0xff, 0xff, 0xff, 0xff, 0x4f], 0),
        Err(DecodeError::LebOverflow { offset: 0 })
    );
}

#[test]
fn test_encode_name() {
    let mut buf = Vec::new();
    encode_name(&mut buf, "env");
    assert_eq!(buf, vec![0x03, b'e', b'n', b'v']);
}
