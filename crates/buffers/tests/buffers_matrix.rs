//! Writer/Reader round-trip matrix for the little-endian buffer primitives.

use tiny_bson_buffers::{BufferError, Reader, Writer};

#[test]
fn roundtrip_fixed_width_matrix() {
    let mut w = Writer::new();
    w.u8(0x00);
    w.u8(0xFF);
    w.i32_le(i32::MIN);
    w.i32_le(-1);
    w.i32_le(i32::MAX);
    w.i64_le(i64::MIN);
    w.i64_le(i64::MAX);
    w.f64_le(-0.5);
    w.f64_le(f64::INFINITY);
    let data = w.flush();
    assert_eq!(data.len(), 2 + 3 * 4 + 2 * 8 + 2 * 8);

    let mut r = Reader::new(&data);
    assert_eq!(r.u8(), Ok(0x00));
    assert_eq!(r.u8(), Ok(0xFF));
    assert_eq!(r.i32_le(), Ok(i32::MIN));
    assert_eq!(r.i32_le(), Ok(-1));
    assert_eq!(r.i32_le(), Ok(i32::MAX));
    assert_eq!(r.i64_le(), Ok(i64::MIN));
    assert_eq!(r.i64_le(), Ok(i64::MAX));
    assert_eq!(r.f64_le(), Ok(-0.5));
    assert_eq!(r.f64_le(), Ok(f64::INFINITY));
    assert_eq!(r.size(), 0);
}

#[test]
fn integers_are_little_endian() {
    let mut w = Writer::new();
    w.i32_le(123);
    w.i64_le(0x0102_0304_0506_0708);
    assert_eq!(
        w.flush(),
        [0x7b, 0, 0, 0, 0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]
    );
}

#[test]
fn strings_and_cstrings() {
    let mut w = Writer::new();
    w.utf8("héllo");
    w.u8(0);
    w.utf8("tail");
    let data = w.flush();

    let mut r = Reader::new(&data);
    assert_eq!(r.cstring(), Ok("héllo"));
    assert_eq!(r.utf8(4), Ok("tail"));
}

#[test]
fn reserved_frame_is_patched() {
    let mut w = Writer::new();
    let slot = w.reserve_i32();
    w.buf(&[1, 2, 3]);
    w.patch_i32(slot, 3).unwrap();
    assert_eq!(w.flush(), [3, 0, 0, 0, 1, 2, 3]);

    let mut w = Writer::new();
    assert_eq!(w.patch_i32(0, 1), Err(BufferError::Overflow));
}

#[test]
fn reads_past_end_fail_without_advancing() {
    let data = [1u8, 2, 3];
    let mut r = Reader::new(&data);
    assert!(matches!(r.i32_le(), Err(BufferError::EndOfBuffer { offset: 0, .. })));
    assert_eq!(r.position(), 0);
    assert_eq!(r.buf(3), Ok(&data[..]));
    assert!(r.u8().is_err());
}

#[test]
fn cstring_without_terminator_fails() {
    let mut r = Reader::new(b"abc");
    assert!(r.cstring().is_err());
}

#[test]
fn invalid_utf8_reports_offset() {
    let data = [b'x', 0xff, 0xfe];
    let mut r = Reader::new(&data);
    r.skip(1).unwrap();
    assert_eq!(r.utf8(2), Err(BufferError::InvalidUtf8 { offset: 1 }));
}
