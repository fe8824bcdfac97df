//! Bounds-checked little-endian reader with cursor tracking.

use std::str;

use crate::BufferError;

/// A binary buffer reader over a borrowed byte slice.
///
/// The reader keeps a cursor (`x`) and an exclusive `end`. Every read checks
/// the remaining length first and reports [`BufferError::EndOfBuffer`] instead
/// of panicking, so truncated input surfaces as an ordinary error.
///
/// # Example
///
/// ```
/// use tiny_bson_buffers::Reader;
///
/// let data = [0x7b, 0x00, 0x00, 0x00, b'h', b'i', 0x00];
/// let mut reader = Reader::new(&data);
///
/// assert_eq!(reader.i32_le().unwrap(), 123);
/// assert_eq!(reader.cstring().unwrap(), "hi");
/// assert_eq!(reader.size(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    /// The underlying byte slice.
    pub uint8: &'a [u8],
    /// Current cursor position.
    pub x: usize,
    /// End position (exclusive).
    pub end: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader for the given byte slice.
    pub fn new(uint8: &'a [u8]) -> Self {
        let end = uint8.len();
        Self { uint8, x: 0, end }
    }

    /// Creates a reader over `uint8[x..end]`, clamped to the slice length.
    pub fn from_slice(uint8: &'a [u8], x: usize, end: usize) -> Self {
        let end = end.min(uint8.len());
        Self {
            uint8,
            x: x.min(end),
            end,
        }
    }

    /// Resets the reader with a new byte slice.
    pub fn reset(&mut self, uint8: &'a [u8]) {
        self.x = 0;
        self.end = uint8.len();
        self.uint8 = uint8;
    }

    /// Returns the number of remaining bytes.
    pub fn size(&self) -> usize {
        self.end.saturating_sub(self.x)
    }

    /// Returns the current cursor position.
    pub fn position(&self) -> usize {
        self.x
    }

    fn ensure(&self, needed: usize) -> Result<(), BufferError> {
        if self.size() < needed {
            return Err(BufferError::EndOfBuffer {
                offset: self.x,
                needed,
            });
        }
        Ok(())
    }

    /// Peeks at the current byte without advancing the cursor.
    pub fn peek(&self) -> Result<u8, BufferError> {
        self.ensure(1)?;
        Ok(self.uint8[self.x])
    }

    /// Advances the cursor by the given number of bytes.
    pub fn skip(&mut self, length: usize) -> Result<(), BufferError> {
        self.ensure(length)?;
        self.x += length;
        Ok(())
    }

    /// Returns a subarray of the given size and advances the cursor.
    pub fn buf(&mut self, size: usize) -> Result<&'a [u8], BufferError> {
        self.ensure(size)?;
        let x = self.x;
        self.x += size;
        Ok(&self.uint8[x..self.x])
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], BufferError> {
        let bytes = self.buf(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Reads an unsigned 8-bit integer.
    #[inline]
    pub fn u8(&mut self) -> Result<u8, BufferError> {
        self.ensure(1)?;
        let val = self.uint8[self.x];
        self.x += 1;
        Ok(val)
    }

    /// Reads a signed 32-bit integer (little-endian).
    #[inline]
    pub fn i32_le(&mut self) -> Result<i32, BufferError> {
        self.array::<4>().map(i32::from_le_bytes)
    }

    /// Reads a signed 64-bit integer (little-endian).
    #[inline]
    pub fn i64_le(&mut self) -> Result<i64, BufferError> {
        self.array::<8>().map(i64::from_le_bytes)
    }

    /// Reads a 64-bit IEEE-754 float (little-endian).
    #[inline]
    pub fn f64_le(&mut self) -> Result<f64, BufferError> {
        self.array::<8>().map(f64::from_le_bytes)
    }

    /// Reads a UTF-8 string of the given byte size.
    pub fn utf8(&mut self, size: usize) -> Result<&'a str, BufferError> {
        let offset = self.x;
        let bytes = self.buf(size)?;
        str::from_utf8(bytes).map_err(|_| BufferError::InvalidUtf8 { offset })
    }

    /// Reads a NUL-terminated UTF-8 string and consumes the terminator.
    ///
    /// The returned slice excludes the terminator.
    pub fn cstring(&mut self) -> Result<&'a str, BufferError> {
        let start = self.x;
        let window = &self.uint8[start..self.end];
        let len = window
            .iter()
            .position(|&b| b == 0)
            .ok_or(BufferError::EndOfBuffer {
                offset: self.end,
                needed: 1,
            })?;
        let s = str::from_utf8(&window[..len])
            .map_err(|_| BufferError::InvalidUtf8 { offset: start })?;
        self.x = start + len + 1;
        Ok(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u8() {
        let data = [0x01, 0x02, 0x03];
        let mut reader = Reader::new(&data);
        assert_eq!(reader.u8(), Ok(0x01));
        assert_eq!(reader.u8(), Ok(0x02));
        assert_eq!(reader.u8(), Ok(0x03));
        assert_eq!(
            reader.u8(),
            Err(BufferError::EndOfBuffer {
                offset: 3,
                needed: 1
            })
        );
    }

    #[test]
    fn test_i32_le() {
        let data = [0x7b, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff];
        let mut reader = Reader::new(&data);
        assert_eq!(reader.i32_le(), Ok(123));
        assert_eq!(reader.i32_le(), Ok(-1));
    }

    #[test]
    fn test_i64_and_f64_le() {
        let mut data = Vec::new();
        data.extend_from_slice(&(-5i64).to_le_bytes());
        data.extend_from_slice(&1.5f64.to_le_bytes());
        let mut reader = Reader::new(&data);
        assert_eq!(reader.i64_le(), Ok(-5));
        assert_eq!(reader.f64_le(), Ok(1.5));
        assert_eq!(reader.size(), 0);
    }

    #[test]
    fn test_truncated_read_does_not_advance() {
        let data = [0x01, 0x02];
        let mut reader = Reader::new(&data);
        assert!(reader.i32_le().is_err());
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_skip() {
        let data = [0x01, 0x02, 0x03, 0x04];
        let mut reader = Reader::new(&data);
        reader.skip(2).unwrap();
        assert_eq!(reader.u8(), Ok(0x03));
        assert!(reader.skip(5).is_err());
    }

    #[test]
    fn test_from_slice_bounds() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05];
        let mut slice = Reader::from_slice(&data, 1, 3);
        assert_eq!(slice.u8(), Ok(0x02));
        assert_eq!(slice.u8(), Ok(0x03));
        assert!(slice.u8().is_err());
    }

    #[test]
    fn test_utf8() {
        let data = b"hello world";
        let mut reader = Reader::new(data);
        assert_eq!(reader.utf8(5), Ok("hello"));
        assert_eq!(reader.utf8(6), Ok(" world"));
    }

    #[test]
    fn test_utf8_invalid() {
        let data = [0xff, 0xfe];
        let mut reader = Reader::new(&data);
        assert_eq!(reader.utf8(2), Err(BufferError::InvalidUtf8 { offset: 0 }));
    }

    #[test]
    fn test_cstring() {
        let data = b"ab\0\0c";
        let mut reader = Reader::new(data);
        assert_eq!(reader.cstring(), Ok("ab"));
        assert_eq!(reader.cstring(), Ok(""));
        assert!(reader.cstring().is_err());
    }
}
