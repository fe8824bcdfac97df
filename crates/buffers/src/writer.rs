//! Auto-growing little-endian writer.

use crate::BufferError;

/// A binary writer backed by a growable `Vec<u8>`.
///
/// Besides plain appends, the writer can reserve a 4-byte slot and patch it
/// later. Length-prefixed frames use this to emit the prefix before the
/// payload size is known.
///
/// # Example
///
/// ```
/// use tiny_bson_buffers::Writer;
///
/// let mut writer = Writer::new();
/// let slot = writer.reserve_i32();
/// writer.utf8("hi");
/// writer.u8(0);
/// writer.patch_i32(slot, 3).unwrap();
/// assert_eq!(writer.flush(), vec![3, 0, 0, 0, b'h', b'i', 0]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Writer {
    uint8: Vec<u8>,
}

impl Writer {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty writer with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            uint8: Vec::with_capacity(capacity),
        }
    }

    /// Discards everything written so far.
    pub fn reset(&mut self) {
        self.uint8.clear();
    }

    /// Number of bytes written.
    pub fn len(&self) -> usize {
        self.uint8.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uint8.is_empty()
    }

    /// Borrow the bytes written so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.uint8
    }

    /// Takes the written bytes, leaving the writer empty.
    pub fn flush(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.uint8)
    }

    #[inline]
    pub fn u8(&mut self, val: u8) {
        self.uint8.push(val);
    }

    #[inline]
    pub fn i32_le(&mut self, val: i32) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    #[inline]
    pub fn i64_le(&mut self, val: i64) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    #[inline]
    pub fn f64_le(&mut self, val: f64) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    /// Appends raw bytes.
    pub fn buf(&mut self, data: &[u8]) {
        self.uint8.extend_from_slice(data);
    }

    /// Appends the UTF-8 bytes of `s` (no length, no terminator).
    pub fn utf8(&mut self, s: &str) {
        self.uint8.extend_from_slice(s.as_bytes());
    }

    /// Reserves a zeroed 4-byte slot and returns its offset.
    pub fn reserve_i32(&mut self) -> usize {
        let offset = self.uint8.len();
        self.uint8.extend_from_slice(&[0; 4]);
        offset
    }

    /// Overwrites a slot previously returned by [`Writer::reserve_i32`].
    pub fn patch_i32(&mut self, offset: usize, val: i32) -> Result<(), BufferError> {
        let slot = self
            .uint8
            .get_mut(offset..offset + 4)
            .ok_or(BufferError::Overflow)?;
        slot.copy_from_slice(&val.to_le_bytes());
        Ok(())
    }
}
