//! Binary buffer utilities for tiny-bson.
//!
//! # Overview
//!
//! - [`Reader`] - Reads little-endian data from a byte slice with cursor tracking
//! - [`Writer`] - Writes little-endian data to an auto-growing buffer
//!
//! # Example
//!
//! ```
//! use tiny_bson_buffers::{Reader, Writer};
//!
//! // Write some data
//! let mut writer = Writer::new();
//! writer.u8(0x10);
//! writer.i32_le(123);
//! writer.utf8("hello");
//! writer.u8(0);
//! let data = writer.flush();
//!
//! // Read it back
//! let mut reader = Reader::new(&data);
//! assert_eq!(reader.u8().unwrap(), 0x10);
//! assert_eq!(reader.i32_le().unwrap(), 123);
//! assert_eq!(reader.cstring().unwrap(), "hello");
//! ```

mod reader;
mod writer;

pub use reader::Reader;
pub use writer::Writer;

use thiserror::Error;

/// Error type for buffer operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// Attempted to read past the end of the buffer.
    #[error("end of buffer at offset {offset} ({needed} more bytes needed)")]
    EndOfBuffer { offset: usize, needed: usize },
    /// Invalid UTF-8 sequence.
    #[error("invalid UTF-8 sequence at offset {offset}")]
    InvalidUtf8 { offset: usize },
    /// Write outside the buffer.
    #[error("buffer overflow")]
    Overflow,
}
