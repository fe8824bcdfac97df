//! The tagged binary element format.
//!
//! Every integer is little-endian. A document is framed as
//!
//! ```text
//! int32 length | element* | 0x00
//! element      = tag:u8 | name:cstring | payload
//! ```
//!
//! where `length` counts every byte after the length field, terminator
//! included. Arrays are documents keyed `"0"`, `"1"`, ... in order.

mod reader;
mod writer;

pub use reader::{array_from_document, WireReader};
pub use writer::WireWriter;
