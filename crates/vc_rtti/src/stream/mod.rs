//! Byte-level cursors.
//!
//! - [`BinaryWriter`]: append cursor over a growable buffer.
//! - [`BinaryReader`]: bounded read cursor over a borrowed slice.
//! - [`Primitive`]: fixed-width little-endian values.
//!
//! Both cursors understand *sized blocks*, `[length:u32][payload]`, where
//! `length` counts the payload bytes only. A reader can step over a block
//! without interpreting it, which is how fields unknown to the running
//! schema are skipped.

// -----------------------------------------------------------------------------
// Modules

mod primitive;
mod reader;
mod writer;

// -----------------------------------------------------------------------------
// Exports

pub use primitive::Primitive;
pub use reader::BinaryReader;
pub use writer::BinaryWriter;

/// Width of the length header in front of every sized block.
pub const BLOCK_HEADER_SIZE: u32 = 4;
