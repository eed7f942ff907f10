use alloc::vec::Vec;

use crate::RttiError;
use crate::stream::{BLOCK_HEADER_SIZE, Primitive};

// -----------------------------------------------------------------------------
// BinaryWriter

/// Append cursor over a growable byte buffer.
///
/// # Examples
///
/// ```
/// use vc_rtti::stream::BinaryWriter;
///
/// let mut writer = BinaryWriter::new();
/// writer.write(7_u32);
/// let total = writer
///     .write_sized_block(|w| {
///         w.write(1_u8);
///         w.write(2_u8);
///         Ok(())
///     })
///     .unwrap();
///
/// assert_eq!(total, 6);
/// assert_eq!(writer.as_slice(), &[7, 0, 0, 0, 2, 0, 0, 0, 1, 2]);
/// ```
#[derive(Debug, Default, Clone)]
pub struct BinaryWriter {
    buf: Vec<u8>,
}

impl BinaryWriter {
    /// Create an empty writer.
    #[inline]
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Create an empty writer with preallocated capacity.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of bytes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if nothing was written yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns the written bytes.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the writer and return its buffer.
    #[inline]
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    /// Write a primitive, returns the number of bytes written.
    #[inline]
    pub fn write<P: Primitive>(&mut self, value: P) -> u32 {
        value.put(&mut self.buf);
        P::SIZE as u32
    }

    /// Write raw bytes, returns the number of bytes written.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<u32, RttiError> {
        let len = block_len(bytes.len())?;
        self.buf.extend_from_slice(bytes);
        Ok(len)
    }

    /// Write a size-prefixed block whose length is learned from the payload.
    ///
    /// A 4-byte slot is reserved, `payload` runs, then the slot is patched with
    /// the number of bytes `payload` emitted.
    ///
    /// Returns the total bytes written, header included.
    pub fn write_sized_block(
        &mut self,
        payload: impl FnOnce(&mut Self) -> Result<(), RttiError>,
    ) -> Result<u32, RttiError> {
        let slot = self.buf.len();
        self.write(0_u32);
        payload(self)?;

        let len = block_len(self.buf.len() - slot - BLOCK_HEADER_SIZE as usize)?;
        self.buf[slot..slot + BLOCK_HEADER_SIZE as usize].copy_from_slice(&len.to_le_bytes());
        Ok(BLOCK_HEADER_SIZE + len)
    }

    /// Write a size-prefixed block whose length was computed up front.
    ///
    /// Fails with [`RttiError::SizeMismatch`] if `payload` emits a different
    /// number of bytes than `expected`.
    ///
    /// Returns the total bytes written, header included.
    pub fn write_sized_block_exact(
        &mut self,
        expected: u32,
        payload: impl FnOnce(&mut Self) -> Result<(), RttiError>,
    ) -> Result<u32, RttiError> {
        self.write(expected);
        let start = self.buf.len();
        payload(self)?;

        let actual = block_len(self.buf.len() - start)?;
        if actual != expected {
            return Err(RttiError::SizeMismatch { expected, actual });
        }
        Ok(BLOCK_HEADER_SIZE + actual)
    }
}

#[inline]
fn block_len(len: usize) -> Result<u32, RttiError> {
    u32::try_from(len).map_err(|_| RttiError::BlockTooLarge { len })
}
