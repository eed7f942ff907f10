use crate::RttiError;
use crate::stream::Primitive;

// -----------------------------------------------------------------------------
// BinaryReader

/// Bounded read cursor over a borrowed byte slice.
///
/// [`read_sized_block`](Self::read_sized_block) returns a sub-reader limited
/// to exactly one block and moves `self` past it, so whatever the sub-reader
/// leaves unread is skipped.
///
/// # Examples
///
/// ```
/// use vc_rtti::stream::BinaryReader;
///
/// let bytes = [2, 0, 0, 0, 0xAA, 0xBB, 5];
/// let mut reader = BinaryReader::new(&bytes);
///
/// let mut block = reader.read_sized_block().unwrap();
/// assert_eq!(block.read::<u8>().unwrap(), 0xAA);
///
/// // The second block byte is never read, the parent still lands after it.
/// assert_eq!(reader.read::<u8>().unwrap(), 5);
/// assert!(reader.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    pos: usize,
    // Absolute offset of `data[0]` in the outermost stream.
    base: usize,
}

impl<'a> BinaryReader<'a> {
    /// Create a reader over `data`.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            base: 0,
        }
    }

    /// Returns the number of unread bytes.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns `true` if every byte was consumed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Returns the cursor position relative to the outermost stream.
    #[inline]
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    /// Read exactly `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], RttiError> {
        if len > self.remaining() {
            return Err(RttiError::TruncatedStream {
                offset: self.offset(),
                needed: len,
                remaining: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Read every remaining byte.
    #[inline]
    pub fn read_to_end(&mut self) -> &'a [u8] {
        let bytes = &self.data[self.pos..];
        self.pos = self.data.len();
        bytes
    }

    /// Read a primitive.
    #[inline]
    pub fn read<P: Primitive>(&mut self) -> Result<P, RttiError> {
        let offset = self.offset();
        let bytes = self.read_bytes(P::SIZE)?;
        P::take(bytes, offset)
    }

    /// Read a `u32` element count and check it against the bytes left.
    ///
    /// Every element occupies at least `min_element_size` bytes, so a count
    /// that cannot fit is reported as a truncated stream before anything is
    /// allocated for it.
    pub fn read_count(&mut self, min_element_size: usize) -> Result<usize, RttiError> {
        let count = self.read::<u32>()? as usize;
        let needed = count.saturating_mul(min_element_size);
        if needed > self.remaining() {
            return Err(RttiError::TruncatedStream {
                offset: self.offset(),
                needed,
                remaining: self.remaining(),
            });
        }
        Ok(count)
    }

    /// Read a block length and return a reader bounded to that block.
    ///
    /// `self` moves past the whole block.
    pub fn read_sized_block(&mut self) -> Result<BinaryReader<'a>, RttiError> {
        let len = self.read::<u32>()? as usize;
        let base = self.offset();
        let data = self.read_bytes(len)?;
        Ok(BinaryReader { data, pos: 0, base })
    }

    /// Move past one sized block without interpreting it.
    ///
    /// Returns the payload length.
    pub fn skip_sized_block(&mut self) -> Result<usize, RttiError> {
        let block = self.read_sized_block()?;
        Ok(block.data.len())
    }
}
