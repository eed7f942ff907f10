//! Value encodings used by plain fields.
//!
//! ## Menu
//!
//! - [`PlainCodec`]: how one value type is written, read and sized.
//! - [`write_versioned`] / [`read_versioned`]: the framing of dynamically-sized codecs.
//! - [`versioned_size`]: the size of that framing around a payload.
//! - [`impl_fixed_codec!`]: compose a struct of fixed-size sub-fields, no header.
//! - [`impl_versioned_codec!`]: compose a struct with a version tag and per-field
//!   introduction versions.
//!
//! ## Built-in codecs
//!
//! - Fixed: `()` `bool` `char` `u8`-`u64` `i8`-`i64` `f32` `f64`
//! - Dynamic: `String`, `Option<V>`, `Vec<V>`, `BTreeMap`, `BTreeSet`, std and
//!   hashbrown `HashMap` / `HashSet`
//!
//! ## Framing
//!
//! Fixed codecs write their raw little-endian bytes. Dynamic codecs write
//! `[length:u32][version:u32][payload]`, where `length` counts everything after
//! itself. [`PlainCodec::dynamic_size`] always includes both header words.
//!
//! [`impl_fixed_codec!`]: crate::impl_fixed_codec
//! [`impl_versioned_codec!`]: crate::impl_versioned_codec

// -----------------------------------------------------------------------------
// Modules

mod collections;
mod macros;
mod primitives;
mod string;

// -----------------------------------------------------------------------------
// PlainCodec

use crate::RttiError;
use crate::stream::{BinaryReader, BinaryWriter};

/// Size of `[length:u32][version:u32]` in front of every dynamic codec payload.
pub const VERSIONED_HEADER_SIZE: u32 = 8;

/// The read/write/size strategy for one value type.
///
/// # Invariant
///
/// [`dynamic_size`](Self::dynamic_size) must return exactly the number of
/// bytes [`to_stream`](Self::to_stream) writes for the same value. Plain fields
/// are framed with that prediction and a mismatch aborts the encode with
/// [`RttiError::SizeMismatch`].
///
/// # Examples
///
/// ```
/// use vc_rtti::codec::PlainCodec;
/// use vc_rtti::stream::{BinaryReader, BinaryWriter};
///
/// let value = vec![String::from("a"), String::from("bc")];
///
/// let mut writer = BinaryWriter::new();
/// let written = value.to_stream(&mut writer).unwrap();
/// assert_eq!(written, value.dynamic_size());
///
/// let mut reader = BinaryReader::new(writer.as_slice());
/// assert_eq!(Vec::<String>::from_stream(&mut reader).unwrap(), value);
/// ```
pub trait PlainCodec: Sized {
    /// Whether the encoded size depends on the value.
    const DYNAMIC: bool;

    /// The version tag written by dynamic codecs; `0` for unversioned fixed codecs.
    const VERSION: u32 = 0;

    /// The smallest number of bytes any encoded value occupies.
    ///
    /// Used to reject element counts that cannot fit in the remaining stream.
    const MIN_SIZE: usize = VERSIONED_HEADER_SIZE as usize;

    /// Write `self`, returns the number of bytes written.
    fn to_stream(&self, writer: &mut BinaryWriter) -> Result<u32, RttiError>;

    /// Read a value.
    fn from_stream(reader: &mut BinaryReader<'_>) -> Result<Self, RttiError>;

    /// Predict how many bytes [`to_stream`](Self::to_stream) writes.
    fn dynamic_size(&self) -> u32;
}

/// Returns the encoded size of `value`.
#[inline]
pub fn encoded_size<V: PlainCodec>(value: &V) -> u32 {
    value.dynamic_size()
}

// -----------------------------------------------------------------------------
// Versioned framing

/// Write `[length][version][body]`, returns the total bytes written.
pub fn write_versioned(
    writer: &mut BinaryWriter,
    version: u32,
    body: impl FnOnce(&mut BinaryWriter) -> Result<(), RttiError>,
) -> Result<u32, RttiError> {
    writer.write_sized_block(|w| {
        w.write(version);
        body(w)
    })
}

/// Size of a versioned frame around `payload` bytes, saturating at `u32::MAX`.
#[inline]
pub fn versioned_size(payload: usize) -> u32 {
    u32::try_from(payload)
        .unwrap_or(u32::MAX)
        .saturating_add(VERSIONED_HEADER_SIZE)
}

/// Read `[length][version][body]`.
///
/// `body` receives a reader bounded to the block and the version found in the
/// stream. Versions `0` and above `supported` fail with
/// [`RttiError::CodecVersionUnsupported`]. Bytes `body` leaves unread are
/// skipped.
pub fn read_versioned<T>(
    reader: &mut BinaryReader<'_>,
    codec: &'static str,
    supported: u32,
    body: impl FnOnce(&mut BinaryReader<'_>, u32) -> Result<T, RttiError>,
) -> Result<T, RttiError> {
    let mut block = reader.read_sized_block()?;
    let version = block.read::<u32>()?;
    if version == 0 || version > supported {
        return Err(RttiError::CodecVersionUnsupported {
            codec,
            found: version,
            supported,
        });
    }

    let value = body(&mut block, version)?;
    if !block.is_empty() {
        log::debug!(
            "codec `{codec}` left {} bytes of a version {version} payload unread",
            block.remaining()
        );
    }
    Ok(value)
}
