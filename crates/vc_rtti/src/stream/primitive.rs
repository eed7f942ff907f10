use alloc::vec::Vec;

use crate::RttiError;

/// A fixed-width value stored as little-endian bytes.
///
/// Implemented for `bool`, `u8`-`u64`, `i8`-`i64`, `f32`, `f64` and `char`.
pub trait Primitive: Copy + Sized {
    /// Encoded width in bytes.
    const SIZE: usize;

    /// Append the little-endian bytes of `self`.
    fn put(self, out: &mut Vec<u8>);

    /// Decode from exactly [`Self::SIZE`] bytes.
    ///
    /// `offset` is only used for diagnostics.
    fn take(bytes: &[u8], offset: usize) -> Result<Self, RttiError>;
}

macro_rules! impl_primitive {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Primitive for $ty {
                const SIZE: usize = core::mem::size_of::<$ty>();

                #[inline]
                fn put(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn take(bytes: &[u8], _offset: usize) -> Result<Self, RttiError> {
                    let mut raw = [0_u8; core::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    Ok(<$ty>::from_le_bytes(raw))
                }
            }
        )*
    };
}

impl_primitive!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl Primitive for bool {
    const SIZE: usize = 1;

    #[inline]
    fn put(self, out: &mut Vec<u8>) {
        out.push(self as u8);
    }

    fn take(bytes: &[u8], offset: usize) -> Result<Self, RttiError> {
        match bytes[0] {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(RttiError::InvalidData {
                offset,
                reason: alloc::format!("byte {other:#04x} is not a bool").into(),
            }),
        }
    }
}

impl Primitive for char {
    const SIZE: usize = 4;

    #[inline]
    fn put(self, out: &mut Vec<u8>) {
        (self as u32).put(out);
    }

    fn take(bytes: &[u8], offset: usize) -> Result<Self, RttiError> {
        let raw = u32::take(bytes, offset)?;
        char::from_u32(raw).ok_or_else(|| RttiError::InvalidData {
            offset,
            reason: alloc::format!("{raw:#x} is not a unicode scalar value").into(),
        })
    }
}
