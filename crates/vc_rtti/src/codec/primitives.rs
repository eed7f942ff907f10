use crate::RttiError;
use crate::codec::PlainCodec;
use crate::stream::{BinaryReader, BinaryWriter, Primitive};

macro_rules! impl_primitive_codec {
    ($($ty:ty),* $(,)?) => {
        $(
            impl PlainCodec for $ty {
                const DYNAMIC: bool = false;
                const MIN_SIZE: usize = <$ty as Primitive>::SIZE;

                #[inline]
                fn to_stream(&self, writer: &mut BinaryWriter) -> Result<u32, RttiError> {
                    Ok(writer.write(*self))
                }

                #[inline]
                fn from_stream(reader: &mut BinaryReader<'_>) -> Result<Self, RttiError> {
                    reader.read::<$ty>()
                }

                #[inline]
                fn dynamic_size(&self) -> u32 {
                    <$ty as Primitive>::SIZE as u32
                }
            }
        )*
    };
}

impl_primitive_codec!(bool, char, u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl PlainCodec for () {
    const DYNAMIC: bool = false;
    const MIN_SIZE: usize = 0;

    #[inline]
    fn to_stream(&self, _: &mut BinaryWriter) -> Result<u32, RttiError> {
        Ok(0)
    }

    #[inline]
    fn from_stream(_: &mut BinaryReader<'_>) -> Result<Self, RttiError> {
        Ok(())
    }

    #[inline]
    fn dynamic_size(&self) -> u32 {
        0
    }
}
