use alloc::vec::Vec;
use core::any::Any;

use crate::RttiError;
use crate::archive::{Decoder, Encoder, MIN_OBJECT_SIZE, SHARED_HEADER_SIZE};
use crate::codec::PlainCodec;
use crate::schema::field::{FieldAccess, host_mut, host_ref};
use crate::schema::{SharedRef, Typed};
use crate::stream::{BinaryReader, BinaryWriter};

const COUNT_SIZE: u64 = 4;

// -----------------------------------------------------------------------------
// ArrayAccessors

/// Element thunks for array fields whose storage is not a plain `Vec`.
///
/// On decode `set_len` runs once with the element count, then `set` runs for
/// every index in order.
///
/// # Examples
///
/// ```
/// use vc_rtti::schema::ArrayAccessors;
///
/// struct Table {
///     rows: Box<[u32]>,
/// }
///
/// let rows: ArrayAccessors<Table, u32> = ArrayAccessors {
///     len: |t| t.rows.len(),
///     get: |t, i| &t.rows[i],
///     set_len: |t, n| t.rows = vec![0; n].into_boxed_slice(),
///     set: |t, i, v| t.rows[i] = v,
/// };
/// # let _ = rows;
/// ```
pub struct ArrayAccessors<T, E> {
    pub len: fn(&T) -> usize,
    pub get: fn(&T, usize) -> &E,
    pub set_len: fn(&mut T, usize),
    pub set: fn(&mut T, usize, E),
}

pub(crate) enum Elements<T, E> {
    Thunks(ArrayAccessors<T, E>),
    Vec {
        get: fn(&T) -> &Vec<E>,
        get_mut: fn(&mut T) -> &mut Vec<E>,
    },
}

impl<T, E> Elements<T, E> {
    #[inline]
    fn len(&self, host: &T) -> usize {
        match self {
            Self::Thunks(thunks) => (thunks.len)(host),
            Self::Vec { get, .. } => get(host).len(),
        }
    }

    #[inline]
    fn get<'a>(&self, host: &'a T, index: usize) -> &'a E {
        match self {
            Self::Thunks(thunks) => (thunks.get)(host, index),
            Self::Vec { get, .. } => &get(host)[index],
        }
    }

    fn reset(&self, host: &mut T, len: usize) {
        match self {
            Self::Thunks(thunks) => (thunks.set_len)(host, len),
            Self::Vec { get_mut, .. } => {
                let vec = get_mut(host);
                vec.clear();
                vec.reserve(len);
            }
        }
    }

    #[inline]
    fn set(&self, host: &mut T, index: usize, value: E) {
        match self {
            Self::Thunks(thunks) => (thunks.set)(host, index, value),
            Self::Vec { get_mut, .. } => get_mut(host).push(value),
        }
    }

    fn write_count(&self, host: &T, writer: &mut BinaryWriter) -> Result<usize, RttiError> {
        let len = self.len(host);
        let count = u32::try_from(len).map_err(|_| RttiError::BlockTooLarge { len })?;
        writer.write(count);
        Ok(len)
    }
}

// -----------------------------------------------------------------------------
// Plain

pub(crate) struct PlainField<T, V> {
    pub get: fn(&T) -> &V,
    pub set: fn(&mut T, V),
}

impl<T: Any, V: PlainCodec + 'static> FieldAccess for PlainField<T, V> {
    fn size_hint(&self, host: &dyn Any) -> Result<Option<u32>, RttiError> {
        let host = host_ref::<T>(host)?;
        Ok(Some((self.get)(host).dynamic_size()))
    }

    fn encode(
        &self,
        host: &dyn Any,
        writer: &mut BinaryWriter,
        _: &mut Encoder<'_>,
    ) -> Result<(), RttiError> {
        let host = host_ref::<T>(host)?;
        (self.get)(host).to_stream(writer)?;
        Ok(())
    }

    fn decode(
        &self,
        host: &mut dyn Any,
        reader: &mut BinaryReader<'_>,
        _: &mut Decoder<'_>,
    ) -> Result<(), RttiError> {
        let host = host_mut::<T>(host)?;
        let value = V::from_stream(reader)?;
        (self.set)(host, value);
        Ok(())
    }
}

pub(crate) struct PlainArrayField<T, V> {
    pub elements: Elements<T, V>,
}

impl<T: Any, V: PlainCodec + 'static> FieldAccess for PlainArrayField<T, V> {
    fn size_hint(&self, host: &dyn Any) -> Result<Option<u32>, RttiError> {
        let host = host_ref::<T>(host)?;
        let mut size = COUNT_SIZE;
        for index in 0..self.elements.len(host) {
            size += u64::from(self.elements.get(host, index).dynamic_size());
        }
        u32::try_from(size)
            .map(Some)
            .map_err(|_| RttiError::BlockTooLarge { len: size as usize })
    }

    fn encode(
        &self,
        host: &dyn Any,
        writer: &mut BinaryWriter,
        _: &mut Encoder<'_>,
    ) -> Result<(), RttiError> {
        let host = host_ref::<T>(host)?;
        let len = self.elements.write_count(host, writer)?;
        for index in 0..len {
            self.elements.get(host, index).to_stream(writer)?;
        }
        Ok(())
    }

    fn decode(
        &self,
        host: &mut dyn Any,
        reader: &mut BinaryReader<'_>,
        _: &mut Decoder<'_>,
    ) -> Result<(), RttiError> {
        let host = host_mut::<T>(host)?;
        let len = reader.read_count(V::MIN_SIZE)?;
        self.elements.reset(host, len);
        for index in 0..len {
            let value = V::from_stream(reader)?;
            self.elements.set(host, index, value);
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Owned objects

pub(crate) struct OwnedField<T, N> {
    pub get: fn(&T) -> &N,
    pub get_mut: fn(&mut T) -> &mut N,
}

impl<T: Any, N: Typed> FieldAccess for OwnedField<T, N> {
    #[inline]
    fn size_hint(&self, _: &dyn Any) -> Result<Option<u32>, RttiError> {
        Ok(None)
    }

    fn encode(
        &self,
        host: &dyn Any,
        writer: &mut BinaryWriter,
        encoder: &mut Encoder<'_>,
    ) -> Result<(), RttiError> {
        let host = host_ref::<T>(host)?;
        encoder.write_object(writer, (self.get)(host))
    }

    fn decode(
        &self,
        host: &mut dyn Any,
        reader: &mut BinaryReader<'_>,
        decoder: &mut Decoder<'_>,
    ) -> Result<(), RttiError> {
        let host = host_mut::<T>(host)?;
        *(self.get_mut)(host) = decoder.read_owned::<N>(reader)?;
        Ok(())
    }
}

pub(crate) struct OwnedArrayField<T, N> {
    pub elements: Elements<T, N>,
}

impl<T: Any, N: Typed> FieldAccess for OwnedArrayField<T, N> {
    #[inline]
    fn size_hint(&self, _: &dyn Any) -> Result<Option<u32>, RttiError> {
        Ok(None)
    }

    fn encode(
        &self,
        host: &dyn Any,
        writer: &mut BinaryWriter,
        encoder: &mut Encoder<'_>,
    ) -> Result<(), RttiError> {
        let host = host_ref::<T>(host)?;
        let len = self.elements.write_count(host, writer)?;
        for index in 0..len {
            encoder.write_object(writer, self.elements.get(host, index))?;
        }
        Ok(())
    }

    fn decode(
        &self,
        host: &mut dyn Any,
        reader: &mut BinaryReader<'_>,
        decoder: &mut Decoder<'_>,
    ) -> Result<(), RttiError> {
        let host = host_mut::<T>(host)?;
        let len = reader.read_count(MIN_OBJECT_SIZE)?;
        self.elements.reset(host, len);
        for index in 0..len {
            let value = decoder.read_owned::<N>(reader)?;
            self.elements.set(host, index, value);
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Shared objects

pub(crate) struct SharedField<T, S> {
    pub get: fn(&T) -> &Option<S>,
    pub set: fn(&mut T, Option<S>),
}

impl<T: Any, S: SharedRef> FieldAccess for SharedField<T, S> {
    #[inline]
    fn size_hint(&self, _: &dyn Any) -> Result<Option<u32>, RttiError> {
        Ok(None)
    }

    fn encode(
        &self,
        host: &dyn Any,
        writer: &mut BinaryWriter,
        encoder: &mut Encoder<'_>,
    ) -> Result<(), RttiError> {
        let host = host_ref::<T>(host)?;
        encoder.write_shared(writer, (self.get)(host).as_ref())
    }

    fn decode(
        &self,
        host: &mut dyn Any,
        reader: &mut BinaryReader<'_>,
        decoder: &mut Decoder<'_>,
    ) -> Result<(), RttiError> {
        let host = host_mut::<T>(host)?;
        let value = decoder.read_shared_as::<S>(reader)?;
        (self.set)(host, value);
        Ok(())
    }
}

pub(crate) struct SharedArrayField<T, S> {
    pub elements: Elements<T, Option<S>>,
}

impl<T: Any, S: SharedRef> FieldAccess for SharedArrayField<T, S> {
    #[inline]
    fn size_hint(&self, _: &dyn Any) -> Result<Option<u32>, RttiError> {
        Ok(None)
    }

    fn encode(
        &self,
        host: &dyn Any,
        writer: &mut BinaryWriter,
        encoder: &mut Encoder<'_>,
    ) -> Result<(), RttiError> {
        let host = host_ref::<T>(host)?;
        let len = self.elements.write_count(host, writer)?;
        for index in 0..len {
            encoder.write_shared(writer, self.elements.get(host, index).as_ref())?;
        }
        Ok(())
    }

    fn decode(
        &self,
        host: &mut dyn Any,
        reader: &mut BinaryReader<'_>,
        decoder: &mut Decoder<'_>,
    ) -> Result<(), RttiError> {
        let host = host_mut::<T>(host)?;
        let len = reader.read_count(SHARED_HEADER_SIZE)?;
        self.elements.reset(host, len);
        for index in 0..len {
            let value = decoder.read_shared_as::<S>(reader)?;
            self.elements.set(host, index, value);
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Data block

pub(crate) struct DataBlockField<T> {
    pub get: fn(&T) -> &[u8],
    pub set: fn(&mut T, Vec<u8>),
}

impl<T: Any> FieldAccess for DataBlockField<T> {
    fn size_hint(&self, host: &dyn Any) -> Result<Option<u32>, RttiError> {
        let len = (self.get)(host_ref::<T>(host)?).len();
        u32::try_from(len)
            .map(Some)
            .map_err(|_| RttiError::BlockTooLarge { len })
    }

    fn encode(
        &self,
        host: &dyn Any,
        writer: &mut BinaryWriter,
        _: &mut Encoder<'_>,
    ) -> Result<(), RttiError> {
        let host = host_ref::<T>(host)?;
        writer.write_bytes((self.get)(host))?;
        Ok(())
    }

    fn decode(
        &self,
        host: &mut dyn Any,
        reader: &mut BinaryReader<'_>,
        _: &mut Decoder<'_>,
    ) -> Result<(), RttiError> {
        let host = host_mut::<T>(host)?;
        (self.set)(host, reader.read_to_end().to_vec());
        Ok(())
    }
}
