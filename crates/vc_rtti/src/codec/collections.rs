use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;
use core::hash::{BuildHasher, Hash};

use crate::RttiError;
use crate::codec::{PlainCodec, VERSIONED_HEADER_SIZE, read_versioned, write_versioned};
use crate::stream::{BinaryReader, BinaryWriter};

const COUNT_SIZE: u32 = 4;

// -----------------------------------------------------------------------------
// Option

/// `[length][version = 1][present:u8][value?]`
impl<V: PlainCodec> PlainCodec for Option<V> {
    const DYNAMIC: bool = true;
    const VERSION: u32 = 1;

    fn to_stream(&self, writer: &mut BinaryWriter) -> Result<u32, RttiError> {
        write_versioned(writer, Self::VERSION, |w| {
            w.write(self.is_some());
            if let Some(value) = self {
                value.to_stream(w)?;
            }
            Ok(())
        })
    }

    fn from_stream(reader: &mut BinaryReader<'_>) -> Result<Self, RttiError> {
        read_versioned(reader, "Option", Self::VERSION, |r, _| {
            if r.read::<bool>()? {
                Ok(Some(V::from_stream(r)?))
            } else {
                Ok(None)
            }
        })
    }

    fn dynamic_size(&self) -> u32 {
        VERSIONED_HEADER_SIZE + 1 + self.as_ref().map_or(0, V::dynamic_size)
    }
}

// -----------------------------------------------------------------------------
// Sequences

fn write_elements<'a, V: PlainCodec + 'a>(
    writer: &mut BinaryWriter,
    len: usize,
    elements: impl Iterator<Item = &'a V>,
) -> Result<(), RttiError> {
    let count = u32::try_from(len).map_err(|_| RttiError::BlockTooLarge { len })?;
    writer.write(count);
    for element in elements {
        element.to_stream(writer)?;
    }
    Ok(())
}

fn read_elements<V: PlainCodec, C: FromIterator<V>>(
    reader: &mut BinaryReader<'_>,
) -> Result<C, RttiError> {
    let count = reader.read_count(V::MIN_SIZE)?;
    (0..count).map(|_| V::from_stream(reader)).collect()
}

fn elements_size<'a, V: PlainCodec + 'a>(elements: impl Iterator<Item = &'a V>) -> u32 {
    elements.fold(VERSIONED_HEADER_SIZE + COUNT_SIZE, |acc, element| {
        acc.saturating_add(element.dynamic_size())
    })
}

macro_rules! impl_sequence_codec {
    ($name:literal, [$($generics:tt)*] $ty:ty) => {
        /// `[length][version = 1][count:u32][element]*`
        impl<$($generics)*> PlainCodec for $ty {
            const DYNAMIC: bool = true;
            const VERSION: u32 = 1;

            fn to_stream(&self, writer: &mut BinaryWriter) -> Result<u32, RttiError> {
                write_versioned(writer, Self::VERSION, |w| {
                    write_elements(w, self.len(), self.iter())
                })
            }

            fn from_stream(reader: &mut BinaryReader<'_>) -> Result<Self, RttiError> {
                read_versioned(reader, $name, Self::VERSION, |r, _| read_elements::<V, Self>(r))
            }

            fn dynamic_size(&self) -> u32 {
                elements_size(self.iter())
            }
        }
    };
}

impl_sequence_codec!("Vec", [V: PlainCodec] Vec<V>);
impl_sequence_codec!("BTreeSet", [V: PlainCodec + Ord] BTreeSet<V>);
impl_sequence_codec!(
    "HashSet",
    [V: PlainCodec + Eq + Hash, S: BuildHasher + Default] std::collections::HashSet<V, S>
);
impl_sequence_codec!(
    "HashSet",
    [V: PlainCodec + Eq + Hash, S: BuildHasher + Default] hashbrown::HashSet<V, S>
);

// -----------------------------------------------------------------------------
// Maps

fn write_entries<'a, K: PlainCodec + 'a, V: PlainCodec + 'a>(
    writer: &mut BinaryWriter,
    len: usize,
    entries: impl Iterator<Item = (&'a K, &'a V)>,
) -> Result<(), RttiError> {
    let count = u32::try_from(len).map_err(|_| RttiError::BlockTooLarge { len })?;
    writer.write(count);
    for (key, value) in entries {
        key.to_stream(writer)?;
        value.to_stream(writer)?;
    }
    Ok(())
}

fn read_entries<K: PlainCodec, V: PlainCodec, C: FromIterator<(K, V)>>(
    reader: &mut BinaryReader<'_>,
) -> Result<C, RttiError> {
    let count = reader.read_count(K::MIN_SIZE + V::MIN_SIZE)?;
    (0..count)
        .map(|_| Ok((K::from_stream(reader)?, V::from_stream(reader)?)))
        .collect()
}

fn entries_size<'a, K: PlainCodec + 'a, V: PlainCodec + 'a>(
    entries: impl Iterator<Item = (&'a K, &'a V)>,
) -> u32 {
    entries.fold(VERSIONED_HEADER_SIZE + COUNT_SIZE, |acc, (key, value)| {
        acc.saturating_add(key.dynamic_size())
            .saturating_add(value.dynamic_size())
    })
}

macro_rules! impl_map_codec {
    ($name:literal, [$($generics:tt)*] $ty:ty) => {
        /// `[length][version = 1][count:u32]([key][value])*`
        impl<$($generics)*> PlainCodec for $ty {
            const DYNAMIC: bool = true;
            const VERSION: u32 = 1;

            fn to_stream(&self, writer: &mut BinaryWriter) -> Result<u32, RttiError> {
                write_versioned(writer, Self::VERSION, |w| {
                    write_entries(w, self.len(), self.iter())
                })
            }

            fn from_stream(reader: &mut BinaryReader<'_>) -> Result<Self, RttiError> {
                read_versioned(reader, $name, Self::VERSION, |r, _| read_entries::<K, V, Self>(r))
            }

            fn dynamic_size(&self) -> u32 {
                entries_size(self.iter())
            }
        }
    };
}

impl_map_codec!("BTreeMap", [K: PlainCodec + Ord, V: PlainCodec] BTreeMap<K, V>);
impl_map_codec!(
    "HashMap",
    [K: PlainCodec + Eq + Hash, V: PlainCodec, S: BuildHasher + Default]
    std::collections::HashMap<K, V, S>
);
impl_map_codec!(
    "HashMap",
    [K: PlainCodec + Eq + Hash, V: PlainCodec, S: BuildHasher + Default]
    hashbrown::HashMap<K, V, S>
);
