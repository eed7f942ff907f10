use alloc::boxed::Box;
use alloc::format;
use alloc::sync::Arc;
use core::any::Any;

use crate::RttiError;
use crate::archive::{DEFAULT_MAX_DEPTH, END_OF_FIELDS, NULL_SLOT, SerializationContext};
use crate::hash::HashMap;
use crate::registry::TypeRegistry;
use crate::schema::{Reflectable, SharedRef, TypeDescriptor, Typed};
use crate::stream::BinaryReader;

// -----------------------------------------------------------------------------
// Decoder

/// Reads object graphs.
///
/// Concrete types are resolved through the registry from the type id at the
/// start of every object. Holds the slot table of one decode call, reset at
/// the start of [`decode`](Self::decode) and [`decode_as`](Self::decode_as).
///
/// Objects nested deeper than [`max_depth`](Self::max_depth) are rejected with
/// [`RttiError::InvalidData`].
pub struct Decoder<'a> {
    registry: &'a TypeRegistry,
    context: &'a SerializationContext,
    // `None` marks a slot whose object is still being decoded.
    slots: HashMap<u32, Option<Arc<dyn Reflectable>>>,
    depth: usize,
    max_depth: usize,
}

impl<'a> Decoder<'a> {
    #[inline]
    pub fn new(registry: &'a TypeRegistry, context: &'a SerializationContext) -> Self {
        Self {
            registry,
            context,
            slots: HashMap::default(),
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Replace the nesting limit, [`DEFAULT_MAX_DEPTH`] by default.
    #[inline]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[inline]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    #[inline]
    pub fn registry(&self) -> &'a TypeRegistry {
        self.registry
    }

    #[inline]
    pub fn context(&self) -> &'a SerializationContext {
        self.context
    }

    /// Decode one root object of any registered type.
    ///
    /// Fails with [`RttiError::TrailingBytes`] if `bytes` continue after it.
    pub fn decode(&mut self, bytes: &[u8]) -> Result<Box<dyn Reflectable>, RttiError> {
        self.slots.clear();
        self.depth = 0;
        let mut reader = BinaryReader::new(bytes);
        let object = self.read_object(&mut reader)?;
        expect_end(&reader)?;
        Ok(object)
    }

    /// Decode one root object that must be a `T`.
    ///
    /// `T` itself need not be registered.
    pub fn decode_as<T: Typed>(&mut self, bytes: &[u8]) -> Result<T, RttiError> {
        self.slots.clear();
        self.depth = 0;
        let mut reader = BinaryReader::new(bytes);
        let value = self.read_owned::<T>(&mut reader)?;
        expect_end(&reader)?;
        Ok(value)
    }

    /// Read one object, resolving its type through the registry.
    #[inline]
    pub fn read_object(
        &mut self,
        reader: &mut BinaryReader<'_>,
    ) -> Result<Box<dyn Reflectable>, RttiError> {
        self.read_hinted(reader, None)
    }

    /// Read one object that must be exactly an `N`.
    pub fn read_owned<N: Typed>(&mut self, reader: &mut BinaryReader<'_>) -> Result<N, RttiError> {
        let object = self.read_hinted(reader, Some(N::type_descriptor()))?;
        let found = object.rtti().type_name();
        match object.into_any().downcast::<N>() {
            Ok(value) => Ok(*value),
            Err(_) => Err(RttiError::TypeMismatch {
                expected: N::type_descriptor().type_name(),
                found,
            }),
        }
    }

    /// Read `[slot][first]` and, on a first occurrence, the object itself.
    ///
    /// Repeated slots return the instance decoded earlier in this call.
    pub fn read_shared(
        &mut self,
        reader: &mut BinaryReader<'_>,
        hint: Option<&'static TypeDescriptor>,
    ) -> Result<Option<Arc<dyn Reflectable>>, RttiError> {
        let offset = reader.offset();
        let slot = reader.read::<u32>()?;
        let first = reader.read::<bool>()?;

        if slot == NULL_SLOT {
            if first {
                return Err(RttiError::InvalidData {
                    offset,
                    reason: "null shared handle marked as first occurrence".into(),
                });
            }
            return Ok(None);
        }

        if !first {
            return match self.slots.get(&slot) {
                Some(Some(shared)) => Ok(Some(Arc::clone(shared))),
                _ => Err(RttiError::UnresolvedSlot { slot }),
            };
        }

        if self.slots.contains_key(&slot) {
            return Err(RttiError::DuplicateSlot { slot });
        }
        self.slots.insert(slot, None);

        let shared: Arc<dyn Reflectable> = Arc::from(self.read_hinted(reader, hint)?);
        self.slots.insert(slot, Some(Arc::clone(&shared)));
        Ok(Some(shared))
    }

    /// [`read_shared`](Self::read_shared) converted to the handle type `S`.
    pub fn read_shared_as<S: SharedRef>(
        &mut self,
        reader: &mut BinaryReader<'_>,
    ) -> Result<Option<S>, RttiError> {
        let Some(shared) = self.read_shared(reader, S::type_hint())? else {
            return Ok(None);
        };
        let found = shared.rtti().type_name();
        match S::from_shared(shared) {
            Some(value) => Ok(Some(value)),
            None => Err(RttiError::TypeMismatch {
                expected: core::any::type_name::<S>(),
                found,
            }),
        }
    }

    fn resolve(
        &self,
        type_id: u32,
        hint: Option<&'static TypeDescriptor>,
    ) -> Result<&'static TypeDescriptor, RttiError> {
        match hint {
            Some(expected) if expected.type_id() == type_id => Ok(expected),
            Some(expected) => match self.registry.get(type_id) {
                Some(found) => Err(RttiError::TypeMismatch {
                    expected: expected.type_name(),
                    found: found.type_name(),
                }),
                None => Err(RttiError::UnknownType { type_id }),
            },
            None => self
                .registry
                .get(type_id)
                .ok_or(RttiError::UnknownType { type_id }),
        }
    }

    fn read_hinted(
        &mut self,
        reader: &mut BinaryReader<'_>,
        hint: Option<&'static TypeDescriptor>,
    ) -> Result<Box<dyn Reflectable>, RttiError> {
        if self.depth >= self.max_depth {
            return Err(RttiError::InvalidData {
                offset: reader.offset(),
                reason: format!("objects nested deeper than {} levels", self.max_depth).into(),
            });
        }
        self.depth += 1;
        let object = self.read_nested(reader, hint);
        self.depth -= 1;
        object
    }

    fn read_nested(
        &mut self,
        reader: &mut BinaryReader<'_>,
        hint: Option<&'static TypeDescriptor>,
    ) -> Result<Box<dyn Reflectable>, RttiError> {
        let offset = reader.offset();
        let type_id = reader.read::<u32>()?;
        let descriptor = self.resolve(type_id, hint)?;
        let mut object = descriptor.create_empty()?;
        log::trace!(
            "decoding `{}` (type id {type_id}) at byte {offset}",
            descriptor.type_name(),
        );

        let levels = descriptor.depth();
        for index in 0..levels {
            let (level, host) = descriptor.level_mut(object.as_any_mut(), index)?;
            level.on_decode_start(host, self.context)?;
        }
        for index in 0..levels {
            let (level, host) = descriptor.level_mut(object.as_any_mut(), index)?;
            self.read_fields(reader, level, host)?;
        }
        for index in (0..levels).rev() {
            let (level, host) = descriptor.level_mut(object.as_any_mut(), index)?;
            level.on_decode_end(host, self.context)?;
        }
        Ok(object)
    }

    /// Read one field group up to and including its end marker.
    fn read_fields(
        &mut self,
        reader: &mut BinaryReader<'_>,
        level: &'static TypeDescriptor,
        host: &mut dyn Any,
    ) -> Result<(), RttiError> {
        loop {
            let field_id = reader.read::<u32>()?;
            if field_id == END_OF_FIELDS {
                return Ok(());
            }

            let Some(field) = level.field(field_id) else {
                let skipped = reader
                    .skip_sized_block()
                    .map_err(|err| err.in_field(level.type_name(), field_id))?;
                log::debug!(
                    "skipped unknown field {field_id} of `{}` ({skipped} bytes)",
                    level.type_name(),
                );
                continue;
            };

            let mut block = reader
                .read_sized_block()
                .map_err(|err| err.in_field(level.type_name(), field_id))?;
            field
                .access()
                .decode(host, &mut block, self)
                .map_err(|err| err.in_field(level.type_name(), field_id))?;

            if !block.is_empty() {
                log::debug!(
                    "field {field_id} of `{}` left {} bytes unread",
                    level.type_name(),
                    block.remaining(),
                );
            }
        }
    }
}

#[inline]
fn expect_end(reader: &BinaryReader<'_>) -> Result<(), RttiError> {
    if reader.is_empty() {
        Ok(())
    } else {
        Err(RttiError::TrailingBytes {
            remaining: reader.remaining(),
        })
    }
}
