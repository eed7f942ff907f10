use alloc::format;
use alloc::vec::Vec;
use core::any::Any;

use crate::RttiError;
use crate::archive::{DEFAULT_MAX_DEPTH, END_OF_FIELDS, NULL_SLOT, SerializationContext};
use crate::hash::HashMap;
use crate::schema::{FieldDescriptor, Reflectable, SharedRef, TypeDescriptor};
use crate::stream::BinaryWriter;

// -----------------------------------------------------------------------------
// Encoder

/// Writes object graphs.
///
/// Holds the identity table of one encode call: every shared allocation gets a
/// slot on first sight and later occurrences only reference it. The table is
/// reset at the start of [`encode`](Self::encode).
///
/// Graphs nested deeper than [`max_depth`](Self::max_depth) are refused, so
/// the encoder never writes a stream a default [`Decoder`](super::Decoder)
/// rejects.
pub struct Encoder<'a> {
    context: &'a SerializationContext,
    identities: HashMap<usize, u32>,
    next_slot: u32,
    depth: usize,
    max_depth: usize,
}

impl<'a> Encoder<'a> {
    #[inline]
    pub fn new(context: &'a SerializationContext) -> Self {
        Self {
            context,
            identities: HashMap::default(),
            next_slot: 0,
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
    pub fn context(&self) -> &'a SerializationContext {
        self.context
    }

    /// Encode one root object into a fresh buffer.
    pub fn encode(&mut self, object: &dyn Reflectable) -> Result<Vec<u8>, RttiError> {
        self.identities.clear();
        self.next_slot = 0;
        self.depth = 0;

        let mut writer = BinaryWriter::with_capacity(64);
        self.write_object(&mut writer, object)?;
        Ok(writer.into_inner())
    }

    /// Write `[typeId]` followed by one field group per schema level.
    ///
    /// Start hooks run most-derived first before anything is written, end
    /// hooks run base first after the last level.
    pub fn write_object(
        &mut self,
        writer: &mut BinaryWriter,
        object: &dyn Reflectable,
    ) -> Result<(), RttiError> {
        if self.depth >= self.max_depth {
            return Err(RttiError::InvalidData {
                offset: writer.len(),
                reason: format!("objects nested deeper than {} levels", self.max_depth).into(),
            });
        }
        self.depth += 1;
        let written = self.write_levels(writer, object);
        self.depth -= 1;
        written
    }

    fn write_levels(
        &mut self,
        writer: &mut BinaryWriter,
        object: &dyn Reflectable,
    ) -> Result<(), RttiError> {
        let descriptor = object.rtti();
        let levels = descriptor.levels(object.as_any())?;
        log::trace!(
            "encoding `{}` (type id {}) at byte {}",
            descriptor.type_name(),
            descriptor.type_id(),
            writer.len(),
        );

        for &(level, host) in &levels {
            level.on_encode_start(host, self.context)?;
        }

        writer.write(descriptor.type_id());
        for &(level, host) in &levels {
            for field in level.fields() {
                self.write_field(writer, level, field, host)?;
            }
            writer.write(END_OF_FIELDS);
        }

        for &(level, host) in levels.iter().rev() {
            level.on_encode_end(host, self.context)?;
        }
        Ok(())
    }

    fn write_field(
        &mut self,
        writer: &mut BinaryWriter,
        level: &TypeDescriptor,
        field: &FieldDescriptor,
        host: &dyn Any,
    ) -> Result<(), RttiError> {
        writer.write(field.id());

        let access = field.access();
        let written = match access.size_hint(host) {
            Ok(Some(expected)) => {
                writer.write_sized_block_exact(expected, |w| access.encode(host, w, self))
            }
            Ok(None) => writer.write_sized_block(|w| access.encode(host, w, self)),
            Err(err) => Err(err),
        };

        match written {
            Ok(_) => Ok(()),
            Err(err) => Err(err.in_field(level.type_name(), field.id())),
        }
    }

    /// Write `[slot][first]`, followed by the object on its first occurrence.
    pub fn write_shared<S: SharedRef>(
        &mut self,
        writer: &mut BinaryWriter,
        shared: Option<&S>,
    ) -> Result<(), RttiError> {
        let Some(shared) = shared else {
            writer.write(NULL_SLOT);
            writer.write(false);
            return Ok(());
        };

        let identity = shared.identity();
        if let Some(&slot) = self.identities.get(&identity) {
            writer.write(slot);
            writer.write(false);
            return Ok(());
        }

        let slot = self.next_slot;
        if slot == NULL_SLOT {
            return Err(RttiError::InvalidData {
                offset: writer.len(),
                reason: "shared object slots exhausted".into(),
            });
        }
        self.next_slot += 1;
        self.identities.insert(identity, slot);

        writer.write(slot);
        writer.write(true);
        self.write_object(writer, shared.as_reflectable())
    }
}
