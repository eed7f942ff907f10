use alloc::boxed::Box;
use core::any::Any;
use core::fmt;

use crate::RttiError;
use crate::archive::{Decoder, Encoder};
use crate::stream::{BinaryReader, BinaryWriter};

// -----------------------------------------------------------------------------
// FieldKind

/// How a field's payload is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// One value encoded by its [`PlainCodec`](crate::codec::PlainCodec).
    Plain,
    /// `[count:u32]` followed by plain values.
    PlainArray,
    /// One nested object owned by the host.
    Reflectable,
    /// `[count:u32]` followed by owned nested objects.
    ReflectableArray,
    /// One shared handle, `[slot:u32][first:u8][object if first]`.
    ReflectablePtr,
    /// `[count:u32]` followed by shared handles.
    ReflectablePtrArray,
    /// Raw bytes.
    DataBlock,
}

impl FieldKind {
    /// Returns `true` for the kinds holding a sequence.
    #[inline]
    pub fn is_array(self) -> bool {
        matches!(
            self,
            Self::PlainArray | Self::ReflectableArray | Self::ReflectablePtrArray
        )
    }
}

// -----------------------------------------------------------------------------
// FieldAccess

/// Type-erased reader and writer of one field.
///
/// `host` is the part of the object owned by the declaring schema level.
pub(crate) trait FieldAccess: Send + Sync {
    /// The exact payload size, if it is known without writing.
    ///
    /// Fields returning `None` are framed by backpatching the block length.
    fn size_hint(&self, host: &dyn Any) -> Result<Option<u32>, RttiError>;

    fn encode(
        &self,
        host: &dyn Any,
        writer: &mut BinaryWriter,
        encoder: &mut Encoder<'_>,
    ) -> Result<(), RttiError>;

    fn decode(
        &self,
        host: &mut dyn Any,
        reader: &mut BinaryReader<'_>,
        decoder: &mut Decoder<'_>,
    ) -> Result<(), RttiError>;
}

#[inline]
pub(crate) fn host_ref<T: Any>(host: &dyn Any) -> Result<&T, RttiError> {
    host.downcast_ref::<T>().ok_or_else(host_mismatch::<T>)
}

#[inline]
pub(crate) fn host_mut<T: Any>(host: &mut dyn Any) -> Result<&mut T, RttiError> {
    host.downcast_mut::<T>().ok_or_else(host_mismatch::<T>)
}

#[cold]
fn host_mismatch<T>() -> RttiError {
    RttiError::TypeMismatch {
        expected: core::any::type_name::<T>(),
        found: "a different host type",
    }
}

// -----------------------------------------------------------------------------
// FieldDescriptor

/// One numbered member of a schema level.
pub struct FieldDescriptor {
    pub(crate) id: u32,
    pub(crate) name: &'static str,
    pub(crate) kind: FieldKind,
    pub(crate) access: Box<dyn FieldAccess>,
}

impl FieldDescriptor {
    /// Returns the field id, unique within the declaring level.
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    #[inline]
    pub(crate) fn access(&self) -> &dyn FieldAccess {
        &*self.access
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}
