use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::fmt;
use std::sync::OnceLock;

use crate::RttiError;
use crate::archive::SerializationContext;
use crate::hash::HashMap;
use crate::schema::{FieldDescriptor, Reflectable};

// -----------------------------------------------------------------------------
// Hooks

/// Creates an empty instance of a concrete type.
pub type Factory = Box<dyn Fn() -> Box<dyn Reflectable> + Send + Sync>;

/// A hook that observes an object, `on_encode_start` / `on_encode_end`.
pub type EncodeHook =
    Box<dyn Fn(&dyn Any, &SerializationContext) -> Result<(), RttiError> + Send + Sync>;

/// A hook that may update an object, `on_decode_start` / `on_decode_end`.
pub type DecodeHook =
    Box<dyn Fn(&mut dyn Any, &SerializationContext) -> Result<(), RttiError> + Send + Sync>;

#[derive(Default)]
pub(crate) struct Hooks {
    pub encode_start: Option<EncodeHook>,
    pub encode_end: Option<EncodeHook>,
    pub decode_start: Option<DecodeHook>,
    pub decode_end: Option<DecodeHook>,
}

// -----------------------------------------------------------------------------
// ParentLink

pub(crate) trait ErasedProjection: Send + Sync {
    fn project<'a>(&self, child: &'a dyn Any) -> Option<&'a dyn Any>;

    fn project_mut<'a>(&self, child: &'a mut dyn Any) -> Option<&'a mut dyn Any>;
}

/// Field projection from a derived value `T` onto its embedded base `P`.
pub(crate) struct Projection<T, P> {
    pub get: fn(&T) -> &P,
    pub get_mut: fn(&mut T) -> &mut P,
}

impl<T: Any, P: Any> ErasedProjection for Projection<T, P> {
    #[inline]
    fn project<'a>(&self, child: &'a dyn Any) -> Option<&'a dyn Any> {
        let child = child.downcast_ref::<T>()?;
        Some((self.get)(child))
    }

    #[inline]
    fn project_mut<'a>(&self, child: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        let child = child.downcast_mut::<T>()?;
        Some((self.get_mut)(child))
    }
}

/// Link from a schema to the schema of its embedded base.
pub struct ParentLink {
    pub(crate) descriptor: fn() -> &'static TypeDescriptor,
    pub(crate) projection: Box<dyn ErasedProjection>,
}

impl ParentLink {
    /// Returns the base schema.
    #[inline]
    pub fn descriptor(&self) -> &'static TypeDescriptor {
        (self.descriptor)()
    }
}

// -----------------------------------------------------------------------------
// TypeDescriptor

/// The schema of one concrete type.
///
/// Holds the wire type id, the own field list (inherited fields live in the
/// parent's descriptor), an optional factory and the lifecycle hooks.
///
/// Built once by [`DescriptorBuilder`](crate::schema::DescriptorBuilder) and
/// cached for the process lifetime in a [`DescriptorCell`].
pub struct TypeDescriptor {
    pub(crate) type_id: u32,
    pub(crate) type_name: &'static str,
    pub(crate) rust_type_id: TypeId,
    pub(crate) rust_type_name: &'static str,
    pub(crate) parent: Option<ParentLink>,
    pub(crate) fields: Box<[FieldDescriptor]>,
    pub(crate) field_index: HashMap<u32, usize>,
    pub(crate) factory: Option<Factory>,
    pub(crate) hooks: Hooks,
}

impl TypeDescriptor {
    /// Returns the wire type id.
    #[inline]
    pub fn type_id(&self) -> u32 {
        self.type_id
    }

    /// Returns the schema name.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the [`TypeId`] of the described Rust type.
    #[inline]
    pub fn rust_type_id(&self) -> TypeId {
        self.rust_type_id
    }

    /// Returns [`core::any::type_name`] of the described Rust type.
    #[inline]
    pub fn rust_type_name(&self) -> &'static str {
        self.rust_type_name
    }

    /// Returns the fields declared by this level, in declaration order.
    ///
    /// Inherited fields are not included, see [`all_fields`](Self::all_fields).
    #[inline]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Returns the own field with the given id.
    #[inline]
    pub fn field(&self, id: u32) -> Option<&FieldDescriptor> {
        self.field_index.get(&id).map(|&index| &self.fields[index])
    }

    /// Returns the parent schema.
    #[inline]
    pub fn parent(&self) -> Option<&'static TypeDescriptor> {
        self.parent.as_ref().map(ParentLink::descriptor)
    }

    /// Iterate this schema and its ancestors, most-derived first.
    #[inline]
    pub fn chain(&'static self) -> Chain {
        Chain { next: Some(self) }
    }

    /// Returns the number of levels in [`chain`](Self::chain).
    #[inline]
    pub fn depth(&'static self) -> usize {
        self.chain().count()
    }

    /// Iterate the fields of every level, most-derived level first.
    pub fn all_fields(
        &'static self,
    ) -> impl Iterator<Item = (&'static TypeDescriptor, &'static FieldDescriptor)> {
        self.chain()
            .flat_map(|level| level.fields.iter().map(move |field| (level, field)))
    }

    /// Returns `true` if no factory is present.
    #[inline]
    pub fn is_abstract(&self) -> bool {
        self.factory.is_none()
    }

    /// Create an empty instance.
    ///
    /// Fails with [`RttiError::AbstractType`] if no factory is present.
    pub fn create_empty(&self) -> Result<Box<dyn Reflectable>, RttiError> {
        match &self.factory {
            Some(factory) => Ok(factory()),
            None => Err(RttiError::AbstractType {
                type_id: self.type_id,
                type_name: self.type_name,
            }),
        }
    }

    /// Returns `true` if `other` is this schema or one of its ancestors.
    pub fn is_derived_from(&'static self, other: &TypeDescriptor) -> bool {
        self.chain().any(|level| level.type_id == other.type_id)
    }

    // -------------------------------------------------------------------------
    // Hooks

    #[inline]
    pub fn on_encode_start(
        &self,
        object: &dyn Any,
        context: &SerializationContext,
    ) -> Result<(), RttiError> {
        match &self.hooks.encode_start {
            Some(hook) => hook(object, context),
            None => Ok(()),
        }
    }

    #[inline]
    pub fn on_encode_end(
        &self,
        object: &dyn Any,
        context: &SerializationContext,
    ) -> Result<(), RttiError> {
        match &self.hooks.encode_end {
            Some(hook) => hook(object, context),
            None => Ok(()),
        }
    }

    #[inline]
    pub fn on_decode_start(
        &self,
        object: &mut dyn Any,
        context: &SerializationContext,
    ) -> Result<(), RttiError> {
        match &self.hooks.decode_start {
            Some(hook) => hook(object, context),
            None => Ok(()),
        }
    }

    #[inline]
    pub fn on_decode_end(
        &self,
        object: &mut dyn Any,
        context: &SerializationContext,
    ) -> Result<(), RttiError> {
        match &self.hooks.decode_end {
            Some(hook) => hook(object, context),
            None => Ok(()),
        }
    }

    // -------------------------------------------------------------------------
    // Level projection

    /// Returns every level paired with the part of `object` it describes,
    /// most-derived first.
    pub(crate) fn levels<'a>(
        &'static self,
        object: &'a dyn Any,
    ) -> Result<Vec<(&'static TypeDescriptor, &'a dyn Any)>, RttiError> {
        let mut levels = Vec::with_capacity(4);
        let mut level = self;
        let mut host = object;
        loop {
            levels.push((level, host));
            let Some(link) = &level.parent else {
                return Ok(levels);
            };
            host = link
                .projection
                .project(host)
                .ok_or_else(|| level.host_mismatch())?;
            level = link.descriptor();
        }
    }

    /// Returns the level `depth` steps up the chain and the part of `object`
    /// it describes.
    pub(crate) fn level_mut<'a>(
        &'static self,
        object: &'a mut dyn Any,
        depth: usize,
    ) -> Result<(&'static TypeDescriptor, &'a mut dyn Any), RttiError> {
        let mut level = self;
        let mut host = object;
        for _ in 0..depth {
            let Some(link) = &level.parent else {
                return Err(level.host_mismatch());
            };
            host = link
                .projection
                .project_mut(host)
                .ok_or_else(|| level.host_mismatch())?;
            level = link.descriptor();
        }
        Ok((level, host))
    }

    #[cold]
    pub(crate) fn host_mismatch(&self) -> RttiError {
        RttiError::TypeMismatch {
            expected: self.rust_type_name,
            found: "a different host type",
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type_id", &self.type_id)
            .field("type_name", &self.type_name)
            .field("parent", &self.parent().map(TypeDescriptor::type_name))
            .field("fields", &self.fields)
            .field("is_abstract", &self.is_abstract())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Chain

/// Iterator over a schema and its ancestors, see [`TypeDescriptor::chain`].
#[derive(Clone)]
pub struct Chain {
    next: Option<&'static TypeDescriptor>,
}

impl Iterator for Chain {
    type Item = &'static TypeDescriptor;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent();
        Some(current)
    }
}

// -----------------------------------------------------------------------------
// DescriptorCell

/// Lazily built, process-wide storage for one [`TypeDescriptor`].
///
/// Used in a `static` inside [`Typed::type_descriptor`](crate::Typed::type_descriptor).
pub struct DescriptorCell(OnceLock<TypeDescriptor>);

impl DescriptorCell {
    #[inline]
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    /// Returns the cached descriptor, building it on first access.
    #[inline]
    pub fn get_or_init(
        &'static self,
        f: impl FnOnce() -> TypeDescriptor,
    ) -> &'static TypeDescriptor {
        self.0.get_or_init(f)
    }
}
