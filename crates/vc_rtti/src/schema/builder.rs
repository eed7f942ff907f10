use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::marker::PhantomData;

use crate::RttiError;
use crate::archive::{END_OF_FIELDS, SerializationContext};
use crate::codec::PlainCodec;
use crate::hash::HashMap;
use crate::schema::accessors::{
    DataBlockField, Elements, OwnedArrayField, OwnedField, PlainArrayField, PlainField,
    SharedArrayField, SharedField,
};
use crate::schema::descriptor::{Hooks, Projection};
use crate::schema::field::{FieldAccess, host_mut, host_ref};
use crate::schema::{
    ArrayAccessors, Factory, FieldDescriptor, FieldKind, ParentLink, Reflectable, SharedRef,
    TypeDescriptor, Typed,
};

/// Start a [`DescriptorBuilder`] for `T`.
#[inline]
pub fn builder<T: Typed>(type_id: u32, type_name: &'static str) -> DescriptorBuilder<T> {
    DescriptorBuilder::new(type_id, type_name)
}

// -----------------------------------------------------------------------------
// DescriptorBuilder

/// Assembles a [`TypeDescriptor`] for `T`.
///
/// Accessors are plain function pointers. Non-capturing closures coerce to
/// them, so a field is usually declared inline:
///
/// ```
/// use vc_rtti::Typed;
/// use vc_rtti::schema::{DescriptorCell, FieldKind, TypeDescriptor, builder};
///
/// #[derive(Default)]
/// struct Resource {
///     name: String,
/// }
///
/// #[derive(Default)]
/// struct Texture {
///     base: Resource,
///     pixels: Vec<u8>,
///     mips: Vec<u32>,
/// }
///
/// impl Typed for Resource {
///     fn type_descriptor() -> &'static TypeDescriptor {
///         static CELL: DescriptorCell = DescriptorCell::new();
///         CELL.get_or_init(|| {
///             builder::<Self>(10, "Resource")
///                 .plain(0, "name", |r| &r.name, |r, v| r.name = v)
///                 .build()
///         })
///     }
/// }
///
/// impl Typed for Texture {
///     fn type_descriptor() -> &'static TypeDescriptor {
///         static CELL: DescriptorCell = DescriptorCell::new();
///         CELL.get_or_init(|| {
///             builder::<Self>(11, "Texture")
///                 .parent(|t| &t.base, |t| &mut t.base)
///                 .data_block(0, "pixels", |t| &t.pixels, |t, v| t.pixels = v)
///                 .plain_vec(1, "mips", |t| &t.mips, |t| &mut t.mips)
///                 .factory(Self::default)
///                 .build()
///         })
///     }
/// }
///
/// let texture = Texture::type_descriptor();
/// assert!(Resource::type_descriptor().is_abstract());
/// assert_eq!(texture.parent().unwrap().type_name(), "Resource");
/// assert_eq!(texture.field(0).unwrap().kind(), FieldKind::DataBlock);
/// assert_eq!(texture.all_fields().count(), 3);
/// ```
///
/// # Panics
///
/// Declaring two fields with the same id, or a field with the reserved id
/// `u32::MAX`, panics. Schema declarations are fixed at compile time, so this
/// surfaces on first use of the descriptor.
pub struct DescriptorBuilder<T> {
    type_id: u32,
    type_name: &'static str,
    parent: Option<ParentLink>,
    fields: Vec<FieldDescriptor>,
    field_index: HashMap<u32, usize>,
    factory: Option<Factory>,
    hooks: Hooks,
    marker: PhantomData<fn() -> T>,
}

impl<T: Typed> DescriptorBuilder<T> {
    /// Create a builder for an abstract schema with no fields.
    pub fn new(type_id: u32, type_name: &'static str) -> Self {
        Self {
            type_id,
            type_name,
            parent: None,
            fields: Vec::new(),
            field_index: HashMap::default(),
            factory: None,
            hooks: Hooks::default(),
            marker: PhantomData,
        }
    }

    fn push(
        mut self,
        id: u32,
        name: &'static str,
        kind: FieldKind,
        access: impl FieldAccess + 'static,
    ) -> Self {
        assert!(
            id != END_OF_FIELDS,
            "field `{name}` of `{}` uses the reserved id {END_OF_FIELDS:#x}",
            self.type_name,
        );
        if let Some(&existing) = self.field_index.get(&id) {
            panic!(
                "fields `{}` and `{name}` of `{}` share the id {id}",
                self.fields[existing].name, self.type_name,
            );
        }

        self.field_index.insert(id, self.fields.len());
        self.fields.push(FieldDescriptor {
            id,
            name,
            kind,
            access: Box::new(access),
        });
        self
    }

    /// Declare the embedded base whose schema forms the next level.
    pub fn parent<P: Typed>(mut self, get: fn(&T) -> &P, get_mut: fn(&mut T) -> &mut P) -> Self {
        self.parent = Some(ParentLink {
            descriptor: P::type_descriptor,
            projection: Box::new(Projection { get, get_mut }),
        });
        self
    }

    // -------------------------------------------------------------------------
    // Fields

    /// A single value encoded by its [`PlainCodec`].
    pub fn plain<V: PlainCodec + 'static>(
        self,
        id: u32,
        name: &'static str,
        get: fn(&T) -> &V,
        set: fn(&mut T, V),
    ) -> Self {
        self.push(id, name, FieldKind::Plain, PlainField { get, set })
    }

    /// Plain values reached through element thunks.
    pub fn plain_array<V: PlainCodec + 'static>(
        self,
        id: u32,
        name: &'static str,
        accessors: ArrayAccessors<T, V>,
    ) -> Self {
        let elements = Elements::Thunks(accessors);
        self.push(id, name, FieldKind::PlainArray, PlainArrayField { elements })
    }

    /// Plain values stored in a `Vec`.
    pub fn plain_vec<V: PlainCodec + 'static>(
        self,
        id: u32,
        name: &'static str,
        get: fn(&T) -> &Vec<V>,
        get_mut: fn(&mut T) -> &mut Vec<V>,
    ) -> Self {
        let elements = Elements::Vec { get, get_mut };
        self.push(id, name, FieldKind::PlainArray, PlainArrayField { elements })
    }

    /// A nested object owned by `T`.
    pub fn owned<N: Typed>(
        self,
        id: u32,
        name: &'static str,
        get: fn(&T) -> &N,
        get_mut: fn(&mut T) -> &mut N,
    ) -> Self {
        self.push(id, name, FieldKind::Reflectable, OwnedField { get, get_mut })
    }

    /// Owned nested objects reached through element thunks.
    pub fn owned_array<N: Typed>(
        self,
        id: u32,
        name: &'static str,
        accessors: ArrayAccessors<T, N>,
    ) -> Self {
        let elements = Elements::Thunks(accessors);
        self.push(id, name, FieldKind::ReflectableArray, OwnedArrayField { elements })
    }

    /// Owned nested objects stored in a `Vec`.
    pub fn owned_vec<N: Typed>(
        self,
        id: u32,
        name: &'static str,
        get: fn(&T) -> &Vec<N>,
        get_mut: fn(&mut T) -> &mut Vec<N>,
    ) -> Self {
        let elements = Elements::Vec { get, get_mut };
        self.push(id, name, FieldKind::ReflectableArray, OwnedArrayField { elements })
    }

    /// A shared handle, written once per encode call and referenced afterwards.
    pub fn shared<S: SharedRef>(
        self,
        id: u32,
        name: &'static str,
        get: fn(&T) -> &Option<S>,
        set: fn(&mut T, Option<S>),
    ) -> Self {
        self.push(id, name, FieldKind::ReflectablePtr, SharedField { get, set })
    }

    /// Shared handles reached through element thunks.
    pub fn shared_array<S: SharedRef>(
        self,
        id: u32,
        name: &'static str,
        accessors: ArrayAccessors<T, Option<S>>,
    ) -> Self {
        let elements = Elements::Thunks(accessors);
        self.push(id, name, FieldKind::ReflectablePtrArray, SharedArrayField { elements })
    }

    /// Shared handles stored in a `Vec`.
    pub fn shared_vec<S: SharedRef>(
        self,
        id: u32,
        name: &'static str,
        get: fn(&T) -> &Vec<Option<S>>,
        get_mut: fn(&mut T) -> &mut Vec<Option<S>>,
    ) -> Self {
        let elements = Elements::Vec { get, get_mut };
        self.push(id, name, FieldKind::ReflectablePtrArray, SharedArrayField { elements })
    }

    /// Raw bytes, written verbatim.
    pub fn data_block(
        self,
        id: u32,
        name: &'static str,
        get: fn(&T) -> &[u8],
        set: fn(&mut T, Vec<u8>),
    ) -> Self {
        self.push(id, name, FieldKind::DataBlock, DataBlockField { get, set })
    }

    // -------------------------------------------------------------------------
    // Construction and hooks

    /// Make the schema concrete: decoding creates instances with `factory`.
    pub fn factory(mut self, factory: fn() -> T) -> Self {
        self.factory = Some(Box::new(move || -> Box<dyn Reflectable> {
            Box::new(factory())
        }));
        self
    }

    /// Runs before the object is written. Every level's hook runs, most-derived first.
    pub fn on_encode_start(
        mut self,
        hook: fn(&T, &SerializationContext) -> Result<(), RttiError>,
    ) -> Self {
        self.hooks.encode_start = Some(Box::new(
            move |object: &dyn Any, context: &SerializationContext| {
                hook(host_ref::<T>(object)?, context)
            },
        ));
        self
    }

    /// Runs after the object was written. Base level first.
    pub fn on_encode_end(
        mut self,
        hook: fn(&T, &SerializationContext) -> Result<(), RttiError>,
    ) -> Self {
        self.hooks.encode_end = Some(Box::new(
            move |object: &dyn Any, context: &SerializationContext| {
                hook(host_ref::<T>(object)?, context)
            },
        ));
        self
    }

    /// Runs on the empty instance before any field is read. Most-derived first.
    pub fn on_decode_start(
        mut self,
        hook: fn(&mut T, &SerializationContext) -> Result<(), RttiError>,
    ) -> Self {
        self.hooks.decode_start = Some(Box::new(
            move |object: &mut dyn Any, context: &SerializationContext| {
                hook(host_mut::<T>(object)?, context)
            },
        ));
        self
    }

    /// Runs once every field of every level was read. Base level first.
    pub fn on_decode_end(
        mut self,
        hook: fn(&mut T, &SerializationContext) -> Result<(), RttiError>,
    ) -> Self {
        self.hooks.decode_end = Some(Box::new(
            move |object: &mut dyn Any, context: &SerializationContext| {
                hook(host_mut::<T>(object)?, context)
            },
        ));
        self
    }

    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor {
            type_id: self.type_id,
            type_name: self.type_name,
            rust_type_id: TypeId::of::<T>(),
            rust_type_name: core::any::type_name::<T>(),
            parent: self.parent,
            fields: self.fields.into_boxed_slice(),
            field_index: self.field_index,
            factory: self.factory,
            hooks: self.hooks,
        }
    }
}
