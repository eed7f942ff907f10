use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::Any;

use crate::schema::TypeDescriptor;

// -----------------------------------------------------------------------------
// Typed

/// A concrete type with a static schema.
///
/// Usually implemented through [`#[derive(Reflectable)]`](crate::derive::Reflectable),
/// which caches the descriptor in a [`DescriptorCell`](crate::schema::DescriptorCell).
///
/// # Examples
///
/// ```
/// use vc_rtti::Typed;
/// use vc_rtti::schema::{DescriptorCell, TypeDescriptor, builder};
///
/// #[derive(Default)]
/// struct Counter {
///     value: u64,
/// }
///
/// impl Typed for Counter {
///     fn type_descriptor() -> &'static TypeDescriptor {
///         static CELL: DescriptorCell = DescriptorCell::new();
///         CELL.get_or_init(|| {
///             builder::<Self>(7, "Counter")
///                 .plain(0, "value", |c| &c.value, |c, v| c.value = v)
///                 .factory(Self::default)
///                 .build()
///         })
///     }
/// }
///
/// assert_eq!(Counter::type_descriptor().type_id(), 7);
/// ```
pub trait Typed: Any + Send + Sync + Sized {
    /// Returns the schema of `Self`.
    fn type_descriptor() -> &'static TypeDescriptor;
}

// -----------------------------------------------------------------------------
// Reflectable

/// An object the engine can walk without knowing its concrete type.
///
/// Implemented for every [`Typed`] type; `dyn Reflectable` is what the decoder
/// hands back for polymorphic streams.
pub trait Reflectable: Any + Send + Sync {
    /// Returns the schema of the most-derived type.
    fn rtti(&self) -> &'static TypeDescriptor;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Typed> Reflectable for T {
    #[inline]
    fn rtti(&self) -> &'static TypeDescriptor {
        T::type_descriptor()
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    #[inline]
    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    #[inline]
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl dyn Reflectable {
    /// Returns `true` if the concrete type is `T`.
    #[inline]
    pub fn is<T: Reflectable>(&self) -> bool {
        self.as_any().is::<T>()
    }

    #[inline]
    pub fn downcast_ref<T: Reflectable>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    #[inline]
    pub fn downcast_mut<T: Reflectable>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

impl core::fmt::Debug for dyn Reflectable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "dyn Reflectable<{}>", self.rtti().type_name())
    }
}

// -----------------------------------------------------------------------------
// SharedRef

/// A shared handle the engine can serialize once and reference afterwards.
///
/// Identity is the address of the shared allocation: two handles pointing to
/// the same `Arc` are written as one slot.
pub trait SharedRef: Clone + Send + Sync + 'static {
    /// Returns the pointee.
    fn as_reflectable(&self) -> &dyn Reflectable;

    /// Returns the address identifying the shared allocation.
    fn identity(&self) -> usize;

    /// Returns the static schema every pointee must have, if there is one.
    fn type_hint() -> Option<&'static TypeDescriptor>;

    /// Convert a decoded object, `None` if its concrete type does not fit.
    fn from_shared(shared: Arc<dyn Reflectable>) -> Option<Self>;
}

impl<N: Typed> SharedRef for Arc<N> {
    #[inline]
    fn as_reflectable(&self) -> &dyn Reflectable {
        &**self
    }

    #[inline]
    fn identity(&self) -> usize {
        Arc::as_ptr(self).cast::<()>().addr()
    }

    #[inline]
    fn type_hint() -> Option<&'static TypeDescriptor> {
        Some(N::type_descriptor())
    }

    #[inline]
    fn from_shared(shared: Arc<dyn Reflectable>) -> Option<Self> {
        shared.into_any_arc().downcast::<N>().ok()
    }
}

impl SharedRef for Arc<dyn Reflectable> {
    #[inline]
    fn as_reflectable(&self) -> &dyn Reflectable {
        &**self
    }

    #[inline]
    fn identity(&self) -> usize {
        Arc::as_ptr(self).cast::<()>().addr()
    }

    #[inline]
    fn type_hint() -> Option<&'static TypeDescriptor> {
        None
    }

    #[inline]
    fn from_shared(shared: Arc<dyn Reflectable>) -> Option<Self> {
        Some(shared)
    }
}
