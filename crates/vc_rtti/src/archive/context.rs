use alloc::boxed::Box;
use core::any::{Any, TypeId};
use core::fmt;

use crate::hash::{HashMap, NoOpHashState};

/// Caller-provided state visible to every lifecycle hook of one call.
///
/// The engine itself never reads it. `compress` is a preference hooks may
/// consult; extensions carry arbitrary typed values, one per type.
///
/// # Examples
///
/// ```
/// use vc_rtti::archive::SerializationContext;
///
/// struct AssetRoot(&'static str);
///
/// let context = SerializationContext::new()
///     .with_compress(true)
///     .with(AssetRoot("/data"));
///
/// assert!(context.compress());
/// assert_eq!(context.get::<AssetRoot>().unwrap().0, "/data");
/// assert!(context.get::<u32>().is_none());
/// ```
#[derive(Default)]
pub struct SerializationContext {
    compress: bool,
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>, NoOpHashState>,
}

impl SerializationContext {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    #[inline]
    pub fn compress(&self) -> bool {
        self.compress
    }

    #[inline]
    pub fn set_compress(&mut self, compress: bool) {
        self.compress = compress;
    }

    /// Add an extension, builder style.
    #[inline]
    pub fn with<E: Any + Send + Sync>(mut self, extension: E) -> Self {
        self.insert(extension);
        self
    }

    /// Insert an extension, returns the previous one of the same type.
    pub fn insert<E: Any + Send + Sync>(&mut self, extension: E) -> Option<E> {
        self.extensions
            .insert(TypeId::of::<E>(), Box::new(extension))
            .and_then(|old| old.downcast::<E>().ok())
            .map(|old| *old)
    }

    pub fn get<E: Any>(&self) -> Option<&E> {
        self.extensions
            .get(&TypeId::of::<E>())
            .and_then(|extension| extension.downcast_ref::<E>())
    }

    pub fn get_mut<E: Any>(&mut self) -> Option<&mut E> {
        self.extensions
            .get_mut(&TypeId::of::<E>())
            .and_then(|extension| extension.downcast_mut::<E>())
    }

    pub fn remove<E: Any>(&mut self) -> Option<E> {
        self.extensions
            .remove(&TypeId::of::<E>())
            .and_then(|extension| extension.downcast::<E>().ok())
            .map(|extension| *extension)
    }
}

impl fmt::Debug for SerializationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializationContext")
            .field("compress", &self.compress)
            .field("extensions", &self.extensions.len())
            .finish()
    }
}
