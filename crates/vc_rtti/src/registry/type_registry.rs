use alloc::boxed::Box;

use crate::hash::HashMap;
use crate::schema::{Reflectable, TypeDescriptor, Typed};
use crate::{RegistryError, RttiError};

// -----------------------------------------------------------------------------
// TypeRegistry

/// Maps wire type ids to schemas.
///
/// The decoder resolves the concrete type of every object it reads here.
/// Registering a type also registers its ancestors.
///
/// # Examples
///
/// ```
/// use vc_rtti::Reflectable;
/// use vc_rtti::registry::TypeRegistry;
///
/// #[derive(Reflectable, Default)]
/// #[rtti(id = 40, name = "Material")]
/// struct Material {
///     #[rtti(id = 0)]
///     shader: String,
/// }
///
/// let mut registry = TypeRegistry::empty();
/// registry.register::<Material>().unwrap();
///
/// assert!(registry.contains(40));
/// assert_eq!(registry.get_with_name("Material").unwrap().type_id(), 40);
///
/// let empty = registry.create_empty(40).unwrap();
/// assert!(empty.is::<Material>());
/// ```
#[derive(Default)]
pub struct TypeRegistry {
    by_id: HashMap<u32, &'static TypeDescriptor>,
    by_name: HashMap<&'static str, u32>,
}

impl TypeRegistry {
    /// Create an empty registry.
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a registry holding every automatically registered schema.
    ///
    /// Equivalent to [`empty`](Self::empty) followed by
    /// [`auto_register`](Self::auto_register).
    pub fn new() -> Result<Self, RegistryError> {
        let mut registry = Self::empty();
        registry.auto_register()?;
        Ok(registry)
    }

    /// Register `T` and every ancestor in its chain.
    #[inline]
    pub fn register<T: Typed>(&mut self) -> Result<(), RegistryError> {
        self.register_descriptor(T::type_descriptor())
    }

    /// Register a schema and every ancestor in its chain.
    ///
    /// Registering the same descriptor again is a no-op. A different
    /// descriptor claiming a type id already taken fails with
    /// [`RegistryError::DuplicateTypeId`], one reusing the name of another id
    /// with [`RegistryError::DuplicateTypeName`]. Both leave the registry
    /// unchanged.
    pub fn register_descriptor(
        &mut self,
        descriptor: &'static TypeDescriptor,
    ) -> Result<(), RegistryError> {
        for (index, level) in descriptor.chain().enumerate() {
            if let Some(existing) = self.by_id.get(&level.type_id())
                && !core::ptr::eq(*existing, level)
            {
                log::warn!(
                    "type id {} is claimed by both `{}` and `{}`",
                    level.type_id(),
                    existing.type_name(),
                    level.type_name(),
                );
                return Err(RegistryError::DuplicateTypeId {
                    type_id: level.type_id(),
                    existing: existing.type_name(),
                    rejected: level.type_name(),
                });
            }

            let named = self.by_name.get(level.type_name()).copied().or_else(|| {
                descriptor
                    .chain()
                    .take(index)
                    .find(|other| other.type_name() == level.type_name())
                    .map(TypeDescriptor::type_id)
            });
            if let Some(existing) = named
                && existing != level.type_id()
            {
                log::warn!(
                    "type name `{}` is claimed by both type id {existing} and {}",
                    level.type_name(),
                    level.type_id(),
                );
                return Err(RegistryError::DuplicateTypeName {
                    type_name: level.type_name(),
                    existing,
                    rejected: level.type_id(),
                });
            }
        }

        for level in descriptor.chain() {
            if self.by_id.insert(level.type_id(), level).is_none() {
                self.by_name.insert(level.type_name(), level.type_id());
            }
        }
        Ok(())
    }

    /// Register every schema declared with `#[rtti(auto_register)]` or
    /// `impl_auto_register!`.
    ///
    /// Returns `false` when the `auto_register` feature is disabled, in which
    /// case nothing is registered.
    #[cfg_attr(not(feature = "auto_register"), inline(always))]
    pub fn auto_register(&mut self) -> Result<bool, RegistryError> {
        #[cfg(feature = "auto_register")]
        {
            for registration in inventory::iter::<crate::__macro_exports::AutoRegistration> {
                self.register_descriptor((registration.0)())?;
            }
            Ok(true)
        }

        #[cfg(not(feature = "auto_register"))]
        Ok(false)
    }

    #[inline]
    pub fn contains(&self, type_id: u32) -> bool {
        self.by_id.contains_key(&type_id)
    }

    #[inline]
    pub fn get(&self, type_id: u32) -> Option<&'static TypeDescriptor> {
        self.by_id.get(&type_id).copied()
    }

    /// Returns the schema registered under `type_name`.
    pub fn get_with_name(&self, type_name: &str) -> Option<&'static TypeDescriptor> {
        match self.by_name.get(type_name) {
            Some(type_id) => self.get(*type_id),
            None => None,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Iterate the registered schemas in no particular order.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &'static TypeDescriptor> + '_ {
        self.by_id.values().copied()
    }

    /// Create an empty instance of the type registered under `type_id`.
    pub fn create_empty(&self, type_id: u32) -> Result<Box<dyn Reflectable>, RttiError> {
        match self.get(type_id) {
            Some(descriptor) => descriptor.create_empty(),
            None => Err(RttiError::UnknownType { type_id }),
        }
    }
}

impl core::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map()
            .entries(self.by_id.iter().map(|(id, d)| (id, d.type_name())))
            .finish()
    }
}
