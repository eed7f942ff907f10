use std::sync::OnceLock;

use crate::RegistryError;
use crate::registry::TypeRegistry;

static GLOBAL: OnceLock<TypeRegistry> = OnceLock::new();

/// Install the process-wide registry.
///
/// Succeeds once. Later calls fail with [`RegistryError::AlreadyInitialized`]
/// and drop their argument. The installed registry is read-only.
///
/// # Examples
///
/// ```
/// use vc_rtti::registry::{self, TypeRegistry};
///
/// registry::init_global(TypeRegistry::empty()).unwrap();
/// assert!(registry::global().is_some());
/// assert!(registry::init_global(TypeRegistry::empty()).is_err());
/// ```
pub fn init_global(registry: TypeRegistry) -> Result<&'static TypeRegistry, RegistryError> {
    let mut registry = Some(registry);
    let installed = GLOBAL.get_or_init(|| registry.take().unwrap_or_default());
    match registry {
        None => {
            log::debug!("global type registry installed with {} types", installed.len());
            Ok(installed)
        }
        Some(_) => Err(RegistryError::AlreadyInitialized),
    }
}

/// Returns the process-wide registry, if [`init_global`] ran.
#[inline]
pub fn global() -> Option<&'static TypeRegistry> {
    GLOBAL.get()
}
