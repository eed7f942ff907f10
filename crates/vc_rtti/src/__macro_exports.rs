//! Items used by `vc_rtti_derive` expansions.

#[cfg(feature = "auto_register")]
pub use inventory;

/// A schema submitted for [`TypeRegistry::auto_register`](crate::registry::TypeRegistry::auto_register).
#[cfg(feature = "auto_register")]
pub struct AutoRegistration(pub fn() -> &'static crate::schema::TypeDescriptor);

#[cfg(feature = "auto_register")]
inventory::collect!(AutoRegistration);
