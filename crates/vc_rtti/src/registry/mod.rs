//! Map wire type ids to schemas.
//!
//! ## Menu
//!
//! - [`TypeRegistry`]: id and name index over [`TypeDescriptor`]s.
//! - [`init_global`] / [`global`]: one process-wide, read-only registry.
//!
//! ## auto_register
//!
//! See [`TypeRegistry::auto_register`].
//!
//! Schemas marked `#[rtti(auto_register)]` or passed to
//! [`impl_auto_register!`](crate::derive::impl_auto_register) are collected at
//! startup with the [`inventory`](https://docs.rs/inventory) crate. Only
//! non-generic types can be collected, which the derive enforces anyway.
//!
//! [`TypeDescriptor`]: crate::schema::TypeDescriptor

// -----------------------------------------------------------------------------
// Modules

mod global;
mod type_registry;

// -----------------------------------------------------------------------------
// Exports

pub use global::{global, init_global};
pub use type_registry::TypeRegistry;
