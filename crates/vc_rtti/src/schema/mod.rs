//! Type schemas: numbered fields, inheritance links, factories and hooks.
//!
//! ## Menu
//!
//! - [`Typed`]: a concrete type with a static [`TypeDescriptor`].
//! - [`Reflectable`]: the object-safe view the engine walks.
//! - [`SharedRef`]: shared handles (`Arc<N>`, `Arc<dyn Reflectable>`) whose identity is preserved.
//! - [`TypeDescriptor`]: one schema level, cached in a [`DescriptorCell`].
//! - [`FieldDescriptor`] / [`FieldKind`]: one numbered member.
//! - [`DescriptorBuilder`]: assemble a descriptor from accessor functions.
//!
//! ## Inheritance
//!
//! A derived type embeds its base as a field and links to it with
//! [`DescriptorBuilder::parent`]. Each level owns its field ids, so a derived
//! level may reuse an id its base already uses.

// -----------------------------------------------------------------------------
// Modules

mod accessors;
mod builder;
mod descriptor;
mod field;
mod reflectable;

// -----------------------------------------------------------------------------
// Exports

pub use accessors::ArrayAccessors;
pub use builder::{DescriptorBuilder, builder};
pub use descriptor::{Chain, DecodeHook, DescriptorCell, EncodeHook, Factory};
pub use descriptor::{ParentLink, TypeDescriptor};
pub use field::{FieldDescriptor, FieldKind};
pub use reflectable::{Reflectable, SharedRef, Typed};
