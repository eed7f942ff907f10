//! Parsing of the derive input and the `rtti` attributes.

// -----------------------------------------------------------------------------
// Modules

mod auto_register_input;
mod field_attributes;
mod rtti_derive;
mod type_attributes;

// -----------------------------------------------------------------------------
// Internal API

pub(crate) use auto_register_input::AutoRegisterInput;
pub(crate) use field_attributes::{FieldAttributes, FieldKindFlag};
pub(crate) use rtti_derive::{ParentField, RttiDerive, RttiField};
pub(crate) use type_attributes::{HookPaths, TypeAttributes};
