//! See following macros:
//!
//! - [`Reflectable`]
//! - [`impl_auto_register`]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::std_instead_of_core, reason = "proc-macro lib")]
#![allow(clippy::std_instead_of_alloc, reason = "proc-macro lib")]

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

static RTTI_ATTRIBUTE_NAME: &str = "rtti";

// -----------------------------------------------------------------------------
// Modules

mod derive_data;
mod impls;
mod manifest;
mod path;

// -----------------------------------------------------------------------------
// Macros

/// # Schema Derivation
///
/// `#[derive(Reflectable)]` implements `Typed`, which makes the type
/// `Reflectable` and gives it a cached `TypeDescriptor`.
///
/// ## Type attributes
///
/// ```rust, ignore
/// #[derive(Reflectable, Default)]
/// #[rtti(id = 12, name = "Mesh")]
/// struct Mesh { /* ... */ }
/// ```
///
/// - `id = expr`: the wire type id, any `u32` constant expression. Required.
/// - `name = "..."`: the schema name, defaults to the type's identifier.
/// - `factory = path`: a `fn() -> Self` creating empty instances. Defaults to
///   `Default::default`.
/// - `no_factory`: the schema is abstract, decoding it fails.
/// - `on_encode_start = path`, `on_encode_end = path`: `fn(&Self, &SerializationContext) -> Result<(), RttiError>`.
/// - `on_decode_start = path`, `on_decode_end = path`: `fn(&mut Self, &SerializationContext) -> Result<(), RttiError>`.
/// - `auto_register`: collect the schema for `TypeRegistry::auto_register`.
///   A no-op when the `auto_register` feature is disabled.
/// - `crate = path`: where `vc_rtti` is reachable. By default `::vc_rtti`, or
///   `::vc_serial::rtti` when the invoking crate only depends on the facade.
///
/// Generic types are not supported.
///
/// ## Field attributes
///
/// Fields without `#[rtti]` are transient: skipped on encode, left at their
/// factory value on decode.
///
/// ```rust, ignore
/// #[derive(Reflectable, Default)]
/// #[rtti(id = 13)]
/// struct SkinnedMesh {
///     #[rtti(parent)]
///     base: Mesh,
///     #[rtti(id = 0)]
///     bone_count: u32,
///     #[rtti(id = 1, array)]
///     bone_names: Vec<String>,
///     #[rtti(id = 2, shared)]
///     skeleton: Option<Arc<Skeleton>>,
///     cache: Vec<f32>, // transient
/// }
/// ```
///
/// - `parent`: the embedded base, at most one per type.
/// - `id = expr`: the field id, unique within the type, with an optional
///   `name = "..."` and at most one kind flag:
///
/// | Flag | Field type | Kind |
/// |---|---|---|
/// | (none) | `V: PlainCodec` | `Plain` |
/// | `array` | `Vec<V>` | `PlainArray` |
/// | `owned` | `N: Typed` | `Reflectable` |
/// | `owned_array` | `Vec<N>` | `ReflectableArray` |
/// | `shared` | `Option<S: SharedRef>` | `ReflectablePtr` |
/// | `shared_array` | `Vec<Option<S>>` | `ReflectablePtrArray` |
/// | `block` | `Vec<u8>` or `Box<[u8]>` | `DataBlock` |
#[proc_macro_derive(Reflectable, attributes(rtti))]
pub fn derive_reflectable(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    match derive_data::RttiDerive::from_input(&ast) {
        Ok(derive) => impls::impl_reflectable(&derive).into(),
        Err(err) => err.into_compile_error().into(),
    }
}

/// Add a type to the automatic registry.
///
/// If the `auto_register` feature is not enabled, this macro does nothing.
///
/// ## Example
///
/// ```ignore
/// impl_auto_register!(foo::Foo);
/// impl_auto_register!(crate = ::my_rtti, foo::Bar);
/// ```
///
/// Without `crate = ...` the path is resolved like the derive's.
///
/// This does not conflict with the `rtti(auto_register)` attribute.
#[proc_macro]
pub fn impl_auto_register(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as derive_data::AutoRegisterInput);
    impls::impl_auto_register(&input.crate_path, &input.ty).into()
}
