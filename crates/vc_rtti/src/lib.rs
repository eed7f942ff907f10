#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Extern Self

// The derive macro emits `::vc_rtti::...` paths; this alias makes them resolve
// inside the crate itself (unit tests, built-in schemas).
extern crate self as vc_rtti;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod error;

pub mod archive;
pub mod codec;
pub mod hash;
pub mod registry;
pub mod schema;
pub mod stream;
pub mod sync;

// -----------------------------------------------------------------------------
// Top-Level exports

#[doc(hidden)]
pub mod __macro_exports;

pub use error::{ErrorKind, RegistryError, RttiError};
pub use schema::{Reflectable, Typed};
pub use vc_rtti_derive as derive;
pub use vc_rtti_derive::Reflectable;
