//! The encoder/decoder pair.
//!
//! ## Menu
//!
//! - [`encode`] / [`encode_with`]: object to bytes.
//! - [`decode`] / [`decode_with`]: bytes to an object of any registered type.
//! - [`decode_as`]: bytes to a known concrete type.
//! - [`clone_object`]: deep copy through an encode/decode round trip.
//! - [`Encoder`] / [`Decoder`]: the walkers behind them, usable directly to
//!   share a context across calls.
//! - [`SerializationContext`]: caller state handed to lifecycle hooks.
//!
//! ## Wire format
//!
//! All integers are little-endian.
//!
//! ```text
//! object := [typeId:u32] level+
//! level  := ([fieldId:u32][length:u32][payload])* [0xFFFF_FFFF]
//! shared := [slot:u32][first:u8] object?
//! ```
//!
//! One `level` group is written per schema in the inheritance chain,
//! most-derived first. `length` counts the payload bytes, so a reader skips
//! fields its schema does not know.
//!
//! Objects nest at most [`DEFAULT_MAX_DEPTH`] deep unless the walker is built
//! with `with_max_depth`.

// -----------------------------------------------------------------------------
// Modules

mod context;
mod decoder;
mod encoder;

#[cfg(test)]
mod tests;

// -----------------------------------------------------------------------------
// Exports

pub use context::SerializationContext;
pub use decoder::Decoder;
pub use encoder::Encoder;

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::RttiError;
use crate::registry::TypeRegistry;
use crate::schema::{Reflectable, Typed};

/// Closes the field group of one schema level.
pub const END_OF_FIELDS: u32 = u32::MAX;

/// Slot written for an empty shared handle.
pub const NULL_SLOT: u32 = u32::MAX;

/// Smallest encoded object: a type id and one end marker.
pub(crate) const MIN_OBJECT_SIZE: usize = 8;

/// `[slot:u32][first:u8]`
pub(crate) const SHARED_HEADER_SIZE: usize = 5;

/// Default limit on how deeply objects may nest inside one another.
///
/// Counts the root object, so a lone object has depth 1.
pub const DEFAULT_MAX_DEPTH: usize = 128;

// -----------------------------------------------------------------------------
// Entry points

/// Encode `object` with a default [`SerializationContext`].
///
/// # Examples
///
/// ```
/// use vc_rtti::{Reflectable, archive};
///
/// #[derive(Reflectable, Default)]
/// #[rtti(id = 1)]
/// struct Point {
///     #[rtti(id = 0)]
///     x: i32,
///     #[rtti(id = 1)]
///     y: i32,
/// }
///
/// let bytes = archive::encode(&Point { x: 3, y: 4 }).unwrap();
/// assert_eq!(&bytes[..4], &1_u32.to_le_bytes());
/// assert_eq!(bytes.len(), 4 + 12 + 12 + 4);
/// ```
#[inline]
pub fn encode(object: &dyn Reflectable) -> Result<Vec<u8>, RttiError> {
    encode_with(object, &SerializationContext::default())
}

/// Encode `object`, handing `context` to every hook.
#[inline]
pub fn encode_with(
    object: &dyn Reflectable,
    context: &SerializationContext,
) -> Result<Vec<u8>, RttiError> {
    Encoder::new(context).encode(object)
}

/// Decode one object of any type registered in `registry`.
#[inline]
pub fn decode(registry: &TypeRegistry, bytes: &[u8]) -> Result<Box<dyn Reflectable>, RttiError> {
    decode_with(registry, bytes, &SerializationContext::default())
}

/// Decode one object, handing `context` to every hook.
#[inline]
pub fn decode_with(
    registry: &TypeRegistry,
    bytes: &[u8],
    context: &SerializationContext,
) -> Result<Box<dyn Reflectable>, RttiError> {
    Decoder::new(registry, context).decode(bytes)
}

/// Decode one object that must be a `T`.
///
/// Fails with [`RttiError::TypeMismatch`] if the stream holds another type.
#[inline]
pub fn decode_as<T: Typed>(registry: &TypeRegistry, bytes: &[u8]) -> Result<T, RttiError> {
    Decoder::new(registry, &SerializationContext::default()).decode_as::<T>(bytes)
}

/// Deep-copy `object` by encoding and decoding it.
///
/// Shared handles that alias each other inside `object` alias each other inside
/// the copy, but not the originals.
pub fn clone_object(
    object: &dyn Reflectable,
    registry: &TypeRegistry,
) -> Result<Box<dyn Reflectable>, RttiError> {
    let context = SerializationContext::default();
    let bytes = Encoder::new(&context).encode(object)?;
    Decoder::new(registry, &context).decode(&bytes)
}
