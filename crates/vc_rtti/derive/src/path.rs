//! Paths into `vc_rtti` used by the generated code.
//!
//! Kept in one place so a change of the `vc_rtti` layout touches only this file.

use proc_macro2::TokenStream;
use quote::quote;

/// The path of the `vc_rtti` crate unless `#[rtti(crate = ...)]` overrides it.
///
/// Resolved from the invoking crate's `Cargo.toml`, see [`crate::manifest`].
#[inline]
pub(crate) fn vc_rtti() -> syn::Path {
    crate::manifest::vc_rtti_path()
}

#[inline(always)]
pub(crate) fn typed_(vc_rtti_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_rtti_path::Typed
    }
}

#[inline(always)]
pub(crate) fn schema_(vc_rtti_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_rtti_path::schema
    }
}

#[cfg(feature = "auto_register")]
#[inline(always)]
pub(crate) fn macro_exports_(vc_rtti_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_rtti_path::__macro_exports
    }
}
