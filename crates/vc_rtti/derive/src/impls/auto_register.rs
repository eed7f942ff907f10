use proc_macro2::TokenStream;
use syn::{Path, Type};

use crate::derive_data::RttiDerive;

/// Generate the `inventory` submission for `#[rtti(auto_register)]`.
#[cfg(feature = "auto_register")]
pub(crate) fn get_auto_register_impl(derive: &RttiDerive) -> TokenStream {
    match derive.attrs.auto_register {
        Some(span) => {
            let ident = derive.ident;
            submit_tokens(&derive.vc_rtti_path, &syn::parse_quote_spanned!(span => #ident))
        }
        None => TokenStream::new(),
    }
}

#[cfg(not(feature = "auto_register"))]
pub(crate) fn get_auto_register_impl(_: &RttiDerive) -> TokenStream {
    TokenStream::new()
}

/// Expansion of [`impl_auto_register`](crate::impl_auto_register).
#[cfg(feature = "auto_register")]
pub(crate) fn impl_auto_register(vc_rtti_path: &Path, ty: &Type) -> TokenStream {
    let submit = submit_tokens(vc_rtti_path, ty);
    quote::quote! {
        const _: () = {
            #submit
        };
    }
}

#[cfg(not(feature = "auto_register"))]
pub(crate) fn impl_auto_register(_: &Path, _: &Type) -> TokenStream {
    TokenStream::new()
}

#[cfg(feature = "auto_register")]
fn submit_tokens(vc_rtti_path: &Path, ty: &Type) -> TokenStream {
    let macro_exports_ = crate::path::macro_exports_(vc_rtti_path);
    let typed_ = crate::path::typed_(vc_rtti_path);
    quote::quote! {
        #macro_exports_::inventory::submit! {
            #macro_exports_::AutoRegistration(<#ty as #typed_>::type_descriptor)
        }
    }
}
