// -----------------------------------------------------------------------------
// Modules

mod auto_register;
mod trait_typed;

// -----------------------------------------------------------------------------
// Internal API

use auto_register::get_auto_register_impl;
use trait_typed::impl_trait_typed;

pub(crate) use auto_register::impl_auto_register;

use proc_macro2::TokenStream;
use quote::quote;

use crate::derive_data::RttiDerive;

/// Expansion of `#[derive(Reflectable)]`.
pub(crate) fn impl_reflectable(derive: &RttiDerive) -> TokenStream {
    let typed_impl = impl_trait_typed(derive);
    let auto_register = get_auto_register_impl(derive);

    quote! {
        #typed_impl

        const _: () = {
            #auto_register
        };
    }
}
