use proc_macro2::TokenStream;
use quote::{quote, quote_spanned};
use syn::spanned::Spanned;

use crate::derive_data::{FieldKindFlag, HookPaths, ParentField, RttiDerive, RttiField};

/// Generate implementation code for `Typed`.
///
/// Similar to following:
///
/// ```ignore
/// impl ::vc_rtti::Typed for Foo {
///     fn type_descriptor() -> &'static ::vc_rtti::schema::TypeDescriptor {
///         static CELL: ::vc_rtti::schema::DescriptorCell = ::vc_rtti::schema::DescriptorCell::new();
///         CELL.get_or_init(|| {
///             ::vc_rtti::schema::builder::<Self>(ID, "Foo")
///                 .parent::<Base>(|this| &this.base, |this| &mut this.base)
///                 .plain::<u32>(0, "count", |this| &this.count, |this, value| this.count = value)
///                 .factory(<Self as ::core::default::Default>::default)
///                 .build()
///         })
///     }
/// }
/// ```
pub(crate) fn impl_trait_typed(derive: &RttiDerive) -> TokenStream {
    let vc_rtti_path = &derive.vc_rtti_path;
    let typed_ = crate::path::typed_(vc_rtti_path);
    let schema_ = crate::path::schema_(vc_rtti_path);

    let ident = derive.ident;
    let type_id = &derive.type_id;
    let type_name = &derive.type_name;

    let parent_tokens = derive.parent.as_ref().map(get_parent_tokens);
    let field_tokens = derive.fields.iter().map(get_field_tokens);
    let factory_tokens = get_factory_tokens(derive);
    let hook_tokens = get_hook_tokens(&derive.attrs.hooks);

    quote! {
        impl #typed_ for #ident {
            fn type_descriptor() -> &'static #schema_::TypeDescriptor {
                static CELL: #schema_::DescriptorCell = #schema_::DescriptorCell::new();
                CELL.get_or_init(|| {
                    #schema_::builder::<Self>(#type_id, #type_name)
                        #parent_tokens
                        #(#field_tokens)*
                        #factory_tokens
                        #hook_tokens
                        .build()
                })
            }
        }
    }
}

fn get_parent_tokens(parent: &ParentField) -> TokenStream {
    let member = &parent.member;
    let ty = parent.ty;
    quote_spanned! { ty.span() =>
        .parent::<#ty>(|this| &this.#member, |this| &mut this.#member)
    }
}

fn get_field_tokens(field: &RttiField) -> TokenStream {
    let RttiField {
        member,
        ty,
        id,
        name,
        kind,
    } = field;

    match kind {
        FieldKindFlag::Plain => quote_spanned! { ty.span() =>
            .plain::<#ty>(#id, #name, |this| &this.#member, |this, value| this.#member = value)
        },
        FieldKindFlag::Array => quote_spanned! { ty.span() =>
            .plain_vec(#id, #name, |this| &this.#member, |this| &mut this.#member)
        },
        FieldKindFlag::Owned => quote_spanned! { ty.span() =>
            .owned::<#ty>(#id, #name, |this| &this.#member, |this| &mut this.#member)
        },
        FieldKindFlag::OwnedArray => quote_spanned! { ty.span() =>
            .owned_vec(#id, #name, |this| &this.#member, |this| &mut this.#member)
        },
        FieldKindFlag::Shared => quote_spanned! { ty.span() =>
            .shared(#id, #name, |this| &this.#member, |this, value| this.#member = value)
        },
        FieldKindFlag::SharedArray => quote_spanned! { ty.span() =>
            .shared_vec(#id, #name, |this| &this.#member, |this| &mut this.#member)
        },
        FieldKindFlag::Block => quote_spanned! { ty.span() =>
            .data_block(
                #id,
                #name,
                |this| &this.#member[..],
                |this, value| this.#member = ::core::convert::Into::into(value),
            )
        },
    }
}

fn get_factory_tokens(derive: &RttiDerive) -> TokenStream {
    if derive.attrs.no_factory.is_some() {
        return TokenStream::new();
    }
    match &derive.attrs.factory {
        Some(factory) => quote! { .factory(#factory) },
        None => quote! { .factory(<Self as ::core::default::Default>::default) },
    }
}

fn get_hook_tokens(hooks: &HookPaths) -> TokenStream {
    let on_encode_start = hooks.on_encode_start.iter();
    let on_encode_end = hooks.on_encode_end.iter();
    let on_decode_start = hooks.on_decode_start.iter();
    let on_decode_end = hooks.on_decode_end.iter();
    quote! {
        #(.on_encode_start(#on_encode_start))*
        #(.on_encode_end(#on_encode_end))*
        #(.on_decode_start(#on_decode_start))*
        #(.on_decode_end(#on_decode_end))*
    }
}
