use proc_macro2::Span;
use syn::{Attribute, Expr, LitStr, Path, meta::ParseNestedMeta};

use crate::RTTI_ATTRIBUTE_NAME;

/// Lifecycle hooks named by the type attribute.
#[derive(Default)]
pub(crate) struct HookPaths {
    pub on_encode_start: Option<Path>,
    pub on_encode_end: Option<Path>,
    pub on_decode_start: Option<Path>,
    pub on_decode_end: Option<Path>,
}

/// Parsed `#[rtti(...)]` on the type itself.
#[derive(Default)]
pub(crate) struct TypeAttributes {
    pub id: Option<Expr>,
    pub name: Option<LitStr>,
    pub factory: Option<Path>,
    pub no_factory: Option<Span>,
    pub hooks: HookPaths,
    pub auto_register: Option<Span>,
    pub crate_path: Option<Path>,
}

fn set_once<T>(slot: &mut Option<T>, value: T, meta: &ParseNestedMeta) -> syn::Result<()> {
    if slot.is_some() {
        return Err(meta.error("duplicate attribute"));
    }
    *slot = Some(value);
    Ok(())
}

impl TypeAttributes {
    pub fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        for attr in attrs {
            if attr.path().is_ident(RTTI_ATTRIBUTE_NAME) {
                attr.parse_nested_meta(|meta| this.parse_meta(meta))?;
            }
        }
        Ok(this)
    }

    fn parse_meta(&mut self, meta: ParseNestedMeta) -> syn::Result<()> {
        let path = &meta.path;
        if path.is_ident("id") {
            let value = meta.value()?.parse()?;
            set_once(&mut self.id, value, &meta)
        } else if path.is_ident("name") {
            let value = meta.value()?.parse()?;
            set_once(&mut self.name, value, &meta)
        } else if path.is_ident("factory") {
            let value = meta.value()?.parse()?;
            set_once(&mut self.factory, value, &meta)
        } else if path.is_ident("no_factory") {
            set_once(&mut self.no_factory, meta.input.span(), &meta)
        } else if path.is_ident("auto_register") {
            set_once(&mut self.auto_register, meta.input.span(), &meta)
        } else if path.is_ident("crate") {
            let value = meta.value()?.parse()?;
            set_once(&mut self.crate_path, value, &meta)
        } else if path.is_ident("on_encode_start") {
            let value = meta.value()?.parse()?;
            set_once(&mut self.hooks.on_encode_start, value, &meta)
        } else if path.is_ident("on_encode_end") {
            let value = meta.value()?.parse()?;
            set_once(&mut self.hooks.on_encode_end, value, &meta)
        } else if path.is_ident("on_decode_start") {
            let value = meta.value()?.parse()?;
            set_once(&mut self.hooks.on_decode_start, value, &meta)
        } else if path.is_ident("on_decode_end") {
            let value = meta.value()?.parse()?;
            set_once(&mut self.hooks.on_decode_end, value, &meta)
        } else {
            Err(meta.error(
                "unknown type attribute, expected one of `id`, `name`, `factory`, \
                 `no_factory`, `auto_register`, `crate` or an `on_*` hook",
            ))
        }
    }

    /// Check combinations the parser alone cannot reject.
    pub fn validity(&self, span: Span) -> syn::Result<()> {
        if self.id.is_none() {
            return Err(syn::Error::new(
                span,
                "missing `#[rtti(id = ...)]` on the type",
            ));
        }
        if let (Some(_), Some(no_factory)) = (&self.factory, self.no_factory) {
            return Err(syn::Error::new(
                no_factory,
                "`factory` and `no_factory` are mutually exclusive",
            ));
        }
        Ok(())
    }
}
