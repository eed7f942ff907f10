use proc_macro2::Span;
use syn::{Attribute, Expr, LitStr, meta::ParseNestedMeta};

use crate::RTTI_ATTRIBUTE_NAME;

/// How a field is encoded, picked by its kind flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldKindFlag {
    Plain,
    Array,
    Owned,
    OwnedArray,
    Shared,
    SharedArray,
    Block,
}

impl FieldKindFlag {
    fn from_ident(path: &syn::Path) -> Option<Self> {
        let ident = path.get_ident()?.to_string();
        Some(match ident.as_str() {
            "array" => Self::Array,
            "owned" => Self::Owned,
            "owned_array" => Self::OwnedArray,
            "shared" => Self::Shared,
            "shared_array" => Self::SharedArray,
            "block" => Self::Block,
            _ => return None,
        })
    }
}

/// Parsed `#[rtti(...)]` on a field.
///
/// A field without the attribute is transient.
#[derive(Default)]
pub(crate) struct FieldAttributes {
    pub parent: Option<Span>,
    pub id: Option<Expr>,
    pub name: Option<LitStr>,
    pub kind: Option<(FieldKindFlag, Span)>,
    /// At least one `#[rtti]` was present.
    pub annotated: bool,
}

impl FieldAttributes {
    pub fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        for attr in attrs {
            if attr.path().is_ident(RTTI_ATTRIBUTE_NAME) {
                this.annotated = true;
                attr.parse_nested_meta(|meta| this.parse_meta(meta))?;
            }
        }
        this.validity()?;
        Ok(this)
    }

    fn parse_meta(&mut self, meta: ParseNestedMeta) -> syn::Result<()> {
        let path = &meta.path;
        if path.is_ident("parent") {
            if self.parent.is_some() {
                return Err(meta.error("duplicate attribute"));
            }
            self.parent = Some(meta.input.span());
        } else if path.is_ident("id") {
            if self.id.is_some() {
                return Err(meta.error("duplicate attribute"));
            }
            self.id = Some(meta.value()?.parse()?);
        } else if path.is_ident("name") {
            if self.name.is_some() {
                return Err(meta.error("duplicate attribute"));
            }
            self.name = Some(meta.value()?.parse()?);
        } else if let Some(kind) = FieldKindFlag::from_ident(path) {
            if self.kind.is_some() {
                return Err(meta.error("a field takes at most one kind flag"));
            }
            self.kind = Some((kind, meta.input.span()));
        } else {
            return Err(meta.error(
                "unknown field attribute, expected `parent`, `id`, `name` or one of \
                 `array`, `owned`, `owned_array`, `shared`, `shared_array`, `block`",
            ));
        }
        Ok(())
    }

    fn validity(&self) -> syn::Result<()> {
        if let Some(span) = self.parent {
            if self.id.is_some() || self.name.is_some() || self.kind.is_some() {
                return Err(syn::Error::new(
                    span,
                    "`parent` cannot be combined with other field attributes",
                ));
            }
            return Ok(());
        }
        if self.annotated && self.id.is_none() {
            if let Some((_, span)) = self.kind {
                return Err(syn::Error::new(span, "missing `id = ...` for this field"));
            }
            if let Some(name) = &self.name {
                return Err(syn::Error::new(name.span(), "missing `id = ...` for this field"));
            }
        }
        Ok(())
    }

    #[inline]
    pub fn kind(&self) -> FieldKindFlag {
        self.kind.map_or(FieldKindFlag::Plain, |(kind, _)| kind)
    }
}
