use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Expr, Fields, Ident, LitStr, Member, Path, Type};

use super::{FieldAttributes, FieldKindFlag, TypeAttributes};

/// The embedded base, declared with `#[rtti(parent)]`.
pub(crate) struct ParentField<'a> {
    pub member: Member,
    pub ty: &'a Type,
}

/// A persisted field, declared with `#[rtti(id = ...)]`.
pub(crate) struct RttiField<'a> {
    pub member: Member,
    pub ty: &'a Type,
    pub id: Expr,
    pub name: LitStr,
    pub kind: FieldKindFlag,
}

/// Everything the code generators need from a `#[derive(Reflectable)]` input.
pub(crate) struct RttiDerive<'a> {
    pub ident: &'a Ident,
    pub attrs: TypeAttributes,
    pub vc_rtti_path: Path,
    pub type_id: Expr,
    pub type_name: LitStr,
    pub parent: Option<ParentField<'a>>,
    pub fields: Vec<RttiField<'a>>,
}

impl<'a> RttiDerive<'a> {
    pub fn from_input(input: &'a DeriveInput) -> syn::Result<Self> {
        let fields = match &input.data {
            Data::Struct(data) => &data.fields,
            Data::Enum(data) => {
                return Err(syn::Error::new(
                    data.enum_token.span,
                    "`Reflectable` cannot be derived for enums",
                ));
            }
            Data::Union(data) => {
                return Err(syn::Error::new(
                    data.union_token.span,
                    "`Reflectable` cannot be derived for unions",
                ));
            }
        };

        if !input.generics.params.is_empty() {
            return Err(syn::Error::new(
                input.generics.span(),
                "`Reflectable` cannot be derived for generic types",
            ));
        }

        let attrs = TypeAttributes::parse_attrs(&input.attrs)?;
        attrs.validity(input.ident.span())?;

        let vc_rtti_path = attrs.crate_path.clone().unwrap_or_else(crate::path::vc_rtti);
        let type_id = attrs.id.clone().unwrap_or_else(|| syn::parse_quote!(0));
        let type_name = attrs
            .name
            .clone()
            .unwrap_or_else(|| LitStr::new(&input.ident.to_string(), input.ident.span()));

        let (parent, fields) = Self::collect_fields(fields)?;

        Ok(Self {
            ident: &input.ident,
            attrs,
            vc_rtti_path,
            type_id,
            type_name,
            parent,
            fields,
        })
    }

    fn collect_fields(
        fields: &'a Fields,
    ) -> syn::Result<(Option<ParentField<'a>>, Vec<RttiField<'a>>)> {
        let mut parent: Option<ParentField<'a>> = None;
        let mut persisted = Vec::new();
        let mut errors: Option<syn::Error> = None;

        let mut push_error = |err: syn::Error| match &mut errors {
            Some(errors) => errors.combine(err),
            None => errors = Some(err),
        };

        for (index, field) in fields.iter().enumerate() {
            let attrs = match FieldAttributes::parse_attrs(&field.attrs) {
                Ok(attrs) => attrs,
                Err(err) => {
                    push_error(err);
                    continue;
                }
            };
            if !attrs.annotated {
                continue;
            }

            let member = match &field.ident {
                Some(ident) => Member::Named(ident.clone()),
                None => Member::Unnamed(index.into()),
            };

            if let Some(span) = attrs.parent {
                if parent.is_some() {
                    push_error(syn::Error::new(span, "a type has at most one `parent`"));
                } else {
                    parent = Some(ParentField {
                        member,
                        ty: &field.ty,
                    });
                }
                continue;
            }

            let Some(id) = attrs.id.clone() else {
                push_error(syn::Error::new(field.span(), "missing `id = ...` for this field"));
                continue;
            };

            let name = attrs.name.clone().unwrap_or_else(|| {
                let text = match &member {
                    Member::Named(ident) => ident.to_string(),
                    Member::Unnamed(index) => index.index.to_string(),
                };
                LitStr::new(&text, field.span())
            });

            if let Some(previous) = persisted
                .iter()
                .find(|other: &&RttiField| same_literal(&other.id, &id))
            {
                push_error(syn::Error::new(
                    id.span(),
                    format!("field id already used by `{}`", previous.name.value()),
                ));
                continue;
            }

            persisted.push(RttiField {
                member,
                ty: &field.ty,
                id,
                name,
                kind: attrs.kind(),
            });
        }

        match errors {
            Some(err) => Err(err),
            None => Ok((parent, persisted)),
        }
    }
}

/// Two ids written as the same integer literal.
///
/// Ids given as paths or expressions are checked when the descriptor is built.
fn same_literal(a: &Expr, b: &Expr) -> bool {
    let literal = |expr: &Expr| match expr {
        Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Int(int),
            ..
        }) => int.base10_parse::<u32>().ok(),
        _ => None,
    };
    matches!((literal(a), literal(b)), (Some(a), Some(b)) if a == b)
}
