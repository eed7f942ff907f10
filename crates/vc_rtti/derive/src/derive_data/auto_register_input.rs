use syn::parse::{Parse, ParseStream};
use syn::{Path, Token, Type};

/// Input of [`impl_auto_register`](crate::impl_auto_register).
///
/// Format: `(crate = path,)? Type`
pub(crate) struct AutoRegisterInput {
    pub crate_path: Path,
    pub ty: Type,
}

impl Parse for AutoRegisterInput {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let crate_path = if input.peek(Token![crate]) && input.peek2(Token![=]) {
            input.parse::<Token![crate]>()?;
            input.parse::<Token![=]>()?;
            let path = input.parse::<Path>()?;
            input.parse::<Token![,]>()?;
            path
        } else {
            crate::path::vc_rtti()
        };

        let ty = input.parse::<Type>()?;
        // Allow a trailing comma.
        if input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
        }

        Ok(Self { crate_path, ty })
    }
}
