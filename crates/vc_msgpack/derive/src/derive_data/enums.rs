use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Fields, Ident, LitStr, Path};

use super::{TypeAttributes, VariantAttributes};

/// A field-less enum deriving `MessagePackEnum`.
pub(crate) struct EnumDerive<'a> {
    pub ident: &'a Ident,
    pub vc_msgpack_path: Path,
    pub variants: Vec<EnumVariant<'a>>,
}

pub(crate) struct EnumVariant<'a> {
    pub ident: &'a Ident,
    /// Written by the by-name method.
    pub name: LitStr,
}

impl<'a> EnumDerive<'a> {
    pub fn from_input(ast: &'a DeriveInput) -> syn::Result<Self> {
        let type_attrs = TypeAttributes::parse_attrs(&ast.attrs)?;

        let Data::Enum(data) = &ast.data else {
            return Err(syn::Error::new(
                ast.ident.span(),
                "`MessagePackEnum` can only be derived for enums",
            ));
        };
        if !ast.generics.params.is_empty() {
            return Err(syn::Error::new(
                ast.generics.span(),
                "`MessagePackEnum` does not support generics",
            ));
        }
        if data.variants.is_empty() {
            return Err(syn::Error::new(
                ast.ident.span(),
                "`MessagePackEnum` needs at least one variant",
            ));
        }

        let mut variants = Vec::with_capacity(data.variants.len());
        for variant in &data.variants {
            if !matches!(variant.fields, Fields::Unit) {
                return Err(syn::Error::new(
                    variant.fields.span(),
                    "`MessagePackEnum` variants cannot have fields",
                ));
            }
            let attrs = VariantAttributes::parse_attrs(&variant.attrs)?;
            let name = attrs
                .rename
                .unwrap_or_else(|| LitStr::new(&variant.ident.to_string(), variant.ident.span()));
            if variants.iter().any(|v: &EnumVariant| v.name.value() == name.value()) {
                return Err(syn::Error::new(name.span(), "duplicate variant name"));
            }
            variants.push(EnumVariant {
                ident: &variant.ident,
                name,
            });
        }

        Ok(Self {
            ident: &ast.ident,
            vc_msgpack_path: type_attrs.crate_path(),
            variants,
        })
    }
}

#[cfg(test)]
mod tests {
    use syn::parse_quote;

    use super::EnumDerive;

    #[test]
    fn variant_names() {
        let ast: syn::DeriveInput = parse_quote! {
            enum Level {
                Low = 1,
                #[msgpack(rename = "hi")]
                High = 9,
            }
        };
        let info = EnumDerive::from_input(&ast).unwrap();
        let names: Vec<_> = info.variants.iter().map(|v| v.name.value()).collect();
        assert_eq!(names, ["Low", "hi"]);
    }

    #[test]
    fn rejected_shapes() {
        let cases: [syn::DeriveInput; 5] = [
            parse_quote!(struct A;),
            parse_quote!(enum B {}),
            parse_quote!(enum C { X(u8) }),
            parse_quote!(enum D<T> { X, Y(T) }),
            parse_quote!(enum E { X, #[msgpack(rename = "X")] Y }),
        ];
        for ast in &cases {
            assert!(EnumDerive::from_input(ast).is_err(), "{}", ast.ident);
        }
    }
}
