use proc_macro2::Span;
use syn::meta::ParseNestedMeta;
use syn::{Attribute, Expr, Ident, LitInt, LitStr, Path};

use crate::MSGPACK_ATTRIBUTE_NAME;

/// Largest accepted member order, matching the runtime limit.
const MAX_MEMBER_ORDER: u32 = u16::MAX as u32;

fn msgpack_attrs(attrs: &[Attribute]) -> impl Iterator<Item = &Attribute> {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident(MSGPACK_ATTRIBUTE_NAME))
}

fn set_once<T>(slot: &mut Option<T>, meta: &ParseNestedMeta, value: T) -> syn::Result<()> {
    if slot.is_some() {
        return Err(meta.error("duplicate attribute"));
    }
    *slot = Some(value);
    Ok(())
}

// -----------------------------------------------------------------------------
// TypeAttributes

/// `#[msgpack(...)]` on the type itself.
#[derive(Default)]
pub(crate) struct TypeAttributes {
    crate_path: Option<Path>,
}

impl TypeAttributes {
    pub fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        for attr in msgpack_attrs(attrs) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("crate") {
                    let path: Path = meta.value()?.parse()?;
                    set_once(&mut this.crate_path, &meta, path)
                } else {
                    Err(meta.error("unknown type attribute, expected `crate = path`"))
                }
            })?;
        }
        Ok(this)
    }

    pub fn crate_path(&self) -> Path {
        self.crate_path.clone().unwrap_or_else(crate::path::vc_msgpack)
    }
}

// -----------------------------------------------------------------------------
// FieldAttributes

/// `#[msgpack(...)]` on a struct field.
#[derive(Default)]
pub(crate) struct FieldAttributes {
    pub skip: Option<Span>,
    pub order: Option<u32>,
    pub rename: Option<LitStr>,
    pub schema: Option<Expr>,
    pub duplicate_keys: Option<Ident>,
}

impl FieldAttributes {
    pub fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        for attr in msgpack_attrs(attrs) {
            attr.parse_nested_meta(|meta| this.parse_meta(meta))?;
        }

        if let Some(span) = this.skip
            && (this.order.is_some()
                || this.rename.is_some()
                || this.schema.is_some()
                || this.duplicate_keys.is_some())
        {
            return Err(syn::Error::new(span, "a skipped member takes no other attribute"));
        }
        Ok(this)
    }

    fn parse_meta(&mut self, meta: ParseNestedMeta) -> syn::Result<()> {
        if meta.path.is_ident("skip") {
            let span = meta.path.get_ident().map_or_else(Span::call_site, Ident::span);
            set_once(&mut self.skip, &meta, span)
        } else if meta.path.is_ident("order") {
            let lit: LitInt = meta.value()?.parse()?;
            let order: u32 = lit.base10_parse()?;
            if order > MAX_MEMBER_ORDER {
                return Err(syn::Error::new(
                    lit.span(),
                    format!("member order must not exceed {MAX_MEMBER_ORDER}"),
                ));
            }
            set_once(&mut self.order, &meta, order)
        } else if meta.path.is_ident("rename") {
            let name: LitStr = meta.value()?.parse()?;
            set_once(&mut self.rename, &meta, name)
        } else if meta.path.is_ident("schema") {
            let schema: Expr = meta.value()?.parse()?;
            set_once(&mut self.schema, &meta, schema)
        } else if meta.path.is_ident("duplicate_keys") {
            let policy: Ident = meta.value()?.parse()?;
            if policy != "Reject" && policy != "Overwrite" {
                return Err(syn::Error::new(
                    policy.span(),
                    "expected `Reject` or `Overwrite`",
                ));
            }
            set_once(&mut self.duplicate_keys, &meta, policy)
        } else {
            Err(meta.error(
                "unknown member attribute, expected one of `order`, `skip`, `rename`, `schema`, `duplicate_keys`",
            ))
        }
    }
}

// -----------------------------------------------------------------------------
// VariantAttributes

/// `#[msgpack(...)]` on an enum variant.
#[derive(Default)]
pub(crate) struct VariantAttributes {
    pub rename: Option<LitStr>,
}

impl VariantAttributes {
    pub fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        for attr in msgpack_attrs(attrs) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    let name: LitStr = meta.value()?.parse()?;
                    set_once(&mut this.rename, &meta, name)
                } else {
                    Err(meta.error("unknown variant attribute, expected `rename = \"name\"`"))
                }
            })?;
        }
        Ok(this)
    }
}

#[cfg(test)]
mod tests {
    use syn::parse_quote;

    use super::{FieldAttributes, TypeAttributes};

    #[test]
    fn field_attributes() {
        let field: syn::Field = parse_quote! {
            #[msgpack(order = 3, rename = "k")]
            #[msgpack(duplicate_keys = Overwrite)]
            key: u8
        };
        let attrs = FieldAttributes::parse_attrs(&field.attrs).unwrap();
        assert_eq!(attrs.order, Some(3));
        assert_eq!(attrs.rename.unwrap().value(), "k");
        assert!(attrs.duplicate_keys.unwrap() == "Overwrite");
        assert!(attrs.skip.is_none());
    }

    #[test]
    fn field_attribute_errors() {
        let cases: [syn::Field; 5] = [
            parse_quote!(#[msgpack(order = 70000)] a: u8),
            parse_quote!(#[msgpack(order = 1, order = 2)] a: u8),
            parse_quote!(#[msgpack(skip, order = 1)] a: u8),
            parse_quote!(#[msgpack(duplicate_keys = Keep)] a: u8),
            parse_quote!(#[msgpack(default)] a: u8),
        ];
        for field in cases {
            assert!(FieldAttributes::parse_attrs(&field.attrs).is_err());
        }
    }

    #[test]
    fn crate_path() {
        let ast: syn::DeriveInput = parse_quote! {
            #[msgpack(crate = vc_pack::msgpack)]
            struct A;
        };
        let path = TypeAttributes::parse_attrs(&ast.attrs).unwrap().crate_path();
        assert_eq!(path, parse_quote!(vc_pack::msgpack));

        let ast: syn::DeriveInput = parse_quote!(struct B;);
        let path = TypeAttributes::parse_attrs(&ast.attrs).unwrap().crate_path();
        assert_eq!(path, parse_quote!(::vc_msgpack));
    }
}
