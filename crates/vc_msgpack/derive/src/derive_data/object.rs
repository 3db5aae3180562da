use std::collections::BTreeMap;

use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Fields, Generics, Ident, LitStr, Path, Type};

use super::{FieldAttributes, TypeAttributes};

/// A struct deriving `MessagePackObject`.
pub(crate) struct ObjectDerive<'a> {
    pub ident: &'a Ident,
    pub generics: &'a Generics,
    pub vc_msgpack_path: Path,
    pub fields: Vec<ObjectField<'a>>,
}

pub(crate) struct ObjectField<'a> {
    pub ident: &'a Ident,
    pub ty: &'a Type,
    pub attrs: FieldAttributes,
}

impl ObjectField<'_> {
    /// The member name: the `rename` value, or the field's identifier.
    pub fn name(&self) -> LitStr {
        match &self.attrs.rename {
            Some(name) => name.clone(),
            None => LitStr::new(&self.ident.to_string(), self.ident.span()),
        }
    }

    #[inline]
    pub fn is_skipped(&self) -> bool {
        self.attrs.skip.is_some()
    }
}

impl<'a> ObjectDerive<'a> {
    pub fn from_input(ast: &'a DeriveInput) -> syn::Result<Self> {
        let type_attrs = TypeAttributes::parse_attrs(&ast.attrs)?;

        if let Some(lifetime) = ast.generics.lifetimes().next() {
            return Err(syn::Error::new(
                lifetime.span(),
                "`MessagePackObject` types must be `'static`",
            ));
        }

        let Data::Struct(data) = &ast.data else {
            return Err(syn::Error::new(
                ast.ident.span(),
                "`MessagePackObject` can only be derived for structs, use `MessagePackEnum` for field-less enums",
            ));
        };

        let mut fields = Vec::new();
        match &data.fields {
            Fields::Named(named) => {
                for field in &named.named {
                    let Some(ident) = &field.ident else {
                        return Err(syn::Error::new(field.span(), "expected a named field"));
                    };
                    fields.push(ObjectField {
                        ident,
                        ty: &field.ty,
                        attrs: FieldAttributes::parse_attrs(&field.attrs)?,
                    });
                }
            }
            Fields::Unit => {}
            Fields::Unnamed(unnamed) => {
                return Err(syn::Error::new(
                    unnamed.span(),
                    "`MessagePackObject` needs named fields",
                ));
            }
        }

        check_layout(&fields)?;

        Ok(Self {
            ident: &ast.ident,
            generics: &ast.generics,
            vc_msgpack_path: type_attrs.crate_path(),
            fields,
        })
    }

    /// Fields that take part in serialization.
    pub fn serialized(&self) -> impl Iterator<Item = &ObjectField<'a>> {
        self.fields.iter().filter(|field| !field.is_skipped())
    }
}

/// Member names and orders are unique, and orders are all-or-none.
///
/// The runtime layout planner repeats these checks; doing them here moves
/// the error to the offending field.
fn check_layout(fields: &[ObjectField]) -> syn::Result<()> {
    let mut names = BTreeMap::new();
    let mut orders = BTreeMap::new();
    let mut ordered = 0_usize;
    let mut serialized = 0_usize;

    for field in fields.iter().filter(|field| !field.is_skipped()) {
        serialized += 1;

        let name = field.name();
        if names.insert(name.value(), ()).is_some() {
            return Err(syn::Error::new(name.span(), "duplicate member name"));
        }

        if let Some(order) = field.attrs.order {
            ordered += 1;
            if orders.insert(order, ()).is_some() {
                return Err(syn::Error::new(
                    field.ident.span(),
                    format!("member order {order} is used twice"),
                ));
            }
        }
    }

    if ordered != 0 && ordered != serialized {
        let unordered = fields
            .iter()
            .find(|field| !field.is_skipped() && field.attrs.order.is_none());
        let span = unordered.map_or_else(proc_macro2::Span::call_site, |field| field.ident.span());
        return Err(syn::Error::new(
            span,
            "either every serialized member has an `order` or none does",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use syn::parse_quote;

    use super::ObjectDerive;

    #[test]
    fn from_input() {
        let ast: syn::DeriveInput = parse_quote! {
            struct User {
                #[msgpack(order = 1)]
                id: u32,
                #[msgpack(skip)]
                cache: u32,
                #[msgpack(order = 0, rename = "n")]
                name: String,
            }
        };
        let info = ObjectDerive::from_input(&ast).unwrap();
        assert_eq!(info.fields.len(), 3);
        let names: Vec<_> = info.serialized().map(|field| field.name().value()).collect();
        assert_eq!(names, ["id", "n"]);
    }

    #[test]
    fn rejected_shapes() {
        let cases: [syn::DeriveInput; 6] = [
            parse_quote!(struct A(u8);),
            parse_quote!(enum B { X }),
            parse_quote!(struct C<'a> { a: &'a str }),
            parse_quote!(struct D { #[msgpack(order = 0)] a: u8, b: u8 }),
            parse_quote!(struct E { #[msgpack(order = 0)] a: u8, #[msgpack(order = 0)] b: u8 }),
            parse_quote!(struct F { a: u8, #[msgpack(rename = "a")] b: u8 }),
        ];
        for ast in &cases {
            assert!(ObjectDerive::from_input(ast).is_err(), "{}", ast.ident);
        }
    }

    #[test]
    fn skipped_members_need_no_order() {
        let ast: syn::DeriveInput = parse_quote! {
            struct G {
                #[msgpack(order = 0)]
                a: u8,
                #[msgpack(skip)]
                b: u8,
            }
        };
        assert!(ObjectDerive::from_input(&ast).is_ok());
    }
}
