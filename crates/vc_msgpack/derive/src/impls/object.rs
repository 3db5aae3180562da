use proc_macro2::TokenStream;
use quote::quote;
use syn::{WhereClause, parse_quote};

use crate::derive_data::{ObjectDerive, ObjectField};

/// Implements `MessagePackType` with a composite descriptor.
pub(crate) fn impl_object(info: &ObjectDerive) -> TokenStream {
    let vc_msgpack_path = &info.vc_msgpack_path;
    let info_ = crate::path::info_(vc_msgpack_path);
    let macro_exports_ = crate::path::macro_exports_(vc_msgpack_path);

    let ident = info.ident;
    let (impl_generics, ty_generics, where_clause) = info.generics.split_for_impl();

    // Generic members need their bounds spelled out; concrete ones are
    // checked by `MemberInfo::new` itself.
    let where_clause = if info.generics.params.is_empty() {
        where_clause.cloned()
    } else {
        let mut where_clause = where_clause.cloned().unwrap_or_else(|| WhereClause {
            where_token: Default::default(),
            predicates: Default::default(),
        });
        for field in info.serialized() {
            let ty = field.ty;
            where_clause
                .predicates
                .push(parse_quote!(#ty: #info_::MessagePackType));
        }
        where_clause
            .predicates
            .push(parse_quote!(Self: ::core::default::Default + 'static));
        Some(where_clause)
    };

    let members = info.fields.iter().map(|field| member_info(field, vc_msgpack_path));

    quote! {
        impl #impl_generics #info_::MessagePackType for #ident #ty_generics #where_clause {
            fn type_descriptor() -> #info_::TypeDescriptor {
                #info_::TypeDescriptor::composite::<Self>(
                    #macro_exports_::vec![#(#members),*]
                )
            }
        }
    }
}

/// The `MemberInfo` expression of one field.
fn member_info(field: &ObjectField, vc_msgpack_path: &syn::Path) -> TokenStream {
    let info_ = crate::path::info_(vc_msgpack_path);
    let name = field.name();

    if field.is_skipped() {
        return quote!(#info_::MemberInfo::skipped(#name));
    }

    let member = field.ident;
    let ty = field.ty;

    let with_order = field.attrs.order.map(|order| quote!(.with_order(#order)));
    let with_schema = field
        .attrs
        .schema
        .as_ref()
        .map(|schema| quote!(.with_schema(#schema)));
    let with_duplicate_keys = field.attrs.duplicate_keys.as_ref().map(|policy| {
        let policy_ = crate::path::duplicate_key_policy_(vc_msgpack_path);
        quote!(.with_duplicate_keys(#policy_::#policy))
    });

    quote! {
        #info_::MemberInfo::new::<#ty>(
            #name,
            |owner| {
                let owner = #info_::downcast::<Self>(owner)?;
                ::core::result::Result::Ok(&owner.#member as &dyn ::core::any::Any)
            },
            |owner, value| {
                #info_::downcast_mut::<Self>(owner)?.#member = #info_::unbox::<#ty>(value)?;
                ::core::result::Result::Ok(())
            },
        )
        #with_order
        #with_schema
        #with_duplicate_keys
    }
}
