use proc_macro2::TokenStream;
use quote::quote;

use crate::derive_data::EnumDerive;

/// Implements `MessagePackType` with an enum descriptor.
pub(crate) fn impl_enum(info: &EnumDerive) -> TokenStream {
    let vc_msgpack_path = &info.vc_msgpack_path;
    let info_ = crate::path::info_(vc_msgpack_path);
    let macro_exports_ = crate::path::macro_exports_(vc_msgpack_path);

    let ident = info.ident;
    let idents: Vec<_> = info.variants.iter().map(|v| v.ident).collect();
    let names = info.variants.iter().map(|v| &v.name);

    quote! {
        impl #info_::MessagePackType for #ident {
            fn type_descriptor() -> #info_::TypeDescriptor {
                #info_::TypeDescriptor::of::<Self>(#info_::TypeKind::Enum(
                    #info_::EnumInfo::new(
                        #macro_exports_::vec![#(
                            #info_::EnumVariant::new(#names, Self::#idents as i64)
                        ),*],
                        |value| ::core::result::Result::Ok(*#info_::downcast::<Self>(value)? as i64),
                        |raw| match raw {
                            #(raw if raw == Self::#idents as i64 => ::core::option::Option::Some(
                                #macro_exports_::Box::new(Self::#idents)
                                    as #macro_exports_::Box<dyn ::core::any::Any>,
                            ),)*
                            _ => ::core::option::Option::None,
                        },
                    ),
                ))
            }
        }
    }
}
