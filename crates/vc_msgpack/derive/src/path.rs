//! Paths into `vc_msgpack` used by the generated code.
//!
//! Every helper takes the crate path parsed from `#[msgpack(crate = ...)]`.

use proc_macro2::TokenStream;
use quote::quote;

/// The default crate path, `::vc_msgpack`.
pub(crate) fn vc_msgpack() -> syn::Path {
    syn::parse_quote!(::vc_msgpack)
}

#[inline(always)]
pub(crate) fn info_(vc_msgpack_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_msgpack_path::info
    }
}

#[inline(always)]
pub(crate) fn duplicate_key_policy_(vc_msgpack_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_msgpack_path::context::DuplicateKeyPolicy
    }
}

#[inline(always)]
pub(crate) fn macro_exports_(vc_msgpack_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_msgpack_path::__macro_exports
    }
}
