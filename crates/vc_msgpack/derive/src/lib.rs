//! Derive macros for `vc_msgpack`:
//!
//! - [`MessagePackObject`]
//! - [`MessagePackEnum`]
#![allow(clippy::std_instead_of_core, reason = "proc-macro lib")]
#![allow(clippy::std_instead_of_alloc, reason = "proc-macro lib")]

use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

static MSGPACK_ATTRIBUTE_NAME: &str = "msgpack";

// -----------------------------------------------------------------------------
// Modules

mod derive_data;
mod impls;
mod path;

// -----------------------------------------------------------------------------
// Macros

/// # Derive `MessagePackType` for a struct
///
/// Every named field is a member, serialized by the `MessagePackType` of
/// its type. The struct must implement `Default`, which unpacking starts
/// from. Unit structs have no members.
///
/// ## Field attributes
///
/// - `#[msgpack(order = N)]`: the member's position in the array layout.
///   Either every serialized member has one or none does; without orders,
///   members are laid out by name. `N` may not exceed `65535`.
/// - `#[msgpack(skip)]`: excluded from serialization, left at its default
///   when unpacking.
/// - `#[msgpack(rename = "name")]`: the member name used by the map layout
///   and for ordering by name.
/// - `#[msgpack(schema = expr)]`: the `PolymorphismSchema` of a trait-object
///   member, or of the elements of a collection of them.
/// - `#[msgpack(duplicate_keys = Overwrite)]`: the `DuplicateKeyPolicy` of a
///   map member, in place of the context's.
///
/// ```rust, ignore
/// #[derive(Default, MessagePackObject)]
/// struct User {
///     #[msgpack(order = 0)]
///     id: u32,
///     #[msgpack(order = 1, duplicate_keys = Overwrite)]
///     tags: HashMap<String, u32>,
///     #[msgpack(skip)]
///     cache: Vec<u8>,
/// }
/// ```
///
/// ## Type attributes
///
/// `#[msgpack(crate = path)]` names the `vc_msgpack` crate when it is
/// reached under another path, for example `crate = vc_pack::msgpack`.
/// The default is `::vc_msgpack`.
///
/// ## Generics
///
/// Type parameters are supported; the generated impl requires every member
/// type to implement `MessagePackType` and `Self` to implement `Default`.
/// Lifetime parameters are rejected, since serializable types are `'static`.
#[proc_macro_derive(MessagePackObject, attributes(msgpack))]
pub fn derive_message_pack_object(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    let info = match derive_data::ObjectDerive::from_input(&ast) {
        Ok(val) => val,
        Err(err) => return err.into_compile_error().into(),
    };
    let object_impl = impls::impl_object(&info);

    TokenStream::from(quote! {
        const _: () = {
            #object_impl
        };
    })
}

/// # Derive `MessagePackType` for a field-less enum
///
/// The enum must be `Copy`; its discriminants are the underlying values and
/// its variant names are written by the by-name method.
///
/// `#[msgpack(rename = "name")]` on a variant changes the written name, and
/// `#[msgpack(crate = path)]` on the enum works as for
/// [`MessagePackObject`].
///
/// ```rust, ignore
/// #[derive(Clone, Copy, MessagePackEnum)]
/// enum Level {
///     Low = 1,
///     #[msgpack(rename = "hi")]
///     High = 9,
/// }
/// ```
#[proc_macro_derive(MessagePackEnum, attributes(msgpack))]
pub fn derive_message_pack_enum(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    let info = match derive_data::EnumDerive::from_input(&ast) {
        Ok(val) => val,
        Err(err) => return err.into_compile_error().into(),
    };
    let enum_impl = impls::impl_enum(&info);

    TokenStream::from(quote! {
        const _: () = {
            #enum_impl
        };
    })
}
