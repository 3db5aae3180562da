//! A MessagePack serialization engine driven by per-type descriptors.
//!
//! ## Layers
//!
//! - [`codec`]: the binary format. [`Packer`](codec::Packer) and
//!   [`Unpacker`](codec::Unpacker) know nothing about user types.
//! - [`value`]: [`Value`](value::Value), the dynamic model for untyped data.
//! - [`info`]: [`MessagePackType`](info::MessagePackType) and the
//!   descriptors types use to explain their shape.
//! - [`polymorphism`]: schemas for trait-object slots.
//! - [`context`]: [`SerializationContext`](context::SerializationContext),
//!   which builds one serializer per type and caches it.
//! - [`serializer`]: the typed [`Serializer`](serializer::Serializer) handle.
//!
//! ## Quick start
//!
//! ```
//! use vc_msgpack::context::SerializationContext;
//! use vc_msgpack::impl_message_pack_object;
//!
//! #[derive(Default, Debug, PartialEq)]
//! struct User {
//!     id: u32,
//!     name: String,
//!     tags: Vec<String>,
//! }
//!
//! impl_message_pack_object!(User {
//!     id: u32 = 0,
//!     name: String = 1,
//!     tags: Vec<String> = 2,
//! });
//!
//! let context = SerializationContext::new();
//! let serializer = context.get_serializer::<User>().unwrap();
//!
//! let user = User { id: 7, name: "ann".into(), tags: vec!["admin".into()] };
//! let bytes = serializer.pack_single_object(&user).unwrap();
//! assert_eq!(&bytes[..3], [0x93, 0x07, 0xa3]);
//!
//! assert_eq!(serializer.unpack_single_object(&bytes).unwrap(), user);
//! ```
//!
//! ## Derives
//!
//! [`derive::MessagePackObject`] and [`derive::MessagePackEnum`] generate
//! the same descriptors as the `impl_message_pack_*` macros, configured
//! with `#[msgpack(...)]` attributes:
//!
//! ```
//! use std::collections::HashMap;
//!
//! use vc_msgpack::context::SerializationContext;
//! use vc_msgpack::derive::{MessagePackEnum, MessagePackObject};
//!
//! #[derive(Debug, Clone, Copy, PartialEq, MessagePackEnum)]
//! enum Role {
//!     Guest = 0,
//!     #[msgpack(rename = "admin")]
//!     Admin = 1,
//! }
//!
//! #[derive(Debug, PartialEq, MessagePackObject)]
//! struct Account {
//!     #[msgpack(order = 0)]
//!     id: u32,
//!     #[msgpack(order = 1)]
//!     role: Role,
//!     #[msgpack(order = 2, duplicate_keys = Overwrite)]
//!     limits: HashMap<String, u32>,
//!     #[msgpack(skip)]
//!     session: Option<u64>,
//! }
//!
//! impl Default for Account {
//!     fn default() -> Self {
//!         Self { id: 0, role: Role::Guest, limits: HashMap::new(), session: None }
//!     }
//! }
//!
//! let context = SerializationContext::new();
//! let serializer = context.get_serializer::<Account>().unwrap();
//!
//! let bytes = [0x93, 0x05, 0xa5, b'a', b'd', b'm', b'i', b'n', 0x82, 0xa1, b'x', 0x01, 0xa1, b'x', 0x02];
//! let account = serializer.unpack_single_object(&bytes).unwrap();
//! assert_eq!(account.role, Role::Admin);
//! assert_eq!(account.limits["x"], 2);
//! ```
//!
//! ## Features
//!
//! - `auto_register` (default): collect serializers from [`submit_prebuilt!`].
//! - `tokio`: async pack and unpack on [`Serializer`](serializer::Serializer).
//! - `uuid`: `uuid::Uuid` as 16 bytes of binary.
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Extern crates

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod builder;
mod error;
mod impls;
mod macros;

pub mod codec;
pub mod context;
pub mod info;
pub mod polymorphism;
pub mod serializer;
pub mod value;

// -----------------------------------------------------------------------------
// Top-Level exports

#[doc(hidden)]
pub mod __macro_exports;

pub use error::{MessagePackError, Result};
pub use vc_msgpack_derive as derive;
