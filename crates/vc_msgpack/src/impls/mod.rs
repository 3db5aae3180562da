//! [`MessagePackType`](crate::info::MessagePackType) for std and crate types.
//!
//! - Primitives: integers, floats, `bool`, `char`, `()`, `String`, `Vec<u8>` as binary,
//!   [`Value`](crate::value::Value), [`Timestamp`](crate::value::Timestamp) and `SystemTime`.
//! - Wrappers: `Option<T>`, `Box<T>`.
//! - Collections: `Vec`, `VecDeque`, [`Stack`](vc_utils::collections::Stack), `HashSet`, `BTreeSet`.
//! - Maps: `HashMap` (std and hashbrown), `BTreeMap`.
//! - `uuid::Uuid` with the `uuid` feature.

mod containers;
mod primitives;
mod time;

#[cfg(feature = "uuid")]
mod uuid;
