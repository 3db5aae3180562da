//! MessagePack serialization for the VoidCraft crates.
//!
//! - [`msgpack`]: codec, value model, serialization contexts and serializers.
//! - [`utils`]: the hash containers and collections the serializers rely on.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

pub use vc_msgpack as msgpack;
pub use vc_utils as utils;
