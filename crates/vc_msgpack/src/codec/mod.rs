//! The MessagePack binary codec.
//!
//! - [`Packer`]: writes primitive encodings to any [`std::io::Write`].
//! - [`Unpacker`]: reads them back from any [`std::io::Read`], with one byte
//!   of lookahead, container tracking and a nesting limit.
//!
//! Neither side knows about user types; that is the job of the
//! [`serializer`](crate::serializer) layer.

// -----------------------------------------------------------------------------
// Modules

mod options;
mod packer;
mod unpacker;

pub(crate) mod code;

#[cfg(feature = "tokio")]
pub(crate) mod frame;

// -----------------------------------------------------------------------------
// Exports

pub use options::PackerCompatibilityOptions;
pub use packer::{DynPacker, Packer};
pub use unpacker::{DEFAULT_MAX_DEPTH, DynUnpacker, Unpacker};
