//! Small containers shared by the `vc_pack` crates.
//!
//! - [`hash`]: hash containers with a fixed, seed-stable hasher.
//! - [`TypeIdMap`]: a map keyed by [`TypeId`](core::any::TypeId).
//! - [`collections`]: containers with a wire-visible element order, such as [`Stack`].
//!
//! [`Stack`]: collections::Stack
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// No STD Support

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod typeid_map;

pub mod collections;
pub mod hash;

// -----------------------------------------------------------------------------
// Top-level exports

pub use typeid_map::TypeIdMap;
