//! Items referenced by the crate's exported macros.
//!
//! Not public API; paths here may change without notice.

pub use alloc::boxed::Box;
pub use alloc::vec;

/// Used by [`submit_prebuilt!`](crate::submit_prebuilt).
#[cfg(feature = "auto_register")]
pub mod auto_register {
    pub use inventory;

    pub use crate::context::{PrebuiltSerializer, erase};
}
