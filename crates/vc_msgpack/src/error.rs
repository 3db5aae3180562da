use alloc::string::String;

use thiserror::Error;

/// Crate-local result type.
pub type Result<T, E = MessagePackError> = core::result::Result<T, E>;

/// Errors produced while packing, unpacking, or building serializers.
///
/// Every error aborts the current call. A failed pack may leave the target
/// stream partially written; a failed unpack never yields a partial value.
#[derive(Debug, Error)]
pub enum MessagePackError {
    /// Stream IO failure other than a premature end of input.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    /// A byte that no MessagePack encoding uses (`0xc1`).
    #[error("invalid format byte 0x{code:02x} at offset {offset}")]
    Format {
        /// The offending byte.
        code: u8,
        /// Stream offset of the byte.
        offset: u64,
    },
    /// Input ended inside a value, or inside an open array or map.
    #[error("unexpected end of stream at offset {offset}")]
    UnexpectedEndOfStream {
        /// Number of bytes consumed before the stream ended.
        offset: u64,
    },
    /// A value of one kind was requested as another.
    #[error("Do not convert {actual} to {expected}")]
    TypeMismatch {
        /// What was found on the wire or in the value.
        actual: &'static str,
        /// What the caller asked for.
        expected: &'static str,
    },
    /// A string payload was not valid UTF-8.
    #[error("string at offset {offset} is not valid UTF-8")]
    InvalidUtf8 {
        /// Stream offset of the string payload.
        offset: u64,
    },
    /// Type metadata or wire data breaks a structural rule of the target type.
    #[error("{type_name}: {reason}")]
    SchemaViolation {
        /// Type whose serializer reported the violation.
        type_name: &'static str,
        /// Human-readable description.
        reason: String,
    },
    /// A typed map received the same key twice.
    #[error("{type_name}: duplicate key at entry {index}")]
    DuplicateKey {
        /// Target map type.
        type_name: &'static str,
        /// Zero-based position of the repeated entry.
        index: usize,
    },
    /// An async operation observed its cancellation signal.
    #[error("operation cancelled")]
    Cancelled,
    /// Options were changed after the context started building serializers.
    #[error("serialization context is frozen, options can no longer change")]
    ConfigurationFrozen,
    /// Nesting went deeper than the configured limit.
    #[error("nesting depth exceeds limit {max_depth}")]
    DepthExceeded {
        /// Configured limit.
        max_depth: usize,
    },
    /// A length does not fit the 32-bit MessagePack length fields.
    #[error("length {len} exceeds the 32-bit MessagePack limit")]
    LengthOverflow {
        /// Rejected length.
        len: usize,
    },
}

impl MessagePackError {
    #[inline]
    pub(crate) fn mismatch(actual: &'static str, expected: &'static str) -> Self {
        Self::TypeMismatch { actual, expected }
    }

    #[inline]
    pub(crate) fn schema(type_name: &'static str, reason: impl Into<String>) -> Self {
        Self::SchemaViolation {
            type_name,
            reason: reason.into(),
        }
    }
}
