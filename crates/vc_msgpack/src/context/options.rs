use crate::codec::{DEFAULT_MAX_DEPTH, PackerCompatibilityOptions};

// -----------------------------------------------------------------------------
// Option enums

/// Wire shape of composite types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SerializationMethod {
    /// An array of member values in ascending member order.
    #[default]
    Array,
    /// A map from member name to member value.
    Map,
}

/// Wire shape of enum values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EnumSerializationMethod {
    /// The variant name as a string.
    #[default]
    ByName,
    /// The variant's underlying integer value.
    ByUnderlyingValue,
}

/// Wire shape of [`SystemTime`](std::time::SystemTime) values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DateTimeConversionMethod {
    /// The timestamp extension (type `-1`), nanosecond precision.
    #[default]
    Native,
    /// Signed milliseconds since the Unix epoch, as understood by older peers.
    UnixEpoch,
}

/// What an array-shaped composite does when the item count differs from its layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ArrayMemberCountPolicy {
    /// A different item count is a schema violation.
    #[default]
    Strict,
    /// Missing trailing members keep their defaults; extra items are skipped.
    Tolerant,
}

/// What a typed map does when it receives the same key twice.
///
/// [`Value`](crate::value::Value) maps keep every entry regardless.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DuplicateKeyPolicy {
    /// Fail with [`DuplicateKey`](crate::MessagePackError::DuplicateKey).
    #[default]
    Reject,
    /// The later entry replaces the earlier one.
    Overwrite,
}

// -----------------------------------------------------------------------------
// SerializationOptions

/// Settings a [`SerializationContext`] applies to every serializer it builds.
///
/// Options are captured when a serializer is built, so they can only change
/// while the context has built nothing yet. See
/// [`SerializationContext::configure`].
///
/// # Examples
///
/// ```
/// use vc_msgpack::context::{SerializationMethod, SerializationOptions};
///
/// let options = SerializationOptions::default()
///     .with_serialization_method(SerializationMethod::Map)
///     .with_max_depth(64);
///
/// assert_eq!(options.serialization_method, SerializationMethod::Map);
/// assert_eq!(options.max_depth, 64);
/// ```
///
/// [`SerializationContext`]: crate::context::SerializationContext
/// [`SerializationContext::configure`]: crate::context::SerializationContext::configure
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SerializationOptions {
    pub serialization_method: SerializationMethod,
    pub enum_method: EnumSerializationMethod,
    pub date_time_conversion: DateTimeConversionMethod,
    pub compatibility: PackerCompatibilityOptions,
    pub member_count: ArrayMemberCountPolicy,
    pub duplicate_keys: DuplicateKeyPolicy,
    /// Deepest container nesting accepted while unpacking.
    pub max_depth: usize,
}

impl Default for SerializationOptions {
    fn default() -> Self {
        Self {
            serialization_method: SerializationMethod::default(),
            enum_method: EnumSerializationMethod::default(),
            date_time_conversion: DateTimeConversionMethod::default(),
            compatibility: PackerCompatibilityOptions::NONE,
            member_count: ArrayMemberCountPolicy::default(),
            duplicate_keys: DuplicateKeyPolicy::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl SerializationOptions {
    /// Options understood by peers that predate the `bin`, `str8` and extension families.
    pub fn classic() -> Self {
        Self {
            compatibility: PackerCompatibilityOptions::CLASSIC,
            date_time_conversion: DateTimeConversionMethod::UnixEpoch,
            ..Self::default()
        }
    }

    #[inline]
    pub fn with_serialization_method(mut self, method: SerializationMethod) -> Self {
        self.serialization_method = method;
        self
    }

    #[inline]
    pub fn with_enum_method(mut self, method: EnumSerializationMethod) -> Self {
        self.enum_method = method;
        self
    }

    #[inline]
    pub fn with_date_time_conversion(mut self, method: DateTimeConversionMethod) -> Self {
        self.date_time_conversion = method;
        self
    }

    #[inline]
    pub fn with_compatibility(mut self, compatibility: PackerCompatibilityOptions) -> Self {
        self.compatibility = compatibility;
        self
    }

    #[inline]
    pub fn with_member_count(mut self, policy: ArrayMemberCountPolicy) -> Self {
        self.member_count = policy;
        self
    }

    #[inline]
    pub fn with_duplicate_keys(mut self, policy: DuplicateKeyPolicy) -> Self {
        self.duplicate_keys = policy;
        self
    }

    #[inline]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
