use alloc::sync::Arc;
use core::any::TypeId;
use core::fmt;
use std::sync::{Mutex, PoisonError, RwLock};

use tracing::debug;

use crate::context::SerializationOptions;
use crate::context::registry::{SerializerKey, SerializerRegistry, lock};
use crate::error::{MessagePackError, Result};
use crate::info::{MessagePackType, Type, TypeDescriptor};
use crate::polymorphism::PolymorphismSchema;
use crate::serializer::{CustomSerializer, ErasedSerializer, MessagePackSerializer, Serializer};

struct OptionsState {
    options: Arc<SerializationOptions>,
    frozen: bool,
}

pub(crate) struct ContextShared {
    options: Mutex<OptionsState>,
    registry: SerializerRegistry,
}

// -----------------------------------------------------------------------------
// SerializationContext

/// Options plus the cache of every serializer built under them.
///
/// A context is a cheap, cloneable handle; clones share one cache. Each
/// target type (together with its polymorphism schema, if any) is built at
/// most once per context, and the result is shared by every caller and by
/// every serializer that nests the type.
///
/// Options can change with [`configure`](Self::configure) until the
/// context hands out its first serializer. After that it is frozen.
///
/// # Examples
///
/// ```
/// use vc_msgpack::context::{SerializationContext, SerializationMethod};
/// use vc_msgpack::impl_message_pack_object;
///
/// #[derive(Default, Debug, PartialEq)]
/// struct Point { x: i32, y: i32 }
/// impl_message_pack_object!(Point { x: i32 = 0, y: i32 = 1 });
///
/// let context = SerializationContext::new();
/// context.configure(|o| o.serialization_method = SerializationMethod::Map).unwrap();
///
/// let serializer = context.get_serializer::<Point>().unwrap();
/// let bytes = serializer.pack_single_object(&Point { x: 1, y: 2 }).unwrap();
/// assert_eq!(bytes, [0x82, 0xa1, b'x', 0x01, 0xa1, b'y', 0x02]);
///
/// assert!(context.is_frozen());
/// assert!(context.configure(|o| o.max_depth = 8).is_err());
/// ```
#[derive(Clone)]
pub struct SerializationContext {
    pub(crate) shared: Arc<ContextShared>,
}

impl Default for SerializationContext {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SerializationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.shared.options);
        f.debug_struct("SerializationContext")
            .field("options", &state.options)
            .field("frozen", &state.frozen)
            .field("cached", &self.shared.registry.len())
            .finish()
    }
}

impl SerializationContext {
    /// Creates a context with default options.
    #[inline]
    pub fn new() -> Self {
        Self::with_options(SerializationOptions::default())
    }

    pub fn with_options(options: SerializationOptions) -> Self {
        Self {
            shared: Arc::new(ContextShared {
                options: Mutex::new(OptionsState {
                    options: Arc::new(options),
                    frozen: false,
                }),
                registry: SerializerRegistry::new(),
            }),
        }
    }

    /// Creates a context with [`SerializationOptions::classic`].
    #[inline]
    pub fn classic() -> Self {
        Self::with_options(SerializationOptions::classic())
    }

    /// Returns a copy of the current options.
    pub fn options(&self) -> SerializationOptions {
        SerializationOptions::clone(&lock(&self.shared.options).options)
    }

    /// Changes the options.
    ///
    /// Fails with [`ConfigurationFrozen`](MessagePackError::ConfigurationFrozen)
    /// once a serializer has been built or handed out, or while one is being built.
    pub fn configure(&self, f: impl FnOnce(&mut SerializationOptions)) -> Result<()> {
        let mut state = lock(&self.shared.options);
        if state.frozen {
            return Err(MessagePackError::ConfigurationFrozen);
        }
        f(Arc::make_mut(&mut state.options));
        Ok(())
    }

    #[inline]
    pub fn is_frozen(&self) -> bool {
        lock(&self.shared.options).frozen
    }

    /// Freezes the options and returns them.
    pub(crate) fn freeze(&self) -> Arc<SerializationOptions> {
        let mut state = lock(&self.shared.options);
        if !state.frozen {
            state.frozen = true;
            debug!(options = ?state.options, "serialization options frozen");
        }
        Arc::clone(&state.options)
    }

    // -------------------------------------------------------------------------
    // Serializers

    /// Returns the serializer for `T`, building it on first request.
    ///
    /// Safe to call from many threads at once; all of them receive the same
    /// serializer. Build errors are returned and not cached.
    pub fn get_serializer<T: MessagePackType>(&self) -> Result<Serializer<T>> {
        let inner = self.resolve(Type::of::<T>(), T::type_descriptor, None)?;
        Ok(Serializer::new(inner, self.freeze()))
    }

    /// Returns the serializer for `T` under a polymorphism schema.
    ///
    /// Schemas with the same content share one serializer.
    pub fn get_serializer_with_schema<T: MessagePackType>(
        &self,
        schema: impl Into<Arc<PolymorphismSchema>>,
    ) -> Result<Serializer<T>> {
        let schema = schema.into();
        let inner = self.resolve(Type::of::<T>(), T::type_descriptor, Some(&schema))?;
        Ok(Serializer::new(inner, self.freeze()))
    }

    /// Installs a hand-written serializer for `T` unless one is already
    /// cached. Returns `true` if it was installed.
    ///
    /// Serializers built later that nest `T` use it.
    pub fn register<T: 'static, S: MessagePackSerializer<T>>(&self, serializer: S) -> bool {
        self.shared.registry.try_insert(
            SerializerKey::new(TypeId::of::<T>(), None),
            Arc::new(CustomSerializer::<T, S>::new(serializer)),
        )
    }

    /// Installs a hand-written serializer for `T`, replacing any cached one.
    ///
    /// Serializers already built may have captured the replaced one, so this
    /// is refused once the context is frozen.
    pub fn register_override<T: 'static, S: MessagePackSerializer<T>>(&self, serializer: S) -> Result<()> {
        let state = lock(&self.shared.options);
        if state.frozen {
            return Err(MessagePackError::ConfigurationFrozen);
        }
        self.shared.registry.insert(
            SerializerKey::new(TypeId::of::<T>(), None),
            Arc::new(CustomSerializer::<T, S>::new(serializer)),
        );
        Ok(())
    }

    /// Entry point for nested lookups made by serializer builders.
    pub(crate) fn resolve(
        &self,
        ty: Type,
        descriptor: fn() -> TypeDescriptor,
        schema: Option<&Arc<PolymorphismSchema>>,
    ) -> Result<Arc<dyn ErasedSerializer>> {
        self.shared.registry.resolve(self, ty, descriptor, schema)
    }

    #[cfg_attr(not(feature = "auto_register"), inline(always))]
    pub(crate) fn prebuilt(
        &self,
        type_id: TypeId,
        schema: Option<&Arc<PolymorphismSchema>>,
        options: &SerializationOptions,
    ) -> Option<Arc<dyn ErasedSerializer>> {
        #[cfg(feature = "auto_register")]
        if schema.is_none() {
            return crate::context::prebuilt::lookup(type_id).map(|build| build(options));
        }
        #[cfg(not(feature = "auto_register"))]
        let _ = (type_id, schema, options);
        None
    }

    // -------------------------------------------------------------------------
    // Process-wide default

    /// The process-wide default context, created with default options on
    /// first use.
    pub fn global() -> Self {
        if let Some(context) = GLOBAL.read().unwrap_or_else(PoisonError::into_inner).as_ref() {
            return context.clone();
        }
        GLOBAL
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert_with(Self::new)
            .clone()
    }

    /// Replaces the process-wide default, returning the previous one.
    ///
    /// Serializers obtained from the previous context keep working.
    pub fn set_global(context: Self) -> Self {
        let previous = GLOBAL
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(context);
        previous.unwrap_or_default()
    }

    /// Switches the process-wide default to [`SerializationOptions::classic`].
    ///
    /// Fails with [`ConfigurationFrozen`](MessagePackError::ConfigurationFrozen)
    /// if the default context has already been used.
    pub fn configure_classic() -> Result<()> {
        Self::global().configure(|options| *options = SerializationOptions::classic())
    }
}

static GLOBAL: RwLock<Option<SerializationContext>> = RwLock::new(None);

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::sync::Arc;
    use alloc::vec;
    use alloc::vec::Vec;
    use std::thread;

    use super::SerializationContext;
    use crate::codec::{DynPacker, DynUnpacker, PackerCompatibilityOptions};
    use crate::context::{SerializationMethod, SerializationOptions};
    use crate::error::{MessagePackError, Result};
    use crate::impl_message_pack_object;
    use crate::serializer::MessagePackSerializer;

    #[derive(Default, Debug, PartialEq)]
    struct Tree {
        value: i32,
        children: Vec<Tree>,
    }
    impl_message_pack_object!(Tree { value: i32 = 0, children: Vec<Tree> = 1 });

    #[derive(Default)]
    struct Clashing {
        a: u8,
        b: u8,
    }
    impl_message_pack_object!(Clashing { a: u8 = 0, b: u8 = 0 });

    #[test]
    fn configure_then_freeze() {
        let context = SerializationContext::new();
        assert!(!context.is_frozen());
        context
            .configure(|o| o.serialization_method = SerializationMethod::Map)
            .unwrap();
        assert_eq!(context.options().serialization_method, SerializationMethod::Map);

        context.get_serializer::<u8>().unwrap();
        assert!(context.is_frozen());
        assert!(matches!(
            context.configure(|o| o.max_depth = 1),
            Err(MessagePackError::ConfigurationFrozen)
        ));
        assert_eq!(context.options().max_depth, SerializationOptions::default().max_depth);
    }

    #[test]
    fn one_serializer_per_type() {
        let context = SerializationContext::new();
        let a = context.get_serializer::<Vec<String>>().unwrap();
        let b = context.get_serializer::<Vec<String>>().unwrap();
        assert!(Arc::ptr_eq(a.erased(), b.erased()));

        let other = SerializationContext::new();
        let c = other.get_serializer::<Vec<String>>().unwrap();
        assert!(!Arc::ptr_eq(a.erased(), c.erased()));
    }

    #[test]
    fn concurrent_requests_share_one_build() {
        let context = SerializationContext::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let context = context.clone();
                thread::spawn(move || context.get_serializer::<Tree>().unwrap())
            })
            .collect();
        let serializers: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for s in &serializers[1..] {
            assert!(Arc::ptr_eq(serializers[0].erased(), s.erased()));
        }
    }

    #[test]
    fn recursive_type_round_trip() {
        let context = SerializationContext::new();
        let serializer = context.get_serializer::<Tree>().unwrap();
        let tree = Tree {
            value: 1,
            children: vec![
                Tree { value: 2, children: vec![] },
                Tree {
                    value: 3,
                    children: vec![Tree { value: 4, children: vec![] }],
                },
            ],
        };
        let bytes = serializer.pack_single_object(&tree).unwrap();
        assert_eq!(&bytes[..4], [0x92, 0x01, 0x92, 0x92]);
        assert_eq!(serializer.unpack_single_object(&bytes).unwrap(), tree);
    }

    #[test]
    fn failed_build_is_not_cached() {
        let context = SerializationContext::new();
        for _ in 0..2 {
            let err = context.get_serializer::<Clashing>().unwrap_err();
            assert!(matches!(err, MessagePackError::SchemaViolation { .. }));
        }
        assert_eq!(context.shared.registry.len(), 0);
    }

    struct Hex;

    impl MessagePackSerializer<u32> for Hex {
        fn pack_to(&self, packer: &mut DynPacker<'_>, value: &u32) -> Result<()> {
            packer.pack_str(&alloc::format!("{value:x}"))
        }

        fn unpack_from(&self, unpacker: &mut DynUnpacker<'_>) -> Result<u32> {
            let text = unpacker.read_str()?;
            u32::from_str_radix(&text, 16).map_err(|_| MessagePackError::mismatch("String", "u32"))
        }
    }

    #[test]
    fn registered_serializers_are_nested() {
        let context = SerializationContext::new();
        assert!(context.register::<u32, _>(Hex));
        assert!(!context.register::<u32, _>(Hex));

        let serializer = context.get_serializer::<Vec<u32>>().unwrap();
        let bytes = serializer.pack_single_object(&vec![255]).unwrap();
        assert_eq!(bytes, [0x91, 0xa2, b'f', b'f']);
        assert_eq!(serializer.unpack_single_object(&bytes).unwrap(), vec![255]);

        assert!(matches!(
            context.register_override::<u32, _>(Hex),
            Err(MessagePackError::ConfigurationFrozen)
        ));
    }

    #[test]
    fn global_context() {
        let replacement = SerializationContext::new();
        let previous = SerializationContext::set_global(replacement);
        SerializationContext::configure_classic().unwrap();
        assert_eq!(
            SerializationContext::global().options().compatibility,
            PackerCompatibilityOptions::CLASSIC
        );

        let serializer = SerializationContext::global().get_serializer::<String>().unwrap();
        assert_eq!(serializer.pack_single_object(&"a".into()).unwrap(), [0xa1, b'a']);
        assert!(SerializationContext::configure_classic().is_err());

        SerializationContext::set_global(previous);
    }

    #[cfg(feature = "auto_register")]
    mod prebuilt {
        use crate::codec::{DynPacker, DynUnpacker};
        use crate::context::{SerializationContext, SerializationOptions};
        use crate::error::Result;
        use crate::serializer::MessagePackSerializer;
        use crate::{impl_message_pack_object, submit_prebuilt};

        #[derive(Default, Debug, PartialEq)]
        struct Celsius {
            degrees: f64,
        }
        impl_message_pack_object!(Celsius { degrees: f64 });

        struct Bare;

        impl MessagePackSerializer<Celsius> for Bare {
            fn pack_to(&self, packer: &mut DynPacker<'_>, value: &Celsius) -> Result<()> {
                packer.pack_f64(value.degrees)
            }

            fn unpack_from(&self, unpacker: &mut DynUnpacker<'_>) -> Result<Celsius> {
                Ok(Celsius {
                    degrees: unpacker.read_f64()?,
                })
            }
        }

        fn bare(_: &SerializationOptions) -> Bare {
            Bare
        }

        submit_prebuilt!(Celsius, bare);

        #[test]
        fn prebuilt_serializer_replaces_builder() {
            let context = SerializationContext::new();
            let serializer = context.get_serializer::<Celsius>().unwrap();
            let bytes = serializer.pack_single_object(&Celsius { degrees: 0.5 }).unwrap();
            assert_eq!(bytes[0], 0xcb);
            assert_eq!(
                serializer.unpack_single_object(&bytes).unwrap(),
                Celsius { degrees: 0.5 }
            );
        }
    }
}
