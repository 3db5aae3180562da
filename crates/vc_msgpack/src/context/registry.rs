use alloc::boxed::Box;
use alloc::sync::{Arc, Weak};
use core::any::{Any, TypeId};
use core::cell::Cell;
use std::sync::{Condvar, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread::{self, ThreadId};

use tracing::{debug, trace};
use vc_utils::hash::HashMap;

use crate::builder::SerializerBuilder;
use crate::codec::{DynPacker, DynUnpacker};
use crate::context::{ContextShared, SerializationContext};
use crate::error::{MessagePackError, Result};
use crate::info::{Type, TypeDescriptor};
use crate::polymorphism::{PolymorphismSchema, SchemaKey};
use crate::serializer::ErasedSerializer;

#[inline]
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

thread_local! {
    // Number of builds running on this thread, outermost included.
    static BUILD_DEPTH: Cell<usize> = const { Cell::new(0) };
}

#[inline]
fn building_on_this_thread() -> bool {
    BUILD_DEPTH.with(|depth| depth.get() > 0)
}

// -----------------------------------------------------------------------------
// Slots

/// Cache key: the target type plus the content of its polymorphism schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct SerializerKey {
    type_id: TypeId,
    schema: Option<SchemaKey>,
}

impl SerializerKey {
    #[inline]
    pub(crate) fn new(type_id: TypeId, schema: Option<&Arc<PolymorphismSchema>>) -> Self {
        Self {
            type_id,
            schema: schema.map(|s| s.key().clone()),
        }
    }
}

enum SlotState {
    Building { owner: ThreadId },
    Ready(Arc<dyn ErasedSerializer>),
    Failed,
}

/// One cache entry. It moves from `Building` to `Ready` or `Failed` exactly once.
pub(crate) struct SerializerSlot {
    state: Mutex<SlotState>,
    settled: Condvar,
}

impl SerializerSlot {
    fn building() -> Self {
        Self {
            state: Mutex::new(SlotState::Building {
                owner: thread::current().id(),
            }),
            settled: Condvar::new(),
        }
    }

    fn ready(serializer: Arc<dyn ErasedSerializer>) -> Self {
        Self {
            state: Mutex::new(SlotState::Ready(serializer)),
            settled: Condvar::new(),
        }
    }

    fn settle(&self, state: SlotState) {
        *lock(&self.state) = state;
        self.settled.notify_all();
    }
}

enum Lookup {
    Ready(Arc<dyn ErasedSerializer>),
    Forward,
    Retry,
}

impl SerializerSlot {
    /// Blocks until the slot settles, unless waiting could deadlock, in
    /// which case the caller must take a forward reference.
    fn wait(&self) -> Lookup {
        let mut state = lock(&self.state);
        loop {
            let owner = match &*state {
                SlotState::Ready(serializer) => return Lookup::Ready(Arc::clone(serializer)),
                SlotState::Failed => return Lookup::Retry,
                SlotState::Building { owner } => *owner,
            };
            if owner == thread::current().id() || building_on_this_thread() {
                return Lookup::Forward;
            }
            state = self
                .settled
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

// -----------------------------------------------------------------------------
// SerializerRegistry

/// The two-phase slot table behind a [`SerializationContext`].
///
/// A slot is published in the `Building` state before its builder runs.
/// Requests for that slot from inside the build receive a
/// [`LazySerializer`] that points at the slot, which is how recursive types
/// terminate. Top-level requests from other threads wait for the slot to
/// settle. A failed build removes its slot, so the next request builds again.
pub(crate) struct SerializerRegistry {
    slots: Mutex<HashMap<SerializerKey, Arc<SerializerSlot>>>,
}

impl SerializerRegistry {
    pub(crate) fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::default()),
        }
    }

    /// Installs a ready serializer unless the key is taken.
    pub(crate) fn try_insert(&self, key: SerializerKey, serializer: Arc<dyn ErasedSerializer>) -> bool {
        let mut slots = lock(&self.slots);
        if slots.contains_key(&key) {
            return false;
        }
        slots.insert(key, Arc::new(SerializerSlot::ready(serializer)));
        true
    }

    /// Installs a ready serializer, replacing whatever the key held.
    pub(crate) fn insert(&self, key: SerializerKey, serializer: Arc<dyn ErasedSerializer>) {
        lock(&self.slots).insert(key, Arc::new(SerializerSlot::ready(serializer)));
    }

    pub(crate) fn len(&self) -> usize {
        lock(&self.slots).len()
    }

    /// Returns the serializer for `ty`, building it on a miss.
    pub(crate) fn resolve(
        &self,
        context: &SerializationContext,
        ty: Type,
        descriptor: fn() -> TypeDescriptor,
        schema: Option<&Arc<PolymorphismSchema>>,
    ) -> Result<Arc<dyn ErasedSerializer>> {
        let key = SerializerKey::new(ty.id(), schema);
        loop {
            let (slot, owned) = {
                let mut slots = lock(&self.slots);
                match slots.get(&key) {
                    Some(slot) => (Arc::clone(slot), false),
                    None => {
                        let slot = Arc::new(SerializerSlot::building());
                        slots.insert(key.clone(), Arc::clone(&slot));
                        (slot, true)
                    }
                }
            };

            if owned {
                return self.build(context, key, &slot, ty, descriptor, schema);
            }

            match slot.wait() {
                Lookup::Ready(serializer) => {
                    trace!(type_name = ty.name(), "serializer cache hit");
                    return Ok(serializer);
                }
                Lookup::Forward => {
                    trace!(type_name = ty.name(), "forward reference to serializer under construction");
                    return Ok(Arc::new(LazySerializer {
                        target: ty,
                        slot: Arc::downgrade(&slot),
                        resolved: OnceLock::new(),
                        context: Arc::downgrade(&context.shared),
                        descriptor,
                        schema: schema.cloned(),
                    }));
                }
                Lookup::Retry => continue,
            }
        }
    }

    fn build(
        &self,
        context: &SerializationContext,
        key: SerializerKey,
        slot: &Arc<SerializerSlot>,
        ty: Type,
        descriptor: fn() -> TypeDescriptor,
        schema: Option<&Arc<PolymorphismSchema>>,
    ) -> Result<Arc<dyn ErasedSerializer>> {
        let mut guard = BuildGuard::enter(self, key, slot);

        let options = context.freeze();
        debug!(type_name = ty.name(), schema = schema.is_some(), "building serializer");

        let result = match context.prebuilt(ty.id(), schema, &options) {
            Some(serializer) => Ok(serializer),
            None => SerializerBuilder::new(context, &options).build(&descriptor(), schema),
        };

        match result {
            Ok(serializer) => {
                guard.slot.settle(SlotState::Ready(Arc::clone(&serializer)));
                guard.published = true;
                debug!(type_name = ty.name(), "serializer ready");
                Ok(serializer)
            }
            Err(error) => {
                debug!(type_name = ty.name(), %error, "serializer build failed");
                Err(error)
            }
        }
    }
}

// Counts the build in `BUILD_DEPTH` while alive. On drop, removes the slot
// and wakes waiters unless the build published a serializer; this also runs
// when a builder panics.
struct BuildGuard<'a> {
    registry: &'a SerializerRegistry,
    key: SerializerKey,
    slot: &'a Arc<SerializerSlot>,
    published: bool,
}

impl<'a> BuildGuard<'a> {
    fn enter(registry: &'a SerializerRegistry, key: SerializerKey, slot: &'a Arc<SerializerSlot>) -> Self {
        BUILD_DEPTH.with(|depth| depth.set(depth.get() + 1));
        Self {
            registry,
            key,
            slot,
            published: false,
        }
    }
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        BUILD_DEPTH.with(|depth| depth.set(depth.get() - 1));
        if self.published {
            return;
        }
        {
            let mut slots = lock(&self.registry.slots);
            if let Some(current) = slots.get(&self.key)
                && Arc::ptr_eq(current, self.slot)
            {
                slots.remove(&self.key);
            }
        }
        self.slot.settle(SlotState::Failed);
    }
}

// -----------------------------------------------------------------------------
// LazySerializer

/// A forward reference to a serializer that was still being built when it
/// was requested.
///
/// Holds the slot weakly, so a recursive type's serializer does not keep
/// itself alive. If the referenced build failed, the lazy serializer asks the
/// context again on first use, which either rebuilds or reports the error.
pub(crate) struct LazySerializer {
    target: Type,
    slot: Weak<SerializerSlot>,
    resolved: OnceLock<Weak<dyn ErasedSerializer>>,
    context: Weak<ContextShared>,
    descriptor: fn() -> TypeDescriptor,
    schema: Option<Arc<PolymorphismSchema>>,
}

impl LazySerializer {
    fn get(&self) -> Result<Arc<dyn ErasedSerializer>> {
        if let Some(serializer) = self.resolved.get().and_then(Weak::upgrade) {
            return Ok(serializer);
        }

        if let Some(slot) = self.slot.upgrade() {
            match slot.wait() {
                Lookup::Ready(serializer) => {
                    let _ = self.resolved.set(Arc::downgrade(&serializer));
                    return Ok(serializer);
                }
                Lookup::Forward => {
                    return Err(MessagePackError::schema(
                        self.target.name(),
                        "serializer used before its construction finished",
                    ));
                }
                Lookup::Retry => {}
            }
        }

        let shared = self.context.upgrade().ok_or_else(|| {
            MessagePackError::schema(self.target.name(), "serialization context was dropped")
        })?;
        SerializationContext { shared }.resolve(self.target, self.descriptor, self.schema.as_ref())
    }
}

impl ErasedSerializer for LazySerializer {
    #[inline]
    fn target(&self) -> Type {
        self.target
    }

    fn pack_erased(&self, packer: &mut DynPacker<'_>, value: &dyn Any) -> Result<()> {
        self.get()?.pack_erased(packer, value)
    }

    fn unpack_erased(&self, unpacker: &mut DynUnpacker<'_>) -> Result<Box<dyn Any>> {
        self.get()?.unpack_erased(unpacker)
    }
}
