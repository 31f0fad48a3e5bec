//! Generational object pool backing enemies, projectiles and coin effects.

use gate_defence_core::Handle;

/// Entity that can be recycled by a [`Pool`].
pub trait Poolable: Default {
    /// Arguments used to configure a recycled or freshly created instance.
    type Args;

    /// Configures the instance for a new activation.
    fn reset(&mut self, args: Self::Args);

    /// Releases per-activation resources before the instance goes idle.
    fn clean(&mut self) {}
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    active: bool,
    value: T,
}

/// Reuses instances of a single type across activations.
///
/// Activation hands out generational [`Handle`]s. Releasing an instance bumps
/// its slot generation, so stale handles stop resolving and the same instance
/// is never both active and idle.
#[derive(Debug)]
pub struct Pool<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    active: Vec<Handle>,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            active: Vec::new(),
        }
    }
}

impl<T: Poolable> Pool<T> {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Activates an idle instance, creating one when none is idle.
    pub fn get(&mut self, args: T::Args) -> Handle {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    active: false,
                    value: T::default(),
                });
                u32::try_from(self.slots.len() - 1).unwrap_or(u32::MAX)
            }
        };

        let slot = &mut self.slots[index as usize];
        slot.value.reset(args);
        slot.active = true;

        let handle = Handle::new(index, slot.generation);
        self.active.push(handle);
        handle
    }

    /// Returns an active instance to the idle set.
    ///
    /// Returns `false` for stale or unknown handles, which leaves the pool
    /// untouched.
    pub fn put(&mut self, handle: Handle) -> bool {
        let Some(slot) = self.slot_mut(handle) else {
            return false;
        };
        slot.value.clean();
        slot.active = false;
        slot.generation = slot.generation.wrapping_add(1);

        self.free.push(handle.index());
        self.active.retain(|active| *active != handle);
        true
    }

    /// Resolves a handle to its active instance.
    #[must_use]
    pub fn resolve(&self, handle: Handle) -> Option<&T> {
        self.slots
            .get(handle.index() as usize)
            .filter(|slot| slot.active && slot.generation == handle.generation())
            .map(|slot| &slot.value)
    }

    /// Resolves a handle to its active instance for mutation.
    pub fn resolve_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slot_mut(handle).map(|slot| &mut slot.value)
    }

    /// Handles of every active instance in activation order.
    #[must_use]
    pub fn handles(&self) -> Vec<Handle> {
        self.active.clone()
    }

    /// Iterates active instances in activation order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> + '_ {
        self.active
            .iter()
            .filter_map(|&handle| self.resolve(handle).map(|value| (handle, value)))
    }

    /// Number of active instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Reports whether no instance is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Number of idle instances ready for reuse.
    #[must_use]
    pub fn idle_len(&self) -> usize {
        self.free.len()
    }

    fn slot_mut(&mut self, handle: Handle) -> Option<&mut Slot<T>> {
        self.slots
            .get_mut(handle.index() as usize)
            .filter(|slot| slot.active && slot.generation == handle.generation())
    }
}
