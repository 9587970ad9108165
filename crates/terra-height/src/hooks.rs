//! Ordered callback registry.
//!
//! Hooks run in subscription order. Each subscription gets a [`HookId`] that
//! stays valid until it is unsubscribed; ids are never reused within a list.

/// Handle returned by [`HookList::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HookId(u64);

impl HookId {
    /// Raw numeric value, for logging.
    #[inline]
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// An ordered list of boxed hooks of type `T` (usually a `dyn Trait`).
pub struct HookList<T: ?Sized> {
    entries: Vec<(HookId, Box<T>)>,
    next_id: u64,
}

impl<T: ?Sized> Default for HookList<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }
}

impl<T: ?Sized> HookList<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook; it runs after every hook already registered.
    pub fn subscribe(&mut self, hook: Box<T>) -> HookId {
        let id = HookId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, hook));
        id
    }

    /// Remove a hook. Returns `false` if `id` is not registered here.
    pub fn unsubscribe(&mut self, id: HookId) -> bool {
        match self.entries.iter().position(|(e, _)| *e == id) {
            Some(i) => {
                self.entries.remove(i);
                true
            }
            None => false,
        }
    }

    /// Swap the hook behind `id` in place, keeping its position in the order.
    pub fn replace(&mut self, id: HookId, hook: Box<T>) -> bool {
        match self.entries.iter_mut().find(|(e, _)| *e == id) {
            Some(entry) => {
                entry.1 = hook;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn contains(&self, id: HookId) -> bool {
        self.entries.iter().any(|(e, _)| *e == id)
    }

    /// Hooks in invocation order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, h)| h.as_ref())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
