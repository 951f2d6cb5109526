//! Slot arena for externally-owned parse trees
//!
//! The pool is the only place a tree handle is ever released. Callers hold
//! `TreeSlot` indices; giving a slot back through `reclaim` moves the handle
//! out of the arena and releases it in the same step, so a released handle is
//! never reachable.

/// A parse tree whose underlying resource must be released explicitly
pub trait TreeHandle {
    /// Release the resource. Consumes the handle so it cannot be used again.
    fn release(self);
}

/// Index of an occupied slot in a `TreePool`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeSlot(usize);

/// Arena of tree handles with slot reuse
#[derive(Debug)]
pub struct TreePool<T: TreeHandle> {
    slots: Vec<Option<T>>,
    free: Vec<usize>,
    released: usize,
}

impl<T: TreeHandle> TreePool<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            released: 0,
        }
    }

    /// Take ownership of a handle and return its slot
    pub fn admit(&mut self, tree: T) -> TreeSlot {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(tree);
                TreeSlot(idx)
            }
            None => {
                self.slots.push(Some(tree));
                TreeSlot(self.slots.len() - 1)
            }
        }
    }

    pub fn get(&self, slot: TreeSlot) -> Option<&T> {
        self.slots.get(slot.0).and_then(|s| s.as_ref())
    }

    /// Remove the handle in `slot` and release it
    ///
    /// Returns false if the slot was already empty.
    pub fn reclaim(&mut self, slot: TreeSlot) -> bool {
        let Some(entry) = self.slots.get_mut(slot.0) else {
            return false;
        };
        match entry.take() {
            Some(tree) => {
                tree.release();
                self.free.push(slot.0);
                self.released += 1;
                true
            }
            None => false,
        }
    }

    /// Release every live handle. Returns how many were released.
    pub fn release_all(&mut self) -> usize {
        let mut count = 0;
        for entry in self.slots.iter_mut() {
            if let Some(tree) = entry.take() {
                tree.release();
                count += 1;
            }
        }
        self.slots.clear();
        self.free.clear();
        self.released += count;
        count
    }

    /// Number of handles currently held
    pub fn live(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Total releases performed over the pool's lifetime
    pub fn released(&self) -> usize {
        self.released
    }
}

impl<T: TreeHandle> Default for TreePool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TreeHandle> Drop for TreePool<T> {
    fn drop(&mut self) {
        self.release_all();
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::TreeHandle;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Handle that records its id in a shared log when released
    #[derive(Debug)]
    pub struct RecordingTree {
        pub id: u32,
        pub log: Rc<RefCell<Vec<u32>>>,
    }

    impl RecordingTree {
        pub fn new(id: u32, log: &Rc<RefCell<Vec<u32>>>) -> Self {
            Self {
                id,
                log: Rc::clone(log),
            }
        }
    }

    impl TreeHandle for RecordingTree {
        fn release(self) {
            self.log.borrow_mut().push(self.id);
        }
    }
}
