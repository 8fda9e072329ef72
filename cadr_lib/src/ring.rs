//! Fixed capacity circular storage.
//!
//! The same structure backs the micro-subroutine stack, the PDL and the
//! history rings: every index handed to it wraps to the capacity, it never
//! faults.

/// A ring of `N` slots with a head pointer.
///
/// Two disciplines are offered on top of the head:
/// - stack: `push` advances the head then stores, `pop` loads then retreats;
/// - history: `record` stores at the head then advances, so the head always
///   points at the oldest entry.
#[derive(Clone, PartialEq, Eq)]
pub struct Ring<T, const N: usize> {
    slots: Vec<T>,
    head: usize,
}

impl<T: Copy + Default, const N: usize> Default for Ring<T, N> {
    fn default() -> Self {
        Self {
            slots: vec![T::default(); N],
            head: 0,
        }
    }
}

impl<T: Copy + Default, const N: usize> Ring<T, N> {
    pub const CAPACITY: usize = N;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn wrap(index: usize) -> usize {
        index % N
    }

    pub fn get(&self, index: usize) -> T {
        self.slots[Self::wrap(index)]
    }

    pub fn set(&mut self, index: usize, value: T) {
        self.slots[Self::wrap(index)] = value;
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn set_head(&mut self, head: usize) {
        self.head = Self::wrap(head);
    }

    /// Slot under the head pointer.
    pub fn top(&self) -> T {
        self.slots[self.head]
    }

    pub fn push(&mut self, value: T) {
        self.head = Self::wrap(self.head + 1);
        self.slots[self.head] = value;
    }

    pub fn pop(&mut self) -> T {
        let value = self.slots[self.head];
        self.head = Self::wrap(self.head + N - 1);

        value
    }

    pub fn record(&mut self, value: T) {
        self.slots[self.head] = value;
        self.head = Self::wrap(self.head + 1);
    }

    /// Most recent entry stored by `record`.
    pub fn latest(&self) -> T {
        self.slots[Self::wrap(self.head + N - 1)]
    }

    pub fn oldest_first(&self) -> impl Iterator<Item = T> + '_ {
        (0..N).map(move |i| self.slots[Self::wrap(self.head + i)])
    }

    pub fn as_slice(&self) -> &[T] {
        &self.slots
    }

    /// Replaces the content with `values` laid out from slot 0, the head is
    /// reset to 0. Missing trailing slots are cleared.
    pub fn load(&mut self, values: &[T]) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            *slot = values.get(i).copied().unwrap_or_default();
        }
        self.head = 0;
    }
}
