use std::iter::FusedIterator;
use std::rc::Rc;

use crate::slot::{Slot, SlotSeq};

/// Forward cursor over the live children of one parent.
///
/// Holds its own handle to the child list plus the length it had when the
/// cursor was created, so children detached mid-walk are skipped and
/// children appended mid-walk are not visited. Compacting or sorting the
/// list while a cursor is in flight is a caller error: the cursor may then
/// skip or repeat children, but it still terminates.
pub struct ChildIter<T: ?Sized> {
    seq: Option<SlotSeq<T>>,
    pos: usize,
    end: usize,
}

impl<T: ?Sized> ChildIter<T> {
    pub(crate) fn new(seq: Option<SlotSeq<T>>) -> Self {
        let end = seq.as_ref().map_or(0, |seq| seq.borrow().len());
        Self { seq, pos: 0, end }
    }
}

impl<T: ?Sized> Iterator for ChildIter<T> {
    type Item = Rc<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let seq = self.seq.as_ref()?;
        let slots = seq.borrow();
        while self.pos < self.end {
            let Some(slot) = slots.get(self.pos) else {
                // shrunk under us
                self.pos = self.end;
                break;
            };
            self.pos += 1;
            if let Slot::Live(child) = slot {
                return Some(Rc::clone(child));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.end - self.pos))
    }
}

impl<T: ?Sized> FusedIterator for ChildIter<T> {}

/// Yields nothing.
impl<T: ?Sized> Default for ChildIter<T> {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Read-only view of a parent's internal child list, tombstones included.
///
/// Every accessor borrows the list only for the duration of the call.
pub struct ChildSlots<T: ?Sized> {
    seq: SlotSeq<T>,
}

impl<T: ?Sized> ChildSlots<T> {
    pub(crate) fn new(seq: SlotSeq<T>) -> Self {
        Self { seq }
    }

    /// Number of slots, live or tombstoned.
    pub fn len(&self) -> usize {
        self.seq.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.borrow().is_empty()
    }

    /// The child at `index`, or `None` for a tombstone or out of range.
    pub fn get(&self, index: usize) -> Option<Rc<T>> {
        self.seq.borrow().get(index)?.as_live().cloned()
    }

    pub fn is_tombstone(&self, index: usize) -> bool {
        self.seq.borrow().get(index).is_some_and(Slot::is_tombstone)
    }

    pub fn tombstones(&self) -> usize {
        self.seq.borrow().iter().filter(|s| s.is_tombstone()).count()
    }

    pub fn snapshot(&self) -> Vec<Slot<T>> {
        self.seq.borrow().clone()
    }

    pub fn iter(&self) -> ChildIter<T> {
        ChildIter::new(Some(Rc::clone(&self.seq)))
    }

    /// Whether both views are onto the same internal list.
    pub fn same_list(&self, other: &ChildSlots<T>) -> bool {
        Rc::ptr_eq(&self.seq, &other.seq)
    }
}

impl<T: ?Sized> Clone for ChildSlots<T> {
    fn clone(&self) -> Self {
        Self {
            seq: Rc::clone(&self.seq),
        }
    }
}

impl<T: ?Sized> std::fmt::Debug for ChildSlots<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.seq.borrow().iter()).finish()
    }
}
