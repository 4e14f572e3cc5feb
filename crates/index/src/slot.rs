use std::cell::RefCell;
use std::rc::Rc;

use kinship_utils::ObjKey;

/// One position in a child list.
pub enum Slot<T: ?Sized> {
    Live(Rc<T>),
    /// A child used to sit here and has been detached, but the list has
    /// not been compacted yet.
    Tombstone,
}

pub(crate) type SlotSeq<T> = Rc<RefCell<Vec<Slot<T>>>>;

pub(crate) fn new_seq<T: ?Sized>() -> SlotSeq<T> {
    Rc::new(RefCell::new(Vec::new()))
}

impl<T: ?Sized> Slot<T> {
    #[inline]
    pub fn is_tombstone(&self) -> bool {
        matches!(self, Slot::Tombstone)
    }

    #[inline]
    pub fn as_live(&self) -> Option<&Rc<T>> {
        match self {
            Slot::Live(child) => Some(child),
            Slot::Tombstone => None,
        }
    }

    #[inline]
    pub fn into_live(self) -> Option<Rc<T>> {
        match self {
            Slot::Live(child) => Some(child),
            Slot::Tombstone => None,
        }
    }

    #[inline]
    pub(crate) fn holds(&self, key: ObjKey) -> bool {
        self.as_live().is_some_and(|child| ObjKey::of(child) == key)
    }
}

impl<T: ?Sized> Clone for Slot<T> {
    fn clone(&self) -> Self {
        match self {
            Slot::Live(child) => Slot::Live(Rc::clone(child)),
            Slot::Tombstone => Slot::Tombstone,
        }
    }
}

impl<T: ?Sized> std::fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Slot::Live(child) => write!(f, "Live({})", ObjKey::of(child)),
            Slot::Tombstone => write!(f, "Tombstone"),
        }
    }
}
