use std::rc::{Rc, Weak};

pub type FxIndexMap<K, V> = indexmap::IndexMap<K, V, rustc_hash::FxBuildHasher>;

pub fn fx_hashmap_with_capacity<K, V>(capacity: usize) -> rustc_hash::FxHashMap<K, V> {
    let hasher = rustc_hash::FxBuildHasher;
    rustc_hash::FxHashMap::with_capacity_and_hasher(capacity, hasher)
}

pub fn fx_indexmap_with_capacity<K, V>(capacity: usize) -> FxIndexMap<K, V> {
    let hasher = rustc_hash::FxBuildHasher;
    FxIndexMap::with_capacity_and_hasher(capacity, hasher)
}

/// Identity of a reference-counted allocation.
///
/// Two handles produce the same key iff they point into the same `Rc`
/// allocation, regardless of what the pointee compares equal to. A `Weak`
/// keeps the allocation (not the value) alive, so a key derived from a
/// `Weak` that is still held can never be reused by another object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjKey(usize);

impl ObjKey {
    #[inline]
    pub fn of<T: ?Sized>(rc: &Rc<T>) -> Self {
        ObjKey(Rc::as_ptr(rc).cast::<()>() as usize)
    }

    #[inline]
    pub fn of_weak<T: ?Sized>(weak: &Weak<T>) -> Self {
        ObjKey(weak.as_ptr().cast::<()>() as usize)
    }

    #[inline]
    pub const fn as_usize(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for ObjKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "obj@{:#x}", self.0)
    }
}
