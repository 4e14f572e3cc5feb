use std::rc::{Rc, Weak};

use kinship_utils::{FxIndexMap, ObjKey, fx_hashmap_with_capacity, fx_indexmap_with_capacity};
use rustc_hash::FxHashMap;

struct WeakEntry<T: ?Sized, V> {
    key: Weak<T>,
    value: V,
}

/// Identity-keyed map that does not own its keys.
///
/// An entry whose key has been dropped stays in the map (unreachable
/// through any live handle) until the next [`WeakKeyMap::sweep`].
pub(crate) struct WeakKeyMap<T: ?Sized, V> {
    inner: FxHashMap<ObjKey, WeakEntry<T, V>>,
}

impl<T: ?Sized, V> WeakKeyMap<T, V> {
    pub(crate) fn with_capacity(cap: usize) -> Self {
        Self {
            inner: fx_hashmap_with_capacity(cap),
        }
    }

    #[inline]
    pub(crate) fn get(&self, key: ObjKey) -> Option<&V> {
        self.inner.get(&key).map(|e| &e.value)
    }

    #[inline]
    pub(crate) fn contains(&self, key: ObjKey) -> bool {
        self.inner.contains_key(&key)
    }

    pub(crate) fn insert(&mut self, obj: &Rc<T>, value: V) -> Option<V> {
        let entry = WeakEntry {
            key: Rc::downgrade(obj),
            value,
        };
        self.inner.insert(ObjKey::of(obj), entry).map(|e| e.value)
    }

    pub(crate) fn get_or_insert_with(&mut self, obj: &Rc<T>, f: impl FnOnce() -> V) -> &mut V {
        &mut self
            .inner
            .entry(ObjKey::of(obj))
            .or_insert_with(|| WeakEntry {
                key: Rc::downgrade(obj),
                value: f(),
            })
            .value
    }

    #[inline]
    pub(crate) fn remove(&mut self, key: ObjKey) -> Option<V> {
        self.inner.remove(&key).map(|e| e.value)
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.inner.len()
    }

    /// Drops every entry whose key is gone or whose value `keep` rejects,
    /// handing the removed values back.
    pub(crate) fn sweep(&mut self, mut keep: impl FnMut(&V) -> bool) -> Vec<V> {
        let dead = self
            .inner
            .iter()
            .filter(|(_, e)| e.key.strong_count() == 0 || !keep(&e.value))
            .map(|(key, _)| *key)
            .collect::<Vec<_>>();
        dead.into_iter()
            .filter_map(|key| self.remove(key))
            .collect()
    }
}

/// Insertion-ordered identity set that does not own its members.
pub(crate) struct WeakKeySet<T: ?Sized> {
    inner: FxIndexMap<ObjKey, Weak<T>>,
}

impl<T: ?Sized> WeakKeySet<T> {
    pub(crate) fn with_capacity(cap: usize) -> Self {
        Self {
            inner: fx_indexmap_with_capacity(cap),
        }
    }

    pub(crate) fn insert(&mut self, member: &Weak<T>) -> bool {
        let key = ObjKey::of_weak(member);
        if self.inner.contains_key(&key) {
            return false;
        }
        self.inner.insert(key, Weak::clone(member));
        true
    }

    /// O(len): `shift_remove` keeps the insertion order that bulk
    /// compaction walks in, so do not switch to `swap_remove`.
    #[inline]
    pub(crate) fn remove(&mut self, key: ObjKey) -> bool {
        self.inner.shift_remove(&key).is_some()
    }

    #[inline]
    pub(crate) fn contains(&self, key: ObjKey) -> bool {
        self.inner.contains_key(&key)
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.inner.len()
    }

    /// Empties the set, returning its keys in insertion order.
    pub(crate) fn take(&mut self) -> Vec<ObjKey> {
        self.inner.drain(..).map(|(key, _)| key).collect()
    }

    pub(crate) fn sweep(&mut self) -> usize {
        let before = self.inner.len();
        self.inner.retain(|_, member| member.strong_count() > 0);
        before - self.inner.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_drops_dead_keys() {
        let mut map = WeakKeyMap::with_capacity(4);
        let a = Rc::new("a");
        let b = Rc::new("b");
        map.insert(&a, 1);
        map.insert(&b, 2);
        let key_b = ObjKey::of(&b);
        drop(b);
        // still there until a pass runs
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(key_b), Some(&2));

        assert_eq!(map.sweep(|_| true), vec![2]);
        assert_eq!(map.len(), 1);
        assert!(!map.contains(key_b));
        assert_eq!(map.get(ObjKey::of(&a)), Some(&1));
    }

    #[test]
    fn test_sweep_respects_value_filter() {
        let mut map = WeakKeyMap::with_capacity(4);
        let a = Rc::new(0u8);
        let b = Rc::new(1u8);
        map.insert(&a, 10);
        map.insert(&b, 20);
        assert_eq!(map.sweep(|v| *v != 20), vec![20]);
        assert!(map.contains(ObjKey::of(&a)));
    }

    #[test]
    fn test_set_keeps_insertion_order() {
        let objs = (0..4).map(Rc::new).collect::<Vec<_>>();
        let mut set = WeakKeySet::with_capacity(4);
        for obj in objs.iter().rev() {
            assert!(set.insert(&Rc::downgrade(obj)));
        }
        assert!(!set.insert(&Rc::downgrade(&objs[0])));
        assert!(set.remove(ObjKey::of(&objs[2])));
        let expected = [3, 1, 0].map(|i| ObjKey::of(&objs[i]));
        assert_eq!(set.take(), expected);
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn test_set_sweep() {
        let a = Rc::new(());
        let b = Rc::new(());
        let mut set = WeakKeySet::with_capacity(2);
        set.insert(&Rc::downgrade(&a));
        set.insert(&Rc::downgrade(&b));
        drop(a);
        assert_eq!(set.sweep(), 1);
        assert!(set.contains(ObjKey::of(&b)));
    }
}
