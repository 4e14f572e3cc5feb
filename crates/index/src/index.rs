use std::cmp::Ordering;
use std::rc::{Rc, Weak};

use kinship_config::IndexConfig;
use kinship_utils::ObjKey;

use crate::iter::{ChildIter, ChildSlots};
use crate::reclaim::Reclaimer;
use crate::slot::{Slot, SlotSeq, new_seq};
use crate::weak_map::{WeakKeyMap, WeakKeySet};

/// Entry counts of a [`RelationIndex`], including entries whose key is
/// already gone but which no sweep pass has removed yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub parent_entries: usize,
    pub child_lists: usize,
    pub pending_cleanup: usize,
    pub parked_lists: usize,
    pub passes: u64,
}

/// Child lists removed by a sweep pass.
///
/// Dropping this releases the index's strong references to the children
/// in those lists, which may run their destructors.
pub struct Reclaimed<T: ?Sized> {
    lists: Vec<SlotSeq<T>>,
}

impl<T: ?Sized> Reclaimed<T> {
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    pub fn lists(&self) -> usize {
        self.lists.len()
    }

    pub fn children(&self) -> usize {
        self.lists
            .iter()
            .map(|seq| seq.borrow().iter().filter(|s| !s.is_tombstone()).count())
            .sum()
    }
}

/// Parent/child relationships of `Rc<T>` objects, stored outside them.
///
/// - *parent of*: child → weak handle to its parent.
/// - *children of*: parent → ordered child list; detached children leave
///   a [`Slot::Tombstone`] until the list is compacted.
/// - *pending cleanup*: parents whose list holds at least one tombstone.
///
/// All three are keyed by allocation identity through weak handles. The
/// only strong references the index holds are to the live children in
/// each list.
pub struct RelationIndex<T: ?Sized> {
    parent_of: WeakKeyMap<T, Weak<T>>,
    children_of: WeakKeyMap<T, SlotSeq<T>>,
    pending: WeakKeySet<T>,
    reclaimer: Rc<Reclaimer>,
    config: IndexConfig,
    ops_since_pass: u32,
    park_reclaimed: bool,
    parked: Vec<SlotSeq<T>>,
}

impl<T: ?Sized> Default for RelationIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> RelationIndex<T> {
    pub fn new() -> Self {
        Self::with_config(IndexConfig::default())
    }

    pub fn with_config(config: IndexConfig) -> Self {
        let cap = *config.initial_capacity();
        Self {
            parent_of: WeakKeyMap::with_capacity(cap),
            children_of: WeakKeyMap::with_capacity(cap),
            pending: WeakKeySet::with_capacity(cap),
            reclaimer: Reclaimer::new(),
            config,
            ops_since_pass: 0,
            park_reclaimed: false,
            parked: Vec::new(),
        }
    }

    /// Keeps child lists removed by sweep passes until
    /// [`Self::take_reclaimed`] instead of dropping them inside the pass.
    ///
    /// For owners that must not run child destructors while they hold the
    /// index borrowed.
    pub fn parking_reclaimed(mut self) -> Self {
        self.park_reclaimed = true;
        self
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn reclaimer(&self) -> &Rc<Reclaimer> {
        &self.reclaimer
    }

    pub fn get_parent(&self, obj: &Rc<T>) -> Option<Rc<T>> {
        self.parent_of.get(ObjKey::of(obj)).and_then(Weak::upgrade)
    }

    /// Moves `obj` under `parent`, or detaches it when `parent` is `None`.
    ///
    /// The slot `obj` occupied in its old parent's list becomes a
    /// tombstone in place, and `obj` is appended to the end of the new
    /// parent's list. Nothing is compacted here.
    pub fn set_parent(&mut self, obj: &Rc<T>, parent: Option<&Rc<T>>) {
        let key = ObjKey::of(obj);
        let old = self.parent_of.get(key).cloned();
        if old.as_ref().map(ObjKey::of_weak) == parent.map(ObjKey::of) {
            return;
        }
        self.run_deferred();

        if let Some(old) = old {
            self.tombstone(&old, key);
        }
        match parent {
            Some(parent) => {
                self.children_of
                    .get_or_insert_with(parent, new_seq)
                    .borrow_mut()
                    .push(Slot::Live(Rc::clone(obj)));
                self.parent_of.insert(obj, Rc::downgrade(parent));
                tracing::trace!(child = %key, parent = %ObjKey::of(parent), "attach");
            }
            None => {
                self.parent_of.remove(key);
                tracing::trace!(child = %key, "detach");
            }
        }
        self.tick();
    }

    fn tombstone(&mut self, old_parent: &Weak<T>, child: ObjKey) {
        let old_key = ObjKey::of_weak(old_parent);
        if let Some(seq) = self.children_of.get(old_key) {
            let mut slots = seq.borrow_mut();
            if let Some(slot) = slots.iter_mut().find(|s| s.holds(child)) {
                *slot = Slot::Tombstone;
            }
        }
        self.pending.insert(old_parent);
    }

    /// A copy of the live children of `obj`, in order.
    ///
    /// `None` when `obj` has no child list at all. A list that only holds
    /// tombstones yields an empty vector.
    pub fn get_children(&self, obj: &Rc<T>) -> Option<Vec<Rc<T>>> {
        let seq = self.children_of.get(ObjKey::of(obj))?;
        let children = seq
            .borrow()
            .iter()
            .filter_map(|s| s.as_live().cloned())
            .collect();
        Some(children)
    }

    pub fn get_children_read_only(&self, obj: &Rc<T>) -> Option<ChildSlots<T>> {
        self.children_of
            .get(ObjKey::of(obj))
            .cloned()
            .map(ChildSlots::new)
    }

    /// Each call returns an independent cursor; see [`ChildIter`].
    pub fn child_iter(&self, obj: &Rc<T>) -> ChildIter<T> {
        ChildIter::new(self.children_of.get(ObjKey::of(obj)).cloned())
    }

    pub fn has_pending_cleanup(&self, obj: &Rc<T>) -> bool {
        self.pending.contains(ObjKey::of(obj))
    }

    /// Removes the tombstones from `obj`'s child list. The list is dropped
    /// when nothing is left in it.
    ///
    /// Must not be called while a [`ChildIter`] over `obj` is in flight.
    pub fn cleanup(&mut self, obj: &Rc<T>) {
        self.run_deferred();
        let _pause = self.reclaimer.pause();
        self.compact(ObjKey::of(obj));
    }

    /// Compacts every list with pending tombstones, as one paused section.
    #[tracing::instrument(
        level = tracing::Level::DEBUG,
        skip_all,
        fields(pending = self.pending.len())
    )]
    pub fn cleanup_all(&mut self) {
        self.run_deferred();
        let pause = self.reclaimer.pause();
        let mut removed = 0;
        let mut dropped_lists = 0;
        for key in self.pending.take() {
            let (n, emptied) = self.compact(key);
            removed += n;
            dropped_lists += emptied as usize;
        }
        drop(pause);
        tracing::debug!(removed, dropped_lists, "compacted");
    }

    /// Returns the number of tombstones removed and whether the list was
    /// dropped.
    fn compact(&mut self, key: ObjKey) -> (usize, bool) {
        self.pending.remove(key);
        let Some(seq) = self.children_of.get(key) else {
            return (0, false);
        };
        let (removed, empty) = {
            let mut slots = seq.borrow_mut();
            let before = slots.len();
            slots.retain(|s| !s.is_tombstone());
            (before - slots.len(), slots.is_empty())
        };
        if empty {
            self.children_of.remove(key);
        }
        (removed, empty)
    }

    /// Compacts `obj`'s child list and reorders it by a less-than predicate.
    ///
    /// `less` must describe a strict total order over the children. Ties
    /// keep their current relative order.
    pub fn sort_children(&mut self, obj: &Rc<T>, mut less: impl FnMut(&Rc<T>, &Rc<T>) -> bool) {
        self.sort_children_by(obj, |a, b| {
            if less(a, b) {
                Ordering::Less
            } else if less(b, a) {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        })
    }

    pub fn sort_children_by(
        &mut self,
        obj: &Rc<T>,
        mut compare: impl FnMut(&Rc<T>, &Rc<T>) -> Ordering,
    ) {
        let key = ObjKey::of(obj);
        if !self.children_of.contains(key) {
            return;
        }
        self.run_deferred();
        let _pause = self.reclaimer.pause();
        self.compact(key);
        let Some(seq) = self.children_of.get(key) else {
            return;
        };
        // sort a copy: the list is not borrowed while `compare` runs and is
        // left untouched if it panics
        let mut live = seq
            .borrow()
            .iter()
            .filter_map(|s| s.as_live().cloned())
            .collect::<Vec<_>>();
        live.sort_by(|a, b| compare(a, b));
        *seq.borrow_mut() = live.into_iter().map(Slot::Live).collect();
    }

    /// Runs a sweep pass, or defers it if the reclaimer is paused.
    ///
    /// A pass forgets every entry whose key has been dropped and every
    /// parent link whose parent has been dropped. Child lists of dropped
    /// parents are released, or parked when [`Self::parking_reclaimed`] is
    /// set. Returns whether the pass ran.
    pub fn collect(&mut self) -> bool {
        if !self.reclaimer.request_pass() {
            tracing::trace!("sweep deferred");
            return false;
        }
        self.sweep();
        true
    }

    fn sweep(&mut self) {
        let dead_lists = self.children_of.sweep(|_| true);
        let dead_links = self
            .parent_of
            .sweep(|parent| parent.strong_count() > 0)
            .len();
        let dead_pending = self.pending.sweep();
        self.ops_since_pass = 0;
        self.reclaimer.finish_pass();
        tracing::debug!(
            lists = dead_lists.len(),
            links = dead_links,
            pending = dead_pending,
            "sweep"
        );
        if self.park_reclaimed {
            self.parked.extend(dead_lists);
        }
    }

    fn run_deferred(&mut self) {
        if self.reclaimer.take_ready() {
            self.sweep();
        }
    }

    fn tick(&mut self) {
        let Some(interval) = *self.config.sweep_interval() else {
            return;
        };
        self.ops_since_pass = self.ops_since_pass.saturating_add(1);
        if self.ops_since_pass >= interval.get() {
            self.collect();
        }
    }

    /// Hands over the child lists parked by sweep passes.
    pub fn take_reclaimed(&mut self) -> Reclaimed<T> {
        Reclaimed {
            lists: std::mem::take(&mut self.parked),
        }
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            parent_entries: self.parent_of.len(),
            child_lists: self.children_of.len(),
            pending_cleanup: self.pending.len(),
            parked_lists: self.parked.len(),
            passes: self.reclaimer.passes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> RelationIndex<u32> {
        RelationIndex::new()
    }

    #[test]
    fn test_detach_leaves_tombstone_in_place() {
        let mut idx = index();
        let p = Rc::new(0);
        let kids = (1..=3).map(Rc::new).collect::<Vec<_>>();
        for k in &kids {
            idx.set_parent(k, Some(&p));
        }
        idx.set_parent(&kids[1], None);

        let slots = idx.get_children_read_only(&p).unwrap();
        assert_eq!(slots.len(), 3);
        assert!(slots.is_tombstone(1));
        assert_eq!(slots.tombstones(), 1);
        assert!(idx.has_pending_cleanup(&p));
        assert_eq!(idx.stats().pending_cleanup, 1);
    }

    #[test]
    fn test_compact_only_touches_pending() {
        let mut idx = index();
        let p = Rc::new(0);
        let q = Rc::new(1);
        let a = Rc::new(2);
        let b = Rc::new(3);
        idx.set_parent(&a, Some(&p));
        idx.set_parent(&b, Some(&q));
        idx.set_parent(&a, Some(&q));

        idx.cleanup_all();
        assert_eq!(idx.stats().pending_cleanup, 0);
        assert!(idx.get_children_read_only(&p).is_none());
        let q_slots = idx.get_children_read_only(&q).unwrap();
        assert_eq!(q_slots.len(), 2);
        assert_eq!(q_slots.tombstones(), 0);
    }

    #[test]
    fn test_automatic_pass_after_interval() {
        let config = kinship_config::RawIndexConfig::default()
            .with_sweep_interval(2)
            .normalize();
        let mut idx = RelationIndex::<u32>::with_config(config);
        let p = Rc::new(0);
        let a = Rc::new(1);
        idx.set_parent(&a, Some(&p));
        assert_eq!(idx.stats().passes, 0);
        idx.set_parent(&a, None);
        assert_eq!(idx.stats().passes, 1);
        // no-op calls do not count
        idx.set_parent(&a, None);
        assert_eq!(idx.stats().passes, 1);
    }

    #[test]
    fn test_cleanup_pauses_reclaimer() {
        let mut idx = index();
        let guard = idx.reclaimer().pause();
        assert!(!idx.collect());
        assert!(idx.reclaimer().has_deferred());
        drop(guard);

        let p = Rc::new(0);
        idx.cleanup(&p);
        assert!(!idx.reclaimer().has_deferred());
        assert!(!idx.reclaimer().is_paused());
        assert_eq!(idx.stats().passes, 1);
    }
}
