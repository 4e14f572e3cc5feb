//! A per-thread parent/child hierarchy for arbitrary `Rc` objects.
//!
//! ```
//! use std::rc::Rc;
//!
//! let list: kinship::Object = Rc::new(String::from("list"));
//! let item: kinship::Object = Rc::new(42u32);
//! kinship::attach(&item, &list);
//! assert_eq!(kinship::children_of::<u32>(&list).len(), 1);
//! assert_eq!(*kinship::parent_of::<String>(&item).unwrap(), "list");
//! ```
//!
//! Every function here works on the calling thread's hierarchy. Sort
//! comparators must not call back into this module. Children released by a
//! sweep pass are dropped after the hierarchy is released, so their
//! destructors may use it. Once the thread's hierarchy has been torn down
//! (including while it is being torn down at thread exit), every function
//! behaves as if the hierarchy were empty and mutations are ignored.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use kinship_config::IndexConfig;
use kinship_index::Reclaimer;
pub use kinship_index::{ChildIter, ChildSlots, IndexStats, PauseGuard, Slot};

pub type Object = Rc<dyn Any>;
pub type Hierarchy = kinship_index::RelationIndex<dyn Any>;

thread_local! {
    static HIERARCHY: RefCell<Hierarchy> = RefCell::new(new_hierarchy());
}

fn new_hierarchy() -> Hierarchy {
    kinship_tracing::init_tracing();
    let config = IndexConfig::from_env().unwrap_or_else(|err| {
        tracing::warn!(%err, "falling back to the default hierarchy config");
        IndexConfig::default()
    });
    Hierarchy::with_config(config).parking_reclaimed()
}

/// `None` once the thread-local hierarchy is gone or being destroyed.
fn with_hierarchy<R>(f: impl FnOnce(&mut Hierarchy) -> R) -> Option<R> {
    let (ret, reclaimed) = HIERARCHY
        .try_with(|h| {
            let mut h = h.borrow_mut();
            let ret = f(&mut h);
            (ret, h.take_reclaimed())
        })
        .ok()?;
    // children released by a sweep may run arbitrary destructors
    drop(reclaimed);
    Some(ret)
}

pub fn get_parent(obj: &Object) -> Option<Object> {
    with_hierarchy(|h| h.get_parent(obj)).flatten()
}

pub fn set_parent(obj: &Object, parent: Option<&Object>) {
    with_hierarchy(|h| h.set_parent(obj, parent));
}

pub fn get_children(obj: &Object) -> Option<Vec<Object>> {
    with_hierarchy(|h| h.get_children(obj)).flatten()
}

/// The internal child list of `obj`, tombstones included.
pub fn get_children_read_only(obj: &Object) -> Option<ChildSlots<dyn Any>> {
    with_hierarchy(|h| h.get_children_read_only(obj)).flatten()
}

pub fn child_iter(obj: &Object) -> ChildIter<dyn Any> {
    with_hierarchy(|h| h.child_iter(obj)).unwrap_or_default()
}

pub fn cleanup(obj: &Object) {
    with_hierarchy(|h| h.cleanup(obj));
}

pub fn cleanup_all() {
    with_hierarchy(|h| h.cleanup_all());
}

pub fn sort_children(obj: &Object, less: impl FnMut(&Object, &Object) -> bool) {
    with_hierarchy(|h| h.sort_children(obj, less));
}

/// Runs a sweep pass over this thread's hierarchy.
pub fn collect() -> bool {
    with_hierarchy(|h| h.collect()).unwrap_or(false)
}

/// Holds off sweep passes on this thread until the guard is dropped.
pub fn pause_reclamation() -> PauseGuard {
    with_hierarchy(|h| h.reclaimer().pause()).unwrap_or_else(|| Reclaimer::new().pause())
}

pub fn stats() -> IndexStats {
    with_hierarchy(|h| h.stats()).unwrap_or_default()
}

pub fn attach(child: &Object, parent: &Object) {
    set_parent(child, Some(parent))
}

pub fn detach(child: &Object) {
    set_parent(child, None)
}

/// The parent of `obj`, if it has one of type `P`.
pub fn parent_of<P: Any>(obj: &Object) -> Option<Rc<P>> {
    get_parent(obj)?.downcast::<P>().ok()
}

/// The live children of `obj` that are of type `C`, in order.
pub fn children_of<C: Any>(obj: &Object) -> Vec<Rc<C>> {
    child_iter(obj)
        .filter_map(|child| child.downcast::<C>().ok())
        .collect()
}
