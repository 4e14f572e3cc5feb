//! An external parent/child index for reference-counted objects.
//!
//! Nothing is stored on the objects themselves: [`RelationIndex`] keeps
//! three identity-keyed side tables (parent of, children of, pending
//! cleanup) whose keys are weak, so registering an object never keeps it
//! alive through its key role. Detaching a child leaves a tombstone in the
//! old parent's child list, which keeps positions stable for iterators in
//! flight; lists are compacted later by [`RelationIndex::cleanup`],
//! [`RelationIndex::cleanup_all`] or [`RelationIndex::sort_children`].

mod index;
mod iter;
mod reclaim;
mod slot;
mod weak_map;

pub use index::{IndexStats, Reclaimed, RelationIndex};
pub use iter::{ChildIter, ChildSlots};
pub use kinship_config::IndexConfig;
pub use reclaim::{PauseGuard, Reclaimer};
pub use slot::Slot;
