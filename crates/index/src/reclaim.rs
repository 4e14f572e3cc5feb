use std::cell::Cell;
use std::rc::Rc;

/// Gatekeeper for sweep passes over a [`crate::RelationIndex`].
///
/// A pass requested while the reclaimer is paused is not run; it is
/// remembered and runs at the next index operation after the last
/// [`PauseGuard`] is dropped. The reclaimer is shared (`Rc`), so a caller
/// can hold a pause across several index operations.
#[derive(Debug, Default)]
pub struct Reclaimer {
    depth: Cell<u32>,
    deferred: Cell<bool>,
    passes: Cell<u64>,
}

impl Reclaimer {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Pauses sweep passes until the returned guard is dropped. Pauses nest.
    pub fn pause(self: &Rc<Self>) -> PauseGuard {
        self.depth.set(self.depth.get() + 1);
        PauseGuard {
            reclaimer: Rc::clone(self),
        }
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.depth.get() > 0
    }

    /// Whether a pass was requested during a pause and has not run yet.
    #[inline]
    pub fn has_deferred(&self) -> bool {
        self.deferred.get()
    }

    /// Number of completed sweep passes.
    #[inline]
    pub fn passes(&self) -> u64 {
        self.passes.get()
    }

    /// Returns `true` if a pass may run right now, otherwise records it as
    /// deferred.
    pub(crate) fn request_pass(&self) -> bool {
        if self.is_paused() {
            self.deferred.set(true);
            false
        } else {
            true
        }
    }

    pub(crate) fn take_ready(&self) -> bool {
        !self.is_paused() && self.deferred.replace(false)
    }

    pub(crate) fn finish_pass(&self) {
        self.deferred.set(false);
        self.passes.set(self.passes.get() + 1);
    }
}

#[must_use = "the reclaimer resumes as soon as the guard is dropped"]
#[derive(Debug)]
pub struct PauseGuard {
    reclaimer: Rc<Reclaimer>,
}

impl Drop for PauseGuard {
    fn drop(&mut self) {
        let depth = self.reclaimer.depth.get();
        debug_assert!(depth > 0);
        self.reclaimer.depth.set(depth - 1);
    }
}
