#![forbid(unsafe_code)]

//! Re-entrancy guard: one flag covering a whole fan-out write.
//!
//! While the engine pushes a selection into its controls, each control fires
//! its change notification exactly as it would for a user edit. The guard is
//! how those echoes are told apart from genuine input: the engine holds the
//! guard for the duration of the write, and the change handler drops any
//! notification that arrives while it is held.
//!
//! The flag is intentionally coarse (engine-owned, not per-control). The
//! writes within one synchronization pass all derive from one authoritative
//! selection and are treated atomically with respect to feedback.

use std::cell::Cell;
use std::rc::Rc;

/// Engine-owned re-entrancy flag. Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct SyncGuard {
    held: Rc<Cell<bool>>,
}

impl SyncGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a synchronization pass is currently writing to controls.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.held.get()
    }

    /// Hold the guard for the duration of the returned section.
    ///
    /// Passes never nest: bus delivery queues re-entrant events, so a new
    /// pass cannot start while one is in flight.
    #[must_use]
    pub fn hold(&self) -> GuardSection {
        debug_assert!(!self.held.get(), "synchronization passes must not nest");
        self.held.set(true);
        GuardSection {
            held: Rc::clone(&self.held),
        }
    }
}

/// RAII section of a held guard; releases the flag on drop.
#[derive(Debug)]
pub struct GuardSection {
    held: Rc<Cell<bool>>,
}

impl Drop for GuardSection {
    fn drop(&mut self) {
        self.held.set(false);
    }
}
