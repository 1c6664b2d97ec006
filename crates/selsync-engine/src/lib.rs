#![forbid(unsafe_code)]

//! Engine: selection bus, re-entrancy guard, range controls, the
//! synchronization engine, and selection-gated command actions.

pub mod actions;
pub mod bus;
pub mod control;
pub mod engine;
pub mod guard;

pub use actions::{CommandAction, DeassignAction, DumpAction};
pub use bus::{EventKind, SelectionBus, SelectionEvent, Subscription};
pub use control::{ControlValue, RangeControl};
pub use engine::{BoardState, DEFAULT_NO_VALUE, EngineBuilder, SelectionSyncEngine};
pub use guard::{GuardSection, SyncGuard};
