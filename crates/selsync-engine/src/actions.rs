#![forbid(unsafe_code)]

//! Selection-gated command actions.
//!
//! Each action's enablement is a pure function of the current selection
//! shape, recomputed by the engine on every selection change. Invocation
//! re-reads the *current* bus state rather than a snapshot captured at
//! enable time: time passes between enabling and a click, and the selection
//! may have changed underneath. An action whose expected shape is gone
//! no-ops rather than operate on stale data.
//!
//! Completing a set deassign is the one place where an action, not user
//! input, originates a selection change: the model may return an entity to
//! refocus on, and the action publishes it.

use std::cell::Cell;
use std::rc::Rc;

use selsync_core::{Entity, EntityModel, Selection};

use crate::bus::{SelectionBus, SelectionEvent};

/// A selection-gated operation.
pub trait CommandAction {
    /// Whether the current selection shape permits invocation.
    fn is_enabled(&self) -> bool;

    /// Perform the operation against the current selection. Must no-op
    /// safely when the selection no longer matches the expected shape.
    fn invoke(&self);
}

/// Removes the classification of the current entity, or of the current
/// entity set when one is live (the most recent set wins for group work).
pub struct DeassignAction<E: Entity> {
    bus: SelectionBus<E>,
    model: Rc<dyn EntityModel<E>>,
    enabled: Cell<bool>,
}

impl<E: Entity + 'static> DeassignAction<E> {
    #[must_use]
    pub fn new(bus: SelectionBus<E>, model: Rc<dyn EntityModel<E>>) -> Self {
        Self {
            bus,
            model,
            enabled: Cell::new(false),
        }
    }

    /// Recompute enablement from the current selection shape: a classified
    /// single entity, or a non-empty set.
    pub(crate) fn recompute_enabled(&self) {
        let enabled = match self.bus.current_selection() {
            Selection::Set(_) => true,
            Selection::Single(entity) => entity.is_classified(),
            Selection::None => false,
        };
        self.enabled.set(enabled);
    }
}

impl<E: Entity + 'static> CommandAction for DeassignAction<E> {
    fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    fn invoke(&self) {
        match self.bus.current_selection() {
            Selection::Set(set) => match self.model.declassify_set(&set) {
                Ok(Some(refocus)) => {
                    // Keep focus on the surviving entity, even if the set
                    // was rebuilt by the operation.
                    self.bus.publish(SelectionEvent::Entity(Some(refocus)));
                }
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!(message = "action.deassign_set.failed", %error);
                }
            },
            Selection::Single(entity) if entity.is_classified() => {
                if let Err(error) = self.model.declassify(&entity) {
                    tracing::warn!(message = "action.deassign.failed", %error);
                }
            }
            _ => {
                // Selection changed out from under the action.
                tracing::debug!(message = "action.deassign.stale");
            }
        }
    }
}

impl<E: Entity> std::fmt::Debug for DeassignAction<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeassignAction")
            .field("enabled", &self.enabled.get())
            .finish()
    }
}

/// Dumps diagnostic information for the current entity.
pub struct DumpAction<E: Entity> {
    bus: SelectionBus<E>,
    model: Rc<dyn EntityModel<E>>,
    enabled: Cell<bool>,
}

impl<E: Entity + 'static> DumpAction<E> {
    #[must_use]
    pub fn new(bus: SelectionBus<E>, model: Rc<dyn EntityModel<E>>) -> Self {
        Self {
            bus,
            model,
            enabled: Cell::new(false),
        }
    }

    /// Recompute enablement: any single entity selected.
    pub(crate) fn recompute_enabled(&self) {
        self.enabled.set(self.bus.current_entity().is_some());
    }
}

impl<E: Entity + 'static> CommandAction for DumpAction<E> {
    fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    fn invoke(&self) {
        match self.bus.current_entity() {
            Some(entity) => self.model.dump(&entity),
            None => tracing::debug!(message = "action.dump.stale"),
        }
    }
}

impl<E: Entity> std::fmt::Debug for DumpAction<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DumpAction")
            .field("enabled", &self.enabled.get())
            .finish()
    }
}
