#![forbid(unsafe_code)]

//! The selection-synchronization engine.
//!
//! # Design
//!
//! [`SelectionSyncEngine`] composes the bus, the guard, two range controls
//! (an unfiltered "any entity" control and a classified-only control), the
//! derived status labels, and the command actions. It is one subscriber and
//! publisher among peers on the bus, never its exclusive owner.
//!
//! Two states, tracked by the guard:
//!
//! - **Idle** — guard clear; bus events and control notifications are both
//!   accepted.
//! - **Synchronizing** — guard held; the engine is fanning one authoritative
//!   selection out to every control and label. Control notifications in this
//!   state are echoes of the engine's own writes and are dropped. A genuinely
//!   new selection published mid-pass is queued by the bus and processed
//!   after the pass, never interleaved.
//!
//! A user edit on a control is never self-applied: the engine publishes the
//! request and lets the rebroadcast decide what the control finally shows,
//! so a rejected request cannot leave the control diverged from the shared
//! selection.
//!
//! # Concurrency
//!
//! Single logical UI thread, cooperative. No locking; every pass is
//! synchronous and bounded by the number of controls. Cross-thread entity
//! mutation must be marshaled onto this thread before it produces a bus
//! event.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use selsync_core::{Entity, EntityId, EntityModel, EntityStore, IndexDomain};

use crate::actions::{DeassignAction, DumpAction};
use crate::bus::{EventKind, SelectionBus, SelectionEvent, Subscription};
use crate::control::{ControlValue, RangeControl};
use crate::guard::SyncGuard;

/// Raw spinner value reserved for "no selection" unless overridden via
/// [`EngineBuilder::no_value`].
pub const DEFAULT_NO_VALUE: u32 = 0;

/// Engine-derived display state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardState {
    /// "Active", "Inactive", or empty when nothing is selected.
    pub active_label: String,
    /// Size of the current entity set, or empty.
    pub count_label: String,
    /// Classification of the current entity, or empty.
    pub classification_label: String,
}

struct EngineInner<E: Entity> {
    bus: SelectionBus<E>,
    store: Rc<dyn EntityStore<E>>,
    staged: Vec<Rc<E>>,
    guard: SyncGuard,
    global: RangeControl<E>,
    classified: RangeControl<E>,
    state: RefCell<BoardState>,
    deassign: DeassignAction<E>,
    dump: DumpAction<E>,
}

impl<E: Entity + 'static> EngineInner<E> {
    /// Fan a single-entity selection out to labels, actions, and controls.
    fn apply_entity(&self, entity: Option<&Rc<E>>) {
        let _section = self.guard.hold();
        tracing::debug!(
            message = "engine.sync",
            id = entity.map(|e| e.id().raw()),
            classified = entity.map(|e| e.is_classified()),
        );

        {
            let mut state = self.state.borrow_mut();
            state.active_label = match entity {
                Some(entity) if entity.is_active() => "Active".to_string(),
                Some(_) => "Inactive".to_string(),
                None => String::new(),
            };
            state.classification_label = entity
                .and_then(|entity| entity.classification())
                .map(|label| label.as_str().to_string())
                .unwrap_or_default();
        }

        self.deassign.recompute_enabled();
        self.dump.recompute_enabled();

        let entity = entity.map(Rc::as_ref);
        self.global.set_programmatic(self.global.value_for(entity));
        self.classified
            .set_programmatic(self.classified.value_for(entity));
    }

    /// Fan an entity-set selection out to the count label and actions.
    /// Controls derive from single-entity events only (the most specific
    /// event last received); set and single events are never merged.
    fn apply_set(&self, entities: &[Rc<E>]) {
        let _section = self.guard.hold();
        tracing::debug!(message = "engine.sync_set", len = entities.len());

        self.state.borrow_mut().count_label = if entities.is_empty() {
            String::new()
        } else {
            entities.len().to_string()
        };

        self.deassign.recompute_enabled();
        self.dump.recompute_enabled();
    }

    /// A control committed a value. Guarded notifications are echoes of our
    /// own writes; an idle notification is a user request to select that id.
    fn on_control_change(&self, control: &str, value: ControlValue) {
        if self.guard.is_held() {
            tracing::trace!(message = "engine.echo_suppressed", control, value = ?value);
            return;
        }

        let entity = match value {
            ControlValue::NoValue => None,
            ControlValue::Id(id) => {
                let resolved = self.resolve(id);
                if resolved.is_none() {
                    // Vanished between commit and resolution; request a clear
                    // rather than keep a dangling id on screen.
                    tracing::debug!(message = "engine.select_missing", control, id = id.raw());
                }
                resolved
            }
        };

        tracing::debug!(
            message = "engine.user_select",
            control,
            id = entity.as_ref().map(|e| e.id().raw()),
        );
        // Never self-applied: the rebroadcast is the single source of truth
        // for what the control finally shows.
        self.bus.publish(SelectionEvent::Entity(entity));
    }

    fn resolve(&self, id: EntityId) -> Option<Rc<E>> {
        self.store.get(id).or_else(|| {
            self.staged
                .iter()
                .find(|entity| entity.id() == id)
                .cloned()
        })
    }
}

/// Builder for [`SelectionSyncEngine`].
pub struct EngineBuilder<E: Entity> {
    bus: SelectionBus<E>,
    store: Rc<dyn EntityStore<E>>,
    model: Rc<dyn EntityModel<E>>,
    staged: Vec<Rc<E>>,
    no_value: u32,
}

impl<E: Entity + 'static> EngineBuilder<E> {
    /// Entities staged outside the store but still selectable.
    #[must_use]
    pub fn staged(mut self, staged: Vec<Rc<E>>) -> Self {
        self.staged = staged;
        self
    }

    /// Raw spinner value reserved for "no selection".
    #[must_use]
    pub fn no_value(mut self, no_value: u32) -> Self {
        self.no_value = no_value;
        self
    }

    #[must_use]
    pub fn build(self) -> SelectionSyncEngine<E> {
        let global_domain =
            IndexDomain::new(Rc::clone(&self.store)).with_staged(self.staged.clone());
        let classified_domain = global_domain.clone().with_predicate(E::is_classified);

        let inner = Rc::new(EngineInner {
            global: RangeControl::new("global", global_domain, self.no_value),
            classified: RangeControl::new("classified", classified_domain, self.no_value),
            guard: SyncGuard::new(),
            state: RefCell::new(BoardState::default()),
            deassign: DeassignAction::new(self.bus.clone(), Rc::clone(&self.model)),
            dump: DumpAction::new(self.bus.clone(), self.model),
            staged: self.staged,
            store: self.store,
            bus: self.bus,
        });

        for control in [&inner.global, &inner.classified] {
            let weak: Weak<EngineInner<E>> = Rc::downgrade(&inner);
            let name = control.name().to_string();
            control.set_on_change(move |value| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_control_change(&name, value);
                }
            });
        }

        let weak = Rc::downgrade(&inner);
        let entity_sub = inner.bus.subscribe(EventKind::Entity, move |event| {
            if let Some(inner) = weak.upgrade()
                && let SelectionEvent::Entity(entity) = event
            {
                inner.apply_entity(entity.as_ref());
            }
        });

        let weak = Rc::downgrade(&inner);
        let set_sub = inner.bus.subscribe(EventKind::EntitySet, move |event| {
            if let Some(inner) = weak.upgrade()
                && let SelectionEvent::EntitySet(entities) = event
            {
                inner.apply_set(entities);
            }
        });

        SelectionSyncEngine {
            inner,
            _subscriptions: [entity_sub, set_sub],
        }
    }
}

/// Keeps range controls, status labels, and command actions consistent with
/// the shared selection carried on a [`SelectionBus`].
///
/// Dropping the engine unsubscribes it from the bus.
pub struct SelectionSyncEngine<E: Entity> {
    inner: Rc<EngineInner<E>>,
    _subscriptions: [Subscription; 2],
}

impl<E: Entity + 'static> SelectionSyncEngine<E> {
    /// Start building an engine over `bus`, `store`, and `model`.
    #[must_use]
    pub fn builder(
        bus: SelectionBus<E>,
        store: Rc<dyn EntityStore<E>>,
        model: Rc<dyn EntityModel<E>>,
    ) -> EngineBuilder<E> {
        EngineBuilder {
            bus,
            store,
            model,
            staged: Vec::new(),
            no_value: DEFAULT_NO_VALUE,
        }
    }

    /// Snapshot of the derived display state.
    #[must_use]
    pub fn board_state(&self) -> BoardState {
        self.inner.state.borrow().clone()
    }

    /// Handle to the unfiltered "any entity" control.
    #[must_use]
    pub fn global_control(&self) -> RangeControl<E> {
        self.inner.global.clone()
    }

    /// Handle to the classified-only control.
    #[must_use]
    pub fn classified_control(&self) -> RangeControl<E> {
        self.inner.classified.clone()
    }

    #[must_use]
    pub fn deassign_action(&self) -> &DeassignAction<E> {
        &self.inner.deassign
    }

    #[must_use]
    pub fn dump_action(&self) -> &DumpAction<E> {
        &self.inner.dump
    }

    /// Whether a synchronization pass is currently in flight.
    #[must_use]
    pub fn is_synchronizing(&self) -> bool {
        self.inner.guard.is_held()
    }
}

impl<E: Entity> std::fmt::Debug for SelectionSyncEngine<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionSyncEngine")
            .field("state", &*self.inner.state.borrow())
            .field("synchronizing", &self.inner.guard.is_held())
            .finish()
    }
}
