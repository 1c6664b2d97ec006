//! Property-based invariant tests for the selection-synchronization engine.
//!
//! Verifies structural guarantees over arbitrary interleavings of store
//! mutation, bus traffic, user edits, and action invocations:
//!
//! 1. The guard is never left held after any operation.
//! 2. After any engine-driven update, each control shows the sentinel or an
//!    id that is a current member of its domain.
//! 3. No operation causes more bus deliveries than it is allowed to: a
//!    publish delivers once, an accepted edit publishes once, a rejected
//!    edit publishes nothing, a deassign publishes at most a refocus, and
//!    store mutation alone publishes nothing. Control echoes never publish.
//! 4. Determinism: replaying the same operations yields the same board state.

use std::cell::Cell;
use std::rc::Rc;

use proptest::prelude::*;
use selsync_core::{
    BasicEntity, Entity, EntityId, EntityModel, EntityStore, Label, ModelError, SharedStore,
};
use selsync_engine::{
    CommandAction, ControlValue, EventKind, SelectionBus, SelectionEvent, SelectionSyncEngine,
};

#[derive(Debug, Clone)]
enum Op {
    Insert { id: u32, classified: bool, active: bool },
    Remove { id: u32 },
    PublishEntity { id: Option<u32> },
    PublishSet { ids: Vec<u32> },
    EditGlobal { raw: u32 },
    EditClassified { raw: u32 },
    InvokeDeassign,
    InvokeDump,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1u32..=8, any::<bool>(), any::<bool>()).prop_map(|(id, classified, active)| Op::Insert {
            id,
            classified,
            active
        }),
        (1u32..=8).prop_map(|id| Op::Remove { id }),
        proptest::option::of(1u32..=8).prop_map(|id| Op::PublishEntity { id }),
        proptest::collection::vec(1u32..=8, 0..4).prop_map(|ids| Op::PublishSet { ids }),
        (0u32..=12).prop_map(|raw| Op::EditGlobal { raw }),
        (0u32..=12).prop_map(|raw| Op::EditClassified { raw }),
        Just(Op::InvokeDeassign),
        Just(Op::InvokeDump),
    ]
}

struct InPlaceModel;

impl EntityModel<BasicEntity> for InPlaceModel {
    fn classify(&self, entity: &BasicEntity, label: Label) -> selsync_core::Result<()> {
        entity.set_classification(Some(label));
        Ok(())
    }

    fn declassify(&self, entity: &BasicEntity) -> selsync_core::Result<()> {
        if !entity.is_classified() {
            return Err(ModelError::NotClassified { id: entity.id() });
        }
        entity.set_classification(None);
        Ok(())
    }

    fn declassify_set(
        &self,
        entities: &[Rc<BasicEntity>],
    ) -> selsync_core::Result<Option<Rc<BasicEntity>>> {
        for entity in entities {
            entity.set_classification(None);
        }
        Ok(entities.first().cloned())
    }

    fn dump(&self, _entity: &BasicEntity) {}
}

struct Board {
    bus: SelectionBus<BasicEntity>,
    store: SharedStore<BasicEntity>,
    engine: SelectionSyncEngine<BasicEntity>,
    deliveries: Rc<Cell<u64>>,
    _probe: [selsync_engine::Subscription; 2],
}

fn board() -> Board {
    let bus: SelectionBus<BasicEntity> = SelectionBus::new();
    let store: SharedStore<BasicEntity> = SharedStore::new();
    let engine =
        SelectionSyncEngine::builder(bus.clone(), Rc::new(store.clone()), Rc::new(InPlaceModel))
            .build();

    let deliveries = Rc::new(Cell::new(0u64));
    let entity_counter = Rc::clone(&deliveries);
    let probe_entity = bus.subscribe(EventKind::Entity, move |_| {
        entity_counter.set(entity_counter.get() + 1);
    });
    let set_counter = Rc::clone(&deliveries);
    let probe_set = bus.subscribe(EventKind::EntitySet, move |_| {
        set_counter.set(set_counter.get() + 1);
    });

    Board {
        bus,
        store,
        engine,
        deliveries,
        _probe: [probe_entity, probe_set],
    }
}

fn make_entity(id: u32, classified: bool, active: bool) -> Rc<BasicEntity> {
    let entity = if classified {
        BasicEntity::classified(id, Label::new("mark"))
    } else {
        BasicEntity::new(id)
    };
    entity.set_active(active);
    Rc::new(entity)
}

/// Run one op; returns the allowed range of bus deliveries it may cause.
fn run_op(board: &Board, op: &Op) -> (u64, u64) {
    match op {
        Op::Insert {
            id,
            classified,
            active,
        } => {
            board.store.insert(make_entity(*id, *classified, *active));
            (0, 0)
        }
        Op::Remove { id } => {
            board.store.remove(EntityId(*id));
            (0, 0)
        }
        Op::PublishEntity { id } => {
            let entity = id.and_then(|id| board.store.get(EntityId(id)));
            board.bus.publish(SelectionEvent::Entity(entity));
            (1, 1)
        }
        Op::PublishSet { ids } => {
            let entities = ids
                .iter()
                .filter_map(|&id| board.store.get(EntityId(id)))
                .collect();
            board.bus.publish(SelectionEvent::EntitySet(entities));
            (1, 1)
        }
        Op::EditGlobal { raw } => {
            // An accepted edit publishes once, unless it re-commits the value
            // already shown (no change, no notification).
            let accepted = board.engine.global_control().commit_user_edit_raw(*raw);
            if accepted { (0, 1) } else { (0, 0) }
        }
        Op::EditClassified { raw } => {
            let accepted = board.engine.classified_control().commit_user_edit_raw(*raw);
            if accepted { (0, 1) } else { (0, 0) }
        }
        Op::InvokeDeassign => {
            board.engine.deassign_action().invoke();
            // May publish a refocus entity after a set deassign.
            (0, 1)
        }
        Op::InvokeDump => {
            board.engine.dump_action().invoke();
            (0, 0)
        }
    }
}

proptest! {
    #[test]
    fn controls_never_show_an_invalid_id(ops in proptest::collection::vec(arb_op(), 0..40)) {
        let board = board();

        for op in &ops {
            let engine_driven = !matches!(op, Op::Insert { .. } | Op::Remove { .. });
            run_op(&board, op);

            prop_assert!(!board.engine.is_synchronizing());
            if engine_driven {
                for control in [board.engine.global_control(), board.engine.classified_control()] {
                    if let ControlValue::Id(id) = control.value() {
                        prop_assert!(
                            control.domain().contains(id),
                            "{} shows {} outside its domain",
                            control.name(),
                            id
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn no_operation_over_publishes(ops in proptest::collection::vec(arb_op(), 0..40)) {
        let board = board();

        for op in &ops {
            let before = board.deliveries.get();
            let (min, max) = run_op(&board, op);
            let delta = board.deliveries.get() - before;
            prop_assert!(
                (min..=max).contains(&delta),
                "{op:?} caused {delta} deliveries, expected {min}..={max}"
            );
        }
    }

    #[test]
    fn replaying_operations_is_deterministic(ops in proptest::collection::vec(arb_op(), 0..30)) {
        let first = board();
        let second = board();

        for op in &ops {
            run_op(&first, op);
            run_op(&second, op);
        }

        prop_assert_eq!(first.engine.board_state(), second.engine.board_state());
        prop_assert_eq!(
            first.engine.global_control().value(),
            second.engine.global_control().value()
        );
        prop_assert_eq!(
            first.engine.classified_control().value(),
            second.engine.classified_control().value()
        );
        prop_assert_eq!(
            first.engine.deassign_action().is_enabled(),
            second.engine.deassign_action().is_enabled()
        );
    }
}
