#![forbid(unsafe_code)]

//! Public facade for the selsync workspace.
//!
//! Keeps several interactive controls (an "any entity" index control, a
//! filtered-subset control, status labels, and command actions) consistent
//! with one shared selection over a live entity collection, without the
//! controls' own change notifications re-triggering the update that produced
//! them.
//!
//! ```
//! use std::rc::Rc;
//! use selsync::prelude::*;
//!
//! struct NoopModel;
//! impl EntityModel<BasicEntity> for NoopModel {
//!     fn classify(&self, e: &BasicEntity, label: Label) -> selsync::Result<()> {
//!         e.set_classification(Some(label));
//!         Ok(())
//!     }
//!     fn declassify(&self, e: &BasicEntity) -> selsync::Result<()> {
//!         e.set_classification(None);
//!         Ok(())
//!     }
//!     fn declassify_set(
//!         &self,
//!         set: &[Rc<BasicEntity>],
//!     ) -> selsync::Result<Option<Rc<BasicEntity>>> {
//!         set.iter().for_each(|e| e.set_classification(None));
//!         Ok(set.first().cloned())
//!     }
//!     fn dump(&self, _e: &BasicEntity) {}
//! }
//!
//! let bus = SelectionBus::new();
//! let store = SharedStore::new();
//! store.insert(Rc::new(BasicEntity::classified(42, Label::new("bar line"))));
//!
//! let engine =
//!     SelectionSyncEngine::builder(bus.clone(), Rc::new(store.clone()), Rc::new(NoopModel))
//!         .build();
//!
//! bus.publish(SelectionEvent::Entity(store.get(EntityId(42))));
//! assert_eq!(engine.board_state().active_label, "Active");
//! ```

pub use selsync_core::{
    BasicEntity, Entity, EntityId, EntityModel, EntityPredicate, EntityStore, IndexDomain, Label,
    ModelError, Result, Selection, SharedStore,
};
pub use selsync_engine::{
    BoardState, CommandAction, ControlValue, DEFAULT_NO_VALUE, DeassignAction, DumpAction,
    EngineBuilder, EventKind, GuardSection, RangeControl, SelectionBus, SelectionEvent,
    SelectionSyncEngine, Subscription, SyncGuard,
};

/// Commonly used types in one import.
pub mod prelude {
    pub use selsync_core::{
        BasicEntity, Entity, EntityId, EntityModel, EntityStore, IndexDomain, Label, Selection,
        SharedStore,
    };
    pub use selsync_engine::{
        BoardState, CommandAction, ControlValue, RangeControl, SelectionBus, SelectionEvent,
        SelectionSyncEngine,
    };
}
