#![forbid(unsafe_code)]

//! Core: entity model traits, selection state, and index domains.

pub mod domain;
pub mod entity;
pub mod model;
pub mod selection;

pub use domain::{EntityPredicate, IndexDomain};
pub use entity::{BasicEntity, Entity, EntityId, EntityStore, Label, SharedStore};
pub use model::{EntityModel, ModelError, Result};
pub use selection::Selection;
