#![forbid(unsafe_code)]

//! Entity model: identifiers, classification labels, and the store contract.
//!
//! The engine never owns entities. It observes them through the [`Entity`]
//! and [`EntityStore`] traits, which describe a live, externally mutated
//! registry: entities may appear, disappear, or change classification between
//! any two queries. Ids are unique within a store at any instant but may be
//! reused after destruction, so nothing here assumes id stability across
//! entity lifetimes.
//!
//! [`BasicEntity`] and [`SharedStore`] are in-crate reference implementations
//! used by tests and embedders that have no entity registry of their own.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Identifier of an entity, unique within its store at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Raw integer value, as displayed by a range control.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

/// Classification label assigned to an entity.
///
/// The label is display text only; what a classification *means* is the
/// external model's business.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label(String);

impl Label {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An opaque domain object the UI lets a user browse and select.
pub trait Entity {
    /// Identifier, unique within the owning store at this instant.
    fn id(&self) -> EntityId;

    /// Whether the entity is currently active.
    fn is_active(&self) -> bool;

    /// Current classification, if any. Returned by value because the
    /// underlying storage may be interior-mutable.
    fn classification(&self) -> Option<Label>;

    /// Whether a classification is present.
    fn is_classified(&self) -> bool {
        self.classification().is_some()
    }
}

/// A live, mutable registry of entities.
///
/// Implementations may mutate between any two calls; queries always reflect
/// the current state, never a snapshot.
pub trait EntityStore<E: Entity> {
    /// Whether an entity with this id is currently present.
    fn contains(&self, id: EntityId) -> bool;

    /// Current entity with this id, if present.
    fn get(&self, id: EntityId) -> Option<Rc<E>>;

    /// Ids currently present, in ascending order.
    fn ids(&self) -> Vec<EntityId>;
}

/// Reference [`Entity`] with interior-mutable activity and classification.
#[derive(Debug)]
pub struct BasicEntity {
    id: EntityId,
    active: Cell<bool>,
    classification: RefCell<Option<Label>>,
}

impl BasicEntity {
    /// New active, unclassified entity.
    #[must_use]
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            active: Cell::new(true),
            classification: RefCell::new(None),
        }
    }

    /// New active entity carrying a classification.
    #[must_use]
    pub fn classified(id: impl Into<EntityId>, label: Label) -> Self {
        let entity = Self::new(id);
        *entity.classification.borrow_mut() = Some(label);
        entity
    }

    pub fn set_active(&self, active: bool) {
        self.active.set(active);
    }

    pub fn set_classification(&self, label: Option<Label>) {
        *self.classification.borrow_mut() = label;
    }
}

impl Entity for BasicEntity {
    fn id(&self) -> EntityId {
        self.id
    }

    fn is_active(&self) -> bool {
        self.active.get()
    }

    fn classification(&self) -> Option<Label> {
        self.classification.borrow().clone()
    }
}

/// Reference [`EntityStore`]: a shared, single-threaded map of entities.
///
/// Cloning a `SharedStore` creates a new handle to the **same** registry, so
/// an embedder can mutate it while the engine holds a handle.
#[derive(Debug)]
pub struct SharedStore<E> {
    entries: Rc<RefCell<BTreeMap<EntityId, Rc<E>>>>,
}

impl<E> Clone for SharedStore<E> {
    fn clone(&self) -> Self {
        Self {
            entries: Rc::clone(&self.entries),
        }
    }
}

impl<E> Default for SharedStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> SharedStore<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Rc::new(RefCell::new(BTreeMap::new())),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl<E: Entity> SharedStore<E> {
    /// Insert an entity, replacing any entry with the same id.
    pub fn insert(&self, entity: Rc<E>) {
        self.entries.borrow_mut().insert(entity.id(), entity);
    }

    /// Remove and return the entity with this id, if present.
    pub fn remove(&self, id: EntityId) -> Option<Rc<E>> {
        self.entries.borrow_mut().remove(&id)
    }
}

impl<E: Entity> EntityStore<E> for SharedStore<E> {
    fn contains(&self, id: EntityId) -> bool {
        self.entries.borrow().contains_key(&id)
    }

    fn get(&self, id: EntityId) -> Option<Rc<E>> {
        self.entries.borrow().get(&id).cloned()
    }

    fn ids(&self) -> Vec<EntityId> {
        self.entries.borrow().keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_classified_derives_from_classification() {
        let plain = BasicEntity::new(1);
        assert!(!plain.is_classified());

        let labeled = BasicEntity::classified(2, Label::new("whole note"));
        assert!(labeled.is_classified());
        assert_eq!(labeled.classification().unwrap().as_str(), "whole note");
    }

    #[test]
    fn classification_is_mutable_in_place() {
        let entity = BasicEntity::new(3);
        entity.set_classification(Some(Label::new("rest")));
        assert!(entity.is_classified());
        entity.set_classification(None);
        assert!(!entity.is_classified());
    }

    #[test]
    fn shared_store_handles_see_the_same_registry() {
        let store = SharedStore::new();
        let handle = store.clone();
        store.insert(Rc::new(BasicEntity::new(7)));

        assert!(handle.contains(EntityId(7)));
        assert_eq!(handle.len(), 1);

        handle.remove(EntityId(7));
        assert!(!store.contains(EntityId(7)));
        assert!(store.is_empty());
    }

    #[test]
    fn store_queries_reflect_current_state() {
        let store = SharedStore::new();
        store.insert(Rc::new(BasicEntity::new(1)));
        store.insert(Rc::new(BasicEntity::new(5)));
        store.insert(Rc::new(BasicEntity::new(3)));
        assert_eq!(store.ids(), vec![EntityId(1), EntityId(3), EntityId(5)]);

        store.remove(EntityId(3));
        assert_eq!(store.ids(), vec![EntityId(1), EntityId(5)]);
        assert!(store.get(EntityId(3)).is_none());
    }

    #[test]
    fn insert_replaces_reused_id() {
        let store = SharedStore::new();
        store.insert(Rc::new(BasicEntity::new(9)));
        store.insert(Rc::new(BasicEntity::classified(9, Label::new("sharp"))));
        assert_eq!(store.len(), 1);
        assert!(store.get(EntityId(9)).unwrap().is_classified());
    }
}
