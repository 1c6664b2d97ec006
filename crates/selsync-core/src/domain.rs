#![forbid(unsafe_code)]

//! Index domains: the dynamically valid id set a range control may present.
//!
//! # Design
//!
//! An [`IndexDomain`] is a *view*: a store handle plus an optional membership
//! predicate plus an optional list of staged entities held outside the store.
//! It caches nothing. Every query re-reads the live store, so the answer
//! always reflects the current collection state, even while entities are
//! created, destroyed, or reclassified between queries.
//!
//! Predicates and staged entities are explicit construction-time
//! configuration; there are no process-wide predicate singletons.
//!
//! # Invariants
//!
//! 1. `contains(id)` is true only for an id currently in the store (passing
//!    the predicate, if any) or among the staged entities.
//! 2. Queries have no side effects.

use std::rc::Rc;

use crate::entity::{Entity, EntityId, EntityStore};

/// Membership predicate applied on top of store membership.
pub type EntityPredicate<E> = Rc<dyn Fn(&E) -> bool>;

/// A dynamic, optionally filtered set of valid entity ids.
pub struct IndexDomain<E: Entity> {
    store: Rc<dyn EntityStore<E>>,
    predicate: Option<EntityPredicate<E>>,
    staged: Vec<Rc<E>>,
}

impl<E: Entity> Clone for IndexDomain<E> {
    fn clone(&self) -> Self {
        Self {
            store: Rc::clone(&self.store),
            predicate: self.predicate.clone(),
            staged: self.staged.clone(),
        }
    }
}

impl<E: Entity> std::fmt::Debug for IndexDomain<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexDomain")
            .field("predicate", &self.predicate.is_some())
            .field("staged", &self.staged.len())
            .finish()
    }
}

impl<E: Entity> IndexDomain<E> {
    /// Unfiltered domain over every id in the store.
    #[must_use]
    pub fn new(store: Rc<dyn EntityStore<E>>) -> Self {
        Self {
            store,
            predicate: None,
            staged: Vec::new(),
        }
    }

    /// Restrict the domain to entities passing `predicate`.
    #[must_use]
    pub fn with_predicate(mut self, predicate: impl Fn(&E) -> bool + 'static) -> Self {
        self.predicate = Some(Rc::new(predicate));
        self
    }

    /// Extend the domain with entities staged outside the store.
    #[must_use]
    pub fn with_staged(mut self, staged: Vec<Rc<E>>) -> Self {
        self.staged = staged;
        self
    }

    /// Whether `id` is a currently valid member of this domain.
    ///
    /// Recomputed against the live store on every call.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        if let Some(entity) = self.store.get(id) {
            return self.is_valid_selection(&entity);
        }
        self.staged
            .iter()
            .any(|entity| entity.id() == id && self.is_valid_selection(entity))
    }

    /// Whether `entity` satisfies this domain's predicate, if any.
    #[must_use]
    pub fn is_valid_selection(&self, entity: &E) -> bool {
        self.predicate.as_ref().is_none_or(|check| check(entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{BasicEntity, Label, SharedStore};

    fn store_with(ids: &[u32]) -> SharedStore<BasicEntity> {
        let store = SharedStore::new();
        for &id in ids {
            store.insert(Rc::new(BasicEntity::new(id)));
        }
        store
    }

    #[test]
    fn unfiltered_domain_tracks_store_membership() {
        let store = store_with(&[1, 2]);
        let domain = IndexDomain::new(Rc::new(store.clone()));

        assert!(domain.contains(EntityId(1)));
        assert!(!domain.contains(EntityId(3)));

        // No snapshot: mutations are visible on the next query.
        store.insert(Rc::new(BasicEntity::new(3)));
        store.remove(EntityId(1));
        assert!(domain.contains(EntityId(3)));
        assert!(!domain.contains(EntityId(1)));
    }

    #[test]
    fn predicate_filters_membership() {
        let store = SharedStore::new();
        store.insert(Rc::new(BasicEntity::new(7)));
        store.insert(Rc::new(BasicEntity::classified(8, Label::new("clef"))));

        let domain =
            IndexDomain::new(Rc::new(store.clone())).with_predicate(BasicEntity::is_classified);

        assert!(!domain.contains(EntityId(7)));
        assert!(domain.contains(EntityId(8)));

        // Reclassification changes the answer without rebuilding the domain.
        store.get(EntityId(7)).unwrap().set_classification(Some(Label::new("dot")));
        assert!(domain.contains(EntityId(7)));
    }

    #[test]
    fn staged_entities_are_members_without_store_presence() {
        let store = store_with(&[]);
        let staged = Rc::new(BasicEntity::new(42));
        let domain =
            IndexDomain::new(Rc::new(store)).with_staged(vec![Rc::clone(&staged)]);

        assert!(domain.contains(EntityId(42)));
        assert!(!domain.contains(EntityId(41)));
    }

    #[test]
    fn staged_entities_still_pass_the_predicate() {
        let store = store_with(&[]);
        let staged = Rc::new(BasicEntity::new(5));
        let domain = IndexDomain::new(Rc::new(store))
            .with_staged(vec![Rc::clone(&staged)])
            .with_predicate(BasicEntity::is_classified);

        assert!(!domain.contains(EntityId(5)));
        staged.set_classification(Some(Label::new("flag")));
        assert!(domain.contains(EntityId(5)));
    }

    #[test]
    fn is_valid_selection_defaults_to_true() {
        let store = store_with(&[]);
        let domain = IndexDomain::new(Rc::new(store));
        assert!(domain.is_valid_selection(&BasicEntity::new(1)));
    }
}
