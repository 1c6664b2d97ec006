#![forbid(unsafe_code)]

//! Selection state: the authoritative record of what is currently chosen.
//!
//! # Invariants
//!
//! 1. Exactly one shape is active at a time: none, one entity, or a set.
//! 2. An empty set is never observable: [`Selection::set`] normalizes it to
//!    [`Selection::None`].

use std::rc::Rc;

use crate::entity::Entity;

/// What is currently chosen: none, one entity, or an ordered set.
#[derive(Debug)]
pub enum Selection<E> {
    /// Nothing selected.
    None,
    /// A single entity.
    Single(Rc<E>),
    /// An ordered, non-empty set of entities.
    Set(Vec<Rc<E>>),
}

impl<E> Default for Selection<E> {
    fn default() -> Self {
        Self::None
    }
}

impl<E> Clone for Selection<E> {
    fn clone(&self) -> Self {
        match self {
            Self::None => Self::None,
            Self::Single(entity) => Self::Single(Rc::clone(entity)),
            Self::Set(entities) => Self::Set(entities.clone()),
        }
    }
}

impl<E: Entity> Selection<E> {
    /// Selection of one entity.
    #[must_use]
    pub fn single(entity: Rc<E>) -> Self {
        Self::Single(entity)
    }

    /// Selection of an ordered set. An empty sequence normalizes to
    /// [`Selection::None`].
    #[must_use]
    pub fn set(entities: Vec<Rc<E>>) -> Self {
        if entities.is_empty() {
            Self::None
        } else {
            Self::Set(entities)
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }

    /// The single selected entity, if the shape is `Single`.
    #[must_use]
    pub fn current_single(&self) -> Option<&Rc<E>> {
        match self {
            Self::Single(entity) => Some(entity),
            _ => None,
        }
    }

    /// The selected entities as a slice: one for `Single`, all for `Set`,
    /// empty for `None`.
    #[must_use]
    pub fn entities(&self) -> &[Rc<E>] {
        match self {
            Self::None => &[],
            Self::Single(entity) => std::slice::from_ref(entity),
            Self::Set(entities) => entities,
        }
    }

    /// Number of selected entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities().len()
    }
}
