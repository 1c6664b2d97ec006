#![forbid(unsafe_code)]

//! Collaborator contract for classification commands.
//!
//! The engine only governs *when* these operations are invocable and what
//! they may do to the selection afterward; their internal effect (model
//! mutation, persistence, undo recording) belongs to the embedder.

use std::rc::Rc;

use thiserror::Error;

use crate::entity::{Entity, EntityId, Label};

pub type Result<T> = std::result::Result<T, ModelError>;

/// Failure reported by a model operation.
///
/// Model failures never escalate: the caller logs them and keeps presenting
/// a consistent selection state.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("entity {id} is not classified")]
    NotClassified { id: EntityId },

    #[error("entity {id} is no longer present")]
    Missing { id: EntityId },

    #[error("{message}")]
    Rejected { message: String },
}

impl ModelError {
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }
}

/// External model operating on entities.
pub trait EntityModel<E: Entity> {
    /// Assign a classification to one entity.
    fn classify(&self, entity: &E, label: Label) -> Result<()>;

    /// Remove the classification of one entity.
    fn declassify(&self, entity: &E) -> Result<()>;

    /// Remove the classification of every entity in the set.
    ///
    /// Returns the entity selection should refocus on afterward, if any
    /// (entities may have been merged or rebuilt by the operation).
    fn declassify_set(&self, entities: &[Rc<E>]) -> Result<Option<Rc<E>>>;

    /// Dump diagnostic information for one entity.
    fn dump(&self, entity: &E);
}
