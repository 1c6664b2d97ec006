#![forbid(unsafe_code)]

//! In-process typed publish/subscribe channel for selection events.
//!
//! # Design
//!
//! `SelectionBus<E>` delivers events synchronously, in subscription order, on
//! the calling thread. Subscribers are stored as `Weak` handlers and cleaned
//! up lazily during delivery; [`Subscription`] is the RAII guard that keeps a
//! handler alive and unsubscribes it on drop.
//!
//! A publish that arrives while a delivery pass is in flight (a subscriber
//! publishing from inside its handler) is queued and delivered after the
//! current pass completes, never interleaved.
//!
//! The bus also records the most recent payload per event kind. That is the
//! state command actions read at invocation time, so they always act on the
//! *current* selection rather than a snapshot captured when they were
//! enabled.
//!
//! # Concurrency
//!
//! Single-threaded by construction (`Rc`, `RefCell`, `Cell`). Cross-thread
//! entity mutation must be marshaled onto the owning thread by the embedder
//! before publishing; `publish` performs no locking.
//!
//! # Invariants
//!
//! 1. Handlers for one event run in subscription order.
//! 2. No two delivery passes are ever interleaved.
//! 3. Dropping a [`Subscription`] removes the handler before the next
//!    delivery pass.
//! 4. Delivery is purely in-process and ephemeral; nothing survives restart.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use selsync_core::{Entity, Selection};

/// A selection change carried by the bus.
#[derive(Debug)]
pub enum SelectionEvent<E> {
    /// A single entity was selected, or the selection was cleared (`None`).
    Entity(Option<Rc<E>>),
    /// An ordered set of entities was selected.
    EntitySet(Vec<Rc<E>>),
}

impl<E> Clone for SelectionEvent<E> {
    fn clone(&self) -> Self {
        match self {
            Self::Entity(entity) => Self::Entity(entity.clone()),
            Self::EntitySet(entities) => Self::EntitySet(entities.clone()),
        }
    }
}

impl<E> SelectionEvent<E> {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Entity(_) => EventKind::Entity,
            Self::EntitySet(_) => EventKind::EntitySet,
        }
    }
}

/// Event kind a subscriber registers interest in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Entity,
    EntitySet,
}

type Handler<E> = Box<dyn Fn(&SelectionEvent<E>)>;

struct Subscriber<E> {
    kind: EventKind,
    handler: Weak<Handler<E>>,
}

struct BusInner<E> {
    subscribers: RefCell<Vec<Subscriber<E>>>,
    last_entity: RefCell<Option<Rc<E>>>,
    last_set: RefCell<Vec<Rc<E>>>,
    delivering: Cell<bool>,
    queue: RefCell<VecDeque<SelectionEvent<E>>>,
}

/// Typed publish/subscribe channel carrying [`SelectionEvent`]s.
///
/// Cloning a `SelectionBus` creates a new handle to the **same** channel; the
/// engine is one subscriber/publisher among peers, never the exclusive owner.
pub struct SelectionBus<E> {
    inner: Rc<BusInner<E>>,
}

impl<E> Clone for SelectionBus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E> Default for SelectionBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for SelectionBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionBus")
            .field("subscribers", &self.inner.subscribers.borrow().len())
            .field("delivering", &self.inner.delivering.get())
            .finish()
    }
}

impl<E> SelectionBus<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(BusInner {
                subscribers: RefCell::new(Vec::new()),
                last_entity: RefCell::new(None),
                last_set: RefCell::new(Vec::new()),
                delivering: Cell::new(false),
                queue: RefCell::new(VecDeque::new()),
            }),
        }
    }
}

impl<E: Entity + 'static> SelectionBus<E> {
    /// Register a handler for one event kind.
    ///
    /// The handler stays registered for the lifetime of the returned
    /// [`Subscription`].
    #[must_use]
    pub fn subscribe(
        &self,
        kind: EventKind,
        handler: impl Fn(&SelectionEvent<E>) + 'static,
    ) -> Subscription {
        let handler: Rc<Handler<E>> = Rc::new(Box::new(handler));
        self.inner.subscribers.borrow_mut().push(Subscriber {
            kind,
            handler: Rc::downgrade(&handler),
        });
        Subscription {
            _keep_alive: handler,
        }
    }

    /// Publish an event to every subscriber of its kind, synchronously and
    /// in subscription order.
    ///
    /// Re-entrant publishes are queued and delivered after the current pass.
    pub fn publish(&self, event: SelectionEvent<E>) {
        if self.inner.delivering.get() {
            tracing::trace!(message = "bus.publish.queued", kind = ?event.kind());
            self.inner.queue.borrow_mut().push_back(event);
            return;
        }

        self.inner.delivering.set(true);
        self.deliver(&event);
        loop {
            let next = self.inner.queue.borrow_mut().pop_front();
            match next {
                Some(queued) => self.deliver(&queued),
                None => break,
            }
        }
        self.inner.delivering.set(false);
    }

    /// Most recent single-entity payload (`None` if cleared or never
    /// published).
    #[must_use]
    pub fn current_entity(&self) -> Option<Rc<E>> {
        self.inner.last_entity.borrow().clone()
    }

    /// Most recent entity-set payload (empty if cleared or never published).
    #[must_use]
    pub fn current_entity_set(&self) -> Vec<Rc<E>> {
        self.inner.last_set.borrow().clone()
    }

    /// Current selection shape: a live (non-empty) set wins over the single
    /// entity; an empty set normalizes to [`Selection::None`].
    #[must_use]
    pub fn current_selection(&self) -> Selection<E> {
        let set = self.current_entity_set();
        if !set.is_empty() {
            return Selection::set(set);
        }
        match self.current_entity() {
            Some(entity) => Selection::single(entity),
            None => Selection::None,
        }
    }

    fn deliver(&self, event: &SelectionEvent<E>) {
        match event {
            SelectionEvent::Entity(entity) => {
                *self.inner.last_entity.borrow_mut() = entity.clone();
            }
            SelectionEvent::EntitySet(entities) => {
                *self.inner.last_set.borrow_mut() = entities.clone();
            }
        }

        // Snapshot live handlers so subscribers may subscribe or drop
        // subscriptions from inside a handler without poisoning the borrow.
        let kind = event.kind();
        let handlers: Vec<Rc<Handler<E>>> = {
            let mut subscribers = self.inner.subscribers.borrow_mut();
            subscribers.retain(|entry| entry.handler.strong_count() > 0);
            subscribers
                .iter()
                .filter(|entry| entry.kind == kind)
                .filter_map(|entry| entry.handler.upgrade())
                .collect()
        };

        tracing::trace!(message = "bus.deliver", kind = ?kind, handlers = handlers.len());
        for handler in handlers {
            handler(event);
        }
    }
}

/// RAII guard keeping a bus handler registered. Dropping it unsubscribes the
/// handler before the next delivery pass.
pub struct Subscription {
    _keep_alive: Rc<dyn Any>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
