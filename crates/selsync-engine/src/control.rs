#![forbid(unsafe_code)]

//! Range controls: bindable id input/output bound to an [`IndexDomain`].
//!
//! # Design
//!
//! A [`RangeControl`] presents one identifier from its domain, with a
//! reserved no-selection sentinel. Both the engine-driven path
//! ([`set_programmatic`](RangeControl::set_programmatic)) and the interactive
//! path ([`commit_user_edit`](RangeControl::commit_user_edit)) go through one
//! notification pipe; the engine's guard is what distinguishes an echo of a
//! programmatic write from genuine user input, not a separate code path.
//!
//! The raw sentinel integer a user types to clear the selection is explicit
//! construction-time configuration, not a process-wide constant.
//!
//! # Invariants
//!
//! 1. After any engine-driven update, the displayed value is [`ControlValue::NoValue`]
//!    or a currently valid id in the bound domain.
//! 2. A user edit outside the domain is rejected and the control reverts to
//!    its last valid value. Routine input validation: logged at debug level,
//!    never surfaced as an error.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use selsync_core::{Entity, EntityId, IndexDomain};

/// Displayed value of a range control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlValue {
    /// The reserved no-selection sentinel.
    NoValue,
    /// A (candidate) entity id.
    Id(EntityId),
}

impl ControlValue {
    #[must_use]
    pub fn id(self) -> Option<EntityId> {
        match self {
            Self::NoValue => None,
            Self::Id(id) => Some(id),
        }
    }
}

type ChangeHandler = Box<dyn Fn(ControlValue)>;

struct ControlInner<E: Entity> {
    name: String,
    domain: IndexDomain<E>,
    /// Raw integer reserved to mean "no selection" in interactive edits.
    no_value: u32,
    value: Cell<ControlValue>,
    on_change: RefCell<Option<ChangeHandler>>,
}

/// Bindable input/output control presenting one id from an [`IndexDomain`].
///
/// Cloning yields a handle to the same control state.
pub struct RangeControl<E: Entity> {
    inner: Rc<ControlInner<E>>,
}

impl<E: Entity> Clone for RangeControl<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E: Entity> std::fmt::Debug for RangeControl<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RangeControl")
            .field("name", &self.inner.name)
            .field("value", &self.inner.value.get())
            .field("no_value", &self.inner.no_value)
            .finish()
    }
}

impl<E: Entity> RangeControl<E> {
    /// Create a control bound to `domain`, with `no_value` as the reserved
    /// raw sentinel for interactive edits.
    #[must_use]
    pub fn new(name: impl Into<String>, domain: IndexDomain<E>, no_value: u32) -> Self {
        Self {
            inner: Rc::new(ControlInner {
                name: name.into(),
                domain,
                no_value,
                value: Cell::new(ControlValue::NoValue),
                on_change: RefCell::new(None),
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The bound index domain.
    #[must_use]
    pub fn domain(&self) -> &IndexDomain<E> {
        &self.inner.domain
    }

    /// Currently displayed value.
    #[must_use]
    pub fn value(&self) -> ControlValue {
        self.inner.value.get()
    }

    /// Currently displayed raw integer (the sentinel for no selection).
    #[must_use]
    pub fn display_raw(&self) -> u32 {
        match self.inner.value.get() {
            ControlValue::NoValue => self.inner.no_value,
            ControlValue::Id(id) => id.raw(),
        }
    }

    /// Install the change handler. Fired on every value change, whatever the
    /// cause; there is exactly one notification pipe.
    pub fn set_on_change(&self, handler: impl Fn(ControlValue) + 'static) {
        *self.inner.on_change.borrow_mut() = Some(Box::new(handler));
    }

    /// The value this control should display for `entity`: the id when the
    /// entity satisfies the domain's predicate, the sentinel otherwise (or
    /// when there is no entity).
    #[must_use]
    pub fn value_for(&self, entity: Option<&E>) -> ControlValue {
        match entity {
            Some(entity) if self.inner.domain.is_valid_selection(entity) => {
                ControlValue::Id(entity.id())
            }
            _ => ControlValue::NoValue,
        }
    }

    /// Engine-path write. Notifies through the same pipe as a user edit; the
    /// caller is expected to hold the synchronization guard.
    pub fn set_programmatic(&self, value: ControlValue) {
        self.apply(value);
    }

    /// Interactive-path commit of a raw spinner value, mapping the reserved
    /// sentinel integer to [`ControlValue::NoValue`].
    pub fn commit_user_edit_raw(&self, raw: u32) -> bool {
        let value = if raw == self.inner.no_value {
            ControlValue::NoValue
        } else {
            ControlValue::Id(EntityId(raw))
        };
        self.commit_user_edit(value)
    }

    /// Interactive-path commit. Accepts the sentinel always and an id only
    /// while it is a current domain member; otherwise rejects the edit and
    /// keeps the last valid value. Returns whether the edit was accepted.
    pub fn commit_user_edit(&self, value: ControlValue) -> bool {
        let valid = match value {
            ControlValue::NoValue => true,
            ControlValue::Id(id) => self.inner.domain.contains(id),
        };
        if !valid {
            tracing::debug!(
                message = "control.reject",
                control = %self.inner.name,
                committed = ?value,
                kept = ?self.inner.value.get(),
            );
            return false;
        }
        self.apply(value);
        true
    }

    /// Set the value and notify, skipping the notification when the value is
    /// unchanged.
    fn apply(&self, value: ControlValue) {
        if self.inner.value.get() == value {
            return;
        }
        self.inner.value.set(value);
        if let Some(handler) = self.inner.on_change.borrow().as_ref() {
            handler(value);
        }
    }
}
