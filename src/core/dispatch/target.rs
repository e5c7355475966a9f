//=========================================================================
// Event Targets
//=========================================================================
//
// The dispatch contract and the non-owning sender reference.
//
// Senders are held weakly: the event system never keeps an object alive.
// Objects should still cancel their pending events in their teardown
// path; an instance whose sender is already gone is dropped at dispatch
// time instead of being delivered.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

//=== Internal Dependencies ===============================================

use crate::core::args::EventArgs;
use crate::core::registry::EventDef;
use crate::core::EventSystem;

//=== EventTarget =========================================================

/// An object that can receive events.
///
/// # Example
///
/// ```rust
/// use aetheric_events::prelude::*;
///
/// struct Door {
///     open: bool,
/// }
///
/// impl EventTarget for Door {
///     fn process_event(&mut self, _events: &mut EventSystem, def: &EventDef, args: &EventArgs) {
///         if def.name() == "set_open" {
///             self.open = args.get::<bool>(0).unwrap_or(false);
///         }
///     }
/// }
/// ```
pub trait EventTarget {
    /// Called synchronously by the dispatcher.
    ///
    /// `args` always matches `def.format()`. The handler may schedule or
    /// cancel events through `events`, including events for itself.
    fn process_event(&mut self, events: &mut EventSystem, def: &EventDef, args: &EventArgs);

    /// Whether this target handles `def` at all.
    ///
    /// Events for which this returns `false` are released without
    /// dispatch. Default: every event.
    fn responds_to(&self, _def: &EventDef) -> bool {
        true
    }
}

/// Shared, interior-mutable handle to a target.
pub type SharedTarget = Rc<RefCell<dyn EventTarget>>;

//=== ObjectRef ===========================================================

/// Weak back-reference to an event sender.
///
/// Two `ObjectRef`s are equal when they refer to the same object. This is
/// the identity used for cancellation.
#[derive(Clone)]
pub struct ObjectRef {
    target: Weak<RefCell<dyn EventTarget>>,
}

impl ObjectRef {
    /// Creates a reference to a concrete target.
    pub fn new<T: EventTarget + 'static>(target: &Rc<RefCell<T>>) -> Self {
        let shared: SharedTarget = target.clone();
        Self::from_shared(&shared)
    }

    pub fn from_shared(target: &SharedTarget) -> Self {
        Self {
            target: Rc::downgrade(target),
        }
    }

    pub fn upgrade(&self) -> Option<SharedTarget> {
        self.target.upgrade()
    }

    pub fn is_alive(&self) -> bool {
        self.target.strong_count() > 0
    }

    fn addr(&self) -> *const () {
        self.target.as_ptr() as *const ()
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for ObjectRef {}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("addr", &self.addr())
            .field("alive", &self.is_alive())
            .finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
