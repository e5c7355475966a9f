//=========================================================================
// Event Instance Pool
//=========================================================================
//
// Fixed array of reusable event instances.
//
// Architecture:
//   EventPool
//     ├─ slots: Vec<Slot>        (allocated once, never resized)
//     └─ lists: IndexLists       (free / normal queue / gui queue)
//
// Flow:
//   acquire() → pop free head, validate + copy args → (scheduler links it)
//   release() → clear fields → push onto free tail
//
//=========================================================================

//=== Module Declarations =================================================

mod index_list;

//=== External Dependencies ===============================================

use std::sync::Arc;

//=== Internal Dependencies ===============================================

use crate::core::args::{EventArg, EventArgs};
use crate::core::dispatch::ObjectRef;
use crate::core::error::EventError;
use crate::core::registry::EventDef;

pub(crate) use index_list::{IndexLists, ListId};

//=== Slot ================================================================

/// One pooled event instance.
#[derive(Default)]
pub(crate) struct Slot {
    pub(crate) def: Option<Arc<EventDef>>,
    pub(crate) sender: Option<ObjectRef>,
    pub(crate) due: u64,
    pub(crate) args: EventArgs,
}

impl Slot {
    fn clear(&mut self) {
        self.def = None;
        self.sender = None;
        self.due = 0;
        self.args.clear();
    }
}

/// Contents of a slot taken out for dispatch.
pub(crate) struct TakenEvent {
    pub(crate) def: Arc<EventDef>,
    pub(crate) sender: Option<ObjectRef>,
    pub(crate) args: EventArgs,
}

//=== EventPool ===========================================================

pub(crate) struct EventPool {
    slots: Vec<Slot>,
    lists: IndexLists,
}

impl EventPool {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| Slot::default()).collect(),
            lists: IndexLists::new(capacity),
        }
    }

    //--- Queries ----------------------------------------------------------

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn len(&self, list: ListId) -> usize {
        self.lists.len(list)
    }

    pub(crate) fn lists(&self) -> &IndexLists {
        &self.lists
    }

    pub(crate) fn lists_mut(&mut self) -> &mut IndexLists {
        &mut self.lists
    }

    pub(crate) fn slot(&self, index: usize) -> &Slot {
        &self.slots[index]
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> &mut Slot {
        &mut self.slots[index]
    }

    //--- Acquire / Release ------------------------------------------------

    /// Takes a free slot and fills it with `def` and a copy of `args`.
    ///
    /// Arguments are validated before any slot is touched, so a failed
    /// acquire leaves the pool unchanged. The returned slot is on no list
    /// until the caller links it into a queue.
    pub(crate) fn acquire(
        &mut self,
        def: &Arc<EventDef>,
        args: &[EventArg],
    ) -> Result<usize, EventError> {
        def.validate_args(args)?;

        let index = self
            .lists
            .pop_front(ListId::Free)
            .ok_or(EventError::PoolExhausted {
                capacity: self.capacity(),
            })?;

        let slot = &mut self.slots[index];
        slot.def = Some(Arc::clone(def));
        slot.args = EventArgs::from_validated(args);
        Ok(index)
    }

    /// Clears a slot and returns it to the free list.
    pub(crate) fn release(&mut self, index: usize) {
        self.slots[index].clear();
        self.lists.push_back(ListId::Free, index);
    }

    /// Moves a slot's contents out and returns the slot to the free list.
    pub(crate) fn take(&mut self, index: usize) -> Option<TakenEvent> {
        let slot = &mut self.slots[index];
        let taken = slot.def.take().map(|def| TakenEvent {
            def,
            sender: slot.sender.take(),
            args: std::mem::take(&mut slot.args),
        });
        self.release(index);
        taken
    }

    /// Drops every instance without dispatching it.
    pub(crate) fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.clear();
        }
        self.lists.reset();
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
