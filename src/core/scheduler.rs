//=========================================================================
// Scheduler
//=========================================================================
//
// Time-ordered insertion into the two channel queues, and cancellation.
//
// Each queue is kept sorted by due tick. A new instance goes in front of
// the first entry that is due strictly later, so entries sharing a due
// tick are serviced in the order they were scheduled:
//
//   queue:   [3:A] [3:B] [5:C]
//   insert   3:D  →  [3:A] [3:B] [3:D] [5:C]
//
// Both operations are linear scans; queues are bounded by pool capacity.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::warn;

//=== Internal Dependencies ===============================================

use crate::core::dispatch::ObjectRef;
use crate::core::pool::{EventPool, ListId};
use crate::core::registry::{Channel, EventHandle};

//=== Scheduler ===========================================================

pub(crate) struct Scheduler {
    now: u64,
}

impl Scheduler {
    pub(crate) fn new() -> Self {
        Self { now: 0 }
    }

    //--- Clock ------------------------------------------------------------

    pub(crate) fn now(&self) -> u64 {
        self.now
    }

    /// Moves the logical clock forward. Backward moves are ignored.
    pub(crate) fn advance_to(&mut self, now: u64) {
        if now < self.now {
            warn!("Ignoring clock moving backwards ({} -> {})", self.now, now);
            return;
        }
        self.now = now;
    }

    //--- insert() ---------------------------------------------------------
    //
    // Stamps sender and due tick, detaches the slot from whatever list
    // holds it, and links it into the channel queue in due order.
    //
    pub(crate) fn insert(
        &self,
        pool: &mut EventPool,
        index: usize,
        channel: Channel,
        sender: ObjectRef,
        delay: u64,
    ) -> u64 {
        let due = self.now.saturating_add(delay);
        let list = ListId::from(channel);

        let slot = pool.slot_mut(index);
        slot.sender = Some(sender);
        slot.due = due;

        pool.lists_mut().unlink(index);

        let before = pool
            .lists()
            .iter(list)
            .find(|&other| pool.slot(other).due > due);

        match before {
            Some(before) => pool.lists_mut().insert_before(list, before, index),
            None => pool.lists_mut().push_back(list, index),
        }

        due
    }

    //--- cancel() ---------------------------------------------------------
    //
    // Releases every gameplay-queue instance sent by `sender`, optionally
    // restricted to one definition. The GUI queue is never searched.
    //
    pub(crate) fn cancel(
        &self,
        pool: &mut EventPool,
        sender: &ObjectRef,
        handle: Option<EventHandle>,
    ) -> usize {
        let mut cancelled = 0;
        let mut cursor = pool.lists().head(ListId::Normal);

        while let Some(index) = cursor {
            cursor = pool.lists().next(index);

            let slot = pool.slot(index);
            let same_sender = slot.sender.as_ref() == Some(sender);
            let same_def = match handle {
                None => true,
                Some(h) => slot.def.as_ref().map(|d| d.handle()) == Some(h),
            };

            if same_sender && same_def {
                pool.release(index);
                cancelled += 1;
            }
        }

        cancelled
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
