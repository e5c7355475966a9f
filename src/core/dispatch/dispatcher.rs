//=========================================================================
// Dispatcher
//=========================================================================
//
// Drains due events from one channel queue and hands them to targets.
//
// Flow (per due instance):
// ```text
//   queue head ──take()──> slot freed ──upgrade sender──> responds_to?
//                                              │                │
//                                         dead: drop       process_event()
// ```
//
// The slot is back on the free list before its handler runs, so a handler
// that schedules new events sees the pool in a consistent state and can
// reuse the slot it was delivered from.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{debug, trace, warn};

//=== Internal Dependencies ===============================================

use crate::core::args::{EventArg, EventArgs};
use crate::core::dispatch::ObjectRef;
use crate::core::error::{fatal, EventError};
use crate::core::pool::ListId;
use crate::core::registry::{Channel, EventDef, EventHandle};
use crate::core::EventSystem;

//=== Dispatch ============================================================

impl EventSystem {
    //--- service_queue() --------------------------------------------------

    /// Advances the clock to `now` and dispatches every event on `channel`
    /// that is due at or before it, in due order.
    ///
    /// Events scheduled by a handler with zero delay are due immediately and
    /// are picked up by the same call. Returns the number dispatched.
    ///
    /// Both channels share one monotonic clock. A `now` earlier than the
    /// current clock is ignored, so after `service_queue(Gui, 5)` a call to
    /// `service_queue(Normal, 3)` services gameplay events due up to tick 5.
    ///
    /// # Errors
    ///
    /// [`EventError::EventOverflow`] once more than `max_events_per_tick`
    /// events have been dispatched in this call. The remaining events stay
    /// queued.
    pub fn service_queue(&mut self, channel: Channel, now: u64) -> Result<usize, EventError> {
        self.scheduler.advance_to(now);
        let now = self.scheduler.now();
        let list = ListId::from(channel);

        let mut processed = 0usize;

        while let Some(index) = self.pool.lists().head(list) {
            if self.pool.slot(index).due > now {
                break;
            }

            let Some(event) = self.pool.take(index) else {
                continue;
            };

            self.deliver(&event.def, event.sender.as_ref(), &event.args)?;

            processed += 1;
            self.total_processed += 1;

            if processed > self.max_events_per_tick {
                return Err(fatal(EventError::EventOverflow {
                    channel,
                    limit: self.max_events_per_tick,
                }));
            }
        }

        if processed > 0 {
            trace!("Serviced {} {:?} event(s) at tick {}", processed, channel, now);
        }
        Ok(processed)
    }

    //--- process_event() --------------------------------------------------

    /// Delivers an event to `target` immediately, bypassing the queues.
    ///
    /// Arguments are validated exactly as for [`EventSystem::schedule`].
    pub fn process_event(
        &mut self,
        target: &ObjectRef,
        handle: EventHandle,
        args: &[EventArg],
    ) -> Result<(), EventError> {
        if !self.initialized {
            return Err(fatal(EventError::NotInitialized));
        }

        let def = self.shared_def(handle).map_err(fatal)?;
        def.validate_args(args).map_err(fatal)?;

        let args = EventArgs::from_validated(args);
        self.deliver(&def, Some(target), &args)?;
        self.total_processed += 1;
        Ok(())
    }

    //--- deliver() --------------------------------------------------------

    fn deliver(
        &mut self,
        def: &EventDef,
        sender: Option<&ObjectRef>,
        args: &EventArgs,
    ) -> Result<(), EventError> {
        let Some(shared) = sender.and_then(ObjectRef::upgrade) else {
            warn!("Dropping '{}' event: sender no longer exists", def.name());
            return Ok(());
        };

        let Ok(mut target) = shared.try_borrow_mut() else {
            return Err(fatal(EventError::TargetBusy {
                event: def.name().to_string(),
            }));
        };

        if !target.responds_to(def) {
            debug!("Target does not respond to '{}' event", def.name());
            return Ok(());
        }

        trace!("Dispatching '{}'", def.name());
        target.process_event(self, def, args);
        Ok(())
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::core::args::{
        ArgumentType, EventArg, EventArgs, Guid, Mat3, Mat4, OpaquePtr, Point, Rect, Vec3,
    };
    use crate::core::dispatch::{EventTarget, ObjectRef};
    use crate::core::error::EventError;
    use crate::core::registry::{Channel, EventDef, EventHandle};
    use crate::core::{EventSystem, EventSystemBuilder};
    use crate::event_args;

    //=====================================================================
    // Fixtures
    //=====================================================================

    /// Records every delivery as (event name, first int arg if any).
    #[derive(Default)]
    struct Recorder {
        log: Vec<(String, Option<i32>)>,
    }

    impl EventTarget for Recorder {
        fn process_event(&mut self, _: &mut EventSystem, def: &EventDef, args: &EventArgs) {
            self.log.push((def.name().to_string(), args.get::<i32>(0)));
        }
    }

    /// Reschedules its own event with zero delay on every delivery.
    struct Looper {
        me: Option<ObjectRef>,
        handle: EventHandle,
        calls: usize,
    }

    impl EventTarget for Looper {
        fn process_event(&mut self, events: &mut EventSystem, _: &EventDef, _: &EventArgs) {
            self.calls += 1;
            if let Some(me) = &self.me {
                let _ = events.schedule(self.handle, me, 0, &[]);
            }
        }
    }

    fn recorder() -> (Rc<RefCell<Recorder>>, ObjectRef) {
        let target = Rc::new(RefCell::new(Recorder::default()));
        let sender = ObjectRef::new(&target);
        (target, sender)
    }

    fn conserved(events: &EventSystem) -> bool {
        events.free_count()
            + events.pending_count(Channel::Normal)
            + events.pending_count(Channel::Gui)
            == events.capacity()
    }

    //=====================================================================
    // Delivery
    //=====================================================================

    #[test]
    fn arguments_arrive_unchanged() {
        struct Capture(Option<EventArgs>);
        impl EventTarget for Capture {
            fn process_event(&mut self, _: &mut EventSystem, _: &EventDef, args: &EventArgs) {
                self.0 = Some(args.clone());
            }
        }

        let mut builder = EventSystemBuilder::new().with_pool_capacity(4);
        let hit = builder
            .define_spec("hit", Channel::Normal, "ifpvgsb", None)
            .unwrap();
        let mut events = builder.build();
        events.init().unwrap();

        let target = Rc::new(RefCell::new(Capture(None)));
        let sender = ObjectRef::new(&target);
        let args = event_args![
            42,
            2.5f32,
            Point::new(3, -4),
            Vec3::new(1.0, 2.0, 3.0),
            Guid(0xDEAD_BEEF),
            "sword",
            true
        ];
        events.schedule(hit, &sender, 0, &args).unwrap();

        assert_eq!(events.service_queue(Channel::Normal, 0).unwrap(), 1);

        let got = target.borrow().0.clone().expect("event delivered");
        assert_eq!(got.as_slice(), &args[..]);
        assert_eq!(got.get::<i32>(0), Some(42));
        assert_eq!(got.str(5), Some("sword"));
        assert_eq!(got.get::<bool>(6), Some(true));
    }

    #[test]
    fn pointer_matrix_and_wide_arguments_arrive_unchanged() {
        struct Capture(Option<EventArgs>);
        impl EventTarget for Capture {
            fn process_event(&mut self, _: &mut EventSystem, _: &EventDef, args: &EventArgs) {
                self.0 = Some(args.clone());
            }
        }

        let mut builder = EventSystemBuilder::new().with_pool_capacity(2);
        let blit = builder
            .define_spec("blit", Channel::Gui, "armMw", None)
            .unwrap();
        let mut events = builder.build();
        events.init().unwrap();

        let marker = 0xABCDu32;
        let ptr = OpaquePtr::from_ptr(&marker as *const u32);
        let mut skew = Mat3::IDENTITY;
        skew.rows[0][1] = 0.5;
        let mut shift = Mat4::IDENTITY;
        shift.rows[3] = [4.0, 5.0, 6.0, 1.0];

        let args = [
            EventArg::from(ptr),
            EventArg::from(Rect::new(1, 2, 30, 40)),
            EventArg::from(skew),
            EventArg::from(shift),
            EventArg::wide("wide text ✓"),
        ];

        let target = Rc::new(RefCell::new(Capture(None)));
        let sender = ObjectRef::new(&target);
        events.schedule(blit, &sender, 0, &args).unwrap();
        assert_eq!(events.service_queue(Channel::Gui, 0).unwrap(), 1);

        let got = target.borrow().0.clone().expect("event delivered");
        assert_eq!(got.as_slice(), &args[..]);

        let stored = got.get::<OpaquePtr>(0).expect("pointer argument");
        assert_eq!(stored.addr(), &marker as *const u32 as usize);
        assert_eq!(stored.as_ptr::<u32>(), &marker as *const u32);
        assert_eq!(got.get::<Rect>(1), Some(Rect::new(1, 2, 30, 40)));
        assert_eq!(got.get::<Mat3>(2), Some(skew));
        assert_eq!(got.get::<Mat4>(3), Some(shift));
        assert_eq!(got.wide_string(4).as_deref(), Some("wide text ✓"));
        assert!(conserved(&events));
    }

    #[test]
    fn cancelled_events_are_never_delivered() {
        let mut builder = EventSystemBuilder::new().with_pool_capacity(8);
        let hit = builder.define("hit", Channel::Normal, &[ArgumentType::Int], None).unwrap();
        let heal = builder.define("heal", Channel::Normal, &[ArgumentType::Int], None).unwrap();
        let menu = builder.define("menu", Channel::Gui, &[], None).unwrap();
        let mut events = builder.build();
        events.init().unwrap();

        let (alice, alice_ref) = recorder();
        let (bob, bob_ref) = recorder();

        events.schedule(hit, &alice_ref, 1, &event_args![1]).unwrap();
        events.schedule(heal, &alice_ref, 2, &event_args![2]).unwrap();
        events.schedule(hit, &bob_ref, 1, &event_args![3]).unwrap();
        events.schedule(menu, &alice_ref, 1, &[]).unwrap();

        assert_eq!(events.cancel(&alice_ref, None), 2);

        assert_eq!(events.service_queue(Channel::Normal, 2).unwrap(), 1);
        assert!(alice.borrow().log.is_empty(), "cancelled events must not reach the target");
        assert_eq!(bob.borrow().log, vec![("hit".to_string(), Some(3))]);

        // GUI events survive a sender cancel
        assert_eq!(events.service_queue(Channel::Gui, 2).unwrap(), 1);
        assert_eq!(alice.borrow().log, vec![("menu".to_string(), None)]);
        assert!(conserved(&events));
    }

    #[test]
    fn due_order_then_schedule_order() {
        let mut builder = EventSystemBuilder::new().with_pool_capacity(8);
        let a = builder.define("a", Channel::Normal, &[ArgumentType::Int], None).unwrap();
        let b = builder.define("b", Channel::Normal, &[ArgumentType::Int], None).unwrap();
        let mut events = builder.build();
        events.init().unwrap();
        let (target, sender) = recorder();

        events.schedule(a, &sender, 5, &event_args![1]).unwrap();
        events.schedule(b, &sender, 3, &event_args![2]).unwrap();
        events.schedule(a, &sender, 3, &event_args![3]).unwrap();

        assert_eq!(events.service_queue(Channel::Normal, 2).unwrap(), 0);
        assert_eq!(events.service_queue(Channel::Normal, 4).unwrap(), 2);
        assert_eq!(events.service_queue(Channel::Normal, 5).unwrap(), 1);

        let log = &target.borrow().log;
        assert_eq!(
            log.iter().map(|(_, v)| v.unwrap()).collect::<Vec<_>>(),
            vec![2, 3, 1]
        );
        assert!(conserved(&events));
    }

    #[test]
    fn channels_are_serviced_independently() {
        let mut builder = EventSystemBuilder::new().with_pool_capacity(4);
        let game = builder.define("game", Channel::Normal, &[], None).unwrap();
        let menu = builder.define("menu", Channel::Gui, &[], None).unwrap();
        let mut events = builder.build();
        events.init().unwrap();
        let (target, sender) = recorder();

        events.schedule(game, &sender, 0, &[]).unwrap();
        events.schedule(menu, &sender, 0, &[]).unwrap();

        assert_eq!(events.service_queue(Channel::Gui, 0).unwrap(), 1);
        assert_eq!(target.borrow().log[0].0, "menu");
        assert_eq!(events.pending_count(Channel::Normal), 1);

        assert_eq!(events.service_queue(Channel::Normal, 0).unwrap(), 1);
        assert_eq!(target.borrow().log[1].0, "game");
        assert_eq!(events.total_processed(), 2);
    }

    #[test]
    fn dead_sender_is_dropped_without_dispatch() {
        let mut builder = EventSystemBuilder::new().with_pool_capacity(2);
        let ping = builder.define("ping", Channel::Normal, &[], None).unwrap();
        let mut events = builder.build();
        events.init().unwrap();

        let (target, sender) = recorder();
        events.schedule(ping, &sender, 0, &[]).unwrap();
        drop(target);

        assert_eq!(events.service_queue(Channel::Normal, 0).unwrap(), 1);
        assert_eq!(events.free_count(), 2);
    }

    #[test]
    fn non_responding_target_is_skipped() {
        struct Deaf(usize);
        impl EventTarget for Deaf {
            fn process_event(&mut self, _: &mut EventSystem, _: &EventDef, _: &EventArgs) {
                self.0 += 1;
            }
            fn responds_to(&self, def: &EventDef) -> bool {
                def.name() != "ignored"
            }
        }

        let mut builder = EventSystemBuilder::new().with_pool_capacity(2);
        let ignored = builder.define("ignored", Channel::Normal, &[], None).unwrap();
        let heard = builder.define("heard", Channel::Normal, &[], None).unwrap();
        let mut events = builder.build();
        events.init().unwrap();

        let target = Rc::new(RefCell::new(Deaf(0)));
        let sender = ObjectRef::new(&target);
        events.schedule(ignored, &sender, 0, &[]).unwrap();
        events.schedule(heard, &sender, 0, &[]).unwrap();

        events.service_queue(Channel::Normal, 0).unwrap();
        assert_eq!(target.borrow().0, 1);
        assert!(conserved(&events));
    }

    #[test]
    fn immediate_process_event_bypasses_queue() {
        let mut builder = EventSystemBuilder::new().with_pool_capacity(1);
        let now = builder.define("now", Channel::Normal, &[ArgumentType::Int], None).unwrap();
        let mut events = builder.build();
        events.init().unwrap();
        let (target, sender) = recorder();

        events.process_event(&sender, now, &event_args![9]).unwrap();

        assert_eq!(target.borrow().log, vec![("now".to_string(), Some(9))]);
        assert_eq!(events.free_count(), 1);

        let bad = events.process_event(&sender, now, &[]);
        assert!(matches!(bad, Err(EventError::ArgumentCountMismatch { .. })));
    }

    //=====================================================================
    // Re-entrancy
    //=====================================================================

    #[test]
    fn handler_can_schedule_follow_up_events() {
        struct Chain {
            me: Option<ObjectRef>,
            next: EventHandle,
            seen: Vec<String>,
        }
        impl EventTarget for Chain {
            fn process_event(&mut self, events: &mut EventSystem, def: &EventDef, _: &EventArgs) {
                self.seen.push(def.name().to_string());
                if def.name() == "first" {
                    if let Some(me) = &self.me {
                        events.schedule(self.next, me, 2, &[]).unwrap();
                    }
                }
            }
        }

        let mut builder = EventSystemBuilder::new().with_pool_capacity(1);
        let first = builder.define("first", Channel::Normal, &[], None).unwrap();
        let second = builder.define("second", Channel::Normal, &[], None).unwrap();
        let mut events = builder.build();
        events.init().unwrap();

        let target = Rc::new(RefCell::new(Chain {
            me: None,
            next: second,
            seen: Vec::new(),
        }));
        let me = ObjectRef::new(&target);
        target.borrow_mut().me = Some(me.clone());

        // Pool of one: the follow-up reuses the slot that was just delivered
        events.schedule(first, &me, 0, &[]).unwrap();
        assert_eq!(events.service_queue(Channel::Normal, 0).unwrap(), 1);
        assert_eq!(events.pending_count(Channel::Normal), 1);

        assert_eq!(events.service_queue(Channel::Normal, 2).unwrap(), 1);
        assert_eq!(target.borrow().seen, vec!["first", "second"]);
        assert!(conserved(&events));
    }

    #[test]
    fn runaway_rescheduling_overflows() {
        let mut builder = EventSystemBuilder::new()
            .with_pool_capacity(4)
            .with_max_events_per_tick(16);
        let spin = builder.define("spin", Channel::Normal, &[], None).unwrap();
        let mut events = builder.build();
        events.init().unwrap();

        let target = Rc::new(RefCell::new(Looper {
            me: None,
            handle: spin,
            calls: 0,
        }));
        let me = ObjectRef::new(&target);
        target.borrow_mut().me = Some(me.clone());

        events.schedule(spin, &me, 0, &[]).unwrap();
        let result = events.service_queue(Channel::Normal, 0);

        assert_eq!(
            result,
            Err(EventError::EventOverflow {
                channel: Channel::Normal,
                limit: 16
            })
        );
        assert_eq!(target.borrow().calls, 17);
        assert!(conserved(&events));
    }

    #[test]
    fn processing_into_busy_target_fails() {
        struct Nested {
            me: Option<ObjectRef>,
            handle: EventHandle,
            result: Option<Result<(), EventError>>,
        }
        impl EventTarget for Nested {
            fn process_event(&mut self, events: &mut EventSystem, _: &EventDef, _: &EventArgs) {
                if self.result.is_none() {
                    if let Some(me) = self.me.clone() {
                        self.result = Some(events.process_event(&me, self.handle, &[]));
                    }
                }
            }
        }

        let mut builder = EventSystemBuilder::new().with_pool_capacity(1);
        let poke = builder.define("poke", Channel::Normal, &[], None).unwrap();
        let mut events = builder.build();
        events.init().unwrap();

        let target = Rc::new(RefCell::new(Nested {
            me: None,
            handle: poke,
            result: None,
        }));
        let me = ObjectRef::new(&target);
        target.borrow_mut().me = Some(me.clone());

        events.process_event(&me, poke, &[]).unwrap();
        assert!(matches!(
            target.borrow().result,
            Some(Err(EventError::TargetBusy { .. }))
        ));
    }
}
