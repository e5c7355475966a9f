//=========================================================================
// Aetheric Events Library Root
//
// Typed, pooled, time-ordered event bus for a tick-driven game loop.
//
// Responsibilities:
// - Register event kinds with a fixed argument signature
// - Schedule instances against a logical tick clock from a fixed pool
// - Dispatch due events to weakly referenced targets per channel
// - Optionally drive the clock from a fixed-rate logic thread
//
// Typical usage:
// ```
// use std::cell::RefCell;
// use std::rc::Rc;
// use aetheric_events::prelude::*;
//
// struct Counter(i32);
//
// impl EventTarget for Counter {
//     fn process_event(&mut self, _: &mut EventSystem, _: &EventDef, args: &EventArgs) {
//         self.0 += args.get::<i32>(0).unwrap_or(0);
//     }
// }
//
// let mut builder = EventSystem::builder();
// let add = builder.define("add", Channel::Normal, &[ArgumentType::Int], None).unwrap();
// let mut events = builder.build();
// events.init().unwrap();
//
// let counter = Rc::new(RefCell::new(Counter(0)));
// let sender = ObjectRef::new(&counter);
// events.schedule(add, &sender, 2, &event_args![5]).unwrap();
//
// events.service_queue(Channel::Normal, 1).unwrap();
// assert_eq!(counter.borrow().0, 0);
// events.service_queue(Channel::Normal, 2).unwrap();
// assert_eq!(counter.borrow().0, 5);
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` holds the event system itself. It is usable on its own from any
// single thread that owns the game loop.
//
pub mod core;
pub mod prelude;

//--- Internal Modules ----------------------------------------------------
//
// `driver` runs an `EventSystem` on a fixed-rate logic thread.
//
mod driver;

//--- Public Exports ------------------------------------------------------

pub use crate::core::{EventError, EventSystem, EventSystemBuilder};
pub use driver::{DriverCommand, DriverHandle, DriverReport, FrameDriver, FrameDriverBuilder};
