//=========================================================================
// Ticker Demo
//=========================================================================
//
// Runs the event system on a frame driver for a few seconds.
//
// A door opens after one second and closes two seconds later; every state
// change also posts a GUI toast. Run with `RUST_LOG=debug` to see the
// scheduling traffic.
//
//=========================================================================

use std::cell::RefCell;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use aetheric_events::prelude::*;
use log::info;

//=== Door ================================================================

struct Door {
    me: Option<ObjectRef>,
    toast: EventHandle,
    open: bool,
}

impl EventTarget for Door {
    fn process_event(&mut self, events: &mut EventSystem, def: &EventDef, args: &EventArgs) {
        match def.name() {
            "set_open" => {
                self.open = args.get::<bool>(0).unwrap_or(false);
                let text = if self.open { "Door opened" } else { "Door closed" };
                if let Some(me) = &self.me {
                    let _ = events.post_event(self.toast, me, &event_args![text]);
                }
            }
            "toast" => {
                info!("[tick {}] {}", events.now(), args.str(0).unwrap_or(""));
            }
            _ => {}
        }
    }
}

//=== main ================================================================

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut system = EventSystem::builder().with_pool_capacity(64);
    let set_open = system
        .define_spec("set_open", Channel::Normal, "b", None)
        .expect("define set_open");
    let toast = system
        .define_spec("toast", Channel::Gui, "s", None)
        .expect("define toast");

    let driver = FrameDriverBuilder::new().with_tps(30.0).build();
    let handle = driver.spawn(system, move |events| {
        let door = Rc::new(RefCell::new(Door {
            me: None,
            toast,
            open: false,
        }));
        let me = ObjectRef::new(&door);
        door.borrow_mut().me = Some(me.clone());

        events.post_event_after(set_open, &me, Duration::from_secs(1), &event_args![true])?;
        events.post_event_after(set_open, &me, Duration::from_secs(3), &event_args![false])?;
        Ok(door)
    });

    thread::sleep(Duration::from_secs(4));

    match handle.shutdown() {
        Ok(report) => info!(
            "Ran {} ticks, dispatched {} events",
            report.ticks, report.events_processed
        ),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
