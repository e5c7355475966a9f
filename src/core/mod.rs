//=========================================================================
// Event System Core
//
// Single-threaded building blocks of the event bus.
//
// Architecture:
// ```text
//   EventSystem
//     ├─ registry   (EventRegistry: name → EventDef, frozen at build)
//     ├─ pool       (EventPool: fixed slots + free/normal/gui lists)
//     ├─ scheduler  (logical clock, ordered insert, cancel)
//     └─ dispatch   (service_queue → EventTarget::process_event)
// ```
//
// Nothing here spawns threads. The frame driver at the crate root owns an
// `EventSystem` on its own logic thread.
//
//=========================================================================

//=== Module Declarations =================================================

pub mod args;
pub mod dispatch;
pub mod error;
pub mod registry;

mod event_system;
pub(crate) mod pool;
mod scheduler;

//=== Public API ==========================================================

pub use args::{ArgumentType, EventArg, EventArgs};
pub use dispatch::{EventTarget, ObjectRef, SharedTarget};
pub use error::{ConfigError, EventError};
pub use event_system::{EventSystem, EventSystemBuilder};
pub use registry::{Channel, EventDef, EventHandle, EventRegistry};
