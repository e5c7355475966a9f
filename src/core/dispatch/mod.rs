//=========================================================================
// Dispatch
//=========================================================================
//
// Target contract, weak sender references, and queue servicing.
//
//   target.rs      ── EventTarget trait + ObjectRef
//   dispatcher.rs  ── EventSystem::service_queue / process_event
//
//=========================================================================

//=== Module Declarations =================================================

mod dispatcher;
mod target;

//=== Public API ==========================================================

pub use target::{EventTarget, ObjectRef, SharedTarget};
