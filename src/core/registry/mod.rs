//=========================================================================
// Event Type Registry
//=========================================================================
//
// Event definitions and the table that owns them.
//
//   EventRegistry
//     ├─ defs: Vec<Arc<EventDef>>     (index == EventHandle)
//     └─ errors: Vec<ConfigError>     (surfaced by EventSystem::init)
//
//=========================================================================

//=== Module Declarations =================================================

mod event_def;
mod event_registry;

//=== Public API ==========================================================

pub use event_def::{Channel, EventDef, EventHandle};
pub use event_registry::EventRegistry;
