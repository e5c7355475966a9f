//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use aetheric_events::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Event system
pub use crate::core::{EventSystem, EventSystemBuilder};

// Definitions
pub use crate::core::registry::{Channel, EventDef, EventHandle};

// Arguments
pub use crate::core::args::{
    ArgumentType, EventArg, EventArgs, Guid, Mat3, Mat4, OpaquePtr, Point, Rect, Vec3,
};
pub use crate::event_args;

// Targets
pub use crate::core::dispatch::{EventTarget, ObjectRef, SharedTarget};

// Errors
pub use crate::core::error::{ConfigError, EventError};

// Frame driver
pub use crate::driver::{DriverCommand, DriverHandle, DriverReport, FrameDriver, FrameDriverBuilder};
