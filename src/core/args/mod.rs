//=========================================================================
// Event Argument Model
//=========================================================================
//
// Argument kinds, their value types, and the per-event payload.
//
//   ArgumentType  ── tag + packed byte width + format code
//   EventArg      ── tagged value (one per argument slot)
//   EventArgs     ── fixed-capacity payload owned by an event instance
//
//=========================================================================

//=== Module Declarations =================================================

mod event_arg;
mod types;

//=== Public API ==========================================================

pub use event_arg::{
    ArgumentType, EventArg, EventArgs, EventStr, EventWStr, FromEventArg, MAX_ARGS,
    MAX_STRING_LEN,
};
pub use types::{Guid, Mat3, Mat4, OpaquePtr, Point, Rect, Vec3};
