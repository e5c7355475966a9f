//=========================================================================
// Event System Errors
//=========================================================================
//
// Two families of failure:
//
//   ConfigError  ── bad event definitions. Recorded at registration,
//                   surfaced by EventSystem::init().
//   EventError   ── everything the running system can hit. Apart from
//                   `Config`, every variant is a logic defect in calling
//                   code; none of them are retried.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;

use log::error;

//=== Internal Dependencies ===============================================

use super::args::ArgumentType;
use super::registry::{Channel, EventHandle};

//=== ConfigError =========================================================

/// Registration-time failure of an event definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The format lists more arguments than an event can carry.
    TooManyArgs { event: String, count: usize, max: usize },

    /// A format-string code does not name an argument type.
    UnknownArgumentType { event: String, code: char },

    /// Same name registered twice with different argument formats.
    FormatMismatch {
        event: String,
        existing: String,
        requested: String,
    },

    /// Same name registered twice with different return types.
    ReturnTypeMismatch {
        event: String,
        existing: Option<ArgumentType>,
        requested: Option<ArgumentType>,
    },

    /// The registry already holds its maximum number of definitions.
    RegistryFull { capacity: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyArgs { event, count, max } => write!(
                f,
                "Too many args for '{}' event ({} > {})",
                event, count, max
            ),
            Self::UnknownArgumentType { event, code } => write!(
                f,
                "Invalid arg format code '{}' for '{}' event",
                code, event
            ),
            Self::FormatMismatch {
                event,
                existing,
                requested,
            } => write!(
                f,
                "Event '{}' defined twice with same name but differing format strings ('{}' != '{}')",
                event, requested, existing
            ),
            Self::ReturnTypeMismatch {
                event,
                existing,
                requested,
            } => write!(
                f,
                "Event '{}' defined twice with same name but differing return types ({:?} != {:?})",
                event, requested, existing
            ),
            Self::RegistryFull { capacity } => {
                write!(f, "Event definition registry is full ({} definitions)", capacity)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

//=== EventError ==========================================================

/// Fatal event-system failure.
#[derive(Debug, Clone, PartialEq)]
pub enum EventError {
    /// A recorded definition error, surfaced at init.
    Config(ConfigError),

    /// Scheduling was attempted before `init()` or after `shutdown()`.
    NotInitialized,

    /// The handle does not belong to this system's registry.
    UnknownEvent(EventHandle),

    ArgumentCountMismatch {
        event: String,
        expected: usize,
        got: usize,
    },

    ArgumentTypeMismatch {
        event: String,
        index: usize,
        expected: ArgumentType,
        got: ArgumentType,
    },

    /// Every pooled instance is already in flight.
    PoolExhausted { capacity: usize },

    /// A single service call drained more events than the per-tick ceiling.
    EventOverflow { channel: Channel, limit: usize },

    /// The target was already mutably borrowed when dispatch reached it.
    TargetBusy { event: String },
}

impl fmt::Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Event configuration error: {}", e),
            Self::NotInitialized => write!(f, "Event system is not initialized"),
            Self::UnknownEvent(handle) => write!(f, "Unknown event handle {:?}", handle),
            Self::ArgumentCountMismatch {
                event,
                expected,
                got,
            } => write!(
                f,
                "Wrong number of args for '{}' event (expected {}, got {})",
                event, expected, got
            ),
            Self::ArgumentTypeMismatch {
                event,
                index,
                expected,
                got,
            } => write!(
                f,
                "Wrong type passed in for arg #{} on '{}' event (expected {}, got {})",
                index, event, expected, got
            ),
            Self::PoolExhausted { capacity } => {
                write!(f, "No more free events (pool capacity {})", capacity)
            }
            Self::EventOverflow { channel, limit } => write!(
                f,
                "Event overflow on {:?} channel (> {} events in one tick). Possible infinite event loop",
                channel, limit
            ),
            Self::TargetBusy { event } => write!(
                f,
                "Target of '{}' event is already being dispatched to",
                event
            ),
        }
    }
}

impl std::error::Error for EventError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for EventError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

//--- fatal() -------------------------------------------------------------
//
// Logs a fatal error at the point of detection and hands it back for
// propagation, so callers can write `.map_err(fatal)?`.
//
pub(crate) fn fatal(err: EventError) -> EventError {
    error!("{}", err);
    err
}

//=========================================================================
// Unit Tests
//=========================================================================
