//=========================================================================
// Event Definition
//=========================================================================
//
// Compiled description of one named event: argument format, packed
// layout, return type, and delivery channel.
//
// Layout is computed once at registration by accumulating argument
// widths left to right:
//
//   format  [ Int | Vec3 | Str ]
//   offset    0     4      16
//   size    = 4 + 12 + 128 = 144
//
//=========================================================================

//=== External Dependencies ===============================================

use arrayvec::ArrayVec;

//=== Internal Dependencies ===============================================

use crate::core::args::{ArgumentType, EventArg, MAX_ARGS};
use crate::core::error::{ConfigError, EventError};

//=== Channel =============================================================

/// Delivery path of an event. Each channel has its own time-ordered queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Gameplay events. Cancellable by sender.
    Normal,
    /// UI events. Serviced separately from gameplay.
    Gui,
}

//=== EventHandle =========================================================

/// Stable numeric id of a registered definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventHandle(u32);

impl EventHandle {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn id(&self) -> u32 {
        self.0
    }

    pub(crate) fn index(&self) -> usize {
        self.0 as usize
    }
}

//=== EventDef ============================================================

/// A compiled event definition.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDef {
    name: String,
    channel: Channel,
    format: ArrayVec<ArgumentType, MAX_ARGS>,
    offsets: ArrayVec<usize, MAX_ARGS>,
    payload_size: usize,
    return_type: Option<ArgumentType>,
    handle: EventHandle,
}

impl EventDef {
    //--- Construction -----------------------------------------------------

    pub(crate) fn compile(
        name: &str,
        channel: Channel,
        format: &[ArgumentType],
        return_type: Option<ArgumentType>,
        handle: EventHandle,
    ) -> Result<Self, ConfigError> {
        if format.len() > MAX_ARGS {
            return Err(ConfigError::TooManyArgs {
                event: name.to_string(),
                count: format.len(),
                max: MAX_ARGS,
            });
        }

        let mut offsets = ArrayVec::new();
        let mut payload_size = 0;
        for ty in format {
            offsets.push(payload_size);
            payload_size += ty.size();
        }

        Ok(Self {
            name: name.to_string(),
            channel,
            format: format.iter().copied().collect(),
            offsets,
            payload_size,
            return_type,
            handle,
        })
    }

    //--- Accessors --------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn is_gui(&self) -> bool {
        self.channel == Channel::Gui
    }

    pub fn handle(&self) -> EventHandle {
        self.handle
    }

    pub fn format(&self) -> &[ArgumentType] {
        &self.format
    }

    pub fn num_args(&self) -> usize {
        self.format.len()
    }

    /// Byte offset of argument `index` in the packed layout.
    pub fn arg_offset(&self, index: usize) -> Option<usize> {
        self.offsets.get(index).copied()
    }

    /// Total packed payload size in bytes.
    pub fn payload_size(&self) -> usize {
        self.payload_size
    }

    pub fn return_type(&self) -> Option<ArgumentType> {
        self.return_type
    }

    /// Format as a code string, e.g. `"ifs"`.
    pub fn format_spec(&self) -> String {
        self.format.iter().map(|ty| ty.code()).collect()
    }

    //--- Validation -------------------------------------------------------

    pub(crate) fn same_signature(
        &self,
        format: &[ArgumentType],
        return_type: Option<ArgumentType>,
    ) -> Result<(), ConfigError> {
        if self.format.as_slice() != format {
            return Err(ConfigError::FormatMismatch {
                event: self.name.clone(),
                existing: self.format_spec(),
                requested: format.iter().map(|ty| ty.code()).collect(),
            });
        }

        if self.return_type != return_type {
            return Err(ConfigError::ReturnTypeMismatch {
                event: self.name.clone(),
                existing: self.return_type,
                requested: return_type,
            });
        }

        Ok(())
    }

    /// Checks caller-supplied arguments against this definition's format.
    pub(crate) fn validate_args(&self, args: &[EventArg]) -> Result<(), EventError> {
        if args.len() != self.format.len() {
            return Err(EventError::ArgumentCountMismatch {
                event: self.name.clone(),
                expected: self.format.len(),
                got: args.len(),
            });
        }

        for (index, (expected, arg)) in self.format.iter().zip(args).enumerate() {
            let got = arg.arg_type();
            if got != *expected {
                return Err(EventError::ArgumentTypeMismatch {
                    event: self.name.clone(),
                    index,
                    expected: *expected,
                    got,
                });
            }
        }

        Ok(())
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
