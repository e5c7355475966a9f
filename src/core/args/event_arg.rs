//=========================================================================
// Event Arguments
//=========================================================================
//
// Tagged argument values and the fixed-capacity payload that holds them.
//
// Architecture:
//   caller values ──From──> EventArg (tagged) ──> EventArgs (ArrayVec)
//                                                      ↓
//   target ←── args.get::<T>(i) / args.str(i) ─── typed decode
//
// Strings are copied and truncated into in-payload storage, so a payload
// never borrows from the caller.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;
use std::mem::size_of;

use arrayvec::{ArrayString, ArrayVec};

//=== Internal Dependencies ===============================================

use super::types::{Guid, Mat3, Mat4, OpaquePtr, Point, Rect, Vec3};

//=== Limits ==============================================================

/// Maximum number of arguments a single event can carry.
pub const MAX_ARGS: usize = 8;

/// Capacity of string arguments, in bytes (narrow) or UTF-16 units (wide).
pub const MAX_STRING_LEN: usize = 128;

/// Narrow string stored inline in an event payload.
pub type EventStr = ArrayString<MAX_STRING_LEN>;

/// Wide (UTF-16) string stored inline in an event payload.
pub type EventWStr = ArrayVec<u16, MAX_STRING_LEN>;

//=== ArgumentType ========================================================

/// The closed set of argument kinds an event format may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentType {
    Int,
    Bool,
    Float,
    Point,
    Rect,
    Vec3,
    Mat3,
    Mat4,
    Guid,
    Str,
    WStr,
    Pointer,
}

impl ArgumentType {
    /// Byte width of this argument in the packed payload layout.
    pub const fn size(self) -> usize {
        match self {
            Self::Int => size_of::<i32>(),
            Self::Bool => size_of::<bool>(),
            Self::Float => size_of::<f32>(),
            Self::Point => size_of::<Point>(),
            Self::Rect => size_of::<Rect>(),
            Self::Vec3 => size_of::<Vec3>(),
            Self::Mat3 => size_of::<Mat3>(),
            Self::Mat4 => size_of::<Mat4>(),
            Self::Guid => size_of::<Guid>(),
            Self::Str => MAX_STRING_LEN,
            Self::WStr => MAX_STRING_LEN * size_of::<u16>(),
            Self::Pointer => size_of::<usize>(),
        }
    }

    /// Single-character code used in format strings.
    pub const fn code(self) -> char {
        match self {
            Self::Int => 'i',
            Self::Bool => 'b',
            Self::Float => 'f',
            Self::Point => 'p',
            Self::Rect => 'r',
            Self::Vec3 => 'v',
            Self::Mat3 => 'm',
            Self::Mat4 => 'M',
            Self::Guid => 'g',
            Self::Str => 's',
            Self::WStr => 'w',
            Self::Pointer => 'a',
        }
    }

    /// Parses a format-string code. Returns `None` for unknown codes.
    pub fn from_code(code: char) -> Option<Self> {
        let ty = match code {
            'i' => Self::Int,
            'b' => Self::Bool,
            'f' => Self::Float,
            'p' => Self::Point,
            'r' => Self::Rect,
            'v' => Self::Vec3,
            'm' => Self::Mat3,
            'M' => Self::Mat4,
            'g' => Self::Guid,
            's' => Self::Str,
            'w' => Self::WStr,
            'a' => Self::Pointer,
            _ => return None,
        };
        Some(ty)
    }
}

impl fmt::Display for ArgumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}('{}')", self, self.code())
    }
}

//=== EventArg ============================================================

/// A single tagged argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum EventArg {
    Int(i32),
    Bool(bool),
    Float(f32),
    Point(Point),
    Rect(Rect),
    Vec3(Vec3),
    Mat3(Mat3),
    Mat4(Mat4),
    Guid(Guid),
    Str(EventStr),
    WStr(EventWStr),
    Pointer(OpaquePtr),
}

impl EventArg {
    /// Returns the type tag of this value.
    pub fn arg_type(&self) -> ArgumentType {
        match self {
            Self::Int(_) => ArgumentType::Int,
            Self::Bool(_) => ArgumentType::Bool,
            Self::Float(_) => ArgumentType::Float,
            Self::Point(_) => ArgumentType::Point,
            Self::Rect(_) => ArgumentType::Rect,
            Self::Vec3(_) => ArgumentType::Vec3,
            Self::Mat3(_) => ArgumentType::Mat3,
            Self::Mat4(_) => ArgumentType::Mat4,
            Self::Guid(_) => ArgumentType::Guid,
            Self::Str(_) => ArgumentType::Str,
            Self::WStr(_) => ArgumentType::WStr,
            Self::Pointer(_) => ArgumentType::Pointer,
        }
    }

    /// Builds a narrow string argument, truncated on a char boundary to
    /// [`MAX_STRING_LEN`] bytes.
    pub fn string(text: &str) -> Self {
        let mut out = EventStr::new();
        for ch in text.chars() {
            if out.try_push(ch).is_err() {
                break;
            }
        }
        Self::Str(out)
    }

    /// Builds a wide string argument, truncated to [`MAX_STRING_LEN`]
    /// UTF-16 units without splitting a surrogate pair.
    pub fn wide(text: &str) -> Self {
        let mut out = EventWStr::new();
        let mut units = [0u16; 2];
        for ch in text.chars() {
            let encoded = ch.encode_utf16(&mut units);
            if out.remaining_capacity() < encoded.len() {
                break;
            }
            out.extend(encoded.iter().copied());
        }
        Self::WStr(out)
    }
}

//--- Conversions ---------------------------------------------------------

macro_rules! impl_from_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for EventArg {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from_value! {
    i32 => Int,
    bool => Bool,
    f32 => Float,
    Point => Point,
    Rect => Rect,
    Vec3 => Vec3,
    Mat3 => Mat3,
    Mat4 => Mat4,
    Guid => Guid,
    OpaquePtr => Pointer,
}

impl From<&str> for EventArg {
    fn from(value: &str) -> Self {
        Self::string(value)
    }
}

impl From<&String> for EventArg {
    fn from(value: &String) -> Self {
        Self::string(value)
    }
}

/// Builds an `[EventArg; N]` from plain values.
///
/// ```
/// use aetheric_events::event_args;
/// use aetheric_events::core::args::Vec3;
///
/// let args = event_args![7, 1.5f32, "spawn", Vec3::new(0.0, 1.0, 0.0)];
/// assert_eq!(args.len(), 4);
/// ```
#[macro_export]
macro_rules! event_args {
    ($($value:expr),* $(,)?) => {
        [$($crate::core::args::EventArg::from($value)),*]
    };
}

//=== FromEventArg ========================================================

/// Typed extraction of a copyable value from an [`EventArg`].
pub trait FromEventArg: Sized {
    fn from_event_arg(arg: &EventArg) -> Option<Self>;
}

macro_rules! impl_from_event_arg {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FromEventArg for $ty {
                fn from_event_arg(arg: &EventArg) -> Option<Self> {
                    match arg {
                        EventArg::$variant(value) => Some(*value),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_from_event_arg! {
    i32 => Int,
    bool => Bool,
    f32 => Float,
    Point => Point,
    Rect => Rect,
    Vec3 => Vec3,
    Mat3 => Mat3,
    Mat4 => Mat4,
    Guid => Guid,
    OpaquePtr => Pointer,
}

//=== EventArgs ===========================================================

/// Fixed-capacity, self-contained argument payload of one event.
///
/// Values are stored in definition order and have already been checked
/// against the definition's format by the time a target sees them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventArgs {
    values: ArrayVec<EventArg, MAX_ARGS>,
}

impl EventArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventArg> {
        self.values.iter()
    }

    pub fn as_slice(&self) -> &[EventArg] {
        &self.values
    }

    /// Returns the raw tagged value at `index`.
    pub fn arg(&self, index: usize) -> Option<&EventArg> {
        self.values.get(index)
    }

    /// Decodes the argument at `index` as `T`, or `None` if the index is
    /// out of range or the tag does not match.
    pub fn get<T: FromEventArg>(&self, index: usize) -> Option<T> {
        self.values.get(index).and_then(T::from_event_arg)
    }

    /// Borrows a narrow string argument.
    pub fn str(&self, index: usize) -> Option<&str> {
        match self.values.get(index) {
            Some(EventArg::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Borrows a wide string argument as UTF-16 units.
    pub fn wide(&self, index: usize) -> Option<&[u16]> {
        match self.values.get(index) {
            Some(EventArg::WStr(s)) => Some(s.as_slice()),
            _ => None,
        }
    }

    /// Decodes a wide string argument into an owned `String`.
    pub fn wide_string(&self, index: usize) -> Option<String> {
        self.wide(index).map(String::from_utf16_lossy)
    }

    /// Copies already validated values into a fresh payload.
    ///
    /// Callers must have checked `values.len() <= MAX_ARGS`.
    pub(crate) fn from_validated(values: &[EventArg]) -> Self {
        let mut args = Self::new();
        args.values.extend(values.iter().cloned());
        args
    }

    pub(crate) fn clear(&mut self) {
        self.values.clear();
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
