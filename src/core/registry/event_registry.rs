//=========================================================================
// Event Registry
//=========================================================================
//
// Stores compiled event definitions and assigns their handles.
//
// Registration never aborts on its own: a bad definition is returned to
// the caller and also recorded, and the first recorded error is what
// `EventSystem::init()` fails with. Definitions are only added while the
// system is being built; a running system holds a frozen registry.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::Arc;

use log::debug;

//=== Internal Dependencies ===============================================

use super::event_def::{Channel, EventDef, EventHandle};
use crate::core::args::{ArgumentType, MAX_ARGS};
use crate::core::error::ConfigError;

//=== EventRegistry =======================================================

/// Bounded table of event definitions with deferred error reporting.
pub struct EventRegistry {
    defs: Vec<Arc<EventDef>>,
    max_definitions: usize,
    errors: Vec<ConfigError>,
}

impl EventRegistry {
    pub fn new(max_definitions: usize) -> Self {
        Self {
            defs: Vec::new(),
            max_definitions,
            errors: Vec::new(),
        }
    }

    //--- Registration -----------------------------------------------------

    /// Registers a definition, or returns the existing handle when the
    /// same name was already registered with an identical signature.
    pub fn define(
        &mut self,
        name: &str,
        channel: Channel,
        format: &[ArgumentType],
        return_type: Option<ArgumentType>,
    ) -> Result<EventHandle, ConfigError> {
        let handle = EventHandle::from_index(self.defs.len());
        let def = match EventDef::compile(name, channel, format, return_type, handle) {
            Ok(def) => def,
            Err(e) => return Err(self.record(e)),
        };

        if let Some(existing) = self.find_by_name(name) {
            let existing_def = &self.defs[existing.index()];
            return match existing_def.same_signature(format, return_type) {
                Ok(()) => Ok(existing),
                Err(e) => Err(self.record(e)),
            };
        }

        if self.defs.len() >= self.max_definitions {
            return Err(self.record(ConfigError::RegistryFull {
                capacity: self.max_definitions,
            }));
        }

        debug!(
            "Defined event '{}' ({:?}, format '{}', {} bytes) as #{}",
            name,
            channel,
            def.format_spec(),
            def.payload_size(),
            handle.id()
        );

        self.defs.push(Arc::new(def));
        Ok(handle)
    }

    /// Registers a definition from a format-code string such as `"ifs"`.
    ///
    /// See [`ArgumentType::code`] for the codes. `None` as return code
    /// means the event returns nothing.
    pub fn define_spec(
        &mut self,
        name: &str,
        channel: Channel,
        format_spec: &str,
        return_code: Option<char>,
    ) -> Result<EventHandle, ConfigError> {
        let count = format_spec.chars().count();
        if count > MAX_ARGS {
            return Err(self.record(ConfigError::TooManyArgs {
                event: name.to_string(),
                count,
                max: MAX_ARGS,
            }));
        }

        let mut format = Vec::with_capacity(count);
        for code in format_spec.chars() {
            match ArgumentType::from_code(code) {
                Some(ty) => format.push(ty),
                None => {
                    return Err(self.record(ConfigError::UnknownArgumentType {
                        event: name.to_string(),
                        code,
                    }))
                }
            }
        }

        let return_type = match return_code {
            None => None,
            Some(code) => match ArgumentType::from_code(code) {
                Some(ty) => Some(ty),
                None => {
                    return Err(self.record(ConfigError::UnknownArgumentType {
                        event: name.to_string(),
                        code,
                    }))
                }
            },
        };

        self.define(name, channel, &format, return_type)
    }

    fn record(&mut self, err: ConfigError) -> ConfigError {
        debug!("Recorded event definition error: {}", err);
        self.errors.push(err.clone());
        err
    }

    //--- Queries ----------------------------------------------------------

    /// Linear scan by name.
    pub fn find_by_name(&self, name: &str) -> Option<EventHandle> {
        self.defs
            .iter()
            .find(|def| def.name() == name)
            .map(|def| def.handle())
    }

    pub fn get(&self, handle: EventHandle) -> Option<&EventDef> {
        self.defs.get(handle.index()).map(Arc::as_ref)
    }

    pub(crate) fn get_shared(&self, handle: EventHandle) -> Option<&Arc<EventDef>> {
        self.defs.get(handle.index())
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn max_definitions(&self) -> usize {
        self.max_definitions
    }

    pub(crate) fn set_max_definitions(&mut self, max: usize) {
        self.max_definitions = max;
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventDef> {
        self.defs.iter().map(Arc::as_ref)
    }

    /// All errors recorded so far, in registration order.
    pub fn errors(&self) -> &[ConfigError] {
        &self.errors
    }

    pub fn first_error(&self) -> Option<&ConfigError> {
        self.errors.first()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> EventRegistry {
        EventRegistry::new(16)
    }

    //=====================================================================
    // Define / Find
    //=====================================================================

    #[test]
    fn define_then_find_returns_same_definition() {
        let mut reg = registry();
        let format = [ArgumentType::Int, ArgumentType::Str];
        let handle = reg
            .define("say", Channel::Gui, &format, Some(ArgumentType::Bool))
            .expect("valid definition");

        let found = reg.find_by_name("say").expect("registered name");
        assert_eq!(found, handle);

        let def = reg.get(found).expect("valid handle");
        assert_eq!(def.format(), &format);
        assert_eq!(def.return_type(), Some(ArgumentType::Bool));
        assert_eq!(def.channel(), Channel::Gui);
    }

    #[test]
    fn handles_are_assigned_in_registration_order() {
        let mut reg = registry();
        let a = reg.define("a", Channel::Normal, &[], None).unwrap();
        let b = reg.define("b", Channel::Normal, &[], None).unwrap();

        assert_eq!(a.id(), 0);
        assert_eq!(b.id(), 1);
        assert!(reg.find_by_name("c").is_none());
    }

    #[test]
    fn identical_redefine_is_idempotent() {
        let mut reg = registry();
        let first = reg.define("hit", Channel::Normal, &[ArgumentType::Float], None).unwrap();
        let second = reg.define("hit", Channel::Normal, &[ArgumentType::Float], None).unwrap();

        assert_eq!(first, second);
        assert_eq!(reg.len(), 1);
        assert!(reg.errors().is_empty());
    }

    //=====================================================================
    // Deferred Errors
    //=====================================================================

    #[test]
    fn mismatching_redefine_is_recorded() {
        let mut reg = registry();
        reg.define("hit", Channel::Normal, &[ArgumentType::Float], None).unwrap();

        let result = reg.define("hit", Channel::Normal, &[ArgumentType::Int], None);
        assert!(matches!(result, Err(ConfigError::FormatMismatch { .. })));

        let result = reg.define("hit", Channel::Normal, &[ArgumentType::Float], Some(ArgumentType::Int));
        assert!(matches!(result, Err(ConfigError::ReturnTypeMismatch { .. })));

        assert_eq!(reg.len(), 1);
        assert_eq!(reg.errors().len(), 2);
        assert!(matches!(reg.first_error(), Some(ConfigError::FormatMismatch { .. })));
    }

    #[test]
    fn capacity_is_enforced() {
        let mut reg = EventRegistry::new(2);
        reg.define("a", Channel::Normal, &[], None).unwrap();
        reg.define("b", Channel::Normal, &[], None).unwrap();

        let result = reg.define("c", Channel::Normal, &[], None);
        assert_eq!(result, Err(ConfigError::RegistryFull { capacity: 2 }));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn redefine_at_capacity_still_coalesces() {
        let mut reg = EventRegistry::new(1);
        let a = reg.define("a", Channel::Normal, &[], None).unwrap();
        assert_eq!(reg.define("a", Channel::Normal, &[], None), Ok(a));
    }

    //=====================================================================
    // Format Codes
    //=====================================================================

    #[test]
    fn define_spec_parses_codes() {
        let mut reg = registry();
        let handle = reg.define_spec("move", Channel::Normal, "vfa", Some('b')).unwrap();
        let def = reg.get(handle).unwrap();

        assert_eq!(
            def.format(),
            &[ArgumentType::Vec3, ArgumentType::Float, ArgumentType::Pointer]
        );
        assert_eq!(def.return_type(), Some(ArgumentType::Bool));
    }

    #[test]
    fn define_spec_rejects_unknown_code() {
        let mut reg = registry();
        let result = reg.define_spec("bad", Channel::Normal, "iq", None);

        assert_eq!(
            result,
            Err(ConfigError::UnknownArgumentType {
                event: "bad".into(),
                code: 'q'
            })
        );
        assert!(reg.find_by_name("bad").is_none());
        assert_eq!(reg.errors().len(), 1);
    }

    #[test]
    fn define_spec_rejects_too_many_args() {
        let mut reg = registry();
        let result = reg.define_spec("long", Channel::Normal, "iiiiiiiii", None);
        assert!(matches!(result, Err(ConfigError::TooManyArgs { count: 9, .. })));
    }
}
