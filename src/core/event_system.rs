//=========================================================================
// Event System
//=========================================================================
//
// Facade over registry, pool, scheduler and dispatcher.
//
// Architecture:
// ```text
//     EventSystemBuilder ──build()──> EventSystem ──init()──> [running]
//         │                              │
//         ├─ define() / define_spec()    ├─ schedule() / post_event()
//         ├─ with_pool_capacity()        ├─ cancel()
//         ├─ with_max_events_per_tick()  ├─ service_queue(Normal | Gui)
//         ├─ with_max_definitions()      └─ shutdown()
//         └─ with_tick_rate()
// ```
//
// All event kinds are defined on the builder. The built system holds a
// frozen registry and a pool that is allocated once.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};

//=== Internal Dependencies ===============================================

use crate::core::args::{ArgumentType, EventArg};
use crate::core::dispatch::ObjectRef;
use crate::core::error::{fatal, ConfigError, EventError};
use crate::core::pool::{EventPool, ListId};
use crate::core::registry::{Channel, EventDef, EventHandle, EventRegistry};
use crate::core::scheduler::Scheduler;

//=== Defaults ============================================================

const DEFAULT_POOL_CAPACITY: usize = 4096;
const DEFAULT_MAX_EVENTS_PER_TICK: usize = 4096;
const DEFAULT_MAX_DEFINITIONS: usize = 4096;
const DEFAULT_TICK_RATE: f64 = 60.0;

// Relative tolerance for whole-tick durations in `ticks_for`.
const TICK_SNAP_EPSILON: f64 = 1e-9;

//=== EventSystemBuilder ==================================================

/// Collects event definitions and sizing before the system exists.
///
/// # Default Values
///
/// - **Pool capacity**: 4096 in-flight events
/// - **Max events per tick**: 4096 per channel per service call
/// - **Max definitions**: 4096
/// - **Tick rate**: 60.0 ticks per second (used by [`EventSystem::post_event_after`])
///
/// # Examples
///
/// ```
/// use aetheric_events::prelude::*;
///
/// let mut builder = EventSystemBuilder::new().with_pool_capacity(256);
/// let damage = builder
///     .define("damage", Channel::Normal, &[ArgumentType::Int], None)
///     .unwrap();
///
/// let mut events = builder.build();
/// events.init().unwrap();
/// assert_eq!(events.find_by_name("damage"), Some(damage));
/// ```
pub struct EventSystemBuilder {
    registry: EventRegistry,
    pool_capacity: usize,
    max_events_per_tick: usize,
    tick_rate: f64,
}

impl EventSystemBuilder {
    /// Creates a builder with default sizing and no definitions.
    pub fn new() -> Self {
        Self {
            registry: EventRegistry::new(DEFAULT_MAX_DEFINITIONS),
            pool_capacity: DEFAULT_POOL_CAPACITY,
            max_events_per_tick: DEFAULT_MAX_EVENTS_PER_TICK,
            tick_rate: DEFAULT_TICK_RATE,
        }
    }

    //--- Configuration ----------------------------------------------------

    /// Sets the number of pooled event instances.
    ///
    /// This is the hard limit on events in flight across both channels.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn with_pool_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "Pool capacity must be positive");
        self.pool_capacity = capacity;
        self
    }

    /// Sets how many events one `service_queue` call may dispatch before it
    /// reports an event overflow.
    ///
    /// # Panics
    ///
    /// Panics if `limit == 0`.
    pub fn with_max_events_per_tick(mut self, limit: usize) -> Self {
        assert!(limit > 0, "Max events per tick must be positive");
        self.max_events_per_tick = limit;
        self
    }

    /// Sets the maximum number of distinct event definitions.
    ///
    /// # Panics
    ///
    /// Panics if `max == 0` or if fewer than the already defined events.
    pub fn with_max_definitions(mut self, max: usize) -> Self {
        assert!(max > 0, "Max definitions must be positive");
        assert!(
            max >= self.registry.len(),
            "Max definitions ({}) below already defined events ({})",
            max,
            self.registry.len()
        );
        self.registry.set_max_definitions(max);
        self
    }

    /// Sets the ticks-per-second used to convert durations into ticks.
    ///
    /// # Panics
    ///
    /// Panics if `tps <= 0.0`.
    pub fn with_tick_rate(mut self, tps: f64) -> Self {
        assert!(tps > 0.0, "Tick rate must be positive, got {}", tps);
        self.tick_rate = tps;
        self
    }

    //--- Registration -----------------------------------------------------

    /// Defines an event. See [`EventRegistry::define`].
    ///
    /// Errors are returned and also recorded; [`EventSystem::init`] fails
    /// with the first one.
    pub fn define(
        &mut self,
        name: &str,
        channel: Channel,
        format: &[ArgumentType],
        return_type: Option<ArgumentType>,
    ) -> Result<EventHandle, ConfigError> {
        self.registry.define(name, channel, format, return_type)
    }

    /// Defines an event from a format-code string. See
    /// [`EventRegistry::define_spec`].
    pub fn define_spec(
        &mut self,
        name: &str,
        channel: Channel,
        format_spec: &str,
        return_code: Option<char>,
    ) -> Result<EventHandle, ConfigError> {
        self.registry
            .define_spec(name, channel, format_spec, return_code)
    }

    pub fn find_by_name(&self, name: &str) -> Option<EventHandle> {
        self.registry.find_by_name(name)
    }

    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    //--- build() ----------------------------------------------------------

    /// Freezes the registry and allocates the instance pool.
    ///
    /// The returned system must be [`EventSystem::init`]ed before use.
    pub fn build(self) -> EventSystem {
        info!(
            "Building event system (pool: {}, per-tick limit: {}, definitions: {})",
            self.pool_capacity,
            self.max_events_per_tick,
            self.registry.len()
        );

        EventSystem {
            registry: self.registry,
            pool: EventPool::new(self.pool_capacity),
            scheduler: Scheduler::new(),
            max_events_per_tick: self.max_events_per_tick,
            tick_rate: self.tick_rate,
            initialized: false,
            total_processed: 0,
        }
    }
}

impl Default for EventSystemBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//=== EventSystem =========================================================

/// Pooled, time-ordered event bus.
///
/// Single-threaded: every call, including dispatch into targets, happens
/// on the thread that owns the system. Targets receive `&mut EventSystem`
/// and may schedule or cancel from inside their handler.
///
/// # Invariant
///
/// Between calls, every pooled instance is on exactly one of the free
/// list, the normal queue, or the GUI queue:
/// `free_count() + pending_count(Normal) + pending_count(Gui) == capacity()`.
pub struct EventSystem {
    pub(crate) registry: EventRegistry,
    pub(crate) pool: EventPool,
    pub(crate) scheduler: Scheduler,
    pub(crate) max_events_per_tick: usize,
    pub(crate) tick_rate: f64,
    pub(crate) initialized: bool,
    pub(crate) total_processed: u64,
}

impl EventSystem {
    pub fn builder() -> EventSystemBuilder {
        EventSystemBuilder::new()
    }

    //--- Lifecycle --------------------------------------------------------

    /// Starts the system.
    ///
    /// Fails with the first definition error recorded on the builder.
    /// Calling `init` on a running system drops all pending events.
    pub fn init(&mut self) -> Result<(), EventError> {
        info!("Initializing event system");

        if let Some(err) = self.registry.first_error() {
            for extra in self.registry.errors().iter().skip(1) {
                debug!("Additional event definition error: {}", extra);
            }
            return Err(fatal(err.clone().into()));
        }

        if self.initialized {
            info!("...already initialized");
            self.clear_all();
            return Ok(());
        }

        self.clear_all();
        info!("...{} event definitions", self.registry.len());

        self.initialized = true;
        Ok(())
    }

    /// Stops the system, dropping all pending events without dispatch.
    pub fn shutdown(&mut self) {
        info!("Shutdown event system");

        if !self.initialized {
            info!("...not started");
            return;
        }

        self.clear_all();
        self.initialized = false;
    }

    /// Returns every instance to the free list without invoking handlers.
    pub fn clear_all(&mut self) {
        self.pool.reset();
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    //--- Scheduling -------------------------------------------------------

    /// Schedules `handle` for delivery to `sender` after `delay_ticks`.
    ///
    /// The event becomes due at `now() + delay_ticks`. Arguments are
    /// validated against the definition and copied into a pooled
    /// instance; nothing is retained from the caller.
    pub fn schedule(
        &mut self,
        handle: EventHandle,
        sender: &ObjectRef,
        delay_ticks: u64,
        args: &[EventArg],
    ) -> Result<(), EventError> {
        if !self.initialized {
            return Err(fatal(EventError::NotInitialized));
        }

        let def = self.shared_def(handle).map_err(fatal)?;
        let index = self.pool.acquire(&def, args).map_err(fatal)?;
        let due = self
            .scheduler
            .insert(&mut self.pool, index, def.channel(), sender.clone(), delay_ticks);

        debug!("Scheduled '{}' due at tick {}", def.name(), due);
        Ok(())
    }

    /// Schedules `handle` for the next service of its channel.
    pub fn post_event(
        &mut self,
        handle: EventHandle,
        sender: &ObjectRef,
        args: &[EventArg],
    ) -> Result<(), EventError> {
        self.schedule(handle, sender, 0, args)
    }

    /// Schedules `handle` after a wall-clock delay, rounded up to whole
    /// ticks at the configured tick rate.
    pub fn post_event_after(
        &mut self,
        handle: EventHandle,
        sender: &ObjectRef,
        delay: Duration,
        args: &[EventArg],
    ) -> Result<(), EventError> {
        let ticks = self.ticks_for(delay);
        self.schedule(handle, sender, ticks, args)
    }

    /// Converts a duration to ticks, rounding up.
    ///
    /// Durations that are a whole number of ticks convert exactly; float
    /// error below one part in 10^9 is snapped before rounding.
    pub fn ticks_for(&self, delay: Duration) -> u64 {
        let ticks = delay.as_secs_f64() * self.tick_rate;
        let nearest = ticks.round();
        if (ticks - nearest).abs() <= TICK_SNAP_EPSILON * nearest.max(1.0) {
            nearest as u64
        } else {
            ticks.ceil() as u64
        }
    }

    //--- Cancellation -----------------------------------------------------

    /// Cancels `sender`'s pending gameplay events, optionally only those
    /// of one definition. Returns how many were cancelled.
    ///
    /// GUI-channel events are not searched and stay queued.
    pub fn cancel(&mut self, sender: &ObjectRef, handle: Option<EventHandle>) -> usize {
        if !self.initialized {
            return 0;
        }

        let cancelled = self.scheduler.cancel(&mut self.pool, sender, handle);
        if cancelled > 0 {
            debug!("Cancelled {} pending event(s) for {:?}", cancelled, sender);
        }
        cancelled
    }

    /// Whether `sender` has a pending event (of `handle`, if given) on
    /// either channel.
    pub fn has_pending(&self, sender: &ObjectRef, handle: Option<EventHandle>) -> bool {
        [ListId::Normal, ListId::Gui].into_iter().any(|list| {
            self.pool.lists().iter(list).any(|index| {
                let slot = self.pool.slot(index);
                slot.sender.as_ref() == Some(sender)
                    && handle.map_or(true, |h| {
                        slot.def.as_ref().map(|d| d.handle()) == Some(h)
                    })
            })
        })
    }

    //--- Clock ------------------------------------------------------------

    /// Current logical tick, as last passed to `set_now`/`service_queue`.
    pub fn now(&self) -> u64 {
        self.scheduler.now()
    }

    /// Advances the logical clock without servicing any queue.
    pub fn set_now(&mut self, now: u64) {
        self.scheduler.advance_to(now);
    }

    //--- Pool Queries -----------------------------------------------------

    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    pub fn free_count(&self) -> usize {
        self.pool.len(ListId::Free)
    }

    pub fn pending_count(&self, channel: Channel) -> usize {
        self.pool.len(ListId::from(channel))
    }

    /// Events dispatched since the system was built.
    pub fn total_processed(&self) -> u64 {
        self.total_processed
    }

    pub fn max_events_per_tick(&self) -> usize {
        self.max_events_per_tick
    }

    //--- Registry Queries -------------------------------------------------

    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    pub fn find_by_name(&self, name: &str) -> Option<EventHandle> {
        self.registry.find_by_name(name)
    }

    pub fn definition(&self, handle: EventHandle) -> Option<&EventDef> {
        self.registry.get(handle)
    }

    pub fn num_definitions(&self) -> usize {
        self.registry.len()
    }

    pub fn definitions(&self) -> impl Iterator<Item = &EventDef> {
        self.registry.iter()
    }

    pub(crate) fn shared_def(&self, handle: EventHandle) -> Result<Arc<EventDef>, EventError> {
        self.registry
            .get_shared(handle)
            .cloned()
            .ok_or(EventError::UnknownEvent(handle))
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
