//=========================================================================
// Frame Driver
//
// Runs an event system on its own fixed-rate logic thread.
//
// Architecture:
// ```text
//     FrameDriverBuilder ──build()──> FrameDriver ──spawn()──> DriverHandle
//         │                                                      │
//         ├─ with_tps()                          pause() / resume() / shutdown()
//         └─ with_channel_capacity()                             │
//                                                 crossbeam_channel<DriverCommand>
//                                                                ▼
//                                               [logic thread] build → init → setup
//                                                  loop: commands → tick → pace
// ```
//
// `EventSystem` and its targets are not `Send`. The thread receives the
// builder (which is) and creates everything else itself; the setup
// closure runs on the logic thread and its return value is kept alive
// until the loop ends.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvError, Sender, TryRecvError};
use log::info;

//=== Internal Dependencies ===============================================

use crate::core::{Channel, EventError, EventSystem, EventSystemBuilder};

//=== Commands / Report ===================================================

/// Control messages for a running driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverCommand {
    /// Stop advancing the clock until `Resume`.
    Pause,
    Resume,
    /// Leave the loop after the current tick.
    Shutdown,
}

/// Summary returned when the logic thread exits cleanly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverReport {
    /// Ticks serviced (paused time is not counted).
    pub ticks: u64,
    /// Events dispatched across both channels.
    pub events_processed: u64,
}

//=== TickControl =========================================================

/// Update loop control signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickControl {
    Continue,
    Exit,
}

//=== FrameDriverBuilder ==================================================

/// Builder for a [`FrameDriver`].
///
/// # Default Values
///
/// - **TPS**: 60.0 (ticks per second)
/// - **Channel capacity**: 16 commands
///
/// # Examples
///
/// ```no_run
/// use aetheric_events::prelude::*;
///
/// let mut events = EventSystem::builder();
/// events.define("tick", Channel::Normal, &[], None).unwrap();
///
/// let handle = FrameDriverBuilder::new()
///     .with_tps(120.0)
///     .build()
///     .spawn(events, |_events| Ok(()));
///
/// let report = handle.shutdown().unwrap();
/// println!("ran {} ticks", report.ticks);
/// ```
pub struct FrameDriverBuilder {
    tps: f64,
    channel_capacity: usize,
}

impl FrameDriverBuilder {
    pub fn new() -> Self {
        Self {
            tps: 60.0,
            channel_capacity: 16,
        }
    }

    /// Sets the target ticks per second for the logic thread.
    ///
    /// The event system's duration conversion uses the same rate.
    ///
    /// # Panics
    ///
    /// Panics if `tps <= 0.0`.
    pub fn with_tps(mut self, tps: f64) -> Self {
        assert!(tps > 0.0, "TPS must be positive, got {}", tps);
        self.tps = tps;
        self
    }

    /// Sets the command channel capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "Channel capacity must be positive");
        self.channel_capacity = capacity;
        self
    }

    pub fn build(self) -> FrameDriver {
        FrameDriver {
            tps: self.tps,
            channel_capacity: self.channel_capacity,
        }
    }
}

impl Default for FrameDriverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//=== FrameDriver =========================================================

pub struct FrameDriver {
    tps: f64,
    channel_capacity: usize,
}

impl FrameDriver {
    pub fn builder() -> FrameDriverBuilder {
        FrameDriverBuilder::new()
    }

    pub fn tps(&self) -> f64 {
        self.tps
    }

    //--- spawn() ----------------------------------------------------------

    /// Starts the logic thread.
    ///
    /// On the new thread: builds the event system from `system`, inits it,
    /// and runs `setup` once. Each tick then advances the clock by one and
    /// services the gameplay queue followed by the GUI queue.
    ///
    /// The thread ends on `Shutdown`, when every [`DriverHandle`] sender is
    /// dropped, or on the first fatal error.
    pub fn spawn<F, T>(self, system: EventSystemBuilder, setup: F) -> DriverHandle
    where
        F: FnOnce(&mut EventSystem) -> Result<T, EventError> + Send + 'static,
    {
        let (commands, receiver) = bounded(self.channel_capacity);
        let tps = self.tps;

        let thread = thread::spawn(move || -> Result<DriverReport, EventError> {
            let mut events = system.with_tick_rate(tps).build();
            events.init()?;

            let _state = setup(&mut events)?;

            let mut logic = LogicLoop::new(receiver, tps);
            let result = logic.run(&mut events);
            events.shutdown();
            result
        });

        DriverHandle { commands, thread }
    }
}

//=== DriverHandle ========================================================

/// Control side of a running [`FrameDriver`].
pub struct DriverHandle {
    commands: Sender<DriverCommand>,
    thread: thread::JoinHandle<Result<DriverReport, EventError>>,
}

impl DriverHandle {
    /// Sends a command. Returns `false` if the logic thread has exited.
    pub fn send(&self, command: DriverCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn pause(&self) -> bool {
        self.send(DriverCommand::Pause)
    }

    pub fn resume(&self) -> bool {
        self.send(DriverCommand::Resume)
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Requests shutdown and waits for the logic thread.
    pub fn shutdown(self) -> Result<DriverReport, EventError> {
        self.send(DriverCommand::Shutdown);
        self.join()
    }

    /// Waits for the logic thread to stop on its own.
    ///
    /// A panic on the logic thread is resumed on the caller.
    pub fn join(self) -> Result<DriverReport, EventError> {
        match self.thread.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

//=== LogicLoop ===========================================================

struct LogicLoop {
    receiver: Receiver<DriverCommand>,
    frame_duration: Duration,
    paused: bool,
    ticks: u64,
}

impl LogicLoop {
    fn new(receiver: Receiver<DriverCommand>, tps: f64) -> Self {
        Self {
            receiver,
            frame_duration: Duration::from_secs_f64(1.0 / tps),
            paused: false,
            ticks: 0,
        }
    }

    //--- run() ------------------------------------------------------------
    //
    // Each tick:
    //  1. Applies pending commands (blocks while paused)
    //  2. Advances the clock and services Normal, then Gui
    //  3. Sleeps to maintain fixed pacing
    //
    fn run(&mut self, events: &mut EventSystem) -> Result<DriverReport, EventError> {
        info!(
            "Logic thread starting at {:.1} TPS",
            1.0 / self.frame_duration.as_secs_f64()
        );

        loop {
            let frame_start = Instant::now();

            //--- Step 1: Commands -------------------------------------------
            if self.collect_commands() == TickControl::Exit {
                break;
            }

            //--- Step 2: Tick ------------------------------------------------
            let now = events.now() + 1;
            events.service_queue(Channel::Normal, now)?;
            events.service_queue(Channel::Gui, now)?;
            self.ticks += 1;

            //--- Step 3: Pacing ----------------------------------------------
            let elapsed = frame_start.elapsed();
            if elapsed < self.frame_duration {
                thread::sleep(self.frame_duration - elapsed);
            }
        }

        let report = DriverReport {
            ticks: self.ticks,
            events_processed: events.total_processed(),
        };
        info!(
            "Logic thread exiting after {} ticks ({} events)",
            report.ticks, report.events_processed
        );
        Ok(report)
    }

    //--- collect_commands() -----------------------------------------------
    //
    // Drains queued commands. While paused, blocks until a command
    // arrives instead of spinning.
    //
    fn collect_commands(&mut self) -> TickControl {
        loop {
            let command = if self.paused {
                match self.receiver.recv() {
                    Ok(command) => command,
                    Err(RecvError) => return TickControl::Exit,
                }
            } else {
                match self.receiver.try_recv() {
                    Ok(command) => command,
                    Err(TryRecvError::Empty) => return TickControl::Continue,
                    Err(TryRecvError::Disconnected) => return TickControl::Exit,
                }
            };

            if self.apply(command) == TickControl::Exit {
                return TickControl::Exit;
            }
        }
    }

    fn apply(&mut self, command: DriverCommand) -> TickControl {
        match command {
            DriverCommand::Pause => {
                if !self.paused {
                    info!("Logic thread paused at tick {}", self.ticks);
                }
                self.paused = true;
            }
            DriverCommand::Resume => {
                if self.paused {
                    info!("Logic thread resumed");
                }
                self.paused = false;
            }
            DriverCommand::Shutdown => return TickControl::Exit,
        }
        TickControl::Continue
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
