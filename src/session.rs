//! Runtime owner of a [`SessionController`].
//!
//! One tokio task holds the controller. Commands from any number of front
//! ends arrive over a channel and are applied in the same `select!` loop
//! that drives the one-second ticks, so a click can never race a tick.

use serde::Serialize;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::error::{Error, Result};
use crate::pomodoro::{CompletionEvent, Mode, SessionController, SessionState, Settings};

const TICK_PERIOD: Duration = Duration::from_secs(1);
const EVENT_CAPACITY: usize = 64;

/// Whether a manual mode switch resumes the countdown on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoStart {
    #[default]
    Disabled,
    /// Start after this delay unless another command arrives first.
    After(Duration),
}

#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub auto_start: AutoStart,
    /// Replace every duration with the compressed debug durations.
    pub debug: bool,
    pub tick_period: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            auto_start: AutoStart::Disabled,
            debug: false,
            tick_period: TICK_PERIOD,
        }
    }
}

#[derive(Debug)]
pub enum Command {
    Start,
    Pause,
    Toggle,
    Reset,
    SwitchMode(Mode),
    UpdateSettings(Settings),
    Snapshot(oneshot::Sender<Snapshot>),
    Shutdown,
}

/// State as handed to renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    #[serde(flatten)]
    pub state: SessionState,
    pub clock: String,
    pub cycle_progress: u32,
    pub cycle: u32,
    pub settings: Settings,
}

impl Snapshot {
    pub fn of(controller: &SessionController) -> Self {
        Self {
            state: controller.state(),
            clock: controller.clock(),
            cycle_progress: controller.cycle_progress(),
            cycle: controller.cycle_number(),
            settings: *controller.settings(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    State(Snapshot),
    Completed(CompletionEvent),
}

/// Cheap, cloneable front door to the session task.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    pub fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).map_err(|_| Error::SessionClosed)
    }

    pub fn start(&self) -> Result<()> {
        self.send(Command::Start)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(Command::Pause)
    }

    pub fn toggle(&self) -> Result<()> {
        self.send(Command::Toggle)
    }

    pub fn reset(&self) -> Result<()> {
        self.send(Command::Reset)
    }

    pub fn switch_mode(&self, mode: Mode) -> Result<()> {
        self.send(Command::SwitchMode(mode))
    }

    pub fn update_settings(&self, settings: Settings) -> Result<()> {
        self.send(Command::UpdateSettings(settings))
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown)
    }

    pub async fn snapshot(&self) -> Result<Snapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx))?;
        rx.await.map_err(|_| Error::SessionClosed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

/// Spawn the session task. The task ends on [`Command::Shutdown`] or when
/// every handle has been dropped.
pub fn spawn(settings: Settings, options: SessionOptions) -> (SessionHandle, JoinHandle<()>) {
    let (commands, rx) = mpsc::unbounded_channel();
    let (events, _) = broadcast::channel(EVENT_CAPACITY);

    let settings = effective(settings, options.debug);
    let actor = SessionActor {
        controller: SessionController::new(settings),
        options,
        events: events.clone(),
        pending_start: None,
    };
    let task = tokio::spawn(actor.run(rx));

    (SessionHandle { commands, events }, task)
}

fn effective(settings: Settings, debug: bool) -> Settings {
    if debug {
        settings.debug_override()
    } else {
        settings
    }
}

struct SessionActor {
    controller: SessionController,
    options: SessionOptions,
    events: broadcast::Sender<SessionEvent>,
    /// Deadline of a deferred start scheduled by a mode switch.
    pending_start: Option<Instant>,
}

impl SessionActor {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let mut ticker = time::interval(self.options.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        log::debug!(
            "Session started in {} mode ({})",
            self.controller.state().mode.as_str(),
            self.controller.clock()
        );

        loop {
            let deadline = self.pending_start;
            let running = self.controller.is_running();

            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    if matches!(command, Command::Shutdown) {
                        break;
                    }
                    self.apply(command, &mut ticker);
                }
                _ = ticker.tick(), if running => {
                    self.tick();
                }
                _ = time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.pending_start = None;
                    log::debug!("Deferred start fired");
                    self.controller.start();
                    ticker.reset();
                    self.publish_state();
                }
            }
        }

        log::debug!("Session task stopped");
    }

    fn apply(&mut self, command: Command, ticker: &mut time::Interval) {
        // Any explicit command supersedes a deferred start.
        if !matches!(command, Command::Snapshot(_)) {
            self.pending_start = None;
        }

        let was_running = self.controller.is_running();
        match command {
            Command::Start => self.controller.start(),
            Command::Pause => self.controller.pause(),
            Command::Toggle => self.controller.toggle(),
            Command::Reset => self.controller.reset(),
            Command::SwitchMode(mode) => {
                self.controller.switch_mode(mode);
                if let AutoStart::After(delay) = self.options.auto_start {
                    self.pending_start = Some(Instant::now() + delay);
                }
            }
            Command::UpdateSettings(settings) => {
                self.controller
                    .update_settings(effective(settings, self.options.debug));
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(Snapshot::of(&self.controller));
                return;
            }
            Command::Shutdown => return,
        }

        if !was_running && self.controller.is_running() {
            // First decrement lands one full period after start.
            ticker.reset();
        }
        self.publish_state();
    }

    fn tick(&mut self) {
        let mut completion = self.controller.tick();
        let state = self.controller.state();
        if completion.is_none() && state.is_running && state.seconds_remaining == 0 {
            self.publish_state();
            completion = self.controller.tick();
        }

        if let Some(event) = completion {
            log::info!(
                "{} finished, next up: {}",
                event.finished_mode,
                event.next_mode
            );
            let _ = self.events.send(SessionEvent::Completed(event));
        }
        self.publish_state();
    }

    fn publish_state(&self) {
        // No subscribers is fine
        let _ = self
            .events
            .send(SessionEvent::State(Snapshot::of(&self.controller)));
    }
}
