use serde::{Deserialize, Serialize};

use super::mode::Mode;
use super::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub mode: Mode,
    pub seconds_remaining: u32,
    pub is_running: bool,
    pub completed_focus_count: u32,
}

/// Fired once per natural completion of an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEvent {
    pub finished_mode: Mode,
    pub next_mode: Mode,
}

impl CompletionEvent {
    pub fn message(&self) -> &'static str {
        match self.finished_mode {
            Mode::Focus => "Focus session complete! Time for a break.",
            Mode::ShortBreak | Mode::LongBreak => "Break time over! Ready to focus again?",
        }
    }
}

/// Countdown, mode sequencing and cycle bookkeeping for one timer surface.
///
/// Synchronous and infallible. The owner drives it with one [`tick`] per
/// elapsed second while it is running.
///
/// [`tick`]: SessionController::tick
#[derive(Debug, Clone)]
pub struct SessionController {
    settings: Settings,
    state: SessionState,
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl SessionController {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            state: SessionState {
                mode: Mode::Focus,
                seconds_remaining: settings.duration_secs(Mode::Focus),
                is_running: false,
                completed_focus_count: 0,
            },
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn duration(&self, mode: Mode) -> u32 {
        self.settings.duration_secs(mode)
    }

    /// Advance the countdown by one second.
    ///
    /// A tick at 1 only brings the clock to zero; the completion transition
    /// happens on the tick that observes zero.
    pub fn tick(&mut self) -> Option<CompletionEvent> {
        if !self.state.is_running {
            return None;
        }
        if self.state.seconds_remaining > 0 {
            self.state.seconds_remaining -= 1;
            return None;
        }

        let event = self.complete();
        self.state.is_running = false;
        Some(event)
    }

    fn complete(&mut self) -> CompletionEvent {
        let finished_mode = self.state.mode;
        let next_mode = match finished_mode {
            Mode::Focus => {
                self.state.completed_focus_count += 1;
                // sessions_per_cycle >= 1 is a caller contract; treat 0 as 1
                let per_cycle = self.settings.sessions_per_cycle.max(1);
                if self.state.completed_focus_count % per_cycle == 0 {
                    Mode::LongBreak
                } else {
                    Mode::ShortBreak
                }
            }
            Mode::ShortBreak | Mode::LongBreak => Mode::Focus,
        };

        self.state.mode = next_mode;
        self.state.seconds_remaining = self.duration(next_mode);

        CompletionEvent {
            finished_mode,
            next_mode,
        }
    }

    pub fn start(&mut self) {
        self.state.is_running = true;
    }

    pub fn pause(&mut self) {
        self.state.is_running = false;
    }

    pub fn toggle(&mut self) {
        self.state.is_running = !self.state.is_running;
    }

    pub fn switch_mode(&mut self, mode: Mode) {
        self.state.is_running = false;
        self.state.mode = mode;
        self.state.seconds_remaining = self.duration(mode);
    }

    pub fn reset(&mut self) {
        self.state.is_running = false;
        self.state.seconds_remaining = self.duration(self.state.mode);
    }

    /// Replace the settings. A running countdown keeps its remaining seconds
    /// until the next reset, switch or completion.
    pub fn update_settings(&mut self, settings: Settings) {
        self.settings = settings;
        if !self.state.is_running {
            self.state.seconds_remaining = self.duration(self.state.mode);
        }
    }

    pub fn clock(&self) -> String {
        format_clock(self.state.seconds_remaining)
    }

    /// Focus sessions finished in the current cycle.
    pub fn cycle_progress(&self) -> u32 {
        self.state.completed_focus_count % self.settings.sessions_per_cycle.max(1)
    }

    /// 1-based number of the cycle in progress.
    pub fn cycle_number(&self) -> u32 {
        self.state.completed_focus_count / self.settings.sessions_per_cycle.max(1) + 1
    }
}

/// `MM:SS`, zero padded. Minutes are not wrapped at 60.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
