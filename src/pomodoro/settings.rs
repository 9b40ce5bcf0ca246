use serde::{Deserialize, Serialize};

use super::mode::Mode;
use crate::error::{Error, Result};

pub const DEFAULT_FOCUS_MINUTES: f64 = 25.0;
pub const DEFAULT_SHORT_BREAK_MINUTES: f64 = 5.0;
pub const DEFAULT_LONG_BREAK_MINUTES: f64 = 15.0;
pub const DEFAULT_SESSIONS_PER_CYCLE: u32 = 4;

// Upper bounds accepted from the settings surface
pub const MAX_FOCUS_MINUTES: f64 = 60.0;
pub const MAX_SHORT_BREAK_MINUTES: f64 = 15.0;
pub const MAX_LONG_BREAK_MINUTES: f64 = 30.0;
pub const MAX_SESSIONS_PER_CYCLE: u32 = 8;

// Debug durations: 30s focus, 10s short break, 15s long break
const DEBUG_FOCUS_MINUTES: f64 = 0.5;
const DEBUG_SHORT_BREAK_MINUTES: f64 = 1.0 / 6.0;
const DEBUG_LONG_BREAK_MINUTES: f64 = 0.25;

/// Interval lengths in minutes plus the number of focus sessions per cycle.
///
/// Minutes are fractional so the debug override can express sub-minute
/// intervals. Values are expected to be positive; use [`Settings::validate`]
/// wherever settings enter from the outside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub focus_minutes: f64,
    pub short_break_minutes: f64,
    pub long_break_minutes: f64,
    pub sessions_per_cycle: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            focus_minutes: DEFAULT_FOCUS_MINUTES,
            short_break_minutes: DEFAULT_SHORT_BREAK_MINUTES,
            long_break_minutes: DEFAULT_LONG_BREAK_MINUTES,
            sessions_per_cycle: DEFAULT_SESSIONS_PER_CYCLE,
        }
    }
}

impl Settings {
    pub fn minutes(&self, mode: Mode) -> f64 {
        match mode {
            Mode::Focus => self.focus_minutes,
            Mode::ShortBreak => self.short_break_minutes,
            Mode::LongBreak => self.long_break_minutes,
        }
    }

    pub fn max_minutes(mode: Mode) -> f64 {
        match mode {
            Mode::Focus => MAX_FOCUS_MINUTES,
            Mode::ShortBreak => MAX_SHORT_BREAK_MINUTES,
            Mode::LongBreak => MAX_LONG_BREAK_MINUTES,
        }
    }

    /// Length of `mode` in whole seconds, rounded half-up.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn duration_secs(&self, mode: Mode) -> u32 {
        let secs = (self.minutes(mode) * 60.0).round();
        if secs.is_finite() && secs > 0.0 {
            secs.min(f64::from(u32::MAX)) as u32
        } else {
            0
        }
    }

    /// Same cycle length, durations compressed to seconds for manual testing.
    pub fn debug_override(&self) -> Self {
        Self {
            focus_minutes: DEBUG_FOCUS_MINUTES,
            short_break_minutes: DEBUG_SHORT_BREAK_MINUTES,
            long_break_minutes: DEBUG_LONG_BREAK_MINUTES,
            sessions_per_cycle: self.sessions_per_cycle,
        }
    }

    /// Boundary check for settings coming from a user, a config file or a client.
    pub fn validate(&self) -> Result<()> {
        for mode in Mode::ALL {
            let minutes = self.minutes(mode);
            if !minutes.is_finite() || minutes <= 0.0 {
                return Err(Error::InvalidSettings(format!(
                    "{} must be a positive number of minutes, got {}",
                    mode.label(),
                    minutes
                )));
            }
            let max = Self::max_minutes(mode);
            if minutes > max {
                return Err(Error::InvalidSettings(format!(
                    "{} must be at most {} minutes, got {}",
                    mode.label(),
                    max,
                    minutes
                )));
            }
            if self.duration_secs(mode) == 0 {
                return Err(Error::InvalidSettings(format!(
                    "{} is shorter than one second",
                    mode.label()
                )));
            }
        }
        if !(1..=MAX_SESSIONS_PER_CYCLE).contains(&self.sessions_per_cycle) {
            return Err(Error::InvalidSettings(format!(
                "sessions per cycle must be between 1 and {}, got {}",
                MAX_SESSIONS_PER_CYCLE, self.sessions_per_cycle
            )));
        }
        Ok(())
    }
}
