//! Line-driven terminal front end: reads commands from stdin and redraws a
//! single status line on every state change.

use chrono::{DateTime, Local};
use colored::Colorize;
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use crate::error::{Error, Result};
use crate::pomodoro::{Mode, Settings};
use crate::session::{SessionEvent, SessionHandle, Snapshot};
use crate::theme::{Theme, Variant};

const HELP: &str = "\
Commands:
  <enter> | s     start / pause
  r               reset the current interval
  f | sb | lb     switch to focus, short break or long break
  t               next theme
  set F S L N     focus, short and long break minutes, sessions per cycle
  h               this help
  q               quit

Start a focus session and work on one task until the timer completes.
Take a short break afterwards; every N focus sessions earn a long break.
Use breaks to rest, stretch or hydrate, and note distractions for later.";

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Toggle,
    Reset,
    Switch(Mode),
    NextTheme,
    Settings(Settings),
    Help,
    Quit,
}

/// Parse one line typed at the prompt.
pub fn parse_input(line: &str) -> Result<Input> {
    let mut words = line.split_whitespace();
    let Some(first) = words.next() else {
        return Ok(Input::Toggle);
    };

    match first.to_ascii_lowercase().as_str() {
        "s" | "start" | "pause" => Ok(Input::Toggle),
        "r" | "reset" => Ok(Input::Reset),
        "t" | "theme" => Ok(Input::NextTheme),
        "h" | "help" | "?" => Ok(Input::Help),
        "q" | "quit" | "exit" => Ok(Input::Quit),
        "set" => {
            let values: Vec<&str> = words.collect();
            parse_settings(&values).map(Input::Settings)
        }
        other => other.parse::<Mode>().map(Input::Switch),
    }
}

fn parse_settings(values: &[&str]) -> Result<Settings> {
    let [focus, short, long, sessions] = values else {
        return Err(Error::InvalidSettings(
            "usage: set <focus> <short> <long> <sessions>".to_string(),
        ));
    };
    let minutes = |v: &str| {
        v.parse::<f64>()
            .map_err(|_| Error::InvalidSettings(format!("not a number: {v}")))
    };
    let settings = Settings {
        focus_minutes: minutes(*focus)?,
        short_break_minutes: minutes(*short)?,
        long_break_minutes: minutes(*long)?,
        sessions_per_cycle: sessions
            .parse()
            .map_err(|_| Error::InvalidSettings(format!("not a session count: {sessions}")))?,
    };
    settings.validate()?;
    Ok(settings)
}

/// `Sessions: x/N (Cycle k)`
pub fn cycle_summary(snapshot: &Snapshot) -> String {
    format!(
        "Sessions: {}/{} (Cycle {})",
        snapshot.cycle_progress, snapshot.settings.sessions_per_cycle, snapshot.cycle
    )
}

/// One filled dot per focus session finished in the current cycle.
pub fn cycle_dots(done: u32, per_cycle: u32) -> String {
    (0..per_cycle)
        .map(|i| if i < done { '\u{25CF}' } else { '\u{25CB}' })
        .collect()
}

pub fn status_line(snapshot: &Snapshot, theme: Theme) -> String {
    let palette = theme.palette();
    let state = &snapshot.state;
    let clock = if state.is_running {
        snapshot.clock.color(palette.foreground).bold()
    } else {
        snapshot.clock.color(palette.foreground)
    };
    format!(
        "{} {:<11} {}  {} {}  {}{}",
        state.mode.emoji(),
        state.mode.label().color(palette.accent),
        clock,
        cycle_dots(snapshot.cycle_progress, snapshot.settings.sessions_per_cycle)
            .color(palette.accent),
        format!("Cycle {}", snapshot.cycle).dimmed(),
        format!("{} vibe", theme.name()).dimmed(),
        if state.is_running { "" } else { "  (paused)" },
    )
}

pub struct Terminal {
    session: SessionHandle,
    variant: Variant,
    theme: Theme,
    started_at: DateTime<Local>,
}

impl Terminal {
    pub fn new(session: SessionHandle, variant: Variant, theme: Theme) -> Self {
        Self {
            session,
            variant,
            theme,
            started_at: Local::now(),
        }
    }

    pub async fn run(mut self) -> Result<()> {
        println!("{}", self.variant.title().bold());
        println!("Type h for help.\n");

        let mut events = self.session.subscribe();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        self.redraw().await?;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    match parse_input(&line) {
                        Ok(Input::Quit) => break,
                        Ok(input) => self.handle(input).await?,
                        Err(e) => println!("{}", e.to_string().red()),
                    }
                }
                event = events.recv() => {
                    match event {
                        Ok(SessionEvent::State(snapshot)) => self.draw(&snapshot),
                        Ok(SessionEvent::Completed(done)) => {
                            println!("\n{} {}", done.next_mode.emoji(), done.message());
                        }
                        Err(RecvError::Lagged(_)) => {}
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        }

        self.print_stats().await;
        Ok(())
    }

    async fn handle(&mut self, input: Input) -> Result<()> {
        match input {
            Input::Toggle => self.session.toggle(),
            Input::Reset => self.session.reset(),
            Input::Switch(mode) => self.session.switch_mode(mode),
            Input::Settings(settings) => self.session.update_settings(settings),
            Input::NextTheme => {
                self.theme = self.variant.next_theme(self.theme);
                println!("{}: {}", self.theme.name().bold(), self.theme.tagline());
                self.redraw().await
            }
            Input::Help => {
                println!("{HELP}");
                Ok(())
            }
            Input::Quit => Ok(()),
        }
    }

    async fn redraw(&self) -> Result<()> {
        let snapshot = self.session.snapshot().await?;
        self.draw(&snapshot);
        Ok(())
    }

    fn draw(&self, snapshot: &Snapshot) {
        let mut stdout = io::stdout();
        let _ = write!(stdout, "\r\x1b[2K{}", status_line(snapshot, self.theme));
        let _ = stdout.flush();
    }

    async fn print_stats(&self) {
        let elapsed = Local::now() - self.started_at;
        println!("\n\n--- Session Statistics ---");
        println!("Session duration: {} minutes", elapsed.num_minutes());
        if let Ok(snapshot) = self.session.snapshot().await {
            println!(
                "Focus sessions completed: {}",
                snapshot.state.completed_focus_count
            );
            println!("{}", cycle_summary(&snapshot));
        }
        println!("--------------------------\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pomodoro::SessionController;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_input("").unwrap(), Input::Toggle);
        assert_eq!(parse_input("  s ").unwrap(), Input::Toggle);
        assert_eq!(parse_input("R").unwrap(), Input::Reset);
        assert_eq!(parse_input("sb").unwrap(), Input::Switch(Mode::ShortBreak));
        assert_eq!(parse_input("long").unwrap(), Input::Switch(Mode::LongBreak));
        assert_eq!(parse_input("q").unwrap(), Input::Quit);
        assert!(parse_input("dance").is_err());
    }

    #[test]
    fn test_parse_settings() {
        let input = parse_input("set 50 10 20 2").unwrap();
        assert_eq!(
            input,
            Input::Settings(Settings {
                focus_minutes: 50.0,
                short_break_minutes: 10.0,
                long_break_minutes: 20.0,
                sessions_per_cycle: 2,
            })
        );
        assert!(parse_input("set 50 10 20").is_err());
        assert!(parse_input("set 50 0 20 2").is_err());
        assert!(parse_input("set fifty 10 20 2").is_err());
        assert!(parse_input("set 50 10 20 0").is_err());
        assert!(parse_input("set 25 5 15 4294967295").is_err());
        assert!(parse_input("set 90 5 15 4").is_err());
    }

    #[test]
    fn test_cycle_dots() {
        assert_eq!(cycle_dots(0, 4), "\u{25CB}\u{25CB}\u{25CB}\u{25CB}");
        assert_eq!(cycle_dots(3, 4), "\u{25CF}\u{25CF}\u{25CF}\u{25CB}");
    }

    #[test]
    fn test_status_line_contains_clock() {
        colored::control::set_override(false);
        let controller = SessionController::new(Settings {
            focus_minutes: 90.0,
            ..Settings::default()
        });
        let snapshot = Snapshot::of(&controller);
        let line = status_line(&snapshot, Theme::Forest);
        assert!(line.contains("90:00"));
        assert!(line.contains("Focus Time"));
        assert!(line.contains("Cycle 1"));
        assert!(line.contains("Forest vibe"));
        assert!(line.contains("(paused)"));
    }

    #[test]
    fn test_cycle_summary_counts_cycles() {
        let mut controller = SessionController::new(Settings {
            focus_minutes: 0.05,
            sessions_per_cycle: 2,
            ..Settings::default()
        });
        for _ in 0..3 {
            controller.switch_mode(Mode::Focus);
            controller.start();
            while controller.tick().is_none() {}
        }
        let snapshot = Snapshot::of(&controller);
        assert_eq!(cycle_summary(&snapshot), "Sessions: 1/2 (Cycle 2)");
    }
}
