//! Completion side effects: desktop notification, terminal bell and the
//! activity log. None of these can affect the session itself.

use chrono::Local;
use notify_rust::{Notification, Timeout};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::config::NotificationConfig;
use crate::error::{Error, Result};
use crate::pomodoro::CompletionEvent;
use crate::session::SessionEvent;

const NOTIFICATION_TIMEOUT_MS: u32 = 5000;

#[derive(Debug, Clone)]
pub struct Notifier {
    title: String,
    desktop: bool,
    bell: bool,
    log_file: Option<PathBuf>,
}

impl Notifier {
    pub fn new(title: impl Into<String>, config: &NotificationConfig) -> Self {
        Self {
            title: title.into(),
            desktop: config.desktop,
            bell: config.bell,
            log_file: config.log_file.clone(),
        }
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    /// Append a timestamped line to the activity log, if one is configured.
    pub fn log(&self, message: &str) {
        if let Some(ref path) = self.log_file {
            let line = format!("[{}] {}", Local::now().format("%Y-%m-%d %H:%M:%S"), message);
            if let Err(e) = append_line(path, &line) {
                log::warn!("Failed to write activity log {}: {}", path.display(), e);
            }
        }
    }

    pub fn notify(&self, event: &CompletionEvent) {
        let message = event.message();
        self.log(&format!(
            "{} complete, next: {}",
            event.finished_mode.as_str(),
            event.next_mode.as_str()
        ));

        if self.bell {
            ring_bell();
        }

        if self.desktop {
            if let Err(e) = self.send_desktop(message) {
                log::warn!("Failed to send notification: {}", e);
            }
        }
    }

    fn send_desktop(&self, message: &str) -> Result<()> {
        Notification::new()
            .summary(&self.title)
            .body(message)
            .timeout(Timeout::Milliseconds(NOTIFICATION_TIMEOUT_MS))
            .show()
            .map_err(|e| Error::Notification(e.to_string()))?;
        Ok(())
    }

    /// Forward every completion on `events` until the session closes.
    pub async fn run(self, mut events: broadcast::Receiver<SessionEvent>) {
        loop {
            match events.recv().await {
                Ok(SessionEvent::Completed(event)) => self.notify(&event),
                Ok(SessionEvent::State(_)) => {}
                Err(RecvError::Lagged(skipped)) => {
                    log::debug!("Notifier skipped {} session events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}

fn append_line(path: &Path, line: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)?;
    Ok(())
}

fn ring_bell() {
    if let Err(e) = write_bell(&mut io::stdout()) {
        log::warn!("Failed to ring terminal bell: {}", e);
    }
}

fn write_bell(out: &mut impl Write) -> io::Result<()> {
    out.write_all(b"\x07")?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pomodoro::Mode;

    fn quiet(log_file: Option<PathBuf>) -> Notifier {
        Notifier::new(
            "Pomodoro Flow",
            &NotificationConfig {
                desktop: false,
                bell: false,
                log_file,
            },
        )
    }

    #[test]
    fn test_completion_is_logged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("activity.log");
        let notifier = quiet(Some(path.clone()));

        notifier.notify(&CompletionEvent {
            finished_mode: Mode::Focus,
            next_mode: Mode::LongBreak,
        });
        notifier.notify(&CompletionEvent {
            finished_mode: Mode::LongBreak,
            next_mode: Mode::Focus,
        });

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("FOCUS complete, next: LONG BREAK"));
        assert!(lines[1].ends_with("LONG BREAK complete, next: FOCUS"));
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_bell_reports_write_failure() {
        let mut out = Vec::new();
        write_bell(&mut out).unwrap();
        assert_eq!(out, b"\x07");

        let err = write_bell(&mut BrokenPipe).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_without_log_file_is_silent() {
        let notifier = quiet(None);
        assert!(notifier.log_file().is_none());
        notifier.log("nothing happens");
    }
}
