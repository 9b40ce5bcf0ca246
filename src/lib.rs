pub mod config;
pub mod error;
pub mod notify;
pub mod pomodoro;
pub mod session;
pub mod terminal;
pub mod theme;
pub mod ws;

pub use config::Config;
pub use error::{Error, Result};
pub use pomodoro::{CompletionEvent, Mode, SessionController, SessionState, Settings};
pub use session::{AutoStart, SessionEvent, SessionHandle, SessionOptions, Snapshot};
