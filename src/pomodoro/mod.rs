pub mod controller;
pub mod mode;
pub mod settings;

pub use controller::{format_clock, CompletionEvent, SessionController, SessionState};
pub use mode::Mode;
pub use settings::Settings;
