// Library surface: the session cores plus the pieces the terminal binary
// and the integration tests share. Nothing here touches the terminal.
pub mod app_dirs;
pub mod arcade;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod rating;
pub mod runtime;
pub mod samples;
pub mod scheduler;
pub mod sound;
pub mod theme;
pub mod typing;
pub mod word_bank;

pub use error::{Error, Result};
