//! Command-line interface definitions and subcommand handlers.

mod args;
mod commands;
mod enums;

pub use args::{Args, Command, ConfigAction};
pub use commands::{fetch_model, handle_config_action, list_cameras, FetchModelError};
pub use enums::{CharacterSet, LogLevel};
