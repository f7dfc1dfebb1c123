//! Command handlers module
//!
//! This module contains the CLI front end organized by surface:
//! - Command handlers for one-shot subcommands
//! - The kiosk loop for scanning sessions

pub mod commands;
pub mod kiosk;

// Re-export commonly used handler entry points
pub use commands::{handle_command, Cli, Command};
pub use kiosk::{run_kiosk, Kiosk, KioskCommand, KioskEvent};
