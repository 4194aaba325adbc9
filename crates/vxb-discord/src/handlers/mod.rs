//! Translation of Discord gateway events into core events.
//!
//! Each handler only converts; all decisions are made by the core dispatcher.

mod commands;
mod text;

pub use commands::{incoming_command, registered_commands};
pub use text::incoming_message;
