//! Human readable status lines.
//!
//! Everything here goes to stderr; stdout is reserved for the result record.

use serde::Serialize;

pub mod status;

use status::{STATUS_ERROR, STATUS_INFO, STATUS_SUCCESS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub action: String,
    pub details: String,
}

impl Message {
    pub fn new(action: String, details: String) -> Self {
        Self { action, details }
    }
}

/// Formats a message as `<glyph> <action>: <details>`.
pub fn format_message(message_type: MessageType, message: &Message) -> String {
    let glyph = match message_type {
        MessageType::Info => STATUS_INFO,
        MessageType::Success => STATUS_SUCCESS,
        MessageType::Error => STATUS_ERROR,
    };
    format!("{} {}: {}", glyph, message.action, message.details)
}

pub fn show_message_wrapper(message_type: MessageType, message: Message) {
    eprintln!("{}", format_message(message_type, &message));
}

macro_rules! show_message {
    ($message_type:expr, $message:expr) => {
        $crate::cli::display::show_message_wrapper($message_type, $message)
    };
}
