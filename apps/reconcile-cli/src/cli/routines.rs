//! # Routines
//!
//! Routines that get run by the CLI are functions returning a [`RoutineSuccess`] or a
//! [`RoutineFailure`]. Both carry a human readable message, shown on stderr, and the
//! structured record printed on stdout for the orchestrator.

use serde_json::{json, Value};

use super::display::{self, Message, MessageType};
use crate::framework::core::execute::{ReconcileError, ReconciliationOutcome};
use crate::utilities::constants::{EXIT_CODE_CONFIGURATION, EXIT_CODE_FAILURE};

pub mod reconcile;

#[derive(Debug, Clone)]
#[must_use = "The message should be displayed."]
pub struct RoutineSuccess {
    pub message: Message,
    pub message_type: MessageType,
    pub record: Value,
}

impl RoutineSuccess {
    pub fn success(message: Message, record: Value) -> Self {
        Self {
            message,
            message_type: MessageType::Success,
            record,
        }
    }

    pub fn info(message: Message, record: Value) -> Self {
        Self {
            message,
            message_type: MessageType::Info,
            record,
        }
    }

    /// Unchanged outcomes are reported as info, changes as success.
    pub fn from_outcome(action: &str, outcome: &ReconciliationOutcome) -> Self {
        let details = match outcome {
            ReconciliationOutcome::Applied { msg, .. } => msg.clone(),
            ReconciliationOutcome::Existence { exists, .. } => {
                if *exists { "exists" } else { "does not exist" }.to_string()
            }
            ReconciliationOutcome::Executed { executed_query, .. } => {
                format!("executed {}", executed_query.trim())
            }
            ReconciliationOutcome::Rows { query_result, .. } => {
                format!("{} row(s) returned", query_result.len())
            }
        };
        let message = Message::new(action.to_string(), details);
        let record = serde_json::to_value(outcome).unwrap_or(Value::Null);
        if outcome.changed() {
            Self::success(message, record)
        } else {
            Self::info(message, record)
        }
    }

    pub fn show(&self) {
        display::show_message_wrapper(self.message_type, self.message.clone());
    }

    pub fn print_record(&self) {
        println!("{}", self.record);
    }
}

#[derive(Debug)]
pub struct RoutineFailure {
    pub message: Message,
    pub message_type: MessageType,
    pub error: Option<anyhow::Error>,
    /// Statement that failed, with secrets masked
    pub query: Option<String>,
    pub exit_code: u8,
}

impl RoutineFailure {
    pub fn new<F: Into<anyhow::Error>>(message: Message, error: F) -> Self {
        Self {
            message,
            message_type: MessageType::Error,
            error: Some(error.into()),
            query: None,
            exit_code: EXIT_CODE_FAILURE,
        }
    }

    /// Invalid parameters or settings, detected before anything was sent to the server
    pub fn configuration<F: Into<anyhow::Error>>(message: Message, error: F) -> Self {
        Self {
            exit_code: EXIT_CODE_CONFIGURATION,
            ..Self::new(message, error)
        }
    }

    pub fn from_reconcile_error(action: &str, error: ReconcileError) -> Self {
        let message = Message::new(action.to_string(), error.to_string());
        let query = error.statement().map(str::to_string);
        let failure = match error {
            ReconcileError::Configuration(_) => Self::configuration(message, error),
            _ => Self::new(message, error),
        };
        Self { query, ..failure }
    }

    pub fn show(&self) {
        display::show_message_wrapper(self.message_type, self.message.clone());
    }

    pub fn record(&self) -> Value {
        let mut record = json!({
            "failed": true,
            "changed": false,
            "msg": self.message.details,
        });
        if let Some(query) = &self.query {
            record["query"] = Value::String(query.clone());
        }
        record
    }

    pub fn print_record(&self) {
        println!("{}", self.record());
    }
}
