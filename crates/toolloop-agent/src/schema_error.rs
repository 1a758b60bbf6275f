//! Classification of malformed-tool-schema errors.
//!
//! When a tool's input schema is rejected, the completion service answers with
//! an `invalid_request_error` whose message points at the tool by position,
//! e.g. `tools.2.custom.input_schema: JSON schema is invalid`. This module turns
//! such errors into [`TurnError::ToolSchema`] naming the tool. Anything that
//! does not match exactly is passed through as [`TurnError::Completion`].

use once_cell::sync::Lazy;
use regex::Regex;
use toolloop_core::{CompletionError, ToolDescriptor};

use crate::error::TurnError;

/// Service error kind for rejected requests.
pub const INVALID_REQUEST_ERROR: &str = "invalid_request_error";

const INPUT_SCHEMA_MARKER: &str = "input_schema";

static TOOL_POSITION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^tools\.(\d+)\.").expect("tool position pattern is valid"));

/// Classify a completion error against the tool list that was sent.
pub fn classify(error: CompletionError, tools: &[ToolDescriptor]) -> TurnError {
    match schema_error_position(&error, tools) {
        Some((tool_index, tool_name)) => TurnError::ToolSchema {
            tool_index,
            tool_name,
            source: error,
        },
        None => TurnError::Completion(error),
    }
}

fn schema_error_position(
    error: &CompletionError,
    tools: &[ToolDescriptor],
) -> Option<(usize, String)> {
    if error.service_error_type()? != INVALID_REQUEST_ERROR {
        return None;
    }

    let message = error.service_error_message()?;
    if !message.contains(INPUT_SCHEMA_MARKER) {
        return None;
    }

    let index: usize = TOOL_POSITION.captures(message)?.get(1)?.as_str().parse().ok()?;
    let tool = tools.get(index)?;
    Some((index, tool.name.clone()))
}
