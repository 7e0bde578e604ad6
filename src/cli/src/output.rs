//! Rendering of command results.

use colored::Colorize;
use serde::Serialize;
use std::fmt::Display;

use crate::errors::CliError;

/// Renders a record either as pretty JSON or as a labelled line.
pub fn render<T: Serialize + Display>(
    label: &str,
    record: &T,
    json: bool,
) -> Result<String, CliError> {
    if json {
        return Ok(serde_json::to_string_pretty(record)?);
    }
    Ok(format!("{} {}", label.green(), record))
}
