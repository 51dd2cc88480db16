//! Log output formats for the bridge host.
//!
//! Logs are always written to stderr because stdout carries the response
//! stream; the format only decides how each record is rendered.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Rendering of log records written to stderr.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per record, with event fields flattened.
    #[default]
    Json,
    /// Single-line human-readable records.
    Compact,
}

impl LogFormat {
    /// Returns `true` when records are emitted as JSON objects.
    #[must_use]
    pub const fn is_structured(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;
