//! # Activity Log Model
//!
//! Append-only audit trail of lifecycle events. Entries are never mutated or
//! deleted except through cascading task/order deletion.
//!
//! Context that consumers need (machine, order, operation) is carried as
//! explicit typed fields rather than encoded in the free-text message, so no
//! report has to parse substrings back out of it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Severity of an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogType {
    Info,
    Warning,
    Error,
}

impl Default for LogType {
    fn default() -> Self {
        Self::Info
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for LogType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            _ => Err(format!("Invalid log type: {s}")),
        }
    }
}

/// An immutable audit record for a lifecycle event.
///
/// `task_id` is `None` for machine-only events such as a maintenance sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    pub log_id: Uuid,
    pub task_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
    pub machine_id: Option<Uuid>,
    pub machine_name: Option<String>,
    pub operation: Option<String>,
    pub time: DateTime<Utc>,
    pub message: String,
    pub log_type: LogType,
    pub acting_user: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_type_string_conversion() {
        assert_eq!(LogType::Warning.to_string(), "warning");
        assert_eq!("error".parse::<LogType>().unwrap(), LogType::Error);
        assert!("fatal".parse::<LogType>().is_err());
    }
}
