use serde::{Deserialize, Serialize};
use std::fmt;

/// Events that drive the task lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskEvent {
    /// Acquire a machine and begin executing.
    Start,
    /// Finish successfully, releasing the machine.
    Complete,
    /// Finish unsuccessfully with a reason, releasing the machine.
    Fail(String),
}

impl fmt::Display for TaskEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Complete => write!(f, "complete"),
            Self::Fail(_) => write!(f, "fail"),
        }
    }
}
